use crate::CoreError;
use chrono::NaiveDate;

/// Every workflow API call takes its business date as `DD Mon YYYY`.
pub const API_DATE_FORMAT: &str = "%d %b %Y";

pub fn format_api_date(date: NaiveDate) -> String {
    date.format(API_DATE_FORMAT).to_string()
}

/// Accepts the API form (`19 May 2025`) and ISO (`2025-05-19`).
pub fn parse_api_date(input: &str) -> Result<NaiveDate, CoreError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, API_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| CoreError::InvalidDate(trimmed.to_string()))
}
