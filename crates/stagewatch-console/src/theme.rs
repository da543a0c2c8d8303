use crate::notice::NoticeLevel;
use ratatui::style::{Color, Modifier, Style};
use stagewatch_core::{StatusClass, TaskStatus};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(131, 165, 152))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const MUTED_STYLE: Style = Style::new().fg(Color::Rgb(146, 131, 116));
pub const LINK_STYLE: Style = Style::new()
    .fg(Color::Rgb(131, 165, 152))
    .add_modifier(Modifier::UNDERLINED);

pub fn zebra_row_style(index: usize) -> Style {
    let bg = if index % 2 == 0 {
        Color::Rgb(18, 20, 26)
    } else {
        Color::Rgb(24, 27, 34)
    };
    Style::new().bg(bg)
}

pub mod icons {
    pub const COMPLETED: &str = "x";
    pub const IN_PROGRESS: &str = ">";
    pub const FAILED: &str = "!";
    pub const REJECTED: &str = "-";
    pub const PENDING: &str = "?";
    pub const NOT_STARTED: &str = ".";
    pub const SKIPPED: &str = "~";
    pub const EXPANDED: &str = "v";
    pub const COLLAPSED: &str = ">";
    pub const LOCKED: &str = "#";
    pub const APPROVAL: &str = "A";
}

pub fn class_icon(class: StatusClass) -> &'static str {
    match class {
        StatusClass::Completed => icons::COMPLETED,
        StatusClass::InProgress => icons::IN_PROGRESS,
        StatusClass::Failed => icons::FAILED,
        StatusClass::Rejected => icons::REJECTED,
        StatusClass::Skipped => icons::SKIPPED,
        StatusClass::Pending => icons::PENDING,
        StatusClass::NotStarted => icons::NOT_STARTED,
    }
}

pub fn class_color(class: StatusClass) -> Color {
    match class {
        StatusClass::Completed => Color::Rgb(184, 187, 38),
        StatusClass::InProgress => Color::Rgb(131, 165, 152),
        StatusClass::Failed => Color::Rgb(251, 73, 52),
        StatusClass::Rejected => Color::Rgb(214, 93, 14),
        StatusClass::Pending => Color::Rgb(250, 189, 47),
        StatusClass::Skipped => Color::Rgb(168, 153, 132),
        StatusClass::NotStarted => Color::Rgb(146, 131, 116),
    }
}

pub fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Completed => class_color(StatusClass::Completed),
        TaskStatus::InProgress => class_color(StatusClass::InProgress),
        TaskStatus::Skipped => class_color(StatusClass::Skipped),
        TaskStatus::NotStarted => class_color(StatusClass::NotStarted),
    }
}

pub fn percent_color(percent: u8) -> Color {
    match percent {
        100 => Color::Rgb(184, 187, 38),
        50..=99 => Color::Rgb(131, 165, 152),
        1..=49 => Color::Rgb(250, 189, 47),
        _ => Color::Rgb(146, 131, 116),
    }
}

pub fn notice_style(level: NoticeLevel) -> Style {
    let color = match level {
        NoticeLevel::Info => Color::Rgb(131, 165, 152),
        NoticeLevel::Success => Color::Rgb(184, 187, 38),
        NoticeLevel::Warning => Color::Rgb(250, 189, 47),
        NoticeLevel::Error => Color::Rgb(251, 73, 52),
    };
    Style::new().fg(color).add_modifier(Modifier::BOLD)
}
