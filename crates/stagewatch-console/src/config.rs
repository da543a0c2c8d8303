use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use stagewatch_core::parse_api_date;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::scheduler::{DEFAULT_IDLE_WINDOW, DEFAULT_INTERVAL_SECS};

#[derive(Parser, Debug, Clone)]
#[command(name = "stagewatch", about = "Terminal dashboard for staged workflow runs")]
pub struct Args {
    /// Directory holding `nodes.json` and dated summary snapshots.
    #[arg(long, env = "STAGEWATCH_DATA_DIR", default_value = "./stagewatch-data")]
    pub data_dir: PathBuf,
    #[arg(long = "app", env = "STAGEWATCH_APP_ID")]
    pub app_id: Option<String>,
    #[arg(long = "config", env = "STAGEWATCH_CONFIG_ID")]
    pub config_id: Option<String>,
    /// Business date, `19 May 2025` or `2025-05-19`. Defaults to today.
    #[arg(long, env = "STAGEWATCH_DATE")]
    pub date: Option<String>,
    #[arg(long, env = "STAGEWATCH_REFRESH_SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub refresh_secs: u64,
    #[arg(long, env = "STAGEWATCH_IDLE_SECS", default_value_t = DEFAULT_IDLE_WINDOW.as_secs())]
    pub idle_secs: u64,
    #[arg(long, default_value_t = false)]
    pub no_auto_refresh: bool,
    #[arg(long, env = "STAGEWATCH_ACTOR")]
    pub actor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub data_dir: PathBuf,
    pub app_id: Option<String>,
    pub config_id: Option<String>,
    pub date: NaiveDate,
    pub refresh_secs: u64,
    pub idle_window: Duration,
    pub auto_refresh: bool,
    pub actor: String,
}

impl ConsoleConfig {
    pub fn from_args(args: Args) -> Result<Self> {
        let date = match args.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                parse_api_date(raw).with_context(|| format!("reading --date {raw:?}"))?
            }
            _ => Local::now().date_naive(),
        };
        let auto_refresh = !args.no_auto_refresh
            && std::env::var("STAGEWATCH_AUTO_REFRESH")
                .ok()
                .and_then(|value| parse_bool_flag(&value))
                .unwrap_or(true);

        Ok(Self {
            data_dir: args.data_dir,
            app_id: non_empty(args.app_id),
            config_id: non_empty(args.config_id),
            date,
            refresh_secs: args.refresh_secs,
            idle_window: Duration::from_secs(args.idle_secs.max(1)),
            auto_refresh,
            actor: non_empty(args.actor).unwrap_or_else(resolve_actor),
        })
    }

    /// Both ids known: the dashboard opens straight on the workflow screen.
    pub fn workflow_target(&self) -> Option<(String, String)> {
        match (&self.app_id, &self.config_id) {
            (Some(app), Some(config)) => Some((app.clone(), config.clone())),
            _ => None,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./stagewatch-data"),
            app_id: None,
            config_id: None,
            date: Local::now().date_naive(),
            refresh_secs: DEFAULT_INTERVAL_SECS,
            idle_window: DEFAULT_IDLE_WINDOW,
            auto_refresh: true,
            actor: "operator".to_string(),
        }
    }
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn resolve_actor() -> String {
    std::env::var("USER")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "operator".to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The terminal UI owns stdout, so logs go nowhere unless asked for.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = std::env::var("STAGEWATCH_LOG_STDOUT")
        .ok()
        .and_then(|value| parse_bool_flag(&value))
        .unwrap_or(false);
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
