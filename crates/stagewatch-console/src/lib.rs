//! Terminal front end for staged workflow runs: application picker, stage
//! and task views, file previews, dependency navigation and operator actions.

pub mod app;
pub mod config;
pub mod notice;
pub mod refresh;
pub mod runtime;
pub mod scheduler;
pub mod store;
pub mod theme;
pub mod ui;
pub mod view;
