use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const NOTICE_TTL: Duration = Duration::from_secs(6);
const NOTICE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub raised_at: Instant,
}

/// Transient toasts shown in the footer. Oldest are evicted first.
#[derive(Debug)]
pub struct Notices {
    items: VecDeque<Notice>,
    ttl: Duration,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new(NOTICE_TTL)
    }
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::with_capacity(NOTICE_CAPACITY),
            ttl,
        }
    }

    pub fn push(&mut self, level: NoticeLevel, text: impl Into<String>, now: Instant) {
        let text = text.into();
        match level {
            NoticeLevel::Warning | NoticeLevel::Error => warn!("notice_raised: {text}"),
            NoticeLevel::Info | NoticeLevel::Success => info!("notice_raised: {text}"),
        }
        if self.items.len() == NOTICE_CAPACITY {
            self.items.pop_front();
        }
        self.items.push_back(Notice {
            level,
            text,
            raised_at: now,
        });
    }

    pub fn info(&mut self, text: impl Into<String>, now: Instant) {
        self.push(NoticeLevel::Info, text, now);
    }

    pub fn success(&mut self, text: impl Into<String>, now: Instant) {
        self.push(NoticeLevel::Success, text, now);
    }

    pub fn warn(&mut self, text: impl Into<String>, now: Instant) {
        self.push(NoticeLevel::Warning, text, now);
    }

    pub fn error(&mut self, text: impl Into<String>, now: Instant) {
        self.push(NoticeLevel::Error, text, now);
    }

    /// Drops expired notices. Returns whether any were removed.
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        let ttl = self.ttl;
        self.items
            .retain(|notice| now.saturating_duration_since(notice.raised_at) < ttl);
        before != self.items.len()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
