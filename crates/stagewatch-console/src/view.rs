//! Which stage, task, panel tab and preview the operator is looking at.
//!
//! Every user gesture is a [`ViewAction`]; [`transition`] is total, so no
//! action is ever rejected. A few actions carry coupled effects, e.g. picking
//! another task while a file preview is open closes the preview so the old
//! task's files never sit under the new task's header.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Delay before a restored scroll offset is applied, giving the freshly
/// merged data one frame to lay out.
pub const SCROLL_RESTORE_DELAY: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PanelTab {
    #[default]
    Overview,
    Files,
    Dependencies,
    Parameters,
    Messages,
}

impl PanelTab {
    pub const ALL: [PanelTab; 5] = [
        PanelTab::Overview,
        PanelTab::Files,
        PanelTab::Dependencies,
        PanelTab::Parameters,
        PanelTab::Messages,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PanelTab::Overview => "Process overview",
            PanelTab::Files => "Files",
            PanelTab::Dependencies => "Dependencies",
            PanelTab::Parameters => "Parameters",
            PanelTab::Messages => "Messages",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|tab| *tab == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Collapsible blocks of the process overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Timing,
    Actors,
    Flags,
    Messages,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Section::Timing => "Timing",
            Section::Actors => "Actors",
            Section::Flags => "Flags",
            Section::Messages => "Messages",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewMode {
    #[default]
    Browsing,
    PreviewingFileEnhanced {
        file: String,
    },
    PreviewingFileLegacy {
        file: String,
    },
}

impl PreviewMode {
    pub fn is_previewing(&self) -> bool {
        !matches!(self, PreviewMode::Browsing)
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            PreviewMode::Browsing => None,
            PreviewMode::PreviewingFileEnhanced { file }
            | PreviewMode::PreviewingFileLegacy { file } => Some(file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub active_stage: Option<String>,
    pub selected_task: Option<String>,
    pub panel_tab: PanelTab,
    pub preview: PreviewMode,
    pub scroll_y: u16,
    pub expanded_sections: BTreeSet<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    SelectStage(String),
    SelectTask(String),
    ClearSelection,
    ShowTab(PanelTab),
    OpenPreview { file: String, enhanced: bool },
    ClosePreview,
    ToggleSection(Section),
    ScrollBy(i32),
    ScrollTo(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewField {
    ActiveStage,
    SelectedTask,
    PanelTab,
    Preview,
    Scroll,
    ExpandedSections,
}

pub fn transition(state: &ViewState, action: ViewAction) -> ViewState {
    let mut next = state.clone();
    match action {
        ViewAction::SelectStage(stage_id) => {
            if next.active_stage.as_deref() != Some(stage_id.as_str()) {
                next.active_stage = Some(stage_id);
                next.selected_task = None;
                next.preview = PreviewMode::Browsing;
                next.scroll_y = 0;
            }
        }
        ViewAction::SelectTask(task_id) => {
            if next.selected_task.as_deref() != Some(task_id.as_str()) {
                next.preview = PreviewMode::Browsing;
                next.scroll_y = 0;
                next.selected_task = Some(task_id);
            }
        }
        ViewAction::ClearSelection => {
            next.selected_task = None;
            next.preview = PreviewMode::Browsing;
        }
        ViewAction::ShowTab(tab) => {
            if next.panel_tab != tab {
                next.panel_tab = tab;
                next.scroll_y = 0;
            }
        }
        ViewAction::OpenPreview { file, enhanced } => {
            next.preview = if enhanced {
                PreviewMode::PreviewingFileEnhanced { file }
            } else {
                PreviewMode::PreviewingFileLegacy { file }
            };
        }
        ViewAction::ClosePreview => {
            next.preview = PreviewMode::Browsing;
        }
        ViewAction::ToggleSection(section) => {
            if !next.expanded_sections.remove(&section) {
                next.expanded_sections.insert(section);
            }
        }
        ViewAction::ScrollBy(delta) => {
            let target = i64::from(next.scroll_y) + i64::from(delta);
            next.scroll_y = target.clamp(0, i64::from(u16::MAX)) as u16;
        }
        ViewAction::ScrollTo(offset) => {
            next.scroll_y = offset;
        }
    }
    next
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub changed: Vec<ViewField>,
    pub scroll_scheduled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingScroll {
    offset: u16,
    due: Instant,
}

/// Owns the [`ViewState`] and its preserve/restore cycle around background
/// refreshes.
#[derive(Debug)]
pub struct ViewController {
    state: ViewState,
    preserved: Option<ViewState>,
    pending_scroll: Option<PendingScroll>,
    scroll_restore_delay: Duration,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewController {
    pub fn new() -> Self {
        Self::with_scroll_delay(SCROLL_RESTORE_DELAY)
    }

    pub fn with_scroll_delay(scroll_restore_delay: Duration) -> Self {
        Self {
            state: ViewState::default(),
            preserved: None,
            pending_scroll: None,
            scroll_restore_delay,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Applies a user action. Returns whether anything changed.
    pub fn dispatch(&mut self, action: ViewAction) -> bool {
        let next = transition(&self.state, action);
        if next == self.state {
            return false;
        }
        if next.scroll_y != self.state.scroll_y {
            self.pending_scroll = None;
        }
        self.state = next;
        true
    }

    pub fn preserve(&mut self) {
        self.preserved = Some(self.state.clone());
    }

    pub fn has_preserved(&self) -> bool {
        self.preserved.is_some()
    }

    /// Drops the held snapshot without touching the live state.
    pub fn discard_preserved(&mut self) {
        self.preserved = None;
    }

    /// Re-applies the preserved snapshot, touching only fields that differ.
    /// The scroll offset is not written here; it is scheduled and later
    /// applied by [`ViewController::apply_pending_scroll`].
    pub fn restore(&mut self, now: Instant) -> RestoreReport {
        let Some(saved) = self.preserved.take() else {
            return RestoreReport::default();
        };
        let mut report = RestoreReport::default();

        if self.state.active_stage != saved.active_stage {
            self.state.active_stage = saved.active_stage;
            report.changed.push(ViewField::ActiveStage);
        }
        if self.state.selected_task != saved.selected_task {
            self.state.selected_task = saved.selected_task;
            report.changed.push(ViewField::SelectedTask);
        }
        if self.state.panel_tab != saved.panel_tab {
            self.state.panel_tab = saved.panel_tab;
            report.changed.push(ViewField::PanelTab);
        }
        if self.state.preview != saved.preview {
            self.state.preview = saved.preview;
            report.changed.push(ViewField::Preview);
        }
        if self.state.expanded_sections != saved.expanded_sections {
            self.state.expanded_sections = saved.expanded_sections;
            report.changed.push(ViewField::ExpandedSections);
        }
        if self.state.scroll_y != saved.scroll_y {
            self.pending_scroll = Some(PendingScroll {
                offset: saved.scroll_y,
                due: now + self.scroll_restore_delay,
            });
            report.scroll_scheduled = true;
        }

        report
    }

    pub fn has_pending_scroll(&self) -> bool {
        self.pending_scroll.is_some()
    }

    /// Applies a scheduled scroll restore once its delay has passed.
    pub fn apply_pending_scroll(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending_scroll else {
            return false;
        };
        if now < pending.due {
            return false;
        }
        self.pending_scroll = None;
        if self.state.scroll_y == pending.offset {
            return false;
        }
        self.state.scroll_y = pending.offset;
        true
    }

    /// Used when the data under the view changes identity entirely (another
    /// application or config).
    pub fn reset(&mut self) {
        self.state = ViewState::default();
        self.preserved = None;
        self.pending_scroll = None;
    }
}
