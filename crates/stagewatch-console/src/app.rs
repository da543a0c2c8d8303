use crate::config::ConsoleConfig;
use crate::notice::Notices;
use crate::refresh::{RefreshEvent, RefreshGate, RefreshKind, RefreshOutcome, RefreshTicket};
use crate::scheduler::AutoRefresh;
use crate::store::{SummarySnapshot, SummaryStore};
use crate::view::{PanelTab, Section, ViewAction, ViewController, ViewState};
use chrono::Local;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui::widgets::{ListState, TableState};
use stagewatch_core::{
    aggregate_summary, Aggregation, DependencyIndex, FileRecord, ParameterRecord, Stage, Task,
    TaskStatus, WorkflowNode,
};
use stagewatch_service::{ActionKind, ApiResponse, NodesQuery, SummaryQuery};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const OVERVIEW_SECTIONS: [Section; 4] = [
    Section::Timing,
    Section::Actors,
    Section::Flags,
    Section::Messages,
];
const INTERVAL_STEP_SECS: u64 = 15;
const PAGE_SCROLL: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Applications,
    Workflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusMode {
    #[default]
    Tasks,
    Panel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTicket {
    pub kind: ActionKind,
    pub process_id: i64,
    pub task_name: String,
    pub actor: String,
    pub commentary: String,
}

/// Commentary input shown before approve / reject are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentaryPrompt {
    pub kind: ActionKind,
    pub task_name: String,
    pub input: String,
}

/// Work the event loop must start on the app's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchSummary(RefreshTicket),
    FetchNodes(NodesQuery),
    RunAction(ActionTicket),
}

/// Completions reported back by spawned work.
#[derive(Debug)]
pub enum AppEvent {
    Summary(RefreshEvent),
    Nodes {
        query: NodesQuery,
        result: Result<Vec<WorkflowNode>, String>,
    },
    Action {
        ticket: ActionTicket,
        result: Result<ApiResponse<()>, String>,
    },
}

#[derive(Debug, Clone, Copy, Default)]
struct LayoutAreas {
    tasks: Option<Rect>,
    panel: Option<Rect>,
}

pub struct App {
    config: ConsoleConfig,
    screen: Screen,
    target: Option<(String, String)>,
    store: SummaryStore,
    view: ViewController,
    scheduler: AutoRefresh,
    gate: RefreshGate,
    notices: Notices,
    dep_index: DependencyIndex,
    dep_index_generation: u64,
    refetch_after_flight: bool,
    nodes: Vec<WorkflowNode>,
    node_path: Vec<WorkflowNode>,
    nodes_loading: bool,
    pub node_state: ListState,
    pub table_state: TableState,
    focus: FocusMode,
    panel_cursor: usize,
    prompt: Option<CommentaryPrompt>,
    actions_in_flight: usize,
    show_help: bool,
    should_quit: bool,
    layout: LayoutAreas,
}

impl App {
    pub fn new(config: ConsoleConfig, now: Instant) -> Self {
        let scheduler = AutoRefresh::new(
            config.refresh_secs,
            config.idle_window,
            config.auto_refresh,
            now,
        );
        Self {
            config,
            screen: Screen::Applications,
            target: None,
            store: SummaryStore::new(),
            view: ViewController::new(),
            scheduler,
            gate: RefreshGate::new(),
            notices: Notices::default(),
            dep_index: DependencyIndex::default(),
            dep_index_generation: 0,
            refetch_after_flight: false,
            nodes: Vec::new(),
            node_path: Vec::new(),
            nodes_loading: false,
            node_state: ListState::default(),
            table_state: TableState::default(),
            focus: FocusMode::Tasks,
            panel_cursor: 0,
            prompt: None,
            actions_in_flight: 0,
            show_help: false,
            should_quit: false,
            layout: LayoutAreas::default(),
        }
    }

    /// Effects to run right after startup.
    pub fn start(&mut self, now: Instant) -> Vec<Effect> {
        match self.config.workflow_target() {
            Some((app_id, config_id)) => self.open_workflow(app_id, config_id, now),
            None => self.request_nodes().into_iter().collect(),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn target(&self) -> Option<(&str, &str)> {
        self.target
            .as_ref()
            .map(|(app, config)| (app.as_str(), config.as_str()))
    }

    pub fn store(&self) -> &SummaryStore {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        self.view.state()
    }

    pub fn scheduler(&self) -> &AutoRefresh {
        &self.scheduler
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn is_refreshing(&self) -> bool {
        self.gate.is_refreshing()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn prompt(&self) -> Option<&CommentaryPrompt> {
        self.prompt.as_ref()
    }

    pub fn focus(&self) -> FocusMode {
        self.focus
    }

    pub fn panel_cursor(&self) -> usize {
        self.panel_cursor
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn node_path(&self) -> &[WorkflowNode] {
        &self.node_path
    }

    pub fn nodes_loading(&self) -> bool {
        self.nodes_loading
    }

    pub fn actions_in_flight(&self) -> usize {
        self.actions_in_flight
    }

    pub fn summary_query(&self) -> Option<SummaryQuery> {
        let (app_id, config_id) = self.target.as_ref()?;
        Some(SummaryQuery {
            date: self.config.date,
            config_id: config_id.clone(),
            app_id: app_id.clone(),
        })
    }

    pub fn aggregation(&self) -> Option<&Aggregation> {
        self.store.aggregation()
    }

    pub fn stages(&self) -> &[Stage] {
        self.aggregation()
            .map(|agg| agg.stages.as_slice())
            .unwrap_or(&[])
    }

    pub fn active_stage(&self) -> Option<&Stage> {
        let stage_id = self.view.state().active_stage.as_deref()?;
        self.aggregation()?.stage(stage_id)
    }

    pub fn active_tasks(&self) -> &[Task] {
        match (self.aggregation(), self.view.state().active_stage.as_deref()) {
            (Some(agg), Some(stage_id)) => agg.tasks(stage_id),
            _ => &[],
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let task_id = self.view.state().selected_task.as_deref()?;
        self.aggregation()?.find_task(task_id)
    }

    pub fn parameters(&self) -> &[ParameterRecord] {
        self.store
            .current()
            .map(|snap| snap.summary.parameter_records.as_slice())
            .unwrap_or(&[])
    }

    /// The file behind the open preview, if it still exists.
    pub fn preview_file(&self) -> Option<&FileRecord> {
        let name = self.view.state().preview.file()?;
        self.selected_task()?
            .files
            .iter()
            .find(|file| file.file_name == name)
    }

    // ---- refresh pipeline ----

    /// Starts a refresh unless one is already in flight. Preserves the view
    /// before the fetch leaves.
    pub fn request_refresh(&mut self, kind: RefreshKind, now: Instant) -> Option<RefreshTicket> {
        let query = self.summary_query()?;
        let ticket = self.gate.try_begin(kind, query)?;
        self.view.preserve();
        if kind != RefreshKind::Auto {
            self.scheduler.note_refresh(now);
        }
        info!(
            "refresh_started: kind={} id={} app={} config={}",
            kind.as_str(),
            ticket.id,
            ticket.query.app_id,
            ticket.query.config_id
        );
        Some(ticket)
    }

    pub fn complete_refresh(&mut self, event: RefreshEvent, now: Instant) -> RefreshOutcome {
        let RefreshEvent { ticket, result } = event;
        if !self.gate.finish(&ticket) {
            debug!("refresh_ignored: id={}", ticket.id);
            return RefreshOutcome::Ignored;
        }
        if self.summary_query().as_ref() != Some(&ticket.query) {
            self.view.discard_preserved();
            debug!("refresh_stale_target: id={}", ticket.id);
            return RefreshOutcome::Ignored;
        }

        match result {
            Err(reason) => {
                self.view.discard_preserved();
                warn!("refresh_failed: kind={} err={reason}", ticket.kind.as_str());
                self.notices
                    .error(format!("Refresh failed: {reason}"), now);
                RefreshOutcome::Failed(reason)
            }
            Ok(summary) => {
                let aggregation = aggregate_summary(&summary);
                let tasks = aggregation.all_tasks().count();
                let skipped = aggregation.skipped;
                if skipped > 0 {
                    warn!("aggregation_skipped_rows: count={skipped}");
                }
                self.store.replace(SummarySnapshot {
                    query: ticket.query,
                    summary: Arc::new(summary),
                    aggregation: Arc::new(aggregation),
                    fetched_at: Local::now(),
                });
                self.ensure_dependency_index();

                let report = self.view.restore(now);
                if !report.changed.is_empty() {
                    debug!("view_restored: fields={:?}", report.changed);
                }
                self.reconcile_stage();
                self.sync_table_selection();
                self.scheduler.mark_refreshed(Local::now());

                info!(
                    "refresh_applied: kind={} tasks={tasks} skipped={skipped}",
                    ticket.kind.as_str()
                );
                if ticket.kind == RefreshKind::Manual {
                    self.notices.info(format!("Refreshed {tasks} tasks"), now);
                }
                RefreshOutcome::Applied { tasks, skipped }
            }
        }
    }

    /// Switches to a workflow. A fetch for the previous target still in
    /// flight is left to finish and its result discarded.
    pub fn open_workflow(
        &mut self,
        app_id: String,
        config_id: String,
        now: Instant,
    ) -> Vec<Effect> {
        let same = self.target.as_ref() == Some(&(app_id.clone(), config_id.clone()));
        self.screen = Screen::Workflow;
        self.focus = FocusMode::Tasks;
        if same && !self.store.is_empty() {
            return Vec::new();
        }

        info!("workflow_opened: app={app_id} config={config_id}");
        self.target = Some((app_id, config_id));
        self.store.clear();
        self.view.reset();
        self.dep_index = DependencyIndex::default();
        self.table_state.select(None);
        self.panel_cursor = 0;

        match self.request_refresh(RefreshKind::Initial, now) {
            Some(ticket) => vec![Effect::FetchSummary(ticket)],
            None => {
                // The running fetch already answers for this target.
                self.refetch_after_flight =
                    self.gate.in_flight_query() != self.summary_query().as_ref();
                Vec::new()
            }
        }
    }

    pub fn nodes_query(&self) -> NodesQuery {
        let level = self.node_path.len() as i64;
        NodesQuery {
            date: self.config.date,
            app_id: self.node_path.first().map(|node| node.id.clone()),
            config_id: None,
            current_level: level,
            next_level: level + 1,
        }
    }

    pub fn request_nodes(&mut self) -> Option<Effect> {
        if !self.gate.is_mounted() {
            return None;
        }
        self.nodes_loading = true;
        Some(Effect::FetchNodes(self.nodes_query()))
    }

    pub fn complete_nodes(
        &mut self,
        query: NodesQuery,
        result: Result<Vec<WorkflowNode>, String>,
        now: Instant,
    ) {
        if !self.gate.is_mounted() || query != self.nodes_query() {
            return;
        }
        self.nodes_loading = false;
        match result {
            Ok(nodes) => {
                debug!(
                    "nodes_loaded: level={} count={}",
                    query.next_level,
                    nodes.len()
                );
                self.node_state
                    .select(if nodes.is_empty() { None } else { Some(0) });
                self.nodes = nodes;
            }
            Err(reason) => {
                warn!("nodes_failed: err={reason}");
                self.notices
                    .error(format!("Could not load applications: {reason}"), now);
            }
        }
    }

    pub fn apply_event(&mut self, event: AppEvent, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            AppEvent::Summary(event) => {
                self.complete_refresh(event, now);
                if self.refetch_after_flight {
                    if let Some(ticket) = self.request_refresh(RefreshKind::Initial, now) {
                        self.refetch_after_flight = false;
                        effects.push(Effect::FetchSummary(ticket));
                    }
                }
            }
            AppEvent::Nodes { query, result } => self.complete_nodes(query, result, now),
            AppEvent::Action { ticket, result } => {
                if let Some(refresh) = self.complete_action(ticket, result, now) {
                    effects.push(Effect::FetchSummary(refresh));
                }
            }
        }
        effects
    }

    pub fn on_tick(&mut self, now: Instant) -> Vec<Effect> {
        self.notices.prune(now);
        self.view.apply_pending_scroll(now);

        let tick = self.scheduler.poll(now);
        if tick.armed_changed {
            debug!("auto_refresh_armed: armed={}", self.scheduler.is_armed());
        }
        if tick.refresh_due && self.screen == Screen::Workflow {
            if let Some(ticket) = self.request_refresh(RefreshKind::Auto, now) {
                return vec![Effect::FetchSummary(ticket)];
            }
        }
        Vec::new()
    }

    /// Marks the dashboard unmounted: timers stop and late completions are
    /// dropped.
    pub fn teardown(&mut self) {
        self.gate.unmount();
        self.scheduler.teardown();
        info!("console_teardown");
    }

    // ---- view and navigation ----

    pub fn dispatch(&mut self, action: ViewAction) -> bool {
        let before_task = self.view.state().selected_task.clone();
        let before_tab = self.view.state().panel_tab;
        let changed = self.view.dispatch(action);
        if changed {
            let state = self.view.state();
            if state.selected_task != before_task || state.panel_tab != before_tab {
                self.panel_cursor = 0;
            }
            self.sync_table_selection();
        }
        changed
    }

    /// Follows a dependency reference: selects the task, shows its overview
    /// and brings its row into view. Unknown references only raise a warning.
    pub fn follow_dependency(&mut self, reference: &str, now: Instant) -> bool {
        self.ensure_dependency_index();
        let Some(task) = self.dep_index.resolve(reference) else {
            self.notices.warn(
                format!("Dependency {} is not part of this workflow", reference.trim()),
                now,
            );
            return false;
        };
        let (task_id, stage_id, process_id) =
            (task.id.clone(), task.stage_id.clone(), task.process_id);

        if self.view.state().active_stage.as_deref() != Some(stage_id.as_str()) {
            self.dispatch(ViewAction::SelectStage(stage_id));
        }
        self.dispatch(ViewAction::SelectTask(task_id));
        self.dispatch(ViewAction::ShowTab(PanelTab::Overview));
        self.scroll_row_into_view(process_id);
        debug!("dependency_followed: reference={}", reference.trim());
        true
    }

    /// Best effort: a row that is not on screen is simply not scrolled to.
    fn scroll_row_into_view(&mut self, process_id: i64) -> bool {
        let Some(pos) = self
            .active_tasks()
            .iter()
            .position(|task| task.process_id == process_id)
        else {
            return false;
        };
        self.table_state.select(Some(pos));
        if pos < self.table_state.offset() {
            *self.table_state.offset_mut() = pos;
        }
        true
    }

    fn ensure_dependency_index(&mut self) {
        if self.dep_index_generation == self.store.generation() && !self.dep_index.is_empty() {
            return;
        }
        let tasks: Vec<Task> = self
            .aggregation()
            .map(|agg| agg.all_tasks().cloned().collect())
            .unwrap_or_default();
        self.dep_index = DependencyIndex::build(&tasks);
        self.dep_index_generation = self.store.generation();
    }

    fn reconcile_stage(&mut self) {
        let first = self.stages().first().map(|stage| stage.id.clone());
        let present = self.active_stage().is_some();
        if !present {
            if let Some(stage_id) = first {
                self.view.dispatch(ViewAction::SelectStage(stage_id));
            }
        }
    }

    fn sync_table_selection(&mut self) {
        let selected = self.view.state().selected_task.as_deref().and_then(|id| {
            self.active_tasks()
                .iter()
                .position(|task| task.id == id)
        });
        self.table_state.select(selected);
    }

    fn select_stage_offset(&mut self, delta: isize) {
        let stages = self.stages();
        if stages.is_empty() {
            return;
        }
        let len = stages.len() as isize;
        let current = self
            .view
            .state()
            .active_stage
            .as_deref()
            .and_then(|id| stages.iter().position(|stage| stage.id == id))
            .map(|pos| pos as isize)
            .unwrap_or(if delta > 0 { -1 } else { 0 });
        let next = (current + delta).rem_euclid(len) as usize;
        let stage_id = stages[next].id.clone();
        self.dispatch(ViewAction::SelectStage(stage_id));
    }

    fn move_selection(&mut self, delta: isize) {
        let tasks = self.active_tasks();
        if tasks.is_empty() {
            return;
        }
        let max = tasks.len() as isize - 1;
        let next = match self.table_state.selected() {
            Some(current) => (current as isize + delta).clamp(0, max),
            None => 0,
        } as usize;
        let task_id = tasks[next].id.clone();
        self.dispatch(ViewAction::SelectTask(task_id));
    }

    fn panel_rows(&self) -> usize {
        match self.view.state().panel_tab {
            PanelTab::Overview => OVERVIEW_SECTIONS.len(),
            PanelTab::Files => self.selected_task().map_or(0, |task| task.files.len()),
            PanelTab::Dependencies => self
                .selected_task()
                .map_or(0, |task| task.dependencies.len()),
            PanelTab::Parameters | PanelTab::Messages => 0,
        }
    }

    fn move_panel_cursor(&mut self, delta: isize) {
        let rows = self.panel_rows();
        if rows == 0 {
            self.dispatch(ViewAction::ScrollBy(delta as i32));
            return;
        }
        let max = rows as isize - 1;
        self.panel_cursor = (self.panel_cursor as isize + delta).clamp(0, max) as usize;
    }

    fn activate_panel_row(&mut self, enhanced: bool, now: Instant) {
        match self.view.state().panel_tab {
            PanelTab::Overview => {
                if let Some(section) = OVERVIEW_SECTIONS.get(self.panel_cursor) {
                    self.dispatch(ViewAction::ToggleSection(*section));
                }
            }
            PanelTab::Files => {
                let file = self
                    .selected_task()
                    .and_then(|task| task.files.get(self.panel_cursor))
                    .map(|file| file.file_name.clone());
                match file {
                    Some(file) => {
                        self.dispatch(ViewAction::OpenPreview { file, enhanced });
                    }
                    None => self.notices.info("No file to preview", now),
                }
            }
            PanelTab::Dependencies => {
                let reference = self
                    .selected_task()
                    .and_then(|task| task.dependencies.get(self.panel_cursor))
                    .map(|dep| dep.reference.clone());
                if let Some(reference) = reference {
                    self.follow_dependency(&reference, now);
                }
            }
            PanelTab::Parameters | PanelTab::Messages => {}
        }
    }

    // ---- actions ----

    pub fn request_action(
        &mut self,
        kind: ActionKind,
        commentary: &str,
        now: Instant,
    ) -> Option<ActionTicket> {
        let checked = self
            .selected_task()
            .map(|task| (action_guard(kind, task), task.process_id, task.name.clone()));
        let Some((guard, process_id, task_name)) = checked else {
            self.notices.warn("Select a task first", now);
            return None;
        };
        if let Err(reason) = guard {
            self.notices.warn(reason, now);
            return None;
        }
        self.actions_in_flight += 1;
        info!(
            "action_requested: action={} process_id={process_id}",
            kind.as_str()
        );
        Some(ActionTicket {
            kind,
            process_id,
            task_name,
            actor: self.config.actor.clone(),
            commentary: commentary.trim().to_string(),
        })
    }

    /// Reports the outcome; a successful action triggers a silent refresh.
    pub fn complete_action(
        &mut self,
        ticket: ActionTicket,
        result: Result<ApiResponse<()>, String>,
        now: Instant,
    ) -> Option<RefreshTicket> {
        self.actions_in_flight = self.actions_in_flight.saturating_sub(1);
        if !self.gate.is_mounted() {
            return None;
        }
        match result {
            Ok(response) if response.success => {
                info!(
                    "action_succeeded: action={} process_id={}",
                    ticket.kind.as_str(),
                    ticket.process_id
                );
                self.notices.success(
                    format!("{}: {}", ticket.task_name, response.outcome_text()),
                    now,
                );
                self.request_refresh(RefreshKind::AfterAction, now)
            }
            Ok(response) => {
                warn!(
                    "action_rejected: action={} process_id={} reason={}",
                    ticket.kind.as_str(),
                    ticket.process_id,
                    response.outcome_text()
                );
                self.notices.error(
                    format!(
                        "Could not {} {}: {}",
                        ticket.kind.as_str().replace('_', " "),
                        ticket.task_name,
                        response.outcome_text()
                    ),
                    now,
                );
                None
            }
            Err(reason) => {
                warn!(
                    "action_failed: action={} process_id={} err={reason}",
                    ticket.kind.as_str(),
                    ticket.process_id
                );
                self.notices.error(format!("Action failed: {reason}"), now);
                None
            }
        }
    }

    fn begin_action(&mut self, kind: ActionKind, now: Instant) -> Vec<Effect> {
        match kind {
            ActionKind::Approve | ActionKind::Reject => {
                let checked = self
                    .selected_task()
                    .map(|task| (action_guard(kind, task), task.name.clone()));
                match checked {
                    None => self.notices.warn("Select a task first", now),
                    Some((Err(reason), _)) => self.notices.warn(reason, now),
                    Some((Ok(()), task_name)) => {
                        self.prompt = Some(CommentaryPrompt {
                            kind,
                            task_name,
                            input: String::new(),
                        });
                    }
                }
                Vec::new()
            }
            ActionKind::ForceStart | ActionKind::ReRun => self
                .request_action(kind, "", now)
                .map(Effect::RunAction)
                .into_iter()
                .collect(),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Vec::new();
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
            }
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char(ch) => {
                prompt.input.push(ch);
            }
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    return self
                        .request_action(prompt.kind, &prompt.input, now)
                        .map(Effect::RunAction)
                        .into_iter()
                        .collect();
                }
            }
            _ => {}
        }
        Vec::new()
    }

    // ---- input ----

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        self.scheduler.record_activity(now);

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }
        if self.prompt.is_some() {
            return self.handle_prompt_key(key, now);
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                Vec::new()
            }
            _ => match self.screen {
                Screen::Applications => self.handle_applications_key(key, now),
                Screen::Workflow => self.handle_workflow_key(key, now),
            },
        }
    }

    fn handle_applications_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                move_list(&mut self.node_state, self.nodes.len(), 1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                move_list(&mut self.node_state, self.nodes.len(), -1);
            }
            KeyCode::Char('r') => {
                return self.request_nodes().into_iter().collect();
            }
            KeyCode::Esc | KeyCode::Backspace => {
                if self.node_path.pop().is_some() {
                    self.nodes.clear();
                    return self.request_nodes().into_iter().collect();
                }
                if self.target.is_some() {
                    self.screen = Screen::Workflow;
                }
            }
            KeyCode::Enter => return self.enter_node(now),
            _ => {}
        }
        Vec::new()
    }

    fn enter_node(&mut self, now: Instant) -> Vec<Effect> {
        let Some(node) = self
            .node_state
            .selected()
            .and_then(|idx| self.nodes.get(idx))
            .cloned()
        else {
            return Vec::new();
        };
        match self.node_path.first() {
            Some(app) => {
                let app_id = app.id.clone();
                let config_id = node.config_id.clone().unwrap_or(node.id);
                self.open_workflow(app_id, config_id, now)
            }
            None => match node.config_id.clone() {
                Some(config_id) => self.open_workflow(node.id, config_id, now),
                None => {
                    self.node_path.push(node);
                    self.nodes.clear();
                    self.node_state.select(None);
                    self.request_nodes().into_iter().collect()
                }
            },
        }
    }

    fn handle_workflow_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc => {
                if self.view.state().preview.is_previewing() {
                    self.dispatch(ViewAction::ClosePreview);
                } else if self.focus == FocusMode::Panel {
                    self.focus = FocusMode::Tasks;
                } else if self.view.state().selected_task.is_some() {
                    self.dispatch(ViewAction::ClearSelection);
                }
            }
            KeyCode::Backspace => {
                self.screen = Screen::Applications;
                if self.nodes.is_empty() {
                    return self.request_nodes().into_iter().collect();
                }
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    FocusMode::Tasks => FocusMode::Panel,
                    FocusMode::Panel => FocusMode::Tasks,
                };
            }
            KeyCode::Left | KeyCode::Char('h') => self.select_stage_offset(-1),
            KeyCode::Right | KeyCode::Char('l') => self.select_stage_offset(1),
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                FocusMode::Tasks => self.move_selection(1),
                FocusMode::Panel => self.move_panel_cursor(1),
            },
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                FocusMode::Tasks => self.move_selection(-1),
                FocusMode::Panel => self.move_panel_cursor(-1),
            },
            KeyCode::PageDown => {
                self.dispatch(ViewAction::ScrollBy(PAGE_SCROLL));
            }
            KeyCode::PageUp => {
                self.dispatch(ViewAction::ScrollBy(-PAGE_SCROLL));
            }
            KeyCode::Char(']') => {
                let tab = self.view.state().panel_tab.next();
                self.dispatch(ViewAction::ShowTab(tab));
            }
            KeyCode::Char('[') => {
                let tab = self.view.state().panel_tab.prev();
                self.dispatch(ViewAction::ShowTab(tab));
            }
            KeyCode::Char(ch @ '1'..='5') => {
                let idx = (ch as usize) - ('1' as usize);
                self.dispatch(ViewAction::ShowTab(PanelTab::ALL[idx]));
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.focus == FocusMode::Tasks {
                    if self.view.state().selected_task.is_none() {
                        self.move_selection(0);
                    }
                    self.focus = FocusMode::Panel;
                } else {
                    self.activate_panel_row(true, now);
                }
            }
            KeyCode::Char('L') => {
                if self.view.state().panel_tab == PanelTab::Files {
                    self.activate_panel_row(false, now);
                }
            }
            KeyCode::Char('r') => {
                return self
                    .request_refresh(RefreshKind::Manual, now)
                    .map(Effect::FetchSummary)
                    .into_iter()
                    .collect();
            }
            KeyCode::Char('A') => {
                let enabled = self.scheduler.toggle(now);
                let label = if enabled { "on" } else { "off" };
                self.notices.info(format!("Auto-refresh {label}"), now);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let secs = self.scheduler.interval_secs() + INTERVAL_STEP_SECS;
                self.scheduler.set_interval(secs, now);
            }
            KeyCode::Char('-') => {
                let secs = self
                    .scheduler
                    .interval_secs()
                    .saturating_sub(INTERVAL_STEP_SECS);
                self.scheduler.set_interval(secs, now);
            }
            KeyCode::Char('a') => return self.begin_action(ActionKind::Approve, now),
            KeyCode::Char('x') => return self.begin_action(ActionKind::Reject, now),
            KeyCode::Char('s') => return self.begin_action(ActionKind::ForceStart, now),
            KeyCode::Char('u') => return self.begin_action(ActionKind::ReRun, now),
            _ => {}
        }
        Vec::new()
    }

    pub fn handle_mouse(&mut self, event: MouseEvent, now: Instant) {
        self.scheduler.record_activity(now);
        if self.screen != Screen::Workflow || self.prompt.is_some() {
            return;
        }
        let in_panel = self
            .layout
            .panel
            .is_some_and(|area| contains(area, event.column, event.row));
        match event.kind {
            MouseEventKind::ScrollUp if in_panel => {
                self.dispatch(ViewAction::ScrollBy(-1));
            }
            MouseEventKind::ScrollDown if in_panel => {
                self.dispatch(ViewAction::ScrollBy(1));
            }
            MouseEventKind::ScrollUp => self.move_selection(-1),
            MouseEventKind::ScrollDown => self.move_selection(1),
            MouseEventKind::Down(MouseButton::Left) => {
                if in_panel {
                    self.focus = FocusMode::Panel;
                } else if let Some(row) = self.task_row_at(event.column, event.row) {
                    let task_id = self.active_tasks().get(row).map(|task| task.id.clone());
                    if let Some(task_id) = task_id {
                        self.focus = FocusMode::Tasks;
                        self.dispatch(ViewAction::SelectTask(task_id));
                    }
                }
            }
            _ => {}
        }
    }

    pub fn update_layout(&mut self, tasks: Option<Rect>, panel: Option<Rect>) {
        self.layout = LayoutAreas { tasks, panel };
    }

    fn task_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.layout.tasks?;
        if !contains(area, column, row) {
            return None;
        }
        // Border plus header row.
        let header_height = 2u16;
        if area.height <= header_height + 1 {
            return None;
        }
        let data_start = area.y.saturating_add(header_height);
        let data_end = area.y.saturating_add(area.height.saturating_sub(1));
        if row < data_start || row >= data_end {
            return None;
        }
        Some(self.table_state.offset() + (row - data_start) as usize)
    }
}

/// Why `kind` is not allowed on `task`, if it is not.
pub fn action_guard(kind: ActionKind, task: &Task) -> Result<(), String> {
    if task.process_id <= 0 {
        return Err(format!("{} has no process id", task.name));
    }
    match kind {
        ActionKind::Approve | ActionKind::Reject if !task.flags.requires_approval => {
            Err(format!("{} does not require approval", task.name))
        }
        ActionKind::ForceStart if task.status == TaskStatus::Completed => {
            Err(format!("{} is already completed", task.name))
        }
        _ => Ok(()),
    }
}

fn move_list(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let max = len as isize - 1;
    let next = match state.selected() {
        Some(current) => (current as isize + delta).clamp(0, max),
        None => 0,
    };
    state.select(Some(next as usize));
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
