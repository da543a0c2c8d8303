use crate::app::{App, FocusMode, Screen, OVERVIEW_SECTIONS};
use crate::theme::{self, icons};
use crate::view::{PanelTab, PreviewMode, Section};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};
use stagewatch_core::{classify_status, FileDirection, FileRecord, Task};

pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    match app.screen() {
        Screen::Applications => {
            app.update_layout(None, None);
            render_applications(f, app, chunks[1]);
        }
        Screen::Workflow => render_workflow(f, app, chunks[1]),
    }
    render_footer(f, app, chunks[2]);

    if app.view().preview.is_previewing() && app.screen() == Screen::Workflow {
        render_preview(f, app, centered_rect(80, 70, area));
    }
    if app.prompt().is_some() {
        render_prompt(f, app, centered_rect(60, 20, area));
    }
    if app.show_help() {
        render_help(f, centered_rect(60, 80, area));
    }
}

fn focus_border(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let config = app.config();
    let mut title = vec![Span::styled("stagewatch", theme::HEADER_STYLE)];
    if let Some((app_id, config_id)) = app.target() {
        title.push(Span::raw(format!("  {app_id} / {config_id}")));
    }
    title.push(Span::styled(
        format!("  {}", stagewatch_core::format_api_date(config.date)),
        theme::MUTED_STYLE,
    ));
    if app.is_refreshing() {
        title.push(Span::styled("  refreshing...", Color::Yellow));
    }
    if app.actions_in_flight() > 0 {
        title.push(Span::styled(
            format!("  {} action(s) pending", app.actions_in_flight()),
            Color::Yellow,
        ));
    }

    let mut kpis = Vec::new();
    if let Some(agg) = app.aggregation() {
        let counts = agg.status_counts();
        let entries = [
            ("Done", counts.completed, stagewatch_core::StatusClass::Completed),
            ("Running", counts.in_progress, stagewatch_core::StatusClass::InProgress),
            ("Failed", counts.failed, stagewatch_core::StatusClass::Failed),
            ("Rejected", counts.rejected, stagewatch_core::StatusClass::Rejected),
            ("Pending", counts.pending, stagewatch_core::StatusClass::Pending),
            ("Not started", counts.not_started, stagewatch_core::StatusClass::NotStarted),
        ];
        for (label, value, class) in entries {
            kpis.push(Span::styled(
                format!("{label} {value}"),
                theme::class_color(class),
            ));
            kpis.push(Span::raw("  "));
        }
        kpis.push(Span::raw(format!("Total {}", counts.total)));
        kpis.push(Span::styled(
            format!("  Overall {}%", agg.overall_percent),
            Style::default()
                .fg(theme::percent_color(agg.overall_percent))
                .add_modifier(Modifier::BOLD),
        ));
    } else if app.screen() == Screen::Workflow {
        kpis.push(Span::styled("No data loaded", theme::MUTED_STYLE));
    }

    let scheduler = app.scheduler();
    let auto = if !scheduler.is_enabled() {
        format!("Auto-refresh off ({}s)", scheduler.interval_secs())
    } else if scheduler.is_armed() {
        format!(
            "Auto-refresh {}s, next in {}s",
            scheduler.interval_secs(),
            scheduler.countdown_secs()
        )
    } else {
        format!(
            "Auto-refresh {}s, paused while idle",
            scheduler.interval_secs()
        )
    };
    let last = scheduler
        .last_refreshed()
        .map(|at| format!("  Last refreshed {}", at.format("%H:%M:%S")))
        .unwrap_or_default();

    let lines = vec![
        Line::from(title),
        Line::from(kpis),
        Line::from(Span::styled(format!("{auto}{last}"), theme::MUTED_STYLE)),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_applications(f: &mut Frame, app: &mut App, area: Rect) {
    let crumbs: Vec<String> = app.node_path().iter().map(|node| node.name.clone()).collect();
    let title = if crumbs.is_empty() {
        "Applications".to_string()
    } else {
        format!("Applications > {}", crumbs.join(" > "))
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(focus_border(true));

    if app.nodes().is_empty() {
        let message = if app.nodes_loading() {
            "Loading..."
        } else {
            "Nothing here. Press r to reload, Backspace to go up."
        };
        let p = Paragraph::new(Line::from(Span::styled(message, Color::Yellow))).block(block);
        f.render_widget(p, area);
        return;
    }

    let items: Vec<ListItem> = app
        .nodes()
        .iter()
        .map(|node| {
            let percent = node.completion_percent();
            let mut spans = vec![Span::raw(format!("{:<32}", node.name))];
            if node.total > 0 {
                spans.push(Span::styled(
                    format!(
                        " {:>3}%  {}/{} done, {} running, {} failed",
                        percent, node.completed, node.total, node.in_progress, node.failed
                    ),
                    theme::percent_color(percent),
                ));
            }
            if !node.status.is_empty() {
                spans.push(Span::styled(
                    format!("  [{}]", node.status),
                    theme::class_color(classify_status(&node.status)),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::SELECTED_STYLE)
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.node_state);
}

fn render_workflow(f: &mut Frame, app: &mut App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);
    render_stage_tabs(f, app, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);
    app.update_layout(Some(body[0]), Some(body[1]));
    render_tasks(f, app, body[0]);
    render_panel(f, app, body[1]);
}

fn render_stage_tabs(f: &mut Frame, app: &App, area: Rect) {
    let stages = app.stages();
    if stages.is_empty() {
        return;
    }
    let titles: Vec<Line> = stages
        .iter()
        .map(|stage| {
            Line::from(vec![
                Span::raw(stage.name.clone()),
                Span::styled(
                    format!(" {}%", stage.completion_percent),
                    theme::percent_color(stage.completion_percent),
                ),
            ])
        })
        .collect();
    let selected = app
        .view()
        .active_stage
        .as_deref()
        .and_then(|id| stages.iter().position(|stage| stage.id == id))
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(theme::SELECTED_STYLE)
        .divider("|");
    f.render_widget(tabs, area);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let title = app
        .active_stage()
        .map(|stage| format!("{} ({} tasks)", stage.name, stage.task_ids.len()))
        .unwrap_or_else(|| "Tasks".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(focus_border(app.focus() == FocusMode::Tasks));

    if app.active_tasks().is_empty() {
        let message = if app.is_refreshing() {
            "Loading workflow..."
        } else {
            "No tasks in this stage. Press r to refresh."
        };
        let p = Paragraph::new(Line::from(Span::styled(message, Color::Yellow))).block(block);
        f.render_widget(p, area);
        return;
    }

    let rows: Vec<Row> = app
        .active_tasks()
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let class = classify_status(&task.raw_status);
            let mut flags = String::new();
            if task.flags.requires_approval {
                flags.push_str(icons::APPROVAL);
            }
            if task.flags.locked {
                flags.push_str(icons::LOCKED);
            }
            let attempt = if task.attempt > 1 {
                format!("x{}", task.attempt)
            } else {
                String::new()
            };
            Row::new(vec![
                Cell::from(Span::styled(theme::class_icon(class), theme::class_color(class))),
                Cell::from(task.sequence.to_string()),
                Cell::from(task.name.clone()),
                Cell::from(Span::styled(
                    status_label(task),
                    theme::class_color(class),
                )),
                Cell::from(Span::styled(
                    format!("{:>3}%", task.progress),
                    theme::percent_color(task.progress),
                )),
                Cell::from(Span::styled(flags, Color::Yellow)),
                Cell::from(Span::styled(attempt, theme::MUTED_STYLE)),
            ])
            .style(theme::zebra_row_style(idx))
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(4),
        Constraint::Min(12),
        Constraint::Length(12),
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Length(3),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["S", "#", "Sub-stage", "Status", "Prog", "F", "Try"])
                .style(theme::HEADER_STYLE),
        )
        .block(block)
        .highlight_style(theme::SELECTED_STYLE);

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn status_label(task: &Task) -> String {
    if task.raw_status.trim().is_empty() {
        task.status.as_str().replace('_', " ")
    } else {
        task.raw_status.trim().to_string()
    }
}

fn render_panel(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Details")
        .border_style(focus_border(app.focus() == FocusMode::Panel));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let titles: Vec<Line> = PanelTab::ALL
        .iter()
        .enumerate()
        .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(view.panel_tab.index())
        .highlight_style(theme::HEADER_STYLE.add_modifier(Modifier::UNDERLINED))
        .divider(" ");
    f.render_widget(tabs, parts[0]);

    let lines = if view.panel_tab == PanelTab::Parameters {
        parameter_lines(app)
    } else {
        match app.selected_task() {
            None => vec![Line::from(Span::styled(
                "Select a task to see its details.",
                theme::MUTED_STYLE,
            ))],
            Some(task) => match view.panel_tab {
                PanelTab::Overview => overview_lines(app, task),
                PanelTab::Files => file_lines(app, task),
                PanelTab::Dependencies => dependency_lines(app, task),
                PanelTab::Messages => message_lines(task),
                PanelTab::Parameters => Vec::new(),
            },
        }
    };

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((view.scroll_y, 0));
    f.render_widget(p, parts[1]);
}

fn cursor_style(app: &App, row: usize) -> Style {
    if app.focus() == FocusMode::Panel && app.panel_cursor() == row {
        theme::SELECTED_STYLE
    } else {
        Style::default()
    }
}

fn labelled(label: &str, value: Option<&str>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label}: "), Style::default().fg(Color::DarkGray)),
        Span::raw(value.unwrap_or("-").to_string()),
    ])
}

fn yes_no(value: bool) -> Option<&'static str> {
    Some(if value { "yes" } else { "no" })
}

fn overview_lines(app: &App, task: &Task) -> Vec<Line<'static>> {
    let class = classify_status(&task.raw_status);
    let mut lines = vec![
        Line::from(Span::styled(
            task.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(status_label(task), theme::class_color(class)),
            Span::raw(format!("  {}%", task.progress)),
            Span::styled(
                format!("  process {}  attempt {}", task.process_id, task.attempt),
                theme::MUTED_STYLE,
            ),
        ]),
        Line::from(""),
    ];

    let expanded = &app.view().expanded_sections;
    for (row, section) in OVERVIEW_SECTIONS.iter().enumerate() {
        let open = expanded.contains(section);
        let icon = if open { icons::EXPANDED } else { icons::COLLAPSED };
        lines.push(Line::from(Span::styled(
            format!("{icon} {}", section.label()),
            cursor_style(app, row).fg(Color::Blue),
        )));
        if !open {
            continue;
        }
        match section {
            Section::Timing => {
                lines.push(labelled("Duration", task.timing.duration.as_deref()));
                lines.push(labelled("Started", task.timing.started_at.as_deref()));
                lines.push(labelled("Updated", task.timing.updated_at.as_deref()));
                lines.push(labelled("Completed", task.timing.completed_at.as_deref()));
            }
            Section::Actors => {
                lines.push(labelled("Updated by", task.actors.updated_by.as_deref()));
                lines.push(labelled("Completed by", task.actors.completed_by.as_deref()));
                lines.push(labelled("Locked by", task.actors.locked_by.as_deref()));
                lines.push(labelled("Attested by", task.actors.attested_by.as_deref()));
            }
            Section::Flags => {
                let flags = task.flags;
                lines.push(labelled("Auto", yes_no(flags.auto)));
                lines.push(labelled("Ad hoc", yes_no(flags.adhoc)));
                lines.push(labelled("Requires upload", yes_no(flags.requires_upload)));
                lines.push(labelled("Requires approval", yes_no(flags.requires_approval)));
                lines.push(labelled("Locked", yes_no(flags.locked)));
                lines.push(labelled("Attested", yes_no(flags.attested)));
            }
            Section::Messages => match task.messages.last() {
                Some(message) => lines.push(Line::from(format!("  {}", message.text))),
                None => lines.push(Line::from(Span::styled(
                    "  No messages.",
                    theme::MUTED_STYLE,
                ))),
            },
        }
    }
    lines
}

fn direction_label(file: &FileRecord) -> &'static str {
    match file.direction() {
        FileDirection::Input => "in ",
        FileDirection::Output => "out",
        FileDirection::Other => " - ",
    }
}

fn file_lines(app: &App, task: &Task) -> Vec<Line<'static>> {
    if task.files.is_empty() {
        return vec![Line::from(Span::styled("No files.", theme::MUTED_STYLE))];
    }
    let mut lines: Vec<Line> = task
        .files
        .iter()
        .enumerate()
        .map(|(row, file)| {
            let mut text = format!("{} {}", direction_label(file), file.file_name);
            if let Some(size) = file.size_bytes {
                text.push_str(&format!("  {}", human_size(size)));
            }
            if let Some(count) = file.row_count {
                text.push_str(&format!("  {count} rows"));
            }
            Line::from(Span::styled(text, cursor_style(app, row)))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter: preview  L: plain preview",
        theme::MUTED_STYLE,
    )));
    lines
}

fn dependency_lines(app: &App, task: &Task) -> Vec<Line<'static>> {
    if task.dependencies.is_empty() {
        return vec![Line::from(Span::styled(
            "No dependencies.",
            theme::MUTED_STYLE,
        ))];
    }
    let mut lines: Vec<Line> = task
        .dependencies
        .iter()
        .enumerate()
        .map(|(row, dep)| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", dep.status.as_str().replace('_', " ")),
                    theme::status_color(dep.status),
                ),
                Span::styled(dep.name.clone(), theme::LINK_STYLE.patch(cursor_style(app, row))),
                Span::styled(format!("  ({})", dep.reference), theme::MUTED_STYLE),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter: go to task",
        theme::MUTED_STYLE,
    )));
    lines
}

fn parameter_lines(app: &App) -> Vec<Line<'static>> {
    let params = app.parameters();
    if params.is_empty() {
        return vec![Line::from(Span::styled("No parameters.", theme::MUTED_STYLE))];
    }
    let mut lines = Vec::with_capacity(params.len() * 2);
    for param in params {
        let mut spans = vec![
            Span::styled(param.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(" = {}", param.value)),
        ];
        if !param.param_type.is_empty() {
            spans.push(Span::styled(
                format!("  ({})", param.param_type),
                theme::MUTED_STYLE,
            ));
        }
        lines.push(Line::from(spans));
        if let Some(description) = &param.description {
            lines.push(Line::from(Span::styled(
                format!("  {description}"),
                theme::MUTED_STYLE,
            )));
        }
    }
    lines
}

fn message_lines(task: &Task) -> Vec<Line<'static>> {
    if task.messages.is_empty() {
        return vec![Line::from(Span::styled("No messages.", theme::MUTED_STYLE))];
    }
    let mut lines = Vec::new();
    for message in &task.messages {
        lines.push(Line::from(Span::styled(
            format!(
                "{} {}",
                message.author.as_deref().unwrap_or("system"),
                message.at.as_deref().unwrap_or("")
            ),
            Style::default().fg(Color::Blue),
        )));
        lines.push(Line::from(message.text.clone()));
        lines.push(Line::from(""));
    }
    lines
}

fn render_preview(f: &mut Frame, app: &App, area: Rect) {
    let preview = &app.view().preview;
    let (name, enhanced) = match preview {
        PreviewMode::Browsing => return,
        PreviewMode::PreviewingFileEnhanced { file } => (file.as_str(), true),
        PreviewMode::PreviewingFileLegacy { file } => (file.as_str(), false),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Preview: {name}"))
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let Some(file) = app.preview_file() else {
        let p = Paragraph::new(Span::styled(
            "This file is no longer part of the task.",
            Color::Yellow,
        ));
        f.render_widget(p, inner);
        return;
    };
    let content = file.preview.as_deref().unwrap_or("");

    if !enhanced {
        let p = Paragraph::new(content.to_string()).wrap(Wrap { trim: false });
        f.render_widget(p, inner);
        return;
    }

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(inner);
    let meta = vec![
        Line::from(vec![
            Span::styled("Direction: ", Style::default().fg(Color::DarkGray)),
            Span::raw(direction_label(file).trim().to_string()),
            Span::styled("  Size: ", Style::default().fg(Color::DarkGray)),
            Span::raw(file.size_bytes.map(human_size).unwrap_or_else(|| "-".into())),
            Span::styled("  Rows: ", Style::default().fg(Color::DarkGray)),
            Span::raw(
                file.row_count
                    .map(|count| count.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]),
        labelled("Path", file.path.as_deref()),
        labelled("Uploaded by", file.uploaded_by.as_deref()),
        labelled("Timestamp", file.timestamp.as_deref()),
    ];
    f.render_widget(Paragraph::new(meta), parts[0]);

    let grid = delimited_rows(content);
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
    if columns < 2 {
        let p = Paragraph::new(content.to_string()).wrap(Wrap { trim: false });
        f.render_widget(p, parts[1]);
        return;
    }
    let mut rows = grid.into_iter();
    let header = rows
        .next()
        .map(|cells| Row::new(cells).style(theme::HEADER_STYLE))
        .unwrap_or_default();
    let body: Vec<Row> = rows
        .enumerate()
        .map(|(idx, cells)| Row::new(cells).style(theme::zebra_row_style(idx)))
        .collect();
    let widths = vec![Constraint::Min(6); columns];
    f.render_widget(Table::new(body, widths).header(header), parts[1]);
}

/// Splits preview text on commas, or tabs when the first line has any.
fn delimited_rows(content: &str) -> Vec<Vec<String>> {
    let delimiter = match content.lines().next() {
        Some(first) if first.contains('\t') => '\t',
        _ => ',',
    };
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(delimiter)
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect()
}

fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn render_prompt(f: &mut Frame, app: &App, area: Rect) {
    let Some(prompt) = app.prompt() else {
        return;
    };
    let verb = match prompt.kind {
        stagewatch_service::ActionKind::Reject => "Reject",
        _ => "Approve",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{verb} {}", prompt.task_name))
        .border_style(Style::default().fg(Color::Yellow));
    let lines = vec![
        Line::from(Span::styled("Commentary:", Style::default().fg(Color::DarkGray))),
        Line::from(format!("{}_", prompt.input)),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: send  Esc: cancel",
            theme::MUTED_STYLE,
        )),
    ];
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let line = match app.notices().latest() {
        Some(notice) => Line::from(Span::styled(
            notice.text.clone(),
            theme::notice_style(notice.level),
        )),
        None => {
            let hints = match app.screen() {
                Screen::Applications => "Enter open  Backspace up  r reload  ? help  q quit",
                Screen::Workflow => {
                    "h/l stage  j/k task  Tab focus  [ ] tab  r refresh  A auto  ? help  q quit"
                }
            };
            Line::from(Span::styled(hints, theme::MUTED_STYLE))
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

const HELP: &[(&str, &str)] = &[
    ("h / l", "Previous / next stage"),
    ("j / k", "Next / previous task (or panel row)"),
    ("Tab", "Switch focus between tasks and details"),
    ("[ / ]  1-5", "Change details tab"),
    ("Enter / Space", "Open details, toggle section, preview file, follow dependency"),
    ("L", "Plain file preview"),
    ("PgUp / PgDn", "Scroll details"),
    ("Esc", "Close preview, leave details, clear selection"),
    ("Backspace", "Back to applications"),
    ("a / x", "Approve / reject (asks for commentary)"),
    ("s / u", "Force start / re-run"),
    ("r", "Refresh now"),
    ("A", "Toggle auto-refresh"),
    ("+ / -", "Auto-refresh interval"),
    ("?", "Toggle help"),
    ("q", "Quit"),
];

fn render_help(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Yellow));
    let mut text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (keys, action) in HELP {
        text.push(Line::from(vec![
            Span::styled(format!("{keys:<15}"), Color::Cyan),
            Span::raw(*action),
        ]));
    }
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
