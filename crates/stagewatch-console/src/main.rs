use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use stagewatch_console::{
    app::{App, AppEvent},
    config::{init_logging, Args, ConsoleConfig},
    runtime::spawn_effects,
    ui,
};
use stagewatch_service::FileWorkflowService;
use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const UI_TICK_MS: u64 = 250;
const EVENT_QUEUE_CAPACITY: usize = 64;

type ConsoleTerminal = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConsoleConfig::from_args(Args::parse())?;
    init_logging();
    info!(
        "console_start: data_dir={} date={} actor={}",
        config.data_dir.display(),
        config.date,
        config.actor
    );

    let service = Arc::new(FileWorkflowService::new(config.data_dir.clone()));
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let mut app = App::new(config, Instant::now());
    let startup = app.start(Instant::now());
    spawn_effects(&service, startup, &event_tx);

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut app, &service, &event_tx, &mut event_rx).await;
    app.teardown();
    restore_terminal(&mut terminal)?;

    if let Err(err) = &result {
        eprintln!("stagewatch: {err:#}");
    }
    result
}

async fn run(
    terminal: &mut ConsoleTerminal,
    app: &mut App,
    service: &Arc<FileWorkflowService>,
    event_tx: &mpsc::Sender<AppEvent>,
    event_rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let mut input = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(UI_TICK_MS));

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        let effects = tokio::select! {
            _ = ticker.tick() => app.on_tick(Instant::now()),
            Some(event) = event_rx.recv() => app.apply_event(event, Instant::now()),
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => app.handle_key(key, Instant::now()),
                Some(Ok(Event::Mouse(mouse))) => {
                    app.handle_mouse(mouse, Instant::now());
                    Vec::new()
                }
                Some(Ok(_)) => Vec::new(),
                Some(Err(err)) => {
                    warn!("input_error: {err}");
                    Vec::new()
                }
                None => break,
            },
        };
        spawn_effects(service, effects, event_tx);

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<ConsoleTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut ConsoleTerminal) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
