use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use salain::source::DEMO_REPLAY;
use salain::ui::Theme;
use salain::{events, ui, App, Scheduler, Settings, SnapshotBuilder};

#[derive(Parser, Debug)]
#[command(name = "salain")]
#[command(about = "Telemetry acquisition and dashboard for the S.A.L.A.I.N. water-treatment array")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Acquisition interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Store query budget in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// History capacity per metric (20-30)
    #[arg(long)]
    capacity: Option<usize>,

    /// Base URL of the remote store; synthetic data is used when unset
    #[arg(long)]
    store_url: Option<String>,

    /// Fixed RNG seed for reproducible synthetic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Device identifier reported in telemetry
    #[arg(long)]
    device_id: Option<String>,

    /// Directory for stats exports
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Replay the built-in demo samples instead of a random walk
    #[arg(long)]
    replay_demo: bool,

    /// Print one telemetry line per cycle instead of the dashboard
    #[arg(long, conflicts_with_all = ["telemetry", "export"])]
    headless: bool,

    /// Print the current telemetry payload and exit
    #[arg(long, conflicts_with = "export")]
    telemetry: bool,

    /// Write the stats export and exit
    #[arg(short, long)]
    export: bool,

    /// Write logs to this file (the dashboard otherwise logs nothing)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn is_interactive(&self) -> bool {
        !(self.headless || self.telemetry || self.export)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let settings = load_settings(&args)?;
    let rt = Runtime::new()?;

    let source = settings.build_source()?;
    let scheduler = rt.block_on(Scheduler::bootstrap(
        source,
        settings.history_capacity,
        settings.interval(),
        settings.classifier(),
    ));
    let snapshots = settings.snapshot_builder();

    if args.export {
        let path =
            snapshots.write_export(&scheduler.state(), &settings.export_dir, chrono::Utc::now())?;
        println!("Exported stats to: {}", path.display());
        return Ok(());
    }

    if args.telemetry {
        let snapshot = snapshots.telemetry(&scheduler.state(), chrono::Utc::now());
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if args.headless {
        return rt.block_on(run_headless(scheduler, snapshots));
    }

    run_tui(&rt, scheduler, snapshots, settings.export_dir.clone())
}

/// Headless mode logs to stderr; the dashboard only logs when given a file.
fn init_logging(args: &Args) -> Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if !args.is_interactive() {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Settings file and environment, then command-line overrides.
fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;

    if let Some(ms) = args.interval_ms {
        settings.interval_ms = ms;
    }
    if let Some(ms) = args.timeout_ms {
        settings.timeout_ms = ms;
    }
    if let Some(capacity) = args.capacity {
        settings.history_capacity = capacity;
    }
    if let Some(url) = &args.store_url {
        let mut store = settings.store.take().unwrap_or_default();
        store.url = url.clone();
        settings.store = Some(store);
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if args.device_id.is_some() {
        settings.device_id = args.device_id.clone();
    }
    if let Some(dir) = &args.export_dir {
        settings.export_dir = dir.clone();
    }
    if args.replay_demo {
        settings.replay = DEMO_REPLAY.to_vec();
    }

    settings.validate()?;
    Ok(settings)
}

/// Print compact telemetry for every applied cycle until Ctrl-C.
async fn run_headless(scheduler: Scheduler, snapshots: SnapshotBuilder) -> Result<()> {
    let handle = scheduler.start();
    let mut updates = scheduler.subscribe();
    info!(source = scheduler.description(), "running headless");

    let print = |scheduler: &Scheduler| -> Result<()> {
        let snapshot = snapshots.telemetry(&scheduler.state(), chrono::Utc::now());
        println!("{}", serde_json::to_string(&snapshot)?);
        Ok(())
    };
    print(&scheduler)?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print(&scheduler)?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    Ok(())
}

/// Run the dashboard until the user quits.
fn run_tui(
    rt: &Runtime,
    scheduler: Scheduler,
    snapshots: SnapshotBuilder,
    export_dir: PathBuf,
) -> Result<()> {
    let handle = {
        let _guard = rt.enter();
        scheduler.start()
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(
        scheduler,
        rt.handle().clone(),
        snapshots,
        export_dir,
        Theme::auto_detect(),
    );

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    rt.block_on(handle.stop());
    if let Err(e) = &result {
        warn!(error = %e, "dashboard exited with error");
    }
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.refresh_state();
        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                // Redrawn on the next iteration
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    Ok(())
}
