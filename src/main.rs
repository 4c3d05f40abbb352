//! user-dashboard binary entry point.
//!
//! Parses flags, loads config, sets up file logging and the API worker,
//! then runs the TUI and restores the terminal on exit.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::{EnvFilter, fmt};

use user_dashboard::api::memory::InMemoryApi;
use user_dashboard::api::worker::ApiWorker;
use user_dashboard::app::config::{Settings, Theme, config_dir};
use user_dashboard::app::keymap::Keymap;
use user_dashboard::app::{self, AppState};
use user_dashboard::pager::ItemsPerPage;

/// Terminal dashboard for browsing and editing users.
#[derive(Parser, Debug)]
#[command(name = "user-dashboard", version, about)]
struct Cli {
    /// JSON file with the initial users (`{"users": [...]}` or a bare list).
    #[arg(long, env = "USER_DASHBOARD_SEED")]
    seed: Option<PathBuf>,

    /// Simulated backend latency per call.
    #[arg(long, env = "USER_DASHBOARD_LATENCY_MS")]
    latency_ms: Option<u64>,

    /// Rows per page: 10, 25, 50 or 100.
    #[arg(long, env = "USER_DASHBOARD_PAGE_SIZE")]
    page_size: Option<usize>,

    /// Users requested per (re)load.
    #[arg(long, env = "USER_DASHBOARD_FETCH_LIMIT")]
    fetch_limit: Option<usize>,

    /// Where settings.conf, theme.conf and keybinds.conf live.
    #[arg(long, env = "USER_DASHBOARD_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Log file; defaults to user-dashboard.log in the config directory.
    #[arg(long, env = "USER_DASHBOARD_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log filter such as `info` or `user_dashboard=debug`. Falls back to RUST_LOG.
    #[arg(long, env = "USER_DASHBOARD_LOG_LEVEL")]
    log_level: Option<String>,
}

/// Send logs to a file; the terminal belongs to the UI.
fn init_logging(path: &Path, level: Option<&str>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let filter = match level {
        Some(l) => EnvFilter::try_new(l).with_context(|| format!("bad log filter {l:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!(e))
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) -> Result<()> {
    if let Some(n) = cli.page_size {
        match ItemsPerPage::from_count(n) {
            Some(p) => settings.items_per_page = p,
            None => bail!("--page-size must be 10, 25, 50 or 100 (got {n})"),
        }
    }
    if let Some(n) = cli.fetch_limit {
        if n == 0 {
            bail!("--fetch-limit must be positive");
        }
        settings.fetch_limit = n;
    }
    if let Some(ms) = cli.latency_ms {
        settings.latency_ms = ms;
    }
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let dir = config_dir(cli.config_dir.as_deref())
        .context("no config directory on this platform; pass --config-dir")?;

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| dir.join("user-dashboard.log"));
    if let Err(e) = init_logging(&log_path, cli.log_level.as_deref()) {
        eprintln!("logging disabled: {e:#}");
    }

    let mut settings = Settings::load_or_init(&dir.join("settings.conf"));
    apply_overrides(&mut settings, &cli)?;
    let theme = Theme::load_or_init(&dir.join("theme.conf"));
    let keymap = Keymap::load_or_init(&dir.join("keybinds.conf"));
    tracing::info!(config_dir = %dir.display(), ?settings, "starting");

    let api = match &cli.seed {
        Some(path) => InMemoryApi::from_json_file(path)?,
        None => InMemoryApi::with_sample_data(),
    }
    .with_latency(Duration::from_millis(settings.latency_ms));
    let mut worker = ApiWorker::spawn(Box::new(api)).context("spawn api worker")?;

    let mut state = AppState::new(settings, theme, keymap);
    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, &mut state, &mut worker);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    if let Err(err) = &res {
        tracing::error!(error = %err, "application error");
    }
    res
}
