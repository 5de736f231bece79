use std::{
    cell::Cell,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glance_core::{
    DocumentIdentity, DocumentKind, Mode, MonospaceMetrics, ReaderConfig, ReaderEvent,
    ReaderSession, Snapshot, TickResult, TimerQueue, ViewKind,
};
use log::{info, warn};

use snapshot_file::SnapshotFile;
use snapshot_sync::SnapshotSyncState;

#[path = "main/console.rs"]
mod console;
#[path = "main/snapshot_file.rs"]
mod snapshot_file;
#[path = "main/snapshot_sync.rs"]
mod snapshot_sync;

const SNAPSHOT_SAVE_DEBOUNCE_MS: u64 = 2_000;
const MIN_SLEEP_MS: u64 = 8;
const MAX_SLEEP_MS: u64 = 50;
const REPORT_INTERVAL_MS: u64 = 5_000;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Word,
    Sentence,
    Continuous,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Word => Mode::Word,
            ModeArg::Sentence => Mode::Sentence,
            ModeArg::Continuous => Mode::Continuous,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "glance", version, about = "Read a text file one word at a time")]
struct Cli {
    /// Plain-text file to read.
    file: PathBuf,

    /// JSON file with reader settings. Missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    wpm: Option<u16>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Viewport width in pixels used for line composition.
    #[arg(long)]
    width: Option<f32>,

    /// Print the composed lines around the focus word, not just the word.
    #[arg(long)]
    context: bool,

    /// Where the reading position is kept between runs.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Ignore any saved position and start from the first word.
    #[arg(long)]
    fresh: bool,

    /// Stop after this many milliseconds even if the text is not finished.
    #[arg(long)]
    duration_ms: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let text = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let mut session = ReaderSession::new(
        config,
        Box::new(MonospaceMetrics::default()),
        TimerQueue::new(),
    )?;
    session
        .load_text(identity_for(&cli.file), &text)
        .with_context(|| format!("failed to load {}", cli.file.display()))?;

    let snapshot_file = cli.snapshot.clone().map(SnapshotFile::new);
    if let Some(file) = snapshot_file.as_ref().filter(|_| !cli.fresh) {
        restore_from(&mut session, file);
    }
    if let Some(mode) = cli.mode {
        session.set_mode(mode.into());
    }

    let finished = Rc::new(Cell::new(false));
    let advanced = Rc::new(Cell::new(0u64));
    {
        let finished = Rc::clone(&finished);
        let advanced = Rc::clone(&advanced);
        session.subscribe(move |event| match event {
            ReaderEvent::Finished => finished.set(true),
            ReaderEvent::PositionChanged { .. } => advanced.set(advanced.get() + 1),
            _ => {}
        });
    }

    let mut snapshot_sync = SnapshotSyncState::new(current_snapshot(&session, &cli.file));
    if let Some((page, total)) = session.page() {
        info!(
            "reader: started file={} wpm={} page={}/{}",
            cli.file.display(),
            session.config().wpm,
            page,
            total
        );
    }

    session.start();
    let mut last_focus = print_view(&session, cli.context, None);

    let loop_start = Instant::now();
    let mut report_start_ms = 0u64;
    loop {
        let now_ms = loop_start.elapsed().as_millis() as u64;
        if session.pump(now_ms) == TickResult::RenderRequested {
            last_focus = print_view(&session, cli.context, last_focus);
        }

        if let Some(snapshot) = current_snapshot(&session, &cli.file) {
            snapshot_sync.track_current(snapshot, now_ms);
        }
        snapshot_sync.flush_if_due(snapshot_file.as_ref(), now_ms);

        let elapsed_ms = now_ms.saturating_sub(report_start_ms);
        if elapsed_ms >= REPORT_INTERVAL_MS {
            let words = advanced.replace(0);
            let wpm_x100 = words * 6_000_000 / elapsed_ms.max(1);
            info!(
                "reader: effective_wpm={}.{:02} words={} elapsed_ms={}",
                wpm_x100 / 100,
                wpm_x100 % 100,
                words,
                elapsed_ms
            );
            report_start_ms = now_ms;
        }

        if finished.get() {
            info!("reader: reached the end of {}", cli.file.display());
            break;
        }
        if cli.duration_ms.is_some_and(|limit| now_ms >= limit) {
            info!("reader: duration limit reached");
            break;
        }

        let sleep_ms = session
            .next_due_ms()
            .map_or(MAX_SLEEP_MS, |due| due.saturating_sub(now_ms))
            .clamp(MIN_SLEEP_MS, MAX_SLEEP_MS);
        thread::sleep(Duration::from_millis(sleep_ms));
    }

    session.stop();
    if let Some(snapshot) = current_snapshot(&session, &cli.file) {
        snapshot_sync.flush_now(snapshot, snapshot_file.as_ref());
    }
    session.destroy();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ReaderConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<ReaderConfig>(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => ReaderConfig::default(),
    };

    if let Some(wpm) = cli.wpm {
        config.wpm = wpm;
    }
    if let Some(width) = cli.width {
        config.viewport_width = width;
    }
    Ok(config)
}

fn identity_for(path: &Path) -> DocumentIdentity {
    let id = fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();
    let title = path
        .file_stem()
        .map_or_else(|| id.clone(), |stem| stem.to_string_lossy().into_owned());
    let kind = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("txt") | Some("md") => DocumentKind::Text,
        Some("pdf") => DocumentKind::Pdf,
        Some("epub") => DocumentKind::Epub,
        _ => DocumentKind::Other,
    };
    DocumentIdentity::new(id, title, kind)
}

fn restore_from(session: &mut ReaderSession<TimerQueue>, file: &SnapshotFile) {
    match file.load() {
        Ok(Some(snapshot)) => {
            if session.restore(&snapshot) {
                let state = snapshot.playback;
                info!(
                    "snapshot: restored mode={:?} word={} sentence={} wpm={}",
                    state.mode,
                    state.focus_index + 1,
                    state.sentence_index + 1,
                    state.wpm
                );
            } else {
                info!("snapshot: saved position belongs to another document; starting fresh");
            }
        }
        Ok(None) => info!("snapshot: nothing saved at {}", file.path().display()),
        Err(err) => warn!("snapshot: restore failed, starting fresh: {:#}", err),
    }
}

fn current_snapshot(session: &ReaderSession<TimerQueue>, source: &Path) -> Option<Snapshot> {
    let mut ui = BTreeMap::new();
    ui.insert(String::from("source"), source.display().to_string());
    session.snapshot(ViewKind::Reader, ui)
}

/// Prints the view when the focus word changed since `last_focus`.
fn print_view(
    session: &ReaderSession<TimerQueue>,
    context: bool,
    last_focus: Option<u32>,
) -> Option<u32> {
    let Some(view) = session.view() else {
        return last_focus;
    };
    let focus = view.focus.map(|focus| focus.index);
    if focus == last_focus {
        return last_focus;
    }

    if context {
        for line in console::render_lines(&view) {
            println!("{line}");
        }
        println!();
    } else {
        println!("{}", console::render_focus(&view));
    }
    focus
}
