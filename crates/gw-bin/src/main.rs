//! Glyphwriter entrypoint.
use anyhow::{Context, Result, bail};
use clap::Parser;
use core_config::{Config, load_from};
use core_render::{CanvasBackend, Color, TextRenderer, TextStyle};
use core_terminal::{CrosstermBackend, HalfBlockPresenter, TerminalBackend, TerminalCapabilities};
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod assets;
mod events;
mod scene;

use events::AppEvent;
use scene::{Scene, SceneMode};

/// Upper bound on headless frames when no budget is given.
const HEADLESS_FRAME_CAP: u64 = 100_000;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "glyphwriter", version, about = "Bitmap-font typewriter text renderer")]
struct Args {
    /// Text to render. Ignored when `--file` is given.
    pub text: Option<String>,
    /// Read the text from a file instead.
    #[arg(long = "file")]
    pub file: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `glyphwriter.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Draw the whole text at once instead of revealing it.
    #[arg(long = "static")]
    pub static_text: bool,
    /// Run without a terminal; render into memory and log metrics.
    #[arg(long)]
    pub headless: bool,
    /// Frame budget for headless runs (default: until the text is complete).
    #[arg(long)]
    pub frames: Option<u64>,
}

impl Args {
    fn mode(&self) -> SceneMode {
        if self.static_text {
            SceneMode::Static
        } else {
            SceneMode::Typewriter
        }
    }
}

const DEFAULT_TEXT: &str = "Hello from glyphwriter!\nPress q to quit.";

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("glyphwriter.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, "glyphwriter.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Read the input bytes, validating them first when `strict` is set.
fn load_text(args: &Args, strict: bool) -> Result<Vec<u8>> {
    let bytes = match (&args.file, &args.text) {
        (Some(path), _) => std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(text)) => text.clone().into_bytes(),
        (None, None) => DEFAULT_TEXT.as_bytes().to_vec(),
    };
    text_from_bytes(bytes, strict)
}

/// Input is kept as bytes: the renderer decodes it leniently, so malformed
/// sequences render the way the decoder reads them. Strict mode rejects them.
fn text_from_bytes(bytes: Vec<u8>, strict: bool) -> Result<Vec<u8>> {
    if strict {
        core_text::try_decode(&bytes).context("input rejected by strict UTF-8 check")?;
        return Ok(bytes);
    }
    if let Err(e) = std::str::from_utf8(&bytes) {
        warn!(
            target: "runtime.startup",
            valid_up_to = e.valid_up_to(),
            "input_utf8_malformed_decoding_leniently"
        );
    }
    Ok(bytes)
}

fn text_style(config: &Config) -> TextStyle {
    let t = &config.file.text;
    TextStyle {
        size: t.size,
        h_offset: t.h_offset,
        v_offset: t.v_offset,
        color: Color::rgb(t.color[0], t.color[1], t.color[2]),
    }
}

fn run_headless(
    scene: &mut Scene<'_>,
    backend: &mut CanvasBackend,
    config: &Config,
    budget: Option<u64>,
) -> Result<()> {
    let dt = Duration::from_millis(config.file.frame.tick_ms).as_secs_f32();
    let limit = budget.unwrap_or(HEADLESS_FRAME_CAP);
    while scene.frames() < limit {
        scene.frame(backend, dt)?;
        if budget.is_none() && scene.is_complete() {
            break;
        }
    }
    let m = scene.metrics();
    info!(
        target: "runtime.metrics",
        frames = scene.frames(),
        complete = scene.is_complete(),
        glyphs_drawn = m.glyphs_drawn,
        glyphs_unmapped = m.glyphs_unmapped,
        cache_blits = m.cache_blits,
        cache_hits = m.cache_hits,
        reveals = m.reveals,
        reveal_skips = m.reveal_skips,
        reveal_waits = m.reveal_waits,
        completions = m.completions,
        "headless_run_complete"
    );
    println!(
        "frames={} complete={} glyphs_drawn={} reveals={}",
        scene.frames(),
        scene.is_complete(),
        m.glyphs_drawn,
        m.reveals
    );
    Ok(())
}

async fn run_interactive(
    scene: &mut Scene<'_>,
    backend: &mut CanvasBackend,
    config: &Config,
) -> Result<()> {
    let mut terminal = CrosstermBackend::new();
    terminal.set_title("glyphwriter")?;
    let mut guard = terminal.enter_guard()?;
    let (mut cols, mut rows) = guard.backend().size()?;

    let (tx, mut rx) = events::channel();
    let ticks = events::spawn_ticks(tx.clone(), Duration::from_millis(config.file.frame.tick_ms));
    let input = events::spawn_input(tx);

    let mut presenter = HalfBlockPresenter::new(TerminalCapabilities::detect());
    let mut out = stdout();
    let mut last = Instant::now();
    while let Some(event) = rx.recv().await {
        match event {
            AppEvent::Tick => {
                let now = Instant::now();
                let dt = now.duration_since(last).as_secs_f32();
                last = now;
                scene.frame(backend, dt)?;
                presenter.present(&mut out, backend.frame(), cols, rows)?;
            }
            AppEvent::Resize(c, r) => {
                cols = c;
                rows = r;
                info!(target: "runtime.events", cols, rows, "terminal_resized");
            }
            AppEvent::Quit => break,
        }
    }
    ticks.abort();
    input.abort();
    out.flush()?;
    drop(guard);
    info!(
        target: "runtime.metrics",
        frames = scene.frames(),
        cells_written = presenter.cells_written,
        frames_unchanged = presenter.frames_unchanged,
        "interactive_run_complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let mut config = load_from(args.config.clone())?;
    let clamped = config.apply_limits();
    info!(
        target: "runtime.startup",
        config = config.path.as_ref().map(|p| p.display().to_string()).as_deref(),
        clamped,
        mode = ?args.mode(),
        headless = args.headless,
        "config_loaded"
    );

    if args.frames.is_some() && !args.headless {
        bail!("--frames requires --headless");
    }
    let text = load_text(&args, config.file.text.strict_utf8)?;

    let frame = (config.file.frame.width, config.file.frame.height);
    let mut backend = CanvasBackend::new(frame.0, frame.1);
    let atlas = assets::load_atlas(&mut backend, &config.file.atlas)?;
    let renderer = TextRenderer::new(&atlas, text_style(&config));
    let mut scene = Scene::new(renderer, text, frame, args.mode(), config.file.text.duration);

    let result = if args.headless {
        run_headless(&mut scene, &mut backend, &config, args.frames)
    } else {
        run_interactive(&mut scene, &mut backend, &config).await
    };
    scene.release(&mut backend);
    drop(scene);
    atlas.release(&mut backend);
    info!(target: "runtime", ok = result.is_ok(), "shutdown");
    result
}
