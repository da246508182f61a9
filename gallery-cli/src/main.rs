use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::cursor;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::terminal;
use directories::ProjectDirs;
use gallery_core::{GalleryConfig, GalleryEvent, PagingCoordinator, Size};
use gallery_media::{FrameRequest, ImageLibrary, ImageProvider, MediaProvider};
use gallery_tty::{
    status_label, write_status_line, CellArea, EventMapper, KittyRenderer, PointerMapper, UiEvent,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Parser)]
#[command(
    name = "gallery",
    version,
    about = "Swipeable, zoomable image gallery for kitty-compatible terminals"
)]
struct Args {
    /// Page to open on (0-based)
    #[arg(short = 'p', long = "page")]
    page: Option<usize>,

    /// Configuration file; defaults to the platform config directory
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Log a JSON snapshot of the gallery state after every frame
    #[arg(long = "trace-state")]
    trace_state: bool,

    /// Images to show, one per page
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

struct RawModeGuard;

impl RawModeGuard {
    fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnableMouseCapture, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = crossterm::execute!(stdout, DisableMouseCapture, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

/// Pixel geometry of the terminal; the last row is kept for the status line.
#[derive(Debug, Clone, Copy)]
struct Layout {
    columns: u16,
    rows: u16,
    cell_width: f64,
    cell_height: f64,
}

impl Layout {
    fn detect() -> Result<Self> {
        let window = terminal::window_size()?;
        let columns = window.columns.max(1);
        let rows = window.rows.max(2);
        // terminals that do not report pixels get a common cell size
        let cell_width = if window.width > 0 {
            f64::from(window.width) / f64::from(columns)
        } else {
            8.0
        };
        let cell_height = if window.height > 0 {
            f64::from(window.height) / f64::from(rows)
        } else {
            16.0
        };
        Ok(Self {
            columns,
            rows,
            cell_width,
            cell_height,
        })
    }

    fn image_rows(&self) -> u16 {
        self.rows - 1
    }

    fn container(&self) -> Size {
        Size::new(
            (f64::from(self.columns) * self.cell_width).floor(),
            (f64::from(self.image_rows()) * self.cell_height).floor(),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.files.is_empty() {
        return Err(anyhow!("no input files provided"));
    }

    let project_dirs = ProjectDirs::from("net", "gallery", "gallery")
        .ok_or_else(|| anyhow!("unable to resolve platform data directories"))?;
    let _log_guard = init_logging(&project_dirs)?;

    let config_path = resolve_config_path(args.config.clone())?;
    let config = GalleryConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load config {:?}", config_path))?;
    info!(path = ?config_path, "configuration loaded");

    let library = Arc::new(ImageLibrary::new(args.files.clone()));
    let mut paging = PagingCoordinator::new(library.len(), args.page.unwrap_or(0), config);
    let mut probes = spawn_probes(&args.files);

    let _raw = RawModeGuard::new()?;
    let mut renderer = KittyRenderer::new(io::stdout());
    renderer.clear_all()?;

    let mut layout = Layout::detect()?;
    paging.on_layout(layout.container());
    let mut pointer = PointerMapper::new(layout.cell_width, layout.cell_height);
    let mut keys = EventMapper::new();
    let events = paging.events();
    let clock = Instant::now();
    let mut dirty = true;

    'frames: loop {
        while let Ok((index, probed)) = probes.try_recv() {
            match probed {
                Ok(size) => {
                    paging.set_content_size(index, size);
                    dirty = true;
                }
                Err(err) => warn!(index, error = %err, "failed to probe item"),
            }
        }

        if event::poll(FRAME_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match keys.map_event(Event::Key(key)) {
                        UiEvent::Command(command) => {
                            debug!(?command, "key command");
                            paging.apply(command);
                            dirty = true;
                        }
                        UiEvent::Quit => break 'frames,
                        UiEvent::None => dirty = true,
                    }
                }
                Event::Mouse(mouse) => {
                    for sample in pointer.map(&mouse, clock.elapsed()) {
                        paging.handle_pointer(&sample);
                        dirty = true;
                    }
                }
                Event::Resize(..) => {
                    layout = Layout::detect()?;
                    pointer.set_cell_size(layout.cell_width, layout.cell_height);
                    paging.on_layout(layout.container());
                    renderer.clear_all()?;
                    dirty = true;
                }
                _ => {}
            }
        }

        dirty |= paging.tick(clock.elapsed());

        for gallery_event in events.lock().drain(..) {
            match gallery_event {
                GalleryEvent::PageChanged(page) => info!(page, "page changed"),
                other => debug!(event = ?other, "gallery event"),
            }
        }

        if dirty {
            redraw(&mut renderer, &library, &paging, &layout, &keys)?;
            if args.trace_state {
                let snapshot = serde_json::to_string(&paging.snapshot())?;
                debug!(target: "gallery::state", %snapshot);
            }
            dirty = false;
        }
    }

    renderer.clear_all()?;
    Ok(())
}

fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(GalleryConfig::default_path)
        .ok_or_else(|| anyhow!("unable to resolve the config directory"))
}

type ProbeResult = (usize, Result<Size>);

/// Resolves item sizes concurrently; results arrive in completion order.
fn spawn_probes(files: &[PathBuf]) -> mpsc::UnboundedReceiver<ProbeResult> {
    let (tx, rx) = mpsc::unbounded_channel();
    for (index, path) in files.iter().cloned().enumerate() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let probed = ImageProvider.probe(&path).await;
            let _ = tx.send((index, probed));
        });
    }
    rx
}

fn redraw(
    renderer: &mut KittyRenderer<Stdout>,
    library: &ImageLibrary,
    paging: &PagingCoordinator,
    layout: &Layout,
    keys: &EventMapper,
) -> Result<()> {
    let container = paging.container();
    let request = FrameRequest::from_coordinator(
        paging,
        container.width.max(1.0) as u32,
        container.height.max(1.0) as u32,
    );
    let frame = library.compose(&request)?;

    renderer.begin_frame()?;
    crossterm::execute!(renderer.writer(), cursor::MoveTo(0, 0))?;
    renderer.present(&frame, CellArea::new(layout.columns, layout.image_rows()))?;
    let pending = keys.pending_input();
    let label = status_label(&paging.snapshot(), pending.as_deref());
    write_status_line(renderer.writer(), layout.image_rows(), &label)?;
    renderer.end_frame()?;
    Ok(())
}

fn init_logging(project_dirs: &ProjectDirs) -> Result<WorkerGuard> {
    let log_dir = project_dirs.data_local_dir().join("logs");
    fs::create_dir_all(&log_dir)?;

    // the terminal belongs to the image protocol, so logs only go to a file
    let file_appender = tracing_appender::rolling::never(log_dir, "gallery.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}
