use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crossterm::{
    cursor,
    event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind},
    terminal::{Clear, ClearType},
};
use gallery_core::{Command, GallerySnapshot, Point, PointerEvent};
use gallery_media::RenderImage;
use png::{BitDepth, ColorType, Encoder};
use tracing::trace;

/// Kitty graphics payloads are split into chunks of at most this many bytes.
const CHUNK_LEN: usize = 4096;
/// Every frame is transmitted under this id, replacing the previous one.
const FRAME_IMAGE_ID: u32 = 1;

/// Terminal cells a frame is stretched over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellArea {
    pub columns: u16,
    pub rows: u16,
}

impl CellArea {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }
}

/// Presents composed gallery frames through the kitty graphics protocol.
pub struct KittyRenderer<W: Write> {
    writer: W,
    frames: u64,
}

impl<W: Write> KittyRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Transmits `frame` and places it at the cursor over `area`.
    pub fn present(&mut self, frame: &RenderImage, area: CellArea) -> Result<()> {
        let payload = BASE64.encode(encode_png(frame)?);
        let control = format!(
            "a=T,f=100,C=1,q=2,i={FRAME_IMAGE_ID},p=1,c={},r={},s={},v={},z=-1",
            area.columns, area.rows, frame.width, frame.height
        );
        write_chunked(&mut self.writer, &control, &payload)?;
        self.writer.flush()?;
        self.frames += 1;
        trace!(frame = self.frames, bytes = payload.len(), "frame presented");
        Ok(())
    }

    /// Holds terminal output until `end_frame` so a frame never tears.
    pub fn begin_frame(&mut self) -> Result<()> {
        write!(self.writer, "\u{1b}[?2026h")?;
        Ok(())
    }

    pub fn end_frame(&mut self) -> Result<()> {
        write!(self.writer, "\u{1b}[?2026l")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Drops the frame image and clears the screen, e.g. after a resize.
    pub fn clear_all(&mut self) -> Result<()> {
        write!(self.writer, "\u{1b}_Ga=d,d=I,i={FRAME_IMAGE_ID},q=2\u{1b}\\")?;
        crossterm::execute!(
            &mut self.writer,
            Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }
}

fn encode_png(frame: &RenderImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer, frame.width, frame.height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame.pixels)?;
    writer.finish()?;
    Ok(buffer)
}

/// Writes one graphics command; `control` rides on the first chunk only.
fn write_chunked<W: Write>(writer: &mut W, control: &str, payload: &str) -> io::Result<()> {
    let chunks: Vec<&[u8]> = payload.as_bytes().chunks(CHUNK_LEN).collect();
    if chunks.is_empty() {
        return write!(writer, "\u{1b}_G{control}\u{1b}\\");
    }
    let last = chunks.len() - 1;
    for (index, chunk) in chunks.iter().enumerate() {
        let more = u8::from(index < last);
        if index == 0 {
            write!(writer, "\u{1b}_G{control},m={more};")?;
        } else {
            write!(writer, "\u{1b}_Gm={more};")?;
        }
        writer.write_all(chunk)?;
        writer.write_all(b"\x1b\\")?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    Command(Command),
    Quit,
    None,
}

#[derive(Debug, Default)]
pub struct EventMapper {
    pending_count: Option<usize>,
    pending_digits: String,
}

impl EventMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_event(&mut self, event: Event) -> UiEvent {
        match event {
            Event::Key(KeyEvent {
                code, modifiers, ..
            }) => match (code, modifiers) {
                (KeyCode::Char(c), KeyModifiers::NONE) if c.is_ascii_digit() => {
                    if let Some(digit) = c.to_digit(10) {
                        self.push_digit(digit as usize);
                    }
                    UiEvent::None
                }
                (KeyCode::Char('='), _) => {
                    self.reset_count();
                    UiEvent::Command(Command::ResetZoom)
                }
                (KeyCode::Char('j'), KeyModifiers::NONE)
                | (KeyCode::Char('l'), KeyModifiers::NONE)
                | (KeyCode::Right, KeyModifiers::NONE) => {
                    let count = self.take_count();
                    UiEvent::Command(Command::NextPage { count })
                }
                (KeyCode::Char('k'), KeyModifiers::NONE)
                | (KeyCode::Char('h'), KeyModifiers::NONE)
                | (KeyCode::Left, KeyModifiers::NONE) => {
                    let count = self.take_count();
                    UiEvent::Command(Command::PrevPage { count })
                }
                (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
                    self.reset_count();
                    UiEvent::Command(Command::GotoPage { page: 0 })
                }
                (KeyCode::Char('G'), KeyModifiers::SHIFT)
                | (KeyCode::Char('G'), KeyModifiers::NONE)
                | (KeyCode::End, _) => {
                    // with a prefix, `G` jumps to that page number
                    let page = match self.pending_count.take() {
                        Some(number) if number > 0 => number - 1,
                        _ => usize::MAX,
                    };
                    self.reset_count();
                    UiEvent::Command(Command::GotoPage { page })
                }
                (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => {
                    self.reset_count();
                    UiEvent::Quit
                }
                (KeyCode::Char('c'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
                    UiEvent::Quit
                }
                _ => {
                    self.reset_count();
                    UiEvent::None
                }
            },
            _ => UiEvent::None,
        }
    }

    pub fn pending_input(&self) -> Option<String> {
        if self.pending_digits.is_empty() {
            None
        } else {
            Some(self.pending_digits.clone())
        }
    }

    fn push_digit(&mut self, digit: usize) {
        let current = self.pending_count.unwrap_or(0);
        let next = current.saturating_mul(10).saturating_add(digit);
        self.pending_count = Some(next);
        if let Some(c) = char::from_digit(digit as u32, 10) {
            self.pending_digits.push(c);
        }
    }

    fn take_count(&mut self) -> usize {
        let count = self
            .pending_count
            .take()
            .filter(|&count| count > 0)
            .unwrap_or(1);
        self.pending_digits.clear();
        count
    }

    fn reset_count(&mut self) {
        self.pending_count = None;
        self.pending_digits.clear();
    }
}

/// Turns terminal mouse reports into pointer samples in frame pixels.
///
/// Terminals report a single pointer, so the wheel is translated into a
/// complete two-contact pinch session centred on the cursor.
#[derive(Debug, Clone)]
pub struct PointerMapper {
    cell_width: f64,
    cell_height: f64,
    pressed: bool,
}

impl PointerMapper {
    /// Half the distance between the two synthetic pinch contacts.
    pub const PINCH_SPAN: f64 = 40.0;
    pub const WHEEL_ZOOM: f64 = 1.25;

    pub fn new(cell_width: f64, cell_height: f64) -> Self {
        Self {
            cell_width: positive_or_one(cell_width),
            cell_height: positive_or_one(cell_height),
            pressed: false,
        }
    }

    pub fn set_cell_size(&mut self, cell_width: f64, cell_height: f64) {
        self.cell_width = positive_or_one(cell_width);
        self.cell_height = positive_or_one(cell_height);
    }

    pub fn to_pixels(&self, column: u16, row: u16) -> Point {
        Point::new(
            (column as f64 + 0.5) * self.cell_width,
            (row as f64 + 0.5) * self.cell_height,
        )
    }

    pub fn map(&mut self, event: &MouseEvent, time: Duration) -> Vec<PointerEvent> {
        let position = self.to_pixels(event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.pressed = true;
                vec![PointerEvent::Down {
                    time,
                    contacts: vec![position],
                }]
            }
            MouseEventKind::Drag(MouseButton::Left) if self.pressed => vec![PointerEvent::Move {
                time,
                contacts: vec![position],
            }],
            MouseEventKind::Up(MouseButton::Left) if self.pressed => {
                self.pressed = false;
                vec![PointerEvent::Up {
                    time,
                    contacts: Vec::new(),
                }]
            }
            MouseEventKind::ScrollUp if !self.pressed => {
                pinch_session(position, time, Self::WHEEL_ZOOM)
            }
            MouseEventKind::ScrollDown if !self.pressed => {
                pinch_session(position, time, 1.0 / Self::WHEEL_ZOOM)
            }
            _ => Vec::new(),
        }
    }
}

fn positive_or_one(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}

fn pinch_session(center: Point, time: Duration, factor: f64) -> Vec<PointerEvent> {
    let span = PointerMapper::PINCH_SPAN;
    let pair = |half: f64| {
        vec![
            Point::new(center.x - half, center.y),
            Point::new(center.x + half, center.y),
        ]
    };
    let spread = pair(span * factor);
    trace!(?center, factor, "synthetic wheel pinch");
    vec![
        PointerEvent::Down {
            time,
            contacts: vec![Point::new(center.x - span, center.y)],
        },
        PointerEvent::Down {
            time,
            contacts: pair(span),
        },
        PointerEvent::Move {
            time,
            contacts: spread.clone(),
        },
        PointerEvent::Up {
            time,
            contacts: vec![spread[0]],
        },
        PointerEvent::Up {
            time,
            contacts: Vec::new(),
        },
    ]
}

pub fn status_label(snapshot: &GallerySnapshot, pending: Option<&str>) -> String {
    let page = if snapshot.page_count == 0 {
        0
    } else {
        snapshot.current_page + 1
    };
    let mut label = format!(
        "page {}/{} | {:.2}x",
        page, snapshot.page_count, snapshot.transform.scale
    );
    if let Some(pending) = pending {
        label.push_str(" | ");
        label.push_str(pending);
    }
    label
}

pub fn write_status_line<W: Write>(writer: &mut W, row: u16, label: &str) -> io::Result<()> {
    crossterm::queue!(
        writer,
        cursor::MoveTo(0, row),
        Clear(ClearType::CurrentLine)
    )?;
    write!(writer, "{}", label)?;
    writer.flush()
}
