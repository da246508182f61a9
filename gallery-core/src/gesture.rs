//! Classifies raw pointer samples into tap, double tap, pan, pinch and
//! long-press gestures.
//!
//! One session runs from the first contact touching down to the last one
//! lifting. All per-session data lives in a [`Session`] value that is created
//! on down and dropped on release, so nothing leaks from one gesture into the
//! next except the record of the last tap (needed for double taps).

use std::time::Duration;

use tracing::trace;

use crate::config::GalleryConfig;
use crate::geometry::Point;
use crate::velocity::VelocityTracker;

/// Raw input. `contacts` lists every contact touching after the event.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down { time: Duration, contacts: Vec<Point> },
    Move { time: Duration, contacts: Vec<Point> },
    Up { time: Duration, contacts: Vec<Point> },
    /// The platform took the contacts away.
    Cancel { time: Duration },
}

impl PointerEvent {
    pub fn time(&self) -> Duration {
        match self {
            PointerEvent::Down { time, .. }
            | PointerEvent::Move { time, .. }
            | PointerEvent::Up { time, .. }
            | PointerEvent::Cancel { time } => *time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureState {
    pub x0: f64,
    pub y0: f64,
    pub move_x: f64,
    pub move_y: f64,
    pub previous_move_x: f64,
    pub previous_move_y: f64,
    /// Cumulative displacement since down.
    pub dx: f64,
    pub dy: f64,
    /// Release velocity in pixels per millisecond.
    pub vx: f64,
    pub vy: f64,
    /// Distance between the first two contacts, while at least two touch.
    pub pinch: Option<f64>,
    pub previous_pinch: Option<f64>,
    pub contacts: usize,
    pub single_tap_up: bool,
    pub double_tap_up: bool,
    pub elapsed: Duration,
}

impl GestureState {
    pub fn step_dx(&self) -> f64 {
        self.move_x - self.previous_move_x
    }

    pub fn step_dy(&self) -> f64 {
        self.move_y - self.previous_move_y
    }

    pub fn start(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    pub fn current(&self) -> Point {
        Point::new(self.move_x, self.move_y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    Start(GestureState),
    Move(GestureState),
    LongPress(GestureState),
    End {
        state: GestureState,
        /// The platform cancelled the session instead of the user lifting.
        terminated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Down,
    Panning,
    Pinching,
    LongPressed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognizerConfig {
    pub tap_slop: f64,
    pub double_tap_slop: f64,
    pub double_tap_interval: Duration,
    /// `None` disables long-press detection.
    pub long_press: Option<Duration>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self::from(&GalleryConfig::default())
    }
}

impl From<&GalleryConfig> for RecognizerConfig {
    fn from(config: &GalleryConfig) -> Self {
        Self {
            tap_slop: config.tap_slop,
            double_tap_slop: config.double_tap_slop,
            double_tap_interval: config.double_click_interval(),
            long_press: config
                .long_press_enabled
                .then(|| config.long_press_threshold()),
        }
    }
}

/// A one-shot deadline. Dropping or replacing it cancels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    deadline: Duration,
}

impl ScheduledTask {
    pub fn after(now: Duration, delay: Duration) -> Self {
        Self {
            deadline: now + delay,
        }
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.deadline
    }
}

#[derive(Debug, Clone, Copy)]
struct TapRecord {
    time: Duration,
    position: Point,
}

#[derive(Debug, Clone)]
struct Session {
    started: Duration,
    state: GestureState,
    tracker: VelocityTracker,
    max_contacts: usize,
    moved: bool,
    long_press: Option<ScheduledTask>,
    long_pressed: bool,
}

impl Session {
    fn begin(time: Duration, contacts: &[Point], long_press: Option<Duration>) -> Self {
        let center = centroid(contacts);
        let mut tracker = VelocityTracker::new();
        tracker.add(time, center);
        let state = GestureState {
            x0: center.x,
            y0: center.y,
            move_x: center.x,
            move_y: center.y,
            previous_move_x: center.x,
            previous_move_y: center.y,
            pinch: pinch_distance(contacts),
            contacts: contacts.len(),
            ..GestureState::default()
        };
        Self {
            started: time,
            state,
            tracker,
            max_contacts: contacts.len(),
            moved: false,
            long_press: long_press
                .filter(|_| contacts.len() == 1)
                .map(|delay| ScheduledTask::after(time, delay)),
            long_pressed: false,
        }
    }

    /// Re-anchors after contacts were added or lifted so the centroid jump is
    /// not mistaken for movement.
    fn rebase(&mut self, time: Duration, contacts: &[Point]) {
        let center = centroid(contacts);
        self.state.move_x = center.x;
        self.state.move_y = center.y;
        self.state.previous_move_x = center.x;
        self.state.previous_move_y = center.y;
        self.state.pinch = pinch_distance(contacts);
        self.state.previous_pinch = None;
        self.state.contacts = contacts.len();
        self.state.elapsed = time.saturating_sub(self.started);
        self.max_contacts = self.max_contacts.max(contacts.len());
        if contacts.len() > 1 {
            self.long_press = None;
        }
        self.tracker.reset();
        self.tracker.add(time, center);
    }

    fn advance(&mut self, time: Duration, contacts: &[Point], tap_slop: f64) {
        let center = centroid(contacts);
        let state = &mut self.state;
        state.previous_move_x = state.move_x;
        state.previous_move_y = state.move_y;
        state.move_x = center.x;
        state.move_y = center.y;
        state.dx += state.step_dx();
        state.dy += state.step_dy();
        state.previous_pinch = state.pinch;
        state.pinch = pinch_distance(contacts);
        state.elapsed = time.saturating_sub(self.started);
        self.tracker.add(time, center);
        if state.dx.hypot(state.dy) > tap_slop {
            self.moved = true;
            self.long_press = None;
        }
    }
}

fn centroid(contacts: &[Point]) -> Point {
    if contacts.is_empty() {
        return Point::ORIGIN;
    }
    let count = contacts.len() as f64;
    let (sum_x, sum_y) = contacts
        .iter()
        .fold((0.0, 0.0), |(x, y), point| (x + point.x, y + point.y));
    Point::new(sum_x / count, sum_y / count)
}

fn pinch_distance(contacts: &[Point]) -> Option<f64> {
    match contacts {
        [first, second, ..] => Some(first.distance(*second)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: RecognizerConfig,
    session: Option<Session>,
    last_tap: Option<TapRecord>,
}

impl GestureRecognizer {
    pub fn new(config: RecognizerConfig) -> Self {
        Self {
            config,
            session: None,
            last_tap: None,
        }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn phase(&self) -> GesturePhase {
        match &self.session {
            None => GesturePhase::Idle,
            Some(session) if session.long_pressed => GesturePhase::LongPressed,
            Some(session) if session.state.contacts > 1 => GesturePhase::Pinching,
            Some(session) if session.moved => GesturePhase::Panning,
            Some(_) => GesturePhase::Down,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn handle(&mut self, event: &PointerEvent) -> Option<GestureEvent> {
        match event {
            PointerEvent::Down { time, contacts } => self.on_down(*time, contacts),
            PointerEvent::Move { time, contacts } => self.on_move(*time, contacts),
            PointerEvent::Up { time, contacts } => self.on_up(*time, contacts),
            PointerEvent::Cancel { time } => self.on_cancel(*time),
        }
    }

    /// Fires the long-press deadline when it is due.
    pub fn poll(&mut self, now: Duration) -> Option<GestureEvent> {
        let session = self.session.as_mut()?;
        let due = session.long_press.is_some_and(|task| task.is_due(now));
        if !due {
            return None;
        }
        session.long_press = None;
        session.long_pressed = true;
        session.state.elapsed = now.saturating_sub(session.started);
        trace!(elapsed = ?session.state.elapsed, "long press recognized");
        Some(GestureEvent::LongPress(session.state))
    }

    fn on_down(&mut self, time: Duration, contacts: &[Point]) -> Option<GestureEvent> {
        if contacts.is_empty() {
            return None;
        }
        match self.session.as_mut() {
            Some(session) => {
                session.rebase(time, contacts);
                None
            }
            None => {
                let session = Session::begin(time, contacts, self.config.long_press);
                let state = session.state;
                self.session = Some(session);
                Some(GestureEvent::Start(state))
            }
        }
    }

    fn on_move(&mut self, time: Duration, contacts: &[Point]) -> Option<GestureEvent> {
        let tap_slop = self.config.tap_slop;
        let session = self.session.as_mut()?;
        if contacts.is_empty() {
            return None;
        }
        if contacts.len() != session.state.contacts {
            session.rebase(time, contacts);
        } else {
            session.advance(time, contacts, tap_slop);
        }
        if session.long_pressed {
            return None;
        }
        Some(GestureEvent::Move(session.state))
    }

    fn on_up(&mut self, time: Duration, contacts: &[Point]) -> Option<GestureEvent> {
        if !contacts.is_empty() {
            if let Some(session) = self.session.as_mut() {
                session.rebase(time, contacts);
            }
            return None;
        }
        let session = self.session.take()?;
        let mut state = session.state;
        state.elapsed = time.saturating_sub(session.started);
        state.contacts = 0;
        (state.vx, state.vy) = session.tracker.velocity();

        if session.long_pressed {
            self.last_tap = None;
            return None;
        }

        if !session.moved && session.max_contacts == 1 {
            let position = state.start();
            let is_double = self.last_tap.is_some_and(|tap| {
                time.saturating_sub(tap.time) <= self.config.double_tap_interval
                    && tap.position.distance(position) <= self.config.double_tap_slop
            });
            if is_double {
                state.double_tap_up = true;
                self.last_tap = None;
            } else {
                state.single_tap_up = true;
                self.last_tap = Some(TapRecord { time, position });
            }
        } else {
            self.last_tap = None;
        }

        Some(GestureEvent::End {
            state,
            terminated: false,
        })
    }

    fn on_cancel(&mut self, time: Duration) -> Option<GestureEvent> {
        let session = self.session.take()?;
        self.last_tap = None;
        if session.long_pressed {
            return None;
        }
        let mut state = session.state;
        state.elapsed = time.saturating_sub(session.started);
        state.contacts = 0;
        (state.vx, state.vy) = session.tracker.velocity();
        Some(GestureEvent::End {
            state,
            terminated: true,
        })
    }
}
