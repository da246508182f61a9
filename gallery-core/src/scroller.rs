//! Tick-driven fling and scroll simulator.
//!
//! A `Scroller` owns a 2D position that moves either along a timed, eased
//! path (`start_scroll`) or ballistically with constant deceleration
//! (`fling`). Callers advance it with `step(now)` once per frame and apply
//! the returned deltas to whatever they are moving.

use std::time::Duration;

use crate::animation::{progress, Easing};

pub const DEFAULT_DECELERATION: f64 = 2000.0;

const DEFAULT_SETTLE: Duration = Duration::from_millis(250);

/// Movement since the previous `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollStep {
    pub dx: f64,
    pub dy: f64,
    /// Set on the step that reaches the final position.
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AxisMotion {
    Idle {
        at: f64,
    },
    Eased {
        from: f64,
        to: f64,
        duration: f64,
        easing: Easing,
    },
    /// `from + direction * (speed * t - deceleration * t^2 / 2)` until `duration`.
    Ballistic {
        from: f64,
        to: f64,
        speed: f64,
        direction: f64,
        deceleration: f64,
        duration: f64,
    },
}

impl AxisMotion {
    fn duration(&self) -> f64 {
        match *self {
            AxisMotion::Idle { .. } => 0.0,
            AxisMotion::Eased { duration, .. } | AxisMotion::Ballistic { duration, .. } => {
                duration
            }
        }
    }

    fn target(&self) -> f64 {
        match *self {
            AxisMotion::Idle { at } => at,
            AxisMotion::Eased { to, .. } | AxisMotion::Ballistic { to, .. } => to,
        }
    }

    fn position(&self, elapsed: f64) -> f64 {
        if elapsed >= self.duration() {
            return self.target();
        }
        match *self {
            AxisMotion::Idle { at } => at,
            AxisMotion::Eased {
                from,
                to,
                duration,
                easing,
            } => from + (to - from) * easing.transform(elapsed / duration),
            AxisMotion::Ballistic {
                from,
                speed,
                direction,
                deceleration,
                ..
            } => from + direction * (speed * elapsed - 0.5 * deceleration * elapsed * elapsed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scroller {
    deceleration: f64,
    settle_duration: Duration,
    motion_x: AxisMotion,
    motion_y: AxisMotion,
    start: Duration,
    duration: Duration,
    curr_x: f64,
    curr_y: f64,
    reported_x: f64,
    reported_y: f64,
    finished: bool,
    final_pending: bool,
}

impl Default for Scroller {
    fn default() -> Self {
        Self::new(DEFAULT_DECELERATION)
    }
}

impl Scroller {
    /// `deceleration` is in pixels per second squared.
    pub fn new(deceleration: f64) -> Self {
        let deceleration = if deceleration.is_finite() && deceleration > 0.0 {
            deceleration
        } else {
            DEFAULT_DECELERATION
        };
        Self {
            deceleration,
            settle_duration: DEFAULT_SETTLE,
            motion_x: AxisMotion::Idle { at: 0.0 },
            motion_y: AxisMotion::Idle { at: 0.0 },
            start: Duration::ZERO,
            duration: Duration::ZERO,
            curr_x: 0.0,
            curr_y: 0.0,
            reported_x: 0.0,
            reported_y: 0.0,
            finished: true,
            final_pending: false,
        }
    }

    /// Duration used when a fling has to travel back against its velocity.
    pub fn with_settle_duration(mut self, settle: Duration) -> Self {
        self.settle_duration = settle;
        self
    }

    pub fn curr_x(&self) -> f64 {
        self.curr_x
    }

    pub fn curr_y(&self) -> f64 {
        self.curr_y
    }

    pub fn final_x(&self) -> f64 {
        self.motion_x.target()
    }

    pub fn final_y(&self) -> f64 {
        self.motion_y.target()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Cancels (or, with `false`, resumes) the motion in flight.
    ///
    /// The position stays wherever the last `step` left it; no final step is
    /// reported for a cancelled motion.
    pub fn force_finished(&mut self, finished: bool) {
        self.finished = finished;
        if finished {
            self.final_pending = false;
            self.reported_x = self.curr_x;
            self.reported_y = self.curr_y;
        } else {
            self.final_pending = true;
        }
    }

    /// Interpolates from `from` to `from + delta` over `duration`.
    ///
    /// A zero duration jumps immediately; the jump is still reported as a
    /// single finished step.
    pub fn start_scroll(
        &mut self,
        now: Duration,
        from_x: f64,
        from_y: f64,
        delta_x: f64,
        delta_y: f64,
        duration: Duration,
    ) {
        self.begin(now, from_x, from_y);
        let seconds = duration.as_secs_f64();
        self.motion_x = eased_axis(from_x, from_x + delta_x, seconds);
        self.motion_y = eased_axis(from_y, from_y + delta_y, seconds);
        self.duration = duration;
        if duration.is_zero() {
            self.curr_x = self.motion_x.target();
            self.curr_y = self.motion_y.target();
            self.finished = true;
        }
    }

    /// Starts a decelerating fling with velocities in pixels per second.
    ///
    /// Each axis stops where its velocity runs out, unless that point lies
    /// outside `[min, max]`; then it decelerates harder so that it comes to
    /// rest exactly on the nearest bound. Reversed bounds collapse onto `min`.
    pub fn fling(
        &mut self,
        now: Duration,
        start_x: f64,
        start_y: f64,
        velocity_x: f64,
        velocity_y: f64,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
    ) {
        self.begin(now, start_x, start_y);
        let speed = velocity_x.hypot(velocity_y);
        let (decel_x, decel_y) = if speed > 0.0 && speed.is_finite() {
            (
                self.deceleration * velocity_x.abs() / speed,
                self.deceleration * velocity_y.abs() / speed,
            )
        } else {
            (self.deceleration, self.deceleration)
        };
        let settle = self.settle_duration.as_secs_f64();
        self.motion_x = fling_axis(start_x, velocity_x, decel_x, min_x, max_x, settle);
        self.motion_y = fling_axis(start_y, velocity_y, decel_y, min_y, max_y, settle);
        let longest = self.motion_x.duration().max(self.motion_y.duration());
        self.duration = Duration::from_secs_f64(longest);
        if self.duration.is_zero() {
            self.curr_x = self.motion_x.target();
            self.curr_y = self.motion_y.target();
            self.finished = true;
        }
    }

    /// Advances the simulation to `now`.
    ///
    /// Returns `None` once the final step of the current motion has been
    /// reported (or the motion was cancelled).
    pub fn step(&mut self, now: Duration) -> Option<ScrollStep> {
        if !self.finished {
            let elapsed = now.saturating_sub(self.start).as_secs_f64();
            self.curr_x = self.motion_x.position(elapsed);
            self.curr_y = self.motion_y.position(elapsed);
            if progress(self.start, now, self.duration) >= 1.0 {
                self.curr_x = self.motion_x.target();
                self.curr_y = self.motion_y.target();
                self.finished = true;
            }
        } else if !self.final_pending {
            return None;
        }

        let step = ScrollStep {
            dx: self.curr_x - self.reported_x,
            dy: self.curr_y - self.reported_y,
            finished: self.finished,
        };
        self.reported_x = self.curr_x;
        self.reported_y = self.curr_y;
        if self.finished {
            self.final_pending = false;
        }
        Some(step)
    }

    fn begin(&mut self, now: Duration, x: f64, y: f64) {
        self.start = now;
        self.curr_x = x;
        self.curr_y = y;
        self.reported_x = x;
        self.reported_y = y;
        self.finished = false;
        self.final_pending = true;
    }
}

fn eased_axis(from: f64, to: f64, duration: f64) -> AxisMotion {
    if duration <= 0.0 || from == to {
        return AxisMotion::Idle { at: to };
    }
    AxisMotion::Eased {
        from,
        to,
        duration,
        easing: Easing::Viscous,
    }
}

fn fling_axis(
    start: f64,
    velocity: f64,
    deceleration: f64,
    min: f64,
    max: f64,
    settle: f64,
) -> AxisMotion {
    let max = if min > max { min } else { max };
    let speed = velocity.abs();

    if speed == 0.0 || !speed.is_finite() || deceleration <= 0.0 {
        let target = start.clamp(min, max);
        return if target == start {
            AxisMotion::Idle { at: start }
        } else {
            AxisMotion::Eased {
                from: start,
                to: target,
                duration: settle,
                easing: Easing::EaseOut,
            }
        };
    }

    let direction = velocity.signum();
    let unclamped = start + direction * speed * speed / (2.0 * deceleration);
    let target = unclamped.clamp(min, max);
    if target == unclamped {
        return AxisMotion::Ballistic {
            from: start,
            to: target,
            speed,
            direction,
            deceleration,
            duration: speed / deceleration,
        };
    }

    let distance = target - start;
    if distance == 0.0 {
        AxisMotion::Idle { at: start }
    } else if distance.signum() == direction {
        let distance = distance.abs();
        AxisMotion::Ballistic {
            from: start,
            to: target,
            speed,
            direction,
            deceleration: speed * speed / (2.0 * distance),
            duration: 2.0 * distance / speed,
        }
    } else {
        // The bound lies behind the start; ease back onto it.
        AxisMotion::Eased {
            from: start,
            to: target,
            duration: settle,
            easing: Easing::EaseOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn run_to_end(scroller: &mut Scroller, from: Duration) -> (f64, f64, usize) {
        let mut total_x = 0.0;
        let mut total_y = 0.0;
        let mut steps = 0;
        let mut now = from;
        while let Some(step) = scroller.step(now) {
            total_x += step.dx;
            total_y += step.dy;
            steps += 1;
            if step.finished {
                break;
            }
            now += ms(16);
            assert!(steps < 10_000, "scroller never finished");
        }
        (total_x, total_y, steps)
    }

    #[test]
    fn start_scroll_interpolates_to_target() {
        let mut scroller = Scroller::default();
        scroller.start_scroll(ms(0), 100.0, 0.0, 300.0, -50.0, ms(400));
        assert!(!scroller.is_finished());

        let mid = scroller.step(ms(200)).unwrap();
        assert!(mid.dx > 0.0 && mid.dx < 300.0);
        assert!(!mid.finished);

        let (dx, dy, _) = run_to_end(&mut scroller, ms(216));
        assert!((scroller.curr_x() - 400.0).abs() < 1e-9);
        assert!((scroller.curr_y() + 50.0).abs() < 1e-9);
        assert!((mid.dx + dx - 300.0).abs() < 1e-9);
        assert!((mid.dy + dy + 50.0).abs() < 1e-9);
        assert!(scroller.step(ms(2_000)).is_none());
    }

    #[test]
    fn zero_duration_scroll_jumps_and_reports_once() {
        let mut scroller = Scroller::default();
        scroller.start_scroll(ms(10), 0.0, 0.0, -120.0, 0.0, Duration::ZERO);
        assert!(scroller.is_finished());
        assert_eq!(scroller.curr_x(), -120.0);

        let step = scroller.step(ms(10)).unwrap();
        assert_eq!(step.dx, -120.0);
        assert!(step.finished);
        assert!(scroller.step(ms(26)).is_none());
    }

    #[test]
    fn free_fling_stops_at_ballistic_distance() {
        let mut scroller = Scroller::new(2000.0);
        scroller.fling(
            ms(0),
            0.0,
            0.0,
            1000.0,
            0.0,
            -10_000.0,
            10_000.0,
            0.0,
            0.0,
        );
        // v^2 / 2a = 1_000_000 / 4_000
        assert!((scroller.final_x() - 250.0).abs() < 1e-9);
        let (dx, dy, steps) = run_to_end(&mut scroller, ms(16));
        assert!((dx - 250.0).abs() < 1e-9);
        assert_eq!(dy, 0.0);
        // 500 ms of travel at ~16 ms a frame
        assert!(steps >= 30, "took only {steps} steps");
    }

    #[test]
    fn fling_past_bound_settles_on_bound() {
        let mut scroller = Scroller::new(2000.0);
        scroller.fling(ms(0), 0.0, 0.0, 1000.0, -1000.0, -20.0, 100.0, -40.0, 40.0);
        assert_eq!(scroller.final_x(), 100.0);
        assert_eq!(scroller.final_y(), -40.0);

        let mut max_x: f64 = 0.0;
        let mut now = ms(0);
        while let Some(step) = scroller.step(now) {
            max_x = max_x.max(scroller.curr_x());
            if step.finished {
                break;
            }
            now += ms(8);
        }
        assert!(max_x <= 100.0 + 1e-9, "overshot the bound: {max_x}");
        assert_eq!(scroller.curr_x(), 100.0);
        assert_eq!(scroller.curr_y(), -40.0);
    }

    #[test]
    fn fling_toward_a_bound_behind_the_start_eases_back() {
        let mut scroller = Scroller::new(2000.0);
        scroller.fling(ms(0), 500.0, 0.0, 800.0, 0.0, 400.0, 400.0, 0.0, 0.0);
        assert_eq!(scroller.final_x(), 400.0);
        run_to_end(&mut scroller, ms(16));
        assert_eq!(scroller.curr_x(), 400.0);
    }

    #[test]
    fn reversed_bounds_collapse_to_min() {
        let mut scroller = Scroller::new(2000.0);
        scroller.fling(ms(0), 0.0, 0.0, 600.0, 0.0, 30.0, -30.0, 0.0, 0.0);
        assert_eq!(scroller.final_x(), 30.0);
        run_to_end(&mut scroller, ms(16));
        assert_eq!(scroller.curr_x(), 30.0);
    }

    #[test]
    fn fling_without_room_finishes_immediately() {
        let mut scroller = Scroller::new(2000.0);
        scroller.fling(ms(0), 0.0, 0.0, 900.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(scroller.is_finished());
        let step = scroller.step(ms(0)).unwrap();
        assert_eq!((step.dx, step.dy), (0.0, 0.0));
        assert!(step.finished);
    }

    #[test]
    fn force_finished_cancels_motion_in_place() {
        let mut scroller = Scroller::new(2000.0);
        scroller.fling(ms(0), 0.0, 0.0, 1000.0, 0.0, -1e4, 1e4, 0.0, 0.0);
        scroller.step(ms(100)).unwrap();
        let stopped_at = scroller.curr_x();
        assert!(stopped_at > 0.0 && stopped_at < 250.0);

        scroller.force_finished(true);
        assert!(scroller.is_finished());
        assert!(scroller.step(ms(400)).is_none());
        assert_eq!(scroller.curr_x(), stopped_at);
    }
}
