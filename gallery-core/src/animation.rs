//! Time-sampled animations.
//!
//! An animation is a pure function of elapsed time: `rect(t) = lerp(from, to,
//! ease(t / duration))`. Callers sample it once per frame with a monotonic
//! timestamp; there is no listener bookkeeping.

use std::time::Duration;

use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    EaseOut,
    /// Symmetric ease-in-out, the curve used for bounce and double-tap settles.
    #[default]
    EaseInOut,
    /// Decelerating curve used for page snaps.
    Viscous,
}

impl Easing {
    /// Maps a linear fraction in `[0, 1]` onto the eased fraction.
    pub fn transform(&self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        match self {
            Easing::Linear => fraction,
            Easing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, fraction),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, fraction),
            Easing::Viscous => cubic_bezier(0.25, 0.1, 0.25, 1.0, fraction),
        }
    }
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, fraction: f64) -> f64 {
    if fraction <= 0.0 {
        return 0.0;
    }
    if fraction >= 1.0 {
        return 1.0;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample_curve = |a: f64, b: f64, c: f64, t: f64| ((a * t + b) * t + c) * t;
    let sample_derivative = |a: f64, b: f64, c: f64, t: f64| (3.0 * a * t + 2.0 * b) * t + c;

    // Newton-Raphson for the parametric t of `fraction`, bisection if it stalls.
    let mut t = fraction;
    let mut converged = false;
    for _ in 0..8 {
        let x = sample_curve(ax, bx, cx, t) - fraction;
        if x.abs() < 1e-7 {
            converged = true;
            break;
        }
        let dx = sample_derivative(ax, bx, cx, t);
        if dx.abs() < 1e-7 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }

    if !converged {
        let mut t0 = 0.0;
        let mut t1 = 1.0;
        t = fraction;
        for _ in 0..32 {
            let delta = sample_curve(ax, bx, cx, t) - fraction;
            if delta.abs() < 1e-7 {
                break;
            }
            if delta > 0.0 {
                t1 = t;
            } else {
                t0 = t;
            }
            t = 0.5 * (t0 + t1);
        }
    }

    sample_curve(ay, by, cy, t)
}

/// Fraction of `duration` elapsed between `start` and `now`, clamped to `[0, 1]`.
pub(crate) fn progress(start: Duration, now: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_sub(start);
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectAnimation {
    from: Rect,
    to: Rect,
    start: Duration,
    duration: Duration,
    easing: Easing,
}

impl RectAnimation {
    pub fn new(from: Rect, to: Rect, start: Duration, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    pub fn target(&self) -> Rect {
        self.to
    }

    pub fn sample(&self, now: Duration) -> Rect {
        let fraction = progress(self.start, now, self.duration);
        if fraction >= 1.0 {
            return self.to;
        }
        self.from.lerp(&self.to, self.easing.transform(fraction))
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now.saturating_sub(self.start) >= self.duration
    }
}
