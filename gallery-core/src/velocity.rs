//! Release-velocity estimation from recent pointer samples.
//!
//! Uses the impulse strategy: the velocity is derived from the kinetic energy
//! the samples imparted, which keeps the estimate stable when frames arrive
//! at uneven intervals.

use std::time::Duration;

use crate::geometry::Point;

const HISTORY_SIZE: usize = 20;

/// Samples older than this, relative to the newest, are ignored.
const HORIZON: Duration = Duration::from_millis(100);

/// A gap this long between samples means the pointer had stopped.
const ASSUME_STOPPED: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Copy)]
struct Sample {
    time: Duration,
    value: f64,
}

#[derive(Debug, Clone)]
struct VelocityTracker1D {
    samples: [Option<Sample>; HISTORY_SIZE],
    index: usize,
}

impl VelocityTracker1D {
    fn new() -> Self {
        Self {
            samples: [None; HISTORY_SIZE],
            index: 0,
        }
    }

    fn add(&mut self, time: Duration, value: f64) {
        self.index = (self.index + 1) % HISTORY_SIZE;
        self.samples[self.index] = Some(Sample { time, value });
    }

    /// Units per millisecond.
    fn velocity(&self) -> f64 {
        let Some(newest) = self.samples[self.index] else {
            return 0.0;
        };

        let mut values = [0.0; HISTORY_SIZE];
        let mut ages = [0.0; HISTORY_SIZE];
        let mut count = 0;
        let mut cursor = self.index;
        let mut previous = newest;

        while let Some(sample) = self.samples[cursor] {
            let age = newest.time.saturating_sub(sample.time);
            let gap = previous.time.saturating_sub(sample.time);
            if age > HORIZON || gap > ASSUME_STOPPED {
                break;
            }
            previous = sample;
            values[count] = sample.value;
            ages[count] = -(age.as_secs_f64() * 1000.0);
            count += 1;
            if count >= HISTORY_SIZE {
                break;
            }
            cursor = if cursor == 0 {
                HISTORY_SIZE - 1
            } else {
                cursor - 1
            };
        }

        if count < 2 {
            return 0.0;
        }
        impulse_velocity(&values[..count], &ages[..count])
    }
}

/// `values`/`times` are ordered newest first, times in (negative) milliseconds.
fn impulse_velocity(values: &[f64], times: &[f64]) -> f64 {
    let oldest = values.len() - 1;
    let mut work = 0.0;
    for i in (1..=oldest).rev() {
        let dt = times[i - 1] - times[i];
        if dt == 0.0 {
            continue;
        }
        let v_curr = (values[i - 1] - values[i]) / dt;
        let v_prev = energy_to_velocity(work);
        work += (v_curr - v_prev) * v_curr.abs();
        if i == oldest {
            work *= 0.5;
        }
    }
    energy_to_velocity(work)
}

fn energy_to_velocity(energy: f64) -> f64 {
    energy.signum() * (2.0 * energy.abs()).sqrt()
}

/// Two-axis tracker fed with absolute pointer positions.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    x: VelocityTracker1D,
    y: VelocityTracker1D,
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self {
            x: VelocityTracker1D::new(),
            y: VelocityTracker1D::new(),
        }
    }

    pub fn add(&mut self, time: Duration, position: Point) {
        self.x.add(time, position.x);
        self.y.add(time, position.y);
    }

    /// `(vx, vy)` in pixels per millisecond.
    pub fn velocity(&self) -> (f64, f64) {
        (self.x.velocity(), self.y.velocity())
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
