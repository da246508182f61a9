//! Per-item pinch, pan and double-tap zoom.
//!
//! The controller stores a pivot-less [`Transform`] relative to the item's
//! letterboxed content rectangle. Live interaction mutates it directly; every
//! settle (fling, bounce, double tap) goes through an animation sampled by
//! [`ZoomController::tick`].

use std::time::Duration;

use tracing::{debug, trace};

use crate::animation::{Easing, RectAnimation};
use crate::config::GalleryConfig;
use crate::geometry::{
    aligned_rect, available_translate_space, fit_center_rect, get_transform, transformed_rect,
    Point, Rect, Size, Transform,
};
use crate::gesture::{GestureEvent, GestureState};
use crate::scroller::Scroller;

/// Signals for whoever owns the item, drained with [`ZoomController::drain_events`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomEvent {
    Press,
    DoubleClick,
    LongPress,
    /// A handed-off session was released; velocity in px/ms.
    SwipeBoundary { velocity_x: f64 },
    /// Horizontal movement, in pixels, that the item did not consume.
    HorizontalOverflow { offset: f64 },
    /// A handed-off session ended in a long downward drag.
    SwipeDown { velocity_y: f64 },
}

#[derive(Debug, Clone)]
pub struct ZoomController {
    config: GalleryConfig,
    zoom_enabled: bool,
    viewport: Size,
    content_aspect: Option<f64>,
    transform: Transform,
    is_panning: bool,
    is_pinching: bool,
    ignore_swipe: bool,
    scroller: Scroller,
    animation: Option<RectAnimation>,
    events: Vec<ZoomEvent>,
}

impl ZoomController {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            zoom_enabled: config.zoom_enabled,
            viewport: Size::ZERO,
            content_aspect: None,
            transform: Transform::IDENTITY,
            is_panning: false,
            is_pinching: false,
            ignore_swipe: false,
            scroller: Scroller::new(config.fling_deceleration)
                .with_settle_duration(config.bounce_duration()),
            animation: None,
            events: Vec::new(),
            config: config.clone(),
        }
    }

    pub fn current_transform(&self) -> Transform {
        self.transform
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn viewport_rect(&self) -> Rect {
        Rect::from_size(self.viewport)
    }

    /// The content rectangle at identity, letterboxed into the viewport.
    pub fn content_rect(&self) -> Rect {
        fit_center_rect(self.content_aspect.unwrap_or(0.0), self.viewport_rect())
    }

    pub fn transformed_content_rect(&self) -> Rect {
        transformed_rect(self.content_rect(), &self.transform)
    }

    pub fn is_zoom_enabled(&self) -> bool {
        self.zoom_enabled
    }

    pub fn is_handed_off(&self) -> bool {
        self.is_panning
    }

    pub fn is_pinching(&self) -> bool {
        self.is_pinching
    }

    /// No fling or settle animation is in flight.
    pub fn is_settled(&self) -> bool {
        self.scroller.is_finished() && self.animation.is_none()
    }

    /// A layout change discards the current zoom.
    pub fn set_viewport(&mut self, viewport: Size) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.reset();
        }
    }

    /// `None` (or an invalid ratio) fills the viewport.
    pub fn set_content_aspect(&mut self, aspect: Option<f64>) {
        self.content_aspect = aspect.filter(|ratio| ratio.is_finite() && *ratio > 0.0);
    }

    pub fn set_zoom_enabled(&mut self, enabled: bool) {
        self.zoom_enabled = enabled;
    }

    /// Back to identity immediately, dropping any motion in flight.
    pub fn reset(&mut self) {
        self.transform = Transform::IDENTITY;
        self.scroller.force_finished(true);
        self.animation = None;
        self.is_panning = false;
        self.is_pinching = false;
        self.ignore_swipe = false;
    }

    pub fn drain_events(&mut self) -> Vec<ZoomEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn apply_gesture(&mut self, now: Duration, event: &GestureEvent) {
        if self.viewport.is_empty() {
            return;
        }
        match event {
            GestureEvent::Start(_) => self.on_start(),
            GestureEvent::Move(state) => self.on_move(state),
            GestureEvent::LongPress(_) => self.events.push(ZoomEvent::LongPress),
            GestureEvent::End { state, terminated } => {
                if *terminated {
                    trace!("gesture session terminated by the platform");
                }
                self.on_release(now, state);
            }
        }
    }

    /// Advances fling and settle motion. Returns whether the transform moved.
    pub fn tick(&mut self, now: Duration) -> bool {
        let mut moved = false;
        if let Some(step) = self.scroller.step(now) {
            let scale = self.transform.scale;
            self.transform.translate_x += step.dx / scale;
            self.transform.translate_y += step.dy / scale;
            moved = true;
            if step.finished {
                self.animate_bounce(now);
            }
        }
        if let Some(animation) = self.animation {
            let rect = animation.sample(now);
            self.transform = get_transform(self.content_rect(), rect);
            if animation.is_finished(now) {
                self.animation = None;
            }
            moved = true;
        }
        moved
    }

    /// Whether a horizontal step of `step_dx` pixels belongs to the pager.
    ///
    /// Latched per session: once the item consumed movement it keeps the
    /// session, and once it handed off it keeps handing off.
    pub fn is_out_range(&self, step_dx: f64) -> bool {
        if self.ignore_swipe {
            return false;
        }
        if self.is_panning {
            return true;
        }
        let scale = self.transform.scale;
        let candidate = self.transform.translate_x + step_dx / scale;
        let overflow = self.transformed_content_rect().width() - self.viewport_rect().width();
        candidate.abs() * scale >= overflow / 2.0
    }

    /// Animates the scale back into `[min_scale, max_scale]` about the
    /// viewport centre and closes any gap to the viewport edges.
    pub fn animate_bounce(&mut self, now: Duration) {
        let current = self.transform.scale;
        let scale_by = if current > self.config.max_scale {
            self.config.max_scale / current
        } else if current < self.config.min_scale {
            self.config.min_scale / current
        } else {
            1.0
        };
        let viewport = self.viewport_rect();
        let rect = transformed_rect(
            self.transformed_content_rect(),
            &Transform::new(scale_by, 0.0, 0.0).with_pivot(viewport.center()),
        );
        self.animate_to(now, aligned_rect(rect, viewport));
    }

    /// Toggles between the minimum and maximum scale, bringing `pivot` to
    /// the viewport centre as far as alignment allows.
    pub fn perform_double_tap_up(&mut self, now: Duration, pivot: Point) {
        let current = self.transform.scale;
        let (min, max) = (self.config.min_scale, self.config.max_scale);
        let scale_by = if current > (min + max) / 2.0 {
            min / current
        } else {
            max / current
        };
        let viewport = self.viewport_rect();
        let rect = transformed_rect(
            self.transformed_content_rect(),
            &Transform::new(scale_by, 0.0, 0.0).with_pivot(pivot),
        )
        .offset(viewport.center_x() - pivot.x, viewport.center_y() - pivot.y);
        debug!(from = current, to = current * scale_by, "double tap zoom");
        self.animate_to(now, aligned_rect(rect, viewport));
    }

    /// Launches the pan scroller with release velocities in px/ms.
    pub fn perform_fling(&mut self, now: Duration, vx: f64, vy: f64) {
        let space = available_translate_space(self.transformed_content_rect(), self.viewport_rect());
        let overscroll = self.config.max_over_scroll_distance;
        let (min_x, max_x) = fling_bounds(vx, space.left, space.right, overscroll);
        let (min_y, max_y) = fling_bounds(vy, space.top, space.bottom, overscroll);

        let (mut velocity_x, mut velocity_y) = (vx * 1000.0, vy * 1000.0);
        if velocity_x.abs() > 2.0 * velocity_y.abs() {
            velocity_y = 0.0;
        } else if velocity_y.abs() > 2.0 * velocity_x.abs() {
            velocity_x = 0.0;
        }
        debug!(velocity_x, velocity_y, min_x, max_x, min_y, max_y, "zoom fling");
        self.scroller.fling(
            now,
            0.0,
            0.0,
            velocity_x,
            velocity_y,
            min_x,
            max_x,
            min_y,
            max_y,
        );
    }

    fn on_start(&mut self) {
        self.scroller.force_finished(true);
        self.animation = None;
        self.is_panning = false;
        self.is_pinching = false;
        self.ignore_swipe = false;
    }

    fn on_move(&mut self, state: &GestureState) {
        let dx = state.step_dx();
        let dy = state.step_dy();

        if state.contacts >= 2 && self.zoom_enabled {
            if self.is_panning {
                return;
            }
            self.ignore_swipe = true;
            self.is_pinching = true;
            if let (Some(pinch), Some(previous)) = (state.pinch, state.previous_pinch) {
                self.apply_pinch(pinch / previous, dx, dy, state.current());
            }
            return;
        }

        if self.is_out_range(dx) {
            if !self.is_panning {
                debug!(translate_x = self.transform.translate_x, "pan handed off to pager");
            }
            self.is_panning = true;
            self.events.push(ZoomEvent::HorizontalOverflow { offset: dx });
            return;
        }

        self.ignore_swipe = true;
        let (dx, dy) = if dx.abs() > 2.0 * dy.abs() {
            (dx, 0.0)
        } else if dy.abs() > 2.0 * dx.abs() {
            (0.0, dy)
        } else {
            (dx, dy)
        };
        let scale = self.transform.scale;
        self.transform.translate_x += dx / scale;
        self.transform.translate_y += dy / scale;
    }

    fn apply_pinch(&mut self, scale_by: f64, dx: f64, dy: f64, pivot: Point) {
        if !(scale_by.is_finite() && scale_by > 0.0) {
            return;
        }
        let step = Transform::new(scale_by, dx, dy).with_pivot(pivot);
        let rect = transformed_rect(self.transformed_content_rect(), &step);
        self.transform = get_transform(self.content_rect(), rect);
    }

    fn on_release(&mut self, now: Duration, state: &GestureState) {
        self.is_pinching = false;

        if state.single_tap_up {
            self.events.push(ZoomEvent::Press);
            return;
        }

        if state.double_tap_up {
            if self.zoom_enabled && self.config.double_tap_zoom {
                let pivot = if state.dx != 0.0 || state.dy != 0.0 {
                    state.current()
                } else {
                    state.start()
                };
                self.perform_double_tap_up(now, pivot);
            }
            self.events.push(ZoomEvent::DoubleClick);
            return;
        }

        if self.is_panning {
            let swipe_down = self.config.swipe_down_threshold.is_some_and(|threshold| {
                state.dy > threshold && state.dy.abs() > state.dx.abs()
            });
            if swipe_down {
                self.events.push(ZoomEvent::SwipeDown {
                    velocity_y: state.vy,
                });
            } else {
                self.events.push(ZoomEvent::SwipeBoundary {
                    velocity_x: state.vx,
                });
            }
            return;
        }

        if state.dx == 0.0 && state.dy == 0.0 {
            self.animate_bounce(now);
            return;
        }

        self.perform_fling(now, state.vx, state.vy);
    }

    fn animate_to(&mut self, now: Duration, target: Rect) {
        let from = self.transformed_content_rect();
        if from.approx_eq(&target, 1e-6) {
            self.transform = get_transform(self.content_rect(), target);
            self.animation = None;
            return;
        }
        self.animation = Some(RectAnimation::new(
            from,
            target,
            now,
            self.config.bounce_duration(),
            Easing::EaseInOut,
        ));
    }
}

/// Fling travel range along one axis: only towards the side the velocity
/// points to, limited by the overflow on that side plus the overscroll.
fn fling_bounds(velocity: f64, leading: f64, trailing: f64, overscroll: f64) -> (f64, f64) {
    if velocity > 0.0 {
        let max = if leading > 0.0 { leading + overscroll } else { 0.0 };
        (0.0, max)
    } else {
        let min = if trailing > 0.0 { -(trailing + overscroll) } else { 0.0 };
        (min, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn controller() -> ZoomController {
        let mut zoom = ZoomController::new(&GalleryConfig::default());
        zoom.set_viewport(Size::new(400.0, 800.0));
        zoom
    }

    fn settle(zoom: &mut ZoomController, mut now: Duration) -> Duration {
        let mut frames = 0;
        while zoom.tick(now) {
            now += ms(16);
            frames += 1;
            assert!(frames < 1_000, "never settled");
        }
        now
    }

    fn start_at(x: f64, y: f64) -> GestureState {
        GestureState {
            x0: x,
            y0: y,
            move_x: x,
            move_y: y,
            previous_move_x: x,
            previous_move_y: y,
            contacts: 1,
            ..GestureState::default()
        }
    }

    fn pan(state: &mut GestureState, dx: f64, dy: f64) -> GestureEvent {
        state.previous_move_x = state.move_x;
        state.previous_move_y = state.move_y;
        state.move_x += dx;
        state.move_y += dy;
        state.dx += dx;
        state.dy += dy;
        GestureEvent::Move(*state)
    }

    fn pinch_event(center: Point, previous: f64, current: f64) -> GestureEvent {
        GestureEvent::Move(GestureState {
            x0: center.x,
            y0: center.y,
            move_x: center.x,
            move_y: center.y,
            previous_move_x: center.x,
            previous_move_y: center.y,
            pinch: Some(current),
            previous_pinch: Some(previous),
            contacts: 2,
            ..GestureState::default()
        })
    }

    fn release(state: GestureState) -> GestureEvent {
        GestureEvent::End {
            state,
            terminated: false,
        }
    }

    /// Pinches about the viewport centre and lets the release settle.
    fn zoom_to(zoom: &mut ZoomController, scale: f64, now: Duration) -> Duration {
        let center = Point::new(200.0, 400.0);
        zoom.apply_gesture(now, &GestureEvent::Start(start_at(center.x, center.y)));
        zoom.apply_gesture(now, &pinch_event(center, 100.0, 100.0 * scale));
        zoom.apply_gesture(now, &release(start_at(center.x, center.y)));
        settle(zoom, now)
    }

    #[test]
    fn pinch_scales_about_the_midpoint_without_clamping() {
        let mut zoom = controller();
        let pivot = Point::new(100.0, 200.0);
        zoom.apply_gesture(ms(0), &GestureEvent::Start(start_at(pivot.x, pivot.y)));
        zoom.apply_gesture(ms(16), &pinch_event(pivot, 100.0, 400.0));

        let transform = zoom.current_transform();
        assert!((transform.scale - 4.0).abs() < EPS);
        // the pivot stays put on screen
        let rect = zoom.transformed_content_rect();
        assert!((rect.left - (pivot.x - 4.0 * pivot.x)).abs() < EPS);
        assert!((rect.top - (pivot.y - 4.0 * pivot.y)).abs() < EPS);
        assert!(zoom.is_pinching());
    }

    #[test]
    fn bounce_settles_over_pinch_on_the_max_scale() {
        let mut zoom = controller();
        zoom_to(&mut zoom, 4.0, ms(0));
        let transform = zoom.current_transform();
        assert!((transform.scale - 2.5).abs() < EPS, "{transform:?}");
        assert!(zoom.is_settled());
    }

    #[test]
    fn bounce_settles_under_pinch_on_the_min_scale() {
        let mut zoom = controller();
        zoom_to(&mut zoom, 0.3, ms(0));
        let transform = zoom.current_transform();
        assert!(transform.approx_eq(&Transform::IDENTITY, EPS), "{transform:?}");
    }

    #[test]
    fn bounce_clamps_every_out_of_range_scale() {
        for scale in [0.1, 0.5, 0.99, 2.6, 3.0, 8.0] {
            let mut zoom = controller();
            zoom_to(&mut zoom, scale, ms(0));
            let settled = zoom.current_transform().scale;
            let expected = scale.clamp(1.0, 2.5);
            assert!((settled - expected).abs() < EPS, "{scale} settled at {settled}");
            let rect = zoom.transformed_content_rect();
            let view = zoom.viewport_rect();
            assert!(rect.left <= view.left + EPS && rect.right >= view.right - EPS);
        }
    }

    #[test]
    fn double_tap_toggles_between_min_and_max() {
        let mut zoom = controller();
        let mut tap = start_at(200.0, 400.0);
        tap.double_tap_up = true;

        zoom.apply_gesture(ms(0), &GestureEvent::Start(start_at(200.0, 400.0)));
        zoom.apply_gesture(ms(10), &release(tap));
        assert_eq!(zoom.drain_events(), vec![ZoomEvent::DoubleClick]);
        let now = settle(&mut zoom, ms(10));
        let transform = zoom.current_transform();
        assert!((transform.scale - 2.5).abs() < EPS);
        assert!(transform.translate_x.abs() < EPS && transform.translate_y.abs() < EPS);

        zoom.apply_gesture(now, &GestureEvent::Start(start_at(200.0, 400.0)));
        zoom.apply_gesture(now, &release(tap));
        settle(&mut zoom, now);
        assert!(zoom.current_transform().approx_eq(&Transform::IDENTITY, EPS));
    }

    #[test]
    fn double_tap_brings_the_tap_point_to_the_centre() {
        let mut zoom = controller();
        let mut tap = start_at(100.0, 200.0);
        tap.double_tap_up = true;
        zoom.apply_gesture(ms(0), &GestureEvent::Start(tap));
        zoom.apply_gesture(ms(0), &release(tap));
        settle(&mut zoom, ms(0));

        let rect = zoom.transformed_content_rect();
        assert!(rect.approx_eq(&Rect::new(-50.0, -100.0, 950.0, 1900.0), EPS), "{rect:?}");
    }

    #[test]
    fn double_tap_zoom_can_be_disabled() {
        let mut zoom = controller();
        zoom.set_zoom_enabled(false);
        let mut tap = start_at(200.0, 400.0);
        tap.double_tap_up = true;
        zoom.apply_gesture(ms(0), &GestureEvent::Start(tap));
        zoom.apply_gesture(ms(0), &release(tap));
        assert!(!zoom.tick(ms(16)));
        assert_eq!(zoom.current_transform(), Transform::IDENTITY);
        assert_eq!(zoom.drain_events(), vec![ZoomEvent::DoubleClick]);
    }

    #[test]
    fn unzoomed_pan_is_handed_off() {
        let mut zoom = controller();
        let mut state = start_at(200.0, 400.0);
        zoom.apply_gesture(ms(0), &GestureEvent::Start(state));
        zoom.apply_gesture(ms(16), &pan(&mut state, -12.0, 1.0));
        assert_eq!(zoom.current_transform(), Transform::IDENTITY);
        assert!(zoom.is_handed_off());

        state.vx = -0.9;
        zoom.apply_gesture(ms(32), &release(state));
        assert_eq!(
            zoom.drain_events(),
            vec![
                ZoomEvent::HorizontalOverflow { offset: -12.0 },
                ZoomEvent::SwipeBoundary { velocity_x: -0.9 },
            ]
        );
    }

    #[test]
    fn handoff_sticks_for_the_rest_of_the_session() {
        let mut zoom = controller();
        let now = zoom_to(&mut zoom, 2.0, ms(0));
        zoom.drain_events();

        let mut state = start_at(200.0, 400.0);
        zoom.apply_gesture(now, &GestureEvent::Start(state));
        zoom.apply_gesture(now, &pan(&mut state, -250.0, 0.0));
        assert!(zoom.is_handed_off());
        // back inside the owned region, still not applied locally
        zoom.apply_gesture(now, &pan(&mut state, 10.0, 0.0));
        zoom.apply_gesture(now, &pinch_event(Point::new(200.0, 400.0), 100.0, 150.0));
        let transform = zoom.current_transform();
        assert!((transform.scale - 2.0).abs() < EPS);
        assert!(transform.translate_x.abs() < EPS);
        assert_eq!(
            zoom.drain_events(),
            vec![
                ZoomEvent::HorizontalOverflow { offset: -250.0 },
                ZoomEvent::HorizontalOverflow { offset: 10.0 },
            ]
        );
    }

    #[test]
    fn owned_pan_stays_owned_for_the_session() {
        let mut zoom = controller();
        let now = zoom_to(&mut zoom, 2.0, ms(0));

        let mut state = start_at(200.0, 400.0);
        zoom.apply_gesture(now, &GestureEvent::Start(state));
        zoom.apply_gesture(now, &pan(&mut state, -10.0, 0.0));
        zoom.apply_gesture(now, &pan(&mut state, -400.0, 0.0));
        assert!(!zoom.is_handed_off());
        assert!((zoom.current_transform().translate_x + 205.0).abs() < EPS);
        assert!(zoom.drain_events().is_empty());
    }

    #[test]
    fn pan_is_axis_locked() {
        let mut zoom = controller();
        let now = zoom_to(&mut zoom, 2.0, ms(0));
        let mut state = start_at(200.0, 400.0);
        zoom.apply_gesture(now, &GestureEvent::Start(state));
        zoom.apply_gesture(now, &pan(&mut state, 2.0, -30.0));
        let transform = zoom.current_transform();
        assert_eq!(transform.translate_x, 0.0);
        assert!((transform.translate_y + 15.0).abs() < EPS);
    }

    #[test]
    fn fling_stops_at_overflow_and_bounce_aligns() {
        let mut zoom = controller();
        let now = zoom_to(&mut zoom, 2.0, ms(0));

        let mut state = start_at(200.0, 400.0);
        zoom.apply_gesture(now, &GestureEvent::Start(state));
        zoom.apply_gesture(now, &pan(&mut state, -10.0, 0.0));
        state.vx = -1.0;
        zoom.apply_gesture(now, &release(state));
        assert!(!zoom.is_settled());

        settle(&mut zoom, now);
        let rect = zoom.transformed_content_rect();
        assert!((rect.right - 400.0).abs() < EPS, "{rect:?}");
        assert!((zoom.current_transform().translate_x + 100.0).abs() < EPS);
        assert!((zoom.current_transform().scale - 2.0).abs() < EPS);
    }

    #[test]
    fn new_session_cancels_motion_in_flight() {
        let mut zoom = controller();
        let mut tap = start_at(200.0, 400.0);
        tap.double_tap_up = true;
        zoom.apply_gesture(ms(0), &GestureEvent::Start(tap));
        zoom.apply_gesture(ms(0), &release(tap));
        zoom.tick(ms(100));
        let frozen = zoom.current_transform();
        assert!(frozen.scale > 1.0 && frozen.scale < 2.5);

        zoom.apply_gesture(ms(110), &GestureEvent::Start(start_at(10.0, 10.0)));
        assert!(zoom.is_settled());
        assert!(!zoom.tick(ms(400)));
        assert_eq!(zoom.current_transform(), frozen);
    }

    #[test]
    fn tap_and_long_press_are_reported() {
        let mut zoom = controller();
        let mut tap = start_at(50.0, 50.0);
        zoom.apply_gesture(ms(0), &GestureEvent::Start(tap));
        zoom.apply_gesture(ms(0), &GestureEvent::LongPress(tap));
        tap.single_tap_up = true;
        zoom.apply_gesture(ms(0), &release(tap));
        assert_eq!(
            zoom.drain_events(),
            vec![ZoomEvent::LongPress, ZoomEvent::Press]
        );
        assert!(zoom.drain_events().is_empty());
    }

    #[test]
    fn swipe_down_replaces_page_swipe_past_threshold() {
        let config = GalleryConfig {
            swipe_down_threshold: Some(100.0),
            ..GalleryConfig::default()
        };
        let mut zoom = ZoomController::new(&config);
        zoom.set_viewport(Size::new(400.0, 800.0));
        let mut state = start_at(200.0, 100.0);
        zoom.apply_gesture(ms(0), &GestureEvent::Start(state));
        zoom.apply_gesture(ms(16), &pan(&mut state, 5.0, 80.0));
        zoom.apply_gesture(ms(32), &pan(&mut state, 5.0, 80.0));
        state.vy = 2.0;
        zoom.apply_gesture(ms(48), &release(state));
        let events = zoom.drain_events();
        assert_eq!(events.last(), Some(&ZoomEvent::SwipeDown { velocity_y: 2.0 }));
    }

    #[test]
    fn reset_restores_identity() {
        let mut zoom = controller();
        zoom_to(&mut zoom, 2.0, ms(0));
        zoom.reset();
        assert_eq!(zoom.current_transform(), Transform::IDENTITY);
        assert!(zoom.is_settled());
    }

    #[test]
    fn gestures_are_ignored_without_a_viewport() {
        let mut zoom = ZoomController::new(&GalleryConfig::default());
        let center = Point::new(10.0, 10.0);
        zoom.apply_gesture(ms(0), &GestureEvent::Start(start_at(10.0, 10.0)));
        zoom.apply_gesture(ms(0), &pinch_event(center, 10.0, 30.0));
        assert_eq!(zoom.current_transform(), Transform::IDENTITY);
    }

    #[test]
    fn letterboxed_content_is_centred() {
        let mut zoom = controller();
        zoom.set_content_aspect(Some(2.0));
        assert!(zoom
            .content_rect()
            .approx_eq(&Rect::new(0.0, 300.0, 400.0, 500.0), EPS));
        zoom.set_content_aspect(Some(-1.0));
        assert_eq!(zoom.content_rect(), zoom.viewport_rect());
    }
}
