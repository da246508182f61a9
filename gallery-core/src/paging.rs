//! Page-level coordination: which item is current, where the strip of pages
//! is scrolled to, and when a released gesture moves to a neighbouring page.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::config::GalleryConfig;
use crate::geometry::{Size, Transform};
use crate::gesture::{GestureEvent, GestureRecognizer, PointerEvent, RecognizerConfig};
use crate::scroller::Scroller;
use crate::zoom::{ZoomController, ZoomEvent};

#[derive(Debug, Clone)]
pub enum Command {
    NextPage { count: usize },
    PrevPage { count: usize },
    GotoPage { page: usize },
    ResetZoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GalleryEvent {
    PageChanged(usize),
    Press(usize),
    DoubleClick(usize),
    LongPress(usize),
    SwipeDown(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GallerySnapshot {
    pub current_page: usize,
    pub page_count: usize,
    pub page_offset: f64,
    pub container: Size,
    pub transform: Transform,
}

#[derive(Debug, Clone)]
struct ItemSlot {
    zoom: ZoomController,
    content_size: Option<Size>,
}

pub struct PagingCoordinator {
    config: GalleryConfig,
    items: Vec<ItemSlot>,
    current_page: usize,
    container: Size,
    scroller: Scroller,
    recognizer: GestureRecognizer,
    now: Duration,
    events: Arc<Mutex<Vec<GalleryEvent>>>,
}

impl PagingCoordinator {
    pub fn new(page_count: usize, initial_page: usize, config: GalleryConfig) -> Self {
        let items = (0..page_count)
            .map(|_| ItemSlot {
                zoom: ZoomController::new(&config),
                content_size: None,
            })
            .collect();
        Self {
            items,
            current_page: initial_page.min(page_count.saturating_sub(1)),
            container: Size::ZERO,
            scroller: Scroller::new(config.fling_deceleration)
                .with_settle_duration(config.page_settle_duration()),
            recognizer: GestureRecognizer::new(RecognizerConfig::from(&config)),
            now: Duration::ZERO,
            events: Arc::new(Mutex::new(Vec::new())),
            config,
        }
    }

    pub fn events(&self) -> Arc<Mutex<Vec<GalleryEvent>>> {
        Arc::clone(&self.events)
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.items.len()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    /// Horizontal scroll position of the page strip, in pixels.
    pub fn page_offset(&self) -> f64 {
        self.scroller.curr_x()
    }

    pub fn page_origin(&self, page: usize) -> f64 {
        page as f64 * self.container.width
    }

    pub fn transform(&self, index: usize) -> Option<Transform> {
        self.items
            .get(index)
            .map(|slot| slot.zoom.current_transform())
    }

    pub fn current_transform(&self) -> Transform {
        self.transform(self.current_page)
            .unwrap_or(Transform::IDENTITY)
    }

    /// Resolved media size, or the container size while it is unknown.
    pub fn content_size(&self, index: usize) -> Option<Size> {
        self.items
            .get(index)
            .map(|slot| slot.content_size.unwrap_or(self.container))
    }

    pub fn is_content_size_resolved(&self, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|slot| slot.content_size.is_some())
    }

    pub fn snapshot(&self) -> GallerySnapshot {
        GallerySnapshot {
            current_page: self.current_page,
            page_count: self.page_count(),
            page_offset: self.page_offset(),
            container: self.container,
            transform: self.current_transform(),
        }
    }

    #[instrument(skip(self))]
    pub fn on_layout(&mut self, container: Size) {
        self.container = container;
        for slot in &mut self.items {
            slot.zoom.set_viewport(container);
        }
        self.scroll_to_index(page_index(self.current_page), true);
    }

    /// Records the size of a resolved item. Late or repeated results simply
    /// overwrite the cache.
    pub fn set_content_size(&mut self, index: usize, size: Size) {
        let Some(slot) = self.items.get_mut(index) else {
            warn!(index, page_count = self.items.len(), "content size for unknown item");
            return;
        };
        trace!(index, width = size.width, height = size.height, "content size resolved");
        slot.content_size = Some(size);
        slot.zoom.set_content_aspect(size.aspect_ratio());
    }

    pub fn set_zoom_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(slot) = self.items.get_mut(index) {
            slot.zoom.set_zoom_enabled(enabled);
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::NextPage { count } => {
                let page = page_index(self.current_page).saturating_add(page_index(count));
                self.scroll_to_index(page, false)
            }
            Command::PrevPage { count } => {
                let page = page_index(self.current_page).saturating_sub(page_index(count));
                self.scroll_to_index(page, false)
            }
            Command::GotoPage { page } => self.scroll_to_index(page_index(page), false),
            Command::ResetZoom => {
                if let Some(slot) = self.items.get_mut(self.current_page) {
                    slot.zoom.reset();
                }
            }
        }
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        self.now = self.now.max(event.time());
        if let Some(gesture) = self.recognizer.handle(event) {
            self.dispatch(&gesture);
        }
    }

    /// Advances every motion source to `now`. Returns whether anything moved.
    pub fn tick(&mut self, now: Duration) -> bool {
        self.now = self.now.max(now);
        if let Some(gesture) = self.recognizer.poll(self.now) {
            self.dispatch(&gesture);
        }
        let mut moved = self.scroller.step(self.now).is_some();
        if let Some(slot) = self.items.get_mut(self.current_page) {
            moved |= slot.zoom.tick(self.now);
        }
        moved
    }

    /// Picks the page a released horizontal swipe lands on; `vx` in px/ms.
    pub fn settle_page(&mut self, vx: f64) {
        let min_fling = self.config.min_fling_velocity;
        let last = self.page_count().saturating_sub(1);
        if vx < -min_fling {
            self.fling_to_page((self.current_page + 1).min(last), vx);
        } else if vx > min_fling {
            self.fling_to_page(self.current_page.saturating_sub(1), vx);
        } else {
            let width = self.container.width;
            let progress = if width > 0.0 {
                (self.page_offset() - self.page_origin(self.current_page)) / width
            } else {
                0.0
            };
            let mut page = page_index(self.current_page);
            if progress > 1.0 / 3.0 {
                page += 1;
            } else if progress < -1.0 / 3.0 {
                page -= 1;
            }
            trace!(progress, page, "settle without fling");
            self.scroll_to_index(page, false);
        }
    }

    pub fn fling_to_page(&mut self, page: usize, vx: f64) {
        let page = self.valid_page(page_index(page));
        self.on_page_changed(page);
        let target = self.page_origin(page);
        debug!(page, vx, "fling to page");
        self.scroller.fling(
            self.now,
            self.page_offset(),
            0.0,
            -vx * 1000.0,
            0.0,
            target,
            target,
            0.0,
            0.0,
        );
    }

    /// Clamps `page` into range, makes it current and scrolls to its origin.
    pub fn scroll_to_index(&mut self, page: i64, immediate: bool) {
        let page = self.valid_page(page);
        self.on_page_changed(page);
        let from = self.page_offset();
        let duration = if immediate {
            Duration::ZERO
        } else {
            self.config.page_settle_duration()
        };
        self.scroller
            .start_scroll(self.now, from, 0.0, self.page_origin(page) - from, 0.0, duration);
    }

    pub fn on_page_changed(&mut self, page: usize) {
        if page == self.current_page || page >= self.items.len() {
            return;
        }
        let previous = self.current_page;
        self.current_page = page;
        if let Some(slot) = self.items.get_mut(previous) {
            slot.zoom.reset();
        }
        debug!(previous, page, "page changed");
        self.events.lock().push(GalleryEvent::PageChanged(page));
    }

    fn valid_page(&self, page: i64) -> usize {
        let last = page_index(self.page_count().saturating_sub(1));
        page.clamp(0, last) as usize
    }

    fn dispatch(&mut self, gesture: &GestureEvent) {
        let page = self.current_page;
        let now = self.now;
        let Some(slot) = self.items.get_mut(page) else {
            return;
        };
        slot.zoom.apply_gesture(now, gesture);
        for event in slot.zoom.drain_events() {
            self.on_zoom_event(page, event);
        }
        if matches!(gesture, GestureEvent::End { .. }) {
            self.settle_stranded_strip();
        }
    }

    /// A session the item kept (a tap after a few pixels of hand-off, say)
    /// never settles the strip itself, so snap back to the current page.
    fn settle_stranded_strip(&mut self) {
        let stranded = (self.page_offset() - self.page_origin(self.current_page)).abs() > 1e-6;
        if self.scroller.is_finished() && stranded {
            trace!(offset = self.page_offset(), "strip left between pages");
            self.settle_page(0.0);
        }
    }

    fn on_zoom_event(&mut self, page: usize, event: ZoomEvent) {
        match event {
            ZoomEvent::Press => self.events.lock().push(GalleryEvent::Press(page)),
            ZoomEvent::DoubleClick => self.events.lock().push(GalleryEvent::DoubleClick(page)),
            ZoomEvent::LongPress => self.events.lock().push(GalleryEvent::LongPress(page)),
            ZoomEvent::HorizontalOverflow { offset } => {
                let from = self.page_offset();
                self.scroller
                    .start_scroll(self.now, from, 0.0, -offset, 0.0, Duration::ZERO);
            }
            ZoomEvent::SwipeBoundary { velocity_x } => self.settle_page(velocity_x),
            ZoomEvent::SwipeDown { velocity_y } => {
                debug!(page, velocity_y, "swipe down");
                self.events.lock().push(GalleryEvent::SwipeDown(page));
                self.scroll_to_index(page_index(page), false);
            }
        }
    }
}

fn page_index(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::geometry::Point;

    const WIDTH: f64 = 400.0;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn coordinator(page_count: usize, initial_page: usize) -> PagingCoordinator {
        let mut paging = PagingCoordinator::new(page_count, initial_page, GalleryConfig::default());
        paging.on_layout(Size::new(WIDTH, 800.0));
        paging.tick(ms(0));
        paging.events().lock().clear();
        paging
    }

    fn settle(paging: &mut PagingCoordinator, mut now: Duration) -> Duration {
        let mut frames = 0;
        while paging.tick(now) {
            now += ms(16);
            frames += 1;
            assert!(frames < 1_000, "never settled");
        }
        now
    }

    fn touch(kind: &str, time: u64, x: f64, y: f64) -> PointerEvent {
        let time = ms(time);
        let contacts = vec![Point::new(x, y)];
        match kind {
            "down" => PointerEvent::Down { time, contacts },
            "move" => PointerEvent::Move { time, contacts },
            _ => PointerEvent::Up {
                time,
                contacts: Vec::new(),
            },
        }
    }

    fn drain(paging: &PagingCoordinator) -> Vec<GalleryEvent> {
        std::mem::take(&mut *paging.events().lock())
    }

    #[test]
    fn layout_jumps_to_initial_page() {
        let paging = coordinator(5, 2);
        assert_eq!(paging.current_page(), 2);
        assert_eq!(paging.page_offset(), 2.0 * WIDTH);
    }

    #[test]
    fn fast_leftward_release_advances_one_page() {
        let mut paging = coordinator(5, 2);
        paging.settle_page(-0.8);
        assert_eq!(paging.current_page(), 3);
        settle(&mut paging, ms(0));
        assert!((paging.page_offset() - 3.0 * WIDTH).abs() < 1e-9);
        assert_eq!(drain(&paging), vec![GalleryEvent::PageChanged(3)]);
    }

    #[test]
    fn fast_rightward_release_goes_back_one_page() {
        let mut paging = coordinator(5, 2);
        paging.settle_page(4.0);
        assert_eq!(paging.current_page(), 1);
    }

    #[test]
    fn fling_never_leaves_the_page_range() {
        let mut paging = coordinator(5, 4);
        paging.settle_page(-3.0);
        assert_eq!(paging.current_page(), 4);
        let mut paging = coordinator(5, 0);
        paging.settle_page(3.0);
        assert_eq!(paging.current_page(), 0);
        assert!(drain(&paging).is_empty());
    }

    #[test]
    fn slow_release_uses_drag_progress() {
        let mut paging = coordinator(5, 2);
        paging.on_zoom_event(2, ZoomEvent::HorizontalOverflow { offset: -0.4 * WIDTH });
        assert!((paging.page_offset() - 2.4 * WIDTH).abs() < 1e-9);
        paging.settle_page(0.0);
        assert_eq!(paging.current_page(), 3);

        let mut paging = coordinator(5, 2);
        paging.on_zoom_event(2, ZoomEvent::HorizontalOverflow { offset: -0.2 * WIDTH });
        paging.settle_page(0.0);
        assert_eq!(paging.current_page(), 2);
        settle(&mut paging, ms(0));
        assert!((paging.page_offset() - 2.0 * WIDTH).abs() < 1e-9);

        let mut paging = coordinator(5, 2);
        paging.on_zoom_event(2, ZoomEvent::HorizontalOverflow { offset: 0.5 * WIDTH });
        paging.settle_page(0.3);
        assert_eq!(paging.current_page(), 1);
    }

    #[test]
    fn drag_gesture_pages_forward() {
        let mut paging = coordinator(5, 2);
        paging.handle_pointer(&touch("down", 0, 300.0, 400.0));
        let mut x = 300.0;
        for step in 1..=8u64 {
            x -= 20.0;
            paging.handle_pointer(&touch("move", step * 16, x, 400.0));
        }
        // pause so the release carries no velocity
        paging.handle_pointer(&touch("move", 400, x, 400.0));
        assert!((paging.page_offset() - (2.0 * WIDTH + 160.0)).abs() < 1e-9);
        paging.handle_pointer(&touch("up", 410, x, 400.0));
        assert_eq!(paging.current_page(), 3);

        settle(&mut paging, ms(410));
        assert!((paging.page_offset() - 3.0 * WIDTH).abs() < 1e-9);
        assert_eq!(drain(&paging), vec![GalleryEvent::PageChanged(3)]);
    }

    #[test]
    fn tap_does_not_freeze_a_page_animation() {
        let mut paging = coordinator(5, 0);
        paging.scroll_to_index(3, false);
        paging.tick(ms(150));
        assert!(paging.page_offset() < 3.0 * WIDTH);
        paging.handle_pointer(&touch("down", 160, 200.0, 400.0));
        paging.handle_pointer(&touch("up", 200, 200.0, 400.0));

        settle(&mut paging, ms(200));
        assert_eq!(paging.current_page(), 3);
        assert!((paging.page_offset() - 3.0 * WIDTH).abs() < 1e-9);
    }

    #[test]
    fn tap_with_small_hand_off_returns_to_the_page() {
        let mut paging = coordinator(5, 2);
        paging.handle_pointer(&touch("down", 0, 200.0, 400.0));
        paging.handle_pointer(&touch("move", 16, 205.0, 400.0));
        assert!((paging.page_offset() - (2.0 * WIDTH - 5.0)).abs() < 1e-9);
        paging.handle_pointer(&touch("up", 40, 205.0, 400.0));
        assert_eq!(drain(&paging), vec![GalleryEvent::Press(2)]);

        settle(&mut paging, ms(40));
        assert_eq!(paging.current_page(), 2);
        assert!((paging.page_offset() - 2.0 * WIDTH).abs() < 1e-9);
    }

    #[test]
    fn long_press_is_published_for_the_current_page() {
        let config = GalleryConfig {
            long_press_enabled: true,
            long_press_threshold_ms: 500,
            ..GalleryConfig::default()
        };
        let mut paging = PagingCoordinator::new(3, 1, config);
        paging.on_layout(Size::new(WIDTH, 800.0));
        paging.handle_pointer(&touch("down", 0, 200.0, 400.0));
        paging.tick(ms(100));
        assert!(drain(&paging).is_empty());

        paging.tick(ms(501));
        assert_eq!(drain(&paging), vec![GalleryEvent::LongPress(1)]);
        paging.tick(ms(600));
        paging.handle_pointer(&touch("up", 700, 200.0, 400.0));
        assert!(drain(&paging).is_empty());
        assert_eq!(paging.current_page(), 1);
    }

    #[test]
    fn scroll_to_index_clamps() {
        let mut paging = coordinator(5, 2);
        paging.scroll_to_index(-3, true);
        assert_eq!(paging.current_page(), 0);
        assert_eq!(paging.page_offset(), 0.0);
        paging.scroll_to_index(5 + 10, false);
        assert_eq!(paging.current_page(), 4);
        settle(&mut paging, ms(0));
        assert!((paging.page_offset() - 4.0 * WIDTH).abs() < 1e-9);
    }

    #[test]
    fn animated_scroll_takes_the_settle_duration() {
        let mut paging = coordinator(5, 0);
        paging.scroll_to_index(1, false);
        paging.tick(ms(200));
        let halfway = paging.page_offset();
        assert!(halfway > 0.0 && halfway < WIDTH);
        paging.tick(ms(400));
        assert_eq!(paging.page_offset(), WIDTH);
    }

    #[test]
    fn page_change_resets_the_previous_item_only() {
        let mut paging = coordinator(5, 2);
        // zoom the current item with a double tap
        paging.handle_pointer(&touch("down", 0, 200.0, 400.0));
        paging.handle_pointer(&touch("up", 40, 200.0, 400.0));
        paging.handle_pointer(&touch("down", 120, 200.0, 400.0));
        paging.handle_pointer(&touch("up", 160, 200.0, 400.0));
        let now = settle(&mut paging, ms(160));
        assert!((paging.current_transform().scale - 2.5).abs() < 1e-6);
        assert_eq!(
            drain(&paging),
            vec![GalleryEvent::Press(2), GalleryEvent::DoubleClick(2)]
        );

        paging.tick(now);
        paging.apply(Command::NextPage { count: 1 });
        assert_eq!(paging.current_page(), 3);
        assert_eq!(paging.transform(2), Some(Transform::IDENTITY));
        assert_eq!(paging.current_transform(), Transform::IDENTITY);
        assert_eq!(drain(&paging), vec![GalleryEvent::PageChanged(3)]);
    }

    #[test]
    fn same_page_is_not_announced() {
        let mut paging = coordinator(3, 1);
        paging.on_page_changed(1);
        paging.apply(Command::GotoPage { page: 1 });
        assert!(drain(&paging).is_empty());
    }

    #[test]
    fn commands_move_and_clamp() {
        let mut paging = coordinator(10, 0);
        paging.apply(Command::NextPage { count: 4 });
        assert_eq!(paging.current_page(), 4);
        paging.apply(Command::PrevPage { count: 9 });
        assert_eq!(paging.current_page(), 0);
        paging.apply(Command::GotoPage { page: 42 });
        assert_eq!(paging.current_page(), 9);
        paging.apply(Command::GotoPage { page: 0 });
        paging.apply(Command::GotoPage { page: usize::MAX });
        assert_eq!(paging.current_page(), 9);
        paging.apply(Command::PrevPage { count: usize::MAX });
        assert_eq!(paging.current_page(), 0);
    }

    #[test]
    fn content_size_falls_back_to_container() {
        let mut paging = coordinator(3, 0);
        assert_eq!(paging.content_size(1), Some(Size::new(WIDTH, 800.0)));
        assert!(!paging.is_content_size_resolved(1));
        paging.set_content_size(1, Size::new(1920.0, 1080.0));
        assert_eq!(paging.content_size(1), Some(Size::new(1920.0, 1080.0)));
        paging.set_content_size(1, Size::new(1080.0, 1920.0));
        assert_eq!(paging.content_size(1), Some(Size::new(1080.0, 1920.0)));
        paging.set_content_size(7, Size::new(10.0, 10.0));
        assert_eq!(paging.content_size(7), None);
    }

    #[test]
    fn swipe_down_is_published_and_page_resettles() {
        let config = GalleryConfig {
            swipe_down_threshold: Some(100.0),
            ..GalleryConfig::default()
        };
        let mut paging = PagingCoordinator::new(3, 1, config);
        paging.on_layout(Size::new(WIDTH, 800.0));
        paging.handle_pointer(&touch("down", 0, 200.0, 100.0));
        paging.handle_pointer(&touch("move", 16, 210.0, 250.0));
        paging.handle_pointer(&touch("move", 32, 215.0, 400.0));
        paging.handle_pointer(&touch("up", 48, 215.0, 400.0));
        assert_eq!(paging.current_page(), 1);
        assert_eq!(drain(&paging), vec![GalleryEvent::SwipeDown(1)]);
        settle(&mut paging, ms(48));
        assert!((paging.page_offset() - WIDTH).abs() < 1e-9);
    }

    #[test]
    fn snapshot_serializes_state() {
        let paging = coordinator(4, 1);
        let snapshot = paging.snapshot();
        assert_eq!(snapshot.current_page, 1);
        assert_eq!(snapshot.page_count, 4);
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["page_offset"], serde_json::json!(WIDTH));
        assert_eq!(json["transform"]["scale"], serde_json::json!(1.0));
    }

    #[test]
    fn empty_gallery_is_inert() {
        let mut paging = PagingCoordinator::new(0, 3, GalleryConfig::default());
        paging.on_layout(Size::new(WIDTH, 800.0));
        paging.apply(Command::NextPage { count: 1 });
        paging.handle_pointer(&touch("down", 0, 1.0, 1.0));
        paging.handle_pointer(&touch("up", 10, 1.0, 1.0));
        assert_eq!(paging.current_page(), 0);
        assert_eq!(paging.current_transform(), Transform::IDENTITY);
        assert!(drain(&paging).is_empty());
    }
}
