use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use gallery_core::{fit_center_rect, transformed_rect, PagingCoordinator, Rect, Size, Transform};
use image::RgbaImage;
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{instrument, trace, warn};

/// Straight RGBA, row-major, four bytes per pixel.
#[derive(Debug, Clone)]
pub struct RenderImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RenderImage {
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.pixels.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Resolves the natural size of a media item.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<Size>;
}

/// Reads image headers with the `image` crate on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProvider;

#[async_trait]
impl MediaProvider for ImageProvider {
    #[instrument(skip(self))]
    async fn probe(&self, path: &Path) -> Result<Size> {
        let owned = path.to_path_buf();
        let (width, height) = tokio::task::spawn_blocking(move || image::image_dimensions(owned))
            .await
            .context("dimension probe task panicked")?
            .with_context(|| format!("failed to read dimensions of {:?}", path))?;
        Ok(Size::new(width as f64, height as f64))
    }
}

/// One page to draw and the live transform of its item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageView {
    pub index: usize,
    pub transform: Transform,
}

#[derive(Debug, Clone)]
pub struct FrameRequest {
    pub width: u32,
    pub height: u32,
    /// Horizontal scroll of the page strip, in frame pixels.
    pub page_offset: f64,
    pub current_page: usize,
    pub pages: Vec<PageView>,
    pub background: [u8; 4],
}

impl FrameRequest {
    /// The current page and its neighbours, as laid out by `paging`.
    pub fn from_coordinator(paging: &PagingCoordinator, width: u32, height: u32) -> Self {
        let current = paging.current_page();
        let last = paging.page_count().saturating_sub(1);
        let pages = (current.saturating_sub(1)..=(current + 1).min(last))
            .filter_map(|index| {
                paging
                    .transform(index)
                    .map(|transform| PageView { index, transform })
            })
            .collect();
        Self {
            width,
            height,
            page_offset: paging.page_offset(),
            current_page: current,
            pages,
            background: [0, 0, 0, 255],
        }
    }
}

const CACHE_CAPACITY: usize = 5;

/// Decoded images for a list of files, cached around the current page.
pub struct ImageLibrary {
    paths: Vec<PathBuf>,
    cache: Mutex<HashMap<usize, Arc<RgbaImage>>>,
}

struct Placement {
    rect: Rect,
    clip_left: f64,
    clip_right: f64,
    image: Arc<RgbaImage>,
}

impl ImageLibrary {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn cached_indices(&self) -> Vec<usize> {
        let mut indices: Vec<_> = self.cache.lock().keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    pub fn decode(&self, index: usize, reference_page: usize) -> Result<Arc<RgbaImage>> {
        if let Some(image) = self.cache.lock().get(&index) {
            return Ok(Arc::clone(image));
        }
        let path = self
            .paths
            .get(index)
            .ok_or_else(|| anyhow!("item {} out of range", index))?;
        let image = image::open(path)
            .with_context(|| format!("failed to decode {:?}", path))?
            .to_rgba8();
        let image = Arc::new(image);
        self.store_cached(index, Arc::clone(&image), reference_page);
        Ok(image)
    }

    fn store_cached(&self, index: usize, image: Arc<RgbaImage>, reference_page: usize) {
        let mut cache = self.cache.lock();
        cache.insert(index, image);
        if cache.len() > CACHE_CAPACITY {
            let mut keys: Vec<_> = cache.keys().copied().collect();
            keys.sort_by_key(|key| key.abs_diff(reference_page));
            for stale in keys.into_iter().skip(CACHE_CAPACITY) {
                cache.remove(&stale);
            }
        }
    }

    /// Draws every requested page through its transform.
    ///
    /// Pages are clipped to their own slot of the strip, so a zoomed item
    /// never paints over its neighbours.
    #[instrument(skip(self, request), fields(width = request.width, height = request.height))]
    pub fn compose(&self, request: &FrameRequest) -> Result<RenderImage> {
        let mut frame = RenderImage::filled(request.width, request.height, request.background);
        if request.width == 0 || request.height == 0 {
            return Ok(frame);
        }
        let page_width = request.width as f64;
        let viewport = Rect::new(0.0, 0.0, page_width, request.height as f64);

        let mut placements = Vec::with_capacity(request.pages.len());
        for view in &request.pages {
            let left = view.index as f64 * page_width - request.page_offset;
            if left >= page_width || left + page_width <= 0.0 {
                continue;
            }
            // an unreadable item stays background; its neighbours still draw
            let image = match self.decode(view.index, request.current_page) {
                Ok(image) => image,
                Err(err) => {
                    warn!(index = view.index, error = %err, "skipping undecodable page");
                    continue;
                }
            };
            let aspect = Size::new(image.width() as f64, image.height() as f64)
                .aspect_ratio()
                .unwrap_or(0.0);
            let content = fit_center_rect(aspect, viewport);
            let rect = transformed_rect(content, &view.transform).offset(left, 0.0);
            trace!(index = view.index, ?rect, "placing page");
            placements.push(Placement {
                rect,
                clip_left: left,
                clip_right: left + page_width,
                image,
            });
        }

        let stride = request.width as usize * 4;
        frame
            .pixels
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                for placement in &placements {
                    draw_row(row, y, request.width, placement);
                }
            });
        Ok(frame)
    }
}

fn draw_row(row: &mut [u8], y: usize, width: u32, placement: &Placement) {
    let rect = placement.rect;
    let center_y = y as f64 + 0.5;
    if center_y < rect.top || center_y >= rect.bottom || rect.is_empty() {
        return;
    }
    let image = &placement.image;
    let (src_w, src_h) = (image.width(), image.height());
    if src_w == 0 || src_h == 0 {
        return;
    }
    let v = (((center_y - rect.top) / rect.height()) * src_h as f64) as u32;
    let v = v.min(src_h - 1);

    let start = rect.left.max(placement.clip_left).max(0.0).floor() as u32;
    let end = rect
        .right
        .min(placement.clip_right)
        .min(width as f64)
        .ceil()
        .max(0.0) as u32;
    for x in start..end.min(width) {
        let center_x = x as f64 + 0.5;
        if center_x < rect.left
            || center_x >= rect.right
            || center_x < placement.clip_left
            || center_x >= placement.clip_right
        {
            continue;
        }
        let u = (((center_x - rect.left) / rect.width()) * src_w as f64) as u32;
        let pixel = image.get_pixel(u.min(src_w - 1), v);
        let offset = x as usize * 4;
        row[offset..offset + 4].copy_from_slice(&pixel.0);
    }
}
