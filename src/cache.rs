//! LRU curve cache backed by a shared texture atlas.
//!
//! Each curve is rasterized once into its own rectangle of a single RGBA
//! atlas and reused on later frames. The atlas is carved into fixed-width
//! columns filled top to bottom. When no column has room, space left by
//! removed curves is reclaimed first. If that is not enough, the older half
//! of the least recently used curves is dropped. Either way the atlas is
//! wiped and every survivor is drawn again from the top, in the order it
//! held before, so a set that fit once always fits again.
//!
//! ```text
//!   x=0        x=128      x=256
//!   +----------+----------+
//!   | curve 3  | curve 5  |
//!   +------+   +-------+  |
//!   |  4   |   |       |  |  <- cursor (x=128, y)
//!   +------+   |       |  |
//!   |          |       |  |
//! ```
//!
//! Rectangles handed out are half-open pixel rectangles in atlas space.
//! Whenever atlas pixels change the cache is marked dirty; the owner
//! uploads the atlas and calls [`Cache::clear_dirty`].

use std::collections::{BTreeMap, HashMap};

use image::RgbaImage;
use log::{debug, trace, warn};

use crate::basics::{iceil, ifloor, RectI};
use crate::clock::Time;
use crate::color::Rgba8;
use crate::error::{Error, Result};
use crate::painter::{DrawStyle, Paint, Painter};
use crate::path::Path;
use crate::pixfmt::PixfmtRgba32;
use crate::renderer_base::RendererBase;

/// Handle of a loaded curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurveId(pub u32);

/// Cache settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// Width of one allocation column, in atlas pixels.
    pub column_width: u32,
    /// Device pixels per logical point.
    pub pixels_per_pt: f64,
    /// Color curves are filled with.
    pub color: Rgba8,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            column_width: 128,
            pixels_per_pt: 1.0,
            color: Rgba8::BLACK,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    path: Path,
    /// Pixel box of the path before placement.
    pixel_box: RectI,
    /// Placement in the atlas.
    rect: RectI,
    time: Time,
    stamp: u64,
}

/// Curve atlas with least-recently-used eviction.
#[derive(Debug)]
pub struct Cache {
    atlas: RgbaImage,
    config: CacheConfig,
    entries: HashMap<CurveId, Entry>,
    // Stamp -> id, oldest first.
    recency: BTreeMap<u64, CurveId>,
    next_stamp: u64,
    // Entries removed since the last re-pack.
    holes: usize,
    cursor_x: i32,
    cursor_y: i32,
    dirty: bool,
    painter: Painter,
}

impl Cache {
    /// An empty cache over a transparent `width` x `height` atlas.
    pub fn new(width: u32, height: u32, config: CacheConfig) -> Self {
        debug!("creating {}x{} curve atlas", width, height);
        Self {
            atlas: RgbaImage::new(width, height),
            painter: Painter::new(config.pixels_per_pt),
            config,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_stamp: 0,
            holes: 0,
            cursor_x: 0,
            cursor_y: 0,
            dirty: false,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The atlas pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.atlas
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: CurveId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Current atlas rectangle of `id`, without touching its recency.
    pub fn rect(&self, id: CurveId) -> Option<RectI> {
        self.entries.get(&id).map(|e| e.rect)
    }

    /// Ids from least to most recently used.
    pub fn lru_order(&self) -> impl Iterator<Item = CurveId> + '_ {
        self.recency.values().copied()
    }

    /// Integer pixel rectangle covering `path`'s bounds at the configured
    /// scale. An empty path has an empty box at the origin.
    ///
    /// # Panics
    ///
    /// If the path contains a cubic segment.
    pub fn pixel_box(&self, path: &Path) -> RectI {
        let b = path.bounds();
        if !b.is_valid() {
            return RectI::default();
        }
        let ppp = self.config.pixels_per_pt;
        RectI::new(
            ifloor(b.x1 as f64 * ppp),
            ifloor(b.y1 as f64 * ppp),
            iceil(b.x2 as f64 * ppp),
            iceil(b.y2 as f64 * ppp),
        )
    }

    /// Atlas rectangle holding `id`, rasterizing `path` on a miss.
    ///
    /// A hit records `t` as the last access and makes `id` the most
    /// recently used entry. `path` is ignored on a hit. A miss may evict
    /// older curves to make room; curves last used at `t` are never
    /// evicted.
    ///
    /// # Panics
    ///
    /// On a miss, if `path` contains a cubic segment.
    pub fn get(&mut self, id: CurveId, path: &Path, t: Time) -> Result<RectI> {
        if let Some(e) = self.entries.get_mut(&id) {
            e.time = t;
            let (old, rect) = (e.stamp, e.rect);
            self.recency.remove(&old);
            self.touch(id);
            trace!("curve cache hit {:?} at {:?}", id, rect);
            return Ok(rect);
        }

        let pixel_box = self.pixel_box(path);
        let (x, y) = self.find_space(pixel_box.width(), pixel_box.height(), t)?;
        let rect = RectI::new(x, y, x + pixel_box.width(), y + pixel_box.height());
        draw_entry(
            &mut self.painter,
            &mut self.atlas,
            self.config.color,
            path,
            &pixel_box,
            &rect,
        );
        self.entries.insert(
            id,
            Entry {
                path: path.clone(),
                pixel_box,
                rect,
                time: t,
                stamp: 0,
            },
        );
        self.touch(id);
        self.dirty = true;
        debug!("curve cache miss {:?}, rasterized into {:?}", id, rect);
        Ok(rect)
    }

    /// Forget `id`. Its atlas space is reclaimed by the next allocation
    /// that runs out of room.
    pub fn remove(&mut self, id: CurveId) -> bool {
        match self.entries.remove(&id) {
            Some(e) => {
                self.recency.remove(&e.stamp);
                self.holes += 1;
                true
            }
            None => false,
        }
    }

    /// Give `id` a fresh stamp at the most recently used end.
    fn touch(&mut self, id: CurveId) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        if let Some(e) = self.entries.get_mut(&id) {
            e.stamp = stamp;
            self.recency.insert(stamp, id);
        }
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Reserve a `w` x `h` pixel slot, evicting old curves if the atlas is
    /// full. Returns the slot's top-left corner.
    ///
    /// Fails with [`Error::CurveTooLarge`] without changing anything when
    /// the slot can never fit in a column, and with
    /// [`Error::CacheExhausted`] when eviction cannot free enough room.
    pub fn find_space(&mut self, w: i32, h: i32, t: Time) -> Result<(i32, i32)> {
        let max_width = self.column_width();
        let max_height = self.atlas.height() as i32;
        if w > max_width || h > max_height {
            return Err(Error::CurveTooLarge {
                width: w as u32,
                height: h as u32,
                max_width: max_width as u32,
                max_height: max_height as u32,
            });
        }
        if let Some(p) = self.place(w, h) {
            return Ok(p);
        }
        if self.holes > 0 {
            debug!("re-packing {} curves over {} removed", self.entries.len(), self.holes);
            self.repack();
            if let Some(p) = self.place(w, h) {
                return Ok(p);
            }
        }
        self.clear_half(t)?;
        self.place(w, h).ok_or(Error::CacheExhausted {
            entries: self.entries.len(),
        })
    }

    fn column_width(&self) -> i32 {
        self.config.column_width.min(self.atlas.width()) as i32
    }

    /// Place at the cursor, moving to the next column when this one is too
    /// short. Never evicts.
    fn place(&mut self, w: i32, h: i32) -> Option<(i32, i32)> {
        let atlas_w = self.atlas.width() as i32;
        let atlas_h = self.atlas.height() as i32;
        if h > atlas_h - self.cursor_y {
            self.cursor_x += self.column_width();
            self.cursor_y = 0;
        }
        if w > atlas_w - self.cursor_x || h > atlas_h - self.cursor_y {
            return None;
        }
        let p = (self.cursor_x, self.cursor_y);
        self.cursor_y += h;
        Some(p)
    }

    /// Evict up to half of the entries, oldest first, skipping any used at
    /// or after `t`, then re-pack the survivors.
    pub fn clear_half(&mut self, t: Time) -> Result<()> {
        let to_delete = self.entries.len() / 2;
        let victims: Vec<(u64, CurveId)> = self
            .recency
            .iter()
            .filter(|(_, id)| self.entries.get(id).is_some_and(|e| e.time < t))
            .take(to_delete)
            .map(|(&stamp, &id)| (stamp, id))
            .collect();
        if victims.is_empty() && !self.entries.is_empty() {
            warn!(
                "curve cache is full ({} items), nothing older than {:?}",
                self.entries.len(),
                t
            );
            return Err(Error::CacheExhausted {
                entries: self.entries.len(),
            });
        }
        for (stamp, id) in &victims {
            self.recency.remove(stamp);
            self.entries.remove(id);
        }
        debug!(
            "evicted {} curves, re-packing {}",
            victims.len(),
            self.entries.len()
        );
        self.repack();
        Ok(())
    }

    /// Clear the atlas and draw every entry again from the top, column by
    /// column in their previous atlas order.
    ///
    /// Placement only ever moves an entry to the same or an earlier
    /// position than it held, so every entry that was placed before is
    /// placed again.
    fn repack(&mut self) {
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.holes = 0;
        for p in self.atlas.pixels_mut() {
            *p = image::Rgba([0, 0, 0, 0]);
        }

        let mut order: Vec<(i32, i32, CurveId)> = self
            .entries
            .iter()
            .map(|(&id, e)| (e.rect.x1, e.rect.y1, id))
            .collect();
        order.sort_unstable();
        for (_, _, id) in order {
            let Some(e) = self.entries.get(&id) else {
                continue;
            };
            let (w, h) = (e.pixel_box.width(), e.pixel_box.height());
            let Some((x, y)) = self.place(w, h) else {
                unreachable!("curve {:?} no longer fits after re-pack", id);
            };
            let rect = RectI::new(x, y, x + w, y + h);
            if let Some(e) = self.entries.get_mut(&id) {
                e.rect = rect;
                draw_entry(
                    &mut self.painter,
                    &mut self.atlas,
                    self.config.color,
                    &e.path,
                    &e.pixel_box,
                    &rect,
                );
            }
        }
        self.dirty = true;
    }
}

/// Clear `rect` and fill `path` into it, shifted so that the corner of
/// `pixel_box` lands on the corner of `rect`.
fn draw_entry(
    painter: &mut Painter,
    atlas: &mut RgbaImage,
    color: Rgba8,
    path: &Path,
    pixel_box: &RectI,
    rect: &RectI,
) {
    {
        let mut ren = RendererBase::new(PixfmtRgba32::new(atlas));
        if !ren.clip_to_region(rect) {
            return;
        }
        ren.clear(&Rgba8::TRANSPARENT);
    }
    let offset = (
        (rect.x1 - pixel_box.x1) as f64,
        (rect.y1 - pixel_box.y1) as f64,
    );
    painter.rasterize(
        atlas,
        rect,
        path,
        offset,
        &DrawStyle::Fill,
        &Paint::Solid(color),
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::Point;
    use crate::shapes::{Rectangle, Shape};

    fn square(size: f32) -> Path {
        Rectangle::new(Point::new(0.0, 0.0), Point::new(size, size)).path()
    }

    fn alpha_at(c: &Cache, x: i32, y: i32) -> u8 {
        c.image().get_pixel(x as u32, y as u32).0[3]
    }

    /// 256x64 atlas: two columns, each holding two 32x32 squares.
    fn full_cache(t: impl Fn(u32) -> Time) -> Cache {
        let mut c = Cache::new(256, 64, CacheConfig::default());
        for i in 0..4 {
            c.get(CurveId(i), &square(32.0), t(i)).unwrap();
        }
        c
    }

    fn assert_disjoint(c: &Cache) {
        let rects: Vec<RectI> = c.lru_order().filter_map(|id| c.rect(id)).collect();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_miss_rasterizes_and_sets_dirty() {
        let mut c = Cache::new(256, 256, CacheConfig::default());
        assert!(!c.is_dirty());
        let r = c.get(CurveId(1), &square(10.0), Time(0)).unwrap();
        assert_eq!(r, RectI::new(0, 0, 10, 10));
        assert!(c.is_dirty());
        assert_eq!(alpha_at(&c, 5, 5), 255);
        assert_eq!(alpha_at(&c, 10, 5), 0);
        assert_eq!(c.image().get_pixel(5, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_hit_returns_same_rect_without_dirtying() {
        let mut c = Cache::new(256, 256, CacheConfig::default());
        let r1 = c.get(CurveId(1), &square(10.0), Time(0)).unwrap();
        c.clear_dirty();
        let r2 = c.get(CurveId(1), &square(10.0), Time(1)).unwrap();
        assert_eq!(r1, r2);
        assert!(!c.is_dirty());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_slots_stack_in_columns() {
        let mut c = Cache::new(256, 64, CacheConfig::default());
        let r0 = c.get(CurveId(0), &square(32.0), Time(0)).unwrap();
        let r1 = c.get(CurveId(1), &square(32.0), Time(0)).unwrap();
        let r2 = c.get(CurveId(2), &square(32.0), Time(0)).unwrap();
        assert_eq!(r0, RectI::new(0, 0, 32, 32));
        assert_eq!(r1, RectI::new(0, 32, 32, 64));
        assert_eq!(r2, RectI::new(128, 0, 160, 32));
    }

    #[test]
    fn test_pixel_box_rounds_outward() {
        let mut cfg = CacheConfig::default();
        cfg.pixels_per_pt = 2.0;
        let c = Cache::new(64, 64, cfg);
        let mut p = Path::new();
        p.add_start(Point::new(1.3, 2.6));
        p.add_line(Point::new(4.1, 3.0));
        assert_eq!(c.pixel_box(&p), RectI::new(2, 5, 9, 6));
        assert_eq!(c.pixel_box(&Path::new()), RectI::default());
    }

    #[test]
    fn test_offset_bounds_land_at_slot_origin() {
        let mut c = Cache::new(128, 128, CacheConfig::default());
        let shape = Rectangle::new(Point::new(50.0, 40.0), Point::new(60.0, 44.0)).path();
        let r = c.get(CurveId(9), &shape, Time(0)).unwrap();
        assert_eq!(r, RectI::new(0, 0, 10, 4));
        assert_eq!(alpha_at(&c, 0, 0), 255);
        assert_eq!(alpha_at(&c, 9, 3), 255);
        assert_eq!(alpha_at(&c, 50, 40), 0);
    }

    #[test]
    fn test_full_atlas_evicts_at_most_half() {
        let mut c = full_cache(|i| Time(i as i32));
        let r = c.get(CurveId(10), &square(32.0), Time(10)).unwrap();

        assert_eq!(c.len(), 3);
        assert!(!c.contains(CurveId(0)));
        assert!(!c.contains(CurveId(1)));
        // Survivors re-packed in their previous atlas order.
        assert_eq!(c.rect(CurveId(2)), Some(RectI::new(0, 0, 32, 32)));
        assert_eq!(c.rect(CurveId(3)), Some(RectI::new(0, 32, 32, 64)));
        assert_eq!(r, RectI::new(128, 0, 160, 32));
        assert_disjoint(&c);

        // Old slots were wiped and survivors redrawn.
        assert_eq!(alpha_at(&c, 140, 40), 0);
        assert_eq!(alpha_at(&c, 16, 16), 255);
        assert_eq!(alpha_at(&c, 16, 48), 255);
        assert_eq!(alpha_at(&c, 140, 16), 255);
    }

    #[test]
    fn test_recent_hit_protects_from_eviction() {
        let mut c = full_cache(|i| Time(i as i32));
        c.get(CurveId(0), &square(32.0), Time(5)).unwrap();
        c.get(CurveId(4), &square(32.0), Time(6)).unwrap();
        assert!(c.contains(CurveId(0)));
        assert!(!c.contains(CurveId(1)));
        assert!(!c.contains(CurveId(2)));
        assert!(c.contains(CurveId(3)));
        assert_eq!(c.lru_order().collect::<Vec<_>>(), vec![CurveId(3), CurveId(0), CurveId(4)]);
        assert_disjoint(&c);
    }

    #[test]
    fn test_curves_used_this_frame_are_not_evicted() {
        let mut c = full_cache(|_| Time(5));
        c.clear_dirty();
        let err = c.get(CurveId(7), &square(32.0), Time(5)).unwrap_err();
        assert_eq!(err, Error::CacheExhausted { entries: 4 });
        assert_eq!(c.len(), 4);
        assert!(!c.contains(CurveId(7)));
        assert!(!c.is_dirty());
    }

    #[test]
    fn test_too_large_changes_nothing() {
        let mut c = Cache::new(256, 64, CacheConfig::default());
        c.get(CurveId(0), &square(8.0), Time(0)).unwrap();
        c.clear_dirty();

        let wide = Rectangle::new(Point::new(0.0, 0.0), Point::new(200.0, 10.0)).path();
        let err = c.get(CurveId(1), &wide, Time(1)).unwrap_err();
        assert_eq!(
            err,
            Error::CurveTooLarge {
                width: 200,
                height: 10,
                max_width: 128,
                max_height: 64,
            }
        );
        let tall = Rectangle::new(Point::new(0.0, 0.0), Point::new(10.0, 65.0)).path();
        assert!(matches!(
            c.get(CurveId(2), &tall, Time(1)),
            Err(Error::CurveTooLarge { .. })
        ));

        assert_eq!(c.len(), 1);
        assert!(!c.is_dirty());
        let next = c.get(CurveId(3), &square(8.0), Time(1)).unwrap();
        assert_eq!(next, RectI::new(0, 8, 8, 16));
    }

    #[test]
    fn test_remove_then_reclaim_on_repack() {
        let mut c = full_cache(|i| Time(i as i32));
        for i in 0..4 {
            assert!(c.remove(CurveId(i)));
        }
        assert!(!c.remove(CurveId(0)));
        assert!(c.is_empty());
        let r = c.get(CurveId(5), &square(32.0), Time(9)).unwrap();
        assert_eq!(r, RectI::new(0, 0, 32, 32));
    }

    #[test]
    fn test_removed_space_is_reclaimed() {
        let mut c = full_cache(|i| Time(i as i32));
        for i in 0..3 {
            assert!(c.remove(CurveId(i)));
        }
        c.get(CurveId(3), &square(32.0), Time(1)).unwrap();

        // Nothing is older than frame 1, so only the removed slots help.
        let r = c.get(CurveId(7), &square(32.0), Time(1)).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.rect(CurveId(3)), Some(RectI::new(0, 0, 32, 32)));
        assert_eq!(r, RectI::new(0, 32, 32, 64));
        assert_eq!(alpha_at(&c, 16, 16), 255);
        assert_eq!(alpha_at(&c, 140, 48), 0);
        assert_disjoint(&c);
    }

    #[test]
    fn test_repack_keeps_every_survivor() {
        // Two 128 px columns, 100 px tall.
        let mut c = Cache::new(256, 100, CacheConfig::default());
        let (a, b, cc, d) = (CurveId(0), CurveId(1), CurveId(2), CurveId(3));
        assert_eq!(c.get(a, &square(82.0), Time(0)).unwrap(), RectI::new(0, 0, 82, 82));
        assert_eq!(c.get(b, &square(18.0), Time(0)).unwrap(), RectI::new(0, 82, 18, 100));
        assert_eq!(c.get(cc, &square(42.0), Time(0)).unwrap(), RectI::new(128, 0, 170, 42));
        assert_eq!(c.get(d, &square(25.0), Time(0)).unwrap(), RectI::new(128, 42, 153, 67));
        for id in [cc, a, d] {
            c.get(id, &Path::new(), Time(5)).unwrap();
        }

        // Only `b` may go, and dropping it does not free a 40 px slot.
        let err = c.get(CurveId(4), &square(40.0), Time(5)).unwrap_err();
        assert_eq!(err, Error::CacheExhausted { entries: 3 });
        assert!(!c.contains(b));
        for id in [a, cc, d] {
            assert!(c.contains(id), "{:?} was evicted", id);
        }
        assert_eq!(c.rect(a), Some(RectI::new(0, 0, 82, 82)));
        assert_eq!(c.rect(cc), Some(RectI::new(128, 0, 170, 42)));
        assert_eq!(c.rect(d), Some(RectI::new(128, 42, 153, 67)));
        assert_disjoint(&c);
    }

    #[test]
    fn test_single_entry_cannot_be_halved() {
        let mut c = Cache::new(32, 32, CacheConfig::default());
        c.get(CurveId(0), &square(32.0), Time(0)).unwrap();
        let err = c.get(CurveId(1), &square(4.0), Time(1)).unwrap_err();
        assert_eq!(err, Error::CacheExhausted { entries: 1 });
    }
}
