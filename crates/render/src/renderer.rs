use std::collections::BTreeSet;

use foundation::math::Vec2;
use foundation::time::Time;
use runtime::metrics::{self, Metrics};
use scene::{OrderRange, Viewport};
use serde::Serialize;
use sphere::{Cell, bits};
use streaming::{
    ALLSKY_ORDER, ImagerySource, TileFetcher, TilePipeline, TileStatus, allsky_tile_rect,
};
use tracing::{debug, trace};

use crate::surface::{DrawSurface, SourceRect, TileImage};
use crate::warp::{Affine2, CLIP_EXPANSION, expand_triangle};

/// Added to the retry delay when scheduling a follow-up redraw.
const REDRAW_SLACK_MS: f64 = 10.0;

/// What one frame drew and asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    /// Order of the cells drawn this frame.
    pub order: u8,
    pub visible: usize,
    /// Cells drawn from their own tile.
    pub drawn: usize,
    /// Cells drawn (at least partly) from an ancestor tile or the allsky atlas.
    pub fallback: usize,
    /// Cells with nothing to show.
    pub missing: usize,
    pub requested: usize,
    /// A tile in view is still fading in.
    pub fading: bool,
    /// When to draw again because tiles are still on their way.
    #[serde(skip)]
    pub redraw_at: Option<Time>,
}

impl FrameReport {
    pub fn record(&self, metrics: &mut Metrics) {
        metrics.add(metrics::FRAMES_DRAWN, 1);
        metrics.add(metrics::TILES_DRAWN, self.drawn as u64);
        metrics.add(metrics::TILES_FALLBACK, self.fallback as u64);
        metrics.add(metrics::TILES_MISSING, self.missing as u64);
        metrics.add(metrics::TILES_REQUESTED, self.requested as u64);
        metrics.set_gauge(metrics::WORKING_ORDER, i64::from(self.order));
        metrics.set_gauge(metrics::VISIBLE_CELLS, self.visible as i64);
    }
}

/// Draws the visible cells of one imagery source and keeps their tiles coming.
///
/// Each frame draws, coarse first, the best ancestor available for every cell whose own
/// tile is not fully opaque, then the cell tiles themselves nearest-the-center first.
#[derive(Debug, Default)]
pub struct TileRenderer {
    last_request: Option<Time>,
    last_order: Option<u8>,
}

impl TileRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_request(&self) -> Option<Time> {
        self.last_request
    }

    pub fn render<F, S>(
        &mut self,
        viewport: &Viewport,
        source: &ImagerySource,
        pipeline: &mut TilePipeline<F>,
        surface: &mut S,
        now: Time,
    ) -> FrameReport
    where
        F: TileFetcher,
        F::Image: TileImage,
        S: DrawSurface<F::Image> + ?Sized,
    {
        let range = OrderRange {
            min: source.min_order,
            max: source.max_order,
        };
        let working = viewport.working_order(&range);
        let boot = pipeline.config().bootstrap_order.min(source.max_order);
        let order = working.max(boot);
        if self.last_order != Some(order) {
            debug!(order, working, survey = %source.id, "working order changed");
            self.last_order = Some(order);
        }

        let mut cells = viewport.visible_cells(order, source.frame);
        let center = Vec2::new(viewport.width() * 0.5, viewport.height() * 0.5);
        cells.sort_by(|a, b| {
            a.centroid()
                .distance(center)
                .total_cmp(&b.centroid().distance(center))
        });

        let mut report = FrameReport {
            order,
            visible: cells.len(),
            ..FrameReport::default()
        };
        let mut wanted = Wanted::default();
        let mut pending = false;

        let atlas_id = (source.has_allsky && boot == ALLSKY_ORDER).then(|| source.allsky_identifier());
        let mut atlas = None;
        let mut atlas_usable = false;
        if let Some(id) = &atlas_id {
            match pipeline.status(id, now) {
                TileStatus::Ready { image, alpha } => {
                    atlas = Some((image, alpha));
                    atlas_usable = true;
                }
                TileStatus::Missing => {
                    wanted.push(id.clone());
                    pending = true;
                    atlas_usable = true;
                }
                TileStatus::Loading => {
                    pending = true;
                    atlas_usable = true;
                }
                TileStatus::Failed => {}
            }
        }
        // Bootstrap-order cells come from the atlas alone when it is available.
        let fetch_cells = !(order == boot && atlas_usable);

        surface.clear();
        let mut on_top = Vec::new();
        for vc in &cells {
            let identifier = source.tile_identifier(vc.cell);
            let own = match pipeline.status(&identifier, now) {
                TileStatus::Ready { image, alpha } => Some((image, alpha)),
                TileStatus::Missing => {
                    if fetch_cells {
                        wanted.push(identifier);
                        pending = true;
                    }
                    None
                }
                TileStatus::Loading => {
                    pending = true;
                    None
                }
                TileStatus::Failed => None,
            };
            if let Some((image, alpha)) = own
                && alpha >= 1.0
            {
                on_top.push((vc, image, alpha));
                continue;
            }

            if own.is_some() {
                report.fading = true;
            }
            let fallback = best_ancestor(vc.cell, boot, source, pipeline, now)
                .or_else(|| atlas.and_then(|(image, alpha)| atlas_rect(vc.cell, image, alpha)));
            let mut covered = false;
            if let Some((image, rect, alpha)) = fallback {
                if alpha < 1.0 {
                    report.fading = true;
                }
                if alpha > 0.0 {
                    draw_quad(surface, image, rect, &vc.corners, alpha);
                    report.fallback += 1;
                    covered = true;
                }
            }
            if !covered && own.is_none() {
                report.missing += 1;
            }

            if boot < order
                && !atlas_usable
                && let Some(ancestor) = vc.cell.ancestor(boot)
            {
                let identifier = source.tile_identifier(ancestor);
                match pipeline.status(&identifier, now) {
                    TileStatus::Missing => {
                        wanted.push(identifier);
                        pending = true;
                    }
                    TileStatus::Loading => pending = true,
                    _ => {}
                }
            }
            if let Some((image, alpha)) = own
                && alpha > 0.0
            {
                on_top.push((vc, image, alpha));
            }
        }

        for (vc, image, alpha) in on_top {
            draw_quad(surface, image, SourceRect::full(image), &vc.corners, alpha);
            report.drawn += 1;
        }

        let retry_ms = pipeline.config().retry_delay_ms;
        let throttled = self
            .last_request
            .is_some_and(|at| now.millis_since(at) < retry_ms);
        if !wanted.is_empty() && !throttled {
            for identifier in &wanted.order {
                pipeline.request(identifier, source.credentialed);
            }
            report.requested = wanted.order.len();
            self.last_request = Some(now);
            trace!(count = report.requested, order, "requested tiles");
        }
        if pending {
            report.redraw_at = Some(now.after_millis(retry_ms + REDRAW_SLACK_MS));
        }
        report
    }
}

/// Identifiers to fetch, first-seen order, no repeats.
#[derive(Default)]
struct Wanted {
    order: Vec<String>,
    seen: BTreeSet<String>,
}

impl Wanted {
    fn push(&mut self, identifier: String) {
        if self.seen.insert(identifier.clone()) {
            self.order.push(identifier);
        }
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Finest decoded ancestor strictly coarser than `cell`, down to `boot`.
fn best_ancestor<'p, F>(
    cell: Cell,
    boot: u8,
    source: &ImagerySource,
    pipeline: &'p TilePipeline<F>,
    now: Time,
) -> Option<(&'p F::Image, SourceRect, f64)>
where
    F: TileFetcher,
    F::Image: TileImage,
{
    (boot..cell.order).rev().find_map(|order| {
        let ancestor = cell.ancestor(order)?;
        match pipeline.status(&source.tile_identifier(ancestor), now) {
            TileStatus::Ready { image, alpha } => Some((
                image,
                sub_rect(SourceRect::full(image), cell, ancestor),
                alpha,
            )),
            _ => None,
        }
    })
}

fn atlas_rect<I: TileImage>(cell: Cell, atlas: &I, alpha: f64) -> Option<(&I, SourceRect, f64)> {
    let ancestor = cell.ancestor(ALLSKY_ORDER)?;
    let (x, y, size) = allsky_tile_rect(ancestor.id, atlas.width());
    if size == 0 {
        return None;
    }
    let size = f64::from(size);
    let base = SourceRect::new(f64::from(x), f64::from(y), size, size);
    Some((atlas, sub_rect(base, cell, ancestor), alpha))
}

/// Part of an ancestor's tile covering `cell`.
///
/// Tile rows follow the face x axis and columns the face y axis, with the cell's south
/// corner at the top-left.
pub fn sub_rect(base: SourceRect, cell: Cell, ancestor: Cell) -> SourceRect {
    let depth = u32::from(cell.order.saturating_sub(ancestor.order));
    if depth == 0 {
        return base;
    }
    let local = cell.id - (ancestor.id << (2 * depth));
    let (x, y) = bits::deinterleave(local);
    let scale = f64::from(1u32 << depth);
    let w = base.width / scale;
    let h = base.height / scale;
    SourceRect::new(base.x + f64::from(y) * w, base.y + f64::from(x) * h, w, h)
}

/// Maps `rect` onto a cell quad (north, west, south, east) as two clipped triangles.
fn draw_quad<I, S>(surface: &mut S, image: &I, rect: SourceRect, corners: &[Vec2; 4], alpha: f64)
where
    S: DrawSurface<I> + ?Sized,
{
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);
    let north = Vec2::new(x1, y1);
    let west = Vec2::new(x1, y0);
    let south = Vec2::new(x0, y0);
    let east = Vec2::new(x0, y1);
    let triangles = [
        ([corners[0], corners[1], corners[3]], [north, west, east]),
        ([corners[1], corners[3], corners[2]], [west, east, south]),
    ];
    for (dst, src) in triangles {
        let Some(transform) = Affine2::from_triangles(src, dst) else {
            continue;
        };
        surface.save();
        surface.clip_polygon(&expand_triangle(dst, CLIP_EXPANSION));
        surface.set_global_alpha(alpha);
        surface.draw_image(image, rect, transform);
        surface.restore();
    }
}
