//! The sky view a host embeds: navigation, imagery source and the redraw loop.

use foundation::math::{ProjectionFamily, SkyFrame, Vec2};
use foundation::time::Time;
use runtime::metrics::{self, Metrics};
use runtime::redraw::RedrawState;
use scene::{Viewport, ViewportConfig, VisibleCell};
use sphere::Cell;
use streaming::{ImagerySource, StreamingConfig, TileFetcher, TilePipeline};
use tracing::info;

use crate::renderer::{FrameReport, TileRenderer};
use crate::surface::{DrawSurface, TileImage};

/// Owns everything one sky view needs. The host calls [`SkyView::tick`] once per
/// display refresh; drawing only happens when something changed.
pub struct SkyView<F: TileFetcher> {
    viewport: Viewport,
    pipeline: TilePipeline<F>,
    renderer: TileRenderer,
    redraw: RedrawState,
    metrics: Metrics,
    source: Option<ImagerySource>,
}

impl<F> SkyView<F>
where
    F: TileFetcher,
    F::Image: TileImage,
{
    pub fn new(viewport: ViewportConfig, streaming: StreamingConfig, fetcher: F) -> Self {
        Self {
            viewport: Viewport::new(viewport),
            pipeline: TilePipeline::new(streaming, fetcher),
            renderer: TileRenderer::new(),
            redraw: RedrawState::new(),
            metrics: Metrics::new(),
            source: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn pipeline(&self) -> &TilePipeline<F> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut TilePipeline<F> {
        &mut self.pipeline
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn imagery_source(&self) -> Option<&ImagerySource> {
        self.source.as_ref()
    }

    pub fn set_imagery_source(&mut self, source: ImagerySource) {
        info!(survey = %source.id, max_order = source.max_order, frame = %source.frame, "imagery source set");
        self.source = Some(source);
        self.redraw.force_redraw();
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw.needs_redraw()
    }

    pub fn redraw_deadline(&self) -> Option<Time> {
        self.redraw.pending_deadline()
    }

    pub fn request_redraw(&mut self) {
        self.redraw.request_redraw();
    }

    pub fn point_to(&mut self, lon: f64, lat: f64) {
        self.viewport.point_to(lon, lat);
        self.redraw.force_redraw();
    }

    pub fn pan_by(&mut self, dlon: f64, dlat: f64) {
        self.viewport.pan_by(dlon, dlat);
        self.redraw.force_redraw();
    }

    pub fn begin_drag(&mut self, at: Vec2) {
        self.viewport.begin_drag(at);
    }

    pub fn drag_to(&mut self, to: Vec2) -> bool {
        let moved = self.viewport.drag_to(to);
        if moved {
            self.redraw.force_redraw();
        }
        moved
    }

    pub fn end_drag(&mut self) {
        self.viewport.end_drag();
    }

    pub fn set_zoom_level(&mut self, level: f64) -> bool {
        let changed = self.viewport.set_zoom_level(level);
        if changed {
            self.redraw.force_redraw();
        }
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom_level(self.viewport.zoom_level() + 1.0)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom_level(self.viewport.zoom_level() - 1.0)
    }

    pub fn set_fov(&mut self, fov_deg: f64) -> bool {
        let changed = self.viewport.set_fov(fov_deg);
        if changed {
            self.redraw.force_redraw();
        }
        changed
    }

    pub fn set_projection(&mut self, family: ProjectionFamily) {
        self.viewport.set_projection(family);
        self.redraw.force_redraw();
    }

    pub fn set_frame(&mut self, frame: SkyFrame) {
        self.viewport.set_frame(frame);
        self.redraw.force_redraw();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.resize(width, height);
        self.redraw.force_redraw();
    }

    /// Frame the cells of the current source are laid out in.
    fn cell_frame(&self) -> SkyFrame {
        self.source
            .as_ref()
            .map_or(self.viewport.frame(), |source| source.frame)
    }

    pub fn candidate_cells(&self, order: u8) -> Vec<Cell> {
        self.viewport.candidate_cells(order, self.cell_frame())
    }

    pub fn visible_cells(&self, order: u8) -> Vec<VisibleCell> {
        self.viewport.visible_cells(order, self.cell_frame())
    }

    /// One display refresh: applies finished downloads, then draws if anything asked for
    /// it. Returns the frame report when a frame was drawn.
    pub fn tick<S>(&mut self, now: Time, surface: &mut S) -> Option<FrameReport>
    where
        S: DrawSurface<F::Image> + ?Sized,
    {
        let polled = self.pipeline.poll(now);
        if polled.changed() {
            self.metrics.add(metrics::TILES_LOADED, polled.loaded as u64);
            self.metrics.add(metrics::TILES_FAILED, polled.failed as u64);
            self.redraw.request_redraw();
        }

        let ticket = self.redraw.begin_frame(now)?;
        let report = match &self.source {
            Some(source) => {
                self.renderer
                    .render(&self.viewport, source, &mut self.pipeline, surface, now)
            }
            None => {
                surface.clear();
                FrameReport::default()
            }
        };
        report.record(&mut self.metrics);

        if report.fading {
            self.redraw.request_redraw();
        }
        if let Some(at) = report.redraw_at {
            self.redraw.request_redraw_at(at);
        }
        self.redraw.end_frame(ticket);
        Some(report)
    }
}
