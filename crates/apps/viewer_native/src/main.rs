mod fetch;
mod raster;

use std::path::{Path, PathBuf};
use std::time::Duration;

use catalog::SurveyRegistry;
use clap::Parser;
use foundation::math::{ProjectionFamily, SkyFrame};
use foundation::time::Time;
use image::Rgba;
use render::{FrameReport, SkyView};
use scene::ViewportConfig;
use serde::Deserialize;
use serde_json::json;
use streaming::{ImagerySource, StreamingConfig};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use fetch::HttpFetcher;
use raster::RasterSurface;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render a view of a HiPS sky survey to a PNG")]
struct Args {
    /// Survey id from the catalog (e.g. P/DSS2/color)
    #[arg(long, env = "SKYVIEW_SURVEY", default_value = "P/DSS2/color")]
    survey: String,

    /// Override the survey's base URL (an http(s) URL or a local directory)
    #[arg(long, env = "SKYVIEW_BASE_URL")]
    base_url: Option<String>,

    /// Survey list JSON replacing the built-in catalog
    #[arg(long)]
    surveys: Option<PathBuf>,

    /// View and streaming settings JSON ({"viewport": {...}, "streaming": {...}})
    #[arg(long)]
    config: Option<PathBuf>,

    /// Center longitude in degrees (RA for the celestial frame)
    #[arg(long, allow_hyphen_values = true)]
    ra: Option<f64>,

    /// Center latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    dec: Option<f64>,

    /// Field of view in degrees
    #[arg(long)]
    fov: Option<f64>,

    /// Projection code or name (sin, tan, ait, mer, ...)
    #[arg(long)]
    projection: Option<ProjectionFamily>,

    /// Display frame (celestial or galactic)
    #[arg(long)]
    frame: Option<SkyFrame>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Upper bound on frames to simulate before writing the image
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Simulated frames per second
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Output PNG
    #[arg(long, short, default_value = "sky.png")]
    output: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViewerConfig {
    viewport: ViewportConfig,
    streaming: StreamingConfig,
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn load_registry(path: Option<&Path>) -> Result<SurveyRegistry, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(SurveyRegistry::from_json(&std::fs::read_to_string(path)?)?),
        None => Ok(SurveyRegistry::builtin()?),
    }
}

fn pick_source(args: &Args, registry: &SurveyRegistry) -> Result<ImagerySource, Box<dyn std::error::Error>> {
    let mut source = registry.resolve(&args.survey)?.clone();
    if let Some(url) = &args.base_url {
        source.base_url = url.clone();
    }
    Ok(source)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }
    if let Some(projection) = args.projection {
        config.viewport.projection = projection;
    }
    if let Some(frame) = args.frame {
        config.viewport.frame = frame;
    }
    let (width, height) = (config.viewport.width, config.viewport.height);

    let registry = load_registry(args.surveys.as_deref())?;
    let source = pick_source(&args, &registry)?;
    let survey = source.id.clone();

    let fetcher = HttpFetcher::new(tokio::runtime::Handle::current())?;
    let mut view = SkyView::new(config.viewport, config.streaming, fetcher);
    view.set_imagery_source(source);
    if let (Some(lon), Some(lat)) = (args.ra, args.dec) {
        view.point_to(lon, lat);
    }
    if let Some(fov) = args.fov
        && !view.set_fov(fov)
    {
        warn!(fov, "field of view out of range, keeping {:.3}", view.viewport().fov());
    }

    let fps = if args.fps > 0.0 { args.fps } else { 30.0 };
    let mut surface = RasterSurface::new(width, height, Rgba([0, 0, 0, 255]));
    let dt = 1.0 / fps;
    let mut frames = 0u64;
    let mut last: Option<FrameReport> = None;
    let mut drawn = 0u64;
    while frames < args.frames {
        // Simulated clock; fades and redraw deadlines advance one step per frame.
        let now = Time(frames as f64 * dt);
        if let Some(report) = view.tick(now, &mut surface) {
            debug!(frame = frames, ?report, "frame drawn");
            drawn += 1;
            last = Some(report);
        }
        frames += 1;
        let scheduler = view.pipeline().scheduler();
        let idle = scheduler.in_flight() == 0 && scheduler.queued() == 0;
        if drawn > 0 && idle && !view.needs_redraw() && view.redraw_deadline().is_none() {
            break;
        }
        tokio::time::sleep(Duration::from_secs_f64(dt)).await;
    }

    let report = last.unwrap_or_default();
    info!(
        frames,
        drawn = report.drawn,
        fallback = report.fallback,
        missing = report.missing,
        output = %args.output.display(),
        "writing image"
    );
    surface.into_image().save(&args.output)?;

    let snapshot = view.metrics().snapshot();
    let counters: serde_json::Map<String, serde_json::Value> = snapshot
        .counters
        .iter()
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();
    let gauges: serde_json::Map<String, serde_json::Value> = snapshot
        .gauges
        .iter()
        .map(|(name, value)| (name.to_string(), json!(value)))
        .collect();
    let viewport = view.viewport();
    let center = viewport.center();
    let summary = json!({
        "survey": survey,
        "output": args.output.display().to_string(),
        "projection": viewport.projection().family().to_string(),
        "frame": viewport.frame().to_string(),
        "center": { "lon": center.lon, "lat": center.lat },
        "fov": viewport.fov(),
        "frames": frames,
        "last_frame": report,
        "counters": counters,
        "gauges": gauges,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_overrides_parse() {
        let args = Args::try_parse_from([
            "viewer_native",
            "--survey",
            "P/Mellinger/color",
            "--ra",
            "83.8",
            "--dec",
            "-5.4",
            "--projection",
            "ait",
            "--frame",
            "galactic",
        ])
        .unwrap();
        assert_eq!(args.survey, "P/Mellinger/color");
        assert_eq!(args.dec, Some(-5.4));
        assert_eq!(args.projection, Some(ProjectionFamily::Aitoff));
        assert_eq!(args.frame, Some(SkyFrame::Galactic));
        assert_eq!(args.output, PathBuf::from("sky.png"));
    }

    #[test]
    fn base_url_override_keeps_catalog_metadata() {
        let args = Args::try_parse_from([
            "viewer_native",
            "--survey",
            "P/Mellinger/color",
            "--base-url",
            "/data/hips/mellinger",
        ])
        .unwrap();
        let registry = SurveyRegistry::builtin().unwrap();
        let source = pick_source(&args, &registry).unwrap();
        assert_eq!(source.base_url, "/data/hips/mellinger");
        assert_eq!(source.frame, SkyFrame::Galactic);
        assert!(source.tile_identifier(sphere::Cell::new(3, 5)).starts_with("/data/hips/mellinger/Norder3/"));
    }

    #[test]
    fn config_sections_default_independently() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"streaming": {"max_concurrent_downloads": 8}}"#).unwrap();
        assert_eq!(config.streaming.max_concurrent_downloads, 8);
        assert_eq!(config.streaming.fade_duration_ms, 700.0);
        assert_eq!(config.viewport, ViewportConfig::default());
    }
}
