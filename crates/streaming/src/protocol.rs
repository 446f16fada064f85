//! Tile addressing and streaming configuration.
//!
//! Imagery sources publish one tile per cell under a fixed directory layout:
//!
//! ```text
//! <root>/Norder<order>/Dir<10000 * floor(cell / 10000)>/Npix<cell>.<ext>
//! ```
//!
//! plus an optional whole-sky atlas at `<root>/Norder3/Allsky.<ext>` holding every
//! order-3 tile in a grid of [`ALLSKY_COLUMNS`] columns.

use foundation::math::SkyFrame;
use serde::{Deserialize, Serialize};
use sphere::{Cell, MAX_ORDER};

/// Order whose tiles make up the whole-sky atlas.
pub const ALLSKY_ORDER: u8 = 3;
/// Tiles per atlas row.
pub const ALLSKY_COLUMNS: u32 = 27;
/// Cells per `Dir` directory.
const DIR_SPAN: u64 = 10_000;

/// Tile image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    /// Unknown/custom format.
    Other,
}

impl TileFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "webp" => Self::Webp,
            _ => Self::Other,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Other => "bin",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Other => "application/octet-stream",
        }
    }
}

fn default_max_order() -> u8 {
    9
}

fn default_true() -> bool {
    true
}

/// Descriptor for one tiled all-sky imagery source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagerySource {
    /// Registry key, e.g. `P/DSS2/color`.
    pub id: String,
    pub name: String,
    /// Root URL (or path) that tile identifiers are built from.
    pub base_url: String,
    /// Deepest order with published tiles.
    #[serde(default = "default_max_order")]
    pub max_order: u8,
    /// Shallowest order worth drawing; coarser working orders jump straight to it.
    #[serde(default)]
    pub min_order: Option<u8>,
    /// Frame the tile cells are laid out in.
    #[serde(default)]
    pub frame: SkyFrame,
    #[serde(default)]
    pub format: TileFormat,
    #[serde(default = "default_true")]
    pub has_allsky: bool,
    #[serde(default)]
    pub credentialed: bool,
}

impl ImagerySource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_url: base_url.into(),
            max_order: default_max_order(),
            min_order: None,
            frame: SkyFrame::Celestial,
            format: TileFormat::Jpeg,
            has_allsky: true,
            credentialed: false,
        }
    }

    pub fn with_max_order(mut self, max_order: u8) -> Self {
        self.max_order = max_order.min(MAX_ORDER);
        self
    }

    pub fn with_frame(mut self, frame: SkyFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_format(mut self, format: TileFormat) -> Self {
        self.format = format;
        self
    }

    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn tile_identifier(&self, cell: Cell) -> String {
        let dir = (cell.id / DIR_SPAN) * DIR_SPAN;
        format!(
            "{}/Norder{}/Dir{}/Npix{}.{}",
            self.root(),
            cell.order,
            dir,
            cell.id,
            self.format.extension()
        )
    }

    pub fn allsky_identifier(&self) -> String {
        format!(
            "{}/Norder{}/Allsky.{}",
            self.root(),
            ALLSKY_ORDER,
            self.format.extension()
        )
    }
}

/// Pixel rectangle of an order-3 cell inside the whole-sky atlas.
///
/// Returns `(x, y, size)` given the atlas width in pixels.
pub fn allsky_tile_rect(cell_id: u64, atlas_width: u32) -> (u32, u32, u32) {
    let size = atlas_width / ALLSKY_COLUMNS;
    let col = (cell_id % u64::from(ALLSKY_COLUMNS)) as u32;
    let row = (cell_id / u64::from(ALLSKY_COLUMNS)) as u32;
    (col * size, row * size, size)
}

/// Configuration for tile streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Tile cache slots.
    pub cache_capacity: usize,
    /// Maximum downloads in flight at once.
    pub max_concurrent_downloads: usize,
    /// Fade-in duration for newly arrived tiles (ms).
    pub fade_duration_ms: f64,
    /// Minimum interval between batches of tile requests, and the redraw delay while
    /// tiles are missing (ms).
    pub retry_delay_ms: f64,
    /// Coarse order used for the fallback layer.
    pub bootstrap_order: u8,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 800,
            max_concurrent_downloads: 4,
            fade_duration_ms: 700.0,
            retry_delay_ms: 1000.0,
            bootstrap_order: ALLSKY_ORDER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tile_identifier_uses_directory_buckets() {
        let src = ImagerySource::new("P/DSS2/color", "DSS colored", "https://alasky.example/DSS2/");
        assert_eq!(
            src.tile_identifier(Cell::new(3, 42)),
            "https://alasky.example/DSS2/Norder3/Dir0/Npix42.jpg"
        );
        assert_eq!(
            src.tile_identifier(Cell::new(9, 123_456)),
            "https://alasky.example/DSS2/Norder9/Dir120000/Npix123456.jpg"
        );
    }

    #[test]
    fn allsky_identifier_and_grid() {
        let src = ImagerySource::new("x", "x", "http://h/s").with_format(TileFormat::Png);
        assert_eq!(src.allsky_identifier(), "http://h/s/Norder3/Allsky.png");
        // 1728 px wide atlas: 64 px tiles.
        assert_eq!(allsky_tile_rect(0, 1728), (0, 0, 64));
        assert_eq!(allsky_tile_rect(28, 1728), (64, 64, 64));
        assert_eq!(allsky_tile_rect(767, 1728), (11 * 64, 28 * 64, 64));
    }

    #[test]
    fn descriptor_defaults_from_json() {
        let src: ImagerySource = serde_json::from_str(
            r#"{"id": "P/Mellinger/color", "name": "Mellinger", "base_url": "http://m", "frame": "galactic"}"#,
        )
        .unwrap();
        assert_eq!(src.max_order, 9);
        assert_eq!(src.frame, SkyFrame::Galactic);
        assert_eq!(src.format, TileFormat::Jpeg);
        assert!(src.has_allsky);
    }

    #[test]
    fn config_defaults_and_partial_override() {
        let cfg: StreamingConfig = serde_json::from_str(r#"{"max_concurrent_downloads": 8}"#).unwrap();
        assert_eq!(cfg.max_concurrent_downloads, 8);
        assert_eq!(cfg.cache_capacity, 800);
        assert_eq!(cfg.fade_duration_ms, 700.0);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(TileFormat::from_extension("JPEG"), TileFormat::Jpeg);
        assert_eq!(TileFormat::from_extension("png").content_type(), "image/png");
        assert_eq!(TileFormat::from_extension("fits"), TileFormat::Other);
    }
}
