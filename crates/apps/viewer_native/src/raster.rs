//! Software canvas: affine image blits into an RGBA buffer with polygon clipping.

use foundation::math::Vec2;
use image::{Rgba, RgbaImage};
use render::{Affine2, DrawSurface, SourceRect, TileImage};

use crate::fetch::Tile;

#[derive(Debug, Clone)]
struct DrawState {
    alpha: f64,
    clip: Vec<Vec<Vec2>>,
}

pub struct RasterSurface {
    pixels: RgbaImage,
    background: Rgba<u8>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, background),
            background,
            state: DrawState {
                alpha: 1.0,
                clip: Vec::new(),
            },
            stack: Vec::new(),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    fn clipped(&self, p: Vec2) -> bool {
        self.state.clip.iter().any(|poly| !contains(poly, p))
    }
}

/// Even-odd point in polygon.
fn contains(poly: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = poly.len().wrapping_sub(1);
    for (i, a) in poly.iter().enumerate() {
        let b = poly[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, alpha: f64) {
    let a = alpha * f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let v = f64::from(src[c]) * a + f64::from(dst[c]) * (1.0 - a);
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    let out = a + f64::from(dst[3]) / 255.0 * (1.0 - a);
    dst[3] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
}

impl DrawSurface<Tile> for RasterSurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn clear(&mut self) {
        let bg = self.background;
        self.pixels.pixels_mut().for_each(|px| *px = bg);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn clip_polygon(&mut self, points: &[Vec2]) {
        self.state.clip.push(points.to_vec());
    }

    fn draw_image(&mut self, image: &Tile, src: SourceRect, transform: Affine2) {
        if self.state.alpha <= 0.0 {
            return;
        }
        let Some(inverse) = transform.inverse() else {
            return;
        };

        // Destination bounds: the mapped source rect, tightened by every clip polygon.
        let corners = [
            Vec2::new(src.x, src.y),
            Vec2::new(src.x + src.width, src.y),
            Vec2::new(src.x, src.y + src.height),
            Vec2::new(src.x + src.width, src.y + src.height),
        ]
        .map(|p| transform.apply(p));
        let (mut x0, mut y0, mut x1, mut y1) = bounds(&corners);
        for poly in &self.state.clip {
            let (cx0, cy0, cx1, cy1) = bounds(poly);
            x0 = x0.max(cx0);
            y0 = y0.max(cy0);
            x1 = x1.min(cx1);
            y1 = y1.min(cy1);
        }
        let w = f64::from(self.pixels.width());
        let h = f64::from(self.pixels.height());
        let x0 = x0.floor().max(0.0);
        let y0 = y0.floor().max(0.0);
        let x1 = x1.ceil().min(w);
        let y1 = y1.ceil().min(h);
        if !(x0 < x1 && y0 < y1) {
            return;
        }

        let max_u = image.width().saturating_sub(1);
        let max_v = image.height().saturating_sub(1);
        for py in y0 as u32..y1 as u32 {
            for px in x0 as u32..x1 as u32 {
                let p = Vec2::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
                if self.clipped(p) {
                    continue;
                }
                let s = inverse.apply(p);
                if !src.contains(s) {
                    continue;
                }
                let u = (s.x.floor().max(0.0) as u32).min(max_u);
                let v = (s.y.floor().max(0.0) as u32).min(max_v);
                let texel = *image.0.get_pixel(u, v);
                blend(self.pixels.get_pixel_mut(px, py), texel, self.state.alpha);
            }
        }
    }
}

fn bounds(points: &[Vec2]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
    )
}
