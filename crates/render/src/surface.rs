//! Drawing surface abstraction and a surface that records what was drawn.

use foundation::math::Vec2;

use crate::warp::Affine2;

/// Decoded tile pixels, as far as the renderer needs to know.
pub trait TileImage {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Region of an image, in image pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full<I: TileImage + ?Sized>(image: &I) -> Self {
        Self::new(0.0, 0.0, f64::from(image.width()), f64::from(image.height()))
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

/// Canvas-like target: clear, clip, global alpha and affine image blits.
///
/// `save`/`restore` bracket clip and alpha changes the way a 2D canvas context does.
pub trait DrawSurface<I: ?Sized> {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn set_global_alpha(&mut self, alpha: f64);
    /// Intersects the current clip with a polygon in screen pixels.
    fn clip_polygon(&mut self, points: &[Vec2]);
    /// Draws the `src` part of `image`, placing image pixel `p` at `transform.apply(p)`.
    fn draw_image(&mut self, image: &I, src: SourceRect, transform: Affine2);
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand<I> {
    Clear,
    DrawImage {
        image: I,
        src: SourceRect,
        transform: Affine2,
        alpha: f64,
        clip: Vec<Vec<Vec2>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame<I> {
    pub commands: Vec<RenderCommand<I>>,
}

impl<I> Default for RenderFrame<I> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<I> RenderFrame<I> {
    pub fn draws(&self) -> impl Iterator<Item = (&I, &SourceRect, f64)> {
        self.commands.iter().filter_map(|cmd| match cmd {
            RenderCommand::DrawImage {
                image, src, alpha, ..
            } => Some((image, src, *alpha)),
            RenderCommand::Clear => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct DrawState {
    alpha: f64,
    clip: Vec<Vec<Vec2>>,
}

/// Records draw calls with the alpha and clip in effect at the time.
#[derive(Debug, Clone)]
pub struct RecordingSurface<I> {
    width: u32,
    height: u32,
    frame: RenderFrame<I>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl<I> RecordingSurface<I> {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: RenderFrame::default(),
            state: DrawState {
                alpha: 1.0,
                clip: Vec::new(),
            },
            stack: Vec::new(),
        }
    }

    pub fn frame(&self) -> &RenderFrame<I> {
        &self.frame
    }

    /// Hands back everything recorded so far and starts over.
    pub fn take_frame(&mut self) -> RenderFrame<I> {
        std::mem::take(&mut self.frame)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl<I: Clone> DrawSurface<I> for RecordingSurface<I> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.frame.commands.push(RenderCommand::Clear);
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

    fn draw_image(&mut self, image: &I, src: SourceRect, transform: Affine2) {
        self.frame.commands.push(RenderCommand::DrawImage {
            image: image.clone(),
            src,
            transform,
            alpha: self.state.alpha,
            clip: self.state.clip.clone(),
        });
    }
}
