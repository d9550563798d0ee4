//! Stroke capture surface.
//!
//! A fixed-size raster buffer that turns pointer input into ink. Every
//! segment is rendered as soon as it arrives, so the buffer always matches
//! what the user sees. Strokes are not kept after rendering; only their
//! cumulative effect on the pixels matters.

use doodle_core::{PointerEvent, PointerPhase, SurfaceBounds, SurfacePoint};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapRef, Stroke, Transform,
};

use crate::blank;
use crate::error::{RenderError, RenderResult};

/// Configuration for a capture surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Stroke width in pixels.
    pub stroke_width: f32,
    /// Ink color as straight RGBA bytes.
    pub ink: [u8; 4],
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            stroke_width: 10.0,
            ink: [0, 0, 0, 255], // Black
        }
    }
}

/// Converts strokes into pixels on a fixed-size buffer.
///
/// Dimensions never change after construction.
pub struct StrokeSurface {
    pixmap: Pixmap,
    stroke: Stroke,
    ink: Color,
    /// Last point of the active stroke, `None` when not capturing.
    cursor: Option<SurfacePoint>,
    revision: u64,
}

impl StrokeSurface {
    /// Create an empty, fully transparent surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the dimensions are zero or too large.
    pub fn new(config: &SurfaceConfig) -> RenderResult<Self> {
        let pixmap = Pixmap::new(config.width, config.height).ok_or(RenderError::Surface {
            width: config.width,
            height: config.height,
        })?;

        let [r, g, b, a] = config.ink;
        let stroke = Stroke {
            width: config.stroke_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        Ok(Self {
            pixmap,
            stroke,
            ink: Color::from_rgba8(r, g, b, a),
            cursor: None,
            revision: 0,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Start a stroke at a surface-local point.
    ///
    /// Nothing is rendered until the stroke is extended. A stroke that was
    /// still active is ended first.
    pub fn begin_stroke(&mut self, point: SurfacePoint) {
        if self.cursor.is_some() {
            tracing::debug!("Stroke restarted without a terminating event");
        }
        self.cursor = Some(point);
    }

    /// Render a segment from the stroke's current position to `point`.
    ///
    /// Returns `false` (and renders nothing) when no stroke is active.
    pub fn extend_stroke(&mut self, point: SurfacePoint) -> bool {
        let Some(from) = self.cursor else {
            return false;
        };
        self.render_segment(from, point);
        self.cursor = Some(point);
        true
    }

    /// Terminate the active stroke. Idempotent.
    pub fn end_stroke(&mut self) {
        self.cursor = None;
    }

    /// Whether a stroke is currently being captured.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Feed one pointer event, translated against the surface's current bounds.
    ///
    /// Leaving the surface ends the active stroke. Returns `true` if ink was
    /// rendered.
    pub fn handle_pointer(&mut self, event: &PointerEvent, bounds: &SurfaceBounds) -> bool {
        let point = event.local(bounds);
        match event.phase {
            PointerPhase::Down => {
                self.begin_stroke(point);
                false
            }
            PointerPhase::Move => self.extend_stroke(point),
            PointerPhase::Up | PointerPhase::Leave => {
                self.end_stroke();
                false
            }
        }
    }

    /// Reset every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
        self.revision += 1;
    }

    /// Whether the surface holds no ink at all.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        blank::is_blank(self.pixmap.data())
    }

    /// Counter bumped on every pixel mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Borrow the underlying premultiplied pixel buffer.
    #[must_use]
    pub fn pixmap(&self) -> PixmapRef<'_> {
        self.pixmap.as_ref()
    }

    /// Straight (non-premultiplied) RGBA bytes, row-major.
    #[must_use]
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    fn render_segment(&mut self, from: SurfacePoint, to: SurfacePoint) {
        let mut paint = Paint::default();
        paint.set_color(self.ink);
        paint.anti_alias = true;

        if from == to {
            // Zero-length segment: a round cap degenerates to a dot.
            if let Some(dot) = PathBuilder::from_circle(to.x, to.y, self.stroke.width / 2.0) {
                self.pixmap
                    .fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
        } else {
            let mut path_builder = PathBuilder::new();
            path_builder.move_to(from.x, from.y);
            path_builder.line_to(to.x, to.y);

            if let Some(path) = path_builder.finish() {
                self.pixmap
                    .stroke_path(&path, &paint, &self.stroke, Transform::identity(), None);
            }
        }

        self.revision += 1;
    }
}

impl std::fmt::Debug for StrokeSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("capturing", &self.is_capturing())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
