use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use image::{ImageFormat, Rgba, RgbaImage};
use kurbo::{BezPath, PathEl, Point};
use tiny_skia::{
    Color, ColorU8, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8,
    Stroke, Transform,
};

use crate::{CanvasError, Result};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// The pixels behind a drawing surface. Starts fully transparent.
///
/// Pixels are held premultiplied, the way the rasterizer composites them;
/// [`Raster::pixel`] and [`Raster::to_image`] hand them out straight.
/// Cloning is the snapshot mechanism: take a copy before a preview and
/// assign it back to restore.
#[derive(Clone)]
pub struct Raster {
    pixmap: Pixmap,
}

impl PartialEq for Raster {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.pixmap.data() == other.pixmap.data()
    }
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Raster {
    /// Fails for a zero-sized or oversized surface.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixmap.pixel(x, y).map(straight)
    }

    /// The raster as a straight-alpha image.
    pub fn to_image(&self) -> RgbaImage {
        let pixels = self.pixmap.pixels();
        let width = self.width();
        RgbaImage::from_fn(width, self.height(), |x, y| {
            straight(pixels[(y * width + x) as usize])
        })
    }

    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Fill the area enclosed by `path` (non-zero winding, antialiased).
    /// Open subpaths are treated as closed.
    pub fn fill_path(&mut self, path: &BezPath, color: Rgba<u8>) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// A straight stroke with round caps. Consecutive segments sharing an
    /// endpoint therefore join smoothly.
    pub fn stroke_segment(&mut self, from: Point, to: Point, width: f64, color: Rgba<u8>) {
        let width = width.max(1.0);
        if from == to {
            // A press without movement still leaves a dot.
            let dot = PathBuilder::from_circle(from.x as f32, from.y as f32, (width / 2.0) as f32);
            if let Some(dot) = dot {
                self.pixmap.fill_path(
                    &dot,
                    &paint(color),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
            return;
        }

        let mut segment = BezPath::new();
        segment.move_to(from);
        segment.line_to(to);
        self.stroke_path(&segment, width, color);
    }

    /// Stroke `path` with round caps and joins.
    pub fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba<u8>) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    /// Four-connected flood fill replacing the exact color under `at`.
    /// Returns whether anything changed.
    pub fn flood_fill(&mut self, at: Point, color: Rgba<u8>) -> bool {
        if at.x < 0.0 || at.y < 0.0 {
            return false;
        }
        let (x, y) = (at.x as u32, at.y as u32);
        let Some(target) = self.pixmap.pixel(x, y) else {
            return false;
        };
        let replacement = premultiplied(color);
        if target == replacement {
            return false;
        }

        let (w, h) = (self.width(), self.height());
        let pixels = self.pixmap.pixels_mut();
        let mut stack = vec![(x, y)];
        while let Some((x, y)) = stack.pop() {
            let idx = (y * w + x) as usize;
            if pixels[idx] != target {
                continue;
            }
            pixels[idx] = replacement;
            if x > 0 {
                stack.push((x - 1, y));
            }
            if x + 1 < w {
                stack.push((x + 1, y));
            }
            if y > 0 {
                stack.push((x, y - 1));
            }
            if y + 1 < h {
                stack.push((x, y + 1));
            }
        }
        true
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.to_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// `data:image/png;base64,...`, the form the API stores.
    pub fn to_data_url(&self) -> Result<String> {
        Ok(format!("data:image/png;base64,{}", B64.encode(self.to_png()?)))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_image().save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

fn paint(color: Rgba<u8>) -> Paint<'static> {
    let [r, g, b, a] = color.0;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn premultiplied(color: Rgba<u8>) -> PremultipliedColorU8 {
    let [r, g, b, a] = color.0;
    ColorU8::from_rgba(r, g, b, a).premultiply()
}

fn straight(pixel: PremultipliedColorU8) -> Rgba<u8> {
    let c = pixel.demultiply();
    Rgba([c.red(), c.green(), c.blue(), c.alpha()])
}

/// `None` for an empty path.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => builder.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}
