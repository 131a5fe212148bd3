//! The heart outline.
//!
//! Two mirrored cubic curves run from a bottom tip `0.7 * height` below the
//! anchor up to a notch `0.3 * height` above it. The control points sit
//! half the width out to each side, at `height / 8` below and `height / 2`
//! above the anchor.

use image::Rgba;
use kurbo::{BezPath, Point};

use crate::color::{OUTLINE_DELTA, shift};
use crate::raster::Raster;

pub const OUTLINE_WIDTH: f64 = 2.0;

pub fn heart_path(anchor: Point, width: f64, height: f64) -> BezPath {
    let Point { x, y } = anchor;
    let half = width / 2.0;
    let tip = Point::new(x, y + height * 0.7);
    let notch = Point::new(x, y - height * 0.3);

    let mut path = BezPath::new();
    path.move_to(tip);
    path.curve_to(
        Point::new(x - half, y + height / 8.0),
        Point::new(x - half, y - height / 2.0),
        notch,
    );
    path.curve_to(
        Point::new(x + half, y - height / 2.0),
        Point::new(x + half, y + height / 8.0),
        tip,
    );
    path.close_path();
    path
}

/// Fill a heart with `color` and outline it in a slightly darker shade.
pub fn draw_heart(raster: &mut Raster, anchor: Point, width: f64, height: f64, color: Rgba<u8>) {
    let path = heart_path(anchor, width, height);
    raster.fill_path(&path, color);
    raster.stroke_path(&path, OUTLINE_WIDTH, shift(color, OUTLINE_DELTA));
}
