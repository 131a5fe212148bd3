//! Gesture handling on top of a [`Raster`].
//!
//! A gesture is start, zero or more moves, then end. Pen and eraser strokes
//! are composited straight into the raster as the pointer moves. The heart
//! tool previews: the raster is snapshotted when the gesture starts and each
//! move restores the snapshot before drawing the heart at its new size, so
//! earlier previews never linger.

use kurbo::Point;
use tracing::debug;

use crate::color::BACKGROUND;
use crate::heart::draw_heart;
use crate::input::InputEvent;
use crate::raster::Raster;
use crate::tool::{Style, Tool};
use crate::Result;

/// What a listener should do with the surface's latest content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceChange {
    /// The raster changed; here it is as a PNG data URL.
    Drawn(String),
    /// The raster was wiped; there is nothing to save.
    Cleared,
}

#[derive(Debug)]
enum Gesture {
    Idle,
    Tracking {
        start: Point,
        last: Point,
        /// Raster as it was before the current heart preview.
        snapshot: Option<Raster>,
    },
}

#[derive(Debug)]
pub struct DrawingSurface {
    raster: Raster,
    gesture: Gesture,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            raster: Raster::new(width, height)?,
            gesture: Gesture::Idle,
        })
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.gesture, Gesture::Tracking { .. })
    }

    /// Pointer down / touch start. Starting while already tracking begins a
    /// fresh gesture and keeps whatever was drawn so far.
    pub fn gesture_start(
        &mut self,
        input: &InputEvent,
        style: &Style,
    ) -> Result<Option<SurfaceChange>> {
        let Some(start) = input.surface_point() else {
            return Ok(None);
        };

        let snapshot = (style.tool == Tool::Heart).then(|| self.raster.clone());
        self.gesture = Gesture::Tracking {
            start,
            last: start,
            snapshot,
        };
        debug!(tool = %style.tool, x = start.x, y = start.y, "gesture start");

        if style.tool == Tool::Fill && self.raster.flood_fill(start, style.color) {
            return self.drawn();
        }
        Ok(None)
    }

    /// Pointer/touch move. Ignored unless a gesture is in progress.
    pub fn gesture_move(
        &mut self,
        input: &InputEvent,
        style: &Style,
    ) -> Result<Option<SurfaceChange>> {
        let Some(point) = input.surface_point() else {
            return Ok(None);
        };
        let Gesture::Tracking {
            start,
            last,
            snapshot,
        } = &mut self.gesture
        else {
            return Ok(None);
        };

        if style.tool.is_line_based() {
            let color = if style.tool == Tool::Eraser {
                BACKGROUND
            } else {
                style.color
            };
            self.raster
                .stroke_segment(*last, point, style.stroke_width as f64, color);
        } else if style.tool == Tool::Heart {
            // The tool may have switched to heart mid-gesture.
            let base = snapshot.get_or_insert_with(|| self.raster.clone());
            self.raster.clone_from(base);

            let width = (point.x - start.x).abs();
            let height = (point.y - start.y).abs();
            draw_heart(&mut self.raster, *start, width, height, style.color);
        }
        *last = point;

        self.drawn()
    }

    /// Pointer up, pointer leaving the surface, or touch end.
    pub fn gesture_end(&mut self) -> Result<Option<SurfaceChange>> {
        if !self.is_tracking() {
            return Ok(None);
        }
        self.gesture = Gesture::Idle;
        debug!("gesture end");
        self.drawn()
    }

    /// Wipe the raster unconditionally, abandoning any gesture.
    pub fn clear(&mut self) -> SurfaceChange {
        self.raster.clear();
        self.gesture = Gesture::Idle;
        debug!("surface cleared");
        SurfaceChange::Cleared
    }

    fn drawn(&self) -> Result<Option<SurfaceChange>> {
        Ok(Some(SurfaceChange::Drawn(self.raster.to_data_url()?)))
    }
}
