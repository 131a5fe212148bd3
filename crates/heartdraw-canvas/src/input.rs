use kurbo::Point;

/// A raw pointer or touch sample as delivered by the windowing layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Mouse/pen events already carry coordinates relative to the surface.
    Pointer { offset: Point },
    /// Touch events carry viewport coordinates; `surface_origin` is the
    /// surface's top-left corner in the same space.
    Touch {
        touches: Vec<Point>,
        surface_origin: Point,
    },
}

impl InputEvent {
    pub fn pointer(x: f64, y: f64) -> Self {
        Self::Pointer {
            offset: Point::new(x, y),
        }
    }

    /// Where on the surface this event lands. Only the first touch counts;
    /// a touch event with no active touches has no position.
    pub fn surface_point(&self) -> Option<Point> {
        match self {
            Self::Pointer { offset } => Some(*offset),
            Self::Touch {
                touches,
                surface_origin,
            } => touches.first().map(|t| *t - surface_origin.to_vec2()),
        }
    }
}
