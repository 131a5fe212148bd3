//! The drawing side of HeartDraw: color and heart math, an owned RGBA
//! raster, the gesture-driven drawing surface and the tool/style state
//! that feeds it. Nothing in here does I/O.

pub mod color;
pub mod heart;
pub mod input;
pub mod raster;
pub mod surface;
pub mod tool;

pub use input::InputEvent;
pub use raster::Raster;
pub use surface::{DrawingSurface, SurfaceChange};
pub use tool::{Style, StyleChange, Tool, ToolController};

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("invalid color '{0}': expected 6 hex digits")]
    InvalidColor(String),
    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, CanvasError>;
