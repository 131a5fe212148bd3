use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use image::Rgba;

use crate::color::{parse_hex, to_hex};
use crate::{CanvasError, Result};

pub const PALETTE: [&str; 10] = [
    "#FF3366", "#FF5A79", "#FF8FA3", "#FFB6C1", "#FFCCD5",
    "#E91E63", "#9C27B0", "#673AB7", "#3F51B5", "#3D85C6",
];

pub const MIN_STROKE_WIDTH: u32 = 1;
pub const MAX_STROKE_WIDTH: u32 = 20;
pub const DEFAULT_STROKE_WIDTH: u32 = 3;

/// How long the clear tool stays selected before reverting to the heart.
pub const CLEAR_REVERT_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Heart,
    Pen,
    Text,
    Fill,
    Eraser,
    /// Not a drawing tool: selecting it wipes the surface.
    Clear,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Heart,
        Tool::Pen,
        Tool::Text,
        Tool::Fill,
        Tool::Eraser,
        Tool::Clear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Heart => "heart",
            Tool::Pen => "pen",
            Tool::Text => "text",
            Tool::Fill => "fill",
            Tool::Eraser => "eraser",
            Tool::Clear => "clear",
        }
    }

    /// Tools that lay down a path following the pointer.
    pub fn is_line_based(self) -> bool {
        matches!(self, Tool::Pen | Tool::Eraser)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self> {
        Tool::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CanvasError::UnknownTool(s.to_string()))
    }
}

/// Everything the surface needs to know to render a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub tool: Tool,
    pub color: Rgba<u8>,
    pub stroke_width: u32,
}

/// Emitted by [`ToolController`] setters when a value actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleChange {
    Tool(Tool),
    Color(String),
    StrokeWidth(u32),
}

/// Selected tool, color and stroke width, plus the save-in-flight flag.
#[derive(Debug, Clone)]
pub struct ToolController {
    tool: Tool,
    color: Rgba<u8>,
    stroke_width: u32,
    saving: bool,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolController {
    pub fn new() -> Self {
        Self {
            tool: Tool::default(),
            color: Rgba([0xFF, 0x33, 0x66, 0xFF]),
            stroke_width: DEFAULT_STROKE_WIDTH,
            saving: false,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// `#RRGGBB`, upper case.
    pub fn color(&self) -> String {
        format!("#{}", to_hex(self.color))
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    pub fn style(&self) -> Style {
        Style {
            tool: self.tool,
            color: self.color,
            stroke_width: self.stroke_width,
        }
    }

    pub fn set_tool(&mut self, tool: Tool) -> Option<StyleChange> {
        if self.tool == tool {
            return None;
        }
        self.tool = tool;
        Some(StyleChange::Tool(tool))
    }

    pub fn set_color(&mut self, color: &str) -> Result<Option<StyleChange>> {
        let parsed = parse_hex(color)?;
        if parsed == self.color {
            return Ok(None);
        }
        self.color = parsed;
        Ok(Some(StyleChange::Color(self.color())))
    }

    /// Out-of-range widths are clamped rather than rejected.
    pub fn set_stroke_width(&mut self, width: u32) -> Option<StyleChange> {
        let width = width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH);
        if width == self.stroke_width {
            return None;
        }
        self.stroke_width = width;
        Some(StyleChange::StrokeWidth(width))
    }

    /// Claim the save slot. False while another save is outstanding.
    pub fn begin_save(&mut self) -> bool {
        if self.saving {
            return false;
        }
        self.saving = true;
        true
    }

    pub fn finish_save(&mut self) {
        self.saving = false;
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// First half of the clear command: select the clear tool. Call
    /// [`finish_clear`](Self::finish_clear) after [`CLEAR_REVERT_DELAY`].
    pub fn begin_clear(&mut self) -> Option<StyleChange> {
        self.set_tool(Tool::Clear)
    }

    /// Revert to the heart, unless the user already picked something else.
    pub fn finish_clear(&mut self) -> Option<StyleChange> {
        if self.tool != Tool::Clear {
            return None;
        }
        self.set_tool(Tool::Heart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ctl = ToolController::new();
        assert_eq!(ctl.tool(), Tool::Heart);
        assert_eq!(ctl.color(), PALETTE[0]);
        assert_eq!(ctl.stroke_width(), 3);
        assert!(!ctl.is_saving());
    }

    #[test]
    fn tool_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(tool.as_str().parse::<Tool>().unwrap(), tool);
        }
        assert!("lasso".parse::<Tool>().is_err());
    }

    #[test]
    fn setters_only_notify_on_change() {
        let mut ctl = ToolController::new();
        assert_eq!(ctl.set_tool(Tool::Heart), None);
        assert_eq!(ctl.set_tool(Tool::Pen), Some(StyleChange::Tool(Tool::Pen)));

        assert_eq!(ctl.set_color("#ff3366").unwrap(), None);
        assert_eq!(
            ctl.set_color("3d85c6").unwrap(),
            Some(StyleChange::Color("#3D85C6".into()))
        );
        assert!(ctl.set_color("blue").is_err());
        assert_eq!(ctl.color(), "#3D85C6");
    }

    #[test]
    fn stroke_width_is_clamped() {
        let mut ctl = ToolController::new();
        assert_eq!(ctl.set_stroke_width(0), Some(StyleChange::StrokeWidth(1)));
        assert_eq!(ctl.set_stroke_width(99), Some(StyleChange::StrokeWidth(20)));
        assert_eq!(ctl.set_stroke_width(20), None);
    }

    #[test]
    fn save_is_exclusive_until_finished() {
        let mut ctl = ToolController::new();
        assert!(ctl.begin_save());
        assert!(!ctl.begin_save());
        ctl.finish_save();
        assert!(ctl.begin_save());
    }

    #[test]
    fn clear_reverts_to_heart_unless_overridden() {
        let mut ctl = ToolController::new();
        ctl.set_tool(Tool::Pen);
        assert_eq!(ctl.begin_clear(), Some(StyleChange::Tool(Tool::Clear)));
        assert_eq!(ctl.finish_clear(), Some(StyleChange::Tool(Tool::Heart)));

        ctl.begin_clear();
        ctl.set_tool(Tool::Eraser);
        assert_eq!(ctl.finish_clear(), None);
        assert_eq!(ctl.tool(), Tool::Eraser);
    }
}
