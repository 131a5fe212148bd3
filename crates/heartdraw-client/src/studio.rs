//! The signed-in drawing screen: tools on one side, the surface on the
//! other, and the gallery of saved hearts underneath.

use std::path::Path;

use tracing::{info, warn};

use heartdraw_canvas::tool::CLEAR_REVERT_DELAY;
use heartdraw_canvas::{DrawingSurface, InputEvent, StyleChange, SurfaceChange, Tool, ToolController};
use heartdraw_types::api::CreateHeartRequest;
use heartdraw_types::models::Heart;

use crate::{HeartClient, Result};

pub struct Studio {
    client: HeartClient,
    controller: ToolController,
    surface: DrawingSurface,
    /// Latest surface content; `None` when there is nothing to save.
    canvas_data: Option<String>,
    gallery: Vec<Heart>,
}

impl Studio {
    pub fn new(client: HeartClient, width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            client,
            controller: ToolController::new(),
            surface: DrawingSurface::new(width, height)?,
            canvas_data: None,
            gallery: Vec::new(),
        })
    }

    pub fn client(&self) -> &HeartClient {
        &self.client
    }

    pub fn controller(&self) -> &ToolController {
        &self.controller
    }

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    pub fn canvas_data(&self) -> Option<&str> {
        self.canvas_data.as_deref()
    }

    pub fn gallery(&self) -> &[Heart] {
        &self.gallery
    }

    pub fn is_saving(&self) -> bool {
        self.controller.is_saving()
    }

    /// Selecting the clear tool wipes the surface straight away.
    pub fn select_tool(&mut self, tool: Tool) -> Option<StyleChange> {
        let change = self.controller.set_tool(tool);
        if change.is_some() && tool == Tool::Clear {
            let cleared = self.surface.clear();
            self.apply(cleared);
        }
        change
    }

    pub fn select_color(&mut self, color: &str) -> Result<Option<StyleChange>> {
        Ok(self.controller.set_color(color)?)
    }

    pub fn set_stroke_width(&mut self, width: u32) -> Option<StyleChange> {
        self.controller.set_stroke_width(width)
    }

    pub fn pointer_down(&mut self, input: &InputEvent) -> Result<()> {
        let style = self.controller.style();
        if let Some(change) = self.surface.gesture_start(input, &style)? {
            self.apply(change);
        }
        Ok(())
    }

    pub fn pointer_move(&mut self, input: &InputEvent) -> Result<()> {
        let style = self.controller.style();
        if let Some(change) = self.surface.gesture_move(input, &style)? {
            self.apply(change);
        }
        Ok(())
    }

    pub fn pointer_up(&mut self) -> Result<()> {
        if let Some(change) = self.surface.gesture_end()? {
            self.apply(change);
        }
        Ok(())
    }

    /// The clear button: wipe, then fall back to the heart tool shortly after.
    pub async fn clear(&mut self) {
        self.select_tool(Tool::Clear);
        tokio::time::sleep(CLEAR_REVERT_DELAY).await;
        self.controller.finish_clear();
    }

    /// Fetch the signed-in user's hearts into the gallery.
    pub async fn refresh_gallery(&mut self) -> Result<&[Heart]> {
        self.gallery = self.client.list_hearts().await?;
        Ok(&self.gallery)
    }

    /// Persist the current canvas. Returns `None` without a request when the
    /// canvas is empty or another save is still in flight. Once the heart is
    /// stored it is returned even if the gallery refresh afterwards fails.
    pub async fn save(&mut self, name: Option<String>) -> Result<Option<Heart>> {
        let Some(image) = self.canvas_data.clone() else {
            return Ok(None);
        };
        if !self.controller.begin_save() {
            warn!("Save already in progress, ignoring");
            return Ok(None);
        }

        let result = self.client.create_heart(&CreateHeartRequest { image, name }).await;
        self.controller.finish_save();
        let heart = result?;
        info!("Saved heart {} ({})", heart.id, heart.name);

        if let Err(e) = self.refresh_gallery().await {
            warn!("Saved heart {} but gallery refresh failed: {}", heart.id, e);
        }
        Ok(Some(heart))
    }

    /// Write the current raster to `path` as a PNG.
    pub fn download(&self, path: &Path) -> Result<()> {
        self.surface.raster().save_png(path)?;
        info!("Downloaded canvas to {}", path.display());
        Ok(())
    }

    fn apply(&mut self, change: SurfaceChange) {
        self.canvas_data = match change {
            SurfaceChange::Drawn(url) => Some(url),
            SurfaceChange::Cleared => None,
        };
    }
}
