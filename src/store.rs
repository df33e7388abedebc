//! Scene state, mutated only through intents.

use crate::error::{Error, Result};
use crate::image::Color;
use crate::scene::{Background, LayerRef, Overlay, Scene, TextLayer};
use crate::snap::{self, Guide};

use libvips::VipsImage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Maximum number of text snapshots kept for undo.
pub const UNDO_DEPTH: usize = 15;

/// Where a new overlay is placed.
pub const OVERLAY_ORIGIN: (f64, f64) = (100.0, 100.0);

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Neon,
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "neon" => Ok(Theme::Neon),
            _ => Err(Error::UnknownTheme(s.to_string())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Dark => "Dark",
            Theme::Light => "Light",
            Theme::Neon => "Neon",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    pub enabled: bool,
    pub threshold: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: snap::DEFAULT_THRESHOLD,
        }
    }
}

/// A request to change the scene.
pub enum Intent {
    SetBackground { image: VipsImage, path: Option<PathBuf> },
    AddOverlay { image: VipsImage, path: Option<PathBuf> },
    AddText,
    SetText { index: usize, text: String },
    SetTextStyle { index: usize, font_size: f64, bold: i32 },
    SetTextColor { index: usize, color: Color },
    MoveText { index: usize, dx: i32, dy: i32 },
    /// Moves an overlay's top-left corner, snapping to the canvas center.
    PlaceOverlay { index: usize, x: f64, y: f64 },
    TransformOverlay { index: usize, scale: f64, angle: f64 },
    ToggleVisibility(LayerRef),
    ToggleLock(LayerRef),
    /// Swaps a layer with the one painted right after it.
    Raise(LayerRef),
    /// Swaps a layer with the one painted right before it.
    Lower(LayerRef),
    Remove(LayerRef),
    Select(LayerRef),
    SetTheme(Theme),
    UndoText,
}

#[derive(Debug, Default)]
pub struct SceneStore {
    scene: Scene,
    theme: Theme,
    selected: Option<LayerRef>,
    guides: Vec<Guide>,
    snap: SnapSettings,
    text_history: VecDeque<Vec<TextLayer>>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scene(scene: Scene, theme: Theme) -> Self {
        Self {
            scene,
            theme,
            ..Default::default()
        }
    }

    pub fn with_snap(mut self, snap: SnapSettings) -> Self {
        self.snap = snap;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn selected(&self) -> Option<LayerRef> {
        self.selected
    }

    /// Guides produced by the last overlay placement, if it snapped.
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub fn undo_depth(&self) -> usize {
        self.text_history.len()
    }

    /// Applies `intent`. On error the scene and the guides are left unchanged.
    pub fn dispatch(&mut self, intent: Intent) -> Result<()> {
        let placing = matches!(intent, Intent::PlaceOverlay { .. });
        match intent {
            Intent::SetBackground { image, path } => {
                self.scene.background = Some(Background::new(image, path));
            }
            Intent::AddOverlay { image, path } => {
                let name = match path.as_ref().and_then(|p| p.file_name()) {
                    Some(name) => name.to_string_lossy().into_owned(),
                    None => format!("Overlay {}", self.scene.overlays.len() + 1),
                };
                let (x, y) = OVERLAY_ORIGIN;
                let mut overlay = Overlay::new(image, name).at(x, y);
                overlay.path = path;
                self.scene.overlays.push(overlay);
                self.selected = Some(LayerRef::Overlay(self.scene.overlays.len() - 1));
            }
            Intent::AddText => {
                self.push_text_history();
                self.scene.text_layers.push(TextLayer::default());
                self.selected = Some(LayerRef::Text(self.scene.text_layers.len() - 1));
            }
            Intent::SetText { index, text } => self.edit_text(index, |t| t.text = text)?,
            Intent::SetTextStyle {
                index,
                font_size,
                bold,
            } => self.edit_text(index, |t| {
                t.font_size = font_size;
                t.bold = bold;
            })?,
            Intent::SetTextColor { index, color } => self.edit_text(index, |t| t.color = color)?,
            Intent::MoveText { index, dx, dy } => self.edit_text(index, |t| {
                t.x = t.x.saturating_add(dx);
                t.y = t.y.saturating_add(dy);
            })?,
            Intent::PlaceOverlay { index, x, y } => self.place_overlay(index, x, y)?,
            Intent::TransformOverlay {
                index,
                scale,
                angle,
            } => {
                let overlay = self.editable_overlay(index)?;
                overlay.scale = scale.max(0.0);
                overlay.angle = angle;
            }
            Intent::ToggleVisibility(layer) => match layer {
                LayerRef::Overlay(i) => {
                    let o = self.overlay_mut(i)?;
                    o.visible = !o.visible;
                }
                LayerRef::Text(i) => {
                    let t = self.text_mut(i)?;
                    t.visible = !t.visible;
                }
            },
            Intent::ToggleLock(layer) => match layer {
                LayerRef::Overlay(i) => {
                    let o = self.overlay_mut(i)?;
                    o.locked = !o.locked;
                }
                LayerRef::Text(i) => {
                    let t = self.text_mut(i)?;
                    t.locked = !t.locked;
                }
            },
            Intent::Raise(layer) => self.swap_with(layer, 1)?,
            Intent::Lower(layer) => self.swap_with(layer, -1)?,
            Intent::Remove(layer) => self.remove(layer)?,
            Intent::Select(layer) => {
                self.check(layer)?;
                self.selected = Some(layer);
            }
            Intent::SetTheme(theme) => self.theme = theme,
            Intent::UndoText => {
                let layers = self.text_history.pop_back().ok_or(Error::NoUndoHistory)?;
                self.scene.text_layers = layers;
                if let Some(LayerRef::Text(_)) = self.selected {
                    self.selected = self.scene.text_layers.len().checked_sub(1).map(LayerRef::Text);
                }
            }
        }
        if !placing {
            self.guides.clear();
        }
        Ok(())
    }

    fn check(&self, layer: LayerRef) -> Result<()> {
        match self.scene.contains(layer) {
            true => Ok(()),
            false => Err(Error::LayerNotFound(layer.to_string())),
        }
    }

    fn check_unlocked(&self, layer: LayerRef) -> Result<()> {
        match self.scene.is_locked(layer) {
            None => Err(Error::LayerNotFound(layer.to_string())),
            Some(true) => Err(Error::LayerLocked(layer.to_string())),
            Some(false) => Ok(()),
        }
    }

    fn overlay_mut(&mut self, index: usize) -> Result<&mut Overlay> {
        self.scene
            .overlays
            .get_mut(index)
            .ok_or_else(|| Error::LayerNotFound(LayerRef::Overlay(index).to_string()))
    }

    fn text_mut(&mut self, index: usize) -> Result<&mut TextLayer> {
        self.scene
            .text_layers
            .get_mut(index)
            .ok_or_else(|| Error::LayerNotFound(LayerRef::Text(index).to_string()))
    }

    fn editable_overlay(&mut self, index: usize) -> Result<&mut Overlay> {
        self.check_unlocked(LayerRef::Overlay(index))?;
        self.overlay_mut(index)
    }

    fn edit_text(&mut self, index: usize, f: impl FnOnce(&mut TextLayer)) -> Result<()> {
        self.check_unlocked(LayerRef::Text(index))?;
        self.push_text_history();
        f(self.text_mut(index)?);
        Ok(())
    }

    fn push_text_history(&mut self) {
        if self.text_history.len() == UNDO_DEPTH {
            self.text_history.pop_front();
        }
        self.text_history.push_back(self.scene.text_layers.clone());
    }

    fn place_overlay(&mut self, index: usize, x: f64, y: f64) -> Result<()> {
        let canvas = self.scene.background.as_ref().map(Background::size);
        let settings = self.snap;
        let overlay = self.editable_overlay(index)?;
        let (w, h) = overlay.scaled_size();
        let (x, y, guides) = match canvas {
            Some((cw, ch)) if settings.enabled => {
                let s = snap::snap(x, y, w, h, cw as f64, ch as f64, settings.threshold);
                (s.x, s.y, s.guides)
            }
            _ => (x, y, Vec::new()),
        };
        overlay.x = x;
        overlay.y = y;
        self.guides = guides;
        Ok(())
    }

    /// Swaps `layer` with its neighbour `step` places away in the same list.
    /// Nothing happens at either end of the list.
    fn swap_with(&mut self, layer: LayerRef, step: isize) -> Result<()> {
        self.check(layer)?;
        let (i, len) = match layer {
            LayerRef::Overlay(i) => (i, self.scene.overlays.len()),
            LayerRef::Text(i) => (i, self.scene.text_layers.len()),
        };
        let j = match i.checked_add_signed(step) {
            Some(j) if j < len => j,
            _ => return Ok(()),
        };
        let moved = match layer {
            LayerRef::Overlay(_) => {
                self.scene.overlays.swap(i, j);
                LayerRef::Overlay(j)
            }
            LayerRef::Text(_) => {
                self.scene.text_layers.swap(i, j);
                LayerRef::Text(j)
            }
        };
        // selection follows the layer it points at
        if self.selected == Some(layer) {
            self.selected = Some(moved);
        } else if self.selected == Some(moved) {
            self.selected = Some(layer);
        }
        Ok(())
    }

    fn remove(&mut self, layer: LayerRef) -> Result<()> {
        self.check_unlocked(layer)?;
        match layer {
            LayerRef::Overlay(i) => {
                self.scene.overlays.remove(i);
            }
            LayerRef::Text(i) => {
                self.push_text_history();
                self.scene.text_layers.remove(i);
            }
        }
        self.selected = match (self.selected, layer) {
            (Some(s), _) if s == layer => None,
            (Some(LayerRef::Overlay(s)), LayerRef::Overlay(i)) if s > i => {
                Some(LayerRef::Overlay(s - 1))
            }
            (Some(LayerRef::Text(s)), LayerRef::Text(i)) if s > i => Some(LayerRef::Text(s - 1)),
            (s, _) => s,
        };
        Ok(())
    }
}
