//! Saving and restoring a scene as a JSON project file.

use crate::adjust::Adjustments;
use crate::error::{Error, Result};
use crate::image::ImgBackend;
use crate::logs::{LogEvent, Logger};
use crate::scene::{Background, Overlay, Scene, TextLayer};
use crate::store::{SceneStore, Theme};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    Theme::default().to_string()
}

impl From<&Overlay> for OverlayEntry {
    fn from(o: &Overlay) -> Self {
        Self {
            path: o.path.clone(),
            name: Some(o.name.clone()),
            x: o.x,
            y: o.y,
            scale: o.scale,
            angle: o.angle,
            visible: o.visible,
            locked: o.locked,
        }
    }
}

/// On-disk form of a scene. Images are referenced by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub background_path: Option<PathBuf>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub overlays: Vec<OverlayEntry>,
    #[serde(default)]
    pub text_layers: Vec<TextLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustments: Option<Adjustments>,
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self {
            background_path: None,
            theme: default_theme(),
            overlays: Vec::new(),
            text_layers: Vec::new(),
            adjustments: None,
        }
    }
}

impl ProjectFile {
    pub fn from_store(store: &SceneStore) -> Self {
        let scene = store.scene();
        Self {
            background_path: scene.background.as_ref().and_then(|b| b.path.clone()),
            theme: store.theme().to_string(),
            overlays: scene.overlays.iter().map(OverlayEntry::from).collect(),
            text_layers: scene.text_layers.clone(),
            adjustments: None,
        }
    }

    pub fn with_adjustments(mut self, adjustments: Adjustments) -> Self {
        self.adjustments = (!adjustments.is_neutral()).then_some(adjustments);
        self
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::project_write(path, e))?;
        fs::write(path, json).map_err(|e| Error::project_write(path, e))
    }

    /// Reads a project, failing on any I/O or format error.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| Error::project_open(path, e))?;
        serde_json::from_str(&data).map_err(|e| Error::project_deser(path, e))
    }

    /// Reads a project and loads the images it references. A missing or
    /// unreadable project gives an empty store. Entities whose image cannot be
    /// loaded are left out. Every problem is reported to `logger`.
    pub fn restore(
        path: impl AsRef<Path>,
        ib: &ImgBackend,
        logger: &mut dyn Logger,
    ) -> (SceneStore, Option<Adjustments>) {
        match Self::read(path) {
            Ok(project) => project.into_store(ib, logger),
            Err(e) => {
                logger.log(LogEvent::Warn(format!("{e}, starting from an empty project")));
                (SceneStore::new(), None)
            }
        }
    }

    /// Loads the referenced images into a store, skipping what cannot be loaded.
    pub fn into_store(
        self,
        ib: &ImgBackend,
        logger: &mut dyn Logger,
    ) -> (SceneStore, Option<Adjustments>) {
        let mut scene = Scene::new();

        if let Some(path) = self.background_path {
            match ib.open_background(&path) {
                Ok(image) => scene.background = Some(Background::new(image, Some(path))),
                Err(e) => logger.log(LogEvent::Warn(format!("skipping background: {e}"))),
            }
        }

        for (i, entry) in self.overlays.into_iter().enumerate() {
            let Some(path) = entry.path else {
                logger.log(LogEvent::Warn(format!("skipping overlay #{i}: no image path")));
                continue;
            };
            let image = match ib.open(&path) {
                Ok(image) => image,
                Err(e) => {
                    logger.log(LogEvent::Warn(format!("skipping overlay #{i}: {e}")));
                    continue;
                }
            };
            let name = entry.name.unwrap_or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("Overlay {}", i + 1))
            });
            let mut overlay = Overlay::new(image, name).at(entry.x, entry.y);
            overlay.path = Some(path);
            overlay.scale = entry.scale.max(0.0);
            overlay.angle = entry.angle;
            overlay.visible = entry.visible;
            overlay.locked = entry.locked;
            scene.overlays.push(overlay);
        }

        scene.text_layers = self.text_layers;

        let theme = self.theme.parse::<Theme>().unwrap_or_else(|e| {
            logger.log(LogEvent::Warn(format!("{e}, using the default theme")));
            Theme::default()
        });
        let adjustments = self.adjustments.map(|a| a.clamped());
        (SceneStore::from_scene(scene, theme), adjustments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Color;
    use crate::store::Intent;

    /// A fresh directory under the system temp dir, removed on drop.
    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir()
                .join(format!("thumbstudio-{name}-{}", std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn join(&self, name: &str) -> PathBuf {
            self.0.join(name)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn missing_fields_take_defaults() {
        let project: ProjectFile = serde_json::from_str(
            r#"{
                "background_path": null,
                "overlays": [{"path": "logo.png", "x": 12, "y": 34}],
                "text_layers": [{"text": "WIN", "x": 5, "y": 6}]
            }"#,
        )
        .unwrap();
        assert_eq!(project.theme, "Dark");
        let ov = &project.overlays[0];
        assert_eq!((ov.scale, ov.angle, ov.visible, ov.locked), (1.0, 0.0, true, false));
        assert_eq!(project.text_layers[0].font_size, 80.0);
        assert_eq!(project.adjustments, None);
    }

    #[test]
    fn strict_read_reports_errors() {
        let dir = TempDir::new("strict");
        assert!(matches!(
            ProjectFile::read(dir.join("nope.json")),
            Err(Error::ProjectOpen(..))
        ));
        fs::write(dir.join("bad.json"), "{ not json").unwrap();
        assert!(matches!(
            ProjectFile::read(dir.join("bad.json")),
            Err(Error::ProjectDeser(..))
        ));
    }

    #[test]
    fn corrupt_project_restores_empty() {
        let ib = ImgBackend::new().unwrap();
        let dir = TempDir::new("corrupt");
        fs::write(dir.join("bad.json"), "[1, 2").unwrap();
        let mut events: Vec<LogEvent> = Vec::new();
        let (store, adjustments) = ProjectFile::restore(dir.join("bad.json"), &ib, &mut events);
        assert!(store.scene().is_empty());
        assert!(adjustments.is_none());
        assert_eq!(events.iter().filter(|e| e.is_warning()).count(), 1);
    }

    #[test]
    fn round_trip_through_disk() {
        let ib = ImgBackend::new().unwrap();
        let dir = TempDir::new("round-trip");
        let bg_path = ib
            .write(&ib.new_background(&Color::BLACK, 40, 30).unwrap(), dir.join("bg.png"))
            .unwrap();
        let logo_path = ib
            .write(&ib.new_canvas(&Color::WHITE, 8, 8).unwrap(), dir.join("logo.png"))
            .unwrap();

        let mut store = SceneStore::new();
        store
            .dispatch(Intent::SetBackground {
                image: ib.open_background(&bg_path).unwrap(),
                path: Some(bg_path.clone()),
            })
            .unwrap();
        store
            .dispatch(Intent::AddOverlay {
                image: ib.open(&logo_path).unwrap(),
                path: Some(logo_path.clone()),
            })
            .unwrap();
        store
            .dispatch(Intent::TransformOverlay {
                index: 0,
                scale: 0.5,
                angle: 15.0,
            })
            .unwrap();
        store.dispatch(Intent::ToggleLock(crate::scene::LayerRef::Overlay(0))).unwrap();
        store.dispatch(Intent::AddText).unwrap();
        store.dispatch(Intent::SetTheme(Theme::Light)).unwrap();

        let adjustments = crate::adjust::Preset::Warm.adjustments();
        let project = ProjectFile::from_store(&store).with_adjustments(adjustments);
        project.save(dir.join("scene.json")).unwrap();
        assert_eq!(ProjectFile::read(dir.join("scene.json")).unwrap(), project);

        let mut events: Vec<LogEvent> = Vec::new();
        let (restored, restored_adj) = ProjectFile::restore(dir.join("scene.json"), &ib, &mut events);
        assert!(events.is_empty(), "{events:?}");
        assert_eq!(restored.theme(), Theme::Light);
        assert_eq!(restored_adj, Some(adjustments));
        let scene = restored.scene();
        assert_eq!(scene.background.as_ref().unwrap().size(), (40, 30));
        let ov = &scene.overlays[0];
        assert_eq!((ov.name.as_str(), ov.scale, ov.angle, ov.locked), ("logo.png", 0.5, 15.0, true));
        assert_eq!(scene.text_layers, store.scene().text_layers);
    }

    #[test]
    fn missing_images_skip_only_their_entity() {
        let ib = ImgBackend::new().unwrap();
        let dir = TempDir::new("missing");
        let logo_path = ib
            .write(&ib.new_canvas(&Color::WHITE, 8, 8).unwrap(), dir.join("logo.png"))
            .unwrap();
        let project = ProjectFile {
            background_path: Some(dir.join("gone.jpg")),
            theme: String::from("Vaporwave"),
            overlays: vec![
                OverlayEntry {
                    path: Some(dir.join("gone.png")),
                    name: None,
                    x: 0.0,
                    y: 0.0,
                    scale: 1.0,
                    angle: 0.0,
                    visible: true,
                    locked: false,
                },
                OverlayEntry {
                    path: None,
                    name: Some(String::from("orphan")),
                    x: 0.0,
                    y: 0.0,
                    scale: 1.0,
                    angle: 0.0,
                    visible: true,
                    locked: false,
                },
                OverlayEntry {
                    path: Some(logo_path),
                    name: None,
                    x: 3.0,
                    y: 4.0,
                    scale: 1.0,
                    angle: 0.0,
                    visible: false,
                    locked: false,
                },
            ],
            text_layers: vec![TextLayer::default()],
            adjustments: None,
        };

        let mut events: Vec<LogEvent> = Vec::new();
        let (store, _) = project.into_store(&ib, &mut events);
        // background, two overlays and the theme
        assert_eq!(events.iter().filter(|e| e.is_warning()).count(), 4);
        let scene = store.scene();
        assert!(scene.is_empty());
        assert_eq!(scene.overlays.len(), 1);
        assert_eq!(scene.overlays[0].name, "logo.png");
        assert!(!scene.overlays[0].visible);
        assert_eq!(scene.text_layers.len(), 1);
        assert_eq!(store.theme(), Theme::Dark);
    }
}
