//! CLI implementation.
pub mod config;

use crate::adjust::{Adjustments, Preset};
use crate::cli::config::Config;
use crate::compose::Compositor;
use crate::error::{Error, Result};
use crate::image::{ExportFormat, ImgBackend};
use crate::logs::{LogEvent, Logger, TermLogger};
use crate::project::ProjectFile;
use crate::scene::Scene;
use crate::text::FontMap;

use clap::Parser;
use std::path::PathBuf;

/// Compose a thumbnail from a saved project and export it as JPEG or PNG
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project file (JSON) describing the scene
    pub project: PathBuf,

    /// Output image path; the extension selects JPEG or PNG
    #[arg(short, long)]
    pub output: PathBuf,

    /// Integer upscale factor for the export, 2 unless configured otherwise
    #[arg(short, long)]
    pub upscale: Option<u32>,

    /// Style preset applied to the background after the project's own adjustments
    #[arg(short, long, value_enum)]
    pub preset: Option<Preset>,

    #[cfg(not(target_os = "windows"))]
    /// Configuration name, corresponding to ~/.thumbstudio/<NAME>.toml,
    /// or ./thumbstudio.toml if omitted.
    #[arg(short, long)]
    pub config: Option<String>,

    #[cfg(target_os = "windows")]
    /// Configuration name, corresponding to %APPDATA%/thumbstudio/<NAME>.toml,
    /// or ./thumbstudio.toml if omitted.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Compose at 1x, ignoring any upscale setting
    #[arg(long)]
    pub preview: bool,
}

macro_rules! error {
    ($res:expr) => {
        $res.unwrap_or_else(|e| panic!("{e}"))
    };
}

impl Cli {
    pub fn run() {
        std::panic::set_hook(Box::new(|panic_info| {
            if let Some(s) = panic_info.payload().downcast_ref::<String>() {
                eprintln!("{s}");
            } else {
                eprintln!("{panic_info}");
            }
        }));

        let cli = Self::parse();
        let mut logger = TermLogger::new_stderr();
        let (_, config) = error!(Config::find(cli.config.as_deref()));
        if !cli.report(cli.export(&config, &mut logger), &mut logger) {
            std::process::exit(1);
        }
    }

    /// Logs how an export ended. Returns whether it succeeded.
    fn report(&self, result: Result<PathBuf>, logger: &mut dyn Logger) -> bool {
        match result {
            Ok(path) => {
                logger.log(LogEvent::Done(format!("saved {}", path.display())));
                true
            }
            Err(e) => {
                logger.log(LogEvent::Error(format!("{}: {e}", self.project.display())));
                false
            }
        }
    }

    fn upscale(&self, config: &Config) -> u32 {
        match (self.preview, self.upscale) {
            (true, _) => 1,
            (false, Some(upscale)) => upscale,
            (false, None) => config.export.upscale,
        }
    }

    /// Loads the project, adjusts its background, composes and writes the result.
    fn export(&self, config: &Config, logger: &mut dyn Logger) -> Result<PathBuf> {
        // fail on a bad destination before doing any work
        ExportFormat::from_path(&self.output)?;

        let ib = ImgBackend::new()?.with_jpeg_quality(config.export.quality);
        let font_map = FontMap::load(&config.font.clone().unwrap_or_default(), logger);

        logger.log(LogEvent::Status(format!("loading {}", self.project.display())));
        let (store, adjustments) = ProjectFile::restore(&self.project, &ib, logger);
        let mut scene = store.into_scene();
        self.adjust_background(&ib, &mut scene, adjustments, logger)?;

        let upscale = self.upscale(config);
        logger.log(LogEvent::Status(format!("composing at {upscale}x")));
        let img = Compositor::new(&ib, &font_map).compose(&scene, upscale, logger)?;
        ib.write(&img, &self.output)
    }

    fn adjust_background(
        &self,
        ib: &ImgBackend,
        scene: &mut Scene,
        adjustments: Option<Adjustments>,
        logger: &mut dyn Logger,
    ) -> Result<()> {
        let background = scene.background.as_mut().ok_or(Error::EmptyScene)?;
        let stages = adjustments
            .into_iter()
            .chain(self.preset.map(|p| p.adjustments()));
        for adjustments in stages {
            logger.log(LogEvent::Status(String::from("adjusting background")));
            background.image = adjustments.apply(ib, &background.image)?;
        }
        if let Some(preset) = self.preset {
            logger.log(LogEvent::Info(format!("applied preset {preset}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arguments() {
        let cli = Cli::try_parse_from([
            "thumbstudio",
            "scene.json",
            "-o",
            "out.png",
            "--preset",
            "cinematic",
            "-u",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.project, PathBuf::from("scene.json"));
        assert_eq!(cli.preset, Some(Preset::Cinematic));
        assert_eq!(cli.upscale(&Config::default()), 3);
        assert!(!cli.preview);
    }

    #[test]
    fn preview_forces_1x() {
        let cli =
            Cli::try_parse_from(["thumbstudio", "scene.json", "-o", "out.jpg", "-u", "4", "--preview"])
                .unwrap();
        assert_eq!(cli.upscale(&Config::default()), 1);
        let cli = Cli::try_parse_from(["thumbstudio", "scene.json", "-o", "out.jpg"]).unwrap();
        assert_eq!(cli.upscale(&Config::default()), 2);
    }

    #[test]
    fn empty_project_is_an_error() {
        let dir = std::env::temp_dir().join(format!("thumbstudio-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let cli = Cli::try_parse_from([
            "thumbstudio".into(),
            dir.join("missing.json").into_os_string(),
            "-o".into(),
            dir.join("out.jpg").into_os_string(),
        ])
        .unwrap();
        let mut events: Vec<LogEvent> = Vec::new();
        let result = cli.export(&Config::default(), &mut events);
        assert!(matches!(result, Err(Error::EmptyScene)));
        assert!(!dir.join("out.jpg").exists());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn failed_export_is_logged_as_an_error() {
        let cli = Cli::try_parse_from(["thumbstudio", "scene.json", "-o", "out.png"]).unwrap();
        let mut events: Vec<LogEvent> = Vec::new();
        assert!(!cli.report(Err(Error::EmptyScene), &mut events));
        assert!(matches!(&events[..], [LogEvent::Error(msg)] if msg.starts_with("scene.json: ")));

        events.clear();
        assert!(cli.report(Ok(PathBuf::from("out.png")), &mut events));
        assert!(matches!(&events[..], [LogEvent::Done(msg)] if msg == "saved out.png"));
    }

    #[test]
    fn unsupported_output_is_rejected_early() {
        let cli = Cli::try_parse_from(["thumbstudio", "scene.json", "-o", "out.gif"]).unwrap();
        let result = cli.export(&Config::default(), &mut Vec::<LogEvent>::new());
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }
}
