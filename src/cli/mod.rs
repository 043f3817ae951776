use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::{get_filename, get_non_colliding_name, guess_vod_extension, VideoMetadata};
use crate::core::metadata::seconds;

#[derive(Parser, Debug)]
#[command(name = "vod-namer")]
#[command(about = "Build a safe, non-colliding output path from a filename template")]
#[command(version)]
pub struct Cli {
    /// Filename template, e.g. "{channel}/{date_custom=\"yyyy-MM-dd\"}_{title}"
    #[arg(short, long)]
    pub template: Option<String>,

    /// JSON file holding the video metadata
    #[arg(short, long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Output directory the path is placed under
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub channel: Option<String>,

    #[arg(long)]
    pub channel_id: Option<String>,

    #[arg(long)]
    pub clipper: Option<String>,

    #[arg(long)]
    pub clipper_id: Option<String>,

    #[arg(long)]
    pub game: Option<String>,

    /// Creation date, RFC 3339
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,

    /// Trim start in seconds
    #[arg(long, allow_negative_numbers = true)]
    pub trim_start: Option<f64>,

    /// Trim end in seconds
    #[arg(long, allow_negative_numbers = true)]
    pub trim_end: Option<f64>,

    #[arg(long)]
    pub views: Option<u64>,

    /// File extension to append, e.g. ".mp4"
    #[arg(long, conflicts_with = "quality")]
    pub ext: Option<String>,

    /// Quality string used to guess the file extension
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Append " (n)" when the file already exists
    #[arg(short, long)]
    pub unique: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let metadata = self.load_metadata()?;

        let template = self.template.as_deref().unwrap_or(&config.template);
        let output_dir = self.output.as_ref().unwrap_or(&config.output_dir);
        info!("Building output path from template {:?}", template);

        let output = get_filename(template, &metadata)?;
        let mut path = output_dir.join(output.to_path_buf());
        if let Some(ext) = self.extension() {
            let mut name = path.into_os_string();
            name.push(ext);
            path = PathBuf::from(name);
        }

        if self.unique || config.unique {
            path = get_non_colliding_name(&path)
                .with_context(|| format!("Failed to find a free name for {}", path.display()))?;
        }

        println!("{}", path.display());
        Ok(())
    }

    fn extension(&self) -> Option<String> {
        if let Some(ext) = &self.ext {
            return Some(if ext.starts_with('.') { ext.clone() } else { format!(".{ext}") });
        }

        let quality = self.quality.as_deref()?;
        let ext = guess_vod_extension(Some(quality));
        if ext.is_none() {
            debug!("No extension known for quality {:?}", quality);
        }
        ext.map(str::to_string)
    }

    /// Metadata from `--metadata`, with any field flags layered on top.
    fn load_metadata(&self) -> Result<VideoMetadata> {
        let mut metadata = match &self.metadata {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read metadata file {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse metadata file {}", path.display()))?
            }
            None => VideoMetadata::default(),
        };

        let text_fields = [
            (&mut metadata.title, &self.title),
            (&mut metadata.id, &self.id),
            (&mut metadata.channel, &self.channel),
            (&mut metadata.channel_id, &self.channel_id),
            (&mut metadata.clipper, &self.clipper),
            (&mut metadata.clipper_id, &self.clipper_id),
            (&mut metadata.game, &self.game),
        ];
        for (field, value) in text_fields {
            if value.is_some() {
                field.clone_from(value);
            }
        }

        if let Some(date) = self.date {
            metadata.created_at = date;
        }
        if let Some(secs) = self.trim_start {
            metadata.trim_start = seconds::from_secs(secs)
                .with_context(|| format!("Invalid trim start: {secs}"))?;
        }
        if let Some(secs) = self.trim_end {
            metadata.trim_end = seconds::from_secs(secs)
                .with_context(|| format!("Invalid trim end: {secs}"))?;
        }
        if let Some(views) = self.views {
            metadata.view_count = views;
        }

        debug!("Using metadata: {:?}", metadata);
        Ok(metadata)
    }
}
