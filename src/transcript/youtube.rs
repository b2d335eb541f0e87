//! YouTube captions via yt-dlp.

use super::{parse_vtt, Transcript, TranscriptSource};
use crate::config::Settings;
use crate::error::{GistError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

fn video_id_regex() -> &'static Regex {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    VIDEO_ID.get_or_init(|| {
        // Matches various YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/|youtube\.com/live/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("video id regex is valid")
    })
}

/// Extract a video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if let Some(caps) = video_id_regex().captures(input) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            return Some(m.as_str().to_string());
        }
    }

    // watch URLs with `v` after other query parameters
    let url = url::Url::parse(input).ok()?;
    if !url.host_str()?.ends_with("youtube.com") {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| id.len() == 11)
}

/// Transcript source that downloads YouTube captions with yt-dlp.
pub struct YoutubeTranscripts {
    ytdlp_path: String,
    language: String,
    temp_dir: PathBuf,
}

impl YoutubeTranscripts {
    pub fn new(ytdlp_path: &str, language: &str, temp_dir: PathBuf) -> Self {
        Self {
            ytdlp_path: ytdlp_path.to_string(),
            language: language.to_string(),
            temp_dir,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.transcript.ytdlp_path,
            &settings.transcript.language,
            settings.temp_dir(),
        )
    }

    /// Download subtitles into `dir` and return the caption file, if any.
    async fn download_captions(&self, video_id: &str, dir: &Path) -> Result<Option<PathBuf>> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let template = dir.join("%(id)s.%(ext)s");
        let languages = format!("{}.*", self.language);

        let output = tokio::process::Command::new(&self.ytdlp_path)
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .args(["--sub-langs", &languages])
            .args(["--sub-format", "vtt"])
            .arg("--no-warnings")
            .arg("-o")
            .arg(&template)
            .arg(&url)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GistError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    GistError::VideoSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("unavailable") || stderr.contains("Private video") {
                return Err(GistError::VideoNotFound(format!(
                    "Video {} not found or unavailable: {}",
                    video_id,
                    stderr.trim()
                )));
            }
            return Err(GistError::VideoSource(format!(
                "yt-dlp failed for {}: {}",
                video_id,
                stderr.trim()
            )));
        }

        Ok(pick_caption_file(dir, video_id, &self.language)?)
    }
}

/// Prefer `<id>.<lang>.vtt`, then any other caption file for the video.
fn pick_caption_file(dir: &Path, video_id: &str, language: &str) -> std::io::Result<Option<PathBuf>> {
    let exact = dir.join(format!("{}.{}.vtt", video_id, language));
    if exact.exists() {
        return Ok(Some(exact));
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "vtt"))
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}

#[async_trait]
impl TranscriptSource for YoutubeTranscripts {
    #[instrument(skip(self))]
    async fn fetch(&self, video: &str) -> Result<Transcript> {
        let video_id = extract_video_id(video).ok_or_else(|| {
            GistError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", video))
        })?;

        std::fs::create_dir_all(&self.temp_dir)?;
        let workdir = tempfile::Builder::new()
            .prefix("captions-")
            .tempdir_in(&self.temp_dir)?;

        let caption_file = self
            .download_captions(&video_id, workdir.path())
            .await?
            .ok_or_else(|| GistError::TranscriptUnavailable(video_id.clone()))?;
        debug!("Using caption file {:?}", caption_file);

        let content = tokio::fs::read_to_string(&caption_file).await?;
        let segments = parse_vtt(&content);
        if segments.is_empty() {
            return Err(GistError::TranscriptUnavailable(video_id));
        }

        info!("Fetched {} caption segments for {}", segments.len(), video_id);
        Ok(Transcript::new(video_id, segments))
    }
}
