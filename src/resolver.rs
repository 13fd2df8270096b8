use std::process::Command;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};
use crate::{
    error::{MusicError, MusicResult},
    model::track::{MediaInfo, Track},
};

lazy_static!(
    static ref URL_REGEX: Regex = Regex::new(r"^https?://(?:www\.)?.+").unwrap();
    static ref WATCH_REGEX: Regex = Regex::new(r"^https?://(?:www\.|m\.|music\.)?youtube\.com/watch\?.*?\bv=([\w-]+)").unwrap();
    static ref SHORT_REGEX: Regex = Regex::new(r"^https?://youtu\.be/([\w-]+)").unwrap();
);

pub const AUDIO_FORMAT: &str = "bestaudio[ext=webm]/bestaudio[ext=m4a]/bestaudio/best";

/// Turns free text or a url into playable tracks.
#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Resolves exactly one track, never a playlist.
    async fn resolve(&self, query: &str) -> MusicResult<Track>;

    /// Best effort lookup of a track related to `page_url`, failures yield `None`.
    async fn resolve_related(&self, page_url: &str) -> Option<Track>;
}

/// Rewrites single video urls carrying playlist parameters into their canonical form.
pub fn normalize_query(query: &str) -> String {
    let query = query.trim();

    if let Some(caps) = WATCH_REGEX.captures(query) {
        return watch_url(&caps[1]);
    }

    if let Some(caps) = SHORT_REGEX.captures(query) {
        return watch_url(&caps[1]);
    }

    query.to_string()
}

/// What gets handed to yt-dlp: urls as they are, anything else as a single result search.
pub fn search_target(query: &str) -> String {
    let query = normalize_query(query);

    if URL_REGEX.is_match(&query) {
        query
    } else {
        format!("ytsearch1:{}", query)
    }
}

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

/// Resolver backed by the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: String,
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
        }
    }
}

impl YtDlpResolver {
    pub fn new(program: impl ToString) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Runs yt-dlp on the blocking pool so extraction never stalls other guilds.
    async fn dump(&self, target: String, flat: bool) -> MusicResult<MediaInfo> {
        let program = self.program.clone();
        let query = target.clone();

        let output = tokio::task::spawn_blocking(move || {
            let mut command = Command::new(&program);
            command.args(["--dump-single-json", "--no-playlist", "--no-warnings", "--quiet"]);

            if flat {
                command.arg("--flat-playlist");
            } else {
                command.args(["-f", AUDIO_FORMAT]);
            }

            command.arg("--").arg(&query).output()
        })
        .await
        .map_err(|why| MusicError::Resolution(format!("{} ({})", target, why)))?
        .map_err(|why| MusicError::Resolution(format!("{} ({})", target, why)))?;

        if !output.status.success() {
            debug!("yt-dlp exited with {} for {}: {}", output.status, target, String::from_utf8_lossy(&output.stderr).trim());
            return Err(MusicError::Resolution(target));
        }

        serde_json::from_slice::<MediaInfo>(&output.stdout)
            .map_err(|why| MusicError::Resolution(format!("{} ({})", target, why)))
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> MusicResult<Track> {
        let target = search_target(query);

        let info = self.dump(target.clone(), false).await?;

        info.first_entry()
            .and_then(|entry| entry.into_track(&target))
            .ok_or_else(|| MusicError::Resolution(query.to_string()))
    }

    async fn resolve_related(&self, page_url: &str) -> Option<Track> {
        let info = match self.dump(normalize_query(page_url), true).await {
            Ok(info) => info,
            Err(why) => {
                warn!("Related lookup failed for {}: {}", page_url, why);
                return None;
            }
        };

        let next_query = match info.related_query() {
            Some(query) => query,
            None => {
                debug!("Nothing related to {}", page_url);
                return None;
            }
        };

        match self.resolve(&next_query).await {
            Ok(track) => Some(track),
            Err(why) => {
                warn!("Related track for {} could not be resolved: {}", page_url, why);
                None
            }
        }
    }
}
