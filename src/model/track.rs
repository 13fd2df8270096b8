use serde::Deserialize;
use crate::resolver::watch_url;

/// A resolved, playable piece of media.
///
/// `stream_url` is issued by the resolver and expires after a short while, it
/// must be handed to the sink right away and never stored for later playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub page_url: String,
    pub stream_url: String,
}

impl Track {
    pub fn new(title: impl ToString, page_url: impl ToString, stream_url: impl ToString) -> Self {
        Self {
            title: title.to_string(),
            page_url: page_url.to_string(),
            stream_url: stream_url.to_string(),
        }
    }
}

/// The subset of the yt-dlp info dictionary we care about.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MediaInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub webpage_url: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub entries: Option<Vec<MediaInfo>>,
    #[serde(default)]
    pub related_videos: Option<Vec<RelatedMedia>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RelatedMedia {
    pub id: Option<String>,
    pub title: Option<String>,
}

impl MediaInfo {
    /// Search results come back as a playlist, the first entry is the match.
    pub fn first_entry(self) -> Option<MediaInfo> {
        match self.entries {
            Some(entries) => entries.into_iter().next(),
            None => Some(self),
        }
    }

    pub fn into_track(self, fallback_page: &str) -> Option<Track> {
        let stream_url = self.url?;

        Some(Track {
            title: self.title.unwrap_or_else(|| "Unknown".to_string()),
            page_url: self.webpage_url.unwrap_or_else(|| fallback_page.to_string()),
            stream_url,
        })
    }

    pub fn first_related_id(&self) -> Option<String> {
        self.related_videos
            .as_ref()
            .and_then(|related| related.iter().find_map(|r| r.id.clone()))
    }

    /// What to look up for autoplay: the first related video, else this page's title.
    pub fn related_query(&self) -> Option<String> {
        match self.first_related_id() {
            Some(id) => Some(watch_url(&id)),
            None => self.title.clone().filter(|title| !title.trim().is_empty()),
        }
    }
}
