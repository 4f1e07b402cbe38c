//! Video URL parsing and synthesis (watch, embed, thumbnail).

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use learngen_shared::{LearnGenError, Result, Thumbnails};

const WATCH_BASE: &str = "https://www.youtube.com/watch?v=";
const EMBED_BASE: &str = "https://www.youtube.com/embed/";
const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

/// Canonical video ids are 11 URL-safe base64 characters.
static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Video ids
// ---------------------------------------------------------------------------

/// Extract the video id from a YouTube URL.
///
/// Recognizes `youtube.com/watch?v=<id>`, `youtu.be/<id>`, and the
/// `/embed/`, `/shorts/`, `/live/`, `/v/` path forms. Anything else,
/// including a well-formed URL on another host, yields `None`.
pub fn extract_video_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let lowered = url.host_str()?.to_ascii_lowercase();
    let host = lowered
        .strip_prefix("www.")
        .or_else(|| lowered.strip_prefix("m."))
        .unwrap_or(&lowered);

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    is_video_id(&candidate).then_some(candidate)
}

/// Whether `id` has the shape of a video id.
pub fn is_video_id(id: &str) -> bool {
    VIDEO_ID.is_match(id)
}

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_BASE}{video_id}")
}

pub fn embed_url(video_id: &str) -> String {
    format!("{EMBED_BASE}{video_id}")
}

// ---------------------------------------------------------------------------
// Thumbnails
// ---------------------------------------------------------------------------

/// Thumbnail resolutions published for every video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThumbnailQuality {
    /// 120x90
    Default,
    /// 320x180
    Medium,
    /// 480x360
    #[default]
    High,
    /// 640x480
    Standard,
    /// 1280x720, not available for every upload.
    Maxres,
}

impl ThumbnailQuality {
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::Medium,
        Self::High,
        Self::Standard,
        Self::Maxres,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Standard => "standard",
            Self::Maxres => "maxres",
        }
    }

    fn file_stem(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Medium => "mqdefault",
            Self::High => "hqdefault",
            Self::Standard => "sddefault",
            Self::Maxres => "maxresdefault",
        }
    }
}

impl std::fmt::Display for ThumbnailQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThumbnailQuality {
    type Err = LearnGenError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == wanted || q.file_stem() == wanted)
            .ok_or_else(|| {
                LearnGenError::validation(format!(
                    "unknown thumbnail quality {s:?} (expected default, medium, high, standard, or maxres)"
                ))
            })
    }
}

/// Conventional thumbnail location for `video_id` at `quality`.
pub fn thumbnail_url(video_id: &str, quality: ThumbnailQuality) -> String {
    format!("{THUMBNAIL_BASE}/{video_id}/{}.jpg", quality.file_stem())
}

/// All thumbnail URLs for a video.
pub fn thumbnails(video_id: &str) -> Thumbnails {
    Thumbnails {
        default: thumbnail_url(video_id, ThumbnailQuality::Default),
        medium: thumbnail_url(video_id, ThumbnailQuality::Medium),
        high: thumbnail_url(video_id, ThumbnailQuality::High),
        standard: thumbnail_url(video_id, ThumbnailQuality::Standard),
        maxres: thumbnail_url(video_id, ThumbnailQuality::Maxres),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn url_variants_yield_the_same_id() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ?si=abc",
            "http://youtu.be/dQw4w9WgXcQ?t=42",
            "  https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ  ",
        ] {
            assert_eq!(extract_video_id(url).as_deref(), Some(ID), "url: {url}");
        }
    }

    #[test]
    fn other_shapes_yield_none() {
        for url in [
            "https://example.com/invalid",
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/channel/UC123",
            "https://youtu.be/",
            "ftp://youtu.be/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
            "",
        ] {
            assert_eq!(extract_video_id(url), None, "url: {url}");
        }
    }

    #[test]
    fn thumbnail_urls_are_deterministic() {
        assert_eq!(
            thumbnail_url(ID, ThumbnailQuality::High),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
        assert_eq!(
            thumbnail_url(ID, ThumbnailQuality::Default),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/default.jpg"
        );
        let all = thumbnails(ID);
        assert!(all.maxres.ends_with("/maxresdefault.jpg"));
        assert!(all.medium.ends_with("/mqdefault.jpg"));
    }

    #[test]
    fn quality_parses_names_and_file_stems() {
        assert_eq!("high".parse::<ThumbnailQuality>().unwrap(), ThumbnailQuality::High);
        assert_eq!(" MAXRES ".parse::<ThumbnailQuality>().unwrap(), ThumbnailQuality::Maxres);
        assert_eq!("mqdefault".parse::<ThumbnailQuality>().unwrap(), ThumbnailQuality::Medium);
        assert!("huge".parse::<ThumbnailQuality>().is_err());
    }

    #[test]
    fn watch_and_embed_urls() {
        assert_eq!(watch_url(ID), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(embed_url(ID), "https://www.youtube.com/embed/dQw4w9WgXcQ");
        assert_eq!(extract_video_id(&watch_url(ID)).as_deref(), Some(ID));
        assert_eq!(extract_video_id(&embed_url(ID)).as_deref(), Some(ID));
    }
}
