use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// A single chapter entry from the series index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub name: String,
    pub link: String,
}

/// Volume number as displayed by the site. The listing is loose enough that
/// a volume can lack a number entirely, or be a webtoon pseudo-volume.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeNumber {
    Number(String),
    /// An unassigned leading volume listed without a heading. Displayed `?`.
    Unknown,
    Webtoon,
    NotFound,
}

impl VolumeNumber {
    /// Numeric value when the volume carries one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VolumeNumber::Number(n) => n.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for VolumeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeNumber::Number(n) => write!(f, "{}", n),
            VolumeNumber::Unknown => write!(f, "?"),
            VolumeNumber::Webtoon => write!(f, "Webtoon"),
            VolumeNumber::NotFound => write!(f, "notFound"),
        }
    }
}

/// A volume and its chapters, oldest chapter first.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub name: String,
    pub number: VolumeNumber,
    pub chapters: Vec<Chapter>,
}

/// The normalized volume/chapter tree of one series, oldest volume first.
/// Resolved fresh on every call and never cached.
#[derive(Debug, Clone)]
pub struct MangaContent {
    pub manga: String,
    pub display: String,
    pub synopsis: String,
    pub volumes: Vec<Volume>,
}

impl MangaContent {
    /// All chapters across all volumes, in reading order.
    pub fn all_chapters(&self) -> impl Iterator<Item = &Chapter> {
        self.volumes.iter().flat_map(|v| v.chapters.iter())
    }
}

/// Summary numbers for one series.
#[derive(Debug, Clone)]
pub struct MangaStats {
    pub volumes: usize,
    /// Numeric chapter value of the last chapter of the last volume.
    pub chapters: f64,
    pub name: String,
    pub display: String,
    pub synopsis: String,
}

/// One entry of the site's live-search response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub url: String,
}

impl SearchResult {
    /// Series key extracted from the result URL (`/manga/{key}/`). This is
    /// the value the download operations take as their series name.
    pub fn manga(&self) -> Option<&str> {
        self.url.split('/').nth(2).filter(|s| !s.is_empty())
    }
}

/// Outcome of an archive write. Zero values signal a failed archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressStats {
    pub path: PathBuf,
    pub size: u64,
}

impl CompressStats {
    pub fn failed() -> Self {
        Self {
            path: PathBuf::new(),
            size: 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.size == 0
    }
}

/// On-disk format of downloaded page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_number_numeric_value() {
        assert_eq!(VolumeNumber::Number("5".into()).as_f64(), Some(5.0));
        assert_eq!(VolumeNumber::Number("12.5".into()).as_f64(), Some(12.5));
        assert_eq!(VolumeNumber::Unknown.as_f64(), None);
        assert_eq!(VolumeNumber::Webtoon.as_f64(), None);
    }

    #[test]
    fn test_search_result_manga_key() {
        let results: Vec<SearchResult> = serde_json::from_str(
            r#"[{"name": "One Piece", "url": "/manga/one-piece/", "image": "/imgs/one-piece.jpg"}]"#,
        )
        .unwrap();
        assert_eq!(results[0].name, "One Piece");
        assert_eq!(results[0].manga(), Some("one-piece"));

        let odd = SearchResult {
            name: "x".into(),
            url: "/".into(),
        };
        assert_eq!(odd.manga(), None);
    }

    #[test]
    fn test_compress_stats_failure() {
        assert!(CompressStats::failed().is_failure());
        let ok = CompressStats {
            path: PathBuf::from("out.cbz"),
            size: 1024,
        };
        assert!(!ok.is_failure());
    }

    #[test]
    fn test_image_format_extension() {
        assert_eq!(ImageFormat::Jpg.extension(), "jpg");
        assert_eq!(ImageFormat::Png.extension(), "png");
    }
}
