//! The identifier value type used throughout the pipelines.
//!
//! A `MangaAttributes` pins down one page of one chapter of one series and
//! derives every path and URL the downloader needs from it. Values are built
//! per operation call and never persisted.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::helpers::to_n_digits;
use crate::models::ImageFormat;
use crate::website;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MangaAttributes {
    pub manga: String,
    pub chapter: String,
    pub page: String,
}

impl MangaAttributes {
    pub fn new(manga: &str, chapter: &str, page: &str) -> Self {
        Self {
            manga: manga.to_string(),
            chapter: chapter.to_string(),
            page: page.to_string(),
        }
    }

    /// Identifier of a whole series; chapter and page default to "0".
    pub fn series(manga: &str) -> Self {
        Self::new(manga, "0", "0")
    }

    /// Same identifier pointing at another page of the chapter.
    pub fn with_page(&self, page: usize) -> Self {
        Self::new(&self.manga, &self.chapter, &page.to_string())
    }

    /// Parse a reader link of the form
    /// `https://{host}/lecture-en-ligne/{series}/{chapter}/{page}.html`.
    /// The page segment defaults to "1" when absent, which makes this safe to
    /// call on chapter links that omit the page.
    pub fn from_link(link: &str) -> Self {
        let parts: Vec<&str> = link.split('/').collect();
        let manga = parts.get(4).copied().unwrap_or_default();
        let chapter = match parts.get(5) {
            Some(c) if !c.is_empty() => c,
            _ => "0",
        };
        let page = match parts.get(6) {
            Some(p) if !p.is_empty() => p.trim_end_matches(".html"),
            _ => "1",
        };
        Self::new(manga, chapter, page)
    }

    /// Canonical chapter reader URL on the given origin.
    pub fn reader_link(&self, website: &str) -> String {
        format!(
            "{}/{}/{}/{}/",
            website.trim_end_matches('/'),
            website::READER_PATH,
            self.manga,
            self.chapter
        )
    }

    /// Canonical series index URL on the given origin.
    pub fn index_link(&self, website: &str) -> String {
        format!(
            "{}/{}/{}/",
            website.trim_end_matches('/'),
            website::SERIES_PATH,
            self.manga
        )
    }

    /// Chapter folder segment, zero-padded so lexical order matches reading
    /// order. Volume-tagged chapters keep their prefix with a 3-digit number.
    fn padded_chapter(&self) -> String {
        match self.chapter.strip_prefix("volume-") {
            Some(n) => format!("volume-{}", to_n_digits(n, 3)),
            None => to_n_digits(&self.chapter, 4),
        }
    }

    /// On-disk folder for this chapter under the output root.
    pub fn folder_path(&self, output: &Path) -> PathBuf {
        output.join(&self.manga).join(self.padded_chapter())
    }

    /// Filename of this page image: `{chapter:4}_{page:3}.{ext}`.
    pub fn filename(&self, format: ImageFormat) -> String {
        format!(
            "{}_{}.{}",
            self.padded_chapter(),
            to_n_digits(&self.page, 3),
            format.extension()
        )
    }

    /// Full image path: folder plus filename.
    pub fn image_path(&self, output: &Path, format: ImageFormat) -> PathBuf {
        self.folder_path(output).join(self.filename(format))
    }
}

impl fmt::Display for MangaAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} page {}", self.manga, self.chapter, self.page)
    }
}
