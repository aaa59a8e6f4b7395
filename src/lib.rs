//! Manga chapter and volume downloader.
//!
//! Drives a headless browser against the target reader site, resolves the
//! weakly-structured series listing into a volume/chapter tree, and walks a
//! hierarchical download pipeline that reports progress through typed
//! events, skips pages already on disk, and packs finished units into CBZ
//! archives.

pub mod archive;
pub mod attributes;
pub mod browser;
pub mod config;
pub mod downloader;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod fsutil;
pub mod helpers;
pub mod models;
pub mod parser;
pub mod website;

pub use attributes::MangaAttributes;
pub use config::Config;
pub use downloader::{
    ChapterOptions, ChaptersOptions, Downloader, ImageOptions, VolumeOptions,
};
pub use error::{Error, Result};
pub use fetcher::Fetcher;
pub use models::{
    Chapter, CompressStats, ImageFormat, MangaContent, MangaStats, SearchResult, Volume,
    VolumeNumber,
};
