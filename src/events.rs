//! Typed progress events for the download pipelines.
//!
//! Each pipeline level has its own event enum; consumers pass a `FnMut` sink
//! into the call they want to observe. Subscription is per invocation, never
//! global. Every unit that emits a `start` is matched by exactly one
//! terminal event for that unit: `done`, or `noimage` at the image level
//! when the reader element never renders.
//!
//! `Event::name` exposes the wire names observers key on: `start`, `page`,
//! `noimage`, `compressing`, `compressed`, `done`, `startchapter`,
//! `endchapter`, `startvolume`, `endvolume`, `chapters`.

use std::path::PathBuf;

use crate::attributes::MangaAttributes;
use crate::models::CompressStats;

/// Progress of a single page-image download.
#[derive(Debug, Clone)]
pub enum ImageEvent {
    Start {
        attributes: MangaAttributes,
        link: String,
    },
    NoImage {
        attributes: MangaAttributes,
        link: String,
    },
    Done {
        attributes: MangaAttributes,
        path: PathBuf,
    },
}

impl ImageEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ImageEvent::Start { .. } => "start",
            ImageEvent::NoImage { .. } => "noimage",
            ImageEvent::Done { .. } => "done",
        }
    }
}

/// Progress of one chapter download.
#[derive(Debug, Clone)]
pub enum ChapterEvent {
    Start {
        attributes: MangaAttributes,
        link: String,
        pages: usize,
    },
    Page {
        attributes: MangaAttributes,
        total: usize,
        path: PathBuf,
    },
    NoImage {
        attributes: MangaAttributes,
        link: String,
    },
    Compressing {
        attributes: MangaAttributes,
        path: PathBuf,
    },
    Compressed {
        attributes: MangaAttributes,
        path: PathBuf,
        stats: CompressStats,
    },
    Done {
        attributes: MangaAttributes,
        path: PathBuf,
    },
}

impl ChapterEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChapterEvent::Start { .. } => "start",
            ChapterEvent::Page { .. } => "page",
            ChapterEvent::NoImage { .. } => "noimage",
            ChapterEvent::Compressing { .. } => "compressing",
            ChapterEvent::Compressed { .. } => "compressed",
            ChapterEvent::Done { .. } => "done",
        }
    }
}

/// Progress of a chapter-range download.
#[derive(Debug, Clone)]
pub enum ChaptersEvent {
    Start {
        manga: String,
        links: Vec<String>,
    },
    StartChapter {
        attributes: MangaAttributes,
        pages: usize,
        current: usize,
        total: usize,
    },
    Page {
        attributes: MangaAttributes,
        total: usize,
    },
    NoImage {
        attributes: MangaAttributes,
        link: String,
    },
    EndChapter {
        attributes: MangaAttributes,
        current: usize,
        total: usize,
    },
    Compressing {
        manga: String,
        locations: Vec<PathBuf>,
    },
    Compressed {
        manga: String,
        locations: Vec<PathBuf>,
        stats: CompressStats,
    },
    Done {
        manga: String,
        locations: Vec<PathBuf>,
    },
}

impl ChaptersEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChaptersEvent::Start { .. } => "start",
            ChaptersEvent::StartChapter { .. } => "startchapter",
            ChaptersEvent::Page { .. } => "page",
            ChaptersEvent::NoImage { .. } => "noimage",
            ChaptersEvent::EndChapter { .. } => "endchapter",
            ChaptersEvent::Compressing { .. } => "compressing",
            ChaptersEvent::Compressed { .. } => "compressed",
            ChaptersEvent::Done { .. } => "done",
        }
    }
}

/// Progress of one volume download.
#[derive(Debug, Clone)]
pub enum VolumeEvent {
    Start {
        manga: String,
        volume: u32,
    },
    Chapters {
        links: Vec<String>,
    },
    StartChapter {
        attributes: MangaAttributes,
        pages: usize,
        current: usize,
        total: usize,
    },
    Page {
        attributes: MangaAttributes,
        total: usize,
    },
    NoImage {
        attributes: MangaAttributes,
        link: String,
    },
    EndChapter {
        attributes: MangaAttributes,
        current: usize,
        total: usize,
    },
    Compressing {
        manga: String,
        locations: Vec<PathBuf>,
    },
    Compressed {
        manga: String,
        stats: CompressStats,
    },
    Done {
        manga: String,
        volume: u32,
        locations: Vec<PathBuf>,
    },
}

impl VolumeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            VolumeEvent::Start { .. } => "start",
            VolumeEvent::Chapters { .. } => "chapters",
            VolumeEvent::StartChapter { .. } => "startchapter",
            VolumeEvent::Page { .. } => "page",
            VolumeEvent::NoImage { .. } => "noimage",
            VolumeEvent::EndChapter { .. } => "endchapter",
            VolumeEvent::Compressing { .. } => "compressing",
            VolumeEvent::Compressed { .. } => "compressed",
            VolumeEvent::Done { .. } => "done",
        }
    }
}

/// Progress of a volume-range download.
#[derive(Debug, Clone)]
pub enum VolumesEvent {
    Start {
        manga: String,
        start: u32,
        end: u32,
        total: u32,
    },
    StartVolume {
        manga: String,
        volume: u32,
        index: u32,
        total: u32,
    },
    Chapters {
        volume: u32,
        index: u32,
        links: Vec<String>,
    },
    StartChapter {
        attributes: MangaAttributes,
        pages: usize,
        current: usize,
        total: usize,
    },
    Page {
        attributes: MangaAttributes,
        total: usize,
    },
    NoImage {
        attributes: MangaAttributes,
        link: String,
    },
    EndChapter {
        attributes: MangaAttributes,
        current: usize,
        total: usize,
    },
    EndVolume {
        manga: String,
        index: u32,
        total: u32,
        locations: Vec<PathBuf>,
    },
    Done {
        manga: String,
        start: u32,
        end: u32,
        locations: Vec<Vec<PathBuf>>,
    },
}

impl VolumesEvent {
    pub fn name(&self) -> &'static str {
        match self {
            VolumesEvent::Start { .. } => "start",
            VolumesEvent::StartVolume { .. } => "startvolume",
            VolumesEvent::Chapters { .. } => "chapters",
            VolumesEvent::StartChapter { .. } => "startchapter",
            VolumesEvent::Page { .. } => "page",
            VolumesEvent::NoImage { .. } => "noimage",
            VolumesEvent::EndChapter { .. } => "endchapter",
            VolumesEvent::EndVolume { .. } => "endvolume",
            VolumesEvent::Done { .. } => "done",
        }
    }
}
