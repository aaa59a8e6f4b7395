//! Hierarchical download pipelines.
//!
//! Each level delegates downward: a volume range downloads volumes, a volume
//! downloads its chapter list, a chapter downloads pages. Progress events
//! from the inner level are relayed outward through per-call sinks, and
//! compression is decided at the outermost level that asked for it, so a
//! volume archive never also produces per-chapter archives.
//!
//! Per-page failures never abort a chapter: a page whose image never renders
//! is reported as `noimage` and the chapter moves on. Archive failures
//! degrade to zero-valued stats. Structural errors abort the pipeline.
//!
//! Fast mode fans chapters out to a bounded worker pool. Workers buffer
//! their chapter's events and the join step replays them in input order, so
//! observers and archive naming see the same ordering as a sequential run.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::archive::{safe_compress, ArchiveKind};
use crate::attributes::MangaAttributes;
use crate::browser::ReaderMode;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{ChapterEvent, ChaptersEvent, ImageEvent, VolumeEvent, VolumesEvent};
use crate::fetcher::Fetcher;
use crate::fsutil;
use crate::helpers::{format_number, to_n_digits};
use crate::models::ImageFormat;
use crate::website;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOptions {
    /// Re-download the page even when its image already exists on disk.
    pub force_download: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChapterOptions {
    pub force_download: bool,
    pub compression: bool,
    pub delete_after_compression: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChaptersOptions {
    pub force_download: bool,
    pub compression: bool,
    pub delete_after_compression: bool,
    /// Pack the whole range into one archive instead of one per chapter.
    pub compress_as_one: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeOptions {
    pub force_download: bool,
    pub compression: bool,
    pub delete_after_compression: bool,
}

#[derive(Clone)]
pub struct Downloader {
    pub fetcher: Fetcher,
    image_format: ImageFormat,
    fast_workers: usize,
    mock: bool,
}

impl Downloader {
    pub fn new(fetcher: Fetcher, config: &Config) -> Self {
        Self {
            fetcher,
            image_format: config.image_format,
            fast_workers: config.fast_workers.max(1),
            mock: config.flags.mock,
        }
    }

    /// Download one page image from its reader link.
    ///
    /// Emits `start`, then either `done` with the saved path or `noimage`
    /// when the reader never renders an image. A page already on disk is
    /// skipped without opening the browser and still emits `start`/`done`.
    pub async fn download_image(
        &self,
        link: &str,
        options: ImageOptions,
        on_event: &mut (dyn FnMut(ImageEvent) + Send),
    ) -> Result<PathBuf> {
        let attributes = MangaAttributes::from_link(link);
        on_event(ImageEvent::Start {
            attributes: attributes.clone(),
            link: link.to_string(),
        });

        let save_path = fsutil::prepare_image_path(
            &attributes,
            &self.fetcher.output_directory,
            self.image_format,
        )?;
        let wanted = options.force_download || !fsutil::already_downloaded(&save_path);

        if !self.mock && wanted {
            let page = self.fetcher.create_page(link, Some(ReaderMode::Normal)).await?;
            let captured = page
                .capture_element(website::READER_IMAGE_SELECTOR, &save_path)
                .await;
            let captured = match captured {
                Ok(captured) => captured,
                Err(e) => {
                    let _ = page.close().await;
                    return Err(e.into());
                }
            };
            let _ = page.close().await;
            if !captured {
                log::warn!("no image rendered on {}", link);
                on_event(ImageEvent::NoImage {
                    attributes,
                    link: link.to_string(),
                });
                return Ok(save_path);
            }
        }

        on_event(ImageEvent::Done {
            attributes,
            path: save_path.clone(),
        });
        Ok(save_path)
    }

    /// Download one chapter from its reader link. Returns the chapter folder.
    pub async fn download_chapter_from_link(
        &self,
        link: &str,
        options: ChapterOptions,
        on_event: &mut (dyn FnMut(ChapterEvent) + Send),
    ) -> Result<PathBuf> {
        let attributes = MangaAttributes::from_link(link);

        let page = self.fetcher.create_page(link, Some(ReaderMode::Normal)).await?;
        let inspected = self.inspect_chapter_page(page.as_ref(), link).await;
        let _ = page.close().await;
        let (pages, images) = inspected?;

        on_event(ChapterEvent::Start {
            attributes: attributes.clone(),
            link: link.to_string(),
            pages,
        });

        let folder = attributes.folder_path(&self.fetcher.output_directory);

        if images.len() > 1 {
            // Long-strip chapter: every image is already in the DOM, so the
            // files come straight off the CDN without further navigation.
            self.download_strip(&attributes, &images, options.force_download, on_event)
                .await?;
        } else {
            for i in 1..=pages {
                let page_link = if i == 1 {
                    link.to_string()
                } else {
                    format!("{}{}.html", link, i)
                };
                self.download_image(
                    &page_link,
                    ImageOptions {
                        force_download: options.force_download,
                    },
                    &mut |event| match event {
                        ImageEvent::Done { attributes, path } => {
                            on_event(ChapterEvent::Page {
                                attributes,
                                total: pages,
                                path,
                            });
                        }
                        ImageEvent::NoImage { attributes, link } => {
                            on_event(ChapterEvent::NoImage { attributes, link });
                        }
                        ImageEvent::Start { .. } => {}
                    },
                )
                .await?;
            }
        }

        if options.compression {
            self.compress_chapter(&attributes, &folder, options.delete_after_compression, on_event);
        }

        on_event(ChapterEvent::Done {
            attributes,
            path: folder.clone(),
        });
        Ok(folder)
    }

    /// Download one chapter of a series by number.
    pub async fn download_chapter(
        &self,
        manga: &str,
        chapter: f64,
        options: ChapterOptions,
        on_event: &mut (dyn FnMut(ChapterEvent) + Send),
    ) -> Result<PathBuf> {
        let attributes = MangaAttributes::new(manga, &format_number(chapter), "1");
        let link = attributes.reader_link(&self.fetcher.website);
        self.download_chapter_from_link(&link, options, on_event).await
    }

    /// Download the chapters behind the given reader links, in order.
    /// Returns one folder per chapter.
    pub async fn download_chapters_from_links(
        &self,
        manga: &str,
        links: &[String],
        options: ChaptersOptions,
        on_event: &mut (dyn FnMut(ChaptersEvent) + Send),
    ) -> Result<Vec<PathBuf>> {
        on_event(ChaptersEvent::Start {
            manga: manga.to_string(),
            links: links.to_vec(),
        });

        // An aggregate archive replaces the per-chapter ones.
        let child_compression = options.compression && !options.compress_as_one;
        let child_options = ChapterOptions {
            force_download: options.force_download,
            compression: child_compression,
            delete_after_compression: child_compression && options.delete_after_compression,
        };

        let locations = if self.fetcher.flags.fast && links.len() > 1 {
            self.pooled_chapters(links, child_options, on_event).await?
        } else {
            self.sequential_chapters(links, child_options, on_event).await?
        };

        if options.compression && options.compress_as_one {
            if let (Some(first), Some(last)) = (links.first(), links.last()) {
                let start = MangaAttributes::from_link(first).chapter;
                let end = MangaAttributes::from_link(last).chapter;
                let number = format!("{}-{}", to_n_digits(&start, 4), to_n_digits(&end, 4));
                on_event(ChaptersEvent::Compressing {
                    manga: manga.to_string(),
                    locations: locations.clone(),
                });
                let stats = safe_compress(
                    &self.fetcher.output_directory,
                    manga,
                    ArchiveKind::Chapter,
                    &number,
                    &locations,
                );
                if options.delete_after_compression && !stats.is_failure() {
                    fsutil::rm_locations(&locations);
                }
                on_event(ChaptersEvent::Compressed {
                    manga: manga.to_string(),
                    locations: locations.clone(),
                    stats,
                });
            }
        }

        on_event(ChaptersEvent::Done {
            manga: manga.to_string(),
            locations: locations.clone(),
        });
        Ok(locations)
    }

    async fn sequential_chapters(
        &self,
        links: &[String],
        options: ChapterOptions,
        on_event: &mut (dyn FnMut(ChaptersEvent) + Send),
    ) -> Result<Vec<PathBuf>> {
        let total = links.len();
        let mut locations = Vec::with_capacity(total);
        for (i, link) in links.iter().enumerate() {
            let current = i + 1;
            let folder = self
                .download_chapter_from_link(link, options, &mut |event| {
                    relay_chapter_event(event, current, total, on_event)
                })
                .await?;
            locations.push(folder);
            on_event(ChaptersEvent::EndChapter {
                attributes: MangaAttributes::from_link(link),
                current,
                total,
            });
        }
        Ok(locations)
    }

    /// Bounded fan-out for fast mode. Each worker buffers its chapter's
    /// events; the join replays them chapter by chapter in input order.
    async fn pooled_chapters(
        &self,
        links: &[String],
        options: ChapterOptions,
        on_event: &mut (dyn FnMut(ChaptersEvent) + Send),
    ) -> Result<Vec<PathBuf>> {
        let total = links.len();
        let semaphore = Arc::new(Semaphore::new(self.fast_workers));

        let mut handles = Vec::with_capacity(total);
        for link in links {
            let worker = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let link = link.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| Error::Worker("worker pool closed".to_string()))?;
                let mut buffered = Vec::new();
                let folder = worker
                    .download_chapter_from_link(&link, options, &mut |event| buffered.push(event))
                    .await?;
                Ok::<_, Error>((folder, buffered))
            }));
        }

        let mut locations = Vec::with_capacity(total);
        for (i, handle) in handles.into_iter().enumerate() {
            let current = i + 1;
            let (folder, buffered) = handle
                .await
                .map_err(|e| Error::Worker(e.to_string()))??;
            for event in buffered {
                relay_chapter_event(event, current, total, on_event);
            }
            locations.push(folder);
            on_event(ChaptersEvent::EndChapter {
                attributes: MangaAttributes::from_link(&links[i]),
                current,
                total,
            });
        }
        Ok(locations)
    }

    /// Download every chapter of a series whose number falls in
    /// `[start, end]`.
    pub async fn download_chapters(
        &self,
        manga: &str,
        start: f64,
        end: f64,
        options: ChaptersOptions,
        on_event: &mut (dyn FnMut(ChaptersEvent) + Send),
    ) -> Result<Vec<PathBuf>> {
        let links = self
            .fetcher
            .fetch_chapter_links_between_range(manga, start, end)
            .await?;
        self.download_chapters_from_links(manga, &links, options, on_event)
            .await
    }

    /// Download one volume of a series. Returns the chapter folders.
    pub async fn download_volume(
        &self,
        manga: &str,
        volume: u32,
        options: VolumeOptions,
        on_event: &mut (dyn FnMut(VolumeEvent) + Send),
    ) -> Result<Vec<PathBuf>> {
        on_event(VolumeEvent::Start {
            manga: manga.to_string(),
            volume,
        });

        let chapters = self.fetcher.fetch_volume_chapters(manga, volume).await?;
        let links: Vec<String> = chapters.into_iter().map(|c| c.link).collect();
        on_event(VolumeEvent::Chapters {
            links: links.clone(),
        });

        // Chapter-level compression stays off; the volume archives itself.
        let chapters_options = ChaptersOptions {
            force_download: options.force_download,
            ..Default::default()
        };
        let locations = self
            .download_chapters_from_links(manga, &links, chapters_options, &mut |event| {
                match event {
                    ChaptersEvent::StartChapter {
                        attributes,
                        pages,
                        current,
                        total,
                    } => {
                        on_event(VolumeEvent::StartChapter {
                            attributes,
                            pages,
                            current,
                            total,
                        });
                    }
                    ChaptersEvent::Page { attributes, total } => {
                        on_event(VolumeEvent::Page { attributes, total });
                    }
                    ChaptersEvent::NoImage { attributes, link } => {
                        on_event(VolumeEvent::NoImage { attributes, link });
                    }
                    ChaptersEvent::EndChapter {
                        attributes,
                        current,
                        total,
                    } => {
                        on_event(VolumeEvent::EndChapter {
                            attributes,
                            current,
                            total,
                        });
                    }
                    ChaptersEvent::Start { .. }
                    | ChaptersEvent::Compressing { .. }
                    | ChaptersEvent::Compressed { .. }
                    | ChaptersEvent::Done { .. } => {}
                }
            })
            .await?;

        if options.compression {
            on_event(VolumeEvent::Compressing {
                manga: manga.to_string(),
                locations: locations.clone(),
            });
            let stats = safe_compress(
                &self.fetcher.output_directory,
                manga,
                ArchiveKind::Volume,
                &volume.to_string(),
                &locations,
            );
            if options.delete_after_compression && !stats.is_failure() {
                fsutil::rm_locations(&locations);
            }
            on_event(VolumeEvent::Compressed {
                manga: manga.to_string(),
                stats,
            });
        }

        on_event(VolumeEvent::Done {
            manga: manga.to_string(),
            volume,
            locations: locations.clone(),
        });
        Ok(locations)
    }

    /// Download the volumes `start..=end` of a series. Returns the chapter
    /// folders of each volume in order.
    pub async fn download_volumes(
        &self,
        manga: &str,
        start: u32,
        end: u32,
        options: VolumeOptions,
        on_event: &mut (dyn FnMut(VolumesEvent) + Send),
    ) -> Result<Vec<Vec<PathBuf>>> {
        if start > end {
            return Err(Error::InvalidRange {
                start: start as f64,
                end: end as f64,
            });
        }
        let total = end - start + 1;
        on_event(VolumesEvent::Start {
            manga: manga.to_string(),
            start,
            end,
            total,
        });

        let mut all = Vec::with_capacity(total as usize);
        for (i, volume) in (start..=end).enumerate() {
            let index = i as u32 + 1;
            let locations = self
                .download_volume(manga, volume, options, &mut |event| match event {
                    VolumeEvent::Start { manga, volume } => {
                        on_event(VolumesEvent::StartVolume {
                            manga,
                            volume,
                            index,
                            total,
                        });
                    }
                    VolumeEvent::Chapters { links } => {
                        on_event(VolumesEvent::Chapters {
                            volume,
                            index,
                            links,
                        });
                    }
                    VolumeEvent::StartChapter {
                        attributes,
                        pages,
                        current,
                        total,
                    } => {
                        on_event(VolumesEvent::StartChapter {
                            attributes,
                            pages,
                            current,
                            total,
                        });
                    }
                    VolumeEvent::Page { attributes, total } => {
                        on_event(VolumesEvent::Page { attributes, total });
                    }
                    VolumeEvent::NoImage { attributes, link } => {
                        on_event(VolumesEvent::NoImage { attributes, link });
                    }
                    VolumeEvent::EndChapter {
                        attributes,
                        current,
                        total,
                    } => {
                        on_event(VolumesEvent::EndChapter {
                            attributes,
                            current,
                            total,
                        });
                    }
                    VolumeEvent::Compressing { .. }
                    | VolumeEvent::Compressed { .. }
                    | VolumeEvent::Done { .. } => {}
                })
                .await?;
            on_event(VolumesEvent::EndVolume {
                manga: manga.to_string(),
                index,
                total,
                locations: locations.clone(),
            });
            all.push(locations);
        }

        on_event(VolumesEvent::Done {
            manga: manga.to_string(),
            start,
            end,
            locations: all.clone(),
        });
        Ok(all)
    }

    /// Read page count and eagerly-loaded images off an open chapter page.
    async fn inspect_chapter_page(
        &self,
        page: &dyn crate::browser::BrowserPage,
        link: &str,
    ) -> Result<(usize, Vec<String>)> {
        // The reader root showing up late is tolerable; the pagination
        // control is not, it carries the page count.
        let _ = page.wait_for_selector(website::READER_SELECTOR).await?;
        let pages = self.fetcher.number_of_pages_on(page, link).await?;
        let images = self.fetcher.images_on_page(page).await?;
        Ok((pages, images))
    }

    /// Fetch a long-strip chapter's images straight from the CDN.
    async fn download_strip(
        &self,
        attributes: &MangaAttributes,
        images: &[String],
        force_download: bool,
        on_event: &mut (dyn FnMut(ChapterEvent) + Send),
    ) -> Result<()> {
        let total = images.len();
        for (i, image) in images.iter().enumerate() {
            let page_attributes = attributes.with_page(i + 1);
            let path = fsutil::prepare_image_path(
                &page_attributes,
                &self.fetcher.output_directory,
                self.image_format,
            )?;
            let wanted = force_download || !fsutil::already_downloaded(&path);
            if !self.mock && wanted {
                let bytes = self
                    .fetcher
                    .http_client()
                    .get(image)
                    .send()
                    .await?
                    .bytes()
                    .await?;
                tokio::fs::write(&path, &bytes).await?;
            }
            on_event(ChapterEvent::Page {
                attributes: page_attributes,
                total,
                path,
            });
        }
        Ok(())
    }

    fn compress_chapter(
        &self,
        attributes: &MangaAttributes,
        folder: &PathBuf,
        delete_after: bool,
        on_event: &mut (dyn FnMut(ChapterEvent) + Send),
    ) {
        let out = crate::archive::archive_path(
            &self.fetcher.output_directory,
            &attributes.manga,
            ArchiveKind::Chapter,
            &attributes.chapter,
        );
        on_event(ChapterEvent::Compressing {
            attributes: attributes.clone(),
            path: out.clone(),
        });
        let stats = safe_compress(
            &self.fetcher.output_directory,
            &attributes.manga,
            ArchiveKind::Chapter,
            &attributes.chapter,
            std::slice::from_ref(folder),
        );
        if delete_after && !stats.is_failure() {
            fsutil::rm_locations(std::slice::from_ref(folder));
        }
        on_event(ChapterEvent::Compressed {
            attributes: attributes.clone(),
            path: out,
            stats,
        });
    }
}

fn relay_chapter_event(
    event: ChapterEvent,
    current: usize,
    total: usize,
    on_event: &mut (dyn FnMut(ChaptersEvent) + Send),
) {
    match event {
        ChapterEvent::Start { attributes, pages, .. } => {
            on_event(ChaptersEvent::StartChapter {
                attributes,
                pages,
                current,
                total,
            });
        }
        ChapterEvent::Page { attributes, total, .. } => {
            on_event(ChaptersEvent::Page { attributes, total });
        }
        ChapterEvent::NoImage { attributes, link } => {
            on_event(ChaptersEvent::NoImage { attributes, link });
        }
        ChapterEvent::Compressing { .. }
        | ChapterEvent::Compressed { .. }
        | ChapterEvent::Done { .. } => {}
    }
}
