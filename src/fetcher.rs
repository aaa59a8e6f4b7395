//! Page navigation and read-only queries against the site.
//!
//! The fetcher owns the browser session handle and the retry policy. It
//! resolves the volume/chapter tree fresh on every query; nothing is cached
//! between calls, so a listing that changed mid-session is picked up by the
//! next query.

use std::path::PathBuf;
use std::sync::Arc;

use crate::attributes::MangaAttributes;
use crate::browser::{BrowserPage, BrowserSession, PageOptions, ReaderMode, RequestPolicy};
use crate::config::{Config, Flags, NavigationConfig};
use crate::error::{Error, Result};
use crate::models::{Chapter, MangaContent, MangaStats, SearchResult, VolumeNumber};
use crate::parser;
use crate::website;

#[derive(Clone)]
pub struct Fetcher {
    session: Arc<dyn BrowserSession>,
    pub website: String,
    pub output_directory: PathBuf,
    pub flags: Flags,
    navigation: NavigationConfig,
    http: reqwest::Client,
}

impl Fetcher {
    pub fn new(session: Arc<dyn BrowserSession>, config: &Config, website: impl Into<String>) -> Self {
        Self {
            session,
            website: website.into(),
            output_directory: PathBuf::from(&config.output_directory),
            flags: config.flags,
            navigation: config.navigation,
            http: reqwest::Client::new(),
        }
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Refresh the site origin from the published address file. Failure is
    /// not fatal; the current origin is kept.
    pub async fn fix_current_website(&mut self) {
        match website::current_address(&self.http).await {
            Ok(address) => {
                log::info!("using site address {}", address);
                self.website = address;
            }
            Err(e) => {
                log::warn!("could not refresh site address, keeping {}: {}", self.website, e);
            }
        }
    }

    /// Query the site's live-search endpoint. Goes over plain HTTP, no
    /// browser page involved.
    pub async fn search_manga(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/live-search/", self.website.trim_end_matches('/'));
        let results = self
            .http
            .post(&url)
            .form(&[("search", query)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<SearchResult>>()
            .await?;
        Ok(results)
    }

    /// Open a page and navigate it to `link`. Fast mode installs the request
    /// filter before navigation so the aborts apply from the first load.
    pub async fn create_page(
        &self,
        link: &str,
        reader: Option<ReaderMode>,
    ) -> Result<Box<dyn BrowserPage>> {
        let options = PageOptions {
            policy: self.flags.fast.then(|| RequestPolicy::new(link)),
            reader,
        };
        let page = self.session.new_page(options).await?;
        if let Err(e) = self.goto_with_retry(page.as_ref(), link).await {
            let _ = page.close().await;
            return Err(e);
        }
        Ok(page)
    }

    /// Navigate with exponential backoff, bounded by the configured retry
    /// budget. Exhaustion surfaces the last browser error as the cause.
    async fn goto_with_retry(&self, page: &dyn BrowserPage, url: &str) -> Result<()> {
        let mut attempt = 0;
        loop {
            match page.goto(url).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.navigation.max_retries => {
                    let delay = self.navigation.retry_delay(attempt);
                    log::warn!(
                        "navigation to {} failed (attempt {}), retrying in {:?}: {}",
                        url,
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(Error::NavigationFailed {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        source: e,
                    });
                }
            }
        }
    }

    /// Resolve the volume/chapter tree of a series.
    pub async fn fetch_manga_content(&self, manga: &str) -> Result<MangaContent> {
        let link = MangaAttributes::series(manga).index_link(&self.website);
        let page = self.create_page(&link, None).await?;
        let result = self.fetch_manga_content_with(page.as_ref(), manga).await;
        let _ = page.close().await;
        result
    }

    /// Same, on a caller-supplied page. The page is navigated to the series
    /// index only when it is not already there, and is never closed here.
    pub async fn fetch_manga_content_with(
        &self,
        page: &dyn BrowserPage,
        manga: &str,
    ) -> Result<MangaContent> {
        let link = MangaAttributes::series(manga).index_link(&self.website);
        if page.url() != link {
            self.goto_with_retry(page, &link).await?;
        }
        if !page.wait_for_selector(website::CHAPTERS_LIST_SELECTOR).await? {
            return Err(Error::StructureNotFound(manga.to_string()));
        }
        let html = page.content().await?;
        parser::parse_manga_content(&html, manga, &self.website)
    }

    /// Summary numbers for a series. The chapter count is the numeric value
    /// of the newest chapter, not the number of entries.
    pub async fn fetch_stats(&self, manga: &str) -> Result<MangaStats> {
        let content = self.fetch_manga_content(manga).await?;
        let chapters = content
            .volumes
            .last()
            .and_then(|v| v.chapters.last())
            .map(|c| MangaAttributes::from_link(&c.link).chapter)
            .and_then(|c| c.parse::<f64>().ok())
            .unwrap_or(0.0);
        Ok(MangaStats {
            volumes: content.volumes.len(),
            chapters,
            name: content.manga.clone(),
            display: content.display.clone(),
            synopsis: content.synopsis,
        })
    }

    /// Chapters of one volume, oldest first.
    ///
    /// A volume listed right after its predecessor without a number yet is
    /// still reachable: when the exact number is absent but volume `n - 1`
    /// exists and is followed by an unknown volume, that unknown volume is
    /// taken to be `n`.
    pub async fn fetch_volume_chapters(&self, manga: &str, volume: u32) -> Result<Vec<Chapter>> {
        let content = self.fetch_manga_content(manga).await?;
        let wanted = volume as f64;

        if let Some(v) = content
            .volumes
            .iter()
            .find(|v| v.number.as_f64() == Some(wanted))
        {
            return Ok(v.chapters.clone());
        }

        if volume > 0 {
            let previous = (volume - 1) as f64;
            let position = content
                .volumes
                .iter()
                .position(|v| v.number.as_f64() == Some(previous));
            if let Some(i) = position {
                if let Some(next) = content.volumes.get(i + 1) {
                    if next.number == VolumeNumber::Unknown {
                        return Ok(next.chapters.clone());
                    }
                }
            }
        }

        Err(Error::VolumeNotFound {
            series: manga.to_string(),
            volume,
        })
    }

    /// Chapters whose numeric value falls inside `[start, end]`, oldest
    /// first. Chapters that do not parse to a number are excluded.
    pub async fn fetch_chapters_between_range(
        &self,
        manga: &str,
        start: f64,
        end: f64,
    ) -> Result<Vec<Chapter>> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        let content = self.fetch_manga_content(manga).await?;
        Ok(content
            .all_chapters()
            .filter(|c| {
                MangaAttributes::from_link(&c.link)
                    .chapter
                    .parse::<f64>()
                    .map(|n| n >= start && n <= end)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    pub async fn fetch_chapter_links_between_range(
        &self,
        manga: &str,
        start: f64,
        end: f64,
    ) -> Result<Vec<String>> {
        let chapters = self.fetch_chapters_between_range(manga, start, end).await?;
        Ok(chapters.into_iter().map(|c| c.link).collect())
    }

    /// Number of pages in the chapter behind `link`.
    pub async fn fetch_number_of_pages(&self, link: &str) -> Result<usize> {
        let page = self.create_page(link, None).await?;
        let result = self.number_of_pages_on(page.as_ref(), link).await;
        let _ = page.close().await;
        result
    }

    /// Same, on an already-open reader page.
    pub async fn number_of_pages_on(&self, page: &dyn BrowserPage, link: &str) -> Result<usize> {
        if !page.wait_for_selector(website::PAGES_SELECTOR).await? {
            return Err(Error::PaginationNotFound(link.to_string()));
        }
        let html = page.content().await?;
        parser::count_pages(&html).ok_or_else(|| Error::PaginationNotFound(link.to_string()))
    }

    /// Content-CDN images currently present on an open reader page.
    pub async fn images_on_page(&self, page: &dyn BrowserPage) -> Result<Vec<String>> {
        let html = page.content().await?;
        Ok(parser::images_on_page(&html))
    }

    /// Whether the series is published as a webtoon.
    pub async fn is_webtoon(&self, manga: &str) -> Result<bool> {
        let link = MangaAttributes::series(manga).index_link(&self.website);
        let page = self.create_page(&link, None).await?;
        let result = page.content().await;
        let _ = page.close().await;
        Ok(parser::is_webtoon_marker(&result?))
    }
}
