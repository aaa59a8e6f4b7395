//! In-memory browser session for pipeline tests.
//!
//! Pages are backed by a URL-to-HTML route table. Selector waits and element
//! captures run real selector queries against the routed document, so a
//! fixture missing the reader image behaves exactly like a page that never
//! rendered one.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mangadl::browser::{BrowserError, BrowserPage, BrowserSession, PageOptions};
use mangadl::{Config, Downloader, Fetcher};

pub const WEBSITE: &str = "https://www.example.ws";

#[derive(Default)]
pub struct MockSession {
    routes: Mutex<HashMap<String, String>>,
    navigations: Arc<AtomicUsize>,
    pages_opened: Arc<AtomicUsize>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: impl Into<String>, html: impl Into<String>) {
        self.routes.lock().unwrap().insert(url.into(), html.into());
    }

    /// Successful navigations across all pages of this session.
    pub fn navigation_count(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn new_page(&self, _options: PageOptions) -> Result<Box<dyn BrowserPage>, BrowserError> {
        self.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            routes: self.routes.lock().unwrap().clone(),
            navigations: Arc::clone(&self.navigations),
            url: Mutex::new(String::new()),
        }))
    }
}

pub struct MockPage {
    routes: HashMap<String, String>,
    navigations: Arc<AtomicUsize>,
    url: Mutex<String>,
}

impl MockPage {
    fn html(&self) -> String {
        let url = self.url.lock().unwrap().clone();
        self.routes.get(&url).cloned().unwrap_or_default()
    }
}

fn selector_matches(html: &str, selector: &str) -> bool {
    let document = scraper::Html::parse_document(html);
    let selector = scraper::Selector::parse(selector).unwrap();
    document.select(&selector).next().is_some()
}

#[async_trait]
impl BrowserPage for MockPage {
    fn url(&self) -> String {
        self.url.lock().unwrap().clone()
    }

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        if !self.routes.contains_key(url) {
            return Err(BrowserError::Navigation(format!("no route for {}", url)));
        }
        *self.url.lock().unwrap() = url.to_string();
        self.navigations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(selector_matches(&self.html(), selector))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Ok(self.html())
    }

    async fn capture_element(&self, selector: &str, path: &Path) -> Result<bool, BrowserError> {
        if !selector_matches(&self.html(), selector) {
            return Ok(false);
        }
        std::fs::write(path, b"captured-image")
            .map_err(|e| BrowserError::Capture(e.to_string()))?;
        Ok(true)
    }

    async fn close(&self) -> Result<(), BrowserError> {
        Ok(())
    }
}

/// Session, downloader and output directory wired together.
pub fn harness(mock: bool) -> (Arc<MockSession>, Downloader, tempfile::TempDir) {
    build_harness(mock, false)
}

/// Same, with fast mode and its worker pool enabled.
pub fn fast_harness() -> (Arc<MockSession>, Downloader, tempfile::TempDir) {
    build_harness(false, true)
}

fn build_harness(mock: bool, fast: bool) -> (Arc<MockSession>, Downloader, tempfile::TempDir) {
    let output = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.output_directory = output.path().to_string_lossy().to_string();
    config.flags.mock = mock;
    config.flags.fast = fast;

    let session = Arc::new(MockSession::new());
    let fetcher = Fetcher::new(session.clone(), &config, WEBSITE);
    let downloader = Downloader::new(fetcher, &config);
    (session, downloader, output)
}

/// Series index page with the given listing inside the chapter container.
pub fn index_html(listing: &str) -> String {
    format!(
        r#"<html><body>
        <div class="card"><div class="card-body">
            <h1>Manga Naruto</h1>
            <p class="list-group-item">A ninja story.</p>
        </div></div>
        <div id="chapters_list">{}</div>
        </body></html>"#,
        listing
    )
}

/// Reader page with `pages` pagination entries and one rendered image.
pub fn reader_html(pages: usize) -> String {
    let options: String = (1..=pages).map(|i| format!("<option>{}</option>", i)).collect();
    format!(
        r#"<html><body>
        <select id="pages">{}</select>
        <div id="single-reader">
            <img src="https://cdn.statically.io/img/c.japscan.ws/naruto/1/1.jpg">
        </div>
        </body></html>"#,
        options
    )
}

/// Reader page whose image never renders.
pub fn reader_html_without_image(pages: usize) -> String {
    let options: String = (1..=pages).map(|i| format!("<option>{}</option>", i)).collect();
    format!(
        r#"<html><body>
        <select id="pages">{}</select>
        <div id="single-reader"></div>
        </body></html>"#,
        options
    )
}

/// Reader page rendered as one long strip of images.
pub fn strip_reader_html(images: usize) -> String {
    let imgs: String = (1..=images)
        .map(|i| {
            format!(
                r#"<img src="https://cdn.statically.io/img/c.japscan.ws/tower/1/{}.jpg">"#,
                i
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <select id="pages"><option>1</option></select>
        <div id="single-reader">{}</div>
        </body></html>"#,
        imgs
    )
}
