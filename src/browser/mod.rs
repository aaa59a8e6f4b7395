//! Headless-browser capability boundary.
//!
//! The pipelines only ever talk to the [`BrowserSession`] and [`BrowserPage`]
//! traits. The Chrome-backed implementation lives in [`chrome`]; tests swap
//! in an in-memory session. Whoever opens a page closes it; a page handed in
//! by a caller is never closed by the callee.

pub mod chrome;
pub mod config;
pub mod policy;

use std::path::Path;

use async_trait::async_trait;

pub use chrome::ChromeSession;
pub use config::BrowserConfig;
pub use policy::RequestPolicy;

/// Errors raised by browser operations.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("browser initialization failed: {0}")]
    Initialization(String),

    #[error("page creation failed: {0}")]
    PageCreation(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("timeout waiting for: {0}")]
    Timeout(String),

    #[error("html extraction error: {0}")]
    HtmlExtraction(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("page close error: {0}")]
    Close(String),
}

/// Reader rendering flavor. Protected readers render pages into a closed
/// shadow-DOM canvas; the session injects the matching unlock script so the
/// image element becomes capturable. The pipelines only pick the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderMode {
    Normal,
    Webtoon,
}

/// Options for opening a page.
#[derive(Default)]
pub struct PageOptions {
    /// Fast-mode request filter, applied before navigation.
    pub policy: Option<RequestPolicy>,
    /// Reader unlock script to install, when targeting a reader page.
    pub reader: Option<ReaderMode>,
}

/// One open page (tab). All operations are cooperative suspension points.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Current URL of the page.
    fn url(&self) -> String;

    /// Navigate and wait for the load to settle. No retry at this level;
    /// bounded retry lives in the fetcher.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Wait for a selector to appear. `Ok(false)` means it never did, which
    /// callers treat as a soft signal rather than an error.
    async fn wait_for_selector(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> Result<String, BrowserError>;

    /// Capture the element matching `selector` as an image file at `path`.
    /// `Ok(false)` when the element never rendered.
    async fn capture_element(&self, selector: &str, path: &Path) -> Result<bool, BrowserError>;

    /// Close the page. Only the component that opened a page closes it.
    async fn close(&self) -> Result<(), BrowserError>;
}

/// A running browser able to open pages.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn new_page(&self, options: PageOptions) -> Result<Box<dyn BrowserPage>, BrowserError>;
}
