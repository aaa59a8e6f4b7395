//! Chrome-backed implementation of the browser capability.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use headless_chrome::browser::tab::RequestPausedDecision;
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::FailRequest;
use headless_chrome::protocol::cdp::Network::ErrorReason;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};

use super::config::BrowserConfig;
use super::policy::RequestPolicy;
use super::{BrowserError, BrowserPage, BrowserSession, PageOptions, ReaderMode};

/// Unlock script for the normal reader: protected pages render into a closed
/// shadow-DOM canvas; re-parenting the canvas into the document makes the
/// reader image capturable.
const NORMAL_READER_SCRIPT: &str = r#"
Element.prototype.__attachShadow = Element.prototype.attachShadow;
Element.prototype.attachShadow = function () {
    const root = this.__attachShadow({ mode: "open" });
    setTimeout(() => {
        const container = root.querySelector("div");
        if (!container) return;
        container.querySelectorAll("canvas").forEach((canvas) => {
            try {
                canvas.getContext("2d").getImageData(0, 0, 0, 0);
            } catch (e) {
                document.body.appendChild(canvas);
            }
        });
    });
    return root;
};
"#;

/// Unlock script for the webtoon reader: keep shadow roots reachable.
const WEBTOON_READER_SCRIPT: &str = r#"
Element.prototype._attachShadow = Element.prototype.attachShadow;
Element.prototype.attachShadow = function () {
    const root = this._attachShadow({ mode: "open" });
    setTimeout(() => {
        this.shadowRoot = root;
    });
    return root;
};
"#;

fn reader_script(mode: ReaderMode) -> &'static str {
    match mode {
        ReaderMode::Normal => NORMAL_READER_SCRIPT,
        ReaderMode::Webtoon => WEBTOON_READER_SCRIPT,
    }
}

/// A running Chrome instance.
pub struct ChromeSession {
    browser: Browser,
    config: BrowserConfig,
}

impl ChromeSession {
    /// Launch a browser with the given configuration.
    pub fn launch(config: BrowserConfig) -> Result<Self, BrowserError> {
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args: Vec<&OsStr> = config
            .chrome_flags
            .iter()
            .map(|f| OsStr::new(f.as_str()))
            .collect();
        if let Some(ref ua) = user_agent_arg {
            args.push(OsStr::new(ua));
        }

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some(config.window_size))
            .args(args)
            .build()
            .map_err(|e| BrowserError::Initialization(e.to_string()))?;
        let browser =
            Browser::new(options).map_err(|e| BrowserError::Initialization(e.to_string()))?;
        Ok(Self { browser, config })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn new_page(&self, options: PageOptions) -> Result<Box<dyn BrowserPage>, BrowserError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| BrowserError::PageCreation(e.to_string()))?;
        tab.set_default_timeout(self.config.timeout());

        if let Some(policy) = options.policy {
            let policy = Arc::new(policy);
            let interceptor = Arc::new(
                move |_transport: Arc<Transport>,
                      _session_id: SessionId,
                      event: RequestPausedEvent| {
                    let request_id = event.params.request_id.clone();
                    if policy.should_abort(&event.params.request.url) {
                        RequestPausedDecision::Fail(FailRequest {
                            request_id,
                            error_reason: ErrorReason::Aborted,
                        })
                    } else {
                        RequestPausedDecision::Continue(None)
                    }
                },
            );
            tab.enable_request_interception(interceptor)
                .map_err(|e| BrowserError::PageCreation(e.to_string()))?;
        }

        if let Some(mode) = options.reader {
            // Registered as a new-document script: each navigation starts a
            // fresh JS context, so a one-off evaluate would patch only
            // about:blank and the reader page would load with pristine
            // prototypes.
            tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
                source: reader_script(mode).to_string(),
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            })
            .map_err(|e| BrowserError::PageCreation(e.to_string()))?;
        }

        Ok(Box::new(ChromePage { tab }))
    }
}

/// One Chrome tab.
pub struct ChromePage {
    tab: Arc<Tab>,
}

#[async_trait]
impl BrowserPage for ChromePage {
    fn url(&self) -> String {
        self.tab.get_url()
    }

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::Navigation(format!("failed to navigate to {}: {}", url, e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::Navigation(format!("navigation timeout for {}: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.tab.wait_for_element(selector).is_ok())
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.tab
            .get_content()
            .map_err(|e| BrowserError::HtmlExtraction(e.to_string()))
    }

    async fn capture_element(&self, selector: &str, path: &Path) -> Result<bool, BrowserError> {
        let element = match self.tab.wait_for_element(selector) {
            Ok(element) => element,
            Err(_) => return Ok(false),
        };
        let data = element
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png)
            .map_err(|e| BrowserError::Capture(e.to_string()))?;
        std::fs::write(path, data)
            .map_err(|e| BrowserError::Capture(format!("failed to save {}: {}", path.display(), e)))?;
        Ok(true)
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.tab
            .close(true)
            .map(|_| ())
            .map_err(|e| BrowserError::Close(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_scripts_patch_attach_shadow() {
        for mode in [ReaderMode::Normal, ReaderMode::Webtoon] {
            assert!(reader_script(mode).contains("Element.prototype.attachShadow = function"));
        }
        assert!(reader_script(ReaderMode::Normal).contains("appendChild(canvas)"));
        assert!(reader_script(ReaderMode::Webtoon).contains("shadowRoot"));
    }
}
