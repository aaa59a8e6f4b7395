//! Fast-mode request filtering.
//!
//! The policy aborts subresource loads that a reader page does not need, and
//! admits at most one content-image response per page. This trades
//! completeness for throughput: pages that lazily load more than one image
//! will come back incomplete, which fast mode accepts by contract.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::website;

/// Subresources that never contribute to the rendered page image.
const BLOCKED_RESOURCES: &[&str] = &[
    "bootstrap",
    "yandex.ru",
    "creepingbrings.com",
    "rusticswollenbelonged",
    "popper.min.js",
    "email-decode.min.js",
    "code.jquery.com",
];

/// Per-page request filter. One instance per opened page: the one-image
/// budget is tracked per page, not per session.
#[derive(Debug)]
pub struct RequestPolicy {
    page_link: String,
    image_loaded: AtomicBool,
}

impl RequestPolicy {
    pub fn new(page_link: impl Into<String>) -> Self {
        Self {
            page_link: page_link.into(),
            image_loaded: AtomicBool::new(false),
        }
    }

    /// Decide whether an outbound request should be aborted.
    pub fn should_abort(&self, url: &str) -> bool {
        // the document itself is always allowed
        if url == self.page_link {
            return false;
        }
        // prefetches of neighboring reader pages
        if url.contains(&format!("/{}/", website::READER_PATH)) {
            return true;
        }
        if BLOCKED_RESOURCES.iter().any(|b| url.contains(b)) {
            return true;
        }
        // one content image per page
        if url.starts_with(website::IMAGE_CDN_PREFIX) {
            return self.image_loaded.swap(true, Ordering::SeqCst);
        }
        // everything else except scripts is noise
        !url.ends_with(".js")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.example.ws/lecture-en-ligne/naruto/12/";

    #[test]
    fn test_page_itself_is_allowed() {
        let policy = RequestPolicy::new(PAGE);
        assert!(!policy.should_abort(PAGE));
    }

    #[test]
    fn test_neighbor_reader_pages_are_aborted() {
        let policy = RequestPolicy::new(PAGE);
        assert!(policy.should_abort("https://www.example.ws/lecture-en-ligne/naruto/13/"));
    }

    #[test]
    fn test_denylist_is_aborted() {
        let policy = RequestPolicy::new(PAGE);
        assert!(policy.should_abort("https://code.jquery.com/jquery.min.js"));
        assert!(policy.should_abort("https://cdn.example.com/bootstrap.min.css"));
    }

    #[test]
    fn test_only_first_content_image_is_allowed() {
        let policy = RequestPolicy::new(PAGE);
        let image = format!("{}naruto/12/1.jpg", website::IMAGE_CDN_PREFIX);
        assert!(!policy.should_abort(&image));
        assert!(policy.should_abort(&image));
        assert!(policy.should_abort(&format!("{}naruto/12/2.jpg", website::IMAGE_CDN_PREFIX)));
    }

    #[test]
    fn test_scripts_pass_everything_else_is_aborted() {
        let policy = RequestPolicy::new(PAGE);
        assert!(!policy.should_abort("https://www.example.ws/assets/reader.js"));
        assert!(policy.should_abort("https://www.example.ws/assets/styles.css"));
        assert!(policy.should_abort("https://tracker.example.net/pixel.gif"));
    }
}
