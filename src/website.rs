//! Site address discovery and site-specific constants.
//!
//! The target site rotates its domain regularly, so the canonical origin is
//! published out-of-band in a plain-text address file. Callers refresh the
//! origin from there before starting a long download.

use crate::error::Result;

/// Fallback origin used when the address file cannot be reached.
pub const DEFAULT_WEBSITE: &str = "https://www.japscan.ws";

/// Path segment of chapter reader pages: `{website}/lecture-en-ligne/{series}/{chapter}/`.
pub const READER_PATH: &str = "lecture-en-ligne";

/// Path segment of series index pages: `{website}/manga/{series}/`.
pub const SERIES_PATH: &str = "manga";

/// Substring identifying page images hosted on the content CDN.
pub const IMAGE_CDN_MARKER: &str = "c.japscan";

/// Full prefix of content-image requests, used by the fast-mode request filter.
pub const IMAGE_CDN_PREFIX: &str = "https://cdn.statically.io/img/c.japscan.ws/";

/// Selector of the container holding the whole volume/chapter listing.
pub const CHAPTERS_LIST_SELECTOR: &str = "#chapters_list";

/// Selector of the pagination control on a reader page; its child count is
/// the number of pages in the chapter.
pub const PAGES_SELECTOR: &str = "#pages";

/// Selector of the reader root on a chapter page.
pub const READER_SELECTOR: &str = "#single-reader";

/// Selector of the rendered page image inside the reader.
pub const READER_IMAGE_SELECTOR: &str = "#single-reader > img";

/// Plain-text file publishing the site's current origin.
const ADDRESS_SOURCE: &str =
    "https://raw.githubusercontent.com/japdl/japscandl/main/data/address.txt";

/// Fetch the current base origin for the target site.
pub async fn current_address(client: &reqwest::Client) -> Result<String> {
    let text = client.get(ADDRESS_SOURCE).send().await?.text().await?;
    Ok(text.trim().to_string())
}
