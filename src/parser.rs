//! HTML parsing for series index and reader pages.
//!
//! Everything here is pure: pages are fetched elsewhere and handed in as
//! serialized HTML, which keeps the whole resolver testable against fixtures.
//!
//! The series listing is weakly structured. Volume headings (`h4`) and
//! chapter groups (`.collapse`) are siblings, newest first, and the newest
//! chapters at the top of the page may not have been assigned a volume yet,
//! in which case their group has no heading at all. The resolver detects
//! that case by document order: when the first listing element is a group
//! rather than a heading, the leading group becomes an unknown volume and
//! every later group aligns with the heading one slot back.

use scraper::{Html, Selector};

use crate::error::{Error, Result};
use crate::helpers::{format_number, parse_leading_number, resolve_href};
use crate::models::{Chapter, MangaContent, Volume, VolumeNumber};
use crate::website;

/// Parse a volume heading into its number.
///
/// Headings read `Volume 5`, `Volume 12.5 : Extras` or `Webtoon`. Numbers
/// are normalized through a float round trip so `Volume 5.0` and `Volume 5`
/// collapse to the same value.
pub fn parse_volume_number(text: &str) -> VolumeNumber {
    if text.contains("Webtoon") {
        return VolumeNumber::Webtoon;
    }
    match text.split_once("Volume ") {
        Some((_, rest)) => match parse_leading_number(rest) {
            Some(n) => VolumeNumber::Number(format_number(n)),
            None => VolumeNumber::NotFound,
        },
        None => VolumeNumber::NotFound,
    }
}

/// Parse a series index page into its volume/chapter tree.
///
/// Returns [`Error::StructureNotFound`] when the chapter listing container
/// is absent, which is how a missing or renamed series shows up. Volumes and
/// the chapters inside each volume come back in reading order, oldest first.
pub fn parse_manga_content(html: &str, manga: &str, website: &str) -> Result<MangaContent> {
    let document = Html::parse_document(html);

    let list_selector = Selector::parse(website::CHAPTERS_LIST_SELECTOR).unwrap();
    let list = document
        .select(&list_selector)
        .next()
        .ok_or_else(|| Error::StructureNotFound(manga.to_string()))?;

    let heading_selector = Selector::parse("h4").unwrap();
    let group_selector = Selector::parse(".collapse").unwrap();
    let anchor_selector = Selector::parse("div > a").unwrap();
    let listing_selector = Selector::parse("h4, .collapse").unwrap();

    let headings: Vec<String> = list
        .select(&heading_selector)
        .map(|h| h.text().collect::<String>().trim().to_string())
        .collect();

    // Unassigned newest chapters have a group but no heading above it.
    let volume_missing = list
        .select(&listing_selector)
        .next()
        .map(|first| first.value().name() != "h4")
        .unwrap_or(false);

    let mut volumes = Vec::new();
    for (i, group) in list.select(&group_selector).enumerate() {
        let mut chapters: Vec<Chapter> = group
            .select(&anchor_selector)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                Some(Chapter {
                    name: a.text().collect::<String>().trim().to_string(),
                    link: resolve_href(website, href),
                })
            })
            .collect();
        // newest first on the page, oldest first in the tree
        chapters.reverse();

        if volume_missing && i == 0 {
            volumes.push(Volume {
                name: "Unknown volume".to_string(),
                number: VolumeNumber::Unknown,
                chapters,
            });
            continue;
        }

        let index = if volume_missing { i - 1 } else { i };
        let Some(heading) = headings.get(index) else {
            continue;
        };
        volumes.push(Volume {
            name: heading.clone(),
            number: parse_volume_number(heading),
            chapters,
        });
    }
    volumes.reverse();

    Ok(MangaContent {
        manga: manga.to_string(),
        display: parse_display_name(&document).unwrap_or_else(|| manga.to_string()),
        synopsis: parse_synopsis(&document).unwrap_or_default(),
        volumes,
    })
}

/// Display title of the series. The heading reads `Manga {title}`; the
/// leading word is the media kind, not part of the title.
fn parse_display_name(document: &Html) -> Option<String> {
    let selector = Selector::parse("div.card-body:nth-child(1) > h1:nth-child(1)").unwrap();
    let text = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let mut words = text.split_whitespace();
    words.next()?;
    let rest = words.collect::<Vec<_>>().join(" ");
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

fn parse_synopsis(document: &Html) -> Option<String> {
    let selector = Selector::parse("p.list-group-item").unwrap();
    document
        .select(&selector)
        .next()
        .map(|p| p.text().collect::<String>().trim().to_string())
}

/// Number of pages in a chapter, read off the reader's pagination control.
/// `None` when the control is absent.
pub fn count_pages(html: &str) -> Option<usize> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(website::PAGES_SELECTOR).unwrap();
    document
        .select(&selector)
        .next()
        .map(|pages| pages.child_elements().count())
}

/// Content-CDN image URLs present on a reader page. More than one means the
/// chapter renders as a single long strip instead of paginated images.
pub fn images_on_page(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img").unwrap();
    document
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| src.contains(website::IMAGE_CDN_MARKER))
        .map(|src| src.to_string())
        .collect()
}

/// Whether the series index page carries the webtoon marker.
pub fn is_webtoon_marker(html: &str) -> bool {
    let document = Html::parse_document(html);
    let selector = Selector::parse(".text-danger").unwrap();
    document
        .select(&selector)
        .any(|el| el.text().collect::<String>().trim() == "Webtoon")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEBSITE: &str = "https://www.example.ws";

    fn index_page(listing: &str) -> String {
        format!(
            r#"<html><body>
            <div class="card"><div class="card-body">
                <h1>Manga Naruto</h1>
                <p class="list-group-item"> A ninja story. </p>
            </div></div>
            <div id="chapters_list">{}</div>
            </body></html>"#,
            listing
        )
    }

    #[test]
    fn test_parse_volume_number() {
        assert_eq!(
            parse_volume_number("Volume 5"),
            VolumeNumber::Number("5".into())
        );
        assert_eq!(
            parse_volume_number("Volume 12.5 : Extras"),
            VolumeNumber::Number("12.5".into())
        );
        assert_eq!(parse_volume_number("Webtoon"), VolumeNumber::Webtoon);
        assert_eq!(parse_volume_number("Specials"), VolumeNumber::NotFound);
    }

    #[test]
    fn test_parse_volume_number_normalizes_trailing_zero() {
        assert_eq!(
            parse_volume_number("Volume 5.0"),
            VolumeNumber::Number("5".into())
        );
    }

    #[test]
    fn test_missing_listing_is_structure_not_found() {
        let html = "<html><body><div class='other'></div></body></html>";
        let err = parse_manga_content(html, "naruto", WEBSITE).unwrap_err();
        assert!(matches!(err, Error::StructureNotFound(ref m) if m == "naruto"));
    }

    #[test]
    fn test_parse_aligned_listing() {
        let html = index_page(
            r#"
            <h4>Volume 2</h4>
            <div class="collapse">
                <div><a href="/lecture-en-ligne/naruto/4/">Chapter 4</a></div>
                <div><a href="/lecture-en-ligne/naruto/3/">Chapter 3</a></div>
            </div>
            <h4>Volume 1</h4>
            <div class="collapse">
                <div><a href="/lecture-en-ligne/naruto/2/">Chapter 2</a></div>
                <div><a href="/lecture-en-ligne/naruto/1/">Chapter 1</a></div>
            </div>
            "#,
        );
        let content = parse_manga_content(&html, "naruto", WEBSITE).unwrap();
        assert_eq!(content.display, "Naruto");
        assert_eq!(content.synopsis, "A ninja story.");
        assert_eq!(content.volumes.len(), 2);
        assert_eq!(content.volumes[0].number, VolumeNumber::Number("1".into()));
        assert_eq!(content.volumes[0].chapters[0].name, "Chapter 1");
        assert_eq!(
            content.volumes[0].chapters[0].link,
            "https://www.example.ws/lecture-en-ligne/naruto/1/"
        );
        assert_eq!(content.volumes[1].number, VolumeNumber::Number("2".into()));
        // oldest first within a volume
        assert_eq!(content.volumes[1].chapters[0].name, "Chapter 3");
        assert_eq!(content.volumes[1].chapters[1].name, "Chapter 4");
    }

    #[test]
    fn test_leading_group_without_heading_becomes_unknown_volume() {
        let html = index_page(
            r#"
            <div class="collapse">
                <div><a href="/lecture-en-ligne/naruto/5/">Chapter 5</a></div>
            </div>
            <h4>Volume 1</h4>
            <div class="collapse">
                <div><a href="/lecture-en-ligne/naruto/1/">Chapter 1</a></div>
            </div>
            "#,
        );
        let content = parse_manga_content(&html, "naruto", WEBSITE).unwrap();
        assert_eq!(content.volumes.len(), 2);
        // reversed: assigned volume first, unknown trailing
        assert_eq!(content.volumes[0].number, VolumeNumber::Number("1".into()));
        assert_eq!(content.volumes[1].number, VolumeNumber::Unknown);
        assert_eq!(content.volumes[1].name, "Unknown volume");
        assert_eq!(content.volumes[1].chapters[0].name, "Chapter 5");
    }

    #[test]
    fn test_webtoon_heading() {
        let html = index_page(
            r#"
            <h4>Webtoon</h4>
            <div class="collapse">
                <div><a href="/lecture-en-ligne/tower/1/">Episode 1</a></div>
            </div>
            "#,
        );
        let content = parse_manga_content(&html, "tower", WEBSITE).unwrap();
        assert_eq!(content.volumes[0].number, VolumeNumber::Webtoon);
    }

    #[test]
    fn test_count_pages() {
        let html = r#"<html><body><select id="pages">
            <option>1</option><option>2</option><option>3</option>
        </select></body></html>"#;
        assert_eq!(count_pages(html), Some(3));
        assert_eq!(count_pages("<html><body></body></html>"), None);
    }

    #[test]
    fn test_images_on_page_filters_cdn() {
        let html = r#"<html><body>
            <img src="https://cdn.statically.io/img/c.japscan.ws/naruto/12/1.jpg">
            <img src="https://cdn.statically.io/img/c.japscan.ws/naruto/12/2.jpg">
            <img src="https://www.example.ws/assets/logo.png">
        </body></html>"#;
        let images = images_on_page(html);
        assert_eq!(images.len(), 2);
        assert!(images[0].ends_with("1.jpg"));
    }

    #[test]
    fn test_is_webtoon_marker() {
        let html = r#"<html><body><span class="text-danger"> Webtoon </span></body></html>"#;
        assert!(is_webtoon_marker(html));
        let other = r#"<html><body><span class="text-danger">Coming soon</span></body></html>"#;
        assert!(!is_webtoon_marker(other));
    }
}
