//! Small parsing and formatting helpers shared across the crate.

use regex::Regex;

/// Left-pad a number string with zeros up to `digits` characters.
/// Strings already longer than `digits` are returned unchanged.
pub fn to_n_digits(num: &str, digits: usize) -> String {
    let added_zeros = digits.saturating_sub(num.len());
    format!("{}{}", "0".repeat(added_zeros), num)
}

/// Parse the leading decimal number of a string, ignoring anything after it.
/// `"5 : The Fall"` parses to `5.0`, `"12.5"` to `12.5`.
pub fn parse_leading_number(s: &str) -> Option<f64> {
    let re = Regex::new(r"^\d+(\.\d+)?").unwrap();
    re.find(s.trim()).and_then(|m| m.as_str().parse().ok())
}

/// Render a chapter/volume number the short way: `5.0` becomes `"5"`,
/// `12.5` stays `"12.5"`.
pub fn format_number(n: f64) -> String {
    format!("{}", n)
}

/// Resolve an anchor href against the site origin. Hrefs coming out of a
/// parsed document are often root-relative.
pub fn resolve_href(website: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(stripped) = href.strip_prefix('/') {
        format!("{}/{}", website.trim_end_matches('/'), stripped)
    } else {
        format!("{}/{}", website.trim_end_matches('/'), href)
    }
}

/// Human readable byte count for log output.
pub fn bytes_to_size(bytes: u64) -> String {
    const SIZES: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return format!("0 {}", SIZES[0]);
    }
    let i = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let i = i.min(SIZES.len() - 1);
    format!(
        "{} {}",
        (bytes as f64 / 1024f64.powi(i as i32)).round(),
        SIZES[i]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_n_digits_pads() {
        assert_eq!(to_n_digits("7", 4), "0007");
        assert_eq!(to_n_digits("0007", 4), "0007");
        assert_eq!(to_n_digits("12.5", 4), "12.5");
        assert_eq!(to_n_digits("12345", 4), "12345");
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("5 : The Fall"), Some(5.0));
        assert_eq!(parse_leading_number("12.5"), Some(12.5));
        assert_eq!(parse_leading_number("  3"), Some(3.0));
        assert_eq!(parse_leading_number("Extras"), None);
    }

    #[test]
    fn test_format_number_drops_trailing_zero() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(12.5), "12.5");
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(
            resolve_href("https://example.com", "/read/naruto/12/"),
            "https://example.com/read/naruto/12/"
        );
        assert_eq!(
            resolve_href("https://example.com/", "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_bytes_to_size() {
        assert_eq!(bytes_to_size(0), "0 B");
        assert_eq!(bytes_to_size(2048), "2 KB");
    }
}
