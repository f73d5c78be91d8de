//! Candidate URL filtering.
//!
//! Search result pages link to far more than news: map tiles, account pages,
//! help centres. [`strip_unwanted_urls`] keeps only secure links that avoid
//! every excluded keyword, pulls the first URL out of each href (search
//! engines wrap targets in redirect paths such as `/url?q=https://...`) and
//! cuts tracking parameters at the first `&`.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

/// Keywords that mark a link as non-article.
pub const DEFAULT_EXCLUDE_KEYWORDS: [&str; 5] =
    ["maps", "policies", "preferences", "accounts", "support"];

const SECURE_SCHEME: &str = "https://";

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// Filter and normalize raw hrefs into candidate URLs.
///
/// Hrefs without `https://`, containing any of `exclude` as a substring, or
/// with no parseable URL inside them are dropped. The result holds each URL
/// once, in order of first appearance.
#[instrument(level = "debug", skip_all, fields(hrefs = hrefs.len()))]
pub fn strip_unwanted_urls<S: AsRef<str>>(hrefs: &[S], exclude: &[String]) -> Vec<String> {
    let urls: Vec<String> = hrefs
        .iter()
        .map(|href| href.as_ref())
        .filter(|href: &&str| href.contains(SECURE_SCHEME))
        .filter(|href| !exclude.iter().any(|kw| href.contains(kw.as_str())))
        .filter_map(|href| {
            let Some(found) = URL_PATTERN.find(href) else {
                debug!(%href, "No URL in href; skipping");
                return None;
            };
            let cleaned = found.as_str().split('&').next().unwrap_or_default();
            match Url::parse(cleaned) {
                Ok(_) => Some(cleaned.to_string()),
                Err(e) => {
                    debug!(%href, error = %e, "Malformed URL in href; skipping");
                    None
                }
            }
        })
        .unique()
        .collect();

    debug!(kept = urls.len(), "Filtered candidate URLs");
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        DEFAULT_EXCLUDE_KEYWORDS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scheme_and_keyword_scenario() {
        let hrefs = ["https://a.com/x", "https://support.a.com/y", "ftp://b.com/z"];
        let out = strip_unwanted_urls(&hrefs, &["support".to_string()]);
        assert_eq!(out, vec!["https://a.com/x".to_string()]);
    }

    #[test]
    fn test_excludes_insecure_and_keyword_links() {
        let hrefs = [
            "http://plain.com/article",
            "https://maps.google.com/place",
            "https://www.google.com/preferences?hl=en",
            "https://accounts.google.com/login",
            "https://policies.google.com/privacy",
            "https://finance.yahoo.com/news/oklo-1.html",
        ];
        let out = strip_unwanted_urls(&hrefs, &defaults());
        assert_eq!(out, vec!["https://finance.yahoo.com/news/oklo-1.html".to_string()]);
    }

    #[test]
    fn test_strips_tracking_suffix_from_redirect_href() {
        let hrefs = ["/url?q=https://finance.yahoo.com/news/a.html&sa=U&ved=2ahUKE"];
        let out = strip_unwanted_urls(&hrefs, &defaults());
        assert_eq!(out, vec!["https://finance.yahoo.com/news/a.html".to_string()]);
        assert!(out.iter().all(|u| !u.contains('&')));
    }

    #[test]
    fn test_output_has_no_duplicates() {
        let hrefs = [
            "https://a.com/x&utm=1",
            "https://a.com/x&utm=2",
            "https://a.com/x",
            "https://b.com/y",
        ];
        let out = strip_unwanted_urls(&hrefs, &defaults());
        assert_eq!(out, vec!["https://a.com/x".to_string(), "https://b.com/y".to_string()]);
    }

    #[test]
    fn test_skips_href_without_url_match() {
        // contains the marker but nothing after it that forms a URL
        let hrefs = ["junk https:// trailing", "https://ok.com/a"];
        let out = strip_unwanted_urls(&hrefs, &defaults());
        assert_eq!(out, vec!["https://ok.com/a".to_string()]);
    }

    #[test]
    fn test_skips_match_that_does_not_parse() {
        // the pattern matches, but an unclosed IPv6 host is not a URL
        let hrefs = ["/url?q=https://[::1&sa=U", "https://ok.com/b"];
        let out = strip_unwanted_urls(&hrefs, &defaults());
        assert_eq!(out, vec!["https://ok.com/b".to_string()]);
    }

    #[test]
    fn test_empty_exclude_list_keeps_everything_secure() {
        let hrefs = ["https://support.a.com/y"];
        let out = strip_unwanted_urls(&hrefs, &[]);
        assert_eq!(out, vec!["https://support.a.com/y".to_string()]);
    }
}
