//! Image extraction from listing page HTML.
//!
//! Several independent patterns are scanned (structured-data arrays, `<img>`
//! sources, lazy-load attributes, inline backgrounds, gallery JSON) and their
//! union collected. Candidates must carry a recognized image extension on
//! their path and survive a denylist of known non-content tokens.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::models::ImageConfig;

/// Recognized image file extensions, checked against the URL path only
/// (query string and fragment are ignored).
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

/// URL substrings identifying non-content imagery.
const DENYLIST: &[&str] = &[
    "placeholder",
    "loading",
    "spinner",
    "icon",
    "logo",
    "avatar",
    "profile",
    "thumbnail_",
    "thumb_",
];

/// Lazy-load attributes scanned on `<img>` elements besides `src`.
const LAZY_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original"];

fn json_ld_array_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)"image":\s*\[(.*?)\]"#).expect("valid regex"))
}

fn quoted_image_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)"(https?://[^"]+?\.(?:jpg|jpeg|png|webp|gif))""#).expect("valid regex")
    })
}

fn background_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"background-image:\s*url\(["']?([^"'()]+)["']?\)"#).expect("valid regex")
    })
}

fn gallery_json_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)"(?:image|url)":\s*"([^"]+\.(?:jpg|jpeg|png|webp|gif))""#)
            .expect("valid regex")
    })
}

/// Service extracting candidate media URLs from page HTML.
pub struct ImageExtractor {
    max_per_listing: usize,
}

impl ImageExtractor {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_per_listing: config.max_per_listing,
        }
    }

    /// Scan a page body for media URLs.
    ///
    /// Returns validated absolute URLs in insertion order, truncated to the
    /// per-listing cap.
    pub fn extract(&self, html: &str, page_url: &Url) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        let mut push = |candidate: &str| {
            if let Some(url) = Self::validate(candidate, page_url) {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        };

        // 1. JSON-LD image arrays
        for array in json_ld_array_re().captures_iter(html) {
            for caps in quoted_image_url_re().captures_iter(&array[1]) {
                push(&caps[1].replace("\\\"", ""));
            }
        }

        // 2. <img> sources, including lazy-load attributes
        let document = Html::parse_document(html);
        if let Ok(selector) = Selector::parse("img") {
            for element in document.select(&selector) {
                if let Some(src) = element.value().attr("src") {
                    push(src);
                }
                for attr in LAZY_ATTRS {
                    if let Some(src) = element.value().attr(attr) {
                        push(src);
                    }
                }
            }
        }

        // 3. Inline background-image declarations
        for caps in background_image_re().captures_iter(html) {
            push(caps[1].trim());
        }

        // 4. Gallery JSON fragments
        for caps in gallery_json_re().captures_iter(html) {
            push(&caps[1]);
        }

        urls.truncate(self.max_per_listing);
        urls
    }

    /// Resolve a candidate to an absolute URL and validate it.
    fn validate(candidate: &str, page_url: &Url) -> Option<String> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }

        // Protocol-relative references inherit the page's scheme.
        let absolute = if let Some(rest) = candidate.strip_prefix("//") {
            Url::parse(&format!("{}://{}", page_url.scheme(), rest)).ok()?
        } else if candidate.starts_with("http://") || candidate.starts_with("https://") {
            Url::parse(candidate).ok()?
        } else {
            page_url.join(candidate).ok()?
        };

        absolute.host_str()?;

        let path = absolute.path().to_lowercase();
        if !IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return None;
        }

        let lowered = absolute.as_str().to_lowercase();
        if DENYLIST.iter().any(|token| lowered.contains(token)) {
            return None;
        }

        Some(absolute.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ImageExtractor {
        ImageExtractor::new(&ImageConfig::default())
    }

    fn page_url() -> Url {
        Url::parse("https://chaozao.com.br/imovel/fazenda-em-jatai-goias-cod-a/A").unwrap()
    }

    #[test]
    fn test_extracts_json_ld_array() {
        let html = r#"<script type="application/ld+json">
            {"@type":"Product","image":["https://cdn.chaozao.com.br/p/1.jpg",
            "https://cdn.chaozao.com.br/p/2.webp"]}
        </script>"#;
        let urls = extractor().extract(html, &page_url());
        assert_eq!(
            urls,
            vec![
                "https://cdn.chaozao.com.br/p/1.jpg",
                "https://cdn.chaozao.com.br/p/2.webp"
            ]
        );
    }

    #[test]
    fn test_extracts_img_and_lazy_attrs() {
        let html = r#"
            <img src="/media/a.jpg">
            <img data-src="https://cdn.chaozao.com.br/b.png" src="data:image/gif;base64,x">
        "#;
        let urls = extractor().extract(html, &page_url());
        assert!(urls.contains(&"https://chaozao.com.br/media/a.jpg".to_string()));
        assert!(urls.contains(&"https://cdn.chaozao.com.br/b.png".to_string()));
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_extracts_background_and_gallery() {
        let html = r#"
            <div style="background-image: url('https://cdn.chaozao.com.br/bg.jpeg')"></div>
            <script>var gallery = [{"url": "https://cdn.chaozao.com.br/g.gif"}];</script>
        "#;
        let urls = extractor().extract(html, &page_url());
        assert!(urls.contains(&"https://cdn.chaozao.com.br/bg.jpeg".to_string()));
        assert!(urls.contains(&"https://cdn.chaozao.com.br/g.gif".to_string()));
    }

    #[test]
    fn test_denylist_beats_valid_extension() {
        let html = r#"
            <img src="https://cdn.chaozao.com.br/logo.png">
            <img src="https://cdn.chaozao.com.br/placeholder-card.jpg">
            <img src="https://cdn.chaozao.com.br/real-photo.jpg">
        "#;
        let urls = extractor().extract(html, &page_url());
        assert_eq!(urls, vec!["https://cdn.chaozao.com.br/real-photo.jpg"]);
    }

    #[test]
    fn test_rejects_non_image_extensions_and_query_noise() {
        let html = r#"
            <img src="https://cdn.chaozao.com.br/script.js">
            <img src="https://cdn.chaozao.com.br/photo.jpg?w=1200&fit=crop#main">
        "#;
        let urls = extractor().extract(html, &page_url());
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("https://cdn.chaozao.com.br/photo.jpg"));
    }

    #[test]
    fn test_protocol_relative_gets_page_scheme() {
        let html = r#"<img src="//cdn.chaozao.com.br/p.jpg">"#;
        let urls = extractor().extract(html, &page_url());
        assert_eq!(urls, vec!["https://cdn.chaozao.com.br/p.jpg"]);
    }

    #[test]
    fn test_cap_truncates_output() {
        let config = ImageConfig {
            max_per_listing: 2,
            ..ImageConfig::default()
        };
        let html = r#"
            <img src="https://cdn.chaozao.com.br/1.jpg">
            <img src="https://cdn.chaozao.com.br/2.jpg">
            <img src="https://cdn.chaozao.com.br/3.jpg">
        "#;
        let urls = ImageExtractor::new(&config).extract(html, &page_url());
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_dedup_across_patterns() {
        let html = r#"
            <img src="https://cdn.chaozao.com.br/same.jpg">
            <script>{"image": "https://cdn.chaozao.com.br/same.jpg"}</script>
        "#;
        let urls = extractor().extract(html, &page_url());
        assert_eq!(urls.len(), 1);
    }
}
