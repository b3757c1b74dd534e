//! Sitemap walker.
//!
//! Fetches the portal's root sitemap index, follows each child sitemap, and
//! collects the listing page URLs. A failure on any single sitemap is logged
//! and that sitemap's URLs are omitted; only an unreachable root aborts the
//! walk.

use std::collections::HashSet;
use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Path marker identifying listing pages among sitemap entries.
const LISTING_MARKER: &str = "/imovel/";

/// Service walking the two-level sitemap structure.
pub struct SitemapWalker {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl SitemapWalker {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.sitemap_timeout_secs),
        }
    }

    /// Walk the sitemap tree and return deduplicated listing URLs, in
    /// first-seen order.
    pub async fn discover(&self) -> Result<Vec<String>> {
        let index_url = format!("{}/sitemap.xml", self.base_url);
        let index_xml = self
            .fetch_xml(&index_url)
            .await
            .map_err(|e| AppError::sitemap(format!("root sitemap {index_url}: {e}")))?;

        let children = parse_sitemap_index(&index_xml);
        log::info!("Sitemap index lists {} child sitemaps", children.len());

        let mut seen = HashSet::new();
        let mut listing_urls = Vec::new();

        // The root may also be a plain urlset with no children.
        if children.is_empty() {
            Self::collect_listings(&index_xml, &mut seen, &mut listing_urls);
        }

        for child_url in &children {
            match self.fetch_xml(child_url).await {
                Ok(xml) => Self::collect_listings(&xml, &mut seen, &mut listing_urls),
                Err(e) => {
                    log::warn!("Skipping sitemap {child_url}: {e}");
                }
            }
        }

        log::info!("Discovered {} listing URLs", listing_urls.len());
        Ok(listing_urls)
    }

    fn collect_listings(xml: &str, seen: &mut HashSet<String>, out: &mut Vec<String>) {
        for url in parse_urlset(xml) {
            if url.contains(LISTING_MARKER) && seen.insert(url.clone()) {
                out.push(url);
            }
        }
    }

    async fn fetch_xml(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Extract child sitemap locations from a sitemap-index document.
pub fn parse_sitemap_index(xml: &str) -> Vec<String> {
    collect_locs(xml, "sitemap")
}

/// Extract leaf page locations from a urlset document.
pub fn parse_urlset(xml: &str) -> Vec<String> {
    collect_locs(xml, "url")
}

/// Collect `<loc>` text inside the given container element, ignoring
/// namespaces. Malformed XML yields as many locations as were parsed before
/// the error.
fn collect_locs(xml: &str, container: &str) -> Vec<String> {
    let mut locs = Vec::new();
    let mut in_container = false;
    let mut in_loc = false;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if name == container {
                    in_container = true;
                } else if in_container && name == "loc" {
                    in_loc = true;
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_loc {
                    let text = e.unescape().unwrap_or_default().trim().to_string();
                    if !text.is_empty() {
                        locs.push(text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if name == container {
                    in_container = false;
                } else if name == "loc" {
                    in_loc = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parse error in sitemap: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    locs
}

/// Element name with any namespace prefix stripped.
fn local_name(name: &[u8]) -> &str {
    let name = std::str::from_utf8(name).unwrap_or("");
    name.rsplit(':').next().unwrap_or(name)
}
