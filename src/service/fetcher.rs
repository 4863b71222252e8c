//! Page fetching: the single network stage that materializes a
//! `PageSnapshot` for the evaluators.
//!
//! Everything network-derived is gathered here - page bytes and timing,
//! asset sizes, broken-link sampling, robots.txt, sitemap.xml, and the
//! optional full-site crawl. Evaluators never touch the network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use url::Url;

use crate::domain::{PageSnapshot, SiteCrawl, SpeedStats, TlsInfo};
use crate::error::{AppError, Result};
use crate::extractor::{robots::parse_robots, sitemap::parse_sitemap, PageExtractor};
use crate::service::http::create_client;

/// Fallback size estimates (KB) when an asset HEAD gives no content-length.
const IMAGE_FALLBACK_KB: f64 = 30.0;
const CSS_FALLBACK_KB: f64 = 50.0;
const JS_FALLBACK_KB: f64 = 100.0;

/// Images above this reported size count as oversized.
const LARGE_IMAGE_KB: f64 = 100.0;

/// How many internal links get a liveness check per run.
const BROKEN_LINK_SAMPLE: usize = 5;

/// How many image assets get a size check per run.
const IMAGE_SIZE_SAMPLE: usize = 10;

/// Full-site crawl bounds.
const CRAWL_MAX_PAGES: usize = 50;
const CRAWL_MAX_DEPTH: usize = 3;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub full_site_analysis: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            full_site_analysis: false,
        }
    }
}

/// Seam between the pipeline and the network, swappable in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<PageSnapshot>;
}

pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(timeout)?,
        })
    }

    async fn fetch_page(&self, url: &Url) -> Result<(PageSnapshot, Vec<String>)> {
        log::info!("[FETCH] GET {}", url);
        let started = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::fetch(format!("Request to {} failed: {}", url, e)))?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            return Err(AppError::fetch(format!(
                "{} returned HTTP {}",
                url, status_code
            )));
        }

        let has_hsts = response.headers().contains_key("strict-transport-security");
        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(format!("Reading body of {} failed: {}", url, e)))?;
        let load_time_ms = started.elapsed().as_millis() as u64;
        let html_kb = body.len() as f64 / 1024.0;

        let extracted = PageExtractor::extract(&body, url);

        let image_size_kb = self
            .sum_asset_sizes(&extracted.assets.images, IMAGE_FALLBACK_KB, IMAGE_SIZE_SAMPLE)
            .await;
        let css_size_kb = self
            .sum_asset_sizes(&extracted.assets.css, CSS_FALLBACK_KB, usize::MAX)
            .await;
        let js_size_kb = self
            .sum_asset_sizes(&extracted.assets.js, JS_FALLBACK_KB, usize::MAX)
            .await;

        let oversized = self
            .count_oversized_images(&extracted.assets.images)
            .await;

        let mut images = extracted.images;
        images.oversized = oversized;

        let mut links = extracted.links;
        links.broken = self.count_broken_links(&links.internal).await;

        let snapshot = PageSnapshot {
            url: url.clone(),
            status_code,
            speed: SpeedStats {
                load_time_ms,
                total_size_kb: html_kb + image_size_kb + css_size_kb + js_size_kb,
                image_size_kb,
                css_size_kb,
                js_size_kb,
            },
            mobile: extracted.mobile,
            meta: extracted.meta,
            headings: extracted.headings,
            images,
            links,
            tls: TlsInfo {
                https: url.scheme() == "https",
                days_to_expiry: None,
                has_hsts,
                mixed_content: extracted.mixed_content,
                cert_check_failed: false,
            },
            social: extracted.social,
            content: extracted.content,
            robots: Default::default(),
            sitemap: Default::default(),
            site: None,
        };

        let internal = snapshot.links.internal.clone();
        Ok((snapshot, internal))
    }

    /// Sum reported sizes of a sampled asset set, estimating when a HEAD
    /// fails or carries no content-length.
    async fn sum_asset_sizes(&self, urls: &[String], fallback_kb: f64, sample: usize) -> f64 {
        let mut total = 0.0;
        for url in urls.iter().take(sample) {
            total += self.asset_size_kb(url).await.unwrap_or(fallback_kb);
        }
        // Unsampled assets get the estimate too.
        total + urls.len().saturating_sub(sample) as f64 * fallback_kb
    }

    async fn asset_size_kb(&self, url: &str) -> Option<f64> {
        let response = self.client.head(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .parse::<f64>()
            .ok()
            .map(|bytes| bytes / 1024.0)
    }

    async fn count_oversized_images(&self, urls: &[String]) -> usize {
        let mut oversized = 0;
        for url in urls.iter().take(IMAGE_SIZE_SAMPLE) {
            if let Some(kb) = self.asset_size_kb(url).await {
                if kb > LARGE_IMAGE_KB {
                    oversized += 1;
                }
            }
        }
        oversized
    }

    /// HEAD the first few internal links and count the dead ones.
    async fn count_broken_links(&self, internal: &[String]) -> usize {
        let mut broken = 0;
        for link in internal.iter().take(BROKEN_LINK_SAMPLE) {
            let alive = match self.client.head(link).send().await {
                Ok(response) => !response.status().is_client_error(),
                Err(_) => false,
            };
            if !alive {
                log::info!("[FETCH] Broken link: {}", link);
                broken += 1;
            }
        }
        broken
    }

    async fn fetch_text(&self, url: Url) -> Option<String> {
        let response = self.client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }

    /// Bounded breadth-first crawl of same-host pages, collecting the
    /// site-wide counts the linking/heading/meta evaluators use.
    async fn crawl_site(&self, start: &Url, start_links: &[String]) -> SiteCrawl {
        log::info!("[DISCOVERY] Crawling {} (max {} pages)", start, CRAWL_MAX_PAGES);

        let mut visited: HashSet<String> = HashSet::new();
        let mut inbound: HashMap<String, usize> = HashMap::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        let mut titles: HashMap<String, usize> = HashMap::new();
        let mut missing_headings = 0;
        let mut deep_links = 0;

        let start_key = normalized_page_key(start);
        visited.insert(start_key.clone());
        for link in start_links {
            *inbound.entry(link.clone()).or_default() += 1;
            queue.push_back((link.clone(), 1));
        }

        while let Some((page_url, depth)) = queue.pop_front() {
            if visited.len() >= CRAWL_MAX_PAGES || depth > CRAWL_MAX_DEPTH {
                continue;
            }
            if !visited.insert(page_url.clone()) {
                continue;
            }

            let Ok(parsed) = Url::parse(&page_url) else {
                continue;
            };
            let Some(body) = self.fetch_text(parsed.clone()).await else {
                continue;
            };

            let page = crawl_page_facts(&body, &parsed);
            if let Some(title) = page.title {
                *titles.entry(title).or_default() += 1;
            }
            if !page.has_heading {
                missing_headings += 1;
            }
            if depth >= CRAWL_MAX_DEPTH {
                deep_links += 1;
            }

            for link in page.internal_links {
                *inbound.entry(link.clone()).or_default() += 1;
                if !visited.contains(&link) {
                    queue.push_back((link, depth + 1));
                }
            }
        }

        let duplicate_titles = titles
            .values()
            .filter(|&&count| count > 1)
            .map(|count| count - 1)
            .sum();
        let orphan_pages = visited
            .iter()
            .filter(|key| **key != start_key)
            .filter(|key| inbound.get(*key).copied().unwrap_or(0) <= 1)
            .count();

        log::info!(
            "[DISCOVERY] Crawled {} pages ({} duplicate titles, {} orphans)",
            visited.len(),
            duplicate_titles,
            orphan_pages
        );

        SiteCrawl {
            pages_crawled: visited.len(),
            duplicate_titles,
            missing_headings,
            orphan_pages,
            deep_links,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<PageSnapshot> {
        let (mut snapshot, internal_links) = self.fetch_page(url).await?;

        let robots_url = url
            .join("/robots.txt")
            .map_err(|e| AppError::fetch(format!("Cannot derive robots.txt URL: {}", e)))?;
        let sitemap_url = url
            .join("/sitemap.xml")
            .map_err(|e| AppError::fetch(format!("Cannot derive sitemap.xml URL: {}", e)))?;

        let (robots_body, sitemap_body) =
            futures::join!(self.fetch_text(robots_url), self.fetch_text(sitemap_url));

        if let Some(body) = robots_body {
            snapshot.robots = parse_robots(&body);
        }
        if let Some(body) = sitemap_body {
            snapshot.sitemap = parse_sitemap(&body, Utc::now());
        }

        if options.full_site_analysis {
            snapshot.site = Some(self.crawl_site(url, &internal_links).await);
        }

        Ok(snapshot)
    }
}

fn normalized_page_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

struct CrawlPageFacts {
    title: Option<String>,
    has_heading: bool,
    internal_links: Vec<String>,
}

/// Light per-page extraction for the crawl (title, headings, links only).
fn crawl_page_facts(html: &str, page_url: &Url) -> CrawlPageFacts {
    let extracted = PageExtractor::extract(html, page_url);
    CrawlPageFacts {
        title: extracted.meta.title,
        has_heading: extracted.headings.h1_count > 0 || extracted.headings.h2_count > 0,
        internal_links: extracted.links.internal,
    }
}
