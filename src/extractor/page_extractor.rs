//! HTML extraction for the analysis snapshot.
//!
//! Parses a fetched document once and pulls out every measured quantity
//! the evaluators need. Parsing happens inside this module so the
//! non-`Send` `scraper::Html` never crosses an await point.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::OnceLock;
use url::Url;

use crate::domain::{
    ContentStats, HeadingStats, ImageStats, KeywordSources, KeywordStat, LinkStats, MetaInfo,
    MobileStats, SocialTags,
};

/// Sub-resource URLs needing size checks by the fetch collaborator.
#[derive(Debug, Clone, Default)]
pub struct AssetUrls {
    pub images: Vec<String>,
    pub css: Vec<String>,
    pub js: Vec<String>,
}

/// Everything derivable from the HTML alone. Network-derived fields
/// (asset sizes, broken links, robots, sitemap, TLS) are filled in later
/// by the fetcher.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub meta: MetaInfo,
    pub headings: HeadingStats,
    pub images: ImageStats,
    pub links: LinkStats,
    pub mobile: MobileStats,
    pub social: SocialTags,
    pub content: ContentStats,
    /// http:// sub-resources, counted only for https pages.
    pub mixed_content: usize,
    pub assets: AssetUrls,
}

pub struct PageExtractor;

impl PageExtractor {
    /// Parse a document and extract all HTML-derived snapshot fields.
    pub fn extract(html: &str, base_url: &Url) -> ExtractedPage {
        let document = Html::parse_document(html);

        let meta = Self::extract_meta(&document);
        let headings = Self::extract_headings(&document);
        let (images, image_urls) = Self::extract_images(&document, base_url);
        let links = Self::extract_links(&document, base_url);
        let mobile = Self::extract_mobile(&document);
        let social = Self::extract_social(&document);
        let (css, js) = Self::extract_asset_urls(&document, base_url);
        let mixed_content = if base_url.scheme() == "https" {
            Self::count_mixed_content(&document)
        } else {
            0
        };
        let content = Self::extract_content(&document, base_url, &meta, &headings, &links);

        ExtractedPage {
            meta,
            headings,
            images,
            links,
            mobile,
            social,
            content,
            mixed_content,
            assets: AssetUrls {
                images: image_urls,
                css,
                js,
            },
        }
    }

    fn extract_meta(document: &Html) -> MetaInfo {
        static TITLE: OnceLock<Selector> = OnceLock::new();
        static DESCRIPTION: OnceLock<Selector> = OnceLock::new();
        static KEYWORDS: OnceLock<Selector> = OnceLock::new();
        static CANONICAL: OnceLock<Selector> = OnceLock::new();

        let title = document
            .select(TITLE.get_or_init(|| Selector::parse("title").unwrap()))
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty());

        let description = document
            .select(
                DESCRIPTION.get_or_init(|| Selector::parse("meta[name='description']").unwrap()),
            )
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let has_keyword_meta = document
            .select(KEYWORDS.get_or_init(|| Selector::parse("meta[name='keywords']").unwrap()))
            .next()
            .is_some();

        let has_canonical = document
            .select(CANONICAL.get_or_init(|| Selector::parse("link[rel='canonical']").unwrap()))
            .next()
            .is_some();

        MetaInfo {
            title,
            description,
            has_keyword_meta,
            has_canonical,
        }
    }

    fn extract_headings(document: &Html) -> HeadingStats {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector =
            SELECTOR.get_or_init(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());

        let mut h1_count = 0;
        let mut h2_count = 0;
        let mut h3_count = 0;
        let mut h1_texts = Vec::new();
        let mut skipped_levels = 0;
        let mut prev_level = 0u8;

        for element in document.select(selector) {
            let Some(level) = element
                .value()
                .name()
                .trim_start_matches('h')
                .parse::<u8>()
                .ok()
            else {
                continue;
            };

            match level {
                1 => {
                    h1_count += 1;
                    let text = element.text().collect::<String>().trim().to_string();
                    if !text.is_empty() {
                        h1_texts.push(text);
                    }
                }
                2 => h2_count += 1,
                3 => h3_count += 1,
                _ => {}
            }

            // Hierarchy jump, e.g. H1 followed directly by H3.
            if prev_level > 0 && level > prev_level + 1 {
                skipped_levels += 1;
            }
            prev_level = level;
        }

        HeadingStats {
            h1_count,
            h2_count,
            h3_count,
            h1_texts,
            skipped_levels,
        }
    }

    /// Image stats plus resolved src URLs for the size-check pass.
    /// `oversized` stays 0 here; the fetcher fills it from content-length.
    fn extract_images(document: &Html, base_url: &Url) -> (ImageStats, Vec<String>) {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("img").unwrap());

        let mut stats = ImageStats::default();
        let mut urls = Vec::new();

        for img in document.select(selector) {
            stats.total += 1;

            let alt = img.value().attr("alt");
            if alt.map(|a| a.trim().is_empty()).unwrap_or(true) {
                stats.missing_alt += 1;
            }

            if img.value().attr("loading") == Some("lazy") {
                stats.lazy_loaded += 1;
            }

            if let Some(src) = img.value().attr("src").map(str::trim).filter(|s| !s.is_empty()) {
                let lower = src.to_ascii_lowercase();
                if lower.ends_with(".webp") || lower.ends_with(".avif") {
                    stats.modern_format += 1;
                }
                if let Ok(resolved) = base_url.join(src) {
                    urls.push(resolved.to_string());
                }
            }
        }

        (stats, urls)
    }

    /// Partition anchors into internal/external by host and port.
    /// `broken` stays 0 here; the fetcher samples the internal set.
    fn extract_links(document: &Html, base_url: &Url) -> LinkStats {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());

        let base_host = base_url.host_str().map(|s| s.to_string());
        let base_port = base_url.port();

        let mut stats = LinkStats::default();

        for element in document.select(selector) {
            let Some(href) = element.value().attr("href").map(str::trim) else {
                continue;
            };
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }

            let Ok(mut resolved) = base_url.join(href) else {
                continue;
            };
            resolved.set_fragment(None);

            stats.total += 1;
            let is_internal = resolved.host_str().map(|h| h.to_string()) == base_host
                && resolved.port() == base_port;
            if is_internal {
                stats.internal.push(resolved.to_string());
            } else {
                stats.external.push(resolved.to_string());
            }
        }

        stats
    }

    fn extract_mobile(document: &Html) -> MobileStats {
        static VIEWPORT: OnceLock<Selector> = OnceLock::new();
        static TOUCH: OnceLock<Selector> = OnceLock::new();
        static MENU: OnceLock<Regex> = OnceLock::new();

        let has_viewport = document
            .select(VIEWPORT.get_or_init(|| Selector::parse("meta[name='viewport']").unwrap()))
            .next()
            .is_some();

        // Only inline styles are visible here; an element counts as a
        // small target only when its declared dimensions say so. CSS-class
        // sizing is unmeasurable and stays unpenalized.
        let mut small_touch_targets = 0;
        for el in document.select(TOUCH.get_or_init(|| Selector::parse("button, a, input").unwrap()))
        {
            let style = el.value().attr("style").unwrap_or("");
            if declares_small_dimensions(style) {
                small_touch_targets += 1;
            }
        }

        let menu_re =
            MENU.get_or_init(|| Regex::new(r"(?i)mobile|nav|menu").unwrap());
        static CLASSED: OnceLock<Selector> = OnceLock::new();
        let has_mobile_menu = document
            .select(CLASSED.get_or_init(|| Selector::parse("[class]").unwrap()))
            .any(|el| {
                el.value()
                    .attr("class")
                    .map(|c| menu_re.is_match(c))
                    .unwrap_or(false)
            });

        MobileStats {
            has_viewport,
            small_touch_targets,
            base_font_px: 16,
            has_mobile_menu,
        }
    }

    fn extract_social(document: &Html) -> SocialTags {
        static OG: OnceLock<Selector> = OnceLock::new();
        static OG_IMAGE: OnceLock<Selector> = OnceLock::new();
        static OG_DESC: OnceLock<Selector> = OnceLock::new();
        static TWITTER: OnceLock<Selector> = OnceLock::new();

        let open_graph = document
            .select(OG.get_or_init(|| Selector::parse("meta[property^='og:']").unwrap()))
            .next()
            .is_some();
        let twitter_cards = document
            .select(TWITTER.get_or_init(|| Selector::parse("meta[name^='twitter:']").unwrap()))
            .next()
            .is_some();
        let og_image = document
            .select(OG_IMAGE.get_or_init(|| Selector::parse("meta[property='og:image']").unwrap()))
            .next()
            .is_some();
        let og_description = document
            .select(
                OG_DESC.get_or_init(|| Selector::parse("meta[property='og:description']").unwrap()),
            )
            .next()
            .is_some();

        SocialTags {
            open_graph,
            twitter_cards,
            og_image,
            og_description,
        }
    }

    fn extract_asset_urls(document: &Html, base_url: &Url) -> (Vec<String>, Vec<String>) {
        static CSS: OnceLock<Selector> = OnceLock::new();
        static JS: OnceLock<Selector> = OnceLock::new();

        let css = document
            .select(CSS.get_or_init(|| Selector::parse("link[rel='stylesheet'][href]").unwrap()))
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| base_url.join(href.trim()).ok())
            .map(|u| u.to_string())
            .collect();

        let js = document
            .select(JS.get_or_init(|| Selector::parse("script[src]").unwrap()))
            .filter_map(|el| el.value().attr("src"))
            .filter_map(|src| base_url.join(src.trim()).ok())
            .map(|u| u.to_string())
            .collect();

        (css, js)
    }

    fn count_mixed_content(document: &Html) -> usize {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| {
            Selector::parse("img[src], script[src], link[href], iframe[src]").unwrap()
        });

        document
            .select(selector)
            .filter(|el| {
                let value = el
                    .value()
                    .attr("src")
                    .or_else(|| el.value().attr("href"))
                    .unwrap_or("");
                value.starts_with("http://")
            })
            .count()
    }

    fn extract_content(
        document: &Html,
        base_url: &Url,
        meta: &MetaInfo,
        headings: &HeadingStats,
        links: &LinkStats,
    ) -> ContentStats {
        static BODY: OnceLock<Selector> = OnceLock::new();
        static H2: OnceLock<Selector> = OnceLock::new();
        static KEYWORDS_META: OnceLock<Selector> = OnceLock::new();

        let text = document
            .select(BODY.get_or_init(|| Selector::parse("body").unwrap()))
            .next()
            .map(|body| body.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        let word_count = text.split_whitespace().count();

        let sources = KeywordSources {
            url: keywords_from_url_path(base_url),
            title: tokenize_keywords(meta.title.as_deref().unwrap_or("")),
            description: truncated(tokenize_keywords(meta.description.as_deref().unwrap_or("")), 10),
            meta_keywords: document
                .select(
                    KEYWORDS_META
                        .get_or_init(|| Selector::parse("meta[name='keywords']").unwrap()),
                )
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(|c| {
                    c.split(',')
                        .map(|k| k.trim().to_lowercase())
                        .filter(|k| !k.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            h1: headings
                .h1_texts
                .iter()
                .flat_map(|t| tokenize_keywords(t))
                .collect(),
            h2: truncated(
                document
                    .select(H2.get_or_init(|| Selector::parse("h2").unwrap()))
                    .take(5)
                    .flat_map(|el| tokenize_keywords(&el.text().collect::<String>()))
                    .collect(),
                20,
            ),
        };

        // Pool keywords from the URL, title, meta keywords and H1s.
        let mut keywords: Vec<String> = Vec::new();
        for source in [&sources.url, &sources.title, &sources.meta_keywords, &sources.h1] {
            for kw in source {
                if !keywords.contains(kw) {
                    keywords.push(kw.clone());
                }
            }
        }

        let keyword_density = average_keyword_density(&text, &keywords);
        let top_keywords = top_keywords(&text, 10);
        let (readability, duplicate_blocks) = sentence_stats(&text);

        ContentStats {
            word_count,
            keyword_density,
            readability,
            duplicate_blocks,
            internal_link_count: links.internal.len(),
            keywords: truncated(keywords, 15),
            top_keywords,
            keyword_sources: sources,
        }
    }
}

fn truncated<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}

/// Minimum comfortable touch target edge in CSS pixels.
const MIN_TOUCH_TARGET_PX: u32 = 44;

fn dimension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Property must start a declaration so min-width/max-height don't match.
    RE.get_or_init(|| Regex::new(r"(?i)(?:^|;)\s*(width|height)\s*:\s*(\d+)px").unwrap())
}

/// True when an inline style pins the element below the minimum touch
/// target size on either axis.
fn declares_small_dimensions(style: &str) -> bool {
    dimension_regex()
        .captures_iter(style)
        .filter_map(|cap| cap[2].parse::<u32>().ok())
        .any(|px| px < MIN_TOUCH_TARGET_PX)
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-zA-Z]{3,}\b").unwrap())
}

/// Lowercased words of 3+ letters.
fn tokenize_keywords(text: &str) -> Vec<String> {
    word_regex()
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Keywords from the URL path, split on separators, skipping numbers and
/// file extensions.
fn keywords_from_url_path(url: &Url) -> Vec<String> {
    static EXT: OnceLock<Regex> = OnceLock::new();
    let ext_re = EXT.get_or_init(|| Regex::new(r"\.(html?|php|aspx?|jsp)$").unwrap());

    let path = ext_re.replace(url.path(), "").to_string();
    path.split(['/', '-', '_'])
        .map(|part| part.to_lowercase())
        .filter(|part| part.len() > 2 && !part.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// Average per-keyword density (%) over the page text.
fn average_keyword_density(text: &str, keywords: &[String]) -> f64 {
    let text_lower = text.to_lowercase();
    let total_words = word_regex().find_iter(&text_lower).count();
    if total_words == 0 {
        return 0.0;
    }

    let densities: Vec<f64> = keywords
        .iter()
        .take(10)
        .filter_map(|kw| {
            let count = text_lower.matches(kw.as_str()).count();
            (count > 0).then(|| (count as f64 / total_words as f64) * 100.0)
        })
        .collect();

    if densities.is_empty() {
        return 0.0;
    }
    let avg = densities.iter().sum::<f64>() / densities.len() as f64;
    (avg * 100.0).round() / 100.0
}

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "be", "been", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "this", "that", "these", "those",
];

/// Most frequent non-stop-words with their densities.
fn top_keywords(text: &str, top_n: usize) -> Vec<KeywordStat> {
    let text_lower = text.to_lowercase();
    let words: Vec<&str> = word_regex()
        .find_iter(&text_lower)
        .map(|m| m.as_str())
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        if !STOP_WORDS.contains(word) {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(keyword, count)| KeywordStat {
            keyword: keyword.to_string(),
            count,
            density: ((count as f64 / words.len() as f64) * 10000.0).round() / 100.0,
        })
        .collect()
}

/// Readability (0-100, ideal sentence length 10-30 words) and the number
/// of sentences appearing more than once.
fn sentence_stats(text: &str) -> (u32, usize) {
    let sentences: Vec<String> = text
        .split(['.', '!', '?'])
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        return (100, 0);
    }

    let avg_len = sentences
        .iter()
        .map(|s| s.split_whitespace().count())
        .sum::<usize>() as f64
        / sentences.len() as f64;

    let readability = if avg_len > 30.0 {
        (100.0 - (avg_len - 30.0) * 2.0).max(0.0)
    } else if avg_len < 10.0 {
        (100.0 - (10.0 - avg_len) * 3.0).max(0.0)
    } else {
        100.0
    } as u32;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sentence in &sentences {
        *counts.entry(sentence.as_str()).or_default() += 1;
    }
    let duplicates = counts.values().filter(|&&c| c > 1).count();

    (readability, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> ExtractedPage {
        let url = Url::parse("https://example.com/blog/rust-seo-guide").unwrap();
        PageExtractor::extract(html, &url)
    }

    #[test]
    fn extracts_meta_and_headings() {
        let page = extract(
            r#"<html><head>
                <title>Rust SEO Guide</title>
                <meta name="description" content="A guide to SEO in Rust.">
                <link rel="canonical" href="https://example.com/blog/rust-seo-guide">
            </head><body>
                <h1>Guide</h1><h2>Basics</h2><h4>Deep</h4>
            </body></html>"#,
        );

        assert_eq!(page.meta.title.as_deref(), Some("Rust SEO Guide"));
        assert!(page.meta.has_canonical);
        assert!(!page.meta.has_keyword_meta);
        assert_eq!(page.headings.h1_count, 1);
        assert_eq!(page.headings.h2_count, 1);
        // H2 followed directly by H4 is one skipped level.
        assert_eq!(page.headings.skipped_levels, 1);
    }

    #[test]
    fn partitions_links_by_host() {
        let page = extract(
            r##"<html><body>
                <a href="/about">About</a>
                <a href="https://example.com/contact#form">Contact</a>
                <a href="https://other.com/page">Other</a>
                <a href="#top">Top</a>
                <a href="mailto:hi@example.com">Mail</a>
            </body></html>"##,
        );

        assert_eq!(page.links.total, 3);
        assert_eq!(page.links.internal.len(), 2);
        assert_eq!(page.links.external.len(), 1);
        // Fragments are stripped.
        assert!(page.links.internal.contains(&"https://example.com/contact".to_string()));
    }

    #[test]
    fn counts_image_attributes() {
        let page = extract(
            r#"<html><body>
                <img src="a.webp" alt="one" loading="lazy">
                <img src="b.jpg" alt="">
                <img src="c.png">
            </body></html>"#,
        );

        assert_eq!(page.images.total, 3);
        assert_eq!(page.images.missing_alt, 2);
        assert_eq!(page.images.modern_format, 1);
        assert_eq!(page.images.lazy_loaded, 1);
        assert_eq!(page.assets.images.len(), 3);
    }

    #[test]
    fn counts_mixed_content_on_https_pages() {
        let page = extract(
            r#"<html><body>
                <img src="http://cdn.example.com/a.jpg">
                <script src="http://cdn.example.com/app.js"></script>
                <img src="https://cdn.example.com/b.jpg">
            </body></html>"#,
        );
        assert_eq!(page.mixed_content, 2);
    }

    #[test]
    fn url_path_keywords_skip_numbers_and_extensions() {
        let url = Url::parse("https://example.com/blog/seo-tips/2024/page.html").unwrap();
        let keywords = keywords_from_url_path(&url);
        assert_eq!(keywords, vec!["blog", "seo", "tips", "page"]);
    }

    #[test]
    fn readability_penalizes_extreme_sentence_length() {
        let short = "One two. Three four. Five six.";
        let (score, _) = sentence_stats(short);
        assert!(score < 100);

        let ideal = "This sentence has exactly eleven words in it for the test. \
                     This second sentence also has a comfortable number of words here.";
        let (score, _) = sentence_stats(ideal);
        assert_eq!(score, 100);
    }

    #[test]
    fn duplicate_sentences_are_counted_once_per_distinct_sentence() {
        let text = "Buy our product today. Buy our product today. Something else entirely here now.";
        let (_, duplicates) = sentence_stats(text);
        assert_eq!(duplicates, 1);
    }

    #[test]
    fn css_styled_links_are_not_small_touch_targets() {
        // A link-heavy page styled through classes carries no inline
        // dimensions, so nothing counts as a small target.
        let anchors: String = (0..15)
            .map(|i| format!(r#"<a class="nav-item" href="/p{}">Page {}</a>"#, i, i))
            .collect();
        let page = extract(&format!("<html><body>{}</body></html>", anchors));
        assert_eq!(page.mobile.small_touch_targets, 0);
    }

    #[test]
    fn inline_sub_44px_dimensions_count_as_small_targets() {
        let page = extract(
            r#"<html><body>
                <button style="width: 24px; height: 24px">x</button>
                <button style="height:30px">y</button>
                <button style="width: 48px; height: 48px">ok</button>
                <a href="/big" style="WIDTH: 120px">big</a>
                <a href="/unstyled">plain</a>
            </body></html>"#,
        );
        assert_eq!(page.mobile.small_touch_targets, 2);
    }

    #[test]
    fn top_keywords_exclude_stop_words() {
        let text = "rust rust rust analysis analysis the the the the and for with";
        let top = top_keywords(text, 5);
        assert_eq!(top[0].keyword, "rust");
        assert_eq!(top[0].count, 3);
        assert!(top.iter().all(|k| k.keyword != "the"));
    }
}
