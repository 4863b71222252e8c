//! Website category detection.
//!
//! Keyword heuristics over the page title and domain, falling back to
//! text volume. Deterministic for identical input and total - every page
//! gets exactly one of the three labels.

use crate::domain::{PageSnapshot, WebsiteType};

const FUNCTIONAL_KEYWORDS: &[&str] = &[
    "search", "google", "bing", "yahoo", "login", "sign in", "register", "tool", "calculator",
];
const FUNCTIONAL_DOMAINS: &[&str] = &["google", "bing", "yahoo"];

const ECOMMERCE_KEYWORDS: &[&str] = &[
    "shop", "store", "buy", "cart", "checkout", "product", "price", "sale",
];
const ECOMMERCE_DOMAINS: &[&str] = &["shop", "store", "mall"];

const CONTENT_KEYWORDS: &[&str] = &[
    "blog", "news", "article", "about", "company", "home", "welcome",
];

/// Classify a page as content, functional, or e-commerce.
pub fn classify(snapshot: &PageSnapshot) -> WebsiteType {
    let title = snapshot
        .meta
        .title
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    let domain = snapshot.url.host_str().unwrap_or("").to_lowercase();

    if FUNCTIONAL_KEYWORDS.iter().any(|kw| title.contains(kw))
        || FUNCTIONAL_DOMAINS.iter().any(|d| domain.contains(d))
    {
        return WebsiteType::Functional;
    }

    if ECOMMERCE_KEYWORDS.iter().any(|kw| title.contains(kw))
        || ECOMMERCE_DOMAINS.iter().any(|d| domain.contains(d))
    {
        return WebsiteType::Ecommerce;
    }

    if CONTENT_KEYWORDS.iter().any(|kw| title.contains(kw)) {
        return WebsiteType::Content;
    }

    // No keyword signal: decide by text volume.
    let words = snapshot.content.word_count;
    if words > 200 {
        WebsiteType::Content
    } else if words < 40 {
        WebsiteType::Functional
    } else {
        WebsiteType::Content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn snapshot(url: &str, title: Option<&str>, words: usize) -> PageSnapshot {
        let mut snap = PageSnapshot::empty(Url::parse(url).unwrap());
        snap.meta.title = title.map(|t| t.to_string());
        snap.content.word_count = words;
        snap
    }

    #[test]
    fn title_keywords_win_over_volume() {
        let snap = snapshot("https://example.com", Some("Search the web"), 5000);
        assert_eq!(classify(&snap), WebsiteType::Functional);

        let snap = snapshot("https://example.com", Some("Buy shoes online"), 20);
        assert_eq!(classify(&snap), WebsiteType::Ecommerce);

        let snap = snapshot("https://example.com", Some("Our company blog"), 20);
        assert_eq!(classify(&snap), WebsiteType::Content);
    }

    #[test]
    fn domain_signals_classify_without_title() {
        let snap = snapshot("https://store.example.com", None, 500);
        assert_eq!(classify(&snap), WebsiteType::Ecommerce);

        let snap = snapshot("https://www.google.com", None, 10);
        assert_eq!(classify(&snap), WebsiteType::Functional);
    }

    #[test]
    fn text_volume_is_the_fallback() {
        assert_eq!(
            classify(&snapshot("https://example.com", None, 1000)),
            WebsiteType::Content
        );
        assert_eq!(
            classify(&snapshot("https://example.com", None, 10)),
            WebsiteType::Functional
        );
        assert_eq!(
            classify(&snapshot("https://example.com", None, 100)),
            WebsiteType::Content
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let snap = snapshot("https://example.com", Some("A page"), 100);
        assert_eq!(classify(&snap), classify(&snap));
    }
}
