//! sitemap.xml parsing.
//!
//! Handles XML sitemaps (via quick-xml) and plain-text URL lists.

use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::Event;
use url::Url;

use crate::domain::SitemapInfo;

#[derive(Debug, Clone)]
pub enum SitemapFormat {
    Xml,
    PlainText,
}

impl SitemapFormat {
    fn detect(text: &str) -> Self {
        match text.contains("<loc>") {
            true => SitemapFormat::Xml,
            false => SitemapFormat::PlainText,
        }
    }
}

/// Parse sitemap content into the measurements the scorer looks at.
pub fn parse_sitemap(text: &str, now: DateTime<Utc>) -> SitemapInfo {
    match SitemapFormat::detect(text) {
        SitemapFormat::Xml => parse_xml(text, now),
        SitemapFormat::PlainText => {
            let total_pages = text
                .split_whitespace()
                .filter(|token| Url::parse(token).is_ok())
                .count();
            SitemapInfo {
                present: true,
                total_pages,
                last_modified: None,
                days_since_update: None,
                includes_images: false,
                submitted_to_search_console: false,
            }
        }
    }
}

fn parse_xml(text: &str, now: DateTime<Utc>) -> SitemapInfo {
    let mut reader = quick_xml::Reader::from_str(text);
    let mut buf = Vec::new();

    let mut total_pages = 0;
    let mut includes_images = false;
    let mut last_modified: Option<DateTime<Utc>> = None;
    let mut in_lastmod = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"loc" => total_pages += 1,
                b"lastmod" => in_lastmod = true,
                b"image:image" => includes_images = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"image:image" => {
                includes_images = true;
            }
            Ok(Event::Text(e)) if in_lastmod => {
                in_lastmod = false;
                if last_modified.is_none() {
                    match e.decode() {
                        Ok(txt) => last_modified = parse_lastmod(txt.trim()),
                        Err(e) => {
                            log::warn!("Invalid lastmod text at {}", reader.buffer_position());
                            log::warn!("{}", e);
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"lastmod" => in_lastmod = false,
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("Sitemap XML error at {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    let days_since_update = last_modified.map(|lm| (now - lm).num_days().max(0));

    SitemapInfo {
        present: true,
        total_pages,
        last_modified,
        days_since_update,
        includes_images,
        submitted_to_search_console: false,
    }
}

/// lastmod values come as full RFC 3339 timestamps or bare dates.
fn parse_lastmod(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_xml_sitemap() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2024-01-10</lastmod></url>
  <url><loc>https://example.com/about</loc></url>
  <url><loc>https://example.com/blog</loc></url>
</urlset>"#;

        let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
        let info = parse_sitemap(text, now);
        assert!(info.present);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.days_since_update, Some(10));
        assert!(!info.includes_images);
    }

    #[test]
    fn detects_image_entries() {
        let text = r#"<urlset>
  <url><loc>https://example.com/</loc>
    <image:image><image:loc>https://example.com/a.jpg</image:loc></image:image>
  </url>
</urlset>"#;

        let info = parse_sitemap(text, Utc::now());
        assert!(info.includes_images);
    }

    #[test]
    fn parses_plain_text_sitemap() {
        let text = "https://example.com/\nhttps://example.com/about\nnot a url";
        let info = parse_sitemap(text, Utc::now());
        assert!(info.present);
        assert_eq!(info.total_pages, 2);
        assert!(info.last_modified.is_none());
    }

    #[test]
    fn accepts_rfc3339_lastmod() {
        let parsed = parse_lastmod("2024-03-01T12:00:00+00:00").unwrap();
        assert_eq!(parsed.date_naive().to_string(), "2024-03-01");
    }
}
