//! robots.txt content checks.

use crate::domain::RobotsInfo;

/// Parse robots.txt content into the flags the scorer looks at.
pub fn parse_robots(content: &str) -> RobotsInfo {
    let mut blocking_important_pages = 0;
    let mut has_sitemap_reference = false;
    let mut blocking_css = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }

        if let Some(value) = strip_directive(line, "Sitemap") {
            if !value.is_empty() {
                has_sitemap_reference = true;
            }
        } else if let Some(value) = strip_directive(line, "Disallow") {
            if value.contains("*.css") {
                blocking_css = true;
            }
            // Disallowing site sections that should be indexable.
            if matches!(value, "/" | "/admin" | "/admin/") {
                blocking_important_pages += 1;
            }
        }
    }

    RobotsInfo {
        present: true,
        blocking_important_pages,
        has_sitemap_reference,
        blocking_css,
    }
}

fn strip_directive<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_sitemap_reference() {
        let info = parse_robots("User-agent: *\nDisallow:\nSitemap: https://example.com/sitemap.xml");
        assert!(info.present);
        assert!(info.has_sitemap_reference);
        assert!(!info.blocking_css);
        assert_eq!(info.blocking_important_pages, 0);
    }

    #[test]
    fn detects_css_blocking() {
        let info = parse_robots("User-agent: *\nDisallow: /*.css$");
        assert!(info.blocking_css);
    }

    #[test]
    fn counts_important_page_blocks() {
        let info = parse_robots("User-agent: *\nDisallow: /admin\nDisallow: /tmp");
        assert_eq!(info.blocking_important_pages, 1);
    }

    #[test]
    fn ignores_comments() {
        let info = parse_robots("# Sitemap: https://example.com/sitemap.xml");
        assert!(!info.has_sitemap_reference);
    }
}
