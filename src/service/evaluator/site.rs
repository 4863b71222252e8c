//! Site-level metrics: linking, TLS, robots.txt, sitemap.

use serde_json::json;

use crate::domain::{MetricKey, MetricResult};

use super::{EvalContext, MetricEvaluator, ScoreCard};

pub struct InternalLinkingEvaluator;

impl MetricEvaluator for InternalLinkingEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::InternalLinking
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let links = &ctx.page.links;
        let (orphans, deep) = ctx
            .page
            .site
            .as_ref()
            .map(|s| (s.orphan_pages, s.deep_links))
            .unwrap_or((0, 0));
        let mut card = ScoreCard::new();

        if links.broken > 0 {
            card.penalize(
                (links.broken * 10) as i32,
                format!("{} broken links", links.broken),
            );
        }
        if links.external.len() > 15 {
            card.penalize(10, format!("{} external links", links.external.len()));
        }
        if orphans > 0 {
            card.penalize(
                (orphans as i32 * 5).min(15),
                format!("{} orphan pages", orphans),
            );
        }
        if deep > 5 {
            card.penalize(10, format!("{} pages buried deeper than 3 clicks", deep));
        }

        card.into_result(
            self.key(),
            json!({
                "totalLinks": links.total,
                "internalLinks": links.internal.len(),
                "externalLinks": links.external.len(),
                "externalSample": links.external.iter().take(5).collect::<Vec<_>>(),
                "brokenLinks": links.broken,
                "orphanPages": orphans,
                "deepLinks": deep,
            }),
        )
    }
}

pub struct SslCertificateEvaluator;

impl MetricEvaluator for SslCertificateEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::SslCertificate
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let tls = &ctx.page.tls;
        let mut card = ScoreCard::new();

        if !tls.https {
            card.zero("Site is not served over HTTPS");
        } else {
            if !tls.has_hsts {
                card.penalize(10, "HSTS header not set");
            }
            if tls.mixed_content > 0 {
                card.penalize(
                    (tls.mixed_content as i32 * 10).min(30),
                    format!("{} mixed-content resources", tls.mixed_content),
                );
            }
            // Expiry is only judged when the collaborator could read it.
            if let Some(days) = tls.days_to_expiry {
                if days < 30 {
                    card.penalize(20, format!("Certificate expires in {} days", days));
                }
            }
            if tls.cert_check_failed {
                card.penalize(20, "Certificate could not be verified");
            }
        }

        card.into_result(
            self.key(),
            json!({
                "https": tls.https,
                "hasHsts": tls.has_hsts,
                "mixedContent": tls.mixed_content,
                "daysToExpiry": tls.days_to_expiry,
                "certCheckFailed": tls.cert_check_failed,
            }),
        )
    }
}

pub struct RobotsTxtEvaluator;

impl MetricEvaluator for RobotsTxtEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::RobotsTxt
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let robots = &ctx.page.robots;
        let mut card = ScoreCard::new();

        if !robots.present {
            card.penalize(20, "No robots.txt found");
        } else if robots.blocking_css {
            card.penalize(10, "robots.txt blocks CSS files");
        }

        card.into_result(
            self.key(),
            json!({
                "present": robots.present,
                "hasSitemapReference": robots.has_sitemap_reference,
                "blockingImportantPages": robots.blocking_important_pages,
                "blockingCss": robots.blocking_css,
            }),
        )
    }
}

pub struct SitemapEvaluator;

impl MetricEvaluator for SitemapEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::Sitemap
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let sitemap = &ctx.page.sitemap;
        let mut card = ScoreCard::new();

        if !sitemap.present {
            card.penalize(30, "No sitemap.xml found");
        } else if sitemap.total_pages < 10 {
            card.penalize(
                10,
                format!("Sitemap lists only {} pages", sitemap.total_pages),
            );
        }

        card.into_result(
            self.key(),
            json!({
                "present": sitemap.present,
                "totalPages": sitemap.total_pages,
                "daysSinceUpdate": sitemap.days_since_update,
                "includesImages": sitemap.includes_images,
                "submittedToSearchConsole": sitemap.submitted_to_search_console,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PageSnapshot, ScoreStatus, SiteCrawl, WebsiteType};
    use url::Url;

    fn page() -> PageSnapshot {
        PageSnapshot::empty(Url::parse("https://example.com").unwrap())
    }

    fn ctx(page: &PageSnapshot) -> EvalContext<'_> {
        EvalContext {
            url: &page.url,
            page,
            website_type: WebsiteType::Content,
        }
    }

    #[test]
    fn broken_links_cost_10_each() {
        let mut page = page();
        page.links.broken = 3;
        let result = InternalLinkingEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 70);
    }

    #[test]
    fn crawl_findings_feed_linking_score() {
        let mut page = page();
        page.site = Some(SiteCrawl {
            orphan_pages: 5,
            deep_links: 8,
            ..Default::default()
        });

        let result = InternalLinkingEvaluator.evaluate(&ctx(&page));
        // orphans capped at -15, deep links -10
        assert_eq!(result.score, 75);
    }

    #[test]
    fn external_sample_is_limited_to_five() {
        let mut page = page();
        page.links.external = (0..20).map(|i| format!("https://ext{}.example", i)).collect();

        let result = InternalLinkingEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 90);
        assert_eq!(
            result.specific_data["externalSample"].as_array().map(|a| a.len()),
            Some(5)
        );
    }

    #[test]
    fn plain_http_zeroes_the_ssl_score() {
        let page = page(); // tls.https defaults to false
        let result = SslCertificateEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 0);
        assert_eq!(result.status, ScoreStatus::Poor);
    }

    #[test]
    fn https_with_full_hygiene_scores_100() {
        let mut page = page();
        page.tls.https = true;
        page.tls.has_hsts = true;
        page.tls.days_to_expiry = Some(200);

        let result = SslCertificateEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 100);
    }

    #[test]
    fn mixed_content_penalty_is_capped_at_30() {
        let mut page = page();
        page.tls.https = true;
        page.tls.has_hsts = true;
        page.tls.mixed_content = 7;

        let result = SslCertificateEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 70);
    }

    #[test]
    fn unknown_expiry_is_not_penalized() {
        let mut page = page();
        page.tls.https = true;
        page.tls.has_hsts = true;
        page.tls.days_to_expiry = None;

        let result = SslCertificateEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 100);

        page.tls.days_to_expiry = Some(10);
        let result = SslCertificateEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 80);
    }

    #[test]
    fn missing_robots_and_sitemap_take_flat_deductions() {
        let page = page();

        let robots = RobotsTxtEvaluator.evaluate(&ctx(&page));
        assert_eq!(robots.score, 80);

        let sitemap = SitemapEvaluator.evaluate(&ctx(&page));
        assert_eq!(sitemap.score, 70);
    }

    #[test]
    fn small_sitemap_only_penalized_when_present() {
        let mut page = page();
        page.sitemap.present = true;
        page.sitemap.total_pages = 4;

        let result = SitemapEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 90);

        page.sitemap.total_pages = 40;
        let result = SitemapEvaluator.evaluate(&ctx(&page));
        assert_eq!(result.score, 100);
    }
}
