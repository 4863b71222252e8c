//! Markup metrics: meta tags, heading hierarchy, social sharing tags.

use serde_json::json;

use crate::domain::{MetricKey, MetricResult, WebsiteType};

use super::{EvalContext, MetricEvaluator, ScoreCard};

pub struct MetaTagsEvaluator;

impl MetricEvaluator for MetaTagsEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::MetaTags
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let meta = &ctx.page.meta;
        let title_len = meta.title.as_deref().map(|t| t.chars().count()).unwrap_or(0);
        let desc_len = meta
            .description
            .as_deref()
            .map(|d| d.chars().count())
            .unwrap_or(0);
        let duplicate_titles = ctx
            .page
            .site
            .as_ref()
            .map(|s| s.duplicate_titles)
            .unwrap_or(0);
        let mut card = ScoreCard::new();

        match ctx.website_type {
            WebsiteType::Functional => {
                if title_len < 10 {
                    card.penalize(10, format!("Title is too short ({} characters)", title_len));
                } else if title_len > 50 {
                    card.penalize(10, format!("Title is too long ({} characters)", title_len));
                }
                if desc_len > 200 {
                    card.penalize(
                        5,
                        format!("Description is too long ({} characters)", desc_len),
                    );
                }
            }
            WebsiteType::Content | WebsiteType::Ecommerce => {
                if title_len < 30 {
                    card.penalize(20, format!("Title is too short ({} characters)", title_len));
                } else if title_len > 60 {
                    card.penalize(15, format!("Title is too long ({} characters)", title_len));
                }
                if desc_len < 120 {
                    card.penalize(
                        15,
                        format!("Description is too short ({} characters)", desc_len),
                    );
                } else if desc_len > 160 {
                    card.penalize(
                        10,
                        format!("Description is too long ({} characters)", desc_len),
                    );
                }
            }
        }

        if !meta.has_canonical {
            card.penalize(10, "Missing canonical tag");
        }
        if duplicate_titles > 0 {
            card.penalize(
                (duplicate_titles as i32 * 5).min(20),
                format!("{} pages share a duplicate title", duplicate_titles),
            );
        }

        card.into_result(
            self.key(),
            json!({
                "titleLength": title_len,
                "descriptionLength": desc_len,
                "hasKeywordMeta": meta.has_keyword_meta,
                "hasCanonical": meta.has_canonical,
                "duplicateTitles": duplicate_titles,
            }),
        )
    }
}

pub struct HeadingStructureEvaluator;

impl MetricEvaluator for HeadingStructureEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::HeadingStructure
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let headings = &ctx.page.headings;
        let missing_headings = ctx
            .page
            .site
            .as_ref()
            .map(|s| s.missing_headings)
            .unwrap_or(0);
        let mut card = ScoreCard::new();

        match ctx.website_type {
            WebsiteType::Functional => {
                if headings.h1_count == 0 {
                    card.penalize(10, "No H1 heading");
                } else if headings.h1_count > 2 {
                    card.penalize(15, format!("{} H1 headings", headings.h1_count));
                }
                if headings.h2_count < 1 {
                    card.penalize(10, "No H2 headings");
                }
            }
            WebsiteType::Content | WebsiteType::Ecommerce => {
                if headings.h1_count == 0 {
                    card.penalize(30, "No H1 heading");
                } else if headings.h1_count > 1 {
                    card.penalize(20, format!("{} H1 headings (expected one)", headings.h1_count));
                }
                if headings.h2_count < 3 {
                    card.penalize(15, format!("Only {} H2 headings", headings.h2_count));
                }
            }
        }

        if headings.skipped_levels > 0 {
            card.penalize(
                (headings.skipped_levels * 5) as i32,
                format!("{} skipped heading levels", headings.skipped_levels),
            );
        }
        if missing_headings > 0 {
            card.penalize(
                (missing_headings as i32 * 3).min(15),
                format!("{} crawled pages have no headings", missing_headings),
            );
        }

        card.into_result(
            self.key(),
            json!({
                "h1Count": headings.h1_count,
                "h2Count": headings.h2_count,
                "h3Count": headings.h3_count,
                "h1Texts": headings.h1_texts.clone(),
                "skippedLevels": headings.skipped_levels,
                "pagesMissingHeadings": missing_headings,
            }),
        )
    }
}

pub struct SocialMediaTagsEvaluator;

impl MetricEvaluator for SocialMediaTagsEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::SocialMediaTags
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let social = &ctx.page.social;
        let mut card = ScoreCard::new();

        // Social previews are irrelevant for functional pages.
        if ctx.website_type != WebsiteType::Functional {
            if !social.open_graph {
                card.penalize(20, "No Open Graph tags");
            }
            if !social.twitter_cards {
                card.penalize(15, "No Twitter Card tags");
            }
            if !social.og_image {
                card.penalize(10, "No og:image tag");
            }
            if !social.og_description {
                card.penalize(10, "No og:description tag");
            }
        }

        card.into_result(
            self.key(),
            json!({
                "openGraph": social.open_graph,
                "twitterCards": social.twitter_cards,
                "ogImage": social.og_image,
                "ogDescription": social.og_description,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PageSnapshot, SiteCrawl};
    use url::Url;

    fn page() -> PageSnapshot {
        PageSnapshot::empty(Url::parse("https://example.com").unwrap())
    }

    fn ctx(page: &PageSnapshot, website_type: WebsiteType) -> EvalContext<'_> {
        EvalContext {
            url: &page.url,
            page,
            website_type,
        }
    }

    #[test]
    fn good_meta_tags_keep_100() {
        let mut page = page();
        page.meta.title = Some("A well-sized page title for testing meta".to_string());
        page.meta.description =
            Some("A description long enough to satisfy the lower band of the length \
                  rule, padded with a few extra words to pass one hundred twenty."
                .to_string());
        page.meta.has_canonical = true;

        let result = MetaTagsEvaluator.evaluate(&ctx(&page, WebsiteType::Content));
        assert_eq!(result.score, 100);
    }

    #[test]
    fn functional_meta_bands_are_looser() {
        let mut page = page();
        page.meta.title = Some("Search tools".to_string());
        page.meta.has_canonical = true;

        // 12-char title passes functional but fails content.
        let functional = MetaTagsEvaluator.evaluate(&ctx(&page, WebsiteType::Functional));
        assert_eq!(functional.score, 100);

        let content = MetaTagsEvaluator.evaluate(&ctx(&page, WebsiteType::Content));
        // -20 short title, -15 missing description
        assert_eq!(content.score, 65);
    }

    #[test]
    fn duplicate_title_penalty_is_capped() {
        let mut page = page();
        page.meta.title = Some("A well-sized page title for testing meta".to_string());
        page.meta.description = Some("x".repeat(130));
        page.meta.has_canonical = true;
        page.site = Some(SiteCrawl {
            duplicate_titles: 9,
            ..Default::default()
        });

        let result = MetaTagsEvaluator.evaluate(&ctx(&page, WebsiteType::Content));
        assert_eq!(result.score, 80);
    }

    #[test]
    fn single_h1_with_sections_scores_well() {
        let mut page = page();
        page.headings.h1_count = 1;
        page.headings.h2_count = 4;

        let result = HeadingStructureEvaluator.evaluate(&ctx(&page, WebsiteType::Content));
        assert_eq!(result.score, 100);
    }

    #[test]
    fn missing_h1_hits_content_sites_harder() {
        let mut page = page();
        page.headings.h2_count = 4;

        let content = HeadingStructureEvaluator.evaluate(&ctx(&page, WebsiteType::Content));
        assert_eq!(content.score, 70);

        let functional = HeadingStructureEvaluator.evaluate(&ctx(&page, WebsiteType::Functional));
        assert_eq!(functional.score, 90);
    }

    #[test]
    fn skipped_levels_stack_per_occurrence() {
        let mut page = page();
        page.headings.h1_count = 1;
        page.headings.h2_count = 3;
        page.headings.skipped_levels = 3;

        let result = HeadingStructureEvaluator.evaluate(&ctx(&page, WebsiteType::Content));
        assert_eq!(result.score, 85);
    }

    #[test]
    fn social_tags_exempt_for_functional() {
        let page = page(); // no social tags at all

        let functional = SocialMediaTagsEvaluator.evaluate(&ctx(&page, WebsiteType::Functional));
        assert_eq!(functional.score, 100);

        let content = SocialMediaTagsEvaluator.evaluate(&ctx(&page, WebsiteType::Content));
        // -20 -15 -10 -10
        assert_eq!(content.score, 45);
    }
}
