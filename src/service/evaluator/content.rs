//! Content metrics: text quality and URL shape.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use crate::domain::{MetricKey, MetricResult, WebsiteType};

use super::{EvalContext, MetricEvaluator, ScoreCard};

pub struct ContentQualityEvaluator;

impl MetricEvaluator for ContentQualityEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::ContentQuality
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let content = &ctx.page.content;
        let words = content.word_count;
        let links = content.internal_link_count;
        let keyword_count = content.keywords.len();
        let density = content.keyword_density;
        let mut card = ScoreCard::new();

        match ctx.website_type {
            WebsiteType::Functional => {
                if words < 50 {
                    card.penalize(10, format!("Very little text content ({} words)", words));
                } else if words < 100 {
                    card.penalize(5, format!("Little text content ({} words)", words));
                }
                if links < 2 {
                    card.penalize(5, format!("Only {} internal links", links));
                }
                if keyword_count == 0 {
                    card.penalize(5, "No keywords detected");
                }
            }
            WebsiteType::Ecommerce => {
                if words < 200 {
                    card.penalize(15, format!("Thin content ({} words)", words));
                }
                if links < 3 {
                    card.penalize(10, format!("Only {} internal links", links));
                }
                if keyword_count < 3 {
                    card.penalize(10, format!("Only {} keywords detected", keyword_count));
                }
                if density < 0.5 {
                    card.penalize(10, format!("Keyword density too low ({:.1}%)", density));
                } else if density > 5.0 {
                    card.penalize(15, format!("Keyword density too high ({:.1}%)", density));
                }
            }
            WebsiteType::Content => {
                if words < 300 {
                    card.penalize(20, format!("Thin content ({} words)", words));
                }
                if links < 5 {
                    card.penalize(10, format!("Only {} internal links", links));
                }
                if keyword_count < 5 {
                    card.penalize(15, format!("Only {} keywords detected", keyword_count));
                }
                if density < 1.0 {
                    card.penalize(15, format!("Keyword density too low ({:.1}%)", density));
                } else if density > 3.0 {
                    card.penalize(20, format!("Keyword density too high ({:.1}%)", density));
                }
            }
        }

        if content.readability < 60 {
            card.penalize(10, format!("Low readability score ({})", content.readability));
        }
        if content.duplicate_blocks > 3 {
            card.penalize(
                15,
                format!("{} repeated content blocks", content.duplicate_blocks),
            );
        }

        card.into_result(
            self.key(),
            json!({
                "wordCount": words,
                "keywordDensity": density,
                "readability": content.readability,
                "duplicateContent": content.duplicate_blocks,
                "internalLinks": links,
                "keywords": content.keywords.clone(),
                "topKeywords": content.top_keywords.clone(),
                "keywordSources": content.keyword_sources.clone(),
            }),
        )
    }
}

pub struct UrlStructureEvaluator;

fn special_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\-_/.~%]").unwrap())
}

impl MetricEvaluator for UrlStructureEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::UrlStructure
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let url_str = ctx.url.as_str();
        let length = url_str.chars().count();
        let path = ctx.url.path();
        let depth = path.split('/').filter(|seg| !seg.is_empty()).count();
        let has_special_chars = special_chars_re().is_match(path);
        let has_keywords = path
            .split(|c: char| !c.is_alphanumeric())
            .any(|seg| seg.len() > 3);
        let mut card = ScoreCard::new();

        if length > 100 {
            card.penalize(20, format!("URL is too long ({} characters)", length));
        }
        if depth > 5 {
            card.penalize(15, format!("URL is nested too deep ({} levels)", depth));
        }
        if has_special_chars {
            card.penalize(10, "URL path contains special characters");
        }

        card.into_result(
            self.key(),
            json!({
                "length": length,
                "depth": depth,
                "hasSpecialChars": has_special_chars,
                "hasKeywords": has_keywords,
            }),
        )
    }
}
