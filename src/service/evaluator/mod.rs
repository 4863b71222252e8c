//! Metric evaluators.
//!
//! One evaluator per metric key, all sharing the `MetricEvaluator`
//! contract: start at 100, apply independent penalty rules, clamp to
//! [0, 100]. Dispatch goes through `EvaluatorRegistry`, which isolates a
//! panicking evaluator behind the fallback result instead of aborting
//! the run.

mod content;
mod markup;
mod performance;
mod site;

pub use content::{ContentQualityEvaluator, UrlStructureEvaluator};
pub use markup::{HeadingStructureEvaluator, MetaTagsEvaluator, SocialMediaTagsEvaluator};
pub use performance::{ImageOptimizationEvaluator, MobileOptimizationEvaluator, PageSpeedEvaluator};
pub use site::{InternalLinkingEvaluator, RobotsTxtEvaluator, SitemapEvaluator, SslCertificateEvaluator};

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use url::Url;

use crate::domain::{MetricKey, MetricResult, PageSnapshot, WebsiteType};

/// Input shared by every evaluator for one run.
pub struct EvalContext<'a> {
    pub url: &'a Url,
    pub page: &'a PageSnapshot,
    pub website_type: WebsiteType,
}

/// Pure evaluation of one metric over the fetched snapshot.
pub trait MetricEvaluator: Send + Sync {
    fn key(&self) -> MetricKey;
    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult;
}

/// Closed mapping from metric key to evaluator implementation.
pub struct EvaluatorRegistry {
    evaluators: BTreeMap<MetricKey, Box<dyn MetricEvaluator>>,
}

impl EvaluatorRegistry {
    /// Registry with the standard evaluator for every metric key.
    pub fn standard() -> Self {
        let evaluators: Vec<Box<dyn MetricEvaluator>> = vec![
            Box::new(PageSpeedEvaluator),
            Box::new(MobileOptimizationEvaluator),
            Box::new(MetaTagsEvaluator),
            Box::new(HeadingStructureEvaluator),
            Box::new(ImageOptimizationEvaluator),
            Box::new(InternalLinkingEvaluator),
            Box::new(SslCertificateEvaluator),
            Box::new(SocialMediaTagsEvaluator),
            Box::new(ContentQualityEvaluator),
            Box::new(UrlStructureEvaluator),
            Box::new(RobotsTxtEvaluator),
            Box::new(SitemapEvaluator),
        ];

        Self {
            evaluators: evaluators.into_iter().map(|e| (e.key(), e)).collect(),
        }
    }

    /// Replace the evaluator for one key (used by fault-injection tests).
    pub fn with_override(mut self, evaluator: Box<dyn MetricEvaluator>) -> Self {
        self.evaluators.insert(evaluator.key(), evaluator);
        self
    }

    /// Evaluate one metric, degrading an internal panic to the fallback
    /// result (score 50, poor) so a single fault never aborts the run.
    pub fn evaluate(&self, key: MetricKey, ctx: &EvalContext<'_>) -> MetricResult {
        let Some(evaluator) = self.evaluators.get(&key) else {
            log::error!("[EVAL] No evaluator registered for {}", key);
            return MetricResult::fallback();
        };

        match catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(ctx))) {
            Ok(result) => result,
            Err(_) => {
                log::error!("[EVAL] Evaluator for {} panicked, using fallback", key);
                MetricResult::fallback()
            }
        }
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fixed advice per metric, independent of the measured data.
pub fn recommendations(key: MetricKey) -> Vec<&'static str> {
    match key {
        MetricKey::PageSpeed => vec![
            "Optimize image size and formats",
            "Minify and compress CSS and JavaScript",
            "Enable browser caching",
            "Serve assets from a CDN",
        ],
        MetricKey::MobileOptimization => vec![
            "Add a viewport meta tag",
            "Increase touch target sizes",
            "Use responsive design",
            "Test the mobile experience",
        ],
        MetricKey::MetaTags => vec![
            "Keep titles between 30-60 characters",
            "Write compelling descriptions (120-160 characters)",
            "Add a canonical tag",
            "Avoid duplicate titles",
        ],
        MetricKey::HeadingStructure => vec![
            "Use exactly one H1 per page",
            "Structure sections with H2 and H3 tags",
            "Keep the heading hierarchy sequential",
            "Write descriptive heading text",
        ],
        MetricKey::ImageOptimization => vec![
            "Add alt attributes to all images",
            "Serve images in WebP format",
            "Compress image files",
            "Lazy-load below-the-fold images",
        ],
        MetricKey::InternalLinking => vec![
            "Fix all broken links",
            "Reduce excessive external links",
            "Add more internal links",
            "Flatten deep link hierarchies",
        ],
        MetricKey::SslCertificate => vec![
            "Serve all pages over HTTPS",
            "Renew the certificate before expiry",
            "Enable HSTS",
            "Fix mixed-content references",
        ],
        MetricKey::SocialMediaTags => vec![
            "Add Open Graph tags",
            "Configure Twitter Cards",
            "Set a social sharing image",
            "Optimize share descriptions",
        ],
        MetricKey::ContentQuality => vec![
            "Increase page content length",
            "Improve content depth and quality",
            "Tune keyword density",
            "Add more internal links",
        ],
        MetricKey::UrlStructure => vec![
            "Shorten URLs",
            "Reduce URL depth",
            "Include keywords in URL paths",
            "Avoid special characters",
        ],
        MetricKey::RobotsTxt => vec![
            "Create a robots.txt file",
            "Reference your sitemap from robots.txt",
            "Avoid blocking important resources",
            "Review crawler rules",
        ],
        MetricKey::Sitemap => vec![
            "Create a sitemap.xml file",
            "Keep the sitemap up to date",
            "Include all important pages",
            "Submit the sitemap to search engines",
        ],
    }
}

/// Running score with its triggered issue strings. Rules never
/// short-circuit; every deduction stacks independently.
pub(crate) struct ScoreCard {
    score: i32,
    details: Vec<String>,
}

impl ScoreCard {
    pub(crate) fn new() -> Self {
        Self {
            score: 100,
            details: Vec::new(),
        }
    }

    pub(crate) fn penalize(&mut self, deduction: i32, issue: impl Into<String>) {
        self.score -= deduction;
        self.details.push(issue.into());
    }

    /// Hard fail: drop straight to zero (e.g. no HTTPS at all).
    pub(crate) fn zero(&mut self, issue: impl Into<String>) {
        self.score = 0;
        self.details.push(issue.into());
    }

    pub(crate) fn into_result(self, key: MetricKey, specific_data: serde_json::Value) -> MetricResult {
        MetricResult::new(self.score, self.details, recommendations(key), specific_data)
    }
}
