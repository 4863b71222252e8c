//! Domain entities for the scoring engine - behavior lives WITH data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

// ====== Metric keys ======

/// The 12 scored SEO dimensions. Closed set, fixed at compile time;
/// declaration order is the canonical evaluation/reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    PageSpeed,
    MobileOptimization,
    MetaTags,
    HeadingStructure,
    ImageOptimization,
    InternalLinking,
    SslCertificate,
    SocialMediaTags,
    ContentQuality,
    UrlStructure,
    RobotsTxt,
    Sitemap,
}

impl MetricKey {
    pub const ALL: [MetricKey; 12] = [
        MetricKey::PageSpeed,
        MetricKey::MobileOptimization,
        MetricKey::MetaTags,
        MetricKey::HeadingStructure,
        MetricKey::ImageOptimization,
        MetricKey::InternalLinking,
        MetricKey::SslCertificate,
        MetricKey::SocialMediaTags,
        MetricKey::ContentQuality,
        MetricKey::UrlStructure,
        MetricKey::RobotsTxt,
        MetricKey::Sitemap,
    ];

    /// Wire key used in reports and weight tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::PageSpeed => "pageSpeed",
            MetricKey::MobileOptimization => "mobileOptimization",
            MetricKey::MetaTags => "metaTags",
            MetricKey::HeadingStructure => "headingStructure",
            MetricKey::ImageOptimization => "imageOptimization",
            MetricKey::InternalLinking => "internalLinking",
            MetricKey::SslCertificate => "sslCertificate",
            MetricKey::SocialMediaTags => "socialMediaTags",
            MetricKey::ContentQuality => "contentQuality",
            MetricKey::UrlStructure => "urlStructure",
            MetricKey::RobotsTxt => "robotsTxt",
            MetricKey::Sitemap => "sitemap",
        }
    }

    /// Human-readable name for progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::PageSpeed => "page speed",
            MetricKey::MobileOptimization => "mobile optimization",
            MetricKey::MetaTags => "meta tags",
            MetricKey::HeadingStructure => "heading structure",
            MetricKey::ImageOptimization => "image optimization",
            MetricKey::InternalLinking => "internal linking",
            MetricKey::SslCertificate => "SSL certificate",
            MetricKey::SocialMediaTags => "social media tags",
            MetricKey::ContentQuality => "content quality",
            MetricKey::UrlStructure => "URL structure",
            MetricKey::RobotsTxt => "robots.txt",
            MetricKey::Sitemap => "sitemap",
        }
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ====== Status & results ======

/// Score bands shared by per-metric scores and the weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreStatus {
    Excellent,
    Good,
    Warning,
    Poor,
}

impl ScoreStatus {
    /// Monotone thresholds: >=90 excellent, >=75 good, >=60 warning.
    /// The total score (0-120 basis) uses the same absolute cut points.
    pub fn from_score(score: u32) -> Self {
        if score >= 90 {
            ScoreStatus::Excellent
        } else if score >= 75 {
            ScoreStatus::Good
        } else if score >= 60 {
            ScoreStatus::Warning
        } else {
            ScoreStatus::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStatus::Excellent => "excellent",
            ScoreStatus::Good => "good",
            ScoreStatus::Warning => "warning",
            ScoreStatus::Poor => "poor",
        }
    }
}

/// Immutable outcome of one metric evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    /// Clamped to 0-100.
    pub score: u8,
    pub status: ScoreStatus,
    /// Ordered issue strings triggered by penalty rules.
    pub details: Vec<String>,
    /// Fixed per-metric advice, independent of measured data.
    pub recommendations: Vec<&'static str>,
    /// Every measured quantity the rules looked at, populated even when
    /// no penalty triggered.
    pub specific_data: serde_json::Value,
}

impl MetricResult {
    pub fn new(
        score: i32,
        details: Vec<String>,
        recommendations: Vec<&'static str>,
        specific_data: serde_json::Value,
    ) -> Self {
        let score = score.clamp(0, 100) as u8;
        Self {
            score,
            status: ScoreStatus::from_score(score as u32),
            details,
            recommendations,
            specific_data,
        }
    }

    /// Substitute result for a metric whose evaluator failed internally.
    pub fn fallback() -> Self {
        Self {
            score: 50,
            status: ScoreStatus::Poor,
            details: vec!["Metric evaluation failed".to_string()],
            recommendations: Vec::new(),
            specific_data: serde_json::Value::Object(Default::default()),
        }
    }
}

// ====== Website classification ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteType {
    Content,
    Functional,
    Ecommerce,
}

impl WebsiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebsiteType::Content => "content",
            WebsiteType::Functional => "functional",
            WebsiteType::Ecommerce => "ecommerce",
        }
    }
}

// ====== Report & events ======

/// Scale multiplier applied after normalizing against the 100-point
/// weight basis, making 120 the attainable maximum.
pub const SCALE_MULTIPLIER: f64 = 1.2;

/// Full output of one analysis run. Owned by the run that produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub url: String,
    pub website_type: WebsiteType,
    pub results: BTreeMap<MetricKey, MetricResult>,
    /// 0-120 (see SCALE_MULTIPLIER).
    pub total_score: u32,
    pub status: ScoreStatus,
}

/// One unit of the ordered status stream emitted during a run.
/// Exactly one terminal event (`Complete` or `Error`) ends the sequence.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Progress { message: String },
    Complete { data: Box<AnalysisReport> },
    Error { message: String },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Complete { .. } | ProgressEvent::Error { .. })
    }
}

// ====== Page snapshot (fetch collaborator output) ======

/// Byte sizes and timing for the page and its sub-resources.
#[derive(Debug, Clone, Default)]
pub struct SpeedStats {
    pub load_time_ms: u64,
    pub total_size_kb: f64,
    pub image_size_kb: f64,
    pub css_size_kb: f64,
    pub js_size_kb: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MobileStats {
    pub has_viewport: bool,
    pub small_touch_targets: usize,
    pub base_font_px: u32,
    pub has_mobile_menu: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MetaInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub has_keyword_meta: bool,
    pub has_canonical: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HeadingStats {
    pub h1_count: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub h1_texts: Vec<String>,
    /// Hierarchy jumps (e.g. H1 followed directly by H3).
    pub skipped_levels: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ImageStats {
    pub total: usize,
    /// Images over 100 KB by reported content-length.
    pub oversized: usize,
    pub missing_alt: usize,
    /// WebP/AVIF sources.
    pub modern_format: usize,
    pub lazy_loaded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LinkStats {
    pub total: usize,
    pub internal: Vec<String>,
    pub external: Vec<String>,
    /// Broken links found in the sampled internal set.
    pub broken: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TlsInfo {
    pub https: bool,
    /// None when the collaborator cannot read certificate metadata.
    pub days_to_expiry: Option<i64>,
    pub has_hsts: bool,
    /// http:// sub-resources referenced from an https page.
    pub mixed_content: usize,
    pub cert_check_failed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SocialTags {
    pub open_graph: bool,
    pub twitter_cards: bool,
    pub og_image: bool,
    pub og_description: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStat {
    pub keyword: String,
    pub count: usize,
    pub density: f64,
}

/// Where each candidate keyword came from, kept for display/audit.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSources {
    pub url: Vec<String>,
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub meta_keywords: Vec<String>,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentStats {
    pub word_count: usize,
    /// Average density (%) across extracted keywords.
    pub keyword_density: f64,
    /// 0-100, from average sentence length.
    pub readability: u32,
    /// Sentences appearing more than once.
    pub duplicate_blocks: usize,
    pub internal_link_count: usize,
    pub keywords: Vec<String>,
    pub top_keywords: Vec<KeywordStat>,
    pub keyword_sources: KeywordSources,
}

#[derive(Debug, Clone, Default)]
pub struct RobotsInfo {
    pub present: bool,
    pub blocking_important_pages: usize,
    pub has_sitemap_reference: bool,
    pub blocking_css: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SitemapInfo {
    pub present: bool,
    pub total_pages: usize,
    pub last_modified: Option<DateTime<Utc>>,
    pub days_since_update: Option<i64>,
    pub includes_images: bool,
    pub submitted_to_search_console: bool,
}

/// Site-wide measurements produced by the full-site crawl.
#[derive(Debug, Clone, Default)]
pub struct SiteCrawl {
    pub pages_crawled: usize,
    pub duplicate_titles: usize,
    pub missing_headings: usize,
    pub orphan_pages: usize,
    /// Pages at crawl depth >= 3.
    pub deep_links: usize,
}

/// Everything the evaluators need, fully materialized by the fetch stage.
/// Owned and `Send`; evaluators are pure functions over this snapshot.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: Url,
    pub status_code: u16,
    pub speed: SpeedStats,
    pub mobile: MobileStats,
    pub meta: MetaInfo,
    pub headings: HeadingStats,
    pub images: ImageStats,
    pub links: LinkStats,
    pub tls: TlsInfo,
    pub social: SocialTags,
    pub content: ContentStats,
    pub robots: RobotsInfo,
    pub sitemap: SitemapInfo,
    pub site: Option<SiteCrawl>,
}

impl PageSnapshot {
    /// Empty snapshot for a URL, useful as a test fixture base.
    pub fn empty(url: Url) -> Self {
        Self {
            url,
            status_code: 200,
            speed: SpeedStats::default(),
            mobile: MobileStats::default(),
            meta: MetaInfo::default(),
            headings: HeadingStats::default(),
            images: ImageStats::default(),
            links: LinkStats::default(),
            tls: TlsInfo::default(),
            social: SocialTags::default(),
            content: ContentStats::default(),
            robots: RobotsInfo::default(),
            sitemap: SitemapInfo::default(),
            site: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_thresholds_are_monotone() {
        assert_eq!(ScoreStatus::from_score(100), ScoreStatus::Excellent);
        assert_eq!(ScoreStatus::from_score(90), ScoreStatus::Excellent);
        assert_eq!(ScoreStatus::from_score(89), ScoreStatus::Good);
        assert_eq!(ScoreStatus::from_score(75), ScoreStatus::Good);
        assert_eq!(ScoreStatus::from_score(74), ScoreStatus::Warning);
        assert_eq!(ScoreStatus::from_score(60), ScoreStatus::Warning);
        assert_eq!(ScoreStatus::from_score(59), ScoreStatus::Poor);
        assert_eq!(ScoreStatus::from_score(0), ScoreStatus::Poor);
        // Total scores above 100 stay in the excellent band.
        assert_eq!(ScoreStatus::from_score(120), ScoreStatus::Excellent);
    }

    #[test]
    fn metric_result_clamps_score() {
        let low = MetricResult::new(-40, vec![], vec![], serde_json::json!({}));
        assert_eq!(low.score, 0);
        assert_eq!(low.status, ScoreStatus::Poor);

        let high = MetricResult::new(150, vec![], vec![], serde_json::json!({}));
        assert_eq!(high.score, 100);
        assert_eq!(high.status, ScoreStatus::Excellent);
    }

    #[test]
    fn metric_keys_serialize_to_wire_names() {
        for key in MetricKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn progress_event_serializes_tagged() {
        let event = ProgressEvent::Progress {
            message: "Analyzing page speed...".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["message"], "Analyzing page speed...");
        assert!(!event.is_terminal());
    }

    #[test]
    fn complete_event_serializes_report_under_data() {
        let report = AnalysisReport {
            url: "https://example.com/".to_string(),
            website_type: WebsiteType::Content,
            results: BTreeMap::new(),
            total_score: 96,
            status: ScoreStatus::Excellent,
        };
        let event = ProgressEvent::Complete {
            data: Box::new(report),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "complete");
        assert_eq!(json["data"]["url"], "https://example.com/");
        assert_eq!(json["data"]["totalScore"], 96);
        assert_eq!(json["data"]["status"], "excellent");
        assert_eq!(json["data"]["websiteType"], "content");
        assert!(event.is_terminal());
    }

    #[test]
    fn error_event_serializes_message() {
        let event = ProgressEvent::Error {
            message: "Fetch failed: HTTP 500".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "Fetch failed: HTTP 500");
        assert!(event.is_terminal());
    }
}
