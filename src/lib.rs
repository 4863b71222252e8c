//! On-page SEO analysis and scoring engine.
//!
//! One run fetches a page (plus robots.txt, sitemap.xml, asset sizes and
//! optionally a bounded site crawl), classifies the site, evaluates 12
//! independent metrics, and aggregates them into a weighted total on a
//! 0-120 scale. Progress streams through [`service::ProgressChannel`];
//! [`service::AnalysisPipeline`] is the entry point.

pub mod domain;
pub mod error;
pub mod extractor;
pub mod service;

pub use domain::{
    AnalysisReport, MetricKey, MetricResult, PageSnapshot, ProgressEvent, ScoreStatus, WebsiteType,
};
pub use error::{AppError, Result};
pub use service::{AnalysisPipeline, PipelineConfig, ProgressChannel};
