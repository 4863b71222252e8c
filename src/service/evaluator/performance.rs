//! Performance-facing metrics: page speed, mobile readiness, images.

use serde_json::json;

use crate::domain::{MetricKey, MetricResult, WebsiteType};

use super::{EvalContext, MetricEvaluator, ScoreCard};

pub struct PageSpeedEvaluator;

impl MetricEvaluator for PageSpeedEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::PageSpeed
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let speed = &ctx.page.speed;
        let large_images = ctx.page.images.oversized;
        let mut card = ScoreCard::new();

        if speed.total_size_kb > 2000.0 {
            card.penalize(
                30,
                format!("Page is very heavy ({:.0} KB)", speed.total_size_kb),
            );
        } else if speed.total_size_kb > 1000.0 {
            card.penalize(15, format!("Page is heavy ({:.0} KB)", speed.total_size_kb));
        }

        if large_images > 5 {
            card.penalize(20, format!("{} images exceed 100 KB", large_images));
        } else if large_images > 2 {
            card.penalize(10, format!("{} images exceed 100 KB", large_images));
        }

        if speed.css_size_kb > 500.0 {
            card.penalize(10, format!("CSS weighs {:.0} KB", speed.css_size_kb));
        }
        if speed.js_size_kb > 500.0 {
            card.penalize(10, format!("JavaScript weighs {:.0} KB", speed.js_size_kb));
        }

        card.into_result(
            self.key(),
            json!({
                "loadTimeMs": speed.load_time_ms,
                "totalSizeKb": speed.total_size_kb,
                "imageSizeKb": speed.image_size_kb,
                "cssSizeKb": speed.css_size_kb,
                "jsSizeKb": speed.js_size_kb,
                "largeImages": large_images,
            }),
        )
    }
}

pub struct MobileOptimizationEvaluator;

impl MetricEvaluator for MobileOptimizationEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::MobileOptimization
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let mobile = &ctx.page.mobile;
        let mut card = ScoreCard::new();

        // Functional pages (search boxes, tools) tolerate denser layouts.
        match ctx.website_type {
            WebsiteType::Functional => {
                if !mobile.has_viewport {
                    card.penalize(15, "Missing viewport meta tag");
                }
                if mobile.small_touch_targets > 20 {
                    card.penalize(
                        10,
                        format!("{} touch targets are too small", mobile.small_touch_targets),
                    );
                }
            }
            WebsiteType::Content | WebsiteType::Ecommerce => {
                if !mobile.has_viewport {
                    card.penalize(30, "Missing viewport meta tag");
                }
                if mobile.small_touch_targets > 10 {
                    card.penalize(
                        15,
                        format!("{} touch targets are too small", mobile.small_touch_targets),
                    );
                }
            }
        }

        card.into_result(
            self.key(),
            json!({
                "hasViewport": mobile.has_viewport,
                "smallTouchTargets": mobile.small_touch_targets,
                "fontSize": mobile.base_font_px,
                "hasMobileMenu": mobile.has_mobile_menu,
            }),
        )
    }
}

pub struct ImageOptimizationEvaluator;

impl MetricEvaluator for ImageOptimizationEvaluator {
    fn key(&self) -> MetricKey {
        MetricKey::ImageOptimization
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricResult {
        let images = &ctx.page.images;
        let mut card = ScoreCard::new();
        let total = images.total;

        match ctx.website_type {
            WebsiteType::Functional => {
                if total > 0 && images.missing_alt * 2 > total {
                    card.penalize(
                        (images.missing_alt * 2) as i32,
                        format!("{} of {} images lack alt text", images.missing_alt, total),
                    );
                }
                if images.oversized > 5 {
                    card.penalize(10, format!("{} images exceed 100 KB", images.oversized));
                }
                if total > 0 && images.modern_format * 10 < total * 3 {
                    card.penalize(5, "Few images use modern formats (WebP/AVIF)");
                }
            }
            WebsiteType::Content | WebsiteType::Ecommerce => {
                if images.missing_alt > 0 {
                    card.penalize(
                        (images.missing_alt * 5) as i32,
                        format!("{} images lack alt text", images.missing_alt),
                    );
                }
                if images.oversized > 3 {
                    card.penalize(15, format!("{} images exceed 100 KB", images.oversized));
                }
                if total > 0 && images.modern_format * 2 < total {
                    card.penalize(10, "Under half of images use modern formats (WebP/AVIF)");
                }
            }
        }

        card.into_result(
            self.key(),
            json!({
                "totalImages": total,
                "missingAlt": images.missing_alt,
                "largeImages": images.oversized,
                "modernFormat": images.modern_format,
                "lazyLoaded": images.lazy_loaded,
            }),
        )
    }
}
