//! Per-category weight profiles.
//!
//! Fixed, process-wide constant data. Each profile covers all 12 metric
//! keys and sums to exactly 100; `validate_profiles` enforces that at
//! pipeline construction so a malformed table fails fast instead of
//! skewing every run.

use crate::domain::{MetricKey, WebsiteType};
use crate::error::{AppError, Result};

/// Percentage allocation of the 100-point basis across the 12 metrics.
#[derive(Debug, Clone, Copy)]
pub struct WeightProfile {
    pub category: WebsiteType,
    weights: &'static [(MetricKey, u32); 12],
}

impl WeightProfile {
    pub fn weight(&self, key: MetricKey) -> u32 {
        self.weights
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, w)| *w)
            .unwrap_or(0)
    }

    pub fn weights(&self) -> impl Iterator<Item = (MetricKey, u32)> + '_ {
        self.weights.iter().copied()
    }

    fn sum(&self) -> u32 {
        self.weights.iter().map(|(_, w)| w).sum()
    }
}

const CONTENT_WEIGHTS: [(MetricKey, u32); 12] = [
    (MetricKey::PageSpeed, 18),
    (MetricKey::MobileOptimization, 15),
    (MetricKey::ContentQuality, 20),
    (MetricKey::MetaTags, 12),
    (MetricKey::SslCertificate, 10),
    (MetricKey::HeadingStructure, 8),
    (MetricKey::InternalLinking, 7),
    (MetricKey::ImageOptimization, 5),
    (MetricKey::SocialMediaTags, 2),
    (MetricKey::UrlStructure, 2),
    (MetricKey::RobotsTxt, 1),
    (MetricKey::Sitemap, 0),
];

const FUNCTIONAL_WEIGHTS: [(MetricKey, u32); 12] = [
    (MetricKey::PageSpeed, 25),
    (MetricKey::MobileOptimization, 20),
    (MetricKey::SslCertificate, 18),
    (MetricKey::InternalLinking, 10),
    (MetricKey::ContentQuality, 8),
    (MetricKey::MetaTags, 6),
    (MetricKey::UrlStructure, 5),
    (MetricKey::ImageOptimization, 3),
    (MetricKey::HeadingStructure, 2),
    (MetricKey::RobotsTxt, 2),
    (MetricKey::Sitemap, 1),
    (MetricKey::SocialMediaTags, 0),
];

const ECOMMERCE_WEIGHTS: [(MetricKey, u32); 12] = [
    (MetricKey::MobileOptimization, 18),
    (MetricKey::PageSpeed, 16),
    (MetricKey::SslCertificate, 15),
    (MetricKey::MetaTags, 14),
    (MetricKey::ContentQuality, 12),
    (MetricKey::ImageOptimization, 10),
    (MetricKey::InternalLinking, 8),
    (MetricKey::SocialMediaTags, 4),
    (MetricKey::UrlStructure, 2),
    (MetricKey::HeadingStructure, 1),
    (MetricKey::RobotsTxt, 0),
    (MetricKey::Sitemap, 0),
];

/// Static lookup: one profile per category, total over the enum.
pub fn profile_for(category: WebsiteType) -> WeightProfile {
    match category {
        WebsiteType::Content => WeightProfile {
            category,
            weights: &CONTENT_WEIGHTS,
        },
        WebsiteType::Functional => WeightProfile {
            category,
            weights: &FUNCTIONAL_WEIGHTS,
        },
        WebsiteType::Ecommerce => WeightProfile {
            category,
            weights: &ECOMMERCE_WEIGHTS,
        },
    }
}

/// Check every profile covers all 12 keys and sums to 100.
pub fn validate_profiles() -> Result<()> {
    for category in [
        WebsiteType::Content,
        WebsiteType::Functional,
        WebsiteType::Ecommerce,
    ] {
        let profile = profile_for(category);

        for key in MetricKey::ALL {
            if !profile.weights.iter().any(|(k, _)| *k == key) {
                return Err(AppError::ConfigFault(format!(
                    "profile {} is missing metric {}",
                    category.as_str(),
                    key
                )));
            }
        }

        let sum = profile.sum();
        if sum != 100 {
            return Err(AppError::ConfigFault(format!(
                "profile {} weights sum to {} (expected 100)",
                category.as_str(),
                sum
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_profiles_are_valid() {
        validate_profiles().expect("built-in profiles must validate");
    }

    #[test]
    fn every_profile_sums_to_100() {
        for category in [
            WebsiteType::Content,
            WebsiteType::Functional,
            WebsiteType::Ecommerce,
        ] {
            assert_eq!(profile_for(category).sum(), 100, "{:?}", category);
        }
    }

    #[test]
    fn leading_weights_match_the_scoring_contract() {
        let content = profile_for(WebsiteType::Content);
        assert_eq!(content.weight(MetricKey::ContentQuality), 20);
        assert_eq!(content.weight(MetricKey::PageSpeed), 18);
        assert_eq!(content.weight(MetricKey::MobileOptimization), 15);
        assert_eq!(content.weight(MetricKey::MetaTags), 12);
        assert_eq!(content.weight(MetricKey::SslCertificate), 10);

        let functional = profile_for(WebsiteType::Functional);
        assert_eq!(functional.weight(MetricKey::PageSpeed), 25);
        assert_eq!(functional.weight(MetricKey::MobileOptimization), 20);
        assert_eq!(functional.weight(MetricKey::SslCertificate), 18);
        assert_eq!(functional.weight(MetricKey::InternalLinking), 10);

        let ecommerce = profile_for(WebsiteType::Ecommerce);
        assert_eq!(ecommerce.weight(MetricKey::MobileOptimization), 18);
        assert_eq!(ecommerce.weight(MetricKey::PageSpeed), 16);
        assert_eq!(ecommerce.weight(MetricKey::SslCertificate), 15);
        assert_eq!(ecommerce.weight(MetricKey::MetaTags), 14);
    }

    #[test]
    fn unknown_weight_lookup_defaults_to_zero() {
        // Sitemap carries zero weight for content sites by design.
        assert_eq!(profile_for(WebsiteType::Content).weight(MetricKey::Sitemap), 0);
    }
}
