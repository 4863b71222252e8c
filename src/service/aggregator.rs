//! Weighted score aggregation.

use std::collections::BTreeMap;

use crate::domain::{MetricKey, MetricResult, ScoreStatus, SCALE_MULTIPLIER};
use crate::service::weights::WeightProfile;

/// Combine the 12 metric results into one total using the selected
/// profile: `round(weighted_sum / 100 * 1.2)`, clamped to [0, 120].
///
/// The status bands stay at the absolute 100-basis cut points even though
/// the ceiling is 120, so totals in the excellent band are reachable
/// below perfect performance.
pub fn aggregate(
    results: &BTreeMap<MetricKey, MetricResult>,
    profile: &WeightProfile,
) -> (u32, ScoreStatus) {
    let weighted_sum: u32 = profile
        .weights()
        .map(|(key, weight)| {
            results
                .get(&key)
                .map(|r| r.score as u32 * weight)
                .unwrap_or(0)
        })
        .sum();

    // Weights sum to 100 by construction, so this is the 0-100 base score
    // before the scale multiplier.
    let total = ((weighted_sum as f64 / 100.0) * SCALE_MULTIPLIER).round() as u32;
    let total = total.min(120);

    (total, ScoreStatus::from_score(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WebsiteType;
    use crate::service::weights::profile_for;

    fn results_with_scores(scores: &[(MetricKey, u8)]) -> BTreeMap<MetricKey, MetricResult> {
        MetricKey::ALL
            .iter()
            .map(|&key| {
                let score = scores
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, s)| *s as i32)
                    .unwrap_or(0);
                (
                    key,
                    MetricResult::new(score, vec![], vec![], serde_json::json!({})),
                )
            })
            .collect()
    }

    fn uniform_results(score: u8) -> BTreeMap<MetricKey, MetricResult> {
        results_with_scores(&MetricKey::ALL.map(|k| (k, score)))
    }

    #[test]
    fn perfect_metrics_reach_the_120_ceiling() {
        let profile = profile_for(WebsiteType::Content);
        let (total, status) = aggregate(&uniform_results(100), &profile);
        assert_eq!(total, 120);
        assert_eq!(status, ScoreStatus::Excellent);
    }

    #[test]
    fn zero_metrics_score_zero() {
        let profile = profile_for(WebsiteType::Functional);
        let (total, status) = aggregate(&uniform_results(0), &profile);
        assert_eq!(total, 0);
        assert_eq!(status, ScoreStatus::Poor);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let profile = profile_for(WebsiteType::Ecommerce);
        let results = uniform_results(73);
        assert_eq!(aggregate(&results, &profile), aggregate(&results, &profile));
    }

    #[test]
    fn worked_example_matches_hand_computation() {
        // Content profile, mixed scores; hand-computed weighted sum is
        // 7760, so the total is round(77.6 * 1.2) = 93.
        let results = results_with_scores(&[
            (MetricKey::PageSpeed, 80),
            (MetricKey::MobileOptimization, 90),
            (MetricKey::MetaTags, 70),
            (MetricKey::HeadingStructure, 60),
            (MetricKey::ImageOptimization, 75),
            (MetricKey::InternalLinking, 85),
            (MetricKey::SslCertificate, 100),
            (MetricKey::SocialMediaTags, 50),
            (MetricKey::ContentQuality, 65),
            (MetricKey::UrlStructure, 90),
            (MetricKey::RobotsTxt, 100),
            (MetricKey::Sitemap, 80),
        ]);

        let profile = profile_for(WebsiteType::Content);
        let (total, status) = aggregate(&results, &profile);
        assert!((92..=94).contains(&total), "total was {}", total);
        assert_eq!(status, ScoreStatus::Excellent);
    }

    #[test]
    fn status_keeps_absolute_cut_points_on_the_120_basis() {
        // A uniform 80 gives total round(80 * 1.2) = 96: excellent even
        // though every metric is merely "good".
        let profile = profile_for(WebsiteType::Content);
        let (total, status) = aggregate(&uniform_results(80), &profile);
        assert_eq!(total, 96);
        assert_eq!(status, ScoreStatus::Excellent);
    }
}
