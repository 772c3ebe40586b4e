//! Per-feature weight allocation and normalization
//!
//! Weights are percentages in [0, 100] with a resting invariant: the total
//! across all four features never exceeds 100. The ceiling is enforced at
//! edit time by rejecting the offending edit, not by clamping or erroring.
//! Normalization converts the allocation into fractions summing to 1.0 over
//! the active feature subset for transmission to the scoring backend.

use super::Feature;
use serde::{Deserialize, Serialize};

/// Default percentage assigned to each feature (equal split)
pub const DEFAULT_WEIGHT: f64 = 25.0;

/// Total-weight ceiling for interactive editing
pub const WEIGHT_CEILING: f64 = 100.0;

const EPSILON: f64 = 1e-9;

/// Outcome of a weight edit
///
/// Rejection is a signalled boundary condition for UI feedback, not an
/// error; the stored weight is unchanged when rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightUpdate {
    /// Edit applied; carries the new total across all features
    Applied { total: f64 },
    /// Edit would push the total over the ceiling; weight unchanged
    RejectedOverBudget { attempted_total: f64 },
}

impl WeightUpdate {
    pub fn is_applied(&self) -> bool {
        matches!(self, WeightUpdate::Applied { .. })
    }
}

/// User-assigned percentage weights, one per feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeights {
    pub style: f64,
    pub texture: f64,
    pub color: f64,
    pub emotion: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            style: DEFAULT_WEIGHT,
            texture: DEFAULT_WEIGHT,
            color: DEFAULT_WEIGHT,
            emotion: DEFAULT_WEIGHT,
        }
    }
}

impl FeatureWeights {
    /// Weight assigned to one feature
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Style => self.style,
            Feature::Texture => self.texture,
            Feature::Color => self.color,
            Feature::Emotion => self.emotion,
        }
    }

    fn get_mut(&mut self, feature: Feature) -> &mut f64 {
        match feature {
            Feature::Style => &mut self.style,
            Feature::Texture => &mut self.texture,
            Feature::Color => &mut self.color,
            Feature::Emotion => &mut self.emotion,
        }
    }

    /// Total across all four features
    pub fn total(&self) -> f64 {
        Feature::ALL.iter().map(|f| self.get(*f)).sum()
    }

    /// Apply one weight edit, enforcing the 100% ceiling
    ///
    /// The new value is constrained to [0, 100] first. The ceiling is
    /// computed across all four features regardless of filter activity, so
    /// toggling a filter can never make a resting allocation invalid.
    pub fn set(&mut self, feature: Feature, value: f64) -> WeightUpdate {
        let value = value.clamp(0.0, WEIGHT_CEILING);
        let attempted_total = self.total() - self.get(feature) + value;

        if attempted_total > WEIGHT_CEILING + EPSILON {
            return WeightUpdate::RejectedOverBudget { attempted_total };
        }

        *self.get_mut(feature) = value;
        WeightUpdate::Applied {
            total: attempted_total,
        }
    }

    /// Restore the default equal split
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Normalize into fractions summing to 1.0 over the active subset
    ///
    /// Inactive features receive fraction 0.0 but are still present in the
    /// output (the wire contract never omits a weight field). An all-zero
    /// active sum falls back to an equal split across all four features
    /// rather than dividing by zero.
    pub fn normalize(&self, filters: &ActiveFilters) -> NormalizedWeights {
        let active_sum: f64 = Feature::ALL
            .iter()
            .filter(|f| filters.enabled(**f))
            .map(|f| self.get(*f))
            .sum();

        if active_sum <= EPSILON {
            let equal = 1.0 / Feature::ALL.len() as f64;
            return NormalizedWeights {
                style: equal,
                texture: equal,
                color: equal,
                emotion: equal,
            };
        }

        let fraction = |feature: Feature| {
            if filters.enabled(feature) {
                self.get(feature) / active_sum
            } else {
                0.0
            }
        };

        NormalizedWeights {
            style: fraction(Feature::Style),
            texture: fraction(Feature::Texture),
            color: fraction(Feature::Color),
            emotion: fraction(Feature::Emotion),
        }
    }
}

/// Per-feature participation flags
///
/// Disabled features are excluded from normalization and from the
/// result-breakdown fallback, but their weight fields still travel on the
/// wire (as 0.0) alongside their boolean flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFilters {
    pub style: bool,
    pub texture: bool,
    pub color: bool,
    pub emotion: bool,
}

impl Default for ActiveFilters {
    fn default() -> Self {
        Self {
            style: true,
            texture: true,
            color: true,
            emotion: true,
        }
    }
}

impl ActiveFilters {
    pub fn enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Style => self.style,
            Feature::Texture => self.texture,
            Feature::Color => self.color,
            Feature::Emotion => self.emotion,
        }
    }

    pub fn set(&mut self, feature: Feature, active: bool) {
        match feature {
            Feature::Style => self.style = active,
            Feature::Texture => self.texture = active,
            Feature::Color => self.color = active,
            Feature::Emotion => self.emotion = active,
        }
    }

    /// True when at least one feature participates
    pub fn any_enabled(&self) -> bool {
        Feature::ALL.iter().any(|f| self.enabled(*f))
    }

    /// Enabled features in canonical order
    pub fn enabled_features(&self) -> Vec<Feature> {
        Feature::ALL
            .iter()
            .copied()
            .filter(|f| self.enabled(*f))
            .collect()
    }
}

/// Normalized weight fractions as transmitted to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeights {
    pub style: f64,
    pub texture: f64,
    pub color: f64,
    pub emotion: f64,
}

impl NormalizedWeights {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Style => self.style,
            Feature::Texture => self.texture,
            Feature::Color => self.color,
            Feature::Emotion => self.emotion,
        }
    }

    /// Sum of all fractions (1.0 within floating-point tolerance)
    pub fn sum(&self) -> f64 {
        Feature::ALL.iter().map(|f| self.get(*f)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_equal_split() {
        let weights = FeatureWeights::default();
        assert_eq!(weights.total(), 100.0);
        for feature in Feature::ALL {
            assert_eq!(weights.get(feature), 25.0);
        }
    }

    #[test]
    fn test_set_within_ceiling_applies() {
        let mut weights = FeatureWeights::default();
        // 25 -> 0 frees headroom, then 25 -> 50 fills it back
        assert!(weights.set(Feature::Texture, 0.0).is_applied());
        assert!(weights.set(Feature::Style, 50.0).is_applied());
        assert_eq!(weights.get(Feature::Style), 50.0);
        assert_eq!(weights.total(), 100.0);
    }

    #[test]
    fn test_set_over_ceiling_rejected_and_unchanged() {
        let mut weights = FeatureWeights::default();
        let update = weights.set(Feature::Style, 26.0);
        match update {
            WeightUpdate::RejectedOverBudget { attempted_total } => {
                assert_eq!(attempted_total, 101.0);
            }
            WeightUpdate::Applied { .. } => panic!("edit should have been rejected"),
        }
        // Prior value retained
        assert_eq!(weights.get(Feature::Style), 25.0);
        assert_eq!(weights.total(), 100.0);
    }

    #[test]
    fn test_ceiling_holds_for_every_edit_sequence() {
        let mut weights = FeatureWeights::default();
        let edits = [
            (Feature::Style, 90.0),
            (Feature::Texture, 10.0),
            (Feature::Color, 0.0),
            (Feature::Emotion, 0.0),
            (Feature::Style, 95.0),
            (Feature::Texture, 5.0),
            (Feature::Emotion, 1.0),
            (Feature::Style, 200.0), // clamped to 100 before the check
        ];
        for (feature, value) in edits {
            weights.set(feature, value);
            assert!(
                weights.total() <= WEIGHT_CEILING + 1e-9,
                "total {} exceeded ceiling after setting {:?} to {}",
                weights.total(),
                feature,
                value
            );
        }
    }

    #[test]
    fn test_set_clamps_negative_values() {
        let mut weights = FeatureWeights::default();
        assert!(weights.set(Feature::Color, -5.0).is_applied());
        assert_eq!(weights.get(Feature::Color), 0.0);
    }

    #[test]
    fn test_normalize_sums_to_one() {
        let mut weights = FeatureWeights::default();
        weights.set(Feature::Style, 0.0);
        weights.set(Feature::Texture, 40.0);
        let normalized = weights.normalize(&ActiveFilters::default());
        assert!((normalized.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_all_zero_gives_equal_split() {
        let mut weights = FeatureWeights::default();
        for feature in Feature::ALL {
            weights.set(feature, 0.0);
        }
        let normalized = weights.normalize(&ActiveFilters::default());
        for feature in Feature::ALL {
            assert!((normalized.get(feature) - 0.25).abs() < 1e-9);
        }
        assert!((normalized.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_over_active_subset_only() {
        let weights = FeatureWeights::default();
        let mut filters = ActiveFilters::default();
        filters.set(Feature::Color, false);
        filters.set(Feature::Emotion, false);

        let normalized = weights.normalize(&filters);
        assert!((normalized.get(Feature::Style) - 0.5).abs() < 1e-9);
        assert!((normalized.get(Feature::Texture) - 0.5).abs() < 1e-9);
        // Inactive features still present, carrying zero
        assert_eq!(normalized.get(Feature::Color), 0.0);
        assert_eq!(normalized.get(Feature::Emotion), 0.0);
        assert!((normalized.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_partial_total() {
        // Total 60 normalizes to fractions of the active sum, not of 100
        let mut weights = FeatureWeights::default();
        weights.set(Feature::Style, 0.0);
        weights.set(Feature::Texture, 0.0);
        weights.set(Feature::Color, 0.0);
        weights.set(Feature::Emotion, 0.0);
        weights.set(Feature::Style, 40.0);
        weights.set(Feature::Color, 20.0);

        let normalized = weights.normalize(&ActiveFilters::default());
        assert!((normalized.get(Feature::Style) - 2.0 / 3.0).abs() < 1e-9);
        assert!((normalized.get(Feature::Color) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(normalized.get(Feature::Texture), 0.0);
    }

    #[test]
    fn test_reset_restores_default() {
        let mut weights = FeatureWeights::default();
        weights.set(Feature::Style, 0.0);
        weights.set(Feature::Emotion, 90.0);
        weights.reset();
        assert_eq!(weights, FeatureWeights::default());
    }

    #[test]
    fn test_filters_default_all_enabled() {
        let filters = ActiveFilters::default();
        assert!(filters.any_enabled());
        assert_eq!(filters.enabled_features(), Feature::ALL.to_vec());
    }

    #[test]
    fn test_no_filters_enabled() {
        let mut filters = ActiveFilters::default();
        for feature in Feature::ALL {
            filters.set(feature, false);
        }
        assert!(!filters.any_enabled());
        assert!(filters.enabled_features().is_empty());
    }
}
