//! Scoring constants and confidence arithmetic (spec §4.10, §9).
//!
//! Kept as a flat, overridable struct rather than global constants — spec §9
//! calls this out explicitly ("no class hierarchy is warranted").

use crate::model::{Node, Semantics};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    // Anchor tiers (§4.4).
    pub anchor_tier_a_base: f64,
    pub anchor_tier_b_base: f64,
    pub anchor_tier_c_base: f64,
    pub anchor_label_bonus: f64,
    pub anchor_stable_id_bonus: f64,
    pub anchor_test_marker_bonus: f64,
    pub anchor_depth_penalty_per_step: f64,
    pub anchor_depth_penalty_threshold: u32,

    // Per-element score (§4.10).
    pub element_base: f64,
    pub element_id_bonus: f64,
    pub element_classes_bonus: f64,
    pub element_attributes_bonus: f64,
    pub element_role_bonus: f64,
    pub element_text_bonus: f64,

    // Overall confidence (§4.10).
    pub confidence_anchor_weight: f64,
    pub confidence_path_weight: f64,
    pub confidence_target_weight: f64,
    pub confidence_uniqueness_weight: f64,
    pub confidence_degradation_penalty: f64,
    pub path_score_default_when_empty: f64,

    // Resolver constraint-application degradation (§4.9 phase 4).
    pub constraint_applied_degradation_factor: f64,

    /// Minimum element score a skipped path intermediate must clear before
    /// the path builder will reinsert it while hunting for uniqueness
    /// (§4.5 step 5).
    pub path_skip_reinsert_min_score: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            anchor_tier_a_base: 0.9,
            anchor_tier_b_base: 0.6,
            anchor_tier_c_base: 0.4,
            anchor_label_bonus: 0.1,
            anchor_stable_id_bonus: 0.25,
            anchor_test_marker_bonus: 0.1,
            anchor_depth_penalty_per_step: 0.05,
            anchor_depth_penalty_threshold: 5,

            element_base: 0.5,
            element_id_bonus: 0.15,
            element_classes_bonus: 0.1,
            element_attributes_bonus: 0.1,
            element_role_bonus: 0.1,
            element_text_bonus: 0.1,

            confidence_anchor_weight: 0.4,
            confidence_path_weight: 0.3,
            confidence_target_weight: 0.2,
            confidence_uniqueness_weight: 0.1,
            confidence_degradation_penalty: 0.2,
            path_score_default_when_empty: 0.5,

            constraint_applied_degradation_factor: 0.9,
            path_skip_reinsert_min_score: 0.55,
        }
    }
}

/// Per-element score: base + small per-feature increments, capped at 1.0
/// (spec §4.10, first paragraph). Not used for the anchor itself, which is
/// scored by `score_anchor` instead.
pub fn score_element(semantics: &Semantics, weights: &ScoringWeights) -> f64 {
    let mut score = weights.element_base;
    if semantics.id.is_some() {
        score += weights.element_id_bonus;
    }
    if !semantics.classes.is_empty() {
        score += weights.element_classes_bonus;
    }
    if !semantics.attributes.is_empty() {
        score += weights.element_attributes_bonus;
    }
    if semantics.role.is_some() {
        score += weights.element_role_bonus;
    }
    if semantics.text.is_some() {
        score += weights.element_text_bonus;
    }
    score.clamp(0.0, 1.0)
}

/// Average of a path's node scores, defaulting to `path_score_default_when_empty`
/// when the path has no intermediate nodes.
pub fn average_path_score(path: &[Node], weights: &ScoringWeights) -> f64 {
    if path.is_empty() {
        return weights.path_score_default_when_empty;
    }
    path.iter().map(|n| n.score).sum::<f64>() / path.len() as f64
}

/// Overall confidence (§4.10, second paragraph).
pub fn overall_confidence(
    anchor_score: f64,
    path: &[Node],
    target_score: f64,
    uniqueness_factor: f64,
    anchor_degraded: bool,
    path_degraded: bool,
    weights: &ScoringWeights,
) -> f64 {
    let path_avg = average_path_score(path, weights);
    let mut confidence = anchor_score * weights.confidence_anchor_weight
        + path_avg * weights.confidence_path_weight
        + target_score * weights.confidence_target_weight
        + uniqueness_factor * weights.confidence_uniqueness_weight;
    if anchor_degraded || path_degraded {
        confidence -= weights.confidence_degradation_penalty;
    }
    confidence.clamp(0.0, 1.0)
}
