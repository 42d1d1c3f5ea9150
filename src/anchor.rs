//! Anchor finder (spec §4.4): walk ancestors from a target upward, scoring
//! each candidate, and return the best semantic root.

use crate::host::ElementHandle;
use crate::scoring::ScoringWeights;
use crate::stability::{is_identifier_stable, is_test_marker_attribute};

/// Tags whose presence alone marks a strong semantic landmark.
pub const TIER_A_TAGS: &[&str] = &[
    "main", "nav", "header", "footer", "section", "article", "aside", "form", "dialog", "table",
    "ul", "ol", "dl", "fieldset", "figure",
];

/// ARIA roles that mark a semantic landmark, one tier down from Tier A.
pub const TIER_B_ROLES: &[&str] = &[
    "main",
    "navigation",
    "banner",
    "contentinfo",
    "form",
    "search",
    "dialog",
    "region",
    "complementary",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    A,
    B,
    C,
    None,
}

fn classify_tier(tag: &str, role: Option<&str>, has_test_marker: bool, has_stable_id: bool) -> Tier {
    if TIER_A_TAGS.contains(&tag) {
        return Tier::A;
    }
    if let Some(r) = role {
        if TIER_B_ROLES.contains(&r) {
            return Tier::B;
        }
    }
    if has_test_marker || has_stable_id {
        return Tier::C;
    }
    Tier::None
}

/// The anchor finder's result: the chosen element, its score, tier, and the
/// number of ancestor steps it took to reach it.
pub struct AnchorResult<E> {
    pub element: E,
    pub score: f64,
    pub tier: Tier,
    pub depth: u32,
    pub degraded: bool,
}

fn has_aria_label(el: &impl ElementHandle) -> bool {
    el.attribute("aria-label").is_some() || el.attribute("aria-labelledby").is_some()
}

fn count_test_markers(el: &impl ElementHandle) -> u32 {
    el.attributes()
        .iter()
        .filter(|(name, _)| is_test_marker_attribute(name))
        .count() as u32
}

fn has_stable_id(el: &impl ElementHandle) -> bool {
    el.id_attr()
        .map(|id| is_identifier_stable(&id))
        .unwrap_or(false)
}

fn score_candidate(el: &impl ElementHandle, tier: Tier, depth: u32, weights: &ScoringWeights) -> f64 {
    let mut score = match tier {
        Tier::A => weights.anchor_tier_a_base,
        Tier::B => weights.anchor_tier_b_base,
        Tier::C => weights.anchor_tier_c_base,
        Tier::None => 0.0,
    };
    if has_aria_label(el) {
        score += weights.anchor_label_bonus;
    }
    if has_stable_id(el) {
        score += weights.anchor_stable_id_bonus;
    }
    score += weights.anchor_test_marker_bonus * count_test_markers(el) as f64;
    if depth > weights.anchor_depth_penalty_threshold {
        let over = (depth - weights.anchor_depth_penalty_threshold) as f64;
        score -= weights.anchor_depth_penalty_per_step * over;
    }
    score.clamp(0.0, 1.0)
}

/// Walk ancestors from `target` upward looking for the best anchor.
/// Returns `None` for an orphan element (no parent at all).
pub fn find_anchor<E: ElementHandle>(
    target: &E,
    max_path_depth: u32,
    weights: &ScoringWeights,
) -> Option<AnchorResult<E>> {
    let mut current = target.parent()?;
    let mut depth: u32 = 1;
    // Only Tier A/B/C elements are real candidates; a Tier::None ancestor is
    // skipped over (but still counted toward depth) rather than winning by
    // default.
    let mut best: Option<AnchorResult<E>> = None;

    loop {
        let tag = current.tag();
        let role = current.attribute("role");
        let test_markers = count_test_markers(&current) > 0;
        let stable_id = has_stable_id(&current);
        let tier = classify_tier(&tag, role.as_deref(), test_markers, stable_id);
        let score = score_candidate(&current, tier, depth, weights);

        if tier != Tier::None {
            let is_better = best.as_ref().map(|b| score > b.score).unwrap_or(true);
            if is_better {
                best = Some(AnchorResult {
                    element: current.clone(),
                    score,
                    tier,
                    depth,
                    degraded: false,
                });
            }
        }

        if tier == Tier::A {
            return Some(AnchorResult {
                element: current,
                score,
                tier,
                depth,
                degraded: false,
            });
        }

        if depth >= max_path_depth {
            return Some(best.unwrap_or(AnchorResult {
                element: current,
                score,
                tier,
                degraded: true,
                depth,
            }));
        }

        let is_body = tag == "body";
        let parent = current.parent();
        if is_body || parent.is_none() {
            return Some(best.unwrap_or(AnchorResult {
                element: current,
                score,
                tier,
                depth,
                degraded: true,
            }));
        }
        current = parent.unwrap();
        depth += 1;
    }
}
