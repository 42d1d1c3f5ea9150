//! Constraints evaluator (spec §4.8): apply a single disambiguating
//! constraint to a candidate list.

use crate::host::ElementHandle;
use crate::levenshtein;
use crate::model::{Constraint, PositionStrategy};
use crate::semantics::extract_from_handle;

fn normalized_text<E: ElementHandle>(el: &E) -> String {
    extract_from_handle(el, false)
        .text
        .map(|t| t.normalized)
        .unwrap_or_default()
}

fn apply_text_proximity<E: ElementHandle>(candidates: &[E], reference: &str, max_distance: usize) -> Vec<E> {
    candidates
        .iter()
        .filter(|el| levenshtein::distance(&normalized_text(el), reference) <= max_distance)
        .cloned()
        .collect()
}

fn apply_position<E: ElementHandle>(candidates: &[E], strategy: PositionStrategy) -> Vec<E> {
    match strategy {
        PositionStrategy::FirstInDom => candidates.first().cloned().into_iter().collect(),
        PositionStrategy::TopMost => candidates
            .iter()
            .filter_map(|el| el.bounding_rect().ok().map(|r| (el.clone(), r.top)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(el, _)| el)
            .into_iter()
            .collect(),
        PositionStrategy::LeftMost => candidates
            .iter()
            .filter_map(|el| el.bounding_rect().ok().map(|r| (el.clone(), r.left)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(el, _)| el)
            .into_iter()
            .collect(),
    }
}

/// Candidates preferred by visibility: non-hidden, non-zero-area rendered
/// boxes. If the preference yields nothing, the caller should keep the
/// original set — this function never eliminates all candidates itself, it
/// just reports the preferred subset (possibly empty).
fn visible_subset<E: ElementHandle>(candidates: &[E]) -> Vec<E> {
    candidates
        .iter()
        .filter(|el| {
            let style_ok = el
                .computed_style()
                .map(|s| !s.display_none && !s.visibility_hidden)
                .unwrap_or(true);
            let rect_ok = el.bounding_rect().map(|r| !r.is_zero_area()).unwrap_or(true);
            style_ok && rect_ok
        })
        .cloned()
        .collect()
}

/// Apply a visibility preference, falling back to the original set if the
/// preference would eliminate everything (spec §4.8, §4.9's implicit final
/// pass).
pub fn prefer_visible<E: ElementHandle>(candidates: &[E]) -> Vec<E> {
    let preferred = visible_subset(candidates);
    if preferred.is_empty() {
        candidates.to_vec()
    } else {
        preferred
    }
}

/// Apply `constraint` to `candidates`, returning the reduced list (spec
/// §4.8). `uniqueness` is a passthrough — the resolver treats its presence
/// as a hint, not a filter.
pub fn apply<E: ElementHandle>(candidates: &[E], constraint: &Constraint) -> Vec<E> {
    match constraint {
        Constraint::Uniqueness { .. } => candidates.to_vec(),
        Constraint::TextProximity { reference, max_distance, .. } => {
            apply_text_proximity(candidates, reference, *max_distance)
        }
        Constraint::Position { strategy, .. } => apply_position(candidates, *strategy),
        Constraint::Visibility { required, .. } => {
            if *required {
                prefer_visible(candidates)
            } else {
                candidates.to_vec()
            }
        }
    }
}
