//! Semantics matcher (spec §4.7): filter a candidate set down to the ones
//! whose extracted semantics agree with a reference value.

use crate::host::ElementHandle;
use crate::model::{Fingerprint, Semantics, TextMatchMode, TextSemantics};
use crate::semantics::extract_from_handle;
use crate::stability::clean_url_value;

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_matches(candidate: &TextSemantics, reference: &TextSemantics, relaxed: bool) -> bool {
    // Strict compares the raw (uncollapsed) text so the relaxed tier below
    // has somewhere to go; `normalized` is already whitespace-collapsed, so
    // comparing it in both modes would make relaxed a no-op.
    let (cand, refr) = if relaxed {
        (collapse_whitespace(&candidate.raw), collapse_whitespace(&reference.raw))
    } else {
        (candidate.raw.clone(), reference.raw.clone())
    };
    match reference.mode {
        Some(TextMatchMode::Partial) => cand.contains(&refr),
        _ => cand == refr,
    }
}

fn svg_matches(candidate: &Fingerprint, reference: &Fingerprint) -> bool {
    if candidate.shape != reference.shape {
        return false;
    }
    if let Some(want) = &reference.d_hash {
        if candidate.d_hash.as_ref() != Some(want) {
            return false;
        }
    }
    if let Some(want) = &reference.geom_hash {
        if candidate.geom_hash.as_ref() != Some(want) {
            return false;
        }
    }
    if let Some(want) = &reference.title_text {
        if candidate.title_text.as_ref() != Some(want) {
            return false;
        }
    }
    true
}

/// Does `candidate`'s extracted semantics satisfy every field set on
/// `reference`? `relaxed` enables the whitespace-collapsed text retry tier.
fn matches_one(candidate: &Semantics, reference: &Semantics, relaxed: bool) -> bool {
    if let Some(id) = &reference.id {
        if candidate.id.as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    for class in &reference.classes {
        if !candidate.classes.iter().any(|c| c == class) {
            return false;
        }
    }
    for (name, value) in &reference.attributes {
        let cleaned = candidate.attribute(name).map(clean_url_value);
        if cleaned.as_deref() != Some(value.as_str()) {
            return false;
        }
    }
    if let Some(reference_text) = &reference.text {
        match &candidate.text {
            Some(candidate_text) => {
                if !text_matches(candidate_text, reference_text, relaxed) {
                    return false;
                }
            }
            None => return false,
        }
    }
    if let Some(reference_svg) = &reference.svg {
        match &candidate.svg {
            Some(candidate_svg) => {
                if !svg_matches(candidate_svg, reference_svg) {
                    return false;
                }
            }
            None => return false,
        }
    }
    if let Some(role) = &reference.role {
        if candidate.role.as_deref() != Some(role.as_str()) {
            return false;
        }
    }
    true
}

/// Result of a matching pass: the surviving handles, plus whether the
/// relaxed text tier was needed to produce them.
pub struct MatchResult<E> {
    pub candidates: Vec<E>,
    pub relaxed: bool,
}

/// Filter `candidates` against `reference` (spec §4.7). Tries strict
/// matching first; if that yields nothing but `candidates` was non-empty,
/// retries with the relaxed whitespace-collapsed text tier.
pub fn filter_candidates<E: ElementHandle>(
    candidates: &[E],
    reference: &Semantics,
    include_utility_classes: bool,
) -> MatchResult<E> {
    let extracted: Vec<(E, Semantics)> = candidates
        .iter()
        .map(|el| (el.clone(), extract_from_handle(el, include_utility_classes)))
        .collect();

    let strict: Vec<E> = extracted
        .iter()
        .filter(|(_, sem)| matches_one(sem, reference, false))
        .map(|(el, _)| el.clone())
        .collect();

    if !strict.is_empty() || candidates.is_empty() {
        return MatchResult { candidates: strict, relaxed: false };
    }

    let relaxed: Vec<E> = extracted
        .iter()
        .filter(|(_, sem)| matches_one(sem, reference, true))
        .map(|(el, _)| el.clone())
        .collect();

    MatchResult {
        candidates: relaxed,
        relaxed: true,
    }
}
