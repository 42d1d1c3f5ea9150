//! Resolver (spec §4.9): a five-phase state machine turning an EID back
//! into live elements against a root.

use tracing::{debug, warn};

use crate::constraints;
use crate::host::{ElementHandle, QueryEngine};
use crate::matcher;
use crate::model::{degradation_reason, Eid, OnMissing, OnMultiple};
use crate::scoring::{score_element, ScoringWeights};
use crate::selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Ambiguous,
    Error,
    DegradedFallback,
}

pub struct ResolveOptions {
    pub strict_mode: bool,
    pub enable_fallback: bool,
    pub max_candidates: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strict_mode: false,
            enable_fallback: true,
            max_candidates: 20,
        }
    }
}

pub struct ResolveResult<E> {
    pub status: Status,
    pub elements: Vec<E>,
    pub warnings: Vec<String>,
    pub confidence: f64,
    pub degraded: bool,
    pub degradation_reason: Option<String>,
}

impl<E> ResolveResult<E> {
    fn error(reason: &str, warnings: Vec<String>) -> Self {
        Self {
            status: Status::Error,
            elements: vec![],
            warnings,
            confidence: 0.0,
            degraded: true,
            degradation_reason: Some(reason.to_string()),
        }
    }
}

fn degrade_reason_str(reason: &str) -> Option<String> {
    Some(reason.to_string())
}

/// Resolve a sub-descriptor containing only an anchor, with an empty path
/// and the anchor acting as its own target — used by the anchor-only
/// fallback.
fn anchor_only_eid(eid: &Eid) -> Eid {
    Eid {
        version: eid.version.clone(),
        anchor: eid.anchor.clone(),
        path: vec![],
        target: eid.anchor.clone(),
        constraints: vec![],
        fallback: eid.fallback.clone(),
        meta: eid.meta.clone(),
    }
}

/// Resolve `eid` against `root` using `engine` to query selectors (spec
/// §4.9). Cross-document roots are rejected cheaply via document identity.
pub fn resolve<E: ElementHandle, Q: QueryEngine<E>>(
    eid: &Eid,
    root: &E,
    engine: &Q,
    options: &ResolveOptions,
) -> ResolveResult<E> {
    resolve_inner(eid, root, engine, options, true)
}

fn resolve_inner<E: ElementHandle, Q: QueryEngine<E>>(
    eid: &Eid,
    root: &E,
    engine: &Q,
    options: &ResolveOptions,
    allow_fallback: bool,
) -> ResolveResult<E> {
    let mut warnings = Vec::new();

    // Phase 1 — CSS narrowing.
    let compiled = selector::compile_and_query(&eid.anchor, &eid.path, &eid.target, root, engine);
    debug!(selector = %compiled.selector, strategy = compiled.strategy, "resolver phase 1: css narrowing");
    if compiled.query_error {
        warnings.push(format!("selector {:?} was rejected by the host", compiled.selector));
        return ResolveResult::error(degradation_reason::INVALID_SELECTOR, warnings);
    }
    let mut candidates = compiled.matches;
    if candidates.len() > options.max_candidates {
        candidates.truncate(options.max_candidates);
    }
    let phase1_count = candidates.len();
    warnings.push(format!("phase 1 produced {phase1_count} candidate(s)"));

    // Phase 2 — semantics filtering, with relaxed-text retry.
    let match_result = matcher::filter_candidates(&candidates, &eid.target.semantics, false);
    debug!(
        survivors = match_result.candidates.len(),
        relaxed = match_result.relaxed,
        "resolver phase 2: semantics filtering"
    );
    let mut candidates = match_result.candidates;
    let mut relaxed_text = match_result.relaxed;
    if candidates.is_empty() && phase1_count > 0 && !relaxed_text {
        // filter_candidates already tried the relaxed tier internally when
        // strict yielded nothing; nothing further to retry here.
        warnings.push("phase 2 reduced candidates to zero".to_string());
    }
    if relaxed_text {
        warnings.push("relaxed text matching was required".to_string());
    }

    // Phase 3 — uniqueness check.
    if candidates.len() == 1 {
        let confidence = if relaxed_text {
            eid.meta.confidence * 0.9
        } else {
            eid.meta.confidence
        };
        return ResolveResult {
            status: Status::Success,
            elements: candidates,
            warnings,
            confidence,
            degraded: relaxed_text,
            degradation_reason: relaxed_text
                .then(|| degradation_reason::RELAXED_TEXT_MATCHING.to_string()),
        };
    }
    if candidates.is_empty() {
        warn!("resolver: zero candidates after phase 2");
        if !options.enable_fallback || !allow_fallback {
            return ResolveResult::error(degradation_reason::NOT_FOUND, warnings);
        }
        return fallback(eid, root, engine, options, warnings);
    }

    // Phase 4 — constraints, sorted by priority descending.
    let mut sorted_constraints = eid.constraints.clone();
    sorted_constraints.sort_by(|a, b| b.priority().cmp(&a.priority()));
    for constraint in &sorted_constraints {
        let reduced = constraints::apply(&candidates, constraint);
        debug!(remaining = reduced.len(), "resolver phase 4: constraint applied");
        if reduced.is_empty() {
            warnings.push("a constraint emptied the candidate set".to_string());
            if !options.enable_fallback || !allow_fallback {
                return ResolveResult::error(degradation_reason::OVER_CONSTRAINED, warnings);
            }
            return fallback(eid, root, engine, options, warnings);
        }
        candidates = reduced;
        if candidates.len() == 1 {
            return ResolveResult {
                status: Status::Success,
                elements: candidates,
                warnings,
                confidence: eid.meta.confidence * 0.9,
                // No string in the public contract set names "narrowed to
                // one by a constraint" — `degraded` alone covers it.
                degradation_reason: None,
            };
        }
    }

    // Phase 5 — ambiguity handling.
    let visible_preferred = constraints::prefer_visible(&candidates);
    let candidates = if candidates.len() >= 2 { visible_preferred } else { candidates };

    if options.strict_mode {
        return ResolveResult {
            status: Status::Ambiguous,
            elements: candidates,
            warnings,
            confidence: eid.meta.confidence * 0.7,
            degraded: true,
            degradation_reason: degrade_reason_str(degradation_reason::AMBIGUOUS),
        };
    }

    match eid.fallback.on_multiple {
        OnMultiple::First => ResolveResult {
            status: Status::Success,
            elements: candidates.first().cloned().into_iter().collect(),
            warnings,
            confidence: eid.meta.confidence * 0.7,
            degraded: true,
            degradation_reason: degrade_reason_str(degradation_reason::AMBIGUOUS),
        },
        OnMultiple::BestScore => {
            let weights = ScoringWeights::default();
            let best = candidates
                .iter()
                .map(|el| {
                    let semantics = crate::semantics::extract_from_handle(el, false);
                    (el.clone(), score_element(&semantics, &weights))
                })
                .fold(None::<(E, f64)>, |acc, (el, score)| match acc {
                    Some((best_el, best_score)) if best_score >= score => Some((best_el, best_score)),
                    _ => Some((el, score)),
                })
                .map(|(el, _)| el);
            ResolveResult {
                status: Status::Success,
                elements: best.into_iter().collect(),
                warnings,
                confidence: eid.meta.confidence * 0.7,
                degraded: true,
                degradation_reason: degrade_reason_str(degradation_reason::AMBIGUOUS),
            }
        }
        OnMultiple::AllowMultiple => ResolveResult {
            status: Status::Success,
            elements: candidates,
            warnings,
            confidence: eid.meta.confidence * 0.5,
            degraded: true,
            degradation_reason: degrade_reason_str(degradation_reason::AMBIGUOUS),
        },
    }
}

fn fallback<E: ElementHandle, Q: QueryEngine<E>>(
    eid: &Eid,
    root: &E,
    engine: &Q,
    options: &ResolveOptions,
    mut warnings: Vec<String>,
) -> ResolveResult<E> {
    match eid.fallback.on_missing {
        OnMissing::None | OnMissing::Strict => {
            ResolveResult::error(degradation_reason::NOT_FOUND, warnings)
        }
        OnMissing::AnchorOnly => {
            warnings.push("falling back to anchor-only resolution".to_string());
            let sub = anchor_only_eid(eid);
            let sub_result = resolve_inner(&sub, root, engine, options, false);
            ResolveResult {
                status: if sub_result.elements.is_empty() {
                    Status::Error
                } else {
                    Status::DegradedFallback
                },
                elements: sub_result.elements,
                warnings: {
                    warnings.extend(sub_result.warnings);
                    warnings
                },
                confidence: eid.meta.confidence * 0.3,
                degraded: true,
                degradation_reason: degrade_reason_str(degradation_reason::ANCHOR_ONLY_FALLBACK),
            }
        }
    }
}

/// True if `root` and the element the EID was generated against are
/// provably in different documents. The caller should check this before
/// invoking `resolve` with a candidate `root`.
pub fn is_cross_document<E: ElementHandle>(root: &E, generated_against: &E) -> bool {
    root.document_id() != generated_against.document_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::scraper_host::{leak_document, ScraperHandle, ScraperQueryEngine};
    use crate::model::{Constraint, FallbackPolicy, Meta, Node, Semantics};

    fn select_one(html: &str, sel: &str) -> ScraperHandle {
        let doc = leak_document(html);
        let s = scraper::Selector::parse(sel).unwrap();
        ScraperHandle::new(doc.select(&s).next().unwrap())
    }

    fn meta(confidence: f64) -> Meta {
        Meta {
            confidence,
            generated_at: 0,
            generator: "test".into(),
            source: None,
            degraded: false,
            degradation_reason: None,
        }
    }

    #[test]
    fn unique_match_succeeds_unchanged_confidence() {
        let root = select_one(
            r#"<form id="login"><button id="submit">Go</button></form>"#,
            "#login",
        );
        let eid = Eid {
            version: "1.0".into(),
            anchor: Node::new("form", Semantics { id: Some("login".into()), ..Default::default() }, 0.9),
            path: vec![],
            target: Node::new("button", Semantics { id: Some("submit".into()), ..Default::default() }, 0.8),
            constraints: vec![],
            fallback: FallbackPolicy::default(),
            meta: meta(0.95),
        };
        let result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
        assert_eq!(result.status, Status::Success);
        assert_eq!(result.elements.len(), 1);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn strict_mode_returns_ambiguous_with_penalty() {
        let root = select_one(
            r#"<form id="login"><button class="x">A</button><button class="x">B</button></form>"#,
            "#login",
        );
        let eid = Eid {
            version: "1.0".into(),
            anchor: Node::new("form", Semantics { id: Some("login".into()), ..Default::default() }, 0.9),
            path: vec![],
            target: Node::new("button", Semantics::default(), 0.5),
            constraints: vec![],
            fallback: FallbackPolicy::default(),
            meta: meta(1.0),
        };
        let opts = ResolveOptions { strict_mode: true, ..ResolveOptions::default() };
        let result = resolve(&eid, &root, &ScraperQueryEngine, &opts);
        assert_eq!(result.status, Status::Ambiguous);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn anchor_only_fallback_on_missing_target() {
        let root = select_one(r#"<form id="login"></form>"#, "#login");
        let eid = Eid {
            version: "1.0".into(),
            anchor: Node::new("form", Semantics { id: Some("login".into()), ..Default::default() }, 0.9),
            path: vec![],
            target: Node::new(
                "button",
                Semantics { id: Some("gone".into()), ..Default::default() },
                0.5,
            ),
            constraints: vec![],
            fallback: FallbackPolicy::default(),
            meta: meta(1.0),
        };
        let result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
        assert_eq!(result.status, Status::DegradedFallback);
        assert_eq!(
            result.degradation_reason.as_deref(),
            Some(degradation_reason::ANCHOR_ONLY_FALLBACK)
        );
        assert_eq!(result.confidence, 0.3);
    }

    #[test]
    fn constraint_applied_degrades_confidence() {
        let root = select_one(
            r#"<form id="login"><button>Save</button><button>Cancel</button></form>"#,
            "#login",
        );
        let eid = Eid {
            version: "1.0".into(),
            anchor: Node::new("form", Semantics { id: Some("login".into()), ..Default::default() }, 0.9),
            path: vec![],
            target: Node::new("button", Semantics::default(), 0.5),
            constraints: vec![Constraint::TextProximity {
                reference: "Save".into(),
                max_distance: 0,
                priority: 10,
            }],
            fallback: FallbackPolicy::default(),
            meta: meta(1.0),
        };
        let result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
        assert_eq!(result.status, Status::Success);
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn unparseable_selector_reports_invalid_selector() {
        let root = select_one(r#"<form><button>Go</button></form>"#, "form");
        let eid = Eid {
            version: "1.0".into(),
            // A leading-digit id renders as `#1bad`, which is not a valid
            // CSS identifier and every compiled strategy embeds it.
            anchor: Node::new("form", Semantics { id: Some("1bad".into()), ..Default::default() }, 0.9),
            path: vec![],
            target: Node::new("button", Semantics::default(), 0.5),
            constraints: vec![],
            fallback: FallbackPolicy::default(),
            meta: meta(1.0),
        };
        let result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
        assert_eq!(result.status, Status::Error);
        assert_eq!(
            result.degradation_reason.as_deref(),
            Some(degradation_reason::INVALID_SELECTOR)
        );
    }

    #[test]
    fn cross_document_check() {
        let a = select_one("<div id=\"a\"></div>", "#a");
        let b = select_one("<div id=\"a\"></div>", "#a");
        assert!(is_cross_document(&a, &b));
        assert!(!is_cross_document(&a, &a));
    }
}
