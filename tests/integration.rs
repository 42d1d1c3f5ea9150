//! End-to-end scenarios covering spec §8's concrete seeds: generate an EID
//! from a document, then resolve it back, exercising the whole pipeline
//! through the scraper-backed reference host.

use eidentity::generator::GenerateOptions;
use eidentity::host::scraper_host::{leak_document, ScraperHandle, ScraperQueryEngine};
use eidentity::host::ElementHandle;
use eidentity::resolver::{ResolveOptions, Status};
use eidentity::scoring::ScoringWeights;
use eidentity::{generate, resolve};

fn select(document: &'static scraper::Html, selector: &str) -> ScraperHandle {
    let parsed = scraper::Selector::parse(selector).unwrap();
    ScraperHandle::new(document.select(&parsed).next().unwrap())
}

fn select_all(document: &'static scraper::Html, selector: &str) -> Vec<ScraperHandle> {
    let parsed = scraper::Selector::parse(selector).unwrap();
    document.select(&parsed).map(ScraperHandle::new).collect()
}

fn html_root(document: &'static scraper::Html) -> ScraperHandle {
    select(document, "html")
}

/// Scenario 1: a single button inside a uniquely-identified form.
#[test]
fn scenario_1_single_button_resolves_with_unchanged_confidence() {
    let doc = leak_document(r#"<html><body><form id="login"><button>Submit</button></form></body></html>"#);
    let root = html_root(doc);
    let target = select(doc, "button");

    let eid = generate(
        &target,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        0,
    )
    .expect("button should generate");

    assert_eq!(eid.anchor.tag, "form");
    assert_eq!(eid.anchor.semantics.id.as_deref(), Some("login"));
    assert!(eid.path.is_empty());
    assert_eq!(eid.target.tag, "button");
    assert_eq!(eid.target.semantics.text.as_ref().unwrap().normalized, "Submit");

    let result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
    assert_eq!(result.status, Status::Success);
    assert_eq!(result.elements.len(), 1);
    assert_eq!(result.confidence, eid.meta.confidence);
}

/// Scenario 2: two identical-looking buttons — the second must still be
/// uniquely nameable, via sibling position.
#[test]
fn scenario_2_duplicate_buttons_disambiguated_by_position() {
    let doc = leak_document(
        r#"<html><body><form id="login"><button>Submit</button><button>Submit</button></form></body></html>"#,
    );
    let root = html_root(doc);
    let buttons = select_all(doc, "button");
    let second = buttons[1].clone();

    let eid = generate(
        &second,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        0,
    )
    .expect("second button should generate");

    let result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
    assert_eq!(result.status, Status::Success);
    assert_eq!(result.elements.len(), 1);
    assert_eq!(result.elements[0], second);
}

/// Scenario 3: table cell disambiguation must use `:nth-child`, not
/// `:nth-of-type`, since every `tr`/`td` shares a tag with its siblings but
/// table structure is conceptually row/column-indexed.
#[test]
fn scenario_3_table_cell_uses_nth_child() {
    let doc = leak_document(
        "<html><body><table><tr><td>1</td><td>2</td><td>3</td></tr><tr><td>4</td><td>5</td><td>6</td></tr></table></body></html>",
    );
    let root = html_root(doc);
    let cells = select_all(doc, "td");
    let target = cells
        .iter()
        .find(|c| c.direct_text() == "5")
        .cloned()
        .expect("cell with text 5");

    let eid = generate(
        &target,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        0,
    )
    .expect("cell should generate");

    let compiled = eidentity::selector::compile_and_query(
        &eid.anchor,
        &eid.path,
        &eid.target,
        &root,
        &ScraperQueryEngine,
    );
    assert!(compiled.selector.contains("nth-child"));
    assert!(!compiled.selector.contains("nth-of-type"));
    assert_eq!(compiled.matches.len(), 1);
    assert_eq!(compiled.matches[0], target);
}

/// Scenario 4: a framework-generated id must never be emitted; resolution
/// still succeeds through text/position instead.
#[test]
fn scenario_4_framework_generated_id_is_never_emitted() {
    let doc = leak_document(r#"<html><body><div id="radix-:r1:-trigger">Open menu</div></body></html>"#);
    let root = html_root(doc);
    let target = select(doc, "div");

    let eid = generate(
        &target,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        0,
    )
    .expect("div should still generate");

    assert!(eid.target.semantics.id.is_none());

    let result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
    assert_eq!(result.status, Status::Success);
    assert_eq!(result.elements.len(), 1);
}

/// Scenario 5: a URL-valued attribute drops its query string but keeps a
/// non-dynamic fragment, and still resolves when the query changes.
#[test]
fn scenario_5_url_query_stripped_fragment_preserved() {
    let doc = leak_document(r#"<html><body><nav><a href="/page?session=xyz#section">Go</a></nav></body></html>"#);
    let root = html_root(doc);
    let target = select(doc, "a");

    let eid = generate(
        &target,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        0,
    )
    .expect("link should generate");

    assert_eq!(eid.target.semantics.attribute("href"), Some("/page#section"));

    let replay = leak_document(r#"<html><body><nav><a href="/page?session=abc#section">Go</a></nav></body></html>"#);
    let replay_root = html_root(replay);
    let result = resolve(&eid, &replay_root, &ScraperQueryEngine, &ResolveOptions::default());
    assert_eq!(result.status, Status::Success);
    assert_eq!(result.elements.len(), 1);
}

/// Scenario 6: an SVG path's `dHash` survives a third-decimal precision
/// change thanks to the round-to-one-decimal rule.
#[test]
fn scenario_6_svg_dhash_stable_across_precision_changes() {
    let doc = leak_document(r#"<html><body><svg><path d="M10.12 10.34 L90.78 90.01 Z"></path></svg></body></html>"#);
    let root = html_root(doc);
    let target = select(doc, "path");

    let eid = generate(
        &target,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        0,
    )
    .expect("svg path should generate");

    let svg = eid.target.semantics.svg.as_ref().expect("fingerprint attached");
    assert_eq!(svg.shape, Some(eidentity::model::Shape::Path));
    assert!(svg.d_hash.is_some());

    let replay =
        leak_document(r#"<html><body><svg><path d="M10.123 10.341 L90.782 90.013 Z"></path></svg></body></html>"#);
    let replay_root = html_root(replay);
    let result = resolve(&eid, &replay_root, &ScraperQueryEngine, &ResolveOptions::default());
    assert_eq!(result.status, Status::Success);
}

/// Scenario 7: strict mode reports ambiguity and both candidates; permissive
/// mode resolves to the first, both at confidence × 0.7.
#[test]
fn scenario_7_strict_vs_permissive_ambiguity() {
    let doc = leak_document(
        r#"<html><body><ul><li class="item">Thing</li><li class="item">Thing</li></ul></body></html>"#,
    );
    let root = html_root(doc);
    let items = select_all(doc, "li");
    let target = items[0].clone();

    let eid = generate(
        &target,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        0,
    )
    .expect("list item should generate");

    let strict_opts = ResolveOptions { strict_mode: true, ..ResolveOptions::default() };
    let strict_result = resolve(&eid, &root, &ScraperQueryEngine, &strict_opts);
    assert_eq!(strict_result.status, Status::Ambiguous);
    assert_eq!(strict_result.confidence, eid.meta.confidence * 0.7);

    let permissive_result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
    assert_eq!(permissive_result.status, Status::Success);
    assert_eq!(permissive_result.confidence, eid.meta.confidence * 0.7);
}

/// Boundary: a deeply nested target beyond `maxPathDepth` still resolves,
/// but flagged `path-depth-overflow`.
#[test]
fn deeply_nested_target_degrades_but_resolves() {
    let nesting = "<div>".repeat(15);
    let closing = "</div>".repeat(15);
    let html =
        format!("<html><body><main id=\"m\">{nesting}<span id=\"deep\">hi</span>{closing}</main></body></html>");
    let doc = leak_document(&html);
    let root = html_root(doc);
    let target = select(doc, "#deep");

    let opts = GenerateOptions { max_path_depth: 5, ..GenerateOptions::default() };
    let eid = generate(&target, &root, &ScraperQueryEngine, &opts, &ScoringWeights::default(), None, 0)
        .expect("deep target should still generate");

    assert!(eid.meta.degraded);
    assert_eq!(eid.meta.degradation_reason.as_deref(), Some("path-depth-overflow"));

    let result = resolve(&eid, &root, &ScraperQueryEngine, &ResolveOptions::default());
    assert_eq!(result.status, Status::Success);
}

/// Boundary: cross-document resolution returns empty without panicking.
#[test]
fn cross_document_resolve_is_empty_not_a_panic() {
    let doc = leak_document(r#"<html><body><form id="login"><button>Submit</button></form></body></html>"#);
    let root = html_root(doc);
    let target = select(doc, "button");
    let eid = generate(
        &target,
        &root,
        &ScraperQueryEngine,
        &GenerateOptions::default(),
        &ScoringWeights::default(),
        None,
        0,
    )
    .unwrap();

    let other_doc = leak_document("<html><body></body></html>");
    let other_root = html_root(other_doc);
    let result = resolve(&eid, &other_root, &ScraperQueryEngine, &ResolveOptions::default());
    assert!(result.elements.is_empty());
}
