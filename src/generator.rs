//! Generator (spec §4, overview step 2): given a target element, produce an
//! Element Identity Descriptor.

use tracing::{debug, warn};

use crate::anchor::find_anchor;
use crate::cache::Cache;
use crate::host::{ElementHandle, QueryEngine};
use crate::model::{Eid, FallbackPolicy, Meta, Node, Shape, CURRENT_VERSION};
use crate::path::{build_path, PATH_DEPTH_OVERFLOW_REASON};
use crate::scoring::{overall_confidence, score_element, ScoringWeights};
use crate::selector::compile_and_query;
use crate::semantics::extract_from_handle;
use crate::svg::{self, Geometry};

/// Options controlling generation (spec §6).
pub struct GenerateOptions {
    pub max_path_depth: u32,
    pub enable_svg_fingerprint: bool,
    pub confidence_threshold: f64,
    pub fallback_to_body: bool,
    pub include_utility_classes: bool,
    pub source: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_path_depth: 10,
            enable_svg_fingerprint: true,
            confidence_threshold: 0.0,
            fallback_to_body: true,
            include_utility_classes: false,
            source: None,
        }
    }
}

const SVG_SHAPE_TAGS: &[&str] = &[
    "path", "rect", "circle", "ellipse", "line", "polyline", "polygon", "svg", "g",
];

fn is_svg_like(tag: &str) -> bool {
    SVG_SHAPE_TAGS.contains(&tag)
}

fn parse_attr_f64<E: ElementHandle>(el: &E, name: &str) -> Option<f64> {
    el.attribute(name).and_then(|v| v.trim().parse::<f64>().ok())
}

fn geometry_for<E: ElementHandle>(el: &E, shape: Shape) -> Option<Geometry> {
    match shape {
        Shape::Rect => Some(Geometry::Rect {
            width: parse_attr_f64(el, "width")?,
            height: parse_attr_f64(el, "height")?,
        }),
        Shape::Circle => Some(Geometry::Circle { radius: parse_attr_f64(el, "r")? }),
        Shape::Ellipse => Some(Geometry::Ellipse {
            rx: parse_attr_f64(el, "rx")?,
            ry: parse_attr_f64(el, "ry")?,
        }),
        Shape::Line => Some(Geometry::Line {
            x1: parse_attr_f64(el, "x1")?,
            y1: parse_attr_f64(el, "y1")?,
            x2: parse_attr_f64(el, "x2")?,
            y2: parse_attr_f64(el, "y2")?,
        }),
        _ => None,
    }
}

fn title_child_text<E: ElementHandle>(el: &E) -> Option<String> {
    el.children()
        .into_iter()
        .find(|c| c.tag() == "title")
        .map(|c| c.direct_text())
        .filter(|t| !t.is_empty())
}

fn attach_svg_fingerprint<E: ElementHandle>(el: &E, node: &mut Node) {
    let shape = svg::classify_shape(&node.tag);
    let d_attribute = el.path_d_attribute();
    let geometry = geometry_for(el, shape);
    let has_smil = el.has_smil_animation_child();
    let style = el.computed_style().ok().map(|s| svg::StyleAnimationFacts {
        animation_name: s.animation_name,
        transition_property: s.transition_property,
    });
    let title_text = title_child_text(el);

    let facts = svg::SvgFacts {
        tag: &node.tag,
        d_attribute: d_attribute.as_deref(),
        geometry,
        has_smil_child: has_smil,
        style,
        role: node.semantics.role.as_deref(),
        title_text: title_text.as_deref(),
    };
    node.semantics.svg = Some(svg::fingerprint(&facts));
}

fn build_node<E: ElementHandle>(
    el: &E,
    include_utility_classes: bool,
    weights: &ScoringWeights,
    enable_svg: bool,
) -> Node {
    let semantics = extract_from_handle(el, include_utility_classes);
    let score = score_element(&semantics, weights);
    let tag = el.tag();
    let mut node = Node::new(tag.clone(), semantics, score);
    node.sibling_index = if crate::selector::is_table_position_tag(&tag) {
        el.sibling_index()
    } else {
        el.sibling_index_of_type()
    };
    if enable_svg && is_svg_like(&node.tag) {
        attach_svg_fingerprint(el, &mut node);
    }
    node
}

/// Produce an EID for `target` within `root`, or `None` if no sensible
/// descriptor can be built (an orphan target with no parent — spec §8).
/// `generated_at` is supplied by the caller since the core itself may not
/// read the wall clock (determinism, spec §8).
pub fn generate<E: ElementHandle, Q: QueryEngine<E>>(
    target: &E,
    root: &E,
    engine: &Q,
    options: &GenerateOptions,
    weights: &ScoringWeights,
    cache: Option<&Cache>,
    generated_at: i64,
) -> Option<Eid> {
    let target_tag = target.tag();

    // Boundary case (spec §8): body/html targets anchor to themselves with
    // an empty path — `find_anchor` cannot produce this on its own since it
    // starts at `target.parent()`.
    if target_tag == "body" || target_tag == "html" {
        let node = build_node(target, options.include_utility_classes, weights, options.enable_svg_fingerprint);
        let confidence = overall_confidence(1.0, &[], node.score, 1.0, false, false, weights);
        if confidence < options.confidence_threshold {
            return None;
        }
        return Some(Eid {
            version: CURRENT_VERSION.to_string(),
            anchor: node.clone(),
            path: vec![],
            target: node,
            constraints: vec![],
            fallback: FallbackPolicy::default(),
            meta: Meta {
                confidence,
                generated_at,
                generator: "eidentity".to_string(),
                source: options.source.clone(),
                degraded: false,
                degradation_reason: None,
            },
        });
    }

    let anchor_result = find_anchor(target, options.max_path_depth, weights)?;
    debug!(tier = ?anchor_result.tier, depth = anchor_result.depth, "generator: anchor found");

    // A degraded anchor result means no qualifying tier was ever found and
    // the walk fell all the way back to body/terminal (spec §6's
    // `fallbackToBody`). When the caller has disabled that, there is no
    // usable anchor.
    if anchor_result.degraded && !options.fallback_to_body {
        return None;
    }

    let anchor_node = build_node(
        &anchor_result.element,
        options.include_utility_classes,
        weights,
        false,
    );

    let path_result = build_path(
        &anchor_result.element,
        &anchor_node,
        target,
        &build_node(target, options.include_utility_classes, weights, false),
        root,
        engine,
        options.max_path_depth,
        options.include_utility_classes,
        weights,
    );

    let mut target_node = build_node(
        target,
        options.include_utility_classes,
        weights,
        options.enable_svg_fingerprint,
    );

    let path_degraded = path_result.degraded;
    if path_degraded {
        warn!(reason = PATH_DEPTH_OVERFLOW_REASON, "generator: path degraded");
    }

    let compiled = compile_and_query(&anchor_node, &path_result.nodes, &target_node, root, engine);
    let uniqueness_factor = if compiled.matches.len() == 1 { 1.0 } else { 0.5 };
    target_node.degraded = compiled.matches.len() != 1;

    let anchor_degraded = anchor_result.degraded;
    let confidence = overall_confidence(
        anchor_result.score,
        &path_result.nodes,
        target_node.score,
        uniqueness_factor,
        anchor_degraded,
        path_degraded,
        weights,
    );

    if confidence < options.confidence_threshold {
        return None;
    }

    let mut anchor_node = anchor_node;
    anchor_node.degraded = anchor_degraded;

    let degraded = anchor_degraded || path_degraded || target_node.degraded;
    // Only `path-depth-overflow` has a canonical reason string at generation
    // time (§8); a degraded anchor with no path overflow just means no
    // qualifying tier was found before falling back to body, which has no
    // named reason in the public contract — `degraded` alone covers it.
    let degradation_reason = if path_degraded {
        Some(PATH_DEPTH_OVERFLOW_REASON.to_string())
    } else {
        None
    };

    let eid = Eid {
        version: CURRENT_VERSION.to_string(),
        anchor: anchor_node,
        path: path_result.nodes,
        target: target_node,
        constraints: vec![],
        fallback: FallbackPolicy::default(),
        meta: Meta {
            confidence,
            generated_at,
            generator: "eidentity".to_string(),
            source: options.source.clone(),
            degraded,
            degradation_reason,
        },
    };

    if let Some(cache) = cache {
        if let Some(id) = target.id_attr() {
            cache.put_eid(&id, eid.clone());
        }
    }

    Some(eid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::scraper_host::{leak_document, ScraperHandle, ScraperQueryEngine};

    fn select(html: &str, sel: &str) -> (ScraperHandle, ScraperHandle) {
        let doc = leak_document(html);
        let root_sel = scraper::Selector::parse("html").unwrap();
        let root = ScraperHandle::new(doc.select(&root_sel).next().unwrap());
        let s = scraper::Selector::parse(sel).unwrap();
        let target = ScraperHandle::new(doc.select(&s).next().unwrap());
        (root, target)
    }

    #[test]
    fn body_target_anchors_to_itself() {
        let (root, target) = select("<html><body></body></html>", "body");
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
        assert_eq!(eid.anchor.tag, "body");
        assert!(eid.path.is_empty());
        assert!(eid.anchor_is_target());
    }

    #[test]
    fn simple_form_button_generates_valid_eid() {
        let (root, target) = select(
            r#"<html><body><form id="login"><button id="submit">Go</button></form></body></html>"#,
            "#submit",
        );
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
        assert_eq!(eid.anchor.tag, "form");
        assert_eq!(eid.target.tag, "button");
        assert!((0.0..=1.0).contains(&eid.meta.confidence));
    }

    #[test]
    fn orphan_target_generates_nothing() {
        let doc: &'static scraper::Html =
            Box::leak(Box::new(scraper::Html::parse_fragment("<div id=\"x\"></div>")));
        let sel = scraper::Selector::parse("#x").unwrap();
        let target = ScraperHandle::new(doc.select(&sel).next().unwrap());
        let eid = generate(
            &target,
            &target,
            &ScraperQueryEngine,
            &GenerateOptions::default(),
            &ScoringWeights::default(),
            None,
            0,
        );
        assert!(eid.is_none());
    }

    #[test]
    fn generation_is_deterministic() {
        let (root, target) = select(
            r#"<html><body><form id="login"><button id="submit">Go</button></form></body></html>"#,
            "#submit",
        );
        let opts = GenerateOptions::default();
        let weights = ScoringWeights::default();
        let first = generate(&target, &root, &ScraperQueryEngine, &opts, &weights, None, 111).unwrap();
        let second = generate(&target, &root, &ScraperQueryEngine, &opts, &weights, None, 222).unwrap();
        assert_eq!(first.anchor, second.anchor);
        assert_eq!(first.path, second.path);
        assert_eq!(first.target, second.target);
        assert_eq!(first.meta.confidence, second.meta.confidence);
    }
}
