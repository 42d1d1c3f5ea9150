//! Path builder (spec §4.5): given (anchor, target), construct the ordered
//! sequence of intermediate nodes between them.

use crate::host::{ElementHandle, QueryEngine};
use crate::model::{degradation_reason, Node};
use crate::scoring::{score_element, ScoringWeights};
use crate::selector;
use crate::semantics::extract_from_handle;

/// Tags counted as "semantic" for path-inclusion purposes (§4.5 step 2),
/// broader than the anchor's landmark-only Tier-A set: any element whose
/// tag alone carries structural/interactive meaning is kept even with empty
/// semantics, matching the teacher's own `is_meaningful`-style role-driven
/// keep/collapse decisions.
pub const SEMANTIC_TAGS: &[&str] = &[
    "main", "nav", "header", "footer", "section", "article", "aside", "form", "dialog", "table",
    "ul", "ol", "dl", "fieldset", "figure", "button", "a", "input", "select", "textarea", "label",
    "option", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "img",
];

fn should_include(tag: &str, node: &Node) -> bool {
    SEMANTIC_TAGS.contains(&tag) || !node.semantics.is_empty()
}

/// A path-builder slot: the host element plus its already-extracted `Node`
/// form (so the selector compiler can be re-run without re-extracting
/// semantics on every uniqueness probe).
struct Slot<E> {
    element: E,
    node: Node,
    included: bool,
}

fn build_node<E: ElementHandle>(el: &E, include_utility_classes: bool, weights: &ScoringWeights) -> Node {
    let semantics = extract_from_handle(el, include_utility_classes);
    let score = score_element(&semantics, weights);
    let tag = el.tag();
    let mut node = Node::new(tag.clone(), semantics, score);
    node.sibling_index = if selector::is_table_position_tag(&tag) {
        el.sibling_index()
    } else {
        el.sibling_index_of_type()
    };
    node
}

/// Ancestors strictly between `target` and `anchor`, in target→anchor
/// order (exclusive of both endpoints).
fn ancestors_between<E: ElementHandle>(anchor: &E, target: &E) -> Vec<E> {
    let mut chain = Vec::new();
    let mut current = target.parent();
    loop {
        match current {
            Some(el) if el == *anchor => break,
            Some(el) => {
                current = el.parent();
                chain.push(el);
            }
            None => break,
        }
    }
    chain
}

pub struct PathBuildResult {
    pub nodes: Vec<Node>,
    pub degraded: bool,
}

/// Build the filtered, uniqueness-tested path between `anchor` and
/// `target`.
pub fn build_path<E: ElementHandle, Q: QueryEngine<E>>(
    anchor_element: &E,
    anchor_node: &Node,
    target_element: &E,
    target_node: &Node,
    root: &E,
    engine: &Q,
    max_path_depth: u32,
    include_utility_classes: bool,
    weights: &ScoringWeights,
) -> PathBuildResult {
    let ancestors = ancestors_between(anchor_element, target_element);
    let degraded = ancestors.len() as u32 > max_path_depth;

    // anchor -> target order
    let mut slots: Vec<Slot<E>> = ancestors
        .into_iter()
        .rev()
        .map(|el| {
            let node = build_node(&el, include_utility_classes, weights);
            let included = should_include(&node.tag, &node);
            Slot { element: el, node, included }
        })
        .collect();

    let current_nodes = |slots: &[Slot<E>]| -> Vec<Node> {
        slots.iter().filter(|s| s.included).map(|s| s.node.clone()).collect()
    };

    let is_unique = |slots: &[Slot<E>]| -> bool {
        let nodes = current_nodes(slots);
        let compiled =
            selector::compile_and_query(anchor_node, &nodes, target_node, root, engine);
        compiled.matches.len() == 1
    };

    if slots.is_empty() || is_unique(&slots) {
        return PathBuildResult { nodes: current_nodes(&slots), degraded };
    }

    let skipped_indices: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.included)
        .map(|(i, _)| i)
        .collect();

    for idx in skipped_indices {
        if slots[idx].node.score < weights.path_skip_reinsert_min_score {
            continue;
        }
        slots[idx].included = true;
        if is_unique(&slots) {
            break;
        }
    }

    PathBuildResult { nodes: current_nodes(&slots), degraded }
}

pub const PATH_DEPTH_OVERFLOW_REASON: &str = degradation_reason::PATH_DEPTH_OVERFLOW;
