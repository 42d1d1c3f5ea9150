//! Selector compiler (spec §4.6): compile an EID into a CSS-style query
//! string, trying an escalating ladder of strategies and stopping at the
//! first one that resolves to a unique element against the supplied root.

use crate::host::{ElementHandle, QueryEngine};
use crate::model::{Node, Semantics};
use crate::stability::is_class_stable;

/// Tags where `:nth-child` must be used instead of `:nth-of-type`, because
/// table structure is heterogeneous (§4.6 strategy 3).
const TABLE_POSITION_TAGS: &[&str] = &["tr", "td", "th"];

/// True for tags whose emitted position predicate is `:nth-child`, which
/// counts *all* siblings rather than same-tag ones — callers building a
/// `Node` must record the matching all-sibling index for these tags, not
/// the same-tag index `:nth-of-type` would need.
pub(crate) fn is_table_position_tag(tag: &str) -> bool {
    TABLE_POSITION_TAGS.contains(&tag)
}

fn escape_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Attribute/id predicates only — no class names (§4.6 strategy 0). The
/// compiler re-filters classes through the stability classifier regardless
/// of what the generator already put in `semantics`, per §9's resolved open
/// question.
fn attribute_predicates(semantics: &Semantics) -> String {
    let mut out = String::new();
    if let Some(id) = &semantics.id {
        out.push('#');
        out.push_str(id);
    }
    if let Some(role) = &semantics.role {
        out.push_str(&format!("[role=\"{}\"]", escape_attr_value(role)));
    }
    for (name, value) in &semantics.attributes {
        out.push_str(&format!("[{}=\"{}\"]", name, escape_attr_value(value)));
    }
    out
}

fn stable_class_predicate(semantics: &Semantics) -> Option<String> {
    semantics
        .classes
        .iter()
        .find(|c| is_class_stable(c))
        .map(|c| format!(".{c}"))
}

fn position_predicate(tag: &str, sibling_index: Option<u32>) -> Option<String> {
    let idx = sibling_index?;
    if TABLE_POSITION_TAGS.contains(&tag) {
        Some(format!(":nth-child({idx})"))
    } else {
        Some(format!(":nth-of-type({idx})"))
    }
}

fn node_predicate_attrs_only(node: &Node) -> String {
    format!("{}{}", node.tag, attribute_predicates(&node.semantics))
}

/// Render the anchor fragment, augmenting with a stable class or sibling
/// index when the anchor's bare tag is not unique within `root` (§4.6
/// anchor emission rules). The body anchor is always unique so it never
/// needs augmenting.
fn render_anchor<E: ElementHandle, Q: QueryEngine<E>>(
    anchor: &Node,
    root: &E,
    engine: &Q,
) -> String {
    let base = node_predicate_attrs_only(anchor);
    if anchor.tag == "body" {
        return base;
    }
    let tag_only_matches = engine.query(root, &anchor.tag).map(|v| v.len()).unwrap_or(1);
    if tag_only_matches <= 1 {
        return base;
    }
    if let Some(class_pred) = stable_class_predicate(&anchor.semantics) {
        return format!("{base}{class_pred}");
    }
    if let Some(pos) = position_predicate(&anchor.tag, anchor.sibling_index) {
        return format!("{base}{pos}");
    }
    base
}

fn join_descendant(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strategy 0: attributes-only target, no classes, no sibling indices.
fn strategy_attributes_only<E: ElementHandle, Q: QueryEngine<E>>(
    anchor: &Node,
    path: &[Node],
    target: &Node,
    root: &E,
    engine: &Q,
) -> String {
    let anchor_part = render_anchor(anchor, root, engine);
    let path_parts: Vec<String> = path.iter().map(|n| n.tag.clone()).collect();
    let target_part = node_predicate_attrs_only(target);
    let mut all = vec![anchor_part];
    all.extend(path_parts);
    all.push(target_part);
    join_descendant(&all)
}

/// Strategy 1: parent-attribute disambiguation — replace the first path
/// node that carries a stable attribute or class with its own predicate.
fn strategy_parent_attribute<E: ElementHandle, Q: QueryEngine<E>>(
    anchor: &Node,
    path: &[Node],
    target: &Node,
    root: &E,
    engine: &Q,
) -> Option<String> {
    let anchor_part = render_anchor(anchor, root, engine);
    let mut path_parts: Vec<String> = path.iter().map(|n| n.tag.clone()).collect();
    let mut augmented = false;
    for (i, node) in path.iter().enumerate() {
        let attrs = attribute_predicates(&node.semantics);
        if !attrs.is_empty() {
            path_parts[i] = format!("{}{}", node.tag, attrs);
            augmented = true;
            break;
        }
        if let Some(class_pred) = stable_class_predicate(&node.semantics) {
            path_parts[i] = format!("{}{}", node.tag, class_pred);
            augmented = true;
            break;
        }
    }
    if !augmented {
        return None;
    }
    let target_part = node_predicate_attrs_only(target);
    let mut all = vec![anchor_part];
    all.extend(path_parts);
    all.push(target_part);
    Some(join_descendant(&all))
}

/// Strategy 2: one stable class added to the target predicate.
fn strategy_target_class<E: ElementHandle, Q: QueryEngine<E>>(
    anchor: &Node,
    path: &[Node],
    target: &Node,
    root: &E,
    engine: &Q,
) -> Option<String> {
    let class_pred = stable_class_predicate(&target.semantics)?;
    let anchor_part = render_anchor(anchor, root, engine);
    let path_parts: Vec<String> = path.iter().map(|n| n.tag.clone()).collect();
    let target_part = format!("{}{}", node_predicate_attrs_only(target), class_pred);
    let mut all = vec![anchor_part];
    all.extend(path_parts);
    all.push(target_part);
    Some(join_descendant(&all))
}

/// Strategy 3: position (`:nth-of-type`/`:nth-child`) on the target.
fn strategy_target_position<E: ElementHandle, Q: QueryEngine<E>>(
    anchor: &Node,
    path: &[Node],
    target: &Node,
    root: &E,
    engine: &Q,
) -> Option<String> {
    let pos = position_predicate(&target.tag, target.sibling_index)?;
    let anchor_part = render_anchor(anchor, root, engine);
    let path_parts: Vec<String> = path.iter().map(|n| n.tag.clone()).collect();
    let target_part = format!("{}{}", node_predicate_attrs_only(target), pos);
    let mut all = vec![anchor_part];
    all.extend(path_parts);
    all.push(target_part);
    Some(join_descendant(&all))
}

/// Strategy 4: full structural path, child combinators throughout, sibling
/// indices on every node with tagged siblings.
fn strategy_full_structural<E: ElementHandle, Q: QueryEngine<E>>(
    anchor: &Node,
    path: &[Node],
    target: &Node,
    root: &E,
    engine: &Q,
) -> String {
    let mut parts = Vec::new();
    parts.push(render_anchor(anchor, root, engine));
    for node in path {
        let pos = position_predicate(&node.tag, node.sibling_index).unwrap_or_default();
        parts.push(format!("{}{}", node.tag, pos));
    }
    let target_pos = position_predicate(&target.tag, target.sibling_index).unwrap_or_default();
    parts.push(format!("{}{}", node_predicate_attrs_only(target), target_pos));
    parts.join(" > ")
}

/// Result of compiling and testing an EID's selector against a root.
pub struct CompiledSelector<E> {
    pub selector: String,
    pub matches: Vec<E>,
    pub strategy: u8,
    /// True when the returned `matches`/`selector` come from a query that
    /// the host rejected as unparseable, not from a selector that
    /// legitimately matched zero elements.
    pub query_error: bool,
}

/// Try the ladder in order, stopping at the first strategy whose query
/// returns exactly one match. If none do, strategy 4's selector and result
/// are returned regardless (§4.6: "Determinism over performance... prefer
/// the more portable / more stable one, not the shortest", but the ladder
/// must still terminate with *something*).
pub fn compile_and_query<E: ElementHandle, Q: QueryEngine<E>>(
    anchor: &Node,
    path: &[Node],
    target: &Node,
    root: &E,
    engine: &Q,
) -> CompiledSelector<E> {
    let candidates: Vec<(u8, String)> = {
        let mut v = vec![(0u8, strategy_attributes_only(anchor, path, target, root, engine))];
        if let Some(s) = strategy_parent_attribute(anchor, path, target, root, engine) {
            v.push((1, s));
        }
        if let Some(s) = strategy_target_class(anchor, path, target, root, engine) {
            v.push((2, s));
        }
        if let Some(s) = strategy_target_position(anchor, path, target, root, engine) {
            v.push((3, s));
        }
        v.push((4, strategy_full_structural(anchor, path, target, root, engine)));
        v
    };

    let mut last = None;
    for (strategy, selector) in candidates {
        match engine.query(root, &selector) {
            Ok(matches) if matches.len() == 1 => {
                return CompiledSelector { selector, matches, strategy, query_error: false };
            }
            Ok(matches) => last = Some((strategy, selector, matches, false)),
            Err(_) => last = Some((strategy, selector, Vec::new(), true)),
        }
    }
    let (strategy, selector, matches, query_error) = last.expect("strategy 4 always produced");
    CompiledSelector { selector, matches, strategy, query_error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    fn node(tag: &str, semantics: Semantics) -> Node {
        Node::new(tag, semantics, 0.8)
    }

    #[test]
    fn attribute_predicates_render_id_and_attrs() {
        let sem = Semantics {
            id: Some("login".into()),
            attributes: vec![("name".into(), "x".into())],
            ..Default::default()
        };
        let pred = attribute_predicates(&sem);
        assert_eq!(pred, "#login[name=\"x\"]");
    }

    #[test]
    fn escaping_handles_quotes_and_backslashes() {
        assert_eq!(escape_attr_value(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn table_tags_use_nth_child() {
        assert_eq!(position_predicate("td", Some(2)), Some(":nth-child(2)".to_string()));
        assert_eq!(position_predicate("div", Some(2)), Some(":nth-of-type(2)".to_string()));
    }

    #[test]
    fn strategy_0_has_no_classes_or_position() {
        let anchor = node("form", Semantics { id: Some("login".into()), ..Default::default() });
        let target = node("button", Semantics::default());
        let s = strategy_attributes_only(
            &anchor,
            &[],
            &target,
            &(),
            &NoopEngine,
        );
        assert_eq!(s, "form#login button");
    }

    // A trivial no-op host used only to exercise the pure string builders
    // without pulling in the scraper-backed adapter.
    struct NoopEngine;
    impl ElementHandle for () {
        fn tag(&self) -> String { String::new() }
        fn id_attr(&self) -> Option<String> { None }
        fn classes(&self) -> Vec<String> { vec![] }
        fn attributes(&self) -> Vec<(String, String)> { vec![] }
        fn parent(&self) -> Option<Self> { None }
        fn children(&self) -> Vec<Self> { vec![] }
        fn sibling_index_of_type(&self) -> Option<u32> { None }
        fn sibling_index(&self) -> Option<u32> { None }
        fn direct_text(&self) -> String { String::new() }
        fn descendant_text(&self) -> String { String::new() }
        fn bounding_rect(&self) -> Result<crate::host::Rect, crate::error::GeometryError> {
            Err(crate::error::GeometryError::Unavailable("noop".into()))
        }
        fn computed_style(&self) -> Result<crate::host::ComputedStyle, crate::error::StyleError> {
            Err(crate::error::StyleError::Unavailable("noop".into()))
        }
        fn document_id(&self) -> crate::host::DocumentId { crate::host::DocumentId(0) }
        fn has_smil_animation_child(&self) -> bool { false }
    }
    impl QueryEngine<()> for NoopEngine {
        fn query(&self, _root: &(), _selector: &str) -> Result<Vec<()>, crate::error::QueryError> {
            Ok(vec![])
        }
    }

    #[test]
    fn strategy_2_adds_stable_class_to_target() {
        let anchor = node("form", Semantics::default());
        let target = node(
            "button",
            Semantics { classes: vec!["submit-button".into()], ..Default::default() },
        );
        let s = strategy_target_class(&anchor, &[], &target, &(), &NoopEngine).unwrap();
        assert!(s.ends_with("button.submit-button"));
    }

    #[test]
    fn strategy_4_uses_child_combinators() {
        let anchor = node("form", Semantics::default());
        let mut path_node = node("div", Semantics::default());
        path_node.sibling_index = Some(1);
        let mut target = node("button", Semantics::default());
        target.sibling_index = Some(2);
        let s = strategy_full_structural(&anchor, &[path_node], &target, &(), &NoopEngine);
        assert_eq!(s, "form > div:nth-of-type(1) > button:nth-of-type(2)");
    }

    struct ErroringEngine;
    impl QueryEngine<()> for ErroringEngine {
        fn query(&self, _root: &(), _selector: &str) -> Result<Vec<()>, crate::error::QueryError> {
            Err(crate::error::QueryError::InvalidSelector("bad syntax".into()))
        }
    }

    #[test]
    fn compile_and_query_flags_query_error_when_host_rejects_every_strategy() {
        let anchor = node("form", Semantics { id: Some("login".into()), ..Default::default() });
        let target = node("button", Semantics::default());
        let result = compile_and_query(&anchor, &[], &target, &(), &ErroringEngine);
        assert!(result.query_error);
        assert!(result.matches.is_empty());
    }

    #[test]
    fn compile_and_query_succeeds_without_query_error() {
        let anchor = node("form", Semantics { id: Some("login".into()), ..Default::default() });
        let target = node("button", Semantics::default());
        let result = compile_and_query(&anchor, &[], &target, &(), &NoopEngine);
        assert!(!result.query_error);
    }
}
