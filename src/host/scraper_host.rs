//! A concrete host implementation backed by the `scraper` crate — the
//! teacher's own HTML engine. Lets the core be exercised end-to-end without
//! a live renderer; `bounding_rect`/`computed_style` have nothing real to
//! report so they return errors, which naturally exercises the core's
//! graceful-degradation paths.

use scraper::{ElementRef, Html};

use crate::error::{GeometryError, QueryError, StyleError};
use crate::host::{ComputedStyle, DocumentId, ElementHandle, QueryEngine, Rect};
use crate::svg::is_smil_animation_tag;

/// Parse `html` into a document that lives for the remainder of the
/// process. The core itself is allocation-agnostic about documents; this
/// leak is a pragmatic convenience for the demo binary and tests, not
/// something the core requires of every host.
pub fn leak_document(html: &str) -> &'static Html {
    Box::leak(Box::new(Html::parse_document(html)))
}

/// A `scraper`-backed element handle. Cheap to clone — it's a pointer into
/// the parsed tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScraperHandle {
    element: ElementRef<'static>,
}

impl ScraperHandle {
    pub fn new(element: ElementRef<'static>) -> Self {
        Self { element }
    }

    pub fn root(document: &'static Html) -> Option<Self> {
        ElementRef::wrap(document.tree.root()).map(Self::new)
    }

    pub fn element(&self) -> ElementRef<'static> {
        self.element
    }
}

fn siblings_matching<'a>(
    parent: ElementRef<'a>,
    mut predicate: impl FnMut(&ElementRef<'a>) -> bool,
) -> Vec<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| predicate(el))
        .collect()
}

impl ElementHandle for ScraperHandle {
    fn tag(&self) -> String {
        self.element.value().name.local.as_ref().to_string()
    }

    fn id_attr(&self) -> Option<String> {
        self.element.value().attr("id").map(String::from)
    }

    fn classes(&self) -> Vec<String> {
        self.element.value().classes().map(String::from).collect()
    }

    fn attributes(&self) -> Vec<(String, String)> {
        self.element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        self.element.parent().and_then(ElementRef::wrap).map(Self::new)
    }

    fn children(&self) -> Vec<Self> {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .map(Self::new)
            .collect()
    }

    fn sibling_index_of_type(&self) -> Option<u32> {
        let parent = self.element.parent()?;
        let parent = ElementRef::wrap(parent)?;
        let tag = self.tag();
        let same_tag = siblings_matching(parent, |el| {
            el.value().name.local.as_ref() == tag.as_str()
        });
        if same_tag.len() <= 1 {
            return None;
        }
        same_tag
            .iter()
            .position(|el| el.id() == self.element.id())
            .map(|i| i as u32 + 1)
    }

    fn sibling_index(&self) -> Option<u32> {
        let parent = self.element.parent()?;
        let parent = ElementRef::wrap(parent)?;
        let siblings = siblings_matching(parent, |_| true);
        if siblings.len() <= 1 {
            return None;
        }
        siblings
            .iter()
            .position(|el| el.id() == self.element.id())
            .map(|i| i as u32 + 1)
    }

    fn direct_text(&self) -> String {
        let parts: Vec<String> = self
            .element
            .children()
            .filter_map(|child| match child.value() {
                scraper::Node::Text(text) => {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                }
                _ => None,
            })
            .collect();
        parts.join(" ")
    }

    fn descendant_text(&self) -> String {
        self.element.text().collect::<Vec<_>>().join(" ")
    }

    fn bounding_rect(&self) -> Result<Rect, GeometryError> {
        Err(GeometryError::Unavailable(
            "scraper host has no layout engine".into(),
        ))
    }

    fn computed_style(&self) -> Result<ComputedStyle, StyleError> {
        Err(StyleError::Unavailable(
            "scraper host has no style engine".into(),
        ))
    }

    fn document_id(&self) -> DocumentId {
        DocumentId(self.element.tree() as *const _ as usize)
    }

    fn has_smil_animation_child(&self) -> bool {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .any(|el| is_smil_animation_tag(el.value().name.local.as_ref()))
    }
}

/// `QueryEngine` over a `scraper::Html` document, scoped to a root
/// element's subtree.
pub struct ScraperQueryEngine;

impl QueryEngine<ScraperHandle> for ScraperQueryEngine {
    fn query(&self, root: &ScraperHandle, selector: &str) -> Result<Vec<ScraperHandle>, QueryError> {
        let parsed = scraper::Selector::parse(selector)
            .map_err(|e| QueryError::InvalidSelector(format!("{e:?}")))?;
        Ok(root
            .element()
            .select(&parsed)
            .map(ScraperHandle::new)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> &'static Html {
        leak_document(html)
    }

    #[test]
    fn tag_and_id_read() {
        let d = doc(r#"<div id="x" class="a b"></div>"#);
        let sel = scraper::Selector::parse("#x").unwrap();
        let el = d.select(&sel).next().unwrap();
        let handle = ScraperHandle::new(el);
        assert_eq!(handle.tag(), "div");
        assert_eq!(handle.id_attr().as_deref(), Some("x"));
        assert_eq!(handle.classes(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn sibling_index_of_type_counts_same_tag_only() {
        let d = doc(r#"<ul><li>1</li><span>x</span><li id="second">2</li></ul>"#);
        let sel = scraper::Selector::parse("#second").unwrap();
        let el = d.select(&sel).next().unwrap();
        let handle = ScraperHandle::new(el);
        assert_eq!(handle.sibling_index_of_type(), Some(2));
    }

    #[test]
    fn single_child_has_no_sibling_index() {
        let d = doc(r#"<div><p id="only">hi</p></div>"#);
        let sel = scraper::Selector::parse("#only").unwrap();
        let el = d.select(&sel).next().unwrap();
        let handle = ScraperHandle::new(el);
        assert_eq!(handle.sibling_index_of_type(), None);
    }

    #[test]
    fn query_engine_scopes_to_root_subtree() {
        let d = doc(r#"<div id="scope"><span class="x"></span></div><span class="x"></span>"#);
        let sel = scraper::Selector::parse("#scope").unwrap();
        let root_el = d.select(&sel).next().unwrap();
        let root = ScraperHandle::new(root_el);
        let engine = ScraperQueryEngine;
        let found = engine.query(&root, ".x").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn invalid_selector_is_query_error() {
        let d = doc("<div></div>");
        let sel = scraper::Selector::parse("div").unwrap();
        let root = ScraperHandle::new(d.select(&sel).next().unwrap());
        let engine = ScraperQueryEngine;
        assert!(engine.query(&root, ":::not-a-selector").is_err());
    }
}
