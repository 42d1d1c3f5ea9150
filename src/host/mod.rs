//! Host collaborators (spec §6): the tree-query engine and DOM adapter the
//! core consumes but does not implement itself. `host::scraper_host` ships a
//! concrete implementation backed by the `scraper` crate so the crate can be
//! exercised without a live renderer.

pub mod scraper_host;

use crate::error::{GeometryError, QueryError, StyleError};

/// Identity of the document an element belongs to, used for the cheap
/// cross-document check in §4.9. Two handles from the same document must
/// report equal ids; handles from different documents must not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub usize);

/// An axis-aligned rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn is_zero_area(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// The subset of computed style the core needs: animation detection (§4.3)
/// and visibility (§4.8).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    pub animation_name: Option<String>,
    pub transition_property: Option<String>,
    pub display_none: bool,
    pub visibility_hidden: bool,
}

/// One element in a host document. Implementors provide structural
/// navigation and attribute reads; the core never mutates a handle.
pub trait ElementHandle: Clone + PartialEq {
    fn tag(&self) -> String;
    fn id_attr(&self) -> Option<String>;
    fn classes(&self) -> Vec<String>;
    /// All attributes in document order, including `id` and `class`.
    fn attributes(&self) -> Vec<(String, String)>;
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
    fn parent(&self) -> Option<Self>;
    fn children(&self) -> Vec<Self>;
    /// 1-based index among same-tag siblings, if the element has any
    /// same-tag siblings at all (§4.5, §4.6).
    fn sibling_index_of_type(&self) -> Option<u32>;
    /// 1-based index among all siblings regardless of tag, used for
    /// `:nth-child` inside tables (§4.6).
    fn sibling_index(&self) -> Option<u32>;
    /// Text of this element's direct text-node children only.
    fn direct_text(&self) -> String;
    /// Text of every descendant text node, concatenated.
    fn descendant_text(&self) -> String;
    fn bounding_rect(&self) -> Result<Rect, GeometryError>;
    fn computed_style(&self) -> Result<ComputedStyle, StyleError>;
    fn document_id(&self) -> DocumentId;
    /// True if this element has any child matching one of the SMIL
    /// animation tag names (§4.3).
    fn has_smil_animation_child(&self) -> bool;
    /// Raw `d` attribute value, for `<path>` elements.
    fn path_d_attribute(&self) -> Option<String> {
        self.attribute("d")
    }
}

/// A tree-query engine over a host document (§6): CSS-compatible selector
/// syntax for tag, class, id, attribute, descendant/child combinators,
/// `:nth-of-type`, `:nth-child`.
pub trait QueryEngine<E: ElementHandle> {
    fn query(&self, root: &E, selector: &str) -> Result<Vec<E>, QueryError>;
}
