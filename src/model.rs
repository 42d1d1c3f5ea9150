//! Core data model: the Element Identity Descriptor (EID) and its parts.
//!
//! Everything here is a plain value — no references back into a document, no
//! opaque handles. An `Eid` is serializable by any JSON-compatible encoder.

use serde::{Deserialize, Serialize};

/// Schema tag carried by every descriptor. Unknown versions are not an error
/// but reduce confidence (see `crate::scoring`).
pub const CURRENT_VERSION: &str = "1.0";

/// A single element's extracted stable semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Semantics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attributes: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextSemantics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<Fingerprint>,
}

impl Semantics {
    /// A semantics value with nothing in it — the all-`div` case.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.text.is_none()
            && self.role.is_none()
            && self.svg.is_none()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextMatchMode {
    Exact,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSemantics {
    /// Raw trimmed text, truncated to 100 chars with an ellipsis if cut.
    pub raw: String,
    /// Whitespace-normalized (collapsed runs, trimmed) version of `raw`.
    pub normalized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TextMatchMode>,
}

/// Discriminated SVG shape kind. Unknown SVG tags default to `Path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    G,
    Text,
    Use,
    Svg,
    Other,
}

/// Vector-graphic fingerprint attached to the target node when it is SVG.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub shape: Option<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geom_hash: Option<String>,
    #[serde(default)]
    pub has_animation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_text: Option<String>,
}

/// A single element along the anchor→target chain, including the anchor and
/// target themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    pub semantics: Semantics,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sibling_index: Option<u32>,
    #[serde(default)]
    pub degraded: bool,
}

impl Node {
    pub fn new(tag: impl Into<String>, semantics: Semantics, score: f64) -> Self {
        Self {
            tag: tag.into(),
            semantics,
            score: score.clamp(0.0, 1.0),
            sibling_index: None,
            degraded: false,
        }
    }
}

/// A single disambiguating constraint, each with a priority used to order
/// application in the resolver (§4.8, §4.9 phase 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Constraint {
    Uniqueness { priority: i32 },
    TextProximity {
        reference: String,
        max_distance: usize,
        priority: i32,
    },
    Position {
        strategy: PositionStrategy,
        priority: i32,
    },
    Visibility { required: bool, priority: i32 },
}

impl Constraint {
    pub fn priority(&self) -> i32 {
        match self {
            Constraint::Uniqueness { priority }
            | Constraint::TextProximity { priority, .. }
            | Constraint::Position { priority, .. }
            | Constraint::Visibility { priority, .. } => *priority,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionStrategy {
    FirstInDom,
    TopMost,
    LeftMost,
}

impl PositionStrategy {
    /// Unknown or empty strategies default to `first-in-dom` (§4.8).
    pub fn parse(s: &str) -> Self {
        match s {
            "top-most" => PositionStrategy::TopMost,
            "left-most" => PositionStrategy::LeftMost,
            _ => PositionStrategy::FirstInDom,
        }
    }
}

/// Behavior when the target element cannot be found at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnMissing {
    Strict,
    AnchorOnly,
    None,
}

/// Behavior when multiple candidates remain after all constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnMultiple {
    First,
    BestScore,
    AllowMultiple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    pub on_missing: OnMissing,
    pub on_multiple: OnMultiple,
    pub max_recovery_depth: u32,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            on_missing: OnMissing::AnchorOnly,
            on_multiple: OnMultiple::BestScore,
            max_recovery_depth: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub confidence: f64,
    /// Unix epoch milliseconds. Metadata only — never affects determinism of
    /// the rest of the descriptor (§8).
    pub generated_at: i64,
    pub generator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation_reason: Option<String>,
}

/// The Element Identity Descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eid {
    pub version: String,
    pub anchor: Node,
    #[serde(default)]
    pub path: Vec<Node>,
    pub target: Node,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    pub fallback: FallbackPolicy,
    pub meta: Meta,
}

impl Eid {
    /// True iff `anchor` and `target` name the same element (§4.6 anchor
    /// emission rule: "the anchor equals the target").
    pub fn anchor_is_target(&self) -> bool {
        self.anchor.tag == self.target.tag && self.anchor.semantics == self.target.semantics
    }
}

/// Degradation reason strings. A public contract (§6) — callers may match on
/// these literally.
pub mod degradation_reason {
    pub const PATH_DEPTH_OVERFLOW: &str = "path-depth-overflow";
    pub const RELAXED_TEXT_MATCHING: &str = "relaxed-text-matching";
    pub const NOT_FOUND: &str = "not-found";
    pub const AMBIGUOUS: &str = "ambiguous";
    pub const INVALID_SELECTOR: &str = "invalid-selector";
    pub const OVER_CONSTRAINED: &str = "over-constrained";
    pub const ANCHOR_ONLY_FALLBACK: &str = "anchor-only-fallback";
}
