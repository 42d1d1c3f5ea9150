//! Semantic extractor (spec §4.2): element → `Semantics`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::host::ElementHandle;
use crate::model::{Semantics, TextMatchMode, TextSemantics};
use crate::stability::{clean_url_value, is_attribute_stable, is_class_stable, is_identifier_stable, is_url_attribute};

/// Tags whose own text content is part of their stable semantics.
pub const TEXT_BEARING_TAGS: &[&str] = &[
    "button", "a", "label", "h1", "h2", "h3", "h4", "h5", "h6", "p", "span", "li", "th", "td",
    "dt", "dd", "legend", "figcaption", "summary",
];

static LONG_HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{16,}$").unwrap());
static LONG_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{9,}$").unwrap());
static TEMPLATE_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{.*\}\}").unwrap());
static HASH_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-zA-Z_\-+/=]{32,}$").unwrap());

/// True if an attribute *value* (independent of its name) looks machine
/// generated rather than authored.
fn is_dynamic_value(value: &str) -> bool {
    value == "undefined"
        || value == "[object Object]"
        || LONG_HEX.is_match(value)
        || LONG_DIGIT_RUN.is_match(value)
        || TEMPLATE_LITERAL.is_match(value)
        || HASH_LIKE.is_match(value)
}

fn is_event_handler(name: &str) -> bool {
    name.starts_with("on")
}

fn is_framework_internal(name: &str) -> bool {
    name.starts_with("ng-")
        || name.starts_with("_ng")
        || name.starts_with("data-react")
        || name.starts_with("data-v-")
}

/// Ordering key for attribute emission: higher priority attributes are
/// listed first so the selector compiler (§4.6) prefers the most
/// identifying one when it needs exactly one.
pub fn attribute_priority(name: &str) -> i32 {
    match name {
        "id" => 100,
        "data-testid" | "data-test" | "data-test-id" | "data-cy" | "data-qa"
        | "data-automation-id" => 90,
        "name" => 80,
        "role" => 70,
        "type" => 65,
        "href" => 60,
        "for" => 55,
        "aria-label" => 50,
        "aria-labelledby" | "aria-describedby" | "aria-controls" | "aria-owns" => 45,
        "placeholder" | "title" | "alt" => 40,
        _ if name.starts_with("aria-") => 30,
        _ if name.starts_with("data-") => 20,
        _ => 10,
    }
}

/// A host-agnostic view of one attribute, as the caller (typically a
/// `DomAdapter`) observed it on the element.
pub struct RawAttribute<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

/// Filter and clean an element's raw class list into its stable semantic
/// remainder.
pub fn extract_classes(classes: &[&str], include_utility_classes: bool) -> Vec<String> {
    classes
        .iter()
        .filter(|c| !c.is_empty())
        .filter(|c| include_utility_classes || is_class_stable(c))
        .map(|c| c.to_string())
        .collect()
}

/// Filter, clean, and priority-sort an element's raw attributes.
pub fn extract_attributes(attrs: &[RawAttribute<'_>]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = attrs
        .iter()
        .filter(|a| !a.name.is_empty())
        .filter(|a| !is_event_handler(a.name))
        .filter(|a| !is_framework_internal(a.name))
        .filter(|a| !a.value.trim().is_empty())
        .filter(|a| !is_dynamic_value(a.value))
        .filter(|a| is_attribute_stable(a.name, a.value))
        .map(|a| {
            let value = if is_url_attribute(a.name) {
                clean_url_value(a.value)
            } else {
                a.value.to_string()
            };
            (a.name.to_string(), value)
        })
        .collect();

    out.sort_by(|(a_name, _), (b_name, _)| {
        attribute_priority(b_name)
            .cmp(&attribute_priority(a_name))
            .then_with(|| a_name.cmp(b_name))
    });
    out
}

/// Stable id, if present and stable.
pub fn extract_id(id: Option<&str>) -> Option<String> {
    id.filter(|i| is_identifier_stable(i)).map(|i| i.to_string())
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_100(s: &str) -> String {
    if s.len() <= 100 {
        return s.to_string();
    }
    let mut end = 100;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Build the `TextSemantics` for a text-bearing element, given its direct
/// child text (already concatenated by the host) and, as a fallback, its
/// full descendant text.
pub fn extract_text(direct_text: &str, descendant_text: &str) -> Option<TextSemantics> {
    let direct_trimmed = direct_text.trim();
    let raw_source = if !direct_trimmed.is_empty() {
        direct_trimmed
    } else {
        descendant_text.trim()
    };
    if raw_source.is_empty() {
        return None;
    }
    let normalized = normalize_whitespace(raw_source);
    if normalized.is_empty() {
        return None;
    }
    Some(TextSemantics {
        raw: truncate_100(raw_source),
        normalized,
        mode: Some(TextMatchMode::Exact),
    })
}

pub fn is_text_bearing_tag(tag: &str) -> bool {
    TEXT_BEARING_TAGS.contains(&tag)
}

/// Arguments gathered by the caller (a `DomAdapter` walk) and handed to
/// `extract` in one shot, so this module stays host-agnostic.
pub struct ElementFacts<'a> {
    pub tag: &'a str,
    pub id: Option<&'a str>,
    pub classes: Vec<&'a str>,
    pub attributes: Vec<RawAttribute<'a>>,
    pub role: Option<&'a str>,
    pub direct_text: &'a str,
    pub descendant_text: &'a str,
    pub include_utility_classes: bool,
}

/// Produce the stable semantics for one element. The SVG fingerprint, if
/// any, is attached by the caller (`crate::svg`) only on the resolver
/// target, per §4.2's last bullet.
pub fn extract(facts: &ElementFacts<'_>) -> Semantics {
    let classes = extract_classes(&facts.classes, facts.include_utility_classes);
    let attributes = extract_attributes(&facts.attributes);
    let text = if is_text_bearing_tag(facts.tag) {
        extract_text(facts.direct_text, facts.descendant_text)
    } else {
        None
    };

    Semantics {
        id: extract_id(facts.id),
        classes,
        attributes,
        text,
        role: facts.role.map(|r| r.to_string()),
        svg: None,
    }
}

/// Extract semantics directly from a host element handle, gathering its
/// attribute/class/text facts through the trait rather than a pre-built
/// `ElementFacts`. This is what the anchor finder, path builder, and
/// generator actually call.
pub fn extract_from_handle<E: ElementHandle>(el: &E, include_utility_classes: bool) -> Semantics {
    let tag = el.tag();
    let id = el.id_attr();
    let classes = el.classes();
    let owned_attrs = el.attributes();
    let raw_attrs: Vec<RawAttribute<'_>> = owned_attrs
        .iter()
        .map(|(k, v)| RawAttribute { name: k, value: v })
        .collect();
    let role = el.attribute("role");
    let direct_text = el.direct_text();
    let descendant_text = el.descendant_text();

    let facts = ElementFacts {
        tag: &tag,
        id: id.as_deref(),
        classes: classes.iter().map(|c| c.as_str()).collect(),
        attributes: raw_attrs,
        role: role.as_deref(),
        direct_text: &direct_text,
        descendant_text: &descendant_text,
        include_utility_classes,
    };
    extract(&facts)
}
