//! Stability classifier (spec §4.1).
//!
//! Three pure questions: is this identifier stable? is this class name
//! stable? is this attribute name/value pair stable? The classifier is
//! case-sensitive throughout — `DATA-TESTID` is not a test marker.
//!
//! The dynamic-shape patterns and vocabulary lists below are a living
//! specification, not a closed set (spec §9): adding a new framework prefix
//! is meant to be a one-line change to one of the `static` tables.

use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------
// Identifier stability
// ---------------------------------------------------------------------

static HEX_ONLY_LONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{12,}$").unwrap());
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5,}").unwrap());
static SHORT_PREFIX_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{1,3}-?([A-Za-z0-9]{6,})$").unwrap());
static FRAMEWORK_OPAQUE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r":r[0-9a-zA-Z]+:").unwrap());
static UUID_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});
static SEGMENTED_NUMERIC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9]+[-_]){2,}[0-9]+$").unwrap());

/// Fixed framework-generated id prefixes, with or without a trailing numeric
/// suffix (e.g. `radix-:r1:`, `mui-12`, `react-date-picker-3`).
static FRAMEWORK_PREFIXES: &[&str] = &["radix-", "mui-", "headlessui-"];
static REACT_PICKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^react-.*-picker-\d+$").unwrap());

/// Returns true if `id` has a shape produced by framework id-generation
/// machinery rather than authored by a human.
pub fn is_dynamic_identifier(id: &str) -> bool {
    if id.is_empty() {
        return false;
    }
    if HEX_ONLY_LONG.is_match(id) || DIGIT_RUN.is_match(id) {
        return true;
    }
    if let Some(caps) = SHORT_PREFIX_HASH.captures(id) {
        let suffix = &caps[1];
        if suffix.chars().any(|c| c.is_ascii_digit() || c.is_ascii_uppercase()) {
            return true;
        }
    }
    if FRAMEWORK_OPAQUE_ID.is_match(id) {
        return true;
    }
    if FRAMEWORK_PREFIXES.iter().any(|p| id.starts_with(p)) || REACT_PICKER.is_match(id) {
        return true;
    }
    if UUID_SHAPE.is_match(id) {
        return true;
    }
    if SEGMENTED_NUMERIC_SUFFIX.is_match(id) {
        return true;
    }
    false
}

/// An identifier is stable iff non-empty and not dynamic.
pub fn is_identifier_stable(id: &str) -> bool {
    !id.is_empty() && !is_dynamic_identifier(id)
}

/// Attributes whose value is itself an identifier reference. An entire
/// attribute is rejected if any whitespace-separated token in its value is
/// dynamic.
pub const REFERENCE_BEARING_ATTRIBUTES: &[&str] = &[
    "for",
    "aria-labelledby",
    "aria-describedby",
    "aria-controls",
    "aria-owns",
];

pub fn is_reference_bearing_attribute(name: &str) -> bool {
    REFERENCE_BEARING_ATTRIBUTES.contains(&name)
}

/// A reference-bearing attribute value is stable iff every id token it names
/// is itself stable.
pub fn is_reference_value_stable(value: &str) -> bool {
    value.split_whitespace().all(is_identifier_stable)
}

// ---------------------------------------------------------------------
// Class stability
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassCategory {
    Dynamic,
    Utility,
    Semantic,
}

/// Utility-class shapes: atomic-CSS vocabularies (Tailwind, Bootstrap
/// spacing/layout helpers) plus single-character or digits-only tokens.
static UTILITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let patterns = [
        // Tailwind-style spacing/sizing/layout utilities: p-4, mt-2, w-1/2, -mt-4, gap-x-2
        r"^-?(m|p)[trblxy]?-\S+$",
        r"^-?(w|h|min-w|min-h|max-w|max-h|gap|gap-x|gap-y|space-x|space-y|inset|top|left|right|bottom|z)-\S+$",
        r"^(flex|grid|block|inline|hidden|table|contents)(-\S+)?$",
        r"^(flex|grid|items|justify|content|self|place)-\S+$",
        r"^(col|row)(-span|-start|-end)?-\S+$",
        // Color utilities: bg-red-500, text-gray-800, border-blue-200
        r"^(bg|text|border|fill|stroke|ring|divide|outline|shadow|decoration|accent|caret)-[a-z]+(-[0-9]{2,3})?$",
        // Responsive / state / dark / hover variants: sm:flex, hover:bg-red-500, dark:text-white
        r"^(sm|md|lg|xl|2xl|hover|focus|active|disabled|dark|group-hover|focus-within|visited|first|last|odd|even):\S+$",
        // Arbitrary-value bracket syntax: top-[3px], bg-[#fff]
        r"^[a-z-]+-\[[^\]]+\]$",
        // Fractional suffixes: w-1/2, basis-2/3
        r"^[a-z-]+-\d+/\d+$",
        // Negative spacing: -mt-4, -translate-x-1/2
        r"^-[a-z][a-z-]*-\S+$",
        // Positioning helpers
        r"^(absolute|relative|fixed|sticky|static)$",
        r"^(rounded|border|font|leading|tracking|opacity|cursor|overflow|select|pointer-events|transition|duration|ease|transform|scale|rotate|translate)(-\S+)?$",
        // Bootstrap-style: col-md-4, btn-primary, d-flex, mb-3, text-center
        r"^col-(xs|sm|md|lg|xl)?-?\d{1,2}$",
        r"^(btn|badge|alert|card|nav|navbar|d|justify-content|align-items)-[a-z-]+$",
    ];
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
});

static SINGLE_CHAR_OR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]$|^\d+$").unwrap());

/// Framework-generated (CSS-in-JS) hash class shapes: styled-components
/// (`sc-bZQltZ`), emotion (`css-1x2y3z4`), linaria (`l1a2b3c`), JSS
/// (`makeStyles-root-123`, `jss123`), CSS Modules (`Button_root__a1b2c`).
static DYNAMIC_CLASS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let patterns = [
        r"^sc-[A-Za-z0-9]{6,}$",
        r"^css-[a-z0-9]{5,}$",
        r"^emotion-[a-z0-9]{5,}$",
        r"^[a-z][a-zA-Z0-9]*-[0-9a-f]{6,}$",
        r"^jss\d+$",
        r"^makeStyles-[A-Za-z]+-\d+$",
        r"^[A-Za-z][A-Za-z0-9]*_[A-Za-z]+__[A-Za-z0-9]{5,}$",
        r"^MuiBox-root-\d+$",
        r"^css-\d+$",
    ];
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
});

/// Classify a single class name into dynamic / utility / semantic.
pub fn classify_class(name: &str) -> ClassCategory {
    if name.is_empty() {
        return ClassCategory::Utility;
    }
    if DYNAMIC_CLASS_PATTERNS.iter().any(|re| re.is_match(name)) {
        return ClassCategory::Dynamic;
    }
    if SINGLE_CHAR_OR_DIGITS.is_match(name) || UTILITY_PATTERNS.iter().any(|re| re.is_match(name))
    {
        return ClassCategory::Utility;
    }
    ClassCategory::Semantic
}

pub fn is_class_stable(name: &str) -> bool {
    classify_class(name) == ClassCategory::Semantic
}

// ---------------------------------------------------------------------
// Attribute stability
// ---------------------------------------------------------------------

/// ARIA state attributes excluded from the default-included ARIA set — these
/// change as the UI is interacted with and carry no stable identity.
static ARIA_STATE_EXCLUDED: &[&str] = &[
    "aria-selected",
    "aria-checked",
    "aria-pressed",
    "aria-expanded",
    "aria-hidden",
    "aria-disabled",
    "aria-current",
    "aria-busy",
    "aria-invalid",
    "aria-grabbed",
    "aria-live",
    "aria-atomic",
];

static STABLE_HTML_ATTRIBUTES: &[&str] = &["name", "type", "placeholder", "title", "for", "alt", "href", "role"];

/// Test-marker shape, checked before every other `data-*` exclusion.
static TEST_MARKER_ATTRIBUTES: &[&str] = &[
    "data-testid",
    "data-test",
    "data-test-id",
    "data-cy",
    "data-qa",
    "data-automation-id",
];

/// Library-state `data-*` prefixes: framework-internal state, not page
/// semantics.
static LIBRARY_STATE_PREFIXES: &[&str] = &[
    "data-radix-",
    "data-headlessui-",
    "data-reach-",
    "data-mui-",
    "data-chakra-",
    "data-mantine-",
    "data-tw-merge-",
];

/// `data-*` state suffixes excluded regardless of prefix.
static STATE_SUFFIXES: &[&str] = &[
    "state",
    "active",
    "selected",
    "open",
    "loading",
    "orientation",
    "theme",
    "expanded",
    "checked",
    "disabled",
    "focus",
    "hover",
    "pressed",
];

/// Analytics / tracking / session-recording / A-B-testing `data-*` prefixes.
/// Excluded even when the name ends in `-id`.
static ANALYTICS_PREFIXES: &[&str] = &[
    "data-ga",
    "data-gtm-",
    "data-yandex-",
    "data-hj-",
    "data-hotjar-",
    "data-fs-",
    "data-mouseflow-",
    "data-smartlook-",
    "data-optimizely-",
    "data-vwo-",
    "data-fb-",
    "data-tt-",
    "data-li-",
    "data-track",
    "data-analytics",
    "data-impression-",
    "data-conversion-",
    "data-segment-",
    "data-event-",
];

fn is_test_marker(name: &str) -> bool {
    TEST_MARKER_ATTRIBUTES.contains(&name)
}

/// Public form of the test-marker check, used by the anchor finder (§4.4)
/// to award its test-marker bonus.
pub fn is_test_marker_attribute(name: &str) -> bool {
    is_test_marker(name)
}

fn is_library_state(name: &str) -> bool {
    LIBRARY_STATE_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn is_analytics(name: &str) -> bool {
    ANALYTICS_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn has_excluded_state_suffix(name: &str) -> bool {
    STATE_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix) && name.len() > "data-".len() + suffix.len() - 1)
}

/// Decide whether an attribute *name* is eligible for inclusion, independent
/// of its value. ARIA-state and excluded-category names return `false`.
pub fn is_attribute_name_included(name: &str) -> bool {
    if name == "id" {
        return true;
    }
    if name.starts_with("aria-") {
        return !ARIA_STATE_EXCLUDED.contains(&name);
    }
    if STABLE_HTML_ATTRIBUTES.contains(&name) {
        return true;
    }
    if let Some(rest) = name.strip_prefix("data-") {
        let _ = rest;
        if is_test_marker(name) {
            return true;
        }
        if is_library_state(name) || is_analytics(name) || has_excluded_state_suffix(name) {
            return false;
        }
        return true;
    }
    false
}

/// Full attribute stability check: name inclusion plus, for reference-bearing
/// attributes, that every referenced id is itself stable.
pub fn is_attribute_stable(name: &str, value: &str) -> bool {
    if !is_attribute_name_included(name) {
        return false;
    }
    if is_reference_bearing_attribute(name) && !is_reference_value_stable(value) {
        return false;
    }
    true
}

// ---------------------------------------------------------------------
// URL value cleaning
// ---------------------------------------------------------------------

static DYNAMIC_FRAGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^[0-9a-fA-F]{8,}$             # long hex run
        | ^[0-9a-zA-Z]{8,}$            # long alphanumeric run
        | ^\d{9,}$                     # timestamp-looking numeric run
        | ^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$ # uuid
        ",
    )
    .unwrap()
});

fn is_dynamic_fragment(fragment: &str) -> bool {
    !fragment.is_empty() && DYNAMIC_FRAGMENT.is_match(fragment)
}

/// True if `attr_name` carries a URL that should be cleaned before use in
/// semantics or selector predicates.
pub fn is_url_attribute(attr_name: &str) -> bool {
    matches!(attr_name, "href" | "src")
}

fn is_absolute_url(value: &str) -> bool {
    value.contains("://") || value.starts_with("//")
}

/// Clean a URL-valued attribute per §4.1: relative URLs lose their query
/// string; absolute URLs keep theirs; dynamic hash fragments are stripped,
/// non-dynamic fragments preserved.
///
/// `same_origin` lets a caller normalize a same-origin absolute URL to its
/// relative form when a document base is known; cross-origin URLs are always
/// preserved as-is.
pub fn clean_url_value(value: &str) -> String {
    let (path_and_query, fragment) = match value.split_once('#') {
        Some((p, f)) => (p, Some(f)),
        None => (value, None),
    };

    let cleaned_base = if is_absolute_url(path_and_query) {
        path_and_query.to_string()
    } else {
        match path_and_query.split_once('?') {
            Some((path, _query)) => path.to_string(),
            None => path_and_query.to_string(),
        }
    };

    match fragment {
        Some(f) if !is_dynamic_fragment(f) => format!("{cleaned_base}#{f}"),
        _ => cleaned_base,
    }
}
