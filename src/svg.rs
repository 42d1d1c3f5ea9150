//! SVG fingerprinter (spec §4.3): derive a deterministic shape fingerprint
//! for a target element when it is SVG.

use crate::model::{Fingerprint, Shape};

/// Deterministic FNV-1a hasher, same construction the rest of the codebase's
/// lineage uses for stable ids: output is bit-stable across Rust versions,
/// which matters here because the generator and the matcher must agree on
/// the hash byte-for-byte.
struct FnvHasher(u64);

impl FnvHasher {
    const BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x00000100000001B3;

    fn new() -> Self {
        Self(Self::BASIS)
    }

    fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn finish_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

fn hash_str(s: &str) -> String {
    let mut h = FnvHasher::new();
    h.write_str(s);
    h.finish_hex()
}

/// Classify an SVG tag name into `Shape`; unknown tags default to `Path`.
pub fn classify_shape(tag: &str) -> Shape {
    match tag {
        "rect" => Shape::Rect,
        "circle" => Shape::Circle,
        "ellipse" => Shape::Ellipse,
        "line" => Shape::Line,
        "polyline" => Shape::Polyline,
        "polygon" => Shape::Polygon,
        "g" => Shape::G,
        "text" | "tspan" => Shape::Text,
        "use" => Shape::Use,
        "svg" => Shape::Svg,
        "path" => Shape::Path,
        _ => Shape::Path,
    }
}

fn round_1dp(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// A single numeric drawing-command token from a `d` attribute, already
/// split into its command letter and operands by the caller.
pub struct PathCommand {
    pub letter: char,
    pub operands: Vec<f64>,
}

/// Compute `dHash` from a path's drawing commands: round every operand to
/// one decimal place, keep only the first five commands, hash the result.
pub fn compute_d_hash(commands: &[PathCommand]) -> String {
    let mut normalized = String::new();
    for cmd in commands.iter().take(5) {
        normalized.push(cmd.letter);
        for op in &cmd.operands {
            normalized.push(' ');
            normalized.push_str(&format!("{:.1}", round_1dp(*op)));
        }
        normalized.push(';');
    }
    hash_str(&normalized)
}

/// Parse a raw `d` attribute string into commands, tolerant of the usual SVG
/// path grammar: a command letter followed by comma/space separated numbers,
/// repeated until the next letter.
pub fn parse_path_commands(d: &str) -> Vec<PathCommand> {
    let mut commands = Vec::new();
    let mut chars = d.char_indices().peekable();
    let mut current_letter: Option<char> = None;
    let mut buf = String::new();
    let mut operands = Vec::new();

    fn flush_number(buf: &mut String, operands: &mut Vec<f64>) {
        if !buf.is_empty() {
            if let Ok(n) = buf.parse::<f64>() {
                operands.push(n);
            }
            buf.clear();
        }
    }

    while let Some((_, c)) = chars.next() {
        if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            flush_number(&mut buf, &mut operands);
            if let Some(letter) = current_letter.take() {
                commands.push(PathCommand { letter, operands: std::mem::take(&mut operands) });
            }
            current_letter = Some(c);
        } else if c == ',' || c == ' ' || c == '\n' || c == '\t' {
            flush_number(&mut buf, &mut operands);
        } else if c == '-' && !buf.is_empty() && !buf.ends_with('e') && !buf.ends_with('E') {
            flush_number(&mut buf, &mut operands);
            buf.push(c);
        } else {
            buf.push(c);
        }
    }
    flush_number(&mut buf, &mut operands);
    if let Some(letter) = current_letter {
        commands.push(PathCommand { letter, operands });
    }
    commands
}

/// Compute `geomHash` for non-path shapes from pre-extracted geometry
/// numbers. Each variant guards its own "both positive" precondition; when
/// it fails, no hash can be derived.
pub enum Geometry {
    Rect { width: f64, height: f64 },
    Circle { radius: f64 },
    Ellipse { rx: f64, ry: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
}

pub fn compute_geom_hash(geometry: &Geometry) -> Option<String> {
    let value = match geometry {
        Geometry::Rect { width, height } if *width > 0.0 && *height > 0.0 => {
            round_1dp(width / height)
        }
        Geometry::Circle { radius } if *radius > 0.0 => round_1dp(*radius),
        Geometry::Ellipse { rx, ry } if *rx > 0.0 && *ry > 0.0 => round_1dp(rx / ry),
        Geometry::Line { x1, y1, x2, y2 } => round_1dp((y2 - y1).atan2(x2 - x1)),
        _ => return None,
    };
    Some(hash_str(&format!("{:.1}", value)))
}

/// SMIL animation child tags that always imply `hasAnimation`.
const SMIL_ANIMATION_TAGS: &[&str] = &["animate", "animateTransform", "animateMotion"];

pub fn is_smil_animation_tag(tag: &str) -> bool {
    SMIL_ANIMATION_TAGS.contains(&tag)
}

/// Facts about an element's computed style, as the host reports them.
/// `Err` (a style read failure) is treated as "no animation" per spec.
pub struct StyleAnimationFacts {
    pub animation_name: Option<String>,
    pub transition_property: Option<String>,
}

/// Decide `hasAnimation` from SMIL children plus computed-style facts.
/// `style` is `None` when the host's style read failed or is unavailable —
/// errors must already have been caught by the caller and turned into
/// `None` here.
pub fn has_animation(has_smil_child: bool, style: Option<&StyleAnimationFacts>) -> bool {
    if has_smil_child {
        return true;
    }
    let Some(style) = style else { return false };
    let animated_by_name = style
        .animation_name
        .as_deref()
        .map(|n| !n.is_empty() && n != "none")
        .unwrap_or(false);
    let animated_by_transition = style
        .transition_property
        .as_deref()
        .map(|p| !p.is_empty() && p != "none")
        .unwrap_or(false);
    animated_by_name || animated_by_transition
}

/// Everything the fingerprinter needs about the target SVG element, already
/// extracted by the caller's `DomAdapter` walk.
pub struct SvgFacts<'a> {
    pub tag: &'a str,
    pub d_attribute: Option<&'a str>,
    pub geometry: Option<Geometry>,
    pub has_smil_child: bool,
    pub style: Option<StyleAnimationFacts>,
    pub role: Option<&'a str>,
    pub title_text: Option<&'a str>,
}

/// Build the full `Fingerprint` for an SVG target element.
pub fn fingerprint(facts: &SvgFacts<'_>) -> Fingerprint {
    let shape = classify_shape(facts.tag);

    let d_hash = if shape == Shape::Path {
        facts
            .d_attribute
            .filter(|d| !d.trim().is_empty())
            .map(|d| compute_d_hash(&parse_path_commands(d)))
    } else {
        None
    };

    let geom_hash = if shape != Shape::Path {
        facts.geometry.as_ref().and_then(compute_geom_hash)
    } else {
        None
    };

    Fingerprint {
        shape: Some(shape),
        d_hash,
        geom_hash,
        has_animation: has_animation(facts.has_smil_child, facts.style.as_ref()),
        role: facts.role.map(|r| r.to_string()),
        title_text: facts.title_text.map(|t| t.to_string()),
    }
}
