//! EID structural validator and type guard (spec §6).

use serde_json::Value;

use crate::model::{Eid, CURRENT_VERSION};
use crate::stability::{is_class_stable, is_identifier_stable};

/// Validation diagnostics: an open set of free-text messages rather than a
/// closed enum, since §6 calls for exactly that ("errors for missing
/// anchor/target/..., warnings for unknown version/...").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EidValidator {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl EidValidator {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a fully-typed `Eid` value against the structural rules §6 names.
pub fn validate(eid: &Eid) -> EidValidator {
    let mut v = EidValidator::default();

    if eid.version.is_empty() {
        v.errors.push("missing version".to_string());
    } else if eid.version != CURRENT_VERSION {
        v.warnings.push(format!("unknown version \"{}\"", eid.version));
    }

    if eid.anchor.tag.is_empty() {
        v.errors.push("missing anchor".to_string());
    }
    if eid.target.tag.is_empty() {
        v.errors.push("missing target".to_string());
    }

    for (label, node) in [("anchor", &eid.anchor), ("target", &eid.target)] {
        if !(0.0..=1.0).contains(&node.score) {
            v.errors.push(format!("{label} score out of range: {}", node.score));
        }
        if node.semantics.is_empty() {
            v.warnings.push(format!("{label} has empty semantics"));
        }
        if let Some(id) = &node.semantics.id {
            if !is_identifier_stable(id) {
                v.warnings.push(format!("{label} id \"{id}\" is not classified stable"));
            }
        }
        for class in &node.semantics.classes {
            if !is_class_stable(class) {
                v.warnings.push(format!("{label} class \"{class}\" is not classified stable"));
            }
        }
    }

    if !(0.0..=1.0).contains(&eid.meta.confidence) {
        v.errors.push(format!("confidence out of range: {}", eid.meta.confidence));
    }

    if eid.meta.generator.is_empty() {
        v.warnings.push("missing meta.generator".to_string());
    }

    if eid.meta.degraded && eid.meta.degradation_reason.is_none() {
        v.warnings.push("degraded without a degradation reason".to_string());
    }

    v
}

/// Does `value` have the minimal EID shape — a JSON-level type guard usable
/// before attempting a full typed deserialize (spec §6).
pub fn looks_like_eid(value: &Value) -> bool {
    let Some(obj) = value.as_object() else { return false };
    obj.contains_key("version")
        && obj.get("anchor").is_some_and(Value::is_object)
        && obj.get("target").is_some_and(Value::is_object)
        && obj.get("fallback").is_some_and(Value::is_object)
        && obj.get("meta").is_some_and(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FallbackPolicy, Meta, Node, Semantics};

    fn valid_eid() -> Eid {
        let node = Node::new(
            "form",
            Semantics { id: Some("login".into()), ..Default::default() },
            0.9,
        );
        Eid {
            version: CURRENT_VERSION.to_string(),
            anchor: node.clone(),
            path: vec![],
            target: node,
            constraints: vec![],
            fallback: FallbackPolicy::default(),
            meta: Meta {
                confidence: 0.9,
                generated_at: 0,
                generator: "eidentity".into(),
                source: None,
                degraded: false,
                degradation_reason: None,
            },
        }
    }

    #[test]
    fn well_formed_eid_has_no_errors() {
        let v = validate(&valid_eid());
        assert!(v.is_valid());
        assert!(v.errors.is_empty());
    }

    #[test]
    fn missing_tag_is_an_error() {
        let mut eid = valid_eid();
        eid.anchor.tag = String::new();
        let v = validate(&eid);
        assert!(!v.is_valid());
        assert!(v.errors.iter().any(|e| e.contains("anchor")));
    }

    #[test]
    fn unknown_version_is_a_warning_not_an_error() {
        let mut eid = valid_eid();
        eid.version = "2.0".to_string();
        let v = validate(&eid);
        assert!(v.is_valid());
        assert!(v.warnings.iter().any(|w| w.contains("unknown version")));
    }

    #[test]
    fn out_of_range_confidence_is_an_error() {
        let mut eid = valid_eid();
        eid.meta.confidence = 1.5;
        let v = validate(&eid);
        assert!(!v.is_valid());
    }

    #[test]
    fn degraded_without_reason_warns() {
        let mut eid = valid_eid();
        eid.meta.degraded = true;
        let v = validate(&eid);
        assert!(v.warnings.iter().any(|w| w.contains("degraded")));
    }

    #[test]
    fn unstable_id_in_semantics_warns() {
        let mut eid = valid_eid();
        eid.anchor.semantics.id = Some("a1b2c3d4e5f6".to_string());
        let v = validate(&eid);
        assert!(v.warnings.iter().any(|w| w.contains("not classified stable")));
    }

    #[test]
    fn type_guard_accepts_minimal_shape() {
        let json = serde_json::to_value(valid_eid()).unwrap();
        assert!(looks_like_eid(&json));
    }

    #[test]
    fn type_guard_rejects_missing_fields() {
        let json = serde_json::json!({ "version": "1.0" });
        assert!(!looks_like_eid(&json));
    }

    #[test]
    fn type_guard_rejects_non_object() {
        let json = serde_json::json!("not an eid");
        assert!(!looks_like_eid(&json));
    }
}
