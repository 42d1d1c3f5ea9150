//! Crate error types (spec §7).
//!
//! The core never panics on well-typed input. These three kinds cover the
//! three failure categories §7 distinguishes: contract violations at the
//! generator boundary, and the two host-runtime error kinds that are always
//! caught at the component boundary where they originate and turned into a
//! safe fallback, never propagated to a caller.

use thiserror::Error;

/// Raised only for misuse of the generator's contract — not for ordinary
/// "nothing to generate" cases, which are `Option::None` (§7: "generation
/// returns nothing").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("element does not belong to the supplied root")]
    ElementNotInRoot,
}

/// Raised by a `QueryEngine` implementation. Always caught at the resolver
/// boundary and turned into an empty candidate set plus a degradation
/// reason (§4.9 phase 1, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("selector could not be parsed: {0}")]
    InvalidSelector(String),
    #[error("query root is detached from its document")]
    DetachedRoot,
}

/// Raised by `ElementHandle::bounding_rect`. Caught at the SVG fingerprinter
/// and constraints-evaluator boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("bounding rectangle unavailable: {0}")]
    Unavailable(String),
}

/// Raised by `ElementHandle::computed_style`. Caught at the SVG
/// fingerprinter boundary and treated as "no animation".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("computed style unavailable: {0}")]
    Unavailable(String),
}
