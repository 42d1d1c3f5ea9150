//! Stable semantic element identity descriptors.
//!
//! This crate produces and re-resolves Element Identity Descriptors
//! (EIDs): structured, version-tagged values that name a specific element
//! in a tree-structured document (conceptually HTML) well enough to find it
//! again later, across reorderings, restyling, and framework-generated
//! identifier churn — without tracking the element live as the document
//! mutates.
//!
//! The pipeline, [`generator::generate`] → [`selector`] → [`resolver::resolve`],
//! is deliberately synchronous and single-threaded (see [`resolver`] for the
//! five-phase location state machine). [`stability`] and [`cache`] are shared
//! dependencies used throughout.

pub mod anchor;
pub mod cache;
pub mod constraints;
pub mod error;
pub mod generator;
pub mod host;
pub mod levenshtein;
pub mod matcher;
pub mod model;
pub mod path;
pub mod resolver;
pub mod scoring;
pub mod selector;
pub mod semantics;
pub mod stability;
pub mod svg;
pub mod validate;

pub use error::{GenerateError, GeometryError, QueryError, StyleError};
pub use generator::{generate, GenerateOptions};
pub use model::{Eid, Node, Semantics};
pub use resolver::{resolve, ResolveOptions, ResolveResult, Status};
pub use validate::{looks_like_eid, validate, EidValidator};
