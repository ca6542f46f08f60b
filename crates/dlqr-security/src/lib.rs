//! Redaction primitives: pointers, path expressions, field transformers

pub mod hasher;
pub mod path;
pub mod pointer;
pub mod transform;

pub use hasher::{FieldHasher, PreviewHasher};
pub use path::{PathExpr, Segment, Selector, resolve};
pub use pointer::JsonPointer;
