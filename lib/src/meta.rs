//! Metadata attached to method bytecode
//!
//! The compiler reads type annotations on local variables out of the raw
//! `RuntimeVisibleTypeAnnotations` bytes of a method. Only local variable targets are understood
//! and annotation element values are not decoded (only the defaults declared on the annotation
//! interface end up in the result).

mod element_value;
mod errors;
mod local_annotation;
mod type_annotations;

pub use errors::*;
pub use local_annotation::*;
pub use type_annotations::*;
