//! Debug information the compiler hands to the runtime for deoptimization
//!
//! When escape analysis removes an allocation, the object still has to be materialized if the
//! optimized code deoptimizes. A [`VirtualObject`] records everything needed for that: the type,
//! the values of the fields (or array elements), and whether an existing object should be reused.
//! Virtual objects can refer to each other (and to themselves), so they live in a
//! [`VirtualObjectArena`] and point at each other with plain references.

mod box_cache;
mod errors;
mod value;
mod virtual_object;

pub use box_cache::*;
pub use errors::*;
pub use value::*;
pub use virtual_object::*;
