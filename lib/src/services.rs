//! Services the compiler gets from the host VM
//!
//! Currently this is the system properties saved when the VM started. The compiler reads its
//! configuration from these rather than from the environment of whatever process it happens to
//! be loaded in.

mod errors;
mod saved_properties;

pub use errors::*;
pub use saved_properties::*;
