//! Model of JVM types, as the compiler sees them
//!
//! This covers the vocabulary everything else is written in: validated names, field and method
//! descriptors, access flags, value kinds, constant pools, and the class graph that ties classes
//! to their members.
//!
//! ### Example
//!
//! Declaring a class with two `int` fields and listing its instance layout:
//!
//! ```
//! use jvmci::jvm::class_graph::*;
//! use jvmci::jvm::*;
//!
//! let arenas = ClassGraphArenas::new();
//! let class_graph = ClassGraph::new(&arenas);
//! let java = class_graph.insert_java_library_types();
//!
//! let class = class_graph.add_class(ClassData::new(
//!     BinaryName::from_string(String::from("me/alec/Point")).unwrap(),
//!     java.classes.lang.object,
//!     ClassAccessFlags::PUBLIC,
//! ));
//! for name in ["x", "y"] {
//!     class_graph.add_field(FieldData {
//!         class,
//!         name: UnqualifiedName::from_string(String::from(name)).unwrap(),
//!         descriptor: FieldType::int(),
//!         access_flags: FieldAccessFlags::PUBLIC | FieldAccessFlags::FINAL,
//!     });
//! }
//!
//! let layout: Vec<String> = class
//!     .instance_fields()
//!     .iter()
//!     .map(|field| format!("{:?}", field))
//!     .collect();
//! assert_eq!(layout, vec!["me/alec/Point.x:I", "me/alec/Point.y:I"]);
//! ```

mod access_flags;
mod binary_format;
pub mod class_graph;
mod constant_pool;
mod descriptors;
mod errors;
mod kind;
mod names;

pub use access_flags::*;
pub use binary_format::*;
pub use constant_pool::*;
pub use descriptors::*;
pub use errors::*;
pub use kind::*;
pub use names::*;
