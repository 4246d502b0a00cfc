//! Pieces of a JVM compiler interface that deal with metadata and debug information
//!
//! The crate is organized into:
//!
//!   - [`jvm`]: the model of classes, fields, methods, descriptors, and constant pools
//!   - [`meta`]: decoding of type annotations attached to method bytecode
//!   - [`code`]: virtual objects describing allocations removed by escape analysis
//!   - [`services`]: system properties saved by the host VM
//!
//! ### Example
//!
//! Two virtual objects pointing at each other:
//!
//! ```
//! use jvmci::code::*;
//! use jvmci::jvm::class_graph::*;
//! use jvmci::jvm::*;
//!
//! let arenas = ClassGraphArenas::new();
//! let class_graph = ClassGraph::new(&arenas);
//! let java = class_graph.insert_java_library_types();
//!
//! let node = class_graph.add_class(ClassData::new(
//!     BinaryName::from_string(String::from("me/alec/Node")).unwrap(),
//!     java.classes.lang.object,
//!     ClassAccessFlags::PUBLIC,
//! ));
//! class_graph.add_field(FieldData {
//!     class: node,
//!     name: UnqualifiedName::from_string(String::from("next")).unwrap(),
//!     descriptor: FieldType::object(node),
//!     access_flags: FieldAccessFlags::PRIVATE,
//! });
//!
//! let objects = VirtualObjectArena::new();
//! let first = objects.add(VirtualObject::new(RefType::Object(node), 0, false)).unwrap();
//! let second = objects.add(VirtualObject::new(RefType::Object(node), 1, false)).unwrap();
//! first.set_values(vec![second.into()], vec![JavaKind::Object]).unwrap();
//! second.set_values(vec![first.into()], vec![JavaKind::Object]).unwrap();
//!
//! assert_eq!(
//!     first.to_string(),
//!     "vobject:me.alec.Node:0{next=vobject:me.alec.Node:1{next=vobject:me.alec.Node:0}}"
//! );
//! ```

pub mod code;
pub mod jvm;
pub mod meta;
pub mod services;
pub mod util;
