use super::{BaseType, BinaryName, FieldType};
use crate::util::Width;
use std::fmt;

/// Kind of a value as the compiler and runtime see it
///
/// This is coarser than a `FieldType` (all references are just `Object`) and has two extra
/// members: `Void` for the absence of a value and `Illegal` for slots holding nothing usable (eg.
/// the second half of a `long` in the locals).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum JavaKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Float,
    Long,
    Double,
    Object,
    Void,
    Illegal,
}

impl JavaKind {
    /// Number of 4-byte stack/local slots a value of this kind takes up
    pub const fn slot_count(&self) -> usize {
        match self {
            JavaKind::Long | JavaKind::Double => 2,
            JavaKind::Void | JavaKind::Illegal => 0,
            _ => 1,
        }
    }

    /// Kind the value has once it is loaded onto the operand stack
    ///
    /// The JVM has no sub-word operand stack entries: `boolean`, `byte`, `short`, and `char` all
    /// widen to `int`.
    pub const fn stack_kind(&self) -> JavaKind {
        match self {
            JavaKind::Boolean | JavaKind::Byte | JavaKind::Short | JavaKind::Char => JavaKind::Int,
            other => *other,
        }
    }

    pub const fn java_name(&self) -> &'static str {
        match self {
            JavaKind::Boolean => "boolean",
            JavaKind::Byte => "byte",
            JavaKind::Short => "short",
            JavaKind::Char => "char",
            JavaKind::Int => "int",
            JavaKind::Float => "float",
            JavaKind::Long => "long",
            JavaKind::Double => "double",
            JavaKind::Object => "Object",
            JavaKind::Void => "void",
            JavaKind::Illegal => "illegal",
        }
    }

    /// Primitive kind boxed by one of the `java.lang` box classes
    pub fn from_box_class(name: &BinaryName) -> Option<JavaKind> {
        let kind = if name == &BinaryName::BOOLEAN {
            JavaKind::Boolean
        } else if name == &BinaryName::BYTE {
            JavaKind::Byte
        } else if name == &BinaryName::SHORT {
            JavaKind::Short
        } else if name == &BinaryName::CHARACTER {
            JavaKind::Char
        } else if name == &BinaryName::INTEGER {
            JavaKind::Int
        } else if name == &BinaryName::LONG {
            JavaKind::Long
        } else if name == &BinaryName::FLOAT {
            JavaKind::Float
        } else if name == &BinaryName::DOUBLE {
            JavaKind::Double
        } else {
            return None;
        };
        Some(kind)
    }
}

impl Width for JavaKind {
    fn width(&self) -> usize {
        self.slot_count()
    }
}

impl From<BaseType> for JavaKind {
    fn from(base_type: BaseType) -> JavaKind {
        match base_type {
            BaseType::Boolean => JavaKind::Boolean,
            BaseType::Byte => JavaKind::Byte,
            BaseType::Short => JavaKind::Short,
            BaseType::Char => JavaKind::Char,
            BaseType::Int => JavaKind::Int,
            BaseType::Float => JavaKind::Float,
            BaseType::Long => JavaKind::Long,
            BaseType::Double => JavaKind::Double,
        }
    }
}

impl<C> From<&FieldType<C>> for JavaKind {
    fn from(field_type: &FieldType<C>) -> JavaKind {
        match field_type {
            FieldType::Base(base_type) => JavaKind::from(*base_type),
            FieldType::Ref(_) => JavaKind::Object,
        }
    }
}

impl fmt::Display for JavaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.java_name())
    }
}
