use super::VirtualObject;
use crate::jvm::class_graph::ConstantData;
use crate::jvm::JavaKind;
use std::fmt;

/// Value of a local, a stack slot, a field of a virtual object, etc. at a safepoint
#[derive(Clone)]
pub enum JavaValue<'g> {
    /// Nothing (eg. a dead local)
    Illegal,

    Null,

    Primitive(PrimitiveConstant),

    /// Constant object (string or class)
    Constant(ConstantData<'g>),

    /// Value held in a register or stack slot of the compiled frame
    Location(ValueLocation),

    /// Object whose allocation was elided
    Virtual(&'g VirtualObject<'g>),
}

impl<'g> JavaValue<'g> {
    pub fn as_virtual(&self) -> Option<&'g VirtualObject<'g>> {
        match self {
            JavaValue::Virtual(object) => Some(*object),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveConstant> {
        match self {
            JavaValue::Primitive(constant) => Some(*constant),
            _ => None,
        }
    }
}

/// Virtual objects are only ever equal to themselves (no structural comparison), which keeps
/// comparisons of cyclic graphs finite. Everything else compares by value.
impl<'g> PartialEq for JavaValue<'g> {
    fn eq(&self, other: &JavaValue<'g>) -> bool {
        match (self, other) {
            (JavaValue::Virtual(obj1), JavaValue::Virtual(obj2)) => std::ptr::eq(*obj1, *obj2),
            (JavaValue::Illegal, JavaValue::Illegal) => true,
            (JavaValue::Null, JavaValue::Null) => true,
            (JavaValue::Primitive(prim1), JavaValue::Primitive(prim2)) => prim1 == prim2,
            (JavaValue::Constant(const1), JavaValue::Constant(const2)) => const1 == const2,
            (JavaValue::Location(loc1), JavaValue::Location(loc2)) => loc1 == loc2,
            _ => false,
        }
    }
}

impl<'g> From<PrimitiveConstant> for JavaValue<'g> {
    fn from(constant: PrimitiveConstant) -> Self {
        JavaValue::Primitive(constant)
    }
}

impl<'g> From<&'g VirtualObject<'g>> for JavaValue<'g> {
    fn from(object: &'g VirtualObject<'g>) -> Self {
        JavaValue::Virtual(object)
    }
}

impl<'g> fmt::Debug for JavaValue<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<'g> fmt::Display for JavaValue<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaValue::Illegal => f.write_str("-"),
            JavaValue::Null => f.write_str("null"),
            JavaValue::Primitive(constant) => fmt::Display::fmt(constant, f),
            JavaValue::Constant(constant) => fmt::Display::fmt(constant, f),
            JavaValue::Location(location) => fmt::Display::fmt(location, f),
            JavaValue::Virtual(object) => fmt::Display::fmt(object, f),
        }
    }
}

/// Primitive constant
///
/// The value is stored as the raw bits, sign-extended to 64 bits for integral kinds. `float` and
/// `double` constants keep their exact bit pattern (so two NaNs with the same bits are equal).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct PrimitiveConstant {
    kind: JavaKind,
    bits: i64,
}

impl PrimitiveConstant {
    pub const fn boolean(value: bool) -> Self {
        PrimitiveConstant {
            kind: JavaKind::Boolean,
            bits: value as i64,
        }
    }

    pub const fn byte(value: i8) -> Self {
        PrimitiveConstant {
            kind: JavaKind::Byte,
            bits: value as i64,
        }
    }

    pub const fn short(value: i16) -> Self {
        PrimitiveConstant {
            kind: JavaKind::Short,
            bits: value as i64,
        }
    }

    pub const fn char(value: u16) -> Self {
        PrimitiveConstant {
            kind: JavaKind::Char,
            bits: value as i64,
        }
    }

    pub const fn int(value: i32) -> Self {
        PrimitiveConstant {
            kind: JavaKind::Int,
            bits: value as i64,
        }
    }

    pub const fn long(value: i64) -> Self {
        PrimitiveConstant {
            kind: JavaKind::Long,
            bits: value,
        }
    }

    pub fn float(value: f32) -> Self {
        PrimitiveConstant {
            kind: JavaKind::Float,
            bits: value.to_bits() as i64,
        }
    }

    pub fn double(value: f64) -> Self {
        PrimitiveConstant {
            kind: JavaKind::Double,
            bits: value.to_bits() as i64,
        }
    }

    pub const fn kind(&self) -> JavaKind {
        self.kind
    }

    /// Value of an integral (or `boolean`) constant
    pub fn as_i64(&self) -> Option<i64> {
        match self.kind {
            JavaKind::Float | JavaKind::Double => None,
            _ => Some(self.bits),
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self.kind {
            JavaKind::Float => Some(f32::from_bits(self.bits as u32)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            JavaKind::Double => Some(f64::from_bits(self.bits as u64)),
            _ => None,
        }
    }
}

/// Rendered as the kind followed by the value, eg. `int[42]` or `boolean[true]`
impl fmt::Display for PrimitiveConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.kind)?;
        match self.kind {
            JavaKind::Boolean => write!(f, "{}", self.bits != 0)?,
            JavaKind::Char => match char::from_u32(self.bits as u32) {
                Some(c) if !c.is_control() => write!(f, "{:?}", c)?,
                _ => write!(f, "\\u{:04x}", self.bits)?,
            },
            JavaKind::Float => write!(f, "{:?}", f32::from_bits(self.bits as u32))?,
            JavaKind::Double => write!(f, "{:?}", f64::from_bits(self.bits as u64))?,
            _ => write!(f, "{}", self.bits)?,
        }
        f.write_str("]")
    }
}

/// Place in a compiled frame holding a value
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ValueLocation {
    Register {
        number: u16,
        kind: JavaKind,
    },
    StackSlot {
        /// Byte offset from the stack pointer (or from the frame base, if `add_frame_size`)
        offset: i32,
        add_frame_size: bool,
        kind: JavaKind,
    },
}

impl ValueLocation {
    pub const fn kind(&self) -> JavaKind {
        match self {
            ValueLocation::Register { kind, .. } => *kind,
            ValueLocation::StackSlot { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for ValueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueLocation::Register { number, kind } => write!(f, "r{}|{}", number, kind),
            ValueLocation::StackSlot {
                offset,
                add_frame_size,
                kind,
            } => {
                let base = if *add_frame_size { "fp" } else { "sp" };
                write!(f, "stack:{}+{}|{}", base, offset, kind)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn primitive_constants() {
        assert_eq!(PrimitiveConstant::int(-3).as_i64(), Some(-3));
        assert_eq!(PrimitiveConstant::char(0xFFFF).as_i64(), Some(0xFFFF));
        assert_eq!(PrimitiveConstant::double(2.5).as_f64(), Some(2.5));
        assert_eq!(PrimitiveConstant::float(-0.75).as_f32(), Some(-0.75));
        assert_eq!(PrimitiveConstant::int(1).as_f32(), None);
        assert_eq!(PrimitiveConstant::float(2.5).as_i64(), None);
        assert_ne!(PrimitiveConstant::int(1), PrimitiveConstant::long(1));
        assert_eq!(
            PrimitiveConstant::float(f32::NAN),
            PrimitiveConstant::float(f32::NAN)
        );
    }

    #[test]
    fn display() {
        assert_eq!(PrimitiveConstant::int(42).to_string(), "int[42]");
        assert_eq!(PrimitiveConstant::boolean(true).to_string(), "boolean[true]");
        assert_eq!(PrimitiveConstant::char(97).to_string(), "char['a']");
        assert_eq!(PrimitiveConstant::char(0).to_string(), "char[\\u0000]");
        assert_eq!(PrimitiveConstant::double(1.0).to_string(), "double[1.0]");
        assert_eq!(JavaValue::Null.to_string(), "null");

        let slot = ValueLocation::StackSlot {
            offset: 16,
            add_frame_size: true,
            kind: JavaKind::Long,
        };
        assert_eq!(JavaValue::Location(slot).to_string(), "stack:fp+16|long");
    }

    #[test]
    fn non_virtual_values_compare_by_value() {
        let reg = ValueLocation::Register {
            number: 3,
            kind: JavaKind::Int,
        };
        assert_eq!(JavaValue::Location(reg), JavaValue::Location(reg));
        assert_eq!(
            JavaValue::from(PrimitiveConstant::short(7)),
            JavaValue::from(PrimitiveConstant::short(7))
        );
        assert_ne!(JavaValue::Null, JavaValue::Illegal);
        assert!(JavaValue::Null.as_virtual().is_none());
        assert!(JavaValue::Location(reg).as_virtual().is_none());
    }
}
