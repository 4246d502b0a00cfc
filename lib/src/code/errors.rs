use crate::jvm::JavaKind;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Values and slot kinds must be replaced together and have the same length
    ValueCountMismatch { values: usize, slot_kinds: usize },

    /// Index past the end of the values (or values not yet set)
    NoSuchSlot { index: usize, slots: usize },

    /// Two virtual objects in one arena with the same id
    DuplicateId(u32),

    /// Values of a virtual object don't fit the layout of its type
    Layout {
        /// Rendered form of the offending virtual object
        object: String,
        kind: LayoutErrorKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutErrorKind {
    ValuesNotSet,

    /// More values than there are instance fields
    FieldCountMismatch,

    /// Double-word value stored across two `int` fields, but not 8-byte aligned
    MisalignedSplitValue { offset: i32 },

    /// Double-word value stored across two `int` fields, but the first is the last field
    MissingSecondSplitField,

    /// Double-word value stored across two fields, but the second is not an `int`
    IncompatibleSplitFieldKind { found: JavaKind },

    /// Double-word value stored across two `int` fields that are not adjacent
    NonSequentialSplitFields { first: i32, second: i32 },

    KindMismatch {
        field: String,
        expected: JavaKind,
        found: JavaKind,
    },

    /// More instance fields than there are values
    NotEnoughValues,
}

impl fmt::Display for LayoutErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutErrorKind::ValuesNotSet => f.write_str("Values were never set"),
            LayoutErrorKind::FieldCountMismatch => {
                f.write_str("Not enough fields for the values provided")
            }
            LayoutErrorKind::MisalignedSplitValue { offset } => write!(
                f,
                "Double word value stored across two ints must be aligned (offset {})",
                offset
            ),
            LayoutErrorKind::MissingSecondSplitField => {
                f.write_str("Missing second field for double word value stored in two ints")
            }
            LayoutErrorKind::IncompatibleSplitFieldKind { found } => write!(
                f,
                "Second field for double word value stored in two ints must be int but got {}",
                found
            ),
            LayoutErrorKind::NonSequentialSplitFields { first, second } => write!(
                f,
                "Double word value stored across two ints must be sequential (offsets {} and {})",
                first, second
            ),
            LayoutErrorKind::KindMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "Expected value of kind {} but got {} for field {}",
                expected, found, field
            ),
            LayoutErrorKind::NotEnoughValues => {
                f.write_str("Not enough values provided for fields")
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ValueCountMismatch { values, slot_kinds } => write!(
                f,
                "{} values provided with {} slot kinds",
                values, slot_kinds
            ),
            Error::NoSuchSlot { index, slots } => {
                write!(f, "slot {} out of bounds ({} slots)", index, slots)
            }
            Error::DuplicateId(id) => write!(f, "duplicate virtual object id {}", id),
            Error::Layout { object, kind } => write!(f, "{} in {}", kind, object),
        }
    }
}

impl std::error::Error for Error {}
