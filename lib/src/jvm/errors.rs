use super::{Constant, ConstantIndex};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),

    /// No more room in a constant pool (indices are `u16`)
    ConstantPoolOverflow {
        constant: Constant,
        offset: usize,
    },

    /// Index does not point at the start of a constant
    MissingConstant(ConstantIndex),

    /// Index points to a constant, but not of the expected sort
    UnexpectedConstant {
        index: ConstantIndex,
        expected: &'static str,
        found: Constant,
    },

    UnsupportedConstantTag(u8),

    /// Bytes that are not valid modified UTF-8
    MalformedModifiedUtf8(Vec<u8>),

    /// Descriptor or signature which could not be parsed
    BadDescriptor(String),

    MissingClass(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::ConstantPoolOverflow { constant, offset } => write!(
                f,
                "constant pool overflow at offset {} inserting {:?}",
                offset, constant
            ),
            Error::MissingConstant(index) => write!(f, "no constant at index {}", index.0),
            Error::UnexpectedConstant {
                index,
                expected,
                found,
            } => write!(
                f,
                "expected {} constant at index {} but found {:?}",
                expected, index.0, found
            ),
            Error::UnsupportedConstantTag(tag) => write!(f, "unsupported constant tag {}", tag),
            Error::MalformedModifiedUtf8(bytes) => {
                write!(f, "malformed modified UTF-8: {:?}", bytes)
            }
            Error::BadDescriptor(msg) => write!(f, "bad descriptor: {}", msg),
            Error::MissingClass(name) => write!(f, "class not found: {}", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}
