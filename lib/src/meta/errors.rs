use crate::jvm;
use crate::jvm::{BinaryName, UnqualifiedName};
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// Target type other than a local variable (`0x40`)
    UnsupportedTargetKind(u8),

    /// Annotation names an element that still exists on the annotation interface
    ///
    /// Decoding element values is not supported.
    UnimplementedElementDecoding {
        annotation: BinaryName,
        element: UnqualifiedName,
    },

    /// Input ended in the middle of a record
    Truncated,

    /// Unknown tag while skipping over an element value
    MalformedElementValue(u8),

    /// Constant pool lookup or type resolution failed
    Jvm(jvm::Error),
}

impl From<jvm::Error> for Error {
    fn from(err: jvm::Error) -> Error {
        Error::Jvm(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::Truncated
        } else {
            Error::Jvm(jvm::Error::IoError(err))
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedTargetKind(tag) => {
                write!(f, "unimplemented: type annotation: type={:#x}", tag)
            }
            Error::UnimplementedElementDecoding {
                annotation,
                element,
            } => write!(
                f,
                "unimplemented: value of element {} in annotation {}",
                element,
                annotation.to_java_name()
            ),
            Error::Truncated => f.write_str("type annotation data ends early"),
            Error::MalformedElementValue(tag) => {
                write!(f, "unknown element value tag {:?}", *tag as char)
            }
            Error::Jvm(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Jvm(err) => Some(err),
            _ => None,
        }
    }
}
