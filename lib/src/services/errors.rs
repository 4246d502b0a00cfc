use crate::jvm;
use std::fmt;
use std::io;
use std::string::FromUtf8Error;

#[derive(Debug)]
pub enum Error {
    /// Serialized properties ended early
    Truncated,

    /// Property count or string length is negative
    NegativeLength(i32),

    /// Long property that is not valid UTF-8
    MalformedUtf8(FromUtf8Error),

    /// Bytes left over after the last property
    TrailingData(usize),

    /// Saved properties were already initialized
    AlreadyInitialized,

    /// Saved properties were read before being initialized
    NotInitialized,

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

impl From<FromUtf8Error> for Error {
    fn from(err: FromUtf8Error) -> Error {
        Error::MalformedUtf8(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Truncated => f.write_str("serialized properties end early"),
            Error::NegativeLength(len) => write!(f, "negative length {}", len),
            Error::MalformedUtf8(err) => write!(f, "malformed UTF-8 in property: {}", err),
            Error::TrailingData(len) => write!(f, "{} bytes after the last property", len),
            Error::AlreadyInitialized => f.write_str("saved properties already initialized"),
            Error::NotInitialized => f.write_str("saved properties not initialized"),
            Error::Jvm(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MalformedUtf8(err) => Some(err),
            Error::Jvm(err) => Some(err),
            _ => None,
        }
    }
}
