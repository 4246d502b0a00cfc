use super::Error;
use crate::jvm::{decode_modified_utf8, encode_modified_utf8, Serialize};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};

/// Longest string (in UTF-16 code units) that always fits in the `u16` length of modified UTF-8
pub const MAX_UTF8_PROPERTY_STRING_LENGTH: usize = 65535 / 3;

static SAVED_PROPERTIES: OnceCell<HashMap<String, String>> = OnceCell::new();

/// Is the property short enough to be written in the compact form?
fn is_short(name: &str, value: &str) -> bool {
    name.encode_utf16().count() <= MAX_UTF8_PROPERTY_STRING_LENGTH
        && value.encode_utf16().count() <= MAX_UTF8_PROPERTY_STRING_LENGTH
}

/// Serialize properties for handing over to the compiler
///
/// The format is:
///
///   - `i32` number of short properties, `i32` number of long properties
///   - the short properties, name then value, each as a `u16` length and modified UTF-8
///   - the long properties, name then value, each as an `i32` length and UTF-8
///
/// A property is long if its name or value is more than `MAX_UTF8_PROPERTY_STRING_LENGTH`
/// UTF-16 code units. Properties are written in order of their names.
pub fn serialize_properties<W: WriteBytesExt>(
    properties: &HashMap<String, String>,
    writer: &mut W,
) -> io::Result<()> {
    let mut sorted: Vec<(&String, &String)> = properties.iter().collect();
    sorted.sort();
    let (short, long): (Vec<_>, Vec<_>) = sorted
        .into_iter()
        .partition(|(name, value)| is_short(name, value));
    write_properties(writer, &short, &long)
}

fn write_properties<W: WriteBytesExt>(
    writer: &mut W,
    short: &[(&String, &String)],
    long: &[(&String, &String)],
) -> io::Result<()> {
    (short.len() as i32).serialize(writer)?;
    (long.len() as i32).serialize(writer)?;
    for (name, value) in short {
        for string in [name, value] {
            let encoded = encode_modified_utf8(string);
            (encoded.len() as u16).serialize(writer)?;
            writer.write_all(&encoded)?;
        }
    }
    for (name, value) in long {
        for string in [name, value] {
            (string.len() as i32).serialize(writer)?;
            writer.write_all(string.as_bytes())?;
        }
    }
    Ok(())
}

/// Inverse of `serialize_properties`
pub fn deserialize_properties(bytes: &[u8]) -> Result<HashMap<String, String>, Error> {
    let mut reader = Cursor::new(bytes);
    let short_count = read_length(&mut reader)?;
    let long_count = read_length(&mut reader)?;
    let mut properties = HashMap::new();

    for _ in 0..short_count {
        let name = read_modified_utf8(&mut reader)?;
        let value = read_modified_utf8(&mut reader)?;
        properties.insert(name, value);
    }
    for _ in 0..long_count {
        let name = read_utf8(&mut reader)?;
        let value = read_utf8(&mut reader)?;
        properties.insert(name, value);
    }

    let leftover = bytes.len() - reader.position() as usize;
    if leftover != 0 {
        return Err(Error::TrailingData(leftover));
    }
    log::debug!(
        "Deserialized {} saved properties ({} long)",
        properties.len(),
        long_count
    );
    Ok(properties)
}

fn read_length<R: Read>(reader: &mut R) -> Result<usize, Error> {
    let length = reader.read_i32::<BigEndian>()?;
    usize::try_from(length).map_err(|_| Error::NegativeLength(length))
}

fn read_modified_utf8<R: Read>(reader: &mut R) -> Result<String, Error> {
    let length = reader.read_u16::<BigEndian>()?;
    let mut buffer = vec![0; length as usize];
    reader.read_exact(&mut buffer)?;
    Ok(decode_modified_utf8(&buffer)?)
}

fn read_utf8<R: Read>(reader: &mut R) -> Result<String, Error> {
    let length = read_length(reader)?;
    let mut buffer = vec![];
    reader.take(length as u64).read_to_end(&mut buffer)?;
    if buffer.len() != length {
        return Err(Error::Truncated);
    }
    Ok(String::from_utf8(buffer)?)
}

/// Initialize the process-wide saved properties from their serialized form
///
/// This can only happen once.
pub fn initialize_saved_properties(
    bytes: &[u8],
) -> Result<&'static HashMap<String, String>, Error> {
    let properties = deserialize_properties(bytes)?;
    SAVED_PROPERTIES
        .set(properties)
        .map_err(|_| Error::AlreadyInitialized)?;
    saved_properties()
}

/// The process-wide saved properties
pub fn saved_properties() -> Result<&'static HashMap<String, String>, Error> {
    SAVED_PROPERTIES.get().ok_or(Error::NotInitialized)
}

/// Value of a saved property
pub fn saved_property(name: &str) -> Result<Option<&'static str>, Error> {
    Ok(saved_properties()?.get(name).map(String::as_str))
}

/// Value of a saved property, or a default if it is not set
pub fn saved_property_or<'a>(name: &str, default: &'a str) -> Result<&'a str, Error> {
    Ok(saved_property(name)?.unwrap_or(default))
}

#[cfg(test)]
mod test {
    use super::*;

    fn serialized(properties: &HashMap<String, String>) -> Vec<u8> {
        let mut bytes = vec![];
        serialize_properties(properties, &mut bytes).unwrap();
        bytes
    }

    fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn short_properties_layout() {
        let bytes = serialized(&properties(&[("b", "2"), ("a", "\u{0}")]));
        assert_eq!(
            bytes,
            vec![
                0, 0, 0, 2, // short
                0, 0, 0, 0, // long
                0, 1, b'a', 0, 2, 0xC0, 0x80, // a=\0
                0, 1, b'b', 0, 1, b'2', // b=2
            ]
        );
    }

    #[test]
    fn long_properties_go_last() {
        let long_value = "\u{e9}".repeat(MAX_UTF8_PROPERTY_STRING_LENGTH + 1);
        let props = properties(&[("java.home", "/opt/jdk"), ("z.long", &long_value)]);
        let bytes = serialized(&props);

        assert_eq!(&bytes[0..8], &[0, 0, 0, 1, 0, 0, 0, 1]);
        let long_start = 8 + 2 + "java.home".len() + 2 + "/opt/jdk".len();
        assert_eq!(&bytes[long_start..long_start + 4], &[0, 0, 0, 6]);
        assert_eq!(deserialize_properties(&bytes).unwrap(), props);
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(
            deserialize_properties(&[0, 0, 0, 1, 0, 0, 0, 0, 0, 3, b'a']),
            Err(Error::Truncated)
        ));
        assert!(matches!(
            deserialize_properties(&[0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]),
            Err(Error::NegativeLength(-1))
        ));
        assert!(matches!(
            deserialize_properties(&[0, 0, 0, 0, 0, 0, 0, 0, 7]),
            Err(Error::TrailingData(1))
        ));
        assert!(matches!(
            deserialize_properties(&[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0xFF, 0, 0, 0, 0]),
            Err(Error::MalformedUtf8(_))
        ));
    }

    #[test]
    fn huge_declared_counts() {
        assert!(matches!(
            deserialize_properties(&[0x7F, 0xFF, 0xFF, 0xFF, 0x7F, 0xFF, 0xFF, 0xFF]),
            Err(Error::Truncated)
        ));
        assert!(matches!(
            deserialize_properties(&[0, 0, 0, 0, 0x7F, 0xFF, 0xFF, 0xFF, 0, 0, 0, 1, b'a']),
            Err(Error::Truncated)
        ));
    }
}
