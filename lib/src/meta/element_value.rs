use super::Error;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

/// Skip over one [`element_value`][0] without decoding it
///
/// The tag alone determines how many bytes follow, so this needs no constant pool. Nested
/// annotations and arrays are skipped recursively.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.16.1
pub fn skip_element_value<R: Read>(reader: &mut R) -> Result<(), Error> {
    let tag = reader.read_u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => {
            reader.read_u16::<BigEndian>()?;
        }
        b'e' => {
            let _type_name = reader.read_u16::<BigEndian>()?;
            let _const_name = reader.read_u16::<BigEndian>()?;
        }
        b'@' => skip_annotation(reader)?,
        b'[' => {
            let count = reader.read_u16::<BigEndian>()?;
            for _ in 0..count {
                skip_element_value(reader)?;
            }
        }
        other => return Err(Error::MalformedElementValue(other)),
    }
    log::trace!("Skipped element value with tag {:?}", tag as char);
    Ok(())
}

/// Skip an `annotation` structure: type index followed by element name/value pairs
pub fn skip_annotation<R: Read>(reader: &mut R) -> Result<(), Error> {
    let _type_index = reader.read_u16::<BigEndian>()?;
    skip_element_value_pairs(reader)
}

/// Skip the `num_element_value_pairs` count and the pairs that follow
pub fn skip_element_value_pairs<R: Read>(reader: &mut R) -> Result<(), Error> {
    let pairs = reader.read_u16::<BigEndian>()?;
    for _ in 0..pairs {
        let _name_index = reader.read_u16::<BigEndian>()?;
        skip_element_value(reader)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn remaining_after_skip(bytes: &[u8]) -> Result<usize, Error> {
        let mut cursor = Cursor::new(bytes);
        skip_element_value(&mut cursor)?;
        Ok(bytes.len() - cursor.position() as usize)
    }

    #[test]
    fn scalars_and_enums() {
        assert_eq!(remaining_after_skip(&[b'I', 0, 7, 0xAA]).unwrap(), 1);
        assert_eq!(remaining_after_skip(&[b's', 0, 9]).unwrap(), 0);
        assert_eq!(remaining_after_skip(&[b'e', 0, 1, 0, 2, 0xAA, 0xAA]).unwrap(), 2);
    }

    #[test]
    fn arrays_and_nested_annotations() {
        let bytes = [
            b'[', 0, 2, // two elements
            b'Z', 0, 1, // true
            b'@', 0, 5, 0, 1, // nested annotation with one pair
            0, 6, b'c', 0, 8, // name, class value
            0xFF,
        ];
        assert_eq!(remaining_after_skip(&bytes).unwrap(), 1);
    }

    #[test]
    fn unknown_tag_and_truncation() {
        assert!(matches!(
            remaining_after_skip(&[b'x', 0, 0]),
            Err(Error::MalformedElementValue(b'x'))
        ));
        assert!(matches!(
            remaining_after_skip(&[b'[', 0, 3, b'I', 0, 1]),
            Err(Error::Truncated)
        ));
    }
}
