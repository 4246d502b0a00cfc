use byteorder::{BigEndian, WriteBytesExt};
use std::io::Result;

/// Utility trait for writing the big-endian structures shared by class files and the runtime
///
/// Two peculiarities make this more convenient than a general serialization framework:
///
///   - tags are always `u8`
///   - when serializing a sequence, the length of the sequence is usually `u16`
///
pub trait Serialize: Sized {
    /// Serialize construct into a binary output stream
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()>;
}

impl Serialize for u8 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(*self)
    }
}

impl Serialize for u16 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<BigEndian>(*self)
    }
}

impl Serialize for u32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<BigEndian>(*self)
    }
}

impl Serialize for i32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<BigEndian>(*self)
    }
}

impl Serialize for i64 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_i64::<BigEndian>(*self)
    }
}

impl Serialize for f32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32::<BigEndian>(*self)
    }
}

impl Serialize for f64 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_f64::<BigEndian>(*self)
    }
}

/// Size in `u16` is the first thing serialized
impl<A: Serialize> Serialize for Vec<A> {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        (self.len() as u16).serialize(writer)?;
        for elem in self {
            elem.serialize(writer)?;
        }
        Ok(())
    }
}

impl<A: Serialize, B: Serialize> Serialize for (A, B) {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        self.0.serialize(writer)?;
        self.1.serialize(writer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn big_endian_with_u16_lengths() {
        let mut bytes = vec![];
        vec![(0x1234u16, 0xABu8), (0x0001u16, 0x02u8)]
            .serialize(&mut bytes)
            .unwrap();
        assert_eq!(bytes, vec![0x00, 0x02, 0x12, 0x34, 0xAB, 0x00, 0x01, 0x02]);
    }
}
