use super::{Error, Serialize};
use crate::util::Width;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::io::Read;

/// Read access to a class's constant pool
///
/// Metadata attributes refer to names and signatures by constant pool index. Decoders only need
/// to turn those indices back into text.
pub trait ConstantPool {
    /// Look up the text of the `CONSTANT_Utf8` entry at the given index
    fn lookup_utf8(&self, index: ConstantIndex) -> Result<&str, Error>;
}

/// Class file constant pool
///
/// This is either built up entry by entry (deduplicating UTF-8 entries along the way) or parsed
/// from the `constant_pool` table of a class file. Either way, entry `n` lives at position `n`:
/// position 0 is never used and 8-byte constants leave the position after them empty.
pub struct ConstantsPool {
    entries: Vec<Option<Constant>>,
    utf8s: HashMap<String, Utf8ConstantIndex>,
}

impl ConstantsPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantsPool {
        ConstantsPool {
            entries: vec![None],
            utf8s: HashMap::new(),
        }
    }

    /// Value of `constant_pool_count` (one more than the largest index)
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    /// Push a constant into the constant pool, provided there is space for it
    pub fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        let offset = self.entries.len();
        if offset + constant.width() > u16::MAX as usize {
            return Err(Error::ConstantPoolOverflow { constant, offset });
        }

        let width = constant.width();
        self.entries.push(Some(constant));
        for _ in 1..width {
            self.entries.push(None);
        }
        Ok(ConstantIndex(offset as u16))
    }

    /// Get or insert a utf8 constant
    pub fn get_utf8<'a, S: Into<Cow<'a, str>>>(
        &mut self,
        utf8: S,
    ) -> Result<Utf8ConstantIndex, Error> {
        let cow = utf8.into();

        if let Some(idx) = self.utf8s.get::<str>(cow.borrow()) {
            Ok(*idx)
        } else {
            let owned = cow.into_owned();
            let idx = Utf8ConstantIndex(self.push_constant(Constant::Utf8(owned.clone()))?);
            self.utf8s.insert(owned, idx);
            Ok(idx)
        }
    }

    /// Get the constant at an index
    pub fn get(&self, index: ConstantIndex) -> Option<&Constant> {
        self.entries
            .get(index.0 as usize)
            .and_then(|entry| entry.as_ref())
    }

    /// Read a `constant_pool_count` followed by the `constant_pool` table of a class file
    pub fn parse<R: Read>(reader: &mut R) -> Result<ConstantsPool, Error> {
        let count = reader.read_u16::<BigEndian>()?;
        let mut pool = ConstantsPool::new();
        while pool.entries.len() < count as usize {
            let constant = Constant::parse(reader)?;
            let index = pool.push_constant(constant)?;
            if let Some(Constant::Utf8(text)) = pool.get(index) {
                let text = text.clone();
                pool.utf8s.entry(text).or_insert(Utf8ConstantIndex(index));
            }
        }
        log::trace!("Parsed constant pool with {} entries", pool.entries.len());
        Ok(pool)
    }
}

impl Default for ConstantsPool {
    fn default() -> Self {
        ConstantsPool::new()
    }
}

impl ConstantPool for ConstantsPool {
    fn lookup_utf8(&self, index: ConstantIndex) -> Result<&str, Error> {
        match self.get(index) {
            Some(Constant::Utf8(text)) => Ok(text),
            Some(other) => Err(Error::UnexpectedConstant {
                index,
                expected: "Utf8",
                found: other.clone(),
            }),
            None => Err(Error::MissingConstant(index)),
        }
    }
}

impl Serialize for ConstantsPool {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.count().serialize(writer)?;
        for constant in self.entries.iter().flatten() {
            constant.serialize(writer)?;
        }
        Ok(())
    }
}

/// Constants as in the constant pool
///
/// Note: module, package, and dynamic constants are not included.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Field
    FieldRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
    },

    /// Method (this combines `Methodref` and `InterfaceMethodref`)
    MethodRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is modified UTF-8 (see `encode_modified_utf8`).
    Utf8(String),

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        handle_kind: HandleKind,
        member: ConstantIndex,
    },

    MethodType {
        descriptor: Utf8ConstantIndex,
    },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: ConstantIndex,
    },
}

impl Constant {
    /// Read one tagged constant
    pub fn parse<R: Read>(reader: &mut R) -> Result<Constant, Error> {
        fn index<R: Read>(reader: &mut R) -> Result<ConstantIndex, Error> {
            Ok(ConstantIndex(reader.read_u16::<BigEndian>()?))
        }
        fn utf8_index<R: Read>(reader: &mut R) -> Result<Utf8ConstantIndex, Error> {
            Ok(Utf8ConstantIndex(index(reader)?))
        }

        let constant = match reader.read_u8()? {
            1 => {
                let length = reader.read_u16::<BigEndian>()?;
                let mut bytes = vec![0; length as usize];
                reader.read_exact(&mut bytes)?;
                Constant::Utf8(decode_modified_utf8(&bytes)?)
            }
            3 => Constant::Integer(reader.read_i32::<BigEndian>()?),
            4 => Constant::Float(reader.read_f32::<BigEndian>()?),
            5 => Constant::Long(reader.read_i64::<BigEndian>()?),
            6 => Constant::Double(reader.read_f64::<BigEndian>()?),
            7 => Constant::Class(utf8_index(reader)?),
            8 => Constant::String(utf8_index(reader)?),
            9 => Constant::FieldRef {
                class: index(reader)?,
                name_and_type: index(reader)?,
            },
            tag @ (10 | 11) => Constant::MethodRef {
                class: index(reader)?,
                name_and_type: index(reader)?,
                is_interface: tag == 11,
            },
            12 => Constant::NameAndType {
                name: utf8_index(reader)?,
                descriptor: utf8_index(reader)?,
            },
            15 => {
                let kind = reader.read_u8()?;
                let handle_kind =
                    HandleKind::from_u8(kind).ok_or(Error::UnsupportedConstantTag(15))?;
                Constant::MethodHandle {
                    handle_kind,
                    member: index(reader)?,
                }
            }
            16 => Constant::MethodType {
                descriptor: utf8_index(reader)?,
            },
            18 => Constant::InvokeDynamic {
                bootstrap_method: reader.read_u16::<BigEndian>()?,
                name_and_type: index(reader)?,
            },
            other => return Err(Error::UnsupportedConstantTag(other)),
        };
        Ok(constant)
    }
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Constant::Utf8(string) => {
                1u8.serialize(writer)?;
                let buffer: Vec<u8> = encode_modified_utf8(string);
                (buffer.len() as u16).serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::Integer(integer) => {
                3u8.serialize(writer)?;
                integer.serialize(writer)?;
            }
            Constant::Float(float) => {
                4u8.serialize(writer)?;
                float.serialize(writer)?;
            }
            Constant::Long(long) => {
                5u8.serialize(writer)?;
                long.serialize(writer)?;
            }
            Constant::Double(double) => {
                6u8.serialize(writer)?;
                double.serialize(writer)?;
            }
            Constant::Class(name) => {
                7u8.serialize(writer)?;
                name.serialize(writer)?;
            }
            Constant::String(utf8) => {
                8u8.serialize(writer)?;
                utf8.serialize(writer)?;
            }
            Constant::FieldRef {
                class,
                name_and_type,
            } => {
                9u8.serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            } => {
                (if *is_interface { 11u8 } else { 10u8 }).serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::NameAndType { name, descriptor } => {
                12u8.serialize(writer)?;
                name.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                15u8.serialize(writer)?;
                (*handle_kind as u8).serialize(writer)?;
                member.serialize(writer)?;
            }
            Constant::MethodType { descriptor } => {
                16u8.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
            Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                18u8.serialize(writer)?;
                bootstrap_method.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
        }
        Ok(())
    }
}

/// All 8-byte constants take up two entries in the constant pool
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

/// Index known to point at a `CONSTANT_Utf8` entry
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(pub ConstantIndex);

impl From<Utf8ConstantIndex> for ConstantIndex {
    fn from(index: Utf8ConstantIndex) -> ConstantIndex {
        index.0
    }
}

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Serialize for Utf8ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

/// Kind of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-5.html#jvms-5.4.3.5
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum HandleKind {
    GetField = 1,
    GetStatic = 2,
    PutField = 3,
    PutStatic = 4,
    InvokeVirtual = 5,
    InvokeStatic = 6,
    InvokeSpecial = 7,
    NewInvokeSpecial = 8,
    InvokeInterface = 9,
}

impl HandleKind {
    pub fn from_u8(kind: u8) -> Option<HandleKind> {
        let handle_kind = match kind {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            _ => return None,
        };
        Some(handle_kind)
    }
}

/// Encode a string into modified UTF-8
///
/// This differs from regular UTF-8 in two ways: `\u{0000}` takes two bytes (so the output never
/// contains a zero byte) and supplementary characters are written as a surrogate pair, each half
/// encoded in three bytes.
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(string.len());
    for unit in string.encode_utf16() {
        match unit {
            0x0001..=0x007F => buffer.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                buffer.push((unit >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((unit & 0x3F) as u8 | 0b1000_0000);
            }
            _ => {
                buffer.push((unit >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((unit >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((unit & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Decode modified UTF-8 (see `encode_modified_utf8`)
///
/// A bare zero byte is accepted as `\u{0000}`, matching `DataInput.readUTF`.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, Error> {
    let malformed = || Error::MalformedModifiedUtf8(bytes.to_vec());
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();

    let continuation = |iter: &mut dyn Iterator<Item = u8>| -> Option<u16> {
        match iter.next() {
            Some(byte) if byte & 0b1100_0000 == 0b1000_0000 => Some((byte & 0x3F) as u16),
            _ => None,
        }
    };

    while let Some(lead) = iter.next() {
        let unit = match lead {
            0x00..=0x7F => lead as u16,
            0xC0..=0xDF => {
                let low = continuation(&mut iter).ok_or_else(malformed)?;
                ((lead as u16 & 0x1F) << 6) | low
            }
            0xE0..=0xEF => {
                let mid = continuation(&mut iter).ok_or_else(malformed)?;
                let low = continuation(&mut iter).ok_or_else(malformed)?;
                ((lead as u16 & 0x0F) << 12) | (mid << 6) | low
            }
            _ => return Err(malformed()),
        };
        units.push(unit);
    }

    String::from_utf16(&units).map_err(|_| malformed())
}
