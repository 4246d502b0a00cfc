mod ref_id;

pub use ref_id::*;

/// Elements with a logical "width"
///
/// The JVM measures several things in 4-byte units, with `long` and `double` taking up two of
/// them: constant pool entries, local variable slots, operand stack entries.
pub trait Width {
    fn width(&self) -> usize;
}
