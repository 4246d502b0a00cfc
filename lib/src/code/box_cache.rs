use super::PrimitiveConstant;
use crate::jvm::JavaKind;
use once_cell::sync::OnceCell;

/// Boxed primitive shared through one of the `valueOf` caches of the `java.lang` box classes
///
/// When a virtual auto-box object is materialized with a value in the cached range, the
/// deoptimized code must observe the cached box (`Integer.valueOf(1) == Integer.valueOf(1)`), so
/// these are compared by address.
#[derive(Debug, PartialEq, Eq)]
pub struct CachedBox {
    value: PrimitiveConstant,
}

impl CachedBox {
    pub fn value(&self) -> PrimitiveConstant {
        self.value
    }
}

/// The small-value caches of `Boolean`, `Byte`, `Short`, `Character`, `Integer`, and `Long`
pub struct BoxCaches {
    boolean: Vec<CachedBox>,
    byte: Vec<CachedBox>,
    short: Vec<CachedBox>,
    character: Vec<CachedBox>,
    integer: Vec<CachedBox>,
    long: Vec<CachedBox>,
}

/// Signed caches cover `-128..=127`
const SIGNED_LOW: i64 = -128;
const SIGNED_HIGH: i64 = 127;

/// The `Character` cache covers `0..=127`
const CHAR_HIGH: i64 = 127;

static BOX_CACHES: OnceCell<BoxCaches> = OnceCell::new();

impl BoxCaches {
    fn populate() -> BoxCaches {
        let signed = |make: fn(i64) -> PrimitiveConstant| -> Vec<CachedBox> {
            (SIGNED_LOW..=SIGNED_HIGH)
                .map(|value| CachedBox { value: make(value) })
                .collect()
        };

        BoxCaches {
            boolean: vec![
                CachedBox {
                    value: PrimitiveConstant::boolean(false),
                },
                CachedBox {
                    value: PrimitiveConstant::boolean(true),
                },
            ],
            byte: signed(|v| PrimitiveConstant::byte(v as i8)),
            short: signed(|v| PrimitiveConstant::short(v as i16)),
            character: (0..=CHAR_HIGH)
                .map(|v| CachedBox {
                    value: PrimitiveConstant::char(v as u16),
                })
                .collect(),
            integer: signed(|v| PrimitiveConstant::int(v as i32)),
            long: signed(PrimitiveConstant::long),
        }
    }

    /// Cached box for a primitive value, if the value falls in the range of a cache
    ///
    /// `float` and `double` are never cached.
    pub fn lookup(&self, value: &PrimitiveConstant) -> Option<&CachedBox> {
        let (cache, low) = match value.kind() {
            JavaKind::Boolean => (&self.boolean, 0),
            JavaKind::Byte => (&self.byte, SIGNED_LOW),
            JavaKind::Short => (&self.short, SIGNED_LOW),
            JavaKind::Char => (&self.character, 0),
            JavaKind::Int => (&self.integer, SIGNED_LOW),
            JavaKind::Long => (&self.long, SIGNED_LOW),
            _ => return None,
        };
        let offset = value.as_i64()?.checked_sub(low)?;
        usize::try_from(offset)
            .ok()
            .and_then(|offset| cache.get(offset))
    }
}

/// Make sure the box caches are populated
///
/// This happens once per process. Concurrent first callers block until the one doing the
/// population is done, and all of them see the same caches.
pub fn ensure_box_caches() -> &'static BoxCaches {
    BOX_CACHES.get_or_init(|| {
        log::debug!("Populating primitive box caches");
        BoxCaches::populate()
    })
}

/// Have the box caches been populated yet?
pub fn box_caches_populated() -> bool {
    BOX_CACHES.get().is_some()
}
