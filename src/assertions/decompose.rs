//! Rendering operand values as text.
//!
//! Rendering is resolved per type at the macro call site, in three tiers:
//! `Debug` when the type implements it, a raw byte dump for types that opt in
//! through [`PlainBytes`], and the placeholder `{?}` for everything else.
//! The tiers are picked by method resolution on `&&&Wrap(value)`: each tier
//! is implemented one reference level further down, so the most specific
//! applicable impl wins.

use std::fmt::Debug;
use std::mem;

/// Marker for types whose in-memory representation is fully initialized
/// (no padding, no pointers worth hiding), so dumping their bytes is sound
/// and meaningful.
///
/// # Safety
///
/// Implementors must not contain padding or uninitialized bytes.
pub unsafe trait PlainBytes: Sized {}

/// Hex dump of a value's bytes, most significant byte first on
/// little-endian targets.
pub fn raw_memory_to_string<T: PlainBytes>(value: &T) -> String {
    let size = mem::size_of::<T>();
    // SAFETY: `PlainBytes` guarantees every byte of `T` is initialized.
    let bytes = unsafe { std::slice::from_raw_parts(value as *const T as *const u8, size) };
    let mut out = String::with_capacity(2 + size * 2);
    out.push_str("0x");
    let ordered: Box<dyn Iterator<Item = &u8>> = if cfg!(target_endian = "little") {
        Box::new(bytes.iter().rev())
    } else {
        Box::new(bytes.iter())
    };
    for byte in ordered {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

#[doc(hidden)]
pub struct Wrap<'a, T: ?Sized>(pub &'a T);

#[doc(hidden)]
pub trait ViaDebug {
    fn casework_render(&self) -> String;
}

#[doc(hidden)]
pub trait ViaBytes {
    fn casework_render(&self) -> String;
}

#[doc(hidden)]
pub trait ViaOpaque {
    fn casework_render(&self) -> String;
}

impl<'a, T: ?Sized + Debug> ViaDebug for &&Wrap<'a, T> {
    fn casework_render(&self) -> String {
        format!("{:?}", self.0)
    }
}

impl<'a, T: PlainBytes> ViaBytes for &Wrap<'a, T> {
    fn casework_render(&self) -> String {
        raw_memory_to_string(self.0)
    }
}

impl<'a, T: ?Sized> ViaOpaque for Wrap<'a, T> {
    fn casework_render(&self) -> String {
        "{?}".to_string()
    }
}

/// Renders a value reference with the best available tier.
#[doc(hidden)]
#[macro_export]
macro_rules! __casework_render {
    ($value:expr) => {{
        #[allow(unused_imports)]
        use $crate::assertions::decompose::{ViaBytes as _, ViaDebug as _, ViaOpaque as _};
        (&&&$crate::assertions::decompose::Wrap($value)).casework_render()
    }};
}
