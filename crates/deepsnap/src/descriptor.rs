// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record descriptors: static layout and traversal metadata per record type.
//!
//! Emitted by `#[derive(DeepCopy)]` and consumed by the flattening engine.
//! A descriptor lists every member of a `#[repr(C)]` record with its offset,
//! size and the rule used to follow it.

use crate::union::UnionResolver;
use std::fmt;

/// Accessor returning a type's descriptor (breaks recursion between types).
pub type DescriptorFn = fn() -> &'static RecordDescriptor;

/// Element-count evaluator over a record's bytes.
pub type CountFn = unsafe fn(*const u8) -> usize;

/// A record type with a static deep-copy descriptor.
///
/// # Safety
///
/// `descriptor()` must describe `Self` exactly: size, alignment, and for every
/// member its offset, size and a traversal rule matching the member's real
/// type. Use `#[derive(DeepCopy)]` rather than implementing this by hand.
///
/// `Self` must not contain interior mutability (`Cell`, `RefCell`,
/// `UnsafeCell`, atomics): copies are plain byte images, and a
/// [`Snapshot`](crate::Snapshot) hands out `&Self` to any thread.
pub unsafe trait DeepCopy: Sized {
    fn descriptor() -> &'static RecordDescriptor;
}

/// Layout and traversal metadata for one record type
#[derive(Debug)]
pub struct RecordDescriptor {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
    /// Structure-type tag for records that can appear in extension chains.
    pub structure_type: Option<u32>,
    /// No member needs traversal: a bytewise copy is the deep copy.
    pub shallow: bool,
    pub members: &'static [MemberDescriptor],
}

impl RecordDescriptor {
    /// Descriptor for a memberless value type, copied verbatim.
    pub const fn plain(name: &'static str, size: usize, align: usize) -> Self {
        Self {
            name,
            size,
            align,
            structure_type: None,
            shallow: true,
            members: &[],
        }
    }

    pub fn member(&self, name: &str) -> Option<&'static MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Layout of a single member
#[derive(Debug)]
pub struct MemberDescriptor {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
    pub kind: MemberKind,
}

impl MemberDescriptor {
    pub fn is_pointer(&self) -> bool {
        self.pointer_depth() > 0
    }

    /// Levels of indirection the engine sees for this member.
    pub fn pointer_depth(&self) -> usize {
        match self.kind {
            MemberKind::PointerArray { .. } => 2,
            MemberKind::Pointer { .. } | MemberKind::Chain | MemberKind::Opaque => 1,
            MemberKind::Value | MemberKind::Embedded | MemberKind::Union(_) => 0,
        }
    }
}

/// Traversal rule for a member
#[derive(Debug)]
pub enum MemberKind {
    /// Part of the scalar image.
    Value,
    /// Pointer copied as a bare value, never followed.
    Opaque,
    /// Extension-chain pointer; the pointee type comes from its tag.
    Chain,
    /// By-value tagged record, resolved through its own tag.
    Embedded,
    /// By-value union steered by a tag member of the enclosing record.
    Union(&'static UnionResolver),
    /// `count` pointees stored contiguously behind one pointer.
    Pointer {
        pointee: Pointee,
        count: ElementCount,
    },
    /// `count` pointers, each to a single pointee.
    PointerArray {
        pointee: Pointee,
        count: ElementCount,
    },
}

/// What a pointer member points at
#[derive(Clone, Copy)]
pub enum Pointee {
    Record(DescriptorFn),
    /// NUL-terminated byte string; the element count is ignored.
    CString,
    /// Raw bytes; the element count is a byte length.
    Blob,
}

impl fmt::Debug for Pointee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(descriptor) => f.debug_tuple("Record").field(&descriptor().name).finish(),
            Self::CString => f.write_str("CString"),
            Self::Blob => f.write_str("Blob"),
        }
    }
}

impl Pointee {
    /// Alignment of one element placed in the output buffer.
    pub fn align(&self) -> usize {
        match self {
            Self::Record(descriptor) => descriptor().align,
            Self::CString | Self::Blob => 1,
        }
    }
}

/// Element count of a pointer member
#[derive(Clone, Copy)]
pub enum ElementCount {
    One,
    Computed {
        /// Expression as written on the member.
        expr: &'static str,
        eval: CountFn,
    },
}

impl fmt::Debug for ElementCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("One"),
            Self::Computed { expr, .. } => f.debug_tuple("Computed").field(expr).finish(),
        }
    }
}

impl ElementCount {
    /// Evaluate the count against a record.
    ///
    /// # Safety
    ///
    /// `record` must point to a valid instance of the record owning the member.
    pub unsafe fn resolve(&self, record: *const u8) -> usize {
        match self {
            Self::One => 1,
            // SAFETY: forwarded caller contract.
            Self::Computed { eval, .. } => unsafe { eval(record) },
        }
    }
}

macro_rules! impl_plain_deep_copy {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: primitives have no members; the plain descriptor matches their layout.
            unsafe impl DeepCopy for $ty {
                fn descriptor() -> &'static RecordDescriptor {
                    static DESCRIPTOR: RecordDescriptor = RecordDescriptor::plain(
                        stringify!($ty),
                        core::mem::size_of::<$ty>(),
                        core::mem::align_of::<$ty>(),
                    );
                    &DESCRIPTOR
                }
            }
        )*
    };
}

impl_plain_deep_copy!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize, f32, f64, bool);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_descriptors_are_shallow() {
        let desc = <u32 as DeepCopy>::descriptor();
        assert_eq!(desc.name, "u32");
        assert_eq!(desc.size, 4);
        assert_eq!(desc.align, 4);
        assert!(desc.shallow);
        assert!(desc.members.is_empty());
        assert!(desc.structure_type.is_none());
    }

    #[test]
    fn test_descriptor_is_static_singleton() {
        let a = <f64 as DeepCopy>::descriptor();
        let b = <f64 as DeepCopy>::descriptor();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_pointer_depth() {
        static MEMBERS: [MemberDescriptor; 3] = [
            MemberDescriptor {
                name: "count",
                offset: 0,
                size: 4,
                kind: MemberKind::Value,
            },
            MemberDescriptor {
                name: "p_items",
                offset: 8,
                size: 8,
                kind: MemberKind::Pointer {
                    pointee: Pointee::Blob,
                    count: ElementCount::One,
                },
            },
            MemberDescriptor {
                name: "pp_names",
                offset: 16,
                size: 8,
                kind: MemberKind::PointerArray {
                    pointee: Pointee::CString,
                    count: ElementCount::One,
                },
            },
        ];
        assert_eq!(MEMBERS[0].pointer_depth(), 0);
        assert!(!MEMBERS[0].is_pointer());
        assert_eq!(MEMBERS[1].pointer_depth(), 1);
        assert_eq!(MEMBERS[2].pointer_depth(), 2);
    }

    #[test]
    fn test_computed_count() {
        unsafe fn double_first(record: *const u8) -> usize {
            unsafe { *record.cast::<u32>() as usize * 2 }
        }
        let count = ElementCount::Computed {
            expr: "count * 2",
            eval: double_first,
        };
        let value: u32 = 21;
        let resolved = unsafe { count.resolve((&value as *const u32).cast()) };
        assert_eq!(resolved, 42);
        assert_eq!(format!("{count:?}"), "Computed(\"count * 2\")");
    }
}
