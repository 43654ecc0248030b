// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tag-directed union resolvers.
//!
//! A union member cannot be traversed generically: which alternative is live
//! depends on a tag stored elsewhere in the enclosing record. A resolver names
//! that tag and, per tag value, the pointer interpretation of the union slot.

use crate::descriptor::Pointee;

/// Resolver for one union member of one record type
#[derive(Debug)]
pub struct UnionResolver {
    /// Record type owning the union member.
    pub record: &'static str,
    /// Offset of the 32-bit tag within the record.
    pub tag_offset: usize,
    pub variants: &'static [UnionVariant],
}

/// Pointer interpretation of the union slot for a set of tag values
#[derive(Debug)]
pub struct UnionVariant {
    pub name: &'static str,
    pub tags: &'static [u32],
    pub pointee: Pointee,
}

impl UnionResolver {
    /// Variant selected by `tag`, if any.
    pub fn select(&self, tag: u32) -> Option<&'static UnionVariant> {
        self.variants.iter().find(|v| v.tags.contains(&tag))
    }

    /// Read the tag from a record.
    ///
    /// # Safety
    ///
    /// `record` must point to a valid instance of the owning record type.
    pub unsafe fn read_tag(&self, record: *const u8) -> u32 {
        // SAFETY: tag_offset lies within the record per caller contract.
        unsafe { record.add(self.tag_offset).cast::<u32>().read_unaligned() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static RESOLVER: UnionResolver = UnionResolver {
        record: "Token",
        tag_offset: 4,
        variants: &[
            UnionVariant {
                name: "bytes",
                tags: &[1, 2],
                pointee: Pointee::Blob,
            },
            UnionVariant {
                name: "label",
                tags: &[7],
                pointee: Pointee::CString,
            },
        ],
    };

    #[test]
    fn test_select_by_tag() {
        assert_eq!(RESOLVER.select(2).map(|v| v.name), Some("bytes"));
        assert_eq!(RESOLVER.select(7).map(|v| v.name), Some("label"));
        assert!(RESOLVER.select(3).is_none());
    }

    #[test]
    fn test_read_tag_at_offset() {
        let record: [u32; 2] = [0xdead, 7];
        let tag = unsafe { RESOLVER.read_tag(record.as_ptr().cast()) };
        assert_eq!(tag, 7);
    }
}
