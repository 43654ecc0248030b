// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Output addressing and pointer rewriting.
//!
//! Offsets are relative to the start of the output buffer. Pointers stored in
//! the copy are absolute (`base + offset`), so they stay valid for as long as
//! the buffer is neither freed nor moved.

use std::ptr::{self, NonNull};

/// Round `offset` up to a multiple of `align` (a power of two).
#[inline]
pub(crate) const fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

/// Output buffer handle; `None` means measurement pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Output(Option<NonNull<u8>>);

impl Output {
    pub(crate) fn new(base: *mut u8) -> Self {
        Self(NonNull::new(base))
    }

    pub(crate) fn measure() -> Self {
        Self(None)
    }

    pub(crate) fn is_copy(&self) -> bool {
        self.0.is_some()
    }

    /// Destination address for `offset`, `None` when measuring.
    pub(crate) fn at(&self, offset: usize) -> Option<NonNull<u8>> {
        // SAFETY: offset stays within the buffer the caller sized with a measurement pass.
        self.0
            .map(|base| unsafe { NonNull::new_unchecked(base.as_ptr().add(offset)) })
    }

    /// Overwrite the pointer slot at `slot` with `base + target`, or null.
    ///
    /// # Safety
    ///
    /// `slot` must be an in-buffer offset holding a pointer-sized member.
    pub(crate) unsafe fn rewrite_pointer(&self, slot: usize, target: Option<usize>) {
        let Some(base) = self.0 else {
            return;
        };
        let value = match target {
            // SAFETY: target is an in-buffer offset.
            Some(offset) => unsafe { base.as_ptr().add(offset) },
            None => ptr::null_mut(),
        };
        // SAFETY: slot is in-buffer per caller contract; record copies may be unaligned.
        unsafe {
            base.as_ptr()
                .add(slot)
                .cast::<*mut u8>()
                .write_unaligned(value);
        }
    }

    /// Copy `len` bytes inside the buffer, from `from` to `to`.
    ///
    /// # Safety
    ///
    /// Both ranges must lie inside the buffer.
    pub(crate) unsafe fn copy_within(&self, from: usize, to: usize, len: usize) {
        if let Some(base) = self.0 {
            // SAFETY: forwarded caller contract.
            unsafe { ptr::copy(base.as_ptr().add(from), base.as_ptr().add(to), len) };
        }
    }
}

/// Read the pointer stored at `offset` in a source record.
///
/// # Safety
///
/// `record + offset` must hold a pointer-sized member.
#[inline]
pub(crate) unsafe fn read_pointer(record: *const u8, offset: usize) -> *const u8 {
    // SAFETY: forwarded caller contract.
    unsafe { record.add(offset).cast::<*const u8>().read_unaligned() }
}

/// Read the 32-bit structure type tag at offset 0.
///
/// # Safety
///
/// `node` must point to at least four readable bytes.
#[inline]
pub(crate) unsafe fn read_tag(node: *const u8) -> u32 {
    // SAFETY: forwarded caller contract.
    unsafe { node.cast::<u32>().read_unaligned() }
}
