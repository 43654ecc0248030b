// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Leaf copies: scalar images, NUL-terminated strings and raw blobs.
//!
//! Each primitive returns the number of bytes it occupies in the output and
//! writes only when given a destination.

use std::ffi::{c_char, CStr};
use std::ptr::{self, NonNull};

/// Copy `count` values of `size` bytes each.
///
/// # Safety
///
/// `src` must be readable for `size * count` bytes and `out`, when present,
/// writable for as many, non-overlapping with `src`.
pub(crate) unsafe fn copy_values(
    src: *const u8,
    size: usize,
    count: usize,
    out: Option<NonNull<u8>>,
) -> usize {
    let len = size * count;
    if let Some(out) = out {
        // SAFETY: forwarded caller contract.
        unsafe { ptr::copy_nonoverlapping(src, out.as_ptr(), len) };
    }
    len
}

/// Copy a NUL-terminated string, terminator included.
///
/// # Safety
///
/// `src` must point to a NUL-terminated string and `out`, when present, be
/// writable for its length plus one.
pub(crate) unsafe fn copy_cstr(src: *const c_char, out: Option<NonNull<u8>>) -> usize {
    // SAFETY: forwarded caller contract.
    let bytes = unsafe { CStr::from_ptr(src) }.to_bytes_with_nul();
    if let Some(out) = out {
        // SAFETY: out has room for bytes.len() per caller contract.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), out.as_ptr(), bytes.len()) };
    }
    bytes.len()
}

/// Copy `len` raw bytes.
///
/// # Safety
///
/// Same as [`copy_values`] with a one-byte element.
pub(crate) unsafe fn copy_blob(src: *const u8, len: usize, out: Option<NonNull<u8>>) -> usize {
    // SAFETY: forwarded caller contract.
    unsafe { copy_values(src, 1, len, out) }
}
