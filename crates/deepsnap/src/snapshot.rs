// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owned flattened copies.
//!
//! A snapshot owns one heap buffer aligned to [`MAX_ALIGN`](crate::MAX_ALIGN).
//! Pointers inside it are absolute addresses into that buffer; moving the
//! snapshot does not move the heap allocation, so they stay valid. Cloning
//! would not, which is why snapshots are not `Clone`.

use crate::descriptor::{DeepCopy, RecordDescriptor};
use std::fmt;
use std::marker::PhantomData;

#[derive(Clone, Copy)]
#[repr(C, align(16))]
struct Align16([u8; 16]);

/// Zero-initialised byte buffer with 16-byte alignment.
pub(crate) struct AlignedBuf {
    blocks: Vec<Align16>,
    len: usize,
}

impl AlignedBuf {
    pub(crate) fn zeroed(len: usize) -> Self {
        Self {
            blocks: vec![Align16([0; 16]); len.div_ceil(16)],
            len,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.blocks.as_ptr().cast()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.blocks.as_mut_ptr().cast()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        // SAFETY: blocks hold at least len initialised bytes.
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    fn contains(&self, ptr: *const u8) -> bool {
        let start = self.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr < start + self.len
    }
}

/// Flattened copy of `count` root records of type `T` plus everything they reach.
pub struct Snapshot<T> {
    buf: AlignedBuf,
    count: usize,
    _marker: PhantomData<T>,
}

impl<T> Snapshot<T> {
    pub(crate) fn new(buf: AlignedBuf, count: usize) -> Self {
        Self {
            buf,
            count,
            _marker: PhantomData,
        }
    }

    /// Total bytes, padding included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    /// Number of root records.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    /// Root records at the start of the buffer.
    pub fn records(&self) -> &[T] {
        if self.count == 0 {
            return &[];
        }
        // SAFETY: the buffer starts with count copies of T and is aligned for T.
        unsafe { std::slice::from_raw_parts(self.buf.as_ptr().cast::<T>(), self.count) }
    }

    pub fn root(&self) -> Option<&T> {
        self.records().first()
    }

    /// True when `ptr` points inside the buffer.
    pub fn contains<P>(&self, ptr: *const P) -> bool {
        self.buf.contains(ptr.cast())
    }
}

impl<T> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("type", &std::any::type_name::<T>())
            .field("count", &self.count)
            .field("len", &self.buf.len())
            .finish()
    }
}

/// Flattened copy of one record whose type is known only by its structure type.
pub struct TaggedSnapshot {
    descriptor: &'static RecordDescriptor,
    buf: AlignedBuf,
}

impl TaggedSnapshot {
    pub(crate) fn new(descriptor: &'static RecordDescriptor, buf: AlignedBuf) -> Self {
        Self { descriptor, buf }
    }

    pub fn descriptor(&self) -> &'static RecordDescriptor {
        self.descriptor
    }

    /// Address of the copied record.
    pub fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    pub fn contains<P>(&self, ptr: *const P) -> bool {
        self.buf.contains(ptr.cast())
    }
}

impl fmt::Debug for TaggedSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedSnapshot")
            .field("type", &self.descriptor.name)
            .field("len", &self.buf.len())
            .finish()
    }
}

// SAFETY: a snapshot is an owned byte image only read through `&self`; the raw
// pointers inside `T` reference its own heap buffer. `DeepCopy` records carry
// no interior mutability, so shared `&T` access from several threads is sound.
unsafe impl<T: DeepCopy> Send for Snapshot<T> {}
unsafe impl<T: DeepCopy> Sync for Snapshot<T> {}
