// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structure-type registry and flattening entry points.
//!
//! Extension-chain and embedded members are typed at run time: the engine
//! reads the 32-bit tag at the start of the pointee and looks it up here.
//! A table is immutable once built and can be shared across threads.

use crate::config::FlattenConfig;
use crate::descriptor::{DeepCopy, RecordDescriptor};
use crate::engine::{Pass, Walker};
use crate::error::{Error, Result};
use crate::relocate::{read_tag, Output};
use crate::snapshot::{AlignedBuf, Snapshot, TaggedSnapshot};
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;

/// Map from structure type tag to record descriptor, plus walk configuration.
#[derive(Default)]
pub struct TypeTable {
    by_tag: HashMap<u32, &'static RecordDescriptor>,
    config: FlattenConfig,
}

impl fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTable")
            .field("types", &self.by_tag.len())
            .field("config", &self.config)
            .finish()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> TypeTableBuilder {
        TypeTableBuilder::default()
    }

    /// Replace the walk configuration.
    pub fn with_config(mut self, config: FlattenConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Register a tagged record type.
    pub fn register<T: DeepCopy>(&mut self) -> Result<()> {
        self.register_descriptor(T::descriptor())
    }

    /// Register a descriptor under its structure type.
    ///
    /// Registering the same descriptor twice is a no-op.
    pub fn register_descriptor(&mut self, desc: &'static RecordDescriptor) -> Result<()> {
        let tag = desc.structure_type.ok_or(Error::MissingStructureType {
            type_name: desc.name,
        })?;
        if let Some(existing) = self.by_tag.get(&tag) {
            if std::ptr::eq(*existing, desc) {
                return Ok(());
            }
            return Err(Error::DuplicateStructureType {
                tag,
                existing: existing.name,
                new: desc.name,
            });
        }
        self.by_tag.insert(tag, desc);
        Ok(())
    }

    pub fn lookup(&self, tag: u32) -> Option<&'static RecordDescriptor> {
        self.by_tag.get(&tag).copied()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static RecordDescriptor> + '_ {
        self.by_tag.values().copied()
    }

    /// Flatten `count` records at `records` into `out`, or measure when `out` is null.
    ///
    /// Returns the number of bytes the flattened graph occupies. A null
    /// `records` or a zero `count` returns 0 without touching `out`.
    ///
    /// # Safety
    ///
    /// - `records` points to `count` valid instances of `T`; every pointer
    ///   reachable from them is null or valid for the element count the
    ///   descriptor computes, and the reachable graph is acyclic unless cycle
    ///   detection is on.
    /// - A non-null `out` is writable for the measured size and aligned for
    ///   [`MAX_ALIGN`](crate::MAX_ALIGN), and does not overlap the source graph.
    pub unsafe fn flatten_raw<T: DeepCopy>(
        &self,
        records: *const T,
        count: u32,
        out: *mut u8,
    ) -> Result<usize> {
        if records.is_null() || count == 0 {
            return Ok(0);
        }
        // SAFETY: forwarded caller contract.
        let pass = unsafe {
            self.run(
                T::descriptor(),
                records.cast(),
                count as usize,
                Output::new(out),
            )?
        };
        Ok(pass.size)
    }

    /// Bytes needed to flatten `records`.
    ///
    /// # Safety
    ///
    /// Pointers reachable from `records` must satisfy the contract of
    /// [`flatten_raw`](Self::flatten_raw).
    pub unsafe fn measure<T: DeepCopy>(&self, records: &[T]) -> Result<usize> {
        // SAFETY: forwarded caller contract.
        Ok(unsafe { self.measure_pass(records)? }.size)
    }

    /// Flatten `records` into a caller buffer, returning the bytes written.
    ///
    /// Fails with `BufferTooSmall` or `MisalignedBuffer` before writing anything.
    ///
    /// # Safety
    ///
    /// Same as [`measure`](Self::measure).
    pub unsafe fn flatten_into<T: DeepCopy>(
        &self,
        records: &[T],
        out: &mut [u8],
    ) -> Result<usize> {
        // SAFETY: forwarded caller contract.
        let pass = unsafe { self.measure_pass(records)? };
        if pass.size == 0 {
            return Ok(0);
        }
        if out.len() < pass.size {
            return Err(Error::BufferTooSmall {
                required: pass.size,
                available: out.len(),
            });
        }
        if out.as_ptr() as usize % pass.max_align != 0 {
            return Err(Error::MisalignedBuffer {
                required: pass.max_align,
            });
        }
        // SAFETY: out was checked for size and alignment above.
        let written = unsafe {
            self.run(
                T::descriptor(),
                records.as_ptr().cast(),
                records.len(),
                Output::new(out.as_mut_ptr()),
            )?
        }
        .size;
        debug_assert_eq!(written, pass.size);
        Ok(written)
    }

    /// Flatten `records` into a new owned buffer.
    ///
    /// # Safety
    ///
    /// Same as [`measure`](Self::measure).
    pub unsafe fn snapshot<T: DeepCopy>(&self, records: &[T]) -> Result<Snapshot<T>> {
        // SAFETY: forwarded caller contract.
        let size = unsafe { self.measure(records)? };
        let mut buf = AlignedBuf::zeroed(size);
        if size > 0 {
            // SAFETY: buf is 16-byte aligned and exactly size bytes long.
            unsafe {
                self.run(
                    T::descriptor(),
                    records.as_ptr().cast(),
                    records.len(),
                    Output::new(buf.as_mut_ptr()),
                )?;
            }
        }
        Ok(Snapshot::new(buf, records.len()))
    }

    /// Bytes needed to flatten one tagged record; 0 for a null or unregistered node.
    ///
    /// # Safety
    ///
    /// `node` is null or points to a record starting with its structure type
    /// tag, satisfying the contract of [`flatten_raw`](Self::flatten_raw).
    pub unsafe fn measure_tagged(&self, node: *const c_void) -> Result<usize> {
        // SAFETY: forwarded caller contract.
        match unsafe { self.resolve_tagged(node) } {
            Some(desc) => Ok(unsafe { self.run(desc, node.cast(), 1, Output::measure())? }.size),
            None => Ok(0),
        }
    }

    /// Flatten one tagged record into a new owned buffer.
    ///
    /// Returns `None` for a null or unregistered node.
    ///
    /// # Safety
    ///
    /// Same as [`measure_tagged`](Self::measure_tagged).
    pub unsafe fn snapshot_tagged(&self, node: *const c_void) -> Result<Option<TaggedSnapshot>> {
        // SAFETY: forwarded caller contract.
        let Some(desc) = (unsafe { self.resolve_tagged(node) }) else {
            return Ok(None);
        };
        let size = unsafe { self.run(desc, node.cast(), 1, Output::measure())? }.size;
        let mut buf = AlignedBuf::zeroed(size);
        // SAFETY: buf is 16-byte aligned and exactly size bytes long.
        unsafe { self.run(desc, node.cast(), 1, Output::new(buf.as_mut_ptr()))? };
        Ok(Some(TaggedSnapshot::new(desc, buf)))
    }

    unsafe fn resolve_tagged(&self, node: *const c_void) -> Option<&'static RecordDescriptor> {
        if node.is_null() {
            return None;
        }
        // SAFETY: node starts with a structure type tag per caller contract.
        let tag = unsafe { read_tag(node.cast()) };
        let desc = self.lookup(tag);
        if desc.is_none() {
            log::warn!("[deepsnap] unregistered structure type {}, nothing copied", tag);
        }
        desc
    }

    unsafe fn measure_pass<T: DeepCopy>(&self, records: &[T]) -> Result<Pass> {
        if records.is_empty() {
            return Ok(Pass {
                size: 0,
                max_align: 1,
            });
        }
        // SAFETY: forwarded caller contract.
        unsafe {
            self.run(
                T::descriptor(),
                records.as_ptr().cast(),
                records.len(),
                Output::measure(),
            )
        }
    }

    unsafe fn run(
        &self,
        desc: &'static RecordDescriptor,
        src: *const u8,
        count: usize,
        out: Output,
    ) -> Result<Pass> {
        let mode = if out.is_copy() { "copy" } else { "measure" };
        log::debug!("[deepsnap] {} pass: {} x{}", mode, desc.name, count);

        let mut walker = Walker::new(self, out);
        // SAFETY: forwarded caller contract.
        unsafe { walker.records(desc, src, count)? };
        let pass = walker.finish();

        log::debug!(
            "[deepsnap] {} pass done: {} bytes (align {})",
            mode,
            pass.size,
            pass.max_align
        );
        Ok(pass)
    }
}

/// Builder collecting registrations; the first failure is reported by `build`.
#[derive(Debug, Default)]
pub struct TypeTableBuilder {
    table: TypeTable,
    error: Option<Error>,
}

impl TypeTableBuilder {
    pub fn register<T: DeepCopy>(self) -> Self {
        self.register_descriptor(T::descriptor())
    }

    pub fn register_descriptor(mut self, desc: &'static RecordDescriptor) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.table.register_descriptor(desc) {
                self.error = Some(err);
            }
        }
        self
    }

    pub fn config(mut self, config: FlattenConfig) -> Self {
        self.table.config = config;
        self
    }

    pub fn build(self) -> Result<TypeTable> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.table),
        }
    }
}
