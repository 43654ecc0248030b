// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recursive walker shared by the measurement and copy passes.
//!
//! One walker serves both passes: with `Output::measure()` it only advances
//! the cursor, with a real buffer it also writes and rewrites pointers. Both
//! passes take the same path through the graph, so they agree on every offset.
//!
//! Layout: root records first, then each reachable pointee appended in
//! depth-first member order, aligned to its own alignment.

use crate::config::FlattenConfig;
use crate::descriptor::{MemberDescriptor, MemberKind, Pointee, RecordDescriptor};
use crate::error::{Error, Result};
use crate::primitives::{copy_blob, copy_cstr, copy_values};
use crate::relocate::{align_up, read_pointer, read_tag, Output};
use crate::table::TypeTable;
use crate::union::UnionResolver;
use crate::MAX_ALIGN;
use std::mem::{align_of, size_of};

const PTR_SIZE: usize = size_of::<*const u8>();
const PTR_ALIGN: usize = align_of::<*const u8>();

/// Totals of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pass {
    pub(crate) size: usize,
    pub(crate) max_align: usize,
}

pub(crate) struct Walker<'t> {
    table: &'t TypeTable,
    config: &'t FlattenConfig,
    out: Output,
    cursor: usize,
    max_align: usize,
    /// (address, descriptor) of every record currently being walked.
    ancestors: Vec<(usize, usize)>,
}

impl<'t> Walker<'t> {
    pub(crate) fn new(table: &'t TypeTable, out: Output) -> Self {
        Self {
            table,
            config: table.config(),
            out,
            cursor: 0,
            max_align: 1,
            ancestors: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> Pass {
        Pass {
            size: self.cursor,
            max_align: self.max_align,
        }
    }

    fn reserve(&mut self, align: usize, len: usize) -> usize {
        let start = align_up(self.cursor, align);
        self.cursor = start + len;
        self.max_align = self.max_align.max(align);
        start
    }

    /// Place `count` contiguous records and everything they reach.
    ///
    /// Returns the offset of the first record.
    ///
    /// # Safety
    ///
    /// `src` must point to `count` valid instances described by `desc`, and
    /// every pointer reachable from them must honor the descriptor.
    pub(crate) unsafe fn records(
        &mut self,
        desc: &'static RecordDescriptor,
        src: *const u8,
        count: usize,
    ) -> Result<usize> {
        if desc.align > MAX_ALIGN {
            return Err(Error::UnsupportedAlignment {
                type_name: desc.name,
                align: desc.align,
            });
        }

        let start = self.reserve(desc.align, desc.size * count);
        // SAFETY: src holds count records; the destination was just reserved.
        unsafe { copy_values(src, desc.size, count, self.out.at(start)) };
        if desc.shallow {
            return Ok(start);
        }

        for index in 0..count {
            // SAFETY: index < count.
            let record = unsafe { src.add(index * desc.size) };
            self.enter(desc, record)?;
            // SAFETY: the copy of record lives at start + index * size.
            unsafe { self.members(desc, record, start + index * desc.size)? };
            self.ancestors.pop();
        }
        Ok(start)
    }

    fn enter(&mut self, desc: &'static RecordDescriptor, record: *const u8) -> Result<()> {
        if let Some(limit) = self.config.max_depth {
            if self.ancestors.len() >= limit {
                return Err(Error::DepthExceeded { limit });
            }
        }
        let key = (record as usize, desc as *const RecordDescriptor as usize);
        if self.config.detect_cycles && self.ancestors.contains(&key) {
            return Err(Error::CycleDetected {
                type_name: desc.name,
                address: record as usize,
            });
        }
        self.ancestors.push(key);
        Ok(())
    }

    /// Walk members of one record whose copy sits at `copy`.
    unsafe fn members(
        &mut self,
        desc: &'static RecordDescriptor,
        record: *const u8,
        copy: usize,
    ) -> Result<()> {
        for member in desc.members {
            // SAFETY (all arms): member offsets come from the record's descriptor.
            match &member.kind {
                MemberKind::Value | MemberKind::Opaque => {}
                MemberKind::Chain => unsafe { self.chain(desc, member, record, copy)? },
                MemberKind::Pointer { pointee, count } => {
                    let target = unsafe { read_pointer(record, member.offset) };
                    let count = unsafe { count.resolve(record) };
                    let placed = unsafe { self.pointee(pointee, target, count)? };
                    unsafe { self.out.rewrite_pointer(copy + member.offset, placed) };
                    trace_member(desc, member, placed);
                }
                MemberKind::PointerArray { pointee, count } => {
                    let array = unsafe { read_pointer(record, member.offset) };
                    let len = unsafe { count.resolve(record) };
                    let placed = unsafe { self.pointer_array(pointee, array, len)? };
                    unsafe { self.out.rewrite_pointer(copy + member.offset, placed) };
                    trace_member(desc, member, placed);
                }
                MemberKind::Embedded => unsafe { self.embedded(desc, member, record, copy)? },
                MemberKind::Union(resolver) => unsafe {
                    self.union(desc, member, *resolver, record, copy)?;
                },
            }
        }
        Ok(())
    }

    /// Place the pointee of a depth-one pointer; `None` when nothing is copied.
    unsafe fn pointee(
        &mut self,
        pointee: &Pointee,
        src: *const u8,
        count: usize,
    ) -> Result<Option<usize>> {
        if src.is_null() || count == 0 {
            return Ok(None);
        }
        let start = match pointee {
            Pointee::Record(descriptor) => unsafe { self.records(descriptor(), src, count)? },
            Pointee::CString => {
                let start = self.reserve(1, 0);
                // SAFETY: src is a NUL-terminated string per caller contract.
                let len = unsafe { copy_cstr(src.cast(), self.out.at(start)) };
                self.cursor += len;
                start
            }
            Pointee::Blob => {
                let start = self.reserve(1, count);
                // SAFETY: src holds count bytes per caller contract.
                unsafe { copy_blob(src, count, self.out.at(start)) };
                start
            }
        };
        Ok(Some(start))
    }

    /// Place a pointer array, then one pointee per non-null slot.
    unsafe fn pointer_array(
        &mut self,
        pointee: &Pointee,
        array: *const u8,
        len: usize,
    ) -> Result<Option<usize>> {
        if array.is_null() || len == 0 {
            return Ok(None);
        }
        let slots = self.reserve(PTR_ALIGN, len * PTR_SIZE);
        // SAFETY: array holds len pointers per caller contract.
        unsafe { copy_values(array, PTR_SIZE, len, self.out.at(slots)) };
        for index in 0..len {
            // SAFETY: index < len.
            let inner = unsafe { read_pointer(array, index * PTR_SIZE) };
            let placed = unsafe { self.pointee(pointee, inner, 1)? };
            // SAFETY: the slot was reserved above.
            unsafe { self.out.rewrite_pointer(slots + index * PTR_SIZE, placed) };
        }
        Ok(Some(slots))
    }

    unsafe fn chain(
        &mut self,
        desc: &'static RecordDescriptor,
        member: &'static MemberDescriptor,
        record: *const u8,
        copy: usize,
    ) -> Result<()> {
        // SAFETY: member is a pointer slot of record.
        let next = unsafe { read_pointer(record, member.offset) };
        if next.is_null() {
            return Ok(());
        }
        // SAFETY: chain nodes start with a structure type tag.
        let tag = unsafe { read_tag(next) };
        let placed = match self.table.lookup(tag) {
            Some(node) => Some(unsafe { self.records(node, next, 1)? }),
            None => {
                log::warn!(
                    "[deepsnap] {}.{}: unregistered structure type {}, chain truncated",
                    desc.name,
                    member.name,
                    tag
                );
                None
            }
        };
        // SAFETY: the chain slot is inside the record copy.
        unsafe { self.out.rewrite_pointer(copy + member.offset, placed) };
        trace_member(desc, member, placed);
        Ok(())
    }

    unsafe fn embedded(
        &mut self,
        desc: &'static RecordDescriptor,
        member: &'static MemberDescriptor,
        record: *const u8,
        copy: usize,
    ) -> Result<()> {
        // SAFETY: the member is a by-value tagged record inside record.
        let field = unsafe { record.add(member.offset) };
        let tag = unsafe { read_tag(field) };
        let Some(nested) = self.table.lookup(tag) else {
            log::warn!(
                "[deepsnap] {}.{}: unregistered structure type {}, copied verbatim",
                desc.name,
                member.name,
                tag
            );
            return Ok(());
        };
        // SAFETY: tag lookup names the concrete type stored in the member.
        let placed = unsafe { self.records(nested, field, 1)? };
        // SAFETY: both ranges are inside the buffer; the member slot precedes placed.
        unsafe {
            self.out
                .copy_within(placed, copy + member.offset, member.size.min(nested.size));
        }
        trace_member(desc, member, Some(placed));
        Ok(())
    }

    unsafe fn union(
        &mut self,
        desc: &'static RecordDescriptor,
        member: &'static MemberDescriptor,
        resolver: &'static UnionResolver,
        record: *const u8,
        copy: usize,
    ) -> Result<()> {
        // SAFETY: the resolver belongs to desc.
        let tag = unsafe { resolver.read_tag(record) };
        let Some(variant) = resolver.select(tag) else {
            return Ok(());
        };
        // SAFETY: the selected variant stores a pointer in the union slot.
        let target = unsafe { read_pointer(record, member.offset) };
        if let Some(placed) = unsafe { self.pointee(&variant.pointee, target, 1)? } {
            unsafe { self.out.rewrite_pointer(copy + member.offset, Some(placed)) };
            log::trace!(
                "[deepsnap] {}.{} ({}) -> +{:#x}",
                desc.name,
                member.name,
                variant.name,
                placed
            );
        }
        Ok(())
    }
}

fn trace_member(desc: &RecordDescriptor, member: &MemberDescriptor, placed: Option<usize>) {
    match placed {
        Some(offset) => log::trace!("[deepsnap] {}.{} -> +{:#x}", desc.name, member.name, offset),
        None => log::trace!("[deepsnap] {}.{} -> null", desc.name, member.name),
    }
}
