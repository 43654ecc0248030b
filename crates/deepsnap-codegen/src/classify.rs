// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member classification for `#[derive(DeepCopy)]`.
//!
//! Decides, per member, which traversal rule the run-time engine applies.
//! The tables below are the only per-type special cases; everything else is
//! derived from the member's Rust type and its `#[deep_copy(...)]` attributes.

use proc_macro2::Span;
use std::collections::HashSet;
use syn::visit_mut::{self, VisitMut};
use syn::{Attribute, Expr, Ident, LitStr, Path, Type};

/// Record types that carry platform surfaces or foreign resources.
pub(crate) const BLOCKED_TYPES: &[&str] = &[
    "BaseInStructure",
    "BaseOutStructure",
    "XlibSurfaceCreateInfoKHR",
    "XcbSurfaceCreateInfoKHR",
    "WaylandSurfaceCreateInfoKHR",
    "AndroidSurfaceCreateInfoKHR",
    "ImportAndroidHardwareBufferInfoANDROID",
    "MetalSurfaceCreateInfoEXT",
    "DirectFBSurfaceCreateInfoEXT",
    "ScreenSurfaceCreateInfoQNX",
    "PushDescriptorSetWithTemplateInfoKHR",
];

/// By-value member types that stand for a tagged record and are copied through their tag.
pub(crate) const EMBEDDED_TYPES: &[&str] = &[
    "PipelineShaderStageCreateInfo",
    "AccelerationStructureGeometryDataKHR",
    "IndirectExecutionSetInfoEXT",
];

/// Element counts that cannot be derived from a length attribute: (record, member, formula).
pub(crate) const COUNT_OVERRIDES: &[(&str, &str, &str)] = &[
    (
        "PipelineMultisampleStateCreateInfo",
        "p_sample_mask",
        "(rasterization_samples + 31) / 32",
    ),
    (
        "MicromapVersionInfoEXT",
        "p_version_data",
        "2 * ::deepsnap::vk::UUID_SIZE",
    ),
    (
        "AccelerationStructureVersionInfoKHR",
        "p_version_data",
        "2 * ::deepsnap::vk::UUID_SIZE",
    ),
];

/// Parsed `#[deep_copy(...)]` member attributes.
#[derive(Default)]
pub(crate) struct MemberAttrs {
    pub(crate) chain: bool,
    pub(crate) embedded: bool,
    pub(crate) opaque: bool,
    pub(crate) len: Option<LitStr>,
    pub(crate) resolver: Option<Path>,
}

impl MemberAttrs {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("deep_copy")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("chain") {
                    parsed.chain = true;
                } else if meta.path.is_ident("embedded") {
                    parsed.embedded = true;
                } else if meta.path.is_ident("opaque") {
                    parsed.opaque = true;
                } else if meta.path.is_ident("len") {
                    parsed.len = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("resolver") {
                    parsed.resolver = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("unsupported deep_copy member attribute"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PointeePlan {
    Record(Type),
    CString,
    Blob,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CountPlan {
    One,
    /// `source` is the expression as written, `expr` has sibling fields rewritten to `base.<field>`.
    Expr {
        source: String,
        expr: Expr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MemberPlan {
    Value,
    Opaque,
    Chain,
    Embedded,
    Union(Path),
    Pointer {
        pointee: PointeePlan,
        count: CountPlan,
    },
    PointerArray {
        pointee: PointeePlan,
        count: CountPlan,
    },
}

impl MemberPlan {
    /// True when the engine has to visit this member after the scalar copy.
    pub(crate) fn is_traversed(&self) -> bool {
        !matches!(self, Self::Value | Self::Opaque)
    }
}

/// Where a member sits: owning record, member name, and the record's field names.
pub(crate) struct MemberContext<'a> {
    pub(crate) record: &'a str,
    pub(crate) name: &'a str,
    pub(crate) siblings: &'a HashSet<String>,
}

pub(crate) fn classify(
    ctx: &MemberContext<'_>,
    ty: &Type,
    attrs: &MemberAttrs,
) -> syn::Result<MemberPlan> {
    let (depth, target) = peel_pointers(ty);
    let target_name = last_ident(target).map(Ident::to_string);
    let target_is = |name: &str| target_name.as_deref() == Some(name);

    if attrs.chain || ctx.name == "p_next" {
        if depth != 1 {
            return Err(syn::Error::new_spanned(
                ty,
                "extension chain member must be a single pointer",
            ));
        }
        return Ok(MemberPlan::Chain);
    }

    if let Some(resolver) = &attrs.resolver {
        if depth != 0 {
            return Err(syn::Error::new_spanned(
                ty,
                "union resolvers apply to by-value union members",
            ));
        }
        return Ok(MemberPlan::Union(resolver.clone()));
    }

    let embedded_type = target_name
        .as_deref()
        .is_some_and(|name| EMBEDDED_TYPES.contains(&name));
    if attrs.embedded || (depth == 0 && embedded_type) {
        if depth != 0 {
            return Err(syn::Error::new_spanned(
                ty,
                "embedded records are by-value members",
            ));
        }
        return Ok(MemberPlan::Embedded);
    }

    if attrs.opaque {
        return Ok(MemberPlan::Opaque);
    }

    if depth == 0 {
        if let Some(len) = &attrs.len {
            return Err(syn::Error::new_spanned(
                len,
                "`len` only applies to pointer members",
            ));
        }
        return Ok(MemberPlan::Value);
    }

    if depth > 2 {
        return Err(syn::Error::new_spanned(
            ty,
            "pointers nested deeper than two levels are not supported",
        ));
    }

    let count = count_plan(ctx, attrs)?;
    let pointee = if target_is("c_char") {
        PointeePlan::CString
    } else if target_is("c_void") {
        if depth == 2 {
            return Err(syn::Error::new_spanned(
                ty,
                "arrays of untyped pointers are not supported",
            ));
        }
        // an untyped pointer without a length is a foreign handle
        if count.is_none() {
            return Ok(MemberPlan::Opaque);
        }
        PointeePlan::Blob
    } else {
        PointeePlan::Record(target.clone())
    };

    let count = count.unwrap_or(CountPlan::One);
    Ok(if depth == 1 {
        MemberPlan::Pointer { pointee, count }
    } else {
        MemberPlan::PointerArray { pointee, count }
    })
}

/// Resolve the element count: the override table first, then `len`.
fn count_plan(ctx: &MemberContext<'_>, attrs: &MemberAttrs) -> syn::Result<Option<CountPlan>> {
    let written = match COUNT_OVERRIDES
        .iter()
        .find(|(record, member, _)| *record == ctx.record && *member == ctx.name)
    {
        Some((_, _, formula)) => (*formula).to_string(),
        None => match &attrs.len {
            Some(len) => len.value(),
            None => return Ok(None),
        },
    };

    // "count,null-terminated" style lengths: only the count part matters
    let source = written.split(',').next().unwrap_or_default().trim().to_string();
    let span = attrs.len.as_ref().map_or_else(Span::call_site, LitStr::span);
    let mut expr: Expr = syn::parse_str(&source).map_err(|err| {
        syn::Error::new(span, format!("invalid length expression `{source}`: {err}"))
    })?;
    SiblingFields {
        names: ctx.siblings,
    }
    .visit_expr_mut(&mut expr);

    Ok(Some(CountPlan::Expr { source, expr }))
}

/// Strip pointer levels, returning the depth and the innermost type.
pub(crate) fn peel_pointers(ty: &Type) -> (usize, &Type) {
    let mut depth = 0;
    let mut current = ty;
    loop {
        match current {
            Type::Ptr(ptr) => {
                depth += 1;
                current = &ptr.elem;
            }
            Type::Group(group) => current = &group.elem,
            Type::Paren(paren) => current = &paren.elem,
            _ => return (depth, current),
        }
    }
}

fn last_ident(ty: &Type) -> Option<&Ident> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|segment| &segment.ident),
        _ => None,
    }
}

/// Rewrites bare sibling field names to `base.<field>`.
struct SiblingFields<'a> {
    names: &'a HashSet<String>,
}

impl VisitMut for SiblingFields<'_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        let sibling = match expr {
            Expr::Path(path) if path.qself.is_none() && path.attrs.is_empty() => path
                .path
                .get_ident()
                .filter(|ident| self.names.contains(&ident.to_string()))
                .cloned(),
            _ => None,
        };
        if let Some(ident) = sibling {
            *expr = syn::parse_quote!(base.#ident);
            return;
        }
        visit_mut::visit_expr_mut(self, expr);
    }
}
