// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

mod classify;

use classify::{CountPlan, MemberAttrs, MemberContext, MemberPlan, PointeePlan, BLOCKED_TYPES};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use std::collections::HashSet;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Ident, Member};

/// `#[derive(DeepCopy)]` macro: generates a static `RecordDescriptor` for a `#[repr(C)]` record
///
/// Member rules:
/// - `p_next` (or `#[deep_copy(chain)]`): extension chain, resolved through the type table
/// - `*const T` / `*mut T`: pointer to `len` records (one when `len` is absent)
/// - `*const *const T`: array of `len` pointers, each pointing at one record
/// - `*const c_char`: NUL-terminated string
/// - `*const c_void` with `len`: raw byte blob; without `len`: opaque handle, copied as-is
/// - `#[deep_copy(embedded)]`: by-value tagged record, copied through its tag
/// - `#[deep_copy(resolver = PATH)]`: by-value union steered by a tag member
/// - everything else is copied by value
///
/// Record attribute `#[deep_copy(stype = EXPR)]` sets the structure-type tag
/// used for chain and embedded dispatch.
///
/// Example:
/// ```ignore
/// use deepsnap::DeepCopy;
///
/// #[repr(C)]
/// #[derive(DeepCopy)]
/// #[deep_copy(stype = 7)]
/// struct Mesh {
///     s_type: u32,
///     p_next: *const c_void,
///     vertex_count: u32,
///     #[deep_copy(len = "vertex_count")]
///     p_vertices: *const Vertex,
///     p_label: *const c_char,
/// }
/// ```
#[proc_macro_derive(DeepCopy, attributes(deep_copy))]
pub fn derive_deep_copy(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let type_name = name.to_string();

    if BLOCKED_TYPES.contains(&type_name.as_str()) {
        return Err(syn::Error::new_spanned(
            name,
            format!("`{type_name}` carries platform resources and has no deep-copy support"),
        ));
    }
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "DeepCopy cannot be derived for generic records",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "DeepCopy only supports structs",
            ))
        }
    };
    let structure_type = parse_structure_type(&input.attrs)?;

    let siblings: HashSet<String> = fields
        .iter()
        .filter_map(|field| field.ident.as_ref().map(ToString::to_string))
        .collect();

    let mut members = Vec::with_capacity(fields.len());
    let mut count_fns = Vec::new();
    let mut shallow = true;

    for (index, field) in fields.iter().enumerate() {
        let (member, member_name) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
            None => (Member::Unnamed(syn::Index::from(index)), index.to_string()),
        };

        let attrs = MemberAttrs::parse(&field.attrs)?;
        let ctx = MemberContext {
            record: &type_name,
            name: &member_name,
            siblings: &siblings,
        };
        let plan = classify::classify(&ctx, &field.ty, &attrs)?;
        shallow &= !plan.is_traversed();

        let ty = &field.ty;
        let kind = member_kind(name, &member_name, &plan, &mut count_fns);
        members.push(quote! {
            ::deepsnap::MemberDescriptor {
                name: #member_name,
                offset: ::core::mem::offset_of!(#name, #member),
                size: ::core::mem::size_of::<#ty>(),
                kind: #kind,
            }
        });
    }

    let member_count = members.len();
    let structure_type = match structure_type {
        Some(expr) => quote!(::core::option::Option::Some(#expr)),
        None => quote!(::core::option::Option::None),
    };

    Ok(quote! {
        unsafe impl ::deepsnap::DeepCopy for #name {
            fn descriptor() -> &'static ::deepsnap::RecordDescriptor {
                #(#count_fns)*

                static MEMBERS: [::deepsnap::MemberDescriptor; #member_count] = [#(#members),*];
                static DESCRIPTOR: ::deepsnap::RecordDescriptor = ::deepsnap::RecordDescriptor {
                    name: #type_name,
                    size: ::core::mem::size_of::<#name>(),
                    align: ::core::mem::align_of::<#name>(),
                    structure_type: #structure_type,
                    shallow: #shallow,
                    members: &MEMBERS,
                };
                &DESCRIPTOR
            }
        }
    })
}

/// Parse `#[deep_copy(stype = EXPR)]` on the record itself.
fn parse_structure_type(attrs: &[Attribute]) -> syn::Result<Option<Expr>> {
    let mut structure_type = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("deep_copy")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("stype") {
                structure_type = Some(meta.value()?.parse::<Expr>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported deep_copy record attribute"))
            }
        })?;
    }
    Ok(structure_type)
}

fn member_kind(
    record: &Ident,
    member: &str,
    plan: &MemberPlan,
    count_fns: &mut Vec<TokenStream2>,
) -> TokenStream2 {
    match plan {
        MemberPlan::Value => quote!(::deepsnap::MemberKind::Value),
        MemberPlan::Opaque => quote!(::deepsnap::MemberKind::Opaque),
        MemberPlan::Chain => quote!(::deepsnap::MemberKind::Chain),
        MemberPlan::Embedded => quote!(::deepsnap::MemberKind::Embedded),
        MemberPlan::Union(resolver) => quote!(::deepsnap::MemberKind::Union(&#resolver)),
        MemberPlan::Pointer { pointee, count } => {
            let pointee = pointee_tokens(pointee);
            let count = count_tokens(record, member, count, count_fns);
            quote!(::deepsnap::MemberKind::Pointer { pointee: #pointee, count: #count })
        }
        MemberPlan::PointerArray { pointee, count } => {
            let pointee = pointee_tokens(pointee);
            let count = count_tokens(record, member, count, count_fns);
            quote!(::deepsnap::MemberKind::PointerArray { pointee: #pointee, count: #count })
        }
    }
}

fn pointee_tokens(pointee: &PointeePlan) -> TokenStream2 {
    match pointee {
        PointeePlan::Record(ty) => {
            quote!(::deepsnap::Pointee::Record(<#ty as ::deepsnap::DeepCopy>::descriptor))
        }
        PointeePlan::CString => quote!(::deepsnap::Pointee::CString),
        PointeePlan::Blob => quote!(::deepsnap::Pointee::Blob),
    }
}

/// Emit the count evaluator (if any) and return the `ElementCount` tokens.
fn count_tokens(
    record: &Ident,
    member: &str,
    count: &CountPlan,
    count_fns: &mut Vec<TokenStream2>,
) -> TokenStream2 {
    match count {
        CountPlan::One => quote!(::deepsnap::ElementCount::One),
        CountPlan::Expr { source, expr } => {
            let eval = format_ident!("__deepsnap_count_{}", member);
            count_fns.push(quote! {
                #[allow(unused_unsafe, unused_variables, clippy::unnecessary_cast)]
                unsafe fn #eval(record: *const u8) -> usize {
                    let base: &#record = unsafe { &*record.cast::<#record>() };
                    (#expr) as usize
                }
            });
            quote!(::deepsnap::ElementCount::Computed { expr: #source, eval: #eval })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expanded(input: DeriveInput) -> String {
        expand(&input).expect("expansion").to_string()
    }

    #[test]
    fn test_plain_record_is_shallow() {
        let out = expanded(parse_quote! {
            #[repr(C)]
            struct Extent { width: u32, height: u32 }
        });
        assert!(out.contains("shallow : true"));
        assert!(out.contains("structure_type : :: core :: option :: Option :: None"));
        assert!(out.contains("MemberDescriptor ; 2usize"));
    }

    #[test]
    fn test_chain_and_counted_pointer() {
        let out = expanded(parse_quote! {
            #[repr(C)]
            #[deep_copy(stype = StructureType::DEVICE_CREATE_INFO.as_raw())]
            struct DeviceCreateInfo {
                s_type: StructureType,
                p_next: *const c_void,
                queue_create_info_count: u32,
                #[deep_copy(len = "queue_create_info_count")]
                p_queue_create_infos: *const DeviceQueueCreateInfo,
            }
        });
        assert!(out.contains("shallow : false"));
        assert!(out.contains("MemberKind :: Chain"));
        assert!(out.contains("unsafe fn __deepsnap_count_p_queue_create_infos"));
        assert!(out.contains("base . queue_create_info_count"));
        assert!(out.contains("< DeviceQueueCreateInfo as :: deepsnap :: DeepCopy > :: descriptor"));
        assert!(out.contains("Option :: Some (StructureType :: DEVICE_CREATE_INFO . as_raw ())"));
    }

    #[test]
    fn test_tuple_struct_offsets() {
        let out = expanded(parse_quote! {
            #[repr(transparent)]
            struct Sampler(u64);
        });
        assert!(out.contains("offset_of ! (Sampler , 0)"));
        assert!(out.contains("name : \"0\""));
    }

    #[test]
    fn test_blocked_record_is_rejected() {
        let err = expand(&parse_quote! {
            #[repr(C)]
            struct XlibSurfaceCreateInfoKHR { s_type: u32, p_next: *const c_void }
        })
        .unwrap_err();
        assert!(err.to_string().contains("platform resources"));
    }

    #[test]
    fn test_enums_and_generics_are_rejected() {
        assert!(expand(&parse_quote! { enum Mode { A, B } }).is_err());
        assert!(expand(&parse_quote! { struct Wrapper<T> { value: T } }).is_err());
    }

    #[test]
    fn test_unknown_record_attribute() {
        let err = expand(&parse_quote! {
            #[deep_copy(tag = 3)]
            struct Extent { width: u32 }
        })
        .unwrap_err();
        assert!(err.to_string().contains("unsupported deep_copy record attribute"));
    }
}
