// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Union resolvers for the bundled schema.

use super::{
    descriptor_type, indirect_commands_token_type, DescriptorAddressInfoEXT, DescriptorGetInfoEXT,
    DescriptorImageInfo, IndirectCommandsExecutionSetTokenEXT, IndirectCommandsIndexBufferTokenEXT,
    IndirectCommandsLayoutTokenEXT, IndirectCommandsPushConstantTokenEXT,
    IndirectCommandsVertexBufferTokenEXT, Sampler,
};
use crate::descriptor::{DeepCopy, Pointee};
use crate::union::{UnionResolver, UnionVariant};
use std::mem::offset_of;

/// `IndirectCommandsLayoutTokenEXT::data`, selected by `ty`.
pub static INDIRECT_COMMANDS_TOKEN_DATA: UnionResolver = UnionResolver {
    record: "IndirectCommandsLayoutTokenEXT",
    tag_offset: offset_of!(IndirectCommandsLayoutTokenEXT, ty),
    variants: &[
        UnionVariant {
            name: "p_push_constant",
            tags: &[indirect_commands_token_type::PUSH_CONSTANT],
            pointee: Pointee::Record(<IndirectCommandsPushConstantTokenEXT as DeepCopy>::descriptor),
        },
        UnionVariant {
            name: "p_vertex_buffer",
            tags: &[indirect_commands_token_type::VERTEX_BUFFER],
            pointee: Pointee::Record(<IndirectCommandsVertexBufferTokenEXT as DeepCopy>::descriptor),
        },
        UnionVariant {
            name: "p_index_buffer",
            tags: &[indirect_commands_token_type::INDEX_BUFFER],
            pointee: Pointee::Record(<IndirectCommandsIndexBufferTokenEXT as DeepCopy>::descriptor),
        },
        UnionVariant {
            name: "p_execution_set",
            tags: &[indirect_commands_token_type::EXECUTION_SET],
            pointee: Pointee::Record(<IndirectCommandsExecutionSetTokenEXT as DeepCopy>::descriptor),
        },
    ],
};

/// `DescriptorGetInfoEXT::data`, selected by `ty`.
///
/// Acceleration-structure descriptors hold a device address and match no variant.
pub static DESCRIPTOR_DATA: UnionResolver = UnionResolver {
    record: "DescriptorGetInfoEXT",
    tag_offset: offset_of!(DescriptorGetInfoEXT, ty),
    variants: &[
        UnionVariant {
            name: "p_sampler",
            tags: &[descriptor_type::SAMPLER],
            pointee: Pointee::Record(<Sampler as DeepCopy>::descriptor),
        },
        UnionVariant {
            name: "p_image_info",
            tags: &[
                descriptor_type::COMBINED_IMAGE_SAMPLER,
                descriptor_type::INPUT_ATTACHMENT,
                descriptor_type::SAMPLED_IMAGE,
                descriptor_type::STORAGE_IMAGE,
            ],
            pointee: Pointee::Record(<DescriptorImageInfo as DeepCopy>::descriptor),
        },
        UnionVariant {
            name: "p_address_info",
            tags: &[
                descriptor_type::UNIFORM_TEXEL_BUFFER,
                descriptor_type::STORAGE_TEXEL_BUFFER,
                descriptor_type::UNIFORM_BUFFER,
                descriptor_type::STORAGE_BUFFER,
            ],
            pointee: Pointee::Record(<DescriptorAddressInfoEXT as DeepCopy>::descriptor),
        },
    ],
};
