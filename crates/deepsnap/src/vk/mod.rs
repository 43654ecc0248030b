// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bundled Vulkan-style record schema.
//!
//! `#[repr(C)]` mirrors of the Vulkan structures deepsnap knows how to copy,
//! each deriving [`DeepCopy`](crate::DeepCopy). Tagged types are registered in
//! [`type_table()`] so extension chains and embedded records resolve.

use crate::config::FlattenConfig;
use crate::error::Result;
use crate::table::TypeTable;
use crate::DeepCopy;
use std::ffi::{c_char, c_void};
use std::fmt;
use std::sync::OnceLock;

pub mod unions;

pub const UUID_SIZE: usize = 16;

pub type Bool32 = u32;
pub type Flags = u32;
pub type DeviceSize = u64;
pub type DeviceAddress = u64;
pub type SampleMask = u32;
pub type Format = u32;
pub type IndexType = u32;
pub type ImageLayout = u32;
pub type SampleCountFlagBits = u32;
pub type ShaderStageFlagBits = u32;
pub type ShaderStageFlags = u32;
pub type DescriptorType = u32;
pub type GeometryTypeKHR = u32;
pub type AccelerationStructureTypeKHR = u32;
pub type BuildAccelerationStructureModeKHR = u32;
pub type ValidationFeatureEnableEXT = u32;
pub type ValidationFeatureDisableEXT = u32;
pub type IndirectCommandsTokenTypeEXT = u32;
pub type IndirectExecutionSetInfoTypeEXT = u32;
pub type IndirectCommandsInputModeFlagBitsEXT = u32;

/// Structure type tag stored in the first member of chain-capable records.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StructureType(pub u32);

impl StructureType {
    pub const APPLICATION_INFO: Self = Self(0);
    pub const INSTANCE_CREATE_INFO: Self = Self(1);
    pub const DEVICE_QUEUE_CREATE_INFO: Self = Self(2);
    pub const DEVICE_CREATE_INFO: Self = Self(3);
    pub const SHADER_MODULE_CREATE_INFO: Self = Self(16);
    pub const PIPELINE_CACHE_CREATE_INFO: Self = Self(17);
    pub const PIPELINE_SHADER_STAGE_CREATE_INFO: Self = Self(18);
    pub const PIPELINE_MULTISAMPLE_STATE_CREATE_INFO: Self = Self(24);
    pub const COMPUTE_PIPELINE_CREATE_INFO: Self = Self(29);
    pub const PHYSICAL_DEVICE_FEATURES_2: Self = Self(1_000_059_000);
    pub const DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT: Self = Self(1_000_128_004);
    pub const ACCELERATION_STRUCTURE_BUILD_GEOMETRY_INFO_KHR: Self = Self(1_000_150_000);
    pub const ACCELERATION_STRUCTURE_GEOMETRY_AABBS_DATA_KHR: Self = Self(1_000_150_003);
    pub const ACCELERATION_STRUCTURE_GEOMETRY_INSTANCES_DATA_KHR: Self = Self(1_000_150_004);
    pub const ACCELERATION_STRUCTURE_GEOMETRY_TRIANGLES_DATA_KHR: Self = Self(1_000_150_005);
    pub const ACCELERATION_STRUCTURE_GEOMETRY_KHR: Self = Self(1_000_150_006);
    pub const ACCELERATION_STRUCTURE_VERSION_INFO_KHR: Self = Self(1_000_150_009);
    pub const VALIDATION_FEATURES_EXT: Self = Self(1_000_247_000);
    pub const DESCRIPTOR_ADDRESS_INFO_EXT: Self = Self(1_000_316_003);
    pub const DESCRIPTOR_GET_INFO_EXT: Self = Self(1_000_316_004);
    pub const MICROMAP_VERSION_INFO_EXT: Self = Self(1_000_396_001);
    pub const INDIRECT_COMMANDS_LAYOUT_CREATE_INFO_EXT: Self = Self(1_000_572_003);
    pub const INDIRECT_COMMANDS_LAYOUT_TOKEN_EXT: Self = Self(1_000_572_004);

    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

pub mod descriptor_type {
    use super::DescriptorType;

    pub const SAMPLER: DescriptorType = 0;
    pub const COMBINED_IMAGE_SAMPLER: DescriptorType = 1;
    pub const SAMPLED_IMAGE: DescriptorType = 2;
    pub const STORAGE_IMAGE: DescriptorType = 3;
    pub const UNIFORM_TEXEL_BUFFER: DescriptorType = 4;
    pub const STORAGE_TEXEL_BUFFER: DescriptorType = 5;
    pub const UNIFORM_BUFFER: DescriptorType = 6;
    pub const STORAGE_BUFFER: DescriptorType = 7;
    pub const UNIFORM_BUFFER_DYNAMIC: DescriptorType = 8;
    pub const STORAGE_BUFFER_DYNAMIC: DescriptorType = 9;
    pub const INPUT_ATTACHMENT: DescriptorType = 10;
    pub const ACCELERATION_STRUCTURE_KHR: DescriptorType = 1_000_150_000;
}

pub mod indirect_commands_token_type {
    use super::IndirectCommandsTokenTypeEXT;

    pub const EXECUTION_SET: IndirectCommandsTokenTypeEXT = 0;
    pub const PUSH_CONSTANT: IndirectCommandsTokenTypeEXT = 1;
    pub const SEQUENCE_INDEX: IndirectCommandsTokenTypeEXT = 2;
    pub const INDEX_BUFFER: IndirectCommandsTokenTypeEXT = 3;
    pub const VERTEX_BUFFER: IndirectCommandsTokenTypeEXT = 4;
    pub const DRAW_INDEXED: IndirectCommandsTokenTypeEXT = 5;
    pub const DRAW: IndirectCommandsTokenTypeEXT = 6;
    pub const DISPATCH: IndirectCommandsTokenTypeEXT = 9;
}

pub mod sample_count {
    use super::SampleCountFlagBits;

    pub const TYPE_1: SampleCountFlagBits = 0x01;
    pub const TYPE_4: SampleCountFlagBits = 0x04;
    pub const TYPE_16: SampleCountFlagBits = 0x10;
    pub const TYPE_64: SampleCountFlagBits = 0x40;
}

macro_rules! handles {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(transparent)]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeepCopy)]
            pub struct $name(pub u64);
        )*
    };
}

handles!(
    Sampler,
    ImageView,
    ShaderModule,
    PipelineLayout,
    Pipeline,
    AccelerationStructureKHR,
    IndirectExecutionSetEXT,
);

pub type DebugUtilsMessengerCallbackEXT =
    unsafe extern "system" fn(u32, u32, *const c_void, *mut c_void) -> Bool32;

// ---------------------------------------------------------------------------
// Instance and device creation
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::APPLICATION_INFO.as_raw())]
pub struct ApplicationInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub p_application_name: *const c_char,
    pub application_version: u32,
    pub p_engine_name: *const c_char,
    pub engine_version: u32,
    pub api_version: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::INSTANCE_CREATE_INFO.as_raw())]
pub struct InstanceCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub p_application_info: *const ApplicationInfo,
    pub enabled_layer_count: u32,
    #[deep_copy(len = "enabled_layer_count,null-terminated")]
    pub pp_enabled_layer_names: *const *const c_char,
    pub enabled_extension_count: u32,
    #[deep_copy(len = "enabled_extension_count,null-terminated")]
    pub pp_enabled_extension_names: *const *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::DEVICE_QUEUE_CREATE_INFO.as_raw())]
pub struct DeviceQueueCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub queue_family_index: u32,
    pub queue_count: u32,
    #[deep_copy(len = "queue_count")]
    pub p_queue_priorities: *const f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepCopy)]
pub struct PhysicalDeviceFeatures {
    pub robust_buffer_access: Bool32,
    pub full_draw_index_uint32: Bool32,
    pub image_cube_array: Bool32,
    pub independent_blend: Bool32,
    pub geometry_shader: Bool32,
    pub tessellation_shader: Bool32,
    pub sample_rate_shading: Bool32,
    pub dual_src_blend: Bool32,
    pub logic_op: Bool32,
    pub multi_draw_indirect: Bool32,
    pub draw_indirect_first_instance: Bool32,
    pub depth_clamp: Bool32,
    pub depth_bias_clamp: Bool32,
    pub fill_mode_non_solid: Bool32,
    pub depth_bounds: Bool32,
    pub wide_lines: Bool32,
    pub large_points: Bool32,
    pub alpha_to_one: Bool32,
    pub multi_viewport: Bool32,
    pub sampler_anisotropy: Bool32,
    pub texture_compression_etc2: Bool32,
    pub texture_compression_astc_ldr: Bool32,
    pub texture_compression_bc: Bool32,
    pub occlusion_query_precise: Bool32,
    pub pipeline_statistics_query: Bool32,
    pub vertex_pipeline_stores_and_atomics: Bool32,
    pub fragment_stores_and_atomics: Bool32,
    pub shader_tessellation_and_geometry_point_size: Bool32,
    pub shader_image_gather_extended: Bool32,
    pub shader_storage_image_extended_formats: Bool32,
    pub shader_storage_image_multisample: Bool32,
    pub shader_storage_image_read_without_format: Bool32,
    pub shader_storage_image_write_without_format: Bool32,
    pub shader_uniform_buffer_array_dynamic_indexing: Bool32,
    pub shader_sampled_image_array_dynamic_indexing: Bool32,
    pub shader_storage_buffer_array_dynamic_indexing: Bool32,
    pub shader_storage_image_array_dynamic_indexing: Bool32,
    pub shader_clip_distance: Bool32,
    pub shader_cull_distance: Bool32,
    pub shader_float64: Bool32,
    pub shader_int64: Bool32,
    pub shader_int16: Bool32,
    pub shader_resource_residency: Bool32,
    pub shader_resource_min_lod: Bool32,
    pub sparse_binding: Bool32,
    pub sparse_residency_buffer: Bool32,
    pub sparse_residency_image_2d: Bool32,
    pub sparse_residency_image_3d: Bool32,
    pub sparse_residency_2_samples: Bool32,
    pub sparse_residency_4_samples: Bool32,
    pub sparse_residency_8_samples: Bool32,
    pub sparse_residency_16_samples: Bool32,
    pub sparse_residency_aliased: Bool32,
    pub variable_multisample_rate: Bool32,
    pub inherited_queries: Bool32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::DEVICE_CREATE_INFO.as_raw())]
pub struct DeviceCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub queue_create_info_count: u32,
    #[deep_copy(len = "queue_create_info_count")]
    pub p_queue_create_infos: *const DeviceQueueCreateInfo,
    pub enabled_layer_count: u32,
    #[deep_copy(len = "enabled_layer_count,null-terminated")]
    pub pp_enabled_layer_names: *const *const c_char,
    pub enabled_extension_count: u32,
    #[deep_copy(len = "enabled_extension_count,null-terminated")]
    pub pp_enabled_extension_names: *const *const c_char,
    pub p_enabled_features: *const PhysicalDeviceFeatures,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::PHYSICAL_DEVICE_FEATURES_2.as_raw())]
pub struct PhysicalDeviceFeatures2 {
    pub s_type: StructureType,
    pub p_next: *mut c_void,
    pub features: PhysicalDeviceFeatures,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT.as_raw())]
pub struct DebugUtilsMessengerCreateInfoEXT {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub message_severity: Flags,
    pub message_type: Flags,
    pub pfn_user_callback: Option<DebugUtilsMessengerCallbackEXT>,
    pub p_user_data: *mut c_void,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::VALIDATION_FEATURES_EXT.as_raw())]
pub struct ValidationFeaturesEXT {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub enabled_validation_feature_count: u32,
    #[deep_copy(len = "enabled_validation_feature_count")]
    pub p_enabled_validation_features: *const ValidationFeatureEnableEXT,
    pub disabled_validation_feature_count: u32,
    #[deep_copy(len = "disabled_validation_feature_count")]
    pub p_disabled_validation_features: *const ValidationFeatureDisableEXT,
}

// ---------------------------------------------------------------------------
// Shaders and pipelines
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::SHADER_MODULE_CREATE_INFO.as_raw())]
pub struct ShaderModuleCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    /// Size in bytes; the code is `code_size / 4` words.
    pub code_size: usize,
    #[deep_copy(len = "code_size / 4")]
    pub p_code: *const u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::PIPELINE_CACHE_CREATE_INFO.as_raw())]
pub struct PipelineCacheCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub initial_data_size: usize,
    #[deep_copy(len = "initial_data_size")]
    pub p_initial_data: *const c_void,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepCopy)]
pub struct SpecializationMapEntry {
    pub constant_id: u32,
    pub offset: u32,
    pub size: usize,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
pub struct SpecializationInfo {
    pub map_entry_count: u32,
    #[deep_copy(len = "map_entry_count")]
    pub p_map_entries: *const SpecializationMapEntry,
    pub data_size: usize,
    #[deep_copy(len = "data_size")]
    pub p_data: *const c_void,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO.as_raw())]
pub struct PipelineShaderStageCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub stage: ShaderStageFlagBits,
    pub module: ShaderModule,
    pub p_name: *const c_char,
    pub p_specialization_info: *const SpecializationInfo,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::COMPUTE_PIPELINE_CREATE_INFO.as_raw())]
pub struct ComputePipelineCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub stage: PipelineShaderStageCreateInfo,
    pub layout: PipelineLayout,
    pub base_pipeline_handle: Pipeline,
    pub base_pipeline_index: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::PIPELINE_MULTISAMPLE_STATE_CREATE_INFO.as_raw())]
pub struct PipelineMultisampleStateCreateInfo {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub rasterization_samples: SampleCountFlagBits,
    pub sample_shading_enable: Bool32,
    pub min_sample_shading: f32,
    /// One bit per sample, `(rasterization_samples + 31) / 32` words.
    pub p_sample_mask: *const SampleMask,
    pub alpha_to_coverage_enable: Bool32,
    pub alpha_to_one_enable: Bool32,
}

// ---------------------------------------------------------------------------
// Acceleration structures and micromaps
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy)]
pub union DeviceOrHostAddressConstKHR {
    pub device_address: DeviceAddress,
    pub host_address: *const c_void,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union DeviceOrHostAddressKHR {
    pub device_address: DeviceAddress,
    pub host_address: *mut c_void,
}

impl fmt::Debug for DeviceOrHostAddressConstKHR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: both alternatives are 64-bit plain data.
        write!(f, "DeviceOrHostAddressConstKHR({:#x})", unsafe { self.device_address })
    }
}

impl fmt::Debug for DeviceOrHostAddressKHR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: both alternatives are 64-bit plain data.
        write!(f, "DeviceOrHostAddressKHR({:#x})", unsafe { self.device_address })
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::ACCELERATION_STRUCTURE_GEOMETRY_TRIANGLES_DATA_KHR.as_raw())]
pub struct AccelerationStructureGeometryTrianglesDataKHR {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub vertex_format: Format,
    pub vertex_data: DeviceOrHostAddressConstKHR,
    pub vertex_stride: DeviceSize,
    pub max_vertex: u32,
    pub index_type: IndexType,
    pub index_data: DeviceOrHostAddressConstKHR,
    pub transform_data: DeviceOrHostAddressConstKHR,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::ACCELERATION_STRUCTURE_GEOMETRY_AABBS_DATA_KHR.as_raw())]
pub struct AccelerationStructureGeometryAabbsDataKHR {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub data: DeviceOrHostAddressConstKHR,
    pub stride: DeviceSize,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::ACCELERATION_STRUCTURE_GEOMETRY_INSTANCES_DATA_KHR.as_raw())]
pub struct AccelerationStructureGeometryInstancesDataKHR {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub array_of_pointers: Bool32,
    pub data: DeviceOrHostAddressConstKHR,
}

/// Geometry payload; the live alternative is named by the structure type at offset 0.
#[repr(C)]
#[derive(Clone, Copy)]
pub union AccelerationStructureGeometryDataKHR {
    pub triangles: AccelerationStructureGeometryTrianglesDataKHR,
    pub aabbs: AccelerationStructureGeometryAabbsDataKHR,
    pub instances: AccelerationStructureGeometryInstancesDataKHR,
}

impl fmt::Debug for AccelerationStructureGeometryDataKHR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: every alternative starts with its structure type.
        let s_type = unsafe { self.triangles.s_type };
        f.debug_struct("AccelerationStructureGeometryDataKHR")
            .field("s_type", &s_type)
            .finish_non_exhaustive()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::ACCELERATION_STRUCTURE_GEOMETRY_KHR.as_raw())]
pub struct AccelerationStructureGeometryKHR {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub geometry_type: GeometryTypeKHR,
    pub geometry: AccelerationStructureGeometryDataKHR,
    pub flags: Flags,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::ACCELERATION_STRUCTURE_BUILD_GEOMETRY_INFO_KHR.as_raw())]
pub struct AccelerationStructureBuildGeometryInfoKHR {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub ty: AccelerationStructureTypeKHR,
    pub flags: Flags,
    pub mode: BuildAccelerationStructureModeKHR,
    pub src_acceleration_structure: AccelerationStructureKHR,
    pub dst_acceleration_structure: AccelerationStructureKHR,
    pub geometry_count: u32,
    #[deep_copy(len = "geometry_count")]
    pub p_geometries: *const AccelerationStructureGeometryKHR,
    #[deep_copy(len = "geometry_count")]
    pub pp_geometries: *const *const AccelerationStructureGeometryKHR,
    pub scratch_data: DeviceOrHostAddressKHR,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::ACCELERATION_STRUCTURE_VERSION_INFO_KHR.as_raw())]
pub struct AccelerationStructureVersionInfoKHR {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    /// Two UUIDs back to back.
    pub p_version_data: *const u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::MICROMAP_VERSION_INFO_EXT.as_raw())]
pub struct MicromapVersionInfoEXT {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub p_version_data: *const u8,
}

// ---------------------------------------------------------------------------
// Descriptor buffers
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepCopy)]
pub struct DescriptorImageInfo {
    pub sampler: Sampler,
    pub image_view: ImageView,
    pub image_layout: ImageLayout,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::DESCRIPTOR_ADDRESS_INFO_EXT.as_raw())]
pub struct DescriptorAddressInfoEXT {
    pub s_type: StructureType,
    pub p_next: *mut c_void,
    pub address: DeviceAddress,
    pub range: DeviceSize,
    pub format: Format,
}

/// Descriptor payload; the live alternative is named by `DescriptorGetInfoEXT::ty`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union DescriptorDataEXT {
    pub p_sampler: *const Sampler,
    pub p_combined_image_sampler: *const DescriptorImageInfo,
    pub p_input_attachment_image: *const DescriptorImageInfo,
    pub p_sampled_image: *const DescriptorImageInfo,
    pub p_storage_image: *const DescriptorImageInfo,
    pub p_uniform_texel_buffer: *const DescriptorAddressInfoEXT,
    pub p_storage_texel_buffer: *const DescriptorAddressInfoEXT,
    pub p_uniform_buffer: *const DescriptorAddressInfoEXT,
    pub p_storage_buffer: *const DescriptorAddressInfoEXT,
    pub acceleration_structure: DeviceAddress,
}

impl fmt::Debug for DescriptorDataEXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: every alternative is 64-bit plain data.
        write!(f, "DescriptorDataEXT({:#x})", unsafe { self.acceleration_structure })
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::DESCRIPTOR_GET_INFO_EXT.as_raw())]
pub struct DescriptorGetInfoEXT {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub ty: DescriptorType,
    #[deep_copy(resolver = unions::DESCRIPTOR_DATA)]
    pub data: DescriptorDataEXT,
}

// ---------------------------------------------------------------------------
// Device generated commands
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepCopy)]
pub struct PushConstantRange {
    pub stage_flags: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepCopy)]
pub struct IndirectCommandsPushConstantTokenEXT {
    pub update_range: PushConstantRange,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepCopy)]
pub struct IndirectCommandsVertexBufferTokenEXT {
    pub vertex_binding_unit: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepCopy)]
pub struct IndirectCommandsIndexBufferTokenEXT {
    pub mode: IndirectCommandsInputModeFlagBitsEXT,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepCopy)]
pub struct IndirectCommandsExecutionSetTokenEXT {
    pub ty: IndirectExecutionSetInfoTypeEXT,
    pub shader_stages: ShaderStageFlags,
}

/// Token payload; the live alternative is named by `IndirectCommandsLayoutTokenEXT::ty`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union IndirectCommandsTokenDataEXT {
    pub p_push_constant: *const IndirectCommandsPushConstantTokenEXT,
    pub p_vertex_buffer: *const IndirectCommandsVertexBufferTokenEXT,
    pub p_index_buffer: *const IndirectCommandsIndexBufferTokenEXT,
    pub p_execution_set: *const IndirectCommandsExecutionSetTokenEXT,
}

impl fmt::Debug for IndirectCommandsTokenDataEXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: every alternative is a pointer.
        write!(f, "IndirectCommandsTokenDataEXT({:p})", unsafe { self.p_push_constant })
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::INDIRECT_COMMANDS_LAYOUT_TOKEN_EXT.as_raw())]
pub struct IndirectCommandsLayoutTokenEXT {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub ty: IndirectCommandsTokenTypeEXT,
    #[deep_copy(resolver = unions::INDIRECT_COMMANDS_TOKEN_DATA)]
    pub data: IndirectCommandsTokenDataEXT,
    pub offset: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, DeepCopy)]
#[deep_copy(stype = StructureType::INDIRECT_COMMANDS_LAYOUT_CREATE_INFO_EXT.as_raw())]
pub struct IndirectCommandsLayoutCreateInfoEXT {
    pub s_type: StructureType,
    pub p_next: *const c_void,
    pub flags: Flags,
    pub shader_stages: ShaderStageFlags,
    pub indirect_stride: u32,
    pub pipeline_layout: PipelineLayout,
    pub token_count: u32,
    #[deep_copy(len = "token_count")]
    pub p_tokens: *const IndirectCommandsLayoutTokenEXT,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

macro_rules! zeroed_default {
    ($($ty:ident $(=> $stype:expr)?),* $(,)?) => {
        $(
            impl Default for $ty {
                #[allow(unused_mut)]
                fn default() -> Self {
                    // SAFETY: all-zero is valid for every member: integers,
                    // null pointers, `None` callbacks and zero unions.
                    let mut value: Self = unsafe { std::mem::zeroed() };
                    $( value.s_type = $stype; )?
                    value
                }
            }
        )*
    };
}

zeroed_default!(
    ApplicationInfo => StructureType::APPLICATION_INFO,
    InstanceCreateInfo => StructureType::INSTANCE_CREATE_INFO,
    DeviceQueueCreateInfo => StructureType::DEVICE_QUEUE_CREATE_INFO,
    DeviceCreateInfo => StructureType::DEVICE_CREATE_INFO,
    PhysicalDeviceFeatures2 => StructureType::PHYSICAL_DEVICE_FEATURES_2,
    DebugUtilsMessengerCreateInfoEXT => StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
    ValidationFeaturesEXT => StructureType::VALIDATION_FEATURES_EXT,
    ShaderModuleCreateInfo => StructureType::SHADER_MODULE_CREATE_INFO,
    PipelineCacheCreateInfo => StructureType::PIPELINE_CACHE_CREATE_INFO,
    SpecializationInfo,
    PipelineShaderStageCreateInfo => StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
    ComputePipelineCreateInfo => StructureType::COMPUTE_PIPELINE_CREATE_INFO,
    PipelineMultisampleStateCreateInfo => StructureType::PIPELINE_MULTISAMPLE_STATE_CREATE_INFO,
    DeviceOrHostAddressConstKHR,
    DeviceOrHostAddressKHR,
    AccelerationStructureGeometryTrianglesDataKHR => StructureType::ACCELERATION_STRUCTURE_GEOMETRY_TRIANGLES_DATA_KHR,
    AccelerationStructureGeometryAabbsDataKHR => StructureType::ACCELERATION_STRUCTURE_GEOMETRY_AABBS_DATA_KHR,
    AccelerationStructureGeometryInstancesDataKHR => StructureType::ACCELERATION_STRUCTURE_GEOMETRY_INSTANCES_DATA_KHR,
    AccelerationStructureGeometryKHR => StructureType::ACCELERATION_STRUCTURE_GEOMETRY_KHR,
    AccelerationStructureBuildGeometryInfoKHR => StructureType::ACCELERATION_STRUCTURE_BUILD_GEOMETRY_INFO_KHR,
    AccelerationStructureVersionInfoKHR => StructureType::ACCELERATION_STRUCTURE_VERSION_INFO_KHR,
    MicromapVersionInfoEXT => StructureType::MICROMAP_VERSION_INFO_EXT,
    DescriptorAddressInfoEXT => StructureType::DESCRIPTOR_ADDRESS_INFO_EXT,
    DescriptorDataEXT,
    DescriptorGetInfoEXT => StructureType::DESCRIPTOR_GET_INFO_EXT,
    IndirectCommandsTokenDataEXT,
    IndirectCommandsLayoutTokenEXT => StructureType::INDIRECT_COMMANDS_LAYOUT_TOKEN_EXT,
    IndirectCommandsLayoutCreateInfoEXT => StructureType::INDIRECT_COMMANDS_LAYOUT_CREATE_INFO_EXT,
);

// ---------------------------------------------------------------------------
// Type table
// ---------------------------------------------------------------------------

/// Table with every tagged record of this schema registered.
pub fn build_type_table() -> Result<TypeTable> {
    TypeTable::builder()
        .register::<ApplicationInfo>()
        .register::<InstanceCreateInfo>()
        .register::<DeviceQueueCreateInfo>()
        .register::<DeviceCreateInfo>()
        .register::<PhysicalDeviceFeatures2>()
        .register::<DebugUtilsMessengerCreateInfoEXT>()
        .register::<ValidationFeaturesEXT>()
        .register::<ShaderModuleCreateInfo>()
        .register::<PipelineCacheCreateInfo>()
        .register::<PipelineShaderStageCreateInfo>()
        .register::<ComputePipelineCreateInfo>()
        .register::<PipelineMultisampleStateCreateInfo>()
        .register::<AccelerationStructureGeometryTrianglesDataKHR>()
        .register::<AccelerationStructureGeometryAabbsDataKHR>()
        .register::<AccelerationStructureGeometryInstancesDataKHR>()
        .register::<AccelerationStructureGeometryKHR>()
        .register::<AccelerationStructureBuildGeometryInfoKHR>()
        .register::<AccelerationStructureVersionInfoKHR>()
        .register::<MicromapVersionInfoEXT>()
        .register::<DescriptorAddressInfoEXT>()
        .register::<DescriptorGetInfoEXT>()
        .register::<IndirectCommandsLayoutTokenEXT>()
        .register::<IndirectCommandsLayoutCreateInfoEXT>()
        .build()
}

/// Process-wide bundled table, configured from `DEEPSNAP_*` environment variables.
pub fn type_table() -> &'static TypeTable {
    static TABLE: OnceLock<TypeTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let config = FlattenConfig::from_env().unwrap_or_else(|err| {
            log::warn!("[deepsnap] ignoring environment configuration: {}", err);
            FlattenConfig::default()
        });
        match build_type_table() {
            Ok(table) => table.with_config(config),
            Err(err) => {
                log::error!("[deepsnap] bundled type table: {}", err);
                TypeTable::new().with_config(config)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DeepCopy, ElementCount, MemberKind, Pointee};
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_bundled_table_builds() {
        let table = build_type_table().unwrap();
        assert_eq!(table.len(), 23);
        assert_eq!(
            table
                .lookup(StructureType::DEVICE_CREATE_INFO.as_raw())
                .map(|d| d.name),
            Some("DeviceCreateInfo")
        );
    }

    #[test]
    fn test_descriptor_matches_layout() {
        let desc = DeviceCreateInfo::descriptor();
        assert_eq!(desc.size, size_of::<DeviceCreateInfo>());
        assert_eq!(desc.structure_type, Some(3));
        assert!(!desc.shallow);

        let member = desc.member("p_queue_create_infos").unwrap();
        assert_eq!(member.offset, offset_of!(DeviceCreateInfo, p_queue_create_infos));
        match &member.kind {
            MemberKind::Pointer {
                pointee: Pointee::Record(pointee),
                count: ElementCount::Computed { expr, .. },
            } => {
                assert_eq!(pointee().name, "DeviceQueueCreateInfo");
                assert_eq!(*expr, "queue_create_info_count");
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert!(matches!(desc.member("p_next").unwrap().kind, MemberKind::Chain));
        assert!(matches!(
            desc.member("pp_enabled_layer_names").unwrap().kind,
            MemberKind::PointerArray {
                pointee: Pointee::CString,
                ..
            }
        ));
    }

    #[test]
    fn test_member_classification() {
        let desc = DebugUtilsMessengerCreateInfoEXT::descriptor();
        assert!(matches!(desc.member("p_user_data").unwrap().kind, MemberKind::Opaque));
        assert!(matches!(
            desc.member("pfn_user_callback").unwrap().kind,
            MemberKind::Value
        ));

        let desc = PipelineCacheCreateInfo::descriptor();
        assert!(matches!(
            desc.member("p_initial_data").unwrap().kind,
            MemberKind::Pointer {
                pointee: Pointee::Blob,
                ..
            }
        ));

        let desc = ComputePipelineCreateInfo::descriptor();
        assert!(matches!(desc.member("stage").unwrap().kind, MemberKind::Embedded));

        let desc = AccelerationStructureGeometryKHR::descriptor();
        assert!(matches!(desc.member("geometry").unwrap().kind, MemberKind::Embedded));

        let desc = DescriptorGetInfoEXT::descriptor();
        assert!(matches!(desc.member("data").unwrap().kind, MemberKind::Union(_)));

        // unions without a resolver are plain values
        let desc = AccelerationStructureGeometryTrianglesDataKHR::descriptor();
        assert!(matches!(desc.member("vertex_data").unwrap().kind, MemberKind::Value));
    }

    #[test]
    fn test_shallow_records() {
        assert!(PhysicalDeviceFeatures::descriptor().shallow);
        assert!(SpecializationMapEntry::descriptor().shallow);
        assert!(Sampler::descriptor().shallow);
        assert!(!SpecializationInfo::descriptor().shallow);
        assert_eq!(PhysicalDeviceFeatures::descriptor().members.len(), 55);
    }

    #[test]
    fn test_count_override_evaluates() {
        let info = PipelineMultisampleStateCreateInfo {
            rasterization_samples: sample_count::TYPE_64,
            ..Default::default()
        };
        let member = PipelineMultisampleStateCreateInfo::descriptor()
            .member("p_sample_mask")
            .unwrap();
        let MemberKind::Pointer { count, .. } = &member.kind else {
            panic!("p_sample_mask is a pointer");
        };
        let record = (&info as *const PipelineMultisampleStateCreateInfo).cast();
        let words = unsafe { count.resolve(record) };
        assert_eq!(words, 2);

        let versions = MicromapVersionInfoEXT::default();
        let member = MicromapVersionInfoEXT::descriptor().member("p_version_data").unwrap();
        let MemberKind::Pointer { count, .. } = &member.kind else {
            panic!("p_version_data is a pointer");
        };
        let record = (&versions as *const MicromapVersionInfoEXT).cast();
        let bytes = unsafe { count.resolve(record) };
        assert_eq!(bytes, 2 * UUID_SIZE);
    }

    #[test]
    fn test_defaults_carry_structure_type() {
        assert_eq!(ApplicationInfo::default().s_type, StructureType::APPLICATION_INFO);
        let info = DeviceCreateInfo::default();
        assert_eq!(info.s_type, StructureType::DEVICE_CREATE_INFO);
        assert!(info.p_next.is_null());
        assert!(info.p_queue_create_infos.is_null());
    }

    #[test]
    fn test_global_table_is_shared() {
        assert!(std::ptr::eq(type_table(), type_table()));
        assert!(type_table()
            .lookup(StructureType::INDIRECT_COMMANDS_LAYOUT_TOKEN_EXT.as_raw())
            .is_some());
    }
}
