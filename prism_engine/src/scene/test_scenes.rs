/// Scene descriptions shared by unit tests

use glam::Vec3;
use crate::graphics_device::{TextureDesc, TextureKind};
use crate::scene::{
    AttributeDesc, CullingFrustum, MaterialDesc, MeshDesc, SceneDesc, SceneKind, VertexLayoutDesc,
};

pub const BASIC_STRIDE: u32 = 40;
pub const EXTENDED_STRIDE: u32 = 56;
pub const CUBE_VERTEX_COUNT: u32 = 36;

pub fn basic_layout() -> VertexLayoutDesc {
    VertexLayoutDesc {
        stride: BASIC_STRIDE,
        position: AttributeDesc::new(0, "R32G32B32_SFLOAT"),
        normal: AttributeDesc::new(12, "R32G32B32_SFLOAT"),
        color: AttributeDesc::new(24, "R8G8B8A8_UNORM"),
        tangent: None,
        texcoord: None,
    }
}

pub fn extended_layout() -> VertexLayoutDesc {
    VertexLayoutDesc {
        stride: EXTENDED_STRIDE,
        position: AttributeDesc::new(0, "R32G32B32_SFLOAT"),
        normal: AttributeDesc::new(12, "R32G32B32_SFLOAT"),
        tangent: Some(AttributeDesc::new(24, "R32G32B32A32_SFLOAT")),
        texcoord: Some(AttributeDesc::new(40, "R32G32_SFLOAT")),
        color: AttributeDesc::new(48, "R8G8B8A8_UNORM"),
    }
}

/// Unit cube (36 vertices, positions in [-0.5, 0.5]) with the given stride
pub fn cube_vertices(stride: u32) -> Vec<u8> {
    let mut data = vec![0u8; (CUBE_VERTEX_COUNT * stride) as usize];
    for i in 0..CUBE_VERTEX_COUNT as usize {
        // Alternate between opposite corners so both extremes appear
        let p = if i % 2 == 0 { Vec3::splat(-0.5) } else { Vec3::splat(0.5) };
        let start = i * stride as usize;
        data[start..start + 12].copy_from_slice(bytemuck::cast_slice(&p.to_array()));
    }
    data
}

pub fn basic_cube(name: &str) -> MeshDesc {
    MeshDesc {
        name: name.to_string(),
        vertex_data: cube_vertices(BASIC_STRIDE),
        vertex_count: CUBE_VERTEX_COUNT,
        layout: basic_layout(),
        material: 0,
        shading_id: 0,
        aabb_bias: 0.0,
    }
}

pub fn extended_cube(name: &str, material: u32, shading_id: u32) -> MeshDesc {
    MeshDesc {
        name: name.to_string(),
        vertex_data: cube_vertices(EXTENDED_STRIDE),
        vertex_count: CUBE_VERTEX_COUNT,
        layout: extended_layout(),
        material,
        shading_id,
        aabb_bias: 0.0,
    }
}

pub fn material(name: &str, texture_count: usize) -> MaterialDesc {
    MaterialDesc {
        name: name.to_string(),
        textures: (0..texture_count)
            .map(|i| TextureDesc::solid(&format!("{}_tex{}", name, i), TextureKind::Flat, [128; 4]))
            .collect(),
    }
}

/// Frustum r = t = 0.5, n = 0.1, f = 50
pub fn scenario_frustum() -> CullingFrustum {
    CullingFrustum { half_width: 0.5, half_height: 0.5, near: 0.1, far: 50.0 }
}

pub fn simple_scene(meshes: Vec<MeshDesc>) -> SceneDesc {
    SceneDesc {
        kind: SceneKind::Simple,
        meshes,
        materials: Vec::new(),
        environment: None,
        frustum: scenario_frustum(),
        max_instances: 16,
    }
}

pub fn multi_material_scene(meshes: Vec<MeshDesc>, materials: Vec<MaterialDesc>) -> SceneDesc {
    SceneDesc {
        kind: SceneKind::MultiMaterial,
        meshes,
        materials,
        environment: None,
        frustum: scenario_frustum(),
        max_instances: 16,
    }
}
