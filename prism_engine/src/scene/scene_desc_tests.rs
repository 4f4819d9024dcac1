use crate::graphics_device::{TextureDesc, TextureKind, MAX_MATERIAL_TEXTURES};
use crate::scene::CullingFrustum;
use crate::scene::test_scenes::*;
use crate::scene::SceneKind;

// ============================================================================
// SceneDesc::validate
// ============================================================================

#[test]
fn test_simple_scene_counts_one_material() {
    let scene = simple_scene(vec![basic_cube("a")]);
    assert!(scene.validate().is_ok());
    assert_eq!(scene.material_count(), 1);
}

#[test]
fn test_simple_scene_rejects_several_materials() {
    let mut scene = simple_scene(vec![basic_cube("a")]);
    scene.materials = vec![material("m0", 1), material("m1", 1)];
    assert!(scene.validate().is_err());
}

#[test]
fn test_multi_material_scene_counts_materials() {
    let scene = multi_material_scene(
        vec![extended_cube("a", 0, 0), extended_cube("b", 2, 1)],
        vec![material("m0", 1), material("m1", 0), material("m2", 3)],
    );
    assert!(scene.validate().is_ok());
    assert_eq!(scene.material_count(), 3);
    assert_eq!(scene.kind, SceneKind::MultiMaterial);
}

#[test]
fn test_missing_material_mapping_is_rejected() {
    let scene = multi_material_scene(vec![extended_cube("a", 2, 0)], vec![material("m0", 1)]);
    assert!(scene.validate().unwrap_err().is_validation());
}

#[test]
fn test_multi_material_scene_without_materials_is_rejected() {
    let scene = multi_material_scene(vec![extended_cube("a", 0, 0)], Vec::new());
    assert!(scene.validate().is_err());
}

#[test]
fn test_too_many_textures_is_rejected() {
    let scene = multi_material_scene(
        vec![extended_cube("a", 0, 0)],
        vec![material("m0", MAX_MATERIAL_TEXTURES as usize + 1)],
    );
    assert!(scene.validate().is_err());
}

#[test]
fn test_zero_capacity_is_rejected() {
    let mut scene = simple_scene(vec![basic_cube("a")]);
    scene.max_instances = 0;
    assert!(scene.validate().is_err());
}

#[test]
fn test_bad_mesh_layout_fails_scene_validation() {
    let mut mesh = basic_cube("a");
    mesh.layout.color.format = "B8G8R8A8_UNORM".to_string();
    assert!(simple_scene(vec![mesh]).validate().is_err());
}

#[test]
fn test_empty_mesh_fails_scene_validation() {
    let mut mesh = basic_cube("a");
    mesh.vertex_count = 0;
    assert!(simple_scene(vec![mesh]).validate().is_err());
}

#[test]
fn test_inverted_frustum_fails_scene_validation() {
    let mut scene = simple_scene(vec![basic_cube("a")]);
    scene.frustum = CullingFrustum { half_width: 0.5, half_height: 0.5, near: 10.0, far: 1.0 };
    assert!(scene.validate().unwrap_err().is_validation());

    scene.frustum.near = 0.0;
    scene.frustum.far = 50.0;
    assert!(scene.validate().unwrap_err().is_validation());
}

// ============================================================================
// Texture validation
// ============================================================================

#[test]
fn test_truncated_material_texture_fails_scene_validation() {
    let mut m0 = material("stone", 2);
    m0.textures[0].pixels.truncate(1);
    let scene = multi_material_scene(vec![extended_cube("a", 0, 0)], vec![m0]);
    assert!(scene.validate().unwrap_err().is_validation());
}

#[test]
fn test_zero_extent_texture_fails_scene_validation() {
    let mut m0 = material("stone", 1);
    m0.textures[0].width = 0;
    m0.textures[0].pixels.clear();
    let scene = multi_material_scene(vec![extended_cube("a", 0, 0)], vec![m0]);
    assert!(scene.validate().unwrap_err().is_validation());
}

#[test]
fn test_environment_must_be_square_cube() {
    let mut scene = simple_scene(vec![basic_cube("a")]);
    scene.environment = Some(TextureDesc::solid("sky", TextureKind::Flat, [0; 4]));
    assert!(scene.validate().unwrap_err().is_validation());

    scene.environment = Some(TextureDesc {
        width: 2,
        height: 1,
        kind: TextureKind::Cube,
        pixels: vec![0; 2 * 4 * 6],
        name: "sky".to_string(),
    });
    assert!(scene.validate().unwrap_err().is_validation());

    scene.environment = Some(TextureDesc::solid("sky", TextureKind::Cube, [0; 4]));
    assert!(scene.validate().is_ok());
}
