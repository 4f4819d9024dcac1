//! Scene module
//!
//! Load-time scene description, mesh records, bounding volumes and the
//! view-frustum culling test.

mod aabb;
mod frustum;
mod vertex_layout;
mod scene_desc;
mod mesh_record;

#[cfg(test)]
pub(crate) mod test_scenes;

pub use aabb::Aabb;
pub use frustum::{
    CullingFrustum, PLANE_BOTTOM, PLANE_FAR, PLANE_LEFT, PLANE_NEAR, PLANE_RIGHT, PLANE_TOP,
};
pub use vertex_layout::{AttributeDesc, VertexLayoutDesc, VertexLayoutKind};
pub use scene_desc::{MaterialDesc, MeshDesc, SceneDesc, SceneInstance, SceneKind};
pub use mesh_record::MeshRecord;

#[cfg(test)]
#[path = "scene_desc_tests.rs"]
mod scene_desc_tests;
