use std::{path::PathBuf, sync::Arc};

use cgmath::{Matrix4, Quaternion, Vector3};
use scene_ngin::{
    SceneError,
    data_structures::{
        scene::IDENTITY_ROWS,
        vertex::{BuildOptions, LayoutPolicy},
    },
    render::traverse,
    resources::{ImportFlags, import_scene},
    upload::upload_scene,
};

use crate::common::test_utils::{CountingAllocator, assert_close};

mod common;

fn asset(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(name)
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn gltf_hierarchy_keeps_nodes_and_transforms() {
    let scene = import_scene(&asset("hierarchy.gltf"), ImportFlags::TARGET_REALTIME).unwrap();

    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.nodes.len(), 3);
    let root = scene.root_node();
    assert_eq!(root.name, "root");
    assert!(root.meshes.is_empty());
    let arm = scene.node(root.children[0]);
    assert_eq!(arm.name, "arm");
    let hand = scene.node(arm.children[0]);
    assert_eq!(hand.name, "hand");

    let mesh = &scene.meshes[0];
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    assert_eq!(mesh.tex_coords.as_ref().map(Vec::len), Some(3));
    assert!(mesh.normals.is_some());
    assert!(mesh.tangents.is_some());

    let mut allocator = CountingAllocator::default();
    let handle = upload_scene(
        Arc::new(scene),
        LayoutPolicy::WithUv,
        BuildOptions::default(),
        &mut allocator,
    )
    .ok()
    .unwrap();
    let list = traverse(&handle, Matrix4::from_scale(2.0), true);
    assert_eq!(list.len(), 2);

    let t_arm = Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))
        * Matrix4::from(Quaternion::new(0.7071068, 0.0, 0.7071068, 0.0));
    let t_hand =
        Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0)) * Matrix4::from_scale(0.5);
    assert_close(list.draws[0].transform, Matrix4::from_scale(2.0) * t_arm);
    assert_close(
        list.draws[1].transform,
        Matrix4::from_scale(2.0) * t_arm * t_hand,
    );
}

#[test]
fn flip_uvs_mirrors_v() {
    let plain = import_scene(&asset("hierarchy.gltf"), ImportFlags::TRIANGULATE).unwrap();
    let flipped = import_scene(
        &asset("hierarchy.gltf"),
        ImportFlags::TRIANGULATE | ImportFlags::FLIP_UVS,
    )
    .unwrap();
    let plain_uvs = plain.meshes[0].tex_coords.clone().unwrap();
    let flipped_uvs = flipped.meshes[0].tex_coords.clone().unwrap();
    for (p, f) in plain_uvs.iter().zip(&flipped_uvs) {
        assert_eq!(p[0], f[0]);
        assert!((p[1] - (1.0 - f[1])).abs() < 1e-6);
    }
    assert!(plain.meshes[0].normals.is_none());
}

#[test]
fn obj_cube_is_triangulated_under_one_root() {
    let scene = import_scene(&asset("cube.obj"), ImportFlags::TARGET_REALTIME).unwrap();
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.meshes[0].face_count(), 12);
    assert_eq!(scene.root_node().children.len(), 1);
    assert_eq!(scene.node(scene.root_node().children[0]).name, "cube");

    let mut allocator = CountingAllocator::default();
    let handle = upload_scene(
        Arc::new(scene),
        LayoutPolicy::WithUv,
        BuildOptions::default(),
        &mut allocator,
    )
    .ok()
    .unwrap();
    assert_eq!(handle.mesh(0).index_count, 36);
}

#[test]
fn obj_cube_without_triangulation_is_an_import_error() {
    let result = import_scene(&asset("cube.obj"), ImportFlags::empty());
    assert!(matches!(
        result,
        Err(SceneError::Import { .. })
    ));
}

#[test]
fn several_gltf_roots_hang_under_an_identity_root() {
    let scene = import_scene(&fixture("two_roots.gltf"), ImportFlags::TARGET_REALTIME).unwrap();

    let root = scene.root_node();
    assert_eq!(root.name, "root");
    assert_eq!(root.transform, IDENTITY_ROWS);
    assert!(root.meshes.is_empty());
    let names: Vec<_> = root
        .children
        .iter()
        .map(|&id| scene.node(id).name.as_str())
        .collect();
    assert_eq!(names, ["left", "right"]);

    let left = scene.node(root.children[0]);
    let right = scene.node(root.children[1]);
    assert_close(
        left.local_transform(),
        Matrix4::from_translation(Vector3::new(-1.0, 0.0, 0.0)),
    );
    assert_close(
        right.local_transform(),
        Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)) * Matrix4::from_scale(3.0),
    );
}

#[test]
fn gltf_strips_and_fans_become_triangle_lists() {
    let scene = import_scene(&fixture("two_roots.gltf"), ImportFlags::TRIANGULATE).unwrap();

    assert_eq!(scene.meshes.len(), 2);
    assert_eq!(scene.meshes[0].name, "strip[0]");
    assert_eq!(scene.meshes[0].faces, vec![[0, 1, 2], [2, 1, 3], [2, 3, 4]]);
    assert_eq!(scene.meshes[1].name, "fan[0]");
    assert_eq!(scene.meshes[1].faces, vec![[0, 1, 2], [0, 2, 3]]);
}

#[test]
fn gltf_strips_without_triangulation_are_an_import_error() {
    let result = import_scene(&fixture("two_roots.gltf"), ImportFlags::empty());
    assert!(matches!(result, Err(SceneError::Import { .. })));
}

#[test]
fn gltf_index_past_the_vertices_is_an_import_error() {
    for flags in [ImportFlags::TARGET_REALTIME, ImportFlags::TRIANGULATE] {
        let err = import_scene(&fixture("bad_indices.gltf"), flags).unwrap_err();
        assert!(matches!(err, SceneError::Import { .. }), "{flags:?}: {err}");
        assert!(err.to_string().contains("vertex 7"));
    }
}

#[test]
fn gltf_with_fewer_uvs_than_positions_is_an_import_error() {
    let err = import_scene(&fixture("short_uvs.gltf"), ImportFlags::TARGET_REALTIME).unwrap_err();
    assert!(matches!(err, SceneError::Import { .. }));
    assert!(err.to_string().contains("2 uv entries for 3 vertices"));
}
