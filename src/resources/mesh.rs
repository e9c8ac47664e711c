use rand::Rng;

use crate::{
    data_structures::{
        scene::Mesh,
        vertex::{BuildOptions, ReservedFill, VertexLayout},
    },
    error::{Attribute, Result, SceneError},
};

/**
 * CPU-side vertex and index data for one mesh, interleaved according to `layout`
 * and ready to be copied into GPU buffers.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub layout: VertexLayout,
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.floats_per_vertex()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/**
 * Interleaves `mesh` into the vertex format described by `layout`.
 *
 * Positions are copied verbatim. The reserved slot is zeroed or filled with a
 * random debug color, and UVs come from texture channel 0. Faces are written in
 * the configured winding order.
 *
 * `mesh_index` only serves the error messages.
 */
pub fn build_mesh_buffers(
    mesh_index: usize,
    mesh: &Mesh,
    layout: &VertexLayout,
    options: &BuildOptions,
) -> Result<MeshBuffers> {
    if mesh.positions.is_empty() && !mesh.faces.is_empty() {
        return Err(SceneError::MissingAttribute {
            mesh: mesh_index,
            attribute: Attribute::Position,
        });
    }
    let vertex_count = mesh.vertex_count();
    let tex_coords = if layout.has_uv() {
        match &mesh.tex_coords {
            Some(uvs) if uvs.len() == vertex_count => Some(uvs),
            _ => {
                return Err(SceneError::MissingAttribute {
                    mesh: mesh_index,
                    attribute: Attribute::TexCoord0,
                });
            }
        }
    } else {
        None
    };

    let mut rng = rand::rng();
    let mut vertices = Vec::with_capacity(vertex_count * layout.floats_per_vertex());
    for (i, position) in mesh.positions.iter().enumerate() {
        vertices.extend_from_slice(position);
        if layout.has_reserved() {
            match options.reserved {
                ReservedFill::Zeroed => vertices.extend_from_slice(&[0.0; 3]),
                ReservedFill::RandomColor => {
                    vertices.extend_from_slice(&[rng.random(), rng.random(), rng.random()])
                }
            }
        }
        if let Some(uvs) = tex_coords {
            vertices.extend_from_slice(&uvs[i]);
        }
    }

    let mut indices = Vec::with_capacity(mesh.face_count() * 3);
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(SceneError::FaceIndexOutOfRange {
                mesh: mesh_index,
                face: face_index,
                index,
                vertex_count,
            });
        }
        indices.extend_from_slice(&options.winding.apply(*face));
    }

    Ok(MeshBuffers {
        vertices,
        indices,
        layout: layout.clone(),
    })
}

/**
 * Area-weighted smooth normals: every face normal is added to its three vertices
 * and the sums are normalized. Faces must already be in range.
 */
pub(crate) fn smooth_normals(positions: &[[f32; 3]], faces: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for face in faces {
        let [p0, p1, p2] = face.map(|i| cgmath::Vector3::from(positions[i as usize]));
        let face_normal = (p1 - p0).cross(p2 - p0);
        for &i in face {
            normals[i as usize] += face_normal;
        }
    }
    normals
        .into_iter()
        .map(|n| {
            use cgmath::InnerSpace;
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0; 3]
            }
        })
        .collect()
}

/**
 * Per-vertex tangents from positions and UVs.
 *
 * Each triangle contributes the tangent solving
 *     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
 *     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
 * to its three vertices, and the contributions are averaged. Faces and UVs must
 * already match the positions, see `resources::check_attributes`.
 */
pub(crate) fn tangents(
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    faces: &[[u32; 3]],
) -> Vec<[f32; 3]> {
    let mut tangents = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    let mut triangles_included = vec![0u32; positions.len()];

    for c in faces {
        let [i0, i1, i2] = c.map(|i| i as usize);
        let pos0: cgmath::Vector3<_> = positions[i0].into();
        let pos1: cgmath::Vector3<_> = positions[i1].into();
        let pos2: cgmath::Vector3<_> = positions[i2].into();

        let uv0: cgmath::Vector2<_> = tex_coords[i0].into();
        let uv1: cgmath::Vector2<_> = tex_coords[i1].into();
        let uv2: cgmath::Vector2<_> = tex_coords[i2].into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            // degenerate uv mapping
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            triangles_included[i] += 1;
        }
    }

    tangents
        .into_iter()
        .zip(triangles_included)
        .map(|(t, n)| if n == 0 { [0.0; 3] } else { (t / n as f32).into() })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::data_structures::vertex::{LayoutPolicy, WindingOrder};

    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            "quad",
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .with_tex_coords(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
    }

    #[test]
    fn uv_layout_interleaves_position_reserved_uv() {
        let buffers = build_mesh_buffers(
            0,
            &quad(),
            &LayoutPolicy::WithUv.layout(),
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(buffers.vertices.len(), 4 * 8);
        assert_eq!(
            &buffers.vertices[8..16],
            &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(buffers.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(buffers.vertex_count(), 4);
    }

    #[test]
    fn positions_are_not_scaled() {
        let mut mesh = quad();
        mesh.positions[2] = [4.0, -6.0, 8.0];
        let buffers = build_mesh_buffers(
            0,
            &mesh,
            &LayoutPolicy::WithColor.layout(),
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(&buffers.vertices[12..15], &[4.0, -6.0, 8.0]);
    }

    #[test]
    fn reversed_winding_flips_each_face() {
        let options = BuildOptions {
            winding: WindingOrder::Reversed,
            ..Default::default()
        };
        let buffers =
            build_mesh_buffers(0, &quad(), &LayoutPolicy::WithColor.layout(), &options).unwrap();
        assert_eq!(buffers.indices, vec![2, 1, 0, 3, 2, 0]);
    }

    #[test]
    fn random_colors_stay_in_unit_range() {
        let options = BuildOptions {
            reserved: ReservedFill::RandomColor,
            ..Default::default()
        };
        let buffers =
            build_mesh_buffers(0, &quad(), &LayoutPolicy::WithColor.layout(), &options).unwrap();
        for vertex in buffers.vertices.chunks(6) {
            assert!(vertex[3..].iter().all(|c| (0.0..1.0).contains(c)));
        }
    }

    #[test]
    fn uv_count_mismatch_is_a_missing_attribute() {
        let mut mesh = quad();
        mesh.tex_coords.as_mut().unwrap().pop();
        let err = build_mesh_buffers(
            7,
            &mesh,
            &LayoutPolicy::WithUv.layout(),
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SceneError::MissingAttribute {
                mesh: 7,
                attribute: Attribute::TexCoord0
            }
        ));
    }

    #[test]
    fn face_past_vertex_count_is_rejected() {
        let mut mesh = quad();
        mesh.faces.push([0, 3, 4]);
        let err = build_mesh_buffers(
            2,
            &mesh,
            &LayoutPolicy::WithColor.layout(),
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SceneError::FaceIndexOutOfRange {
                mesh: 2,
                face: 2,
                index: 4,
                vertex_count: 4
            }
        ));
    }

    #[test]
    fn flat_quad_normals_point_up_z() {
        let mesh = quad();
        let normals = smooth_normals(&mesh.positions, &mesh.faces);
        assert!(normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn tangents_follow_u_direction() {
        let mesh = quad();
        let t = tangents(&mesh.positions, mesh.tex_coords.as_ref().unwrap(), &mesh.faces);
        assert!(t.iter().all(|t| *t == [1.0, 0.0, 0.0]));
    }
}
