use glam::Vec3;
use tracing::warn;

use crate::error::NodeError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// Indexed triangle mesh as handed between nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positions_indices(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
            uvs: None,
        }
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.positions.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Point normals, when present for every position.
    pub fn point_normals(&self) -> Option<&[[f32; 3]]> {
        let normals = self.normals.as_deref()?;
        if normals.len() != self.positions.len() {
            warn!(
                normals = normals.len(),
                points = self.positions.len(),
                "dropping normals that do not match point count"
            );
            return None;
        }
        Some(normals)
    }

    /// Point UVs, when present for every position.
    pub fn point_uvs(&self) -> Option<&[[f32; 2]]> {
        let uvs = self.uvs.as_deref()?;
        if uvs.len() != self.positions.len() {
            warn!(
                uvs = uvs.len(),
                points = self.positions.len(),
                "dropping uvs that do not match point count"
            );
            return None;
        }
        Some(uvs)
    }

    /// Validated triangle list. A mesh without indices is read as a
    /// triangle soup.
    pub fn triangles(&self) -> Result<Vec<[u32; 3]>, NodeError> {
        if self.positions.is_empty() {
            return Err(NodeError::invalid_input("mesh has no vertices"));
        }
        if self.indices.is_empty() {
            if !self.positions.len().is_multiple_of(3) {
                return Err(NodeError::invalid_input(
                    "mesh has no indices and a non-triangular vertex count",
                ));
            }
            let count = self.positions.len() as u32;
            return Ok((0..count)
                .step_by(3)
                .map(|base| [base, base + 1, base + 2])
                .collect());
        }
        if !self.indices.len().is_multiple_of(3) {
            return Err(NodeError::invalid_input(format!(
                "mesh index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let vertex_count = self.positions.len();
        if let Some(bad) = self.indices.iter().find(|idx| **idx as usize >= vertex_count) {
            return Err(NodeError::invalid_input(format!(
                "mesh index {bad} out of range for {vertex_count} vertices"
            )));
        }
        Ok(self
            .indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect())
    }

    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.positions.iter();
        let first = iter.next()?;
        let mut min = *first;
        let mut max = *first;

        for p in iter {
            min[0] = min[0].min(p[0]);
            min[1] = min[1].min(p[1]);
            min[2] = min[2].min(p[2]);
            max[0] = max[0].max(p[0]);
            max[1] = max[1].max(p[1]);
            max[2] = max[2].max(p[2]);
        }

        Some(Aabb { min, max })
    }

    pub fn compute_normals(&mut self) -> bool {
        if !self.indices.len().is_multiple_of(3) || self.positions.is_empty() {
            return false;
        }

        let mut accum = vec![Vec3::ZERO; self.positions.len()];

        for tri in self.indices.chunks_exact(3) {
            let i0 = tri[0] as usize;
            let i1 = tri[1] as usize;
            let i2 = tri[2] as usize;
            if i0 >= self.positions.len()
                || i1 >= self.positions.len()
                || i2 >= self.positions.len()
            {
                continue;
            }

            let normal = face_normal(self.positions[i0], self.positions[i1], self.positions[i2]);
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }

        let normals = accum
            .into_iter()
            .map(|n| {
                let len = n.length();
                if len > 0.0 {
                    (n / len).to_array()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();

        self.normals = Some(normals);
        true
    }
}

/// Unnormalized face normal of a counter-clockwise triangle.
pub fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Vec3 {
    let p0 = Vec3::from(a);
    let p1 = Vec3::from(b);
    let p2 = Vec3::from(c);
    (p1 - p0).cross(p2 - p0)
}

pub fn make_box(size: [f32; 3]) -> Mesh {
    let hx = size[0] * 0.5;
    let hy = size[1] * 0.5;
    let hz = size[2] * 0.5;

    let positions = vec![
        [-hx, -hy, -hz],
        [hx, -hy, -hz],
        [hx, hy, -hz],
        [-hx, hy, -hz],
        [-hx, -hy, hz],
        [hx, -hy, hz],
        [hx, hy, hz],
        [-hx, hy, hz],
    ];

    let indices = vec![
        0, 2, 1, 0, 3, 2, // -Z
        4, 5, 6, 4, 6, 7, // +Z
        0, 1, 5, 0, 5, 4, // -Y
        2, 3, 7, 2, 7, 6, // +Y
        1, 2, 6, 1, 6, 5, // +X
        3, 0, 4, 3, 4, 7, // -X
    ];

    let mut mesh = Mesh::with_positions_indices(positions, indices);
    mesh.compute_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_for_simple_points() {
        let mesh =
            Mesh::with_positions_indices(vec![[1.0, -2.0, 0.5], [-3.0, 4.0, 2.0]], vec![0, 1, 0]);
        let bounds = mesh.bounds().expect("bounds");
        assert_eq!(bounds.min, [-3.0, -2.0, 0.5]);
        assert_eq!(bounds.max, [1.0, 4.0, 2.0]);
    }

    #[test]
    fn normals_for_triangle() {
        let mut mesh = Mesh::with_positions_indices(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        );
        assert!(mesh.compute_normals());
        let normals = mesh.normals.expect("normals");
        for n in normals {
            assert!((n[2] - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn box_has_expected_counts() {
        let mesh = make_box([2.0, 2.0, 2.0]);
        assert_eq!(mesh.positions.len(), 8);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.point_normals().map(|n| n.len()), Some(8));
    }

    #[test]
    fn unindexed_mesh_reads_as_soup() {
        let mesh = Mesh::with_positions_indices(vec![[0.0; 3]; 6], Vec::new());
        assert_eq!(mesh.triangles().unwrap(), vec![[0, 1, 2], [3, 4, 5]]);
    }

    #[test]
    fn triangles_reject_bad_topology() {
        let empty = Mesh::new();
        assert!(empty.triangles().is_err());

        let ragged = Mesh::with_positions_indices(vec![[0.0; 3]; 3], vec![0, 1]);
        assert!(ragged.triangles().is_err());

        let out_of_range = Mesh::with_positions_indices(vec![[0.0; 3]; 3], vec![0, 1, 3]);
        assert!(matches!(
            out_of_range.triangles(),
            Err(NodeError::InvalidInput(msg)) if msg.contains("out of range")
        ));
    }

    #[test]
    fn mismatched_attributes_are_ignored() {
        let mut mesh = make_box([1.0, 1.0, 1.0]);
        mesh.uvs = Some(vec![[0.0, 0.0]; 3]);
        assert!(mesh.point_uvs().is_none());
    }
}
