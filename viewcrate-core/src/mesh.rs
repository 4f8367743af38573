//! Mesh data structures and functionality

use std::borrow::Cow;

use crate::point::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices, faces and optional per-vertex normals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Check that every face indexes an existing vertex
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        if let Some((i, face)) = self
            .faces
            .iter()
            .enumerate()
            .find(|(_, face)| face.iter().any(|&v| v >= n))
        {
            return Err(Error::InvalidData(format!(
                "face {} {:?} references a vertex outside 0..{}",
                i, face, n
            )));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != n {
                return Err(Error::InvalidData(format!(
                    "mesh has {} normals for {} vertices",
                    normals.len(),
                    n
                )));
            }
        }
        Ok(())
    }

    /// Area-weighted vertex normals computed from the faces.
    ///
    /// Vertices not referenced by any face get a +z normal.
    pub fn calculate_vertex_normals(&self) -> Vec<Vector3f> {
        let mut normals = vec![Vector3f::zeros(); self.vertices.len()];
        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];
            // unnormalized cross product carries twice the face area
            let weighted = (v1 - v0).cross(&(v2 - v0));
            for &i in face {
                normals[i] += weighted;
            }
        }
        normals
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::z))
            .collect()
    }

    /// Compute and store vertex normals
    pub fn compute_vertex_normals(&mut self) {
        self.normals = Some(self.calculate_vertex_normals());
    }

    /// Stored vertex normals, or freshly computed ones when the mesh has none
    pub fn vertex_normals(&self) -> Cow<'_, [Vector3f]> {
        match &self.normals {
            Some(normals) => Cow::Borrowed(normals.as_slice()),
            None => Cow::Owned(self.calculate_vertex_normals()),
        }
    }

    /// Store per-vertex normals, one per vertex
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) -> Result<()> {
        if normals.len() != self.vertices.len() {
            return Err(Error::InvalidData(format!(
                "got {} normals for {} vertices",
                normals.len(),
                self.vertices.len()
            )));
        }
        self.normals = Some(normals);
        Ok(())
    }

    /// Axis-aligned bounding box as (min, max)
    pub fn bounding_box(&self) -> (Point3f, Point3f) {
        if self.vertices.is_empty() {
            return (Point3f::origin(), Point3f::origin());
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for vertex in &self.vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }

    /// Center of the bounding box
    pub fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_vertex_normals_of_flat_square() {
        let mesh = unit_square();
        let normals = mesh.calculate_vertex_normals();
        assert_eq!(normals.len(), 4);
        for n in normals {
            assert_relative_eq!(n, Vector3f::z(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_vertex_normals_computed_on_demand() {
        let mut mesh = unit_square();
        assert!(matches!(mesh.vertex_normals(), Cow::Owned(_)));
        mesh.compute_vertex_normals();
        assert!(matches!(mesh.vertex_normals(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_set_normals_requires_one_per_vertex() {
        let mut mesh = unit_square();
        assert!(matches!(
            mesh.set_normals(vec![Vector3f::z(); 3]),
            Err(Error::InvalidData(_))
        ));
        assert!(mesh.normals.is_none());

        mesh.set_normals(vec![-Vector3f::z(); 4]).unwrap();
        assert_eq!(mesh.vertex_normals()[2], -Vector3f::z());
    }

    #[test]
    fn test_validate_rejects_out_of_range_face() {
        let mut mesh = unit_square();
        assert!(mesh.validate().is_ok());
        mesh.add_face([0, 1, 7]);
        assert!(matches!(mesh.validate(), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_bounding_box_and_center() {
        let mesh = unit_square();
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3f::new(1.0, 1.0, 0.0));
        assert_relative_eq!(mesh.center(), Point3f::new(0.5, 0.5, 0.0));
    }
}
