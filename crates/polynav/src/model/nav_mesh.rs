use polynav_common::{Error, LineSegment3, Result};
use serde::{Deserialize, Serialize};

use super::{NavPolygon, NavTriangle, NavTriangleRef};

/// Immutable navigation mesh published by the generator.
///
/// `update_id` grows strictly with each generation so readers holding an
/// older `Arc<NavMesh>` can detect that a newer mesh exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavMesh {
    update_id: u64,
    polygons: Vec<NavPolygon>,
}

impl NavMesh {
    /// Builds a mesh from polygons whose standard links are already relative
    /// to their index in `polygons`
    pub fn new(update_id: u64, polygons: Vec<NavPolygon>) -> Self {
        Self {
            update_id,
            polygons,
        }
    }

    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    pub fn polygons(&self) -> &[NavPolygon] {
        &self.polygons
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.polygons.iter().map(|p| p.triangles().len()).sum()
    }

    pub fn polygon(&self, polygon_index: usize) -> Option<&NavPolygon> {
        self.polygons.get(polygon_index)
    }

    pub fn triangle(&self, triangle_ref: NavTriangleRef) -> Option<&NavTriangle> {
        self.polygons
            .get(triangle_ref.polygon_index)?
            .triangle(triangle_ref.triangle_index)
    }

    /// Resolves a reference to its polygon and triangle
    pub fn resolve_triangle(&self, triangle_ref: NavTriangleRef) -> Option<(&NavPolygon, &NavTriangle)> {
        let polygon = self.polygons.get(triangle_ref.polygon_index)?;
        let triangle = polygon.triangle(triangle_ref.triangle_index)?;
        Some((polygon, triangle))
    }

    pub fn resolve_edge(&self, triangle_ref: NavTriangleRef, edge_index: usize) -> Option<LineSegment3> {
        if edge_index > 2 {
            return None;
        }
        let polygon = self.polygons.get(triangle_ref.polygon_index)?;
        polygon.triangle(triangle_ref.triangle_index)?;
        Some(polygon.compute_edge(triangle_ref.triangle_index, edge_index))
    }

    /// Iterates over all triangle references of the mesh
    pub fn triangle_refs(&self) -> impl Iterator<Item = NavTriangleRef> + '_ {
        self.polygons
            .iter()
            .enumerate()
            .flat_map(|(polygon_index, polygon)| {
                (0..polygon.triangles().len())
                    .map(move |triangle_index| NavTriangleRef::new(polygon_index, triangle_index))
            })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let nav_mesh: NavMesh =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        nav_mesh.check_links()?;
        Ok(nav_mesh)
    }

    pub fn save_to_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn check_links(&self) -> Result<()> {
        for triangle_ref in self.triangle_refs() {
            let Some(triangle) = self.triangle(triangle_ref) else {
                continue;
            };
            for link in triangle.links() {
                if self.triangle(link.target()).is_none() {
                    return Err(Error::Serialization(format!(
                        "link of triangle {:?} targets unknown triangle {:?}",
                        triangle_ref,
                        link.target()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn square_mesh() -> NavMesh {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];
        let mut t0 = NavTriangle::new(0, 2, 3);
        let mut t1 = NavTriangle::new(1, 2, 0);
        t0.add_standard_link(0, NavTriangleRef::new(0, 1));
        t1.add_standard_link(1, NavTriangleRef::new(0, 0));
        NavMesh::new(4, vec![NavPolygon::new("ground", points, vec![t0, t1])])
    }

    #[test]
    fn test_resolve() {
        let nav_mesh = square_mesh();
        assert_eq!(nav_mesh.update_id(), 4);
        assert_eq!(nav_mesh.triangle_count(), 2);
        assert!(nav_mesh.resolve_triangle(NavTriangleRef::new(0, 1)).is_some());
        assert!(nav_mesh.resolve_triangle(NavTriangleRef::new(1, 0)).is_none());
        assert!(nav_mesh.resolve_edge(NavTriangleRef::new(0, 0), 3).is_none());

        let edge = nav_mesh.resolve_edge(NavTriangleRef::new(0, 1), 1).unwrap();
        assert_eq!(edge.a, Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(edge.b, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(nav_mesh.triangle_refs().count(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let nav_mesh = square_mesh();
        let json = nav_mesh.to_json().unwrap();
        let loaded = NavMesh::from_json(&json).unwrap();
        assert_eq!(loaded, nav_mesh);
    }

    #[test]
    fn test_json_file_round_trip() {
        use tempfile::NamedTempFile;

        let nav_mesh = square_mesh();
        let json_file = NamedTempFile::new().unwrap();
        nav_mesh.save_to_json(json_file.path()).unwrap();

        let loaded = NavMesh::load_from_json(json_file.path()).unwrap();
        assert_eq!(loaded, nav_mesh);
        assert!(matches!(
            NavMesh::load_from_json(json_file.path().with_extension("missing")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_json_rejects_dangling_link() {
        let mut t0 = NavTriangle::new(0, 1, 2);
        t0.add_standard_link(0, NavTriangleRef::new(0, 9));
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::NEG_Z];
        let nav_mesh = NavMesh::new(1, vec![NavPolygon::new("broken", points, vec![t0])]);

        let json = nav_mesh.to_json().unwrap();
        assert!(matches!(
            NavMesh::from_json(&json),
            Err(Error::Serialization(_))
        ));
        assert!(NavMesh::from_json("{").is_err());
    }
}
