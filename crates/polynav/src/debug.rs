//! Top view SVG drawing of navigation data

use glam::Vec2;
use polynav_common::debug::{Color, SvgExporter};
use polynav_common::to_top_view;

use crate::{CSGPolygon, NavLinkType, NavMesh};

/// Colors used when drawing navigation meshes
#[derive(Debug, Clone, Copy)]
pub struct NavMeshColors;

impl NavMeshColors {
    pub const TRIANGLE: Color = Color::rgb(0.0, 0.75, 1.0);
    pub const EDGE: Color = Color::rgb(0.0, 0.2, 0.4);
    pub const JOIN_LINK: Color = Color::GREEN;
    pub const JUMP_LINK: Color = Color::ORANGE;
    pub const CSG_POLYGON: Color = Color::GRAY;
}

/// Types which can be drawn into a [`SvgExporter`]
pub trait SvgVisualize {
    fn draw_svg(&self, exporter: &mut SvgExporter);
}

impl SvgVisualize for NavMesh {
    fn draw_svg(&self, exporter: &mut SvgExporter) {
        for polygon in self.polygons() {
            for triangle in polygon.triangles() {
                let points: Vec<Vec2> = triangle
                    .indices()
                    .iter()
                    .map(|&index| to_top_view(polygon.point(index)))
                    .collect();
                exporter.add_polygon(&points, NavMeshColors::TRIANGLE.with_alpha(0.4), NavMeshColors::EDGE);
            }
        }

        // cross polygon links, drawn from the middle of the source edge to the target triangle
        for triangle_ref in self.triangle_refs() {
            let Some((_, triangle)) = self.resolve_triangle(triangle_ref) else {
                continue;
            };
            for link in triangle.links() {
                let color = match link.link_type() {
                    NavLinkType::Standard => continue,
                    NavLinkType::JoinPolygons => NavMeshColors::JOIN_LINK,
                    NavLinkType::Jump => NavMeshColors::JUMP_LINK,
                };
                let (Some(edge), Some(target)) = (
                    self.resolve_edge(triangle_ref, link.source_edge_index()),
                    self.triangle(link.target()),
                ) else {
                    continue;
                };
                let start = match link.constraint() {
                    Some(constraint) => constraint.clip(&edge).middle(),
                    None => edge.middle(),
                };
                exporter.add_line(to_top_view(start), to_top_view(target.center_point()), color);
            }
        }
    }
}

impl SvgVisualize for CSGPolygon {
    fn draw_svg(&self, exporter: &mut SvgExporter) {
        if self.is_empty() {
            return;
        }
        exporter.add_polygon(
            self.cw_points(),
            NavMeshColors::CSG_POLYGON.with_alpha(0.2),
            NavMeshColors::CSG_POLYGON,
        );
    }
}

/// Exporter holding the whole navigation mesh
pub fn nav_mesh_to_svg(nav_mesh: &NavMesh) -> SvgExporter {
    let mut exporter = SvgExporter::new();
    nav_mesh.draw_svg(&mut exporter);
    exporter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NavLinkConstraint, NavPolygon, NavTriangle, NavTriangleRef};
    use glam::Vec3;
    use polynav_common::debug::SvgShape;

    fn square(name: &str, polygon_index: usize, origin: Vec3) -> NavPolygon {
        let points = vec![
            origin,
            origin + Vec3::new(1.0, 0.0, 0.0),
            origin + Vec3::new(1.0, 0.0, -1.0),
            origin + Vec3::new(0.0, 0.0, -1.0),
        ];
        let mut first = NavTriangle::new(0, 1, 2);
        first.add_standard_link(2, NavTriangleRef::new(polygon_index, 1));
        let mut second = NavTriangle::new(0, 2, 3);
        second.add_standard_link(0, NavTriangleRef::new(polygon_index, 0));
        NavPolygon::new(name, points, vec![first, second])
    }

    #[test]
    fn test_nav_mesh_triangles_and_links() {
        let left = square("left", 0, Vec3::ZERO);
        let mut right = square("right", 1, Vec3::new(3.0, 0.0, 0.0));
        let mut triangles = right.triangles().to_vec();
        triangles[1].add_jump_link(2, NavTriangleRef::new(0, 0), NavLinkConstraint::new(1.0, 0.0, 1));
        right = NavPolygon::new(right.name().to_string(), right.points().to_vec(), triangles);
        let nav_mesh = NavMesh::new(1, vec![left, right]);

        let exporter = nav_mesh_to_svg(&nav_mesh);

        let polygons = exporter
            .shapes()
            .iter()
            .filter(|shape| matches!(shape, SvgShape::Polygon { .. }))
            .count();
        let jump_lines: Vec<_> = exporter
            .shapes()
            .iter()
            .filter(|shape| matches!(shape, SvgShape::Line { color, .. } if *color == NavMeshColors::JUMP_LINK))
            .collect();
        assert_eq!(polygons, 4);
        assert_eq!(jump_lines.len(), 1);
    }

    #[test]
    fn test_empty_csg_polygon_draws_nothing() {
        let mut exporter = SvgExporter::new();
        CSGPolygon::new("empty", Vec::new()).draw_svg(&mut exporter);
        assert!(exporter.shapes().is_empty());

        let square = CSGPolygon::new(
            "square",
            vec![Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)],
        );
        square.draw_svg(&mut exporter);
        assert_eq!(exporter.shapes().len(), 1);
    }
}
