use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use glam::{Vec2, Vec3};
use polynav::{NavLink, NavLinkConstraint, NavLinkType, NavMesh, NavPolygon, NavTriangle, NavTriangleRef};
use polynav_common::{Error, LineSegment3, Result};

use crate::{FunnelAlgorithm, PathPoint, PathPortal};

/// Tolerance of the side test locating points on triangle edges
const ON_EDGE_EPSILON: f32 = 1e-5;

/// Node of the search tree, stored in an arena
#[derive(Debug, Clone)]
struct PathNode {
    triangle: NavTriangleRef,
    /// Cost from the start point to `entry_point`
    g_score: f32,
    h_score: f32,
    /// Point where the path enters the triangle
    entry_point: Vec3,
    /// Parent node index and link taken from the parent triangle
    previous: Option<(usize, NavLink)>,
}

impl PathNode {
    fn f_score(&self) -> f32 {
        self.g_score + self.h_score
    }
}

/// Entry of the open list: lowest f score first, oldest first on ties
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f_score: f32,
    sequence: u64,
    node_index: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed for a min-heap
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// A* search over the triangles of a navigation mesh followed by funnel
/// smoothing of the crossed portals
#[derive(Debug, Clone)]
pub struct PathfindingAStar {
    nav_mesh: Arc<NavMesh>,
    jump_penalty: f32,
}

impl PathfindingAStar {
    pub fn new(nav_mesh: Arc<NavMesh>, jump_penalty: f32) -> Self {
        Self {
            nav_mesh,
            jump_penalty,
        }
    }

    pub fn nav_mesh(&self) -> &Arc<NavMesh> {
        &self.nav_mesh
    }

    /// Path from `start_point` to `end_point`.
    ///
    /// Fails when one of the points is not above or below a triangle of the
    /// mesh, or when no sequence of links joins them.
    pub fn find_path(&self, start_point: Vec3, end_point: Vec3) -> Result<Vec<PathPoint>> {
        let corridors = self.find_corridors(start_point, end_point)?;

        let mut path = Vec::new();
        for mut portals in corridors {
            append_corridor_path(&mut path, &mut portals);
        }
        Ok(path)
    }

    /// Portals crossed by the path, one corridor per jump plus one. Each
    /// corridor starts and ends with a degenerate portal.
    pub fn find_corridors(&self, start_point: Vec3, end_point: Vec3) -> Result<Vec<Vec<PathPortal>>> {
        let (nodes, end_index) = self.search(start_point, end_point)?;
        self.compute_corridors(&nodes, end_index, start_point, end_point)
    }

    /// Search tree and index of the node reaching the end triangle
    fn search(&self, start_point: Vec3, end_point: Vec3) -> Result<(Vec<PathNode>, usize)> {
        let start_triangle = self.find_triangle(start_point)?;
        let end_triangle = self.find_triangle(end_point)?;

        let mut nodes = vec![PathNode {
            triangle: start_triangle,
            g_score: 0.0,
            h_score: self.compute_h_score(start_triangle, end_point)?,
            entry_point: start_point,
            previous: None,
        }];
        let mut open_list = BinaryHeap::new();
        open_list.push(OpenNode {
            f_score: nodes[0].f_score(),
            sequence: 0,
            node_index: 0,
        });
        let mut sequence = 1;
        let mut best_open_nodes: HashMap<NavTriangleRef, usize> = HashMap::new();
        let mut closed_list: HashSet<NavTriangleRef> = HashSet::new();

        while let Some(open_node) = open_list.pop() {
            let current_index = open_node.node_index;
            let current_triangle = nodes[current_index].triangle;
            if !closed_list.insert(current_triangle) {
                continue;
            }

            if current_triangle == end_triangle {
                log::trace!(
                    "Path found after visiting {} triangles of navigation mesh {}",
                    closed_list.len(),
                    self.nav_mesh.update_id()
                );
                return Ok((nodes, current_index));
            }

            let (polygon, triangle) = self.resolve_triangle(current_triangle)?;
            for link in triangle.links() {
                let target = link.target();
                if closed_list.contains(&target) {
                    continue;
                }

                let source_edge = polygon.compute_edge(current_triangle.triangle_index, link.source_edge_index());
                let entry_point = link_crossing_point(link, &source_edge)?;
                let mut g_score = nodes[current_index].g_score + nodes[current_index].entry_point.distance(entry_point);
                if link.link_type() == NavLinkType::Jump {
                    g_score += self.jump_penalty;
                }

                if let Some(&existing_index) = best_open_nodes.get(&target) {
                    if nodes[existing_index].g_score <= g_score {
                        continue;
                    }
                }

                let node_index = nodes.len();
                nodes.push(PathNode {
                    triangle: target,
                    g_score,
                    h_score: self.compute_h_score(target, end_point)?,
                    entry_point,
                    previous: Some((current_index, *link)),
                });
                best_open_nodes.insert(target, node_index);
                open_list.push(OpenNode {
                    f_score: nodes[node_index].f_score(),
                    sequence,
                    node_index,
                });
                sequence += 1;
            }
        }

        Err(Error::Pathfinding(format!(
            "no path from {start_point:?} to {end_point:?}"
        )))
    }

    /// Triangle containing the point once projected on the XZ plane
    pub fn find_triangle(&self, point: Vec3) -> Result<NavTriangleRef> {
        let flatten_point = Vec2::new(point.x, point.z);
        for (polygon_index, polygon) in self.nav_mesh.polygons().iter().enumerate() {
            for (triangle_index, triangle) in polygon.triangles().iter().enumerate() {
                if is_point_inside_triangle(flatten_point, polygon, triangle) {
                    return Ok(NavTriangleRef::new(polygon_index, triangle_index));
                }
            }
        }
        Err(Error::Pathfinding(format!("point outside navmesh: {point:?}")))
    }

    fn resolve_triangle(&self, triangle_ref: NavTriangleRef) -> Result<(&NavPolygon, &NavTriangle)> {
        self.nav_mesh
            .resolve_triangle(triangle_ref)
            .ok_or_else(|| Error::Configuration(format!("invalid triangle reference: {triangle_ref:?}")))
    }

    fn resolve_edge(&self, triangle_ref: NavTriangleRef, edge_index: usize) -> Result<LineSegment3> {
        self.nav_mesh.resolve_edge(triangle_ref, edge_index).ok_or_else(|| {
            Error::Configuration(format!("invalid edge reference: {triangle_ref:?} edge {edge_index}"))
        })
    }

    fn compute_h_score(&self, triangle_ref: NavTriangleRef, end_point: Vec3) -> Result<f32> {
        let (_, triangle) = self.resolve_triangle(triangle_ref)?;
        Ok(triangle.center_point().distance(end_point))
    }

    /// Builds the portals crossed from the start node to `end_index`. A jump
    /// closes the current corridor: the next one starts from the landing
    /// point.
    fn compute_corridors(
        &self,
        nodes: &[PathNode],
        end_index: usize,
        start_point: Vec3,
        end_point: Vec3,
    ) -> Result<Vec<Vec<PathPortal>>> {
        let mut crossings: Vec<(NavTriangleRef, NavLink)> = Vec::new();
        let mut node = &nodes[end_index];
        while let Some((previous_index, link)) = node.previous {
            node = &nodes[previous_index];
            crossings.push((node.triangle, link));
        }
        crossings.reverse();

        let mut corridors = Vec::new();
        let mut portals = vec![PathPortal::from_point(start_point)];
        for (source_triangle, link) in crossings {
            let source_edge = self.resolve_edge(source_triangle, link.source_edge_index())?;
            match link.link_type() {
                NavLinkType::Standard => {
                    portals.push(PathPortal::new(LineSegment3::new(source_edge.b, source_edge.a)));
                }
                NavLinkType::JoinPolygons => {
                    let clipped_edge = link_constraint(&link)?.clip(&source_edge);
                    portals.push(PathPortal::new(LineSegment3::new(clipped_edge.b, clipped_edge.a)));
                }
                NavLinkType::Jump => {
                    let constraint = link_constraint(&link)?;
                    let takeoff_point = source_edge.point_at(constraint.clamp_ratio(0.5));
                    portals.push(PathPortal::jump_from(takeoff_point));
                    corridors.push(std::mem::take(&mut portals));

                    let target_edge = self.resolve_edge(link.target(), constraint.target_edge_index())?;
                    let landing_point = target_edge.closest_point(takeoff_point);
                    portals = vec![PathPortal::from_point(landing_point)];
                }
            }
        }
        portals.push(PathPortal::from_point(end_point));
        corridors.push(portals);

        Ok(corridors)
    }
}

fn link_constraint(link: &NavLink) -> Result<&NavLinkConstraint> {
    link.constraint().ok_or_else(|| {
        Error::Configuration(format!("{:?} link without constraint", link.link_type()))
    })
}

/// Point used to measure the cost of crossing a link
fn link_crossing_point(link: &NavLink, source_edge: &LineSegment3) -> Result<Vec3> {
    Ok(match link.link_type() {
        NavLinkType::Standard => source_edge.middle(),
        NavLinkType::JoinPolygons => link_constraint(link)?.clip(source_edge).middle(),
        NavLinkType::Jump => source_edge.point_at(link_constraint(link)?.clamp_ratio(0.5)),
    })
}

fn append_corridor_path(path: &mut Vec<PathPoint>, portals: &mut [PathPortal]) {
    FunnelAlgorithm::new().compute_pivot_points(portals);
    path.extend(portals.iter().filter_map(|portal| {
        portal
            .transition_point()
            .map(|point| PathPoint::new(point, portal.is_jump_point()))
    }));
}

fn is_point_inside_triangle(point: Vec2, polygon: &NavPolygon, triangle: &NavTriangle) -> bool {
    let [p0, p1, p2] = triangle
        .indices()
        .map(|index| {
            let vertex = polygon.point(index);
            Vec2::new(vertex.x, vertex.z)
        });

    // points on an edge belong to the triangle
    let signs = [sign(point, p0, p1), sign(point, p1, p2), sign(point, p2, p0)];
    let has_negative = signs.iter().any(|&s| s < -ON_EDGE_EPSILON);
    let has_positive = signs.iter().any(|&s| s > ON_EDGE_EPSILON);
    !(has_negative && has_positive)
}

fn sign(p1: Vec2, p2: Vec2, p3: Vec2) -> f32 {
    (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
}
