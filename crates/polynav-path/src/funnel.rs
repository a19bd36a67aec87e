use glam::Vec3;

use crate::PathPortal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunnelSide {
    Left,
    Right,
}

impl FunnelSide {
    fn other(self) -> Self {
        match self {
            FunnelSide::Left => FunnelSide::Right,
            FunnelSide::Right => FunnelSide::Left,
        }
    }
}

/// String pulling through a list of portals (simple stupid funnel).
///
/// The apex is the last point of the path. Each side of the funnel goes
/// from the apex to the last portal point accepted on that side. A portal
/// point narrowing its side past the other side makes the other side point
/// the new apex.
#[derive(Debug)]
pub struct FunnelAlgorithm {
    apex: Vec3,
    left_index: usize,
    right_index: usize,
}

impl Default for FunnelAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

impl FunnelAlgorithm {
    pub fn new() -> Self {
        Self {
            apex: Vec3::ZERO,
            left_index: 1,
            right_index: 1,
        }
    }

    /// Sets the transition point of the portals where the path turns, plus
    /// the first and last portals.
    ///
    /// The first and last portals must be degenerate: reduced to the start
    /// and end points.
    pub fn compute_pivot_points(&mut self, portals: &mut [PathPortal]) {
        if portals.len() < 2 {
            return;
        }
        debug_assert_eq!(portals[0].left_point(), portals[0].right_point());
        debug_assert_eq!(
            portals[portals.len() - 1].left_point(),
            portals[portals.len() - 1].right_point()
        );

        let start_point = portals[0].left_point();
        let end_point = portals[portals.len() - 1].left_point();
        portals[0].set_transition_point(start_point);

        self.apex = start_point;
        self.left_index = 1;
        self.right_index = 1;

        let mut portal_index = 2;
        while portal_index < portals.len() {
            for side in [FunnelSide::Left, FunnelSide::Right] {
                if let Some(new_portal_index) = self.update_funnel_side(portals, side, portal_index) {
                    portal_index = new_portal_index;
                    break;
                }
            }
            portal_index += 1;
        }

        if let Some(last_portal) = portals.last_mut() {
            last_portal.set_transition_point(end_point);
        }
    }

    /// Returns the index of the portal following the new apex when the
    /// funnel collapsed
    fn update_funnel_side(&mut self, portals: &mut [PathPortal], side: FunnelSide, current_index: usize) -> Option<usize> {
        let other_side = side.other();
        let side_index = self.side_index(side);
        let other_side_index = self.side_index(other_side);

        let current_point = portal_point(portals, side, current_index);
        let side_point = portal_point(portals, side, side_index);
        if current_point == side_point || current_index <= side_index {
            return None;
        }

        let current_side = side_point - self.apex;
        let new_side = current_point - self.apex;
        let cross_y = current_side.z * new_side.x - current_side.x * new_side.z;
        let narrowed = match side {
            FunnelSide::Left => cross_y <= 0.0,
            FunnelSide::Right => cross_y >= 0.0,
        };
        if !narrowed {
            return None;
        }

        let other_point = portal_point(portals, other_side, other_side_index);
        let current_other_side = other_point - self.apex;
        let cross_y = current_other_side.z * new_side.x - current_other_side.x * new_side.z;
        let crossing_other_side = match side {
            FunnelSide::Left => cross_y < 0.0,
            FunnelSide::Right => cross_y > 0.0,
        };
        if !crossing_other_side {
            self.set_side_index(side, current_index);
            return None;
        }

        self.apex = other_point;
        portals[other_side_index].set_transition_point(other_point);
        self.set_side_index(other_side, other_side_index + 1);
        self.set_side_index(side, other_side_index + 1);
        Some(other_side_index + 1)
    }

    fn side_index(&self, side: FunnelSide) -> usize {
        match side {
            FunnelSide::Left => self.left_index,
            FunnelSide::Right => self.right_index,
        }
    }

    fn set_side_index(&mut self, side: FunnelSide, index: usize) {
        match side {
            FunnelSide::Left => self.left_index = index,
            FunnelSide::Right => self.right_index = index,
        }
    }
}

fn portal_point(portals: &[PathPortal], side: FunnelSide, index: usize) -> Vec3 {
    match side {
        FunnelSide::Left => portals[index].left_point(),
        FunnelSide::Right => portals[index].right_point(),
    }
}
