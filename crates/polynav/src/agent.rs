use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Size of the characters walking on the navigation mesh. The agent is seen
/// as an axis aligned box of `agent_radius` half width and `agent_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavMeshAgent {
    pub agent_height: f32,
    pub agent_radius: f32,
}

impl NavMeshAgent {
    pub fn new(agent_height: f32, agent_radius: f32) -> Self {
        Self {
            agent_height,
            agent_radius,
        }
    }

    /// Distance a face with this unit normal is pushed outward so the agent
    /// center can be treated as a point: support distance of the agent box
    /// in the direction of the normal.
    pub fn compute_expand_distance(&self, normal: Vec3) -> f32 {
        let half_height = self.agent_height / 2.0;
        normal.x.abs() * self.agent_radius
            + normal.y.abs() * half_height
            + normal.z.abs() * self.agent_radius
    }
}

impl Default for NavMeshAgent {
    fn default() -> Self {
        Self::new(2.0, 0.5)
    }
}
