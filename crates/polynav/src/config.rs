use crate::NavMeshAgent;
use polynav_common::deg_to_rad;
use serde::{Deserialize, Serialize};

/// Settings of the navigation mesh generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavMeshConfig {
    pub agent: NavMeshAgent,
    /// Maximum slope (radians) of a polytope face to be walkable
    pub max_slope: f32,
    /// Maximum slope (radians) of a terrain square to be walkable
    pub terrain_max_walkable_slope: f32,
    /// Walkable rectangles wider than this are split in several surfaces
    pub polytope_max_size: f32,
    /// Maximum distance covered by a jump link between two polygons
    pub jump_max_length: f32,
    /// Additional path cost of a jump
    pub jump_penalty: f32,
    /// Points making an angle (degrees) below this threshold with their
    /// neighbors are removed when simplifying polygons
    pub polygon_remove_angle_threshold: f32,
    /// Points closer than this distance are merged when simplifying polygons
    pub polygon_merge_points_distance: f32,
    /// Walkable outlines are grown and obstacles shrunk by this amount
    pub csg_epsilon: f32,
}

impl NavMeshConfig {
    pub fn new(agent: NavMeshAgent) -> Self {
        NavMeshConfig {
            agent,
            max_slope: deg_to_rad(45.0),
            terrain_max_walkable_slope: deg_to_rad(45.0),
            polytope_max_size: 40.0,
            jump_max_length: 1.5,
            jump_penalty: 2.0,
            polygon_remove_angle_threshold: 5.0,
            polygon_merge_points_distance: 0.01,
            csg_epsilon: 0.0001,
        }
    }

    pub fn with_agent(mut self, agent: NavMeshAgent) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_max_slope(mut self, max_slope: f32) -> Self {
        self.max_slope = max_slope;
        self
    }

    pub fn with_terrain_max_walkable_slope(mut self, terrain_max_walkable_slope: f32) -> Self {
        self.terrain_max_walkable_slope = terrain_max_walkable_slope;
        self
    }

    pub fn with_polytope_max_size(mut self, polytope_max_size: f32) -> Self {
        self.polytope_max_size = polytope_max_size;
        self
    }

    pub fn with_jump_max_length(mut self, jump_max_length: f32) -> Self {
        self.jump_max_length = jump_max_length;
        self
    }

    pub fn with_jump_penalty(mut self, jump_penalty: f32) -> Self {
        self.jump_penalty = jump_penalty;
        self
    }

    pub fn with_simplify_thresholds(mut self, angle_degrees: f32, merge_distance: f32) -> Self {
        self.polygon_remove_angle_threshold = angle_degrees;
        self.polygon_merge_points_distance = merge_distance;
        self
    }

    /// Cosine used by polygon simplification for the angle threshold
    pub fn simplify_angle_cos(&self) -> f32 {
        deg_to_rad(self.polygon_remove_angle_threshold).cos()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.agent.agent_height <= 0.0 {
            return Err("Agent height must be positive".to_string());
        }
        if self.agent.agent_radius < 0.0 {
            return Err("Agent radius cannot be negative".to_string());
        }
        if self.max_slope <= 0.0 || self.max_slope >= std::f32::consts::FRAC_PI_2 {
            return Err("Max slope must be in ]0, PI/2[".to_string());
        }
        if self.terrain_max_walkable_slope <= 0.0
            || self.terrain_max_walkable_slope >= std::f32::consts::FRAC_PI_2
        {
            return Err("Terrain max walkable slope must be in ]0, PI/2[".to_string());
        }
        if self.polytope_max_size <= 0.0 {
            return Err("Polytope max size must be positive".to_string());
        }
        if self.jump_max_length < 0.0 {
            return Err("Jump max length cannot be negative".to_string());
        }
        if self.jump_penalty < 0.0 {
            return Err("Jump penalty cannot be negative".to_string());
        }
        if !(0.0..90.0).contains(&self.polygon_remove_angle_threshold) {
            return Err("Polygon remove angle threshold must be in [0, 90[ degrees".to_string());
        }
        if self.polygon_merge_points_distance < 0.0 {
            return Err("Polygon merge points distance cannot be negative".to_string());
        }
        if self.csg_epsilon < 0.0 {
            return Err("CSG epsilon cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Default for NavMeshConfig {
    fn default() -> Self {
        Self::new(NavMeshAgent::default())
    }
}
