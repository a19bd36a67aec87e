use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of an entity or of a shape inside an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    #[serde(default = "identity_orientation")]
    pub orientation: Quat,
}

fn identity_orientation() -> Quat {
    Quat::IDENTITY
}

impl Transform {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// `self * local`: applies `local` first, then `self`
    pub fn combine(&self, local: &Transform) -> Transform {
        Transform {
            position: self.transform_point(local.position),
            orientation: (self.orientation * local.orientation).normalize(),
        }
    }

    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.orientation * point + self.position
    }

    #[inline]
    pub fn rotate(&self, vector: Vec3) -> Vec3 {
        self.orientation * vector
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_position(Vec3::ZERO)
    }
}

/// Local axis of revolution of capsules, cones and cylinders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Collision shape used to build the navigation mesh.
///
/// Round shapes are approximated by their oriented bounding box. `Unsupported`
/// carries the type name of a shape the generator cannot handle: meeting one
/// fails the whole generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AIShape {
    Box {
        half_sizes: Vec3,
    },
    Capsule {
        radius: f32,
        cylinder_height: f32,
        axis: Axis,
    },
    Cone {
        radius: f32,
        height: f32,
        axis: Axis,
    },
    Cylinder {
        radius: f32,
        height: f32,
        axis: Axis,
    },
    Sphere {
        radius: f32,
    },
    /// Convex hull given by its points and outward facing (counter
    /// clockwise) triangles
    ConvexHull {
        points: Vec<Vec3>,
        triangles: Vec<[usize; 3]>,
    },
    Unsupported {
        type_name: String,
    },
}

impl AIShape {
    pub fn type_name(&self) -> &str {
        match self {
            AIShape::Box { .. } => "Box",
            AIShape::Capsule { .. } => "Capsule",
            AIShape::Cone { .. } => "Cone",
            AIShape::Cylinder { .. } => "Cylinder",
            AIShape::Sphere { .. } => "Sphere",
            AIShape::ConvexHull { .. } => "ConvexHull",
            AIShape::Unsupported { type_name } => type_name,
        }
    }
}

/// Shape of an object with its optional placement inside the object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectShape {
    pub shape: AIShape,
    #[serde(default)]
    pub local_transform: Option<Transform>,
}

impl ObjectShape {
    pub fn new(shape: AIShape) -> Self {
        Self {
            shape,
            local_transform: None,
        }
    }

    pub fn with_local_transform(mut self, local_transform: Transform) -> Self {
        self.local_transform = Some(local_transform);
        self
    }
}
