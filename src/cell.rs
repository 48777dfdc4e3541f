use crate::geometry::Shape;
use crate::material::Material;
use nalgebra::Vector3;
use std::sync::Arc;

/// A material filling a bounding shape.
#[derive(Debug, Clone)]
pub struct Cell {
    pub name: Option<String>,
    pub material: Arc<Material>,
    pub shape: Shape,
}

impl Cell {
    pub fn new(material: Arc<Material>, shape: impl Into<Shape>) -> Self {
        Self {
            name: None,
            material,
            shape: shape.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        self.shape.contains(point)
    }
}
