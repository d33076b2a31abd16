//! Uniform radial mesh for the axisymmetric membrane model.

use serde::{Deserialize, Serialize};

/// 1D radial discretization of a circular membrane.
///
/// Node `i` sits at `r_i = (i + 1) * dr`, so the first node is one step off the
/// center and the last one is on the rim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadialMesh {
    /// Number of nodes (equal to the element count)
    pub num_nodes: usize,
    /// Membrane radius (m)
    pub radius: f64,
    /// Element width (m)
    pub dr: f64,
}

impl RadialMesh {
    /// Create a uniform mesh.
    ///
    /// # Arguments
    /// * `diameter` - Membrane diameter (m)
    /// * `num_elements` - Number of radial elements
    pub fn uniform(diameter: f64, num_elements: usize) -> Self {
        let radius = diameter / 2.0;
        Self {
            num_nodes: num_elements,
            radius,
            dr: radius / num_elements as f64,
        }
    }

    #[inline]
    pub fn node_radius(&self, i: usize) -> f64 {
        (i as f64 + 1.0) * self.dr
    }

    /// Radius halfway between node `i` and node `i + 1`.
    #[inline]
    pub fn midpoint_radius(&self, i: usize) -> f64 {
        (i as f64 + 1.5) * self.dr
    }

    pub fn node_radii(&self) -> Vec<f64> {
        (0..self.num_nodes).map(|i| self.node_radius(i)).collect()
    }

    #[inline]
    pub fn is_boundary(&self, i: usize) -> bool {
        i == 0 || i + 1 == self.num_nodes
    }
}
