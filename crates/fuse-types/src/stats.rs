use serde::{Deserialize, Serialize};

/// Topology counts of a shape. Entities shared between faces are counted once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeStats {
    pub shells: usize,
    pub faces: usize,
    pub edges: usize,
    pub vertices: usize,
    /// True when every shell is closed (the shape bounds a volume).
    pub closed: bool,
}

impl ShapeStats {
    /// Euler characteristic V - E + F.
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices as i64 - self.edges as i64 + self.faces as i64
    }

    pub fn is_empty(&self) -> bool {
        self.faces == 0
    }
}
