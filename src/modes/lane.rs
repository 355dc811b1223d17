//! Lanes and stick-to-lane mapping shared by the moving modes

/// Lateral position of each lane
pub const LANE_X: [f32; 3] = [-2.0, 0.0, 2.0];

/// Stick values within ±this resolve to the centre lane
pub const AXIS_DEAD_ZONE: f32 = 0.35;

/// Objects further than this behind the avatar are despawned
pub const DESPAWN_BEHIND: f32 = 15.0;

/// One of the three lanes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lane {
    Left,
    #[default]
    Center,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    /// Lane selected by a horizontal stick value in [-1, 1]
    ///
    /// Anything inside the dead zone, including NaN, is the centre lane.
    pub fn from_axis(x: f32) -> Lane {
        if x < -AXIS_DEAD_ZONE {
            Lane::Left
        } else if x > AXIS_DEAD_ZONE {
            Lane::Right
        } else {
            Lane::Center
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Center => 1,
            Lane::Right => 2,
        }
    }

    pub fn from_index(index: usize) -> Lane {
        Lane::ALL[index.min(2)]
    }

    /// World-space x of the lane centre
    pub fn x(&self) -> f32 {
        LANE_X[self.index()]
    }
}

/// Fixed-spacing spawn schedule along the track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnCursor {
    next_z: f32,
    spacing: f32,
}

impl SpawnCursor {
    pub fn new(first_z: f32, spacing: f32) -> Self {
        Self { next_z: first_z, spacing }
    }

    /// Take the next spawn position if it lies before `horizon`
    pub fn next_before(&mut self, horizon: f32) -> Option<f32> {
        if self.spacing <= 0.0 || self.next_z >= horizon {
            return None;
        }
        let z = self.next_z;
        self.next_z += self.spacing;
        Some(z)
    }

    pub fn peek(&self) -> f32 {
        self.next_z
    }
}
