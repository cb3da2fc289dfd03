use shared::{DEFAULT_PERSPECTIVE_DEPTH, PLAYER_WALK_SPEED};

/// Tunables of a world-journey engine instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Perspective depth the renderer starts from
    pub perspective_depth: u32,
    /// Cells per second used to animate walking players
    pub walk_speed: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            perspective_depth: DEFAULT_PERSPECTIVE_DEPTH,
            walk_speed: PLAYER_WALK_SPEED,
        }
    }
}
