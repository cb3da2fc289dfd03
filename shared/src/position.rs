use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// A cell on the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn shift(&self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The cell `distance` steps away when facing `direction`.
    pub fn neighbor(&self, direction: Direction, distance: i32) -> Self {
        let (dx, dz) = direction.offset();
        self.shift(dx * distance, dz * distance)
    }

    pub fn to_precise(&self) -> PrecisePosition {
        PrecisePosition::new(self.x as f32, self.z as f32)
    }
}

/// Sub-cell position used while a player is animating between cells.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PrecisePosition {
    pub x: f32,
    pub z: f32,
}

impl PrecisePosition {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn to_position(&self) -> Position {
        Position::new(self.x.round() as i32, self.z.round() as i32)
    }

    pub fn advance(&self, direction: Direction, distance: f32) -> Self {
        let (dx, dz) = direction.offset();
        Self::new(self.x + dx as f32 * distance, self.z + dz as f32 * distance)
    }
}

/// Four-way facing. Encoded on the wire as `0..=3` in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Direction {
    Up,
    Right,
    #[default]
    Down,
    Left,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// One clockwise step: Up, Right, Down, Left, then back to Up.
    pub fn rotate(&self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    /// Grid delta of one step; `z` grows towards the viewer.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn to_number(&self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Right),
            2 => Ok(Direction::Down),
            3 => Ok(Direction::Left),
            other => Err(CodecError::UnknownDirection(other)),
        }
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction.to_number()
    }
}
