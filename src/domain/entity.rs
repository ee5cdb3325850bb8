/// The hero and the per-turn input it reacts to.

use super::grid::Pos;

/// Movement direction (one of the four unit vectors).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Left,
    Right,
    Up,
    Down,
}

impl Dir {
    pub fn delta(self) -> Pos {
        match self {
            Dir::Left => Pos::new(-1, 0),
            Dir::Right => Pos::new(1, 0),
            Dir::Up => Pos::new(0, -1),
            Dir::Down => Pos::new(0, 1),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Dir::Left | Dir::Right)
    }
}

/// Input consumed by one logical turn. Meta commands (save, load,
/// restart, quit) are handled by the outer loop, not the simulation.
#[derive(Clone, Copy, Debug)]
pub struct TurnInput {
    pub movement: Option<Dir>,
}

#[derive(Clone, Debug)]
pub struct Hero {
    pub pos: Pos,
    /// Direction accepted for the current turn; cleared after it is applied
    /// or rejected. Zero velocity is represented as None.
    pub velocity: Option<Dir>,
    pub dead: bool,
}

impl Hero {
    pub fn new(pos: Pos) -> Self {
        Hero { pos, velocity: None, dead: false }
    }
}
