/// Events emitted during a simulation turn.
/// The presentation layer consumes these for sound and flourishes;
/// the core holds no audio or rendering state.

use crate::domain::grid::Pos;

#[derive(Clone, Copy, Debug)]
pub enum GameEvent {
    Collected { pos: Pos },
    Unlocked,
    FallingStarted,
    FallingStopped,
    HeroDied,
    LevelCleared,
    GameWon,
}
