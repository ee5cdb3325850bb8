/// WorldState: the complete snapshot of a running game session.
///
/// The grid is the sole source of truth for level state; the session
/// counters (diamonds remaining, hero position) are always re-derived
/// from it by `survey()` after a load or level start, never trusted
/// incrementally across a restore.

use crate::config::SpeedConfig;
use crate::domain::entity::Hero;
use crate::domain::grid::{Grid, Pos};
use crate::domain::tile::Tile;

/// Coarse per-level state machine.
///
/// LevelStarting → Playing → {Dying | LevelCleared}.
/// Dying reloads the saved position and returns to Playing;
/// LevelCleared advances the level index, and past the last level
/// the session ends in GameWon.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    LevelStarting,
    Playing,
    Dying,
    LevelCleared,
    GameWon,
}

pub struct WorldState {
    pub grid: Grid,
    pub hero: Hero,

    /// Remaining Diamond+Safe count; level is cleared at zero.
    pub diamonds: u32,
    /// At least one rock moved in the most recent physics pass.
    /// Drives the continuous slide sound.
    pub falling: bool,

    pub phase: Phase,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub turn: u64,

    pub speed: SpeedConfig,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
}

impl WorldState {
    pub fn new() -> Self {
        WorldState {
            grid: Grid::new(1, 1),
            hero: Hero::new(Pos::new(0, 0)),
            diamonds: 0,
            falling: false,
            phase: Phase::LevelStarting,
            current_level: 0,
            total_levels: 0,
            level_name: String::new(),
            turn: 0,
            speed: SpeedConfig::default(),
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
        }
    }

    /// Full-grid scan: recompute the Diamond+Safe count and, if a Hero
    /// marker is present (it is in saved positions), adopt it as the hero
    /// position and clear the cell. Idempotent once the marker is gone.
    pub fn survey(&mut self) {
        let mut diamonds = 0;
        let mut hero_pos = None;
        for pos in self.grid.positions() {
            let tile = self.grid.get(pos);
            if tile.counts_as_diamond() {
                diamonds += 1;
            } else if tile == Tile::Hero {
                hero_pos = Some(pos);
            }
        }
        self.diamonds = diamonds;
        if let Some(pos) = hero_pos {
            self.hero.pos = pos;
            self.grid.set(pos, Tile::Empty);
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_from(rows: &[&str]) -> WorldState {
        let mut w = WorldState::new();
        let h = rows.len() as i32;
        let wd = rows[0].len() as i32;
        w.grid = Grid::new(wd, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '#' => Tile::Brick,
                    '*' => Tile::Diamond,
                    'X' => Tile::Safe,
                    '@' => Tile::Hero,
                    _ => Tile::Empty,
                };
                w.grid.set(Pos::new(x as i32, y as i32), tile);
            }
        }
        w.grid.drain_dirty();
        w
    }

    #[test]
    fn survey_counts_diamonds_and_safes() {
        let mut w = world_from(&[
            "*X ",
            " * ",
        ]);
        w.survey();
        assert_eq!(w.diamonds, 3);
    }

    #[test]
    fn survey_extracts_the_hero_marker() {
        let mut w = world_from(&[
            "  @",
            "*  ",
        ]);
        w.survey();
        assert_eq!(w.hero.pos, Pos::new(2, 0));
        assert_eq!(w.grid.get(Pos::new(2, 0)), Tile::Empty);
    }

    #[test]
    fn survey_is_idempotent() {
        let mut w = world_from(&[
            "@* ",
            " X*",
        ]);
        w.survey();
        let (d1, p1) = (w.diamonds, w.hero.pos);
        w.survey();
        assert_eq!(w.diamonds, d1);
        assert_eq!(w.hero.pos, p1);
    }
}
