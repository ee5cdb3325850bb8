/// The rockfall pass: gravity and chain reactions.
///
/// ## Scan order
///
/// Every rock is visited bottom row to top row, left to right, and the
/// grid is mutated in place as the scan goes. Later checks in the same
/// pass see earlier falls, which is exactly what keeps the behavior sane:
///
///   - a rock never moves more than one row per pass (the row it falls
///     into has already been scanned);
///   - a cell filled by an earlier fall is no longer Empty, so at most
///     one rock claims any destination per pass;
///   - stacked rocks chain downward one row each, bottom rock first.
///
/// Any other scan order produces same-tick double-falls and is a bug.
///
/// ## The hero as an obstacle
///
/// The hero's cell is overlaid as a `Hero` tile at query time instead of
/// being written into the grid before the pass and erased after. Falls
/// are blocked by the hero's cell like any non-Empty tile; a rock coming
/// to rest directly above the hero sets the crush flag.
///
/// This is a pure grid transform: no error conditions, only state.

use super::grid::{Grid, Pos, DOWN, LEFT, RIGHT};
use super::tile::Tile;

#[derive(Clone, Copy, Debug, Default)]
pub struct RockfallOutcome {
    /// At least one rock moved this pass. Drives the Falling flag.
    pub moved: bool,
    /// A rock landed on the hero's head.
    pub crushed: bool,
}

/// Tile at `pos`, with the hero's cell reading as `Hero`.
#[inline]
fn at(grid: &Grid, hero: Pos, pos: Pos) -> Tile {
    if pos == hero {
        Tile::Hero
    } else {
        grid.get(pos)
    }
}

/// A rock can roll toward `side` only if both the side cell and the cell
/// below it are Empty: sideways-and-down, never sideways alone.
fn can_roll(grid: &Grid, hero: Pos, side: Pos) -> bool {
    at(grid, hero, side) == Tile::Empty && at(grid, hero, side + DOWN) == Tile::Empty
}

fn fall(grid: &mut Grid, hero: Pos, oldpos: Pos, newpos: Pos, out: &mut RockfallOutcome) {
    if at(grid, hero, newpos + DOWN) == Tile::Hero {
        out.crushed = true;
    }
    grid.set(oldpos, Tile::Empty);
    grid.set(newpos, Tile::Rock);
    out.moved = true;
}

/// Apply one gravity pass to every rock in the grid.
pub fn rockfall(grid: &mut Grid, hero: Pos) -> RockfallOutcome {
    let mut out = RockfallOutcome::default();

    for y in (0..grid.height()).rev() {
        for x in 0..grid.width() {
            let pos = Pos::new(x, y);
            if grid.get(pos) != Tile::Rock {
                continue;
            }
            let below = pos + DOWN;
            let block_below = at(grid, hero, below);
            if block_below == Tile::Empty {
                fall(grid, hero, pos, below, &mut out);
            } else if block_below.is_rounded() {
                let left = pos + LEFT;
                if can_roll(grid, hero, left) {
                    fall(grid, hero, pos, left + DOWN, &mut out);
                } else {
                    let right = pos + RIGHT;
                    if can_roll(grid, hero, right) {
                        fall(grid, hero, pos, right + DOWN, &mut out);
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a grid from rows of legend characters.
    fn grid_from(rows: &[&str]) -> Grid {
        let h = rows.len() as i32;
        let w = rows[0].len() as i32;
        let mut g = Grid::new(w, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '#' => Tile::Brick,
                    '.' => Tile::Earth,
                    'O' => Tile::Rock,
                    '*' => Tile::Diamond,
                    'X' => Tile::Safe,
                    'K' => Tile::Key,
                    'B' => Tile::Blob,
                    _ => Tile::Empty,
                };
                g.set(Pos::new(x as i32, y as i32), tile);
            }
        }
        g.drain_dirty();
        g
    }

    /// Hero parked outside the map: no cell is overlaid.
    fn no_hero() -> Pos {
        Pos::new(-10, -10)
    }

    #[test]
    fn rock_falls_one_row_per_pass() {
        let mut g = grid_from(&[
            "O",
            " ",
            " ",
            "#",
        ]);
        let out = rockfall(&mut g, no_hero());
        assert!(out.moved);
        assert_eq!(g.get(Pos::new(0, 0)), Tile::Empty);
        assert_eq!(g.get(Pos::new(0, 1)), Tile::Rock);

        let out = rockfall(&mut g, no_hero());
        assert!(out.moved);
        assert_eq!(g.get(Pos::new(0, 2)), Tile::Rock);

        // Landed on brick: at rest.
        let out = rockfall(&mut g, no_hero());
        assert!(!out.moved);
        assert_eq!(g.get(Pos::new(0, 2)), Tile::Rock);
    }

    #[test]
    fn rock_rests_on_earth_and_brick() {
        let mut g = grid_from(&[
            " O ",
            " . ",
            "###",
        ]);
        let out = rockfall(&mut g, no_hero());
        assert!(!out.moved);
        assert_eq!(g.get(Pos::new(1, 0)), Tile::Rock);
    }

    #[test]
    fn separated_rocks_each_fall_one_row() {
        let mut g = grid_from(&[
            "O",
            " ",
            "O",
            " ",
            "#",
        ]);
        rockfall(&mut g, no_hero());
        assert_eq!(g.get(Pos::new(0, 1)), Tile::Rock);
        assert_eq!(g.get(Pos::new(0, 3)), Tile::Rock);
        assert_eq!(g.get(Pos::new(0, 0)), Tile::Empty);
        assert_eq!(g.get(Pos::new(0, 2)), Tile::Empty);
    }

    #[test]
    fn stacked_rocks_chain_one_row_each() {
        let mut g = grid_from(&[
            "O",
            "O",
            " ",
            " ",
            "#",
        ]);
        rockfall(&mut g, no_hero());
        // Bottom rock first (bottom-to-top scan), top rock follows into
        // the vacated cell: one row each, no double-fall.
        assert_eq!(g.get(Pos::new(0, 0)), Tile::Empty);
        assert_eq!(g.get(Pos::new(0, 1)), Tile::Rock);
        assert_eq!(g.get(Pos::new(0, 2)), Tile::Rock);
        assert_eq!(g.get(Pos::new(0, 3)), Tile::Empty);
    }

    #[test]
    fn rock_rolls_left_off_a_rock() {
        let mut g = grid_from(&[
            " O ",
            " O ",
            "###",
        ]);
        let out = rockfall(&mut g, no_hero());
        assert!(out.moved);
        assert_eq!(g.get(Pos::new(1, 0)), Tile::Empty);
        assert_eq!(g.get(Pos::new(0, 1)), Tile::Rock);
        assert_eq!(g.get(Pos::new(1, 1)), Tile::Rock);
    }

    #[test]
    fn rock_rolls_right_when_left_is_blocked() {
        let mut g = grid_from(&[
            "#O ",
            "#O ",
            "###",
        ]);
        rockfall(&mut g, no_hero());
        assert_eq!(g.get(Pos::new(2, 1)), Tile::Rock);
        assert_eq!(g.get(Pos::new(1, 0)), Tile::Empty);
    }

    #[test]
    fn no_roll_without_falling() {
        // Side cell empty but the cell under it occupied: rock stays.
        let mut g = grid_from(&[
            " O ",
            "#O#",
            "###",
        ]);
        let out = rockfall(&mut g, no_hero());
        assert!(!out.moved);
        assert_eq!(g.get(Pos::new(1, 0)), Tile::Rock);
    }

    #[test]
    fn rock_on_blob_rolls_but_rock_on_safe_sits() {
        let mut g = grid_from(&[
            " O  O ",
            " B  X ",
            "######",
        ]);
        rockfall(&mut g, no_hero());
        assert_eq!(g.get(Pos::new(0, 1)), Tile::Rock); // rolled off blob
        assert_eq!(g.get(Pos::new(4, 0)), Tile::Rock); // sat on safe
    }

    #[test]
    fn one_destination_per_pass() {
        // Two rocks flank a gap over the same landing cell. The left rock
        // is scanned first and rolls right into it; once filled, the right
        // rock has nowhere to go.
        let mut g = grid_from(&[
            "O O",
            "O O",
            "###",
        ]);
        rockfall(&mut g, no_hero());
        let rocks = g
            .positions()
            .filter(|&p| g.get(p) == Tile::Rock)
            .count();
        assert_eq!(rocks, 4);
        assert_eq!(g.get(Pos::new(1, 1)), Tile::Rock);
        assert_eq!(g.get(Pos::new(0, 0)), Tile::Empty);
        assert_eq!(g.get(Pos::new(2, 0)), Tile::Rock); // blocked, stayed
    }

    #[test]
    fn hero_cell_blocks_a_roll() {
        let mut g = grid_from(&[
            " O ",
            " O ",
            "###",
        ]);
        // Hero standing in the left landing cell: roll goes right instead.
        let hero = Pos::new(0, 1);
        rockfall(&mut g, hero);
        assert_eq!(g.get(Pos::new(0, 1)), Tile::Empty); // hero is not in the grid
        assert_eq!(g.get(Pos::new(2, 1)), Tile::Rock);
    }

    #[test]
    fn crush_fires_when_rock_lands_on_heros_head() {
        // Rock two rows above the hero with one empty cell between.
        let mut g = grid_from(&[
            "O",
            " ",
            " ",
            "#",
        ]);
        let hero = Pos::new(0, 2);

        let out = rockfall(&mut g, hero);
        // The rock lands directly above the hero: crushed now, not before.
        assert!(out.crushed);
        assert_eq!(g.get(Pos::new(0, 1)), Tile::Rock);

        // The hero's cell is never entered; the rock stays put.
        let out = rockfall(&mut g, hero);
        assert!(!out.moved);
        assert!(!out.crushed);
        assert_eq!(g.get(Pos::new(0, 1)), Tile::Rock);
    }

    #[test]
    fn no_crush_while_rock_is_still_two_rows_up() {
        let mut g = grid_from(&[
            "O",
            " ",
            " ",
            " ",
            "#",
        ]);
        let hero = Pos::new(0, 3);
        let out = rockfall(&mut g, hero);
        assert!(out.moved);
        assert!(!out.crushed); // rock at row 1, hero two rows below
    }

    #[test]
    fn bordered_arena_scenario() {
        // 5x5 all-brick border, rock at (2,1), hero at (2,3).
        let mut g = grid_from(&[
            "#####",
            "# O #",
            "#   #",
            "#   #",
            "#####",
        ]);
        let hero = Pos::new(2, 3);

        let out = rockfall(&mut g, hero);
        assert!(out.moved);
        assert!(out.crushed);
        assert_eq!(g.get(Pos::new(2, 2)), Tile::Rock);

        // Nothing more to do: the hero's cell rejects the fall.
        let out = rockfall(&mut g, hero);
        assert!(!out.moved);
        assert_eq!(g.get(Pos::new(2, 2)), Tile::Rock);
        assert_eq!(g.get(Pos::new(2, 3)), Tile::Empty);
    }
}
