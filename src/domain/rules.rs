/// Movement rules: what the hero may do, and what doing it changes.
///
/// `can_move` is the pure legality check; `do_move` applies a move that
/// has already passed it. Illegal moves are not errors: the caller simply
/// drops the direction and the hero stays put.
///
/// ┌────────────────────────┬─────────────────────────────────────┐
/// │ Destination            │ Verdict                             │
/// ├────────────────────────┼─────────────────────────────────────┤
/// │ Empty / Earth          │ walk (earth is dug away)            │
/// │ Diamond                │ walk, collect                       │
/// │ Key                    │ walk, unlock every safe             │
/// │ Rock                   │ push: horizontal only, and only if  │
/// │                        │ the cell beyond the rock is Empty   │
/// │ Brick / Safe / Blob    │ blocked                             │
/// └────────────────────────┴─────────────────────────────────────┘

use super::entity::{Dir, Hero};
use super::grid::{Grid, Pos};
use super::tile::Tile;

/// What applying a move did, for the session to turn into counters
/// and events.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveEffect {
    Walked,
    Collected,
    Unlocked,
    Pushed,
}

/// May the hero step from `hero_pos` in `dir`?
pub fn can_move(grid: &Grid, hero_pos: Pos, dir: Dir) -> bool {
    let newpos = hero_pos + dir.delta();
    let block = grid.get(newpos);
    if block.is_enterable() {
        return true;
    }
    if block == Tile::Rock {
        // A rock can be shoved one cell, but only sideways and only
        // into empty space.
        let beyond = newpos + dir.delta();
        return dir.is_horizontal() && grid.get(beyond) == Tile::Empty;
    }
    false
}

/// Apply a move already validated by `can_move`: extract the item effect,
/// clear the destination, and step the hero into it.
pub fn do_move(grid: &mut Grid, hero: &mut Hero, dir: Dir) -> MoveEffect {
    let newpos = hero.pos + dir.delta();
    let block = grid.get(newpos);
    let effect = match block {
        Tile::Diamond => MoveEffect::Collected,
        Tile::Key => {
            unlock(grid);
            MoveEffect::Unlocked
        }
        Tile::Rock => {
            grid.set(newpos + dir.delta(), Tile::Rock);
            MoveEffect::Pushed
        }
        _ => MoveEffect::Walked,
    };
    grid.set(newpos, Tile::Empty);
    hero.pos = newpos;
    effect
}

/// Turn every safe into a diamond. The Diamond+Safe total is unchanged.
fn unlock(grid: &mut Grid) {
    let targets: Vec<Pos> = grid
        .positions()
        .filter(|&p| grid.get(p) == Tile::Safe)
        .collect();
    for pos in targets {
        grid.set(pos, Tile::Diamond);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn count_gems(g: &Grid) -> usize {
        g.positions().filter(|&p| g.get(p).counts_as_diamond()).count()
    }

    #[test]
    fn walks_into_empty_earth_diamond_key() {
        let g = grid_from(&[
            " .*K",
            "    ",
        ]);
        let start = Pos::new(0, 1);
        assert!(can_move(&g, start, Dir::Up)); // empty
        assert!(can_move(&g, Pos::new(1, 1), Dir::Up)); // earth
        assert!(can_move(&g, Pos::new(2, 1), Dir::Up)); // diamond
        assert!(can_move(&g, Pos::new(3, 1), Dir::Up)); // key
    }

    #[test]
    fn blocked_by_brick_safe_and_blob() {
        let g = grid_from(&[
            "#XB",
            "   ",
        ]);
        assert!(!can_move(&g, Pos::new(0, 1), Dir::Up));
        assert!(!can_move(&g, Pos::new(1, 1), Dir::Up));
        assert!(!can_move(&g, Pos::new(2, 1), Dir::Up));
    }

    #[test]
    fn map_edge_rejects_movement() {
        let g = grid_from(&["  "]);
        assert!(!can_move(&g, Pos::new(0, 0), Dir::Left));
        assert!(!can_move(&g, Pos::new(0, 0), Dir::Up));
    }

    #[test]
    fn push_needs_empty_cell_beyond_the_rock() {
        let g = grid_from(&[" O  O#"]);
        assert!(can_move(&g, Pos::new(0, 0), Dir::Right)); // rock, then empty
        assert!(!can_move(&g, Pos::new(3, 0), Dir::Right)); // rock against brick
    }

    #[test]
    fn vertical_push_is_always_rejected() {
        let g = grid_from(&[
            " ",
            "O",
            " ",
        ]);
        assert!(!can_move(&g, Pos::new(0, 0), Dir::Down));
        assert!(!can_move(&g, Pos::new(0, 2), Dir::Up));
    }

    #[test]
    fn do_move_pushes_the_rock_one_cell() {
        let mut g = grid_from(&[" O  "]);
        let mut hero = Hero::new(Pos::new(0, 0));
        assert!(can_move(&g, hero.pos, Dir::Right));
        let effect = do_move(&mut g, &mut hero, Dir::Right);
        assert_eq!(effect, MoveEffect::Pushed);
        assert_eq!(hero.pos, Pos::new(1, 0));
        assert_eq!(g.get(Pos::new(1, 0)), Tile::Empty);
        assert_eq!(g.get(Pos::new(2, 0)), Tile::Rock);
    }

    #[test]
    fn collecting_clears_the_diamond() {
        let mut g = grid_from(&["@*"]);
        let mut hero = Hero::new(Pos::new(0, 0));
        let effect = do_move(&mut g, &mut hero, Dir::Right);
        assert_eq!(effect, MoveEffect::Collected);
        assert_eq!(g.get(Pos::new(1, 0)), Tile::Empty);
        assert_eq!(hero.pos, Pos::new(1, 0));
    }

    #[test]
    fn key_turns_every_safe_into_a_diamond() {
        let mut g = grid_from(&[
            "X K",
            " X ",
        ]);
        let before = count_gems(&g);
        let mut hero = Hero::new(Pos::new(1, 0));
        let effect = do_move(&mut g, &mut hero, Dir::Right);
        assert_eq!(effect, MoveEffect::Unlocked);
        assert_eq!(g.get(Pos::new(0, 0)), Tile::Diamond);
        assert_eq!(g.get(Pos::new(1, 1)), Tile::Diamond);
        // Unlock preserves the Diamond+Safe total.
        assert_eq!(count_gems(&g), before);
    }

    #[test]
    fn digging_earth_leaves_empty() {
        let mut g = grid_from(&[" ."]);
        let mut hero = Hero::new(Pos::new(0, 0));
        let effect = do_move(&mut g, &mut hero, Dir::Right);
        assert_eq!(effect, MoveEffect::Walked);
        assert_eq!(g.get(Pos::new(1, 0)), Tile::Empty);
    }
}
