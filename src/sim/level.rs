/// Level loading.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Level file format (`.txt`):
///   Line 1: `# Level Name` (optional)
///   Lines: map rows
///
/// ## Tile legend:
///   '#' = Brick      '.' = Earth      'O' = Rock
///   '*' = Diamond    'X' = Safe       'K' = Key
///   'B' = Blob       '@' = hero start ' ' = Empty
///
/// The hero start is written into the grid as the Hero marker and picked
/// up by `survey()`, the same path a loaded saved position takes.

use std::path::Path;

use crate::config::GameConfig;
use crate::domain::grid::{Grid, Pos};
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, WorldState};

/// Runtime level data (owned strings, loaded from file or embedded).
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

pub fn char_to_tile(ch: char) -> Tile {
    match ch {
        '#' => Tile::Brick,
        '.' => Tile::Earth,
        'O' => Tile::Rock,
        '*' => Tile::Diamond,
        'X' => Tile::Safe,
        'K' => Tile::Key,
        'B' => Tile::Blob,
        '@' => Tile::Hero,
        _ => Tile::Empty,
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the full level set once, at startup.
/// An empty level set is fatal; the caller reports and exits non-zero.
pub fn load_levels(config: &GameConfig) -> Result<Vec<LevelDef>, String> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let from_dir = load_from_directory(dir);
        if !from_dir.is_empty() {
            return Ok(from_dir);
        }
    }
    let embedded = embedded_levels();
    if embedded.is_empty() {
        return Err("could not find any levels".to_string());
    }
    Ok(embedded)
}

/// Reset the world to the start of `level_idx`. Constructs Grid and Hero
/// fresh and re-derives the diamond count via survey.
pub fn load_level(world: &mut WorldState, level_idx: usize, levels: &[LevelDef]) {
    let def = &levels[level_idx];
    world.current_level = level_idx;
    world.total_levels = levels.len();
    world.level_name = def.name.clone();

    let height = def.rows.len() as i32;
    let width = def.rows.iter().map(|r| r.len()).max().unwrap_or(0) as i32;
    world.grid = Grid::new(width, height);
    for (y, row) in def.rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            world.grid.set(Pos::new(x as i32, y as i32), char_to_tile(ch));
        }
    }

    world.hero.dead = false;
    world.hero.velocity = None;
    world.falling = false;
    world.turn = 0;
    world.survey();

    world.phase = Phase::LevelStarting;
    world.anim_tick = 0;
    world.set_message(&def.name, 40);
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level_file(content: &str) -> Option<LevelDef> {
    let mut name = String::new();
    let mut rows = vec![];

    for line in content.lines() {
        if name.is_empty() && rows.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            // Trailing spaces are Empty cells; strip only CRLF artifacts.
            rows.push(line.trim_end_matches('\r').to_string());
        }
    }

    while rows.last().map_or(false, |r| r.is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return None;
    }

    let max_width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in &mut rows {
        if row.len() < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - row.len()));
        }
    }

    if name.is_empty() {
        name = "Unnamed Cavern".to_string();
    }

    Some(LevelDef { name, rows })
}

/// Distinguish `# Level Name` from a map row like `####...` or `#..K..#`.
/// Map rows only ever contain the uppercase legend letters; a name has
/// at least one lowercase letter.
fn is_name_line(line: &str) -> bool {
    line.starts_with('#') && line[1..].chars().any(|c| c.is_lowercase())
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut named: Vec<(String, LevelDef)> = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            if let Ok(content) = std::fs::read_to_string(&path) {
                if let Some(def) = parse_level_file(&content) {
                    let filename = path
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string();
                    named.push((filename, def));
                }
            }
        }
    }

    named.sort_by(|a, b| a.0.cmp(&b.0));
    named.into_iter().map(|(_, def)| def).collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Cavern 1 - First Dig", &[
            "####################",
            "#@....*.......*....#",
            "#...O....O.........#",
            "#..........#...*...#",
            "#.*...#....O.......#",
            "#...O....*.....O...#",
            "#.......#.....*....#",
            "#..*.......O.......#",
            "#.....O.......*..O.#",
            "#.*.....*..#.......#",
            "#......O......*....#",
            "####################",
        ]),
        make_embedded("Cavern 2 - The Vault", &[
            "####################",
            "#@.....O...........#",
            "#..##..........##..#",
            "#..#X#..*...*.#X#..#",
            "#..#X#.O.....O#X#..#",
            "#..###.........###.#",
            "#........###.......#",
            "#..*.....#K#....*..#",
            "#...O....#.#..O....#",
            "#........#.#.......#",
            "#.*......#.#..*....#",
            "####################",
        ]),
        make_embedded("Cavern 3 - Blob Heaps", &[
            "####################",
            "#@........O........#",
            "#....O....B....O...#",
            "#....B...*.*...B...#",
            "#...*.*.......*.*..#",
            "#..................#",
            "#...O...O..O...O...#",
            "#...B...BBBB...B...#",
            "#..*.*.*....*.*.*..#",
            "#..................#",
            "#..*....*..*....*..#",
            "####################",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_name_and_pads_rows() {
        let def = parse_level_file("# Test Pit\n###\n#@#  \n###\n").unwrap();
        assert_eq!(def.name, "Test Pit");
        assert_eq!(def.rows.len(), 3);
        assert!(def.rows.iter().all(|r| r.len() == 5));
    }

    #[test]
    fn trailing_spaces_survive_but_carriage_returns_do_not() {
        let def = parse_level_file("# Ledge\n#####\n#@*  \r\n#####\r\n").unwrap();
        assert_eq!(def.rows[1], "#@*  ");
        assert!(def.rows.iter().all(|r| r.len() == 5));
        assert!(def.rows.iter().all(|r| !r.contains('\r')));
    }

    #[test]
    fn brick_rows_are_not_names() {
        let def = parse_level_file("####\n#@K#\n####\n").unwrap();
        assert_eq!(def.name, "Unnamed Cavern");
        assert_eq!(def.rows.len(), 3);
    }

    #[test]
    fn load_level_builds_grid_and_finds_hero() {
        let levels = vec![LevelDef {
            name: "T".to_string(),
            rows: vec!["#####".into(), "#@*X#".into(), "#####".into()],
        }];
        let mut w = WorldState::new();
        load_level(&mut w, 0, &levels);
        assert_eq!(w.grid.width(), 5);
        assert_eq!(w.grid.height(), 3);
        assert_eq!(w.hero.pos, Pos::new(1, 1));
        assert_eq!(w.grid.get(Pos::new(1, 1)), Tile::Empty);
        assert_eq!(w.diamonds, 2); // diamond + safe
        assert_eq!(w.phase, Phase::LevelStarting);
    }

    #[test]
    fn embedded_levels_are_well_formed() {
        let levels = embedded_levels();
        assert!(!levels.is_empty());
        for def in &levels {
            let w = def.rows[0].len();
            assert!(def.rows.iter().all(|r| r.len() == w), "{}", def.name);
            // Exactly one hero start per level.
            let heroes: usize = def
                .rows
                .iter()
                .map(|r| r.chars().filter(|&c| c == '@').count())
                .sum();
            assert_eq!(heroes, 1, "{}", def.name);
            // Something to collect.
            let gems: usize = def
                .rows
                .iter()
                .map(|r| r.chars().filter(|&c| c == '*' || c == 'X').count())
                .sum();
            assert!(gems > 0, "{}", def.name);
        }
    }
}
