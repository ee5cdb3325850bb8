/// Saved-position persistence.
///
/// One slot per install: `saved_position.dat` next to the executable
/// when that directory is writable, otherwise under the user data dir.
/// The format is the level legend itself, prefixed with dimensions:
///
///   width=20
///   height=12
///   row=####################
///   ...
///
/// The hero is written into the grid as the Hero marker, so a loaded
/// position goes through the same `survey()` path as a fresh level.

use std::path::PathBuf;

use crate::domain::grid::{Grid, Pos};
use crate::domain::tile::Tile;
use crate::sim::level::char_to_tile;

const SAVE_FILE: &str = "saved_position.dat";

pub enum LoadResult {
    Loaded(Grid),
    Missing,
    Corrupt(String),
}

pub fn save_position(grid: &Grid, hero_pos: Pos) -> Result<(), String> {
    let path = save_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create save directory: {}", e))?;
    }
    std::fs::write(&path, serialize_position(grid, hero_pos))
        .map_err(|e| format!("cannot write {}: {}", path.display(), e))
}

pub fn load_position() -> LoadResult {
    let path = save_path();
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadResult::Missing,
        Err(e) => return LoadResult::Corrupt(format!("cannot read {}: {}", path.display(), e)),
    };
    match parse_position(&content) {
        Ok(grid) => LoadResult::Loaded(grid),
        Err(e) => LoadResult::Corrupt(e),
    }
}

pub fn serialize_position(grid: &Grid, hero_pos: Pos) -> String {
    let mut out = String::new();
    out.push_str(&format!("width={}\n", grid.width()));
    out.push_str(&format!("height={}\n", grid.height()));
    for y in 0..grid.height() {
        out.push_str("row=");
        for x in 0..grid.width() {
            let pos = Pos::new(x, y);
            let tile = if pos == hero_pos { Tile::Hero } else { grid.get(pos) };
            out.push(tile.legend_char());
        }
        out.push('\n');
    }
    out
}

pub fn parse_position(content: &str) -> Result<Grid, String> {
    let mut width: Option<i32> = None;
    let mut height: Option<i32> = None;
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if let Some(value) = line.strip_prefix("width=") {
            width = Some(parse_dim(value)?);
        } else if let Some(value) = line.strip_prefix("height=") {
            height = Some(parse_dim(value)?);
        } else if let Some(row) = line.strip_prefix("row=") {
            rows.push(row);
        } else if !line.trim().is_empty() {
            return Err(format!("unrecognized line: {}", line));
        }
    }

    let width = width.ok_or("missing width")?;
    let height = height.ok_or("missing height")?;
    if rows.len() as i32 != height {
        return Err(format!("expected {} rows, found {}", height, rows.len()));
    }

    let mut grid = Grid::new(width, height);
    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() as i32 != width {
            return Err(format!("row {} is not {} cells wide", y, width));
        }
        for (x, ch) in row.chars().enumerate() {
            grid.set(Pos::new(x as i32, y as i32), char_to_tile(ch));
        }
    }
    grid.drain_dirty();
    Ok(grid)
}

fn parse_dim(value: &str) -> Result<i32, String> {
    let n: i32 = value
        .trim()
        .parse()
        .map_err(|_| format!("bad dimension: {}", value))?;
    if n < 1 || n > 1024 {
        return Err(format!("dimension out of range: {}", n));
    }
    Ok(n)
}

/// Prefer the executable's directory (portable installs); fall back to
/// the XDG data dir when it is not writable.
pub fn save_path() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if dir_is_writable(dir) {
                return dir.join(SAVE_FILE);
            }
        }
    }
    data_dir().join(SAVE_FILE)
}

fn dir_is_writable(dir: &std::path::Path) -> bool {
    let probe = dir.join(".write_test");
    match std::fs::File::create(&probe) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

fn data_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join("stonefall");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("stonefall");
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(rows: &[&str]) -> Grid {
        let mut grid = Grid::new(rows[0].len() as i32, rows.len() as i32);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                grid.set(Pos::new(x as i32, y as i32), char_to_tile(ch));
            }
        }
        grid.drain_dirty();
        grid
    }

    #[test]
    fn round_trip_preserves_grid_and_hero() {
        let grid = grid_from(&[
            "#####",
            "#.O*#",
            "#X K#",
            "#####",
        ]);
        let hero = Pos::new(2, 2);
        let text = serialize_position(&grid, hero);
        let restored = parse_position(&text).unwrap();
        assert_eq!(restored.width(), 5);
        assert_eq!(restored.height(), 4);
        assert_eq!(restored.get(hero), Tile::Hero);
        assert_eq!(restored.get(Pos::new(2, 1)), Tile::Rock);
        assert_eq!(restored.get(Pos::new(3, 1)), Tile::Diamond);
        assert_eq!(restored.get(Pos::new(1, 2)), Tile::Safe);
    }

    #[test]
    fn hero_marker_replaces_the_underlying_cell() {
        let grid = grid_from(&["* *"]);
        let text = serialize_position(&grid, Pos::new(1, 0));
        assert!(text.contains("row=*@*"));
    }

    #[test]
    fn truncated_save_is_rejected() {
        let err = parse_position("width=3\nheight=2\nrow=###\n");
        assert!(err.is_err());
    }

    #[test]
    fn bad_dimensions_are_rejected() {
        assert!(parse_position("width=abc\nheight=2\n").is_err());
        assert!(parse_position("width=0\nheight=2\n").is_err());
        assert!(parse_position("width=99999\nheight=2\n").is_err());
    }

    #[test]
    fn short_row_is_rejected() {
        let err = parse_position("width=4\nheight=1\nrow=###\n");
        assert!(err.is_err());
    }
}
