/// The tile grid: sole source of truth for level state.
///
/// ## Coordinates
///
/// Positions are signed (`Pos`) so direction arithmetic can step off the
/// map without wrapping. Anything outside the grid reads as `Brick`, which
/// makes the level border self-sealing: callers never bounds-check before
/// a `get`.
///
/// ## Writes
///
/// `set` is immediate: the rockfall pass reads its own writes within the
/// same scan, which is what makes chain reactions work. Each write is also
/// recorded in a dirty list; the renderer drains it to find out which
/// cells need repainting. The grid itself knows nothing about rendering.

use super::tile::Tile;

/// A grid position. Signed so that `pos + dir` can leave the map.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }
}

impl std::ops::Add for Pos {
    type Output = Pos;
    fn add(self, rhs: Pos) -> Pos {
        Pos { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

/// Unit direction vectors.
pub const DOWN: Pos = Pos { x: 0, y: 1 };
pub const LEFT: Pos = Pos { x: -1, y: 0 };
pub const RIGHT: Pos = Pos { x: 1, y: 0 };

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Tile>, // row-major, width * height
    dirty: Vec<Pos>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0);
        Grid {
            width,
            height,
            cells: vec![Tile::Empty; (width * height) as usize],
            dirty: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Tile at `pos`. Out of bounds reads as Brick.
    #[inline]
    pub fn get(&self, pos: Pos) -> Tile {
        if !self.in_bounds(pos) {
            return Tile::Brick;
        }
        self.cells[(pos.y * self.width + pos.x) as usize]
    }

    /// Overwrite the tile at `pos` and record the cell as dirty.
    /// Callers pass positions already known to be in bounds; an
    /// out-of-bounds write is a caller bug and is dropped in release.
    #[inline]
    pub fn set(&mut self, pos: Pos, tile: Tile) {
        debug_assert!(self.in_bounds(pos), "set out of bounds: {:?}", pos);
        if !self.in_bounds(pos) {
            return;
        }
        self.cells[(pos.y * self.width + pos.x) as usize] = tile;
        self.dirty.push(pos);
    }

    /// Cells written since the last drain. Consumed by the renderer.
    pub fn drain_dirty(&mut self) -> Vec<Pos> {
        std::mem::take(&mut self.dirty)
    }

    /// Iterate all in-bounds positions, row-major top to bottom.
    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| Pos::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_as_brick() {
        let g = Grid::new(3, 3);
        assert_eq!(g.get(Pos::new(-1, 0)), Tile::Brick);
        assert_eq!(g.get(Pos::new(0, -1)), Tile::Brick);
        assert_eq!(g.get(Pos::new(3, 0)), Tile::Brick);
        assert_eq!(g.get(Pos::new(0, 3)), Tile::Brick);
        assert_eq!(g.get(Pos::new(1, 1)), Tile::Empty);
    }

    #[test]
    fn set_is_immediately_visible() {
        let mut g = Grid::new(3, 3);
        g.set(Pos::new(1, 2), Tile::Rock);
        assert_eq!(g.get(Pos::new(1, 2)), Tile::Rock);
    }

    #[test]
    fn set_records_dirty_cells() {
        let mut g = Grid::new(3, 3);
        g.set(Pos::new(0, 0), Tile::Earth);
        g.set(Pos::new(2, 1), Tile::Diamond);
        let dirty = g.drain_dirty();
        assert_eq!(dirty, vec![Pos::new(0, 0), Pos::new(2, 1)]);
        assert!(g.drain_dirty().is_empty());
    }

    #[test]
    fn positions_cover_whole_grid() {
        let g = Grid::new(4, 3);
        assert_eq!(g.positions().count(), 12);
    }
}
