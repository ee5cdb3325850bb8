/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Empty,
    Brick,   // Impassable boundary / obstacle
    Hero,    // Transient marker: the hero's cell during physics and in saves
    Safe,    // Locked diamond, converted by a key
    Diamond, // Collectible
    Blob,    // Inert obstacle; rocks heap up on it and roll off
    Earth,   // Diggable, passable
    Rock,    // Falls under gravity, pushable sideways
    Key,     // Unlocks all safes
}

impl Tile {
    /// Can the hero walk into this tile? (Rock is handled separately: pushing.)
    pub fn is_enterable(self) -> bool {
        matches!(self, Tile::Empty | Tile::Earth | Tile::Diamond | Tile::Key)
    }

    /// Does a rock resting on this tile try to roll off sideways?
    /// On Brick, Earth or Safe a rock sits still.
    pub fn is_rounded(self) -> bool {
        matches!(self, Tile::Rock | Tile::Key | Tile::Diamond | Tile::Blob)
    }

    /// Counts toward the level's remaining-diamond total?
    /// Safes count too: a key turns them into diamonds one-for-one.
    pub fn counts_as_diamond(self) -> bool {
        matches!(self, Tile::Diamond | Tile::Safe)
    }

    /// The one-character legend used by level files and saved positions.
    pub fn legend_char(self) -> char {
        match self {
            Tile::Empty => ' ',
            Tile::Brick => '#',
            Tile::Hero => '@',
            Tile::Safe => 'X',
            Tile::Diamond => '*',
            Tile::Blob => 'B',
            Tile::Earth => '.',
            Tile::Rock => 'O',
            Tile::Key => 'K',
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}
