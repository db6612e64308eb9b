use std::fmt::{self, Display, Formatter};
use std::ops::{Add, Sub};

/// Both dimensions have to fit into `u8`.
pub(crate) const MAX_SIZE: usize = 255;

/// 255 marks an empty cell in box grids.
pub(crate) const MAX_BOXES: usize = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapCell {
    Empty,
    Wall,
    Goal,
}

impl Default for MapCell {
    fn default() -> Self {
        MapCell::Empty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Contents {
    Empty,
    Box,
    Player,
}

impl Default for Contents {
    fn default() -> Self {
        Contents::Empty
    }
}

// ordered row first so the minimum of a region is its top-left-most cell
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub r: u8,
    pub c: u8,
}

impl Pos {
    pub fn new(r: u8, c: u8) -> Pos {
        Pos { r, c }
    }

    pub fn dist(self, other: Pos) -> u16 {
        let dr = (i16::from(self.r) - i16::from(other.r)).abs();
        let dc = (i16::from(self.c) - i16::from(other.c)).abs();
        (dr + dc) as u16
    }

    pub(crate) fn neighbors(self) -> [Pos; 4] {
        [
            self + Dir::Up,
            self + Dir::Right,
            self + Dir::Down,
            self + Dir::Left,
        ]
    }

    /// Only works for adjacent positions.
    pub(crate) fn dir_to(self, other: Pos) -> Dir {
        if self.r > other.r {
            Dir::Up
        } else if self.c < other.c {
            Dir::Right
        } else if self.r < other.r {
            Dir::Down
        } else {
            Dir::Left
        }
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.r, self.c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

pub(crate) const DIRECTIONS: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

impl Dir {
    pub fn inverse(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Right => Dir::Left,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
        }
    }

    pub(crate) fn is_vertical(self) -> bool {
        self == Dir::Up || self == Dir::Down
    }

    fn delta(self) -> (i16, i16) {
        match self {
            Dir::Up => (-1, 0),
            Dir::Right => (0, 1),
            Dir::Down => (1, 0),
            Dir::Left => (0, -1),
        }
    }
}

impl Display for Dir {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Dir::Up => write!(f, "u"),
            Dir::Right => write!(f, "r"),
            Dir::Down => write!(f, "d"),
            Dir::Left => write!(f, "l"),
        }
    }
}

impl Add<Dir> for Pos {
    type Output = Pos;

    fn add(self, dir: Dir) -> Pos {
        // the solver never leaves the walled area so wrapping only happens when
        // probing around cells on the edge which are always walls
        let (dr, dc) = dir.delta();
        Pos {
            r: (i16::from(self.r) + dr) as u8,
            c: (i16::from(self.c) + dc) as u8,
        }
    }
}

impl Sub<Dir> for Pos {
    type Output = Pos;

    fn sub(self, dir: Dir) -> Pos {
        self + dir.inverse()
    }
}
