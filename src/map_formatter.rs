use std::fmt::{self, Debug, Display, Formatter};

use crate::data::{Contents, MapCell, Pos};
use crate::vec2d::Vec2d;

/// Renders a grid with (optionally) a player and boxes in XSB.
pub struct MapFormatter<'a> {
    grid: &'a Vec2d<MapCell>,
    player_pos: Option<Pos>,
    boxes: &'a [Pos],
}

impl<'a> MapFormatter<'a> {
    pub(crate) fn new(grid: &'a Vec2d<MapCell>, player_pos: Option<Pos>, boxes: &'a [Pos]) -> Self {
        Self {
            grid,
            player_pos,
            boxes,
        }
    }

    fn write_to_formatter(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut state_grid = self.grid.scratchpad();
        for &b in self.boxes {
            state_grid[b] = Contents::Box;
        }
        if let Some(player_pos) = self.player_pos {
            state_grid[player_pos] = Contents::Player;
        }

        for r in 0..self.grid.rows() {
            // don't print trailing empty cells to match the input level strings
            let mut last_non_empty = None;
            for c in 0..self.grid.cols() {
                let pos = Pos::new(r, c);
                if self.grid[pos] != MapCell::Empty || state_grid[pos] != Contents::Empty {
                    last_non_empty = Some(pos.c);
                }
            }

            if let Some(last) = last_non_empty {
                for c in 0..=last {
                    let pos = Pos::new(r, c);
                    Self::write_cell(self.grid[pos], state_grid[pos], f)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_cell(cell: MapCell, contents: Contents, f: &mut Formatter<'_>) -> fmt::Result {
        match (cell, contents) {
            (MapCell::Empty, Contents::Empty) => write!(f, " "),
            (MapCell::Empty, Contents::Box) => write!(f, "$"),
            (MapCell::Empty, Contents::Player) => write!(f, "@"),
            // unreachable boxes get walled in during preprocessing
            (MapCell::Wall, Contents::Box) => write!(f, "$"),
            (MapCell::Wall, _) => write!(f, "#"),
            (MapCell::Goal, Contents::Empty) => write!(f, "."),
            (MapCell::Goal, Contents::Box) => write!(f, "*"),
            (MapCell::Goal, Contents::Player) => write!(f, "+"),
        }
    }
}

impl<'a> Display for MapFormatter<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_to_formatter(f)
    }
}

impl<'a> Debug for MapFormatter<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
