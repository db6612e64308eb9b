use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::data::{MapCell, Pos, MAX_SIZE};
use crate::level::Level;
use crate::map::GoalMap;
use crate::vec2d::Vec2d;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserErr {
    Pos(usize, usize),
    TooLarge,
    MultiplePlayers,
    NoPlayer,
}

impl Display for ParserErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            ParserErr::Pos(r, c) => write!(f, "Invalid cell at pos: [{}, {}]", r, c),
            ParserErr::TooLarge => write!(f, "Map larger than 255 rows/columns"),
            ParserErr::MultiplePlayers => write!(f, "More than one player"),
            ParserErr::NoPlayer => write!(f, "No player"),
        }
    }
}

impl Error for ParserErr {}

impl FromStr for Level {
    type Err = ParserErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

pub(crate) fn parse(level: &str) -> Result<Level, ParserErr> {
    // trim so we can specify levels using raw strings more easily
    let level = level.trim_matches('\n').trim_end();

    let (grid, goals, boxes, player_pos) = parse_xsb(level)?;
    let player_pos = player_pos.ok_or(ParserErr::NoPlayer)?;
    let grid = Vec2d::new(&grid);

    Ok(Level::new(GoalMap::new(grid, goals), player_pos, boxes))
}

/// What one XSB character puts on its square.
#[derive(Debug, Clone, Copy)]
struct Tile {
    cell: MapCell,
    has_box: bool,
    has_player: bool,
}

impl Tile {
    fn decode(c: char) -> Option<Tile> {
        let (cell, has_box, has_player) = match c {
            '#' => (MapCell::Wall, false, false),
            ' ' | '-' | '_' => (MapCell::Empty, false, false),
            '.' => (MapCell::Goal, false, false),
            '$' | 'b' => (MapCell::Empty, true, false),
            '*' | 'B' => (MapCell::Goal, true, false),
            '@' | 'p' => (MapCell::Empty, false, true),
            '+' | 'P' => (MapCell::Goal, false, true),
            _ => return None,
        };
        Some(Tile {
            cell,
            has_box,
            has_player,
        })
    }
}

/// Parses (a subset of) the format described [here](http://www.sokobano.de/wiki/index.php?title=Level_format)
#[allow(clippy::type_complexity)]
fn parse_xsb(
    level: &str,
) -> Result<(Vec<Vec<MapCell>>, Vec<Pos>, Vec<Pos>, Option<Pos>), ParserErr> {
    let mut grid = Vec::new();
    let mut goals = Vec::new();
    let mut boxes = Vec::new();
    let mut player_pos = None;

    for (r, line) in level.lines().enumerate() {
        if r >= MAX_SIZE {
            return Err(ParserErr::TooLarge);
        }
        let mut row = Vec::with_capacity(line.len());
        for (c, ch) in line.chars().enumerate() {
            if c >= MAX_SIZE {
                return Err(ParserErr::TooLarge);
            }
            let tile = Tile::decode(ch).ok_or(ParserErr::Pos(r, c))?;
            let pos = Pos::new(r as u8, c as u8);

            if tile.has_player && player_pos.replace(pos).is_some() {
                return Err(ParserErr::MultiplePlayers);
            }
            if tile.has_box {
                boxes.push(pos);
            }
            if tile.cell == MapCell::Goal {
                goals.push(pos);
            }
            row.push(tile.cell);
        }
        grid.push(row);
    }

    Ok((grid, goals, boxes, player_pos))
}
