use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use crate::data::Dir;

/// One player move. `is_push` is set when a box moves with the player,
/// whether it's pushed forward or pulled backward.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub(crate) dir: Dir,
    pub(crate) is_push: bool,
}

impl Move {
    pub(crate) fn new(dir: Dir, is_push: bool) -> Self {
        Move { dir, is_push }
    }

    pub fn dir(self) -> Dir {
        self.dir
    }

    pub fn is_push(self) -> bool {
        self.is_push
    }

    /// The move that takes the player (and the box) back.
    pub(crate) fn inverse(self) -> Move {
        Move::new(self.dir.inverse(), self.is_push)
    }

    fn to_char(self) -> char {
        let c = match self.dir {
            Dir::Up => 'u',
            Dir::Right => 'r',
            Dir::Down => 'd',
            Dir::Left => 'l',
        };
        if self.is_push {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    fn from_char(c: char) -> Option<Move> {
        let dir = match c.to_ascii_lowercase() {
            'u' => Dir::Up,
            'r' => Dir::Right,
            'd' => Dir::Down,
            'l' => Dir::Left,
            _ => return None,
        };
        Some(Move::new(dir, c.is_ascii_uppercase()))
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A history segment, or a whole solution once segments are joined.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Moves(Vec<Move>);

impl Moves {
    pub(crate) fn new(moves: Vec<Move>) -> Self {
        Moves(moves)
    }

    pub fn move_cnt(&self) -> usize {
        self.0.len()
    }

    pub fn push_cnt(&self) -> usize {
        self.0.iter().filter(|m| m.is_push).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn add(&mut self, mov: Move) {
        self.0.push(mov);
    }

    pub(crate) fn extend(&mut self, moves: &Moves) {
        self.0.extend_from_slice(&moves.0);
    }

    /// The same path walked backwards.
    ///
    /// Pulls from the backward search turn into pushes in the opposite direction.
    pub(crate) fn undo(&self) -> Moves {
        self.0.iter().rev().map(|m| m.inverse()).collect()
    }

    pub fn iter(&self) -> ::std::slice::Iter<'_, Move> {
        self.0.iter()
    }
}

impl std::iter::FromIterator<Move> for Moves {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Moves(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Moves {
    type Item = &'a Move;
    type IntoIter = ::std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parses the LURD notation, e.g. `llluR`.
impl FromStr for Moves {
    type Err = char;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars().map(|c| Move::from_char(c).ok_or(c)).collect()
    }
}

impl Display for Moves {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for mov in self {
            write!(f, "{}", mov)?;
        }
        Ok(())
    }
}

impl Debug for Moves {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lurd_notation() {
        let moves: Moves = "urdlURDL".parse().unwrap();
        assert_eq!(moves.move_cnt(), 8);
        assert_eq!(moves.push_cnt(), 4);
        assert_eq!(moves.iter().next(), Some(&Move::new(Dir::Up, false)));
        assert_eq!(moves.to_string(), "urdlURDL");

        assert_eq!("ruX".parse::<Moves>(), Err('X'));
        assert!("".parse::<Moves>().unwrap().is_empty());
    }

    #[test]
    fn joining_segments() {
        let mut moves: Moves = "rrD".parse().unwrap();
        moves.extend(&"lU".parse().unwrap());
        moves.add(Move::new(Dir::Up, true));
        assert_eq!(moves.to_string(), "rrDlUU");
        assert_eq!(moves.push_cnt(), 3);
    }

    #[test]
    fn undoing() {
        // walk right twice, then pull a box left
        let moves: Moves = "rrL".parse().unwrap();
        assert_eq!(moves.undo().to_string(), "Rll");
        assert_eq!(moves.undo().undo(), moves);
        assert!(Moves::default().undo().is_empty());
    }
}
