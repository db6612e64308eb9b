use std::fmt::{self, Debug, Display, Formatter};

use crate::data::{MapCell, Pos};
use crate::map::GoalMap;
use crate::map_formatter::MapFormatter;
use crate::moves::Moves;
use crate::solution_formatter::SolutionFormatter;

#[derive(Clone)]
pub struct Level {
    pub map: GoalMap,
    pub player_pos: Pos,
    pub boxes: Vec<Pos>,
}

impl Level {
    pub(crate) fn new(map: GoalMap, player_pos: Pos, boxes: Vec<Pos>) -> Self {
        Level {
            map,
            player_pos,
            boxes,
        }
    }

    pub fn xsb(&self) -> MapFormatter<'_> {
        self.map.format_with_state(Some(self.player_pos), &self.boxes)
    }

    pub fn xsb_solution<'a>(&'a self, moves: &'a Moves, include_steps: bool) -> SolutionFormatter<'a> {
        SolutionFormatter::new(&self.map, self.player_pos, &self.boxes, moves, include_steps)
    }

    /// Plays the moves from the initial position.
    ///
    /// Returns the final box positions or `None` if any move is illegal
    /// (walking into a wall, pushing into a wall or another box,
    /// or a move whose push flag doesn't match what happens).
    pub fn replay(&self, moves: &Moves) -> Option<Vec<Pos>> {
        let in_bounds = |pos: Pos| pos.r < self.map.rows() && pos.c < self.map.cols();
        let free = |pos: Pos, boxes: &[Pos]| {
            in_bounds(pos) && self.map.grid[pos] != MapCell::Wall && !boxes.contains(&pos)
        };

        let mut player_pos = self.player_pos;
        let mut boxes = self.boxes.clone();
        for mov in moves {
            let new_player_pos = player_pos + mov.dir;
            if !in_bounds(new_player_pos) || self.map.grid[new_player_pos] == MapCell::Wall {
                return None;
            }
            match boxes.iter().position(|&b| b == new_player_pos) {
                Some(index) => {
                    let push_dest = new_player_pos + mov.dir;
                    if !mov.is_push || !free(push_dest, &boxes) {
                        return None;
                    }
                    boxes[index] = push_dest;
                }
                None => {
                    if mov.is_push {
                        return None;
                    }
                }
            }
            player_pos = new_player_pos;
        }
        Some(boxes)
    }

    /// Every box ends on a goal after playing the moves.
    pub fn is_solution(&self, moves: &Moves) -> bool {
        match self.replay(moves) {
            Some(boxes) => boxes.iter().all(|&b| self.map.grid[b] == MapCell::Goal),
            None => false,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.xsb())
    }
}

impl Debug for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.xsb())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dir;
    use crate::moves::Move;

    #[test]
    fn formatting_level() {
        let xsb: &str = r"
*###*
#@$.#
*###*#
"
        .trim_start_matches('\n');

        let level: Level = xsb.parse().unwrap();
        assert_eq!(level.to_string(), xsb);
        assert_eq!(level.xsb().to_string(), xsb);
        assert_eq!(format!("{}", level), xsb);
        assert_eq!(format!("{:?}", level), xsb);
    }

    #[test]
    fn replaying() {
        let level: Level = r"
######
#@$ .#
######
"
        .parse()
        .unwrap();

        let push = Moves::new(vec![Move::new(Dir::Right, true), Move::new(Dir::Right, true)]);
        assert_eq!(level.replay(&push), Some(vec![Pos::new(1, 4)]));
        assert!(level.is_solution(&push));

        let short = Moves::new(vec![Move::new(Dir::Right, true)]);
        assert_eq!(level.replay(&short), Some(vec![Pos::new(1, 3)]));
        assert!(!level.is_solution(&short));

        // pushing without the push flag
        let unmarked = Moves::new(vec![Move::new(Dir::Right, false)]);
        assert_eq!(level.replay(&unmarked), None);

        // into the wall
        let wall = Moves::new(vec![Move::new(Dir::Up, false)]);
        assert_eq!(level.replay(&wall), None);

        // box into the wall
        let too_far = Moves::new(vec![
            Move::new(Dir::Right, true),
            Move::new(Dir::Right, true),
            Move::new(Dir::Right, true),
        ]);
        assert_eq!(level.replay(&too_far), None);
    }

    #[test]
    fn formatting_solution() {
        let level: Level = "#####\n#@$.#\n#####".parse().unwrap();
        let moves = Moves::new(vec![Move::new(Dir::Right, true)]);
        let expected = "#####\n#@$.#\n#####\n\n#####\n# @*#\n#####\n\n";
        assert_eq!(level.xsb_solution(&moves, false).to_string(), expected);
    }
}
