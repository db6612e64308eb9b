use std::fmt::{self, Debug, Display, Formatter};

use crate::data::Pos;
use crate::map::GoalMap;
use crate::moves::Moves;

/// Renders the level after every push (and every step if `include_steps`).
pub struct SolutionFormatter<'a> {
    map: &'a GoalMap,
    initial_player_pos: Pos,
    initial_boxes: &'a [Pos],
    moves: &'a Moves,
    include_steps: bool,
}

impl<'a> SolutionFormatter<'a> {
    pub(crate) fn new(
        map: &'a GoalMap,
        initial_player_pos: Pos,
        initial_boxes: &'a [Pos],
        moves: &'a Moves,
        include_steps: bool,
    ) -> Self {
        Self {
            map,
            initial_player_pos,
            initial_boxes,
            moves,
            include_steps,
        }
    }
}

impl Display for SolutionFormatter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}",
            self.map
                .format_with_state(Some(self.initial_player_pos), self.initial_boxes)
        )?;

        let mut player_pos = self.initial_player_pos;
        let mut boxes = self.initial_boxes.to_vec();
        for &mov in self.moves {
            player_pos = player_pos + mov.dir;
            for b in &mut boxes {
                if *b == player_pos {
                    *b = *b + mov.dir;
                }
            }
            if mov.is_push || self.include_steps {
                writeln!(f, "{}", self.map.format_with_state(Some(player_pos), &boxes))?;
            }
        }
        Ok(())
    }
}

impl Debug for SolutionFormatter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
