use std::sync::Arc;

use crate::config::HeuristicWeights;
use crate::data::{MapCell, Pos};
use crate::map::GoalMap;
use crate::moves::Moves;
use crate::state::State;

use super::a_star::{Engine, Variant};
use super::board::Board;
use super::preprocessing::AreaShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MacroStep {
    pub(crate) player_pos: Pos,
    pub(crate) box_pos: Pos,
}

/// Moves a box from the entrance of an area onto one of its goals.
#[derive(Debug, Clone)]
pub(crate) struct Macro {
    pub(crate) goal: Pos,
    /// Goals of the area that must already have a box, sorted.
    pub(crate) filled: Vec<Pos>,
    /// Starts with the player behind the entrance.
    pub(crate) moves: Moves,
    /// Positions after each move.
    pub(crate) steps: Vec<MacroStep>,
}

impl Macro {
    pub(crate) fn player_end(&self) -> Option<Pos> {
        self.steps.last().map(|step| step.player_pos)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct GoalArea {
    pub(crate) entrance: Pos,
    /// Where the player stands to push a box from the entrance into the area.
    pub(crate) player_start: Pos,
    pub(crate) squares: Vec<Pos>,
    pub(crate) goals: Vec<Pos>,
    /// `macros[k - 1]` is the one to use when `k` goals are free.
    pub(crate) macros: Vec<Macro>,
}

impl GoalArea {
    pub(crate) fn new(map: &GoalMap, shape: AreaShape) -> GoalArea {
        let macros = solve_goals(map, &shape, &shape.goals);
        debug!(
            "Goal area behind {:?}: {} squares, {} goals, {} macros",
            shape.entrance,
            shape.squares.len(),
            shape.goals.len(),
            macros.len()
        );
        GoalArea {
            entrance: shape.entrance,
            player_start: shape.entrance - shape.dir,
            squares: shape.squares,
            goals: shape.goals,
            macros,
        }
    }

    /// The macro for the current fill level, if the area contains nothing but boxes on
    /// exactly the goals the macro expects.
    ///
    /// `boxes` must be sorted.
    pub(crate) fn applicable_macro(&self, boxes: &[Pos]) -> Option<&Macro> {
        let mut filled = Vec::new();
        for &b in boxes {
            if self.squares.binary_search(&b).is_ok() {
                if self.goals.binary_search(&b).is_err() {
                    return None;
                }
                filled.push(b);
            }
        }

        let free = self.goals.len() - filled.len();
        if free == 0 {
            return None;
        }
        self.macros
            .get(free - 1)
            .filter(|mac| mac.filled == filled)
    }
}

/// Picks which goal is filled last, solves it with the others walled off and recurses
/// to find the order for the rest.
fn solve_goals(map: &GoalMap, shape: &AreaShape, goals_left: &[Pos]) -> Vec<Macro> {
    for &goal in goals_left {
        let filled: Vec<_> = goals_left.iter().cloned().filter(|&g| g != goal).collect();
        if let Some(mac) = solve_goal(map, shape, goal, filled.clone()) {
            let mut macros = vec![mac];
            macros.extend(solve_goals(map, shape, &filled));
            return macros;
        }
    }
    Vec::new()
}

fn solve_goal(map: &GoalMap, shape: &AreaShape, goal: Pos, filled: Vec<Pos>) -> Option<Macro> {
    let player_start = shape.entrance - shape.dir;

    // nothing outside the area matters, filled goals act as walls
    let mut grid = map.grid.scratchpad_with_default(MapCell::Wall);
    grid[player_start] = MapCell::Empty;
    grid[shape.entrance] = MapCell::Empty;
    for &pos in &shape.squares {
        grid[pos] = if pos == goal {
            MapCell::Goal
        } else if filled.contains(&pos) {
            MapCell::Wall
        } else {
            MapCell::Empty
        };
    }

    let board = Arc::new(Board::plain(GoalMap::new(grid, vec![goal])));
    let start = State::new(
        board.grid(),
        Some(player_start),
        vec![shape.entrance],
        Vec::new(),
        Moves::default(),
    );
    let mut engine = Engine::new(
        Arc::clone(&board),
        Variant::Push,
        HeuristicWeights::default(),
        start,
    );
    while !engine.step().is_done() {}
    let node = engine.terminal()?;

    let mut moves = Moves::default();
    for segment in engine.segments_to(node) {
        moves.extend(&segment);
    }

    let mut player_pos = player_start;
    let mut box_pos = shape.entrance;
    let mut steps = Vec::with_capacity(moves.move_cnt());
    for mov in &moves {
        player_pos = player_pos + mov.dir;
        if player_pos == box_pos {
            box_pos = box_pos + mov.dir;
        }
        steps.push(MacroStep {
            player_pos,
            box_pos,
        });
    }
    trace!("Macro for {:?} with {:?} filled: {}", goal, filled, moves);

    Some(Macro {
        goal,
        filled,
        moves,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::SolverConfig;
    use crate::level::Level;
    use crate::solver::process_level;

    fn area_level() -> Level {
        r"
#######
#@ $$ #
#  $  #
### ###
 #   #
 #   #
 #...#
 #####
"
        .parse()
        .unwrap()
    }

    #[test]
    fn fill_order() {
        let (board, _) = process_level(&area_level(), &SolverConfig::default()).unwrap();
        assert_eq!(board.goal_areas.len(), 1);

        let area = &board.goal_areas[0];
        assert_eq!(area.entrance, Pos::new(3, 3));
        assert_eq!(area.player_start, Pos::new(2, 3));
        assert_eq!(area.squares.len(), 9);
        assert_eq!(area.macros.len(), 3);

        assert_eq!(area.macros[0].goal, Pos::new(6, 2));
        assert_eq!(area.macros[0].filled, vec![Pos::new(6, 3), Pos::new(6, 4)]);
        assert_eq!(area.macros[1].goal, Pos::new(6, 3));
        assert_eq!(area.macros[1].filled, vec![Pos::new(6, 4)]);
        assert_eq!(area.macros[1].moves.to_string(), "DDD");
        assert_eq!(area.macros[2].goal, Pos::new(6, 4));
        assert_eq!(area.macros[2].filled, vec![]);

        for mac in &area.macros {
            let last = mac.steps.last().unwrap();
            assert_eq!(last.box_pos, mac.goal);
            assert_eq!(mac.player_end(), Some(last.player_pos));
            assert_eq!(mac.steps.len(), mac.moves.move_cnt());
        }
    }

    #[test]
    fn applicability() {
        let (board, _) = process_level(&area_level(), &SolverConfig::default()).unwrap();
        let area = &board.goal_areas[0];

        let empty_area = vec![Pos::new(1, 3), Pos::new(1, 4), Pos::new(3, 3)];
        let mac = area.applicable_macro(&empty_area).unwrap();
        assert_eq!(mac.goal, Pos::new(6, 4));

        let one_filled = vec![Pos::new(1, 3), Pos::new(3, 3), Pos::new(6, 4)];
        let mac = area.applicable_macro(&one_filled).unwrap();
        assert_eq!(mac.goal, Pos::new(6, 3));

        // filled in a different order than planned
        let wrong_goal = vec![Pos::new(1, 3), Pos::new(3, 3), Pos::new(6, 2)];
        assert!(area.applicable_macro(&wrong_goal).is_none());

        // a box inside the area but not on a goal
        let off_goal = vec![Pos::new(1, 3), Pos::new(3, 3), Pos::new(5, 3)];
        assert!(area.applicable_macro(&off_goal).is_none());
    }

    #[test]
    fn macros_disabled() {
        let config = SolverConfig {
            goal_macros: false,
            ..SolverConfig::default()
        };
        let (board, _) = process_level(&area_level(), &config).unwrap();
        assert!(board.goal_areas.is_empty());
    }
}
