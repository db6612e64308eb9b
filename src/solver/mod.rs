pub(crate) mod a_star;
pub(crate) mod bidirectional;
pub(crate) mod board;
pub(crate) mod expand;
pub(crate) mod goal_area;
pub(crate) mod preprocessing;
pub(crate) mod solution;

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use crate::config::{SolverConfig, Strategy};
use crate::data::MAX_BOXES;
use crate::level::Level;
use crate::map::GoalMap;
use crate::moves::Moves;
use crate::state::State;
use crate::Solve;

pub use self::a_star::Stats;
pub use self::solution::Solution;

use self::a_star::{Engine, Variant};
use self::bidirectional::{Link, Meeting, MeetingPoint, Side};
use self::board::Board;
use self::preprocessing::check_reachability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverErr {
    IncompleteBorder,
    UnreachableBoxes,
    UnreachableGoals,
    TooMany,
    BoxesGoals,
}

impl Display for SolverErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            SolverErr::IncompleteBorder => write!(f, "Incomplete border"),
            SolverErr::UnreachableBoxes => write!(
                f,
                "Unreachable boxes - some boxes are not on goal but can't be reached"
            ),
            SolverErr::UnreachableGoals => write!(
                f,
                "Unreachable goals - some goals don't have a box but can't be reached"
            ),
            SolverErr::TooMany => write!(f, "More than 254 reachable boxes or goals"),
            SolverErr::BoxesGoals => write!(f, "Different number of reachable boxes and goals"),
        }
    }
}

impl Error for SolverErr {}

/// Where a search (or a pair of them) is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Initialized,
    Running,
    /// An engine reached its own goal.
    Solved,
    /// Nothing left to expand, the level has no solution.
    Exhausted,
    /// The two engines of a bidirectional search met.
    Rendezvous,
}

impl Status {
    pub fn is_done(self) -> bool {
        match self {
            Status::Initialized | Status::Running => false,
            Status::Solved | Status::Exhausted | Status::Rendezvous => true,
        }
    }
}

pub struct SolverOk {
    pub moves: Option<Moves>,
    pub stats: Stats,
    pub(crate) strategy: Strategy,
}

impl SolverOk {
    fn new(moves: Option<Moves>, stats: Stats, strategy: Strategy) -> Self {
        Self {
            moves,
            stats,
            strategy,
        }
    }
}

impl Debug for SolverOk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.moves {
            None => writeln!(f, "No solution")?,
            Some(ref moves) => writeln!(f, "{}: {}", self.strategy, moves)?,
        }
        write!(f, "{}", self.stats)
    }
}

/// A search over one level, stepped by the caller.
pub struct Solver {
    board: Arc<Board>,
    start: State,
    strategy: Strategy,
    forward: Option<Engine>,
    backward: Option<Engine>,
    meeting: Arc<MeetingPoint>,
    backward_turn: bool,
    status: Status,
}

impl Solver {
    pub fn new(level: &Level, config: &SolverConfig) -> Result<Solver, SolverErr> {
        debug!("Processing level...");
        let (board, start) = process_level(level, config)?;
        debug!("Processed level");

        let board = Arc::new(board);
        let meeting = Arc::new(MeetingPoint::default());
        let forward = Engine::new(
            Arc::clone(&board),
            Variant::Push,
            config.weights,
            start.clone(),
        );

        let (forward, backward) = match config.strategy {
            Strategy::Forward => (forward, None),
            Strategy::Bidirectional | Strategy::ParallelBidirectional => {
                let root = State::new(
                    board.grid(),
                    None,
                    board.map.goals.clone(),
                    Vec::new(),
                    Moves::default(),
                );
                let backward = Engine::new(
                    Arc::clone(&board),
                    Variant::Pull {
                        start: start.clone(),
                    },
                    config.weights,
                    root,
                );
                let (forward_link, backward_link) = Link::pair(Arc::clone(&meeting));
                (
                    forward.with_link(forward_link),
                    Some(backward.with_link(backward_link)),
                )
            }
        };

        Ok(Solver {
            board,
            start,
            strategy: config.strategy,
            forward: Some(forward),
            backward,
            meeting,
            backward_turn: false,
            status: Status::Initialized,
        })
    }

    pub fn set_print_status(&mut self, print_status: bool) {
        for engine in self.forward.iter_mut().chain(self.backward.iter_mut()) {
            engine.set_print_status(print_status);
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Advances the search.
    ///
    /// Sequential strategies expand one state per call, alternating engines when
    /// searching from both ends. The parallel strategy runs to the end in one call.
    pub fn step(&mut self) -> Status {
        if self.status.is_done() {
            return self.status;
        }

        match self.strategy {
            Strategy::Forward => {
                if let Some(forward) = self.forward.as_mut() {
                    self.status = forward.step();
                }
            }
            Strategy::Bidirectional => {
                let backward_turn = self.backward_turn;
                self.backward_turn = !backward_turn;
                if let (Some(forward), Some(backward)) =
                    (self.forward.as_mut(), self.backward.as_mut())
                {
                    // a finished engine gives its turns to the other one
                    let engine = if (backward_turn && !backward.status().is_done())
                        || forward.status().is_done()
                    {
                        &mut *backward
                    } else {
                        &mut *forward
                    };
                    engine.step();
                }
                self.status = self.combined_status();
            }
            Strategy::ParallelBidirectional => {
                if let (Some(forward), Some(backward)) = (self.forward.take(), self.backward.take())
                {
                    let (forward, backward) = bidirectional::run_parallel(forward, backward);
                    self.forward = Some(forward);
                    self.backward = Some(backward);
                }
                self.status = self.combined_status();
            }
        }
        if self.status.is_done() {
            debug!("{} search done: {:?}", self.strategy, self.status);
        }
        self.status
    }

    fn combined_status(&self) -> Status {
        match self.meeting.get() {
            Some(Meeting::Solved { .. }) => Status::Solved,
            Some(Meeting::Rendezvous { .. }) => Status::Rendezvous,
            None => {
                let exhausted = |engine: &Option<Engine>| {
                    engine
                        .as_ref()
                        .map_or(true, |engine| engine.status() == Status::Exhausted)
                };
                if exhausted(&self.forward) && exhausted(&self.backward) {
                    Status::Exhausted
                } else {
                    Status::Running
                }
            }
        }
    }

    /// The moves from the initial position, once the search is done and found something.
    pub fn solution(&self) -> Option<Solution> {
        let forward = self.forward.as_ref()?;
        let meeting = match self.meeting.get() {
            Some(meeting) => meeting,
            None => Meeting::Solved {
                side: Side::Forward,
                node: forward.terminal()?,
            },
        };
        Some(solution::assemble(
            self.board.grid(),
            &self.start,
            meeting,
            forward,
            self.backward.as_ref(),
        ))
    }

    pub fn stats(&self) -> Stats {
        let mut stats = Stats::new();
        for engine in self.forward.iter().chain(self.backward.iter()) {
            stats.merge(engine.stats());
        }
        stats
    }
}

impl Debug for Solver {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} solver: {:?}", self.strategy, self.status)?;
        for engine in self.forward.iter().chain(self.backward.iter()) {
            writeln!(f, "{:?}", engine)?;
        }
        Ok(())
    }
}

impl Solve for Level {
    fn solve(&self, config: &SolverConfig, print_status: bool) -> Result<SolverOk, SolverErr> {
        solve(self, config, print_status)
    }
}

fn solve(level: &Level, config: &SolverConfig, print_status: bool) -> Result<SolverOk, SolverErr> {
    let mut solver = Solver::new(level, config)?;
    solver.set_print_status(print_status);
    while !solver.step().is_done() {}

    let moves = solver.solution().map(|solution| solution.moves());
    match moves {
        Some(ref moves) => info!(
            "Solved: {} moves, {} pushes",
            moves.move_cnt(),
            moves.push_cnt()
        ),
        None => info!("No solution"),
    }
    Ok(SolverOk::new(moves, solver.stats(), config.strategy))
}

pub(crate) fn process_level(
    level: &Level,
    config: &SolverConfig,
) -> Result<(Board, State), SolverErr> {
    // Guarantees we have here:
    // - the player exists and therefore map is at least 1x1.
    // - rows and cols is <= 255
    // Do some more low level checking so we can omit some checks later.

    let (processed_grid, visited) = check_reachability(&level.map.grid, level.player_pos)?;

    // make sure all relevant game elements are reachable
    let mut reachable_goals = Vec::new();
    let mut reachable_boxes = Vec::new();
    for &pos in &level.boxes {
        if visited[pos] {
            reachable_boxes.push(pos);
        } else if !level.map.goals.contains(&pos) {
            return Err(SolverErr::UnreachableBoxes);
        }
    }
    for &pos in &level.map.goals {
        if visited[pos] {
            reachable_goals.push(pos);
        } else if !level.boxes.contains(&pos) {
            return Err(SolverErr::UnreachableGoals);
        }
    }

    if reachable_boxes.len() != reachable_goals.len() {
        return Err(SolverErr::BoxesGoals);
    }

    // only 254 because 255 is used to represent empty in the box grid
    if reachable_boxes.len() > MAX_BOXES {
        return Err(SolverErr::TooMany);
    }

    let processed_map = GoalMap::new(processed_grid, reachable_goals);
    let board = Board::new(processed_map, config);
    let start = State::new(
        board.grid(),
        Some(level.player_pos),
        reachable_boxes,
        Vec::new(),
        Moves::default(),
    );
    Ok((board, start))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::Pos;

    const STRATEGIES: [Strategy; 3] = [
        Strategy::Forward,
        Strategy::Bidirectional,
        Strategy::ParallelBidirectional,
    ];

    fn solve_with(level: &Level, strategy: Strategy) -> SolverOk {
        level
            .solve(&SolverConfig::with_strategy(strategy), false)
            .unwrap()
    }

    #[test]
    fn unreachable_boxes() {
        let level = r"
########
#@$.#$.#
########
";
        let level: Level = level.parse().unwrap();
        assert_eq!(
            process_level(&level, &SolverConfig::default()).err(),
            Some(SolverErr::UnreachableBoxes)
        );
    }

    #[test]
    fn unreachable_goals() {
        let level: Level = "#######\n#@$.#.#\n#######".parse().unwrap();
        assert_eq!(
            process_level(&level, &SolverConfig::default()).err(),
            Some(SolverErr::UnreachableGoals)
        );
    }

    #[test]
    fn boxes_goals() {
        let level: Level = "######\n#@$$.#\n######".parse().unwrap();
        assert_eq!(
            process_level(&level, &SolverConfig::default()).err(),
            Some(SolverErr::BoxesGoals)
        );
    }

    #[test]
    fn unreachable_box_on_goal_is_ignored() {
        let level: Level = "########\n#@$.#*##\n########".parse().unwrap();
        let (board, start) = process_level(&level, &SolverConfig::default()).unwrap();
        assert_eq!(start.boxes, vec![Pos::new(1, 2)]);
        assert_eq!(board.map.goals, vec![Pos::new(1, 3)]);
    }

    #[test]
    fn simplest() {
        let level: Level = "#####\n#@$.#\n#####".parse().unwrap();
        for &strategy in &STRATEGIES {
            let moves = solve_with(&level, strategy).moves.unwrap();
            assert_eq!(moves.to_string(), "R");
            assert_eq!(level.replay(&moves), Some(vec![Pos::new(1, 3)]));
        }
    }

    #[test]
    fn already_solved() {
        let level: Level = "#####\n#@ *#\n#####".parse().unwrap();
        for &strategy in &STRATEGIES {
            let moves = solve_with(&level, strategy).moves.unwrap();
            assert!(moves.is_empty());
        }
    }

    #[test]
    fn no_boxes() {
        let level: Level = "#####\n#@  #\n#####".parse().unwrap();
        for &strategy in &STRATEGIES {
            let mut solver = Solver::new(&level, &SolverConfig::with_strategy(strategy)).unwrap();
            while !solver.step().is_done() {}
            assert_eq!(solver.status(), Status::Solved);
            assert!(solver.solution().unwrap().moves().is_empty());
        }
    }

    #[test]
    fn stepping() {
        let level: Level = "#####\n#@$.#\n#####".parse().unwrap();
        let mut solver =
            Solver::new(&level, &SolverConfig::with_strategy(Strategy::Forward)).unwrap();
        assert_eq!(solver.status(), Status::Initialized);
        assert!(solver.solution().is_none());
        assert_eq!(solver.step(), Status::Running);
        assert_eq!(solver.step(), Status::Solved);
        // nothing changes once done
        assert_eq!(solver.step(), Status::Solved);
        assert_eq!(solver.solution().unwrap().segments().len(), 1);
        assert_eq!(solver.stats().total_unique_visited(), 2);
    }

    #[test]
    fn solvability_agrees() {
        let solvable: Level = r"
#######
#@  $.#
# $   #
#    .#
#######
"
        .parse()
        .unwrap();
        // the box at (2, 1) starts on a dead end
        let unsolvable: Level = r"
#######
#@   .#
#$    #
#  $ .#
#######
"
        .parse()
        .unwrap();

        for &strategy in &STRATEGIES {
            let moves = solve_with(&solvable, strategy).moves.unwrap();
            assert!(solvable.is_solution(&moves), "{}: {}", strategy, moves);

            assert!(solve_with(&unsolvable, strategy).moves.is_none());
        }
    }

    #[test]
    fn round_trip() {
        let level: Level = r"
#######
#@    #
# $$$ #
#     #
### ###
 #   #
 #   #
 #...#
 #####
"
        .parse()
        .unwrap();

        for &strategy in &STRATEGIES {
            for &goal_macros in &[true, false] {
                let config = SolverConfig {
                    strategy,
                    goal_macros,
                    ..SolverConfig::default()
                };
                let moves = level.solve(&config, false).unwrap().moves.unwrap();
                assert!(level.is_solution(&moves), "{}: {}", strategy, moves);
            }
        }
    }

    #[test]
    fn unsolvable_stats() {
        let level: Level = "#####\n#$@.#\n#####".parse().unwrap();
        let solver_ok = solve_with(&level, Strategy::Bidirectional);
        assert!(solver_ok.moves.is_none());
        assert!(solver_ok.stats.total_created() >= 2);
        assert!(format!("{:?}", solver_ok).starts_with("No solution\n"));
    }
}
