use std::collections::VecDeque;

use crate::data::{Dir, MapCell, Pos, DIRECTIONS};
use crate::moves::{Move, Moves};
use crate::state::State;
use crate::vec2d::Vec2d;

use super::board::Board;

/// Marks an empty cell in a box grid, box indices are always smaller.
pub(crate) const NO_BOX: u8 = 255;

pub(crate) enum Successors {
    /// A goal area macro applied, no other moves are worth trying.
    Macro(State),
    Moves(Vec<State>),
}

impl Successors {
    pub(crate) fn into_vec(self) -> Vec<State> {
        match self {
            Successors::Macro(state) => vec![state],
            Successors::Moves(states) => states,
        }
    }
}

pub(crate) fn box_grid(grid: &Vec2d<MapCell>, boxes: &[Pos]) -> Vec2d<u8> {
    let mut box_grid = grid.scratchpad_with_default(NO_BOX);
    for (i, &b) in boxes.iter().enumerate() {
        box_grid[b] = i as u8;
    }
    box_grid
}

/// Cells the player can walk to without moving any boxes.
pub(crate) struct Reachability {
    start: Pos,
    visited: Vec2d<bool>,
    came_from: Vec2d<Option<Dir>>,
}

impl Reachability {
    pub(crate) fn new(grid: &Vec2d<MapCell>, box_grid: &Vec2d<u8>, start: Pos) -> Self {
        let mut visited = grid.scratchpad();
        let mut came_from = grid.scratchpad();

        visited[start] = true;
        let mut to_visit = VecDeque::new();
        to_visit.push_back(start);
        while let Some(cur) = to_visit.pop_front() {
            for &dir in &DIRECTIONS {
                let next = cur + dir;
                if grid[next] != MapCell::Wall && box_grid[next] == NO_BOX && !visited[next] {
                    visited[next] = true;
                    came_from[next] = Some(dir);
                    to_visit.push_back(next);
                }
            }
        }

        Reachability {
            start,
            visited,
            came_from,
        }
    }

    pub(crate) fn contains(&self, pos: Pos) -> bool {
        self.visited[pos]
    }

    /// Shortest walk to `dest`, which must be reachable.
    pub(crate) fn path_to(&self, dest: Pos) -> Moves {
        let mut dirs = Vec::new();
        let mut cur = dest;
        while cur != self.start {
            let dir = self.came_from[cur].expect("path_to called with an unreachable cell");
            dirs.push(dir);
            cur = cur - dir;
        }
        Moves::new(dirs.into_iter().rev().map(|dir| Move::new(dir, false)).collect())
    }
}

pub(crate) fn expand_push(board: &Board, state: &State) -> Successors {
    let grid = board.grid();
    let player_pos = state
        .player_pos
        .expect("push states always know where the player is");
    let box_grid = box_grid(grid, &state.boxes);
    let reachable = Reachability::new(grid, &box_grid, player_pos);

    for area in &board.goal_areas {
        if box_grid[area.entrance] == NO_BOX || !reachable.contains(area.player_start) {
            continue;
        }
        if let Some(mac) = area.applicable_macro(&state.boxes) {
            let player_end = match mac.player_end() {
                Some(pos) => pos,
                None => continue,
            };
            let mut moves = reachable.path_to(area.player_start);
            moves.extend(&mac.moves);
            let boxes = state
                .boxes
                .iter()
                .map(|&b| if b == area.entrance { mac.goal } else { b })
                .collect();
            let mut finished = state.finished.clone();
            finished.push(mac.goal);
            trace!("Macro into {:?}: {}", mac.goal, moves);
            return Successors::Macro(State::new(grid, Some(player_end), boxes, finished, moves));
        }
    }

    let mut new_states = Vec::new();
    for (i, &box_pos) in state.boxes.iter().enumerate() {
        if state.is_finished(box_pos) {
            continue;
        }
        for &dir in &DIRECTIONS {
            let push_from = box_pos - dir;
            let mut dest = box_pos + dir;
            // dead_ends includes walls
            if !reachable.contains(push_from) || box_grid[dest] != NO_BOX || board.dead_ends[dest] {
                continue;
            }

            let mut moves = reachable.path_to(push_from);
            moves.add(Move::new(dir, true));
            if let Some(&end) = board.tunnels.get(&(dest, dir)) {
                while dest != end {
                    let next = dest + dir;
                    if box_grid[next] != NO_BOX || board.dead_ends[next] {
                        break;
                    }
                    moves.add(Move::new(dir, true));
                    dest = next;
                }
            }

            let mut new_boxes = state.boxes.clone();
            new_boxes[i] = dest;
            if is_frozen(board, &new_boxes, dest) {
                continue;
            }
            new_states.push(State::new(
                grid,
                Some(dest - dir),
                new_boxes,
                state.finished.clone(),
                moves,
            ));
        }
    }
    Successors::Moves(new_states)
}

pub(crate) fn expand_pull(board: &Board, state: &State) -> Vec<State> {
    let grid = board.grid();
    let box_grid = box_grid(grid, &state.boxes);
    let free = |pos: Pos| grid[pos] != MapCell::Wall && box_grid[pos] == NO_BOX;

    let player_pos = match state.player_pos {
        Some(pos) => pos,
        None => {
            // every region next to a box the player could pull from
            let mut seeds = Vec::new();
            for &box_pos in &state.boxes {
                for &dir in &DIRECTIONS {
                    let player_pos = box_pos + dir;
                    if !free(player_pos) || !free(player_pos + dir) {
                        continue;
                    }
                    let seed = State::new(
                        grid,
                        Some(player_pos),
                        state.boxes.clone(),
                        Vec::new(),
                        Moves::default(),
                    );
                    if !seeds.contains(&seed) {
                        seeds.push(seed);
                    }
                }
            }
            return seeds;
        }
    };

    let reachable = Reachability::new(grid, &box_grid, player_pos);
    let mut new_states = Vec::new();
    for (i, &box_pos) in state.boxes.iter().enumerate() {
        for &dir in &DIRECTIONS {
            // the box ends where the player stands and the player steps back
            let mut new_box_pos = box_pos + dir;
            let mut new_player_pos = new_box_pos + dir;
            if !reachable.contains(new_box_pos)
                || !free(new_player_pos)
                || board.dead_ends[new_box_pos]
            {
                continue;
            }

            let mut moves = reachable.path_to(new_box_pos);
            moves.add(Move::new(dir, true));
            while board.tunnels.contains_key(&(new_box_pos, dir))
                && free(new_player_pos + dir)
                && !board.dead_ends[new_player_pos]
            {
                new_box_pos = new_player_pos;
                new_player_pos = new_player_pos + dir;
                moves.add(Move::new(dir, true));
            }

            let mut new_boxes = state.boxes.clone();
            new_boxes[i] = new_box_pos;
            new_states.push(State::new(
                grid,
                Some(new_player_pos),
                new_boxes,
                Vec::new(),
                moves,
            ));
        }
    }
    new_states
}

/// Whether the box at `pos` can never move again.
///
/// A box on a goal is never considered frozen, neither is anything blocked only by it.
fn is_frozen(board: &Board, boxes: &[Pos], pos: Pos) -> bool {
    let mut occupied = board.grid().scratchpad();
    for &b in boxes {
        occupied[b] = true;
    }
    let mut visited = Vec::new();
    is_frozen_rec(board, &occupied, pos, &mut visited)
}

fn is_frozen_rec(board: &Board, occupied: &Vec2d<bool>, pos: Pos, visited: &mut Vec<Pos>) -> bool {
    let grid = board.grid();
    if grid[pos] == MapCell::Goal {
        return false;
    }
    visited.push(pos);

    let free = |p: Pos| grid[p] != MapCell::Wall && !occupied[p];
    for &(a, b) in &[(Dir::Up, Dir::Down), (Dir::Left, Dir::Right)] {
        let (pa, pb) = (pos + a, pos + b);
        if free(pa) && free(pb) && (!board.dead_ends[pa] || !board.dead_ends[pb]) {
            return false;
        }
    }

    // boxes already on the way are assumed frozen
    for &next in &pos.neighbors() {
        if occupied[next]
            && !visited.contains(&next)
            && !is_frozen_rec(board, occupied, next, visited)
        {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::SolverConfig;
    use crate::level::Level;
    use crate::solver::process_level;

    fn prepare(level: &str) -> (Board, State) {
        let level: Level = level.parse().unwrap();
        process_level(&level, &SolverConfig::default()).unwrap()
    }

    #[test]
    fn corner_excluded() {
        let (board, state) = prepare(
            r"
######
# $ .#
#   @#
######
",
        );
        assert!(board.dead_ends[Pos::new(1, 1)]);
        assert!(!board.dead_ends[Pos::new(1, 3)]);

        let successors = expand_push(&board, &state).into_vec();
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].boxes, vec![Pos::new(1, 3)]);
        assert_eq!(successors[0].moves.push_cnt(), 1);
        assert_eq!(successors[0].moves.to_string(), "llluR");
    }

    #[test]
    fn freeze_excluded() {
        let (board, state) = prepare(
            r"
#######
#  $ .#
# $   #
#@   .#
#######
",
        );
        let successors = expand_push(&board, &state).into_vec();
        let frozen = vec![Pos::new(1, 2), Pos::new(1, 3)];
        assert!(successors.iter().all(|s| s.boxes != frozen));

        // the same pair is fine when one of them came from the side
        let sideways = vec![Pos::new(1, 2), Pos::new(2, 2)];
        assert!(successors.iter().any(|s| s.boxes == sideways));
    }

    #[test]
    fn frozen_on_goal() {
        let (board, _) = prepare(
            r"
#######
#  * .#
# $   #
#@    #
#######
",
        );
        let boxes = vec![Pos::new(1, 2), Pos::new(1, 3)];
        assert!(!is_frozen(&board, &boxes, Pos::new(1, 2)));
    }

    #[test]
    fn push_through_tunnel() {
        let (board, state) = prepare(
            r"
#########
#@$    .#
#########
",
        );
        let successors = expand_push(&board, &state).into_vec();
        assert_eq!(successors.len(), 1);
        // the tunnel ends next to the goal
        assert_eq!(successors[0].boxes, vec![Pos::new(1, 6)]);
        assert_eq!(successors[0].moves.to_string(), "RRRR");
    }

    #[test]
    fn no_tunnels() {
        let level: Level = "#########\n#@$    .#\n#########".parse().unwrap();
        let config = SolverConfig {
            tunnels: false,
            ..SolverConfig::default()
        };
        let (board, state) = process_level(&level, &config).unwrap();
        let successors = expand_push(&board, &state).into_vec();
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].boxes, vec![Pos::new(1, 3)]);
    }

    #[test]
    fn macro_replaces_pushes() {
        let (board, state) = prepare(
            r"
#######
#@ $$ #
#  $  #
### ###
 #   #
 #   #
 #...#
 #####
",
        );
        let at_entrance = State::new(
            board.grid(),
            state.player_pos,
            vec![Pos::new(1, 4), Pos::new(2, 5), Pos::new(3, 3)],
            Vec::new(),
            Moves::default(),
        );
        match expand_push(&board, &at_entrance) {
            Successors::Macro(next) => {
                assert!(next.boxes.contains(&Pos::new(6, 4)));
                assert!(!next.boxes.contains(&Pos::new(3, 3)));
                assert_eq!(next.finished, vec![Pos::new(6, 4)]);
                // walk to (2, 3) first
                assert!(next.moves.to_string().starts_with("rrd"));
            }
            Successors::Moves(_) => panic!("expected a macro"),
        }
    }

    #[test]
    fn pull_seeds() {
        let (board, _) = prepare(
            r"
#######
#@$ . #
#  $  #
#   . #
#######
",
        );
        let root = State::new(
            board.grid(),
            None,
            board.map.goals.clone(),
            Vec::new(),
            Moves::default(),
        );
        let seeds = expand_pull(&board, &root);
        // the player can get anywhere around the goals so all seeds are the same region
        assert_eq!(seeds.len(), 1);
        assert!(seeds.iter().all(|s| s.moves.is_empty()));

        let pulls = expand_pull(&board, &seeds[0]);
        assert!(!pulls.is_empty());
        for pull in &pulls {
            assert_eq!(pull.moves.iter().last().map(|m| m.is_push()), Some(true));
            for &b in &pull.boxes {
                assert!(!board.dead_ends[b]);
            }
        }
    }

    #[test]
    fn reachability_path() {
        let (board, state) = prepare(
            r"
######
#@ #.#
#  $ #
#    #
######
",
        );
        let box_grid = box_grid(board.grid(), &state.boxes);
        let reachable = Reachability::new(board.grid(), &box_grid, Pos::new(1, 1));
        assert!(reachable.contains(Pos::new(1, 4)));
        assert!(!reachable.contains(Pos::new(2, 3)));
        assert_eq!(reachable.path_to(Pos::new(1, 1)).move_cnt(), 0);
        assert_eq!(reachable.path_to(Pos::new(1, 4)).move_cnt(), 7);
    }
}
