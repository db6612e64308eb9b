use crate::data::{MapCell, Pos};
use crate::moves::Moves;
use crate::state::State;
use crate::vec2d::Vec2d;

use super::a_star::Engine;
use super::bidirectional::{Meeting, Side};
use super::expand::{box_grid, Reachability};

// Terminology:
// move = changing player position by one cell
// push = a move that changes a box position
// step = a move that doesn't change a box position

/// A solution as the history segments of the states on its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    segments: Vec<Moves>,
}

impl Solution {
    pub fn segments(&self) -> &[Moves] {
        &self.segments
    }

    /// All segments as one sequence, playable from the initial position.
    pub fn moves(&self) -> Moves {
        let mut moves = Moves::default();
        for segment in &self.segments {
            moves.extend(segment);
        }
        moves
    }

    /// The same path walked backwards from the solved position.
    pub fn reversed(&self) -> Moves {
        self.moves().undo()
    }
}

/// Puts together the moves from the initial position to the solved one.
///
/// `start` is the initial state of the level, `forward` and `backward` the engines
/// the node indices in `meeting` belong to.
pub(crate) fn assemble(
    grid: &Vec2d<MapCell>,
    start: &State,
    meeting: Meeting,
    forward: &Engine,
    backward: Option<&Engine>,
) -> Solution {
    match meeting {
        Meeting::Solved {
            side: Side::Forward,
            node,
        } => from_forward(forward, node),
        Meeting::Solved {
            side: Side::Backward,
            node,
        } => {
            let backward = backward.expect("backward meeting without a backward engine");
            join(grid, start, backward, node)
        }
        Meeting::Rendezvous {
            forward: forward_node,
            backward: backward_node,
        } => {
            let backward = backward.expect("rendezvous without a backward engine");
            let mut solution = from_forward(forward, forward_node);
            let tail = join(grid, forward.state(forward_node), backward, backward_node);
            solution.segments.extend(tail.segments);
            solution
        }
    }
}

pub(crate) fn from_forward(forward: &Engine, node: usize) -> Solution {
    Solution {
        segments: forward.segments_to(node),
    }
}

/// Walks from `from` to where the backward engine's state at `node` has the player,
/// then replays the backward path in reverse.
///
/// Both states must have the same boxes.
fn join(grid: &Vec2d<MapCell>, from: &State, backward: &Engine, node: usize) -> Solution {
    let meeting_state = backward.state(node);
    debug_assert_eq!(from.boxes, meeting_state.boxes);

    let src = from
        .player_pos
        .expect("the joined state comes from the forward side");
    let dest = meeting_state
        .player_pos
        .expect("a state matching a forward state has a player");

    let pulls = backward.segments_to(node);
    if pulls.is_empty() {
        // met at a seed, the boxes are already on the goals
        return Solution {
            segments: Vec::new(),
        };
    }

    let mut segments = Vec::new();
    let bridge = player_steps(grid, &from.boxes, src, dest);
    if !bridge.is_empty() {
        segments.push(bridge);
    }
    segments.extend(pulls.iter().rev().map(|segment| segment.undo()));
    Solution { segments }
}

/// Shortest walk between two cells without moving boxes.
pub(crate) fn player_steps(
    grid: &Vec2d<MapCell>,
    boxes: &[Pos],
    src_pos: Pos,
    dest_pos: Pos,
) -> Moves {
    if src_pos == dest_pos {
        return Moves::default();
    }

    let box_grid = box_grid(grid, boxes);
    let reachable = Reachability::new(grid, &box_grid, src_pos);
    assert!(
        reachable.contains(dest_pos),
        "Couldn't find a path from {:?} to {:?}",
        src_pos,
        dest_pos
    );
    reachable.path_to(dest_pos)
}
