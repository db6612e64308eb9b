use std::hash::{Hash, Hasher};

use crate::data::{MapCell, Pos};
use crate::moves::Moves;
use crate::vec2d::Vec2d;

/// A search node's configuration.
///
/// Two states are equal when their boxes are equal and the player is in the
/// same region, no matter where exactly inside it the player stands.
/// The region is represented by its smallest cell.
#[derive(Debug, Clone)]
pub(crate) struct State {
    /// `None` only for the initial state of the pull search.
    pub(crate) player_pos: Option<Pos>,
    /// Always sorted.
    pub(crate) boxes: Vec<Pos>,
    /// Boxes placed by a goal area macro, never moved again.
    pub(crate) finished: Vec<Pos>,
    /// How we got here from the previous state.
    pub(crate) moves: Moves,
    region: Option<Pos>,
}

impl State {
    pub(crate) fn new(
        grid: &Vec2d<MapCell>,
        player_pos: Option<Pos>,
        mut boxes: Vec<Pos>,
        finished: Vec<Pos>,
        moves: Moves,
    ) -> State {
        boxes.sort(); // sort to detect equal states when we reorder boxes
        let region = player_pos.map(|pos| canonical_pos(grid, &boxes, pos));
        State {
            player_pos,
            boxes,
            finished,
            moves,
            region,
        }
    }

    pub(crate) fn region(&self) -> Option<Pos> {
        self.region
    }

    pub(crate) fn is_finished(&self, box_pos: Pos) -> bool {
        self.finished.contains(&box_pos)
    }

    /// Just what's needed for comparison.
    pub(crate) fn without_history(&self) -> State {
        State {
            player_pos: self.player_pos,
            boxes: self.boxes.clone(),
            finished: Vec::new(),
            moves: Moves::default(),
            region: self.region,
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.region == other.region && self.boxes == other.boxes
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.region.hash(state);
        self.boxes.hash(state);
    }
}

/// The smallest cell reachable from `start` without walking through walls or boxes.
pub(crate) fn canonical_pos(grid: &Vec2d<MapCell>, boxes: &[Pos], start: Pos) -> Pos {
    let mut blocked = grid.scratchpad();
    for &b in boxes {
        blocked[b] = true;
    }

    let mut min = start;
    blocked[start] = true;
    let mut to_visit = vec![start];
    while let Some(cur) = to_visit.pop() {
        if cur < min {
            min = cur;
        }
        for &next in &cur.neighbors() {
            if grid[next] != MapCell::Wall && !blocked[next] {
                blocked[next] = true;
                to_visit.push(next);
            }
        }
    }
    min
}
