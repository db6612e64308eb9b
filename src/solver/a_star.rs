use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use fnv::FnvHashMap;
use prettytable::{format, Cell, Row, Table};
use separator::Separatable;

use crate::config::HeuristicWeights;
use crate::data::{MapCell, Pos};
use crate::moves::Moves;
use crate::state::State;

use super::bidirectional::{Link, Meeting, Side};
use super::board::Board;
use super::expand::{expand_pull, expand_push};
use super::Status;

#[derive(Clone, PartialEq, Eq, Default)]
pub struct Stats {
    created_states: Vec<i32>,
    visited_states: Vec<i32>,
    duplicate_states: Vec<i32>,
}

impl Stats {
    pub fn new() -> Self {
        Stats::default()
    }

    pub fn total_created(&self) -> i32 {
        self.created_states.iter().sum::<i32>()
    }

    pub fn total_unique_visited(&self) -> i32 {
        self.visited_states.iter().sum::<i32>()
    }

    pub fn total_reached_duplicates(&self) -> i32 {
        self.duplicate_states.iter().sum::<i32>()
    }

    pub(crate) fn add_created(&mut self, depth: u32) -> bool {
        Self::add(&mut self.created_states, depth)
    }

    pub(crate) fn add_unique_visited(&mut self, depth: u32) -> bool {
        Self::add(&mut self.visited_states, depth)
    }

    pub(crate) fn add_reached_duplicate(&mut self, depth: u32) -> bool {
        Self::add(&mut self.duplicate_states, depth)
    }

    fn add(counts: &mut Vec<i32>, depth: u32) -> bool {
        let mut ret = false;

        // while because tunnels and macros skip depths
        while depth as usize >= counts.len() {
            counts.push(0);
            ret = true;
        }
        counts[depth as usize] += 1;
        ret
    }

    /// Adds the counts of another search, depth by depth.
    pub fn merge(&mut self, other: &Stats) {
        Self::merge_counts(&mut self.created_states, &other.created_states);
        Self::merge_counts(&mut self.visited_states, &other.visited_states);
        Self::merge_counts(&mut self.duplicate_states, &other.duplicate_states);
    }

    fn merge_counts(counts: &mut Vec<i32>, other: &[i32]) {
        if counts.len() < other.len() {
            counts.resize(other.len(), 0);
        }
        for (count, &o) in counts.iter_mut().zip(other) {
            *count += o;
        }
    }
}

impl Debug for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "created by depth: {:?}", self.created_states)?;
        writeln!(f, "reached duplicates by depth: {:?}", self.duplicate_states)?;
        writeln!(f, "unique visited by depth: {:?}", self.visited_states)?;
        writeln!(f, "total created: {}", self.total_created().separated_string())?;
        writeln!(
            f,
            "total reached duplicates: {}",
            self.total_reached_duplicates().separated_string()
        )?;
        writeln!(
            f,
            "total unique visited: {}",
            self.total_unique_visited().separated_string()
        )
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let created = self.total_created();
        let duplicates = self.total_reached_duplicates();
        let visited = self.total_unique_visited();
        let left = created - visited;
        writeln!(f, "States created total: {}", created.separated_string())?;
        writeln!(f, "Unique states visited total: {}", visited.separated_string())?;
        writeln!(f, "Reached duplicates total: {}", duplicates.separated_string())?;
        writeln!(f, "Created but not reached total: {}", left.separated_string())?;
        writeln!(f)?;

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_CLEAN);
        table.set_titles(Row::new(
            ["Depth", "Created", "Unique visited", "Duplicates", "Not reached"]
                .iter()
                .map(|title| Cell::new(title))
                .collect(),
        ));
        let at = |counts: &[i32], i: usize| counts.get(i).cloned().unwrap_or(0);
        // created_states should be the longest vec
        for i in 0..self.created_states.len() {
            let created = self.created_states[i];
            let visited = at(&self.visited_states, i);
            let duplicates = at(&self.duplicate_states, i);
            table.add_row(Row::new(vec![
                Cell::new(&format!("{}:", i)),
                Cell::new(&created.separated_string()),
                Cell::new(&visited.separated_string()),
                Cell::new(&duplicates.separated_string()),
                Cell::new(&(created - visited).separated_string()),
            ]));
        }
        write!(f, "{}", table)
    }
}

/// Whether boxes are pushed from the initial position or pulled from the goals.
#[derive(Debug, Clone)]
pub(crate) enum Variant {
    Push,
    /// Searches for `start`, the initial state of the level.
    Pull { start: State },
}

#[derive(Debug)]
struct SearchNode {
    state: State,
    prev: Option<usize>,
    /// Pushes (or pulls) from the root.
    dist: u32,
    closed: bool,
}

/// Ordered by f, then h, then insertion order so equal scores pop deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Queued {
    f: u32,
    h: u32,
    seq: u64,
    node: usize,
}

/// One best-first search, stepped by the caller.
///
/// Nodes are never removed, a node's predecessor is fixed when it's created.
/// Finding a cheaper path to an open state appends a new node
/// and the old queue entry is skipped when popped.
pub(crate) struct Engine {
    board: Arc<Board>,
    variant: Variant,
    weights: HeuristicWeights,
    nodes: Vec<SearchNode>,
    index: FnvHashMap<State, usize>,
    to_visit: BinaryHeap<Reverse<Queued>>,
    seq: u64,
    status: Status,
    terminal: Option<usize>,
    link: Option<Link>,
    stats: Stats,
    print_status: bool,
}

impl Engine {
    pub(crate) fn new(
        board: Arc<Board>,
        variant: Variant,
        weights: HeuristicWeights,
        root: State,
    ) -> Self {
        let mut engine = Engine {
            board,
            variant,
            weights,
            nodes: Vec::new(),
            index: FnvHashMap::default(),
            to_visit: BinaryHeap::new(),
            seq: 0,
            status: Status::Initialized,
            terminal: None,
            link: None,
            stats: Stats::new(),
            print_status: false,
        };
        engine.insert(root, None, 0);
        engine
    }

    /// Connects this engine to its counterpart searching from the other end.
    pub(crate) fn with_link(mut self, link: Link) -> Self {
        for (i, node) in self.nodes.iter().enumerate() {
            link.publish(&node.state, i);
        }
        self.link = Some(link);
        self
    }

    pub(crate) fn set_print_status(&mut self, print_status: bool) {
        self.print_status = print_status;
    }

    pub(crate) fn side(&self) -> Side {
        match self.variant {
            Variant::Push => Side::Forward,
            Variant::Pull { .. } => Side::Backward,
        }
    }

    pub(crate) fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The node that satisfied this engine's own goal test.
    pub(crate) fn terminal(&self) -> Option<usize> {
        self.terminal
    }

    pub(crate) fn state(&self, node: usize) -> &State {
        &self.nodes[node].state
    }

    /// History segments from the root to `node`, empty ones left out.
    pub(crate) fn segments_to(&self, node: usize) -> Vec<Moves> {
        let mut segments = Vec::new();
        let mut cur = Some(node);
        while let Some(i) = cur {
            let node = &self.nodes[i];
            if !node.state.moves.is_empty() {
                segments.push(node.state.moves.clone());
            }
            cur = node.prev;
        }
        segments.reverse();
        segments
    }

    pub(crate) fn step(&mut self) -> Status {
        if self.status.is_done() {
            return self.status;
        }
        self.status = Status::Running;

        if let Some(link) = &mut self.link {
            if link.meeting().get().is_some() {
                return self.finish(Status::Rendezvous);
            }
            link.receive();
        }

        let cur = match self.pop() {
            Some(cur) => cur,
            None => {
                debug!("{} search exhausted", self.side());
                return self.finish(Status::Exhausted);
            }
        };

        let dist = self.nodes[cur].dist;
        if self.stats.add_unique_visited(dist) && self.print_status {
            println!("{}: visited new depth: {}", self.side(), dist);
            println!("{:?}", self.stats);
        }

        if self.is_terminal(&self.nodes[cur].state) {
            self.terminal = Some(cur);
            let status = match &self.link {
                None => Status::Solved,
                Some(link) => {
                    let meeting = Meeting::Solved {
                        side: self.side(),
                        node: cur,
                    };
                    if link.meeting().claim(meeting) {
                        Status::Solved
                    } else {
                        Status::Rendezvous
                    }
                }
            };
            debug!("{} search reached its goal", self.side());
            return self.finish(status);
        }
        if let Some(status) = self.check_counterpart(cur) {
            return self.finish(status);
        }

        let successors = match &self.variant {
            Variant::Push => expand_push(&self.board, &self.nodes[cur].state).into_vec(),
            Variant::Pull { .. } => expand_pull(&self.board, &self.nodes[cur].state),
        };
        for child in successors {
            let dist = dist + child.moves.push_cnt() as u32;
            if let Some(&existing) = self.index.get(&child) {
                let node = &self.nodes[existing];
                if node.closed || node.dist <= dist {
                    self.stats.add_reached_duplicate(dist);
                    continue;
                }
            }
            let node = self.insert(child, Some(cur), dist);
            if let Some(status) = self.check_counterpart(node) {
                return self.finish(status);
            }
        }
        self.status
    }

    fn finish(&mut self, status: Status) -> Status {
        self.status = status;
        status
    }

    fn insert(&mut self, state: State, prev: Option<usize>, dist: u32) -> usize {
        let h = self.heuristic(&state);
        let node = self.nodes.len();
        if let Some(link) = &self.link {
            link.publish(&state, node);
        }
        self.index.insert(state.without_history(), node);
        self.nodes.push(SearchNode {
            state,
            prev,
            dist,
            closed: false,
        });
        self.seq += 1;
        self.to_visit.push(Reverse(Queued {
            f: dist + h,
            h,
            seq: self.seq,
            node,
        }));
        self.stats.add_created(dist);
        node
    }

    fn pop(&mut self) -> Option<usize> {
        while let Some(Reverse(queued)) = self.to_visit.pop() {
            let node = &self.nodes[queued.node];
            // superseded by a cheaper path
            if node.closed || self.index.get(&node.state) != Some(&queued.node) {
                continue;
            }
            self.nodes[queued.node].closed = true;
            return Some(queued.node);
        }
        None
    }

    fn check_counterpart(&self, node: usize) -> Option<Status> {
        let link = self.link.as_ref()?;
        let other = link.counterpart(&self.nodes[node].state)?;
        let meeting = match self.side() {
            Side::Forward => Meeting::Rendezvous {
                forward: node,
                backward: other,
            },
            Side::Backward => Meeting::Rendezvous {
                forward: other,
                backward: node,
            },
        };
        if link.meeting().claim(meeting) {
            debug!("{} search met its counterpart", self.side());
        }
        Some(Status::Rendezvous)
    }

    fn is_terminal(&self, state: &State) -> bool {
        match &self.variant {
            // all boxes on goals, not all goals filled, so extra goals are fine
            Variant::Push => state
                .boxes
                .iter()
                .all(|&b| self.board.grid()[b] == MapCell::Goal),
            Variant::Pull { start } => state.player_pos.is_some() && state == start,
        }
    }

    fn heuristic(&self, state: &State) -> u32 {
        let targets: &[Pos] = match &self.variant {
            Variant::Push => &self.board.map.goals,
            Variant::Pull { start } => &start.boxes,
        };

        let distance: u32 = targets
            .iter()
            .map(|&target| {
                state
                    .boxes
                    .iter()
                    .map(|&b| u32::from(b.dist(target)))
                    .min()
                    .unwrap_or(0)
            })
            .sum();
        let obstacles = state
            .boxes
            .iter()
            .filter(|b| !targets.contains(b))
            .count() as u32;

        u32::from(self.weights.goal_distance) * distance
            + u32::from(self.weights.move_count) * state.moves.move_cnt() as u32
            + u32::from(self.weights.obstacles) * obstacles
    }
}

impl Debug for Engine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} engine: {:?}, {} nodes, {} queued",
            self.side(),
            self.status,
            self.nodes.len(),
            self.to_visit.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::SolverConfig;
    use crate::level::Level;
    use crate::solver::process_level;

    fn forward_engine(level: &str) -> Engine {
        let level: Level = level.parse().unwrap();
        let (board, start) = process_level(&level, &SolverConfig::default()).unwrap();
        Engine::new(
            Arc::new(board),
            Variant::Push,
            HeuristicWeights::default(),
            start,
        )
    }

    fn run(engine: &mut Engine) -> Status {
        loop {
            let status = engine.step();
            if status.is_done() {
                return status;
            }
        }
    }

    #[test]
    fn queue_order() {
        let a = Queued { f: 3, h: 2, seq: 5, node: 0 };
        let b = Queued { f: 3, h: 1, seq: 9, node: 1 };
        let c = Queued { f: 3, h: 1, seq: 7, node: 2 };
        let mut heap: BinaryHeap<_> = vec![Reverse(a), Reverse(b), Reverse(c)].into();
        assert_eq!(heap.pop().unwrap().0.node, 2);
        assert_eq!(heap.pop().unwrap().0.node, 1);
        assert_eq!(heap.pop().unwrap().0.node, 0);
    }

    #[test]
    fn single_push() {
        let mut engine = forward_engine("#####\n#@$.#\n#####");
        assert_eq!(engine.status(), Status::Initialized);
        assert_eq!(engine.step(), Status::Running);
        assert_eq!(run(&mut engine), Status::Solved);

        let node = engine.terminal().unwrap();
        let segments = engine.segments_to(node);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].to_string(), "R");
        assert_eq!(engine.state(node).boxes, vec![Pos::new(1, 3)]);
    }

    #[test]
    fn done_is_final() {
        let mut engine = forward_engine("#####\n#@* #\n#####");
        assert_eq!(engine.step(), Status::Solved);
        assert_eq!(engine.step(), Status::Solved);
        assert_eq!(engine.stats().total_unique_visited(), 1);
    }

    #[test]
    fn exhausted() {
        let mut engine = forward_engine("#####\n#$@.#\n#####");
        assert_eq!(run(&mut engine), Status::Exhausted);
        assert_eq!(engine.terminal(), None);
    }

    #[test]
    fn stats_merge() {
        let mut a = Stats::new();
        a.add_created(0);
        a.add_created(2);
        a.add_unique_visited(0);
        let mut b = Stats::new();
        b.add_created(1);
        b.add_reached_duplicate(3);
        a.merge(&b);
        assert_eq!(a.created_states, vec![1, 1, 1]);
        assert_eq!(a.duplicate_states, vec![0, 0, 0, 1]);
        assert_eq!(a.total_created(), 3);
        assert_eq!(a.total_unique_visited(), 1);
        assert_eq!(a.total_reached_duplicates(), 1);

        let table = a.to_string();
        assert!(table.starts_with("States created total: 3\n"));
        assert!(table.contains("Unique visited"));
    }
}
