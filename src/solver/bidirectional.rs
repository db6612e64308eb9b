use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Barrier};
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use fnv::FnvHashMap;
use parking_lot::Mutex;

use crate::state::State;

use super::a_star::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Forward,
    Backward,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Side::Forward => write!(f, "forward"),
            Side::Backward => write!(f, "backward"),
        }
    }
}

/// How a bidirectional search ended, node indices refer to the engines' arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Meeting {
    /// One engine reached its own goal.
    Solved { side: Side, node: usize },
    /// Both engines found the same state.
    Rendezvous { forward: usize, backward: usize },
}

/// Set at most once, the first claim wins.
#[derive(Debug, Default)]
pub(crate) struct MeetingPoint {
    slot: Mutex<Option<Meeting>>,
}

impl MeetingPoint {
    pub(crate) fn claim(&self, meeting: Meeting) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(meeting);
        true
    }

    pub(crate) fn get(&self) -> Option<Meeting> {
        *self.slot.lock()
    }
}

/// One engine's end of the connection to its counterpart.
///
/// Every created state is sent to the other side, received states are indexed
/// so they can be looked up without sharing either engine's maps.
#[derive(Debug)]
pub(crate) struct Link {
    meeting: Arc<MeetingPoint>,
    sender: Sender<(State, usize)>,
    receiver: Receiver<(State, usize)>,
    counterpart: FnvHashMap<State, usize>,
}

impl Link {
    pub(crate) fn pair(meeting: Arc<MeetingPoint>) -> (Link, Link) {
        let (forward_tx, backward_rx) = unbounded();
        let (backward_tx, forward_rx) = unbounded();
        let forward = Link {
            meeting: Arc::clone(&meeting),
            sender: forward_tx,
            receiver: forward_rx,
            counterpart: FnvHashMap::default(),
        };
        let backward = Link {
            meeting,
            sender: backward_tx,
            receiver: backward_rx,
            counterpart: FnvHashMap::default(),
        };
        (forward, backward)
    }

    pub(crate) fn meeting(&self) -> &MeetingPoint {
        &self.meeting
    }

    pub(crate) fn publish(&self, state: &State, node: usize) {
        // fails only when the other engine is gone, then nobody needs it
        let _ = self.sender.send((state.without_history(), node));
    }

    /// Indexes everything the counterpart has published so far.
    pub(crate) fn receive(&mut self) {
        for (state, node) in self.receiver.try_iter() {
            // later nodes for the same state have a cheaper path
            self.counterpart.insert(state, node);
        }
    }

    pub(crate) fn counterpart(&self, state: &State) -> Option<usize> {
        self.counterpart.get(state).cloned()
    }
}

/// Runs both engines on their own threads until both are done.
///
/// Returns them as `(forward, backward)`.
pub(crate) fn run_parallel(forward: Engine, backward: Engine) -> (Engine, Engine) {
    let barrier = Arc::new(Barrier::new(2));
    let (tx, rx) = bounded(2);

    let handles: Vec<_> = vec![forward, backward]
        .into_iter()
        .map(|mut engine| {
            let barrier = Arc::clone(&barrier);
            let tx = tx.clone();
            thread::spawn(move || {
                while !engine.step().is_done() {}
                debug!("{} thread finished: {:?}", engine.side(), engine.status());
                // neither result is final until both sides stopped
                barrier.wait();
                // the receiver lives until both are collected
                let _ = tx.send(engine);
            })
        })
        .collect();
    drop(tx);

    let mut forward = None;
    let mut backward = None;
    for engine in rx.iter() {
        match engine.side() {
            Side::Forward => forward = Some(engine),
            Side::Backward => backward = Some(engine),
        }
    }
    for handle in handles {
        handle.join().expect("search thread panicked");
    }

    match (forward, backward) {
        (Some(forward), Some(backward)) => (forward, backward),
        _ => unreachable!("both search threads send their engine back"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::Pos;
    use crate::moves::Moves;
    use crate::vec2d::Vec2d;

    #[test]
    fn first_claim_wins() {
        let point = MeetingPoint::default();
        assert_eq!(point.get(), None);

        let first = Meeting::Rendezvous {
            forward: 3,
            backward: 5,
        };
        let second = Meeting::Solved {
            side: Side::Forward,
            node: 7,
        };
        assert!(point.claim(first));
        assert!(!point.claim(second));
        assert_eq!(point.get(), Some(first));
    }

    #[test]
    fn concurrent_claims() {
        let point = Arc::new(MeetingPoint::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let point = Arc::clone(&point);
                thread::spawn(move || {
                    point.claim(Meeting::Solved {
                        side: Side::Backward,
                        node: i,
                    })
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(wins, 1);
        assert!(point.get().is_some());
    }

    #[test]
    fn states_cross_over() {
        use crate::level::Level;

        let level: Level = "#####\n#@$.#\n#####".parse().unwrap();
        let grid: &Vec2d<_> = &level.map.grid;
        let state = State::new(
            grid,
            Some(Pos::new(1, 1)),
            vec![Pos::new(1, 2)],
            Vec::new(),
            Moves::default(),
        );

        let (forward, mut backward) = Link::pair(Arc::new(MeetingPoint::default()));
        assert_eq!(backward.counterpart(&state), None);
        forward.publish(&state, 4);
        assert_eq!(backward.counterpart(&state), None);
        backward.receive();
        assert_eq!(backward.counterpart(&state), Some(4));

        // nothing goes the other way
        let mut forward = forward;
        forward.receive();
        assert_eq!(forward.counterpart(&state), None);
    }
}
