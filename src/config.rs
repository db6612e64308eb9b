use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Push search from the initial position only.
    Forward,
    /// Push and pull search stepped alternately on one thread.
    Bidirectional,
    /// Push and pull search each on its own thread.
    ParallelBidirectional,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Strategy::Forward => write!(f, "forward"),
            Strategy::Bidirectional => write!(f, "bidirectional"),
            Strategy::ParallelBidirectional => write!(f, "parallel"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Strategy::Forward),
            "bidirectional" => Ok(Strategy::Bidirectional),
            "parallel" => Ok(Strategy::ParallelBidirectional),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

/// Weights of the terms of the heuristic. Less is better.
///
/// - `goal_distance`: sum over targets of the distance to the closest box
/// - `move_count`: moves in the last history segment of the state
/// - `obstacles`: boxes not yet on a target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeuristicWeights {
    pub goal_distance: u16,
    pub move_count: u16,
    pub obstacles: u16,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        HeuristicWeights {
            goal_distance: 1,
            move_count: 0,
            obstacles: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    pub strategy: Strategy,
    pub weights: HeuristicWeights,
    pub tunnels: bool,
    pub goal_macros: bool,
    pub goal_area_max_size: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            strategy: Strategy::Bidirectional,
            weights: HeuristicWeights::default(),
            tunnels: true,
            goal_macros: true,
            goal_area_max_size: 35,
        }
    }
}

impl SolverConfig {
    pub fn with_strategy(strategy: Strategy) -> Self {
        SolverConfig {
            strategy,
            ..SolverConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names() {
        for &strategy in &[
            Strategy::Forward,
            Strategy::Bidirectional,
            Strategy::ParallelBidirectional,
        ] {
            assert_eq!(strategy.to_string().parse::<Strategy>(), Ok(strategy));
        }
        assert!("sideways".parse::<Strategy>().is_err());
    }
}
