//! Settings of a solver run.

use std::time::Duration;
use crate::cust_error::ProcessingError;

/// How the processing order of the iterative compression is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preprocessing {
    /// All vertices are processed, starting from an empty graph.
    #[default]
    None,
    /// A heuristic bipartite subgraph is taken as the starting point, only the vertices outside
    /// of it are processed.
    Bipartite,
    /// Like `Bipartite`, the remaining vertices are additionally ordered by density.
    Density,
}

impl Preprocessing {

    /// Returns the preprocessing for the command line level `0`, `1` or `2`.
    pub fn from_level(level: u8) -> Result<Self, ProcessingError> {
        match level {
            0 => Ok(Preprocessing::None),
            1 => Ok(Preprocessing::Bipartite),
            2 => Ok(Preprocessing::Density),
            _ => Err(ProcessingError::InvalidParameter(format!("unknown preprocessing level {}", level))),
        }
    }

    /// Checks if the heuristic ensemble has to run.
    pub fn uses_heuristics(&self) -> bool {
        !matches!(self, Preprocessing::None)
    }

}

/// How the 2-colorings of the kept part of a transversal are enumerated during a shrink step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Backtracking over proper colorings only, with a fresh flow per coloring.
    #[default]
    Enum2Col,
    /// All colorings in Gray code order, the flow is updated incrementally.
    GrayCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    pub preprocessing: Preprocessing,
    /// Seed for the heuristics and for shuffling the processing order.
    pub seed: u64,
    /// Time the heuristic ensemble may use.
    pub heuristic_budget: Duration,
    pub strategy: Strategy,
    /// Shrink steps may assume that the vertex added last is not part of the smaller transversal.
    /// Sound as long as every intermediate transversal is minimum.
    pub assume_last_outside: bool,
    /// Shuffle the processing order. Ignored with `Preprocessing::Density`.
    pub shuffle: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            preprocessing: Preprocessing::default(),
            seed: 0,
            heuristic_budget: Duration::from_millis(1000),
            strategy: Strategy::default(),
            assume_last_outside: true,
            shuffle: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_level_test() {
        assert_eq!(Preprocessing::from_level(0).unwrap(), Preprocessing::None);
        assert_eq!(Preprocessing::from_level(2).unwrap(), Preprocessing::Density);
        assert!(Preprocessing::from_level(3).is_err());
        assert!(!Preprocessing::None.uses_heuristics());
        assert!(Preprocessing::Density.uses_heuristics());
        let config = SolverConfig::default();
        assert_eq!(config.strategy, Strategy::Enum2Col);
        assert_eq!(config.heuristic_budget, Duration::from_secs(1));
    }

}
