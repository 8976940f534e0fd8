//! Iterative compression. Vertices are added one at a time to an induced subgraph whose minimum
//! odd cycle transversal is known. If the transversal breaks, the new vertex joins it and the
//! shrink step tries to get back to the old size.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};
use crate::bitset::Bitset;
use crate::checkpoint::{CancelToken, Checkpoint, Snapshot};
use crate::config::{Preprocessing, SolverConfig};
use crate::graph::Graph;
use crate::heuristics::{density_order, EnsembleSolver, HeuristicResult};
use crate::occ_problem::{is_occ, OccProblem};

/// Result of a run.
#[derive(Debug, Clone)]
pub struct Solution {
    /// An odd cycle transversal of the whole graph.
    pub snapshot: Snapshot,
    /// `true` if every vertex was processed without interruption, the transversal is then minimum.
    pub complete: bool,
    pub augmentations: u64,
    pub shrink_calls: usize,
    pub heuristic: Option<HeuristicResult>,
}

pub struct IterativeCompression<'a> {
    graph: &'a Graph,
    config: SolverConfig,
    cancel: CancelToken,
    checkpoint: Checkpoint,
    /// Vertices of the current induced subgraph.
    sub: Bitset,
    /// Working transversal of `graph[sub]`.
    occ: Bitset,
    finished: usize,
    interrupted: bool,
    augmentations: u64,
    shrink_calls: usize,
    heuristic: Option<HeuristicResult>,
}

impl<'a> IterativeCompression<'a> {

    /// Prepares the processing order. With heuristic preprocessing the ensemble runs here, and
    /// its bipartite subgraph becomes the starting point.
    pub fn new(graph: &'a Graph, config: SolverConfig, cancel: CancelToken) -> Self {
        let mut sub = Bitset::new(graph.size());
        let (mut order, heuristic) = if !config.preprocessing.uses_heuristics() {
            (graph.vertices().collect::<Vec<_>>(), None)
        } else {
            let result = EnsembleSolver::default().heuristic_solve(graph, config.heuristic_budget, config.seed, &cancel);
            for v in &result.bipartite {
                sub.set(*v);
            }
            let order = if config.preprocessing == Preprocessing::Density {
                density_order(graph, &result.bipartite, &result.cover)
            } else {
                result.cover.clone()
            };
            (order, Some(result))
        };
        if config.shuffle && config.preprocessing != Preprocessing::Density {
            order.shuffle(&mut StdRng::seed_from_u64(config.seed));
        }
        debug!(kept = sub.count(), pending = order.len(), "processing order prepared");
        IterativeCompression {
            graph,
            checkpoint: Checkpoint::new(graph.size(), order),
            occ: Bitset::new(graph.size()),
            sub,
            config,
            cancel,
            finished: 0,
            interrupted: false,
            augmentations: 0,
            shrink_calls: 0,
            heuristic,
        }
    }

    /// Returns the checkpoint, which other threads may `export` at any time.
    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// Checks if all vertices are processed.
    pub fn is_done(&self) -> bool {
        self.finished == self.checkpoint.order().len()
    }

    fn commit(&self) {
        let mut progress = self.checkpoint.begin();
        progress.occ.clone_from(&self.occ);
        progress.finished = self.finished;
    }

    /// Processes the next vertex of the order.
    ///
    /// Returns `false` if there was none left.
    pub fn step(&mut self) -> bool {
        let Some(&v) = self.checkpoint.order().get(self.finished) else {
            return false
        };
        self.sub.set(v);
        self.finished += 1;
        let g2 = self.graph.subgraph(&self.sub);
        if is_occ(&g2, &self.occ) {
            self.commit();
            return true
        }
        self.occ.set(v);
        self.commit();

        self.shrink_calls += 1;
        let last = self.config.assume_last_outside.then_some(v);
        let mut problem = OccProblem::new(&g2, &self.occ, self.config.strategy, last).with_cancel(&self.cancel);
        let smaller = problem.solve();
        self.augmentations += problem.augmentations();
        match smaller {
            Some(smaller) => {
                self.occ = smaller;
                self.commit();
            },
            None if self.cancel.is_cancelled() => self.interrupted = true,
            None => {},
        }
        debug!(vertex = v, step = self.finished, occ = self.occ.count(), "compression step");
        true
    }

    /// Processes vertices until all are done or the run is cancelled.
    pub fn run(mut self) -> Solution {
        while !self.is_done() {
            if self.cancel.is_cancelled() {
                self.interrupted = true;
                break
            }
            self.step();
        }
        let snapshot = self.checkpoint.export();
        let complete = self.is_done() && !self.interrupted;
        info!(size = snapshot.size(), complete, augmentations = self.augmentations, shrink_calls = self.shrink_calls, "compression done");
        Solution {
            snapshot,
            complete,
            augmentations: self.augmentations,
            shrink_calls: self.shrink_calls,
            heuristic: self.heuristic,
        }
    }

}

/// Computes an odd cycle transversal of `graph`, minimum unless cancelled.
pub fn solve(graph: &Graph, config: SolverConfig, cancel: CancelToken) -> Solution {
    IterativeCompression::new(graph, config, cancel).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use proptest::prelude::{prop, proptest, prop_assert, prop_assert_eq, ProptestConfig};
    use proptest::strategy::Strategy as _;
    use std::io::Cursor;
    use std::time::Duration;

    fn configs() -> Vec<SolverConfig> {
        let mut configs = Vec::new();
        for preprocessing in [Preprocessing::None, Preprocessing::Bipartite, Preprocessing::Density] {
            for strategy in [Strategy::Enum2Col, Strategy::GrayCode] {
                configs.push(SolverConfig {
                    preprocessing,
                    strategy,
                    heuristic_budget: Duration::ZERO,
                    seed: 5,
                    ..SolverConfig::default()
                });
            }
        }
        configs
    }

    fn solved_size(graph: &Graph, config: SolverConfig) -> usize {
        let solution = solve(graph, config, CancelToken::new());
        assert!(solution.complete);
        assert!(solution.snapshot.pending.is_empty());
        assert!(is_occ(graph, &solution.snapshot.to_bitset()));
        solution.snapshot.size()
    }

    #[test]
    fn odd_cycle_test() {
        let graph = Graph::read_gr(Cursor::new("p td 5 5\n1 2\n2 3\n3 4\n4 5\n5 1\n")).unwrap();
        for config in configs() {
            assert_eq!(solved_size(&graph, config), 1);
        }
    }

    #[test]
    fn bipartite_test() {
        let even_cycle = Graph::read_gr(Cursor::new("p td 6 6\n1 2\n2 3\n3 4\n4 5\n5 6\n6 1\n")).unwrap();
        let tree = Graph::read_gr(Cursor::new("p td 6 5\n1 2\n1 3\n2 4\n2 5\n3 6\n")).unwrap();
        for config in configs() {
            let solution = solve(&even_cycle, config.clone(), CancelToken::new());
            assert_eq!(solution.snapshot.size(), 0);
            assert_eq!(solution.shrink_calls, 0);
            assert_eq!(solved_size(&tree, config), 0);
        }
    }

    #[test]
    fn two_triangles_test() {
        let graph = Graph::read_gr(Cursor::new("p td 6 6\n1 2\n2 3\n3 1\n4 5\n5 6\n6 4\n")).unwrap();
        for config in configs() {
            assert_eq!(solved_size(&graph, config), 2);
        }
    }

    #[test]
    fn empty_graph_test() {
        let graph = Graph::new(0);
        let solution = solve(&graph, SolverConfig::default(), CancelToken::new());
        assert!(solution.complete);
        assert_eq!(solution.snapshot.size(), 0);
    }

    #[test]
    fn self_loop_test() {
        let mut graph = Graph::read_gr(Cursor::new("p td 4 3\n1 2\n2 3\n3 1\n")).unwrap();
        graph.connect(3, 3);
        for config in configs() {
            let solution = solve(&graph, config, CancelToken::new());
            assert_eq!(solution.snapshot.size(), 2);
            assert!(solution.snapshot.occ.get(3));
        }
    }

    #[test]
    fn cancelled_test() {
        // complete graph on 8 vertices: minimum transversal of size 6
        let mut graph = Graph::with_vertices(8);
        for v in 0..8 {
            for w in (v + 1)..8 {
                graph.connect(v, w);
            }
        }
        let cancel = CancelToken::new();
        let config = SolverConfig::default();
        let mut compression = IterativeCompression::new(&graph, config, cancel.clone());
        for _ in 0..4 {
            assert!(compression.step());
        }
        let exported = compression.checkpoint().export();
        assert_eq!(exported.pending.len(), 4);
        assert!(is_occ(&graph, &exported.to_bitset()));
        cancel.cancel();
        let solution = compression.run();
        assert!(!solution.complete);
        assert_eq!(solution.snapshot, exported);
        assert_eq!(solution.snapshot.size(), 6);

        // cancelled before the first step
        let solution = solve(&graph, SolverConfig::default(), cancel);
        assert!(!solution.complete);
        assert_eq!(solution.snapshot.pending.len(), 8);
        assert!(is_occ(&graph, &solution.snapshot.to_bitset()));
    }

    #[test]
    fn cancelled_during_run_test() {
        let mut graph = Graph::with_vertices(30);
        for v in 0..30 {
            for w in [(v + 1) % 30, (v + 7) % 30, (v + 11) % 30] {
                graph.connect(v, w);
            }
        }
        let cancel = CancelToken::new();
        let compression = IterativeCompression::new(&graph, SolverConfig::default(), cancel.clone());
        let solution = std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(Duration::from_millis(5));
                cancel.cancel();
            });
            compression.run()
        });
        assert!(is_occ(&graph, &solution.snapshot.to_bitset()));
    }

    #[test]
    fn order_test() {
        let graph = Graph::read_gr(Cursor::new("p td 6 6\n1 2\n2 3\n3 1\n4 5\n5 6\n6 4\n")).unwrap();
        let config = SolverConfig {
            shuffle: false,
            ..SolverConfig::default()
        };
        let compression = IterativeCompression::new(&graph, config.clone(), CancelToken::new());
        assert_eq!(compression.checkpoint().order(), &[0, 1, 2, 3, 4, 5]);
        let compression = IterativeCompression::new(&graph, SolverConfig { seed: 1, ..config }, CancelToken::new());
        let mut order = compression.checkpoint().order().to_vec();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
        let density = SolverConfig {
            preprocessing: Preprocessing::Density,
            heuristic_budget: Duration::ZERO,
            ..SolverConfig::default()
        };
        let compression = IterativeCompression::new(&graph, density, CancelToken::new());
        assert_eq!(compression.checkpoint().order().len(), 2);
    }

    fn brute_force_minimum(graph: &Graph) -> usize {
        let n = graph.size();
        (0u32..(1 << n))
            .filter(|mask| is_occ(graph, &Bitset::from_ids(n, (0..n).filter(|v| mask & (1 << v) != 0))))
            .map(|mask| mask.count_ones() as usize)
            .min()
            .unwrap_or(n)
    }

    fn arb_graph(max_n: usize) -> impl proptest::strategy::Strategy<Value = Graph> {
        (1..max_n).prop_flat_map(|n| {
            prop::collection::vec((0..n, 0..n), 0..(3 * n)).prop_map(move |edges| {
                let mut graph = Graph::with_vertices(n);
                for (v, w) in edges {
                    graph.connect(v, w);
                }
                graph
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn compression_is_minimum(graph in arb_graph(10), seed in 0u64..100) {
            let minimum = brute_force_minimum(&graph);
            for config in configs() {
                let solution = solve(&graph, SolverConfig { seed, ..config }, CancelToken::new());
                prop_assert!(solution.complete);
                prop_assert!(is_occ(&graph, &solution.snapshot.to_bitset()));
                prop_assert_eq!(solution.snapshot.size(), minimum);
            }
        }
    }

}
