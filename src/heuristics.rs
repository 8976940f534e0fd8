//! Greedy heuristics for large induced bipartite subgraphs. Their complement is an odd cycle
//! transversal which the iterative compression starts from.
//!
//! Vertices with a self loop are never part of a bipartite subgraph.

use fxhash::FxHashSet;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use crate::bitset::Bitset;
use crate::checkpoint::CancelToken;
use crate::graph::{Graph, Vertex};

/// A heuristic returns the vertices of an induced bipartite subgraph.
pub type Heuristic = fn(&Graph, &mut StdRng) -> Vec<Vertex>;

/// Returns the present vertices without a self loop.
fn eligible(graph: &Graph) -> Bitset {
    Bitset::from_ids(graph.size(), graph.vertices().filter(|v| !graph.has_edge(*v, *v)))
}

/// Greedily picks an independent set among `alive` by repeatedly taking a vertex of minimum
/// degree (ties broken at random) and removing it and its neighbors from `alive`.
pub fn min_degree_ind_set(graph: &Graph, alive: &mut Bitset, rng: &mut StdRng) -> Vec<Vertex> {
    let mut degree: Vec<usize> = (0..graph.size())
        .map(|v| if alive.get(v) { graph.neighbors(v).filter(|w| alive.get(*w)).count() } else { 0 })
        .collect();
    let mut set = Vec::new();
    while let Some(min) = alive.iter().map(|v| degree[v]).min() {
        let ties: Vec<Vertex> = alive.iter().filter(|v| degree[*v] == min).collect();
        let v = *ties.choose(rng).expect("`ties` contains a vertex of minimum degree");
        set.push(v);
        let mut removed = vec![v];
        removed.extend(graph.neighbors(v).filter(|w| alive.get(*w)));
        for u in &removed {
            alive.unset(*u);
        }
        for u in removed {
            for w in graph.neighbors(u) {
                if alive.get(w) {
                    degree[w] -= 1;
                }
            }
        }
    }
    set
}

/// Picks an independent set among `alive` in rounds: every vertex draws a random priority and
/// joins if it beats all of its neighbors. Joined vertices and their neighbors leave `alive`.
pub fn luby_ind_set(graph: &Graph, alive: &mut Bitset, rng: &mut StdRng) -> Vec<Vertex> {
    let mut priority = vec![0u64; graph.size()];
    let mut set = Vec::new();
    while !alive.is_clear() {
        for v in alive.iter() {
            priority[v] = rng.gen();
        }
        let selected: Vec<Vertex> = alive
            .iter()
            .filter(|v| {
                graph.neighbors(*v)
                    .filter(|w| *w != *v && alive.get(*w))
                    .all(|w| (priority[*v], *v) < (priority[w], w))
            })
            .collect();
        for v in selected {
            set.push(v);
            alive.unset(v);
            for w in graph.neighbors(v) {
                alive.unset(w);
            }
        }
    }
    set
}

/// Joins two independent sets: the second one is chosen in the graph without the first.
fn two_independent_sets(graph: &Graph, rng: &mut StdRng, ind_set: fn(&Graph, &mut Bitset, &mut StdRng) -> Vec<Vertex>) -> Vec<Vertex> {
    let candidates = eligible(graph);
    let mut alive = candidates.clone();
    let mut first = ind_set(graph, &mut alive, rng);
    let mut alive = candidates;
    for v in &first {
        alive.unset(*v);
    }
    first.extend(ind_set(graph, &mut alive, rng));
    first
}

/// Two greedy minimum degree independent sets.
pub fn greedy_bipartite(graph: &Graph, rng: &mut StdRng) -> Vec<Vertex> {
    two_independent_sets(graph, rng, min_degree_ind_set)
}

/// Two randomized independent sets.
pub fn greedy_stochastic(graph: &Graph, rng: &mut StdRng) -> Vec<Vertex> {
    two_independent_sets(graph, rng, luby_ind_set)
}

/// Traverses the graph from random starting points and keeps every visited vertex whose kept
/// neighbors all have the same color, giving it the other color.
fn traversal_bipartite(graph: &Graph, rng: &mut StdRng, depth_first: bool) -> Vec<Vertex> {
    let candidates = eligible(graph);
    let mut starts: Vec<Vertex> = graph.vertices().collect();
    starts.shuffle(rng);
    let mut visited = Bitset::new(graph.size());
    let mut kept = Bitset::new(graph.size());
    let mut colors = Bitset::new(graph.size());
    let mut result = Vec::new();
    let mut frontier = VecDeque::new();
    for start in starts {
        if visited.get(start) {
            continue
        }
        visited.set(start);
        frontier.push_back(start);
        while let Some(v) = if depth_first { frontier.pop_back() } else { frontier.pop_front() } {
            let (mut zero, mut one) = (false, false);
            for w in graph.neighbors(v).filter(|w| kept.get(*w)) {
                if colors.get(w) {
                    one = true;
                } else {
                    zero = true;
                }
            }
            if candidates.get(v) && !(zero && one) {
                kept.set(v);
                if zero {
                    colors.set(v);
                }
                result.push(v);
            }
            for w in graph.neighbors(v) {
                if !visited.get(w) {
                    visited.set(w);
                    frontier.push_back(w);
                }
            }
        }
    }
    result
}

pub fn greedy_dfs_bipartite(graph: &Graph, rng: &mut StdRng) -> Vec<Vertex> {
    traversal_bipartite(graph, rng, true)
}

pub fn greedy_bfs_bipartite(graph: &Graph, rng: &mut StdRng) -> Vec<Vertex> {
    traversal_bipartite(graph, rng, false)
}

/// Orders `cover` greedily: each position takes the first remaining vertex with the most edges
/// into `bipartite` and into the vertices placed before it.
pub fn density_order(graph: &Graph, bipartite: &[Vertex], cover: &[Vertex]) -> Vec<Vertex> {
    let inside: FxHashSet<Vertex> = bipartite.iter().copied().collect();
    let mut score = vec![0usize; graph.size()];
    for v in cover {
        score[*v] = graph.neighbors(*v).filter(|w| inside.contains(w)).count();
    }
    let mut order = cover.to_vec();
    for i in 0..order.len() {
        let mut best = i;
        for j in (i + 1)..order.len() {
            if score[order[j]] > score[order[best]] {
                best = j;
            }
        }
        order.swap(i, best);
        for w in graph.neighbors(order[i]) {
            score[w] += 1;
        }
    }
    order
}

/// Result of the heuristic ensemble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicResult {
    /// Vertices of the largest induced bipartite subgraph found, ascending.
    pub bipartite: Vec<Vertex>,
    /// All other present vertices, ascending. An odd cycle transversal.
    pub cover: Vec<Vertex>,
    /// Time until the best result was found.
    pub elapsed: Duration,
    /// Number of heuristic runs.
    pub runs: u64,
}

/// Runs a list of heuristics round-robin, each run with the next seed.
pub struct EnsembleSolver {
    heuristics: Vec<(&'static str, Heuristic)>,
}

impl Default for EnsembleSolver {
    fn default() -> Self {
        EnsembleSolver {
            heuristics: vec![
                ("greedy_bipartite", greedy_bipartite as Heuristic),
                ("greedy_stochastic", greedy_stochastic),
                ("greedy_dfs_bipartite", greedy_dfs_bipartite),
                ("greedy_bfs_bipartite", greedy_bfs_bipartite),
            ],
        }
    }
}

impl EnsembleSolver {

    /// Creates an ensemble of the given named heuristics.
    ///
    /// Panics if `heuristics` is empty.
    pub fn new(heuristics: Vec<(&'static str, Heuristic)>) -> Self {
        assert!(!heuristics.is_empty(), "an ensemble needs at least one heuristic");
        EnsembleSolver {
            heuristics,
        }
    }

    /// Runs the heuristics until `budget` is used up or `cancel` is set, at least once. The
    /// `i`-th run uses the seed `seed + i`.
    ///
    /// Returns the largest bipartite subgraph found.
    pub fn heuristic_solve(&self, graph: &Graph, budget: Duration, seed: u64, cancel: &CancelToken) -> HeuristicResult {
        let start = Instant::now();
        let mut best: Option<Vec<Vertex>> = None;
        let mut elapsed = Duration::ZERO;
        let mut runs = 0;
        loop {
            let (name, heuristic) = self.heuristics[runs as usize % self.heuristics.len()];
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(runs));
            let result = heuristic(graph, &mut rng);
            runs += 1;
            if best.as_ref().map_or(true, |b| result.len() > b.len()) {
                debug!(heuristic = name, size = result.len(), "new best bipartite subgraph");
                elapsed = start.elapsed();
                best = Some(result);
            }
            if start.elapsed() >= budget || cancel.is_cancelled() {
                break
            }
        }
        let mut bipartite = best.expect("the loop ran at least once");
        bipartite.sort_unstable();
        let inside = Bitset::from_ids(graph.size(), bipartite.iter().copied());
        let cover: Vec<Vertex> = graph.vertices().filter(|v| !inside.get(*v)).collect();
        info!(runs, bipartite = bipartite.len(), cover = cover.len(), "heuristics done");
        HeuristicResult {
            bipartite,
            cover,
            elapsed,
            runs,
        }
    }

}
