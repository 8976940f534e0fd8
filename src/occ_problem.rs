//! The compression step: given an odd cycle transversal `X` of size `k+1`, find one of size `k`
//! or decide that none exists.
//!
//! Let `c` be a 2-coloring of the bipartite graph `C = g - X`. The split graph `h` contains `C`,
//! every `x` in `X` joined to its neighbors in `C` of color 0, and a clone `x'` of `x` joined to
//! its neighbors in `C` of color 1. A candidate consists of a set `Y` of `X` that is deleted and a
//! proper 2-coloring `a` of `g[X \ Y]`. If `a(x) = 1`, `x` is a source and `x'` a target, otherwise
//! the other way around. The candidate is feasible iff at most `k - |Y|` vertices separate the
//! sources from the targets in `h - Y`, and then `Y` together with such a separator (clones
//! replaced by their originals) is a transversal of size at most `k`.

use fxhash::FxHashMap;
use itertools::Itertools;
use tracing::{debug, trace};
use crate::bitset::Bitset;
use crate::checkpoint::CancelToken;
use crate::config::Strategy;
use crate::graph::{Graph, Vertex};

/// Outcome of the search over one deletion set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Search {
    Found(Bitset),
    Exhausted,
    Cancelled,
}

/// Checks if removing the vertices of `occ` leaves `g` bipartite.
pub fn is_occ(g: &Graph, occ: &Bitset) -> bool {
    let mut rest = Bitset::full(g.size());
    rest.setminus(occ);
    g.subgraph(&rest).is_bipartite()
}

/// Tries to find an odd cycle transversal of `g` with one vertex less than the transversal `occ`.
/// If `last` is given, it is assumed that a smaller transversal exists without it, which holds if
/// `last` is the only addition to a minimum transversal of `g - last`.
///
/// Returns `None` if no smaller transversal exists (under that assumption).
pub fn shrink(g: &Graph, occ: &Bitset, strategy: Strategy, last: Option<Vertex>) -> Option<Bitset> {
    OccProblem::new(g, occ, strategy, last).solve()
}

#[derive(Debug)]
pub struct OccProblem<'a> {
    pub(crate) g: &'a Graph,
    /// The split graph. Vertex ids of `g` are kept, clones start at `first_clone`.
    pub(crate) h: Graph,
    pub(crate) occ: Bitset,
    /// The members of `occ`, the clone of `occ_vertices[i]` is `first_clone + i`.
    pub(crate) occ_vertices: Vec<Vertex>,
    pub(crate) clones: Vec<Option<Vertex>>,
    pub(crate) first_clone: usize,
    /// 2-coloring of `g - occ`.
    pub(crate) coloring: Bitset,
    pub(crate) occ_size: usize,
    pub(crate) strategy: Strategy,
    pub(crate) last: Option<Vertex>,
    augmentations: u64,
    cancel: Option<&'a CancelToken>,
}

impl<'a> OccProblem<'a> {

    /// Builds the split graph for the transversal `occ` of `g`.
    ///
    /// Panics if `occ` is not an odd cycle transversal of `g`.
    pub fn new(g: &'a Graph, occ: &Bitset, strategy: Strategy, last: Option<Vertex>) -> Self {
        let occ_vertices: Vec<Vertex> = occ.iter().filter(|v| *v < g.size() && g.vertex_exists(*v)).collect();
        let occ = Bitset::from_ids(g.size(), occ_vertices.iter().copied());
        let mut rest = Bitset::full(g.size());
        rest.setminus(&occ);
        let mut h = g.subgraph(&rest);
        let mut coloring = Bitset::new(g.size());
        assert!(h.two_coloring(&mut coloring), "`occ` is an odd cycle transversal of `g`");

        let first_clone = g.size();
        h.grow(first_clone + occ_vertices.len());
        let mut clones = vec![None; g.size()];
        for (i, x) in occ_vertices.iter().copied().enumerate() {
            let clone = first_clone + i;
            clones[x] = Some(clone);
            h.vertex_enable(x);
            h.vertex_enable(clone);
            for w in g.neighbors(x).filter(|w| rest.get(*w)) {
                if coloring.get(w) {
                    h.connect(clone, w);
                } else {
                    h.connect(x, w);
                }
            }
        }
        OccProblem {
            g,
            h,
            occ_size: occ_vertices.len(),
            occ,
            occ_vertices,
            clones,
            first_clone,
            coloring,
            strategy,
            last,
            augmentations: 0,
            cancel: None,
        }
    }

    /// Lets the search poll `cancel` and give up once it is set.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns the 2-coloring of `g` minus the transversal. Members of the transversal are 0.
    pub fn coloring(&self) -> &Bitset {
        &self.coloring
    }

    /// Returns the number of flow augmentations done so far.
    pub fn augmentations(&self) -> u64 {
        self.augmentations
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|cancel| cancel.is_cancelled())
    }

    /// Returns the vertex of `g` that `v` of `h` stands for.
    pub(crate) fn original(&self, v: Vertex) -> Vertex {
        if v >= self.first_clone {
            self.occ_vertices[v - self.first_clone]
        } else {
            v
        }
    }

    /// Searches for a transversal of size `occ_size - 1` over all deletion sets.
    ///
    /// Returns `None` if there is none, or if the search was cancelled.
    pub fn solve(&mut self) -> Option<Bitset> {
        let k = self.occ_size.checked_sub(1)?;
        let (forced, free): (Vec<usize>, Vec<usize>) = (0..self.occ_size)
            .filter(|i| Some(self.occ_vertices[*i]) != self.last)
            .partition(|i| self.g.has_edge(self.occ_vertices[*i], self.occ_vertices[*i]));
        let last_loops = self.last.is_some_and(|l| self.occ.get(l) && self.g.has_edge(l, l));
        if last_loops || forced.len() > k {
            return None
        }
        debug!(k, forced = forced.len(), "shrinking transversal");
        for extra in 0..=(k - forced.len()) {
            for combination in free.iter().copied().combinations(extra) {
                if self.is_cancelled() {
                    return None
                }
                let mut deleted = forced.clone();
                deleted.extend(combination);
                match self.try_deletion(&deleted, k) {
                    Search::Found(result) => return Some(result),
                    Search::Exhausted => continue,
                    Search::Cancelled => return None,
                }
            }
        }
        None
    }

    /// Removes the members `deleted` (indices into `occ_vertices`) from `h` and searches all
    /// colorings of the remaining members.
    fn try_deletion(&mut self, deleted: &[usize], k: usize) -> Search {
        trace!(?deleted, "trying deletion set");
        for i in deleted {
            self.h.vertex_disable(self.occ_vertices[*i]);
            self.h.vertex_disable(self.first_clone + i);
        }
        let mut remaining: Vec<usize> = (0..self.occ_size).filter(|i| !deleted.contains(i)).collect();
        // the pivot goes first, its color is fixed
        if let Some(pos) = remaining.iter().position(|i| Some(self.occ_vertices[*i]) == self.last) {
            remaining.swap(0, pos);
        }
        let budget = k - deleted.len();
        let mut work = 0;
        let search = match self.strategy {
            Strategy::Enum2Col => self.enum2col(&remaining, deleted, budget, &mut work),
            Strategy::GrayCode => self.gray_code(&remaining, deleted, budget, &mut work),
        };
        self.augmentations += work;
        for i in deleted {
            self.h.vertex_enable(self.occ_vertices[*i]);
            self.h.vertex_enable(self.first_clone + i);
        }
        search
    }

    /// Returns, for every position in `remaining`, the positions of its neighbors in `g`.
    pub(crate) fn occ_neighbors(&self, remaining: &[usize]) -> Vec<Vec<usize>> {
        let position: FxHashMap<Vertex, usize> = remaining
            .iter()
            .enumerate()
            .map(|(pos, i)| (self.occ_vertices[*i], pos))
            .collect();
        remaining
            .iter()
            .enumerate()
            .map(|(pos, i)| {
                self.g
                    .neighbors(self.occ_vertices[*i])
                    .filter_map(|w| position.get(&w).copied())
                    .filter(|q| *q != pos)
                    .collect()
            })
            .collect()
    }

    /// Makes member `i` (an index into `occ_vertices`) with color `color` a terminal pair.
    pub(crate) fn set_terminals(&self, i: usize, color: bool, sources: &mut Bitset, targets: &mut Bitset) {
        let x = self.occ_vertices[i];
        let clone = self.clones[x].expect("every member has a clone");
        let (source, target) = if color { (x, clone) } else { (clone, x) };
        sources.set(source);
        sources.unset(target);
        targets.set(target);
        targets.unset(source);
    }

    /// Returns the source and target sets for the coloring `colors` of `remaining`.
    pub(crate) fn terminals(&self, remaining: &[usize], colors: &Bitset) -> (Bitset, Bitset) {
        let mut sources = Bitset::new(self.h.size());
        let mut targets = Bitset::new(self.h.size());
        for (pos, i) in remaining.iter().enumerate() {
            self.set_terminals(*i, colors.get(pos), &mut sources, &mut targets);
        }
        (sources, targets)
    }

    /// Turns the deleted members and a minimum separator of `h` into a transversal of `g` with
    /// exactly `occ_size - 1` vertices.
    ///
    /// Panics if the result is not an odd cycle transversal.
    pub(crate) fn extract(&self, deleted: &[usize], cut: &Bitset) -> Bitset {
        let mut result = Bitset::new(self.g.size());
        for i in deleted {
            result.set(self.occ_vertices[*i]);
        }
        for v in cut.iter() {
            result.set(self.original(v));
        }
        let k = self.occ_size - 1;
        let mut size = result.count();
        debug_assert!(size <= k);
        let padding = self.occ_vertices
            .iter()
            .copied()
            .filter(|x| Some(*x) != self.last)
            .chain(self.last.filter(|l| self.occ.get(*l)));
        for x in padding {
            if size >= k {
                break
            }
            if !result.get(x) {
                result.set(x);
                size += 1;
            }
        }
        assert!(is_occ(self.g, &result), "internal error: shrinking produced an invalid transversal {}", result);
        debug!(size, "found smaller transversal");
        result
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop, proptest, prop_assert, prop_assert_eq, ProptestConfig};
    use proptest::strategy::Strategy as _;
    use std::io::Cursor;

    fn c5() -> Graph {
        Graph::read_gr(Cursor::new("p td 5 5\n1 2\n2 3\n3 4\n4 5\n5 1\n")).unwrap()
    }

    #[test]
    fn is_occ_test() {
        let graph = c5();
        assert!(!is_occ(&graph, &Bitset::new(5)));
        assert!(is_occ(&graph, &Bitset::from_ids(5, vec![3])));
        assert!(is_occ(&graph, &Bitset::full(5)));
        let mut looped = Graph::with_vertices(2);
        looped.connect(1, 1);
        assert!(!is_occ(&looped, &Bitset::from_ids(2, vec![0])));
        assert!(is_occ(&looped, &Bitset::from_ids(2, vec![1])));
    }

    #[test]
    fn split_graph_test() {
        // triangle 0 1 2, transversal {0}
        let graph = Graph::read_gr(Cursor::new("p td 3 3\n1 2\n2 3\n3 1\n")).unwrap();
        let problem = OccProblem::new(&graph, &Bitset::from_ids(3, vec![0]), Strategy::Enum2Col, None);
        assert_eq!(problem.first_clone, 3);
        assert_eq!(problem.h.size(), 4);
        assert_eq!(problem.clones[0], Some(3));
        assert_eq!(problem.original(3), 0);
        // 0 and its clone each see exactly one of the two colors
        assert_eq!(problem.h.degree(0), 1);
        assert_eq!(problem.h.degree(3), 1);
        assert!(problem.h.has_edge(1, 2));
        assert_eq!(problem.h.num_edges(), 3);
        let n0 = problem.h.neighbors(0).next().unwrap();
        let n3 = problem.h.neighbors(3).next().unwrap();
        assert!(!problem.coloring().get(n0));
        assert!(problem.coloring().get(n3));
    }

    #[test]
    fn shrink_c5_test() {
        let graph = c5();
        for strategy in [Strategy::Enum2Col, Strategy::GrayCode] {
            let smaller = shrink(&graph, &Bitset::from_ids(5, vec![0, 2]), strategy, Some(2));
            assert!(smaller.is_some());
            let smaller = smaller.unwrap();
            assert_eq!(smaller.count(), 1);
            assert!(is_occ(&graph, &smaller));
            assert!(shrink(&graph, &smaller, strategy, None).is_none());
        }
    }

    #[test]
    fn shrink_minimum_test() {
        // triangle: {0} is minimum
        let graph = Graph::read_gr(Cursor::new("p td 3 3\n1 2\n2 3\n3 1\n")).unwrap();
        let mut problem = OccProblem::new(&graph, &Bitset::from_ids(3, vec![0]), Strategy::Enum2Col, None);
        assert!(problem.solve().is_none());
        assert_eq!(problem.augmentations(), 1);
        // nothing to shrink on a bipartite graph
        let path = Graph::read_gr(Cursor::new("p td 3 2\n1 2\n2 3\n")).unwrap();
        assert!(shrink(&path, &Bitset::new(3), Strategy::Enum2Col, None).is_none());
    }

    #[test]
    fn self_loop_test() {
        // self loop at 0 and the triangle 1 2 3
        let mut graph = Graph::read_gr(Cursor::new("p td 4 3\n2 3\n3 4\n4 2\n")).unwrap();
        graph.connect(0, 0);
        for strategy in [Strategy::Enum2Col, Strategy::GrayCode] {
            let smaller = shrink(&graph, &Bitset::from_ids(4, vec![0, 1, 2]), strategy, None).unwrap();
            assert_eq!(smaller.count(), 2);
            assert!(smaller.get(0));
            assert!(is_occ(&graph, &smaller));
            // the looped vertex can not be assumed to stay outside
            assert!(shrink(&graph, &Bitset::from_ids(4, vec![0, 1]), strategy, Some(0)).is_none());
        }
    }

    #[test]
    fn two_triangles_test() {
        let gr = Cursor::new("p td 6 6\n1 2\n2 3\n3 1\n4 5\n5 6\n6 4\n");
        let graph = Graph::read_gr(gr).unwrap();
        let occ = Bitset::from_ids(6, vec![0, 1, 3]);
        for strategy in [Strategy::Enum2Col, Strategy::GrayCode] {
            let smaller = shrink(&graph, &occ, strategy, None).unwrap();
            assert_eq!(smaller.count(), 2);
            assert!(is_occ(&graph, &smaller));
            assert!(shrink(&graph, &smaller, strategy, None).is_none());
        }
    }

    #[test]
    fn padding_test() {
        // a single edge and a far too large transversal
        let mut graph = Graph::with_vertices(4);
        graph.connect(0, 1);
        let smaller = shrink(&graph, &Bitset::from_ids(4, vec![0, 1, 2, 3]), Strategy::Enum2Col, Some(3)).unwrap();
        assert_eq!(smaller.count(), 3);
        assert!(!smaller.get(3));
    }

    #[test]
    fn cancelled_test() {
        let graph = c5();
        let token = CancelToken::new();
        token.cancel();
        let mut problem = OccProblem::new(&graph, &Bitset::from_ids(5, vec![0, 2]), Strategy::GrayCode, None)
            .with_cancel(&token);
        assert!(problem.solve().is_none());
        assert_eq!(problem.augmentations(), 0);
    }

    /// Greedily grows a bipartite induced subgraph and returns its complement.
    fn greedy_transversal(graph: &Graph) -> Bitset {
        let mut kept = Bitset::new(graph.size());
        for v in graph.vertices() {
            kept.set(v);
            if !graph.subgraph(&kept).is_bipartite() {
                kept.unset(v);
            }
        }
        kept.invert();
        kept
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
        (2..max_n).prop_flat_map(|n| {
            prop::collection::vec((0..n, 0..n), 0..(3 * n)).prop_map(move |edges| {
                let mut graph = Graph::with_vertices(n);
                for (v, w) in edges.into_iter().filter(|(v, w)| v != w) {
                    graph.connect(v, w);
                }
                graph
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn is_occ_matches_definition(graph in arb_graph(8), mask in 0u32..256) {
            let n = graph.size();
            let occ = Bitset::from_ids(n, (0..n).filter(|v| mask & (1 << v) != 0));
            // some coloring of all vertices must be proper on every edge outside of `occ`
            let outside: Vec<(Vertex, Vertex)> = graph.edges()
                .filter(|(v, w)| !occ.get(*v) && !occ.get(*w))
                .collect();
            let bipartite = (0u32..(1 << n))
                .any(|colors| outside.iter().all(|(v, w)| (colors >> v) & 1 != (colors >> w) & 1));
            prop_assert_eq!(is_occ(&graph, &occ), bipartite);
        }

        #[test]
        fn strategies_agree_with_brute_force(graph in arb_graph(8)) {
            let occ = greedy_transversal(&graph);
            let minimum = brute_force_minimum(&graph);
            let enum2col = shrink(&graph, &occ, Strategy::Enum2Col, None);
            let gray = shrink(&graph, &occ, Strategy::GrayCode, None);
            prop_assert_eq!(enum2col.is_some(), minimum < occ.count());
            prop_assert_eq!(gray.is_some(), minimum < occ.count());
            for smaller in enum2col.iter().chain(gray.iter()) {
                prop_assert_eq!(smaller.count(), occ.count() - 1);
                prop_assert!(is_occ(&graph, smaller));
            }
        }
    }

}
