//! The two ways of enumerating the colorings of the kept transversal members for one deletion
//! set. `remaining` lists the kept members (indices into `occ_vertices`) with the pivot at
//! position 0, whose color is always 0. Both enumerations accept exactly the same colorings.

use crate::bitset::Bitset;
use crate::flow::FlowNetwork;
use crate::occ_problem::{OccProblem, Search};

/// Enumerates the indices of the bit flipped in each step of the reflected binary Gray code over
/// `bits` bits, starting after the all-zero word. Yields `2^bits - 1` indices.
#[derive(Debug, Clone)]
pub(crate) struct GrayCode {
    /// A binary counter with one extra bit marking the end.
    counter: Bitset,
}

impl GrayCode {

    pub(crate) fn new(bits: usize) -> Self {
        GrayCode {
            counter: Bitset::new(bits + 1),
        }
    }

}

impl Iterator for GrayCode {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let end = self.counter.num_bits() - 1;
        if self.counter.get(end) {
            return None
        }
        // the flipped bit of a Gray code step is the lowest clear bit of the counter
        let mut i = 0;
        while self.counter.get(i) {
            self.counter.unset(i);
            i += 1;
        }
        self.counter.set(i);
        (i < end).then_some(i)
    }
}

impl OccProblem<'_> {

    /// Tries every proper coloring of `remaining`, built up by backtracking, with a fresh flow
    /// network each.
    pub(crate) fn enum2col(&self, remaining: &[usize], deleted: &[usize], budget: usize, work: &mut u64) -> Search {
        let neighbors = self.occ_neighbors(remaining);
        let mut colors = Bitset::new(remaining.len());
        self.extend_coloring(remaining, &neighbors, 1, &mut colors, deleted, budget, work)
    }

    #[allow(clippy::too_many_arguments)]
    fn extend_coloring(
        &self,
        remaining: &[usize],
        neighbors: &[Vec<usize>],
        pos: usize,
        colors: &mut Bitset,
        deleted: &[usize],
        budget: usize,
        work: &mut u64,
    ) -> Search {
        if pos >= remaining.len() {
            return self.check_coloring(remaining, colors, deleted, budget, work)
        }
        if self.is_cancelled() {
            return Search::Cancelled
        }
        for color in [false, true] {
            let proper = neighbors[pos]
                .iter()
                .filter(|q| **q < pos)
                .all(|q| colors.get(*q) != color);
            if !proper {
                continue
            }
            if color {
                colors.set(pos);
            } else {
                colors.unset(pos);
            }
            match self.extend_coloring(remaining, neighbors, pos + 1, colors, deleted, budget, work) {
                Search::Exhausted => {},
                search => return search,
            }
        }
        Search::Exhausted
    }

    fn check_coloring(&self, remaining: &[usize], colors: &Bitset, deleted: &[usize], budget: usize, work: &mut u64) -> Search {
        let (sources, targets) = self.terminals(remaining, colors);
        let mut flow = FlowNetwork::new(&self.h);
        let feasible = flow.augment_bounded(&sources, &targets, budget);
        *work += flow.augmentations();
        if feasible {
            Search::Found(self.extract(deleted, &flow.vertex_cut(&sources)))
        } else {
            Search::Exhausted
        }
    }

    /// Walks all colorings of `remaining` in Gray code order. Every step flips the color of one
    /// member: the paths at its two terminals are drained, the terminals swap roles and the flow
    /// is augmented again. Improper colorings are recognized by a running count of monochromatic
    /// edges and skipped without augmenting.
    pub(crate) fn gray_code(&self, remaining: &[usize], deleted: &[usize], budget: usize, work: &mut u64) -> Search {
        let neighbors = self.occ_neighbors(remaining);
        let mut colors = Bitset::new(remaining.len());
        // all members start with color 0, so every edge among them is monochromatic
        let mut conflicts: usize = neighbors
            .iter()
            .enumerate()
            .map(|(pos, adjacent)| adjacent.iter().filter(|q| **q > pos).count())
            .sum();
        let (mut sources, mut targets) = self.terminals(remaining, &colors);
        let mut flow = FlowNetwork::new(&self.h);
        let mut steps = GrayCode::new(remaining.len().saturating_sub(1));
        let search = loop {
            if conflicts == 0 && flow.augment_bounded(&sources, &targets, budget) {
                break Search::Found(self.extract(deleted, &flow.vertex_cut(&sources)))
            }
            let Some(step) = steps.next() else {
                break Search::Exhausted
            };
            if self.is_cancelled() {
                break Search::Cancelled
            }
            let pos = step + 1;
            let color = colors.get(pos);
            for q in &neighbors[pos] {
                if colors.get(*q) == color {
                    conflicts -= 1;
                } else {
                    conflicts += 1;
                }
            }
            colors.toggle(pos);

            let i = remaining[pos];
            let x = self.occ_vertices[i];
            let clone = self.clones[x].expect("every member has a clone");
            for terminal in [x, clone] {
                if flow.is_source(terminal) {
                    flow.drain_source(terminal);
                } else if flow.is_target(terminal) {
                    flow.drain_target(terminal);
                }
            }
            self.set_terminals(i, !color, &mut sources, &mut targets);
        };
        *work += flow.augmentations();
        search
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use crate::graph::Graph;
    use std::io::Cursor;

    #[test]
    fn gray_code_test() {
        assert_eq!(GrayCode::new(3).collect::<Vec<_>>(), vec![0, 1, 0, 2, 0, 1, 0]);
        assert_eq!(GrayCode::new(0).count(), 0);
        let mut steps = GrayCode::new(1);
        assert_eq!(steps.next(), Some(0));
        assert_eq!(steps.next(), None);
        assert_eq!(steps.next(), None);
    }

    #[test]
    fn gray_code_visits_every_word_test() {
        let bits = 6;
        let mut word = 0u32;
        let mut seen = vec![false; 1 << bits];
        seen[0] = true;
        for i in GrayCode::new(bits) {
            word ^= 1 << i;
            assert!(!seen[word as usize]);
            seen[word as usize] = true;
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn strategies_agree_test() {
        // Petersen graph, minimum transversal of size 3; no three members of `occ` suffice
        let gr = Cursor::new("p td 10 15\n1 2\n2 3\n3 4\n4 5\n5 1\n1 6\n2 7\n3 8\n4 9\n5 10\n6 8\n8 10\n10 7\n7 9\n9 6\n");
        let graph = Graph::read_gr(gr).unwrap();
        let occ = Bitset::from_ids(10, vec![0, 1, 3, 8]);
        assert!(crate::occ_problem::is_occ(&graph, &occ));
        let mut counts = Vec::new();
        for strategy in [Strategy::Enum2Col, Strategy::GrayCode] {
            let mut problem = OccProblem::new(&graph, &occ, strategy, None);
            let smaller = problem.solve().unwrap();
            assert_eq!(smaller.count(), 3);
            assert!(problem.augmentations() > 0);
            let mut problem = OccProblem::new(&graph, &smaller, strategy, None);
            assert!(problem.solve().is_none());
            counts.push(problem.augmentations());
        }
        assert!(counts.iter().all(|c| *c > 0));
    }

    #[test]
    fn odd_cycle_among_members_test() {
        // the transversal itself contains a triangle, so no coloring keeps all three
        let gr = Cursor::new("p td 4 4\n1 2\n2 3\n3 1\n3 4\n");
        let graph = Graph::read_gr(gr).unwrap();
        let occ = Bitset::from_ids(4, vec![0, 1, 2]);
        for strategy in [Strategy::Enum2Col, Strategy::GrayCode] {
            let smaller = crate::occ_problem::shrink(&graph, &occ, strategy, None).unwrap();
            assert_eq!(smaller.count(), 2);
            let smallest = crate::occ_problem::shrink(&graph, &smaller, strategy, None).unwrap();
            assert_eq!(smallest.count(), 1);
            assert!(crate::occ_problem::is_occ(&graph, &smallest));
        }
    }

}
