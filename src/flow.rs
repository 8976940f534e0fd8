//! Vertex-disjoint paths between two vertex sets of a graph.
//!
//! Every vertex `v` of the underlying graph is split into an IN and an OUT port. An edge `(v,w)`
//! yields the arcs `OUT(v) -> IN(w)` and `OUT(w) -> IN(v)`, and the internal arc
//! `IN(v) -> OUT(v)` has capacity one. Therefore every vertex (terminals included) is used by at
//! most one path, and a maximum flow is a maximum set of vertex-disjoint source-target paths.
//!
//! The flow is stored implicitly: each vertex records the vertex it receives flow from
//! (`come_from`) and the vertex it passes flow on to (`go_to`). A vertex without either carries no
//! flow, a path starts at a source with only `go_to` and ends at a target with only `come_from`.

use std::collections::VecDeque;
use tracing::trace;
use crate::bitset::Bitset;
use crate::graph::{Graph, Vertex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FlowEdge {
    come_from: Option<Vertex>,
    go_to: Option<Vertex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Port {
    In = 0,
    Out = 1,
}

impl Port {
    fn opposite(self) -> Self {
        match self {
            Port::In => Port::Out,
            Port::Out => Port::In,
        }
    }
}

/// Returns the index of `port` of vertex `v` in the port space.
fn code(v: Vertex, port: Port) -> usize {
    2 * v + port as usize
}

fn decode(code: usize) -> (Vertex, Port) {
    (code / 2, if code % 2 == 0 { Port::In } else { Port::Out })
}

#[derive(Debug, Clone)]
pub struct FlowNetwork<'g> {
    graph: &'g Graph,
    flow: usize,
    flows: Vec<FlowEdge>,
    augmentations: u64,
}

impl<'g> FlowNetwork<'g> {

    /// Creates an empty flow network on `graph`. Absent vertices of `graph` are never used.
    pub fn new(graph: &'g Graph) -> Self {
        FlowNetwork {
            graph,
            flow: 0,
            flows: vec![FlowEdge::default(); graph.size()],
            augmentations: 0,
        }
    }

    /// Returns the number of vertex-disjoint paths currently recorded.
    pub fn flow(&self) -> usize {
        self.flow
    }

    /// Returns the number of successful augmentations since creation. Unlike `flow` this never
    /// decreases.
    pub fn augmentations(&self) -> u64 {
        self.augmentations
    }

    /// Checks if any path uses `v`.
    pub fn vertex_flow(&self, v: Vertex) -> bool {
        self.flows[v].go_to.is_some() || self.flows[v].come_from.is_some()
    }

    /// Checks if a path starts at `v`.
    pub fn is_source(&self, v: Vertex) -> bool {
        self.flows[v].go_to.is_some() && self.flows[v].come_from.is_none()
    }

    /// Checks if a path ends at `v`.
    pub fn is_target(&self, v: Vertex) -> bool {
        self.flows[v].go_to.is_none() && self.flows[v].come_from.is_some()
    }

    /// Removes all paths.
    pub fn clear(&mut self) {
        self.flows.iter_mut().for_each(|e| *e = FlowEdge::default());
        self.flow = 0;
    }

    /// Returns all recorded paths, each from its source to its target.
    pub fn paths(&self) -> Vec<Vec<Vertex>> {
        (0..self.flows.len())
            .filter(|v| self.is_source(*v))
            .map(|source| {
                let mut path = vec![source];
                let mut v = source;
                while let Some(w) = self.flows[v].go_to {
                    path.push(w);
                    v = w;
                }
                path
            })
            .collect()
    }

    /// Breadth first search for an augmenting path in the residual network, starting at the OUT
    /// ports of `seeds`. Stops at the first vertex without flow for which `is_target` holds.
    ///
    /// Returns that target together with the predecessor of every visited port. Seeds have no
    /// predecessor.
    fn search<I, F>(&self, seeds: I, is_target: F) -> Option<(Vertex, Vec<Option<Vertex>>)>
    where
        I: IntoIterator<Item=Vertex>,
        F: Fn(Vertex) -> bool,
    {
        let size = self.graph.size();
        let mut pred: Vec<Option<Vertex>> = vec![None; 2 * size];
        let mut seen = Bitset::new(2 * size);
        let mut queue = VecDeque::new();
        for v in seeds {
            let vcode = code(v, Port::Out);
            if !seen.get(vcode) {
                seen.set(vcode);
                queue.push_back(vcode);
            }
        }
        while let Some(vcode) = queue.pop_front() {
            let (v, port) = decode(vcode);
            match port {
                Port::Out => {
                    let FlowEdge { come_from, go_to } = self.flows[v];
                    for w in self.graph.neighbors(v) {
                        let wcode = code(w, Port::In);
                        // sending flow back to `come_from` would store a cycle; IN(w) is reached
                        // through the used arc backwards instead
                        if seen.get(wcode) || go_to == Some(w) || come_from == Some(w) {
                            continue
                        }
                        pred[wcode] = Some(v);
                        seen.set(wcode);
                        queue.push_back(wcode);

                        let w2code = code(w, Port::Out);
                        if !seen.get(w2code) && !self.vertex_flow(w) {
                            pred[w2code] = Some(w);
                            if is_target(w) {
                                return Some((w, pred))
                            }
                            seen.set(w2code);
                            queue.push_back(w2code);
                        }
                    }
                },
                Port::In => {
                    // a used arc can only be traversed backwards
                    if let Some(w) = self.flows[v].come_from {
                        let wcode = code(w, Port::Out);
                        if seen.get(wcode) {
                            continue
                        }
                        pred[wcode] = Some(v);
                        seen.set(wcode);
                        queue.push_back(wcode);

                        let w2code = code(w, Port::In);
                        if !seen.get(w2code) && self.vertex_flow(w) {
                            pred[w2code] = Some(w);
                            seen.set(w2code);
                            queue.push_back(w2code);
                        }
                    }
                },
            }
        }
        None
    }

    /// Walks the augmenting path from `target` back to its seed and rewires the flow along it.
    fn apply(&mut self, target: Vertex, pred: &[Option<Vertex>]) {
        let (mut t, mut t_port) = (target, Port::Out);
        while let Some(s) = pred[code(t, t_port)] {
            let s_port = t_port.opposite();
            if s_port == Port::Out {
                if s == t {
                    // backwards over the internal arc: `s` loses its flow
                    self.flows[s] = FlowEdge::default();
                } else {
                    self.flows[t].come_from = Some(s);
                    self.flows[s].go_to = Some(t);
                }
            }
            t = s;
            t_port = s_port;
        }
        self.flow += 1;
        self.augmentations += 1;
    }

    /// Tries to add one path from a present vertex of `sources` that does not yet start a path to
    /// a present vertex of `targets` that is not yet used.
    ///
    /// Returns `true` if the flow was increased by one.
    pub fn augment(&mut self, sources: &Bitset, targets: &Bitset) -> bool {
        let seeds: Vec<Vertex> = sources
            .iter()
            .filter(|v| self.graph.vertex_exists(*v) && self.flows[*v].go_to.is_none())
            .collect();
        let found = self.search(seeds, |w| targets.get(w));
        let augmented = match found {
            Some((target, pred)) => {
                self.apply(target, &pred);
                true
            },
            None => false,
        };
        debug_assert!(self.is_consistent(sources, targets));
        augmented
    }

    /// Like `augment`, with the single source `source` and the single target `target`. Fails if
    /// `source` is absent or already used by a path.
    pub fn augment_pair(&mut self, source: Vertex, target: Vertex) -> bool {
        if !self.graph.vertex_exists(source) || self.vertex_flow(source) {
            return false
        }
        let augmented = match self.search(std::iter::once(source), |w| w == target) {
            Some((target, pred)) => {
                self.apply(target, &pred);
                true
            },
            None => false,
        };
        debug_assert!(self.is_dual());
        augmented
    }

    /// Augments until the flow is maximum or exceeds `budget`.
    ///
    /// Returns `true` if the maximum flow was reached and is at most `budget`.
    pub fn augment_bounded(&mut self, sources: &Bitset, targets: &Bitset, budget: usize) -> bool {
        loop {
            if self.flow > budget {
                return false
            }
            if !self.augment(sources, targets) {
                trace!(flow = self.flow, paths = ?self.paths(), "maximum flow");
                return true
            }
        }
    }

    /// Removes the path starting at `source`.
    ///
    /// Returns the target the path ended at.
    pub fn drain_source(&mut self, source: Vertex) -> Vertex {
        let mut v = source;
        while let Some(succ) = self.flows[v].go_to {
            self.flows[v].go_to = None;
            self.flows[succ].come_from = None;
            v = succ;
        }
        self.flow -= 1;
        v
    }

    /// Removes the path ending at `target`.
    ///
    /// Returns the source the path started at.
    pub fn drain_target(&mut self, target: Vertex) -> Vertex {
        let mut v = target;
        while let Some(pred) = self.flows[v].come_from {
            self.flows[v].come_from = None;
            self.flows[pred].go_to = None;
            v = pred;
        }
        self.flow -= 1;
        v
    }

    /// Returns a minimum vertex cut separating `sources` from the targets the current flow was
    /// computed for. Only meaningful if the flow is maximum, in which case the cut contains
    /// exactly one vertex of every path. Sources may be part of the cut.
    pub fn vertex_cut(&self, sources: &Bitset) -> Bitset {
        let size = self.graph.size();
        let mut enqueued = Bitset::new(2 * size);
        // vertices whose IN port is reachable in the residual network
        let mut seen = Bitset::new(size);
        // vertices whose OUT port is reachable in the residual network
        let mut reached = Bitset::new(size);
        let mut queue = VecDeque::new();
        for v in sources.iter().filter(|v| self.graph.vertex_exists(*v)) {
            seen.set(v);
            if !self.vertex_flow(v) {
                let vcode = code(v, Port::Out);
                queue.push_back(vcode);
                enqueued.set(vcode);
                reached.set(v);
            }
        }
        while let Some(vcode) = queue.pop_front() {
            let (v, port) = decode(vcode);
            for w in self.graph.neighbors(v) {
                let wport = port.opposite();
                let wcode = code(w, wport);
                if enqueued.get(wcode) {
                    continue
                }
                if port == Port::Out {
                    seen.set(w);
                }
                let residual = match port {
                    Port::Out => self.flows[v].go_to != Some(w),
                    Port::In => self.flows[v].come_from == Some(w),
                };
                if !residual {
                    continue
                }
                queue.push_back(wcode);
                enqueued.set(wcode);
                if wport == Port::Out {
                    reached.set(w);
                }
                // the internal arc: forward if unused, backward if used
                let w2code = code(w, port);
                if !enqueued.get(w2code) && self.vertex_flow(w) == (port == Port::In) {
                    queue.push_back(w2code);
                    enqueued.set(w2code);
                    if port == Port::Out {
                        reached.set(w);
                    }
                }
            }
        }
        let mut cut = seen;
        cut.setminus(&reached);
        debug_assert_eq!(cut.count(), self.flow);
        cut
    }

    /// Checks that `come_from` and `go_to` are dual to each other, that no vertex passes flow back
    /// to where it came from, and that `flow` matches the number of path starts.
    fn is_dual(&self) -> bool {
        let mut starts = 0;
        for (v, e) in self.flows.iter().enumerate() {
            if e.go_to.is_some() && e.go_to == e.come_from {
                return false
            }
            if e.go_to.is_some_and(|w| self.flows[w].come_from != Some(v)) {
                return false
            }
            if e.come_from.is_some_and(|u| self.flows[u].go_to != Some(v)) {
                return false
            }
            if e.go_to.is_some() && e.come_from.is_none() {
                starts += 1;
            }
        }
        starts == self.flow
    }

    /// Checks that `come_from` and `go_to` are dual to each other, that paths start exactly at
    /// vertices of `sources` and end exactly at vertices of `targets`, and that `flow` matches the
    /// number of paths.
    pub fn is_consistent(&self, sources: &Bitset, targets: &Bitset) -> bool {
        self.is_dual() && self.flows.iter().enumerate().all(|(v, e)| {
            (e.go_to.is_none() || sources.get(v) == e.come_from.is_none())
                && (e.come_from.is_none() || targets.get(v) == e.go_to.is_none())
        })
    }

}
