//! Implementation of a simple, undirected graph over a dense vertex id space, where the
//! existence of a vertex is a removable property.
//!
//! Disabling a vertex is O(1) and leaves all neighbor lists untouched, so neighbor lists may
//! hold stale references to absent vertices. Every traversal therefore re-checks
//! `vertex_exists` on the far endpoint of an edge before using it.

use fxhash::FxHashMap;
use std::collections::VecDeque;
use std::io::BufRead;
use crate::bitset::Bitset;
use crate::cust_error::ImportError;

pub type Vertex = usize;

/// A vertex slot. The neighbor list survives while the vertex is absent.
#[derive(Debug, Eq, PartialEq, Clone)]
enum Slot {
    Present(Vec<Vertex>),
    Absent(Vec<Vertex>),
}

impl Slot {
    fn is_present(&self) -> bool {
        matches!(self, Slot::Present(_))
    }

    fn adjacency(&self) -> &Vec<Vertex> {
        match self {
            Slot::Present(adj) | Slot::Absent(adj) => adj,
        }
    }

    fn adjacency_mut(&mut self) -> &mut Vec<Vertex> {
        match self {
            Slot::Present(adj) | Slot::Absent(adj) => adj,
        }
    }
}

/// A simple undirected graph datastructure with O(1) vertex deletion.
#[derive(Debug, Eq, PartialEq, Clone, Default)]
pub struct Graph {
    slots: Vec<Slot>,
}

// Static functions
impl Graph {

    /// Creates a graph with `n` vertex slots, all absent.
    pub fn new(n: usize) -> Self {
        Graph {
            slots: vec![Slot::Absent(Vec::new()); n],
        }
    }

    /// Creates a graph with `n` present, isolated vertices.
    pub fn with_vertices(n: usize) -> Self {
        Graph {
            slots: vec![Slot::Present(Vec::new()); n],
        }
    }

    /// Returns the size of the vertex id space. Present or not.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns one more than the largest vertex id, present or not. Equal to `size`.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn vertex_exists(&self, v: Vertex) -> bool {
        self.slots[v].is_present()
    }

    /// Returns an `Iterator` over all present vertices.
    pub fn vertices(&self) -> impl Iterator<Item=Vertex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(v, slot)| slot.is_present().then_some(v))
    }

    /// Returns an `Iterator` over the present neighbors of `v`.
    pub fn neighbors(&self, v: Vertex) -> impl Iterator<Item=Vertex> + '_ {
        self.slots[v]
            .adjacency()
            .iter()
            .copied()
            .filter(|w| self.slots[*w].is_present())
    }

    /// Returns the number of present neighbors of `v`.
    pub fn degree(&self, v: Vertex) -> usize {
        self.neighbors(v).count()
    }

    /// Checks if the edge `(v, w)` exists, with both endpoints present.
    pub fn has_edge(&self, v: Vertex, w: Vertex) -> bool {
        self.vertex_exists(v)
            && self.vertex_exists(w)
            && self.slots[v].adjacency().contains(&w)
    }

    /// Returns an `Iterator` over all edges `(v, w)` with `v <= w` and both endpoints present.
    pub fn edges(&self) -> impl Iterator<Item=(Vertex, Vertex)> + '_ {
        self.vertices()
            .flat_map(move |v| self.neighbors(v).filter(move |w| v <= *w).map(move |w| (v, w)))
    }

    /// Returns the number of present vertices. Scans all slots.
    pub fn num_vertices(&self) -> usize {
        self.vertices().count()
    }

    /// Returns the number of edges between present vertices. Scans all adjacencies.
    pub fn num_edges(&self) -> usize {
        self.edges().count()
    }

    /// Returns the subgraph induced by the present vertices in `mask`. The id space stays the
    /// same, vertices outside of `mask` are absent in the result.
    pub fn subgraph(&self, mask: &Bitset) -> Self {
        let keep = |v: Vertex| v < mask.num_bits() && mask.get(v) && self.vertex_exists(v);
        let slots = (0..self.size())
            .map(|v| {
                if keep(v) {
                    Slot::Present(self.slots[v].adjacency().iter().copied().filter(|w| keep(*w)).collect())
                } else {
                    Slot::Absent(Vec::new())
                }
            })
            .collect();
        Graph {
            slots,
        }
    }

    /// Tries to 2-color the present vertices with a breadth first search from every uncolored
    /// vertex. Set bits in `colors` mean color 1. Returns `false` as soon as an edge joins two
    /// vertices of the same color, in which case `colors` is only partially meaningful.
    pub fn two_coloring(&self, colors: &mut Bitset) -> bool {
        debug_assert!(colors.num_bits() >= self.size());
        colors.clear();
        let mut colored = Bitset::new(self.size());
        let mut queue = VecDeque::new();
        for start in self.vertices() {
            if colored.get(start) {
                continue
            }
            colored.set(start);
            queue.push_back(start);
            while let Some(v) = queue.pop_front() {
                let color = colors.get(v);
                for w in self.neighbors(v) {
                    if !colored.get(w) {
                        colored.set(w);
                        if !color {
                            colors.set(w);
                        }
                        queue.push_back(w);
                    } else if colors.get(w) == color {
                        return false
                    }
                }
            }
        }
        true
    }

    /// Checks if `self` is bipartite.
    pub fn is_bipartite(&self) -> bool {
        self.two_coloring(&mut Bitset::new(self.size()))
    }

}

// Dynamic functions
impl Graph {

    /// Extends the vertex id space to `size` slots. New slots are absent.
    pub fn grow(&mut self, size: usize) {
        if size > self.slots.len() {
            self.slots.resize(size, Slot::Absent(Vec::new()));
        }
    }

    /// Adds the edge `(v, w)`. Does nothing if it is already recorded.
    pub fn connect(&mut self, v: Vertex, w: Vertex) {
        if self.slots[v].adjacency().contains(&w) {
            return
        }
        self.slots[v].adjacency_mut().push(w);
        if v != w {
            self.slots[w].adjacency_mut().push(v);
        }
    }

    /// Removes the edge `(v, w)` if it is recorded.
    pub fn disconnect(&mut self, v: Vertex, w: Vertex) {
        let adj = self.slots[v].adjacency_mut();
        if let Some(pos) = adj.iter().position(|u| *u == w) {
            adj.swap_remove(pos);
        }
        let adj = self.slots[w].adjacency_mut();
        if let Some(pos) = adj.iter().position(|u| *u == v) {
            adj.swap_remove(pos);
        }
    }

    /// Marks `v` as absent. Its neighbor list is kept for a later `vertex_enable`.
    pub fn vertex_disable(&mut self, v: Vertex) {
        if let Slot::Present(adj) = &mut self.slots[v] {
            self.slots[v] = Slot::Absent(std::mem::take(adj));
        }
    }

    /// Marks `v` as present again, with all edges it had before.
    pub fn vertex_enable(&mut self, v: Vertex) {
        if let Slot::Absent(adj) = &mut self.slots[v] {
            self.slots[v] = Slot::Present(std::mem::take(adj));
        }
    }

}

impl Graph {

    /// Reads a graph with arbitrary vertex names. Each line holds either an edge `u v` or a
    /// single (possibly isolated) vertex `u`, separated by whitespace. Lines starting with `#`
    /// are comments. Vertex ids are assigned in order of first appearance.
    ///
    /// Returns the graph and the name of each vertex id.
    pub fn read_edge_list<R: BufRead>(input: R) -> Result<(Self, Vec<String>), ImportError> {
        let mut ids: FxHashMap<String, Vertex> = FxHashMap::default();
        let mut labels: Vec<String> = Vec::new();
        let mut edges = Vec::new();
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue
            }
            let mut id_of = |name: &str| {
                *ids.entry(name.to_owned()).or_insert_with(|| {
                    labels.push(name.to_owned());
                    labels.len() - 1
                })
            };
            let mut s = line.split_whitespace();
            let src = id_of(s.next().ok_or(ImportError::InputMalformedError)?);
            if let Some(name) = s.next() {
                let trg = id_of(name);
                edges.push((src, trg));
            }
            if s.next().is_some() { return Err(ImportError::InputMalformedError); }
        }
        let mut graph = Graph::with_vertices(labels.len());
        for (src, trg) in edges {
            graph.connect(src, trg);
        }
        Ok((graph, labels))
    }

    /// Reads a `.gr` input (`p <descriptor> <n> <m>` header, `c` comment lines, one 1-based
    /// edge per line) and creates a `Graph`.
    pub fn read_gr<R: BufRead>(gr: R) -> Result<Self, ImportError> {
        let (lines, _): (Vec<_>, Vec<_>) = gr.lines()
            .partition(|l| {
                if let Ok(line) = l {
                    // ignore empty lines and comment lines
                    !line.starts_with("c ") && !line.trim().is_empty()
                } else {
                    true
                }
            });
        let mut lines = lines.into_iter();
        // p <descriptor> <n> <m>
        let (n, m) = {
            let line = lines.next().ok_or(ImportError::InputMalformedError)??;
            let mut s = line.split_whitespace();
            if let Some("p") = s.next() {} else { return Err(ImportError::InputMalformedError); }
            if s.next().is_none() { return Err(ImportError::InputMalformedError); }
            let n: usize = s.next().ok_or(ImportError::InputMalformedError)?.parse()?;
            let m: usize = s.next().ok_or(ImportError::InputMalformedError)?.parse()?;
            if s.next().is_some() { return Err(ImportError::InputMalformedError); }
            (n, m)
        };
        let mut graph = Graph::with_vertices(n);
        let mut num_edges = 0;
        for line in lines {
            // <src> <trg>
            let line = line?;
            let mut s = line.split_whitespace();
            let src = s.next().ok_or(ImportError::InputMalformedError)?.parse::<usize>()?;
            let trg = s.next().ok_or(ImportError::InputMalformedError)?.parse::<usize>()?;
            if s.next().is_some() { return Err(ImportError::InputMalformedError); }
            if src == 0 || trg == 0 || src > n || trg > n {
                return Err(ImportError::InputMalformedError);
            }
            graph.connect(src - 1, trg - 1);
            num_edges += 1;
        }
        if num_edges != m { return Err(ImportError::InputMalformedError); }
        Ok(graph)
    }

    /// Reads a graph in either of the formats above. If the first content line is a `p` header
    /// the input is read as `.gr` and vertices are labeled `1..=n`.
    pub fn read_graph<R: BufRead>(input: R) -> Result<(Self, Vec<String>), ImportError> {
        let text = input.lines().collect::<Result<Vec<String>, _>>()?.join("\n");
        let is_gr = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("c "))
            .is_some_and(|line| line.starts_with("p "));
        if is_gr {
            let graph = Graph::read_gr(text.as_bytes())?;
            let labels = (1..=graph.size()).map(|v| v.to_string()).collect();
            Ok((graph, labels))
        } else {
            Graph::read_edge_list(text.as_bytes())
        }
    }

}
