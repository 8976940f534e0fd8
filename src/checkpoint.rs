//! Cooperative cancellation and the consistent state a cancelled run reports.
//!
//! The compression loop owns a `Checkpoint` holding the processing order, the transversal of the
//! processed prefix and the length of that prefix. Both values are only ever changed together
//! through the guard returned by `Checkpoint::begin`, the commit happens when the guard is
//! dropped. `Checkpoint::export` takes the same lock, so any thread holding a reference observes
//! either the state before or after a step, never a mix of both.
//!
//! The exported `Snapshot` treats every unprocessed vertex as part of the transversal. Since the
//! processed prefix minus the transversal is bipartite, the snapshot is an odd cycle transversal
//! of the whole graph at every commit.

use parking_lot::{Mutex, MutexGuard};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use crate::bitset::Bitset;
use crate::graph::Vertex;

/// A shared flag requesting a run to stop. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {

    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns the underlying flag, e.g. for `signal_hook::flag::register`.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }

}

/// The mutable part of a `Checkpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Transversal of the subgraph induced by the seed and the processed prefix.
    pub occ: Bitset,
    /// Number of vertices of the order that are processed.
    pub finished: usize,
}

#[derive(Debug)]
pub struct Checkpoint {
    order: Vec<Vertex>,
    progress: Mutex<Progress>,
}

impl Checkpoint {

    /// Creates a checkpoint over the vertex id space `0..size`, nothing processed.
    pub fn new(size: usize, order: Vec<Vertex>) -> Self {
        Checkpoint {
            order,
            progress: Mutex::new(Progress {
                occ: Bitset::new(size),
                finished: 0,
            }),
        }
    }

    pub fn order(&self) -> &[Vertex] {
        &self.order
    }

    /// Starts an atomic update. All changes made through the guard become visible together when
    /// it is dropped.
    pub fn begin(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock()
    }

    /// Returns the state of the last commit.
    pub fn export(&self) -> Snapshot {
        let progress = self.progress.lock();
        Snapshot {
            occ: progress.occ.clone(),
            pending: self.order[progress.finished..].to_vec(),
        }
    }

}

/// A transversal of the whole graph: the computed part plus all unprocessed vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub occ: Bitset,
    /// Unprocessed vertices, in processing order.
    pub pending: Vec<Vertex>,
}

impl Snapshot {

    /// Returns the size of the transversal.
    pub fn size(&self) -> usize {
        self.occ.count() + self.pending.len()
    }

    /// Returns the transversal as one set.
    pub fn to_bitset(&self) -> Bitset {
        let mut all = self.occ.clone();
        for v in &self.pending {
            all.set(*v);
        }
        all
    }

    /// Returns the members: the computed part ascending, then the pending vertices.
    pub fn members(&self) -> Vec<Vertex> {
        self.occ.iter().chain(self.pending.iter().copied()).collect()
    }

}

/// Writes the status line `n m size cpu_seconds augmentations` followed by the label of every
/// member of `snapshot`, one per line.
pub fn write_report<W: Write>(
    out: &mut W,
    num_vertices: usize,
    num_edges: usize,
    snapshot: &Snapshot,
    cpu_seconds: f64,
    augmentations: u64,
    labels: &[String],
) -> io::Result<()> {
    writeln!(out, "{:5} {:6} {:5} {:10.2} {:16}", num_vertices, num_edges, snapshot.size(), cpu_seconds, augmentations)?;
    for v in snapshot.members() {
        writeln!(out, "{}", labels[v])?;
    }
    Ok(())
}
