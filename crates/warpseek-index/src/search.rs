//! Best-first approximate top-K search over an [`MbrTree`].
//!
//! The search never evaluates DTW. Candidates are confirmed by comparing their
//! PAA lower bound against itself, so the result is the `k` series with the
//! smallest PAA bound reachable in best-first order, not a verified set of
//! DTW nearest neighbours.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::bounds::segment_bound;
use crate::error::IndexError;
use crate::representation::Representation;
use crate::tree::{MbrTree, NodeIndex, NodeKind};

/// Leaves at least this large are scored on the rayon pool.
const MIN_PARALLEL_LEAF: usize = 64;

/// What a frontier entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Node(NodeIndex),
    Series(usize),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: f64,
    seq: u64,
    payload: Payload,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so that `BinaryHeap` pops the smallest key, oldest first on ties.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-priority queue with insertion-order tie breaking.
#[derive(Debug, Default)]
struct Frontier {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Frontier {
    fn push(&mut self, key: f64, payload: Payload) {
        self.heap.push(Entry {
            key,
            seq: self.next_seq,
            payload,
        });
        self.next_seq += 1;
    }

    fn pop(&mut self) -> Option<Entry> {
        self.heap.pop()
    }
}

/// One confirmed result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Position of the series in the indexed collection.
    pub index: usize,
    /// PAA lower bound under which the series was confirmed.
    pub bound: f64,
}

/// Work counters for a single search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Entries popped from the frontier.
    pub frontier_pops: usize,
    /// Internal and leaf nodes expanded.
    pub nodes_expanded: usize,
    /// Segment and node bound evaluations.
    pub bound_evaluations: usize,
}

/// Outcome of a top-K search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnnResult {
    /// Confirmed neighbours in confirmation order.
    pub neighbors: Vec<Neighbor>,
    /// Work performed.
    pub stats: SearchStats,
}

impl KnnResult {
    /// Number of confirmed neighbours.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// True if nothing was confirmed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Indices of the confirmed neighbours, in confirmation order.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.neighbors.iter().map(|n| n.index).collect()
    }
}

/// Per-query state of a best-first search.
///
/// Owns its frontier, staging list and results; the tree is only borrowed, so
/// independent searches can share one tree across threads.
#[derive(Debug)]
pub struct KnnSearch<'t> {
    tree: &'t MbrTree,
    k: usize,
    frontier: Frontier,
    /// Candidates awaiting confirmation, ascending by bound.
    staged: Vec<Neighbor>,
    finalized: Vec<Neighbor>,
    stats: SearchStats,
}

impl<'t> KnnSearch<'t> {
    /// Prepare a search for the `k` best candidates in `tree`.
    ///
    /// # Errors
    ///
    /// [`IndexError::InvalidConfig`] if `k` is zero.
    pub fn new(tree: &'t MbrTree, k: usize) -> Result<Self, IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidConfig {
                parameter: "k",
                value: k,
                reason: "at least one neighbour must be requested",
            });
        }
        let mut frontier = Frontier::default();
        frontier.push(0.0, Payload::Node(tree.root()));
        Ok(Self {
            tree,
            k,
            frontier,
            staged: Vec::new(),
            finalized: Vec::with_capacity(k),
            stats: SearchStats::default(),
        })
    }

    /// Drive the search to completion.
    ///
    /// Returns fewer than `k` neighbours only when the tree holds fewer than
    /// `k` series.
    ///
    /// # Errors
    ///
    /// [`IndexError::DimensionMismatch`] if `query` differs from the indexed
    /// series in length, segment count or envelope window.
    #[instrument(skip_all, fields(k = self.k, n = self.tree.len()))]
    pub fn run(mut self, query: &Representation) -> Result<KnnResult, IndexError> {
        if let Some(len) = self.tree.series_length() {
            IndexError::check_dims("series length", len, query.len())?;
        }
        IndexError::check_dims(
            "segment count",
            self.tree.config().num_segments(),
            query.num_segments(),
        )?;
        IndexError::check_dims(
            "envelope window",
            self.tree.config().window_size(),
            query.window_size(),
        )?;

        while let Some(entry) = self.frontier.pop() {
            self.stats.frontier_pops += 1;
            match entry.payload {
                Payload::Series(index) => {
                    self.stage(Neighbor {
                        index,
                        bound: entry.key,
                    });
                    self.promote(query)?;
                    if self.finalized.len() == self.k {
                        break;
                    }
                }
                Payload::Node(node) => self.expand(node, query)?,
            }
        }

        debug!(
            found = self.finalized.len(),
            pops = self.stats.frontier_pops,
            "search finished"
        );
        Ok(KnnResult {
            neighbors: self.finalized,
            stats: self.stats,
        })
    }

    /// Insert keeping `staged` sorted; equal bounds keep arrival order.
    fn stage(&mut self, candidate: Neighbor) {
        let at = self
            .staged
            .partition_point(|s| s.bound.total_cmp(&candidate.bound) != Ordering::Greater);
        self.staged.insert(at, candidate);
    }

    /// Move staged candidates whose recomputed bound does not exceed their
    /// stored bound into the result, scanning in ascending order and stopping
    /// at the first one that fails.
    fn promote(&mut self, query: &Representation) -> Result<(), IndexError> {
        let mut promoted = 0;
        for candidate in &self.staged {
            if self.finalized.len() == self.k {
                break;
            }
            let bound = segment_bound(query, self.tree.series(candidate.index))?;
            self.stats.bound_evaluations += 1;
            if bound > candidate.bound {
                break;
            }
            self.finalized.push(*candidate);
            promoted += 1;
        }
        self.staged.drain(..promoted);
        Ok(())
    }

    fn expand(&mut self, node: NodeIndex, query: &Representation) -> Result<(), IndexError> {
        self.stats.nodes_expanded += 1;
        match self.tree.node(node).kind() {
            NodeKind::Leaf => {
                let span = self.tree.node(node).span();
                let members = self.tree.members(node);
                let bounds = if members.len() >= MIN_PARALLEL_LEAF {
                    members
                        .par_iter()
                        .map(|c| segment_bound(query, c))
                        .collect::<Result<Vec<_>, _>>()?
                } else {
                    members
                        .iter()
                        .map(|c| segment_bound(query, c))
                        .collect::<Result<Vec<_>, _>>()?
                };
                self.stats.bound_evaluations += bounds.len();
                for (index, bound) in span.zip(bounds) {
                    self.frontier.push(bound, Payload::Series(index));
                }
            }
            NodeKind::Internal { left, right } => {
                for child in [left, right] {
                    let distance = self.tree.node(child).rect().min_distance(query.paa())?;
                    self.stats.bound_evaluations += 1;
                    self.frontier.push(distance, Payload::Node(child));
                }
            }
        }
        Ok(())
    }
}
