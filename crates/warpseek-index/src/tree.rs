//! Binary MBR tree built by order-preserving bisection.

use std::fmt;
use std::ops::Range;

use rayon::prelude::*;
use tracing::{debug, info, instrument};
use warpseek_dtw::TimeSeries;

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::mbr::BoundingRect;
use crate::representation::Representation;
use crate::search::{KnnResult, KnnSearch};

/// Index into the node arena of an [`MbrTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Zero-based arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a node holds series directly or delegates to two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Terminal node; its series are scored individually.
    Leaf,
    /// Interior node with exactly two children.
    Internal {
        /// Child covering the first half of the span.
        left: NodeIndex,
        /// Child covering the second half of the span.
        right: NodeIndex,
    },
}

/// A node of the tree arena.
///
/// Bisection preserves input order, so every node covers a contiguous `span`
/// of the tree's series.
#[derive(Debug, Clone)]
pub struct Node {
    rect: BoundingRect,
    span: Range<usize>,
    kind: NodeKind,
}

impl Node {
    /// Bounding rectangle of every PAA vector under this node.
    #[must_use]
    pub fn rect(&self) -> &BoundingRect {
        &self.rect
    }

    /// Positions (in input order) of the series under this node.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Number of series under this node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// True if the node covers no series (only possible for an empty tree).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Leaf or internal.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Whether this node holds series directly.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    /// The two children of an internal node; empty for a leaf.
    #[must_use]
    pub fn children(&self) -> Vec<NodeIndex> {
        match self.kind {
            NodeKind::Leaf => Vec::new(),
            NodeKind::Internal { left, right } => vec![left, right],
        }
    }
}

/// Static MBR index over a fixed collection of equal-length series.
///
/// Built once by [`MbrTree::build`] and immutable afterwards; any number of
/// searches may run against it concurrently.
#[derive(Debug, Clone)]
pub struct MbrTree {
    config: IndexConfig,
    series: Vec<Representation>,
    nodes: Vec<Node>,
    root: NodeIndex,
}

impl MbrTree {
    /// Build the tree over `database`.
    ///
    /// A node covering at most `min_leaf_size` series becomes a leaf. Larger
    /// nodes are split at the midpoint, unless both halves would be smaller
    /// than `min_leaf_size`, in which case the node stays a leaf. An empty
    /// database yields a single empty leaf.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IndexError::InvalidConfig`] | `min_leaf_size` is zero, or `num_segments` exceeds the series length |
    /// | [`IndexError::DimensionMismatch`] | series of different lengths |
    #[instrument(skip_all, fields(n = database.len(), segments = config.num_segments, window = config.window_size))]
    pub fn build(database: &[TimeSeries], config: &IndexConfig) -> Result<Self, IndexError> {
        if config.min_leaf_size == 0 {
            return Err(IndexError::InvalidConfig {
                parameter: "min_leaf_size",
                value: 0,
                reason: "leaves must be allowed to hold at least one series",
            });
        }
        if let Some(first) = database.first() {
            for s in database {
                IndexError::check_dims("series length", first.len(), s.len())?;
            }
        }

        let series = database
            .par_iter()
            .map(|s| config.represent(s.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut nodes = Vec::new();
        let root = grow(&mut nodes, &series, 0..series.len(), config.min_leaf_size);

        let tree = Self {
            config: *config,
            series,
            nodes,
            root,
        };
        info!(
            n_series = tree.len(),
            n_nodes = tree.node_count(),
            depth = tree.depth(),
            "index built"
        );
        Ok(tree)
    }

    /// Configuration the tree was built with.
    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Root node handle.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not belong to this tree.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    /// All nodes in arena order (children precede their parent).
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex::new(i), n))
    }

    /// Representation of the series at input position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[must_use]
    pub fn series(&self, index: usize) -> &Representation {
        &self.series[index]
    }

    /// Representations under `index`, in input order.
    #[must_use]
    pub fn members(&self, index: NodeIndex) -> &[Representation] {
        &self.series[self.node(index).span()]
    }

    /// Number of indexed series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True if no series are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Common length of the indexed series, if any.
    #[must_use]
    pub fn series_length(&self) -> Option<usize> {
        self.series.first().map(Representation::len)
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of levels; a lone root leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn level(tree: &MbrTree, index: NodeIndex) -> usize {
            match tree.node(index).kind {
                NodeKind::Leaf => 1,
                NodeKind::Internal { left, right } => 1 + level(tree, left).max(level(tree, right)),
            }
        }
        level(self, self.root)
    }

    /// Approximate top-`k` search; see [`KnnSearch`].
    ///
    /// # Errors
    ///
    /// See [`KnnSearch::new`] and [`KnnSearch::run`].
    pub fn search(&self, query: &Representation, k: usize) -> Result<KnnResult, IndexError> {
        KnnSearch::new(self, k)?.run(query)
    }

    /// Wrap `query` with the tree's configuration, then search.
    ///
    /// # Errors
    ///
    /// As [`search`](Self::search), plus representation errors for `query`.
    pub fn search_series(&self, query: &TimeSeries, k: usize) -> Result<KnnResult, IndexError> {
        let query = self.config.represent(query.clone())?;
        self.search(&query, k)
    }
}

/// Recursively build the subtree over `span`, children first.
fn grow(
    nodes: &mut Vec<Node>,
    series: &[Representation],
    span: Range<usize>,
    min_leaf_size: usize,
) -> NodeIndex {
    let len = span.len();
    let half = len / 2;
    // Halves smaller than the threshold would both be leaves: keep one leaf instead.
    let is_leaf = len <= min_leaf_size || (half < min_leaf_size && len - half < min_leaf_size);

    let (rect, kind) = if is_leaf {
        (BoundingRect::covering(&series[span.clone()]), NodeKind::Leaf)
    } else {
        let mid = span.start + half;
        let left = grow(nodes, series, span.start..mid, min_leaf_size);
        let right = grow(nodes, series, mid..span.end, min_leaf_size);
        debug!(start = span.start, mid, end = span.end, "split node");
        let rect = nodes[left.0].rect.union(&nodes[right.0].rect);
        (rect, NodeKind::Internal { left, right })
    };

    nodes.push(Node { rect, span, kind });
    NodeIndex::new(nodes.len() - 1)
}
