//! Residual graph shared by the preflow-push workers.
//!
//! Every node owns a mutex around its height and excess. Edge flow is only
//! written while the locks of both endpoints are held, and that requirement
//! is carried by the types: [`ResidualGraph::push`] takes a [`PairGuard`],
//! [`ResidualGraph::relabel`] takes a [`NodeGuard`], and the only way to get
//! either is to lock the nodes through the graph.
//!
//! Locks on two nodes are always taken in ascending index order, so two
//! workers contending for the same pair can never wait on each other in a
//! cycle.

use crate::cs::error::Result;
use crate::cs::graph::network::Network;
use crate::cs::graph::worklist::ExcessWorklist;
use log::trace;
use std::cmp::min;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Rule deciding whether a push may go downhill from `u` to `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Admissibility {
    /// `height(u) > height(v)`.
    #[default]
    Relaxed,
    /// `height(u) == height(v) + 1`, the textbook condition.
    Strict,
}

impl Admissibility {
    pub fn allows(self, from: u64, to: u64) -> bool {
        match self {
            Admissibility::Relaxed => from > to,
            Admissibility::Strict => from == to + 1,
        }
    }
}

/// Mutable state of a node, guarded by the node's lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    pub height: u64,
    pub excess: i64,
}

#[derive(Debug)]
struct Node {
    state: Mutex<NodeState>,
    /// Incident edge indices.
    adjacency: Vec<usize>,
}

/// An undirected link with net flow from `u` toward `v`.
#[derive(Debug)]
pub struct Edge {
    u: usize,
    v: usize,
    capacity: i64,
    flow: AtomicI64,
}

impl Edge {
    fn new(u: usize, v: usize, capacity: i64) -> Self {
        Edge {
            u,
            v,
            capacity,
            flow: AtomicI64::new(0),
        }
    }

    pub fn u(&self) -> usize {
        self.u
    }

    pub fn v(&self) -> usize {
        self.v
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    /// Net flow from `u` to `v`; negative when it runs from `v` to `u`.
    pub fn flow(&self) -> i64 {
        self.flow.load(Ordering::Relaxed)
    }

    /// Remaining capacity for sending flow out of `from` along this edge.
    pub fn residual_from(&self, from: usize) -> i64 {
        if from == self.u {
            self.capacity - self.flow()
        } else {
            self.capacity + self.flow()
        }
    }
}

/// Exclusive access to one node's state.
pub struct NodeGuard<'g> {
    index: usize,
    state: MutexGuard<'g, NodeState>,
}

impl NodeGuard<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn height(&self) -> u64 {
        self.state.height
    }

    pub fn excess(&self) -> i64 {
        self.state.excess
    }
}

/// Both endpoint locks of a prospective push from `from` to `to`.
pub struct PairGuard<'g> {
    from: NodeGuard<'g>,
    to: NodeGuard<'g>,
}

impl<'g> PairGuard<'g> {
    pub fn from(&self) -> &NodeGuard<'g> {
        &self.from
    }

    pub fn to(&self) -> &NodeGuard<'g> {
        &self.to
    }
}

#[derive(Debug)]
pub struct ResidualGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    source: usize,
    sink: usize,
    worklist: ExcessWorklist,
}

impl ResidualGraph {
    /// Builds the residual graph of `network` with all flows, heights and
    /// excesses at zero and an empty worklist.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidVertex` - if `source` or `sink` is out of range
    /// * `Error::InvalidInput` - if `source == sink`
    pub fn new(network: &Network, source: usize, sink: usize) -> Result<Self> {
        network.check_terminals(source, sink)?;

        let mut adjacency = vec![Vec::new(); network.node_count()];
        let mut edges = Vec::with_capacity(network.links().len());
        for (i, link) in network.links().iter().enumerate() {
            adjacency[link.u].push(i);
            if link.v != link.u {
                adjacency[link.v].push(i);
            }
            edges.push(Edge::new(link.u, link.v, link.capacity));
        }

        let nodes = adjacency
            .into_iter()
            .map(|adjacency| Node {
                state: Mutex::new(NodeState::default()),
                adjacency,
            })
            .collect();

        Ok(ResidualGraph {
            nodes,
            edges,
            source,
            sink,
            worklist: ExcessWorklist::new(),
        })
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn sink(&self) -> usize {
        self.sink
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge(&self, index: usize) -> &Edge {
        &self.edges[index]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Incident edges of `node`, in construction order.
    pub fn adjacency(&self, node: usize) -> &[usize] {
        &self.nodes[node].adjacency
    }

    pub fn worklist(&self) -> &ExcessWorklist {
        &self.worklist
    }

    /// The endpoint of `edge` that is not `u`.
    pub fn other(&self, edge: usize, u: usize) -> usize {
        let edge = &self.edges[edge];
        if u == edge.u {
            edge.v
        } else {
            edge.u
        }
    }

    pub fn lock(&self, index: usize) -> NodeGuard<'_> {
        NodeGuard {
            index,
            state: self.nodes[index]
                .state
                .lock()
                .expect("node lock poisoned by a failed push or relabel"),
        }
    }

    /// Locks `from` and `to`, lower index first.
    ///
    /// # Panics
    ///
    /// If `from == to`; a node cannot push to itself.
    pub fn lock_pair(&self, from: usize, to: usize) -> PairGuard<'_> {
        assert_ne!(from, to, "cannot lock node {} against itself", from);
        if from < to {
            let from = self.lock(from);
            let to = self.lock(to);
            PairGuard { from, to }
        } else {
            let to = self.lock(to);
            let from = self.lock(from);
            PairGuard { from, to }
        }
    }

    /// Whether `edge` currently admits a push from `pair.from()` to
    /// `pair.to()` under `rule`.
    pub fn is_admissible(&self, pair: &PairGuard<'_>, edge: usize, rule: Admissibility) -> bool {
        pair.from.excess() > 0
            && self.edges[edge].residual_from(pair.from.index) > 0
            && rule.allows(pair.from.height(), pair.to.height())
    }

    /// Moves `min(excess(from), residual(from -> to))` units along `edge` and
    /// returns the amount moved.
    ///
    /// `from` goes back on the worklist if it still holds excess, `to` joins
    /// it if it just became active.
    pub fn push(&self, pair: &mut PairGuard<'_>, edge: usize) -> i64 {
        let (u, v) = (pair.from.index, pair.to.index);
        let e = &self.edges[edge];
        debug_assert!(
            (e.u == u && e.v == v) || (e.u == v && e.v == u),
            "edge {} does not join {} and {}",
            edge,
            u,
            v
        );

        let d = min(pair.from.state.excess, e.residual_from(u));
        let flow = if u == e.u { e.flow() + d } else { e.flow() - d };
        e.flow.store(flow, Ordering::Relaxed);

        pair.from.state.excess -= d;
        pair.to.state.excess += d;
        trace!("push {} -> {} along edge {}: d = {}", u, v, edge, d);

        assert!(d >= 0, "negative push of {} from {} to {}", d, u, v);
        assert!(
            pair.from.state.excess >= 0 || u == self.source,
            "node {} left with negative excess {}",
            u,
            pair.from.state.excess
        );
        assert!(
            flow.abs() <= e.capacity,
            "edge {} carries {} over capacity {}",
            edge,
            flow,
            e.capacity
        );

        if pair.from.state.excess > 0 {
            self.enter_excess(&pair.from);
        }
        if d > 0 && pair.to.state.excess == d {
            self.enter_excess(&pair.to);
        }
        d
    }

    /// Raises `node` by one and puts it back on the worklist.
    pub fn relabel(&self, node: &mut NodeGuard<'_>) {
        node.state.height += 1;
        trace!("relabel {} to height {}", node.index, node.state.height);
        self.enter_excess(node);
    }

    fn enter_excess(&self, node: &NodeGuard<'_>) {
        if node.index != self.source && node.index != self.sink && node.excess() > 0 {
            self.worklist.insert(node.index);
        }
    }

    /// Sets the source height to the node count and saturates every edge
    /// leaving the source, seeding the worklist with its neighbours.
    pub fn saturate_source(&self) {
        let s = self.source;
        self.lock(s).state.height = self.nodes.len() as u64;

        for &edge in self.adjacency(s) {
            let v = self.other(edge, s);
            let capacity = self.edges[edge].capacity;
            if v == s || capacity == 0 {
                continue;
            }
            let mut pair = self.lock_pair(s, v);
            pair.from.state.excess += capacity;
            self.push(&mut pair, edge);
        }
    }

    /// Copy of every node's current state, taking each lock in turn.
    pub fn node_states(&self) -> Vec<NodeState> {
        (0..self.nodes.len())
            .map(|i| *self.lock(i).state)
            .collect()
    }

    pub fn flows(&self) -> Vec<i64> {
        self.edges.iter().map(Edge::flow).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::error::Error;

    fn graph(nodes: usize, edges: &[(usize, usize, i64)], s: usize, t: usize) -> ResidualGraph {
        let network = Network::from_edges(nodes, edges).unwrap();
        ResidualGraph::new(&network, s, t).unwrap()
    }

    #[test]
    fn test_admissibility_rules() {
        assert!(Admissibility::Relaxed.allows(3, 1));
        assert!(!Admissibility::Relaxed.allows(1, 1));
        assert!(Admissibility::Strict.allows(2, 1));
        assert!(!Admissibility::Strict.allows(3, 1));
        assert_eq!(Admissibility::default(), Admissibility::Relaxed);
    }

    #[test]
    fn test_new_rejects_bad_terminals() {
        let network = Network::from_edges(3, &[(0, 1, 1)]).unwrap();
        assert!(matches!(
            ResidualGraph::new(&network, 0, 3),
            Err(Error::InvalidVertex { index: 3, .. })
        ));
        assert!(matches!(
            ResidualGraph::new(&network, 1, 1),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_other_endpoint() {
        let g = graph(3, &[(0, 2, 5)], 0, 2);
        assert_eq!(g.other(0, 0), 2);
        assert_eq!(g.other(0, 2), 0);
    }

    #[test]
    fn test_residual_capacity_both_directions() {
        let g = graph(2, &[(0, 1, 5)], 0, 1);
        let edge = g.edge(0);
        assert_eq!(edge.residual_from(0), 5);
        assert_eq!(edge.residual_from(1), 5);
        edge.flow.store(3, Ordering::Relaxed);
        assert_eq!(edge.residual_from(0), 2);
        assert_eq!(edge.residual_from(1), 8);
    }

    #[test]
    fn test_saturate_source_seeds_worklist() {
        let g = graph(4, &[(0, 1, 4), (2, 0, 2), (1, 3, 3), (0, 3, 1)], 0, 3);
        g.saturate_source();

        let states = g.node_states();
        assert_eq!(states[0].height, 4);
        assert_eq!(states[0].excess, 0);
        assert_eq!(states[1].excess, 4);
        assert_eq!(states[2].excess, 2);
        assert_eq!(states[3].excess, 1);
        assert_eq!(g.flows(), vec![4, -2, 0, 1]);

        let mut seeded = Vec::new();
        while let Some(u) = g.worklist().take() {
            seeded.push(u);
        }
        seeded.sort_unstable();
        assert_eq!(seeded, vec![1, 2]);
    }

    #[test]
    fn test_saturate_source_skips_empty_and_parallel_edges() {
        let g = graph(3, &[(0, 1, 0), (0, 1, 2), (1, 0, 3), (1, 2, 9)], 0, 2);
        g.saturate_source();
        assert_eq!(g.node_states()[1].excess, 5);
        assert_eq!(g.worklist().len(), 1);
    }

    #[test]
    fn test_push_partial_keeps_sender_active() {
        let g = graph(3, &[(0, 1, 10), (1, 2, 4)], 0, 2);
        g.saturate_source();
        assert_eq!(g.worklist().take(), Some(1));

        g.lock(1).state.height = 1;
        let mut pair = g.lock_pair(1, 2);
        assert!(g.is_admissible(&pair, 1, Admissibility::Relaxed));
        assert_eq!(g.push(&mut pair, 1), 4);
        assert_eq!(pair.from().excess(), 6);
        assert_eq!(pair.to().excess(), 4);
        drop(pair);

        assert_eq!(g.edge(1).flow(), 4);
        // Sender still has excess; the sink never joins the list.
        assert_eq!(g.worklist().take(), Some(1));
        assert_eq!(g.worklist().take(), None);
    }

    #[test]
    fn test_push_against_edge_direction() {
        let g = graph(3, &[(0, 1, 3), (2, 1, 5)], 0, 2);
        g.saturate_source();
        g.worklist().take();

        g.lock(1).state.height = 1;
        let mut pair = g.lock_pair(1, 2);
        assert_eq!(g.push(&mut pair, 1), 3);
        drop(pair);
        assert_eq!(g.edge(1).flow(), -3);
        assert_eq!(g.edge(1).residual_from(1), 2);
        assert!(g.worklist().is_empty());
    }

    #[test]
    fn test_push_activates_idle_receiver_once() {
        let g = graph(4, &[(0, 1, 6), (1, 2, 2), (1, 2, 2), (2, 3, 9)], 0, 3);
        g.saturate_source();
        g.worklist().take();
        g.lock(1).state.height = 1;

        let mut pair = g.lock_pair(1, 2);
        g.push(&mut pair, 1);
        g.push(&mut pair, 2);
        drop(pair);

        let mut active = Vec::new();
        while let Some(u) = g.worklist().take() {
            active.push(u);
        }
        active.sort_unstable();
        // Node 1 re-entered twice (once per push), node 2 only on its first.
        assert_eq!(active, vec![1, 1, 2]);
    }

    #[test]
    fn test_not_admissible_uphill_or_saturated() {
        let g = graph(3, &[(0, 1, 3), (1, 2, 5)], 0, 2);
        g.saturate_source();
        g.worklist().take();

        // Equal heights: neither rule allows the push.
        let pair = g.lock_pair(1, 2);
        assert!(!g.is_admissible(&pair, 1, Admissibility::Relaxed));
        drop(pair);

        // Residual capacity back to the source exists, but the source is higher.
        let pair = g.lock_pair(1, 0);
        assert!(!g.is_admissible(&pair, 0, Admissibility::Relaxed));
    }

    #[test]
    fn test_relabel_raises_height_by_one() {
        let g = graph(3, &[(0, 1, 3), (1, 2, 5)], 0, 2);
        g.saturate_source();
        g.worklist().take();

        let mut guard = g.lock(1);
        let before = guard.height();
        g.relabel(&mut guard);
        assert_eq!(guard.height(), before + 1);
        g.relabel(&mut guard);
        assert_eq!(guard.height(), before + 2);
        drop(guard);
        assert_eq!(g.worklist().len(), 2);
    }

    #[test]
    fn test_lock_pair_order_is_independent_of_direction() {
        let g = graph(3, &[(0, 1, 1), (1, 2, 1)], 0, 2);
        let pair = g.lock_pair(2, 1);
        assert_eq!(pair.from().index(), 2);
        assert_eq!(pair.to().index(), 1);
    }

    #[test]
    #[should_panic(expected = "against itself")]
    fn test_lock_pair_rejects_self() {
        let g = graph(2, &[(0, 1, 1)], 0, 1);
        let _pair = g.lock_pair(1, 1);
    }

    #[test]
    fn test_self_loop_listed_once() {
        let g = graph(3, &[(1, 1, 4), (0, 1, 2)], 0, 2);
        assert_eq!(g.adjacency(1), &[0, 1]);
        assert_eq!(g.other(0, 1), 1);
    }
}
