//! Sequential Edmonds-Karp reference solver.
//!
//! Shortest augmenting paths found by breadth-first search over residual
//! arcs. Every link is usable in both directions, matching the residual graph
//! of the preflow solver, so the two must always agree on the flow value.

use crate::cs::error::Result;
use crate::cs::graph::network::Network;
use std::collections::VecDeque;

pub fn edmond_karp(network: &Network, source: usize, sink: usize) -> Result<i64> {
    network.check_terminals(source, sink)?;
    let mut arcs = Arcs::new(network);
    let mut value = 0;

    while let Some(path) = arcs.shortest_path(source, sink) {
        let bottleneck = path
            .iter()
            .map(|&arc| arcs.residual[arc])
            .min()
            .unwrap_or(0);
        for &arc in &path {
            arcs.residual[arc] -= bottleneck;
            arcs.residual[arc ^ 1] += bottleneck;
        }
        value += bottleneck;
    }

    Ok(value)
}

/// Residual arcs in pairs: arc `2i` runs `u -> v` for link `i`, arc `2i + 1`
/// runs back. Both start at the link's capacity.
struct Arcs {
    head: Vec<usize>,
    residual: Vec<i64>,
    adjacency: Vec<Vec<usize>>,
}

impl Arcs {
    fn new(network: &Network) -> Self {
        let links = network.links();
        let mut arcs = Arcs {
            head: Vec::with_capacity(2 * links.len()),
            residual: Vec::with_capacity(2 * links.len()),
            adjacency: vec![Vec::new(); network.node_count()],
        };
        // Self-loops never lie on a shortest path.
        for link in links.iter().filter(|link| link.u != link.v) {
            let forward = arcs.head.len();
            arcs.head.extend([link.v, link.u]);
            arcs.residual.extend([link.capacity, link.capacity]);
            arcs.adjacency[link.u].push(forward);
            arcs.adjacency[link.v].push(forward + 1);
        }
        arcs
    }

    /// Arcs of a shortest source-to-sink path with positive residual, in order.
    fn shortest_path(&self, source: usize, sink: usize) -> Option<Vec<usize>> {
        let mut via: Vec<Option<usize>> = vec![None; self.adjacency.len()];
        let mut seen = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::from([source]);
        seen[source] = true;

        while let Some(u) = queue.pop_front() {
            for &arc in &self.adjacency[u] {
                let v = self.head[arc];
                if seen[v] || self.residual[arc] == 0 {
                    continue;
                }
                seen[v] = true;
                via[v] = Some(arc);
                if v == sink {
                    return Some(self.trace(&via, sink));
                }
                queue.push_back(v);
            }
        }
        None
    }

    fn trace(&self, via: &[Option<usize>], sink: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut node = sink;
        while let Some(arc) = via[node] {
            path.push(arc);
            node = self.head[arc ^ 1];
        }
        path.reverse();
        path
    }
}
