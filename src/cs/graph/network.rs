//! Flow network description.
//!
//! A [`Network`] is the validated, immutable input to the max-flow solvers:
//! `n` nodes indexed `0..n` and a list of undirected links, each with a
//! non-negative integer capacity. Parallel links between the same pair of
//! nodes are kept as separate records.
//!
//! The text format read by [`Network::from_str`] is
//!
//! ```text
//! n m c p
//! u0 v0 c0
//! ...
//! ```
//!
//! where `c` and `p` are read but ignored, followed by `m` link triples.
//!
//! # Examples
//!
//! ```rust
//! use preflow::graph::Network;
//!
//! let network: Network = "4 2 0 0\n0 1 5\n1 3 2\n".parse().unwrap();
//! assert_eq!(network.node_count(), 4);
//! assert_eq!(network.links().len(), 2);
//! ```

use crate::cs::error::{Error, Result};
use std::io::{BufRead, Read};
use std::str::FromStr;

/// A capacitated link between two nodes.
///
/// Flow along a link may go either way; `u` and `v` only fix which direction
/// counts as positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub u: usize,
    pub v: usize,
    pub capacity: i64,
}

/// Largest total capacity of the links incident to one node.
pub const MAX_INCIDENT_CAPACITY: i64 = i64::MAX / 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    nodes: usize,
    links: Vec<Link>,
    /// Summed capacity of the links at each node; self-loops count twice.
    incident: Vec<i64>,
}

impl Network {
    /// Creates a network with `nodes` nodes and no links.
    pub fn new(nodes: usize) -> Self {
        Network {
            nodes,
            links: Vec::new(),
            incident: vec![0; nodes],
        }
    }

    /// Builds a network from `(u, v, capacity)` triples.
    pub fn from_edges(nodes: usize, edges: &[(usize, usize, i64)]) -> Result<Self> {
        let mut network = Network::new(nodes);
        network.links.reserve(edges.len());
        for &(u, v, capacity) in edges {
            network.add_edge(u, v, capacity)?;
        }
        Ok(network)
    }

    /// Adds a link and returns its index.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidVertex` - if either endpoint is not below `node_count()`
    /// * `Error::NegativeCapacity` - if `capacity < 0`
    /// * `Error::CapacityOverflow` - if the link would take the capacity at `u`
    ///   or `v` past [`MAX_INCIDENT_CAPACITY`]
    pub fn add_edge(&mut self, u: usize, v: usize, capacity: i64) -> Result<usize> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        let edge = self.links.len();
        if capacity < 0 {
            return Err(Error::NegativeCapacity { edge, capacity });
        }

        let at_u = self.incident_after(edge, u, capacity)?;
        self.incident[u] = at_u;
        let at_v = match self.incident_after(edge, v, capacity) {
            Ok(total) => total,
            Err(err) => {
                self.incident[u] -= capacity;
                return Err(err);
            }
        };
        self.incident[v] = at_v;

        self.links.push(Link { u, v, capacity });
        Ok(edge)
    }

    fn incident_after(&self, edge: usize, node: usize, capacity: i64) -> Result<i64> {
        self.incident[node]
            .checked_add(capacity)
            .filter(|&total| total <= MAX_INCIDENT_CAPACITY)
            .ok_or(Error::CapacityOverflow { edge, node })
    }

    pub fn node_count(&self) -> usize {
        self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Default source of the text format.
    pub fn default_source(&self) -> usize {
        0
    }

    /// Default sink of the text format: the last node.
    pub fn default_sink(&self) -> usize {
        self.nodes.saturating_sub(1)
    }

    pub(crate) fn check_vertex(&self, index: usize) -> Result<()> {
        if index >= self.nodes {
            return Err(Error::InvalidVertex {
                index,
                nodes: self.nodes,
            });
        }
        Ok(())
    }

    /// Checks that `source` and `sink` name two distinct nodes.
    pub(crate) fn check_terminals(&self, source: usize, sink: usize) -> Result<()> {
        self.check_vertex(source)?;
        self.check_vertex(sink)?;
        if source == sink {
            return Err(Error::invalid(format!(
                "source and sink must differ (both are {})",
                source
            )));
        }
        Ok(())
    }
}

/// Reads a network in the text format from a buffered reader.
pub fn read_network<R: BufRead>(mut reader: R) -> Result<Network> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    text.parse()
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = Tokens::new(s);

        let nodes = tokens.next_usize("node count")?;
        let links = tokens.next_usize("edge count")?;
        // Railway planning leftovers: present in the header, unused here.
        tokens.next_usize("c")?;
        tokens.next_usize("p")?;

        if nodes == 0 {
            return Err(Error::invalid("network must have at least one node"));
        }

        let mut network = Network::new(nodes);
        network.links.reserve(links);
        for edge in 0..links {
            let u = tokens.next_usize(&format!("edge {} endpoint u", edge))?;
            let v = tokens.next_usize(&format!("edge {} endpoint v", edge))?;
            let capacity = tokens.next_i64(&format!("edge {} capacity", edge))?;
            network.add_edge(u, v, capacity)?;
        }

        if let Some((line, token)) = tokens.next_raw() {
            return Err(Error::Parse(format!(
                "unexpected trailing token '{}' on line {}",
                token, line
            )));
        }

        Ok(network)
    }
}

/// Whitespace tokenizer that remembers line numbers for error messages.
struct Tokens<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    current: Option<(usize, std::str::SplitWhitespace<'a>)>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Tokens {
            lines: text.lines().enumerate(),
            current: None,
        }
    }

    fn next_raw(&mut self) -> Option<(usize, &'a str)> {
        loop {
            if let Some((line, words)) = self.current.as_mut() {
                if let Some(word) = words.next() {
                    return Some((*line, word));
                }
            }
            let (index, line) = self.lines.next()?;
            self.current = Some((index + 1, line.split_whitespace()));
        }
    }

    fn next_usize(&mut self, what: &str) -> Result<usize> {
        let (line, token) = self
            .next_raw()
            .ok_or_else(|| Error::Parse(format!("missing {}", what)))?;
        token.parse().map_err(|_| {
            Error::Parse(format!(
                "expected non-negative integer for {} on line {}, found '{}'",
                what, line, token
            ))
        })
    }

    fn next_i64(&mut self, what: &str) -> Result<i64> {
        let (line, token) = self
            .next_raw()
            .ok_or_else(|| Error::Parse(format!("missing {}", what)))?;
        token.parse().map_err(|_| {
            Error::Parse(format!(
                "expected integer for {} on line {}, found '{}'",
                what, line, token
            ))
        })
    }
}
