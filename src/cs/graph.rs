//! Maximum flow over undirected capacitated networks.
//!
//! This module provides:
//! - [`Network`], the validated construction input and its text reader
//! - [`ResidualGraph`] with per-node locks and the push/relabel operations
//! - [`ExcessWorklist`], the shared worklist of active nodes
//! - [`PreflowPush`], the concurrent preflow-push driver
//! - [`edmond_karp`], a sequential reference solver
//!
//! # Examples
//!
//! ```rust
//! use preflow::graph::{Config, Network, PreflowPush};
//!
//! let network: Network = "4 4 0 0\n0 1 1\n0 2 1\n1 3 1\n2 3 1\n".parse().unwrap();
//! let flow = PreflowPush::new(Config::default().with_workers(2))
//!     .solve(&network, 0, 3)
//!     .unwrap();
//! assert_eq!(flow.value, 2);
//! ```

pub mod edmond_karp;
pub mod generator;
pub mod network;
pub mod preflow;
pub mod residual;
pub mod worklist;

pub use edmond_karp::edmond_karp;
pub use generator::random_network;
pub use network::{read_network, Link, Network, MAX_INCIDENT_CAPACITY};
pub use preflow::{compute_max_flow, Config, MaxFlow, PreflowPush, Stats, WorkerStats};
pub use residual::{Admissibility, Edge, NodeGuard, NodeState, PairGuard, ResidualGraph};
pub use worklist::{Claim, ExcessWorklist};
