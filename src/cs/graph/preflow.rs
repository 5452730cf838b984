//! Concurrent preflow-push (generic push-relabel) maximum flow.
//!
//! The source is raised to height `n` and every edge leaving it is
//! saturated. A fixed pool of workers then repeatedly claims an active node
//! from the shared worklist, pushes along the first admissible incident edge,
//! or relabels the node when there is none. The run ends once the worklist
//! is empty and no worker is still discharging a node; the excess collected
//! at the sink is the maximum flow.
//!
//! # Examples
//!
//! ```rust
//! use preflow::graph::{compute_max_flow, Network};
//!
//! let network = Network::from_edges(4, &[(0, 1, 4), (0, 2, 2), (1, 3, 3), (2, 3, 5)]).unwrap();
//! assert_eq!(compute_max_flow(&network, 0, 3, 4).unwrap(), 5);
//! ```

use crate::cs::error::{Error, Result};
use crate::cs::graph::network::Network;
use crate::cs::graph::residual::{Admissibility, NodeState, ResidualGraph};
use log::debug;
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::thread;

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of worker threads, at least one.
    pub workers: usize,
    pub admissibility: Admissibility,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            admissibility: Admissibility::default(),
        }
    }
}

impl Config {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_admissibility(mut self, admissibility: Admissibility) -> Self {
        self.admissibility = admissibility;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid("worker count must be positive"));
        }
        Ok(())
    }
}

/// Operation counts of a single worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub pushes: usize,
    pub relabels: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub pushes: usize,
    pub relabels: usize,
    pub per_worker: Vec<WorkerStats>,
}

impl Stats {
    fn collect(per_worker: Vec<WorkerStats>) -> Self {
        Stats {
            pushes: per_worker.iter().map(|w| w.pushes).sum(),
            relabels: per_worker.iter().map(|w| w.relabels).sum(),
            per_worker,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxFlow {
    /// Flow value, i.e. the final excess at the sink.
    pub value: i64,
    /// Net flow per edge, from its first endpoint toward its second.
    pub flows: Vec<i64>,
    /// Final height and excess per node.
    pub nodes: Vec<NodeState>,
    pub stats: Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Pushed,
    Relabeled,
    /// The claimed node no longer held excess.
    Idle,
}

#[derive(Debug, Clone, Default)]
pub struct PreflowPush {
    config: Config,
}

impl PreflowPush {
    pub fn new(config: Config) -> Self {
        PreflowPush { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Computes a maximum flow from `source` to `sink`.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidVertex` - if `source` or `sink` is out of range
    /// * `Error::InvalidInput` - if `source == sink` or the worker count is zero
    /// * `Error::ThreadPool` - if the worker threads cannot be started
    ///
    /// # Panics
    ///
    /// If a push or relabel breaks a flow invariant. That is a solver defect,
    /// never a property of the input.
    pub fn solve(&self, network: &Network, source: usize, sink: usize) -> Result<MaxFlow> {
        self.config.validate()?;
        let graph = ResidualGraph::new(network, source, sink)?;
        debug!(
            "preflow: {} nodes, {} edges, source {}, sink {}, {} workers, {:?} admissibility",
            graph.node_count(),
            graph.edges().len(),
            source,
            sink,
            self.config.workers,
            self.config.admissibility
        );

        graph.saturate_source();
        debug!(
            "preflow: source saturated, {} active nodes",
            graph.worklist().len()
        );

        let stats = Stats::collect(run_workers(&graph, &self.config)?);
        let nodes = graph.node_states();
        let value = nodes[sink].excess;
        debug!(
            "preflow: f = {} after {} pushes and {} relabels",
            value, stats.pushes, stats.relabels
        );

        Ok(MaxFlow {
            value,
            flows: graph.flows(),
            nodes,
            stats,
        })
    }
}

/// Maximum flow value from `source` to `sink` using `worker_count` workers.
pub fn compute_max_flow(
    network: &Network,
    source: usize,
    sink: usize,
    worker_count: usize,
) -> Result<i64> {
    let config = Config::default().with_workers(worker_count);
    PreflowPush::new(config)
        .solve(network, source, sink)
        .map(|flow| flow.value)
}

/// Runs `config.workers` workers on a seeded graph until it is quiescent.
fn run_workers(graph: &ResidualGraph, config: &Config) -> Result<Vec<WorkerStats>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("preflow-worker-{}", i))
        .build()?;
    let rule = config.admissibility;
    Ok(pool.broadcast(|ctx| work(graph, rule, ctx.index())))
}

/// Worker loop: discharge claimed nodes until the run is quiescent.
fn work(graph: &ResidualGraph, rule: Admissibility, id: usize) -> WorkerStats {
    let mut stats = WorkerStats::default();
    while let Some(claim) = graph.worklist().claim() {
        match discharge(graph, claim.node(), rule) {
            Step::Pushed => stats.pushes += 1,
            Step::Relabeled => stats.relabels += 1,
            Step::Idle => {}
        }
    }
    debug!(
        "worker {} done: {} pushes, {} relabels",
        id, stats.pushes, stats.relabels
    );
    stats
}

/// One push from `u` along its first admissible edge, or a relabel of `u`.
fn discharge(graph: &ResidualGraph, u: usize, rule: Admissibility) -> Step {
    for &edge in graph.adjacency(u) {
        let v = graph.other(edge, u);
        if v == u {
            continue;
        }
        // Heights and residual capacity may have moved since the claim;
        // only the state seen under both locks counts.
        let mut pair = graph.lock_pair(u, v);
        if pair.from().excess() == 0 {
            return Step::Idle;
        }
        if graph.is_admissible(&pair, edge, rule) {
            graph.push(&mut pair, edge);
            return Step::Pushed;
        }
    }

    let mut node = graph.lock(u);
    if node.excess() == 0 {
        return Step::Idle;
    }
    graph.relabel(&mut node);
    Step::Relabeled
}
