//! Shared worklist of nodes holding positive excess.
//!
//! The list itself is a LIFO stack of node indices behind one mutex. On top
//! of the plain [`ExcessWorklist::insert`]/[`ExcessWorklist::take`] pair it
//! tracks how many workers are currently discharging a node, so that a worker
//! never concludes the run is over while another one may still produce work.

use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    nodes: Vec<usize>,
    /// Workers holding a [`Claim`].
    active: usize,
}

impl State {
    fn quiescent(&self) -> bool {
        self.nodes.is_empty() && self.active == 0
    }
}

#[derive(Debug, Default)]
pub struct ExcessWorklist {
    state: Mutex<State>,
    changed: Condvar,
}

impl ExcessWorklist {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("excess worklist poisoned")
    }

    /// Adds `node` to the list and wakes one waiting worker.
    pub fn insert(&self, node: usize) {
        self.lock().nodes.push(node);
        self.changed.notify_one();
    }

    /// Removes the most recently inserted node, or returns `None` right away
    /// when the list is empty.
    pub fn take(&self) -> Option<usize> {
        self.lock().nodes.pop()
    }

    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }

    /// Number of outstanding claims.
    pub fn active(&self) -> usize {
        self.lock().active
    }

    /// Takes a node and registers the caller as active until the returned
    /// [`Claim`] is dropped.
    ///
    /// Blocks while the list is empty and some other claim is outstanding,
    /// since that worker may still insert nodes. Returns `None` once the list
    /// is empty and no claim is outstanding; from then on no work can appear.
    pub fn claim(&self) -> Option<Claim<'_>> {
        let mut state = self.lock();
        loop {
            if let Some(node) = state.nodes.pop() {
                state.active += 1;
                return Some(Claim {
                    worklist: self,
                    node,
                });
            }
            if state.active == 0 {
                drop(state);
                self.changed.notify_all();
                return None;
            }
            state = self
                .changed
                .wait(state)
                .expect("excess worklist poisoned");
        }
    }

    fn release(&self) {
        let mut state = self.lock();
        state.active -= 1;
        if state.quiescent() {
            drop(state);
            self.changed.notify_all();
        }
    }
}

/// A node taken from the worklist by a worker that is still processing it.
///
/// Dropping the claim, on any exit path, marks the worker idle again.
#[derive(Debug)]
pub struct Claim<'w> {
    worklist: &'w ExcessWorklist,
    node: usize,
}

impl Claim<'_> {
    pub fn node(&self) -> usize {
        self.node
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.worklist.release();
    }
}
