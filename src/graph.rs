//! Audio destination and node connection tracking.
//!
//! Every oscillator and gain node connects itself to the destination when it
//! is built and must be disconnected explicitly when its voice is retired.
//! The graph counts live connections, so a voice that is dropped without
//! being torn down shows up as a leak (and is logged).

use std::cell::Cell;
use std::rc::Rc;

/// Kind of node holding a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Oscillator,
    Gain,
}

/// The audio destination.
#[derive(Debug, Default)]
pub struct AudioGraph {
    live: Rc<Cell<usize>>,
}

impl AudioGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a new node to the destination.
    pub fn connect(&self, kind: NodeKind) -> Connection {
        self.live.set(self.live.get() + 1);
        Connection {
            kind,
            live: Rc::clone(&self.live),
            open: true,
        }
    }

    /// Number of nodes currently connected.
    #[inline]
    pub fn live_nodes(&self) -> usize {
        self.live.get()
    }
}

/// A node's link to the destination.
#[derive(Debug)]
pub struct Connection {
    kind: NodeKind,
    live: Rc<Cell<usize>>,
    open: bool,
}

impl Connection {
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Disconnect from the destination.
    pub fn close(mut self) {
        self.open = false;
        self.live.set(self.live.get().saturating_sub(1));
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.open {
            log::warn!("{:?} node dropped while still connected", self.kind);
            self.live.set(self.live.get().saturating_sub(1));
        }
    }
}
