//! Subtest rendezvous.
//!
//! A running test asks for a child test by sending a request and then blocks
//! until the supervising side reports that the child finished. The supervisor
//! owns the parent's list of child results, so the tree is assembled purely by
//! message passing.

use crate::context::Tester;
use crate::result::TestResult;
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;

/// A child test requested by a running test
pub(crate) struct SubtestRequest {
    /// Sanitized child name, without the parent prefix
    pub name: String,
    pub tester: Tester,
}

/// The supervising side went away before the subtest was serviced.
#[derive(Debug, Error)]
#[error("subtest supervisor is no longer running")]
pub(crate) struct SupervisorGone;

/// Test-side half: request a subtest and wait for it.
pub(crate) struct RendezvousClient {
    requests: Sender<SubtestRequest>,
    done: Receiver<bool>,
}

/// Engine-side half: service requests in order.
pub(crate) struct RendezvousServer {
    requests: Receiver<SubtestRequest>,
    done: Sender<bool>,
}

pub(crate) fn channel() -> (RendezvousClient, RendezvousServer) {
    let (req_tx, req_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();
    (
        RendezvousClient {
            requests: req_tx,
            done: done_rx,
        },
        RendezvousServer {
            requests: req_rx,
            done: done_tx,
        },
    )
}

impl RendezvousClient {
    /// Send a request and block until the child has a recorded result.
    /// Returns whether the child passed.
    pub fn request(&self, request: SubtestRequest) -> Result<bool, SupervisorGone> {
        log::trace!("requesting subtest {}", request.name);
        self.requests.send(request).map_err(|_| SupervisorGone)?;
        self.done.recv().map_err(|_| SupervisorGone)
    }
}

impl RendezvousServer {
    /// Service requests until every client handle is dropped, running each
    /// child with `run` and collecting results in request order.
    pub fn serve<F>(self, mut run: F) -> Vec<TestResult>
    where
        F: FnMut(SubtestRequest) -> TestResult,
    {
        let mut children = Vec::new();
        for request in self.requests.iter() {
            let result = run(request);
            let passed = result.passed();
            log::trace!("subtest {} finished: {}", result.name, result.outcome);
            children.push(result);
            // The requester only disappears if its body thread died mid-wait.
            let _ = self.done.send(passed);
        }
        children
    }
}
