use std::cell::Cell;
use std::rc::Rc;

use crate::node::NodeId;

/// A cheaply-clonable handle to a single job's validity flag.
///
/// The facade hands one of these back from [`PendingJobs::push`] and also keeps a copy for
/// itself to check when the corresponding resolver callback eventually fires. Sharing the same
/// `Rc<Cell<bool>>` between the two sides means a callback can tell, in O(1) and without
/// ambiguity, whether *this specific* job instance is still the one the queue cares about. A
/// plain "first job matching this id" scan can't make that distinction once a job has been
/// invalidated and a fresh one pushed for the same id (which happens around a retrace).
#[derive(Clone, Debug)]
pub struct JobToken(Rc<Cell<bool>>);

impl JobToken {
  fn new() -> Self {
    JobToken(Rc::new(Cell::new(true)))
  }

  pub fn is_valid(&self) -> bool {
    self.0.get()
  }

  pub fn invalidate(&self) {
    self.0.set(false);
  }
}

/// One outstanding (or formerly outstanding) `getDependencies` call.
#[derive(Clone, Debug)]
pub struct Job {
  node: NodeId,
  token: JobToken,
}

impl Job {
  pub fn node(&self) -> &NodeId {
    &self.node
  }

  pub fn is_valid(&self) -> bool {
    self.token.is_valid()
  }
}

/// The ordered sequence of jobs the trace engine has scheduled.
///
/// Entries are never physically removed on invalidation, only flagged. That way a job's
/// `JobToken` (captured by the in-flight future that owns it) and the queue's own bookkeeping
/// never disagree about whether a given job instance is still live.
#[derive(Debug, Default)]
pub struct PendingJobs {
  jobs: Vec<Job>,
}

impl PendingJobs {
  pub fn new() -> Self {
    PendingJobs { jobs: Vec::new() }
  }

  /// Appends a fresh valid job for `node` and returns the token the caller must hold onto to
  /// check validity when its resolver callback completes.
  pub fn push(&mut self, node: NodeId) -> JobToken {
    let token = JobToken::new();
    self.jobs.push(Job {
      node,
      token: token.clone(),
    });
    token
  }

  pub fn invalidate_for(&self, node: &NodeId) {
    for job in &self.jobs {
      if job.node() == node {
        job.token.invalidate();
      }
    }
  }

  pub fn is_pending(&self, node: &NodeId) -> bool {
    self
      .jobs
      .iter()
      .any(|job| job.node() == node && job.is_valid())
  }

  pub fn any_valid(&self) -> bool {
    self.jobs.iter().any(Job::is_valid)
  }

  /// A read-only FIFO view, for [`crate::graph::DependencyGraph::pending_jobs`].
  pub fn snapshot(&self) -> Vec<(NodeId, bool)> {
    self
      .jobs
      .iter()
      .map(|job| (job.node.clone(), job.is_valid()))
      .collect()
  }

  /// Drops invalidated entries that no longer carry any other strong reference, keeping the
  /// backing vector from growing without bound across a long-running graph.
  pub fn compact(&mut self) {
    self
      .jobs
      .retain(|job| job.is_valid() || Rc::strong_count(&job.token.0) > 1);
  }
}
