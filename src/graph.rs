use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, trace};

use crate::events::{Event, EventBus};
use crate::node::{GraphError, NodeId, NodeStore};
use crate::prune::compute_orphan_set;
use crate::queue::{JobToken, PendingJobs};
use crate::resolver::Resolver;

/// A resolver call that has been scheduled but whose future has not yet been driven.
///
/// `trace_node` only ever creates one of these and records it; actually polling the future to
/// completion is [`DependencyGraph::run`]'s job, mirroring the teacher's split between mutating
/// state under its lock and awaiting outside of it.
struct Scheduled<E> {
  node: NodeId,
  token: JobToken,
  future: LocalBoxFuture<'static, Result<Vec<NodeId>, E>>,
}

/// The public dependency-graph engine: trace, prune, and observe, all on one execution context.
///
/// Internal state uses `Rc`/`RefCell` rather than `Arc`/`Mutex` deliberately. This type is not
/// `Send`, so it cannot be moved to another thread by accident. That mirrors the single-threaded
/// cooperative scheduling model described at the crate root: every suspension point is a resolver
/// callback, never a lock wait.
pub struct DependencyGraph<R: Resolver> {
  resolver: Rc<R>,
  store: RefCell<NodeStore>,
  jobs: RefCell<PendingJobs>,
  events: EventBus<R::Error>,
  scheduled: RefCell<Vec<Scheduled<R::Error>>>,
}

impl<R: Resolver> DependencyGraph<R> {
  pub fn new(resolver: R) -> Self {
    Self::with_nodes(resolver, NodeStore::new())
  }

  pub fn with_nodes(resolver: R, nodes: NodeStore) -> Self {
    DependencyGraph {
      resolver: Rc::new(resolver),
      store: RefCell::new(nodes),
      jobs: RefCell::new(PendingJobs::new()),
      events: EventBus::new(),
      scheduled: RefCell::new(Vec::new()),
    }
  }

  pub fn is_node_defined(&self, id: &NodeId) -> bool {
    self.store.borrow().contains(id)
  }

  pub fn is_node_pending(&self, id: &NodeId) -> bool {
    self.jobs.borrow().is_pending(id)
  }

  pub fn get_nodes(&self) -> NodeStore {
    self.store.borrow().clone()
  }

  pub fn pending_jobs(&self) -> Vec<(NodeId, bool)> {
    self.jobs.borrow().snapshot()
  }

  pub fn events(&self) -> &EventBus<R::Error> {
    &self.events
  }

  pub fn set_node_as_entry(&self, id: impl Into<NodeId>) -> Result<(), GraphError> {
    let id = id.into();
    let updated = self.store.borrow().set_entry(&id, true)?;
    *self.store.borrow_mut() = updated;
    Ok(())
  }

  pub fn unset_node_as_entry(&self, id: impl Into<NodeId>) -> Result<(), GraphError> {
    let id = id.into();
    let updated = self.store.borrow().set_entry(&id, false)?;
    *self.store.borrow_mut() = updated;
    Ok(())
  }

  /// Schedules a resolver call for `id` and records a pending job for it.
  ///
  /// This never blocks: the actual future is only polled by [`Self::run`]. The queue always
  /// grows by exactly one job, unconditionally; an already-defined node is re-resolved rather
  /// than short-circuited, matching the reference behavior this engine is modeled on.
  pub fn trace_node(&self, id: impl Into<NodeId>) {
    let id = id.into();
    trace!("scheduling trace of {}", id);
    let token = self.jobs.borrow_mut().push(id.clone());
    let future = self.resolver.get_dependencies(&id);
    self.scheduled.borrow_mut().push(Scheduled {
      node: id,
      token,
      future,
    });
  }

  /// Removes `id` and every node that transitively loses all dependents as a result, cascading
  /// job invalidation and emitting one `pruned` event per removed node in breadth-first order.
  pub fn prune_node(&self, id: impl Into<NodeId>) {
    let id = id.into();
    let mut store = self.store.borrow().clone();
    if !store.contains(&id) {
      trace!("prune of undefined node {} is a no-op", id);
      self.evaluate_completion();
      return;
    }

    let orphans = compute_orphan_set(&store, &id);
    debug!("pruning {} ({} nodes orphaned)", id, orphans.len());
    for orphan in &orphans {
      store = store
        .remove_node(orphan)
        .expect("orphan set only ever names nodes present in the snapshot it was computed from");
      *self.store.borrow_mut() = store.clone();
      self.jobs.borrow().invalidate_for(orphan);
      self.events.emit(Event::Pruned {
        node: orphan.clone(),
      });
    }
    self.evaluate_completion();
  }

  /// Drives every resolver call scheduled by `trace_node` (including ones scheduled recursively
  /// along the way) to quiescence.
  ///
  /// This is the one facade operation this crate adds beyond a literal reading of the trace
  /// engine's contract: something has to poll the resolver futures, and doing so here (rather
  /// than inside `trace_node` itself) keeps `trace_node` synchronous and keeps the "mutate, then
  /// await" ordering explicit.
  pub async fn run(&self) {
    let mut in_flight = FuturesUnordered::new();

    loop {
      for job in self.scheduled.borrow_mut().drain(..) {
        let Scheduled {
          node,
          token,
          future,
        } = job;
        in_flight.push(async move {
          let result = future.await;
          (node, token, result)
        });
      }

      if in_flight.is_empty() {
        break;
      }

      if let Some((node, token, result)) = in_flight.next().await {
        self.handle_result(node, token, result);
      }
    }
  }

  fn handle_result(&self, node: NodeId, token: JobToken, result: Result<Vec<NodeId>, R::Error>) {
    if !token.is_valid() {
      trace!("discarding result for invalidated job on {}", node);
      self.evaluate_completion();
      return;
    }

    match result {
      Err(error) => {
        debug!("resolver failed for {}", node);
        self.events.emit(Event::Error {
          node: node.clone(),
          error,
        });
        token.invalidate();
        self.evaluate_completion();
      }
      Ok(dependencies) => {
        let mut store = self.store.borrow().clone();
        if !store.contains(&node) {
          store = store.ensure_node(&node);
        }

        let mut to_retrace = Vec::new();
        for dep in &dependencies {
          // Captured before this dep is (possibly) added below: once added, it would always
          // read back as "defined", silently breaking the fan-out into newly-discovered nodes.
          let already_known = store.contains(dep) || self.jobs.borrow().is_pending(dep);
          store = store.ensure_node(dep);
          store = store
            .add_edge(&node, dep)
            .expect("both endpoints were just ensured present");
          if !already_known {
            to_retrace.push(dep.clone());
          }
        }

        *self.store.borrow_mut() = store;
        token.invalidate();
        self.events.emit(Event::Traced {
          node: node.clone(),
          dependencies,
        });

        for dep in to_retrace {
          self.trace_node(dep);
        }

        self.evaluate_completion();
      }
    }
  }

  fn evaluate_completion(&self) {
    let mut jobs = self.jobs.borrow_mut();
    jobs.compact();
    if !jobs.any_valid() {
      drop(jobs);
      self.events.emit(Event::Complete);
    }
  }
}
