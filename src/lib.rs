//! A directed dependency-graph engine driven by an external, asynchronous resolver.
//!
//! Given one or more entry nodes, [`DependencyGraph::trace_node`] asks a [`Resolver`] to
//! enumerate each node's direct dependencies, installs the resulting edges, and fans out to any
//! newly-discovered dependency. [`DependencyGraph::prune_node`] removes a node and every
//! dependency that transitively loses all dependents as a result, correctly handling cycles and
//! cancelling any resolution work that the removal makes moot. Both operations are observed
//! through an [`EventBus`].
//!
//! The engine is single-threaded by construction: internal state is `Rc`/`RefCell`, not
//! `Arc`/`Mutex`, so a `DependencyGraph` cannot cross a thread boundary by accident. The only
//! suspension point is the resolver callback.

mod events;
mod graph;
mod node;
mod notation;
mod prune;
mod queue;
mod resolver;


pub use events::{Event, EventBus};
pub use graph::DependencyGraph;
pub use node::{GraphError, Node, NodeId, NodeStore};
pub use notation::parse_notation;
pub use resolver::Resolver;

/// Logs at `trace` level only in test builds, so the extra chatter used to debug a failing
/// scenario costs nothing in a release build. Mirrors the equivalent helper in the build-graph
/// engine this crate's trace/prune split is patterned on.
#[cfg(test)]
macro_rules! test_trace_log {
  ($($arg:tt)+) => {
    log::trace!($($arg)+);
  };
}

#[cfg(test)]
pub(crate) use test_trace_log;
