use futures::future::LocalBoxFuture;

use crate::node::NodeId;

/// The sole external collaborator: given a node, enumerate its direct dependencies.
///
/// Implementations may resolve synchronously (return an already-ready future, e.g. via
/// `futures::future::ready(..).boxed_local()`) or suspend arbitrarily; the engine supports both
/// without a separate code path, per the single suspension point described in the crate's
/// concurrency notes. The returned future is deliberately not `Send`: this engine never moves
/// work across threads, so there is nothing to gain from requiring it and doing so would force
/// every resolver implementation to pay for synchronization it doesn't need.
pub trait Resolver {
  type Error: std::error::Error + Clone + 'static;

  fn get_dependencies(&self, node: &NodeId) -> LocalBoxFuture<'static, Result<Vec<NodeId>, Self::Error>>;
}
