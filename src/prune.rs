use std::collections::VecDeque;

use im::HashSet;

use crate::node::{NodeId, NodeStore};

/// Computes the set of nodes that `prune_node(root)` must remove, in the breadth-first order
/// `pruned` events should be emitted.
///
/// `root` is always included (the caller asked for it to go, unconditionally). Beyond that, a
/// node `c` forward-reachable from `root` survives iff it is an entry node, or some dependent of
/// `c` lies outside the reachable set (i.e. outside everything this prune could possibly touch).
/// "Surviving" propagates forward along dependency edges, so a cyclic chain hanging off a
/// surviving node survives with it even though every node in the chain depends on something
/// inside the reachable set too.
///
/// A naive "decrement a remaining-dependents counter to zero" worklist is not sufficient here:
/// on a pure cycle such as `b -> c -> b` with no external keeper, both `b` and `c` start with a
/// nonzero count (each depends on the other) and neither one's count ever reaches zero by simple
/// decrementing, so that approach never discovers that the whole pair is in fact orphaned once
/// `root` is removed. Marking aliveness forward from confirmed keepers instead of marking death
/// backward from confirmed losses sidesteps the deadlock: a cycle with no live anchor is, by
/// construction, never marked alive, and therefore ends up in the orphan set as it should.
pub fn compute_orphan_set(store: &NodeStore, root: &NodeId) -> Vec<NodeId> {
  let reachable = forward_reachable(store, root);
  let alive = compute_alive(store, root, &reachable);

  let mut orphans: HashSet<NodeId> = HashSet::new();
  orphans.insert(root.clone());
  for node in reachable.iter() {
    if !alive.contains(node) {
      orphans.insert(node.clone());
    }
  }

  emission_order(store, root, &orphans)
}

/// Nodes forward-reachable from `root` via `dependencies` edges, excluding `root` itself.
fn forward_reachable(store: &NodeStore, root: &NodeId) -> HashSet<NodeId> {
  let mut visited: HashSet<NodeId> = HashSet::new();
  visited.insert(root.clone());
  let mut reachable: HashSet<NodeId> = HashSet::new();
  let mut queue: VecDeque<NodeId> = VecDeque::new();
  queue.push_back(root.clone());

  while let Some(current) = queue.pop_front() {
    let Some(node) = store.get(&current) else {
      continue;
    };
    for dep in node.dependencies().iter() {
      if !visited.contains(dep) {
        visited.insert(dep.clone());
        reachable.insert(dep.clone());
        queue.push_back(dep.clone());
      }
    }
  }

  reachable
}

/// Nodes in `reachable` that must survive the prune, with aliveness propagated forward.
fn compute_alive(store: &NodeStore, root: &NodeId, reachable: &HashSet<NodeId>) -> HashSet<NodeId> {
  let mut alive: HashSet<NodeId> = HashSet::new();
  let mut worklist: VecDeque<NodeId> = VecDeque::new();

  for id in reachable.iter() {
    let Some(node) = store.get(id) else { continue };
    let kept_by_entry = node.is_entry();
    let kept_by_external_dependent = node
      .dependents()
      .iter()
      .any(|dependent| dependent != root && !reachable.contains(dependent));
    if kept_by_entry || kept_by_external_dependent {
      if alive.insert(id.clone()).is_none() {
        worklist.push_back(id.clone());
      }
    }
  }

  while let Some(current) = worklist.pop_front() {
    let Some(node) = store.get(&current) else {
      continue;
    };
    for dep in node.dependencies().iter() {
      if reachable.contains(dep) && !alive.contains(dep) {
        alive.insert(dep.clone());
        worklist.push_back(dep.clone());
      }
    }
  }

  alive
}

/// A breadth-first walk from `root` restricted to edges fully inside `orphans`, which is
/// guaranteed to discover every member: any orphan not reachable that way would have to be
/// reached only through a surviving node, but aliveness propagates forward across every
/// dependency edge, so a path through a surviving node would make its successor alive too.
/// That would contradict its membership in `orphans`.
fn emission_order(store: &NodeStore, root: &NodeId, orphans: &HashSet<NodeId>) -> Vec<NodeId> {
  let mut visited: HashSet<NodeId> = HashSet::new();
  visited.insert(root.clone());
  let mut order = vec![root.clone()];
  let mut queue: VecDeque<NodeId> = VecDeque::new();
  queue.push_back(root.clone());

  while let Some(current) = queue.pop_front() {
    let Some(node) = store.get(&current) else {
      continue;
    };
    for dep in node.dependencies().iter() {
      if orphans.contains(dep) && !visited.contains(dep) {
        visited.insert(dep.clone());
        order.push(dep.clone());
        queue.push_back(dep.clone());
      }
    }
  }

  debug_assert_eq!(
    order.len(),
    orphans.len(),
    "emission walk must discover every orphan"
  );
  order
}
