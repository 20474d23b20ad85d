use std::fmt;
use std::rc::Rc;

use im::{HashMap, HashSet};
use thiserror::Error;

/// An opaque node identifier.
///
/// Cloning a `NodeId` is a pointer bump, not a string copy: the payload lives behind an `Rc<str>`
/// and is shared by every `Node`/edge that mentions it.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(Rc<str>);

impl NodeId {
  pub fn new(id: impl Into<Rc<str>>) -> Self {
    NodeId(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.0)
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl<S: Into<Rc<str>>> From<S> for NodeId {
  fn from(s: S) -> Self {
    NodeId::new(s)
  }
}

/// A single vertex: its edges in both directions, and whether transitive pruning may remove it.
#[derive(Clone, Debug)]
pub struct Node {
  name: NodeId,
  dependencies: HashSet<NodeId>,
  dependents: HashSet<NodeId>,
  is_entry: bool,
}

impl Node {
  fn new(name: NodeId) -> Self {
    Node {
      name,
      dependencies: HashSet::new(),
      dependents: HashSet::new(),
      is_entry: false,
    }
  }

  pub fn name(&self) -> &NodeId {
    &self.name
  }

  pub fn dependencies(&self) -> &HashSet<NodeId> {
    &self.dependencies
  }

  pub fn dependents(&self) -> &HashSet<NodeId> {
    &self.dependents
  }

  pub fn is_entry(&self) -> bool {
    self.is_entry
  }
}

/// Errors raised by synchronous, structural misuse of a [`NodeStore`].
///
/// These never travel through the event bus: see the crate-level error handling notes.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum GraphError {
  #[error("node `{0}` is already defined")]
  DuplicateNode(NodeId),
  #[error("node `{0}` is not defined")]
  UnknownNode(NodeId),
  #[error("edge references undefined endpoint `{0}`")]
  MissingEndpoint(NodeId),
}

/// An immutable snapshot of the dependency graph's nodes and edges.
///
/// Every mutating method consumes `&self` and returns a new `NodeStore`; the receiver is left
/// untouched, so a reference held by an event handler stays valid for the lifetime of that
/// handler's invocation. Structural sharing (`im::HashMap`/`im::HashSet`) keeps this cheap: a
/// mutation that touches one node only allocates along the path to that node, the way
/// `aerie`'s `ShadowGraph` does for its own incrementally-edited graph.
#[derive(Clone, Debug)]
pub struct NodeStore {
  nodes: HashMap<NodeId, Node>,
}

impl NodeStore {
  pub fn new() -> Self {
    NodeStore {
      nodes: HashMap::new(),
    }
  }

  pub fn contains(&self, id: &NodeId) -> bool {
    self.nodes.contains_key(id)
  }

  pub fn get(&self, id: &NodeId) -> Option<&Node> {
    self.nodes.get(id)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
    self.nodes.iter()
  }

  #[must_use]
  pub fn add_node(&self, id: &NodeId) -> Result<Self, GraphError> {
    if self.nodes.contains_key(id) {
      return Err(GraphError::DuplicateNode(id.clone()));
    }
    let mut nodes = self.nodes.clone();
    nodes.insert(id.clone(), Node::new(id.clone()));
    Ok(NodeStore { nodes })
  }

  /// Adds `id` if it is not already present; otherwise returns `self` unchanged (no error).
  ///
  /// This is the "ensure defined" shape the trace engine needs: a dependency discovered mid-trace
  /// should become a node without the caller having to special-case "already there".
  #[must_use]
  pub fn ensure_node(&self, id: &NodeId) -> Self {
    if self.nodes.contains_key(id) {
      self.clone()
    } else {
      self
        .add_node(id)
        .expect("just checked that the node is absent")
    }
  }

  #[must_use]
  pub fn remove_node(&self, id: &NodeId) -> Result<Self, GraphError> {
    let node = self
      .nodes
      .get(id)
      .ok_or_else(|| GraphError::UnknownNode(id.clone()))?
      .clone();
    let mut nodes = self.nodes.clone();
    for dep in node.dependencies.iter() {
      if let Some(dep_node) = nodes.get(dep) {
        let mut dep_node = dep_node.clone();
        dep_node.dependents.remove(id);
        nodes.insert(dep.clone(), dep_node);
      }
    }
    for dependent in node.dependents.iter() {
      if let Some(dependent_node) = nodes.get(dependent) {
        let mut dependent_node = dependent_node.clone();
        dependent_node.dependencies.remove(id);
        nodes.insert(dependent.clone(), dependent_node);
      }
    }
    nodes.remove(id);
    Ok(NodeStore { nodes })
  }

  #[must_use]
  pub fn add_edge(&self, head: &NodeId, tail: &NodeId) -> Result<Self, GraphError> {
    let head_node = self
      .nodes
      .get(head)
      .ok_or_else(|| GraphError::MissingEndpoint(head.clone()))?;
    if !self.nodes.contains_key(tail) {
      return Err(GraphError::MissingEndpoint(tail.clone()));
    }
    if head_node.dependencies.contains(tail) {
      return Ok(self.clone());
    }
    let mut nodes = self.nodes.clone();
    let mut head_node = head_node.clone();
    head_node.dependencies.insert(tail.clone());
    nodes.insert(head.clone(), head_node);
    let mut tail_node = nodes
      .get(tail)
      .expect("presence just checked above")
      .clone();
    tail_node.dependents.insert(head.clone());
    nodes.insert(tail.clone(), tail_node);
    Ok(NodeStore { nodes })
  }

  #[must_use]
  pub fn remove_edge(&self, head: &NodeId, tail: &NodeId) -> Result<Self, GraphError> {
    let head_node = self
      .nodes
      .get(head)
      .ok_or_else(|| GraphError::UnknownNode(head.clone()))?;
    if !head_node.dependencies.contains(tail) {
      return Ok(self.clone());
    }
    let mut nodes = self.nodes.clone();
    let mut head_node = head_node.clone();
    head_node.dependencies.remove(tail);
    nodes.insert(head.clone(), head_node);
    if let Some(tail_node) = nodes.get(tail) {
      let mut tail_node = tail_node.clone();
      tail_node.dependents.remove(head);
      nodes.insert(tail.clone(), tail_node);
    }
    Ok(NodeStore { nodes })
  }

  #[must_use]
  pub fn set_entry(&self, id: &NodeId, is_entry: bool) -> Result<Self, GraphError> {
    let node = self
      .nodes
      .get(id)
      .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
    if node.is_entry == is_entry {
      return Ok(self.clone());
    }
    let mut nodes = self.nodes.clone();
    let mut node = node.clone();
    node.is_entry = is_entry;
    nodes.insert(id.clone(), node);
    Ok(NodeStore { nodes })
  }
}

impl Default for NodeStore {
  fn default() -> Self {
    NodeStore::new()
  }
}
