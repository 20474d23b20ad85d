use crate::node::{GraphError, NodeId, NodeStore};

/// Builds a [`NodeStore`] from a small text grammar used by tests and diagnostic tooling.
///
/// Each non-blank line is either a bare node (`a`) or an arrow chain (`a -> b -> c`), which
/// declares an edge between every consecutive pair, creating either endpoint if it isn't already
/// present. This is exactly the shorthand the crate's own scenario descriptions use, e.g.
/// `a -> b -> c -> b` for a three-node cycle hanging off `a`.
pub fn parse_notation(text: &str) -> Result<NodeStore, GraphError> {
  let mut store = NodeStore::new();

  for line in text.lines() {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }

    let mut ids = line.split("->").map(str::trim).map(NodeId::new);
    let first = ids.next().expect("split always yields at least one piece");
    store = store.ensure_node(&first);

    let mut previous = first;
    for next in ids {
      store = store.ensure_node(&next);
      store = store.add_edge(&previous, &next)?;
      previous = next;
    }
  }

  Ok(store)
}
