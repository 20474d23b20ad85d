use std::cell::RefCell;
use std::rc::Rc;

use crate::node::NodeId;

/// Payloads carried on the event bus, matching the crate's external event table.
#[derive(Clone, Debug)]
pub enum Event<E> {
  Traced {
    node: NodeId,
    dependencies: Vec<NodeId>,
  },
  Pruned {
    node: NodeId,
  },
  Error {
    node: NodeId,
    error: E,
  },
  Complete,
}

type Subscriber<E> = Rc<dyn Fn(&Event<E>)>;

/// A synchronous, re-entrancy-safe publish/subscribe channel.
///
/// Subscribers are invoked in registration order. The subscriber list is cloned (an `Rc` bump
/// per entry, not a deep copy) before each delivery pass, so a handler that emits another event
/// or registers a new subscriber mid-delivery never conflicts with the borrow doing the
/// iterating. The new subscriber simply doesn't see events already in flight.
pub struct EventBus<E> {
  subscribers: RefCell<Vec<Subscriber<E>>>,
}

impl<E> EventBus<E> {
  pub fn new() -> Self {
    EventBus {
      subscribers: RefCell::new(Vec::new()),
    }
  }

  pub fn subscribe(&self, handler: impl Fn(&Event<E>) + 'static) {
    self.subscribers.borrow_mut().push(Rc::new(handler));
  }

  pub fn emit(&self, event: Event<E>) {
    let subscribers: Vec<_> = self.subscribers.borrow().clone();
    for subscriber in subscribers {
      subscriber(&event);
    }
  }
}

impl<E> Default for EventBus<E> {
  fn default() -> Self {
    EventBus::new()
  }
}
