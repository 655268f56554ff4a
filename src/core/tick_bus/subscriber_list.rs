//=========================================================================
// Subscriber List Trait
//=========================================================================
//
// Type-erased storage for one tick's ordered subscribers, so lists with
// different payload types can live in the same HashMap.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

//=== Internal Dependencies ===============================================

use crate::core::error::HandlerResult;

//=== Subscriber ==========================================================

/// Boxed subscriber callback for payload type `P`.
pub(super) type Handler<P> = Box<dyn FnMut(&mut P) -> HandlerResult + Send>;

/// Shared slot holding one handler.
///
/// The reentrant lock serializes fires from different threads (the second
/// thread waits). The same thread re-acquires it freely, and the `RefCell`
/// then refuses the second mutable borrow, which is how a fire from inside
/// the handler itself is detected.
pub(super) type HandlerCell<P> = ReentrantMutex<RefCell<Handler<P>>>;

/// A registered handler plus its subscription id.
///
/// The handler sits behind an `Arc` so a fire can snapshot the list,
/// release the registry lock, and still call every handler.
pub(super) struct Subscriber<P> {
    pub(super) id: u64,
    pub(super) handler: Arc<HandlerCell<P>>,
}

impl<P> Subscriber<P> {
    pub(super) fn new(id: u64, handler: Handler<P>) -> Self {
        Self {
            id,
            handler: Arc::new(ReentrantMutex::new(RefCell::new(handler))),
        }
    }
}

impl<P> Clone for Subscriber<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
        }
    }
}

//=== SubscriberList ======================================================

/// Type-erased operations on a tick's subscriber list.
pub(super) trait SubscriberList: Send {
    /// Removes the subscriber with `id`, preserving order of the rest.
    fn remove(&mut self, id: u64) -> bool;

    /// Number of registered subscribers.
    fn len(&self) -> usize;

    /// Name of the payload type this list was created for.
    fn payload_type(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<P: 'static> SubscriberList for Vec<Subscriber<P>> {
    fn remove(&mut self, id: u64) -> bool {
        match self.iter().position(|s| s.id == id) {
            Some(index) => {
                // Vec::remove (not swap_remove) keeps registration order.
                Vec::remove(self, index);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn payload_type(&self) -> &'static str {
        type_name::<P>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=========================================================================
// Tests
//=========================================================================
