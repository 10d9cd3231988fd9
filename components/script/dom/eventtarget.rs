/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::rc::Rc;

use log::error;

use crate::dom::bindings::error::ErrorResult;
use crate::dom::event::Event;

/// A script callback invoked with the event being dispatched. Returning an error is the
/// equivalent of the callback throwing.
pub type EventListener = Rc<dyn Fn(&Event) -> ErrorResult>;

fn same_listener(a: &EventListener, b: &EventListener) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[derive(Clone)]
enum EventListenerType {
    Additive(EventListener),
    /// An event handler attribute, such as `onmessage`.
    Inline(EventListener),
}

impl EventListenerType {
    fn listener(&self) -> &EventListener {
        match *self {
            EventListenerType::Additive(ref listener) |
            EventListenerType::Inline(ref listener) => listener,
        }
    }
}

/// <https://dom.spec.whatwg.org/#interface-eventtarget>
#[derive(Default)]
pub struct EventTarget {
    handlers: RefCell<HashMap<String, Vec<EventListenerType>>>,
}

impl EventTarget {
    pub fn new() -> EventTarget {
        EventTarget::default()
    }

    /// <https://dom.spec.whatwg.org/#add-an-event-listener>
    pub fn add_event_listener(&self, ty: &str, listener: EventListener) {
        let mut handlers = self.handlers.borrow_mut();
        let entries = handlers.entry(ty.to_owned()).or_default();
        let new_entry = EventListenerType::Additive(listener);
        let duplicate = entries.iter().any(|entry| {
            matches!(*entry, EventListenerType::Additive(_)) &&
                same_listener(entry.listener(), new_entry.listener())
        });
        if !duplicate {
            entries.push(new_entry);
        }
    }

    /// <https://dom.spec.whatwg.org/#remove-an-event-listener>
    pub fn remove_event_listener(&self, ty: &str, listener: &EventListener) {
        let mut handlers = self.handlers.borrow_mut();
        if let Some(entries) = handlers.get_mut(ty) {
            entries.retain(|entry| {
                !(matches!(*entry, EventListenerType::Additive(_)) &&
                    same_listener(entry.listener(), listener))
            });
        }
    }

    /// <https://html.spec.whatwg.org/multipage/#event-handler-attributes:event-handlers-11>
    ///
    /// Replacing a handler keeps its position among the other listeners; removing it and
    /// setting it again moves it to the end.
    pub fn set_inline_event_listener(&self, ty: &str, listener: Option<EventListener>) {
        let mut handlers = self.handlers.borrow_mut();
        let entries = match handlers.entry(ty.to_owned()) {
            Occupied(entry) => entry.into_mut(),
            Vacant(entry) => entry.insert(vec![]),
        };

        let idx = entries
            .iter()
            .position(|entry| matches!(*entry, EventListenerType::Inline(_)));

        match (idx, listener) {
            (Some(idx), Some(listener)) => entries[idx] = EventListenerType::Inline(listener),
            (Some(idx), None) => {
                entries.remove(idx);
            },
            (None, Some(listener)) => entries.push(EventListenerType::Inline(listener)),
            (None, None) => {},
        }
    }

    pub fn get_inline_event_listener(&self, ty: &str) -> Option<EventListener> {
        let handlers = self.handlers.borrow();
        handlers.get(ty).and_then(|entries| {
            entries.iter().find_map(|entry| match *entry {
                EventListenerType::Inline(ref listener) => Some(listener.clone()),
                EventListenerType::Additive(_) => None,
            })
        })
    }

    pub fn has_listeners_for(&self, ty: &str) -> bool {
        self.handlers
            .borrow()
            .get(ty)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// <https://dom.spec.whatwg.org/#concept-event-listener-inner-invoke>
    ///
    /// Calls the listeners for `event` in registration order. A listener that fails is
    /// reported and does not stop the ones after it. Returns how many listeners ran.
    pub fn dispatch_event(&self, event: &Event) -> usize {
        // Listeners added during dispatch do not see this event.
        let listeners = match self.handlers.borrow().get(event.type_()) {
            Some(entries) => entries.clone(),
            None => return 0,
        };

        let mut invoked = 0;
        for entry in listeners {
            // Skip listeners removed by an earlier listener.
            if !self.is_registered(event.type_(), &entry) {
                continue;
            }
            invoked += 1;
            if let Err(exception) = (entry.listener())(event) {
                // https://html.spec.whatwg.org/multipage/#report-the-exception
                error!(
                    "Uncaught exception in '{}' event listener: {exception}",
                    event.type_()
                );
            }
            if event.immediate_propagation_stopped() {
                break;
            }
        }
        invoked
    }

    fn is_registered(&self, ty: &str, entry: &EventListenerType) -> bool {
        self.handlers.borrow().get(ty).is_some_and(|entries| {
            entries
                .iter()
                .any(|registered| same_listener(registered.listener(), entry.listener()))
        })
    }
}
