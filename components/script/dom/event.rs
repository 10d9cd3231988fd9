/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::cell::Cell;

use crate::dom::messageevent::MessageEvent;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventBubbles {
    Bubbles,
    DoesNotBubble,
}

impl From<bool> for EventBubbles {
    fn from(boolean: bool) -> Self {
        if boolean {
            EventBubbles::Bubbles
        } else {
            EventBubbles::DoesNotBubble
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventCancelable {
    Cancelable,
    NotCancelable,
}

impl From<bool> for EventCancelable {
    fn from(boolean: bool) -> Self {
        if boolean {
            EventCancelable::Cancelable
        } else {
            EventCancelable::NotCancelable
        }
    }
}

/// The interface-specific part of an event.
#[derive(Debug)]
pub enum EventInterface {
    Event,
    Message(MessageEvent),
}

/// <https://dom.spec.whatwg.org/#interface-event>
#[derive(Debug)]
pub struct Event {
    type_: String,
    bubbles: EventBubbles,
    cancelable: EventCancelable,
    trusted: bool,
    stop_immediate: Cell<bool>,
    interface: EventInterface,
}

impl Event {
    /// An untrusted event, as created by script.
    pub fn new(type_: &str, bubbles: EventBubbles, cancelable: EventCancelable) -> Event {
        Event::new_inherited(type_, bubbles, cancelable, false, EventInterface::Event)
    }

    pub(crate) fn new_inherited(
        type_: &str,
        bubbles: EventBubbles,
        cancelable: EventCancelable,
        trusted: bool,
        interface: EventInterface,
    ) -> Event {
        Event {
            type_: type_.to_owned(),
            bubbles,
            cancelable,
            trusted,
            stop_immediate: Cell::new(false),
            interface,
        }
    }

    // https://dom.spec.whatwg.org/#dom-event-type
    pub fn type_(&self) -> &str {
        &self.type_
    }

    // https://dom.spec.whatwg.org/#dom-event-bubbles
    pub fn bubbles(&self) -> bool {
        self.bubbles == EventBubbles::Bubbles
    }

    // https://dom.spec.whatwg.org/#dom-event-cancelable
    pub fn cancelable(&self) -> bool {
        self.cancelable == EventCancelable::Cancelable
    }

    // https://dom.spec.whatwg.org/#dom-event-istrusted
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    // https://dom.spec.whatwg.org/#dom-event-stopimmediatepropagation
    pub fn stop_immediate_propagation(&self) {
        self.stop_immediate.set(true);
    }

    pub(crate) fn immediate_propagation_stopped(&self) -> bool {
        self.stop_immediate.get()
    }

    pub fn interface(&self) -> &EventInterface {
        &self.interface
    }

    pub fn as_message_event(&self) -> Option<&MessageEvent> {
        match self.interface {
            EventInterface::Message(ref event) => Some(event),
            EventInterface::Event => None,
        }
    }
}
