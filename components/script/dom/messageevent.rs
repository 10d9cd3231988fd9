/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::dom::browsingcontext::BrowsingContext;
use crate::dom::event::{Event, EventBubbles, EventCancelable, EventInterface};
use crate::dom::windowproxy::WindowProxy;
use crate::js::{JSObject, JSVal};

/// <https://html.spec.whatwg.org/multipage/#messageeventinit>
#[derive(Clone, Debug, Default)]
pub struct MessageEventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    pub data: JSVal,
    pub origin: String,
    pub last_event_id: String,
    pub source: Option<WindowProxy>,
    pub ports: Vec<JSObject>,
}

/// <https://html.spec.whatwg.org/multipage/#the-messageevent-interface>
#[derive(Debug)]
pub struct MessageEvent {
    data: JSVal,
    origin: String,
    source: Option<WindowProxy>,
    last_event_id: String,
    ports: Vec<JSObject>,
}

impl MessageEvent {
    /// A `MessageEvent` built from script, so not trusted.
    pub fn new(type_: &str, init: MessageEventInit) -> Event {
        let MessageEventInit {
            bubbles,
            cancelable,
            data,
            origin,
            last_event_id,
            source,
            ports,
        } = init;
        Event::new_inherited(
            type_,
            bubbles.into(),
            cancelable.into(),
            false,
            EventInterface::Message(MessageEvent {
                data,
                origin,
                source,
                last_event_id,
                ports,
            }),
        )
    }

    fn new_trusted(type_: &str, data: JSVal, origin: String, source: Option<WindowProxy>) -> Event {
        Event::new_inherited(
            type_,
            EventBubbles::DoesNotBubble,
            EventCancelable::NotCancelable,
            true,
            EventInterface::Message(MessageEvent {
                data,
                origin,
                source,
                last_event_id: String::new(),
                ports: Vec::new(),
            }),
        )
    }

    /// Fires a trusted `message` event carrying `message` at `target`.
    pub(crate) fn dispatch_jsval(
        target: &BrowsingContext,
        message: JSVal,
        origin: String,
        source: Option<WindowProxy>,
    ) {
        let event = MessageEvent::new_trusted("message", message, origin, source);
        target.fire_event(&event);
    }

    /// Fires a trusted `messageerror` event at `target`, for data that could not be
    /// deserialized.
    pub(crate) fn dispatch_error(
        target: &BrowsingContext,
        origin: String,
        source: Option<WindowProxy>,
    ) {
        let event = MessageEvent::new_trusted("messageerror", JSVal::Null, origin, source);
        target.fire_event(&event);
    }

    // https://html.spec.whatwg.org/multipage/#dom-messageevent-data
    pub fn data(&self) -> &JSVal {
        &self.data
    }

    // https://html.spec.whatwg.org/multipage/#dom-messageevent-origin
    pub fn origin(&self) -> &str {
        &self.origin
    }

    // https://html.spec.whatwg.org/multipage/#dom-messageevent-source
    pub fn source(&self) -> Option<&WindowProxy> {
        self.source.as_ref()
    }

    // https://html.spec.whatwg.org/multipage/#dom-messageevent-lasteventid
    pub fn last_event_id(&self) -> &str {
        &self.last_event_id
    }

    // https://html.spec.whatwg.org/multipage/#dom-messageevent-ports
    pub fn ports(&self) -> &[JSObject] {
        &self.ports
    }
}
