/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;
use xdm_url::ImmutableOrigin;

use crate::dom::bindings::conversions::FromJSValConvertible;
use crate::dom::bindings::error::{Error, ErrorResult, Fallible};
use crate::dom::bindings::settings_stack::{AutoEntryScript, incumbent_context};
use crate::dom::bindings::structuredclone::{self, StructuredCloneLimits};
use crate::dom::browsingcontext::{BrowsingContext, BrowsingContextGraph, BrowsingContextId};
use crate::dom::event::Event;
use crate::dom::eventtarget::EventListener;
use crate::js::{JSObject, JSVal};
use crate::messaging::{self, DeliveryOutcome, DropReason, PostedMessage};
use crate::origin::{OriginCheck, TargetOrigin};

/// <https://html.spec.whatwg.org/multipage/#windowproxy>
///
/// The handle script holds on a browsing context. It stays valid after the context is
/// discarded, but from then on every accessor returns nothing and messages posted to it
/// are dropped.
#[derive(Clone)]
pub struct WindowProxy {
    id: BrowsingContextId,
    graph: Weak<BrowsingContextGraph>,
}

impl WindowProxy {
    pub(crate) fn new(graph: &Rc<BrowsingContextGraph>, id: BrowsingContextId) -> WindowProxy {
        WindowProxy {
            id,
            graph: Rc::downgrade(graph),
        }
    }

    /// A handle on `id`, if it is still alive.
    pub(crate) fn from_graph(
        graph: &Rc<BrowsingContextGraph>,
        id: BrowsingContextId,
    ) -> Option<WindowProxy> {
        graph.contains(id).then(|| WindowProxy::new(graph, id))
    }

    pub fn browsing_context_id(&self) -> BrowsingContextId {
        self.id
    }

    fn graph(&self) -> Option<Rc<BrowsingContextGraph>> {
        self.graph.upgrade()
    }

    fn context(&self) -> Option<Rc<BrowsingContext>> {
        self.graph()?.get(self.id)
    }

    fn related(
        &self,
        lookup: impl FnOnce(&BrowsingContextGraph) -> Option<BrowsingContextId>,
    ) -> Option<WindowProxy> {
        let graph = self.graph()?;
        let id = lookup(&*graph)?;
        Some(WindowProxy::new(&graph, id))
    }

    // https://html.spec.whatwg.org/multipage/#dom-window-closed
    pub fn is_discarded(&self) -> bool {
        self.context().is_none()
    }

    /// The origin of the active document.
    pub fn origin(&self) -> Option<ImmutableOrigin> {
        self.context().map(|context| context.origin())
    }

    // https://html.spec.whatwg.org/multipage/#dom-parent
    pub fn parent(&self) -> Option<WindowProxy> {
        let id = self.id;
        self.related(|graph| {
            if !graph.contains(id) {
                return None;
            }
            Some(graph.parent(id).unwrap_or(id))
        })
    }

    // https://html.spec.whatwg.org/multipage/#dom-top
    pub fn top(&self) -> Option<WindowProxy> {
        let id = self.id;
        self.related(|graph| graph.top(id))
    }

    // https://html.spec.whatwg.org/multipage/#dom-opener
    pub fn opener(&self) -> Option<WindowProxy> {
        let id = self.id;
        self.related(|graph| graph.opener(id))
    }

    // https://html.spec.whatwg.org/multipage/#dom-frames
    pub fn frames(&self) -> Vec<WindowProxy> {
        match self.graph() {
            Some(graph) => graph
                .children(self.id)
                .into_iter()
                .map(|child| WindowProxy::new(&graph, child))
                .collect(),
            None => Vec::new(),
        }
    }

    // https://dom.spec.whatwg.org/#dom-eventtarget-addeventlistener
    pub fn add_event_listener(&self, ty: &str, listener: EventListener) {
        if let Some(context) = self.context() {
            context.event_target().add_event_listener(ty, listener);
        }
    }

    // https://dom.spec.whatwg.org/#dom-eventtarget-removeeventlistener
    pub fn remove_event_listener(&self, ty: &str, listener: &EventListener) {
        if let Some(context) = self.context() {
            context.event_target().remove_event_listener(ty, listener);
        }
    }

    // https://dom.spec.whatwg.org/#dom-eventtarget-dispatchevent
    pub fn dispatch_event(&self, event: &Event) -> Fallible<usize> {
        let context = self
            .context()
            .ok_or_else(|| Error::InvalidState(Some("The window has been closed.".to_owned())))?;
        Ok(context.fire_event(event))
    }

    // https://html.spec.whatwg.org/multipage/#handler-window-onmessage
    pub fn set_onmessage(&self, listener: Option<EventListener>) {
        self.set_event_handler("message", listener)
    }

    pub fn get_onmessage(&self) -> Option<EventListener> {
        self.get_event_handler("message")
    }

    // https://html.spec.whatwg.org/multipage/#handler-window-onmessageerror
    pub fn set_onmessageerror(&self, listener: Option<EventListener>) {
        self.set_event_handler("messageerror", listener)
    }

    pub fn get_onmessageerror(&self) -> Option<EventListener> {
        self.get_event_handler("messageerror")
    }

    fn set_event_handler(&self, ty: &str, listener: Option<EventListener>) {
        if let Some(context) = self.context() {
            context.event_target().set_inline_event_listener(ty, listener);
        }
    }

    fn get_event_handler(&self, ty: &str) -> Option<EventListener> {
        self.context()?.event_target().get_inline_event_listener(ty)
    }

    /// Runs `script` as if it were script of this browsing context, which makes it the
    /// entry and incumbent context for any `postMessage` call made inside.
    pub fn run_script<R>(&self, script: impl FnOnce(&WindowProxy) -> R) -> R {
        let _entry = AutoEntryScript::new(self.id);
        script(self)
    }

    /// <https://html.spec.whatwg.org/multipage/#dom-window-postmessage>
    ///
    /// The binding entry point: converts script arguments as Web IDL does for
    /// `postMessage(any message, USVString targetOrigin, optional sequence<object>
    /// transfer = [])`.
    pub fn call_post_message(&self, args: &[JSVal]) -> ErrorResult {
        if args.len() < 2 {
            return Err(Error::Type(format!(
                "Window.postMessage: At least 2 arguments required, but only {} passed",
                args.len()
            )));
        }
        let target_origin = String::from_jsval(&args[1])?;
        let transfer = match args.get(2) {
            None | Some(JSVal::Undefined) => Vec::new(),
            Some(value) => Vec::<JSObject>::from_jsval(value)?,
        };
        self.post_message(&args[0], &target_origin, &transfer)
    }

    /// <https://html.spec.whatwg.org/multipage/#dom-window-postmessage>
    ///
    /// Returns normally when the message is dropped because the target's origin does not
    /// match `target_origin`, or because the target is gone.
    pub fn post_message(
        &self,
        message: &JSVal,
        target_origin: &str,
        transfer: &[JSObject],
    ) -> ErrorResult {
        self.post_message_impl(message, target_origin, transfer)
            .map(|_| ())
    }

    /// <https://html.spec.whatwg.org/multipage/#window-post-message-steps>
    pub(crate) fn post_message_impl(
        &self,
        message: &JSVal,
        target_origin: &str,
        transfer: &[JSObject],
    ) -> Fallible<DeliveryOutcome> {
        // Steps 1-2. Parsing does not depend on the caller; `"/"` is resolved against
        // the incumbent origin only when it is checked.
        let target_origin = TargetOrigin::parse(target_origin)?;

        // Step 3. The incumbent settings object.
        let no_script =
            || Error::InvalidState(Some("postMessage called with no script running.".to_owned()));
        let incumbent = incumbent_context().ok_or_else(no_script)?;
        let graph = self.graph().ok_or_else(no_script)?;
        let incumbent_origin = graph.origin(incumbent).ok_or_else(no_script)?;

        // Steps 4-5.
        let data = structuredclone::write(message, transfer, StructuredCloneLimits::from_prefs())?;

        // Step 6: the origin check sees the target as it is now, even though the
        // message is only delivered later.
        let Some(target) = graph.get(self.id) else {
            debug!("Dropping message to discarded {}", self.id);
            return Ok(DeliveryOutcome::Dropped(DropReason::TargetDiscarded));
        };
        if target_origin.validate(&incumbent_origin, &target.origin()) == OriginCheck::Reject {
            debug!(
                "Dropping message from {incumbent} to {}: origin {} does not match {target_origin:?}",
                self.id,
                target.origin().ascii_serialization()
            );
            return Ok(DeliveryOutcome::Dropped(DropReason::OriginMismatch));
        }

        // Step 7.
        let message = PostedMessage {
            target: self.id,
            source: incumbent,
            source_origin: incumbent_origin,
            data,
            sequence: graph.next_message_sequence(),
        };
        Ok(messaging::queue_posted_message(&target, message))
    }
}

/// Two handles are equal when they refer to the same browsing context.
impl PartialEq for WindowProxy {
    fn eq(&self, other: &WindowProxy) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.graph, &other.graph)
    }
}

impl Eq for WindowProxy {}

impl fmt::Debug for WindowProxy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("WindowProxy").field(&self.id).finish()
    }
}
