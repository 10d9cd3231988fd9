/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The browsing contexts of one script thread, kept in an arena and addressed by
//! [`BrowsingContextId`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use xdm_url::ImmutableOrigin;

use crate::dom::bindings::settings_stack::AutoIncumbentScript;
use crate::dom::event::Event;
use crate::dom::eventtarget::EventTarget;
use crate::task_queue::TaskQueue;

/// Identifies a browsing context for as long as the graph that created it lives. Ids
/// are never reused.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct BrowsingContextId(u64);

impl BrowsingContextId {
    pub(crate) const fn new(index: u64) -> BrowsingContextId {
        BrowsingContextId(index)
    }
}

impl fmt::Display for BrowsingContextId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "browsing context #{}", self.0)
    }
}

/// <https://html.spec.whatwg.org/multipage/#browsing-context>
pub(crate) struct BrowsingContext {
    id: BrowsingContextId,
    /// Replaced when the context navigates.
    origin: RefCell<ImmutableOrigin>,
    parent: Option<BrowsingContextId>,
    opener: Option<BrowsingContextId>,
    children: RefCell<Vec<BrowsingContextId>>,
    /// The `Window` of the active document.
    event_target: EventTarget,
    task_queue: TaskQueue,
}

impl BrowsingContext {
    pub(crate) fn id(&self) -> BrowsingContextId {
        self.id
    }

    pub(crate) fn origin(&self) -> ImmutableOrigin {
        self.origin.borrow().clone()
    }

    pub(crate) fn event_target(&self) -> &EventTarget {
        &self.event_target
    }

    pub(crate) fn task_queue(&self) -> &TaskQueue {
        &self.task_queue
    }

    /// Dispatches `event` at this context's `Window`, with this context as the incumbent
    /// one while listeners run.
    pub(crate) fn fire_event(&self, event: &Event) -> usize {
        let _incumbent = AutoIncumbentScript::new(self.id);
        self.event_target.dispatch_event(event)
    }
}

/// All the browsing contexts of a script thread, in creation order.
pub struct BrowsingContextGraph {
    contexts: RefCell<IndexMap<BrowsingContextId, Rc<BrowsingContext>>>,
    next_context_id: Cell<u64>,
    next_message_sequence: Cell<u64>,
}

impl Default for BrowsingContextGraph {
    fn default() -> Self {
        BrowsingContextGraph::new()
    }
}

impl BrowsingContextGraph {
    pub fn new() -> BrowsingContextGraph {
        BrowsingContextGraph {
            contexts: RefCell::new(IndexMap::new()),
            next_context_id: Cell::new(0),
            next_message_sequence: Cell::new(0),
        }
    }

    fn insert(
        &self,
        origin: ImmutableOrigin,
        parent: Option<BrowsingContextId>,
        opener: Option<BrowsingContextId>,
    ) -> BrowsingContextId {
        let id = BrowsingContextId(self.next_context_id.get());
        self.next_context_id.set(id.0 + 1);
        debug!(
            "Creating {id} with origin {} (parent: {parent:?}, opener: {opener:?})",
            origin.ascii_serialization()
        );
        let context = BrowsingContext {
            id,
            origin: RefCell::new(origin),
            parent,
            opener,
            children: RefCell::new(Vec::new()),
            event_target: EventTarget::new(),
            task_queue: TaskQueue::new(id),
        };
        self.contexts.borrow_mut().insert(id, Rc::new(context));
        id
    }

    /// Creates a top-level browsing context, such as a new tab.
    pub fn new_top_level(&self, origin: ImmutableOrigin) -> BrowsingContextId {
        self.insert(origin, None, None)
    }

    /// Creates a child browsing context of `parent`, such as an `iframe`. Returns `None`
    /// if `parent` has been discarded.
    pub fn new_nested(
        &self,
        parent: BrowsingContextId,
        origin: ImmutableOrigin,
    ) -> Option<BrowsingContextId> {
        let parent_context = self.get(parent)?;
        let id = self.insert(origin, Some(parent), None);
        parent_context.children.borrow_mut().push(id);
        Some(id)
    }

    /// Creates a top-level browsing context opened by `opener`, as `window.open` does.
    /// Returns `None` if `opener` has been discarded.
    pub fn new_auxiliary(
        &self,
        opener: BrowsingContextId,
        origin: ImmutableOrigin,
    ) -> Option<BrowsingContextId> {
        if !self.contains(opener) {
            return None;
        }
        Some(self.insert(origin, None, Some(opener)))
    }

    /// <https://html.spec.whatwg.org/multipage/#a-browsing-context-is-discarded>
    ///
    /// Discards `id` and its descendants, dropping every task still queued for them.
    /// Returns `false` if it was already gone.
    pub fn discard(&self, id: BrowsingContextId) -> bool {
        let removed = self.contexts.borrow_mut().shift_remove(&id);
        let Some(context) = removed else {
            return false;
        };

        let children = context.children.borrow().clone();
        for child in children {
            self.discard(child);
        }
        if let Some(parent) = context.parent.and_then(|parent| self.get(parent)) {
            parent.children.borrow_mut().retain(|child| *child != id);
        }
        context.task_queue.cancel_all();
        debug!("Discarded {id}");
        true
    }

    /// Gives `id` a new origin, as navigating it to another document would. Returns
    /// `false` if it has been discarded.
    pub fn navigate(&self, id: BrowsingContextId, origin: ImmutableOrigin) -> bool {
        let Some(context) = self.get(id) else {
            return false;
        };
        debug!("Navigating {id} to {}", origin.ascii_serialization());
        *context.origin.borrow_mut() = origin;
        true
    }

    pub(crate) fn get(&self, id: BrowsingContextId) -> Option<Rc<BrowsingContext>> {
        self.contexts.borrow().get(&id).cloned()
    }

    pub fn contains(&self, id: BrowsingContextId) -> bool {
        self.contexts.borrow().contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.borrow().is_empty()
    }

    /// Every live browsing context, oldest first.
    pub fn context_ids(&self) -> Vec<BrowsingContextId> {
        self.contexts.borrow().keys().copied().collect()
    }

    /// The current origin of `id`.
    pub fn origin(&self, id: BrowsingContextId) -> Option<ImmutableOrigin> {
        self.get(id).map(|context| context.origin())
    }

    /// The parent of a nested browsing context. `None` for top-level or discarded ones.
    pub fn parent(&self, id: BrowsingContextId) -> Option<BrowsingContextId> {
        self.get(id)?.parent
    }

    /// The children of `id`, in creation order.
    pub fn children(&self, id: BrowsingContextId) -> Vec<BrowsingContextId> {
        self.get(id)
            .map(|context| context.children.borrow().clone())
            .unwrap_or_default()
    }

    /// The context that opened `id`, while it is still alive.
    pub fn opener(&self, id: BrowsingContextId) -> Option<BrowsingContextId> {
        self.get(id)?.opener.filter(|opener| self.contains(*opener))
    }

    /// <https://html.spec.whatwg.org/multipage/#top-level-browsing-context>
    pub fn top(&self, id: BrowsingContextId) -> Option<BrowsingContextId> {
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent.and_then(|parent| self.get(parent)) {
            current = parent;
        }
        Some(current.id)
    }

    pub(crate) fn next_message_sequence(&self) -> u64 {
        let sequence = self.next_message_sequence.get();
        self.next_message_sequence.set(sequence + 1);
        sequence
    }
}
