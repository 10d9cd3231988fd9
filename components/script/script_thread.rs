/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The script thread is the thread that owns the browsing contexts of one group and
//! runs their event loops.
//!
//! This thread does not spawn anything itself: the embedder owns the [`ScriptThread`]
//! and turns its event loop, one task per browsing context per turn, until it is idle.

use std::rc::Rc;

use log::{debug, trace, warn};
use xdm_url::ImmutableOrigin;

use crate::dom::bindings::settings_stack::AutoEntryScript;
use crate::dom::browsingcontext::{BrowsingContextGraph, BrowsingContextId};
use crate::dom::windowproxy::WindowProxy;
use crate::messaging::CommonScriptMsg;

pub struct ScriptThread {
    graph: Rc<BrowsingContextGraph>,
}

impl Default for ScriptThread {
    fn default() -> Self {
        ScriptThread::new()
    }
}

impl ScriptThread {
    pub fn new() -> ScriptThread {
        ScriptThread {
            graph: Rc::new(BrowsingContextGraph::new()),
        }
    }

    pub fn graph(&self) -> &Rc<BrowsingContextGraph> {
        &self.graph
    }

    /// A handle on `id`, if it is still alive.
    pub fn window_proxy(&self, id: BrowsingContextId) -> Option<WindowProxy> {
        WindowProxy::from_graph(&self.graph, id)
    }

    pub fn new_top_level(&self, origin: ImmutableOrigin) -> WindowProxy {
        WindowProxy::new(&self.graph, self.graph.new_top_level(origin))
    }

    /// Creates an `iframe` inside `parent`. Returns `None` if `parent` is discarded.
    pub fn new_nested(
        &self,
        parent: &WindowProxy,
        origin: ImmutableOrigin,
    ) -> Option<WindowProxy> {
        let id = self
            .graph
            .new_nested(parent.browsing_context_id(), origin)?;
        Some(WindowProxy::new(&self.graph, id))
    }

    /// Creates a window opened by `opener`. Returns `None` if `opener` is discarded.
    pub fn new_auxiliary(
        &self,
        opener: &WindowProxy,
        origin: ImmutableOrigin,
    ) -> Option<WindowProxy> {
        let id = self
            .graph
            .new_auxiliary(opener.browsing_context_id(), origin)?;
        Some(WindowProxy::new(&self.graph, id))
    }

    /// Discards `window` and everything nested inside it.
    pub fn discard(&self, window: &WindowProxy) -> bool {
        self.graph.discard(window.browsing_context_id())
    }

    /// Gives `window` a new origin, as a navigation would.
    pub fn navigate(&self, window: &WindowProxy, origin: ImmutableOrigin) -> bool {
        self.graph.navigate(window.browsing_context_id(), origin)
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.graph.context_ids().into_iter().any(|id| {
            self.graph
                .get(id)
                .is_some_and(|context| !context.task_queue().is_empty())
        })
    }

    /// Runs the oldest task of every browsing context that had one when the turn began,
    /// oldest context first. Tasks queued while this runs wait for a later turn, whichever
    /// context they are for. Returns how many tasks ran.
    pub fn perform_a_turn(&self) -> usize {
        let ready: Vec<BrowsingContextId> = self
            .graph
            .context_ids()
            .into_iter()
            .filter(|id| {
                self.graph
                    .get(*id)
                    .is_some_and(|context| !context.task_queue().is_empty())
            })
            .collect();

        let mut ran = 0;
        for id in ready {
            // An earlier task of this turn may have discarded the context.
            let Some(context) = self.graph.get(id) else {
                continue;
            };
            let Some(msg) = context.task_queue().take_task() else {
                continue;
            };
            drop(context);
            self.handle_msg_from_script(msg);
            ran += 1;
        }
        ran
    }

    /// Turns the event loop until no browsing context has a task left. Returns how many
    /// tasks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.perform_a_turn();
            if ran == 0 {
                break;
            }
            total += ran;
        }
        debug!("Event loop idle after {total} task(s)");
        total
    }

    fn handle_msg_from_script(&self, msg: CommonScriptMsg) {
        match msg {
            CommonScriptMsg::Task(name, task, context) => {
                if !self.graph.contains(context) {
                    return warn!(
                        "Dropping {name:?} task {} for discarded {context}",
                        task.name()
                    );
                }
                trace!("Running {name:?} task {} for {context}", task.name());
                let _entry = AutoEntryScript::new(context);
                task.run_box(&self.graph);
            },
        }
    }
}
