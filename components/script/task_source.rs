/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use log::warn;

use crate::dom::browsingcontext::BrowsingContextId;
use crate::messaging::{CommonScriptMsg, ScriptEventLoopSender};
use crate::task::{TaskCanceller, TaskOnce};

/// The names of the task sources a browsing context queues tasks on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TaskSourceName {
    /// <https://html.spec.whatwg.org/multipage/#posted-message-task-source>
    PostedMessage,
}

/// A handle for queueing tasks on one task source of one browsing context's event loop.
#[derive(Clone, Debug)]
pub struct TaskSource {
    pub(crate) sender: ScriptEventLoopSender,
    pub(crate) context: BrowsingContextId,
    pub(crate) name: TaskSourceName,
    pub(crate) canceller: TaskCanceller,
}

impl TaskSource {
    /// Queue a task that is cancelled along with the browsing context. Returns `false`
    /// if the browsing context is already gone.
    pub fn queue(&self, task: impl TaskOnce + 'static) -> bool {
        if self.canceller.cancelled() {
            return false;
        }
        self.queue_unconditionally(self.canceller.wrap_task(task))
    }

    /// This queues a task that will not be cancelled when its browsing context gets
    /// discarded, though it is still dropped if the queue itself is gone.
    pub fn queue_unconditionally(&self, task: impl TaskOnce + 'static) -> bool {
        let queued = self
            .sender
            .send(CommonScriptMsg::Task(self.name, Box::new(task), self.context))
            .is_ok();
        if !queued {
            warn!(
                "Could not queue {:?} task for {}. Likely tried to queue after it was discarded.",
                self.name, self.context
            );
        }
        queued
    }
}
