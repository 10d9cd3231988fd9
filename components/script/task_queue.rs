/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Machinery for [task-queue](https://html.spec.whatwg.org/multipage/#task-queue).

use crossbeam_channel::unbounded;
use log::debug;

use crate::dom::browsingcontext::BrowsingContextId;
use crate::messaging::{CommonScriptMsg, ScriptEventLoopReceiver, ScriptEventLoopSender};
use crate::task::TaskCanceller;
use crate::task_source::{TaskSource, TaskSourceName};

/// The FIFO queue of tasks for one browsing context.
pub struct TaskQueue {
    context: BrowsingContextId,
    sender: ScriptEventLoopSender,
    receiver: ScriptEventLoopReceiver,
    canceller: TaskCanceller,
}

impl TaskQueue {
    pub(crate) fn new(context: BrowsingContextId) -> TaskQueue {
        let (sender, receiver) = unbounded();
        TaskQueue {
            context,
            sender,
            receiver,
            canceller: TaskCanceller::default(),
        }
    }

    /// A handle for queueing tasks from the given source on this queue.
    pub fn task_source(&self, name: TaskSourceName) -> TaskSource {
        TaskSource {
            sender: self.sender.clone(),
            context: self.context,
            name,
            canceller: self.canceller.clone(),
        }
    }

    /// Takes the oldest task, if any.
    pub(crate) fn take_task(&self) -> Option<CommonScriptMsg> {
        self.receiver.try_recv().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Cancels everything queued so far, and everything queued from now on.
    pub(crate) fn cancel_all(&self) {
        self.canceller.cancel();
        let dropped = self.receiver.try_iter().count();
        if dropped > 0 {
            debug!("Dropped {dropped} pending task(s) for {}", self.context);
        }
    }
}
