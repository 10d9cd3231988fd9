/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::cell::RefCell;

use log::trace;

use crate::dom::browsingcontext::BrowsingContextId;

thread_local!(static STACK: RefCell<Vec<StackEntry>> = const { RefCell::new(Vec::new()) });

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StackEntryKind {
    Incumbent,
    Entry,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct StackEntry {
    context: BrowsingContextId,
    kind: StackEntryKind,
}

pub fn is_execution_stack_empty() -> bool {
    STACK.with(|stack| stack.borrow().is_empty())
}

fn push(entry: StackEntry) {
    STACK.with(|stack| stack.borrow_mut().push(entry));
}

fn pop(expected: StackEntry, message: &str) {
    let entry = STACK.with(|stack| stack.borrow_mut().pop());
    assert_eq!(entry, Some(expected), "{message}");
}

/// RAII struct that pushes and pops entries from the script settings stack.
pub struct AutoEntryScript {
    context: BrowsingContextId,
}

impl AutoEntryScript {
    /// <https://html.spec.whatwg.org/multipage/#prepare-to-run-script>
    pub fn new(context: BrowsingContextId) -> Self {
        trace!("Prepare to run script with {context}");
        push(StackEntry {
            context,
            kind: StackEntryKind::Entry,
        });
        AutoEntryScript { context }
    }
}

impl Drop for AutoEntryScript {
    /// <https://html.spec.whatwg.org/multipage/#clean-up-after-running-script>
    fn drop(&mut self) {
        pop(
            StackEntry {
                context: self.context,
                kind: StackEntryKind::Entry,
            },
            "Dropped AutoEntryScript out of order.",
        );
        trace!("Clean up after running script with {}", self.context);
    }
}

/// Returns the ["entry"] browsing context.
///
/// ["entry"]: https://html.spec.whatwg.org/multipage/#entry
pub fn entry_context() -> Option<BrowsingContextId> {
    STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .find(|entry| entry.kind == StackEntryKind::Entry)
            .map(|entry| entry.context)
    })
}

/// RAII struct that pushes and pops entries from the script settings stack.
pub struct AutoIncumbentScript {
    context: BrowsingContextId,
}

impl AutoIncumbentScript {
    /// <https://html.spec.whatwg.org/multipage/#prepare-to-run-a-callback>
    pub fn new(context: BrowsingContextId) -> Self {
        trace!("Prepare to run a callback with {context}");
        // Step 1.
        push(StackEntry {
            context,
            kind: StackEntryKind::Incumbent,
        });
        AutoIncumbentScript { context }
    }
}

impl Drop for AutoIncumbentScript {
    /// <https://html.spec.whatwg.org/multipage/#clean-up-after-running-a-callback>
    fn drop(&mut self) {
        // Steps 3-4.
        pop(
            StackEntry {
                context: self.context,
                kind: StackEntryKind::Incumbent,
            },
            "Dropped AutoIncumbentScript out of order.",
        );
        trace!("Clean up after running a callback with {}", self.context);
    }
}

/// Returns the ["incumbent"] browsing context: the one whose script is running right
/// now, and so the one calling into the DOM.
///
/// ["incumbent"]: https://html.spec.whatwg.org/multipage/#incumbent
pub fn incumbent_context() -> Option<BrowsingContextId> {
    STACK.with(|stack| stack.borrow().last().map(|entry| entry.context))
}
