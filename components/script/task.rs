/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Machinery for [tasks](https://html.spec.whatwg.org/multipage/#concept-task).

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dom::browsingcontext::BrowsingContextGraph;

macro_rules! task {
    ($name:ident: move |$graph:ident| $body:tt) => {{
        #[allow(non_camel_case_types)]
        struct $name<F>(F);
        impl<F> $crate::task::TaskOnce for $name<F>
        where
            F: ::std::ops::FnOnce(
                    &::std::rc::Rc<$crate::dom::browsingcontext::BrowsingContextGraph>,
                ) + Send,
        {
            fn name(&self) -> &'static str {
                stringify!($name)
            }

            fn run_once(
                self,
                graph: &::std::rc::Rc<$crate::dom::browsingcontext::BrowsingContextGraph>,
            ) {
                (self.0)(graph);
            }
        }
        $name(
            move |$graph: &::std::rc::Rc<$crate::dom::browsingcontext::BrowsingContextGraph>| {
                $body
            },
        )
    }};
}

/// A task that can be run. The name method is for logging purposes.
///
/// Tasks only carry sendable data. Anything that lives in a browsing context is looked up
/// again through the graph they are run with.
pub trait TaskOnce: Send {
    fn name(&self) -> &'static str {
        ::std::any::type_name::<Self>()
    }

    fn run_once(self, graph: &Rc<BrowsingContextGraph>);
}

/// A boxable version of [`TaskOnce`].
pub trait TaskBox: Send {
    fn name(&self) -> &'static str;

    fn run_box(self: Box<Self>, graph: &Rc<BrowsingContextGraph>);
}

impl<T> TaskBox for T
where
    T: TaskOnce,
{
    fn name(&self) -> &'static str {
        TaskOnce::name(self)
    }

    fn run_box(self: Box<Self>, graph: &Rc<BrowsingContextGraph>) {
        self.run_once(graph)
    }
}

impl fmt::Debug for dyn TaskBox {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_tuple(self.name())
            .field(&format_args!("..."))
            .finish()
    }
}

/// Encapsulated state required to create cancellable tasks from non-script threads.
#[derive(Clone, Debug, Default)]
pub struct TaskCanceller {
    pub(crate) cancelled: Arc<AtomicBool>,
}

impl TaskCanceller {
    /// Returns a wrapped `task` that will be cancelled if the `TaskCanceller` says so.
    pub fn wrap_task<T: TaskOnce>(&self, task: T) -> CancellableTask<T> {
        CancellableTask {
            canceller: self.clone(),
            inner: task,
        }
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancels every task wrapped by this canceller that has not run yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst)
    }
}

/// A task that can be cancelled by toggling a shared flag.
pub struct CancellableTask<T: TaskOnce> {
    canceller: TaskCanceller,
    inner: T,
}

impl<T> TaskOnce for CancellableTask<T>
where
    T: TaskOnce,
{
    fn name(&self) -> &'static str {
        TaskOnce::name(&self.inner)
    }

    fn run_once(self, graph: &Rc<BrowsingContextGraph>) {
        if !self.canceller.cancelled() {
            self.inner.run_once(graph)
        }
    }
}
