/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Cross-document messaging between the browsing contexts of a single script thread.
//!
//! Embedders drive everything through [`script_thread::ScriptThread`]: they create and
//! discard browsing contexts, run script in them through
//! [`dom::windowproxy::WindowProxy::run_script`] and turn the event loop until idle.

#![deny(unsafe_code)]

#[macro_use]
mod task;

pub mod dom;
pub mod js;
pub mod messaging;
pub mod origin;
pub mod script_thread;
pub mod task_queue;
pub mod task_source;

pub use crate::task::{TaskBox, TaskCanceller, TaskOnce};
