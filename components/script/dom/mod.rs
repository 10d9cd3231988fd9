/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The DOM objects involved in cross-document messaging.

pub mod bindings;
pub mod browsingcontext;
pub mod domexception;
pub mod event;
pub mod eventtarget;
pub mod messageevent;
pub mod windowproxy;
