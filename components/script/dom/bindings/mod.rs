/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The glue between script values and the Rust DOM: argument conversion, exceptions,
//! the script settings stack and structured cloning.

pub mod conversions;
pub mod error;
pub mod settings_stack;
pub mod structuredclone;
