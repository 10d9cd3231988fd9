/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]
#![crate_name = "xdm_url"]
#![crate_type = "rlib"]

//! Origins of documents hosted by a browsing context, and the parsing rules used when
//! script names an origin explicitly (for example the `targetOrigin` argument of
//! `postMessage`).

pub mod origin;

pub use url::{Host, Url};

pub use crate::origin::{ImmutableOrigin, OpaqueOrigin, OriginSyntaxError};
