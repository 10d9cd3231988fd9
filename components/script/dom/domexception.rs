/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use strum::{Display, IntoStaticStr};

use crate::dom::bindings::error::Error;

/// The `DOMException` names that cross-document messaging can throw.
#[derive(Clone, Copy, Debug, Display, Eq, IntoStaticStr, PartialEq)]
#[repr(u16)]
pub enum DOMErrorName {
    InvalidStateError = 11,
    SyntaxError = 12,
    DataCloneError = 25,
}

impl DOMErrorName {
    /// The exception name for an error, or `None` when the error is not a `DOMException`.
    pub fn from_error(error: &Error) -> Option<DOMErrorName> {
        match *error {
            Error::Type(_) => None,
            Error::Syntax(_) => Some(DOMErrorName::SyntaxError),
            Error::DataClone(_) => Some(DOMErrorName::DataCloneError),
            Error::InvalidState(_) => Some(DOMErrorName::InvalidStateError),
        }
    }

    // https://webidl.spec.whatwg.org/#dom-domexception-code
    pub fn code(self) -> u16 {
        self as u16
    }

    // https://webidl.spec.whatwg.org/#idl-DOMException-error-names
    pub fn default_message(self) -> &'static str {
        match self {
            DOMErrorName::InvalidStateError => "The object is in an invalid state.",
            DOMErrorName::SyntaxError => "The string did not match the expected pattern.",
            DOMErrorName::DataCloneError => "The object can not be cloned.",
        }
    }
}
