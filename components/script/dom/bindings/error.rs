/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Utilities to throw exceptions from Rust bindings.

use std::fmt;

use crate::dom::domexception::DOMErrorName;

/// DOM exceptions that can be thrown by a native DOM method.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// TypeError JavaScript Error
    Type(String),
    /// SyntaxError DOMException
    Syntax(Option<String>),
    /// DataCloneError DOMException
    DataClone(Option<String>),
    /// InvalidStateError DOMException
    InvalidState(Option<String>),
}

impl Error {
    /// The name script would see on the thrown exception.
    pub fn name(&self) -> &'static str {
        match DOMErrorName::from_error(self) {
            Some(name) => name.into(),
            None => "TypeError",
        }
    }

    pub fn message(&self) -> &str {
        match *self {
            Error::Type(ref message) => message,
            Error::Syntax(ref message) |
            Error::DataClone(ref message) |
            Error::InvalidState(ref message) => match *message {
                Some(ref message) => message,
                None => DOMErrorName::from_error(self)
                    .map_or("", DOMErrorName::default_message),
            },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.message())
    }
}

impl std::error::Error for Error {}

/// The return type for IDL operations that can throw DOM exceptions.
pub type Fallible<T> = Result<T, Error>;

/// The return type for IDL operations that can throw DOM exceptions and
/// return `()`.
pub type ErrorResult = Fallible<()>;
