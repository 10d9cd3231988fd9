/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;

use serde::{Deserialize, Serialize};
use url::{Host, Origin, Url};
use uuid::Uuid;

/// The origin of an URL
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ImmutableOrigin {
    /// A globally unique identifier
    Opaque(OpaqueOrigin),

    /// Consists of the URL's scheme, host and port
    Tuple(String, Host, u16),
}

impl ImmutableOrigin {
    pub fn new(origin: Origin) -> ImmutableOrigin {
        match origin {
            Origin::Opaque(_) => ImmutableOrigin::new_opaque(),
            Origin::Tuple(scheme, host, port) => ImmutableOrigin::Tuple(scheme, host, port),
        }
    }

    /// The origin of the given URL. URLs without a tuple origin (`data:`, `file:`, ...)
    /// get a fresh opaque origin.
    pub fn from_url(url: &Url) -> ImmutableOrigin {
        ImmutableOrigin::new(url.origin())
    }

    /// Parses an origin the way script is allowed to spell one out: an absolute URL with
    /// a scheme and a host, an optional port, and nothing else. An empty or `/` path is
    /// tolerated since the URL parser always produces one for special schemes.
    ///
    /// Opaque origins (including the literal `"null"`) are rejected, as they can never be
    /// named.
    pub fn parse_serialized(input: &str) -> Result<ImmutableOrigin, OriginSyntaxError> {
        let url = Url::parse(input).map_err(OriginSyntaxError::InvalidUrl)?;
        if !url.username().is_empty() || url.password().is_some() {
            return Err(OriginSyntaxError::HasCredentials);
        }
        if !matches!(url.path(), "" | "/") {
            return Err(OriginSyntaxError::HasPath);
        }
        if url.query().is_some() {
            return Err(OriginSyntaxError::HasQuery);
        }
        if url.fragment().is_some() {
            return Err(OriginSyntaxError::HasFragment);
        }
        match url.origin() {
            Origin::Opaque(_) => Err(OriginSyntaxError::Opaque),
            Origin::Tuple(scheme, host, port) => Ok(ImmutableOrigin::Tuple(scheme, host, port)),
        }
    }

    /// <https://html.spec.whatwg.org/multipage/#same-origin>
    pub fn same_origin(&self, other: &ImmutableOrigin) -> bool {
        self == other
    }

    /// Creates a new opaque origin that is only equal to itself.
    pub fn new_opaque() -> ImmutableOrigin {
        ImmutableOrigin::Opaque(OpaqueOrigin(Uuid::new_v4()))
    }

    pub fn scheme(&self) -> Option<&str> {
        match *self {
            ImmutableOrigin::Opaque(_) => None,
            ImmutableOrigin::Tuple(ref scheme, _, _) => Some(&**scheme),
        }
    }

    pub fn host(&self) -> Option<&Host> {
        match *self {
            ImmutableOrigin::Opaque(_) => None,
            ImmutableOrigin::Tuple(_, ref host, _) => Some(host),
        }
    }

    pub fn port(&self) -> Option<u16> {
        match *self {
            ImmutableOrigin::Opaque(_) => None,
            ImmutableOrigin::Tuple(_, _, port) => Some(port),
        }
    }

    pub fn into_url_origin(self) -> Origin {
        match self {
            ImmutableOrigin::Opaque(_) => Origin::new_opaque(),
            ImmutableOrigin::Tuple(scheme, host, port) => Origin::Tuple(scheme, host, port),
        }
    }

    /// Return whether this origin is a (scheme, host, port) tuple
    /// (as opposed to an opaque origin).
    pub fn is_tuple(&self) -> bool {
        match *self {
            ImmutableOrigin::Opaque(..) => false,
            ImmutableOrigin::Tuple(..) => true,
        }
    }

    /// <https://html.spec.whatwg.org/multipage/#ascii-serialisation-of-an-origin>
    pub fn ascii_serialization(&self) -> String {
        self.clone().into_url_origin().ascii_serialization()
    }
}

/// Opaque identifier for URLs that have file or other schemes
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct OpaqueOrigin(Uuid);

/// Why a string could not be read as an origin.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OriginSyntaxError {
    /// Not an absolute URL, e.g. a missing scheme or an unparsable host.
    InvalidUrl(url::ParseError),
    HasCredentials,
    HasPath,
    HasQuery,
    HasFragment,
    /// The URL parsed, but its origin is opaque.
    Opaque,
}

impl fmt::Display for OriginSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OriginSyntaxError::InvalidUrl(ref error) => write!(f, "invalid URL: {error}"),
            OriginSyntaxError::HasCredentials => write!(f, "origins cannot carry credentials"),
            OriginSyntaxError::HasPath => write!(f, "origins cannot carry a path"),
            OriginSyntaxError::HasQuery => write!(f, "origins cannot carry a query"),
            OriginSyntaxError::HasFragment => write!(f, "origins cannot carry a fragment"),
            OriginSyntaxError::Opaque => write!(f, "opaque origins cannot be named"),
        }
    }
}

impl std::error::Error for OriginSyntaxError {}
