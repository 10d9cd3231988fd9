/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use xdm_url::ImmutableOrigin;

use crate::dom::bindings::error::{Error, Fallible};

/// The `targetOrigin` argument of `postMessage`, once parsed.
///
/// <https://html.spec.whatwg.org/multipage/#window-post-message-steps>
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TargetOrigin {
    /// `"*"`: deliver whatever the target's origin is.
    Any,
    /// `"/"`: deliver only if the target is same origin with the incumbent settings
    /// object, that is the context calling `postMessage`.
    Incumbent,
    /// Deliver only if the target has exactly this origin.
    Origin(ImmutableOrigin),
}

/// Whether a message may be delivered to its target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OriginCheck {
    Allow,
    Reject,
}

impl TargetOrigin {
    /// Steps 2-3 of the window post message steps. Anything other than `"*"`, `"/"` or
    /// a serialized tuple origin throws a `SyntaxError`.
    pub fn parse(target_origin: &str) -> Fallible<TargetOrigin> {
        match target_origin {
            "*" => Ok(TargetOrigin::Any),
            "/" => Ok(TargetOrigin::Incumbent),
            _ => ImmutableOrigin::parse_serialized(target_origin)
                .map(TargetOrigin::Origin)
                .map_err(|error| {
                    Error::Syntax(Some(format!(
                        "Invalid target origin '{target_origin}' in postMessage: {error}"
                    )))
                }),
        }
    }

    /// Checks `target`, the current origin of the receiving context, against this
    /// target origin. `incumbent` is the origin of the context that posted.
    pub fn validate(&self, incumbent: &ImmutableOrigin, target: &ImmutableOrigin) -> OriginCheck {
        let allowed = match *self {
            TargetOrigin::Any => true,
            TargetOrigin::Incumbent => incumbent.same_origin(target),
            TargetOrigin::Origin(ref expected) => expected.same_origin(target),
        };
        if allowed {
            OriginCheck::Allow
        } else {
            OriginCheck::Reject
        }
    }
}
