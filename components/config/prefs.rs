/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use log::warn;
use serde::{Deserialize, Serialize};

static PREFERENCES: RwLock<Preferences> = RwLock::new(Preferences::const_default());

/// The current preferences. Prefer the `pref!` macro for reading a single value.
pub fn get() -> RwLockReadGuard<'static, Preferences> {
    PREFERENCES.read().unwrap_or_else(PoisonError::into_inner)
}

/// Replace every preference at once.
pub fn set(preferences: Preferences) {
    *PREFERENCES.write().unwrap_or_else(PoisonError::into_inner) = preferences;
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl PrefValue {
    fn from_json(value: &serde_json::Value) -> Option<PrefValue> {
        match *value {
            serde_json::Value::Bool(value) => Some(PrefValue::Bool(value)),
            serde_json::Value::Number(ref number) => number.as_i64().map(PrefValue::Int),
            serde_json::Value::String(ref value) => Some(PrefValue::Str(value.clone())),
            _ => None,
        }
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Bool(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        PrefValue::Int(value)
    }
}

impl TryFrom<PrefValue> for bool {
    type Error = PrefValue;

    fn try_from(value: PrefValue) -> Result<Self, Self::Error> {
        match value {
            PrefValue::Bool(value) => Ok(value),
            other => Err(other),
        }
    }
}

impl TryFrom<PrefValue> for i64 {
    type Error = PrefValue;

    fn try_from(value: PrefValue) -> Result<Self, Self::Error> {
        match value {
            PrefValue::Int(value) => Ok(value),
            other => Err(other),
        }
    }
}

#[derive(Debug)]
pub enum PrefError {
    JsonParse(serde_json::Error),
    NotAnObject,
    NoSuchPref(String),
    InvalidValue(String),
}

impl fmt::Display for PrefError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PrefError::JsonParse(ref error) => write!(f, "invalid preferences JSON: {error}"),
            PrefError::NotAnObject => write!(f, "preferences must be a JSON object"),
            PrefError::NoSuchPref(ref name) => write!(f, "unknown preference: {name}"),
            PrefError::InvalidValue(ref name) => write!(f, "invalid value for preference {name}"),
        }
    }
}

impl std::error::Error for PrefError {}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Preferences {
    /// How deeply objects may nest inside a structured clone before serialization
    /// gives up with a `DataCloneError`.
    pub dom_structured_clone_max_depth: i64,
    /// Whether `ArrayBuffer`s may be moved through the transfer list of `postMessage`.
    pub dom_postmessage_transfer_enabled: bool,
}

impl Preferences {
    const fn const_default() -> Self {
        Self {
            dom_structured_clone_max_depth: 512,
            dom_postmessage_transfer_enabled: true,
        }
    }

    /// Parse a full set of preferences, falling back to defaults for missing keys.
    pub fn from_json_str(txt: &str) -> Result<Self, PrefError> {
        serde_json::from_str(txt).map_err(PrefError::JsonParse)
    }

    pub fn get_value(&self, name: &str) -> Option<PrefValue> {
        match name {
            "dom_structured_clone_max_depth" => Some(self.dom_structured_clone_max_depth.into()),
            "dom_postmessage_transfer_enabled" => {
                Some(self.dom_postmessage_transfer_enabled.into())
            },
            _ => None,
        }
    }

    pub fn set_value(&mut self, name: &str, value: PrefValue) -> Result<(), PrefError> {
        let invalid = |_| PrefError::InvalidValue(name.to_owned());
        match name {
            "dom_structured_clone_max_depth" => {
                self.dom_structured_clone_max_depth = value.try_into().map_err(invalid)?
            },
            "dom_postmessage_transfer_enabled" => {
                self.dom_postmessage_transfer_enabled = value.try_into().map_err(invalid)?
            },
            _ => return Err(PrefError::NoSuchPref(name.to_owned())),
        }
        Ok(())
    }

    /// Apply a map of overrides, such as the one produced by [`read_prefs_map`]. Unknown or
    /// mistyped entries are skipped with a warning.
    pub fn apply_overrides(&mut self, overrides: HashMap<String, PrefValue>) {
        for (name, value) in overrides {
            if let Err(error) = self.set_value(&name, value) {
                warn!("Ignoring preference override: {error}");
            }
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::const_default()
    }
}

/// Read a flat JSON object of preference overrides. Values that are not booleans,
/// integers or strings are ignored.
pub fn read_prefs_map(txt: &str) -> Result<HashMap<String, PrefValue>, PrefError> {
    let json: serde_json::Value = serde_json::from_str(txt).map_err(PrefError::JsonParse)?;
    let object = json.as_object().ok_or(PrefError::NotAnObject)?;
    let mut prefs = HashMap::new();
    for (name, value) in object {
        match PrefValue::from_json(value) {
            Some(value) => {
                prefs.insert(name.clone(), value);
            },
            None => warn!("Ignoring non-boolean/integer/string preference value for {name:?}"),
        }
    }
    Ok(prefs)
}
