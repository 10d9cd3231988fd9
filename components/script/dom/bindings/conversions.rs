/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Conversions of script values to Rust types, following the
//! [Web IDL](https://webidl.spec.whatwg.org/#es-type-mapping) rules for the argument
//! types `postMessage` takes.

use crate::dom::bindings::error::{Error, Fallible};
use crate::js::{JSObject, JSVal, ObjectKind};

/// A trait to convert `JSVal`s to Rust types.
pub trait FromJSValConvertible: Sized {
    fn from_jsval(value: &JSVal) -> Fallible<Self>;
}

/// `DOMString` and `USVString`, through
/// [`ToString`](https://tc39.es/ecma262/#sec-tostring).
impl FromJSValConvertible for String {
    fn from_jsval(value: &JSVal) -> Fallible<String> {
        to_string(value, &mut Vec::new())
    }
}

/// <https://webidl.spec.whatwg.org/#es-object>
impl FromJSValConvertible for JSObject {
    fn from_jsval(value: &JSVal) -> Fallible<JSObject> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| Error::Type("Value is not an object.".to_owned()))
    }
}

/// `sequence<object>`. Only arrays are iterable here.
///
/// <https://webidl.spec.whatwg.org/#es-sequence>
impl FromJSValConvertible for Vec<JSObject> {
    fn from_jsval(value: &JSVal) -> Fallible<Vec<JSObject>> {
        let not_a_sequence = || Error::Type("Value is not a sequence.".to_owned());
        let object = value.as_object().ok_or_else(not_a_sequence)?;
        let elements = match *object.kind() {
            ObjectKind::Array(ref elements) => elements.clone(),
            _ => return Err(not_a_sequence()),
        };
        elements
            .iter()
            .map(|element| {
                element.as_object().cloned().ok_or_else(|| {
                    Error::Type("Element of sequence<object> is not an object.".to_owned())
                })
            })
            .collect()
    }
}

/// <https://tc39.es/ecma262/#sec-tostring>
///
/// `seen` holds the arrays being joined, so that a cyclic array converts to an empty
/// string where it refers to itself.
fn to_string(value: &JSVal, seen: &mut Vec<JSObject>) -> Fallible<String> {
    Ok(match *value {
        JSVal::Undefined => "undefined".to_owned(),
        JSVal::Null => "null".to_owned(),
        JSVal::Boolean(value) => value.to_string(),
        JSVal::Number(value) => number_to_string(value),
        JSVal::String(ref value) => value.clone(),
        JSVal::Symbol(_) => {
            return Err(Error::Type(
                "Cannot convert a Symbol value to a string.".to_owned(),
            ));
        },
        JSVal::Object(ref object) => object_to_string(object, seen)?,
    })
}

fn object_to_string(object: &JSObject, seen: &mut Vec<JSObject>) -> Fallible<String> {
    let kind = object.kind();
    Ok(match *kind {
        ObjectKind::Array(ref elements) => {
            if seen.contains(object) {
                return Ok(String::new());
            }
            seen.push(object.clone());
            let mut parts = Vec::with_capacity(elements.len());
            for element in elements {
                parts.push(match *element {
                    JSVal::Undefined | JSVal::Null => String::new(),
                    ref element => to_string(element, seen)?,
                });
            }
            seen.pop();
            parts.join(",")
        },
        ObjectKind::BooleanObject(value) => value.to_string(),
        ObjectKind::NumberObject(value) => number_to_string(value),
        ObjectKind::StringObject(ref value) => value.clone(),
        ObjectKind::RegExp {
            ref source,
            ref flags,
        } => format!("/{source}/{flags}"),
        ObjectKind::Error {
            ref name,
            ref message,
        } => match (name.is_empty(), message.is_empty()) {
            (_, true) => name.clone(),
            (true, false) => message.clone(),
            (false, false) => format!("{name}: {message}"),
        },
        ObjectKind::Function { ref name } => format!("function {name}() {{ [native code] }}"),
        ref other => format!("[object {}]", other.class_name()),
    })
}

/// <https://tc39.es/ecma262/#sec-numeric-types-number-tostring>
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value == 0.0 {
        return "0".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }
    // Rust spells exponents as `1e21` and `1e-7`; script wants `1e+21` and `1e-7`.
    let exponential = format!("{value:e}");
    match exponential.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        },
        _ => exponential,
    }
}
