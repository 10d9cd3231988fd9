/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! A minimal model of script values and the per-context object heap they live in.
//!
//! Objects are reference counted and compared by identity: two [`JSObject`]s are equal
//! only when they are the same object. Nothing here crosses threads; values that need
//! to move between browsing contexts go through structured serialization first.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// A script value.
#[derive(Clone, Debug, Default)]
pub enum JSVal {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Symbol(JSSymbol),
    Object(JSObject),
}

impl JSVal {
    pub fn is_undefined(&self) -> bool {
        matches!(*self, JSVal::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(*self, JSVal::Null)
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match *self {
            JSVal::Boolean(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match *self {
            JSVal::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            JSVal::String(ref value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JSObject> {
        match *self {
            JSVal::Object(ref object) => Some(object),
            _ => None,
        }
    }

    /// The result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match *self {
            JSVal::Undefined => "undefined",
            JSVal::Null => "object",
            JSVal::Boolean(_) => "boolean",
            JSVal::Number(_) => "number",
            JSVal::String(_) => "string",
            JSVal::Symbol(_) => "symbol",
            JSVal::Object(ref object) => {
                if matches!(*object.kind(), ObjectKind::Function { .. }) {
                    "function"
                } else {
                    "object"
                }
            },
        }
    }
}

/// Strict equality (`===`), so `NaN` is not equal to itself and objects compare by
/// identity.
impl PartialEq for JSVal {
    fn eq(&self, other: &JSVal) -> bool {
        match (self, other) {
            (JSVal::Undefined, JSVal::Undefined) | (JSVal::Null, JSVal::Null) => true,
            (JSVal::Boolean(a), JSVal::Boolean(b)) => a == b,
            (JSVal::Number(a), JSVal::Number(b)) => a == b,
            (JSVal::String(a), JSVal::String(b)) => a == b,
            (JSVal::Symbol(a), JSVal::Symbol(b)) => a == b,
            (JSVal::Object(a), JSVal::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for JSVal {
    fn from(value: bool) -> Self {
        JSVal::Boolean(value)
    }
}

impl From<f64> for JSVal {
    fn from(value: f64) -> Self {
        JSVal::Number(value)
    }
}

impl From<i32> for JSVal {
    fn from(value: i32) -> Self {
        JSVal::Number(value.into())
    }
}

impl From<&str> for JSVal {
    fn from(value: &str) -> Self {
        JSVal::String(value.to_owned())
    }
}

impl From<String> for JSVal {
    fn from(value: String) -> Self {
        JSVal::String(value)
    }
}

impl From<JSObject> for JSVal {
    fn from(object: JSObject) -> Self {
        JSVal::Object(object)
    }
}

/// A symbol. Every call to [`JSSymbol::new`] makes a distinct symbol, whatever its
/// description.
#[derive(Clone)]
pub struct JSSymbol(Rc<Option<String>>);

impl JSSymbol {
    pub fn new(description: Option<&str>) -> JSSymbol {
        JSSymbol(Rc::new(description.map(str::to_owned)))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl PartialEq for JSSymbol {
    fn eq(&self, other: &JSSymbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for JSSymbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or_default())
    }
}

/// The internal representation of an object, which decides how it is cloned.
#[derive(Debug)]
pub enum ObjectKind {
    /// A plain object with string keys, kept in insertion order.
    Ordinary(IndexMap<String, JSVal>),
    Array(Vec<JSVal>),
    /// Milliseconds since the epoch.
    Date(f64),
    /// The bytes of an `ArrayBuffer`, or `None` once it has been detached.
    ArrayBuffer(Option<Vec<u8>>),
    RegExp {
        source: String,
        flags: String,
    },
    /// Entries in insertion order.
    Map(Vec<(JSVal, JSVal)>),
    Set(Vec<JSVal>),
    BooleanObject(bool),
    NumberObject(f64),
    StringObject(String),
    Error {
        name: String,
        message: String,
    },
    Function {
        name: String,
    },
    /// An object backed by the platform, such as a `Window`.
    Platform {
        interface: &'static str,
    },
}

impl ObjectKind {
    /// The name used by `Object.prototype.toString` and in error messages.
    pub fn class_name(&self) -> &'static str {
        match *self {
            ObjectKind::Ordinary(_) => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Date(_) => "Date",
            ObjectKind::ArrayBuffer(_) => "ArrayBuffer",
            ObjectKind::RegExp { .. } => "RegExp",
            ObjectKind::Map(_) => "Map",
            ObjectKind::Set(_) => "Set",
            ObjectKind::BooleanObject(_) => "Boolean",
            ObjectKind::NumberObject(_) => "Number",
            ObjectKind::StringObject(_) => "String",
            ObjectKind::Error { .. } => "Error",
            ObjectKind::Function { .. } => "Function",
            ObjectKind::Platform { interface } => interface,
        }
    }
}

/// A handle to an object. Cloning the handle does not clone the object.
#[derive(Clone)]
pub struct JSObject(Rc<RefCell<ObjectKind>>);

impl JSObject {
    pub fn new(kind: ObjectKind) -> JSObject {
        JSObject(Rc::new(RefCell::new(kind)))
    }

    pub fn new_ordinary() -> JSObject {
        JSObject::new(ObjectKind::Ordinary(IndexMap::new()))
    }

    /// An ordinary object with the given properties, in order.
    pub fn from_properties<K, I>(properties: I) -> JSObject
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JSVal)>,
    {
        JSObject::new(ObjectKind::Ordinary(
            properties
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        ))
    }

    pub fn new_array(elements: Vec<JSVal>) -> JSObject {
        JSObject::new(ObjectKind::Array(elements))
    }

    pub fn new_array_buffer(bytes: Vec<u8>) -> JSObject {
        JSObject::new(ObjectKind::ArrayBuffer(Some(bytes)))
    }

    pub fn new_function(name: &str) -> JSObject {
        JSObject::new(ObjectKind::Function {
            name: name.to_owned(),
        })
    }

    pub fn kind(&self) -> Ref<'_, ObjectKind> {
        self.0.borrow()
    }

    pub fn kind_mut(&self) -> RefMut<'_, ObjectKind> {
        self.0.borrow_mut()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind().class_name()
    }

    /// A key identifying this object for as long as it is alive.
    pub(crate) fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Reads an own property of an ordinary object.
    pub fn get(&self, key: &str) -> Option<JSVal> {
        match *self.kind() {
            ObjectKind::Ordinary(ref properties) => properties.get(key).cloned(),
            _ => None,
        }
    }

    /// Sets an own property of an ordinary object, returning `false` for other kinds.
    pub fn set(&self, key: &str, value: JSVal) -> bool {
        match *self.kind_mut() {
            ObjectKind::Ordinary(ref mut properties) => {
                properties.insert(key.to_owned(), value);
                true
            },
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        match *self.kind() {
            ObjectKind::Ordinary(ref properties) => properties.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Reads an element of an array.
    pub fn get_index(&self, index: usize) -> Option<JSVal> {
        match *self.kind() {
            ObjectKind::Array(ref elements) => elements.get(index).cloned(),
            _ => None,
        }
    }

    /// Appends to an array, returning `false` for other kinds.
    pub fn push(&self, value: JSVal) -> bool {
        match *self.kind_mut() {
            ObjectKind::Array(ref mut elements) => {
                elements.push(value);
                true
            },
            _ => false,
        }
    }

    /// The `length` of an array, or the `byteLength` of an `ArrayBuffer`.
    pub fn length(&self) -> Option<usize> {
        match *self.kind() {
            ObjectKind::Array(ref elements) => Some(elements.len()),
            ObjectKind::ArrayBuffer(ref bytes) => Some(bytes.as_ref().map_or(0, Vec::len)),
            _ => None,
        }
    }

    pub fn is_array_buffer(&self) -> bool {
        matches!(*self.kind(), ObjectKind::ArrayBuffer(_))
    }

    /// <https://tc39.es/ecma262/#sec-isdetachedbuffer>
    pub fn is_detached(&self) -> bool {
        matches!(*self.kind(), ObjectKind::ArrayBuffer(None))
    }

    /// A copy of the bytes of a live `ArrayBuffer`.
    pub fn array_buffer_data(&self) -> Option<Vec<u8>> {
        match *self.kind() {
            ObjectKind::ArrayBuffer(ref bytes) => bytes.clone(),
            _ => None,
        }
    }

    /// <https://tc39.es/ecma262/#sec-detacharraybuffer>
    ///
    /// Takes the bytes out of a live `ArrayBuffer`, leaving it with a length of zero.
    pub(crate) fn detach(&self) -> Option<Vec<u8>> {
        match *self.kind_mut() {
            ObjectKind::ArrayBuffer(ref mut bytes) => bytes.take(),
            _ => None,
        }
    }
}

impl PartialEq for JSObject {
    fn eq(&self, other: &JSObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for JSObject {}

impl fmt::Debug for JSObject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Objects may be cyclic, so only the class and identity are printed.
        match self.0.try_borrow() {
            Ok(kind) => write!(f, "[object {}]@{:#x}", kind.class_name(), self.address()),
            Err(_) => write!(f, "[object]@{:#x}", self.address()),
        }
    }
}
