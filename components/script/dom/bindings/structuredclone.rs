/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! This module implements structured cloning, as defined by [HTML](https://html.spec.whatwg.org/multipage/#safe-passing-of-structured-data).
//!
//! Cloning happens in two halves. [`write`] runs in the sending context and produces a
//! [`StructuredSerializedData`], which owns no script objects and can be queued for
//! another context. [`read`] runs later in the receiving context and builds fresh
//! objects in its heap.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use xdm_config::pref;
use xdm_config::prefs::Preferences;

use crate::dom::bindings::error::{Error, Fallible};
use crate::js::{JSObject, JSVal, ObjectKind};

/// One serialized value. Objects are written in pre-order, and each one takes the next
/// memory index, so that later occurrences of the same object can be written as a
/// [`SerializedValue::Reference`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum SerializedValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// An object already written, by memory index.
    Reference(u32),
    /// An `ArrayBuffer` moved through the transfer list, by position in that list.
    Transferred(u32),
    Object(Vec<(String, SerializedValue)>),
    Array(Vec<SerializedValue>),
    Date(f64),
    ArrayBuffer(Vec<u8>),
    RegExp { source: String, flags: String },
    Map(Vec<(SerializedValue, SerializedValue)>),
    Set(Vec<SerializedValue>),
    BooleanObject(bool),
    NumberObject(f64),
    StringObject(String),
    Error { name: String, message: String },
}

/// The result of serializing a message, ready to be handed to another context.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StructuredSerializedData {
    /// The serialized message.
    pub serialized: SerializedValue,
    /// The contents of the transferred `ArrayBuffer`s, in transfer list order.
    pub transferred: Vec<Vec<u8>>,
}

/// Knobs for [`write`], usually read from preferences.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StructuredCloneLimits {
    /// How many objects may be nested inside one another.
    pub max_depth: usize,
    /// Whether the transfer list may be non-empty.
    pub transfer_enabled: bool,
}

impl StructuredCloneLimits {
    /// The limits set by the current preferences.
    pub fn from_prefs() -> StructuredCloneLimits {
        StructuredCloneLimits {
            max_depth: usize::try_from(pref!(dom_structured_clone_max_depth)).unwrap_or(0),
            transfer_enabled: pref!(dom_postmessage_transfer_enabled),
        }
    }
}

/// The limits of the default preferences, whatever the current ones are.
impl Default for StructuredCloneLimits {
    fn default() -> StructuredCloneLimits {
        let defaults = Preferences::default();
        StructuredCloneLimits {
            max_depth: usize::try_from(defaults.dom_structured_clone_max_depth).unwrap_or(0),
            transfer_enabled: defaults.dom_postmessage_transfer_enabled,
        }
    }
}

enum MemorySlot {
    Object(u32),
    Transferred(u32),
}

/// Where a child value goes in its container once it has been written or read.
enum Slot {
    Property(String),
    Element,
    MapKey,
    MapValue,
    SetValue,
}

/// One value handled without descending into it: either finished, or a container
/// whose children are still to come.
enum Shallow<V, C> {
    Value(V),
    Container(V, Vec<(Slot, C)>),
}

/// An open container on the explicit stacks of the writer and the reader. Nesting in
/// the data never turns into native recursion, so any depth the writer accepts can be
/// read back.
struct Frame<V, C> {
    container: V,
    children: std::vec::IntoIter<(Slot, C)>,
    /// Where this container goes in its own parent; `None` for the outermost value.
    slot: Option<Slot>,
    /// A map key waiting for its value.
    map_key: Option<V>,
    depth: usize,
}

impl<V, C> Frame<V, C> {
    fn new(container: V, children: Vec<(Slot, C)>, slot: Option<Slot>, depth: usize) -> Self {
        Frame {
            container,
            children: children.into_iter(),
            slot,
            map_key: None,
            depth,
        }
    }
}

/// Adds one finished child to a container.
trait Attach: Sized {
    fn attach<C>(frame: &mut Frame<Self, C>, slot: Slot, value: Self);
}

impl Attach for SerializedValue {
    fn attach<C>(frame: &mut Frame<Self, C>, slot: Slot, value: Self) {
        match (&mut frame.container, slot) {
            (SerializedValue::Object(properties), Slot::Property(key)) => {
                properties.push((key, value))
            },
            (SerializedValue::Array(elements), Slot::Element) => elements.push(value),
            (SerializedValue::Map(_), Slot::MapKey) => frame.map_key = Some(value),
            (SerializedValue::Map(entries), Slot::MapValue) => {
                let key = frame.map_key.take().unwrap_or(SerializedValue::Undefined);
                entries.push((key, value));
            },
            (SerializedValue::Set(values), Slot::SetValue) => values.push(value),
            _ => {},
        }
    }
}

impl Attach for JSVal {
    fn attach<C>(frame: &mut Frame<Self, C>, slot: Slot, value: Self) {
        let JSVal::Object(ref object) = frame.container else {
            return;
        };
        match slot {
            Slot::Property(key) => {
                object.set(&key, value);
            },
            Slot::Element => {
                object.push(value);
            },
            Slot::MapKey => frame.map_key = Some(value),
            Slot::MapValue => {
                let key = frame.map_key.take().unwrap_or_default();
                if let ObjectKind::Map(ref mut entries) = *object.kind_mut() {
                    entries.push((key, value));
                }
            },
            Slot::SetValue => {
                if let ObjectKind::Set(ref mut values) = *object.kind_mut() {
                    values.push(value);
                }
            },
        }
    }
}

/// Walks `root` depth first. `visit` handles one value at a given depth; containers it
/// opens are pushed on an explicit stack and receive their children in order.
fn walk<V, C>(
    root: C,
    mut visit: impl FnMut(C, usize) -> Fallible<Shallow<V, C>>,
) -> Fallible<V>
where
    V: Attach,
{
    let (container, children) = match visit(root, 0)? {
        Shallow::Value(value) => return Ok(value),
        Shallow::Container(container, children) => (container, children),
    };
    let mut stack = vec![Frame::new(container, children, None, 0)];

    while let Some(frame) = stack.last_mut() {
        if let Some((slot, child)) = frame.children.next() {
            let depth = frame.depth + 1;
            match visit(child, depth)? {
                Shallow::Value(value) => V::attach(frame, slot, value),
                Shallow::Container(container, children) => {
                    stack.push(Frame::new(container, children, Some(slot), depth))
                },
            }
            continue;
        }

        let Some(Frame {
            container, slot, ..
        }) = stack.pop()
        else {
            break;
        };
        match (stack.last_mut(), slot) {
            (Some(parent), Some(slot)) => V::attach(parent, slot, container),
            _ => return Ok(container),
        }
    }
    Err(data_clone_error("Structured clone ended without a value".to_owned()))
}

struct StructuredCloneWriter {
    /// Objects seen so far, keyed by identity.
    memory: HashMap<usize, MemorySlot>,
    next_index: u32,
    limits: StructuredCloneLimits,
}

fn data_clone_error(message: String) -> Error {
    Error::DataClone(Some(message))
}

impl StructuredCloneWriter {
    fn write_value(&mut self, value: &JSVal) -> Fallible<SerializedValue> {
        walk(value.clone(), |value, depth| self.write_shallow(value, depth))
    }

    fn write_shallow(
        &mut self,
        value: JSVal,
        depth: usize,
    ) -> Fallible<Shallow<SerializedValue, JSVal>> {
        Ok(Shallow::Value(match value {
            JSVal::Undefined => SerializedValue::Undefined,
            JSVal::Null => SerializedValue::Null,
            JSVal::Boolean(value) => SerializedValue::Boolean(value),
            JSVal::Number(value) => SerializedValue::Number(value),
            JSVal::String(value) => SerializedValue::String(value),
            JSVal::Symbol(_) => {
                return Err(data_clone_error("Symbol values can not be cloned".to_owned()));
            },
            JSVal::Object(ref object) => return self.write_object(object, depth),
        }))
    }

    fn write_object(
        &mut self,
        object: &JSObject,
        depth: usize,
    ) -> Fallible<Shallow<SerializedValue, JSVal>> {
        match self.memory.get(&object.address()) {
            Some(MemorySlot::Object(index)) => {
                return Ok(Shallow::Value(SerializedValue::Reference(*index)));
            },
            Some(MemorySlot::Transferred(index)) => {
                return Ok(Shallow::Value(SerializedValue::Transferred(*index)));
            },
            None => {},
        }

        if depth >= self.limits.max_depth {
            return Err(data_clone_error(format!(
                "Objects nested more than {} levels deep can not be cloned",
                self.limits.max_depth
            )));
        }

        let kind = object.kind();
        let value = match *kind {
            ObjectKind::Function { .. } | ObjectKind::Platform { .. } => {
                return Err(data_clone_error(format!(
                    "{} objects can not be cloned",
                    kind.class_name()
                )));
            },
            ObjectKind::ArrayBuffer(None) => {
                return Err(data_clone_error(
                    "A detached ArrayBuffer can not be cloned".to_owned(),
                ));
            },
            ObjectKind::ArrayBuffer(Some(ref bytes)) => {
                SerializedValue::ArrayBuffer(bytes.clone())
            },
            ObjectKind::Ordinary(ref properties) => {
                self.remember(object);
                return Ok(Shallow::Container(
                    SerializedValue::Object(Vec::with_capacity(properties.len())),
                    properties
                        .iter()
                        .map(|(key, value)| (Slot::Property(key.clone()), value.clone()))
                        .collect(),
                ));
            },
            ObjectKind::Array(ref elements) => {
                self.remember(object);
                return Ok(Shallow::Container(
                    SerializedValue::Array(Vec::with_capacity(elements.len())),
                    elements
                        .iter()
                        .map(|element| (Slot::Element, element.clone()))
                        .collect(),
                ));
            },
            ObjectKind::Map(ref entries) => {
                self.remember(object);
                return Ok(Shallow::Container(
                    SerializedValue::Map(Vec::with_capacity(entries.len())),
                    entries
                        .iter()
                        .flat_map(|(key, value)| {
                            [(Slot::MapKey, key.clone()), (Slot::MapValue, value.clone())]
                        })
                        .collect(),
                ));
            },
            ObjectKind::Set(ref values) => {
                self.remember(object);
                return Ok(Shallow::Container(
                    SerializedValue::Set(Vec::with_capacity(values.len())),
                    values
                        .iter()
                        .map(|value| (Slot::SetValue, value.clone()))
                        .collect(),
                ));
            },
            ObjectKind::Date(time) => SerializedValue::Date(time),
            ObjectKind::RegExp {
                ref source,
                ref flags,
            } => SerializedValue::RegExp {
                source: source.clone(),
                flags: flags.clone(),
            },
            ObjectKind::BooleanObject(value) => SerializedValue::BooleanObject(value),
            ObjectKind::NumberObject(value) => SerializedValue::NumberObject(value),
            ObjectKind::StringObject(ref value) => SerializedValue::StringObject(value.clone()),
            ObjectKind::Error {
                ref name,
                ref message,
            } => SerializedValue::Error {
                name: name.clone(),
                message: message.clone(),
            },
        };
        self.remember(object);
        Ok(Shallow::Value(value))
    }

    /// Gives `object` the next memory index. Containers get theirs before any of their
    /// children are written, so a cycle back to one finds it in memory.
    fn remember(&mut self, object: &JSObject) {
        let index = self.next_index;
        self.next_index += 1;
        self.memory
            .insert(object.address(), MemorySlot::Object(index));
    }
}

/// <https://html.spec.whatwg.org/multipage/#structuredserializewithtransfer>
///
/// Writes a structured clone of `message`, moving the given `ArrayBuffer`s. Returns a
/// `DataClone` error if that fails, in which case nothing has been detached.
pub fn write(
    message: &JSVal,
    transfer: &[JSObject],
    limits: StructuredCloneLimits,
) -> Fallible<StructuredSerializedData> {
    let mut writer = StructuredCloneWriter {
        memory: HashMap::new(),
        next_index: 0,
        limits,
    };

    // Steps 1-4.
    for (index, transferable) in transfer.iter().enumerate() {
        if !limits.transfer_enabled {
            return Err(data_clone_error("Transferring objects is disabled".to_owned()));
        }
        if !transferable.is_array_buffer() {
            return Err(data_clone_error(format!(
                "{} objects can not be transferred",
                transferable.class_name()
            )));
        }
        if writer.memory.contains_key(&transferable.address()) {
            return Err(data_clone_error(
                "An ArrayBuffer appears more than once in the transfer list".to_owned(),
            ));
        }
        if transferable.is_detached() {
            return Err(data_clone_error(
                "A detached ArrayBuffer can not be transferred".to_owned(),
            ));
        }
        writer
            .memory
            .insert(transferable.address(), MemorySlot::Transferred(index as u32));
    }

    // Step 5.
    let serialized = writer.write_value(message)?;

    // Steps 6-7. Only detach once serialization can no longer fail.
    let transferred: Vec<Vec<u8>> = transfer
        .iter()
        .map(|buffer| buffer.detach().unwrap_or_default())
        .collect();
    if !transferred.is_empty() {
        debug!("Transferred {} ArrayBuffer(s)", transferred.len());
    }

    Ok(StructuredSerializedData {
        serialized,
        transferred,
    })
}

struct StructuredCloneReader {
    /// Objects created so far, by memory index.
    memory: Vec<JSObject>,
    transferred: Vec<JSObject>,
}

impl StructuredCloneReader {
    fn allocate(&mut self, kind: ObjectKind) -> JSObject {
        let object = JSObject::new(kind);
        self.memory.push(object.clone());
        object
    }

    fn read_value(&mut self, value: SerializedValue) -> Fallible<JSVal> {
        walk(value, |value, _depth| self.read_shallow(value))
    }

    /// Reads `value`, allocating objects in memory order. Containers are allocated empty
    /// and their children handed back to [`walk`].
    fn read_shallow(
        &mut self,
        value: SerializedValue,
    ) -> Fallible<Shallow<JSVal, SerializedValue>> {
        let (kind, children): (ObjectKind, Vec<(Slot, SerializedValue)>) = match value {
            SerializedValue::Undefined => return Ok(Shallow::Value(JSVal::Undefined)),
            SerializedValue::Null => return Ok(Shallow::Value(JSVal::Null)),
            SerializedValue::Boolean(value) => return Ok(Shallow::Value(JSVal::Boolean(value))),
            SerializedValue::Number(value) => return Ok(Shallow::Value(JSVal::Number(value))),
            SerializedValue::String(value) => return Ok(Shallow::Value(JSVal::String(value))),
            SerializedValue::Reference(index) => {
                let object = self.memory.get(index as usize).cloned().ok_or_else(|| {
                    data_clone_error(format!("Dangling object reference {index}"))
                })?;
                return Ok(Shallow::Value(JSVal::Object(object)));
            },
            SerializedValue::Transferred(index) => {
                let object = self.transferred.get(index as usize).cloned().ok_or_else(|| {
                    data_clone_error(format!("Missing transferred ArrayBuffer {index}"))
                })?;
                return Ok(Shallow::Value(JSVal::Object(object)));
            },
            SerializedValue::Object(properties) => (
                ObjectKind::Ordinary(IndexMap::with_capacity(properties.len())),
                properties
                    .into_iter()
                    .map(|(key, value)| (Slot::Property(key), value))
                    .collect(),
            ),
            SerializedValue::Array(elements) => (
                ObjectKind::Array(Vec::with_capacity(elements.len())),
                elements
                    .into_iter()
                    .map(|element| (Slot::Element, element))
                    .collect(),
            ),
            SerializedValue::Map(entries) => (
                ObjectKind::Map(Vec::with_capacity(entries.len())),
                entries
                    .into_iter()
                    .flat_map(|(key, value)| [(Slot::MapKey, key), (Slot::MapValue, value)])
                    .collect(),
            ),
            SerializedValue::Set(values) => (
                ObjectKind::Set(Vec::with_capacity(values.len())),
                values
                    .into_iter()
                    .map(|value| (Slot::SetValue, value))
                    .collect(),
            ),
            SerializedValue::Date(time) => (ObjectKind::Date(time), Vec::new()),
            SerializedValue::ArrayBuffer(bytes) => {
                (ObjectKind::ArrayBuffer(Some(bytes)), Vec::new())
            },
            SerializedValue::RegExp { source, flags } => {
                (ObjectKind::RegExp { source, flags }, Vec::new())
            },
            SerializedValue::BooleanObject(value) => {
                (ObjectKind::BooleanObject(value), Vec::new())
            },
            SerializedValue::NumberObject(value) => (ObjectKind::NumberObject(value), Vec::new()),
            SerializedValue::StringObject(value) => (ObjectKind::StringObject(value), Vec::new()),
            SerializedValue::Error { name, message } => {
                (ObjectKind::Error { name, message }, Vec::new())
            },
        };
        let object = JSVal::Object(self.allocate(kind));
        if children.is_empty() {
            return Ok(Shallow::Value(object));
        }
        Ok(Shallow::Container(object, children))
    }
}

/// <https://html.spec.whatwg.org/multipage/#structureddeserializewithtransfer>
///
/// Reads a structured clone into fresh objects. Fails with a `DataClone` error when the
/// data is malformed.
pub fn read(data: StructuredSerializedData) -> Fallible<JSVal> {
    let mut reader = StructuredCloneReader {
        memory: Vec::new(),
        transferred: data
            .transferred
            .into_iter()
            .map(JSObject::new_array_buffer)
            .collect(),
    };
    reader.read_value(data.serialized)
}
