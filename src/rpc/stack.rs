//! Typed values of a NEO `invokefunction` result stack.
//!
//! Each node on the wire is a `{ "type": .., "value": .. }` pair. Nodes are
//! parsed into [`StackItem`] up front so that an unknown or malformed node is
//! rejected at the boundary, and [`decode`] turns one node into a
//! [`DecodedValue`] for record assembly.

use crate::error::CoreError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum StackItem {
    Any,
    Boolean(bool),
    /// Decimal text; NEO integers are arbitrary precision.
    Integer(String),
    /// Base64 text as sent by the node.
    ByteString(String),
    Buffer(String),
    String(String),
    Hash160(String),
    Hash256(String),
    Pointer(String),
    InteropInterface,
    Array(Vec<StackItem>),
    Struct(Vec<StackItem>),
    Map(Vec<(StackItem, StackItem)>),
}

impl StackItem {
    pub fn kind(&self) -> &'static str {
        match self {
            StackItem::Any => "Any",
            StackItem::Boolean(_) => "Boolean",
            StackItem::Integer(_) => "Integer",
            StackItem::ByteString(_) => "ByteString",
            StackItem::Buffer(_) => "Buffer",
            StackItem::String(_) => "String",
            StackItem::Hash160(_) => "Hash160",
            StackItem::Hash256(_) => "Hash256",
            StackItem::Pointer(_) => "Pointer",
            StackItem::InteropInterface => "InteropInterface",
            StackItem::Array(_) => "Array",
            StackItem::Struct(_) => "Struct",
            StackItem::Map(_) => "Map",
        }
    }

    pub fn parse_stack(nodes: &[Value]) -> Result<Vec<StackItem>, CoreError> {
        nodes.iter().map(StackItem::try_from).collect()
    }

    pub fn to_json(&self) -> Value {
        match self {
            StackItem::Any | StackItem::InteropInterface => json!({ "type": self.kind() }),
            StackItem::Boolean(b) => json!({ "type": self.kind(), "value": b }),
            StackItem::Integer(s)
            | StackItem::ByteString(s)
            | StackItem::Buffer(s)
            | StackItem::String(s)
            | StackItem::Hash160(s)
            | StackItem::Hash256(s)
            | StackItem::Pointer(s) => json!({ "type": self.kind(), "value": s }),
            StackItem::Array(items) | StackItem::Struct(items) => json!({
                "type": self.kind(),
                "value": items.iter().map(StackItem::to_json).collect::<Vec<_>>(),
            }),
            StackItem::Map(entries) => json!({
                "type": self.kind(),
                "value": entries
                    .iter()
                    .map(|(k, v)| json!({ "key": k.to_json(), "value": v.to_json() }))
                    .collect::<Vec<_>>(),
            }),
        }
    }
}

impl Serialize for StackItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl TryFrom<&Value> for StackItem {
    type Error = CoreError;

    fn try_from(node: &Value) -> Result<Self, Self::Error> {
        let kind = node
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| malformed(format!("node without a type tag: {}", node)))?;

        // NEO emits these two without a value.
        match kind {
            "Any" => return Ok(StackItem::Any),
            "InteropInterface" => return Ok(StackItem::InteropInterface),
            _ => {}
        }

        let value = node
            .get("value")
            .ok_or_else(|| malformed(format!("{} node without a value", kind)))?;

        match kind {
            "Boolean" => match value {
                Value::Bool(b) => Ok(StackItem::Boolean(*b)),
                Value::String(s) if s == "true" || s == "false" => Ok(StackItem::Boolean(s == "true")),
                other => Err(malformed(format!("Boolean node with value {}", other))),
            },
            "Integer" => match value {
                Value::String(s) => Ok(StackItem::Integer(s.clone())),
                Value::Number(n) => Ok(StackItem::Integer(n.to_string())),
                other => Err(malformed(format!("Integer node with value {}", other))),
            },
            "ByteString" => Ok(StackItem::ByteString(text(kind, value)?)),
            "Buffer" => Ok(StackItem::Buffer(text(kind, value)?)),
            "String" => Ok(StackItem::String(text(kind, value)?)),
            "Hash160" => Ok(StackItem::Hash160(text(kind, value)?)),
            "Hash256" => Ok(StackItem::Hash256(text(kind, value)?)),
            "Pointer" => match value {
                Value::String(s) => Ok(StackItem::Pointer(s.clone())),
                Value::Number(n) => Ok(StackItem::Pointer(n.to_string())),
                other => Err(malformed(format!("Pointer node with value {}", other))),
            },
            "Array" => Ok(StackItem::Array(children(kind, value)?)),
            "Struct" => Ok(StackItem::Struct(children(kind, value)?)),
            "Map" => {
                let entries = value
                    .as_array()
                    .ok_or_else(|| malformed(format!("Map node with value {}", value)))?;
                entries
                    .iter()
                    .map(|entry| -> Result<(StackItem, StackItem), CoreError> {
                        let key = entry
                            .get("key")
                            .ok_or_else(|| malformed("Map entry without a key".to_string()))?;
                        let val = entry
                            .get("value")
                            .ok_or_else(|| malformed("Map entry without a value".to_string()))?;
                        Ok((StackItem::try_from(key)?, StackItem::try_from(val)?))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(StackItem::Map)
            }
            other => Err(malformed(format!("unknown stack item type '{}'", other))),
        }
    }
}

fn malformed(message: String) -> CoreError {
    CoreError::MalformedRpcValue(message)
}

fn text(kind: &str, value: &Value) -> Result<String, CoreError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(format!("{} node with non-string value {}", kind, value)))
}

fn children(kind: &str, value: &Value) -> Result<Vec<StackItem>, CoreError> {
    value
        .as_array()
        .ok_or_else(|| malformed(format!("{} node with non-array value {}", kind, value)))?
        .iter()
        .map(StackItem::try_from)
        .collect()
}

/// A stack node reduced to the value a record field holds.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Null,
    Boolean(bool),
    Text(String),
    /// ByteString payloads that are not valid UTF-8.
    Bytes(Vec<u8>),
    /// Child nodes of an Array or Struct, left undecoded.
    Items(Vec<StackItem>),
    Entries(Vec<(StackItem, StackItem)>),
}

impl DecodedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DecodedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn parse_integer(&self) -> Result<i128, CoreError> {
        let text = self
            .as_text()
            .ok_or_else(|| malformed(format!("expected integer text, got {:?}", self)))?;
        text.parse::<i128>()
            .map_err(|e| malformed(format!("'{}' is not an integer: {}", text, e)))
    }

    pub fn to_json(&self) -> Value {
        match self {
            DecodedValue::Null => Value::Null,
            DecodedValue::Boolean(b) => Value::Bool(*b),
            DecodedValue::Text(s) => Value::String(s.clone()),
            DecodedValue::Bytes(bytes) => Value::String(hex::encode(bytes)),
            DecodedValue::Items(items) => items.iter().map(StackItem::to_json).collect(),
            DecodedValue::Entries(entries) => entries
                .iter()
                .map(|(k, v)| json!({ "key": k.to_json(), "value": v.to_json() }))
                .collect(),
        }
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Decode one node. Only ByteString payloads are transformed (base64);
/// every other kind passes its value through, and Array/Struct children are
/// not decoded here.
pub fn decode(item: &StackItem) -> Result<DecodedValue, CoreError> {
    match item {
        StackItem::ByteString(encoded) => {
            let bytes = STANDARD
                .decode(encoded)
                .map_err(|e| malformed(format!("invalid base64 '{}': {}", encoded, e)))?;
            Ok(match String::from_utf8(bytes) {
                Ok(text) => DecodedValue::Text(text),
                Err(e) => DecodedValue::Bytes(e.into_bytes()),
            })
        }
        StackItem::Any | StackItem::InteropInterface => Ok(DecodedValue::Null),
        StackItem::Boolean(b) => Ok(DecodedValue::Boolean(*b)),
        StackItem::Integer(s)
        | StackItem::Buffer(s)
        | StackItem::String(s)
        | StackItem::Hash160(s)
        | StackItem::Hash256(s)
        | StackItem::Pointer(s) => Ok(DecodedValue::Text(s.clone())),
        StackItem::Array(items) | StackItem::Struct(items) => Ok(DecodedValue::Items(items.clone())),
        StackItem::Map(entries) => Ok(DecodedValue::Entries(entries.clone())),
    }
}

pub fn decode_all(items: &[StackItem]) -> Result<Vec<DecodedValue>, CoreError> {
    items.iter().map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(node: Value) -> Result<StackItem, CoreError> {
        StackItem::try_from(&node)
    }

    #[test]
    fn byte_string_is_base64_decoded() {
        let item = parse(json!({ "type": "ByteString", "value": "SGVsbG8=" })).unwrap();
        assert_eq!(decode(&item).unwrap(), DecodedValue::Text("Hello".to_string()));
    }

    #[test]
    fn integer_passes_through_unparsed() {
        let item = parse(json!({ "type": "Integer", "value": "42" })).unwrap();
        let decoded = decode(&item).unwrap();
        assert_eq!(decoded, DecodedValue::Text("42".to_string()));
        assert_eq!(decoded.parse_integer().unwrap(), 42);
    }

    #[test]
    fn non_utf8_byte_string_keeps_raw_bytes() {
        let item = StackItem::ByteString(STANDARD.encode([0xffu8, 0x00, 0x10]));
        assert_eq!(decode(&item).unwrap(), DecodedValue::Bytes(vec![0xff, 0x00, 0x10]));
        assert_eq!(decode(&item).unwrap().to_json(), json!("ff0010"));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let item = StackItem::ByteString("not base64!".to_string());
        assert!(matches!(decode(&item), Err(CoreError::MalformedRpcValue(_))));
    }

    #[test]
    fn array_children_are_parsed_but_not_decoded() {
        let item = parse(json!({
            "type": "Array",
            "value": [
                { "type": "ByteString", "value": "SGVsbG8=" },
                { "type": "Boolean", "value": true }
            ]
        }))
        .unwrap();
        let decoded = decode(&item).unwrap();
        assert_eq!(
            decoded,
            DecodedValue::Items(vec![
                StackItem::ByteString("SGVsbG8=".to_string()),
                StackItem::Boolean(true),
            ])
        );
    }

    #[test]
    fn decode_all_decodes_each_element() {
        let items = vec![
            StackItem::ByteString("TXlEYW8=".to_string()),
            StackItem::Integer("7".to_string()),
            StackItem::Any,
        ];
        assert_eq!(
            decode_all(&items).unwrap(),
            vec![
                DecodedValue::Text("MyDao".to_string()),
                DecodedValue::Text("7".to_string()),
                DecodedValue::Null,
            ]
        );
    }

    #[test]
    fn missing_type_or_value_is_malformed() {
        for node in [
            json!({ "value": "42" }),
            json!({ "type": "", "value": "42" }),
            json!({ "type": "Integer" }),
            json!({ "type": "Array", "value": "oops" }),
            json!({ "type": "Boolean", "value": 1 }),
            json!({ "type": "Mystery", "value": "?" }),
        ] {
            assert!(
                matches!(parse(node.clone()), Err(CoreError::MalformedRpcValue(_))),
                "{}",
                node
            );
        }
    }

    #[test]
    fn valueless_kinds_are_accepted() {
        assert_eq!(parse(json!({ "type": "Any" })).unwrap(), StackItem::Any);
        assert_eq!(
            parse(json!({ "type": "InteropInterface", "interface": "IIterator" })).unwrap(),
            StackItem::InteropInterface
        );
    }

    #[test]
    fn maps_parse_key_value_pairs() {
        let item = parse(json!({
            "type": "Map",
            "value": [{
                "key": { "type": "ByteString", "value": "SGVsbG8=" },
                "value": { "type": "Integer", "value": "1" }
            }]
        }))
        .unwrap();
        assert_eq!(
            item,
            StackItem::Map(vec![(
                StackItem::ByteString("SGVsbG8=".to_string()),
                StackItem::Integer("1".to_string()),
            )])
        );
        assert_eq!(StackItem::try_from(&item.to_json()).unwrap(), item);
    }
}
