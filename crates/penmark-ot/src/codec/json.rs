//! JSON codec for document operations.
//!
//! Converts operations to/from `serde_json::Value` in the transport wire
//! shape: a tagged record with a `type` string discriminator, `path` as
//! an array of non-negative integers, and the type-specific fields.
//! Round-trips are lossless; optional fields are omitted when absent.

use serde_json::{json, Map, Value};

use crate::types::{CodecError, Mark, MarkRange, Operation, Path};

// ── Field helpers ─────────────────────────────────────────────────────────

fn encode_path(path: &[usize]) -> Value {
    Value::Array(path.iter().map(|i| json!(i)).collect())
}

fn decode_path(v: &Value) -> Result<Path, CodecError> {
    let arr = v
        .as_array()
        .ok_or_else(|| CodecError::InvalidOp("path must be an array".into()))?;
    arr.iter()
        .map(|step| {
            step.as_u64()
                .map(|i| i as usize)
                .ok_or_else(|| CodecError::InvalidOp("path step must be a non-negative integer".into()))
        })
        .collect()
}

fn encode_mark(mark: &Mark) -> Value {
    let mut m = Map::new();
    m.insert("type".into(), json!(mark.kind));
    if let Some(v) = &mark.value {
        m.insert("value".into(), json!(v));
    }
    Value::Object(m)
}

fn decode_mark(v: &Value) -> Result<Mark, CodecError> {
    let obj = v
        .as_object()
        .ok_or_else(|| CodecError::InvalidOp("mark must be an object".into()))?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::InvalidOp("mark type must be a string".into()))?;
    let value = match obj.get("value") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(CodecError::InvalidOp("mark value must be a string".into())),
    };
    Ok(Mark {
        kind: kind.to_string(),
        value,
    })
}

fn encode_range(range: &MarkRange) -> Value {
    json!([range.start, range.end])
}

fn decode_range(v: &Value) -> Result<MarkRange, CodecError> {
    let arr = v
        .as_array()
        .ok_or_else(|| CodecError::InvalidOp("range must be a two-element array".into()))?;
    if arr.len() != 2 {
        return Err(CodecError::InvalidOp("range must be a two-element array".into()));
    }
    let start = decode_usize(&arr[0], "range start")?;
    let end = decode_usize(&arr[1], "range end")?;
    Ok(MarkRange::new(start, end))
}

fn decode_usize(v: &Value, what: &str) -> Result<usize, CodecError> {
    v.as_u64()
        .map(|i| i as usize)
        .ok_or_else(|| CodecError::InvalidOp(format!("{what} must be a non-negative integer")))
}

fn decode_string(v: &Value, what: &str) -> Result<String, CodecError> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| CodecError::InvalidOp(format!("{what} must be a string")))
}

fn decode_props(v: &Value, what: &str) -> Result<Map<String, Value>, CodecError> {
    v.as_object()
        .cloned()
        .ok_or_else(|| CodecError::InvalidOp(format!("{what} must be an object")))
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, CodecError> {
    obj.get(key)
        .ok_or_else(|| CodecError::InvalidOp(format!("missing field: {key}")))
}

// ── Serialization ─────────────────────────────────────────────────────────

/// Serialize an operation to its wire `serde_json::Value` shape.
pub fn to_json(op: &Operation) -> Value {
    match op {
        Operation::InsertText { path, offset, text } => json!({
            "type": "insert_text",
            "path": encode_path(path),
            "offset": offset,
            "text": text
        }),
        Operation::DeleteText {
            path,
            offset,
            count,
            text,
        } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("delete_text"));
            m.insert("path".into(), encode_path(path));
            m.insert("offset".into(), json!(offset));
            m.insert("count".into(), json!(count));
            if let Some(t) = text {
                m.insert("text".into(), json!(t));
            }
            Value::Object(m)
        }
        Operation::ApplyMark { path, mark, range } => json!({
            "type": "apply_mark",
            "path": encode_path(path),
            "mark": encode_mark(mark),
            "range": encode_range(range)
        }),
        Operation::RemoveMark { path, mark, range } => json!({
            "type": "remove_mark",
            "path": encode_path(path),
            "mark": encode_mark(mark),
            "range": encode_range(range)
        }),
        Operation::InsertNode { path, index, node } => json!({
            "type": "insert_node",
            "path": encode_path(path),
            "index": index,
            "node": node
        }),
        Operation::RemoveNode { path, index, node } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("remove_node"));
            m.insert("path".into(), encode_path(path));
            m.insert("index".into(), json!(index));
            if let Some(n) = node {
                m.insert("node".into(), n.clone());
            }
            Value::Object(m)
        }
        Operation::SetNode {
            path,
            properties,
            old_properties,
        } => {
            let mut m = Map::new();
            m.insert("type".into(), json!("set_node"));
            m.insert("path".into(), encode_path(path));
            m.insert("properties".into(), Value::Object(properties.clone()));
            if let Some(old) = old_properties {
                m.insert("oldProperties".into(), Value::Object(old.clone()));
            }
            Value::Object(m)
        }
        Operation::MergeNodes { path, position } => json!({
            "type": "merge_nodes",
            "path": encode_path(path),
            "position": position
        }),
        Operation::SplitNode { path, position } => json!({
            "type": "split_node",
            "path": encode_path(path),
            "position": position
        }),
        Operation::MoveNode {
            path,
            index,
            new_path,
            new_index,
        } => json!({
            "type": "move_node",
            "path": encode_path(path),
            "index": index,
            "newPath": encode_path(new_path),
            "newIndex": new_index
        }),
    }
}

// ── Deserialization ───────────────────────────────────────────────────────

/// Parse an operation from its wire `serde_json::Value` shape.
pub fn from_json(v: &Value) -> Result<Operation, CodecError> {
    let obj = v
        .as_object()
        .ok_or_else(|| CodecError::InvalidOp("operation must be an object".into()))?;
    let tag = field(obj, "type")?
        .as_str()
        .ok_or_else(|| CodecError::InvalidOp("type must be a string".into()))?;
    let path = decode_path(field(obj, "path")?)?;

    match tag {
        "insert_text" => Ok(Operation::InsertText {
            path,
            offset: decode_usize(field(obj, "offset")?, "offset")?,
            text: decode_string(field(obj, "text")?, "text")?,
        }),
        "delete_text" => Ok(Operation::DeleteText {
            path,
            offset: decode_usize(field(obj, "offset")?, "offset")?,
            count: decode_usize(field(obj, "count")?, "count")?,
            text: match obj.get("text") {
                None | Some(Value::Null) => None,
                Some(t) => Some(decode_string(t, "text")?),
            },
        }),
        "apply_mark" => Ok(Operation::ApplyMark {
            path,
            mark: decode_mark(field(obj, "mark")?)?,
            range: decode_range(field(obj, "range")?)?,
        }),
        "remove_mark" => Ok(Operation::RemoveMark {
            path,
            mark: decode_mark(field(obj, "mark")?)?,
            range: decode_range(field(obj, "range")?)?,
        }),
        "insert_node" => Ok(Operation::InsertNode {
            path,
            index: decode_usize(field(obj, "index")?, "index")?,
            node: field(obj, "node")?.clone(),
        }),
        "remove_node" => Ok(Operation::RemoveNode {
            path,
            index: decode_usize(field(obj, "index")?, "index")?,
            // A recorded node may be any JSON value, null included; only
            // an absent field decodes to None.
            node: obj.get("node").cloned(),
        }),
        "set_node" => Ok(Operation::SetNode {
            path,
            properties: decode_props(field(obj, "properties")?, "properties")?,
            old_properties: match obj.get("oldProperties") {
                None | Some(Value::Null) => None,
                Some(p) => Some(decode_props(p, "oldProperties")?),
            },
        }),
        "merge_nodes" => Ok(Operation::MergeNodes {
            path,
            position: decode_usize(field(obj, "position")?, "position")?,
        }),
        "split_node" => Ok(Operation::SplitNode {
            path,
            position: decode_usize(field(obj, "position")?, "position")?,
        }),
        "move_node" => Ok(Operation::MoveNode {
            path,
            index: decode_usize(field(obj, "index")?, "index")?,
            new_path: decode_path(field(obj, "newPath")?)?,
            new_index: decode_usize(field(obj, "newIndex")?, "newIndex")?,
        }),
        other => Err(CodecError::InvalidOp(format!("unknown op type: {other}"))),
    }
}

/// Serialize a list of operations.
pub fn to_json_ops(ops: &[Operation]) -> Value {
    Value::Array(ops.iter().map(to_json).collect())
}

/// Parse a list of operations.
pub fn from_json_ops(v: &Value) -> Result<Vec<Operation>, CodecError> {
    let arr = v
        .as_array()
        .ok_or_else(|| CodecError::InvalidOp("ops must be an array".into()))?;
    arr.iter().map(from_json).collect()
}
