//! # Blocks
//!
//! A block is one visual unit of an email. The wire form is the same one
//! that is persisted:
//!
//! ```json
//! { "id": "s1", "type": "header", "data": { "title": "Hi" }, "style": { "padding": "24px" } }
//! ```
//!
//! Decoding is tolerant: missing `data`/`style` default to empty and missing
//! data fields default to empty strings. A `type` outside the known set
//! decodes to [`BlockContent::Unknown`], which keeps the raw data so the
//! block survives a round trip unchanged.

use crate::{ModelError, StyleMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Header,
    Text,
    Image,
    Button,
    Spacer,
    Footer,
}

impl BlockKind {
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Header,
        BlockKind::Text,
        BlockKind::Image,
        BlockKind::Button,
        BlockKind::Spacer,
        BlockKind::Footer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Header => "header",
            BlockKind::Text => "text",
            BlockKind::Image => "image",
            BlockKind::Button => "button",
            BlockKind::Spacer => "spacer",
            BlockKind::Footer => "footer",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderData {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    /// May contain a restricted HTML subset; rendered verbatim.
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FooterData {
    #[serde(default)]
    pub text: String,
}

/// Type-specific payload of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Header(HeaderData),
    Text(TextData),
    Image(ImageData),
    Button(ButtonData),
    /// Height comes from the style map.
    Spacer,
    Footer(FooterData),
    /// A `type` this version does not know about.
    Unknown { kind: String, data: Value },
}

impl BlockContent {
    /// Decode a payload from its type name and raw `data` object.
    pub fn from_parts(kind: &str, data: Value) -> Result<Self, serde_json::Error> {
        let data = match data {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let Some(known) = BlockKind::parse(kind) else {
            return Ok(BlockContent::Unknown {
                kind: kind.to_string(),
                data,
            });
        };

        Ok(match known {
            BlockKind::Header => BlockContent::Header(serde_json::from_value(data)?),
            BlockKind::Text => BlockContent::Text(serde_json::from_value(data)?),
            BlockKind::Image => BlockContent::Image(serde_json::from_value(data)?),
            BlockKind::Button => BlockContent::Button(serde_json::from_value(data)?),
            BlockKind::Spacer => BlockContent::Spacer,
            BlockKind::Footer => BlockContent::Footer(serde_json::from_value(data)?),
        })
    }

    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            BlockContent::Header(_) => Some(BlockKind::Header),
            BlockContent::Text(_) => Some(BlockKind::Text),
            BlockContent::Image(_) => Some(BlockKind::Image),
            BlockContent::Button(_) => Some(BlockKind::Button),
            BlockContent::Spacer => Some(BlockKind::Spacer),
            BlockContent::Footer(_) => Some(BlockKind::Footer),
            BlockContent::Unknown { .. } => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            BlockContent::Unknown { kind, .. } => kind,
            known => known.kind().map(BlockKind::as_str).unwrap_or_default(),
        }
    }

    /// The payload as a JSON object, as it is persisted.
    pub fn to_value(&self) -> Value {
        let value = match self {
            BlockContent::Header(d) => serde_json::to_value(d),
            BlockContent::Text(d) => serde_json::to_value(d),
            BlockContent::Image(d) => serde_json::to_value(d),
            BlockContent::Button(d) => serde_json::to_value(d),
            BlockContent::Spacer => Ok(Value::Object(Map::new())),
            BlockContent::Footer(d) => serde_json::to_value(d),
            BlockContent::Unknown { data, .. } => Ok(data.clone()),
        };
        // Plain string structs always serialize.
        value.unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: String,
    pub content: BlockContent,
    pub style: StyleMap,
}

#[derive(Serialize, Deserialize)]
struct RawBlock {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    style: StyleMap,
}

impl TryFrom<RawBlock> for Block {
    type Error = serde_json::Error;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        Ok(Block {
            id: raw.id,
            content: BlockContent::from_parts(&raw.kind, raw.data)?,
            style: raw.style,
        })
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        RawBlock {
            kind: block.content.type_name().to_string(),
            data: block.content.to_value(),
            id: block.id,
            style: block.style,
        }
    }
}

impl Block {
    pub fn new(id: impl Into<String>, content: BlockContent) -> Self {
        Self {
            id: id.into(),
            content,
            style: StyleMap::new(),
        }
    }

    pub fn with_style(mut self, key: &str, value: impl Into<crate::Scalar>) -> Self {
        self.style.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> Option<BlockKind> {
        self.content.kind()
    }

    /// Set one field of the data payload, re-validating the payload shape.
    pub fn set_data_field(&mut self, key: &str, value: Value) -> Result<(), serde_json::Error> {
        let mut data = match self.content.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        data.insert(key.to_string(), value);
        self.content = BlockContent::from_parts(self.content.type_name(), Value::Object(data))?;
        Ok(())
    }
}

/// Generate a fresh block id.
pub fn new_block_id() -> String {
    format!("b_{}", Uuid::new_v4().simple())
}

/// Decode a blocks payload that is either structured JSON or JSON text.
///
/// Text gets exactly one parse step; the result must be a sequence. `null`
/// is treated as an empty sequence.
pub fn decode_blocks(payload: &Value) -> Result<Vec<Block>, ModelError> {
    match payload {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => Ok(Vec::<Block>::deserialize(payload)?),
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(text)?;
            match parsed {
                Value::Array(_) => Ok(Vec::<Block>::deserialize(&parsed)?),
                other => Err(ModelError::NotASequence(json_type_name(&other))),
            }
        }
        other => Err(ModelError::NotASequence(json_type_name(other))),
    }
}

/// Write-time checks: ids non-empty and unique, every type known.
pub fn validate_blocks(blocks: &[Block]) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for (index, block) in blocks.iter().enumerate() {
        if block.id.is_empty() {
            return Err(ModelError::EmptyBlockId(index));
        }
        if !seen.insert(block.id.as_str()) {
            return Err(ModelError::DuplicateBlockId(block.id.clone()));
        }
        if let BlockContent::Unknown { kind, .. } = &block.content {
            return Err(ModelError::UnknownBlockType(kind.clone()));
        }
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
