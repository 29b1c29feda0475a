//! Byte encodings for cached values
//!
//! Each [`Backend`] turns one [`Value`] into the bytes of one chunk file and
//! back. The tag is supplied by the caller at both write and read time;
//! files carry no record of which backend wrote them beyond the extension.

use crate::error::{CacheError, CacheResult};
use crate::value::{Dtype, NumericArray, Value};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Magic prefix of generic-object files
const GENERIC_MAGIC: [u8; 8] = *b"MEMOPKL\0";
const GENERIC_FORMAT_VERSION: u32 = 1;
const GENERIC_HEADER_LEN: usize = GENERIC_MAGIC.len() + 4;

/// Serialization backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Any value, versioned binary envelope; also reads legacy JSON text
    GenericObject,
    /// Primitives and containers only; compact, no compatibility guarantee
    CompiledCode,
    /// Headerless concatenation of numeric array buffers
    RawNumeric,
}

impl Backend {
    /// All backends in listing order
    pub const ALL: [Backend; 3] = [Self::GenericObject, Self::CompiledCode, Self::RawNumeric];

    /// File extension for chunk files written by this backend
    pub fn extension(self) -> &'static str {
        match self {
            Self::GenericObject => "pkl",
            Self::CompiledCode => "msl",
            Self::RawNumeric => "bin",
        }
    }

    /// Look up a backend by chunk file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.extension() == ext)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::GenericObject => "generic-object",
            Self::CompiledCode => "compiled-code",
            Self::RawNumeric => "raw-numeric",
        }
    }

    /// Encode a value into the bytes of one chunk file
    pub fn encode(self, value: &Value) -> CacheResult<Vec<u8>> {
        match self {
            Self::GenericObject => encode_generic(value),
            Self::CompiledCode => encode_compiled(value),
            Self::RawNumeric => encode_raw(value),
        }
    }

    /// Decode the bytes of one chunk file
    pub fn decode(self, bytes: &[u8], options: &DecodeOptions) -> CacheResult<Value> {
        match self {
            Self::GenericObject => decode_generic(bytes),
            Self::CompiledCode => decode_compiled(bytes),
            Self::RawNumeric => match options {
                DecodeOptions::RawNumeric(layout) => decode_raw(bytes, layout),
                DecodeOptions::None => Err(CacheError::MissingDecodeOption { backend: self }),
            },
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Backend {
    type Err = CacheError;

    /// Accepts the kebab-case name or the file extension
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.name() == tag || b.extension() == tag)
            .ok_or_else(|| CacheError::UnsupportedBackend(s.to_string()))
    }
}

/// Layout of raw numeric data: element type and elements per array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLayout {
    pub dtype: Dtype,
    pub length: NonZeroUsize,
}

impl RawLayout {
    pub fn new(dtype: Dtype, length: NonZeroUsize) -> Self {
        Self { dtype, length }
    }

    /// Bytes occupied by one array, or `None` if that overflows `usize`
    pub fn slice_size(&self) -> Option<usize> {
        self.dtype.itemsize().checked_mul(self.length.get())
    }
}

/// Backend-specific decode parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeOptions {
    /// Self-describing backends need nothing
    #[default]
    None,
    RawNumeric(RawLayout),
}

impl From<RawLayout> for DecodeOptions {
    fn from(layout: RawLayout) -> Self {
        Self::RawNumeric(layout)
    }
}

fn generic_options() -> impl Options + Copy {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

fn compiled_options() -> impl Options + Copy {
    bincode::DefaultOptions::new()
        .with_varint_encoding()
        .with_native_endian()
}

fn encode_generic(value: &Value) -> CacheResult<Vec<u8>> {
    let mut out = Vec::with_capacity(GENERIC_HEADER_LEN);
    out.extend_from_slice(&GENERIC_MAGIC);
    out.extend_from_slice(&GENERIC_FORMAT_VERSION.to_le_bytes());
    generic_options()
        .serialize_into(&mut out, value)
        .map_err(|e| CacheError::UnencodableValue {
            backend: Backend::GenericObject,
            reason: e.to_string(),
        })?;
    Ok(out)
}

fn decode_generic(bytes: &[u8]) -> CacheResult<Value> {
    let decode_err = |reason: String| CacheError::Decode {
        backend: Backend::GenericObject,
        reason,
    };

    if !bytes.starts_with(&GENERIC_MAGIC) {
        // Files written before the binary envelope existed are JSON text.
        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| decode_err(format!("not a binary object file or legacy JSON: {e}")))?;
        return Ok(Value::from_json(json));
    }

    let mut version = [0u8; 4];
    let header = bytes
        .get(GENERIC_MAGIC.len()..GENERIC_HEADER_LEN)
        .ok_or_else(|| decode_err("truncated header".to_string()))?;
    version.copy_from_slice(header);
    let version = u32::from_le_bytes(version);
    if version != GENERIC_FORMAT_VERSION {
        return Err(decode_err(format!(
            "unsupported format version: expected {GENERIC_FORMAT_VERSION}, found {version}"
        )));
    }

    let payload = &bytes[GENERIC_HEADER_LEN..];
    generic_options()
        .with_limit(payload.len() as u64)
        .deserialize(payload)
        .map_err(|e| decode_err(e.to_string()))
}

/// Reject values outside the compiled-code subset
fn check_compiled(value: &Value) -> CacheResult<()> {
    let unencodable = |reason: String| CacheError::UnencodableValue {
        backend: Backend::CompiledCode,
        reason,
    };

    match value {
        Value::None
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Str(_)
        | Value::Bytes(_) => Ok(()),
        Value::List(items) | Value::Tuple(items) => items.iter().try_for_each(check_compiled),
        Value::Map(pairs) => pairs.iter().try_for_each(|(k, v)| {
            check_compiled(k)?;
            check_compiled(v)
        }),
        Value::Object { class, .. } => Err(unencodable(format!(
            "records are not supported (found {class})"
        ))),
        Value::Array(_) => Err(unencodable(
            "numeric arrays are not supported".to_string(),
        )),
    }
}

fn encode_compiled(value: &Value) -> CacheResult<Vec<u8>> {
    check_compiled(value)?;
    compiled_options()
        .serialize(value)
        .map_err(|e| CacheError::UnencodableValue {
            backend: Backend::CompiledCode,
            reason: e.to_string(),
        })
}

fn decode_compiled(bytes: &[u8]) -> CacheResult<Value> {
    compiled_options()
        .with_limit(bytes.len() as u64)
        .deserialize(bytes)
        .map_err(|e| CacheError::Decode {
            backend: Backend::CompiledCode,
            reason: e.to_string(),
        })
}

fn encode_raw(value: &Value) -> CacheResult<Vec<u8>> {
    let unencodable = |reason: String| CacheError::UnencodableValue {
        backend: Backend::RawNumeric,
        reason,
    };

    let mut out = Vec::new();
    match value {
        Value::Array(arr) => arr.write_ne_bytes(&mut out),
        Value::List(items) | Value::Tuple(items) => {
            let mut shape = None;
            for item in items {
                let Value::Array(arr) = item else {
                    return Err(unencodable(format!(
                        "sequence elements must be numeric arrays, found {}",
                        item.kind()
                    )));
                };
                let item_shape = (arr.dtype(), arr.len());
                match shape {
                    None => shape = Some(item_shape),
                    Some(expected) if expected != item_shape => {
                        return Err(unencodable(format!(
                            "arrays must share one dtype and length: expected {}x{}, found {}x{}",
                            expected.0, expected.1, item_shape.0, item_shape.1
                        )));
                    }
                    Some(_) => {}
                }
                arr.write_ne_bytes(&mut out);
            }
        }
        other => {
            return Err(unencodable(format!(
                "expected a numeric array or a sequence of arrays, found {}",
                other.kind()
            )));
        }
    }
    Ok(out)
}

fn decode_raw(bytes: &[u8], layout: &RawLayout) -> CacheResult<Value> {
    let slice = layout
        .slice_size()
        .ok_or_else(|| CacheError::RawLayoutOverflow {
            dtype: layout.dtype,
            length: layout.length.get(),
        })?;
    if bytes.len() % slice != 0 {
        return Err(CacheError::MalformedRawNumericData {
            len: bytes.len(),
            slice,
        });
    }

    Ok(Value::List(
        bytes
            .chunks_exact(slice)
            .map(|chunk| Value::Array(NumericArray::from_ne_bytes(layout.dtype, chunk)))
            .collect(),
    ))
}
