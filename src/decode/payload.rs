//! Init payload wire format.
//!
//! A payload is one little-endian byte stream describing the initial
//! property values for a batch of freshly created components:
//!
//! ```text
//! payload := entry_count:u32  entry*
//! entry   := value_count:u16  value*
//! value   := tag:u8 body
//! ```
//!
//! Values appear in the owning type's frozen property order, which is
//! how the stream gets away with carrying no property names. A tag of
//! zero means "omitted": the slot keeps its registered default.
//!
//! Reference bodies carry raw native ids; zero is the unset sentinel.
//! Color bodies are self-describing: a bytes-per-channel prefix followed
//! by four packed channels.

use smallvec::SmallVec;
use thiserror::Error;

// Value tags
const TAG_OMITTED: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_FLOAT: u8 = 0x03;
const TAG_STRING: u8 = 0x04;
const TAG_ENUM: u8 = 0x05;
const TAG_VEC2: u8 = 0x06;
const TAG_VEC3: u8 = 0x07;
const TAG_VEC4: u8 = 0x08;
const TAG_COLOR: u8 = 0x09;
const TAG_REF: u8 = 0x0A;

/// Structural defect in an init payload. Any of these aborts the whole
/// batch; a payload that cannot be framed cannot be partially trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The stream ended inside a value.
    #[error("payload truncated at byte {offset}")]
    UnexpectedEof {
        /// Byte offset where more data was required
        offset: usize,
    },

    /// An unassigned tag byte.
    #[error("unknown value tag {tag:#04x} at byte {offset}")]
    UnknownTag {
        /// The offending tag
        tag: u8,
        /// Byte offset of the tag
        offset: usize,
    },

    /// A string body that is not valid UTF-8.
    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 {
        /// Byte offset of the string body
        offset: usize,
    },

    /// A color channel width other than 1 or 2 bytes.
    #[error("unsupported color channel width {width}")]
    BadChannelWidth {
        /// Declared bytes per channel
        width: u8,
    },

    /// The payload's entry count disagrees with the id batch it came with.
    #[error("payload has {entries} entries for {ids} component ids")]
    EntryCountMismatch {
        /// Entries declared by the payload
        entries: usize,
        /// Component ids in the batch
        ids: usize,
    },
}

/// One decoded wire value, still untyped against any schema.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// Slot keeps its registered default.
    Omitted,
    /// Boolean body.
    Bool(bool),
    /// 32-bit integer body.
    Int(i32),
    /// 32-bit float body.
    Float(f32),
    /// Length-prefixed UTF-8 body.
    Str(String),
    /// Enum selection index.
    Enum(u32),
    /// Two-float body.
    Vec2([f32; 2]),
    /// Three-float body.
    Vec3([f32; 3]),
    /// Four-float body.
    Vec4([f32; 4]),
    /// Packed color body, not yet normalized.
    Color {
        /// Channel values as read, one per RGBA channel.
        channels: [u32; 4],
        /// Width of each packed channel, 1 or 2 bytes.
        bytes_per_channel: u8,
    },
    /// Raw reference id; zero means unset.
    Ref(i32),
}

impl WireValue {
    /// Short label for diagnostics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Omitted => "omitted",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Enum(_) => "enum",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Color { .. } => "color",
            Self::Ref(_) => "ref",
        }
    }
}

/// Wire values of one component entry, in property order.
pub type WireEntry = SmallVec<[WireValue; 8]>;

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Cursor over a payload byte stream.
pub struct PayloadReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> PayloadReader<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current cursor position.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], PayloadError> {
        let end = self.offset.checked_add(count).filter(|&e| e <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.offset..end];
                self.offset = end;
                Ok(slice)
            }
            None => Err(PayloadError::UnexpectedEof {
                offset: self.offset,
            }),
        }
    }

    fn read_u8(&mut self) -> Result<u8, PayloadError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, PayloadError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, PayloadError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&mut self) -> Result<i32, PayloadError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_f32(&mut self) -> Result<f32, PayloadError> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_string(&mut self) -> Result<String, PayloadError> {
        let length = self.read_u32()? as usize;
        let body_offset = self.offset;
        let bytes = self.take(length)?;
        let text = std::str::from_utf8(bytes).map_err(|_| PayloadError::InvalidUtf8 {
            offset: body_offset,
        })?;
        Ok(text.to_owned())
    }

    fn read_color(&mut self) -> Result<WireValue, PayloadError> {
        let bytes_per_channel = self.read_u8()?;
        let mut channels = [0u32; 4];
        match bytes_per_channel {
            1 => {
                for channel in &mut channels {
                    *channel = u32::from(self.read_u8()?);
                }
            }
            2 => {
                for channel in &mut channels {
                    *channel = u32::from(self.read_u16()?);
                }
            }
            width => return Err(PayloadError::BadChannelWidth { width }),
        }
        Ok(WireValue::Color {
            channels,
            bytes_per_channel,
        })
    }

    /// Reads one tagged value.
    pub fn read_value(&mut self) -> Result<WireValue, PayloadError> {
        let tag_offset = self.offset;
        let tag = self.read_u8()?;
        match tag {
            TAG_OMITTED => Ok(WireValue::Omitted),
            TAG_BOOL => Ok(WireValue::Bool(self.read_u8()? != 0)),
            TAG_INT => Ok(WireValue::Int(self.read_i32()?)),
            TAG_FLOAT => Ok(WireValue::Float(self.read_f32()?)),
            TAG_STRING => Ok(WireValue::Str(self.read_string()?)),
            TAG_ENUM => Ok(WireValue::Enum(self.read_u32()?)),
            TAG_VEC2 => Ok(WireValue::Vec2([self.read_f32()?, self.read_f32()?])),
            TAG_VEC3 => Ok(WireValue::Vec3([
                self.read_f32()?,
                self.read_f32()?,
                self.read_f32()?,
            ])),
            TAG_VEC4 => Ok(WireValue::Vec4([
                self.read_f32()?,
                self.read_f32()?,
                self.read_f32()?,
                self.read_f32()?,
            ])),
            TAG_COLOR => self.read_color(),
            TAG_REF => Ok(WireValue::Ref(self.read_i32()?)),
            tag => Err(PayloadError::UnknownTag {
                tag,
                offset: tag_offset,
            }),
        }
    }

    /// Reads one entry: a value count followed by that many values.
    pub fn read_entry(&mut self) -> Result<WireEntry, PayloadError> {
        let count = self.read_u16()? as usize;
        let mut entry = WireEntry::with_capacity(count);
        for _ in 0..count {
            entry.push(self.read_value()?);
        }
        Ok(entry)
    }
}

/// Decodes a full payload into per-component wire entries.
///
/// Bytes past the declared entries are ignored; the payload usually
/// lives at the front of a larger staging buffer.
pub fn decode_entries(bytes: &[u8]) -> Result<Vec<WireEntry>, PayloadError> {
    let mut reader = PayloadReader::new(bytes);
    let count = reader.read_u32()? as usize;
    // Each entry needs at least its two count bytes; a count that cannot
    // fit in the remaining stream is rejected before any allocation.
    let remaining = bytes.len().saturating_sub(reader.offset());
    if count > remaining / 2 {
        return Err(PayloadError::UnexpectedEof {
            offset: bytes.len(),
        });
    }
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(reader.read_entry()?);
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Builds payload byte streams, mirroring [`PayloadReader`].
///
/// The production encoder lives on the native side; this one exists for
/// tests, benches and host tooling that stages init batches from Rust.
#[derive(Debug)]
pub struct PayloadWriter {
    buf: Vec<u8>,
    entries: u32,
}

impl Default for PayloadWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Entry count is patched in by `finish`.
            buf: vec![0; 4],
            entries: 0,
        }
    }

    /// Appends one entry.
    pub fn entry(&mut self, values: &[WireValue]) -> &mut Self {
        self.buf.extend_from_slice(&(values.len() as u16).to_le_bytes());
        for value in values {
            self.write_value(value);
        }
        self.entries += 1;
        self
    }

    fn write_value(&mut self, value: &WireValue) {
        match value {
            WireValue::Omitted => self.buf.push(TAG_OMITTED),
            WireValue::Bool(flag) => {
                self.buf.push(TAG_BOOL);
                self.buf.push(u8::from(*flag));
            }
            WireValue::Int(body) => {
                self.buf.push(TAG_INT);
                self.buf.extend_from_slice(&body.to_le_bytes());
            }
            WireValue::Float(body) => {
                self.buf.push(TAG_FLOAT);
                self.buf.extend_from_slice(&body.to_le_bytes());
            }
            WireValue::Str(body) => {
                self.buf.push(TAG_STRING);
                self.buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
                self.buf.extend_from_slice(body.as_bytes());
            }
            WireValue::Enum(index) => {
                self.buf.push(TAG_ENUM);
                self.buf.extend_from_slice(&index.to_le_bytes());
            }
            WireValue::Vec2(body) => {
                self.buf.push(TAG_VEC2);
                self.write_floats(body);
            }
            WireValue::Vec3(body) => {
                self.buf.push(TAG_VEC3);
                self.write_floats(body);
            }
            WireValue::Vec4(body) => {
                self.buf.push(TAG_VEC4);
                self.write_floats(body);
            }
            WireValue::Color {
                channels,
                bytes_per_channel,
            } => {
                debug_assert!(matches!(bytes_per_channel, 1 | 2));
                self.buf.push(TAG_COLOR);
                self.buf.push(*bytes_per_channel);
                for channel in channels {
                    match bytes_per_channel {
                        1 => self.buf.push(*channel as u8),
                        _ => self.buf.extend_from_slice(&(*channel as u16).to_le_bytes()),
                    }
                }
            }
            WireValue::Ref(raw) => {
                self.buf.push(TAG_REF);
                self.buf.extend_from_slice(&raw.to_le_bytes());
            }
        }
    }

    fn write_floats(&mut self, body: &[f32]) {
        for float in body {
            self.buf.extend_from_slice(&float.to_le_bytes());
        }
    }

    /// Finalizes the stream, patching in the entry count.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.buf[0..4].copy_from_slice(&self.entries.to_le_bytes());
        self.buf
    }
}
