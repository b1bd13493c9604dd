//! `application/vnd.amazon.eventstream` framing
//!
//! ```text
//! [total_len u32][headers_len u32][prelude_crc u32][headers][payload][message_crc u32]
//! ```
//!
//! CRCs are not verified; the transport below already guarantees integrity.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::core::providers::unified_provider::ProviderError;
use crate::core::streaming::types::VendorEvent;

const PROVIDER: &str = "bedrock";
const PRELUDE_LEN: usize = 12;
const CRC_LEN: usize = 4;
const MIN_MESSAGE_LEN: usize = PRELUDE_LEN + CRC_LEN;

/// Header value types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    ByteArray(Bytes),
    String(String),
    Timestamp(i64),
    Uuid([u8; 16]),
}

/// One deframed event-stream message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStreamMessage {
    pub headers: Vec<(String, HeaderValue)>,
    pub payload: Bytes,
}

impl EventStreamMessage {
    /// String header by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|(key, value)| match value {
            HeaderValue::String(value) if key == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Event name: `:event-type` for events, `:exception-type` for exceptions
    pub fn event_type(&self) -> Option<&str> {
        match self.header(":message-type") {
            Some("exception") => self.header(":exception-type"),
            Some("error") => self.header(":error-code"),
            _ => self.header(":event-type"),
        }
    }

    pub fn to_vendor_event(&self) -> VendorEvent {
        VendorEvent::new(
            self.event_type(),
            String::from_utf8_lossy(&self.payload).into_owned(),
        )
    }

    /// Encode with string headers only; CRC fields are written as zero
    ///
    /// Used to build replay captures and fixtures; [`EventStreamDecoder`]
    /// accepts the result.
    pub fn to_bytes(&self) -> Bytes {
        let mut headers = BytesMut::new();
        for (name, value) in &self.headers {
            if let HeaderValue::String(value) = value {
                headers.put_u8(name.len() as u8);
                headers.put_slice(name.as_bytes());
                headers.put_u8(7);
                headers.put_u16(value.len() as u16);
                headers.put_slice(value.as_bytes());
            }
        }

        let total = MIN_MESSAGE_LEN + headers.len() + self.payload.len();
        let mut out = BytesMut::with_capacity(total);
        out.put_u32(total as u32);
        out.put_u32(headers.len() as u32);
        out.put_u32(0);
        out.put_slice(&headers);
        out.put_slice(&self.payload);
        out.put_u32(0);
        out.freeze()
    }

    /// `event` message with the given `:event-type`
    pub fn event(event_type: &str, payload: impl Into<Bytes>) -> Self {
        Self {
            headers: vec![
                (":message-type".to_string(), HeaderValue::String("event".to_string())),
                (":event-type".to_string(), HeaderValue::String(event_type.to_string())),
                (
                    ":content-type".to_string(),
                    HeaderValue::String("application/json".to_string()),
                ),
            ],
            payload: payload.into(),
        }
    }

    /// `exception` message with the given `:exception-type`
    pub fn exception(exception_type: &str, payload: impl Into<Bytes>) -> Self {
        Self {
            headers: vec![
                (":message-type".to_string(), HeaderValue::String("exception".to_string())),
                (
                    ":exception-type".to_string(),
                    HeaderValue::String(exception_type.to_string()),
                ),
            ],
            payload: payload.into(),
        }
    }
}

/// Incremental deframer: push arbitrary byte chunks, get whole messages back
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: BytesMut,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return every message now complete
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<EventStreamMessage>, ProviderError> {
        self.buffer.extend_from_slice(data);

        let mut messages = Vec::new();
        while self.buffer.len() >= PRELUDE_LEN {
            let total_length = u32::from_be_bytes([
                self.buffer[0],
                self.buffer[1],
                self.buffer[2],
                self.buffer[3],
            ]) as usize;
            if total_length < MIN_MESSAGE_LEN {
                return Err(ProviderError::response_parsing(
                    PROVIDER,
                    format!("Invalid event stream message length {}", total_length),
                ));
            }
            if self.buffer.len() < total_length {
                break;
            }
            let frame = self.buffer.split_to(total_length).freeze();
            messages.push(Self::parse_message(frame)?);
        }
        Ok(messages)
    }

    /// Bytes left over once the transport has ended
    pub fn finish(&self) -> Result<(), ProviderError> {
        if self.buffer.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::response_parsing(
                PROVIDER,
                format!("Truncated event stream message ({} bytes)", self.buffer.len()),
            ))
        }
    }

    fn parse_message(mut frame: Bytes) -> Result<EventStreamMessage, ProviderError> {
        let total_length = frame.get_u32() as usize;
        let headers_length = frame.get_u32() as usize;
        let _prelude_crc = frame.get_u32();

        if PRELUDE_LEN + headers_length + CRC_LEN > total_length {
            return Err(ProviderError::response_parsing(
                PROVIDER,
                "Event stream headers overrun the message",
            ));
        }

        let mut header_bytes = frame.split_to(headers_length);
        let payload_length = total_length - MIN_MESSAGE_LEN - headers_length;
        let payload = frame.split_to(payload_length);

        let mut headers = Vec::new();
        while header_bytes.has_remaining() {
            headers.push(Self::parse_header(&mut header_bytes)?);
        }

        Ok(EventStreamMessage { headers, payload })
    }

    fn parse_header(buf: &mut Bytes) -> Result<(String, HeaderValue), ProviderError> {
        ensure(buf, 1)?;
        let name_length = buf.get_u8() as usize;
        ensure(buf, name_length + 1)?;
        let name = String::from_utf8_lossy(&buf.split_to(name_length)).into_owned();

        let value = match buf.get_u8() {
            0 => HeaderValue::Boolean(true),
            1 => HeaderValue::Boolean(false),
            2 => {
                ensure(buf, 1)?;
                HeaderValue::Byte(buf.get_i8())
            }
            3 => {
                ensure(buf, 2)?;
                HeaderValue::Short(buf.get_i16())
            }
            4 => {
                ensure(buf, 4)?;
                HeaderValue::Integer(buf.get_i32())
            }
            5 => {
                ensure(buf, 8)?;
                HeaderValue::Long(buf.get_i64())
            }
            kind @ (6 | 7) => {
                ensure(buf, 2)?;
                let len = buf.get_u16() as usize;
                ensure(buf, len)?;
                let raw = buf.split_to(len);
                if kind == 6 {
                    HeaderValue::ByteArray(raw)
                } else {
                    HeaderValue::String(String::from_utf8_lossy(&raw).into_owned())
                }
            }
            8 => {
                ensure(buf, 8)?;
                HeaderValue::Timestamp(buf.get_i64())
            }
            9 => {
                ensure(buf, 16)?;
                let mut uuid = [0u8; 16];
                buf.copy_to_slice(&mut uuid);
                HeaderValue::Uuid(uuid)
            }
            other => {
                return Err(ProviderError::response_parsing(
                    PROVIDER,
                    format!("Unknown event stream header type {}", other),
                ));
            }
        };
        Ok((name, value))
    }
}

fn ensure(buf: &Bytes, len: usize) -> Result<(), ProviderError> {
    if buf.remaining() < len {
        Err(ProviderError::response_parsing(PROVIDER, "Truncated event stream header"))
    } else {
        Ok(())
    }
}
