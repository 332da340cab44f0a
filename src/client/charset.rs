// ABOUTME: Turns inbound short_message octets into text according to data_coding
// ABOUTME: Declared charsets that fail to decode yield PayloadDecode so the caller can deliver raw bytes

use crate::client::error::EsmeError;
use crate::datatypes::{DataCoding, TextEncoding};
use bytes::Bytes;

/// Payload handed to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    /// Octets that could not be decoded, passed through untouched
    Raw(Bytes),
}

impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, MessageContent::Raw(_))
    }
}

/// Decode `payload` under `data_coding`.
///
/// UCS-2, ASCII and Latin-1 payloads must decode cleanly; failure is a
/// `PayloadDecode` error. 8-bit data with a message class is always `Raw`.
/// Any other scheme is tried as UTF-8 and falls back to `Raw` without an
/// error, since nothing was promised about its bytes.
pub fn decode_payload(data_coding: DataCoding, payload: &Bytes) -> Result<MessageContent, EsmeError> {
    let decode_error = |reason: String| EsmeError::PayloadDecode {
        data_coding,
        reason,
    };

    match data_coding.text_encoding() {
        TextEncoding::Utf16Be => {
            if payload.len() % 2 != 0 {
                return Err(decode_error(format!(
                    "odd payload length {} for a 16-bit encoding",
                    payload.len()
                )));
            }
            let units: Vec<u16> = payload
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map(MessageContent::Text)
                .map_err(|e| decode_error(e.to_string()))
        }
        TextEncoding::Ascii => match payload.iter().position(|b| !b.is_ascii()) {
            Some(at) => Err(decode_error(format!(
                "non-ASCII octet {:#04x} at offset {at}",
                payload[at]
            ))),
            None => Ok(MessageContent::Text(
                payload.iter().map(|&b| char::from(b)).collect(),
            )),
        },
        TextEncoding::Latin1 => Ok(MessageContent::Text(
            payload.iter().map(|&b| char::from(b)).collect(),
        )),
        TextEncoding::Octets => Ok(MessageContent::Raw(payload.clone())),
        TextEncoding::Unspecified => Ok(match std::str::from_utf8(payload) {
            Ok(text) => MessageContent::Text(text.to_string()),
            Err(_) => MessageContent::Raw(payload.clone()),
        }),
    }
}
