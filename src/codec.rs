// SMPP v3.4 Codec - Separates parsing/encoding logic from domain models
//
// Each PDU implements Encodable/Decodable; the registry maps command ids to
// decoders so the session engine only ever sees typed `Frame`s.

use crate::datatypes::{
    Bind, BindResponse, CommandId, CommandStatus, DeliverSm, DeliverSmResponse, EnquireLink,
    EnquireLinkResponse, GenericNack, QuerySm, QuerySmResponse, SubmitSm, SubmitSmResponse, Tlv,
    Unbind, UnbindResponse,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::OnceLock;
use thiserror::Error;

/// Maximum allowed PDU size to prevent memory exhaustion attacks
pub const MAX_PDU_SIZE: u32 = 65536; // 64KB

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
#[derive(Debug, Clone, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Header for encoding; `command_length` is back-patched by `Encodable::to_bytes`.
    pub fn new(command_id: CommandId, command_status: CommandStatus, sequence_number: u32) -> Self {
        Self {
            command_length: 0,
            command_id,
            command_status,
            sequence_number,
        }
    }

    /// Decode PDU header from buffer with validation
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id_raw = buf.get_u32();
        let command_status_raw = buf.get_u32();
        let sequence_number = buf.get_u32();

        if !(Self::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        let command_id = CommandId::try_from(command_id_raw)
            .map_err(|_| CodecError::InvalidCommandId(command_id_raw))?;
        let command_status = CommandStatus::from(command_status_raw);

        // Requests must carry command_status = 0
        if !command_id.is_response() && command_status != CommandStatus::Ok {
            return Err(CodecError::InvalidRequestStatus {
                command_id,
                command_status,
            });
        }

        // generic_nack may legitimately carry 0 when the offending sequence was unreadable
        let reserved = sequence_number == 0xFFFF_FFFF
            || (sequence_number == 0 && command_id != CommandId::GenericNack);
        if reserved {
            return Err(CodecError::ReservedSequenceNumber(sequence_number));
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status.into());
        buf.put_u32(self.sequence_number);
    }
}

/// Trait for types that can be encoded to bytes
pub trait Encodable {
    /// Encode this PDU to the buffer
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Calculate the encoded size without keeping the encoding
    fn encoded_size(&self) -> usize {
        let mut buf = BytesMut::new();
        self.encode(&mut buf).map(|_| buf.len()).unwrap_or(0)
    }

    /// Encode into a fresh buffer and fix up the command_length field.
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;

        if buf.len() >= 4 {
            let length = buf.len() as u32;
            buf[0..4].copy_from_slice(&length.to_be_bytes());
        }

        Ok(buf.freeze())
    }
}

/// Trait for types that can be decoded from bytes
pub trait Decodable: Sized {
    /// Decode this PDU from the buffer after header
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    /// The command ids this type decodes. Bind PDUs share one body layout
    /// across three command ids.
    fn command_ids() -> &'static [CommandId];

    /// Validate the header is appropriate for this PDU type
    fn validate_header(header: &PduHeader) -> Result<(), CodecError> {
        let expected = Self::command_ids();
        if !expected.contains(&header.command_id) {
            return Err(CodecError::UnexpectedCommandId {
                expected: expected[0],
                actual: header.command_id,
            });
        }
        Ok(())
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Invalid command_id: {0:#x}")]
    InvalidCommandId(u32),

    #[error("Invalid PDU length: {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("Request PDU {command_id:?} has non-zero status: {command_status:?}")]
    InvalidRequestStatus {
        command_id: CommandId,
        command_status: CommandStatus,
    },

    #[error("Reserved sequence number: {0} (0 and 0xFFFFFFFF are reserved)")]
    ReservedSequenceNumber(u32),

    #[error("Unexpected command_id: expected {expected:?}, got {actual:?}")]
    UnexpectedCommandId {
        expected: CommandId,
        actual: CommandId,
    },

    #[error("Field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("TLV parsing error: {0}")]
    TlvError(String),

    #[error("UTF-8 decoding error in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// A complete PDU was framed but could not be decoded. The bytes have
    /// been consumed, so the stream is still usable.
    #[error("Rejected PDU {command_id:#x} with sequence number {sequence_number}: {source}")]
    Rejected {
        command_id: u32,
        sequence_number: u32,
        #[source]
        source: Box<CodecError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert codec errors to appropriate SMPP command_status codes
impl CodecError {
    pub fn to_command_status(&self) -> CommandStatus {
        match self {
            CodecError::InvalidPduLength { .. } => CommandStatus::InvalidCommandLength,
            CodecError::InvalidCommandId(_) => CommandStatus::InvalidCommandId,
            CodecError::FieldValidation { field, .. } => match *field {
                "source_addr" => CommandStatus::InvalidSourceAddress,
                "destination_addr" => CommandStatus::InvalidDestinationAddress,
                "short_message" => CommandStatus::InvalidMsgLength,
                _ => CommandStatus::SystemError,
            },
            CodecError::TlvError(_) => CommandStatus::ErrorInOptionalPartofPduBody,
            CodecError::Rejected { source, .. } => source.to_command_status(),
            _ => CommandStatus::SystemError,
        }
    }
}

/// Decode a variable length, NUL terminated C-Octet String.
///
/// `max_len` includes the terminator, as the SMPP field tables do.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field: &'static str,
) -> Result<String, CodecError> {
    let remaining = &buf.get_ref()[buf.position() as usize..];
    let window = &remaining[..remaining.len().min(max_len)];

    let Some(end) = window.iter().position(|&b| b == 0) else {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!("missing NUL terminator within {max_len} octets"),
        });
    };

    let value = String::from_utf8(window[..end].to_vec())
        .map_err(|source| CodecError::Utf8Error { field, source })?;
    buf.advance(end + 1);
    Ok(value)
}

/// Encode a C-Octet String; `max_len` includes the terminator.
pub fn encode_cstring(
    buf: &mut BytesMut,
    value: &str,
    max_len: usize,
    field: &'static str,
) -> Result<(), CodecError> {
    if value.len() >= max_len {
        return Err(CodecError::FieldValidation {
            field,
            reason: format!(
                "{} octets exceeds maximum of {} (plus NUL terminator)",
                value.len(),
                max_len - 1
            ),
        });
    }
    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
    Ok(())
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Decode a 16-bit big-endian integer
pub fn decode_u16(buf: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u16())
}

/// Decode a 32-bit big-endian integer
pub fn decode_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u32())
}

/// Decode exactly `len` octets
pub fn decode_octets(buf: &mut Cursor<&[u8]>, len: usize) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.copy_to_bytes(len))
}

/// Decode the optional parameters that run to the end of the PDU body
pub fn decode_tlvs(buf: &mut Cursor<&[u8]>) -> Result<Vec<Tlv>, CodecError> {
    let mut tlvs = Vec::new();
    while buf.has_remaining() {
        tlvs.push(Tlv::decode(buf)?);
    }
    Ok(tlvs)
}

/// Generic frame type that can hold any PDU the ESME exchanges
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    // Bind PDUs, all three bind types share a layout
    Bind(Bind),
    BindResp(BindResponse),

    // Message PDUs
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResponse),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResponse),
    QuerySm(QuerySm),
    QuerySmResp(QuerySmResponse),

    // Keep-alive PDUs
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResponse),

    // Session management PDUs
    Unbind(Unbind),
    UnbindResp(UnbindResponse),
    GenericNack(GenericNack),

    /// A valid command id this crate has no decoder for; the body is kept as-is.
    Unknown { header: PduHeader, body: Bytes },
}

/// Registry of PDU decoders for extensible parsing
type DecoderFn =
    Box<dyn Fn(PduHeader, &mut Cursor<&[u8]>) -> Result<Frame, CodecError> + Send + Sync>;

pub struct PduRegistry {
    decoders: HashMap<CommandId, DecoderFn>,
}

impl PduRegistry {
    /// Create a new registry with the PDUs an ESME exchanges registered
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };

        registry.register_pdu::<Bind, _>(Frame::Bind);
        registry.register_pdu::<BindResponse, _>(Frame::BindResp);

        registry.register_pdu::<SubmitSm, _>(|pdu| Frame::SubmitSm(Box::new(pdu)));
        registry.register_pdu::<SubmitSmResponse, _>(Frame::SubmitSmResp);
        registry.register_pdu::<DeliverSm, _>(|pdu| Frame::DeliverSm(Box::new(pdu)));
        registry.register_pdu::<DeliverSmResponse, _>(Frame::DeliverSmResp);
        registry.register_pdu::<QuerySm, _>(Frame::QuerySm);
        registry.register_pdu::<QuerySmResponse, _>(Frame::QuerySmResp);

        registry.register_pdu::<EnquireLink, _>(Frame::EnquireLink);
        registry.register_pdu::<EnquireLinkResponse, _>(Frame::EnquireLinkResp);
        registry.register_pdu::<Unbind, _>(Frame::Unbind);
        registry.register_pdu::<UnbindResponse, _>(Frame::UnbindResp);
        registry.register_pdu::<GenericNack, _>(Frame::GenericNack);

        registry
    }

    /// Shared registry used by `Frame::parse`
    pub fn global() -> &'static PduRegistry {
        static REGISTRY: OnceLock<PduRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PduRegistry::new)
    }

    /// Register a PDU type under every command id it decodes
    fn register_pdu<T, F>(&mut self, frame_constructor: F)
    where
        T: Decodable + 'static,
        F: Fn(T) -> Frame + Clone + Send + Sync + 'static,
    {
        for &command_id in T::command_ids() {
            let constructor = frame_constructor.clone();
            let decoder = Box::new(move |header: PduHeader, buf: &mut Cursor<&[u8]>| {
                let pdu = T::decode(header, buf)?;
                Ok(constructor(pdu))
            });
            self.decoders.insert(command_id, decoder);
        }
    }

    /// Decode a PDU given its header and body
    pub fn decode_pdu(
        &self,
        header: PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Frame, CodecError> {
        match self.decoders.get(&header.command_id) {
            Some(decoder) => decoder(header, buf),
            None => {
                let body = buf.copy_to_bytes(buf.remaining());
                Ok(Frame::Unknown { header, body })
            }
        }
    }

    /// Check if a command_id is registered
    pub fn is_registered(&self, command_id: CommandId) -> bool {
        self.decoders.contains_key(&command_id)
    }
}

impl Default for PduRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Get the command_id for this frame
    pub fn command_id(&self) -> CommandId {
        match self {
            Frame::Bind(pdu) => pdu.bind_type.command_id(),
            Frame::BindResp(pdu) => pdu.bind_type.response_command_id(),
            Frame::SubmitSm(_) => CommandId::SubmitSm,
            Frame::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Frame::DeliverSm(_) => CommandId::DeliverSm,
            Frame::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Frame::QuerySm(_) => CommandId::QuerySm,
            Frame::QuerySmResp(_) => CommandId::QuerySmResp,
            Frame::EnquireLink(_) => CommandId::EnquireLink,
            Frame::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Frame::Unbind(_) => CommandId::Unbind,
            Frame::UnbindResp(_) => CommandId::UnbindResp,
            Frame::GenericNack(_) => CommandId::GenericNack,
            Frame::Unknown { header, .. } => header.command_id,
        }
    }

    /// Get the sequence number for this frame
    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::Bind(pdu) => pdu.sequence_number,
            Frame::BindResp(pdu) => pdu.sequence_number,
            Frame::SubmitSm(pdu) => pdu.sequence_number,
            Frame::SubmitSmResp(pdu) => pdu.sequence_number,
            Frame::DeliverSm(pdu) => pdu.sequence_number,
            Frame::DeliverSmResp(pdu) => pdu.sequence_number,
            Frame::QuerySm(pdu) => pdu.sequence_number,
            Frame::QuerySmResp(pdu) => pdu.sequence_number,
            Frame::EnquireLink(pdu) => pdu.sequence_number,
            Frame::EnquireLinkResp(pdu) => pdu.sequence_number,
            Frame::Unbind(pdu) => pdu.sequence_number,
            Frame::UnbindResp(pdu) => pdu.sequence_number,
            Frame::GenericNack(pdu) => pdu.sequence_number,
            Frame::Unknown { header, .. } => header.sequence_number,
        }
    }

    /// Check if this frame is a response PDU
    pub fn is_response(&self) -> bool {
        self.command_id().is_response()
    }

    /// Encode the wrapped PDU
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        match self {
            Frame::Bind(pdu) => pdu.to_bytes(),
            Frame::BindResp(pdu) => pdu.to_bytes(),
            Frame::SubmitSm(pdu) => pdu.to_bytes(),
            Frame::SubmitSmResp(pdu) => pdu.to_bytes(),
            Frame::DeliverSm(pdu) => pdu.to_bytes(),
            Frame::DeliverSmResp(pdu) => pdu.to_bytes(),
            Frame::QuerySm(pdu) => pdu.to_bytes(),
            Frame::QuerySmResp(pdu) => pdu.to_bytes(),
            Frame::EnquireLink(pdu) => pdu.to_bytes(),
            Frame::EnquireLinkResp(pdu) => pdu.to_bytes(),
            Frame::Unbind(pdu) => pdu.to_bytes(),
            Frame::UnbindResp(pdu) => pdu.to_bytes(),
            Frame::GenericNack(pdu) => pdu.to_bytes(),
            Frame::Unknown { header, body } => {
                let mut buf = BytesMut::with_capacity(PduHeader::SIZE + body.len());
                PduHeader {
                    command_length: (PduHeader::SIZE + body.len()) as u32,
                    ..header.clone()
                }
                .encode(&mut buf);
                buf.put_slice(body);
                Ok(buf.freeze())
            }
        }
    }

    /// Check whether `buf` starts with a complete PDU and return its length.
    ///
    /// `Incomplete` is an expected runtime condition, not a failure.
    pub fn check(buf: &[u8]) -> Result<usize, CodecError> {
        if buf.len() < PduHeader::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if !(PduHeader::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        if buf.len() < command_length as usize {
            return Err(CodecError::Incomplete);
        }

        Ok(command_length as usize)
    }

    /// Parse one PDU. The cursor must cover exactly that PDU, so bodies can
    /// read optional parameters up to the end of the buffer.
    pub fn parse(buf: &mut Cursor<&[u8]>) -> Result<Frame, CodecError> {
        let header = PduHeader::decode(buf)?;
        PduRegistry::global().decode_pdu(header, buf)
    }

    /// Decode the single PDU at the start of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Frame, CodecError> {
        let len = Frame::check(bytes)?;
        let mut cursor = Cursor::new(&bytes[..len]);
        Frame::parse(&mut cursor)
    }

    /// Raw command_id of a framed but undecodable PDU
    pub fn peek_command_id(bytes: &[u8]) -> Option<u32> {
        bytes
            .get(4..8)
            .map(|id| u32::from_be_bytes([id[0], id[1], id[2], id[3]]))
    }

    /// Sequence number of a framed but undecodable PDU
    pub fn peek_sequence_number(bytes: &[u8]) -> Option<u32> {
        bytes
            .get(12..16)
            .map(|seq| u32::from_be_bytes([seq[0], seq[1], seq[2], seq[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdu_header_encode_decode() {
        let header = PduHeader {
            command_length: 16,
            command_id: CommandId::EnquireLink,
            command_status: CommandStatus::Ok,
            sequence_number: 42,
        };

        let mut buf = BytesMut::new();
        header.encode(&mut buf);

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = PduHeader::decode(&mut cursor).unwrap();

        assert_eq!(header, decoded);
    }

    #[test]
    fn decode_cstring_variable_length() {
        let data = b"hello\0world\0";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(decode_cstring(&mut cursor, 16, "first").unwrap(), "hello");
        assert_eq!(cursor.position(), 6);
        assert_eq!(decode_cstring(&mut cursor, 16, "second").unwrap(), "world");
        assert!(!cursor.has_remaining());
    }

    #[test]
    fn decode_cstring_without_terminator_is_rejected() {
        let data = b"abcdefgh";
        let mut cursor = Cursor::new(&data[..]);
        let result = decode_cstring(&mut cursor, 6, "system_id");
        assert!(matches!(
            result,
            Err(CodecError::FieldValidation { field: "system_id", .. })
        ));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn encode_cstring_enforces_maximum() {
        let mut buf = BytesMut::new();
        encode_cstring(&mut buf, "hello", 6, "test").unwrap();
        assert_eq!(buf.as_ref(), b"hello\0");

        let result = encode_cstring(&mut buf, "toolong", 6, "test");
        assert!(matches!(result, Err(CodecError::FieldValidation { .. })));
    }

    #[test]
    fn pdu_header_validation() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x08, // command_length too small
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        let mut cursor = Cursor::new(data);
        let result = PduHeader::decode(&mut cursor);
        assert!(matches!(result, Err(CodecError::InvalidPduLength { .. })));

        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x00, // sequence_number (reserved)
        ];
        let mut cursor = Cursor::new(data);
        let result = PduHeader::decode(&mut cursor);
        assert!(matches!(result, Err(CodecError::ReservedSequenceNumber(0))));
    }

    #[test]
    fn request_with_error_status_is_rejected() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x15, // enquire_link
            0x00, 0x00, 0x00, 0x08, // system error
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        let mut cursor = Cursor::new(data);
        let result = PduHeader::decode(&mut cursor);
        assert!(matches!(result, Err(CodecError::InvalidRequestStatus { .. })));
    }

    #[test]
    fn command_id_is_response() {
        assert!(!CommandId::EnquireLink.is_response());
        assert!(CommandId::EnquireLinkResp.is_response());
        assert!(!CommandId::SubmitSm.is_response());
        assert!(CommandId::SubmitSmResp.is_response());
    }

    #[test]
    fn check_reports_incomplete_until_whole_pdu_buffered() {
        let bytes = EnquireLink::new(7).to_bytes().unwrap();
        assert!(matches!(Frame::check(&bytes[..10]), Err(CodecError::Incomplete)));
        assert!(matches!(Frame::check(&bytes[..15]), Err(CodecError::Incomplete)));
        assert_eq!(Frame::check(&bytes).unwrap(), 16);
    }

    #[test]
    fn check_rejects_oversized_length() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0x15, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            Frame::check(&data),
            Err(CodecError::InvalidPduLength { .. })
        ));
    }

    #[test]
    fn registry_decodes_every_registered_pdu() {
        let registry = PduRegistry::new();
        for command_id in [
            CommandId::BindTransmitter,
            CommandId::BindReceiverResp,
            CommandId::BindTransceiver,
            CommandId::SubmitSm,
            CommandId::DeliverSm,
            CommandId::DeliverSmResp,
            CommandId::QuerySmResp,
            CommandId::EnquireLink,
            CommandId::UnbindResp,
            CommandId::GenericNack,
        ] {
            assert!(registry.is_registered(command_id), "{command_id:?}");
        }
        assert!(!registry.is_registered(CommandId::Outbind));
    }

    #[test]
    fn unregistered_command_decodes_as_unknown() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x13, // command_length
            0x00, 0x00, 0x00, 0x0B, // outbind
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
            b'i', b'd', 0x00, // body
        ];
        let frame = Frame::decode(data).unwrap();
        let Frame::Unknown { header, body } = &frame else {
            panic!("expected unknown frame");
        };
        assert_eq!(header.command_id, CommandId::Outbind);
        assert_eq!(body.as_ref(), b"id\0");
        assert_eq!(frame.sequence_number(), 1);
        assert_eq!(frame.to_bytes().unwrap().as_ref(), data);
    }

    #[test]
    fn invalid_command_id_is_an_error() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x77, // reserved command id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x05, // sequence_number
        ];
        assert!(matches!(
            Frame::decode(data),
            Err(CodecError::InvalidCommandId(0x77))
        ));
        assert_eq!(Frame::peek_sequence_number(data), Some(5));
    }

    #[test]
    fn frame_accessors() {
        let frame = Frame::EnquireLink(EnquireLink::new(42));
        assert_eq!(frame.command_id(), CommandId::EnquireLink);
        assert_eq!(frame.sequence_number(), 42);
        assert!(!frame.is_response());

        let frame = Frame::EnquireLinkResp(EnquireLinkResponse::new(43));
        assert_eq!(frame.command_id(), CommandId::EnquireLinkResp);
        assert_eq!(frame.sequence_number(), 43);
        assert!(frame.is_response());
    }

    #[test]
    fn header_only_frames_survive_the_wire() {
        for frame in [
            Frame::EnquireLink(EnquireLink::new(1)),
            Frame::Unbind(Unbind::new(2)),
            Frame::UnbindResp(UnbindResponse::new(3)),
            Frame::GenericNack(GenericNack::error(4, CommandStatus::InvalidCommandId)),
        ] {
            let bytes = frame.to_bytes().unwrap();
            assert_eq!(bytes.len(), PduHeader::SIZE);
            assert_eq!(Frame::decode(&bytes).unwrap(), frame);
        }
    }
}
