// ABOUTME: Implements SMPP v3.4 query_sm and query_sm_resp PDUs for message status queries
// ABOUTME: Lets an ESME ask the SMSC for the state of a previously submitted message

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
};
use crate::datatypes::bind::{decode_npi, decode_ton};
use crate::datatypes::{CommandId, CommandStatus, NumericPlanIndicator, TypeOfNumber};
use bytes::{Buf, BufMut, BytesMut};
use num_enum::TryFromPrimitive;
use std::io::Cursor;

/// SMPP v3.4 query_sm PDU (Section 4.8.1)
///
/// The SMSC matches on message_id and source_addr, so both should repeat
/// what the original submit_sm and its response carried.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// Message ID returned in the submit_sm_resp
    pub message_id: String,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    /// Source address of the original submit_sm, empty if it was NULL
    pub source_addr: String,
}

impl QuerySm {
    pub fn new(
        sequence_number: u32,
        message_id: impl Into<String>,
        source_addr: impl Into<String>,
    ) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
            source_addr_ton: TypeOfNumber::default(),
            source_addr_npi: NumericPlanIndicator::default(),
            source_addr: source_addr.into(),
        }
    }
}

impl Encodable for QuerySm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(CommandId::QuerySm, self.command_status, self.sequence_number).encode(buf);

        encode_cstring(buf, &self.message_id, 65, "message_id")?;
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, &self.source_addr, 21, "source_addr")?;
        Ok(())
    }
}

impl Decodable for QuerySm {
    fn command_ids() -> &'static [CommandId] {
        &[CommandId::QuerySm]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let message_id = decode_cstring(buf, 65, "message_id")?;
        let source_addr_ton = decode_ton(buf, "source_addr_ton")?;
        let source_addr_npi = decode_npi(buf, "source_addr_npi")?;
        let source_addr = decode_cstring(buf, 21, "source_addr")?;

        Ok(QuerySm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
            source_addr_ton,
            source_addr_npi,
            source_addr,
        })
    }
}

/// Message state values for query_sm_resp and the message_state parameter
/// (Section 5.2.28)
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageState {
    Enroute = 0x01,
    Delivered = 0x02,
    Expired = 0x03,
    Deleted = 0x04,
    Undeliverable = 0x05,
    Accepted = 0x06,
    Unknown = 0x07,
    Rejected = 0x08,
}

impl MessageState {
    /// True once the SMSC will no longer change the state
    pub fn is_final(&self) -> bool {
        !matches!(self, MessageState::Enroute | MessageState::Accepted)
    }
}

/// SMPP v3.4 query_sm_resp PDU (Section 4.8.2)
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    pub message_id: String,

    /// YYMMDDhhmmsstnnp when the message reached a final state, otherwise None
    pub final_date: Option<String>,

    /// None when the SMSC rejected the query and sent no body
    pub message_state: Option<MessageState>,

    /// Network specific error code
    pub error_code: u8,
}

impl QuerySmResponse {
    pub fn new(
        sequence_number: u32,
        message_id: impl Into<String>,
        message_state: MessageState,
    ) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
            final_date: None,
            message_state: Some(message_state),
            error_code: 0,
        }
    }
}

impl Encodable for QuerySmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(
            CommandId::QuerySmResp,
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);

        let Some(message_state) = self.message_state else {
            return Ok(());
        };
        encode_cstring(buf, &self.message_id, 65, "message_id")?;
        encode_cstring(
            buf,
            self.final_date.as_deref().unwrap_or(""),
            17,
            "final_date",
        )?;
        buf.put_u8(message_state as u8);
        buf.put_u8(self.error_code);
        Ok(())
    }
}

impl Decodable for QuerySmResponse {
    fn command_ids() -> &'static [CommandId] {
        &[CommandId::QuerySmResp]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        if !buf.has_remaining() {
            return Ok(QuerySmResponse {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
                message_id: String::new(),
                final_date: None,
                message_state: None,
                error_code: 0,
            });
        }

        let message_id = decode_cstring(buf, 65, "message_id")?;
        let final_date = Some(decode_cstring(buf, 17, "final_date")?).filter(|d| !d.is_empty());
        let raw_state = decode_u8(buf)?;
        let message_state =
            MessageState::try_from(raw_state).map_err(|_| CodecError::FieldValidation {
                field: "message_state",
                reason: format!("invalid MessageState value {raw_state:#04x}"),
            })?;
        let error_code = decode_u8(buf)?;

        Ok(QuerySmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
            final_date,
            message_state: Some(message_state),
            error_code,
        })
    }
}
