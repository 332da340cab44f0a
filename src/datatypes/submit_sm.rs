// ABOUTME: Implements SMPP v3.4 submit_sm and submit_sm_resp PDUs
// ABOUTME: Used by transmitter and transceiver sessions to send messages to the SMSC

use crate::codec::{CodecError, Decodable, Encodable, PduHeader, decode_cstring, encode_cstring};
use crate::datatypes::{CommandId, CommandStatus, MessageBody};
use bytes::{Buf, BytesMut};
use std::io::Cursor;

/// This operation is used by an ESME to submit a short message to the SMSC for onward
/// transmission to a specified short message entity (SME).
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: MessageBody,
}

impl SubmitSm {
    pub fn new(sequence_number: u32, body: MessageBody) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            body,
        }
    }
}

impl Encodable for SubmitSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(CommandId::SubmitSm, self.command_status, self.sequence_number).encode(buf);
        self.body.encode(buf)
    }
}

impl Decodable for SubmitSm {
    fn command_ids() -> &'static [CommandId] {
        &[CommandId::SubmitSm]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        Ok(SubmitSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            body: MessageBody::decode(buf)?,
        })
    }
}

/// submit_sm_resp carries the SMSC message id used to correlate delivery receipts
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// SMSC assigned message identifier. Up to 64 octets.
    pub message_id: String,
}

impl SubmitSmResponse {
    pub fn new(sequence_number: u32, message_id: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
        }
    }

    pub fn error(sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            command_status: status,
            sequence_number,
            message_id: String::new(),
        }
    }
}

impl Encodable for SubmitSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(
            CommandId::SubmitSmResp,
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);

        // Error responses carry no body
        if self.command_status == CommandStatus::Ok {
            encode_cstring(buf, &self.message_id, 65, "message_id")?;
        }
        Ok(())
    }
}

impl Decodable for SubmitSmResponse {
    fn command_ids() -> &'static [CommandId] {
        &[CommandId::SubmitSmResp]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        let message_id = if buf.has_remaining() {
            decode_cstring(buf, 65, "message_id")?
        } else {
            String::new()
        };
        Ok(SubmitSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}
