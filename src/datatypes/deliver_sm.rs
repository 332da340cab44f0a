// ABOUTME: Implements SMPP v3.4 deliver_sm and deliver_sm_resp PDUs
// ABOUTME: Carries mobile originated messages and delivery receipts from the SMSC

use crate::codec::{CodecError, Decodable, Encodable, PduHeader, decode_cstring};
use crate::datatypes::{CommandId, CommandStatus, MessageBody};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Issued by the SMSC to send a message to an ESME (Section 4.6.1)
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub body: MessageBody,
}

impl DeliverSm {
    pub fn new(sequence_number: u32, body: MessageBody) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            body,
        }
    }
}

impl Encodable for DeliverSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(CommandId::DeliverSm, self.command_status, self.sequence_number)
            .encode(buf);
        self.body.encode(buf)
    }
}

impl Decodable for DeliverSm {
    fn command_ids() -> &'static [CommandId] {
        &[CommandId::DeliverSm]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        Ok(DeliverSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            body: MessageBody::decode(buf)?,
        })
    }
}

/// deliver_sm_resp. The message_id field is unused and always NULL.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl DeliverSmResponse {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }

    pub fn error(sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            command_status: status,
            sequence_number,
        }
    }
}

impl Encodable for DeliverSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(
            CommandId::DeliverSmResp,
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);
        buf.put_u8(0);
        Ok(())
    }
}

impl Decodable for DeliverSmResponse {
    fn command_ids() -> &'static [CommandId] {
        &[CommandId::DeliverSmResp]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        if buf.has_remaining() {
            decode_cstring(buf, 65, "message_id")?;
        }
        Ok(DeliverSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
        })
    }
}
