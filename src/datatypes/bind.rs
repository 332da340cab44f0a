// ABOUTME: Implements the SMPP v3.4 bind_transmitter, bind_receiver and bind_transceiver PDUs
// ABOUTME: The three binds share one body layout, so a single type carries all of them

use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_tlvs, decode_u8,
    encode_cstring,
};
use crate::datatypes::tlv::{self, Tlv};
use crate::datatypes::{
    CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator, TypeOfNumber,
};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Optional parameter in a bind response naming the SMSC's SMPP version
pub const SC_INTERFACE_VERSION: u16 = 0x0210;

/// Which of the three bind operations a PDU is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindType {
    Transmitter,
    Receiver,
    Transceiver,
}

impl BindType {
    pub fn command_id(&self) -> CommandId {
        match self {
            BindType::Transmitter => CommandId::BindTransmitter,
            BindType::Receiver => CommandId::BindReceiver,
            BindType::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub fn response_command_id(&self) -> CommandId {
        match self {
            BindType::Transmitter => CommandId::BindTransmitterResp,
            BindType::Receiver => CommandId::BindReceiverResp,
            BindType::Transceiver => CommandId::BindTransceiverResp,
        }
    }

    fn from_command_id(command_id: CommandId) -> Option<Self> {
        match command_id {
            CommandId::BindTransmitter | CommandId::BindTransmitterResp => {
                Some(BindType::Transmitter)
            }
            CommandId::BindReceiver | CommandId::BindReceiverResp => Some(BindType::Receiver),
            CommandId::BindTransceiver | CommandId::BindTransceiverResp => {
                Some(BindType::Transceiver)
            }
            _ => None,
        }
    }
}

/// bind_transmitter / bind_receiver / bind_transceiver (Sections 4.1.1, 4.1.3, 4.1.5)
#[derive(Clone, Debug, PartialEq)]
pub struct Bind {
    pub bind_type: BindType,
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// Identifies the ESME system requesting to bind. Up to 15 octets.
    pub system_id: String,

    /// Authenticates the ESME. Up to 8 octets.
    pub password: String,

    /// Identifies the type of ESME system. Up to 12 octets.
    pub system_type: String,

    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,

    /// Addresses served by this ESME, as a regular expression. Up to 40 octets.
    pub address_range: String,
}

impl Bind {
    pub fn new(bind_type: BindType, sequence_number: u32) -> Self {
        Self {
            bind_type,
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            interface_version: InterfaceVersion::default(),
            addr_ton: TypeOfNumber::default(),
            addr_npi: NumericPlanIndicator::default(),
            address_range: String::new(),
        }
    }
}

impl Encodable for Bind {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(
            self.bind_type.command_id(),
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);

        encode_cstring(buf, &self.system_id, 16, "system_id")?;
        encode_cstring(buf, &self.password, 9, "password")?;
        encode_cstring(buf, &self.system_type, 13, "system_type")?;
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(buf, &self.address_range, 41, "address_range")?;
        Ok(())
    }
}

impl Decodable for Bind {
    fn command_ids() -> &'static [CommandId] {
        &[
            CommandId::BindTransmitter,
            CommandId::BindReceiver,
            CommandId::BindTransceiver,
        ]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        let bind_type = bind_type_of(&header)?;

        let system_id = decode_cstring(buf, 16, "system_id")?;
        let password = decode_cstring(buf, 9, "password")?;
        let system_type = decode_cstring(buf, 13, "system_type")?;

        let version = decode_u8(buf)?;
        let interface_version =
            InterfaceVersion::try_from(version).map_err(|_| CodecError::FieldValidation {
                field: "interface_version",
                reason: format!("unsupported version {version:#04x}"),
            })?;
        let addr_ton = decode_ton(buf, "addr_ton")?;
        let addr_npi = decode_npi(buf, "addr_npi")?;
        let address_range = decode_cstring(buf, 41, "address_range")?;

        Ok(Bind {
            bind_type,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

/// Response to any of the bind operations (Sections 4.1.2, 4.1.4, 4.1.6)
#[derive(Clone, Debug, PartialEq)]
pub struct BindResponse {
    pub bind_type: BindType,
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// SMSC identifier. SMSCs commonly omit the body when rejecting a bind.
    pub system_id: String,

    /// Optional sc_interface_version parameter
    pub sc_interface_version: Option<u8>,
}

impl BindResponse {
    pub fn new(bind_type: BindType, sequence_number: u32, system_id: impl Into<String>) -> Self {
        Self {
            bind_type,
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: system_id.into(),
            sc_interface_version: None,
        }
    }

    pub fn error(bind_type: BindType, sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            bind_type,
            command_status: status,
            sequence_number,
            system_id: String::new(),
            sc_interface_version: None,
        }
    }
}

impl Encodable for BindResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader::new(
            self.bind_type.response_command_id(),
            self.command_status,
            self.sequence_number,
        )
        .encode(buf);

        encode_cstring(buf, &self.system_id, 16, "system_id")?;
        if let Some(version) = self.sc_interface_version {
            Tlv::from_u8(SC_INTERFACE_VERSION, version).encode(buf)?;
        }
        Ok(())
    }
}

impl Decodable for BindResponse {
    fn command_ids() -> &'static [CommandId] {
        &[
            CommandId::BindTransmitterResp,
            CommandId::BindReceiverResp,
            CommandId::BindTransceiverResp,
        ]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        let bind_type = bind_type_of(&header)?;

        if !buf.has_remaining() {
            return Ok(BindResponse {
                bind_type,
                command_status: header.command_status,
                sequence_number: header.sequence_number,
                system_id: String::new(),
                sc_interface_version: None,
            });
        }

        let system_id = decode_cstring(buf, 16, "system_id")?;
        let tlvs = decode_tlvs(buf)?;
        let sc_interface_version = tlv::find(&tlvs, SC_INTERFACE_VERSION).and_then(Tlv::as_u8);

        Ok(BindResponse {
            bind_type,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            sc_interface_version,
        })
    }
}

fn bind_type_of(header: &PduHeader) -> Result<BindType, CodecError> {
    BindType::from_command_id(header.command_id)
        .ok_or(CodecError::InvalidCommandId(header.command_id as u32))
}

pub(crate) fn decode_ton(
    buf: &mut Cursor<&[u8]>,
    field: &'static str,
) -> Result<TypeOfNumber, CodecError> {
    let raw = decode_u8(buf)?;
    TypeOfNumber::try_from(raw).map_err(|_| CodecError::FieldValidation {
        field,
        reason: format!("invalid TypeOfNumber value {raw:#04x}"),
    })
}

pub(crate) fn decode_npi(
    buf: &mut Cursor<&[u8]>,
    field: &'static str,
) -> Result<NumericPlanIndicator, CodecError> {
    let raw = decode_u8(buf)?;
    NumericPlanIndicator::try_from(raw).map_err(|_| CodecError::FieldValidation {
        field,
        reason: format!("invalid NumericPlanIndicator value {raw:#04x}"),
    })
}
