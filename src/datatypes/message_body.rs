// ABOUTME: Mandatory and optional parameters shared by submit_sm and deliver_sm bodies
// ABOUTME: Both PDUs use an identical wire layout, so one encoder/decoder serves both

use crate::codec::{
    CodecError, decode_cstring, decode_octets, decode_tlvs, decode_u8, encode_cstring,
};
use crate::datatypes::bind::{decode_npi, decode_ton};
use crate::datatypes::tlv::{self, Tlv, tags};
use crate::datatypes::{DataCoding, EsmClass, NumericPlanIndicator, TypeOfNumber};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Largest payload the short_message field can carry
pub const MAX_SHORT_MESSAGE_LENGTH: usize = 254;

/// Body of a submit_sm or deliver_sm (Sections 4.4.1 and 4.6.1)
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MessageBody {
    /// SMS application service. Up to 5 octets.
    pub service_type: String,

    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    /// Up to 20 octets.
    pub source_addr: String,

    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
    /// Up to 20 octets.
    pub destination_addr: String,

    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    /// YYMMDDhhmmsstnnp or empty for immediate delivery
    pub schedule_delivery_time: String,
    /// YYMMDDhhmmsstnnp or empty for the SMSC default
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,

    /// Raw payload, preceded on the wire by its one octet length
    pub short_message: Bytes,

    pub tlvs: Vec<Tlv>,
}

impl MessageBody {
    pub fn source_addr(mut self, addr: impl Into<String>) -> Self {
        self.source_addr = addr.into();
        self
    }

    pub fn destination_addr(mut self, addr: impl Into<String>) -> Self {
        self.destination_addr = addr.into();
        self
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    pub fn esm_class(mut self, esm_class: impl Into<EsmClass>) -> Self {
        self.esm_class = esm_class.into();
        self
    }

    pub fn data_coding(mut self, data_coding: impl Into<u8>) -> Self {
        self.data_coding = data_coding.into();
        self
    }

    pub fn short_message(mut self, message: impl Into<Bytes>) -> Self {
        self.short_message = message.into();
        self
    }

    pub fn tlv(mut self, tlv: Tlv) -> Self {
        self.tlvs.push(tlv);
        self
    }

    /// Parsed data_coding scheme
    pub fn coding(&self) -> DataCoding {
        DataCoding::from_byte(self.data_coding)
    }

    pub fn find_tlv(&self, tag: u16) -> Option<&Tlv> {
        tlv::find(&self.tlvs, tag)
    }

    /// The message text octets: short_message, or the message_payload
    /// parameter when short_message is empty.
    pub fn payload(&self) -> Bytes {
        if self.short_message.is_empty() {
            if let Some(payload) = self.find_tlv(tags::MESSAGE_PAYLOAD) {
                return payload.value.clone();
            }
        }
        self.short_message.clone()
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.short_message.len() > MAX_SHORT_MESSAGE_LENGTH {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: format!(
                    "{} octets exceeds maximum of {MAX_SHORT_MESSAGE_LENGTH}",
                    self.short_message.len()
                ),
            });
        }
        if !self.short_message.is_empty() && self.find_tlv(tags::MESSAGE_PAYLOAD).is_some() {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: "short_message and message_payload are mutually exclusive".to_string(),
            });
        }

        encode_cstring(buf, &self.service_type, 6, "service_type")?;
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, &self.source_addr, 21, "source_addr")?;
        buf.put_u8(self.dest_addr_ton as u8);
        buf.put_u8(self.dest_addr_npi as u8);
        encode_cstring(buf, &self.destination_addr, 21, "destination_addr")?;
        buf.put_u8(self.esm_class.to_byte());
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.priority_flag);
        encode_cstring(
            buf,
            &self.schedule_delivery_time,
            17,
            "schedule_delivery_time",
        )?;
        encode_cstring(buf, &self.validity_period, 17, "validity_period")?;
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.replace_if_present_flag);
        buf.put_u8(self.data_coding);
        buf.put_u8(self.sm_default_msg_id);
        buf.put_u8(self.short_message.len() as u8);
        buf.put_slice(&self.short_message);

        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }
        Ok(())
    }

    pub(crate) fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let service_type = decode_cstring(buf, 6, "service_type")?;
        let source_addr_ton = decode_ton(buf, "source_addr_ton")?;
        let source_addr_npi = decode_npi(buf, "source_addr_npi")?;
        let source_addr = decode_cstring(buf, 21, "source_addr")?;
        let dest_addr_ton = decode_ton(buf, "dest_addr_ton")?;
        let dest_addr_npi = decode_npi(buf, "dest_addr_npi")?;
        let destination_addr = decode_cstring(buf, 21, "destination_addr")?;
        let esm_class = EsmClass::new(decode_u8(buf)?);
        let protocol_id = decode_u8(buf)?;
        let priority_flag = decode_u8(buf)?;
        let schedule_delivery_time = decode_cstring(buf, 17, "schedule_delivery_time")?;
        let validity_period = decode_cstring(buf, 17, "validity_period")?;
        let registered_delivery = decode_u8(buf)?;
        let replace_if_present_flag = decode_u8(buf)?;
        let data_coding = decode_u8(buf)?;
        let sm_default_msg_id = decode_u8(buf)?;

        let sm_length = decode_u8(buf)? as usize;
        let short_message =
            decode_octets(buf, sm_length).map_err(|_| CodecError::FieldValidation {
                field: "short_message",
                reason: format!("sm_length {sm_length} runs past the end of the PDU"),
            })?;

        let tlvs = decode_tlvs(buf)?;

        Ok(MessageBody {
            service_type,
            source_addr_ton,
            source_addr_npi,
            source_addr,
            dest_addr_ton,
            dest_addr_npi,
            destination_addr,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            short_message,
            tlvs,
        })
    }
}
