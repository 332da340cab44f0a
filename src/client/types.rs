// ABOUTME: Session roles, states and the message types exchanged with the application
// ABOUTME: Provides the outbound SmsMessage builder and the structured inbound deliveries

use crate::client::charset::MessageContent;
use crate::client::error::{EsmeError, EsmeResult};
use crate::client::receipt::DeliveryReceipt;
use crate::datatypes::{
    BindType, DataCoding, EsmClass, MAX_SHORT_MESSAGE_LENGTH, MessageBody, MessageState,
    NumericPlanIndicator, SubmitSm, Tlv, TypeOfNumber, tags,
};
use bytes::Bytes;

/// Which directions of traffic a session may carry once bound.
///
/// All three roles run the same engine; the role only decides whether
/// submit_sm may be sent and deliver_sm accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Bind as transmitter (can send submit_sm)
    Transmitter,
    /// Bind as receiver (can receive deliver_sm)
    Receiver,
    /// Bind as transceiver (both transmitter and receiver capabilities)
    Transceiver,
}

impl Role {
    pub fn can_submit(&self) -> bool {
        matches!(self, Role::Transmitter | Role::Transceiver)
    }

    pub fn can_deliver(&self) -> bool {
        matches!(self, Role::Receiver | Role::Transceiver)
    }

    /// Bind operation sent for this role
    pub fn bind_type(&self) -> BindType {
        match self {
            Role::Transmitter => BindType::Transmitter,
            Role::Receiver => BindType::Receiver,
            Role::Transceiver => BindType::Transceiver,
        }
    }

    /// State entered after a successful bind
    pub fn bound_state(&self) -> SessionState {
        match self {
            Role::Transmitter => SessionState::BoundTx,
            Role::Receiver => SessionState::BoundRx,
            Role::Transceiver => SessionState::BoundTrx,
        }
    }
}

/// SMPP session state as seen by the ESME.
///
/// ```text
/// UNBOUND → CONNECTED → BOUND_TX/BOUND_RX/BOUND_TRX → CLOSED
/// ```
///
/// CLOSED is reachable from every state and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Unbound,
    Connected,
    BoundTx,
    BoundRx,
    BoundTrx,
    Closed,
}

impl SessionState {
    pub fn is_bound(&self) -> bool {
        matches!(
            self,
            SessionState::BoundTx | SessionState::BoundRx | SessionState::BoundTrx
        )
    }

    /// submit_sm may be sent in this state
    pub fn can_submit(&self) -> bool {
        matches!(self, SessionState::BoundTx | SessionState::BoundTrx)
    }

    /// deliver_sm may be accepted in this state
    pub fn can_deliver(&self) -> bool {
        matches!(self, SessionState::BoundRx | SessionState::BoundTrx)
    }

    pub fn is_closed(&self) -> bool {
        *self == SessionState::Closed
    }
}

/// Simplified SMS message for easy client usage
///
/// Provides a high-level interface for SMS messages with sensible defaults,
/// hiding the complexity of the underlying SubmitSm PDU structure.
#[derive(Debug, Clone)]
pub struct SmsMessage {
    /// Destination phone number
    pub to: String,
    /// Source phone number
    pub from: String,
    /// Message text content
    pub text: String,
    /// Additional message options
    pub options: SmsOptions,
}

impl SmsMessage {
    /// Create a new SMS message with default options
    pub fn new(to: impl Into<String>, from: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            text: text.into(),
            options: SmsOptions::default(),
        }
    }

    /// Create a builder for constructing SMS messages
    pub fn builder() -> SmsMessageBuilder {
        SmsMessageBuilder::default()
    }

    /// Encode the text under the configured data_coding.
    pub fn encode_text(&self) -> EsmeResult<Bytes> {
        let coding = self.options.data_coding;
        let bytes = match coding {
            DataCoding::Ucs2 | DataCoding::Ucs2WithClass(_) => self
                .text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect(),
            DataCoding::Latin1 => self
                .text
                .chars()
                .map(|c| u8::try_from(u32::from(c)))
                .collect::<Result<Vec<u8>, _>>()
                .map_err(|_| {
                    EsmeError::InvalidData(format!("text is not representable in {coding}"))
                })?,
            DataCoding::Ascii if !self.text.is_ascii() => {
                return Err(EsmeError::InvalidData(format!(
                    "text is not representable in {coding}"
                )));
            }
            _ => self.text.as_bytes().to_vec(),
        };
        Ok(Bytes::from(bytes))
    }

    /// Build the submit_sm for this message. Text longer than short_message
    /// allows is carried in the message_payload parameter.
    pub fn to_submit_sm(&self, sequence_number: u32) -> EsmeResult<SubmitSm> {
        let payload = self.encode_text()?;
        let mut body = MessageBody {
            source_addr_ton: self.options.source_ton,
            source_addr_npi: self.options.source_npi,
            source_addr: self.from.clone(),
            dest_addr_ton: self.options.dest_ton,
            dest_addr_npi: self.options.dest_npi,
            destination_addr: self.to.clone(),
            esm_class: self.options.esm_class,
            priority_flag: self.options.priority,
            registered_delivery: self.options.registered_delivery,
            data_coding: self.options.data_coding.to_byte(),
            ..MessageBody::default()
        };

        if payload.len() > MAX_SHORT_MESSAGE_LENGTH {
            body.tlvs.push(Tlv::new(tags::MESSAGE_PAYLOAD, payload));
        } else {
            body.short_message = payload;
        }
        Ok(SubmitSm::new(sequence_number, body))
    }
}

/// SMS message options with sensible defaults
#[derive(Debug, Clone, Default)]
pub struct SmsOptions {
    /// Message priority level, 0 (lowest) to 3
    pub priority: u8,
    /// Data coding scheme
    pub data_coding: DataCoding,
    /// Source address type of number
    pub source_ton: TypeOfNumber,
    /// Source address numbering plan indicator
    pub source_npi: NumericPlanIndicator,
    /// Destination address type of number
    pub dest_ton: TypeOfNumber,
    /// Destination address numbering plan indicator
    pub dest_npi: NumericPlanIndicator,
    /// Request delivery receipt (0 = no, 1 = yes)
    pub registered_delivery: u8,
    pub esm_class: EsmClass,
}

/// Builder for constructing SMS messages with fluent API
#[derive(Debug, Default)]
pub struct SmsMessageBuilder {
    to: Option<String>,
    from: Option<String>,
    text: Option<String>,
    options: SmsOptions,
}

impl SmsMessageBuilder {
    /// Set destination phone number
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Set source phone number
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set message text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set message priority
    pub fn priority(mut self, priority: u8) -> Self {
        self.options.priority = priority;
        self
    }

    /// Set data coding scheme
    pub fn data_coding(mut self, data_coding: DataCoding) -> Self {
        self.options.data_coding = data_coding;
        self
    }

    /// Request delivery receipt
    pub fn with_delivery_receipt(mut self) -> Self {
        self.options.registered_delivery = 1;
        self
    }

    /// Set source address numbering
    pub fn source_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.options.source_ton = ton;
        self.options.source_npi = npi;
        self
    }

    /// Set destination address numbering
    pub fn dest_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.options.dest_ton = ton;
        self.options.dest_npi = npi;
        self
    }

    /// Build the SMS message
    pub fn build(self) -> EsmeResult<SmsMessage> {
        let missing = |what: &str| EsmeError::InvalidData(format!("{what} is required"));
        let to = self.to.ok_or_else(|| missing("destination phone number"))?;
        let from = self.from.ok_or_else(|| missing("source phone number"))?;
        let text = self.text.ok_or_else(|| missing("message text"))?;

        if self.options.priority > 3 {
            return Err(EsmeError::InvalidData(format!(
                "priority {} out of range 0-3",
                self.options.priority
            )));
        }

        let message = SmsMessage {
            to,
            from,
            text,
            options: self.options,
        };
        // Surface charset problems at build time rather than at send time
        message.encode_text()?;
        Ok(message)
    }
}

/// A mobile originated message handed to the `deliver_sm` callback.
///
/// Multipart messages arrive here once, fully reassembled.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredMessage {
    /// Sequence number of the deliver_sm that completed the message
    pub sequence_number: u32,
    pub source_addr: String,
    pub destination_addr: String,
    pub service_type: String,
    pub data_coding: DataCoding,
    pub esm_class: EsmClass,
    /// Decoded text, or the raw octets when decoding failed
    pub short_message: MessageContent,
}

/// A delivery receipt handed to the `delivery_report` callback.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub sequence_number: u32,
    pub source_addr: String,
    pub destination_addr: String,
    /// Fields parsed from the receipt text
    pub receipt: DeliveryReceipt,
    /// receipted_message_id parameter, when the SMSC sent one
    pub receipted_message_id: Option<String>,
    /// message_state parameter, when the SMSC sent one
    pub message_state: Option<MessageState>,
}

impl DeliveryReport {
    /// Message id the receipt refers to, preferring the optional parameter
    pub fn message_id(&self) -> Option<&str> {
        self.receipted_message_id
            .as_deref()
            .or_else(|| self.receipt.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_capabilities() {
        assert!(Role::Transmitter.can_submit());
        assert!(!Role::Transmitter.can_deliver());
        assert!(!Role::Receiver.can_submit());
        assert!(Role::Receiver.can_deliver());
        assert!(Role::Transceiver.can_submit() && Role::Transceiver.can_deliver());
        assert_eq!(Role::Receiver.bound_state(), SessionState::BoundRx);
        assert_eq!(Role::Transceiver.bind_type(), BindType::Transceiver);
    }

    #[test]
    fn state_capabilities() {
        assert!(SessionState::BoundTrx.can_submit());
        assert!(SessionState::BoundTrx.can_deliver());
        assert!(!SessionState::Connected.can_deliver());
        assert!(!SessionState::Closed.is_bound());
    }

    #[test]
    fn submit_sm_from_message() {
        let sms = SmsMessage::builder()
            .to("27831234567")
            .from("1234")
            .text("hello")
            .with_delivery_receipt()
            .build()
            .unwrap();

        let pdu = sms.to_submit_sm(9).unwrap();
        assert_eq!(pdu.sequence_number, 9);
        assert_eq!(pdu.body.destination_addr, "27831234567");
        assert_eq!(pdu.body.short_message.as_ref(), b"hello");
        assert_eq!(pdu.body.registered_delivery, 1);
    }

    #[test]
    fn ucs2_text_is_utf16_big_endian() {
        let sms = SmsMessage::builder()
            .to("1")
            .from("2")
            .text("hé")
            .data_coding(DataCoding::Ucs2)
            .build()
            .unwrap();
        assert_eq!(sms.encode_text().unwrap().as_ref(), &[0, b'h', 0, 0xE9]);
    }

    #[test]
    fn latin1_rejects_wide_characters() {
        let result = SmsMessage::builder()
            .to("1")
            .from("2")
            .text("€")
            .data_coding(DataCoding::Latin1)
            .build();
        assert!(matches!(result, Err(EsmeError::InvalidData(_))));
    }

    #[test]
    fn long_text_uses_message_payload() {
        let sms = SmsMessage::new("1", "2", "x".repeat(300));
        let pdu = sms.to_submit_sm(1).unwrap();
        assert!(pdu.body.short_message.is_empty());
        assert_eq!(
            pdu.body.find_tlv(tags::MESSAGE_PAYLOAD).map(|t| t.value.len()),
            Some(300)
        );
    }

    #[test]
    fn builder_requires_fields() {
        assert!(SmsMessage::builder().to("1").text("x").build().is_err());
    }
}
