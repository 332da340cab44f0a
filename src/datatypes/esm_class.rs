// ABOUTME: SMPP esm_class bitfield with message mode, message type and GSM feature bits
// ABOUTME: Keeps the raw octet so unknown bit combinations survive decoding untouched

use std::fmt;

/// ESM (External Short Message) class.
///
/// Bits 1-0 select the messaging mode, bits 5-2 the message type and bits
/// 7-6 the GSM network features (UDHI and reply path).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EsmClass(u8);

/// Message types carried in bits 5-2 of a deliver_sm esm_class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    Default,
    DeliveryReceipt,
    DeliveryAcknowledgement,
    ManualUserAcknowledgement,
    ConversationAbort,
    IntermediateDeliveryNotification,
    Reserved(u8),
}

impl EsmClass {
    pub const UDHI: u8 = 0x40;
    pub const REPLY_PATH: u8 = 0x80;
    const MESSAGE_TYPE_MASK: u8 = 0x3C;

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// esm_class announcing an SMSC delivery receipt
    pub const fn delivery_receipt() -> Self {
        Self(0x04)
    }

    /// Sets the User Data Header Indicator
    pub fn with_udhi(self) -> Self {
        Self(self.0 | Self::UDHI)
    }

    /// True when short_message starts with a User Data Header
    pub fn has_udhi(&self) -> bool {
        self.0 & Self::UDHI != 0
    }

    pub fn has_reply_path(&self) -> bool {
        self.0 & Self::REPLY_PATH != 0
    }

    /// Messaging mode, bits 1-0
    pub fn messaging_mode(&self) -> u8 {
        self.0 & 0x03
    }

    pub fn message_type(&self) -> MessageType {
        match (self.0 & Self::MESSAGE_TYPE_MASK) >> 2 {
            0 => MessageType::Default,
            1 => MessageType::DeliveryReceipt,
            2 => MessageType::DeliveryAcknowledgement,
            4 => MessageType::ManualUserAcknowledgement,
            6 => MessageType::ConversationAbort,
            8 => MessageType::IntermediateDeliveryNotification,
            other => MessageType::Reserved(other),
        }
    }

    pub fn is_delivery_receipt(&self) -> bool {
        self.message_type() == MessageType::DeliveryReceipt
    }

    pub fn to_byte(&self) -> u8 {
        self.0
    }
}

impl fmt::Debug for EsmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EsmClass")
            .field("raw", &format_args!("{:#04x}", self.0))
            .field("message_type", &self.message_type())
            .field("udhi", &self.has_udhi())
            .finish()
    }
}

impl From<u8> for EsmClass {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<EsmClass> for u8 {
    fn from(esm_class: EsmClass) -> Self {
        esm_class.0
    }
}
