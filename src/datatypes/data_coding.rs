// ABOUTME: SMPP data_coding scheme and the text charset each scheme implies
// ABOUTME: Drives how inbound short_message octets are turned into text

use std::fmt;

/// Data coding scheme carried in submit_sm and deliver_sm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DataCoding {
    /// SMSC Default Alphabet (typically GSM 7-bit)
    #[default]
    SmscDefault,
    /// IA5 (CCITT T.50)/ASCII
    Ascii,
    /// Octet unspecified (0x02)
    OctetUnspecified,
    /// Latin-1 (ISO-8859-1)
    Latin1,
    /// Octet unspecified (0x04)
    Binary,
    /// JIS (X 0208-1990)
    Jis,
    /// Cyrillic (ISO-8859-5)
    Cyrillic,
    /// Latin/Hebrew (ISO-8859-8)
    LatinHebrew,
    /// UCS-2 (ISO/IEC-10646)
    Ucs2,
    /// GSM 7-bit default alphabet with message class
    Gsm7BitWithClass(MessageClass),
    /// UCS-2 with message class (general data coding group, 0x18..=0x1B)
    Ucs2WithClass(MessageClass),
    /// 8-bit data with message class (0xF4..=0xF7), e.g. WAP push or SIM data download
    OctetWithClass(MessageClass),
    /// Reserved or vendor specific value
    Custom(u8),
}

/// Text decoding applied to an inbound payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-16 big endian (UCS-2 on the wire)
    Utf16Be,
    /// 7-bit ASCII
    Ascii,
    /// ISO-8859-1, every octet maps to the code point of the same value
    Latin1,
    /// No charset declared; UTF-8 is attempted and raw octets kept on failure
    Unspecified,
    /// Declared binary; never treated as text
    Octets,
}

impl DataCoding {
    /// Creates a DataCoding from the raw wire value
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => DataCoding::SmscDefault,
            0x01 => DataCoding::Ascii,
            0x02 => DataCoding::OctetUnspecified,
            0x03 => DataCoding::Latin1,
            0x04 => DataCoding::Binary,
            0x05 => DataCoding::Jis,
            0x06 => DataCoding::Cyrillic,
            0x07 => DataCoding::LatinHebrew,
            0x08 => DataCoding::Ucs2,
            0x18..=0x1B => DataCoding::Ucs2WithClass(MessageClass::from_bits(value)),
            0xF0 => DataCoding::Gsm7BitWithClass(MessageClass::Flash),
            0xF1 => DataCoding::Gsm7BitWithClass(MessageClass::MobileEquipment),
            0xF2 => DataCoding::Gsm7BitWithClass(MessageClass::SimSpecific),
            0xF3 => DataCoding::Gsm7BitWithClass(MessageClass::TerminalEquipment),
            0xF4..=0xF7 => DataCoding::OctetWithClass(MessageClass::from_bits(value)),
            _ => DataCoding::Custom(value),
        }
    }

    /// Returns the raw u8 value for the wire
    pub fn to_byte(&self) -> u8 {
        match self {
            DataCoding::SmscDefault => 0x00,
            DataCoding::Ascii => 0x01,
            DataCoding::OctetUnspecified => 0x02,
            DataCoding::Latin1 => 0x03,
            DataCoding::Binary => 0x04,
            DataCoding::Jis => 0x05,
            DataCoding::Cyrillic => 0x06,
            DataCoding::LatinHebrew => 0x07,
            DataCoding::Ucs2 => 0x08,
            DataCoding::Gsm7BitWithClass(class) => 0xF0 | class.bits(),
            DataCoding::Ucs2WithClass(class) => 0x18 | class.bits(),
            DataCoding::OctetWithClass(class) => 0xF4 | class.bits(),
            DataCoding::Custom(value) => *value,
        }
    }

    /// True for the UCS-2 schemes, whose payloads are UTF-16BE
    pub fn is_16bit(&self) -> bool {
        matches!(self, DataCoding::Ucs2 | DataCoding::Ucs2WithClass(_))
    }

    /// Returns the message class if this coding scheme includes one
    pub fn message_class(&self) -> Option<MessageClass> {
        match self {
            DataCoding::Gsm7BitWithClass(class)
            | DataCoding::Ucs2WithClass(class)
            | DataCoding::OctetWithClass(class) => Some(*class),
            _ => None,
        }
    }

    /// The charset an inbound payload with this coding is decoded with
    pub fn text_encoding(&self) -> TextEncoding {
        match self {
            DataCoding::Ucs2 | DataCoding::Ucs2WithClass(_) => TextEncoding::Utf16Be,
            DataCoding::Ascii => TextEncoding::Ascii,
            DataCoding::Latin1 => TextEncoding::Latin1,
            DataCoding::OctetWithClass(_) => TextEncoding::Octets,
            _ => TextEncoding::Unspecified,
        }
    }

    /// Returns the character set name for this encoding
    pub fn charset_name(&self) -> &'static str {
        match self {
            DataCoding::SmscDefault | DataCoding::Gsm7BitWithClass(_) => "GSM 7-bit Default",
            DataCoding::Ascii => "ASCII/IA5",
            DataCoding::OctetUnspecified | DataCoding::Binary => "Binary",
            DataCoding::Latin1 => "ISO-8859-1",
            DataCoding::Jis => "JIS X 0208-1990",
            DataCoding::Cyrillic => "ISO-8859-5",
            DataCoding::LatinHebrew => "ISO-8859-8",
            DataCoding::Ucs2 | DataCoding::Ucs2WithClass(_) => "UCS-2",
            DataCoding::OctetWithClass(_) => "8-bit data",
            DataCoding::Custom(_) => "Custom/Reserved",
        }
    }
}

/// Message class for SMS delivery
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MessageClass {
    /// Flash SMS (displayed immediately, not stored)
    Flash,
    /// Mobile Equipment specific message
    MobileEquipment,
    /// SIM-specific message (stored on SIM card)
    SimSpecific,
    /// Terminal Equipment specific message
    TerminalEquipment,
}

impl MessageClass {
    /// Class from the two low bits of a data_coding octet
    fn from_bits(value: u8) -> Self {
        match value & 0x03 {
            0 => MessageClass::Flash,
            1 => MessageClass::MobileEquipment,
            2 => MessageClass::SimSpecific,
            _ => MessageClass::TerminalEquipment,
        }
    }

    fn bits(&self) -> u8 {
        match self {
            MessageClass::Flash => 0,
            MessageClass::MobileEquipment => 1,
            MessageClass::SimSpecific => 2,
            MessageClass::TerminalEquipment => 3,
        }
    }
}

impl fmt::Display for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.charset_name(), self.to_byte())
    }
}

impl From<u8> for DataCoding {
    fn from(value: u8) -> Self {
        Self::from_byte(value)
    }
}

impl From<DataCoding> for u8 {
    fn from(data_coding: DataCoding) -> Self {
        data_coding.to_byte()
    }
}
