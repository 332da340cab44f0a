use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::{impl_header_only_constructors, impl_header_only_pdu};

/// GenericNack is used to acknowledge the receipt of a PDU when the receiving
/// entity cannot process the PDU due to errors such as invalid command_id,
/// invalid command_status, or other format errors.
///
/// The generic_nack PDU has no message body and only contains the standard
/// SMPP header.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericNack {
    /// The command_status field indicates the reason for the generic_nack
    pub command_status: CommandStatus,
    /// The sequence_number from the original PDU that caused the error.
    /// If the original sequence_number cannot be determined, this should be 0.
    pub sequence_number: u32,
}

impl_header_only_pdu!(GenericNack, CommandId::GenericNack);
impl_header_only_constructors!(GenericNack);

impl GenericNack {
    /// Creates a GenericNack for an invalid command ID error
    pub fn invalid_command_id(sequence_number: u32) -> Self {
        Self::error(sequence_number, CommandStatus::InvalidCommandId)
    }

    /// Creates a GenericNack when the sequence number cannot be determined from malformed PDU
    pub fn unknown_sequence() -> Self {
        Self::error(0, CommandStatus::InvalidCommandLength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Encodable, Frame};

    #[test]
    fn generic_nack_with_unknown_sequence_decodes() {
        let nack = GenericNack::unknown_sequence();
        let bytes = nack.to_bytes().unwrap();
        assert_eq!(&bytes[4..8], &[0x80, 0, 0, 0]);
        assert_eq!(Frame::decode(&bytes).unwrap(), Frame::GenericNack(nack));
    }

    #[test]
    fn invalid_command_id_status() {
        let nack = GenericNack::invalid_command_id(9);
        assert_eq!(nack.command_status, CommandStatus::InvalidCommandId);
        assert_eq!(nack.sequence_number, 9);
    }
}
