use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// Keep-alive request. Either side may send it once bound; the peer answers
/// with enquire_link_resp carrying the same sequence number.
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLink {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLinkResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(EnquireLink, CommandId::EnquireLink);
impl_complete_header_only_pdu!(EnquireLinkResponse, CommandId::EnquireLinkResp);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encodable;

    #[test]
    fn enquire_link_to_bytes() {
        let bytes = EnquireLink::new(3).to_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0, 0, 0, 16, 0, 0, 0, 0x15, 0, 0, 0, 0, 0, 0, 0, 3]
        );
    }

    #[test]
    fn enquire_link_response_to_bytes() {
        let bytes = EnquireLinkResponse::new(3).to_bytes().unwrap();
        assert_eq!(&bytes[4..8], &[0x80, 0, 0, 0x15]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 3]);
    }
}
