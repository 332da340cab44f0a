mod bind;
mod command_id;
mod command_status;
mod data_coding;
mod deliver_sm;
mod enquire_link;
mod esm_class;
mod generic_nack;
mod interface_version;
mod message_body;
mod numeric_plan_indicator;
mod query_sm;
mod submit_sm;
mod tlv;
mod type_of_number;
mod unbind;

pub use bind::{Bind, BindResponse, BindType, SC_INTERFACE_VERSION};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::{DataCoding, MessageClass, TextEncoding};
pub use deliver_sm::{DeliverSm, DeliverSmResponse};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use esm_class::{EsmClass, MessageType};
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use message_body::{MAX_SHORT_MESSAGE_LENGTH, MessageBody};
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use query_sm::{MessageState, QuerySm, QuerySmResponse};
pub use submit_sm::{SubmitSm, SubmitSmResponse};
pub use tlv::{Tlv, find as find_tlv, tags};
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};
