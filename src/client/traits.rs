// ABOUTME: Seams between the session engine and its surroundings using native async trait methods
// ABOUTME: Transport carries encoded PDUs out; EsmeCallbacks receives the events the session produces

use crate::client::types::{DeliveredMessage, DeliveryReport, Role};
use crate::datatypes::{QuerySmResponse, SubmitSmResponse};
use bytes::Bytes;
use std::io;

/// Outbound half of the connection to the SMSC.
///
/// The session writes whole encoded PDUs and never frames bytes itself.
/// Inbound bytes reach the session separately, through
/// [`FrameReader`](crate::connection::FrameReader).
pub trait Transport {
    /// Write one encoded PDU
    async fn write(&mut self, pdu: Bytes) -> io::Result<()>;

    /// Close the connection. Calling it on a closed transport does nothing.
    async fn lose_connection(&mut self);

    /// Returns false once the connection has been closed from either side
    fn is_connected(&self) -> bool;
}

/// Application handlers for session events.
///
/// Every method has an empty default, so an application implements only
/// the events it cares about. Handlers run inside the session's dispatch;
/// the next PDU is not processed until a handler returns.
///
/// # Example
///
/// ```rust
/// use smpp_esme::client::{DeliveredMessage, EsmeCallbacks};
///
/// struct Inbox(Vec<DeliveredMessage>);
///
/// impl EsmeCallbacks for Inbox {
///     async fn deliver_sm(&mut self, message: DeliveredMessage) {
///         self.0.push(message);
///     }
/// }
/// ```
pub trait EsmeCallbacks {
    /// The bind succeeded
    async fn connect(&mut self, _role: Role) {}

    /// The session closed, for any reason
    async fn disconnect(&mut self) {}

    async fn submit_sm_resp(&mut self, _response: &SubmitSmResponse) {}

    async fn query_sm_resp(&mut self, _response: &QuerySmResponse) {}

    /// A complete mobile originated message
    async fn deliver_sm(&mut self, _message: DeliveredMessage) {}

    async fn delivery_report(&mut self, _report: DeliveryReport) {}
}

/// Sessions that only care about transport events can pass `()`.
impl EsmeCallbacks for () {}
