//! SMPP v3.4 ESME client.
//!
//! A single-session client engine for talking to an SMSC: bind negotiation
//! for the transmitter, receiver and transceiver roles, a durable sequence
//! number allocator, bind timeout and enquire_link keepalive, and inbound
//! processing of deliver_sm (multipart reassembly, charset decoding and
//! delivery receipt parsing).
//!
//! The crate is layered bottom-up:
//!
//! * [`codec`] and [`datatypes`] - the PDUs an ESME exchanges and their wire format
//! * [`connection`] - framing over a byte stream and the TCP transport
//! * [`store`] - the narrow key/value contract behind sequence numbering
//! * [`client`] - the session engine and everything it drives
//!
//! # Examples
//!
//! ## Sending
//!
//! ```rust,no_run
//! use smpp_esme::client::{ClientBuilder, ClientConfig, EsmeHandle, SmsMessage};
//! use smpp_esme::store::FileStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::open("/var/lib/esme").await?;
//!     let config = ClientConfig::new("localhost", 2775, "system_id", "password");
//!     let sequencer = Arc::new(config.sequencer(store));
//!
//!     let (mut esme, mut reader) = ClientBuilder::transmitter(config, sequencer, ()).await?;
//!     let (handle, commands) = EsmeHandle::channel(16);
//!     let session = tokio::spawn(async move { esme.run_with(&mut reader, Some(commands)).await });
//!
//!     let sms = SmsMessage::builder()
//!         .to("1234567890")
//!         .from("0987654321")
//!         .text("Hello, World!")
//!         .with_delivery_receipt()
//!         .build()?;
//!     if let Some(sequence_number) = handle.submit_sm(sms).await? {
//!         println!("submit_sm sent as {sequence_number}");
//!     }
//!
//!     handle.unbind().await?;
//!     session.await??;
//!     Ok(())
//! }
//! ```

mod macros;

pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod store;

#[cfg(test)]
mod tests;

// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader, PduRegistry};

// Re-export the main client API for easy access
pub use client::{
    ClientBuilder, ClientConfig, Esme, EsmeCallbacks, EsmeError, EsmeHandle, EsmeResult, Role,
    SequenceAllocator, SessionState, SmsMessage, Transport,
};
