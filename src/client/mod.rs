// ABOUTME: ESME client module: session engine, sequence allocation and inbound message processing
// ABOUTME: Exports the engine, its configuration, the seams it is driven through and its message types

//! SMPP ESME Client Module
//!
//! This module provides a single-session SMPP client engine with the following features:
//!
//! * **One engine, three roles** - Transmitter, receiver and transceiver share the
//!   same state machine; the role decides which traffic is legal once bound
//! * **Durable sequence numbers** - Allocated through a [`KeyValueStore`](crate::store::KeyValueStore)
//!   so numbering survives restarts
//! * **Cancellable timers** - Bind timeout and enquire_link keepalive are explicit
//!   handles polled by the session task
//! * **Inbound processing** - Multipart reassembly, charset decoding and delivery
//!   receipt parsing before the application sees a message
//! * **Native async traits** - [`Transport`] and [`EsmeCallbacks`] use async fn in
//!   traits (no async_trait dependency)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smpp_esme::client::{ClientBuilder, ClientConfig, EsmeHandle, SmsMessage};
//! use smpp_esme::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("localhost", 2775, "system_id", "password");
//! let sequencer = Arc::new(config.sequencer(MemoryStore::new()));
//! let (mut esme, mut reader) = ClientBuilder::transmitter(config, sequencer, ()).await?;
//!
//! let (handle, commands) = EsmeHandle::channel(16);
//! let session = tokio::spawn(async move { esme.run_with(&mut reader, Some(commands)).await });
//!
//! handle.submit_sm(SmsMessage::new("123456789", "987654321", "Hello!")).await?;
//! handle.unbind().await?;
//! session.await??;
//! # Ok(())
//! # }
//! ```
//!
//! ## Receiving
//!
//! Implement [`EsmeCallbacks`] for the events you need; everything else is a no-op.
//!
//! ```rust
//! use smpp_esme::client::{DeliveredMessage, DeliveryReport, EsmeCallbacks};
//!
//! struct Printer;
//!
//! impl EsmeCallbacks for Printer {
//!     async fn deliver_sm(&mut self, message: DeliveredMessage) {
//!         println!("{}: {:?}", message.source_addr, message.short_message);
//!     }
//!
//!     async fn delivery_report(&mut self, report: DeliveryReport) {
//!         println!("{:?} -> {:?}", report.message_id(), report.receipt.status());
//!     }
//! }
//! ```

pub mod builder;
pub mod charset;
pub mod config;
pub mod error;
pub mod esme;
pub mod handle;
pub mod multipart;
pub mod receipt;
pub mod sequence;
pub mod timer;
pub mod traits;
pub mod types;

// Re-export the main types for easy access
pub use builder::{ClientBuilder, TcpSession};
pub use charset::{MessageContent, decode_payload};
pub use config::ClientConfig;
pub use error::{EsmeError, EsmeResult};
pub use esme::Esme;
pub use handle::{Command, EsmeHandle};
pub use multipart::{Fragment, FragmentError, MultipartReassembler, Reference, extract_fragment};
pub use receipt::{DeliveryReceipt, DeliveryStatus};
pub use sequence::{DEFAULT_SEQUENCE_KEY, ROLLOVER_THRESHOLD, SequenceAllocator};
pub use timer::{Timer, TimerKind};
pub use traits::{EsmeCallbacks, Transport};
pub use types::{
    DeliveredMessage, DeliveryReport, Role, SessionState, SmsMessage, SmsMessageBuilder,
    SmsOptions,
};
