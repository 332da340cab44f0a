// ABOUTME: Connection parameters for an ESME session, fixed at construction
// ABOUTME: Defaults match a local SMSC on 2775 with a 30s bind window and 55s keepalive

use crate::client::error::{EsmeError, EsmeResult};
use crate::client::sequence::{DEFAULT_SEQUENCE_KEY, SequenceAllocator};
use crate::client::types::Role;
use crate::datatypes::{Bind, InterfaceVersion, NumericPlanIndicator, TypeOfNumber};
use crate::macros::builder_setters;
use crate::store::KeyValueStore;
use std::time::Duration;

/// Parameters for one ESME session.
///
/// # Example
///
/// ```rust
/// use smpp_esme::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("smsc.example.com", 2775, "esme", "secret")
///     .with_bind_timeout(Duration::from_secs(10))
///     .with_system_type("vma");
/// assert_eq!(config.addr(), "smsc.example.com:2775");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: String,
    /// How long to wait for a bind response before disconnecting
    pub bind_timeout: Duration,
    /// Period of the enquire_link keepalive once bound
    pub enquire_link_interval: Duration,
    /// Store key for the last issued sequence number
    pub sequence_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2775,
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::default(),
            addr_npi: NumericPlanIndicator::default(),
            address_range: String::new(),
            bind_timeout: Duration::from_secs(30),
            enquire_link_interval: Duration::from_secs(55),
            sequence_key: DEFAULT_SEQUENCE_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        system_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            system_id: system_id.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    builder_setters! {
        with_system_type => system_type: String,
        with_interface_version => interface_version: InterfaceVersion,
        with_addr_ton => addr_ton: TypeOfNumber,
        with_addr_npi => addr_npi: NumericPlanIndicator,
        with_address_range => address_range: String,
        with_bind_timeout => bind_timeout: Duration,
        with_enquire_link_interval => enquire_link_interval: Duration,
        with_sequence_key => sequence_key: String,
    }

    /// `host:port`, as accepted by `TcpStream::connect`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check field lengths and timer values before connecting.
    pub fn validate(&self) -> EsmeResult<()> {
        let too_long = |field: &str, max: usize| {
            EsmeError::InvalidConfig(format!("{field} exceeds {max} characters"))
        };
        if self.host.is_empty() {
            return Err(EsmeError::InvalidConfig("host is empty".into()));
        }
        if self.system_id.len() > 15 {
            return Err(too_long("system_id", 15));
        }
        if self.password.len() > 8 {
            return Err(too_long("password", 8));
        }
        if self.system_type.len() > 12 {
            return Err(too_long("system_type", 12));
        }
        if self.address_range.len() > 40 {
            return Err(too_long("address_range", 40));
        }
        if self.bind_timeout.is_zero() || self.enquire_link_interval.is_zero() {
            return Err(EsmeError::InvalidConfig(
                "bind_timeout and enquire_link_interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Sequence allocator over `store`, numbering under this config's key
    pub fn sequencer<S: KeyValueStore>(&self, store: S) -> SequenceAllocator<S> {
        SequenceAllocator::with_key(store, self.sequence_key.clone())
    }

    /// Bind request for `role` carrying these credentials
    pub fn bind_pdu(&self, role: Role, sequence_number: u32) -> Bind {
        Bind {
            system_id: self.system_id.clone(),
            password: self.password.clone(),
            system_type: self.system_type.clone(),
            interface_version: self.interface_version,
            addr_ton: self.addr_ton,
            addr_npi: self.addr_npi,
            address_range: self.address_range.clone(),
            ..Bind::new(role.bind_type(), sequence_number)
        }
    }
}
