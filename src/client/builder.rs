// ABOUTME: Opens a TCP connection to the SMSC and hands back a session that has sent its bind
// ABOUTME: Convenience constructors cover the three roles over the same engine

use crate::client::config::ClientConfig;
use crate::client::error::EsmeResult;
use crate::client::esme::Esme;
use crate::client::sequence::SequenceAllocator;
use crate::client::traits::EsmeCallbacks;
use crate::client::types::Role;
use crate::connection::{self, FrameReader, TcpTransport};
use crate::store::KeyValueStore;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tracing::debug;

/// A TCP session together with the reader that feeds it.
pub type TcpSession<S, C> = (Esme<S, TcpTransport, C>, FrameReader<OwnedReadHalf>);

/// Factory for TCP-backed sessions.
///
/// Each call connects, sends the bind for the requested role and starts the
/// bind timeout. The session is bound once `run` has processed the bind
/// response.
///
/// ```rust,no_run
/// use smpp_esme::client::{ClientBuilder, ClientConfig};
/// use smpp_esme::store::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new("localhost", 2775, "esme", "secret");
/// let sequencer = Arc::new(config.sequencer(MemoryStore::new()));
/// let (mut esme, mut reader) = ClientBuilder::transceiver(config, sequencer, ()).await?;
/// esme.run(&mut reader).await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder;

impl ClientBuilder {
    pub async fn connect<S, C>(
        config: ClientConfig,
        role: Role,
        sequencer: Arc<SequenceAllocator<S>>,
        callbacks: C,
    ) -> EsmeResult<TcpSession<S, C>>
    where
        S: KeyValueStore,
        C: EsmeCallbacks,
    {
        config.validate()?;
        let stream = TcpStream::connect(config.addr()).await?;
        stream.set_nodelay(true)?;
        debug!(addr = %config.addr(), "tcp connected");

        let (reader, transport) = connection::split(stream);
        let mut esme = Esme::new(config, role, sequencer, transport, callbacks);
        esme.connection_made().await?;
        Ok((esme, reader))
    }

    pub async fn transmitter<S, C>(
        config: ClientConfig,
        sequencer: Arc<SequenceAllocator<S>>,
        callbacks: C,
    ) -> EsmeResult<TcpSession<S, C>>
    where
        S: KeyValueStore,
        C: EsmeCallbacks,
    {
        Self::connect(config, Role::Transmitter, sequencer, callbacks).await
    }

    pub async fn receiver<S, C>(
        config: ClientConfig,
        sequencer: Arc<SequenceAllocator<S>>,
        callbacks: C,
    ) -> EsmeResult<TcpSession<S, C>>
    where
        S: KeyValueStore,
        C: EsmeCallbacks,
    {
        Self::connect(config, Role::Receiver, sequencer, callbacks).await
    }

    pub async fn transceiver<S, C>(
        config: ClientConfig,
        sequencer: Arc<SequenceAllocator<S>>,
        callbacks: C,
    ) -> EsmeResult<TcpSession<S, C>>
    where
        S: KeyValueStore,
        C: EsmeCallbacks,
    {
        Self::connect(config, Role::Transceiver, sequencer, callbacks).await
    }
}
