// ABOUTME: Provides frame-based I/O over a split TCP stream for an ESME session
// ABOUTME: The read half yields typed frames; the write half is the engine's Transport

use crate::client::Transport;
use crate::codec::{CodecError, Frame};
use bytes::{Buf, Bytes, BytesMut};
use std::io::{self, Cursor};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::trace;

/// Reads `Frame`s from the inbound half of an SMPP connection.
///
/// The SMPP byte stream is a sequence of length-prefixed PDUs. Bytes are
/// buffered until `command_length` octets are available, then exactly that
/// slice is handed to the decoder, so a malformed body never desynchronises
/// the stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    stream: R,

    // The buffer for reading frames.
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(stream: R) -> Self {
        FrameReader {
            stream,
            // 4KB covers the common PDU sizes; the buffer grows for larger ones.
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single `Frame` value from the underlying stream.
    ///
    /// The function waits until it has retrieved enough data to parse a frame.
    /// Any data remaining in the read buffer after the frame has been parsed is
    /// kept there for the next call to `read_frame`.
    ///
    /// # Returns
    ///
    /// On success, the received frame is returned. If the stream is closed in
    /// a way that doesn't break a frame in half, it returns `None`. A well
    /// framed PDU that fails to decode is returned as `CodecError::Rejected`
    /// and the stream stays usable; any other error means the connection
    /// should be dropped.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, CodecError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            // `0` indicates "end of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // For this to be a clean shutdown, there should be no data in
                // the read buffer.
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset by peer mid-frame",
                    )
                    .into())
                };
            }
        }
    }

    fn parse_frame(&mut self) -> Result<Option<Frame>, CodecError> {
        let len = match Frame::check(&self.buffer) {
            Ok(len) => len,
            // Not enough data buffered yet; this is an expected runtime condition.
            Err(CodecError::Incomplete) => return Ok(None),
            // A corrupt length prefix leaves no way to find the next PDU.
            Err(e) => return Err(e),
        };

        let pdu = self.buffer.split_to(len).freeze();
        trace!(len, "framed PDU");

        let mut cursor = Cursor::new(&pdu[..]);
        match Frame::parse(&mut cursor) {
            Ok(frame) => Ok(Some(frame)),
            Err(source) => Err(CodecError::Rejected {
                command_id: Frame::peek_command_id(&pdu).unwrap_or(0),
                sequence_number: Frame::peek_sequence_number(&pdu).unwrap_or(0),
                source: Box::new(source),
            }),
        }
    }

    /// Bytes buffered but not yet returned as frames
    pub fn buffered(&self) -> usize {
        self.buffer.remaining()
    }
}

/// Outbound half of a TCP connection.
///
/// Writes go through a `BufWriter` and are flushed per PDU so nothing sits
/// in the buffer while the engine waits on the peer.
#[derive(Debug)]
pub struct TcpTransport {
    stream: BufWriter<OwnedWriteHalf>,
    connected: bool,
}

impl TcpTransport {
    pub fn new(stream: OwnedWriteHalf) -> Self {
        TcpTransport {
            stream: BufWriter::new(stream),
            connected: true,
        }
    }
}

impl Transport for TcpTransport {
    async fn write(&mut self, pdu: Bytes) -> io::Result<()> {
        if !self.connected {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport already closed",
            ));
        }
        self.stream.write_all(&pdu).await?;
        self.stream.flush().await
    }

    async fn lose_connection(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        // The peer may already be gone; shutdown failures change nothing.
        if let Err(e) = self.stream.shutdown().await {
            trace!(error = %e, "shutdown after close");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Split a connected socket into the reader and transport halves.
pub fn split(stream: tokio::net::TcpStream) -> (FrameReader<OwnedReadHalf>, TcpTransport) {
    let (read, write) = stream.into_split();
    (FrameReader::new(read), TcpTransport::new(write))
}
