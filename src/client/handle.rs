// ABOUTME: Channel handle for driving outbound operations on a session owned by its run loop
// ABOUTME: Each command carries a oneshot reply so callers see the same result as a direct call

use crate::client::error::{EsmeError, EsmeResult};
use crate::client::types::SmsMessage;
use tokio::sync::{mpsc, oneshot};

/// Request queued for the session task.
#[derive(Debug)]
pub enum Command {
    SubmitSm {
        message: SmsMessage,
        reply: oneshot::Sender<EsmeResult<Option<u32>>>,
    },
    QuerySm {
        message_id: String,
        source_addr: String,
        reply: oneshot::Sender<EsmeResult<Option<u32>>>,
    },
    EnquireLink {
        reply: oneshot::Sender<EsmeResult<u32>>,
    },
    Unbind {
        reply: oneshot::Sender<EsmeResult<u32>>,
    },
}

/// Cloneable sender side of a session's command queue.
///
/// Once the session has closed every call fails with `ConnectionLost`.
#[derive(Debug, Clone)]
pub struct EsmeHandle {
    tx: mpsc::Sender<Command>,
}

impl EsmeHandle {
    /// Create a handle and the receiver to pass to [`Esme::run_with`](crate::client::Esme::run_with).
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a submit_sm. `Ok(None)` means the session is bound in a role
    /// that cannot submit and nothing was sent.
    pub async fn submit_sm(&self, message: SmsMessage) -> EsmeResult<Option<u32>> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::SubmitSm { message, reply }, rx).await
    }

    pub async fn query_sm(
        &self,
        message_id: impl Into<String>,
        source_addr: impl Into<String>,
    ) -> EsmeResult<Option<u32>> {
        let (reply, rx) = oneshot::channel();
        let command = Command::QuerySm {
            message_id: message_id.into(),
            source_addr: source_addr.into(),
            reply,
        };
        self.request(command, rx).await
    }

    pub async fn enquire_link(&self) -> EsmeResult<u32> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::EnquireLink { reply }, rx).await
    }

    pub async fn unbind(&self) -> EsmeResult<u32> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Unbind { reply }, rx).await
    }

    async fn request<R>(&self, command: Command, rx: oneshot::Receiver<EsmeResult<R>>) -> EsmeResult<R> {
        self.tx
            .send(command)
            .await
            .map_err(|_| EsmeError::ConnectionLost)?;
        rx.await.map_err(|_| EsmeError::ConnectionLost)?
    }
}
