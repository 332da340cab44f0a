// ABOUTME: The ESME session state machine driving bind, keepalive, role enforcement and dispatch
// ABOUTME: One engine serves transmitter, receiver and transceiver sessions; the role gates traffic

use crate::client::charset::{MessageContent, decode_payload};
use crate::client::config::ClientConfig;
use crate::client::error::{EsmeError, EsmeResult};
use crate::client::handle::Command;
use crate::client::multipart::{MultipartReassembler, extract_fragment};
use crate::client::receipt::DeliveryReceipt;
use crate::client::sequence::SequenceAllocator;
use crate::client::timer::{Timer, TimerKind};
use crate::client::traits::{EsmeCallbacks, Transport};
use crate::client::types::{DeliveredMessage, DeliveryReport, Role, SessionState, SmsMessage};
use crate::codec::{CodecError, Encodable, Frame};
use crate::connection::FrameReader;
use crate::datatypes::{
    BindResponse, CommandStatus, DeliverSm, DeliverSmResponse, EnquireLink, EnquireLinkResponse,
    EsmClass, GenericNack, MessageState, QuerySm, Tlv, Unbind, UnbindResponse, tags,
};
use crate::store::KeyValueStore;
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const RESPONSE_BIT: u32 = 0x8000_0000;

/// SMPP client session.
///
/// The engine owns the session state, its timers and the multipart buffer.
/// It is driven from a single task: inbound frames go through
/// [`handle_frame`](Self::handle_frame), elapsed deadlines through
/// [`fire_due_timers`](Self::fire_due_timers), and outbound operations are
/// plain `&mut self` calls. [`run`](Self::run) wires all three to a
/// [`FrameReader`].
///
/// ```text
/// connection_made ──► CONNECTED ──bind_resp ok──► BOUND_TX / BOUND_RX / BOUND_TRX
///        │                │                                  │
///        │           bind timeout                     unbind / EOF
///        ▼                ▼                                  ▼
///     CLOSED ◄────────────┴──────────────────────────────────┘
/// ```
///
/// Once CLOSED nothing changes state again: inbound frames and timers are
/// ignored and outbound calls fail with `ConnectionLost`.
pub struct Esme<S, T, C> {
    config: ClientConfig,
    role: Role,
    state: SessionState,
    sequencer: Arc<SequenceAllocator<S>>,
    reassembler: MultipartReassembler,
    transport: T,
    callbacks: C,
    bind_timeout: Option<Timer>,
    enquire_link: Option<Timer>,
}

enum Event {
    Frame(Result<Option<Frame>, CodecError>),
    Timer,
    Command(Option<Command>),
}

impl<S, T, C> Esme<S, T, C>
where
    S: KeyValueStore,
    T: Transport,
    C: EsmeCallbacks,
{
    /// Create an unbound session over an already connected transport.
    ///
    /// The allocator is shared so numbering continues across reconnects of
    /// the same client identity.
    pub fn new(
        config: ClientConfig,
        role: Role,
        sequencer: Arc<SequenceAllocator<S>>,
        transport: T,
        callbacks: C,
    ) -> Self {
        Self {
            config,
            role,
            state: SessionState::Unbound,
            sequencer,
            reassembler: MultipartReassembler::new(),
            transport,
            callbacks,
            bind_timeout: None,
            enquire_link: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &Arc<SequenceAllocator<S>> {
        &self.sequencer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    /// True while a bind response is still awaited
    pub fn bind_timeout_pending(&self) -> bool {
        self.bind_timeout.is_some()
    }

    /// True while the enquire_link timer is scheduled
    pub fn keepalive_active(&self) -> bool {
        self.enquire_link.is_some()
    }

    /// Multipart references with parts still outstanding
    pub fn pending_multipart(&self) -> usize {
        self.reassembler.pending_count()
    }

    /// Earliest timer deadline, if any timer is armed
    pub fn next_deadline(&self) -> Option<Instant> {
        [&self.bind_timeout, &self.enquire_link]
            .into_iter()
            .flatten()
            .map(Timer::deadline)
            .min()
    }

    /// The transport is up: send the bind for this role and start the bind
    /// timeout.
    ///
    /// The allocator must number under `config.sequence_key`; build it with
    /// [`ClientConfig::sequencer`].
    pub async fn connection_made(&mut self) -> EsmeResult<()> {
        if self.state != SessionState::Unbound {
            warn!(state = ?self.state, "connection_made on a session that already started");
            return Err(EsmeError::ProtocolStateViolation {
                command: "bind",
                state: self.state,
            });
        }
        if self.sequencer.key() != self.config.sequence_key {
            return Err(EsmeError::InvalidConfig(format!(
                "sequencer key {:?} does not match sequence_key {:?}",
                self.sequencer.key(),
                self.config.sequence_key
            )));
        }

        self.state = SessionState::Connected;
        self.bind_timeout = Some(Timer::once(
            TimerKind::BindTimeout,
            Instant::now(),
            self.config.bind_timeout,
        ));
        info!(addr = %self.config.addr(), role = ?self.role, "connected, binding");

        let sequence_number = self.sequencer.next_sequence().await?;
        let bind = self.config.bind_pdu(self.role, sequence_number);
        self.write(&bind).await
    }

    /// Run every timer whose deadline is at or before `now`.
    ///
    /// A bind timeout closes the session and returns `BindTimeout`.
    pub async fn fire_due_timers(&mut self, now: Instant) -> EsmeResult<()> {
        if self.state.is_closed() {
            return Ok(());
        }

        if self.bind_timeout.as_ref().is_some_and(|t| t.is_due(now)) {
            self.bind_timeout = None;
            error!(
                timeout = ?self.config.bind_timeout,
                "bind timed out, disconnecting"
            );
            self.transport.lose_connection().await;
            self.close_session().await;
            return Err(EsmeError::BindTimeout);
        }

        let keepalive_due = match self.enquire_link.as_mut() {
            Some(timer) if timer.is_due(now) => timer.rearm(now),
            _ => false,
        };
        if keepalive_due && self.state.is_bound() {
            self.enquire_link().await?;
        }
        Ok(())
    }

    /// Dispatch one decoded PDU.
    ///
    /// Role violations and undecodable payloads are logged and answered
    /// here; only infrastructure failures and a rejected bind come back as
    /// errors.
    pub async fn handle_frame(&mut self, frame: Frame) -> EsmeResult<()> {
        if self.state.is_closed() {
            debug!(command_id = ?frame.command_id(), "session closed, ignoring PDU");
            return Ok(());
        }

        match frame {
            Frame::BindResp(response) => self.on_bind_resp(response).await,
            Frame::DeliverSm(pdu) => self.on_deliver_sm(*pdu).await,
            Frame::EnquireLink(pdu) => {
                debug!(sequence_number = pdu.sequence_number, "enquire_link received");
                self.write(&EnquireLinkResponse::new(pdu.sequence_number))
                    .await
            }
            Frame::Unbind(pdu) => {
                info!(sequence_number = pdu.sequence_number, "unbind requested by SMSC");
                self.write(&UnbindResponse::new(pdu.sequence_number)).await?;
                self.transport.lose_connection().await;
                self.close_session().await;
                Ok(())
            }
            Frame::UnbindResp(response) => {
                info!(sequence_number = response.sequence_number, "unbind acknowledged");
                self.transport.lose_connection().await;
                self.close_session().await;
                Ok(())
            }
            Frame::SubmitSmResp(response) => {
                if response.command_status.is_ok() {
                    debug!(
                        sequence_number = response.sequence_number,
                        message_id = %response.message_id,
                        "submit_sm_resp received"
                    );
                } else {
                    warn!(
                        sequence_number = response.sequence_number,
                        status = %response.command_status,
                        "submit_sm rejected"
                    );
                }
                self.callbacks.submit_sm_resp(&response).await;
                Ok(())
            }
            Frame::QuerySmResp(response) => {
                debug!(
                    sequence_number = response.sequence_number,
                    state = ?response.message_state,
                    "query_sm_resp received"
                );
                self.callbacks.query_sm_resp(&response).await;
                Ok(())
            }
            Frame::GenericNack(nack) => {
                warn!(
                    sequence_number = nack.sequence_number,
                    status = %nack.command_status,
                    "generic_nack received"
                );
                Ok(())
            }
            other if other.is_response() => {
                debug!(
                    command_id = ?other.command_id(),
                    sequence_number = other.sequence_number(),
                    "response received"
                );
                Ok(())
            }
            other => {
                let what = if other.command_id().is_bind() {
                    "bind request from SMSC"
                } else {
                    "unsupported request from SMSC"
                };
                warn!(
                    command_id = ?other.command_id(),
                    sequence_number = other.sequence_number(),
                    "{what}"
                );
                self.write(&GenericNack::invalid_command_id(other.sequence_number()))
                    .await
            }
        }
    }

    /// Answer a PDU that was framed correctly but failed to decode.
    ///
    /// Responses are never answered, so a broken submit_sm_resp is only
    /// logged.
    pub async fn handle_rejected(
        &mut self,
        command_id: u32,
        sequence_number: u32,
        cause: &CodecError,
    ) -> EsmeResult<()> {
        if self.state.is_closed() {
            return Ok(());
        }
        if command_id & RESPONSE_BIT != 0 {
            warn!(command_id, sequence_number, error = %cause, "undecodable response, dropped");
            return Ok(());
        }
        warn!(command_id, sequence_number, error = %cause, "undecodable PDU");
        self.write(&GenericNack::error(sequence_number, cause.to_command_status()))
            .await
    }

    async fn on_bind_resp(&mut self, response: BindResponse) -> EsmeResult<()> {
        if self.state != SessionState::Connected {
            warn!(state = ?self.state, "unexpected bind response");
            return Ok(());
        }
        if response.bind_type != self.role.bind_type() {
            warn!(
                expected = ?self.role.bind_type(),
                got = ?response.bind_type,
                "bind response does not match the bind sent"
            );
            return Ok(());
        }

        self.bind_timeout = None;

        if !response.command_status.is_ok() {
            error!(
                status = %response.command_status,
                credentials = response.command_status.is_bind_rejection(),
                "bind rejected by SMSC"
            );
            self.transport.lose_connection().await;
            self.close_session().await;
            return Err(EsmeError::Protocol(response.command_status));
        }

        self.enquire_link = Some(Timer::repeating(
            TimerKind::EnquireLink,
            Instant::now(),
            self.config.enquire_link_interval,
        ));
        self.state = self.role.bound_state();
        info!(
            system_id = %response.system_id,
            state = ?self.state,
            "bound"
        );
        self.callbacks.connect(self.role).await;
        Ok(())
    }

    async fn on_deliver_sm(&mut self, pdu: DeliverSm) -> EsmeResult<()> {
        let sequence_number = pdu.sequence_number;

        if !self.state.can_deliver() {
            let violation = EsmeError::ProtocolStateViolation {
                command: "deliver_sm",
                state: self.state,
            };
            error!(sequence_number, "{violation}");
            return self
                .write(&DeliverSmResponse::error(
                    sequence_number,
                    CommandStatus::IncorrectBindStatus,
                ))
                .await;
        }

        let body = pdu.body;
        let (payload, fragment) = extract_fragment(body.esm_class, &body.payload(), &body.tlvs);

        let payload = match fragment {
            None => payload,
            Some(fragment) => match self.reassembler.accept(
                fragment.reference,
                fragment.part,
                fragment.total,
                payload.clone(),
            ) {
                Ok(Some(joined)) => joined,
                Ok(None) => {
                    return self.write(&DeliverSmResponse::new(sequence_number)).await;
                }
                Err(e) => {
                    warn!(error = %e, "bad fragment header, delivering part on its own");
                    payload
                }
            },
        };

        let data_coding = body.coding();
        let content = match decode_payload(data_coding, &payload) {
            Ok(content) => content,
            Err(e) => {
                error!(sequence_number, "{e}");
                MessageContent::Raw(payload.clone())
            }
        };

        match receipt_from(&body.esm_class, &content, &payload) {
            Some(receipt) => {
                let report = DeliveryReport {
                    sequence_number,
                    source_addr: body.source_addr.clone(),
                    destination_addr: body.destination_addr.clone(),
                    receipted_message_id: body
                        .find_tlv(tags::RECEIPTED_MESSAGE_ID)
                        .and_then(Tlv::as_cstring),
                    message_state: body
                        .find_tlv(tags::MESSAGE_STATE)
                        .and_then(Tlv::as_u8)
                        .and_then(|state| MessageState::try_from(state).ok()),
                    receipt,
                };
                debug!(
                    sequence_number,
                    message_id = ?report.message_id(),
                    status = ?report.receipt.status(),
                    "delivery receipt"
                );
                self.callbacks.delivery_report(report).await;
            }
            None => {
                let message = DeliveredMessage {
                    sequence_number,
                    source_addr: body.source_addr,
                    destination_addr: body.destination_addr,
                    service_type: body.service_type,
                    data_coding,
                    esm_class: body.esm_class,
                    short_message: content,
                };
                debug!(sequence_number, from = %message.source_addr, "deliver_sm");
                self.callbacks.deliver_sm(message).await;
            }
        }

        self.write(&DeliverSmResponse::new(sequence_number)).await
    }

    /// Send a submit_sm for `message`.
    ///
    /// Returns the sequence number used, or `Ok(None)` when the session is
    /// not bound in a role that may submit; that case is logged and nothing
    /// is sent.
    pub async fn submit_sm(&mut self, message: &SmsMessage) -> EsmeResult<Option<u32>> {
        self.ensure_open()?;
        if !self.state.can_submit() {
            let violation = EsmeError::ProtocolStateViolation {
                command: "submit_sm",
                state: self.state,
            };
            error!(to = %message.to, "{violation}");
            return Ok(None);
        }

        let sequence_number = self.sequencer.next_sequence().await?;
        let pdu = message.to_submit_sm(sequence_number)?;
        self.write(&pdu).await?;
        debug!(sequence_number, to = %message.to, "submit_sm sent");
        Ok(Some(sequence_number))
    }

    /// Ask the SMSC for the state of a submitted message. Same role rules
    /// as `submit_sm`.
    pub async fn query_sm(&mut self, message_id: &str, source_addr: &str) -> EsmeResult<Option<u32>> {
        self.ensure_open()?;
        if !self.state.can_submit() {
            let violation = EsmeError::ProtocolStateViolation {
                command: "query_sm",
                state: self.state,
            };
            error!(message_id, "{violation}");
            return Ok(None);
        }

        let sequence_number = self.sequencer.next_sequence().await?;
        self.write(&QuerySm::new(sequence_number, message_id, source_addr))
            .await?;
        debug!(sequence_number, message_id, "query_sm sent");
        Ok(Some(sequence_number))
    }

    pub async fn enquire_link(&mut self) -> EsmeResult<u32> {
        self.ensure_open()?;
        let sequence_number = self.sequencer.next_sequence().await?;
        self.write(&EnquireLink::new(sequence_number)).await?;
        debug!(sequence_number, "enquire_link sent");
        Ok(sequence_number)
    }

    /// Start an orderly shutdown. The keepalive stops now; the session
    /// closes when the SMSC acknowledges.
    pub async fn unbind(&mut self) -> EsmeResult<u32> {
        self.ensure_open()?;
        self.enquire_link = None;
        let sequence_number = self.sequencer.next_sequence().await?;
        self.write(&Unbind::new(sequence_number)).await?;
        info!(sequence_number, "unbind sent");
        Ok(sequence_number)
    }

    /// The transport went away underneath the session.
    pub async fn connection_lost(&mut self) {
        if self.state.is_closed() {
            return;
        }
        warn!(state = ?self.state, "connection lost");
        self.transport.lose_connection().await;
        self.close_session().await;
    }

    /// Drive the session until it closes.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, reader: &mut FrameReader<R>) -> EsmeResult<()> {
        self.run_with(reader, None).await
    }

    /// Drive the session, also serving commands queued through an
    /// [`EsmeHandle`](crate::client::EsmeHandle).
    ///
    /// Returns `Ok(())` after an orderly unbind, the error that closed the
    /// session otherwise.
    pub async fn run_with<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut FrameReader<R>,
        mut commands: Option<mpsc::Receiver<Command>>,
    ) -> EsmeResult<()> {
        while !self.state.is_closed() {
            let deadline = self.next_deadline();

            // Inbound PDUs first, so a queued command never runs ahead of the
            // bind response that is already buffered.
            let event = tokio::select! {
                biased;
                frame = reader.read_frame() => Event::Frame(frame),
                () = sleep_until(deadline) => Event::Timer,
                command = next_command(&mut commands) => Event::Command(command),
            };

            let result = match event {
                Event::Frame(Ok(Some(frame))) => self.handle_frame(frame).await,
                Event::Frame(Ok(None)) => {
                    self.connection_lost().await;
                    Err(EsmeError::ConnectionLost)
                }
                Event::Frame(Err(CodecError::Rejected {
                    command_id,
                    sequence_number,
                    source,
                })) => {
                    self.handle_rejected(command_id, sequence_number, &source)
                        .await
                }
                Event::Frame(Err(e)) => {
                    error!(error = %e, "unreadable stream");
                    self.connection_lost().await;
                    Err(e.into())
                }
                Event::Timer => self.fire_due_timers(Instant::now()).await,
                Event::Command(Some(command)) => {
                    self.execute(command).await;
                    Ok(())
                }
                Event::Command(None) => {
                    debug!("all session handles dropped");
                    commands = None;
                    Ok(())
                }
            };

            if let Err(e) = result {
                if self.state.is_closed() || e.is_fatal() {
                    return Err(e);
                }
                warn!(error = %e, "session operation failed");
            }
        }
        Ok(())
    }

    async fn execute(&mut self, command: Command) {
        // A caller that stopped waiting for its reply is not an error.
        match command {
            Command::SubmitSm { message, reply } => {
                let _ = reply.send(self.submit_sm(&message).await);
            }
            Command::QuerySm {
                message_id,
                source_addr,
                reply,
            } => {
                let _ = reply.send(self.query_sm(&message_id, &source_addr).await);
            }
            Command::EnquireLink { reply } => {
                let _ = reply.send(self.enquire_link().await);
            }
            Command::Unbind { reply } => {
                let _ = reply.send(self.unbind().await);
            }
        }
    }

    fn ensure_open(&self) -> EsmeResult<()> {
        if self.state.is_closed() {
            return Err(EsmeError::ConnectionLost);
        }
        Ok(())
    }

    async fn write<P: Encodable>(&mut self, pdu: &P) -> EsmeResult<()> {
        let bytes = pdu.to_bytes()?;
        if let Err(e) = self.transport.write(bytes).await {
            warn!(error = %e, "write failed");
            self.connection_lost().await;
            return Err(EsmeError::ConnectionLost);
        }
        Ok(())
    }

    async fn close_session(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.bind_timeout = None;
        self.enquire_link = None;
        self.reassembler.clear();
        self.state = SessionState::Closed;
        info!("session closed");
        self.callbacks.disconnect().await;
    }
}

/// A deliver_sm is a receipt when esm_class says so or its text names both
/// a message id and a state.
fn receipt_from(
    esm_class: &EsmClass,
    content: &MessageContent,
    payload: &Bytes,
) -> Option<DeliveryReceipt> {
    let flagged = esm_class.is_delivery_receipt();
    let receipt = match content {
        MessageContent::Text(text) => DeliveryReceipt::parse(text),
        MessageContent::Raw(_) if flagged => DeliveryReceipt::parse(&String::from_utf8_lossy(payload)),
        MessageContent::Raw(_) => return None,
    };
    (flagged || receipt.is_receipt()).then_some(receipt)
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn next_command(commands: &mut Option<mpsc::Receiver<Command>>) -> Option<Command> {
    match commands {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
