//! Session engine scenarios, driven through an in-memory transport

use crate::client::*;
use crate::codec::{Encodable, Frame, PduHeader};
use crate::connection::FrameReader;
use crate::datatypes::*;
use crate::store::{KeyValueStore, MemoryStore, StoreError};
use bytes::Bytes;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;

const RECEIPT: &str = "id:1b1720be-5f48-41c4-b3f8-6e59dbf45366 sub:001 dlvrd:001 \
     submit date:120726132548 done date:120726132548 stat:DELIVRD err:000 text:";

#[derive(Debug, Default)]
struct FakeTransport {
    written: Vec<Bytes>,
    closed: bool,
}

impl FakeTransport {
    fn frames(&self) -> Vec<Frame> {
        self.written
            .iter()
            .map(|pdu| Frame::decode(pdu).expect("engine wrote an undecodable PDU"))
            .collect()
    }

    fn last_frame(&self) -> Frame {
        self.frames().pop().expect("nothing written")
    }
}

impl Transport for FakeTransport {
    async fn write(&mut self, pdu: Bytes) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        self.written.push(pdu);
        Ok(())
    }

    async fn lose_connection(&mut self) {
        self.closed = true;
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }
}

#[derive(Debug, Default)]
struct Recorder {
    connected: Vec<Role>,
    disconnects: usize,
    delivered: Vec<DeliveredMessage>,
    reports: Vec<DeliveryReport>,
    submit_resps: Vec<SubmitSmResponse>,
}

impl EsmeCallbacks for Recorder {
    async fn connect(&mut self, role: Role) {
        self.connected.push(role);
    }

    async fn disconnect(&mut self) {
        self.disconnects += 1;
    }

    async fn submit_sm_resp(&mut self, response: &SubmitSmResponse) {
        self.submit_resps.push(response.clone());
    }

    async fn deliver_sm(&mut self, message: DeliveredMessage) {
        self.delivered.push(message);
    }

    async fn delivery_report(&mut self, report: DeliveryReport) {
        self.reports.push(report);
    }
}

/// Store that can be switched off to simulate an unreachable backend
#[derive(Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    down: AtomicBool,
}

impl FlakyStore {
    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: u32) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, value).await
    }
}

/// Formatted tracing output captured for assertions
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn error_lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains("ERROR"))
            .map(str::to_owned)
            .collect()
    }
}

fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}

type TestEsme<S = MemoryStore> = Esme<S, FakeTransport, Recorder>;

fn config() -> ClientConfig {
    ClientConfig::new("localhost", 2775, "esme", "secret")
}

fn session_with<S: KeyValueStore>(role: Role, store: S) -> TestEsme<S> {
    let sequencer = Arc::new(SequenceAllocator::new(store));
    Esme::new(
        config(),
        role,
        sequencer,
        FakeTransport::default(),
        Recorder::default(),
    )
}

fn session(role: Role) -> TestEsme {
    session_with(role, MemoryStore::new())
}

async fn bind<S: KeyValueStore>(esme: &mut TestEsme<S>) {
    esme.connection_made().await.unwrap();
    let sequence_number = esme.transport().last_frame().sequence_number();
    let response = BindResponse::new(esme.role().bind_type(), sequence_number, "smsc");
    esme.handle_frame(Frame::BindResp(response)).await.unwrap();
}

async fn bound(role: Role) -> TestEsme {
    let mut esme = session(role);
    bind(&mut esme).await;
    esme
}

fn deliver_sm(sequence_number: u32, body: MessageBody) -> Frame {
    Frame::DeliverSm(Box::new(DeliverSm::new(sequence_number, body)))
}

fn text_body(payload: &'static [u8]) -> MessageBody {
    MessageBody::default()
        .source_addr("27831234567")
        .destination_addr("1234")
        .short_message(payload)
}

fn utf16be(text: &str) -> Bytes {
    text.encode_utf16()
        .flat_map(|unit| unit.to_be_bytes())
        .collect::<Vec<u8>>()
        .into()
}

#[tokio::test(start_paused = true)]
async fn bind_timeout_disconnects_and_clears_handle() {
    let mut esme = session(Role::Transmitter);
    esme.connection_made().await.unwrap();

    assert_eq!(esme.state(), SessionState::Connected);
    assert!(esme.bind_timeout_pending());
    match esme.transport().last_frame() {
        Frame::Bind(bind) => {
            assert_eq!(bind.bind_type, BindType::Transmitter);
            assert_eq!(bind.system_id, "esme");
            assert_eq!(bind.password, "secret");
            assert_eq!(bind.sequence_number, 1);
        }
        other => panic!("expected bind, got {other:?}"),
    }

    tokio::time::advance(Duration::from_secs(29)).await;
    esme.fire_due_timers(Instant::now()).await.unwrap();
    assert!(esme.bind_timeout_pending());
    assert!(esme.transport().is_connected());

    tokio::time::advance(Duration::from_secs(1)).await;
    let result = esme.fire_due_timers(Instant::now()).await;
    assert!(matches!(result, Err(EsmeError::BindTimeout)));
    assert!(!esme.bind_timeout_pending());
    assert!(!esme.transport().is_connected());
    assert_eq!(esme.state(), SessionState::Closed);
    assert_eq!(esme.callbacks().disconnects, 1);
    assert!(esme.callbacks().connected.is_empty());
}

#[tokio::test]
async fn bind_success_for_every_role() {
    for role in [Role::Transmitter, Role::Receiver, Role::Transceiver] {
        let esme = bound(role).await;
        assert!(!esme.bind_timeout_pending(), "{role:?}");
        assert!(esme.keepalive_active(), "{role:?}");
        assert!(esme.transport().is_connected(), "{role:?}");
        assert_eq!(esme.state(), role.bound_state());
        assert_eq!(esme.callbacks().connected, vec![role]);

        match esme.transport().frames().first() {
            Some(Frame::Bind(bind)) => assert_eq!(bind.bind_type, role.bind_type()),
            other => panic!("expected bind, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn rejected_bind_closes_session() {
    let mut esme = session(Role::Receiver);
    esme.connection_made().await.unwrap();

    let response = BindResponse::error(BindType::Receiver, 1, CommandStatus::InvalidPassword);
    let result = esme.handle_frame(Frame::BindResp(response)).await;

    assert!(matches!(
        result,
        Err(EsmeError::Protocol(CommandStatus::InvalidPassword))
    ));
    assert_eq!(esme.state(), SessionState::Closed);
    assert!(!esme.bind_timeout_pending());
    assert!(!esme.transport().is_connected());
    assert!(esme.callbacks().connected.is_empty());
}

#[tokio::test(start_paused = true)]
async fn keepalive_sends_enquire_link_each_interval() {
    let mut esme = bound(Role::Transceiver).await;
    let interval = esme.config().enquire_link_interval;

    tokio::time::advance(interval - Duration::from_secs(1)).await;
    esme.fire_due_timers(Instant::now()).await.unwrap();
    assert_eq!(esme.transport().written.len(), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    esme.fire_due_timers(Instant::now()).await.unwrap();
    assert_eq!(
        esme.transport().last_frame(),
        Frame::EnquireLink(EnquireLink::new(2))
    );

    tokio::time::advance(interval).await;
    esme.fire_due_timers(Instant::now()).await.unwrap();
    assert_eq!(
        esme.transport().last_frame(),
        Frame::EnquireLink(EnquireLink::new(3))
    );
    assert_eq!(esme.state(), SessionState::BoundTrx);
}

#[tokio::test]
async fn connection_made_refuses_a_sequencer_under_another_key() {
    let sequencer = Arc::new(SequenceAllocator::with_key(MemoryStore::new(), "other"));
    let mut esme: TestEsme = Esme::new(
        config(),
        Role::Transmitter,
        sequencer,
        FakeTransport::default(),
        Recorder::default(),
    );

    assert!(matches!(
        esme.connection_made().await,
        Err(EsmeError::InvalidConfig(_))
    ));
    assert_eq!(esme.state(), SessionState::Unbound);
    assert!(esme.transport().written.is_empty());

    let config = config().with_sequence_key("other");
    let sequencer = Arc::new(config.sequencer(MemoryStore::new()));
    let mut esme: TestEsme = Esme::new(
        config,
        Role::Transmitter,
        sequencer,
        FakeTransport::default(),
        Recorder::default(),
    );
    esme.connection_made().await.unwrap();
    assert_eq!(esme.sequencer().store().value("other"), Some(1));
}

#[tokio::test]
async fn sequence_numbers_come_from_the_store() {
    let mut esme = bound(Role::Transmitter).await;
    let sms = SmsMessage::new("27831234567", "1234", "hello");

    assert_eq!(esme.submit_sm(&sms).await.unwrap(), Some(2));
    assert_eq!(esme.submit_sm(&sms).await.unwrap(), Some(3));
    assert_eq!(
        esme.sequencer().store().value(DEFAULT_SEQUENCE_KEY),
        Some(3)
    );

    match esme.transport().last_frame() {
        Frame::SubmitSm(pdu) => {
            assert_eq!(pdu.sequence_number, 3);
            assert_eq!(pdu.body.short_message.as_ref(), b"hello");
        }
        other => panic!("expected submit_sm, got {other:?}"),
    }
}

#[tokio::test]
async fn sequence_rollover_is_one_allocation_late() {
    let store = MemoryStore::with_value(DEFAULT_SEQUENCE_KEY, ROLLOVER_THRESHOLD);
    let mut esme = session_with(Role::Transmitter, store);
    bind(&mut esme).await;
    assert_eq!(
        esme.transport().frames()[0].sequence_number(),
        0xFFFF_0001
    );

    let sms = SmsMessage::new("1", "2", "wrapped");
    assert_eq!(esme.submit_sm(&sms).await.unwrap(), Some(1));
}

#[tokio::test]
async fn store_outage_fails_the_send_only() {
    let mut esme = session_with(Role::Transmitter, FlakyStore::default());
    bind(&mut esme).await;
    let sms = SmsMessage::new("1", "2", "hi");

    esme.sequencer().store().set_down(true);
    assert!(matches!(
        esme.submit_sm(&sms).await,
        Err(EsmeError::StoreUnavailable(_))
    ));
    assert_eq!(esme.state(), SessionState::BoundTx);
    assert!(esme.transport().is_connected());
    assert_eq!(esme.transport().written.len(), 1);

    esme.sequencer().store().set_down(false);
    assert_eq!(esme.submit_sm(&sms).await.unwrap(), Some(2));
}

#[tokio::test]
async fn deliver_sm_reaches_callback_and_is_acknowledged() {
    let mut esme = bound(Role::Receiver).await;
    esme.handle_frame(deliver_sm(5, text_body(b"hello")))
        .await
        .unwrap();

    let delivered = &esme.callbacks().delivered;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].short_message.as_text(), Some("hello"));
    assert_eq!(delivered[0].source_addr, "27831234567");
    assert_eq!(delivered[0].sequence_number, 5);
    assert_eq!(
        esme.transport().last_frame(),
        Frame::DeliverSmResp(DeliverSmResponse::new(5))
    );
}

#[tokio::test]
async fn ucs2_payload_is_decoded() {
    let mut esme = bound(Role::Transceiver).await;
    let body = MessageBody::default()
        .source_addr("27831234567")
        .data_coding(0x08u8)
        .short_message(utf16be("hello"));
    esme.handle_frame(deliver_sm(6, body)).await.unwrap();

    let delivered = &esme.callbacks().delivered;
    assert_eq!(delivered[0].short_message, MessageContent::Text("hello".into()));
    assert_eq!(delivered[0].data_coding, DataCoding::Ucs2);
}

#[tokio::test]
async fn eight_bit_data_with_message_class_is_delivered_raw() {
    let mut esme = bound(Role::Transceiver).await;
    let (logs, _guard) = capture_logs();

    let payload: &'static [u8] = &[0x0B, 0x05, 0x04, 0x0B, 0x84, 0x23];
    let body = MessageBody::default()
        .source_addr("27831234567")
        .data_coding(0xF5u8)
        .short_message(payload);
    esme.handle_frame(deliver_sm(9, body)).await.unwrap();

    let delivered = &esme.callbacks().delivered;
    assert_eq!(
        delivered[0].short_message,
        MessageContent::Raw(Bytes::from_static(payload))
    );
    assert_eq!(
        delivered[0].data_coding,
        DataCoding::OctetWithClass(MessageClass::MobileEquipment)
    );
    assert!(logs.error_lines().is_empty());
    assert_eq!(
        esme.transport().last_frame(),
        Frame::DeliverSmResp(DeliverSmResponse::new(9))
    );
}

#[tokio::test]
async fn undecodable_ucs2_is_delivered_raw_with_one_error() {
    let mut esme = bound(Role::Transceiver).await;
    let (logs, _guard) = capture_logs();

    let payload: &'static [u8] = b"\n\x00h\x00e\x00l\x00l\x00o";
    let body = MessageBody::default()
        .source_addr("27831234567")
        .data_coding(0x08u8)
        .short_message(payload);
    let result = esme.handle_frame(deliver_sm(7, body)).await;

    assert!(result.is_ok());
    let delivered = &esme.callbacks().delivered;
    assert_eq!(delivered.len(), 1);
    assert_eq!(
        delivered[0].short_message,
        MessageContent::Raw(Bytes::from_static(payload))
    );

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("failed to decode payload"));
    assert_eq!(
        esme.transport().last_frame(),
        Frame::DeliverSmResp(DeliverSmResponse::new(7))
    );
}

#[tokio::test]
async fn delivery_receipt_goes_to_delivery_report() {
    let mut esme = bound(Role::Receiver).await;
    let body = MessageBody::default()
        .source_addr("27831234567")
        .esm_class(EsmClass::delivery_receipt())
        .short_message(RECEIPT.as_bytes())
        .tlv(Tlv::from_cstring(tags::RECEIPTED_MESSAGE_ID, "smsc-1"))
        .tlv(Tlv::from_u8(tags::MESSAGE_STATE, 2));
    esme.handle_frame(deliver_sm(8, body)).await.unwrap();

    assert!(esme.callbacks().delivered.is_empty());
    let report = &esme.callbacks().reports[0];
    assert_eq!(report.receipt.stat(), Some("DELIVRD"));
    assert_eq!(report.receipt.status(), DeliveryStatus::Delivered);
    assert_eq!(
        report.receipt.id(),
        Some("1b1720be-5f48-41c4-b3f8-6e59dbf45366")
    );
    assert_eq!(report.message_id(), Some("smsc-1"));
    assert_eq!(report.message_state, Some(MessageState::Delivered));
    assert_eq!(
        esme.transport().last_frame(),
        Frame::DeliverSmResp(DeliverSmResponse::new(8))
    );
}

#[tokio::test]
async fn receipt_text_is_recognised_without_esm_class() {
    let mut esme = bound(Role::Receiver).await;
    esme.handle_frame(deliver_sm(9, text_body(RECEIPT.as_bytes())))
        .await
        .unwrap();

    assert!(esme.callbacks().delivered.is_empty());
    assert_eq!(esme.callbacks().reports.len(), 1);
    assert_eq!(
        esme.callbacks().reports[0].message_id(),
        Some("1b1720be-5f48-41c4-b3f8-6e59dbf45366")
    );
}

#[tokio::test]
async fn multipart_parts_are_joined_in_order() {
    let mut esme = bound(Role::Receiver).await;

    esme.handle_frame(deliver_sm(10, text_body(b"\x05\x00\x03\xff\x02\x02 world")))
        .await
        .unwrap();
    assert!(esme.callbacks().delivered.is_empty());
    assert_eq!(esme.pending_multipart(), 1);
    assert_eq!(
        esme.transport().last_frame(),
        Frame::DeliverSmResp(DeliverSmResponse::new(10))
    );

    esme.handle_frame(deliver_sm(11, text_body(b"\x05\x00\x03\xff\x02\x01hello")))
        .await
        .unwrap();
    let delivered = &esme.callbacks().delivered;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].short_message.as_text(), Some("hello world"));
    assert_eq!(delivered[0].sequence_number, 11);
    assert_eq!(esme.pending_multipart(), 0);
}

#[tokio::test]
async fn multipart_from_sar_parameters() {
    let mut esme = bound(Role::Transceiver).await;
    for (sequence_number, part, text) in [(20, 2u8, &b"def"[..]), (21, 1, &b"abc"[..])] {
        let body = text_body(text)
            .tlv(Tlv::from_u16(tags::SAR_MSG_REF_NUM, 0x0102))
            .tlv(Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, 2))
            .tlv(Tlv::from_u8(tags::SAR_SEGMENT_SEQNUM, part));
        esme.handle_frame(deliver_sm(sequence_number, body))
            .await
            .unwrap();
    }
    assert_eq!(
        esme.callbacks().delivered[0].short_message.as_text(),
        Some("abcdef")
    );
}

#[tokio::test]
async fn transmitter_rejects_deliver_sm() {
    let mut esme = bound(Role::Transmitter).await;
    let (logs, _guard) = capture_logs();

    let result = esme.handle_frame(deliver_sm(12, text_body(b"hello"))).await;

    assert!(result.is_ok());
    assert!(esme.callbacks().delivered.is_empty());
    assert_eq!(esme.state(), SessionState::BoundTx);

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("deliver_sm in wrong state"));

    assert_eq!(
        esme.transport().last_frame(),
        Frame::DeliverSmResp(DeliverSmResponse::error(
            12,
            CommandStatus::IncorrectBindStatus
        ))
    );
}

#[tokio::test]
async fn receiver_refuses_to_submit() {
    let mut esme = bound(Role::Receiver).await;
    let (logs, _guard) = capture_logs();

    let sms = SmsMessage::new("27831234567", "1234", "hello");
    assert_eq!(esme.submit_sm(&sms).await.unwrap(), None);

    assert_eq!(esme.transport().written.len(), 1);
    assert_eq!(esme.state(), SessionState::BoundRx);
    assert_eq!(
        esme.sequencer().store().value(DEFAULT_SEQUENCE_KEY),
        Some(1)
    );

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("submit_sm in wrong state"));
}

#[tokio::test]
async fn submit_before_bind_is_refused() {
    let mut esme = session(Role::Transmitter);
    esme.connection_made().await.unwrap();

    let sms = SmsMessage::new("1", "2", "early");
    assert_eq!(esme.submit_sm(&sms).await.unwrap(), None);
    assert_eq!(esme.transport().written.len(), 1);
}

#[tokio::test]
async fn submit_sm_resp_reaches_callback() {
    let mut esme = bound(Role::Transmitter).await;
    esme.handle_frame(Frame::SubmitSmResp(SubmitSmResponse::new(2, "abc123")))
        .await
        .unwrap();
    assert_eq!(esme.callbacks().submit_resps[0].message_id, "abc123");
}

#[tokio::test]
async fn inbound_enquire_link_is_answered() {
    let mut esme = bound(Role::Receiver).await;
    esme.handle_frame(Frame::EnquireLink(EnquireLink::new(77)))
        .await
        .unwrap();
    assert_eq!(
        esme.transport().last_frame(),
        Frame::EnquireLinkResp(EnquireLinkResponse::new(77))
    );
    assert_eq!(esme.state(), SessionState::BoundRx);
}

#[tokio::test]
async fn inbound_unbind_is_answered_then_closed() {
    let mut esme = bound(Role::Transceiver).await;
    esme.handle_frame(Frame::Unbind(Unbind::new(9))).await.unwrap();

    assert_eq!(
        esme.transport().last_frame(),
        Frame::UnbindResp(UnbindResponse::new(9))
    );
    assert_eq!(esme.state(), SessionState::Closed);
    assert!(!esme.transport().is_connected());
    assert!(!esme.keepalive_active());
    assert_eq!(esme.callbacks().disconnects, 1);
}

#[tokio::test]
async fn outbound_unbind_stops_keepalive_and_closes_on_response() {
    let mut esme = bound(Role::Transmitter).await;
    let sequence_number = esme.unbind().await.unwrap();

    assert_eq!(sequence_number, 2);
    assert!(!esme.keepalive_active());
    assert_eq!(esme.state(), SessionState::BoundTx);

    esme.handle_frame(Frame::UnbindResp(UnbindResponse::new(sequence_number)))
        .await
        .unwrap();
    assert_eq!(esme.state(), SessionState::Closed);
}

#[tokio::test]
async fn unsupported_request_gets_generic_nack() {
    let mut esme = bound(Role::Transceiver).await;
    let header = PduHeader::new(CommandId::Outbind, CommandStatus::Ok, 12);
    esme.handle_frame(Frame::Unknown {
        header,
        body: Bytes::new(),
    })
    .await
    .unwrap();

    assert_eq!(
        esme.transport().last_frame(),
        Frame::GenericNack(GenericNack::invalid_command_id(12))
    );
}

#[tokio::test(start_paused = true)]
async fn closed_session_is_inert() {
    let mut esme = bound(Role::Transceiver).await;
    esme.connection_lost().await;

    assert_eq!(esme.state(), SessionState::Closed);
    assert!(!esme.keepalive_active());
    assert_eq!(esme.next_deadline(), None);
    assert_eq!(esme.callbacks().disconnects, 1);
    let written = esme.transport().written.len();

    esme.handle_frame(deliver_sm(30, text_body(b"late")))
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(600)).await;
    esme.fire_due_timers(Instant::now()).await.unwrap();

    assert!(esme.callbacks().delivered.is_empty());
    assert_eq!(esme.transport().written.len(), written);
    assert!(matches!(
        esme.submit_sm(&SmsMessage::new("1", "2", "x")).await,
        Err(EsmeError::ConnectionLost)
    ));

    esme.connection_lost().await;
    assert_eq!(esme.callbacks().disconnects, 1);
}

#[tokio::test]
async fn run_processes_wire_traffic_until_unbind() {
    let mut esme = session(Role::Receiver);
    esme.connection_made().await.unwrap();

    let (client, mut server) = tokio::io::duplex(4096);
    let mut wire = Vec::new();
    wire.extend_from_slice(
        &BindResponse::new(BindType::Receiver, 1, "smsc")
            .to_bytes()
            .unwrap(),
    );
    wire.extend_from_slice(&DeliverSm::new(40, text_body(b"over the wire")).to_bytes().unwrap());
    wire.extend_from_slice(&Unbind::new(41).to_bytes().unwrap());
    server.write_all(&wire).await.unwrap();

    let mut reader = FrameReader::new(client);
    esme.run(&mut reader).await.unwrap();

    assert_eq!(esme.state(), SessionState::Closed);
    assert_eq!(
        esme.callbacks().delivered[0].short_message.as_text(),
        Some("over the wire")
    );
    let frames = esme.transport().frames();
    assert!(matches!(frames[0], Frame::Bind(_)));
    assert_eq!(frames[1], Frame::DeliverSmResp(DeliverSmResponse::new(40)));
    assert_eq!(frames[2], Frame::UnbindResp(UnbindResponse::new(41)));
}

#[tokio::test(start_paused = true)]
async fn run_returns_bind_timeout_when_smsc_is_silent() {
    let mut esme = session(Role::Transmitter);
    esme.connection_made().await.unwrap();

    let (client, _server) = tokio::io::duplex(1024);
    let mut reader = FrameReader::new(client);
    let result = esme.run(&mut reader).await;

    assert!(matches!(result, Err(EsmeError::BindTimeout)));
    assert!(!esme.bind_timeout_pending());
    assert!(!esme.transport().is_connected());
}

#[tokio::test]
async fn run_reports_peer_disconnect() {
    let mut esme = bound(Role::Receiver).await;
    let (client, server) = tokio::io::duplex(1024);
    drop(server);

    let mut reader = FrameReader::new(client);
    let result = esme.run(&mut reader).await;

    assert!(matches!(result, Err(EsmeError::ConnectionLost)));
    assert_eq!(esme.state(), SessionState::Closed);
    assert!(!esme.keepalive_active());
}

#[tokio::test]
async fn run_nacks_undecodable_pdu_and_continues() {
    let mut esme = bound(Role::Receiver).await;
    let (client, mut server) = tokio::io::duplex(1024);

    let mut wire = vec![
        0x00, 0x00, 0x00, 0x10, // command_length
        0x00, 0x00, 0x00, 0x77, // reserved command id
        0x00, 0x00, 0x00, 0x00, // command_status
        0x00, 0x00, 0x00, 0x33, // sequence_number
    ];
    wire.extend_from_slice(&Unbind::new(52).to_bytes().unwrap());
    server.write_all(&wire).await.unwrap();

    let mut reader = FrameReader::new(client);
    esme.run(&mut reader).await.unwrap();

    let frames = esme.transport().frames();
    assert_eq!(
        frames[1],
        Frame::GenericNack(GenericNack::error(0x33, CommandStatus::InvalidCommandId))
    );
    assert_eq!(frames[2], Frame::UnbindResp(UnbindResponse::new(52)));
}

#[tokio::test]
async fn run_delivers_vendor_status_submit_sm_resp() {
    let mut esme = bound(Role::Transmitter).await;
    let sms = SmsMessage::new("27831234567", "1234", "hello");
    assert_eq!(esme.submit_sm(&sms).await.unwrap(), Some(2));

    let (client, mut server) = tokio::io::duplex(1024);
    let mut wire = vec![
        0x00, 0x00, 0x00, 0x10, // command_length
        0x80, 0x00, 0x00, 0x04, // submit_sm_resp
        0x00, 0x00, 0x04, 0x01, // vendor specific status
        0x00, 0x00, 0x00, 0x02, // sequence_number
    ];
    wire.extend_from_slice(&Unbind::new(53).to_bytes().unwrap());
    server.write_all(&wire).await.unwrap();

    let mut reader = FrameReader::new(client);
    esme.run(&mut reader).await.unwrap();

    let responses = &esme.callbacks().submit_resps;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].sequence_number, 2);
    assert_eq!(responses[0].command_status, CommandStatus::Other(0x401));
    assert!(responses[0].command_status.is_vendor_specific());

    let frames = esme.transport().frames();
    assert!(!frames.iter().any(|f| matches!(f, Frame::GenericNack(_))));
    assert_eq!(frames.last(), Some(&Frame::UnbindResp(UnbindResponse::new(53))));
}

#[tokio::test]
async fn run_never_nacks_an_undecodable_response() {
    let mut esme = bound(Role::Receiver).await;
    let (client, mut server) = tokio::io::duplex(1024);

    let mut wire = vec![
        0x00, 0x00, 0x00, 0x10, // command_length
        0x80, 0x00, 0x00, 0x77, // reserved response id
        0x00, 0x00, 0x00, 0x00, // command_status
        0x00, 0x00, 0x00, 0x34, // sequence_number
    ];
    wire.extend_from_slice(&Unbind::new(54).to_bytes().unwrap());
    server.write_all(&wire).await.unwrap();

    let mut reader = FrameReader::new(client);
    esme.run(&mut reader).await.unwrap();

    let frames = esme.transport().frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1], Frame::UnbindResp(UnbindResponse::new(54)));
}

#[tokio::test]
async fn handle_drives_outbound_operations() {
    let mut esme = session(Role::Transmitter);
    esme.connection_made().await.unwrap();

    let (client, mut server) = tokio::io::duplex(4096);
    server
        .write_all(
            &BindResponse::new(BindType::Transmitter, 1, "smsc")
                .to_bytes()
                .unwrap(),
        )
        .await
        .unwrap();

    let (handle, commands) = EsmeHandle::channel(4);
    let mut reader = FrameReader::new(client);
    let driver = esme.run_with(&mut reader, Some(commands));
    let application = async {
        let sms = SmsMessage::new("27831234567", "1234", "queued");
        let submitted = handle.submit_sm(sms).await.unwrap();
        let unbind = handle.unbind().await.unwrap();
        server
            .write_all(&UnbindResponse::new(unbind).to_bytes().unwrap())
            .await
            .unwrap();
        (submitted, unbind)
    };

    let (result, (submitted, unbind)) = tokio::join!(driver, application);
    result.unwrap();
    assert_eq!(submitted, Some(2));
    assert_eq!(unbind, 3);
    assert_eq!(esme.state(), SessionState::Closed);

    let frames = esme.transport().frames();
    assert!(matches!(&frames[1], Frame::SubmitSm(pdu) if pdu.sequence_number == 2));
    assert_eq!(frames[2], Frame::Unbind(Unbind::new(3)));
}
