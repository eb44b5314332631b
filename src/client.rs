//! The client dispatcher: connection lifecycle, call correlation, signal
//! fan-out, object export and built-in introspection.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{ClientError, Error, MethodError};
use crate::introspection;
use crate::matchrule::MatchRule;
use crate::message::{ErrorReply, MethodCall, MethodReturn, ReceivedMessage, Serial, Signal};
use crate::objects::{Member, MethodHandler, ObjectRegistry};
use crate::socket::{Authenticator, OutgoingMessage, Socket, SocketOpener, SocketOptions, Transport};
use crate::strings::{BusName, InterfaceName, MemberName, ObjectPath};
use crate::value::Variant;

const BUS_DESTINATION: &str = "org.freedesktop.DBus";
const BUS_PATH: &str = "/org/freedesktop/DBus";
const BUS_INTERFACE: &str = "org.freedesktop.DBus";
const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";

/// A callback invoked for every signal that matches its [`MatchRule`].
pub type SignalHandler = Arc<dyn Fn(&Signal) + Send + Sync>;

/// Options governing a connection attempt. Constructed through
/// [`ClientBuilder`]; `ClientOptions::default()` matches the documented
/// defaults.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Transport/authenticator preferences handed to the socket
    /// collaborator.
    pub socket_options: SocketOptions,
    /// Bound on the connect phase only; calls have no built-in timeout.
    pub timeout_ms: Option<u64>,
    /// Reserved: not honoured by `attach` in this implementation. Carried
    /// through so callers can record intent without this crate silently
    /// inventing a reconnect policy.
    pub reconnect: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            socket_options: SocketOptions::default(),
            timeout_ms: None,
            reconnect: true,
        }
    }
}

/// Builds a [`ClientOptions`] with chainable setters.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    options: ClientOptions,
}

impl ClientBuilder {
    /// Start from the documented defaults.
    pub fn new() -> Self {
        ClientBuilder::default()
    }

    /// Override the transport preference list.
    pub fn transports(mut self, transports: Vec<Transport>) -> Self {
        self.options.socket_options.transports = transports;
        self
    }

    /// Override the authenticator preference list.
    pub fn authenticators(mut self, authenticators: Vec<Authenticator>) -> Self {
        self.options.socket_options.authenticators = authenticators;
        self
    }

    /// Bound the connect phase.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.options.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the reserved reconnect flag.
    pub fn reconnect(mut self, reconnect: bool) -> Self {
        self.options.reconnect = reconnect;
        self
    }

    /// Open a connection and run the attach sequence (see [`Client::connect_with`]).
    pub async fn connect(self, opener: &dyn SocketOpener, address: &str) -> Result<Client, ClientError> {
        Client::connect_with(opener, self.options, address).await
    }
}

enum PendingResult {
    Return(Vec<Variant>),
    Error(MethodError),
    Disconnected,
}

struct Inner {
    socket: Arc<dyn Socket>,
    pending: Mutex<HashMap<u32, oneshot::Sender<PendingResult>>>,
    signal_handlers: Mutex<Vec<(MatchRule, SignalHandler)>>,
    objects: Mutex<ObjectRegistry>,
    unique_name: Mutex<Option<BusName>>,
}

/// A live connection: owns the socket, the pending-calls table, the signal
/// handler list and the exported-object registry.
pub struct Client {
    inner: Arc<Inner>,
    receiver_task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Client {
    /// Sugar for `ClientBuilder::new().connect(opener, address)`.
    pub async fn connect(opener: &dyn SocketOpener, address: &str) -> Result<Client, ClientError> {
        ClientBuilder::new().connect(opener, address).await
    }

    /// Open `address` via `opener`, then run the attach sequence: spawn the
    /// receive task, and issue `Hello` to claim a unique bus name.
    pub async fn connect_with(
        opener: &dyn SocketOpener,
        options: ClientOptions,
        address: &str,
    ) -> Result<Client, ClientError> {
        let socket: Arc<dyn Socket> = Arc::from(opener.open_with(&options.socket_options, address)?);
        let inner = Arc::new(Inner {
            socket,
            pending: Mutex::new(HashMap::new()),
            signal_handlers: Mutex::new(Vec::new()),
            objects: Mutex::new(ObjectRegistry::new()),
            unique_name: Mutex::new(None),
        });

        let loop_inner = inner.clone();
        let receiver_task = tokio::spawn(receive_loop(loop_inner));

        let client = Client {
            inner,
            receiver_task: Mutex::new(Some(receiver_task)),
            closed: AtomicBool::new(false),
        };
        debug!("attached to {}", address);

        let reply = client
            .call(
                Some(BusName::from_static(BUS_DESTINATION)),
                ObjectPath::from_static(BUS_PATH),
                Some(InterfaceName::from_static(BUS_INTERFACE)),
                MemberName::from_static("Hello"),
                vec![],
            )
            .await
            .map_err(|e| match e {
                Error::Client(c) => c,
                other => ClientError::ConnectFailed(other.to_string()),
            })?;
        if let Some(name) = reply.first().and_then(|v| v.get::<String>()) {
            if let Ok(bus_name) = BusName::new(name) {
                *client.inner.unique_name.lock().unwrap() = Some(bus_name);
            }
        }
        Ok(client)
    }

    /// This client's unique bus name, once `Hello` has completed.
    pub fn unique_name(&self) -> Option<BusName> {
        self.inner.unique_name.lock().unwrap().clone()
    }

    /// Issue a method call and await its reply.
    pub async fn call(
        &self,
        destination: Option<BusName>,
        path: ObjectPath,
        interface: Option<InterfaceName>,
        member: MemberName,
        body: Vec<Variant>,
    ) -> Result<Vec<Variant>, Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Client(ClientError::Disconnected));
        }
        let (tx, rx) = oneshot::channel();
        let mut tx_slot = Some(tx);
        let inner = self.inner.clone();
        let message = OutgoingMessage::MethodCall {
            path: path.clone(),
            member: member.clone(),
            interface: interface.clone(),
            destination: destination.clone(),
            no_reply_expected: false,
            body,
        };

        let serial = inner
            .socket
            .send(message, &mut |serial| {
                // Inserting the pending-table entry inside this callback,
                // which the socket invokes synchronously before `send`
                // returns, is what closes the race between assigning the
                // serial and a reply for it arriving on the receive loop.
                if let Some(tx) = tx_slot.take() {
                    inner.pending.lock().unwrap().insert(serial.0, tx);
                }
            })
            .map_err(Error::Client)?;
        debug!(
            "call serial={} path={} member={}",
            serial, path.as_str(), member.as_str()
        );

        match rx.await {
            Ok(PendingResult::Return(body)) => Ok(body),
            Ok(PendingResult::Error(err)) => Err(Error::Method(err)),
            Ok(PendingResult::Disconnected) | Err(_) => {
                Err(Error::Client(ClientError::ClosedDuringCall { serial: serial.0 }))
            }
        }
    }

    /// Fire-and-forget a signal.
    pub fn emit(
        &self,
        path: ObjectPath,
        interface: InterfaceName,
        member: MemberName,
        destination: Option<BusName>,
        body: Vec<Variant>,
    ) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::Disconnected);
        }
        let message = OutgoingMessage::Signal {
            path: path.clone(),
            interface: interface.clone(),
            member: member.clone(),
            destination,
            body,
        };
        let serial = self.inner.socket.send(message, &mut |_| {})?;
        debug!("emit serial={} path={} member={}", serial, path.as_str(), member.as_str());
        Ok(())
    }

    /// Register a signal handler and tell the daemon to route matching
    /// signals to this connection via `AddMatch`.
    pub async fn listen(&self, rule: MatchRule, handler: SignalHandler) -> Result<(), Error> {
        self.inner.signal_handlers.lock().unwrap().push((rule.clone(), handler));
        self.call(
            Some(BusName::from_static(BUS_DESTINATION)),
            ObjectPath::from_static(BUS_PATH),
            Some(InterfaceName::from_static(BUS_INTERFACE)),
            MemberName::from_static("AddMatch"),
            vec![Variant::from(rule.match_str())],
        )
        .await?;
        Ok(())
    }

    /// Export methods/signals under `path`/`interface`.
    pub fn export(
        &self,
        path: ObjectPath,
        interface: InterfaceName,
        members: Vec<(MemberName, Member)>,
    ) {
        self.inner.objects.lock().unwrap().export(path, interface, members);
    }

    /// Cancel the receive task, fail every pending call, and clear handlers
    /// and objects. Idempotent.
    pub fn disconnect(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("disconnecting");
        if let Some(task) = self.receiver_task.lock().unwrap().take() {
            task.abort();
        }
        let pending: Vec<_> = self.inner.pending.lock().unwrap().drain().collect();
        for (serial, tx) in pending {
            warn!("dropping pending call serial={} on disconnect", serial);
            let _ = tx.send(PendingResult::Disconnected);
        }
        self.inner.signal_handlers.lock().unwrap().clear();
        *self.inner.objects.lock().unwrap() = ObjectRegistry::new();
        self.inner.socket.close();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn receive_loop(inner: Arc<Inner>) {
    loop {
        let socket = inner.socket.clone();
        let received = tokio::task::spawn_blocking(move || socket.receive()).await;
        match received {
            Ok(Ok(message)) => {
                let task_inner = inner.clone();
                tokio::task::spawn_blocking(move || dispatch(&task_inner, message));
            }
            Ok(Err(e)) => {
                error!("receive failed, tearing down connection: {}", e);
                break;
            }
            Err(_join_error) => break,
        }
    }
}

fn dispatch(inner: &Arc<Inner>, message: ReceivedMessage) {
    match message {
        ReceivedMessage::MethodReturn(MethodReturn { reply_serial, body, .. }) => {
            complete_pending(inner, reply_serial, PendingResult::Return(body));
        }
        ReceivedMessage::Error(ErrorReply { reply_serial, error, .. }) => {
            complete_pending(inner, reply_serial, PendingResult::Error(error));
        }
        ReceivedMessage::Signal(signal) => dispatch_signal(inner, &signal),
        ReceivedMessage::MethodCall(call) => dispatch_method_call(inner, call),
    }
}

fn complete_pending(inner: &Arc<Inner>, reply_serial: Serial, result: PendingResult) {
    let sender = inner.pending.lock().unwrap().remove(&reply_serial.0);
    match sender {
        Some(tx) => {
            debug!("dispatch reply serial={}", reply_serial);
            let _ = tx.send(result);
        }
        None => warn!("reply for unknown or already-completed serial={}", reply_serial),
    }
}

fn dispatch_signal(inner: &Arc<Inner>, signal: &Signal) {
    if signal.sender.is_none() {
        return;
    }
    let handlers: Vec<SignalHandler> = inner
        .signal_handlers
        .lock()
        .unwrap()
        .iter()
        .filter(|(rule, _)| rule.matches(signal))
        .map(|(_, handler)| handler.clone())
        .collect();
    debug!("dispatch signal path={} member={}", signal.path.as_str(), signal.member.as_str());
    for handler in handlers {
        handler(signal);
    }
}

fn dispatch_method_call(inner: &Arc<Inner>, call: MethodCall) {
    debug!(
        "dispatch method call serial={} path={} member={}",
        call.serial, call.path.as_str(), call.member.as_str()
    );

    let is_introspect = call.member.as_str() == "Introspect"
        && call
            .interface
            .as_ref()
            .map_or(true, |i| i.as_str() == INTROSPECTABLE_INTERFACE);

    let outcome: Result<Vec<Variant>, MethodError> = if is_introspect {
        let xml = inner
            .objects
            .lock()
            .unwrap()
            .describe(&call.path)
            .and_then(|d| introspection::to_xml(&d))
            .unwrap_or_else(|| empty_node_xml(call.path.as_str()));
        Ok(vec![Variant::from(xml)])
    } else {
        let handler: Option<MethodHandler> = inner
            .objects
            .lock()
            .unwrap()
            .find_method(&call.path, call.interface.as_ref(), &call.member);
        match handler {
            Some(handler) => {
                let body = call.body.clone();
                match std::panic::catch_unwind(AssertUnwindSafe(|| handler(&body))) {
                    Ok(result) => result,
                    Err(panic) => {
                        let message = panic_message(panic);
                        warn!("method handler panicked: {}", message);
                        Err(MethodError::failed(message))
                    }
                }
            }
            None => {
                warn!("unknown method {} on {}", call.member.as_str(), call.path.as_str());
                Err(MethodError::unknown_method(call.member.as_str()))
            }
        }
    };

    if call.no_reply_expected {
        return;
    }

    let reply = match outcome {
        Ok(body) => OutgoingMessage::MethodReturn {
            reply_serial: call.serial,
            destination: call.sender,
            body,
        },
        Err(error) => OutgoingMessage::Error {
            reply_serial: call.serial,
            destination: call.sender,
            error,
        },
    };
    if let Err(e) = inner.socket.send(reply, &mut |_| {}) {
        error!("failed to send reply to serial={}: {}", call.serial, e);
    }
}

fn empty_node_xml(path: &str) -> String {
    format!(
        "<!DOCTYPE node PUBLIC \"-//freedesktop//DTD D-BUS Object Introspection 1.1//EN\"\n\"http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd\">\n<node name=\"{}\">\n</node>\n",
        path
    )
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "method handler panicked".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::socket::mock::MockSocket;
    use crate::types::{Signature, Type};

    struct MockOpener {
        socket: Mutex<Option<Arc<MockSocket>>>,
    }

    impl SocketOpener for MockOpener {
        fn open_with(&self, _options: &SocketOptions, _address: &str) -> Result<Box<dyn Socket>, ClientError> {
            let socket = self.socket.lock().unwrap().take().expect("single use opener");
            // Box<dyn Socket> can't hold an Arc directly; wrap it.
            struct ArcSocket(Arc<MockSocket>);
            impl Socket for ArcSocket {
                fn send(&self, m: OutgoingMessage, c: &mut dyn FnMut(Serial)) -> Result<Serial, ClientError> {
                    self.0.send(m, c)
                }
                fn receive(&self) -> Result<ReceivedMessage, ClientError> {
                    self.0.receive()
                }
                fn close(&self) {
                    self.0.close()
                }
            }
            Ok(Box::new(ArcSocket(socket)))
        }
    }

    fn hello_reply_for(sent: &[(Serial, OutgoingMessage)]) -> ReceivedMessage {
        let serial = sent.last().unwrap().0;
        ReceivedMessage::MethodReturn(MethodReturn {
            serial: Serial(1000),
            reply_serial: serial,
            sender: Some(BusName::from_static(BUS_DESTINATION)),
            destination: None,
            body: vec![Variant::from(":1.1".to_string())],
        })
    }

    async fn connect_mock() -> (Client, Arc<MockSocket>) {
        let mock = Arc::new(MockSocket::new());
        let opener = MockOpener { socket: Mutex::new(Some(mock.clone())) };

        // Reply to the Hello call as soon as it is visible on the mock, on
        // a background task, so connect_with's await resolves.
        let watcher_mock = mock.clone();
        tokio::spawn(async move {
            loop {
                let sent = watcher_mock.sent_messages();
                if !sent.is_empty() {
                    watcher_mock.push_incoming(hello_reply_for(&sent));
                    break;
                }
                tokio::task::yield_now().await;
            }
        });

        let client = Client::connect_with(&opener, ClientOptions::default(), "mock:").await.unwrap();
        (client, mock)
    }

    #[tokio::test]
    async fn call_correlates_reply_and_drops_duplicate() {
        let (client, mock) = connect_mock().await;
        assert_eq!(client.unique_name().unwrap().as_str(), ":1.1");

        let call_task = tokio::spawn({
            let client_inner = client.inner.clone();
            async move {
                let (tx, rx) = oneshot::channel();
                let mut slot = Some(tx);
                let serial = client_inner
                    .socket
                    .send(
                        OutgoingMessage::MethodCall {
                            path: ObjectPath::from_static("/a"),
                            member: MemberName::from_static("Foo"),
                            interface: None,
                            destination: None,
                            no_reply_expected: false,
                            body: vec![],
                        },
                        &mut |serial| {
                            if let Some(tx) = slot.take() {
                                client_inner.pending.lock().unwrap().insert(serial.0, tx);
                            }
                        },
                    )
                    .unwrap();
                (serial, rx)
            }
        });
        let (serial, rx) = call_task.await.unwrap();

        mock.push_incoming(ReceivedMessage::MethodReturn(MethodReturn {
            serial: Serial(2000),
            reply_serial: serial,
            sender: None,
            destination: None,
            body: vec![Variant::from("first".to_string())],
        }));
        let result = rx.await.unwrap();
        match result {
            PendingResult::Return(body) => assert_eq!(body[0].get::<String>().unwrap(), "first"),
            _ => panic!("expected a return"),
        }

        // A second reply for the same serial must be dropped silently: the
        // pending slot is already gone.
        mock.push_incoming(ReceivedMessage::MethodReturn(MethodReturn {
            serial: Serial(2001),
            reply_serial: serial,
            sender: None,
            destination: None,
            body: vec![],
        }));
        tokio::task::yield_now().await;
        assert!(!client.inner.pending.lock().unwrap().contains_key(&serial.0));
    }

    #[tokio::test]
    async fn unknown_method_gets_unknown_method_error() {
        let (client, mock) = connect_mock().await;
        mock.push_incoming(ReceivedMessage::MethodCall(MethodCall {
            serial: Serial(42),
            path: ObjectPath::from_static("/x"),
            member: MemberName::from_static("Nope"),
            interface: None,
            sender: Some(BusName::from_static(":1.2")),
            destination: None,
            no_reply_expected: false,
            body: vec![],
        }));

        wait_for_sent_count(&mock, 2).await;
        let sent = mock.sent_messages();
        match &sent.last().unwrap().1 {
            OutgoingMessage::Error { error, reply_serial, .. } => {
                assert_eq!(reply_serial.0, 42);
                assert_eq!(error.name().as_str(), "org.freedesktop.DBus.Error.UnknownMethod");
            }
            other => panic!("expected an error reply, got {:?}", other),
        }
        client.disconnect();
    }

    #[tokio::test]
    async fn handler_panic_maps_to_failed_error() {
        let (client, mock) = connect_mock().await;
        client.export(
            ObjectPath::from_static("/x"),
            InterfaceName::from_static("com.example.Iface"),
            vec![(
                MemberName::from_static("Boom"),
                Member::Method {
                    input: Signature::empty(),
                    output: Signature::empty(),
                    handler: Arc::new(|_| panic!("kaboom")),
                },
            )],
        );
        mock.push_incoming(ReceivedMessage::MethodCall(MethodCall {
            serial: Serial(7),
            path: ObjectPath::from_static("/x"),
            member: MemberName::from_static("Boom"),
            interface: Some(InterfaceName::from_static("com.example.Iface")),
            sender: Some(BusName::from_static(":1.2")),
            destination: None,
            no_reply_expected: false,
            body: vec![],
        }));

        wait_for_sent_count(&mock, 2).await;
        let sent = mock.sent_messages();
        match &sent.last().unwrap().1 {
            OutgoingMessage::Error { error, .. } => {
                assert_eq!(error.name().as_str(), "org.freedesktop.DBus.Error.Failed");
            }
            other => panic!("expected an error reply, got {:?}", other),
        }
        client.disconnect();
    }

    #[tokio::test]
    async fn disconnect_drains_pending_and_closes_socket() {
        let (client, mock) = connect_mock().await;
        let inner = client.inner.clone();
        let (tx, rx) = oneshot::channel();
        inner.pending.lock().unwrap().insert(999, tx);

        client.disconnect();
        match rx.await.unwrap() {
            PendingResult::Disconnected => {}
            _ => panic!("expected Disconnected"),
        }
        assert!(mock.is_closed());
        assert!(inner.pending.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn root_introspection_lists_children() {
        let (client, mock) = connect_mock().await;
        client.export(
            ObjectPath::from_static("/x"),
            InterfaceName::from_static("com.example.Iface"),
            vec![(
                MemberName::from_static("Ping"),
                Member::Method {
                    input: Signature::empty(),
                    output: Signature::single(Type::String).unwrap(),
                    handler: Arc::new(|_| Ok(vec![Variant::from("pong".to_string())])),
                },
            )],
        );
        client.export(
            ObjectPath::from_static("/y"),
            InterfaceName::from_static("com.example.Iface"),
            vec![],
        );

        mock.push_incoming(ReceivedMessage::MethodCall(MethodCall {
            serial: Serial(3),
            path: ObjectPath::from_static("/"),
            member: MemberName::from_static("Introspect"),
            interface: Some(InterfaceName::from_static(INTROSPECTABLE_INTERFACE)),
            sender: Some(BusName::from_static(":1.2")),
            destination: None,
            no_reply_expected: false,
            body: vec![],
        }));

        wait_for_sent_count(&mock, 2).await;
        let sent = mock.sent_messages();
        match &sent.last().unwrap().1 {
            OutgoingMessage::MethodReturn { body, .. } => {
                let xml = body[0].get::<String>().unwrap();
                assert!(xml.contains("name=\"x\""));
                assert!(xml.contains("name=\"y\""));
            }
            other => panic!("expected a method return, got {:?}", other),
        }
        client.disconnect();
    }

    async fn wait_for_sent_count(mock: &MockSocket, count: usize) {
        for _ in 0..1000 {
            if mock.sent_messages().len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("timed out waiting for {} sent messages", count);
    }

    #[test]
    fn client_options_default_matches_documented_defaults() {
        let opts = ClientOptions::default();
        assert_eq!(opts.socket_options.transports, vec![Transport::Unix]);
        assert_eq!(opts.socket_options.authenticators, vec![Authenticator::External]);
        assert_eq!(opts.timeout_ms, None);
        assert!(opts.reconnect);

        let built = ClientBuilder::new();
        assert_eq!(built.options.socket_options.transports, opts.socket_options.transports);
        assert_eq!(built.options.socket_options.authenticators, opts.socket_options.authenticators);
        assert_eq!(built.options.timeout_ms, opts.timeout_ms);
        assert_eq!(built.options.reconnect, opts.reconnect);
    }

    /// An in-process `log::Log` that records every event instead of writing
    /// anywhere, so a test can assert on what the dispatcher logged.
    struct CapturingLogger {
        records: Mutex<Vec<(log::Level, String)>>,
    }

    impl log::Log for CapturingLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &log::Record) {
            self.records.lock().unwrap().push((record.level(), record.args().to_string()));
        }
        fn flush(&self) {}
    }

    static CAPTURING_LOGGER: CapturingLogger = CapturingLogger { records: Mutex::new(Vec::new()) };

    fn install_capturing_logger() {
        static ONCE: std::sync::Once = std::sync::Once::new();
        ONCE.call_once(|| {
            log::set_logger(&CAPTURING_LOGGER).expect("no other logger installed in this process");
            log::set_max_level(log::LevelFilter::Debug);
        });
    }

    fn captured(contains: &str, level: log::Level) -> bool {
        CAPTURING_LOGGER
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(contains))
    }

    #[tokio::test]
    async fn dispatcher_lifecycle_is_observable_through_log() {
        install_capturing_logger();
        let (client, mock) = connect_mock().await;
        assert!(captured("attached to", log::Level::Debug));

        mock.push_incoming(ReceivedMessage::MethodCall(MethodCall {
            serial: Serial(501),
            path: ObjectPath::from_static("/log_probe"),
            member: MemberName::from_static("LogProbeUnknown501"),
            interface: None,
            sender: Some(BusName::from_static(":1.9")),
            destination: None,
            no_reply_expected: false,
            body: vec![],
        }));
        wait_for_sent_count(&mock, 2).await;
        assert!(captured("LogProbeUnknown501", log::Level::Warn));

        client.disconnect();
        assert!(captured("disconnecting", log::Level::Debug));
    }
}
