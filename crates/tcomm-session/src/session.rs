use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use tcomm_frame::{
    strip_parameter_prefixes, supported_protocols, Decoder, GatewayHandler, Identity, Message,
    TransportHandler, TransportParams, TuningHandler, TuningOffer, DEE_WEBSITE_MESSAGING,
    GW_CHANNEL,
};
use tcomm_transport::{FrameSink, TransportError, TransportEvent};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::collaborator::{
    Activity, ActivityKey, ActivitySource, NotificationDetail, NotificationSource, STATUS_ON,
    STATUS_PAUSED,
};
use crate::command::{
    Command, NotificationChange, PUSH_ACTIVITY, PUSH_NOTIFICATION_CHANGE, REGISTER_CONNECTION,
};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::event::SessionEvent;
use crate::registry::{self, ListenerRegistry, ListenerToken};

const TYPE_TIMER: &str = "Timer";
const TYPE_ALARM: &str = "Alarm";
const TYPE_REMINDER: &str = "Reminder";

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    TuningHandshake,
    Registering,
    Ready,
    Closed,
}

impl SessionState {
    fn is_handshaking(self) -> bool {
        matches!(self, Self::TuningHandshake | Self::Registering)
    }
}

/// Work finished off the session task, applied back onto it with
/// [`Session::apply`].
#[derive(Debug)]
pub enum SessionInput {
    HandshakeDeadline,
    TimerElapsed { generation: u64 },
    ActivityFetched(Activity),
    NotificationFetched(NotificationDetail),
}

/// Receiving end of a session's loopback channel.
pub type InputReceiver = mpsc::UnboundedReceiver<SessionInput>;

/// Last alarm state seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmState {
    pub status: String,
    pub alarm_time: Option<i64>,
}

struct PendingTimer {
    generation: u64,
    task: JoinHandle<()>,
    detail: NotificationDetail,
}

/// One push-gateway session.
///
/// Owns every piece of protocol and scheduling state. All methods run on the
/// task that owns the session; timers, the handshake deadline and
/// collaborator fetches run as spawned tasks that only post a
/// [`SessionInput`] back through the loopback channel.
pub struct Session<S> {
    config: SessionConfig,
    local_endpoint: Identity,
    remote_endpoint: Identity,
    sink: S,
    state: SessionState,
    registry: ListenerRegistry<Session<S>>,
    tuning: TuningHandler,
    gateway: GatewayHandler,
    transport: Option<TransportHandler>,
    handshake_listener: Option<ListenerToken>,
    handshake_deadline: Option<JoinHandle<()>>,
    timer: Option<PendingTimer>,
    timer_generation: u64,
    alarm: Option<AlarmState>,
    activity_source: Option<Arc<dyn ActivitySource>>,
    notification_source: Option<Arc<dyn NotificationSource>>,
    events: broadcast::Sender<SessionEvent>,
    inputs: mpsc::UnboundedSender<SessionInput>,
    failure: Option<Arc<SessionError>>,
}

fn registry_of<S>(session: &mut Session<S>) -> &mut ListenerRegistry<Session<S>> {
    &mut session.registry
}

impl<S: FrameSink + 'static> Session<S> {
    /// Create a session writing to `sink`, plus the receiver the driver must
    /// feed back through [`Session::apply`].
    pub fn new(config: SessionConfig, sink: S) -> Result<(Self, InputReceiver)> {
        if config.event_capacity == 0 {
            return Err(SessionError::InvalidState(
                "event capacity must be non-zero".to_string(),
            ));
        }
        let endpoints = config.endpoints()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        let (inputs, input_rx) = mpsc::unbounded_channel();

        let session = Self {
            config,
            local_endpoint: endpoints.local,
            remote_endpoint: endpoints.remote,
            sink,
            state: SessionState::Connecting,
            registry: ListenerRegistry::new(),
            tuning: TuningHandler::new(),
            gateway: GatewayHandler::new(),
            transport: None,
            handshake_listener: None,
            handshake_deadline: None,
            timer: None,
            timer_generation: 0,
            alarm: None,
            activity_source: None,
            notification_source: None,
            events,
            inputs,
            failure: None,
        };
        Ok((session, input_rx))
    }

    pub fn with_activity_source(mut self, source: Arc<dyn ActivitySource>) -> Self {
        self.activity_source = Some(source);
        self
    }

    pub fn with_notification_source(mut self, source: Arc<dyn NotificationSource>) -> Self {
        self.notification_source = Some(source);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Parameters agreed during tuning, once the handshake got that far.
    pub fn transport_params(&self) -> Option<&TransportParams> {
        self.transport.as_ref().map(TransportHandler::params)
    }

    pub fn alarm(&self) -> Option<&AlarmState> {
        self.alarm.as_ref()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// The error that closed the session, if any.
    pub fn failure(&self) -> Option<Arc<SessionError>> {
        self.failure.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Register `callback` for every inbound frame `decoder` accepts.
    ///
    /// Frames the decoder rejects are logged and skipped for this listener
    /// only. The callback receives its own token so it can remove itself.
    pub fn add_listener<D, F>(&mut self, decoder: D, mut callback: F) -> ListenerToken
    where
        D: Decoder + Send + 'static,
        F: FnMut(&mut Self, ListenerToken, D::Output) + Send + 'static,
    {
        self.registry.insert(Box::new(
            move |session: &mut Self, token: ListenerToken, frame: &[u8]| {
                match decoder.decode(frame) {
                    Ok(decoded) => callback(session, token, decoded),
                    Err(err) => {
                        warn!(%token, %err, "failed to decode frame; dropped for this listener")
                    }
                }
            },
        ))
    }

    pub fn remove_listener(&mut self, token: ListenerToken) -> bool {
        let removed = self.registry.remove(token);
        if !removed {
            warn!(%token, "unable to remove listener: not registered");
        }
        removed
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.on_open(),
            TransportEvent::Message(frame) => self.on_message(&frame),
            TransportEvent::Close { code, reason } => self.on_close(code, &reason),
            TransportEvent::Error(message) => self.on_error(message),
        }
    }

    /// Transport opened: offer the supported protocol and await the answer.
    pub fn on_open(&mut self) {
        if self.state != SessionState::Connecting {
            warn!(state = ?self.state, "ignoring transport open");
            return;
        }
        info!("transport open; starting tuning handshake");
        self.emit(SessionEvent::Open);
        if let Err(err) = self.start_handshake() {
            self.fail(err);
        }
    }

    /// Dispatch one inbound frame to every listener, in registration order.
    pub fn on_message(&mut self, frame: &[u8]) {
        debug!(len = frame.len(), "<< {}", String::from_utf8_lossy(frame));
        if self.is_closed() {
            debug!("session closed; dropping frame");
            return;
        }
        registry::dispatch(self, registry_of::<S>, frame);
    }

    pub fn on_close(&mut self, code: u16, reason: &str) {
        info!(code, reason, "transport closed");
        if self.state.is_handshaking() {
            self.fail(SessionError::Aborted(format!(
                "connection closed during handshake (code {code})"
            )));
        }
        self.teardown();
        self.state = SessionState::Closed;
        self.emit(SessionEvent::Close {
            code,
            reason: reason.to_string(),
        });
    }

    /// Transport errors end the session only while handshaking. Otherwise
    /// they are reported and the transport's own close finishes the session.
    pub fn on_error(&mut self, message: String) {
        if self.is_closed() {
            warn!(%message, "transport error after close");
            return;
        }
        let err = SessionError::Transport(TransportError::Socket(message));
        if self.state.is_handshaking() {
            self.fail(err);
        } else {
            warn!(%err, state = ?self.state, "transport error");
            self.emit(SessionEvent::Error(Arc::new(err)));
        }
    }

    /// Apply work completed off the session task.
    pub fn apply(&mut self, input: SessionInput) {
        match input {
            SessionInput::HandshakeDeadline => {
                if self.state.is_handshaking() {
                    self.fail(SessionError::HandshakeTimeout(self.config.handshake_timeout));
                }
            }
            SessionInput::TimerElapsed { generation } => self.complete_timer(generation),
            SessionInput::ActivityFetched(activity) => {
                if !self.is_closed() {
                    self.emit(SessionEvent::Activity(activity));
                }
            }
            SessionInput::NotificationFetched(detail) => {
                if !self.is_closed() {
                    self.route_notification(detail);
                }
            }
        }
    }

    /// Start (or restart) the timer; completes after `remaining_time` ms.
    pub fn add_timer(&mut self, detail: NotificationDetail) {
        self.cancel_timer();
        let remaining = Duration::from_millis(detail.remaining_time.unwrap_or(0));
        self.timer_generation += 1;
        let generation = self.timer_generation;
        let inputs = self.inputs.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let _ = inputs.send(SessionInput::TimerElapsed { generation });
        });
        debug!(?remaining, generation, "timer started");
        self.timer = Some(PendingTimer {
            generation,
            task,
            detail: detail.clone(),
        });
        self.emit(SessionEvent::TimerStart(detail));
    }

    pub fn pause_timer(&mut self, detail: NotificationDetail) {
        self.cancel_timer();
        self.emit(SessionEvent::TimerPause(detail));
    }

    pub fn remove_timer(&mut self, detail: NotificationDetail) {
        self.cancel_timer();
        self.emit(SessionEvent::TimerRemove(detail));
    }

    /// Record a new alarm state and report how it differs from the last one.
    ///
    /// `ON` after nothing (or after a non-`ON` state) is a set, `ON` after
    /// `ON` is an update, and any other status is a removal.
    pub fn set_alarm(&mut self, detail: NotificationDetail) {
        let was_on = self
            .alarm
            .as_ref()
            .is_some_and(|alarm| alarm.status == STATUS_ON);
        let next = AlarmState {
            status: detail.status.clone(),
            alarm_time: detail.alarm_time,
        };
        let event = match (next.status == STATUS_ON, was_on) {
            (true, false) => SessionEvent::AlarmSet(detail),
            (true, true) => SessionEvent::AlarmUpdate(detail),
            (false, _) => SessionEvent::AlarmRemove(detail),
        };
        self.alarm = Some(next);
        self.emit(event);
    }

    fn start_handshake(&mut self) -> Result<()> {
        let protocols = supported_protocols();
        let offer = protocols
            .first()
            .ok_or_else(|| SessionError::InvalidState("no supported protocols".to_string()))?;
        let frame = self.tuning.encode(&offer.protocol_name)?;
        self.send(frame)?;

        // Unlike `add_listener`, a frame that fails to decode here ends the
        // handshake instead of being skipped.
        let tuning = self.tuning;
        let token = self.registry.insert(Box::new(
            move |session: &mut Self, token: ListenerToken, frame: &[u8]| {
                match tuning.decode(frame) {
                    Ok(response) => session.on_tuning_response(token, response),
                    Err(err) => session.fail(SessionError::Frame(err)),
                }
            },
        ));
        self.handshake_listener = Some(token);
        self.state = SessionState::TuningHandshake;
        self.start_handshake_deadline();
        Ok(())
    }

    fn start_handshake_deadline(&mut self) {
        let timeout = self.config.handshake_timeout;
        let inputs = self.inputs.clone();
        self.handshake_deadline = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = inputs.send(SessionInput::HandshakeDeadline);
        }));
    }

    fn on_tuning_response(&mut self, token: ListenerToken, response: Value) {
        self.remove_listener(token);
        self.handshake_listener = None;
        if let Err(err) = self.negotiate(response) {
            self.fail(err);
        }
    }

    fn negotiate(&mut self, response: Value) -> Result<()> {
        let offer = TuningOffer::from_value(&response)?;
        if offer.protocol_name != self.config.expected_protocol {
            return Err(SessionError::NegotiationMismatch {
                expected: self.config.expected_protocol.clone(),
                actual: offer.protocol_name,
            });
        }

        let ack = self.tuning.encode_json(&response)?;
        self.send(ack)?;
        info!(protocol = %offer.protocol_name, "agreed to transport protocol");

        let params =
            TransportParams::from_parameters(&strip_parameter_prefixes(&offer.parameters))?;
        debug!(?params, "negotiated transport parameters");
        self.state = SessionState::Registering;
        self.register(TransportHandler::new(params))
    }

    fn register(&mut self, mut transport: TransportHandler) -> Result<()> {
        if self.transport.is_some() {
            return Err(SessionError::InvalidState(
                "transport already negotiated".to_string(),
            ));
        }
        let command = serde_json::to_vec(&Command::new(REGISTER_CONNECTION))?;
        let routed = self.gateway.encode_message(
            &command,
            DEE_WEBSITE_MESSAGING,
            &self.local_endpoint,
            &self.remote_endpoint,
        )?;
        let frame = transport.encode_message(&routed, GW_CHANNEL)?;
        let decoder = transport.decoder();
        self.transport = Some(transport);
        self.send(frame)?;

        self.add_listener(decoder, |session, _token, message| {
            session.on_transport_message(message)
        });
        self.cancel_handshake_deadline();
        self.state = SessionState::Ready;
        info!("connection registered; session ready");
        self.emit(SessionEvent::Ready);
        Ok(())
    }

    fn on_transport_message(&mut self, message: Message) {
        debug!(channel = message.channel, "<< GW PAYLOAD: {}", message.payload_as_string());
        let routed = match self.gateway.decode_message(&message.payload) {
            Ok(routed) => routed,
            Err(err) => {
                warn!(%err, "dropping undecodable gateway frame");
                return;
            }
        };
        match serde_json::from_slice::<Command>(routed.payload()) {
            Ok(command) => self.on_command(command),
            Err(err) => warn!(%err, "dropping gateway frame without a json command"),
        }
    }

    fn on_command(&mut self, command: Command) {
        debug!(command = %command.command, "<< GW CMD");
        self.emit(SessionEvent::Command(command.clone()));
        match command.command.as_str() {
            PUSH_ACTIVITY => match command.activity_key() {
                Ok(key) => self.fetch_activity(key),
                Err(err) => warn!(%err, "malformed activity push"),
            },
            PUSH_NOTIFICATION_CHANGE => match command.notification_change() {
                Ok(change) => self.fetch_notification(change),
                Err(err) => warn!(%err, "malformed notification push"),
            },
            other => trace!(command = other, "ignoring command"),
        }
    }

    fn fetch_activity(&mut self, key: ActivityKey) {
        let Some(source) = self.activity_source.clone() else {
            debug!(id = %key.id, "no activity source configured");
            return;
        };
        if self.events.receiver_count() == 0 {
            debug!(id = %key.id, "no subscribers; skipping activity fetch");
            return;
        }
        let inputs = self.inputs.clone();
        tokio::spawn(async move {
            match source.fetch(key.clone()).await {
                Ok(activity) => {
                    let _ = inputs.send(SessionInput::ActivityFetched(activity));
                }
                Err(err) => warn!(id = %key.id, user = %key.user, %err, "activity fetch failed"),
            }
        });
    }

    fn fetch_notification(&mut self, change: NotificationChange) {
        let Some(source) = self.notification_source.clone() else {
            debug!(id = %change.notification_id, "no notification source configured");
            return;
        };
        debug!(
            id = %change.notification_id,
            status = change.status.as_deref().unwrap_or("-"),
            "fetching changed notification"
        );
        let inputs = self.inputs.clone();
        tokio::spawn(async move {
            match source.fetch(&change.notification_id).await {
                Ok(detail) => {
                    let _ = inputs.send(SessionInput::NotificationFetched(detail));
                }
                Err(err) => warn!(id = %change.notification_id, %err, "notification fetch failed"),
            }
        });
    }

    fn route_notification(&mut self, detail: NotificationDetail) {
        let notification_type = detail.notification_type.clone();
        let status = detail.status.clone();
        match (notification_type.as_str(), status.as_str()) {
            (TYPE_TIMER, STATUS_ON) => self.add_timer(detail),
            (TYPE_TIMER, STATUS_PAUSED) => self.pause_timer(detail),
            (TYPE_TIMER, _) => self.remove_timer(detail),
            (TYPE_ALARM | TYPE_REMINDER, _) => self.set_alarm(detail),
            (other, _) => debug!(notification_type = other, "ignoring notification"),
        }
    }

    fn complete_timer(&mut self, generation: u64) {
        match self.timer.take() {
            Some(timer) if timer.generation == generation => {
                debug!(generation, "timer complete");
                self.emit(SessionEvent::TimerComplete(timer.detail));
            }
            other => {
                trace!(generation, "ignoring stale timer completion");
                self.timer = other;
            }
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.task.abort();
        }
    }

    fn cancel_handshake_deadline(&mut self) {
        if let Some(task) = self.handshake_deadline.take() {
            task.abort();
        }
    }

    fn teardown(&mut self) {
        self.registry.clear();
        self.handshake_listener = None;
        self.cancel_handshake_deadline();
        self.cancel_timer();
    }

    fn fail(&mut self, err: SessionError) {
        error!(%err, state = ?self.state, "session failed");
        self.teardown();
        self.state = SessionState::Closed;
        let err = Arc::new(err);
        self.failure = Some(err.clone());
        self.emit(SessionEvent::Error(err));
    }

    fn send(&mut self, frame: Bytes) -> Result<()> {
        debug!(len = frame.len(), ">> {}", String::from_utf8_lossy(&frame));
        self.sink.send_frame(frame)?;
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        trace!(event = event.name(), "emit");
        // Fails only when nobody is subscribed.
        let _ = self.events.send(event);
    }
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("listeners", &self.registry)
            .field("transport", &self.transport)
            .field("pending_timer", &self.timer.as_ref().map(|t| t.generation))
            .field("alarm", &self.alarm)
            .finish()
    }
}
