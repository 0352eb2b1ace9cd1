//! Event loop binding a [`Session`] to a live transport.

use std::sync::Arc;

use tcomm_transport::{EventSource, FrameSink, CLOSE_ABNORMAL, CLOSE_NORMAL};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::session::{InputReceiver, Session};

/// Drive `session` until it closes.
///
/// Transport events, loopback inputs and `shutdown` are all handled on the
/// calling task, so the session never needs a lock. Cancelling `shutdown`
/// closes the session with a normal close code. Returns the error that closed
/// the session, if one did.
pub async fn run<S, E>(
    mut session: Session<S>,
    mut inputs: InputReceiver,
    mut transport: E,
    shutdown: CancellationToken,
) -> Result<(), Arc<SessionError>>
where
    S: FrameSink + 'static,
    E: EventSource,
{
    while !session.is_closed() {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested; closing session");
                session.on_close(CLOSE_NORMAL, "client shutdown");
            }
            event = transport.next_event() => match event {
                Some(event) => session.handle_transport_event(event),
                None => session.on_close(CLOSE_ABNORMAL, "transport ended"),
            },
            Some(input) = inputs.recv() => session.apply(input),
        }
    }
    debug!(state = ?session.state(), "session loop finished");

    match session.failure() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
