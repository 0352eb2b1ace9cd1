use std::sync::Arc;
use std::time::Duration;

use tcomm_fetch::{ActivityFetcher, FetchConfig, NotificationFetcher};
use tcomm_session::{Session, SessionConfig};
use tcomm_transport::{connect, ConnectConfig, FrameSink};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{
    fetch_error, io_error, session_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS,
};
use crate::output::{print_event, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let handshake_timeout = parse_duration(&args.handshake_timeout)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;
    runtime.block_on(listen(args, handshake_timeout, format))
}

async fn listen(
    args: ListenArgs,
    handshake_timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let connect_config = ConnectConfig {
        push_host: args.push_host.clone(),
        origin: args.origin.clone(),
        ..ConnectConfig::new(args.serial.as_str(), args.cookie.as_str())
    };
    let session_config = SessionConfig {
        handshake_timeout,
        ..SessionConfig::default()
    };

    let (sender, receiver) = connect(&connect_config)
        .await
        .map_err(|err| transport_error("connect failed", &err))?;
    let (session, inputs) = Session::new(session_config, sender)
        .map_err(|err| session_error("session setup failed", &err))?;
    let session = if args.no_fetch {
        session
    } else {
        attach_fetchers(session, &args).await?
    };

    let mut events = session.subscribe();
    let shutdown = CancellationToken::new();
    install_ctrlc_handler(shutdown.clone());
    let driver = tokio::spawn(tcomm_session::run(
        session,
        inputs,
        receiver,
        shutdown.clone(),
    ));

    let mut printed = 0usize;
    loop {
        match events.recv().await {
            Ok(event) => {
                print_event(&event, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    shutdown.cancel();
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "output fell behind; events dropped"),
            Err(RecvError::Closed) => break,
        }
    }

    let outcome = driver
        .await
        .map_err(|err| CliError::new(INTERNAL, format!("session task failed: {err}")))?;
    match outcome {
        Ok(()) => Ok(SUCCESS),
        Err(err) => Err(session_error("session failed", &err)),
    }
}

async fn attach_fetchers<S: FrameSink + 'static>(
    session: Session<S>,
    args: &ListenArgs,
) -> CliResult<Session<S>> {
    let config = FetchConfig {
        ajax_host: args.ajax_host.clone(),
        ..FetchConfig::new(args.cookie.as_str())
    };
    let activities = ActivityFetcher::new(&config)
        .map_err(|err| fetch_error("activity lookup setup failed", &err))?;
    let notifications = NotificationFetcher::new(&config)
        .map_err(|err| fetch_error("notification lookup setup failed", &err))?;

    let session = session.with_activity_source(Arc::new(activities));
    match notifications.bootstrap().await {
        Ok(device) => {
            info!(device_type = %device.device_type, "notification lookups enabled");
            Ok(session.with_notification_source(Arc::new(notifications)))
        }
        Err(err) => {
            warn!(%err, "notification bootstrap failed; timers and alarms will not be tracked");
            Ok(session)
        }
    }
}

fn install_ctrlc_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.cancel(),
            Err(err) => warn!(%err, "signal handler setup failed"),
        }
    });
}
