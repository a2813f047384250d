use std::sync::mpsc as std_mpsc;

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::ipc::{EventBroadcaster, EventServer, IpcServer};
use hoist_ipc::{Command, Response, ServiceEvent};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

pub type SnapshotRequest = oneshot::Sender<ServiceEvent>;

/// Everything the main loop reacts to, funneled into one queue so worker
/// transitions are strictly serialized: a gesture arriving mid-transition
/// waits its turn instead of overlapping it.
pub enum MainEvent {
    Ipc(Command, mpsc::Sender<Response>),
    HotkeyPressed,
    Snapshot(SnapshotRequest),
    Shutdown,
}

pub struct TokioChannels {
    pub server_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub server_rx: mpsc::Receiver<IpcCommandWithResponse>,
    pub snapshot_tx: mpsc::Sender<SnapshotRequest>,
    pub snapshot_rx: mpsc::Receiver<SnapshotRequest>,
    pub broadcaster: EventBroadcaster,
    pub event_server_rx: broadcast::Receiver<ServiceEvent>,
    pub state_event_rx: std_mpsc::Receiver<ServiceEvent>,
    pub main_tx: std_mpsc::Sender<MainEvent>,
}

pub struct MainChannels {
    pub main_rx: std_mpsc::Receiver<MainEvent>,
    pub main_tx: std_mpsc::Sender<MainEvent>,
    pub state_event_tx: std_mpsc::Sender<ServiceEvent>,
}

pub fn create_channels() -> (TokioChannels, MainChannels) {
    // Everything destined for the main loop
    let (main_tx, main_rx) = std_mpsc::channel::<MainEvent>();

    // Channel for the IPC server (tokio internal)
    let (server_tx, server_rx) = mpsc::channel::<IpcCommandWithResponse>(256);

    // Snapshot requests from new event subscribers
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<SnapshotRequest>(16);

    // Event broadcasting for the subscription stream
    let broadcaster = EventBroadcaster::new(256);
    let event_server_rx = broadcaster.subscribe();

    // Channel: service events (main thread -> tokio)
    let (state_event_tx, state_event_rx) = std_mpsc::channel::<ServiceEvent>();

    let tokio_channels = TokioChannels {
        server_tx,
        server_rx,
        snapshot_tx,
        snapshot_rx,
        broadcaster,
        event_server_rx,
        state_event_rx,
        main_tx: main_tx.clone(),
    };

    let main_channels = MainChannels {
        main_rx,
        main_tx,
        state_event_tx,
    };

    (tokio_channels, main_channels)
}

pub async fn run_async(channels: TokioChannels) {
    let TokioChannels {
        server_tx,
        server_rx: mut ipc_rx,
        snapshot_tx,
        snapshot_rx: mut snapshot_request_rx,
        broadcaster,
        event_server_rx,
        state_event_rx,
        main_tx,
    } = channels;

    tracing::info!("Tokio runtime started");

    // Start IPC server
    let ipc_server = IpcServer::new(server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    // Start Event server
    let event_server = EventServer::new(event_server_rx, snapshot_tx);
    tokio::spawn(async move {
        if let Err(e) = event_server.run().await {
            tracing::error!("Event server error: {}", e);
        }
    });

    // Forward service events from the main thread to the broadcast channel
    let broadcaster_clone = broadcaster.clone();
    std::thread::spawn(move || {
        while let Ok(event) = state_event_rx.recv() {
            broadcaster_clone.send(event);
        }
    });

    #[cfg(unix)]
    let (mut sigterm, mut sigint) = {
        use tokio::signal::unix::{signal, SignalKind};
        (
            signal(SignalKind::terminate()).expect("install SIGTERM handler"),
            signal(SignalKind::interrupt()).expect("install SIGINT handler"),
        )
    };

    loop {
        #[cfg(unix)]
        {
            tokio::select! {
                Some((cmd, resp_tx)) = ipc_rx.recv() => {
                    if main_tx.send(MainEvent::Ipc(cmd, resp_tx)).is_err() {
                        tracing::error!("Failed to forward IPC command to main thread");
                        break;
                    }
                }
                Some(request) = snapshot_request_rx.recv() => {
                    if main_tx.send(MainEvent::Snapshot(request)).is_err() {
                        tracing::error!("Failed to forward snapshot request to main thread");
                        break;
                    }
                }
                _ = sigterm.recv() => {
                    tracing::info!("Shutdown signal received (SIGTERM)");
                    let _ = main_tx.send(MainEvent::Shutdown);
                    break;
                }
                _ = sigint.recv() => {
                    tracing::info!("Shutdown signal received (SIGINT)");
                    let _ = main_tx.send(MainEvent::Shutdown);
                    break;
                }
                else => break,
            }
        }
        #[cfg(not(unix))]
        {
            tokio::select! {
                Some((cmd, resp_tx)) = ipc_rx.recv() => {
                    if main_tx.send(MainEvent::Ipc(cmd, resp_tx)).is_err() {
                        tracing::error!("Failed to forward IPC command to main thread");
                        break;
                    }
                }
                Some(request) = snapshot_request_rx.recv() => {
                    if main_tx.send(MainEvent::Snapshot(request)).is_err() {
                        tracing::error!("Failed to forward snapshot request to main thread");
                        break;
                    }
                }
                else => break,
            }
        }
    }

    tracing::info!("Tokio runtime exiting");
}
