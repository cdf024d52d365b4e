use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::client::{PortalService, ReqwestService, ServiceSettings};
use crate::filename::download_filename;
use crate::persist::DownloadSink;
use crate::presence::{presence_url, Outbound, PresenceClient};
use crate::ticker::{TickerSet, TickerSpec};
use crate::{EngineEvent, FailureKind, PresenceEvent, ServiceError, Ticket};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub service: ServiceSettings,
    pub download_dir: PathBuf,
    pub presence: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            download_dir: PathBuf::from("downloads"),
            presence: true,
        }
    }
}

enum EngineCommand {
    Analyze { ticket: Ticket, identifier: String },
    Delete { ticket: Ticket, identifier: String },
    Upload { ticket: Ticket, roll_no: String, file: PathBuf },
    Download { identifier: String },
    StartTicker { ticket: Ticket, spec: TickerSpec },
    StopTicker { ticket: Ticket },
    StopAllTickers,
    AnnouncePresence,
}

/// Front of the background runtime. Commands are fire-and-forget; every
/// outcome comes back as an `EngineEvent`.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, ServiceError> {
        let service = ReqwestService::new(settings.service.clone())?;
        let channel_url = if settings.presence {
            presence_url(service.base_url())
        } else {
            None
        };
        Ok(Self::with_service(
            Arc::new(service),
            settings.download_dir,
            channel_url.map(|url| PresenceClient::new(url, settings.service.connect_timeout)),
        ))
    }

    pub fn with_service(
        service: Arc<dyn PortalService>,
        download_dir: PathBuf,
        presence: Option<PresenceClient>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let (outbound_tx, outbound_rx) = unbounded_channel();
            if let Some(client) = presence {
                let events = event_tx.clone();
                runtime.spawn(async move {
                    let reason = match client.run(outbound_rx, events.clone()).await {
                        Ok(()) => None,
                        Err(err) => {
                            engine_warn!("Presence channel failed: {}", err);
                            Some(err.to_string())
                        }
                    };
                    let _ = events.send(EngineEvent::Presence(PresenceEvent::Closed { reason }));
                });
            }

            let sink = Arc::new(DownloadSink::new(download_dir));
            let mut tickers = TickerSet::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartTicker { ticket, spec } => {
                        engine_debug!("Start ticker {} every {:?}", ticket, spec.period);
                        tickers.start(runtime.handle(), ticket, spec, event_tx.clone());
                    }
                    EngineCommand::StopTicker { ticket } => {
                        if !tickers.stop(ticket) {
                            engine_debug!("Ticker {} already stopped", ticket);
                        }
                    }
                    EngineCommand::StopAllTickers => tickers.stop_all(),
                    EngineCommand::AnnouncePresence => {
                        send_outbound(&outbound_tx, Outbound::AnnouncePresence);
                    }
                    command => {
                        let service = service.clone();
                        let sink = sink.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            handle_request(service.as_ref(), sink.as_ref(), command, event_tx)
                                .await;
                        });
                    }
                }
            }
            tickers.stop_all();
        });

        Self { cmd_tx, event_rx }
    }

    pub fn analyze(&self, ticket: Ticket, identifier: impl Into<String>) {
        self.send(EngineCommand::Analyze {
            ticket,
            identifier: identifier.into(),
        });
    }

    pub fn delete(&self, ticket: Ticket, identifier: impl Into<String>) {
        self.send(EngineCommand::Delete {
            ticket,
            identifier: identifier.into(),
        });
    }

    pub fn upload(&self, ticket: Ticket, roll_no: impl Into<String>, file: impl Into<PathBuf>) {
        self.send(EngineCommand::Upload {
            ticket,
            roll_no: roll_no.into(),
            file: file.into(),
        });
    }

    pub fn download(&self, identifier: impl Into<String>) {
        self.send(EngineCommand::Download {
            identifier: identifier.into(),
        });
    }

    pub fn start_ticker(&self, ticket: Ticket, period: Duration, max_step: f64) {
        self.send(EngineCommand::StartTicker {
            ticket,
            spec: TickerSpec { period, max_step },
        });
    }

    pub fn stop_ticker(&self, ticket: Ticket) {
        self.send(EngineCommand::StopTicker { ticket });
    }

    pub fn stop_all_tickers(&self) {
        self.send(EngineCommand::StopAllTickers);
    }

    pub fn announce_presence(&self) {
        self.send(EngineCommand::AnnouncePresence);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_error!("Engine thread is gone; command dropped");
        }
    }
}

fn send_outbound(outbound: &UnboundedSender<Outbound>, request: Outbound) {
    if outbound.send(request).is_err() {
        engine_warn!("Presence channel not connected; {:?} dropped", request);
    }
}

async fn handle_request(
    service: &dyn PortalService,
    sink: &DownloadSink,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Analyze { ticket, identifier } => {
            engine_info!("Analyze ticket={} identifier={}", ticket, identifier);
            let result = service.analyze(&identifier).await;
            log_settlement("analyze", ticket, &result);
            EngineEvent::AnalysisSettled { ticket, result }
        }
        EngineCommand::Delete { ticket, identifier } => {
            engine_info!("Delete ticket={} identifier={}", ticket, identifier);
            let result = service.delete(&identifier).await;
            log_settlement("delete", ticket, &result);
            EngineEvent::DeleteSettled {
                ticket,
                identifier,
                result,
            }
        }
        EngineCommand::Upload {
            ticket,
            roll_no,
            file,
        } => {
            engine_info!("Upload ticket={} roll_no={} file={:?}", ticket, roll_no, file);
            let result = service.upload(&roll_no, &file).await;
            log_settlement("upload", ticket, &result);
            EngineEvent::UploadSettled { ticket, result }
        }
        EngineCommand::Download { identifier } => {
            engine_info!("Download identifier={}", identifier);
            let result = match service.download(&identifier).await {
                Ok(bytes) => sink
                    .save(&download_filename(&identifier), &bytes)
                    .map_err(|err| ServiceError::new(FailureKind::Io, err.to_string())),
                Err(err) => Err(err),
            };
            if let Err(err) = &result {
                engine_warn!("Download of {} failed: {}", identifier, err);
            }
            EngineEvent::DownloadFinished { identifier, result }
        }
        EngineCommand::StartTicker { .. }
        | EngineCommand::StopTicker { .. }
        | EngineCommand::StopAllTickers
        | EngineCommand::AnnouncePresence => return,
    };
    let _ = event_tx.send(event);
}

fn log_settlement<T>(operation: &str, ticket: Ticket, result: &Result<T, ServiceError>) {
    match result {
        Ok(_) => engine_info!("{} ticket={} settled", operation, ticket),
        Err(err) => engine_warn!("{} ticket={} failed: {}", operation, ticket, err),
    }
}
