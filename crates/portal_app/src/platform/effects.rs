use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use portal_core::{AnalysisResult, Effect, Failure, Fragment, Msg, RequestId, TimerId};
use portal_engine::{
    AnalysisOutcome, DeleteOutcome, EngineEvent, EngineHandle, PresenceEvent, ServiceError, Ticket,
};

/// Runs the effects that belong to the engine and hands back the ones the
/// console itself has to act on.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut local = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartTimer { timer, profile } => {
                    self.engine.start_ticker(
                        timer_ticket(timer),
                        Duration::from_millis(profile.period_ms),
                        profile.max_step,
                    );
                }
                Effect::StopTimer { timer } => self.engine.stop_ticker(timer_ticket(timer)),
                Effect::RequestAnalysis { request_id, target } => {
                    engine_info!("RequestAnalysis {:?} target={}", request_id, target);
                    self.engine.analyze(ticket(request_id), target);
                }
                Effect::RequestDelete { request_id, target } => {
                    engine_info!("RequestDelete {:?} target={}", request_id, target);
                    self.engine.delete(ticket(request_id), target);
                }
                Effect::SubmitUpload {
                    request_id,
                    roll_no,
                    file,
                } => {
                    engine_info!("SubmitUpload {:?} roll_no={} file={}", request_id, roll_no, file);
                    self.engine.upload(ticket(request_id), roll_no, file);
                }
                Effect::Download { target } => self.engine.download(target),
                Effect::AnnouncePresence => self.engine.announce_presence(),
                effect @ (Effect::Notify(_) | Effect::ConfirmDelete { .. } | Effect::ReloadPage) => {
                    local.push(effect)
                }
            }
        }
        local
    }
}

/// Tickets carry the page generation in the high half so a ticket from an
/// earlier page never collides with a fresh one.
pub fn ticket(request_id: RequestId) -> Ticket {
    (u64::from(request_id.generation) << 32) | u64::from(request_id.seq)
}

pub fn request_id(ticket: Ticket) -> RequestId {
    RequestId {
        generation: (ticket >> 32) as u32,
        seq: ticket as u32,
    }
}

fn timer_ticket(timer: TimerId) -> Ticket {
    ticket(timer.0)
}

/// Engine events that have a counterpart in the core become messages;
/// downloads and channel shutdown are console-only.
pub fn map_event(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::Tick { ticket, increment } => Msg::ProgressTick {
            timer: TimerId(request_id(ticket)),
            increment,
        },
        EngineEvent::AnalysisSettled { ticket, result } => Msg::AnalysisSettled {
            request_id: request_id(ticket),
            outcome: match result {
                Ok(AnalysisOutcome::Recognized(texts)) => Ok(AnalysisResult {
                    fragments: texts
                        .into_iter()
                        .map(|item| Fragment {
                            text: item.text,
                            confidence: item.confidence,
                        })
                        .collect(),
                }),
                Ok(AnalysisOutcome::Rejected(message)) => Err(Failure::Remote(Some(message))),
                Err(err) => Err(transport_failure(err)),
            },
        },
        EngineEvent::DeleteSettled { ticket, result, .. } => Msg::DeleteSettled {
            request_id: request_id(ticket),
            outcome: match result {
                Ok(DeleteOutcome::Deleted) => Ok(()),
                Ok(DeleteOutcome::Rejected(message)) => Err(Failure::Remote(message)),
                Err(err) => Err(transport_failure(err)),
            },
        },
        EngineEvent::UploadSettled { ticket, result } => Msg::UploadSettled {
            request_id: request_id(ticket),
            outcome: result.map(|_| ()).map_err(transport_failure),
        },
        EngineEvent::Presence(PresenceEvent::Opened) => Msg::PresenceOpened,
        EngineEvent::Presence(PresenceEvent::Count(count)) => Msg::PresenceCountReceived { count },
        EngineEvent::Presence(PresenceEvent::Closed { .. })
        | EngineEvent::DownloadFinished { .. } => {
            engine_debug!("Engine event handled by the console only");
            return None;
        }
    };
    Some(msg)
}

fn transport_failure(err: ServiceError) -> Failure {
    Failure::Transport(Some(err.to_string()))
}
