use crate::state::TickOutcome;
use crate::{
    present, AppState, ControlId, ControlRole, Effect, Failure, Msg, Notification,
    NotificationKind, RequestKind, TimerId, TimerProfile,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Settlement handlers always emit `StopTimer` ahead of restoring controls;
/// ticks for a released timer are dropped, so a late tick cannot overwrite a
/// restored label.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let presence = matches!(msg, Msg::PresenceOpened | Msg::PresenceCountReceived { .. });
    if state.is_replaced() && !presence {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::FilesListed(identifiers) => {
            state.list_files(identifiers);
            Vec::new()
        }
        Msg::UploadSubmitted { roll_no, file } => {
            let button = state.upload_button();
            if state.upload_in_flight() || !state.control_enabled(button) {
                return (state, Vec::new());
            }
            let roll_no = roll_no.trim().to_string();
            let file = match validate_upload(&roll_no, file) {
                Ok(file) => file,
                Err(message) => {
                    return (
                        state,
                        vec![Effect::Notify(Notification::new(
                            NotificationKind::Validation,
                            message,
                        ))],
                    );
                }
            };
            let Some((request_id, timer)) =
                state.begin_request(RequestKind::Upload, button, file.clone())
            else {
                return (state, Vec::new());
            };
            vec![
                Effect::StartTimer {
                    timer,
                    profile: TimerProfile::UPLOAD,
                },
                Effect::SubmitUpload {
                    request_id,
                    roll_no,
                    file,
                },
            ]
        }
        Msg::AnalyzeClicked { control } => {
            let Some(target) = enabled_target(&state, control, ControlRole::Analyze) else {
                return (state, Vec::new());
            };
            let Some((request_id, timer)) =
                state.begin_request(RequestKind::Analyze, control, target.clone())
            else {
                return (state, Vec::new());
            };
            vec![
                Effect::StartTimer {
                    timer,
                    profile: TimerProfile::ANALYZE,
                },
                Effect::RequestAnalysis { request_id, target },
            ]
        }
        Msg::DeleteClicked { control } => match enabled_target(&state, control, ControlRole::Delete) {
            Some(target) => vec![Effect::ConfirmDelete { control, target }],
            None => Vec::new(),
        },
        Msg::DeleteConfirmed { control } => {
            let Some(target) = enabled_target(&state, control, ControlRole::Delete) else {
                return (state, Vec::new());
            };
            let Some((request_id, timer)) =
                state.begin_request(RequestKind::Delete, control, target.clone())
            else {
                return (state, Vec::new());
            };
            vec![
                Effect::StartTimer {
                    timer,
                    profile: TimerProfile::DELETE,
                },
                Effect::RequestDelete { request_id, target },
            ]
        }
        Msg::DownloadClicked { control } => {
            match enabled_target(&state, control, ControlRole::Download) {
                Some(target) => vec![Effect::Download { target }],
                None => Vec::new(),
            }
        }
        Msg::ResultPanelClosed => {
            state.hide_result_panel();
            Vec::new()
        }
        Msg::ProgressTick { timer, increment } => match state.apply_tick(timer, increment) {
            TickOutcome::Capped(timer) => vec![Effect::StopTimer { timer }],
            TickOutcome::Advanced | TickOutcome::Ignored => Vec::new(),
        },
        Msg::AnalysisSettled {
            request_id,
            outcome,
        } => {
            let Some((mut request, timer)) = state.settle_request(request_id, RequestKind::Analyze)
            else {
                return (state, Vec::new());
            };
            let mut effects = stop_timer(timer);
            state.restore_controls(request_id, &mut request);

            match outcome {
                Ok(result) => {
                    let shown = present(&result);
                    let kind = if shown.show_text_area {
                        state.show_result_panel(shown.copyable_text);
                        NotificationKind::Summary
                    } else {
                        NotificationKind::Guidance
                    };
                    effects.push(Effect::Notify(Notification::new(kind, shown.summary_text)));
                }
                Err(failure) => {
                    effects.push(Effect::Notify(failure_notification(
                        &failure,
                        "❌ OCR Error",
                    )));
                }
            }
            effects
        }
        Msg::DeleteSettled {
            request_id,
            outcome,
        } => {
            let Some((mut request, timer)) = state.settle_request(request_id, RequestKind::Delete)
            else {
                return (state, Vec::new());
            };
            let mut effects = stop_timer(timer);
            state.restore_controls(request_id, &mut request);

            match outcome {
                Ok(()) => {
                    state.mark_replaced();
                    effects.push(Effect::ReloadPage);
                }
                Err(failure) => {
                    let prefix = format!("❌ Could not delete {}", request.target);
                    effects.push(Effect::Notify(failure_notification(&failure, &prefix)));
                }
            }
            effects
        }
        Msg::UploadSettled {
            request_id,
            outcome,
        } => {
            let Some((mut request, timer)) = state.settle_request(request_id, RequestKind::Upload)
            else {
                return (state, Vec::new());
            };
            let mut effects = stop_timer(timer);

            match outcome {
                Ok(()) => {
                    state.hold_upload_processing(request_id);
                    state.mark_replaced();
                    effects.push(Effect::ReloadPage);
                }
                Err(failure) => {
                    state.restore_controls(request_id, &mut request);
                    effects.push(Effect::Notify(failure_notification(
                        &failure,
                        "❌ Upload failed",
                    )));
                }
            }
            effects
        }
        Msg::PresenceOpened => {
            state.set_presence_open();
            vec![Effect::AnnouncePresence]
        }
        Msg::PresenceCountReceived { count } => {
            state.set_user_count(count);
            Vec::new()
        }
        Msg::DeleteDeclined { .. } | Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn stop_timer(timer: Option<TimerId>) -> Vec<Effect> {
    timer
        .map(|timer| Effect::StopTimer { timer })
        .into_iter()
        .collect()
}

/// Target of `control` if it has the expected role and can be triggered.
/// Disabled controls swallow clicks silently.
fn enabled_target(state: &AppState, control: ControlId, role: ControlRole) -> Option<String> {
    if !state.control_enabled(control) {
        return None;
    }
    state
        .control(control)
        .filter(|handle| handle.role == role)
        .and_then(|handle| handle.target.clone())
}

fn validate_upload(roll_no: &str, file: Option<String>) -> Result<String, &'static str> {
    if roll_no.is_empty() {
        return Err("❌ Please enter your roll number!");
    }
    if !roll_no.chars().any(|c| c.is_ascii_digit()) {
        return Err("❌ Roll number must contain valid numbers!");
    }
    match file.map(|path| path.trim().to_string()) {
        Some(path) if !path.is_empty() => Ok(path),
        _ => Err("❌ Please select a file to upload!"),
    }
}

/// Structured and transport failures surface the same way; only the prefix
/// tells them apart.
fn failure_notification(failure: &Failure, remote_prefix: &str) -> Notification {
    let text = match failure {
        Failure::Remote(_) => format!("{}: {}", remote_prefix, failure.message()),
        Failure::Transport(_) => format!("❌ Error: {}", failure.message()),
    };
    Notification::new(NotificationKind::Error, text)
}
