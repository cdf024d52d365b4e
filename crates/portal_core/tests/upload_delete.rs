use portal_core::{
    update, AppState, ControlId, Effect, Failure, Msg, Notification, NotificationKind, RequestId,
    TimerId, TimerProfile,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn listed(files: &[&str]) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::FilesListed(files.iter().map(|f| f.to_string()).collect()),
    );
    state
}

fn submit(state: AppState, roll_no: &str, file: Option<&str>) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::UploadSubmitted {
            roll_no: roll_no.to_string(),
            file: file.map(str::to_string),
        },
    )
}

fn delete_control(state: &AppState, identifier: &str) -> ControlId {
    state.view().file(identifier).map(|row| row.delete.id).unwrap()
}

fn confirm_delete(state: AppState, identifier: &str) -> (AppState, RequestId) {
    let control = delete_control(&state, identifier);
    let (state, effects) = update(state, Msg::DeleteClicked { control });
    assert_eq!(
        effects,
        vec![Effect::ConfirmDelete {
            control,
            target: identifier.to_string(),
        }]
    );
    let (state, effects) = update(state, Msg::DeleteConfirmed { control });
    let request_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::RequestDelete { request_id, .. } => Some(*request_id),
            _ => None,
        })
        .expect("delete request");
    (state, request_id)
}

#[test]
fn upload_validation_rejects_before_starting_anything() {
    init_logging();
    let cases = [
        ("", Some("a.png"), "❌ Please enter your roll number!"),
        ("abc", Some("a.png"), "❌ Roll number must contain valid numbers!"),
        ("CS2021001", None, "❌ Please select a file to upload!"),
        ("CS2021001", Some("  "), "❌ Please select a file to upload!"),
    ];
    for (roll_no, file, message) in cases {
        let (state, effects) = submit(AppState::new(), roll_no, file);
        assert_eq!(
            effects,
            vec![Effect::Notify(Notification::new(
                NotificationKind::Validation,
                message
            ))]
        );
        assert_eq!(state.in_flight(), 0);
        assert!(!state.page_lock().is_inert());
    }
}

#[test]
fn upload_makes_page_inert_except_the_upload_button() {
    init_logging();
    let state = listed(&["s1/a.png", "s1/b.txt"]);
    let (state, effects) = submit(state, " CS2021001 ", Some("/tmp/scan.png"));

    let request_id = RequestId {
        generation: 0,
        seq: 1,
    };
    assert_eq!(
        effects,
        vec![
            Effect::StartTimer {
                timer: TimerId(request_id),
                profile: TimerProfile::UPLOAD,
            },
            Effect::SubmitUpload {
                request_id,
                roll_no: "CS2021001".to_string(),
                file: "/tmp/scan.png".to_string(),
            },
        ]
    );

    let view = state.view();
    assert_eq!(view.upload_button.label, "🔄 Uploading...");
    assert!(!view.upload_button.enabled);
    assert_eq!(
        *state.page_lock(),
        portal_core::PageLock::Inert {
            active: state.upload_button()
        }
    );
    for row in &view.files {
        assert!(!row.download.enabled);
        assert!(!row.delete.enabled);
        assert!(row.analyze.as_ref().map(|c| !c.enabled).unwrap_or(true));
    }
    assert_eq!(view.upload_progress.unwrap().text, "Uploading... 0%");

    let (_, effects) = submit(state, "CS2021001", Some("/tmp/other.png"));
    assert!(effects.is_empty());
}

#[test]
fn upload_timer_stops_itself_at_cap_and_shows_processing() {
    init_logging();
    let (state, _) = submit(AppState::new(), "CS1", Some("a.png"));
    let request_id = RequestId {
        generation: 0,
        seq: 1,
    };
    let timer = TimerId(request_id);

    let (state, effects) = update(state, Msg::ProgressTick { timer, increment: 14.6 });
    assert!(effects.is_empty());
    assert_eq!(
        state.view().upload_progress.unwrap().text,
        "Uploading... 15%"
    );

    let (state, effects) = update(state, Msg::ProgressTick { timer, increment: 80.0 });
    assert_eq!(effects, vec![Effect::StopTimer { timer }]);
    let progress = state.view().upload_progress.unwrap();
    assert_eq!(progress.text, "Processing...");
    assert_eq!(progress.percent, 90);

    // Already released: settlement must not stop it again.
    let (state, effects) = update(
        state,
        Msg::UploadSettled {
            request_id,
            outcome: Ok(()),
        },
    );
    assert_eq!(effects, vec![Effect::ReloadPage]);
    assert!(state.is_replaced());
    assert_eq!(
        state.view().upload_progress.unwrap().text,
        "Processing..."
    );
}

#[test]
fn upload_success_before_cap_stops_timer_then_reloads() {
    init_logging();
    let (state, _) = submit(AppState::new(), "CS1", Some("a.png"));
    let request_id = RequestId {
        generation: 0,
        seq: 1,
    };

    let (state, effects) = update(
        state,
        Msg::UploadSettled {
            request_id,
            outcome: Ok(()),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::StopTimer {
                timer: TimerId(request_id)
            },
            Effect::ReloadPage
        ]
    );
    // No re-enable on success; the page is about to be replaced.
    assert!(state.page_lock().is_inert());
    assert!(!state.view().upload_button.enabled);
}

#[test]
fn upload_failure_restores_interactivity() {
    init_logging();
    let state = listed(&["a.png"]);
    let (state, _) = submit(state, "CS1", Some("a.png"));
    let request_id = RequestId {
        generation: 0,
        seq: 1,
    };

    let (state, effects) = update(
        state,
        Msg::UploadSettled {
            request_id,
            outcome: Err(Failure::Transport(Some("connection refused".into()))),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::StopTimer {
                timer: TimerId(request_id)
            },
            Effect::Notify(Notification::new(
                NotificationKind::Error,
                "❌ Error: connection refused"
            )),
        ]
    );
    let view = state.view();
    assert!(!state.page_lock().is_inert());
    assert_eq!(view.upload_button.label, "🚀 Upload File");
    assert!(view.upload_button.enabled);
    assert!(view.upload_progress.is_none());
    assert!(view.file("a.png").unwrap().download.enabled);
}

#[test]
fn declined_delete_changes_nothing() {
    init_logging();
    let state = listed(&["a.png"]);
    let control = delete_control(&state, "a.png");
    let (state, _) = update(state, Msg::DeleteClicked { control });
    let before = state.clone();

    let (state, effects) = update(state, Msg::DeleteDeclined { control });
    assert!(effects.is_empty());
    assert_eq!(state, before);
}

#[test]
fn confirmed_delete_success_reloads_page() {
    init_logging();
    let state = listed(&["a.png"]);
    let (state, request_id) = confirm_delete(state, "a.png");
    let row = state.view().file("a.png").cloned().unwrap();
    assert_eq!(row.delete.label, "🔄 Deleting... 0%");
    assert!(!row.delete.enabled);

    let (state, effects) = update(
        state,
        Msg::DeleteSettled {
            request_id,
            outcome: Ok(()),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::StopTimer {
                timer: TimerId(request_id)
            },
            Effect::ReloadPage
        ]
    );
    assert!(state.is_replaced());

    // A replaced page ignores further clicks.
    let control = delete_control(&state, "a.png");
    let (_, effects) = update(state, Msg::DeleteClicked { control });
    assert!(effects.is_empty());
}

#[test]
fn refused_delete_restores_button() {
    init_logging();
    let state = listed(&["a.png"]);
    let (state, request_id) = confirm_delete(state, "a.png");
    let (state, _) = update(
        state,
        Msg::ProgressTick {
            timer: TimerId(request_id),
            increment: 20.0,
        },
    );

    let (state, effects) = update(
        state,
        Msg::DeleteSettled {
            request_id,
            outcome: Err(Failure::Remote(Some("locked".into()))),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::StopTimer {
                timer: TimerId(request_id)
            },
            Effect::Notify(Notification::new(
                NotificationKind::Error,
                "❌ Could not delete a.png: locked"
            )),
        ]
    );
    let delete = state.view().file("a.png").unwrap().delete.clone();
    assert_eq!(delete.label, "🗑️ Delete");
    assert!(delete.enabled);
    assert!(!state.is_replaced());
}

#[test]
fn download_click_emits_download() {
    init_logging();
    let state = listed(&["s1/a b.png"]);
    let control = state.view().file("s1/a b.png").unwrap().download.id;
    let (_, effects) = update(state, Msg::DownloadClicked { control });
    assert_eq!(
        effects,
        vec![Effect::Download {
            target: "s1/a b.png".to_string()
        }]
    );
}

#[test]
fn settlement_from_previous_page_is_ignored_after_reload() {
    init_logging();
    let state = listed(&["a.png", "b.png"]);
    let analyze = state.view().file("b.png").unwrap().analyze.as_ref().unwrap().id;
    let (state, _) = update(state, Msg::AnalyzeClicked { control: analyze });
    let stale = RequestId {
        generation: 0,
        seq: 1,
    };
    let (state, old_delete) = confirm_delete(state, "a.png");
    let (state, _) = update(
        state,
        Msg::DeleteSettled {
            request_id: old_delete,
            outcome: Ok(()),
        },
    );

    let fresh = state.reloaded();
    let (fresh, _) = update(fresh, Msg::FilesListed(vec!["b.png".to_string()]));
    assert_eq!(fresh.generation(), 1);

    let before = fresh.clone();
    let (fresh, effects) = update(
        fresh,
        Msg::AnalysisSettled {
            request_id: stale,
            outcome: Ok(Default::default()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(fresh, before);
    assert!(fresh.view().file("b.png").unwrap().analyze.as_ref().unwrap().enabled);
}
