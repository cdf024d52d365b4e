#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTimer {
        timer: crate::TimerId,
        profile: crate::TimerProfile,
    },
    StopTimer {
        timer: crate::TimerId,
    },
    RequestAnalysis {
        request_id: crate::RequestId,
        target: String,
    },
    RequestDelete {
        request_id: crate::RequestId,
        target: String,
    },
    SubmitUpload {
        request_id: crate::RequestId,
        roll_no: String,
        file: String,
    },
    /// Ask the user before deleting; answered with `DeleteConfirmed`/`DeleteDeclined`.
    ConfirmDelete {
        control: crate::ControlId,
        target: String,
    },
    Download {
        target: String,
    },
    /// Blocking, user-facing notification.
    Notify(Notification),
    /// Replace the page; every pending request becomes a no-op.
    ReloadPage,
    AnnouncePresence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Summary,
    Guidance,
    Validation,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub text: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}
