#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Page rendered with this file listing (identifiers relative to the upload root).
    FilesListed(Vec<String>),
    /// User submitted the upload form.
    UploadSubmitted {
        roll_no: String,
        file: Option<String>,
    },
    /// User clicked an analyze button.
    AnalyzeClicked { control: crate::ControlId },
    /// User clicked a delete button; confirmation is still pending.
    DeleteClicked { control: crate::ControlId },
    /// User accepted the delete confirmation prompt.
    DeleteConfirmed { control: crate::ControlId },
    /// User dismissed the delete confirmation prompt.
    DeleteDeclined { control: crate::ControlId },
    /// User clicked a download button.
    DownloadClicked { control: crate::ControlId },
    /// User closed the recognized-text panel.
    ResultPanelClosed,
    /// One tick of a synthetic progress timer.
    ProgressTick {
        timer: crate::TimerId,
        increment: f64,
    },
    /// Analysis call settled.
    AnalysisSettled {
        request_id: crate::RequestId,
        outcome: Result<crate::AnalysisResult, crate::Failure>,
    },
    /// Delete call settled.
    DeleteSettled {
        request_id: crate::RequestId,
        outcome: Result<(), crate::Failure>,
    },
    /// Upload submission settled.
    UploadSettled {
        request_id: crate::RequestId,
        outcome: Result<(), crate::Failure>,
    },
    /// Presence channel connected.
    PresenceOpened,
    /// Presence channel pushed the live user count.
    PresenceCountReceived { count: u64 },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
