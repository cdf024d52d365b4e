//! Portal core: pure request-lifecycle state machine and view-model helpers.
mod effect;
mod lock;
mod msg;
mod presenter;
mod progress;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Notification, NotificationKind};
pub use lock::{GroupLock, PageLock};
pub use msg::Msg;
pub use presenter::{guidance_message, present, AnalysisResult, Fragment, Presentation};
pub use progress::{analysis_stage_caption, ProgressIllusion, TimerProfile};
pub use state::{
    is_analyzable, AppState, ControlId, ControlRole, Failure, RequestId, RequestKind,
    RequestPhase, TimerId,
};
pub use update::update;
pub use view_model::{
    AppViewModel, ControlView, FileRowView, ResultPanelView, UploadProgressView,
};
