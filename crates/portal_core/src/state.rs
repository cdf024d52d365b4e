use std::collections::BTreeMap;

use crate::progress::analysis_stage_caption;
use crate::view_model::{
    AppViewModel, ControlView, FileRowView, ResultPanelView, UploadProgressView,
};
use crate::{GroupLock, PageLock, ProgressIllusion, TimerProfile};

const UPLOAD_LABEL: &str = "🚀 Upload File";
const UPLOADING_LABEL: &str = "🔄 Uploading...";
const DOWNLOAD_LABEL: &str = "⬇️ Download";
const ANALYZE_LABEL: &str = "🔍 OCR";
const DELETE_LABEL: &str = "🗑️ Delete";
const PROCESSING_TEXT: &str = "Processing...";
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".bmp", ".tiff"];

/// Opaque handle to one interactive element on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlId(pub u32);

/// Requests are numbered per page generation; a reload starts a new
/// generation so anything addressed to the old page is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestId {
    pub generation: u32,
    pub seq: u32,
}

/// At most one timer per request, so the request id doubles as its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub RequestId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Upload,
    Analyze,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Running,
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRole {
    Upload,
    Download,
    Analyze,
    Delete,
}

/// Why a remote call did not produce a usable outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The service answered with a structured error payload.
    Remote(Option<String>),
    /// The call never settled the way the service contract describes.
    Transport(Option<String>),
}

impl Failure {
    pub fn message(&self) -> &str {
        let message = match self {
            Failure::Remote(message) | Failure::Transport(message) => message.as_deref(),
        };
        message
            .filter(|text| !text.is_empty())
            .unwrap_or("Unknown error")
    }
}

/// Whether the service can run handwriting analysis on this file.
pub fn is_analyzable(identifier: &str) -> bool {
    let lower = identifier.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Control {
    pub(crate) role: ControlRole,
    pub(crate) target: Option<String>,
    pub(crate) label: String,
    pub(crate) disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct FileEntry {
    identifier: String,
    download: ControlId,
    analyze: Option<ControlId>,
    delete: ControlId,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Request {
    pub(crate) kind: RequestKind,
    pub(crate) target: String,
    pub(crate) control: ControlId,
    pub(crate) original_label: String,
    pub(crate) phase: RequestPhase,
    progress: ProgressIllusion,
    timer: Option<TimerId>,
}

impl Request {
    /// Releases the timer handle; yields it only the first time.
    pub(crate) fn release_timer(&mut self) -> Option<TimerId> {
        self.timer.take()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct UploadOperation {
    request: RequestId,
    percent: u32,
    processing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ResultPanel {
    visible: bool,
    text: String,
    selected: bool,
}

/// What one progress tick changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Ignored,
    Advanced,
    /// The upload bar hit its cap and released its own timer.
    Capped(TimerId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    generation: u32,
    next_seq: u32,
    next_control: u32,
    controls: BTreeMap<ControlId, Control>,
    files: Vec<FileEntry>,
    requests: BTreeMap<RequestId, Request>,
    page_lock: PageLock,
    analyze_group: GroupLock,
    upload_button: ControlId,
    upload: Option<UploadOperation>,
    result_panel: ResultPanel,
    user_count: Option<u64>,
    presence_open: bool,
    replaced: bool,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_generation(0)
    }

    fn with_generation(generation: u32) -> Self {
        let upload_button = ControlId(1);
        let mut controls = BTreeMap::new();
        controls.insert(
            upload_button,
            Control {
                role: ControlRole::Upload,
                target: None,
                label: UPLOAD_LABEL.to_string(),
                disabled: false,
            },
        );
        Self {
            generation,
            next_seq: 0,
            next_control: 2,
            controls,
            files: Vec::new(),
            requests: BTreeMap::new(),
            page_lock: PageLock::default(),
            analyze_group: GroupLock::default(),
            upload_button,
            upload: None,
            result_panel: ResultPanel::default(),
            user_count: None,
            presence_open: false,
            replaced: false,
            dirty: false,
        }
    }

    /// Fresh page after a reload. Only the presence channel outlives the
    /// page; everything client-side is discarded.
    pub fn reloaded(&self) -> Self {
        let mut next = Self::with_generation(self.generation.wrapping_add(1));
        next.user_count = self.user_count;
        next.presence_open = self.presence_open;
        next.dirty = true;
        next
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// True once a reload has been requested and the page awaits replacement.
    pub fn is_replaced(&self) -> bool {
        self.replaced
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn in_flight(&self) -> usize {
        self.requests.len()
    }

    pub fn upload_button(&self) -> ControlId {
        self.upload_button
    }

    pub fn request_phase(&self, request_id: RequestId) -> RequestPhase {
        self.requests
            .get(&request_id)
            .map(|request| request.phase)
            .unwrap_or_default()
    }

    /// Control ids for a listed file: (download, analyze, delete).
    pub fn file_controls(&self, identifier: &str) -> Option<(ControlId, Option<ControlId>, ControlId)> {
        self.files
            .iter()
            .find(|entry| entry.identifier == identifier)
            .map(|entry| (entry.download, entry.analyze, entry.delete))
    }

    pub fn control_enabled(&self, id: ControlId) -> bool {
        let Some(control) = self.controls.get(&id) else {
            return false;
        };
        if self.replaced || control.disabled || !self.page_lock.permits(id) {
            return false;
        }
        !(control.role == ControlRole::Analyze && self.analyze_group.is_engaged())
    }

    pub fn page_lock(&self) -> &PageLock {
        &self.page_lock
    }

    pub fn analyze_group(&self) -> &GroupLock {
        &self.analyze_group
    }

    pub fn user_count(&self) -> Option<u64> {
        self.user_count
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_replaced(&mut self) {
        self.replaced = true;
        self.dirty = true;
    }

    pub(crate) fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(&id)
    }

    pub(crate) fn upload_in_flight(&self) -> bool {
        self.upload.is_some()
    }

    pub(crate) fn list_files(&mut self, identifiers: Vec<String>) {
        let stale: Vec<ControlId> = self
            .files
            .drain(..)
            .flat_map(|entry| [Some(entry.download), entry.analyze, Some(entry.delete)])
            .flatten()
            .collect();
        for id in stale {
            self.controls.remove(&id);
        }

        for identifier in identifiers {
            let download = self.add_control(ControlRole::Download, &identifier, DOWNLOAD_LABEL);
            let analyze = is_analyzable(&identifier)
                .then(|| self.add_control(ControlRole::Analyze, &identifier, ANALYZE_LABEL));
            let delete = self.add_control(ControlRole::Delete, &identifier, DELETE_LABEL);
            self.files.push(FileEntry {
                identifier,
                download,
                analyze,
                delete,
            });
        }
        self.dirty = true;
    }

    fn add_control(&mut self, role: ControlRole, target: &str, label: &str) -> ControlId {
        let id = ControlId(self.next_control);
        self.next_control += 1;
        self.controls.insert(
            id,
            Control {
                role,
                target: Some(target.to_string()),
                label: label.to_string(),
                disabled: false,
            },
        );
        id
    }

    /// Idle -> Running: records the control's label, marks it busy and binds
    /// a fresh timer to the new request. Returns `None`, changing nothing, if
    /// an analysis is requested while the analyze group is held.
    pub(crate) fn begin_request(
        &mut self,
        kind: RequestKind,
        control: ControlId,
        target: String,
    ) -> Option<(RequestId, TimerId)> {
        let request_id = RequestId {
            generation: self.generation,
            seq: self.next_seq + 1,
        };
        if kind == RequestKind::Analyze && !self.analyze_group.engage(request_id) {
            return None;
        }
        self.next_seq = request_id.seq;
        let timer = TimerId(request_id);
        let profile = TimerProfile::for_kind(kind);
        let progress = ProgressIllusion::new(profile.cap);

        let original_label = match self.controls.get_mut(&control) {
            Some(handle) => {
                let original = std::mem::replace(&mut handle.label, busy_label(kind, &progress));
                handle.disabled = true;
                original
            }
            None => String::new(),
        };

        match kind {
            RequestKind::Upload => {
                self.page_lock.engage(control);
                self.upload = Some(UploadOperation {
                    request: request_id,
                    percent: 0,
                    processing: false,
                });
            }
            RequestKind::Analyze | RequestKind::Delete => {}
        }

        self.requests.insert(
            request_id,
            Request {
                kind,
                target,
                control,
                original_label,
                phase: RequestPhase::Running,
                progress,
                timer: Some(timer),
            },
        );
        self.dirty = true;
        Some((request_id, timer))
    }

    pub(crate) fn apply_tick(&mut self, timer: TimerId, increment: f64) -> TickOutcome {
        let Some(request) = self.requests.get_mut(&timer.0) else {
            return TickOutcome::Ignored;
        };
        if request.phase != RequestPhase::Running || request.timer != Some(timer) {
            return TickOutcome::Ignored;
        }

        request.progress.advance(increment);
        let kind = request.kind;
        let label = busy_label(kind, &request.progress);
        let percent = request.progress.percent();
        let capped_upload = kind == RequestKind::Upload && request.progress.at_cap();
        let released = if capped_upload {
            request.release_timer()
        } else {
            None
        };
        let control = request.control;

        if let Some(handle) = self.controls.get_mut(&control) {
            handle.label = label;
        }
        if let Some(upload) = self.upload.as_mut().filter(|op| op.request == timer.0) {
            upload.percent = percent;
            upload.processing = released.is_some();
        }
        self.dirty = true;

        match released {
            Some(timer) => TickOutcome::Capped(timer),
            None => TickOutcome::Advanced,
        }
    }

    /// Running -> Settling: removes the request. The caller must stop the
    /// released timer before restoring any UI.
    pub(crate) fn settle_request(
        &mut self,
        request_id: RequestId,
        kind: RequestKind,
    ) -> Option<(Request, Option<TimerId>)> {
        if self.replaced || self.requests.get(&request_id)?.kind != kind {
            return None;
        }
        let mut request = self.requests.remove(&request_id)?;
        request.phase = RequestPhase::Settling;
        let timer = request.release_timer();
        self.dirty = true;
        Some((request, timer))
    }

    /// Settling -> Idle for the triggering control and its group.
    pub(crate) fn restore_controls(&mut self, request_id: RequestId, request: &mut Request) {
        if let Some(handle) = self.controls.get_mut(&request.control) {
            handle.label = request.original_label.clone();
            handle.disabled = false;
        }
        match request.kind {
            RequestKind::Analyze => self.analyze_group.release(request_id),
            RequestKind::Upload => {
                self.page_lock.release();
                self.upload = None;
            }
            RequestKind::Analyze | RequestKind::Delete => {}
        }
        request.phase = RequestPhase::Idle;
        self.dirty = true;
    }

    /// Upload succeeded: the bar holds at "Processing..." until the page is
    /// replaced, and nothing is re-enabled.
    pub(crate) fn hold_upload_processing(&mut self, request_id: RequestId) {
        if let Some(upload) = self.upload.as_mut().filter(|op| op.request == request_id) {
            upload.processing = true;
        }
        self.dirty = true;
    }

    pub(crate) fn show_result_panel(&mut self, text: String) {
        self.result_panel = ResultPanel {
            visible: true,
            text,
            selected: true,
        };
        self.dirty = true;
    }

    pub(crate) fn hide_result_panel(&mut self) {
        if self.result_panel.visible {
            self.result_panel.visible = false;
            self.result_panel.selected = false;
            self.dirty = true;
        }
    }

    pub(crate) fn set_presence_open(&mut self) {
        self.presence_open = true;
        self.dirty = true;
    }

    pub(crate) fn set_user_count(&mut self, count: u64) {
        self.user_count = Some(count);
        self.dirty = true;
    }

    pub fn view(&self) -> AppViewModel {
        let upload_progress = self.upload.as_ref().map(|op| UploadProgressView {
            percent: op.percent,
            text: if op.processing {
                PROCESSING_TEXT.to_string()
            } else {
                format!("Uploading... {}%", op.percent)
            },
        });

        let analysis_stage = self
            .analyze_group
            .holder()
            .and_then(|id| self.requests.get(&id))
            .map(|request| analysis_stage_caption(request.progress.value()).to_string());

        AppViewModel {
            generation: self.generation,
            replaced: self.replaced,
            user_count: self.user_count,
            presence_open: self.presence_open,
            upload_button: self.control_view(self.upload_button),
            upload_progress,
            files: self
                .files
                .iter()
                .map(|entry| FileRowView {
                    identifier: entry.identifier.clone(),
                    download: self.control_view(entry.download),
                    analyze: entry.analyze.map(|id| self.control_view(id)),
                    delete: self.control_view(entry.delete),
                })
                .collect(),
            analysis_stage,
            result_panel: ResultPanelView {
                visible: self.result_panel.visible,
                text: self.result_panel.text.clone(),
                selected: self.result_panel.selected,
            },
            in_flight: self.requests.len(),
            dirty: self.dirty,
        }
    }

    fn control_view(&self, id: ControlId) -> ControlView {
        ControlView {
            id,
            label: self
                .controls
                .get(&id)
                .map(|control| control.label.clone())
                .unwrap_or_default(),
            enabled: self.control_enabled(id),
        }
    }
}

fn busy_label(kind: RequestKind, progress: &ProgressIllusion) -> String {
    match kind {
        RequestKind::Upload => UPLOADING_LABEL.to_string(),
        RequestKind::Analyze => format!("🔄 Analyzing... {}%", progress.percent()),
        RequestKind::Delete => format!("🔄 Deleting... {}%", progress.percent()),
    }
}
