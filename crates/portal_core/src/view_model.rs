use crate::ControlId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlView {
    pub id: ControlId,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub identifier: String,
    pub download: ControlView,
    /// Present only for image files.
    pub analyze: Option<ControlView>,
    pub delete: ControlView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgressView {
    pub percent: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultPanelView {
    pub visible: bool,
    pub text: String,
    /// Text is pre-selected so copying is a single gesture.
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub generation: u32,
    pub replaced: bool,
    pub user_count: Option<u64>,
    pub presence_open: bool,
    pub upload_button: ControlView,
    pub upload_progress: Option<UploadProgressView>,
    pub files: Vec<FileRowView>,
    pub analysis_stage: Option<String>,
    pub result_panel: ResultPanelView,
    pub in_flight: usize,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn file(&self, identifier: &str) -> Option<&FileRowView> {
        self.files.iter().find(|row| row.identifier == identifier)
    }
}
