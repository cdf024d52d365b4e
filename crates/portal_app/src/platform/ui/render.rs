use portal_core::{AppViewModel, ControlView, FileRowView};

const BAR_WIDTH: usize = 20;

pub fn render(view: &AppViewModel) -> Vec<String> {
    let users = match (view.presence_open, view.user_count) {
        (_, Some(count)) => count.to_string(),
        (true, None) => "…".to_string(),
        (false, None) => "offline".to_string(),
    };
    let mut lines = vec![format!(
        "Page {} | Live users: {} | Files: {} | In flight: {}",
        view.generation,
        users,
        view.files.len(),
        view.in_flight
    )];
    if view.replaced {
        lines.push("(reloading…)".to_string());
        return lines;
    }

    lines.push(format!("Upload: {}", button(&view.upload_button)));
    if let Some(progress) = &view.upload_progress {
        lines.push(format!("  {} {}", bar(progress.percent), progress.text));
    }

    if view.files.is_empty() {
        lines.push("No files uploaded yet.".to_string());
    } else {
        lines.push("Files:".to_string());
        lines.extend(view.files.iter().map(file_row));
    }

    if let Some(stage) = &view.analysis_stage {
        lines.push(format!("Analysis: {stage}"));
    }

    if view.result_panel.visible {
        let marker = if view.result_panel.selected {
            " (selected)"
        } else {
            ""
        };
        lines.push(format!("--- Recognized text{marker} ---"));
        lines.extend(view.result_panel.text.lines().map(str::to_owned));
        lines.push("--- close with `close` ---".to_string());
    }
    lines
}

fn file_row(row: &FileRowView) -> String {
    let mut text = format!("  {}  {}", row.identifier, button(&row.download));
    if let Some(analyze) = &row.analyze {
        text.push(' ');
        text.push_str(&button(analyze));
    }
    text.push(' ');
    text.push_str(&button(&row.delete));
    text
}

/// Disabled controls are drawn with braces instead of brackets.
fn button(control: &ControlView) -> String {
    if control.enabled {
        format!("[{}]", control.label)
    } else {
        format!("{{{}}}", control.label)
    }
}

fn bar(percent: u32) -> String {
    let filled = (percent.min(100) as usize * BAR_WIDTH) / 100;
    format!("|{}{}|", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{AppState, Msg, ResultPanelView, UploadProgressView};

    fn listed(files: &[&str]) -> AppViewModel {
        let state = AppState::new();
        let (state, _) = portal_core::update(
            state,
            Msg::FilesListed(files.iter().map(|file| file.to_string()).collect()),
        );
        state.view()
    }

    #[test]
    fn renders_rows_with_analyze_only_for_images() {
        let lines = render(&listed(&["s1/a.png", "s1/notes.pdf"]));
        assert_eq!(lines[0], "Page 0 | Live users: offline | Files: 2 | In flight: 0");
        assert_eq!(lines[1], "Upload: [🚀 Upload File]");
        assert_eq!(lines[2], "Files:");
        assert_eq!(lines[3], "  s1/a.png  [⬇️ Download] [🔍 OCR] [🗑️ Delete]");
        assert_eq!(lines[4], "  s1/notes.pdf  [⬇️ Download] [🗑️ Delete]");
    }

    #[test]
    fn renders_progress_and_result_panel() {
        let mut view = listed(&[]);
        view.upload_button.enabled = false;
        view.upload_progress = Some(UploadProgressView {
            percent: 50,
            text: "Uploading... 50%".to_string(),
        });
        view.result_panel = ResultPanelView {
            visible: true,
            text: "Hello\nWorld".to_string(),
            selected: true,
        };
        let lines = render(&view);
        assert!(lines.contains(&"Upload: {🚀 Upload File}".to_string()));
        assert!(lines.contains(&"  |##########..........| Uploading... 50%".to_string()));
        assert!(lines.contains(&"No files uploaded yet.".to_string()));
        assert!(lines.contains(&"--- Recognized text (selected) ---".to_string()));
        assert!(lines.contains(&"World".to_string()));
    }

    #[test]
    fn bar_clamps_to_full_width() {
        assert_eq!(bar(0), format!("|{}|", ".".repeat(BAR_WIDTH)));
        assert_eq!(bar(150), format!("|{}|", "#".repeat(BAR_WIDTH)));
    }
}
