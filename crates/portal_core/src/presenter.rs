//! Turns a settled analysis into the text the user sees.

const RESULTS_HEADER: &str = "📝 Handwriting Analysis Results:\n\n";
const COPY_HINT: &str = "\n📋 Results displayed below - Select text and copy!";
const NO_TEXT_GUIDANCE: &str =
    "No text detected. Try:\n• Better lighting\n• Darker pen/pencil\n• Clearer writing";

/// One recognized unit of text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub text: Option<String>,
    pub confidence: Option<f64>,
}

impl Fragment {
    pub fn new(text: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            text: Some(text.into()),
            confidence,
        }
    }

    fn usable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Successful analysis payload. Service-side errors never reach this type;
/// they settle as `Failure::Remote`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisResult {
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub summary_text: String,
    pub copyable_text: String,
    /// The text area and the summary notification are shown together.
    pub show_text_area: bool,
}

pub fn guidance_message() -> String {
    format!("{RESULTS_HEADER}{NO_TEXT_GUIDANCE}")
}

/// Lines are numbered by the fragment's position in the service response,
/// starting at 1.
pub fn present(result: &AnalysisResult) -> Presentation {
    let mut lines = String::new();
    let mut texts = Vec::new();
    for (index, fragment) in result.fragments.iter().enumerate() {
        let Some(text) = fragment.usable_text() else {
            continue;
        };
        let confidence = fragment
            .confidence
            .map(|value| value.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        lines.push_str(&format!(
            "{}. \"{}\" (confidence: {})\n",
            index + 1,
            text,
            confidence
        ));
        texts.push(text);
    }

    let copyable_text = texts.join("\n");
    if copyable_text.is_empty() {
        return Presentation {
            summary_text: guidance_message(),
            copyable_text,
            show_text_area: false,
        };
    }

    Presentation {
        summary_text: format!("{RESULTS_HEADER}{lines}{COPY_HINT}"),
        copyable_text,
        show_text_area: true,
    }
}
