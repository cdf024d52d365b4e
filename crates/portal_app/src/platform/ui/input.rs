/// One line typed at the portal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `upload <roll_no> <path>`; either part may be missing and is
    /// validated by the core.
    Upload { roll_no: String, file: Option<String> },
    Analyze(String),
    Delete(String),
    Download(String),
    Close,
    Show,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  upload <roll_no> <path>   upload a file under a roll number
  ocr <file>                analyze an image file
  delete <file>             delete a file (asks for confirmation)
  download <file>           save a file into the download directory
  close                     close the recognized-text panel
  show                      redraw the page
  help                      this list
  quit                      leave the portal";

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    match verb.to_ascii_lowercase().as_str() {
        "" => Command::Empty,
        "upload" | "u" => {
            let (roll_no, file) = match rest.split_once(char::is_whitespace) {
                Some((roll_no, file)) => (roll_no, file.trim()),
                None => (rest, ""),
            };
            Command::Upload {
                roll_no: roll_no.to_string(),
                file: (!file.is_empty()).then(|| file.to_string()),
            }
        }
        "ocr" | "analyze" | "a" if !rest.is_empty() => Command::Analyze(rest.to_string()),
        "delete" | "rm" if !rest.is_empty() => Command::Delete(rest.to_string()),
        "download" | "get" if !rest.is_empty() => Command::Download(rest.to_string()),
        "close" => Command::Close,
        "show" | "ls" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Answer to a yes/no prompt; anything but an explicit yes declines.
pub fn parse_confirmation(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
