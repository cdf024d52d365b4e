use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use engine_logging::{engine_info, engine_warn, set_page_generation};
use portal_core::{update, AppState, ControlId, ControlRole, Effect, Msg, Notification, NotificationKind};
use portal_engine::{DeleteOutcome, EngineEvent, EngineHandle, PresenceEvent};

use super::config::{load_config, CONFIG_FILENAME};
use super::effects::{map_event, EffectRunner};
use super::listing::Listing;
use super::logging;
use super::ui::input::{parse_command, parse_confirmation, Command, HELP};
use super::ui::render::render;

const POLL_INTERVAL: Duration = Duration::from_millis(75);
// Ticks arrive every few hundred milliseconds; redrawing on each one floods
// the terminal.
const RENDER_INTERVAL: Duration = Duration::from_millis(600);

enum Input {
    Line(String),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    let loaded = load_config(&config_path);
    let config = loaded.as_ref().ok().cloned().unwrap_or_default();

    logging::initialize(config.log_destination);
    if let Err(err) = &loaded {
        engine_warn!("Using default settings: {}", err);
    }
    engine_info!("Portal console starting against {}", config.base_url);

    let engine = EngineHandle::new(config.engine_settings())
        .with_context(|| format!("could not reach a portal at {}", config.base_url))?;

    let (input_tx, input_rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(Input::Closed);
    });

    let mut console = Console::new(EffectRunner::new(engine), Listing::new(config.files));
    println!("{HELP}");
    console.start();

    loop {
        console.pump_engine();
        console.render_if_due();
        match input_rx.recv_timeout(POLL_INTERVAL) {
            Ok(Input::Line(line)) => {
                if console.on_line(&line) == Flow::Quit {
                    break;
                }
            }
            Ok(Input::Closed) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    console.shutdown();
    Ok(())
}

struct Console {
    state: AppState,
    runner: EffectRunner,
    listing: Listing,
    pending_delete: Option<ControlId>,
    render_pending: bool,
    last_render: Option<Instant>,
}

impl Console {
    fn new(runner: EffectRunner, listing: Listing) -> Self {
        Self {
            state: AppState::new(),
            runner,
            listing,
            pending_delete: None,
            render_pending: false,
            last_render: None,
        }
    }

    fn start(&mut self) {
        set_page_generation(self.state.generation());
        self.dispatch(Msg::FilesListed(self.listing.snapshot()));
    }

    fn engine(&self) -> &EngineHandle {
        self.runner.engine()
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.render_pending |= self.state.consume_dirty();
        for effect in self.runner.enqueue(effects) {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Notify(notification) => alert(&notification),
            Effect::ConfirmDelete { control, target } => {
                self.print_page();
                println!("Delete {target}? [y/N]");
                self.pending_delete = Some(control);
            }
            Effect::ReloadPage => self.reload(),
            other => engine_warn!("Effect {:?} reached the console unhandled", other),
        }
    }

    fn reload(&mut self) {
        self.engine().stop_all_tickers();
        self.state = self.state.reloaded();
        self.pending_delete = None;
        set_page_generation(self.state.generation());
        engine_info!("Page reloaded");
        self.dispatch(Msg::FilesListed(self.listing.snapshot()));
    }

    fn pump_engine(&mut self) {
        loop {
            let Some(event) = self.engine().try_recv() else {
                break;
            };
            self.on_engine_event(event);
        }
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        match &event {
            EngineEvent::DeleteSettled {
                identifier,
                result: Ok(DeleteOutcome::Deleted),
                ..
            } => {
                self.listing.remove(identifier);
            }
            EngineEvent::UploadSettled {
                result: Ok(receipt),
                ..
            } => self.listing.add(receipt.stored_as.clone()),
            EngineEvent::DownloadFinished { identifier, result } => match result {
                Ok(path) => println!("Saved {identifier} to {}", path.display()),
                Err(err) => println!("Download of {identifier} failed: {err}"),
            },
            EngineEvent::Presence(PresenceEvent::Closed { reason }) => {
                engine_info!("Presence channel gone: {:?}", reason);
                println!("Live user count unavailable.");
            }
            _ => {}
        }
        if let Some(msg) = map_event(event) {
            self.dispatch(msg);
        }
    }

    fn on_line(&mut self, line: &str) -> Flow {
        if let Some(control) = self.pending_delete.take() {
            let msg = if parse_confirmation(line) {
                Msg::DeleteConfirmed { control }
            } else {
                Msg::DeleteDeclined { control }
            };
            self.dispatch(msg);
            return Flow::Continue;
        }

        match parse_command(line) {
            Command::Upload { roll_no, file } => self.dispatch(Msg::UploadSubmitted { roll_no, file }),
            Command::Analyze(identifier) => self.click(&identifier, ControlRole::Analyze),
            Command::Delete(identifier) => self.click(&identifier, ControlRole::Delete),
            Command::Download(identifier) => self.click(&identifier, ControlRole::Download),
            Command::Close => self.dispatch(Msg::ResultPanelClosed),
            Command::Show => self.print_page(),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
            Command::Empty => {}
            Command::Unknown(text) => println!("Unknown command: {text} (try `help`)"),
        }
        Flow::Continue
    }

    fn click(&mut self, identifier: &str, role: ControlRole) {
        let Some((download, analyze, delete)) = self.state.file_controls(identifier) else {
            println!("No such file: {identifier}");
            return;
        };
        let control = match role {
            ControlRole::Download => download,
            ControlRole::Delete => delete,
            ControlRole::Analyze => match analyze {
                Some(control) => control,
                None => {
                    println!("{identifier} is not an image; OCR is unavailable.");
                    return;
                }
            },
            ControlRole::Upload => return,
        };
        if !self.state.control_enabled(control) {
            println!("That button is disabled right now.");
            return;
        }
        let msg = match role {
            ControlRole::Download => Msg::DownloadClicked { control },
            ControlRole::Delete => Msg::DeleteClicked { control },
            ControlRole::Analyze => Msg::AnalyzeClicked { control },
            ControlRole::Upload => return,
        };
        self.dispatch(msg);
    }

    fn render_if_due(&mut self) {
        let due = self
            .last_render
            .map_or(true, |at| at.elapsed() >= RENDER_INTERVAL);
        if self.render_pending && due {
            self.print_page();
        }
    }

    fn print_page(&mut self) {
        let mut out = io::stdout().lock();
        for line in render(&self.state.view()) {
            let _ = writeln!(out, "{line}");
        }
        let _ = write!(out, "> ");
        let _ = out.flush();
        self.render_pending = false;
        self.last_render = Some(Instant::now());
    }

    fn shutdown(&mut self) {
        self.engine().stop_all_tickers();
        engine_info!("Portal console exiting with {} request(s) in flight", self.state.in_flight());
    }
}

fn alert(notification: &Notification) {
    let tag = match notification.kind {
        NotificationKind::Summary => "result",
        NotificationKind::Guidance => "hint",
        NotificationKind::Validation => "check",
        NotificationKind::Error => "error",
    };
    println!("[{} {}] {}", Local::now().format("%H:%M:%S"), tag, notification.text);
}
