use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use knock_client::{ApiClient, ClientEvent, ClientHandle, Credentials, SentEmail, UploadFile};
use knock_core::{update, AppState, JobAction, Msg, Notice, NoticeLevel};
use knock_logging::{knock_error, knock_info, knock_warn};

use super::config::AppConfig;
use super::effects::{event_to_msg, screen_reply, EffectRunner, FollowUp};
use super::ui::input::{parse_command, Command, HELP};
use super::{logging, persistence, ui};

const INPUT_POLL: Duration = Duration::from_millis(50);

pub fn run_app() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("no working directory")?;
    let config = AppConfig::load(&cwd)?;
    logging::initialize(config.log_destination, config.level_filter()?);
    knock_info!("knock_app starting; server {}", config.server_url);

    let credentials = match persistence::load_token(&config.session_file) {
        Some(token) => Credentials::with_token(token),
        None => Credentials::new(),
    };
    let client = ApiClient::new(config.client_settings(), credentials.clone())
        .with_context(|| format!("invalid server url {:?}", config.server_url))?;
    let handle = ClientHandle::new(client).context("failed to start client runtime")?;

    let mut shell = Shell {
        state: AppState::new(),
        runner: EffectRunner::new(handle),
        credentials,
        session_file: config.session_file.clone(),
        sent_emails: Vec::new(),
    };

    let lines = spawn_stdin_reader();
    println!("{HELP}");
    if shell.credentials.is_present() {
        shell.dispatch(Msg::Mounted);
    } else {
        println!("Not signed in.");
    }

    loop {
        match lines.recv_timeout(INPUT_POLL) {
            Ok(line) => {
                if shell.handle_line(&line) == Flow::Quit {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        shell.drain_events();
    }

    shell.dispatch(Msg::Teardown);
    knock_info!("knock_app exiting");
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    knock_error!("stdin read failed: {}", err);
                    break;
                }
            }
        }
    });
    rx
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Shell {
    state: AppState,
    runner: EffectRunner,
    credentials: Credentials,
    session_file: PathBuf,
    sent_emails: Vec<SentEmail>,
}

impl Shell {
    fn handle_line(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                return Flow::Continue;
            }
        };

        let msg = match command {
            Command::Quit => return Flow::Quit,
            Command::Help => {
                println!("{HELP}");
                return Flow::Continue;
            }
            Command::Login { email, password } => {
                self.runner.client().login(email, password);
                return Flow::Continue;
            }
            Command::Register { email, password } => {
                self.runner.client().register(email, password);
                return Flow::Continue;
            }
            Command::Logout => {
                self.forget_session();
                println!("Signed out.");
                Msg::SignedOut
            }
            _ if !self.credentials.is_present() => {
                println!("Sign in first.");
                return Flow::Continue;
            }
            Command::Resumes => Msg::Mounted,
            Command::Use(resume_id) => Msg::ResumeSelected(resume_id),
            Command::Start => Msg::StartClicked,
            Command::Pause => Msg::ActionClicked(JobAction::Pause),
            Command::Resume => Msg::ActionClicked(JobAction::Resume),
            Command::Retry => Msg::ActionClicked(JobAction::Retry),
            Command::Refresh => Msg::RefreshClicked,
            Command::New => Msg::NewJobClicked,
            account => {
                self.run_account_command(account);
                return Flow::Continue;
            }
        };
        self.dispatch(msg);
        Flow::Continue
    }

    fn run_account_command(&self, command: Command) {
        let client = self.runner.client();
        match command {
            Command::Gmail => client.gmail_connect(),
            Command::Keys => client.ai_keys(),
            Command::SetKey { provider, api_key } => client.save_ai_key(provider, api_key),
            Command::RemoveKey(provider) => client.delete_ai_key(provider),
            Command::Recipients => client.recipients(),
            Command::Import(path) => match load_upload(&path, CSV_UPLOAD) {
                Ok(file) => client.import_recipients(file),
                Err(message) => print_error(message),
            },
            Command::UploadResume(path) => match load_upload(&path, PDF_UPLOAD) {
                Ok(file) => client.upload_resume(file),
                Err(message) => print_error(message),
            },
            Command::Sent => client.sent_emails(),
            Command::ShowSent(id) => match self.sent_emails.iter().find(|email| email.id == id) {
                Some(email) => println!("{}", ui::screens::render_sent_email(email)),
                None => println!("No sent email {id:?}; run sent to load the list."),
            },
            _ => knock_warn!("job command reached the account handler"),
        }
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.runner.client().try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Authenticated { access_token } => {
                if let Err(err) = persistence::save_token(&self.session_file, &access_token) {
                    knock_warn!("Failed to persist session to {:?}: {}", self.session_file, err);
                }
                println!("Signed in.");
                self.dispatch(Msg::Mounted);
            }
            ClientEvent::AuthFailed(err) => {
                let notice = Notice::new(NoticeLevel::Error, format!("Sign-in failed: {err}"));
                println!("{}", ui::render::render_notice(&notice));
            }
            ClientEvent::SessionExpired => {
                self.forget_session();
                self.dispatch(Msg::SessionExpired);
            }
            other => match screen_reply(other) {
                Ok(reply) => {
                    println!("{}", reply.text);
                    if let Some(follow_up) = reply.follow_up {
                        self.follow_up(follow_up);
                    }
                }
                Err(other) => {
                    if let Some(msg) = event_to_msg(other, Utc::now()) {
                        self.dispatch(msg);
                    }
                }
            },
        }
    }

    fn follow_up(&mut self, follow_up: FollowUp) {
        match follow_up {
            FollowUp::ReloadKeys => self.runner.client().ai_keys(),
            FollowUp::ReloadRecipients => self.runner.client().recipients(),
            FollowUp::ReloadResumes => self.dispatch(Msg::Mounted),
            FollowUp::RememberSent(emails) => self.sent_emails = emails,
        }
    }

    fn forget_session(&mut self) {
        self.credentials.clear();
        self.sent_emails.clear();
        if let Err(err) = persistence::clear_token(&self.session_file) {
            knock_warn!("Failed to remove session file {:?}: {}", self.session_file, err);
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        let view = was_dirty.then(|| state.view());
        self.state = state;

        self.runner.run(effects);
        if let Some(view) = view {
            println!("{}", ui::render::render(&view));
        }
    }
}

/// Accepted file type for one upload command.
struct UploadKind {
    extension: &'static str,
    content_type: &'static str,
    rejection: &'static str,
}

const CSV_UPLOAD: UploadKind = UploadKind {
    extension: "csv",
    content_type: "text/csv",
    rejection: "Only CSV files are supported",
};

const PDF_UPLOAD: UploadKind = UploadKind {
    extension: "pdf",
    content_type: "application/pdf",
    rejection: "Only PDF files are supported",
};

fn load_upload(path: &Path, kind: UploadKind) -> Result<UploadFile, String> {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(kind.extension));
    if !matches {
        return Err(kind.rejection.to_string());
    }
    UploadFile::from_path(path, kind.content_type)
        .map_err(|err| format!("Could not read {}: {err}", path.display()))
}

fn print_error(message: String) {
    println!(
        "{}",
        ui::render::render_notice(&Notice::new(NoticeLevel::Error, message))
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_checks_extension_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("leads.CSV");
        std::fs::write(&csv, "email\njobs@acme.example\n").unwrap();

        let file = load_upload(&csv, CSV_UPLOAD).unwrap();
        assert_eq!(file.file_name, "leads.CSV");
        assert_eq!(file.content_type, "text/csv");

        assert_eq!(
            load_upload(&csv, PDF_UPLOAD).unwrap_err(),
            "Only PDF files are supported"
        );
    }

    #[test]
    fn missing_upload_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_upload(&dir.path().join("cv.pdf"), PDF_UPLOAD).unwrap_err();
        assert!(err.starts_with("Could not read"));
    }
}
