//! Console driver: a stdin/stdout REPL over the registration form, for
//! running the flow outside the Telegram client.

use std::sync::Mutex;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::i18n::Locale;
use crate::navigation::{Navigator, Route};
use crate::registration::{FormSnapshot, RegistrationForm, SubmissionStatus, SubmitFailure};

/// A line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Anything that is not a slash command edits the phone field.
    Phone(String),
    Locate,
    Submit,
    Show,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let command = match line {
            "/locate" => Self::Locate,
            "/submit" => Self::Submit,
            "/show" => Self::Show,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            other if other.starts_with('/') => Self::Unknown(other.to_string()),
            phone => Self::Phone(phone.to_string()),
        };
        Some(command)
    }
}

/// Prints route changes and remembers the current route.
#[derive(Default)]
pub struct ConsoleNavigator {
    current: Mutex<Option<Route>>,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        info!(route = %route, "Navigating");
        eprintln!("-> {}", route.path());
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(route);
    }
}

/// Render the form the way the registration screen lays it out.
pub fn render(snapshot: &FormSnapshot, locale: Locale) -> String {
    let mut out = String::new();
    out.push_str(&format!("Phone:    {}\n", snapshot.phone_display));

    let location = match snapshot.location {
        Some(position) => position.to_string(),
        None if snapshot.locating => "locating...".to_string(),
        None => "not set".to_string(),
    };
    out.push_str(&format!("Location: {location}\n"));

    let status = match snapshot.status {
        None => "idle",
        Some(SubmissionStatus::Submitting) => "submitting...",
        Some(SubmissionStatus::Success) => "registered",
        Some(SubmissionStatus::Error(SubmitFailure::Conflict)) => "already registered",
        Some(SubmissionStatus::Error(_)) => "failed",
    };
    out.push_str(&format!("Status:   {status}\n"));

    if let Some(notice) = snapshot.notice {
        out.push_str(&format!("Notice:   {}\n", notice.text(locale)));
    }
    out
}

const HELP: &str = "Type a phone number to edit it. Commands: /locate, /submit, /show, /quit";

/// Run the form REPL on stdin until EOF or `/quit`.
pub async fn run_form(form: &RegistrationForm) {
    run_form_with(form, BufReader::new(tokio::io::stdin())).await;
}

/// Run the form REPL over any line source.
pub async fn run_form_with<R>(form: &RegistrationForm, reader: R)
where
    R: AsyncBufRead + Unpin,
{
    let locale = form.locale();
    let mut lines = reader.lines();

    eprintln!("Registering {}. {HELP}", form.identity().display_name());
    println!("{}", render(&form.snapshot().await, locale));
    eprint!("> ");

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break, // EOF
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                break;
            }
        };

        let Some(command) = Command::parse(&line) else {
            eprint!("> ");
            continue;
        };
        debug!(?command, "Console command");

        match command {
            Command::Phone(raw) => {
                if !form.input_phone(&raw).await {
                    eprintln!("Busy; input ignored");
                }
            }
            Command::Locate => {
                // Errors already land in the snapshot notice.
                let _ = form.request_location().await;
            }
            Command::Submit => {
                let _ = form.submit().await;
            }
            Command::Show => {}
            Command::Help => {
                eprintln!("{HELP}");
                eprint!("> ");
                continue;
            }
            Command::Quit => break,
            Command::Unknown(name) => {
                eprintln!("Unknown command {name}. {HELP}");
                eprint!("> ");
                continue;
            }
        }

        println!("\n{}", render(&form.snapshot().await, locale));
        eprint!("> ");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::i18n::UserMessage;
    use crate::identity::{IdentityProvider, LocalProvider};
    use crate::location::{BrowserLocator, Coordinate, FixedGeolocation, Geolocation, TASHKENT};
    use crate::registration::FormConfig;
    use crate::store::MemoryStore;

    #[test]
    fn commands_parse() {
        assert_eq!(Command::parse("  "), None);
        assert_eq!(Command::parse("/submit"), Some(Command::Submit));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
        assert_eq!(
            Command::parse("+998 90 123"),
            Some(Command::Phone("+998 90 123".into()))
        );
        assert_eq!(
            Command::parse("/map"),
            Some(Command::Unknown("/map".into()))
        );
    }

    #[test]
    fn navigator_remembers_route() {
        let navigator = ConsoleNavigator::new();
        assert_eq!(navigator.current(), None);
        navigator.navigate(Route::Register);
        assert_eq!(navigator.current(), Some(Route::Register));
    }

    #[test]
    fn render_shows_fields_and_notice() {
        let snapshot = FormSnapshot {
            phone_number: "+998901234567".into(),
            phone_display: "+998-90-123-45-67".into(),
            location: Some(Coordinate::new(41.3111, 69.2401)),
            status: Some(SubmissionStatus::Error(SubmitFailure::Conflict)),
            notice: Some(UserMessage::AlreadyRegistered),
            locating: false,
            submitting: false,
        };
        let text = render(&snapshot, Locale::En);
        assert!(text.contains("+998-90-123-45-67"));
        assert!(text.contains("41.311100, 69.240100"));
        assert!(text.contains("already registered"));
        assert!(text.contains(UserMessage::AlreadyRegistered.text(Locale::En)));
    }

    #[tokio::test]
    async fn script_fills_and_submits_until_quit() {
        let store = Arc::new(MemoryStore::new());
        let identity = LocalProvider::with_id("fake-user-123").current_user().unwrap();
        let geolocation: Arc<dyn Geolocation> = Arc::new(FixedGeolocation::new(Some(TASHKENT)));
        let locator = BrowserLocator::new(Some(geolocation));
        let config = FormConfig {
            reset_delay: None,
            ..FormConfig::default()
        };
        let form = RegistrationForm::new(identity, store.clone(), Arc::new(locator), config);

        let script: &[u8] = b"90 123\n+998 90 123 45 67\n/locate\n/bogus\n/submit\n/quit\n/submit\n";
        run_form_with(&form, script).await;

        assert_eq!(store.write_count(), 1);
        let snapshot = form.snapshot().await;
        assert_eq!(snapshot.phone_number, "+998901234567");
        assert_eq!(snapshot.status, Some(SubmissionStatus::Success));
    }
}
