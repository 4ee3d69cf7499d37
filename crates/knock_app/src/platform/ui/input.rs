//! Console command parsing.
use std::path::PathBuf;

use knock_client::AiProvider;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Register { email: String, password: String },
    Logout,
    Resumes,
    Use(String),
    Start,
    Pause,
    Resume,
    Retry,
    Refresh,
    New,
    Gmail,
    Keys,
    SetKey { provider: AiProvider, api_key: String },
    RemoveKey(AiProvider),
    Recipients,
    Import(PathBuf),
    UploadResume(PathBuf),
    Sent,
    ShowSent(String),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  login <email> <password>     sign in
  register <email> <password>  create an account
  logout                       sign out
  resumes                      reload resume links
  use <resume-id>              pick the resume link for the next job
  start | pause | resume | retry | refresh | new
  gmail                        get the Gmail connect link
  keys                         list stored AI keys
  key set <provider> <key>     store an API key (openai, anthropic, grok)
  key rm <provider>            delete a stored API key
  recipients                   list recipients
  import <file.csv>            import recipients from a CSV
  upload-resume <file.pdf>     upload a resume PDF
  sent [email-id]              list sent emails, or show one
  quit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".to_string());
    };
    let rest: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("login", [email, password]) => Command::Login {
            email: (*email).to_string(),
            password: (*password).to_string(),
        },
        ("register", [email, password]) => Command::Register {
            email: (*email).to_string(),
            password: (*password).to_string(),
        },
        ("login" | "register", _) => return Err(format!("usage: {head} <email> <password>")),
        ("use", [id]) => Command::Use((*id).to_string()),
        ("use", _) => return Err("usage: use <resume-id>".to_string()),
        ("logout", []) => Command::Logout,
        ("resumes", []) => Command::Resumes,
        ("start", []) => Command::Start,
        ("pause", []) => Command::Pause,
        ("resume", []) => Command::Resume,
        ("retry", []) => Command::Retry,
        ("refresh", []) => Command::Refresh,
        ("new", []) => Command::New,
        ("gmail", []) => Command::Gmail,
        ("keys", []) => Command::Keys,
        ("key", ["set", provider, api_key]) => Command::SetKey {
            provider: parse_provider(provider)?,
            api_key: (*api_key).to_string(),
        },
        ("key", ["rm", provider]) => Command::RemoveKey(parse_provider(provider)?),
        ("key", _) => return Err("usage: key set <provider> <key> | key rm <provider>".to_string()),
        ("recipients", []) => Command::Recipients,
        ("import", [file]) => Command::Import(PathBuf::from(*file)),
        ("import", _) => return Err("usage: import <file.csv>".to_string()),
        ("upload-resume", [file]) => Command::UploadResume(PathBuf::from(*file)),
        ("upload-resume", _) => return Err("usage: upload-resume <file.pdf>".to_string()),
        ("sent", []) => Command::Sent,
        ("sent", [id]) => Command::ShowSent((*id).to_string()),
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => return Err(format!("unknown command {line:?}; type help")),
    };
    Ok(command)
}

fn parse_provider(name: &str) -> Result<AiProvider, String> {
    name.parse().map_err(|err: knock_client::UnknownProvider| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_credentials_and_arguments() {
        assert_eq!(
            parse_command("login ada@example.com s3cret"),
            Ok(Command::Login {
                email: "ada@example.com".into(),
                password: "s3cret".into(),
            })
        );
        assert_eq!(parse_command("  use  r-42 "), Ok(Command::Use("r-42".into())));
        assert_eq!(parse_command("PAUSE"), Ok(Command::Pause));
    }

    #[test]
    fn rejects_wrong_arity_and_unknown_words() {
        assert!(parse_command("login ada@example.com").is_err());
        assert!(parse_command("use").is_err());
        assert!(parse_command("start now").is_err());
        assert!(parse_command("").is_err());
        assert!(parse_command("launch").is_err());
    }

    #[test]
    fn parses_collaborator_commands() {
        assert_eq!(
            parse_command("key set Anthropic sk-ant-1"),
            Ok(Command::SetKey {
                provider: AiProvider::Anthropic,
                api_key: "sk-ant-1".into(),
            })
        );
        assert_eq!(
            parse_command("key rm grok"),
            Ok(Command::RemoveKey(AiProvider::Grok))
        );
        assert_eq!(
            parse_command("import leads.csv"),
            Ok(Command::Import(PathBuf::from("leads.csv")))
        );
        assert_eq!(
            parse_command("upload-resume cv.pdf"),
            Ok(Command::UploadResume(PathBuf::from("cv.pdf")))
        );
        assert_eq!(parse_command("sent"), Ok(Command::Sent));
        assert_eq!(parse_command("sent e1"), Ok(Command::ShowSent("e1".into())));
        assert_eq!(parse_command("gmail"), Ok(Command::Gmail));
    }

    #[test]
    fn unknown_provider_is_reported() {
        let err = parse_command("key set gemini sk-1").unwrap_err();
        assert!(err.contains("gemini"));
        assert!(parse_command("key drop openai").is_err());
    }
}
