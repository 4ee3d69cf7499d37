//! Text rendering for the account screens next to the job panel.
use chrono::{DateTime, Utc};
use knock_client::{AiKeyOverview, Recipient, SentEmail};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";
const SHORT_ID_LEN: usize = 8;

pub fn render_ai_keys(overview: &AiKeyOverview) -> String {
    let mut lines = vec!["AI keys".to_string()];
    if overview.keys.is_empty() {
        lines.push("  No keys yet. Save one to use AI features.".to_string());
    }
    for key in &overview.keys {
        let added = key
            .created_at
            .map(|at| format!("added {}", at.format(TIME_FORMAT)))
            .unwrap_or_else(|| "added at an unknown time".to_string());
        lines.push(format!("  {:<10} {added}", key.provider.as_str()));
    }

    let available = overview.available();
    if available.is_empty() {
        lines.push("  Every provider already has a saved key.".to_string());
    } else {
        let names: Vec<&str> = available.iter().map(|provider| provider.as_str()).collect();
        lines.push(format!("  available: {}", names.join(", ")));
    }
    lines.join("\n")
}

pub fn render_recipients(recipients: &[Recipient]) -> String {
    if recipients.is_empty() {
        return "No recipients yet. Import a CSV to get started.".to_string();
    }
    let mut lines = vec![format!("Recipients ({})", recipients.len())];
    for recipient in recipients {
        lines.push(format!(
            "  {:<24} {:<32} {:<8} {:<20} {:<10} {}",
            recipient.company_email.company_name,
            recipient.company_email.email,
            recipient.status.label(),
            time_or_dash(recipient.sent_at),
            recipient.job_id.as_deref().map_or_else(|| "-".to_string(), short_id),
            recipient.error.as_deref().unwrap_or("-"),
        ));
    }
    lines.join("\n")
}

pub fn render_sent_emails(emails: &[SentEmail]) -> String {
    if emails.is_empty() {
        return "No emails sent yet. Start a job first.".to_string();
    }
    let mut lines = vec![format!("Sent emails ({})", emails.len())];
    for email in emails {
        lines.push(format!(
            "  {:<10} {:<32} {:<20} {}",
            email.id,
            email.recipient_email,
            email.sent_at.format(TIME_FORMAT),
            email.subject
        ));
    }
    lines.join("\n")
}

pub fn render_sent_email(email: &SentEmail) -> String {
    format!(
        "To: {}\nSubject: {}\nSent: {}\n\n{}",
        email.recipient_email,
        email.subject,
        email.sent_at.format(TIME_FORMAT),
        email.body
    )
}

fn time_or_dash(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |at| at.format(TIME_FORMAT).to_string())
}

fn short_id(id: &str) -> String {
    if id.chars().count() <= SHORT_ID_LEN {
        return id.to_string();
    }
    let head: String = id.chars().take(SHORT_ID_LEN).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use knock_client::{AiKeyRecord, AiProvider, CompanyEmail, RecipientStatus};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 10, minute, 0).unwrap()
    }

    #[test]
    fn keys_list_names_remaining_providers() {
        let overview = AiKeyOverview {
            providers: vec![AiProvider::Openai, AiProvider::Anthropic],
            keys: vec![AiKeyRecord {
                provider: AiProvider::Openai,
                created_at: Some(at(4)),
            }],
        };
        let text = render_ai_keys(&overview);
        assert!(text.contains("openai     added 2026-01-05 10:04 UTC"));
        assert!(text.contains("available: anthropic"));

        let empty = AiKeyOverview {
            providers: vec![AiProvider::Openai],
            keys: Vec::new(),
        };
        assert!(render_ai_keys(&empty).contains("No keys yet."));
    }

    #[test]
    fn recipient_row_shows_status_and_short_job() {
        let recipient = Recipient {
            id: "rc1".into(),
            company_email_id: "ce1".into(),
            status: RecipientStatus::Failed,
            error: Some("Mailbox full".into()),
            sent_at: None,
            job_id: Some("0123456789abcdef".into()),
            created_at: at(0),
            company_email: CompanyEmail {
                id: "ce1".into(),
                email: "jobs@acme.example".into(),
                company_name: "Acme".into(),
                description: None,
                logo: None,
                tags: Vec::new(),
            },
        };
        let text = render_recipients(&[recipient]);
        assert!(text.starts_with("Recipients (1)"));
        assert!(text.contains("FAILED"));
        assert!(text.contains("01234567…"));
        assert!(text.contains("Mailbox full"));
        assert_eq!(
            render_recipients(&[]),
            "No recipients yet. Import a CSV to get started."
        );
    }

    #[test]
    fn sent_email_detail_includes_body() {
        let email = SentEmail {
            id: "e1".into(),
            job_id: "j1".into(),
            recipient_email: "jobs@acme.example".into(),
            subject: "Hello Acme".into(),
            body: "Hi,\nI'd love to join.".into(),
            sent_at: at(3),
        };
        assert!(render_sent_emails(std::slice::from_ref(&email)).contains("Hello Acme"));
        let detail = render_sent_email(&email);
        assert!(detail.starts_with("To: jobs@acme.example\nSubject: Hello Acme"));
        assert!(detail.ends_with("I'd love to join."));
    }
}
