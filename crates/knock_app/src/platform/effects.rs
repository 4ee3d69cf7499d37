use chrono::{DateTime, Utc};
use knock_client::{
    ApiError, ClientEvent, ClientHandle, ErrorKind, ResumeLink, SentEmail, StreamSignal,
};
use knock_core::{Effect, Msg, Notice, NoticeLevel, ResumeChoice};
use knock_logging::{knock_debug, knock_warn};

use super::ui;

/// Executes core effects against the client handle.
pub struct EffectRunner {
    client: ClientHandle,
}

impl EffectRunner {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadResumes => self.client.load_resumes(),
                Effect::StartJob { resume_id } => {
                    knock_debug!("StartJob resume_id={}", resume_id);
                    self.client.start_job(resume_id);
                }
                Effect::RunAction { job_id, action } => {
                    knock_debug!("RunAction job_id={} action={}", job_id, action);
                    self.client.job_action(job_id, action);
                }
                Effect::FetchStatus { job_id } => self.client.job_status(job_id),
                Effect::Subscribe {
                    subscription,
                    job_id,
                } => self.client.subscribe(subscription, job_id),
                Effect::Unsubscribe { subscription } => self.client.unsubscribe(subscription),
                Effect::Notify(notice) => println!("{}", ui::render::render_notice(&notice)),
            }
        }
    }
}

/// What the shell does after printing a screen reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    ReloadKeys,
    ReloadRecipients,
    ReloadResumes,
    RememberSent(Vec<SentEmail>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenReply {
    pub text: String,
    pub follow_up: Option<FollowUp>,
}

impl ScreenReply {
    fn text(text: String) -> Self {
        Self {
            text,
            follow_up: None,
        }
    }

    fn notice(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self::text(ui::render::render_notice(&Notice::new(level, text)))
    }

    fn failure(err: &ApiError, fallback: &str) -> Self {
        let text = user_message(err).unwrap_or_else(|| fallback.to_string());
        Self::notice(NoticeLevel::Error, text)
    }

    fn then(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}

/// Renders replies for the account screens. Any other event is handed back.
pub fn screen_reply(event: ClientEvent) -> Result<ScreenReply, ClientEvent> {
    let reply = match event {
        ClientEvent::GmailConnectUrl(Ok(url)) => {
            ScreenReply::text(format!("Open this link to connect Gmail:\n  {url}"))
        }
        ClientEvent::GmailConnectUrl(Err(err)) => {
            ScreenReply::failure(&err, "Failed to connect Gmail")
        }
        ClientEvent::AiKeysLoaded(Ok(overview)) => {
            ScreenReply::text(ui::screens::render_ai_keys(&overview))
        }
        ClientEvent::AiKeysLoaded(Err(err)) => ScreenReply::failure(&err, "Failed to load keys"),
        ClientEvent::AiKeySaved {
            provider,
            result: Ok(_),
        } => ScreenReply::notice(NoticeLevel::Success, format!("API key saved for {provider}"))
            .then(FollowUp::ReloadKeys),
        ClientEvent::AiKeySaved {
            result: Err(err), ..
        } => ScreenReply::failure(&err, "Failed to save key"),
        ClientEvent::AiKeyDeleted {
            provider,
            result: Ok(_),
        } => ScreenReply::notice(NoticeLevel::Success, format!("Deleted {provider} key"))
            .then(FollowUp::ReloadKeys),
        ClientEvent::AiKeyDeleted {
            result: Err(err), ..
        } => ScreenReply::failure(&err, "Failed to delete key"),
        ClientEvent::RecipientsLoaded(Ok(recipients)) => {
            ScreenReply::text(ui::screens::render_recipients(&recipients))
        }
        ClientEvent::RecipientsLoaded(Err(err)) => {
            knock_warn!("Failed to load recipients: {}", err);
            ScreenReply::notice(NoticeLevel::Error, "Failed to load recipients")
        }
        ClientEvent::RecipientsImported(Ok(response)) => ScreenReply::notice(
            NoticeLevel::Success,
            format!("Imported {} recipients", response.imported),
        )
        .then(FollowUp::ReloadRecipients),
        ClientEvent::RecipientsImported(Err(err)) => ScreenReply::failure(&err, "Import failed"),
        ClientEvent::ResumeUploaded(Ok(response)) => ScreenReply::text(format!(
            "{}\n  Uploaded: {}",
            ui::render::render_notice(&Notice::new(NoticeLevel::Success, "Resume uploaded")),
            response.path
        ))
        .then(FollowUp::ReloadResumes),
        ClientEvent::ResumeUploaded(Err(err)) => ScreenReply::failure(&err, "Upload failed"),
        ClientEvent::SentEmailsLoaded(Ok(emails)) => {
            ScreenReply::text(ui::screens::render_sent_emails(&emails))
                .then(FollowUp::RememberSent(emails))
        }
        ClientEvent::SentEmailsLoaded(Err(err)) => {
            knock_warn!("Failed to load sent emails: {}", err);
            ScreenReply::notice(NoticeLevel::Error, "Failed to load sent emails")
        }
        other => return Err(other),
    };
    Ok(reply)
}

/// Translates a client event into a core message.
///
/// Sign-in outcomes and account screen replies are not core messages and
/// yield `None`; the shell handles them itself.
pub fn event_to_msg(event: ClientEvent, now: DateTime<Utc>) -> Option<Msg> {
    let msg = match event {
        ClientEvent::Authenticated { .. }
        | ClientEvent::AuthFailed(_)
        | ClientEvent::GmailConnectUrl(_)
        | ClientEvent::AiKeysLoaded(_)
        | ClientEvent::AiKeySaved { .. }
        | ClientEvent::AiKeyDeleted { .. }
        | ClientEvent::RecipientsLoaded(_)
        | ClientEvent::RecipientsImported(_)
        | ClientEvent::ResumeUploaded(_)
        | ClientEvent::SentEmailsLoaded(_) => return None,
        ClientEvent::SessionExpired => Msg::SessionExpired,
        ClientEvent::ResumesLoaded(Ok(links)) => {
            Msg::ResumesLoaded(links.into_iter().map(resume_choice).collect())
        }
        ClientEvent::ResumesLoaded(Err(err)) => {
            knock_warn!("Failed to load resume links: {}", err);
            Msg::ResumesLoaded(Vec::new())
        }
        ClientEvent::StartFinished(Ok(outcome)) => Msg::StartSucceeded(outcome),
        ClientEvent::StartFinished(Err(err)) => Msg::StartFailed {
            message: user_message(&err),
        },
        ClientEvent::ActionFinished {
            job_id,
            action,
            result,
        } => match result {
            Ok(job) => Msg::ActionSucceeded {
                job_id,
                action,
                job,
            },
            Err(err) => Msg::ActionFailed {
                job_id,
                action,
                message: user_message(&err),
            },
        },
        ClientEvent::StatusFetched { job_id, result } => match result {
            Ok(job) => Msg::RefreshSucceeded { job_id, job },
            Err(err) => Msg::RefreshFailed {
                job_id,
                message: user_message(&err),
            },
        },
        ClientEvent::Stream {
            subscription,
            job_id,
            signal,
        } => match signal {
            StreamSignal::Update(update) => Msg::StreamUpdate {
                subscription,
                job_id,
                update,
                received_at: now,
            },
            StreamSignal::Failed(err) => Msg::StreamFailed {
                subscription,
                job_id,
                message: err.to_string(),
            },
            StreamSignal::Ended => Msg::StreamEnded {
                subscription,
                job_id,
            },
        },
    };
    Some(msg)
}

fn resume_choice(link: ResumeLink) -> ResumeChoice {
    ResumeChoice {
        id: link.id,
        shared_url: link.shared_url,
    }
}

/// Only messages the server wrote are shown verbatim; transport failures
/// fall back to the generic notice text.
fn user_message(err: &ApiError) -> Option<String> {
    match err.kind {
        ErrorKind::HttpStatus(_) => Some(err.message.clone()),
        _ => {
            knock_warn!("request failed: {} ({})", err, err.kind);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knock_client::{AiProvider, ImportResponse, SaveKeyResponse};
    use knock_core::{JobAction, JobUpdate};

    fn api_error(kind: ErrorKind, message: &str) -> ApiError {
        ApiError {
            kind,
            message: message.to_string(),
        }
    }

    #[test]
    fn server_message_reaches_core_only_for_http_errors() {
        let msg = event_to_msg(
            ClientEvent::ActionFinished {
                job_id: "job-1".into(),
                action: JobAction::Pause,
                result: Err(api_error(ErrorKind::HttpStatus(409), "Job already paused")),
            },
            Utc::now(),
        );
        assert_eq!(
            msg,
            Some(Msg::ActionFailed {
                job_id: "job-1".into(),
                action: JobAction::Pause,
                message: Some("Job already paused".into()),
            })
        );

        let msg = event_to_msg(
            ClientEvent::StartFinished(Err(api_error(ErrorKind::Timeout, "operation timed out"))),
            Utc::now(),
        );
        assert_eq!(msg, Some(Msg::StartFailed { message: None }));
    }

    #[test]
    fn stream_signals_keep_subscription_tag() {
        let now = Utc::now();
        let update = JobUpdate {
            sent_count: Some(4),
            ..JobUpdate::default()
        };
        let msg = event_to_msg(
            ClientEvent::Stream {
                subscription: 3,
                job_id: "job-1".into(),
                signal: StreamSignal::Update(update.clone()),
            },
            now,
        );
        assert_eq!(
            msg,
            Some(Msg::StreamUpdate {
                subscription: 3,
                job_id: "job-1".into(),
                update,
                received_at: now,
            })
        );

        let msg = event_to_msg(
            ClientEvent::Stream {
                subscription: 3,
                job_id: "job-1".into(),
                signal: StreamSignal::Ended,
            },
            now,
        );
        assert_eq!(
            msg,
            Some(Msg::StreamEnded {
                subscription: 3,
                job_id: "job-1".into(),
            })
        );
    }

    #[test]
    fn resume_links_become_choices_and_auth_events_stay_out() {
        let msg = event_to_msg(
            ClientEvent::ResumesLoaded(Ok(vec![ResumeLink {
                id: "r1".into(),
                shared_url: "https://drive.example/r1".into(),
            }])),
            Utc::now(),
        );
        assert_eq!(
            msg,
            Some(Msg::ResumesLoaded(vec![ResumeChoice {
                id: "r1".into(),
                shared_url: "https://drive.example/r1".into(),
            }]))
        );

        let auth = ClientEvent::Authenticated {
            access_token: "tok".into(),
        };
        assert_eq!(event_to_msg(auth, Utc::now()), None);
        assert_eq!(
            event_to_msg(ClientEvent::SessionExpired, Utc::now()),
            Some(Msg::SessionExpired)
        );
    }

    #[test]
    fn saved_key_reply_reloads_key_list() {
        let reply = screen_reply(ClientEvent::AiKeySaved {
            provider: AiProvider::Grok,
            result: Ok(SaveKeyResponse { success: true }),
        })
        .unwrap();
        assert_eq!(reply.text, "[ok] API key saved for grok");
        assert_eq!(reply.follow_up, Some(FollowUp::ReloadKeys));
    }

    #[test]
    fn import_reply_reloads_recipients_and_failure_uses_server_text() {
        let reply =
            screen_reply(ClientEvent::RecipientsImported(Ok(ImportResponse { imported: 12 })))
                .unwrap();
        assert_eq!(reply.text, "[ok] Imported 12 recipients");
        assert_eq!(reply.follow_up, Some(FollowUp::ReloadRecipients));

        let reply = screen_reply(ClientEvent::RecipientsImported(Err(api_error(
            ErrorKind::HttpStatus(400),
            "CSV is missing an email column",
        ))))
        .unwrap();
        assert_eq!(reply.text, "[error] CSV is missing an email column");
        assert_eq!(reply.follow_up, None);

        let reply = screen_reply(ClientEvent::ResumeUploaded(Err(api_error(
            ErrorKind::Network,
            "connection reset",
        ))))
        .unwrap();
        assert_eq!(reply.text, "[error] Upload failed");
    }

    #[test]
    fn job_events_are_handed_back() {
        let event = ClientEvent::SessionExpired;
        assert_eq!(screen_reply(event.clone()), Err(event));
    }
}
