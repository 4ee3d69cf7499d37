use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use knock_core::{JobAction, JobId, SubscriptionId};
use knock_logging::{knock_debug, knock_warn};

use crate::jobs::JobApi;
use crate::subscription::{ChannelEventSink, EventSink, Subscriber};
use crate::{AiProvider, ApiClient, ApiError, ClientEvent, UploadFile};

enum ClientCommand {
    Request(Request),
    Subscribe { subscription: SubscriptionId, job_id: JobId },
    Unsubscribe { subscription: SubscriptionId },
}

/// One-shot calls answered by a single [`ClientEvent`].
enum Request {
    Login { email: String, password: String },
    Register { email: String, password: String },
    LoadResumes,
    Start { resume_id: String },
    Action { job_id: JobId, action: JobAction },
    Status { job_id: JobId },
    GmailConnect,
    AiKeys,
    SaveAiKey { provider: AiProvider, api_key: String },
    DeleteAiKey { provider: AiProvider },
    Recipients,
    ImportRecipients { file: UploadFile },
    UploadResume { file: UploadFile },
    SentEmails,
}

/// Runs requests and the job stream on a background runtime.
///
/// Results come back as [`ClientEvent`]s. Dropping the handle stops the
/// runtime thread and cancels any open subscription.
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    event_rx: mpsc::Receiver<ClientEvent>,
}

impl ClientHandle {
    pub fn new(client: ApiClient) -> io::Result<Self> {
        let api: Arc<dyn JobApi> = Arc::new(client.clone());
        Self::with_job_api(client, api)
    }

    /// Uses `api` for job calls and streams, `client` for everything else.
    pub fn with_job_api(client: ApiClient, api: Arc<dyn JobApi>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("knock-client")
            .build()?;

        thread::Builder::new()
            .name("knock-client-commands".to_string())
            .spawn(move || {
                let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
                let subscriber = Subscriber::new(api.clone(), runtime.handle().clone(), sink.clone());
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        ClientCommand::Subscribe {
                            subscription,
                            job_id,
                        } => {
                            subscriber.subscribe(subscription, job_id);
                        }
                        ClientCommand::Unsubscribe { subscription } => {
                            subscriber.unsubscribe(subscription);
                        }
                        ClientCommand::Request(request) => {
                            let client = client.clone();
                            let api = api.clone();
                            let sink = sink.clone();
                            runtime.spawn(async move {
                                let event = handle_request(&client, api.as_ref(), request).await;
                                sink.emit(event);
                            });
                        }
                    }
                }
                knock_debug!("client handle dropped; shutting down");
                drop(subscriber);
                runtime.shutdown_timeout(Duration::from_millis(500));
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn login(&self, email: impl Into<String>, password: impl Into<String>) {
        self.request(Request::Login {
            email: email.into(),
            password: password.into(),
        });
    }

    pub fn register(&self, email: impl Into<String>, password: impl Into<String>) {
        self.request(Request::Register {
            email: email.into(),
            password: password.into(),
        });
    }

    pub fn load_resumes(&self) {
        self.request(Request::LoadResumes);
    }

    pub fn start_job(&self, resume_id: impl Into<String>) {
        self.request(Request::Start {
            resume_id: resume_id.into(),
        });
    }

    pub fn job_action(&self, job_id: impl Into<JobId>, action: JobAction) {
        self.request(Request::Action {
            job_id: job_id.into(),
            action,
        });
    }

    pub fn job_status(&self, job_id: impl Into<JobId>) {
        self.request(Request::Status {
            job_id: job_id.into(),
        });
    }

    pub fn gmail_connect(&self) {
        self.request(Request::GmailConnect);
    }

    /// Loads supported providers together with the stored keys.
    pub fn ai_keys(&self) {
        self.request(Request::AiKeys);
    }

    pub fn save_ai_key(&self, provider: AiProvider, api_key: impl Into<String>) {
        self.request(Request::SaveAiKey {
            provider,
            api_key: api_key.into(),
        });
    }

    pub fn delete_ai_key(&self, provider: AiProvider) {
        self.request(Request::DeleteAiKey { provider });
    }

    pub fn recipients(&self) {
        self.request(Request::Recipients);
    }

    pub fn import_recipients(&self, file: UploadFile) {
        self.request(Request::ImportRecipients { file });
    }

    pub fn upload_resume(&self, file: UploadFile) {
        self.request(Request::UploadResume { file });
    }

    pub fn sent_emails(&self) {
        self.request(Request::SentEmails);
    }

    /// Opens the job stream, replacing whatever stream this handle had open.
    pub fn subscribe(&self, subscription: SubscriptionId, job_id: impl Into<JobId>) {
        self.send(ClientCommand::Subscribe {
            subscription,
            job_id: job_id.into(),
        });
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) {
        self.send(ClientCommand::Unsubscribe { subscription });
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn request(&self, request: Request) {
        self.send(ClientCommand::Request(request));
    }

    fn send(&self, command: ClientCommand) {
        if self.cmd_tx.send(command).is_err() {
            knock_warn!("client runtime is gone; command dropped");
        }
    }
}

async fn handle_request(client: &ApiClient, api: &dyn JobApi, request: Request) -> ClientEvent {
    match request {
        Request::Login { email, password } => {
            auth_event(client.login(&email, &password).await.map(|r| r.access_token))
        }
        Request::Register { email, password } => {
            auth_event(client.register(&email, &password).await.map(|r| r.access_token))
        }
        Request::LoadResumes => {
            let result = client.resume_links().await;
            expired_or(&result).unwrap_or(ClientEvent::ResumesLoaded(result))
        }
        Request::Start { resume_id } => {
            let result = api.start_job(&resume_id).await;
            expired_or(&result).unwrap_or(ClientEvent::StartFinished(result))
        }
        Request::Action { job_id, action } => {
            let result = api.job_action(&job_id, action).await;
            expired_or(&result).unwrap_or(ClientEvent::ActionFinished {
                job_id,
                action,
                result,
            })
        }
        Request::Status { job_id } => {
            let result = api.job_status(&job_id).await;
            expired_or(&result).unwrap_or(ClientEvent::StatusFetched { job_id, result })
        }
        Request::GmailConnect => {
            let result = client.gmail_connect_url().await;
            expired_or(&result).unwrap_or(ClientEvent::GmailConnectUrl(result))
        }
        Request::AiKeys => {
            let result = client.ai_key_overview().await;
            expired_or(&result).unwrap_or(ClientEvent::AiKeysLoaded(result))
        }
        Request::SaveAiKey { provider, api_key } => {
            let result = client.save_ai_key(provider, &api_key).await;
            expired_or(&result).unwrap_or(ClientEvent::AiKeySaved { provider, result })
        }
        Request::DeleteAiKey { provider } => {
            let result = client.delete_ai_key(provider).await;
            expired_or(&result).unwrap_or(ClientEvent::AiKeyDeleted { provider, result })
        }
        Request::Recipients => {
            let result = client.recipients().await;
            expired_or(&result).unwrap_or(ClientEvent::RecipientsLoaded(result))
        }
        Request::ImportRecipients { file } => {
            let result = client.import_recipients(file).await;
            expired_or(&result).unwrap_or(ClientEvent::RecipientsImported(result))
        }
        Request::UploadResume { file } => {
            let result = client.upload_resume(file).await;
            expired_or(&result).unwrap_or(ClientEvent::ResumeUploaded(result))
        }
        Request::SentEmails => {
            let result = client.sent_emails().await;
            expired_or(&result).unwrap_or(ClientEvent::SentEmailsLoaded(result))
        }
    }
}

fn auth_event(result: Result<String, ApiError>) -> ClientEvent {
    match result {
        Ok(access_token) => ClientEvent::Authenticated { access_token },
        Err(err) => ClientEvent::AuthFailed(err),
    }
}

/// A rejected credential is reported once, as a session expiry, instead of as
/// a failure of the individual request.
fn expired_or<T>(result: &Result<T, ApiError>) -> Option<ClientEvent> {
    match result {
        Err(err) if err.is_unauthorized() => Some(ClientEvent::SessionExpired),
        _ => None,
    }
}
