//! Knock Knock client: authenticated HTTP transport, job stream subscriptions
//! and the background handle that executes core effects.
mod credentials;
mod handle;
mod http;
mod jobs;
mod resources;
mod stream;
mod subscription;
mod types;

pub use credentials::Credentials;
pub use handle::ClientHandle;
pub use http::{ApiClient, ClientSettings, DEFAULT_BASE_URL};
pub use jobs::{JobApi, JobEventStream};
pub use resources::{
    AiKeyOverview, AiKeyRecord, AiProvider, AuthResponse, CompanyEmail, GmailConnectResponse,
    ImportResponse, Recipient, RecipientStatus, ResumeLink, ResumeUploadResponse, SaveKeyResponse,
    SentEmail, UnknownProvider, UploadFile,
};
pub use stream::parse_job_stream;
pub use subscription::{ChannelEventSink, EventSink, Subscriber, SubscriptionHandle};
pub use types::{ApiError, ClientEvent, ErrorKind, StreamSignal};
