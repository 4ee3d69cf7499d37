//! Job stream subscriptions, at most one live per `Subscriber`.
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use knock_core::{JobId, SubscriptionId};
use knock_logging::{knock_debug, knock_info, knock_warn};
use tokio_util::sync::CancellationToken;

use crate::jobs::JobApi;
use crate::{ClientEvent, StreamSignal};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ClientEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<ClientEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }
}

/// Cancels one subscription. Cancelling twice, or after the stream ended, is harmless.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    cancel: CancellationToken,
}

impl SubscriptionHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct ActiveStream {
    id: SubscriptionId,
    job_id: JobId,
    cancel: CancellationToken,
}

/// Owns the stream subscription of one consumer.
///
/// Subscribing again cancels the previous stream before the new one opens, so
/// two handlers never race on the same store entry. Dropping the subscriber
/// cancels whatever is still open.
pub struct Subscriber {
    api: Arc<dyn JobApi>,
    runtime: tokio::runtime::Handle,
    sink: Arc<dyn EventSink>,
    active: Mutex<Option<ActiveStream>>,
}

impl Subscriber {
    pub fn new(
        api: Arc<dyn JobApi>,
        runtime: tokio::runtime::Handle,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            api,
            runtime,
            sink,
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self, subscription: SubscriptionId, job_id: JobId) -> SubscriptionHandle {
        let cancel = CancellationToken::new();
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ActiveStream {
                id: subscription,
                job_id: job_id.clone(),
                cancel: cancel.clone(),
            });
        if let Some(previous) = previous {
            knock_debug!(
                "subscription {} for job {} superseded by {}",
                previous.id,
                previous.job_id,
                subscription
            );
            previous.cancel.cancel();
        }

        self.runtime.spawn(run_subscription(
            self.api.clone(),
            self.sink.clone(),
            subscription,
            job_id,
            cancel.clone(),
        ));
        SubscriptionHandle { cancel }
    }

    /// Cancels `subscription` if it is the live one. Returns whether it was.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|stream| stream.id == subscription) {
            if let Some(stream) = active.take() {
                stream.cancel.cancel();
                knock_debug!("subscription {} for job {} closed", stream.id, stream.job_id);
            }
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&self) {
        if let Some(stream) = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            stream.cancel.cancel();
        }
    }

    pub fn active(&self) -> Option<(SubscriptionId, JobId)> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|stream| (stream.id, stream.job_id.clone()))
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn run_subscription(
    api: Arc<dyn JobApi>,
    sink: Arc<dyn EventSink>,
    subscription: SubscriptionId,
    job_id: JobId,
    cancel: CancellationToken,
) {
    let emit = |signal: StreamSignal| {
        sink.emit(ClientEvent::Stream {
            subscription,
            job_id: job_id.clone(),
            signal,
        });
    };

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = api.open_job_stream(&job_id) => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(err) if err.is_unauthorized() => {
            sink.emit(ClientEvent::SessionExpired);
            return;
        }
        Err(err) => {
            knock_warn!("job {} stream failed to open: {}", job_id, err);
            if !cancel.is_cancelled() {
                emit(StreamSignal::Failed(err));
            }
            return;
        }
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                knock_debug!("subscription {} cancelled", subscription);
                return;
            }
            next = stream.next() => next,
        };
        match next {
            Some(Ok(update)) => emit(StreamSignal::Update(update)),
            Some(Err(err)) => {
                // No reconnect: the next step is up to the user.
                knock_warn!("job {} stream failed: {}", job_id, err);
                emit(StreamSignal::Failed(err));
                return;
            }
            None => {
                knock_info!("job {} stream ended", job_id);
                emit(StreamSignal::Ended);
                return;
            }
        }
    }
}
