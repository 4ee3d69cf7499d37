//! Server-sent event parsing for the job progress stream.
use eventsource_stream::Eventsource;
use futures_util::future;
use futures_util::StreamExt;
use knock_core::JobUpdate;
use knock_logging::knock_debug;

use crate::jobs::JobEventStream;
use crate::{ApiError, ErrorKind};

/// Parses a streaming response into job deltas.
///
/// Messages whose data is not a JSON delta are dropped without ending the
/// stream. A protocol or connection error is yielded once and ends it.
pub fn parse_job_stream(response: reqwest::Response) -> JobEventStream {
    let mapped = response
        .bytes_stream()
        .eventsource()
        .filter_map(|result| async move {
            match result {
                Ok(event) => match serde_json::from_str::<JobUpdate>(&event.data) {
                    Ok(update) => Some(Ok(update)),
                    Err(err) => {
                        knock_debug!("dropping malformed job event {:?}: {}", event.data, err);
                        None
                    }
                },
                Err(err) => Some(Err(ApiError::new(ErrorKind::Network, err.to_string()))),
            }
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        });

    Box::pin(mapped)
}
