//! Search-box debouncing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::worker::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebounceConfig {
    /// Quiet period after the last keystroke before the value is delivered.
    #[serde(with = "millis")]
    pub delay: Duration,
    /// Upper bound on how long continuous typing can hold back delivery.
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Coalesces search text into settled values delivered on a channel.
///
/// Dropping the debouncer (or calling [`SearchDebouncer::shutdown`]) delivers any pending value
/// and then closes the output channel.
#[derive(Debug)]
pub struct SearchDebouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl SearchDebouncer {
    /// Start the debounce task on the current tokio runtime.
    pub fn spawn(config: DebounceConfig) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output, output_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(config, input_rx, output));
        (Self { input, task }, output_rx)
    }

    /// Record the latest search text. Returns `false` once the task has stopped.
    pub fn push(&self, text: impl Into<String>) -> bool {
        self.input.send(text.into()).is_ok()
    }

    pub async fn shutdown(self) -> Result<(), WorkerError> {
        let SearchDebouncer { input, task } = self;
        drop(input);
        task.await?;
        Ok(())
    }
}

async fn run(
    config: DebounceConfig,
    mut input: mpsc::UnboundedReceiver<String>,
    output: mpsc::UnboundedSender<String>,
) {
    let mut pending: Option<String> = None;
    let mut first_seen = Instant::now();
    let mut quiet_until = Instant::now();
    let mut last_sent: Option<String> = None;

    loop {
        if pending.is_none() {
            match input.recv().await {
                Some(text) => {
                    first_seen = Instant::now();
                    quiet_until = first_seen + config.delay;
                    pending = Some(text);
                }
                None => break,
            }
            continue;
        }

        let fire_at = quiet_until.min(first_seen + config.max_delay);
        tokio::select! {
            next = input.recv() => match next {
                Some(text) => {
                    quiet_until = Instant::now() + config.delay;
                    pending = Some(text);
                }
                None => {
                    deliver(pending.take(), &mut last_sent, &output);
                    break;
                }
            },
            _ = tokio::time::sleep_until(fire_at) => {
                if !deliver(pending.take(), &mut last_sent, &output) {
                    break;
                }
            }
        }
    }
}

/// Send `value` unless it repeats the previous delivery. Returns `false` when nobody listens.
fn deliver(
    value: Option<String>,
    last_sent: &mut Option<String>,
    output: &mpsc::UnboundedSender<String>,
) -> bool {
    let Some(value) = value else {
        return true;
    };
    if last_sent.as_deref() == Some(value.as_str()) {
        return true;
    }
    *last_sent = Some(value.clone());
    output.send(value).is_ok()
}
