use std::time::{Duration, Instant};
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

use crate::app::config::PollingConfig;
use crate::assistant::client::AssistantClient;
use crate::assistant::types::{RunObject, RunStatus};
use crate::error::{Error, Result};

/// Polls a run until it reaches a terminal status.
///
/// Fetch intervals grow exponentially from the configured floor to the
/// configured ceiling, with jitter, and the whole wait is bounded by a
/// deadline. A run the service reports as anything other than `completed`
/// is an error here, including `requires_action`: this application
/// registers nothing that could satisfy a tool request.
pub struct RunPoller {
    config: PollingConfig,
}

impl RunPoller {
    pub fn new(config: PollingConfig) -> Self {
        Self { config }
    }

    fn intervals(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(self.config.initial_interval_ms.max(2) / 2)
            .max_delay(Duration::from_millis(self.config.max_interval_ms))
    }

    pub async fn await_run<F>(
        &self,
        client: &AssistantClient,
        thread_id: &str,
        run_id: &str,
        mut on_status: F,
    ) -> Result<RunObject>
    where
        F: FnMut(RunStatus),
    {
        let deadline = Instant::now() + Duration::from_secs(self.config.deadline_secs);
        let mut intervals = self.intervals();
        let mut last_status: Option<RunStatus> = None;

        loop {
            let run = client.get_run(thread_id, run_id).await?;

            if last_status != Some(run.status) {
                debug!("Run {} is {}", run_id, run.status);
                on_status(run.status);
                last_status = Some(run.status);
            }

            match run.status {
                RunStatus::Completed => return Ok(run),
                RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::RequiresAction => {
                    let message = match run.last_error {
                        Some(err) => err.message,
                        None if run.status == RunStatus::RequiresAction => {
                            "run requested tool output, which this application does not provide"
                                .to_string()
                        }
                        None => "no detail reported by the service".to_string(),
                    };
                    warn!("Run {} ended as {}: {}", run_id, run.status, message);
                    return Err(Error::RunFailed {
                        run_id: run.id,
                        status: run.status.to_string(),
                        message,
                    });
                }
                RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling => {
                    let step = intervals
                        .next()
                        .unwrap_or(Duration::from_millis(self.config.max_interval_ms));
                    // Equal jitter: half fixed, half random.
                    let delay = step / 2 + step.mul_f64(rand::random::<f64>() * 0.5);

                    if Instant::now() + delay >= deadline {
                        warn!(
                            "Run {} still {} at the polling deadline",
                            run_id, run.status
                        );
                        return Err(Error::RunTimeout {
                            run_id: run_id.to_string(),
                            seconds: self.config.deadline_secs,
                        });
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
