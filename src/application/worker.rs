//! Background runner for dispatched call jobs

use super::entrypoint::{run_call_job, CallDependencies, CallJob, CallSettings, JobError, JobOutcome};
use crate::domain::appointment::AppointmentBook;
use crate::domain::call_control::CallControl;
use crate::domain::session::SessionConnector;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Accepts jobs and runs them without blocking the caller
#[cfg_attr(test, mockall::automock)]
pub trait JobRunner: Send + Sync {
    fn spawn(&self, job: CallJob);
}

#[derive(Clone)]
pub struct CallWorker {
    settings: CallSettings,
    call_control: Arc<dyn CallControl>,
    appointments: Arc<dyn AppointmentBook>,
    sessions: Arc<dyn SessionConnector>,
}

impl CallWorker {
    pub fn new(
        settings: CallSettings,
        call_control: Arc<dyn CallControl>,
        appointments: Arc<dyn AppointmentBook>,
        sessions: Arc<dyn SessionConnector>,
    ) -> Self {
        Self {
            settings,
            call_control,
            appointments,
            sessions,
        }
    }

    /// Open a session for the job and run it to the end
    pub async fn run(&self, job: CallJob) -> Result<JobOutcome, JobError> {
        let session = self.sessions.connect().await?;
        run_call_job(
            &job,
            &self.settings,
            CallDependencies {
                call_control: self.call_control.clone(),
                session,
                appointments: self.appointments.clone(),
            },
        )
        .await
    }
}

impl JobRunner for CallWorker {
    fn spawn(&self, job: CallJob) {
        let worker = self.clone();
        let span = tracing::info_span!("call_job", job_id = %job.job_id, room = %job.room_name);
        tokio::spawn(
            async move {
                match worker.run(job).await {
                    Ok(outcome) => info!("job finished: {:?}", outcome),
                    Err(e) => error!("job failed: {}", e),
                }
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::appointment::StaticAppointmentBook;
    use crate::domain::call_control::MockCallControl;
    use crate::domain::session::{MockSessionConnector, SessionError};
    use std::time::Duration;

    fn settings() -> CallSettings {
        CallSettings {
            sip_trunk_id: "ST_trunk".to_string(),
            caller_number: "+17345214522".to_string(),
            participant_wait_timeout: Duration::from_secs(1),
            instructions: String::new(),
        }
    }

    #[tokio::test]
    async fn test_session_connect_failure_skips_dial() {
        let mut call_control = MockCallControl::new();
        call_control.expect_create_sip_participant().times(0);

        let mut sessions = MockSessionConnector::new();
        sessions
            .expect_connect()
            .times(1)
            .returning(|| Err(SessionError::Connection("refused".to_string())));

        let worker = CallWorker::new(
            settings(),
            Arc::new(call_control),
            Arc::new(StaticAppointmentBook::default()),
            Arc::new(sessions),
        );
        let result = worker
            .run(CallJob::new("call-1", r#"{"phone_number": "+918980579954"}"#))
            .await;
        assert!(matches!(result, Err(JobError::Session(_))));
    }
}
