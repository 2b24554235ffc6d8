//! Test harness utilities for the poller behavioural suites.

mod backend_provider;
mod config_loader;
mod reporter;
mod workflow;
mod world;

pub use backend_provider::RecordingBackendProvider;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use workflow::RecordingWorkflowBackend;
pub use world::{TestWorld, world};

/// Named message bodies used across scenarios.
pub fn message_body(name: &str) -> Result<&'static str, String> {
    let body = match name {
        "transcode start job" => {
            r#"{"time":"t1","job_id":"j1","type":"START_JOB","data":{"workflow":{"name":"transcode","version":"1","domain":"prod","taskList":"default"}}}"#
        }
        "pause job" => r#"{"time":"t1","job_id":"j1","type":"PAUSE_JOB","data":{}}"#,
        "cancel job" => {
            r#"{"time":"t1","job_id":"j1","type":"CANCEL_JOB","data":{"workflow":{"name":"transcode"}}}"#
        }
        "start job without workflow" => {
            r#"{"time":"t1","job_id":"j1","type":"START_JOB","data":{"source":"in.mov"}}"#
        }
        "start job without job id" => {
            r#"{"time":"t1","type":"START_JOB","data":{"workflow":{"name":"transcode","version":"1","domain":"prod","taskList":"default"}}}"#
        }
        "malformed" => "not json",
        other => return Err(format!("unknown message fixture '{other}'")),
    };
    Ok(body)
}
