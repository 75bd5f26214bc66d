use std::time::Duration;
use tonic::codegen::http::uri::InvalidUri;

/// Errors thrown while establishing the connection to the Temporal server
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum ClientInitError {
    /// Invalid URI: {0:?}
    InvalidUri(#[from] InvalidUri),
    /// Server connection error: {0:?}
    TonicTransportError(#[from] tonic::transport::Error),
    /// `get_system_info` call failed after connecting: {0:?}
    SystemInfoCallError(tonic::Status),
}

/// Errors in the process configuration. All of them are fatal at startup.
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum ConfigError {
    /// The Temporal endpoint was not provided (set `TEMPORAL_GRPC_ENDPOINT` or `--endpoint`)
    MissingEndpoint,
    /// The Temporal endpoint `{endpoint}` is invalid: {reason}
    InvalidEndpoint {
        /// The value as provided
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },
    /// Unknown workflow id reuse policy `{0}`
    UnknownIdReusePolicy(String),
    /// Could not build options: {0}
    IncompleteOptions(String),
}

/// Errors returned by [crate::WorkflowClientTrait] calls
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum ClientCallError {
    /// A workflow with id `{workflow_id}` is already running
    AlreadyStarted {
        /// The rejected workflow id
        workflow_id: String,
    },
    /// Server returned a malformed response: {0}
    MalformedResponse(String),
    /// Could not encode the workflow input: {0}
    InputEncoding(String),
    /// Unhandled error when calling the temporal server: {0:?}
    TonicError(#[from] tonic::Status),
}

/// Errors that end [crate::Worker::run]
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum WorkerError {
    /// Worker for task queue `{0}` has no workflows or activities registered
    NothingRegistered(String),
    /// Polling task queue `{task_queue}` failed and cannot recover: {source:?}
    FatalPollError {
        /// The queue being polled
        task_queue: String,
        /// The server's response
        source: tonic::Status,
    },
}

/// Request-scoped failures of the HTTP front-end. Each maps to an HTTP response; none of them
/// affect the serving process.
#[derive(thiserror::Error, Debug, displaydoc::Display)]
pub enum FrontendError {
    /// Unable to execute workflow: {0}
    StartFailed(ClientCallError),
    /// Unable to get workflow result: {0}
    ResultUnavailable(ClientCallError),
    /// Workflow did not complete successfully: {0}
    WorkflowUnsuccessful(String),
    /// Timed out after {0:?} waiting for the workflow result
    ResultTimedOut(Duration),
}
