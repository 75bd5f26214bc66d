//! Process configuration: command line flags, each falling back to an environment variable.

use crate::{
    errors::ConfigError,
    frontend::{FrontendOptions, FrontendOptionsBuilder, DEFAULT_TASK_QUEUE},
    gateway::{ServerGatewayOptions, ServerGatewayOptionsBuilder},
    protos::temporal::api::enums::v1::WorkflowIdReusePolicy,
    worker::{WorkerConfig, WorkerConfigBuilder},
};
use std::{net::SocketAddr, time::Duration};
use url::Url;

pub const ENDPOINT_ENV_VAR: &str = "TEMPORAL_GRPC_ENDPOINT";

#[derive(Debug, Clone, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Temporal frontend gRPC endpoint, as `host:port` or a full `http(s)://` URL
    #[arg(long, env = ENDPOINT_ENV_VAR)]
    pub endpoint: Option<String>,

    /// Namespace workflows are started in and polled from
    #[arg(long, env = "TEMPORAL_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Address the HTTP front-end listens on
    #[arg(long = "listen", env = "HTTP_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Task queue the hello world workflow and activity run on
    #[arg(long, env = "TEMPORAL_TASK_QUEUE", default_value = DEFAULT_TASK_QUEUE)]
    pub task_queue: String,

    /// Longest time `/sync` waits for a workflow result. Waits indefinitely if unset.
    #[arg(long, env = "SYNC_TIMEOUT_SECS")]
    pub sync_timeout_secs: Option<u64>,

    /// Workflow id reuse policy sent when starting workflows. The server default applies if unset.
    #[arg(long, env = "WORKFLOW_ID_REUSE_POLICY", value_parser = parse_id_reuse_policy)]
    pub id_reuse_policy: Option<WorkflowIdReusePolicy>,
}

impl Cli {
    pub fn gateway_options(&self) -> Result<ServerGatewayOptions, ConfigError> {
        ServerGatewayOptionsBuilder::default()
            .target_url(endpoint_url(self.endpoint.as_deref())?)
            .namespace(self.namespace.clone())
            .build()
            .map_err(|e| ConfigError::IncompleteOptions(e.to_string()))
    }

    pub fn frontend_options(&self) -> Result<FrontendOptions, ConfigError> {
        FrontendOptionsBuilder::default()
            .listen_addr(self.listen_addr)
            .task_queue(self.task_queue.clone())
            .sync_timeout(self.sync_timeout_secs.map(Duration::from_secs))
            .id_reuse_policy(
                self.id_reuse_policy
                    .unwrap_or(WorkflowIdReusePolicy::Unspecified),
            )
            .build()
            .map_err(|e| ConfigError::IncompleteOptions(e.to_string()))
    }

    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        WorkerConfigBuilder::default()
            .task_queue(self.task_queue.clone())
            .build()
            .map_err(|e| ConfigError::IncompleteOptions(e.to_string()))
    }
}

/// Turns the configured endpoint into the URL the gRPC channel connects to. A bare `host:port`
/// is reached over plain http.
pub fn endpoint_url(endpoint: Option<&str>) -> Result<Url, ConfigError> {
    let raw = endpoint
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(ConfigError::MissingEndpoint)?;
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason,
    };
    let url = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("http://{raw}"))
    }
    .map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("no host".to_string()));
    }
    Ok(url)
}

fn parse_id_reuse_policy(s: &str) -> Result<WorkflowIdReusePolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "allow-duplicate" => Ok(WorkflowIdReusePolicy::AllowDuplicate),
        "allow-duplicate-failed-only" => Ok(WorkflowIdReusePolicy::AllowDuplicateFailedOnly),
        "reject-duplicate" => Ok(WorkflowIdReusePolicy::RejectDuplicate),
        "terminate-if-running" => Ok(WorkflowIdReusePolicy::TerminateIfRunning),
        _ => Err(ConfigError::UnknownIdReusePolicy(s.to_string())),
    }
}
