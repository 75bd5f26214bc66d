use crate::{
    errors::ClientInitError,
    protos::{
        temporal::api::{
            command::v1::Command,
            common::v1::{Payload, Payloads, WorkflowExecution, WorkflowType},
            enums::v1::{
                HistoryEventFilterType, TaskQueueKind, WorkflowIdReusePolicy,
                WorkflowTaskFailedCause,
            },
            failure::v1::Failure,
            taskqueue::v1::TaskQueue,
            workflowservice::v1::*,
        },
        IntoPayloadsExt,
    },
    task_token::TaskToken,
};
use gethostname::gethostname;
use std::time::Duration;
use tonic::{
    client::Grpc,
    codec::ProstCodec,
    codegen::{http::uri::PathAndQuery, InterceptedService},
    metadata::MetadataValue,
    service::Interceptor,
    transport::{Channel, ClientTlsConfig},
    Code, Status,
};
use url::Url;
use uuid::Uuid;

type Result<T, E = tonic::Status> = std::result::Result<T, E>;

/// The server times out polls after 60 seconds. Set our timeout to be slightly beyond that.
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(70);
pub const OTHER_CALL_TIMEOUT: Duration = Duration::from_secs(30);
static CLIENT_NAME_HEADER_KEY: &str = "client-name";
static CLIENT_VERSION_HEADER_KEY: &str = "client-version";
static CLIENT_NAME: &str = "temporal-trigger";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for the connection to the temporal server
#[derive(Clone, Debug, derive_builder::Builder)]
#[builder(setter(into))]
pub struct ServerGatewayOptions {
    /// The URL of the Temporal server to connect to
    pub target_url: Url,

    /// What namespace will we operate under
    #[builder(default = "\"default\".to_string()")]
    pub namespace: String,

    /// A human-readable string that can identify this process
    #[builder(default = "default_identity()")]
    pub identity: String,

    /// Timeout for long polls (polling of task queues, waiting on workflow close)
    #[builder(default = "LONG_POLL_TIMEOUT")]
    pub long_poll_timeout: Duration,

    /// Timeout for connecting and for every call that is not a long poll
    #[builder(default = "OTHER_CALL_TIMEOUT")]
    pub call_timeout: Duration,
}

/// `<pid>@<hostname>`, the identity format every Temporal SDK reports by default
pub fn default_identity() -> String {
    format!(
        "{}@{}",
        std::process::id(),
        gethostname().to_string_lossy()
    )
}

impl ServerGatewayOptions {
    /// Attempt to establish a connection to the Temporal server. Fails if the endpoint can't be
    /// reached or does not answer `GetSystemInfo`. `https` targets are reached over TLS, trusting
    /// the platform's root certificates.
    pub async fn connect(&self) -> Result<ServerGateway, ClientInitError> {
        let mut endpoint =
            Channel::from_shared(self.target_url.to_string())?.connect_timeout(self.call_timeout);
        if self.target_url.scheme() == "https" {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
        }
        let channel = endpoint.connect().await?;
        let gateway = ServerGateway {
            service: Grpc::new(InterceptedService::new(channel, ServiceCallInterceptor)),
            opts: self.clone(),
        };
        match gateway.get_system_info().await {
            Ok(sysinfo) => {
                info!(server_version = %sysinfo.server_version, target = %self.target_url,
                      "Connected to Temporal server");
            }
            Err(status) if status.code() == Code::Unimplemented => {
                debug!("Server does not implement get_system_info");
            }
            Err(status) => return Err(ClientInitError::SystemInfoCallError(status)),
        }
        Ok(gateway)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceCallInterceptor;

impl Interceptor for ServiceCallInterceptor {
    /// Called on each outbound request. Returning a `Status` here cancels the request and hands
    /// that status to the caller.
    fn call(&mut self, mut request: tonic::Request<()>) -> Result<tonic::Request<()>, Status> {
        let metadata = request.metadata_mut();
        if !metadata.contains_key(CLIENT_NAME_HEADER_KEY) {
            metadata.insert(
                CLIENT_NAME_HEADER_KEY,
                MetadataValue::from_static(CLIENT_NAME),
            );
        }
        if !metadata.contains_key(CLIENT_VERSION_HEADER_KEY) {
            metadata.insert(
                CLIENT_VERSION_HEADER_KEY,
                MetadataValue::from_static(VERSION),
            );
        }
        Ok(request)
    }
}

/// Contains an instance of a client for interacting with the temporal server
#[derive(Clone, Debug)]
pub struct ServerGateway {
    service: Grpc<InterceptedService<Channel, ServiceCallInterceptor>>,
    /// Options gateway was initialized with
    pub opts: ServerGatewayOptions,
}

impl ServerGateway {
    async fn get_system_info(&self) -> Result<GetSystemInfoResponse> {
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/GetSystemInfo",
            GetSystemInfoRequest {},
            self.opts.call_timeout,
        )
        .await
    }

    async fn unary<Req, Resp>(
        &self,
        path: &'static str,
        request: Req,
        timeout: Duration,
    ) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut service = self.service.clone();
        service
            .ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {e}")))?;
        let mut request = tonic::Request::new(request);
        request.set_timeout(timeout);
        service
            .unary(
                request,
                PathAndQuery::from_static(path),
                ProstCodec::<Req, Resp>::default(),
            )
            .await
            .map(tonic::Response::into_inner)
    }

    fn task_queue(&self, name: String) -> Option<TaskQueue> {
        Some(TaskQueue {
            name,
            kind: TaskQueueKind::Normal as i32,
            normal_name: String::new(),
        })
    }
}

/// This trait provides ways to call the temporal server
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ServerGatewayApis: Send + Sync {
    /// Starts workflow execution.
    async fn start_workflow(
        &self,
        input: Vec<Payload>,
        task_queue: String,
        workflow_id: String,
        workflow_type: String,
        id_reuse_policy: WorkflowIdReusePolicy,
    ) -> Result<StartWorkflowExecutionResponse>;

    /// Get a page of history for a particular workflow run. With
    /// [HistoryEventFilterType::CloseEvent] the call long-polls until the run closes (or the
    /// server's poll interval expires, in which case the page is empty).
    async fn get_workflow_execution_history(
        &self,
        workflow_id: String,
        run_id: Option<String>,
        page_token: Vec<u8>,
        filter: HistoryEventFilterType,
    ) -> Result<GetWorkflowExecutionHistoryResponse>;

    /// Send a signal to a certain workflow instance
    async fn signal_workflow_execution(
        &self,
        workflow_id: String,
        run_id: String,
        signal_name: String,
        payloads: Option<Payloads>,
    ) -> Result<SignalWorkflowExecutionResponse>;

    /// Fetch new workflow tasks from the provided queue. Returns a response with an empty task
    /// token if the poll timed out without work.
    async fn poll_workflow_task(&self, task_queue: String)
        -> Result<PollWorkflowTaskQueueResponse>;

    /// Complete a workflow task with the commands it produced
    async fn complete_workflow_task(
        &self,
        task_token: TaskToken,
        commands: Vec<Command>,
    ) -> Result<RespondWorkflowTaskCompletedResponse>;

    /// Fail a workflow task. The server will schedule it again.
    async fn fail_workflow_task(
        &self,
        task_token: TaskToken,
        cause: WorkflowTaskFailedCause,
        failure: Option<Failure>,
    ) -> Result<RespondWorkflowTaskFailedResponse>;

    /// Fetch new activity tasks from the provided queue. Returns a response with an empty task
    /// token if the poll timed out without work.
    async fn poll_activity_task(&self, task_queue: String)
        -> Result<PollActivityTaskQueueResponse>;

    /// Complete activity task by sending response to the server. `task_token` contains activity
    /// identifier that would've been received from [ServerGatewayApis::poll_activity_task].
    async fn complete_activity_task(
        &self,
        task_token: TaskToken,
        result: Option<Payloads>,
    ) -> Result<RespondActivityTaskCompletedResponse>;

    /// Fail activity task by sending the failure to the server
    async fn fail_activity_task(
        &self,
        task_token: TaskToken,
        failure: Option<Failure>,
    ) -> Result<RespondActivityTaskFailedResponse>;
}

#[async_trait::async_trait]
impl ServerGatewayApis for ServerGateway {
    async fn start_workflow(
        &self,
        input: Vec<Payload>,
        task_queue: String,
        workflow_id: String,
        workflow_type: String,
        id_reuse_policy: WorkflowIdReusePolicy,
    ) -> Result<StartWorkflowExecutionResponse> {
        let request_id = Uuid::new_v4().to_string();

        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/StartWorkflowExecution",
            StartWorkflowExecutionRequest {
                namespace: self.opts.namespace.clone(),
                input: input.into_payloads(),
                workflow_id,
                workflow_type: Some(WorkflowType {
                    name: workflow_type,
                }),
                task_queue: self.task_queue(task_queue),
                identity: self.opts.identity.clone(),
                request_id,
                workflow_id_reuse_policy: id_reuse_policy as i32,
                ..Default::default()
            },
            self.opts.call_timeout,
        )
        .await
    }

    async fn get_workflow_execution_history(
        &self,
        workflow_id: String,
        run_id: Option<String>,
        page_token: Vec<u8>,
        filter: HistoryEventFilterType,
    ) -> Result<GetWorkflowExecutionHistoryResponse> {
        let wait_for_close = filter == HistoryEventFilterType::CloseEvent;
        let timeout = if wait_for_close {
            self.opts.long_poll_timeout
        } else {
            self.opts.call_timeout
        };
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/GetWorkflowExecutionHistory",
            GetWorkflowExecutionHistoryRequest {
                namespace: self.opts.namespace.clone(),
                execution: Some(WorkflowExecution {
                    workflow_id,
                    run_id: run_id.unwrap_or_default(),
                }),
                next_page_token: page_token,
                wait_new_event: wait_for_close,
                history_event_filter_type: filter as i32,
                skip_archival: true,
                ..Default::default()
            },
            timeout,
        )
        .await
    }

    async fn signal_workflow_execution(
        &self,
        workflow_id: String,
        run_id: String,
        signal_name: String,
        payloads: Option<Payloads>,
    ) -> Result<SignalWorkflowExecutionResponse> {
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/SignalWorkflowExecution",
            SignalWorkflowExecutionRequest {
                namespace: self.opts.namespace.clone(),
                workflow_execution: Some(WorkflowExecution {
                    workflow_id,
                    run_id,
                }),
                signal_name,
                input: payloads,
                identity: self.opts.identity.clone(),
                request_id: Uuid::new_v4().to_string(),
            },
            self.opts.call_timeout,
        )
        .await
    }

    async fn poll_workflow_task(
        &self,
        task_queue: String,
    ) -> Result<PollWorkflowTaskQueueResponse> {
        let request = PollWorkflowTaskQueueRequest {
            namespace: self.opts.namespace.clone(),
            task_queue: self.task_queue(task_queue),
            identity: self.opts.identity.clone(),
        };
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/PollWorkflowTaskQueue",
            request,
            self.opts.long_poll_timeout,
        )
        .await
    }

    async fn complete_workflow_task(
        &self,
        task_token: TaskToken,
        commands: Vec<Command>,
    ) -> Result<RespondWorkflowTaskCompletedResponse> {
        let request = RespondWorkflowTaskCompletedRequest {
            task_token: task_token.into(),
            commands,
            identity: self.opts.identity.clone(),
            namespace: self.opts.namespace.clone(),
        };
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/RespondWorkflowTaskCompleted",
            request,
            self.opts.call_timeout,
        )
        .await
    }

    async fn fail_workflow_task(
        &self,
        task_token: TaskToken,
        cause: WorkflowTaskFailedCause,
        failure: Option<Failure>,
    ) -> Result<RespondWorkflowTaskFailedResponse> {
        let request = RespondWorkflowTaskFailedRequest {
            task_token: task_token.into(),
            cause: cause as i32,
            failure,
            identity: self.opts.identity.clone(),
            namespace: self.opts.namespace.clone(),
        };
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/RespondWorkflowTaskFailed",
            request,
            self.opts.call_timeout,
        )
        .await
    }

    async fn poll_activity_task(
        &self,
        task_queue: String,
    ) -> Result<PollActivityTaskQueueResponse> {
        let request = PollActivityTaskQueueRequest {
            namespace: self.opts.namespace.clone(),
            task_queue: self.task_queue(task_queue),
            identity: self.opts.identity.clone(),
        };
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/PollActivityTaskQueue",
            request,
            self.opts.long_poll_timeout,
        )
        .await
    }

    async fn complete_activity_task(
        &self,
        task_token: TaskToken,
        result: Option<Payloads>,
    ) -> Result<RespondActivityTaskCompletedResponse> {
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/RespondActivityTaskCompleted",
            RespondActivityTaskCompletedRequest {
                task_token: task_token.into(),
                result,
                identity: self.opts.identity.clone(),
                namespace: self.opts.namespace.clone(),
            },
            self.opts.call_timeout,
        )
        .await
    }

    async fn fail_activity_task(
        &self,
        task_token: TaskToken,
        failure: Option<Failure>,
    ) -> Result<RespondActivityTaskFailedResponse> {
        self.unary(
            "/temporal.api.workflowservice.v1.WorkflowService/RespondActivityTaskFailed",
            RespondActivityTaskFailedRequest {
                task_token: task_token.into(),
                failure,
                identity: self.opts.identity.clone(),
                namespace: self.opts.namespace.clone(),
            },
            self.opts.call_timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builder_fills_defaults() {
        let opts = ServerGatewayOptionsBuilder::default()
            .target_url(Url::parse("http://localhost:7233").unwrap())
            .build()
            .unwrap();
        assert_eq!(opts.namespace, "default");
        assert_eq!(opts.long_poll_timeout, LONG_POLL_TIMEOUT);
        assert_eq!(opts.call_timeout, OTHER_CALL_TIMEOUT);
        assert!(opts.identity.contains('@'));
    }

    #[test]
    fn options_builder_requires_target() {
        assert!(ServerGatewayOptionsBuilder::default().build().is_err());
    }

    #[test]
    fn interceptor_sets_client_headers() {
        let req = ServiceCallInterceptor.call(tonic::Request::new(())).unwrap();
        assert_eq!(
            req.metadata().get(CLIENT_NAME_HEADER_KEY).unwrap(),
            "temporal-trigger"
        );
        assert_eq!(
            req.metadata().get(CLIENT_VERSION_HEADER_KEY).unwrap(),
            VERSION
        );
    }
}
