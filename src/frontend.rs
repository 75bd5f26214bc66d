//! HTTP endpoints that start hello-world workflows and report on them.
//!
//! * `/ping` answers `pong`.
//! * `/sync?name=X` starts workflow id `X` and responds with its result once it finishes.
//! * `/async?name=X` starts workflow id `X` and responds right away with its run id.

use crate::{
    client::{
        GetWorkflowResultOptions, WorkflowClientTrait, WorkflowExecutionInfo,
        WorkflowExecutionResult, WorkflowStartOptions,
    },
    errors::{ClientCallError, FrontendError},
    hello_world::WORKFLOW_TYPE,
    protos::{temporal::api::enums::v1::WorkflowIdReusePolicy, AsJsonPayloadExt},
};
use http_body_util::Full;
use hyper::{
    body::Bytes,
    header::{HeaderValue, CONTENT_TYPE},
    service::service_fn,
    Method, Request, Response, StatusCode, Uri,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use std::{
    convert::Infallible,
    net::{SocketAddr, TcpListener},
    sync::Arc,
    time::Duration,
};
use tokio::io;
use tokio_util::sync::CancellationToken;
use url::form_urlencoded;

/// Workflow id used when the request names none
pub const DEFAULT_NAME: &str = "Guest";
pub const DEFAULT_TASK_QUEUE: &str = "hello-world";

/// Options for the HTTP front-end
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into))]
pub struct FrontendOptions {
    /// Address the listener binds
    #[builder(default = "SocketAddr::from(([0, 0, 0, 0], 8080))")]
    pub listen_addr: SocketAddr,
    /// Task queue the started workflows are dispatched on
    #[builder(default = "DEFAULT_TASK_QUEUE.to_string()")]
    pub task_queue: String,
    /// Workflow type the endpoints start
    #[builder(default = "WORKFLOW_TYPE.to_string()")]
    pub workflow_type: String,
    /// How long `/sync` waits for a result before giving up. `None` waits until the run closes.
    #[builder(default)]
    pub sync_timeout: Option<Duration>,
    /// Sent with every start request
    #[builder(default = "WorkflowIdReusePolicy::Unspecified")]
    pub id_reuse_policy: WorkflowIdReusePolicy,
}

#[derive(Clone)]
struct FrontendState {
    client: Arc<dyn WorkflowClientTrait>,
    opts: Arc<FrontendOptions>,
}

/// The HTTP listener, bound but not yet serving
pub struct HttpFrontend {
    listener: TcpListener,
    state: FrontendState,
}

impl HttpFrontend {
    /// Binds the configured address. Serving starts with [HttpFrontend::run].
    pub fn bind(
        opts: FrontendOptions,
        client: Arc<dyn WorkflowClientTrait>,
    ) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(opts.listen_addr)?;
        Ok(Self {
            listener,
            state: FrontendState {
                client,
                opts: Arc::new(opts),
            },
        })
    }

    pub fn bound_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and serves connections until `shutdown` is cancelled. Each connection is served on
    /// its own task.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), anyhow::Error> {
        self.listener.set_nonblocking(true)?;
        let listener = tokio::net::TcpListener::from_std(self.listener)?;
        info!(addr = %listener.local_addr()?, "HTTP front-end listening");
        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok(a) => a,
                    Err(e) => {
                        warn!(error = ?e, "Failed to accept connection");
                        continue;
                    }
                },
            };
            let io = TokioIo::new(stream);
            let state = self.state.clone();
            tokio::task::spawn(async move {
                let server = auto::Builder::new(TokioExecutor::new());
                if let Err(e) = server
                    .serve_connection(io, service_fn(move |req| serve_req(req, state.clone())))
                    .await
                {
                    debug!(%peer, "Error serving connection: {:?}", e);
                }
            });
        }
        info!("HTTP front-end stopped");
        Ok(())
    }
}

async fn serve_req(
    req: Request<hyper::body::Incoming>,
    state: FrontendState,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (status, body) = route(&state, req.method(), req.uri()).await;
    let mut resp = Response::new(Full::from(body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    Ok(resp)
}

async fn route(state: &FrontendState, method: &Method, uri: &Uri) -> (StatusCode, String) {
    match uri.path() {
        "/ping" => (StatusCode::OK, "pong".to_string()),
        "/sync" | "/async" if !matches!(*method, Method::GET | Method::POST) => (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        ),
        "/sync" => match start_sync(state, name_param(uri)).await {
            Ok(result) => (StatusCode::OK, result),
            Err(e) => {
                error!(error = %e, "Synchronous workflow request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        },
        "/async" => match start(state, name_param(uri)).await {
            Ok(info) => (
                StatusCode::ACCEPTED,
                format!(
                    "Started workflow ID={}, RunID={}",
                    info.workflow_id, info.run_id
                ),
            ),
            Err(e) => {
                error!(error = %e, "Asynchronous workflow request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        },
        _ => (StatusCode::NOT_FOUND, "Not found".to_string()),
    }
}

/// The first `name` query parameter, or [DEFAULT_NAME] when it is absent or empty
fn name_param(uri: &Uri) -> String {
    uri.query()
        .and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(k, _)| k == "name")
                .map(|(_, v)| v.into_owned())
        })
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

async fn start(
    state: &FrontendState,
    name: String,
) -> Result<WorkflowExecutionInfo, FrontendError> {
    info!(%name, "Starting workflow");
    let input = name.as_json_payload().map_err(|e| {
        FrontendError::StartFailed(ClientCallError::InputEncoding(e.to_string()))
    })?;
    let options = WorkflowStartOptions {
        workflow_id: name,
        task_queue: state.opts.task_queue.clone(),
        id_reuse_policy: state.opts.id_reuse_policy,
    };
    let info = state
        .client
        .start_workflow(options, state.opts.workflow_type.clone(), vec![input])
        .await
        .map_err(FrontendError::StartFailed)?;
    info!(workflow_id = %info.workflow_id, run_id = %info.run_id, "Started workflow");
    Ok(info)
}

async fn start_sync(state: &FrontendState, name: String) -> Result<String, FrontendError> {
    let info = start(state, name).await?;
    let wait = state
        .client
        .get_workflow_result(info, GetWorkflowResultOptions::default());
    let res = match state.opts.sync_timeout {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| FrontendError::ResultTimedOut(limit))?,
        None => wait.await,
    }
    .map_err(FrontendError::ResultUnavailable)?;

    match res {
        WorkflowExecutionResult::Succeeded(payloads) => {
            let out = payloads
                .first()
                .map(|p| p.to_display_string())
                .unwrap_or_default();
            info!(result = %out, "Workflow completed");
            Ok(out)
        }
        WorkflowExecutionResult::Failed(f) => {
            Err(FrontendError::WorkflowUnsuccessful(f.chain_message()))
        }
        other => Err(FrontendError::WorkflowUnsuccessful(format!(
            "workflow ended as {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::MockWorkflowClientTrait,
        protos::temporal::api::{common::v1::Payload, failure::v1::Failure},
    };
    use rstest::rstest;

    fn state(
        client: impl WorkflowClientTrait + 'static,
        sync_timeout: Option<Duration>,
    ) -> FrontendState {
        FrontendState {
            client: Arc::new(client),
            opts: Arc::new(
                FrontendOptionsBuilder::default()
                    .sync_timeout(sync_timeout)
                    .build()
                    .unwrap(),
            ),
        }
    }

    fn info_for(workflow_id: &str) -> WorkflowExecutionInfo {
        WorkflowExecutionInfo {
            namespace: "default".to_string(),
            workflow_id: workflow_id.to_string(),
            run_id: format!("{workflow_id}-run"),
        }
    }

    fn starts(client: &mut MockWorkflowClientTrait, expected_id: &'static str) {
        client
            .expect_start_workflow()
            .withf(move |opts, wf_type, input| {
                opts.workflow_id == expected_id
                    && opts.task_queue == DEFAULT_TASK_QUEUE
                    && wf_type == WORKFLOW_TYPE
                    && input.len() == 1
                    && input[0].to_display_string() == expected_id
            })
            .times(1)
            .returning(|opts, _, _| Ok(info_for(&opts.workflow_id)));
    }

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[rstest]
    #[case::get(Method::GET)]
    #[case::post(Method::POST)]
    #[case::delete(Method::DELETE)]
    #[tokio::test]
    async fn ping_answers_pong(#[case] method: Method) {
        let st = state(MockWorkflowClientTrait::new(), None);
        assert_eq!(
            route(&st, &method, &uri("/ping")).await,
            (StatusCode::OK, "pong".to_string())
        );
    }

    #[rstest]
    #[case::unknown_path(Method::GET, "/nope", StatusCode::NOT_FOUND)]
    #[case::root(Method::GET, "/", StatusCode::NOT_FOUND)]
    #[case::put_sync(Method::PUT, "/sync", StatusCode::METHOD_NOT_ALLOWED)]
    #[case::delete_async(Method::DELETE, "/async?name=x", StatusCode::METHOD_NOT_ALLOWED)]
    #[tokio::test]
    async fn rejected_requests_start_nothing(
        #[case] method: Method,
        #[case] path: &str,
        #[case] status: StatusCode,
    ) {
        let st = state(MockWorkflowClientTrait::new(), None);
        assert_eq!(route(&st, &method, &uri(path)).await.0, status);
    }

    #[rstest]
    #[case::named("/sync?name=Alice", "Alice")]
    #[case::absent("/sync", "Guest")]
    #[case::empty("/sync?name=", "Guest")]
    #[case::encoded("/sync?name=Ana%20Mar%C3%ADa", "Ana María")]
    #[case::first_wins("/sync?name=Bob&name=Carol", "Bob")]
    #[tokio::test]
    async fn sync_returns_workflow_result(#[case] path: &str, #[case] expected_id: &'static str) {
        let mut client = MockWorkflowClientTrait::new();
        starts(&mut client, expected_id);
        client
            .expect_get_workflow_result()
            .withf(move |info, opts| info.workflow_id == expected_id && opts.follow_runs)
            .times(1)
            .returning(|info, _| {
                Ok(WorkflowExecutionResult::Succeeded(vec![format!(
                    "Hello {}!",
                    info.workflow_id
                )
                .as_json_payload()
                .unwrap()]))
            });
        let st = state(client, None);
        assert_eq!(
            route(&st, &Method::GET, &uri(path)).await,
            (StatusCode::OK, format!("Hello {expected_id}!"))
        );
    }

    #[tokio::test]
    async fn sync_non_json_result_is_raw() {
        let mut client = MockWorkflowClientTrait::new();
        starts(&mut client, "Alice");
        client.expect_get_workflow_result().returning(|_, _| {
            Ok(WorkflowExecutionResult::Succeeded(vec![Payload {
                data: b"plain bytes".to_vec(),
                ..Default::default()
            }]))
        });
        let st = state(client, None);
        assert_eq!(
            route(&st, &Method::POST, &uri("/sync?name=Alice")).await,
            (StatusCode::OK, "plain bytes".to_string())
        );
    }

    #[rstest]
    #[case::sync("/sync?name=Alice")]
    #[case::async_("/async?name=Alice")]
    #[tokio::test]
    async fn start_failure_is_500(#[case] path: &str) {
        let mut client = MockWorkflowClientTrait::new();
        client.expect_start_workflow().times(1).returning(|opts, _, _| {
            Err(ClientCallError::AlreadyStarted {
                workflow_id: opts.workflow_id,
            })
        });
        let st = state(client, None);
        let (status, body) = route(&st, &Method::GET, &uri(path)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Unable to execute workflow"), "{body}");
        assert!(body.contains("Alice"), "{body}");
    }

    #[rstest]
    #[case::failed(
        WorkflowExecutionResult::Failed(Failure::application_failure("kaput".to_string(), false)),
        "kaput"
    )]
    #[case::terminated(WorkflowExecutionResult::Terminated, "Terminated")]
    #[case::timed_out(WorkflowExecutionResult::TimedOut, "TimedOut")]
    #[tokio::test]
    async fn unsuccessful_workflow_is_500(
        #[case] result: WorkflowExecutionResult,
        #[case] in_body: &str,
    ) {
        let mut client = MockWorkflowClientTrait::new();
        starts(&mut client, "Alice");
        client
            .expect_get_workflow_result()
            .return_once(move |_, _| Ok(result));
        let st = state(client, None);
        let (status, body) = route(&st, &Method::GET, &uri("/sync?name=Alice")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains(in_body), "{body}");
    }

    #[tokio::test]
    async fn result_retrieval_failure_is_500() {
        let mut client = MockWorkflowClientTrait::new();
        starts(&mut client, "Alice");
        client
            .expect_get_workflow_result()
            .returning(|_, _| Err(tonic::Status::unavailable("server gone").into()));
        let st = state(client, None);
        let (status, body) = route(&st, &Method::GET, &uri("/sync?name=Alice")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Unable to get workflow result"), "{body}");
    }

    /// Starts fine but its runs never finish
    struct NeverFinishes;

    #[async_trait::async_trait]
    impl WorkflowClientTrait for NeverFinishes {
        async fn start_workflow(
            &self,
            options: WorkflowStartOptions,
            _: String,
            _: Vec<Payload>,
        ) -> Result<WorkflowExecutionInfo, ClientCallError> {
            Ok(info_for(&options.workflow_id))
        }

        async fn get_workflow_result(
            &self,
            _: WorkflowExecutionInfo,
            _: GetWorkflowResultOptions,
        ) -> Result<WorkflowExecutionResult, ClientCallError> {
            futures::future::pending().await
        }

        async fn signal_workflow(
            &self,
            _: WorkflowExecutionInfo,
            _: String,
            _: Vec<Payload>,
        ) -> Result<(), ClientCallError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sync_timeout_is_500() {
        let st = state(NeverFinishes, Some(Duration::from_secs(5)));
        let (status, body) = route(&st, &Method::GET, &uri("/sync?name=Alice")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Timed out after 5s"), "{body}");
    }

    #[tokio::test]
    async fn async_returns_handle_without_waiting() {
        let mut client = MockWorkflowClientTrait::new();
        starts(&mut client, "Alice");
        client.expect_get_workflow_result().never();
        let st = state(client, None);
        assert_eq!(
            route(&st, &Method::GET, &uri("/async?name=Alice")).await,
            (
                StatusCode::ACCEPTED,
                "Started workflow ID=Alice, RunID=Alice-run".to_string()
            )
        );
    }
}
