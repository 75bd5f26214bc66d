//! The workflow client capability consumed by the HTTP front-end: start an execution, wait for
//! its result, and signal it.

use crate::{
    errors::ClientCallError,
    gateway::ServerGatewayApis,
    protos::{
        temporal::api::{
            common::v1::Payload,
            enums::v1::{HistoryEventFilterType, WorkflowIdReusePolicy},
            failure::v1::Failure,
            history::v1::history_event::Attributes,
        },
        IntoPayloadsExt,
    },
};
use std::sync::Arc;
use tonic::Code;

/// Options describing a workflow execution to start
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into))]
pub struct WorkflowStartOptions {
    /// The workflow id. Temporal allows at most one open run per id.
    pub workflow_id: String,
    /// Task queue the workflow's tasks are dispatched on
    pub task_queue: String,
    /// Set the policy for reusing the workflow id
    #[builder(default = "WorkflowIdReusePolicy::Unspecified")]
    pub id_reuse_policy: WorkflowIdReusePolicy,
}

/// Identifies one started workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowExecutionInfo {
    pub namespace: String,
    pub workflow_id: String,
    pub run_id: String,
}

/// Options for [WorkflowClientTrait::get_workflow_result]
#[derive(Debug, Clone, Copy)]
pub struct GetWorkflowResultOptions {
    /// If true (the default), follows to the next workflow run in the execution chain while
    /// retrieving results.
    pub follow_runs: bool,
}

impl Default for GetWorkflowResultOptions {
    fn default() -> Self {
        Self { follow_runs: true }
    }
}

/// Enumerates terminal states for a particular workflow execution
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowExecutionResult {
    /// The workflow finished successfully
    Succeeded(Vec<Payload>),
    /// The workflow finished in failure
    Failed(Failure),
    /// The workflow was cancelled
    Cancelled,
    /// The workflow was terminated
    Terminated,
    /// The workflow timed out
    TimedOut,
    /// The workflow continued as new and the chain was not followed
    ContinuedAsNew,
}

/// Starts, awaits, and signals workflow executions. Implementations must be safe to share between
/// concurrently served requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WorkflowClientTrait: Send + Sync {
    /// Starts workflow execution, returning as soon as the server accepted it
    async fn start_workflow(
        &self,
        options: WorkflowStartOptions,
        workflow_type: String,
        input: Vec<Payload>,
    ) -> Result<WorkflowExecutionInfo, ClientCallError>;

    /// Waits until the identified run (or, when following runs, the last run of its chain)
    /// reaches a terminal state
    async fn get_workflow_result(
        &self,
        info: WorkflowExecutionInfo,
        options: GetWorkflowResultOptions,
    ) -> Result<WorkflowExecutionResult, ClientCallError>;

    /// Send a signal to a workflow run
    async fn signal_workflow(
        &self,
        info: WorkflowExecutionInfo,
        signal_name: String,
        input: Vec<Payload>,
    ) -> Result<(), ClientCallError>;
}

/// [WorkflowClientTrait] implementation backed by a server gateway
#[derive(Clone)]
pub struct WorkflowClient {
    gateway: Arc<dyn ServerGatewayApis>,
    namespace: String,
}

impl WorkflowClient {
    pub fn new(gateway: Arc<dyn ServerGatewayApis>, namespace: impl Into<String>) -> Self {
        Self {
            gateway,
            namespace: namespace.into(),
        }
    }
}

#[async_trait::async_trait]
impl WorkflowClientTrait for WorkflowClient {
    async fn start_workflow(
        &self,
        options: WorkflowStartOptions,
        workflow_type: String,
        input: Vec<Payload>,
    ) -> Result<WorkflowExecutionInfo, ClientCallError> {
        let res = self
            .gateway
            .start_workflow(
                input,
                options.task_queue,
                options.workflow_id.clone(),
                workflow_type,
                options.id_reuse_policy,
            )
            .await
            .map_err(|status| match status.code() {
                Code::AlreadyExists => ClientCallError::AlreadyStarted {
                    workflow_id: options.workflow_id.clone(),
                },
                _ => status.into(),
            })?;
        if res.run_id.is_empty() {
            return Err(ClientCallError::MalformedResponse(
                "start response has no run id".to_string(),
            ));
        }
        Ok(WorkflowExecutionInfo {
            namespace: self.namespace.clone(),
            workflow_id: options.workflow_id,
            run_id: res.run_id,
        })
    }

    async fn get_workflow_result(
        &self,
        info: WorkflowExecutionInfo,
        options: GetWorkflowResultOptions,
    ) -> Result<WorkflowExecutionResult, ClientCallError> {
        let mut run_id = info.run_id;
        let mut next_page_tok = vec![];
        loop {
            let server_res = self
                .gateway
                .get_workflow_execution_history(
                    info.workflow_id.clone(),
                    Some(run_id.clone()),
                    next_page_tok.clone(),
                    HistoryEventFilterType::CloseEvent,
                )
                .await?;

            let mut history = server_res.history.ok_or_else(|| {
                ClientCallError::MalformedResponse("Server returned an empty history!".to_string())
            })?;

            // Long poll expired before the run closed
            if history.events.is_empty() {
                next_page_tok = server_res.next_page_token;
                continue;
            }

            let event_attrs = history.events.pop().and_then(|ev| ev.attributes);

            let next_run = |new_run_id: String| -> Option<String> {
                (options.follow_runs && !new_run_id.is_empty()).then_some(new_run_id)
            };

            let res = match event_attrs {
                Some(Attributes::WorkflowExecutionCompletedEventAttributes(attrs)) => {
                    match next_run(attrs.new_execution_run_id) {
                        Some(r) => Err(r),
                        None => Ok(WorkflowExecutionResult::Succeeded(
                            attrs.result.map(|p| p.payloads).unwrap_or_default(),
                        )),
                    }
                }
                Some(Attributes::WorkflowExecutionFailedEventAttributes(attrs)) => {
                    match next_run(attrs.new_execution_run_id) {
                        Some(r) => Err(r),
                        None => Ok(WorkflowExecutionResult::Failed(
                            attrs.failure.unwrap_or_default(),
                        )),
                    }
                }
                Some(Attributes::WorkflowExecutionTimedOutEventAttributes(attrs)) => {
                    match next_run(attrs.new_execution_run_id) {
                        Some(r) => Err(r),
                        None => Ok(WorkflowExecutionResult::TimedOut),
                    }
                }
                Some(Attributes::WorkflowExecutionCanceledEventAttributes(_)) => {
                    Ok(WorkflowExecutionResult::Cancelled)
                }
                Some(Attributes::WorkflowExecutionTerminatedEventAttributes(_)) => {
                    Ok(WorkflowExecutionResult::Terminated)
                }
                Some(Attributes::WorkflowExecutionContinuedAsNewEventAttributes(attrs)) => {
                    match next_run(attrs.new_execution_run_id) {
                        Some(r) => Err(r),
                        None => Ok(WorkflowExecutionResult::ContinuedAsNew),
                    }
                }
                o => {
                    return Err(ClientCallError::MalformedResponse(format!(
                        "Server returned an event that didn't match the CloseEvent filter: {o:?}"
                    )))
                }
            };

            match res {
                Ok(r) => break Ok(r),
                Err(new_run_id) => {
                    debug!(workflow_id = %info.workflow_id, from = %run_id, to = %new_run_id,
                           "Following workflow run chain");
                    run_id = new_run_id;
                    next_page_tok = vec![];
                }
            }
        }
    }

    async fn signal_workflow(
        &self,
        info: WorkflowExecutionInfo,
        signal_name: String,
        input: Vec<Payload>,
    ) -> Result<(), ClientCallError> {
        self.gateway
            .signal_workflow_execution(
                info.workflow_id,
                info.run_id,
                signal_name,
                input.into_payloads(),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gateway::MockServerGatewayApis,
        protos::{
            temporal::api::{
                common::v1::Payloads,
                enums::v1::EventType,
                history::v1::{
                    History, HistoryEvent, WorkflowExecutionCanceledEventAttributes,
                    WorkflowExecutionCompletedEventAttributes,
                    WorkflowExecutionContinuedAsNewEventAttributes,
                    WorkflowExecutionFailedEventAttributes,
                    WorkflowExecutionTerminatedEventAttributes,
                },
                workflowservice::v1::{
                    GetWorkflowExecutionHistoryResponse, StartWorkflowExecutionResponse,
                },
            },
            wire::{history_event, history_page, Fields},
            AsJsonPayloadExt,
        },
    };
    use assert_matches::assert_matches;
    use mockall::{predicate::eq, Sequence};
    use prost::Message;
    use rstest::rstest;

    fn info() -> WorkflowExecutionInfo {
        WorkflowExecutionInfo {
            namespace: "default".to_string(),
            workflow_id: "Alice".to_string(),
            run_id: "run-1".to_string(),
        }
    }

    fn close_page(attrs: Attributes, event_type: EventType) -> GetWorkflowExecutionHistoryResponse {
        GetWorkflowExecutionHistoryResponse {
            history: Some(History {
                events: vec![HistoryEvent {
                    event_id: 5,
                    event_type: event_type as i32,
                    attributes: Some(attrs),
                }],
            }),
            ..Default::default()
        }
    }

    fn empty_page() -> GetWorkflowExecutionHistoryResponse {
        GetWorkflowExecutionHistoryResponse {
            history: Some(History::default()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_returns_run_handle() {
        let mut gw = MockServerGatewayApis::new();
        gw.expect_start_workflow()
            .withf(|input, tq, wid, wtype, policy| {
                input.len() == 1
                    && tq == "hello-world"
                    && wid == "Alice"
                    && wtype == "Workflow"
                    && *policy == WorkflowIdReusePolicy::Unspecified
            })
            .times(1)
            .returning(|_, _, _, _, _| {
                Ok(StartWorkflowExecutionResponse {
                    run_id: "run-1".to_string(),
                    started: true,
                })
            });
        let client = WorkflowClient::new(Arc::new(gw), "default");
        let opts = WorkflowStartOptionsBuilder::default()
            .workflow_id("Alice")
            .task_queue("hello-world")
            .build()
            .unwrap();
        let res = client
            .start_workflow(
                opts,
                "Workflow".to_string(),
                vec!["Alice".as_json_payload().unwrap()],
            )
            .await
            .unwrap();
        assert_eq!(res, info());
    }

    #[tokio::test]
    async fn start_conflict_is_already_started() {
        let mut gw = MockServerGatewayApis::new();
        gw.expect_start_workflow()
            .returning(|_, _, _, _, _| Err(tonic::Status::already_exists("running")));
        let client = WorkflowClient::new(Arc::new(gw), "default");
        let opts = WorkflowStartOptionsBuilder::default()
            .workflow_id("Alice")
            .task_queue("hello-world")
            .build()
            .unwrap();
        let err = client
            .start_workflow(opts, "Workflow".to_string(), vec![])
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ClientCallError::AlreadyStarted { workflow_id } if workflow_id == "Alice"
        );
    }

    #[tokio::test]
    async fn result_waits_through_empty_long_polls() {
        let mut gw = MockServerGatewayApis::new();
        let mut seq = Sequence::new();
        gw.expect_get_workflow_execution_history()
            .with(
                eq("Alice".to_string()),
                eq(Some("run-1".to_string())),
                eq(vec![]),
                eq(HistoryEventFilterType::CloseEvent),
            )
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(empty_page()));
        gw.expect_get_workflow_execution_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| {
                Ok(close_page(
                    Attributes::WorkflowExecutionCompletedEventAttributes(
                        WorkflowExecutionCompletedEventAttributes {
                            result: Some(Payloads {
                                payloads: vec!["Hello Alice!".as_json_payload().unwrap()],
                            }),
                            ..Default::default()
                        },
                    ),
                    EventType::WorkflowExecutionCompleted,
                ))
            });
        let client = WorkflowClient::new(Arc::new(gw), "default");
        let res = client
            .get_workflow_result(info(), Default::default())
            .await
            .unwrap();
        assert_matches!(
            res,
            WorkflowExecutionResult::Succeeded(p) if p[0].to_display_string() == "Hello Alice!"
        );
    }

    #[tokio::test]
    async fn result_follows_run_chain() {
        let mut gw = MockServerGatewayApis::new();
        gw.expect_get_workflow_execution_history()
            .with(
                eq("Alice".to_string()),
                eq(Some("run-1".to_string())),
                eq(vec![]),
                eq(HistoryEventFilterType::CloseEvent),
            )
            .times(1)
            .returning(|_, _, _, _| {
                Ok(close_page(
                    Attributes::WorkflowExecutionFailedEventAttributes(
                        WorkflowExecutionFailedEventAttributes {
                            new_execution_run_id: "run-2".to_string(),
                            ..Default::default()
                        },
                    ),
                    EventType::WorkflowExecutionFailed,
                ))
            });
        gw.expect_get_workflow_execution_history()
            .with(
                eq("Alice".to_string()),
                eq(Some("run-2".to_string())),
                eq(vec![]),
                eq(HistoryEventFilterType::CloseEvent),
            )
            .times(1)
            .returning(|_, _, _, _| {
                Ok(close_page(
                    Attributes::WorkflowExecutionTerminatedEventAttributes(
                        WorkflowExecutionTerminatedEventAttributes::default(),
                    ),
                    EventType::WorkflowExecutionTerminated,
                ))
            });
        let client = WorkflowClient::new(Arc::new(gw), "default");
        let res = client
            .get_workflow_result(info(), Default::default())
            .await
            .unwrap();
        assert_eq!(res, WorkflowExecutionResult::Terminated);
    }

    #[tokio::test]
    async fn result_without_following_reports_failure() {
        let mut gw = MockServerGatewayApis::new();
        gw.expect_get_workflow_execution_history()
            .times(1)
            .returning(|_, _, _, _| {
                Ok(close_page(
                    Attributes::WorkflowExecutionFailedEventAttributes(
                        WorkflowExecutionFailedEventAttributes {
                            failure: Some(Failure::application_failure("nope".to_string(), false)),
                            new_execution_run_id: "run-2".to_string(),
                            ..Default::default()
                        },
                    ),
                    EventType::WorkflowExecutionFailed,
                ))
            });
        let client = WorkflowClient::new(Arc::new(gw), "default");
        let res = client
            .get_workflow_result(info(), GetWorkflowResultOptions { follow_runs: false })
            .await
            .unwrap();
        assert_matches!(res, WorkflowExecutionResult::Failed(f) if f.message == "nope");
    }

    #[rstest]
    #[case::cancelled(
        Attributes::WorkflowExecutionCanceledEventAttributes(
            WorkflowExecutionCanceledEventAttributes::default()
        ),
        EventType::WorkflowExecutionCanceled,
        WorkflowExecutionResult::Cancelled
    )]
    #[case::continued_as_new(
        Attributes::WorkflowExecutionContinuedAsNewEventAttributes(
            WorkflowExecutionContinuedAsNewEventAttributes {
                new_execution_run_id: "run-2".to_string(),
            }
        ),
        EventType::WorkflowExecutionContinuedAsNew,
        WorkflowExecutionResult::ContinuedAsNew
    )]
    #[tokio::test]
    async fn unfollowed_close_events_map_to_results(
        #[case] attrs: Attributes,
        #[case] event_type: EventType,
        #[case] expected: WorkflowExecutionResult,
    ) {
        let mut gw = MockServerGatewayApis::new();
        gw.expect_get_workflow_execution_history()
            .times(1)
            .return_once(move |_, _, _, _| Ok(close_page(attrs, event_type)));
        let client = WorkflowClient::new(Arc::new(gw), "default");
        let res = client
            .get_workflow_result(info(), GetWorkflowResultOptions { follow_runs: false })
            .await
            .unwrap();
        assert_eq!(res, expected);
    }

    #[rstest]
    #[case::terminated(
        27,
        EventType::WorkflowExecutionTerminated,
        WorkflowExecutionResult::Terminated
    )]
    #[case::cancelled(29, EventType::WorkflowExecutionCanceled, WorkflowExecutionResult::Cancelled)]
    #[tokio::test]
    async fn close_event_from_server_bytes_maps_to_result(
        #[case] attrs_tag: u32,
        #[case] event_type: EventType,
        #[case] expected: WorkflowExecutionResult,
    ) {
        let bytes = history_page(vec![history_event(
            9,
            event_type as i32,
            attrs_tag,
            Fields::default(),
        )]);
        let page = GetWorkflowExecutionHistoryResponse::decode(bytes.as_slice()).unwrap();
        let mut gw = MockServerGatewayApis::new();
        gw.expect_get_workflow_execution_history()
            .times(1)
            .return_once(move |_, _, _, _| Ok(page));
        let client = WorkflowClient::new(Arc::new(gw), "default");
        let res = client
            .get_workflow_result(info(), Default::default())
            .await
            .unwrap();
        assert_eq!(res, expected);
    }

    #[tokio::test]
    async fn result_missing_history_is_malformed() {
        let mut gw = MockServerGatewayApis::new();
        gw.expect_get_workflow_execution_history()
            .returning(|_, _, _, _| Ok(GetWorkflowExecutionHistoryResponse::default()));
        let client = WorkflowClient::new(Arc::new(gw), "default");
        let err = client
            .get_workflow_result(info(), Default::default())
            .await
            .unwrap_err();
        assert_matches!(err, ClientCallError::MalformedResponse(_));
    }

    #[tokio::test]
    async fn signal_passes_payloads() {
        let mut gw = MockServerGatewayApis::new();
        gw.expect_signal_workflow_execution()
            .withf(|wid, rid, name, payloads| {
                wid == "Alice"
                    && rid == "run-1"
                    && name == "poke"
                    && payloads.as_ref().map(|p| p.payloads.len()) == Some(1)
            })
            .times(1)
            .returning(|_, _, _, _| Ok(Default::default()));
        let client = WorkflowClient::new(Arc::new(gw), "default");
        client
            .signal_workflow(
                info(),
                "poke".to_string(),
                vec!["x".as_json_payload().unwrap()],
            )
            .await
            .unwrap();
    }
}
