//! In-memory stand-ins for the Temporal server, for exercising the HTTP front-end without one.

use parking_lot::Mutex;
use std::collections::HashMap;
use temporal_trigger::{
    errors::ClientCallError,
    protos::{
        temporal::api::{common::v1::Payload, failure::v1::Failure},
        AsJsonPayloadExt, FromJsonPayloadExt,
    },
    GetWorkflowResultOptions, WorkflowClientTrait, WorkflowExecutionInfo,
    WorkflowExecutionResult, WorkflowStartOptions,
};
use tokio::sync::watch;

pub const NAMESPACE: &str = "default";

type Outcome = dyn Fn(&str, &[Payload]) -> WorkflowExecutionResult + Send + Sync;

/// A workflow start the fake accepted
#[derive(Debug, Clone)]
pub struct StartedWorkflow {
    pub options: WorkflowStartOptions,
    pub workflow_type: String,
    pub input: Vec<Payload>,
    pub run_id: String,
}

struct Run {
    workflow_id: String,
    workflow_type: String,
    input: Vec<Payload>,
    result: watch::Sender<Option<WorkflowExecutionResult>>,
}

#[derive(Default)]
struct FakeState {
    started: Vec<StartedWorkflow>,
    runs: HashMap<String, Run>,
    start_error: Option<String>,
}

/// [WorkflowClientTrait] that runs workflows in memory. By default every run finishes as soon as
/// it starts with the result the hello world workflow would produce. [FakeWorkflowClient::holding]
/// keeps runs open until [FakeWorkflowClient::finish] is called, so id conflicts can be observed.
pub struct FakeWorkflowClient {
    state: Mutex<FakeState>,
    outcome: Box<Outcome>,
    hold_runs: bool,
}

impl Default for FakeWorkflowClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeWorkflowClient {
    pub fn new() -> Self {
        Self::with_outcome(greet)
    }

    /// Every run ends with whatever `outcome` returns for its workflow type and input
    pub fn with_outcome(
        outcome: impl Fn(&str, &[Payload]) -> WorkflowExecutionResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            outcome: Box::new(outcome),
            hold_runs: false,
        }
    }

    /// Runs stay open until finished explicitly
    pub fn holding(mut self) -> Self {
        self.hold_runs = true;
        self
    }

    /// All starts fail with an `unavailable` status carrying `message`
    pub fn failing_starts(self, message: impl Into<String>) -> Self {
        self.state.lock().start_error = Some(message.into());
        self
    }

    pub fn started(&self) -> Vec<StartedWorkflow> {
        self.state.lock().started.clone()
    }

    /// Closes every open run of `workflow_id`, returning how many there were
    pub fn finish(&self, workflow_id: &str) -> usize {
        let state = self.state.lock();
        let mut finished = 0;
        for run in state.runs.values() {
            if run.workflow_id == workflow_id && run.result.borrow().is_none() {
                let res = (self.outcome)(&run.workflow_type, &run.input);
                run.result.send_replace(Some(res));
                finished += 1;
            }
        }
        finished
    }
}

/// What the hello world workflow returns: `"Hello <name>!"`
pub fn greet(_workflow_type: &str, input: &[Payload]) -> WorkflowExecutionResult {
    let name = input
        .first()
        .and_then(|p| String::from_json_payload(p).ok())
        .unwrap_or_default();
    match format!("Hello {name}!").as_json_payload() {
        Ok(p) => WorkflowExecutionResult::Succeeded(vec![p]),
        Err(e) => {
            WorkflowExecutionResult::Failed(Failure::application_failure(e.to_string(), true))
        }
    }
}

#[async_trait::async_trait]
impl WorkflowClientTrait for FakeWorkflowClient {
    async fn start_workflow(
        &self,
        options: WorkflowStartOptions,
        workflow_type: String,
        input: Vec<Payload>,
    ) -> Result<WorkflowExecutionInfo, ClientCallError> {
        let mut state = self.state.lock();
        if let Some(msg) = &state.start_error {
            return Err(tonic::Status::unavailable(msg.clone()).into());
        }
        let already_open = state
            .runs
            .values()
            .any(|r| r.workflow_id == options.workflow_id && r.result.borrow().is_none());
        if already_open {
            return Err(ClientCallError::AlreadyStarted {
                workflow_id: options.workflow_id,
            });
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        let result = if self.hold_runs {
            None
        } else {
            Some((self.outcome)(&workflow_type, &input))
        };
        state.runs.insert(
            run_id.clone(),
            Run {
                workflow_id: options.workflow_id.clone(),
                workflow_type: workflow_type.clone(),
                input: input.clone(),
                result: watch::channel(result).0,
            },
        );
        let info = WorkflowExecutionInfo {
            namespace: NAMESPACE.to_string(),
            workflow_id: options.workflow_id.clone(),
            run_id: run_id.clone(),
        };
        state.started.push(StartedWorkflow {
            options,
            workflow_type,
            input,
            run_id,
        });
        Ok(info)
    }

    async fn get_workflow_result(
        &self,
        info: WorkflowExecutionInfo,
        _options: GetWorkflowResultOptions,
    ) -> Result<WorkflowExecutionResult, ClientCallError> {
        let mut rx = self
            .state
            .lock()
            .runs
            .get(&info.run_id)
            .map(|r| r.result.subscribe())
            .ok_or_else(|| tonic::Status::not_found(format!("no run {}", info.run_id)))?;
        rx.wait_for(Option::is_some)
            .await
            .map_err(|_| tonic::Status::aborted("run was discarded"))?;
        let res = rx.borrow().clone();
        res.ok_or_else(|| ClientCallError::MalformedResponse("run closed without result".into()))
    }

    async fn signal_workflow(
        &self,
        info: WorkflowExecutionInfo,
        _signal_name: String,
        _input: Vec<Payload>,
    ) -> Result<(), ClientCallError> {
        if !self.state.lock().runs.contains_key(&info.run_id) {
            return Err(tonic::Status::not_found(format!("no run {}", info.run_id)).into());
        }
        Ok(())
    }
}
