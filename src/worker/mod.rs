//! Polls one task queue and runs the workflow and activity functions registered on it.

mod activities;
pub(crate) mod workflow;

pub use activities::{ActContext, ActivityError, ActivityFunction};
pub use workflow::{
    ActivityOptions, ActivityResolution, WfContext, WorkflowFunction, WorkflowResult,
};

use crate::{
    errors::WorkerError,
    gateway::ServerGatewayApis,
    protos::temporal::api::{
        enums::v1::{HistoryEventFilterType, WorkflowTaskFailedCause},
        failure::v1::Failure,
        workflowservice::v1::PollWorkflowTaskQueueResponse,
    },
    task_token::TaskToken,
};
use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tonic::Code;

/// Poll errors with these codes will not go away by polling again
const FATAL_POLL_ERROR_CODES: [Code; 5] = [
    Code::Unauthenticated,
    Code::PermissionDenied,
    Code::InvalidArgument,
    Code::NotFound,
    Code::Unimplemented,
];

/// Defines per-worker configuration options
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct WorkerConfig {
    /// What task queue will this worker poll from? This task queue name will be used for both
    /// workflow and activity polling.
    pub task_queue: String,
    /// The maximum allowed number of activity tasks that will ever be given to this worker at one
    /// time.
    #[builder(default = "100")]
    pub max_outstanding_activities: usize,
    /// First wait after a poll fails with a recoverable error
    #[builder(default = "Duration::from_millis(100)")]
    pub poll_error_initial_backoff: Duration,
    /// Waits after consecutive poll failures grow up to this
    #[builder(default = "Duration::from_secs(10)")]
    pub poll_error_max_backoff: Duration,
}

impl WorkerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if matches!(&self.task_queue, Some(tq) if tq.is_empty()) {
            return Err("`task_queue` must not be empty".to_owned());
        }
        if self.max_outstanding_activities == Some(0) {
            return Err("`max_outstanding_activities` must be at least 1".to_owned());
        }
        Ok(())
    }
}

impl WorkerConfig {
    fn poll_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.poll_error_initial_backoff)
            .with_max_interval(self.poll_error_max_backoff)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// A worker polls on a certain task queue
pub struct Worker {
    config: WorkerConfig,
    gateway: Arc<dyn ServerGatewayApis>,
    workflow_fns: HashMap<String, WorkflowFunction>,
    activity_fns: HashMap<String, ActivityFunction>,
    activities_semaphore: Arc<Semaphore>,
}

impl Worker {
    pub fn new(gateway: Arc<dyn ServerGatewayApis>, config: WorkerConfig) -> Self {
        Self {
            activities_semaphore: Arc::new(Semaphore::new(config.max_outstanding_activities)),
            config,
            gateway,
            workflow_fns: Default::default(),
            activity_fns: Default::default(),
        }
    }

    pub fn task_queue(&self) -> &str {
        &self.config.task_queue
    }

    /// Register a Workflow function to invoke when Worker is requested to run `workflow_type`
    pub fn register_wf<F, Fut, R>(&mut self, workflow_type: impl Into<String>, wf_function: F)
    where
        F: Fn(WfContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WorkflowResult<R>> + Send + 'static,
        R: Serialize + 'static,
    {
        self.workflow_fns
            .insert(workflow_type.into(), WorkflowFunction::new(wf_function));
    }

    /// Register an Activity function to invoke when Worker is requested to run `activity_type`
    pub fn register_activity<A, R, F, Fut>(
        &mut self,
        activity_type: impl Into<String>,
        act_function: F,
    ) where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(ActContext, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ActivityError>> + Send + 'static,
    {
        self.activity_fns
            .insert(activity_type.into(), ActivityFunction::new(act_function));
    }

    /// Polls for and executes tasks until `shutdown` is cancelled or polling fails in a way that
    /// cannot recover. Activities still running at shutdown are allowed to finish.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        if self.workflow_fns.is_empty() && self.activity_fns.is_empty() {
            return Err(WorkerError::NothingRegistered(self.config.task_queue));
        }
        info!(task_queue = %self.config.task_queue,
              workflows = ?self.workflow_fns.keys().collect::<Vec<_>>(),
              activities = ?self.activity_fns.keys().collect::<Vec<_>>(),
              "Worker started");
        let me = Arc::new(self);
        let res = tokio::try_join!(
            me.clone().workflow_poll_loop(shutdown.clone()),
            me.clone().activity_poll_loop(shutdown.clone()),
        );
        if res.is_err() {
            shutdown.cancel();
        }
        info!(task_queue = %me.config.task_queue, "Worker stopped");
        res.map(|_| ())
    }

    async fn workflow_poll_loop(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> Result<(), WorkerError> {
        if self.workflow_fns.is_empty() {
            return Ok(());
        }
        let mut backoff = self.config.poll_backoff();
        loop {
            let res = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                r = self.gateway.poll_workflow_task(self.config.task_queue.clone()) => r,
            };
            match res {
                Ok(task) => {
                    backoff.reset();
                    if task.task_token.is_empty() {
                        continue;
                    }
                    self.handle_workflow_task(task).await;
                }
                Err(status) => self.poll_failed(status, &mut backoff, &shutdown).await?,
            }
        }
        Ok(())
    }

    async fn activity_poll_loop(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> Result<(), WorkerError> {
        if self.activity_fns.is_empty() {
            return Ok(());
        }
        let mut backoff = self.config.poll_backoff();
        loop {
            // Hold a permit for the whole activity so at most `max_outstanding_activities` run
            let permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                p = self.activities_semaphore.clone().acquire_owned() => match p {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };
            let res = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                r = self.gateway.poll_activity_task(self.config.task_queue.clone()) => r,
            };
            match res {
                Ok(task) => {
                    backoff.reset();
                    if task.task_token.is_empty() {
                        continue;
                    }
                    let func = task
                        .activity_type
                        .as_ref()
                        .and_then(|t| self.activity_fns.get(&t.name))
                        .cloned();
                    let gateway = self.gateway.clone();
                    tokio::spawn(async move {
                        activities::execute_activity(gateway, func, task).await;
                        drop(permit);
                    });
                }
                Err(status) => {
                    drop(permit);
                    self.poll_failed(status, &mut backoff, &shutdown).await?
                }
            }
        }
        self.drain_activities().await;
        Ok(())
    }

    async fn drain_activities(&self) {
        let max = self.config.max_outstanding_activities;
        let outstanding = max - self.activities_semaphore.available_permits();
        if outstanding > 0 {
            info!(outstanding, "Waiting for running activities to finish");
        }
        let _ = self
            .activities_semaphore
            .acquire_many(u32::try_from(max).unwrap_or(u32::MAX))
            .await;
    }

    /// Waits out a recoverable poll error, or returns the error if it is not recoverable
    async fn poll_failed(
        &self,
        status: tonic::Status,
        backoff: &mut ExponentialBackoff,
        shutdown: &CancellationToken,
    ) -> Result<(), WorkerError> {
        if FATAL_POLL_ERROR_CODES.contains(&status.code()) {
            error!(task_queue = %self.config.task_queue, error = ?status,
                   "Unrecoverable poll error");
            return Err(WorkerError::FatalPollError {
                task_queue: self.config.task_queue.clone(),
                source: status,
            });
        }
        let wait = backoff
            .next_backoff()
            .unwrap_or(self.config.poll_error_max_backoff);
        warn!(task_queue = %self.config.task_queue, error = ?status, ?wait,
              "Poll error, retrying");
        tokio::select! {
            _ = shutdown.cancelled() => {},
            _ = tokio::time::sleep(wait) => {},
        }
        Ok(())
    }

    async fn handle_workflow_task(&self, task: PollWorkflowTaskQueueResponse) {
        let task_token = TaskToken(task.task_token);
        let execution = task.workflow_execution.unwrap_or_default();
        let workflow_type = task.workflow_type.map(|t| t.name).unwrap_or_default();
        debug!(task_token = %task_token, workflow_id = %execution.workflow_id,
               run_id = %execution.run_id, %workflow_type, "Got workflow task");

        let mut events = task.history.map(|h| h.events).unwrap_or_default();
        let mut next_page_token = task.next_page_token;
        while !next_page_token.is_empty() {
            match self
                .gateway
                .get_workflow_execution_history(
                    execution.workflow_id.clone(),
                    Some(execution.run_id.clone()),
                    next_page_token,
                    HistoryEventFilterType::AllEvent,
                )
                .await
            {
                Ok(page) => {
                    events.extend(page.history.map(|h| h.events).unwrap_or_default());
                    next_page_token = page.next_page_token;
                }
                Err(status) => {
                    self.fail_workflow_task(
                        task_token,
                        format!("Failed to fetch workflow history: {}", status.message()),
                    )
                    .await;
                    return;
                }
            }
        }

        let Some(func) = self.workflow_fns.get(&workflow_type) else {
            self.fail_workflow_task(
                task_token,
                format!("Workflow type `{workflow_type}` is not registered on this worker"),
            )
            .await;
            return;
        };

        match workflow::workflow_task_commands(
            func,
            execution.workflow_id,
            self.config.task_queue.clone(),
            &events,
        ) {
            Ok(commands) => {
                debug!(task_token = %task_token, commands = commands.len(),
                       "Completing workflow task");
                if let Err(status) = self
                    .gateway
                    .complete_workflow_task(task_token.clone(), commands)
                    .await
                {
                    warn!(task_token = %task_token, error = ?status,
                          "Failed to complete workflow task");
                }
            }
            Err(msg) => self.fail_workflow_task(task_token, msg).await,
        }
    }

    async fn fail_workflow_task(&self, task_token: TaskToken, message: String) {
        warn!(task_token = %task_token, %message, "Failing workflow task");
        if let Err(status) = self
            .gateway
            .fail_workflow_task(
                task_token.clone(),
                WorkflowTaskFailedCause::WorkflowWorkerUnhandledFailure,
                Some(Failure::application_failure(message, false)),
            )
            .await
        {
            warn!(task_token = %task_token, error = ?status, "Failed to fail workflow task");
        }
    }
}
