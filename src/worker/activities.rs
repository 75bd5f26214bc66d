use crate::{
    gateway::ServerGatewayApis,
    protos::{
        temporal::api::{
            common::v1::{Payload, Payloads, WorkflowExecution},
            failure::v1::Failure,
            workflowservice::v1::PollActivityTaskQueueResponse,
        },
        AsJsonPayloadExt, FromJsonPayloadExt,
    },
    task_token::TaskToken,
};
use anyhow::anyhow;
use futures::{future::BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};

/// Returned from activity functions to control whether the server retries them
#[derive(thiserror::Error, Debug)]
pub enum ActivityError {
    /// The activity failed but may succeed if retried
    #[error("Retryable activity error: {0:#}")]
    Retryable(anyhow::Error),
    /// The activity failed and must not be retried
    #[error("Non-retryable activity error: {0:#}")]
    NonRetryable(anyhow::Error),
}

impl From<anyhow::Error> for ActivityError {
    fn from(source: anyhow::Error) -> Self {
        Self::Retryable(source)
    }
}

impl ActivityError {
    fn into_failure(self) -> Failure {
        match self {
            ActivityError::Retryable(e) => Failure::application_failure(format!("{e:#}"), false),
            ActivityError::NonRetryable(e) => Failure::application_failure(format!("{e:#}"), true),
        }
    }
}

/// Information about the activity task being executed
#[derive(Debug, Clone)]
pub struct ActContext {
    pub activity_id: String,
    pub activity_type: String,
    pub workflow_execution: Option<WorkflowExecution>,
    /// Starts at 1 and increments on each retry
    pub attempt: i32,
}

type ActFunc = dyn Fn(ActContext, Option<Payload>) -> BoxFuture<'static, ActivityResult>
    + Send
    + Sync;
type ActivityResult = Result<Payload, ActivityError>;

/// An activity function with its json input decoding and result encoding
#[derive(Clone)]
pub struct ActivityFunction {
    act_func: Arc<ActFunc>,
}

impl ActivityFunction {
    pub fn new<A, R, F, Fut>(act_func: F) -> Self
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(ActContext, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ActivityError>> + Send + 'static,
    {
        Self {
            act_func: Arc::new(move |ctx: ActContext, input: Option<Payload>| {
                let input = match decode_input::<A>(input) {
                    Ok(i) => i,
                    Err(e) => return futures::future::ready(Err(e)).boxed(),
                };
                act_func(ctx, input)
                    .map(|res| {
                        res.and_then(|r| r.as_json_payload().map_err(ActivityError::NonRetryable))
                    })
                    .boxed()
            }),
        }
    }
}

fn decode_input<A: DeserializeOwned>(input: Option<Payload>) -> Result<A, ActivityError> {
    let payload =
        input.ok_or_else(|| ActivityError::NonRetryable(anyhow!("Activity has no input")))?;
    A::from_json_payload(&payload).map_err(|e| {
        ActivityError::NonRetryable(anyhow!("Activity input could not be decoded: {e}"))
    })
}

/// Runs one polled activity task to completion and reports its outcome. Failures to report are
/// logged; the server will time the task out and retry it.
pub(crate) async fn execute_activity(
    gateway: Arc<dyn ServerGatewayApis>,
    func: Option<ActivityFunction>,
    task: PollActivityTaskQueueResponse,
) {
    let task_token = TaskToken(task.task_token);
    let ctx = ActContext {
        activity_id: task.activity_id,
        activity_type: task.activity_type.map(|t| t.name).unwrap_or_default(),
        workflow_execution: task.workflow_execution,
        attempt: task.attempt,
    };
    let input = task.input.and_then(|p| p.payloads.into_iter().next());
    debug!(task_token = %task_token, activity_id = %ctx.activity_id,
           activity_type = %ctx.activity_type, attempt = ctx.attempt, "Executing activity");

    let activity_type = ctx.activity_type.clone();
    let res = match func {
        None => Err(ActivityError::NonRetryable(anyhow!(
            "Activity type `{activity_type}` is not registered on this worker"
        ))),
        Some(f) => match AssertUnwindSafe((f.act_func)(ctx, input))
            .catch_unwind()
            .await
        {
            Ok(r) => r,
            Err(_) => Err(ActivityError::Retryable(anyhow!("Activity function panicked"))),
        },
    };

    let reported = match res {
        Ok(result) => gateway
            .complete_activity_task(
                task_token.clone(),
                Some(Payloads {
                    payloads: vec![result],
                }),
            )
            .await
            .map(|_| ()),
        Err(e) => {
            warn!(task_token = %task_token, activity_type = %activity_type, error = %e,
                  "Activity failed");
            gateway
                .fail_activity_task(task_token.clone(), Some(e.into_failure()))
                .await
                .map(|_| ())
        }
    };
    if let Err(status) = reported {
        warn!(task_token = %task_token, error = ?status, "Failed to report activity result");
    }
}
