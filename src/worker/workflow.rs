//! Workflow functions and the context they run in.
//!
//! A workflow task carries the run's full history. Each task the registered function is run
//! again from the top against that history: activities already resolved in history resolve
//! immediately, anything else is left pending. Whatever the function asked for that history has
//! not recorded yet becomes the task's new commands.

use crate::protos::{
    temporal::api::{
        command::v1::{
            command, Command, CompleteWorkflowExecutionCommandAttributes,
            FailWorkflowExecutionCommandAttributes, ScheduleActivityTaskCommandAttributes,
        },
        common::v1::{ActivityType, Payload, Payloads},
        enums::v1::{CommandType, TaskQueueKind},
        failure::v1::Failure,
        history::v1::{history_event::Attributes, HistoryEvent},
        taskqueue::v1::TaskQueue,
    },
    AsJsonPayloadExt, FromJsonPayloadExt,
};
use anyhow::anyhow;
use futures::{future::BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap, future::Future, panic::AssertUnwindSafe, sync::Arc, time::Duration,
};

/// The result of running a workflow
pub type WorkflowResult<T> = Result<T, anyhow::Error>;

type WfFunc = dyn Fn(WfContext) -> BoxFuture<'static, WorkflowResult<Payload>> + Send + Sync;

/// The user's async function / workflow code
pub struct WorkflowFunction {
    wf_func: Box<WfFunc>,
}

impl WorkflowFunction {
    /// Build a workflow function from a closure or function pointer which accepts a [WfContext].
    /// The returned value is stored in history json-encoded.
    pub fn new<F, Fut, R>(wf_func: F) -> Self
    where
        F: Fn(WfContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WorkflowResult<R>> + Send + 'static,
        R: Serialize + 'static,
    {
        Self {
            wf_func: Box::new(move |ctx: WfContext| {
                wf_func(ctx)
                    .map(|res| res.and_then(|r| r.as_json_payload()))
                    .boxed()
            }),
        }
    }
}

/// How an activity ended, as recorded in history
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityResolution {
    /// The activity completed, possibly with a result
    Completed(Option<Payload>),
    /// The activity failed or timed out after exhausting its retries
    Failed(Failure),
}

/// Options for scheduling an activity from a workflow
#[derive(Default, Debug, Clone)]
pub struct ActivityOptions {
    /// Identifier to use for tracking the activity in Workflow history. If `None` the context's
    /// sequence number is used.
    pub activity_id: Option<String>,
    /// Type of activity to schedule
    pub activity_type: String,
    /// Input to the activity
    pub input: Payload,
    /// Task queue to schedule the activity in. Empty means the workflow's own queue.
    pub task_queue: String,
    /// Time that the Activity Task can stay in the Task Queue before it is picked up by a Worker
    pub schedule_to_start_timeout: Option<Duration>,
    /// Maximum time of a single Activity execution attempt.
    /// Either this option or `schedule_to_close_timeout` is required.
    pub start_to_close_timeout: Option<Duration>,
    /// Total time that a workflow is willing to wait for Activity to complete, including retries
    pub schedule_to_close_timeout: Option<Duration>,
    /// Heartbeat interval
    pub heartbeat_timeout: Option<Duration>,
}

impl ActivityOptions {
    fn into_command(self, seq: u32) -> Command {
        let dur = |d: Option<Duration>| d.and_then(|d| prost_types::Duration::try_from(d).ok());
        Command {
            command_type: CommandType::ScheduleActivityTask as i32,
            attributes: Some(command::Attributes::ScheduleActivityTaskCommandAttributes(
                ScheduleActivityTaskCommandAttributes {
                    activity_id: self.activity_id.unwrap_or_else(|| seq.to_string()),
                    activity_type: Some(ActivityType {
                        name: self.activity_type,
                    }),
                    task_queue: Some(TaskQueue {
                        name: self.task_queue,
                        kind: TaskQueueKind::Normal as i32,
                        normal_name: String::new(),
                    }),
                    input: Some(Payloads {
                        payloads: vec![self.input],
                    }),
                    schedule_to_close_timeout: dur(self.schedule_to_close_timeout),
                    schedule_to_start_timeout: dur(self.schedule_to_start_timeout),
                    start_to_close_timeout: dur(self.start_to_close_timeout),
                    heartbeat_timeout: dur(self.heartbeat_timeout),
                },
            )),
        }
    }
}

/// What one run's history says so far
#[derive(Debug, Default)]
pub(crate) struct HistoryView {
    pub(crate) args: Vec<Payload>,
    /// Activities in the order they were scheduled, with their resolution if they have one
    pub(crate) activities: Vec<Option<ActivityResolution>>,
}

impl HistoryView {
    pub(crate) fn new(events: &[HistoryEvent]) -> Self {
        let mut view = Self::default();
        let mut by_scheduled_id = HashMap::new();
        for ev in events {
            let (scheduled_id, resolution) = match &ev.attributes {
                Some(Attributes::WorkflowExecutionStartedEventAttributes(a)) => {
                    view.args = a.input.clone().map(|p| p.payloads).unwrap_or_default();
                    continue;
                }
                Some(Attributes::ActivityTaskScheduledEventAttributes(_)) => {
                    by_scheduled_id.insert(ev.event_id, view.activities.len());
                    view.activities.push(None);
                    continue;
                }
                Some(Attributes::ActivityTaskCompletedEventAttributes(a)) => (
                    a.scheduled_event_id,
                    ActivityResolution::Completed(
                        a.result.clone().and_then(|p| p.payloads.into_iter().next()),
                    ),
                ),
                Some(Attributes::ActivityTaskFailedEventAttributes(a)) => (
                    a.scheduled_event_id,
                    ActivityResolution::Failed(a.failure.clone().unwrap_or_default()),
                ),
                Some(Attributes::ActivityTaskTimedOutEventAttributes(a)) => (
                    a.scheduled_event_id,
                    ActivityResolution::Failed(a.failure.clone().unwrap_or_else(|| Failure {
                        message: "activity timed out".to_string(),
                        ..Default::default()
                    })),
                ),
                _ => continue,
            };
            match by_scheduled_id.get(&scheduled_id) {
                Some(&ix) => view.activities[ix] = Some(resolution),
                None => warn!(scheduled_id, "Activity resolution for an activity not in history"),
            }
        }
        view
    }
}

#[derive(Default)]
struct WfCtxState {
    next_activity_seq: u32,
    new_commands: Vec<Command>,
}

/// Used within workflows to issue commands and get info
pub struct WfContext {
    workflow_id: String,
    task_queue: String,
    args: Vec<Payload>,
    activities: Vec<Option<ActivityResolution>>,
    state: Arc<Mutex<WfCtxState>>,
}

impl WfContext {
    fn new(
        workflow_id: String,
        task_queue: String,
        view: HistoryView,
    ) -> (Self, Arc<Mutex<WfCtxState>>) {
        let state = Arc::new(Mutex::new(WfCtxState {
            next_activity_seq: 1,
            ..Default::default()
        }));
        (
            Self {
                workflow_id,
                task_queue,
                args: view.args,
                activities: view.activities,
                state: state.clone(),
            },
            state,
        )
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn task_queue(&self) -> &str {
        &self.task_queue
    }

    /// Get the arguments provided to the workflow upon execution start
    pub fn get_args(&self) -> &[Payload] {
        self.args.as_slice()
    }

    /// Decode the json argument at `index`
    pub fn input<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<T> {
        let payload = self
            .args
            .get(index)
            .ok_or_else(|| anyhow!("Workflow has no argument at position {index}"))?;
        Ok(T::from_json_payload(payload)?)
    }

    /// Request to run an activity. Resolves once history records the activity's outcome.
    pub fn activity(&self, mut opts: ActivityOptions) -> BoxFuture<'static, ActivityResolution> {
        if opts.task_queue.is_empty() {
            opts.task_queue = self.task_queue.clone();
        }
        let mut state = self.state.lock();
        let seq = state.next_activity_seq;
        state.next_activity_seq += 1;
        match self.activities.get(seq as usize - 1) {
            Some(Some(resolution)) => futures::future::ready(resolution.clone()).boxed(),
            Some(None) => futures::future::pending().boxed(),
            None => {
                state.new_commands.push(opts.into_command(seq));
                futures::future::pending().boxed()
            }
        }
    }
}

/// Runs `func` against the run's history and returns the commands the workflow task should
/// respond with. A panicking workflow function yields an error.
pub(crate) fn workflow_task_commands(
    func: &WorkflowFunction,
    workflow_id: String,
    task_queue: String,
    events: &[HistoryEvent],
) -> Result<Vec<Command>, String> {
    let (ctx, state) = WfContext::new(workflow_id, task_queue, HistoryView::new(events));
    let outcome = AssertUnwindSafe((func.wf_func)(ctx))
        .catch_unwind()
        .now_or_never();
    let mut commands = std::mem::take(&mut state.lock().new_commands);
    match outcome {
        None => {}
        Some(Ok(Ok(result))) => commands.push(Command {
            command_type: CommandType::CompleteWorkflowExecution as i32,
            attributes: Some(command::Attributes::CompleteWorkflowExecutionCommandAttributes(
                CompleteWorkflowExecutionCommandAttributes {
                    result: Some(Payloads {
                        payloads: vec![result],
                    }),
                },
            )),
        }),
        Some(Ok(Err(e))) => commands.push(Command {
            command_type: CommandType::FailWorkflowExecution as i32,
            attributes: Some(command::Attributes::FailWorkflowExecutionCommandAttributes(
                FailWorkflowExecutionCommandAttributes {
                    failure: Some(Failure::application_failure(format!("{e:#}"), false)),
                },
            )),
        }),
        Some(Err(panic)) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            return Err(format!("Workflow function panicked: {msg}"));
        }
    }
    Ok(commands)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protos::temporal::api::{
        enums::v1::EventType,
        history::v1::{
            ActivityTaskCompletedEventAttributes, ActivityTaskFailedEventAttributes,
            ActivityTaskScheduledEventAttributes, WorkflowExecutionStartedEventAttributes,
        },
    };
    use assert_matches::assert_matches;

    pub(crate) fn started(input: &str) -> HistoryEvent {
        HistoryEvent {
            event_id: 1,
            event_type: EventType::WorkflowExecutionStarted as i32,
            attributes: Some(Attributes::WorkflowExecutionStartedEventAttributes(
                WorkflowExecutionStartedEventAttributes {
                    input: Some(Payloads {
                        payloads: vec![input.as_json_payload().unwrap()],
                    }),
                    ..Default::default()
                },
            )),
        }
    }

    pub(crate) fn scheduled(event_id: i64) -> HistoryEvent {
        HistoryEvent {
            event_id,
            event_type: EventType::ActivityTaskScheduled as i32,
            attributes: Some(Attributes::ActivityTaskScheduledEventAttributes(
                ActivityTaskScheduledEventAttributes {
                    activity_id: "1".to_string(),
                    ..Default::default()
                },
            )),
        }
    }

    pub(crate) fn completed(event_id: i64, scheduled_event_id: i64, result: &str) -> HistoryEvent {
        HistoryEvent {
            event_id,
            event_type: EventType::ActivityTaskCompleted as i32,
            attributes: Some(Attributes::ActivityTaskCompletedEventAttributes(
                ActivityTaskCompletedEventAttributes {
                    result: Some(Payloads {
                        payloads: vec![result.as_json_payload().unwrap()],
                    }),
                    scheduled_event_id,
                    ..Default::default()
                },
            )),
        }
    }

    pub(crate) fn failed(event_id: i64, scheduled_event_id: i64) -> HistoryEvent {
        HistoryEvent {
            event_id,
            event_type: EventType::ActivityTaskFailed as i32,
            attributes: Some(Attributes::ActivityTaskFailedEventAttributes(
                ActivityTaskFailedEventAttributes {
                    failure: Some(Failure::application_failure("boom".to_string(), false)),
                    scheduled_event_id,
                    ..Default::default()
                },
            )),
        }
    }

    async fn echo_workflow(ctx: WfContext) -> WorkflowResult<String> {
        let name: String = ctx.input(0)?;
        let res = ctx
            .activity(ActivityOptions {
                activity_type: "echo".to_string(),
                input: name.as_json_payload()?,
                start_to_close_timeout: Some(Duration::from_secs(10)),
                ..Default::default()
            })
            .await;
        match res {
            ActivityResolution::Completed(Some(p)) => Ok(String::from_json_payload(&p)?),
            ActivityResolution::Completed(None) => Err(anyhow!("no result")),
            ActivityResolution::Failed(f) => Err(anyhow!("activity failed: {}", f.chain_message())),
        }
    }

    async fn panicking_workflow(_ctx: WfContext) -> WorkflowResult<()> {
        panic!("oh no")
    }

    fn commands_for(events: &[HistoryEvent]) -> Vec<Command> {
        workflow_task_commands(
            &WorkflowFunction::new(echo_workflow),
            "wf".to_string(),
            "q".to_string(),
            events,
        )
        .unwrap()
    }

    #[test]
    fn first_task_schedules_activity() {
        let cmds = commands_for(&[started("Alice")]);
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].command_type, CommandType::ScheduleActivityTask as i32);
        assert_matches!(
            &cmds[0].attributes,
            Some(command::Attributes::ScheduleActivityTaskCommandAttributes(a))
                if a.activity_id == "1"
                    && a.activity_type.as_ref().unwrap().name == "echo"
                    && a.task_queue.as_ref().unwrap().name == "q"
                    && a.start_to_close_timeout
                        == Some(prost_types::Duration { seconds: 10, nanos: 0 })
                    && a.input.as_ref().unwrap().payloads[0].to_display_string() == "Alice"
        );
    }

    #[test]
    fn pending_activity_produces_no_commands() {
        assert!(commands_for(&[started("Alice"), scheduled(5)]).is_empty());
    }

    #[test]
    fn resolved_activity_completes_workflow() {
        let cmds = commands_for(&[started("Alice"), scheduled(5), completed(7, 5, "ALICE")]);
        assert_eq!(cmds.len(), 1);
        assert_matches!(
            &cmds[0].attributes,
            Some(command::Attributes::CompleteWorkflowExecutionCommandAttributes(a))
                if a.result.as_ref().unwrap().payloads[0].to_display_string() == "ALICE"
        );
    }

    #[test]
    fn failed_activity_fails_workflow() {
        let cmds = commands_for(&[started("Alice"), scheduled(5), failed(7, 5)]);
        assert_eq!(cmds.len(), 1);
        assert_matches!(
            &cmds[0].attributes,
            Some(command::Attributes::FailWorkflowExecutionCommandAttributes(a))
                if a.failure.as_ref().unwrap().message == "activity failed: boom"
        );
    }

    #[test]
    fn missing_input_fails_workflow() {
        let cmds = commands_for(&[]);
        assert_eq!(cmds[0].command_type, CommandType::FailWorkflowExecution as i32);
    }

    #[test]
    fn panicking_workflow_is_an_error() {
        let wf = WorkflowFunction::new(panicking_workflow);
        let err = workflow_task_commands(&wf, "wf".to_string(), "q".to_string(), &[]).unwrap_err();
        assert!(err.contains("oh no"));
    }
}
