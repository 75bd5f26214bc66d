//! Messages from the `temporal.api` protobuf packages, declared by hand for the subset of the
//! `WorkflowService` this crate calls. Field tags match the upstream `.proto` definitions, so
//! unknown fields sent by newer servers are skipped on decode.

#![allow(missing_docs)]

pub mod api {
    pub mod common {
        pub mod v1 {
            use std::collections::HashMap;

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct Payloads {
                #[prost(message, repeated, tag = "1")]
                pub payloads: Vec<Payload>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct Payload {
                #[prost(map = "string, bytes", tag = "1")]
                pub metadata: HashMap<String, Vec<u8>>,
                #[prost(bytes = "vec", tag = "2")]
                pub data: Vec<u8>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecution {
                #[prost(string, tag = "1")]
                pub workflow_id: String,
                #[prost(string, tag = "2")]
                pub run_id: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowType {
                #[prost(string, tag = "1")]
                pub name: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ActivityType {
                #[prost(string, tag = "1")]
                pub name: String,
            }
        }
    }

    pub mod enums {
        pub mod v1 {
            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum TaskQueueKind {
                Unspecified = 0,
                Normal = 1,
                Sticky = 2,
            }

            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum EventType {
                Unspecified = 0,
                WorkflowExecutionStarted = 1,
                WorkflowExecutionCompleted = 2,
                WorkflowExecutionFailed = 3,
                WorkflowExecutionTimedOut = 4,
                WorkflowTaskScheduled = 5,
                WorkflowTaskStarted = 6,
                WorkflowTaskCompleted = 7,
                WorkflowTaskTimedOut = 8,
                WorkflowTaskFailed = 9,
                ActivityTaskScheduled = 10,
                ActivityTaskStarted = 11,
                ActivityTaskCompleted = 12,
                ActivityTaskFailed = 13,
                ActivityTaskTimedOut = 14,
                ActivityTaskCancelRequested = 15,
                ActivityTaskCanceled = 16,
                TimerStarted = 17,
                TimerFired = 18,
                TimerCanceled = 19,
                WorkflowExecutionCancelRequested = 20,
                WorkflowExecutionCanceled = 21,
                MarkerRecorded = 25,
                WorkflowExecutionSignaled = 26,
                WorkflowExecutionTerminated = 27,
                WorkflowExecutionContinuedAsNew = 28,
            }

            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum HistoryEventFilterType {
                Unspecified = 0,
                AllEvent = 1,
                CloseEvent = 2,
            }

            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum CommandType {
                Unspecified = 0,
                ScheduleActivityTask = 1,
                RequestCancelActivityTask = 2,
                StartTimer = 3,
                CompleteWorkflowExecution = 4,
                FailWorkflowExecution = 5,
            }

            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum WorkflowIdReusePolicy {
                Unspecified = 0,
                AllowDuplicate = 1,
                AllowDuplicateFailedOnly = 2,
                RejectDuplicate = 3,
                TerminateIfRunning = 4,
            }

            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
            )]
            #[repr(i32)]
            pub enum WorkflowTaskFailedCause {
                Unspecified = 0,
                UnhandledCommand = 1,
                WorkflowWorkerUnhandledFailure = 14,
            }
        }
    }

    pub mod failure {
        pub mod v1 {
            use super::super::common::v1::Payloads;

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct Failure {
                #[prost(string, tag = "1")]
                pub message: String,
                #[prost(string, tag = "2")]
                pub source: String,
                #[prost(string, tag = "3")]
                pub stack_trace: String,
                #[prost(message, optional, boxed, tag = "4")]
                pub cause: Option<Box<Failure>>,
                #[prost(oneof = "failure::FailureInfo", tags = "5")]
                pub failure_info: Option<failure::FailureInfo>,
            }

            pub mod failure {
                #[derive(Clone, PartialEq, ::prost::Oneof)]
                pub enum FailureInfo {
                    #[prost(message, tag = "5")]
                    ApplicationFailureInfo(super::ApplicationFailureInfo),
                }
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ApplicationFailureInfo {
                #[prost(string, tag = "1")]
                pub r#type: String,
                #[prost(bool, tag = "2")]
                pub non_retryable: bool,
                #[prost(message, optional, tag = "3")]
                pub details: Option<Payloads>,
            }
        }
    }

    pub mod taskqueue {
        pub mod v1 {
            use super::super::enums::v1::TaskQueueKind;

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct TaskQueue {
                #[prost(string, tag = "1")]
                pub name: String,
                #[prost(enumeration = "TaskQueueKind", tag = "2")]
                pub kind: i32,
                #[prost(string, tag = "3")]
                pub normal_name: String,
            }
        }
    }

    pub mod command {
        pub mod v1 {
            use super::super::{
                common::v1::{ActivityType, Payloads},
                enums::v1::CommandType,
                failure::v1::Failure,
                taskqueue::v1::TaskQueue,
            };

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ScheduleActivityTaskCommandAttributes {
                #[prost(string, tag = "1")]
                pub activity_id: String,
                #[prost(message, optional, tag = "2")]
                pub activity_type: Option<ActivityType>,
                #[prost(message, optional, tag = "4")]
                pub task_queue: Option<TaskQueue>,
                #[prost(message, optional, tag = "6")]
                pub input: Option<Payloads>,
                #[prost(message, optional, tag = "7")]
                pub schedule_to_close_timeout: Option<::prost_types::Duration>,
                #[prost(message, optional, tag = "8")]
                pub schedule_to_start_timeout: Option<::prost_types::Duration>,
                #[prost(message, optional, tag = "9")]
                pub start_to_close_timeout: Option<::prost_types::Duration>,
                #[prost(message, optional, tag = "10")]
                pub heartbeat_timeout: Option<::prost_types::Duration>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct CompleteWorkflowExecutionCommandAttributes {
                #[prost(message, optional, tag = "1")]
                pub result: Option<Payloads>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct FailWorkflowExecutionCommandAttributes {
                #[prost(message, optional, tag = "1")]
                pub failure: Option<Failure>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct Command {
                #[prost(enumeration = "CommandType", tag = "1")]
                pub command_type: i32,
                #[prost(oneof = "command::Attributes", tags = "2, 4, 5")]
                pub attributes: Option<command::Attributes>,
            }

            pub mod command {
                #[derive(Clone, PartialEq, ::prost::Oneof)]
                pub enum Attributes {
                    #[prost(message, tag = "2")]
                    ScheduleActivityTaskCommandAttributes(
                        super::ScheduleActivityTaskCommandAttributes,
                    ),
                    #[prost(message, tag = "4")]
                    CompleteWorkflowExecutionCommandAttributes(
                        super::CompleteWorkflowExecutionCommandAttributes,
                    ),
                    #[prost(message, tag = "5")]
                    FailWorkflowExecutionCommandAttributes(
                        super::FailWorkflowExecutionCommandAttributes,
                    ),
                }
            }
        }
    }

    pub mod history {
        pub mod v1 {
            use super::super::{
                common::v1::{ActivityType, Payloads, WorkflowType},
                enums::v1::EventType,
                failure::v1::Failure,
                taskqueue::v1::TaskQueue,
            };

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct History {
                #[prost(message, repeated, tag = "1")]
                pub events: Vec<HistoryEvent>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct HistoryEvent {
                #[prost(int64, tag = "1")]
                pub event_id: i64,
                #[prost(enumeration = "EventType", tag = "3")]
                pub event_type: i32,
                #[prost(
                    oneof = "history_event::Attributes",
                    tags = "6, 7, 8, 9, 15, 17, 18, 19, 26, 27, 29, 33"
                )]
                pub attributes: Option<history_event::Attributes>,
            }

            pub mod history_event {
                #[derive(Clone, PartialEq, ::prost::Oneof)]
                pub enum Attributes {
                    #[prost(message, tag = "6")]
                    WorkflowExecutionStartedEventAttributes(
                        super::WorkflowExecutionStartedEventAttributes,
                    ),
                    #[prost(message, tag = "7")]
                    WorkflowExecutionCompletedEventAttributes(
                        super::WorkflowExecutionCompletedEventAttributes,
                    ),
                    #[prost(message, tag = "8")]
                    WorkflowExecutionFailedEventAttributes(
                        super::WorkflowExecutionFailedEventAttributes,
                    ),
                    #[prost(message, tag = "9")]
                    WorkflowExecutionTimedOutEventAttributes(
                        super::WorkflowExecutionTimedOutEventAttributes,
                    ),
                    #[prost(message, tag = "15")]
                    ActivityTaskScheduledEventAttributes(
                        super::ActivityTaskScheduledEventAttributes,
                    ),
                    #[prost(message, tag = "17")]
                    ActivityTaskCompletedEventAttributes(
                        super::ActivityTaskCompletedEventAttributes,
                    ),
                    #[prost(message, tag = "18")]
                    ActivityTaskFailedEventAttributes(super::ActivityTaskFailedEventAttributes),
                    #[prost(message, tag = "19")]
                    ActivityTaskTimedOutEventAttributes(
                        super::ActivityTaskTimedOutEventAttributes,
                    ),
                    #[prost(message, tag = "26")]
                    WorkflowExecutionSignaledEventAttributes(
                        super::WorkflowExecutionSignaledEventAttributes,
                    ),
                    #[prost(message, tag = "27")]
                    WorkflowExecutionTerminatedEventAttributes(
                        super::WorkflowExecutionTerminatedEventAttributes,
                    ),
                    #[prost(message, tag = "29")]
                    WorkflowExecutionCanceledEventAttributes(
                        super::WorkflowExecutionCanceledEventAttributes,
                    ),
                    #[prost(message, tag = "33")]
                    WorkflowExecutionContinuedAsNewEventAttributes(
                        super::WorkflowExecutionContinuedAsNewEventAttributes,
                    ),
                }
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecutionStartedEventAttributes {
                #[prost(message, optional, tag = "1")]
                pub workflow_type: Option<WorkflowType>,
                #[prost(message, optional, tag = "5")]
                pub task_queue: Option<TaskQueue>,
                #[prost(message, optional, tag = "6")]
                pub input: Option<Payloads>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecutionCompletedEventAttributes {
                #[prost(message, optional, tag = "1")]
                pub result: Option<Payloads>,
                #[prost(int64, tag = "2")]
                pub workflow_task_completed_event_id: i64,
                #[prost(string, tag = "3")]
                pub new_execution_run_id: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecutionFailedEventAttributes {
                #[prost(message, optional, tag = "1")]
                pub failure: Option<Failure>,
                #[prost(int32, tag = "2")]
                pub retry_state: i32,
                #[prost(int64, tag = "3")]
                pub workflow_task_completed_event_id: i64,
                #[prost(string, tag = "4")]
                pub new_execution_run_id: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecutionTimedOutEventAttributes {
                #[prost(int32, tag = "1")]
                pub retry_state: i32,
                #[prost(string, tag = "2")]
                pub new_execution_run_id: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecutionCanceledEventAttributes {
                #[prost(int64, tag = "1")]
                pub workflow_task_completed_event_id: i64,
                #[prost(message, optional, tag = "2")]
                pub details: Option<Payloads>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecutionSignaledEventAttributes {
                #[prost(string, tag = "1")]
                pub signal_name: String,
                #[prost(message, optional, tag = "2")]
                pub input: Option<Payloads>,
                #[prost(string, tag = "3")]
                pub identity: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecutionTerminatedEventAttributes {
                #[prost(string, tag = "1")]
                pub reason: String,
                #[prost(message, optional, tag = "2")]
                pub details: Option<Payloads>,
                #[prost(string, tag = "3")]
                pub identity: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct WorkflowExecutionContinuedAsNewEventAttributes {
                #[prost(string, tag = "1")]
                pub new_execution_run_id: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ActivityTaskScheduledEventAttributes {
                #[prost(string, tag = "1")]
                pub activity_id: String,
                #[prost(message, optional, tag = "2")]
                pub activity_type: Option<ActivityType>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ActivityTaskCompletedEventAttributes {
                #[prost(message, optional, tag = "1")]
                pub result: Option<Payloads>,
                #[prost(int64, tag = "2")]
                pub scheduled_event_id: i64,
                #[prost(int64, tag = "3")]
                pub started_event_id: i64,
                #[prost(string, tag = "4")]
                pub identity: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ActivityTaskFailedEventAttributes {
                #[prost(message, optional, tag = "1")]
                pub failure: Option<Failure>,
                #[prost(int64, tag = "2")]
                pub scheduled_event_id: i64,
                #[prost(int64, tag = "3")]
                pub started_event_id: i64,
                #[prost(string, tag = "4")]
                pub identity: String,
                #[prost(int32, tag = "5")]
                pub retry_state: i32,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ActivityTaskTimedOutEventAttributes {
                #[prost(message, optional, tag = "1")]
                pub failure: Option<Failure>,
                #[prost(int64, tag = "2")]
                pub scheduled_event_id: i64,
                #[prost(int64, tag = "3")]
                pub started_event_id: i64,
                #[prost(int32, tag = "4")]
                pub retry_state: i32,
            }
        }
    }

    pub mod workflowservice {
        pub mod v1 {
            use super::super::{
                command::v1::Command,
                common::v1::{ActivityType, Payloads, WorkflowExecution, WorkflowType},
                enums::v1::{HistoryEventFilterType, WorkflowIdReusePolicy, WorkflowTaskFailedCause},
                failure::v1::Failure,
                history::v1::History,
                taskqueue::v1::TaskQueue,
            };


            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct GetSystemInfoRequest {}

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct GetSystemInfoResponse {
                #[prost(string, tag = "1")]
                pub server_version: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct StartWorkflowExecutionRequest {
                #[prost(string, tag = "1")]
                pub namespace: String,
                #[prost(string, tag = "2")]
                pub workflow_id: String,
                #[prost(message, optional, tag = "3")]
                pub workflow_type: Option<WorkflowType>,
                #[prost(message, optional, tag = "4")]
                pub task_queue: Option<TaskQueue>,
                #[prost(message, optional, tag = "5")]
                pub input: Option<Payloads>,
                #[prost(message, optional, tag = "6")]
                pub workflow_execution_timeout: Option<::prost_types::Duration>,
                #[prost(message, optional, tag = "7")]
                pub workflow_run_timeout: Option<::prost_types::Duration>,
                #[prost(message, optional, tag = "8")]
                pub workflow_task_timeout: Option<::prost_types::Duration>,
                #[prost(string, tag = "9")]
                pub identity: String,
                #[prost(string, tag = "10")]
                pub request_id: String,
                #[prost(enumeration = "WorkflowIdReusePolicy", tag = "11")]
                pub workflow_id_reuse_policy: i32,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct StartWorkflowExecutionResponse {
                #[prost(string, tag = "1")]
                pub run_id: String,
                #[prost(bool, tag = "3")]
                pub started: bool,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct GetWorkflowExecutionHistoryRequest {
                #[prost(string, tag = "1")]
                pub namespace: String,
                #[prost(message, optional, tag = "2")]
                pub execution: Option<WorkflowExecution>,
                #[prost(int32, tag = "3")]
                pub maximum_page_size: i32,
                #[prost(bytes = "vec", tag = "4")]
                pub next_page_token: Vec<u8>,
                #[prost(bool, tag = "5")]
                pub wait_new_event: bool,
                #[prost(enumeration = "HistoryEventFilterType", tag = "6")]
                pub history_event_filter_type: i32,
                #[prost(bool, tag = "7")]
                pub skip_archival: bool,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct GetWorkflowExecutionHistoryResponse {
                #[prost(message, optional, tag = "1")]
                pub history: Option<History>,
                #[prost(bytes = "vec", tag = "3")]
                pub next_page_token: Vec<u8>,
                #[prost(bool, tag = "4")]
                pub archived: bool,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct SignalWorkflowExecutionRequest {
                #[prost(string, tag = "1")]
                pub namespace: String,
                #[prost(message, optional, tag = "2")]
                pub workflow_execution: Option<WorkflowExecution>,
                #[prost(string, tag = "3")]
                pub signal_name: String,
                #[prost(message, optional, tag = "4")]
                pub input: Option<Payloads>,
                #[prost(string, tag = "5")]
                pub identity: String,
                #[prost(string, tag = "6")]
                pub request_id: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct SignalWorkflowExecutionResponse {}

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct PollWorkflowTaskQueueRequest {
                #[prost(string, tag = "1")]
                pub namespace: String,
                #[prost(message, optional, tag = "2")]
                pub task_queue: Option<TaskQueue>,
                #[prost(string, tag = "3")]
                pub identity: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct PollWorkflowTaskQueueResponse {
                #[prost(bytes = "vec", tag = "1")]
                pub task_token: Vec<u8>,
                #[prost(message, optional, tag = "2")]
                pub workflow_execution: Option<WorkflowExecution>,
                #[prost(message, optional, tag = "3")]
                pub workflow_type: Option<WorkflowType>,
                #[prost(int64, tag = "4")]
                pub previous_started_event_id: i64,
                #[prost(int64, tag = "5")]
                pub started_event_id: i64,
                #[prost(int32, tag = "6")]
                pub attempt: i32,
                #[prost(message, optional, tag = "8")]
                pub history: Option<History>,
                #[prost(bytes = "vec", tag = "9")]
                pub next_page_token: Vec<u8>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct RespondWorkflowTaskCompletedRequest {
                #[prost(bytes = "vec", tag = "1")]
                pub task_token: Vec<u8>,
                #[prost(message, repeated, tag = "2")]
                pub commands: Vec<Command>,
                #[prost(string, tag = "3")]
                pub identity: String,
                #[prost(string, tag = "9")]
                pub namespace: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct RespondWorkflowTaskCompletedResponse {}

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct RespondWorkflowTaskFailedRequest {
                #[prost(bytes = "vec", tag = "1")]
                pub task_token: Vec<u8>,
                #[prost(enumeration = "WorkflowTaskFailedCause", tag = "2")]
                pub cause: i32,
                #[prost(message, optional, tag = "3")]
                pub failure: Option<Failure>,
                #[prost(string, tag = "4")]
                pub identity: String,
                #[prost(string, tag = "6")]
                pub namespace: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct RespondWorkflowTaskFailedResponse {}

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct PollActivityTaskQueueRequest {
                #[prost(string, tag = "1")]
                pub namespace: String,
                #[prost(message, optional, tag = "2")]
                pub task_queue: Option<TaskQueue>,
                #[prost(string, tag = "3")]
                pub identity: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct PollActivityTaskQueueResponse {
                #[prost(bytes = "vec", tag = "1")]
                pub task_token: Vec<u8>,
                #[prost(string, tag = "2")]
                pub workflow_namespace: String,
                #[prost(message, optional, tag = "3")]
                pub workflow_type: Option<WorkflowType>,
                #[prost(message, optional, tag = "4")]
                pub workflow_execution: Option<WorkflowExecution>,
                #[prost(message, optional, tag = "5")]
                pub activity_type: Option<ActivityType>,
                #[prost(string, tag = "6")]
                pub activity_id: String,
                #[prost(message, optional, tag = "8")]
                pub input: Option<Payloads>,
                #[prost(int32, tag = "13")]
                pub attempt: i32,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct RespondActivityTaskCompletedRequest {
                #[prost(bytes = "vec", tag = "1")]
                pub task_token: Vec<u8>,
                #[prost(message, optional, tag = "2")]
                pub result: Option<Payloads>,
                #[prost(string, tag = "3")]
                pub identity: String,
                #[prost(string, tag = "4")]
                pub namespace: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct RespondActivityTaskCompletedResponse {}

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct RespondActivityTaskFailedRequest {
                #[prost(bytes = "vec", tag = "1")]
                pub task_token: Vec<u8>,
                #[prost(message, optional, tag = "2")]
                pub failure: Option<Failure>,
                #[prost(string, tag = "3")]
                pub identity: String,
                #[prost(string, tag = "4")]
                pub namespace: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct RespondActivityTaskFailedResponse {}
        }
    }
}
