#![warn(missing_docs)] // error if there are missing docs

//! An HTTP front-end that starts Temporal workflow executions, together with a worker that
//! executes them.
//!
//! [HttpFrontend] answers `/ping`, starts a workflow and waits for its result on `/sync`, and
//! starts one without waiting on `/async`. It talks to the server only through
//! [WorkflowClientTrait], so any implementation can be injected. [Worker] polls the same task
//! queue and runs the workflow and activity registered by [hello_world::register].

#[macro_use]
extern crate tracing;

pub mod client;
pub mod config;
pub mod errors;
pub mod frontend;
pub mod gateway;
pub mod hello_world;
pub mod protos;
pub mod telemetry;
pub mod worker;

mod task_token;

pub use client::{
    GetWorkflowResultOptions, WorkflowClient, WorkflowClientTrait, WorkflowExecutionInfo,
    WorkflowExecutionResult, WorkflowStartOptions, WorkflowStartOptionsBuilder,
};
pub use frontend::{FrontendOptions, FrontendOptionsBuilder, HttpFrontend};
pub use gateway::{ServerGateway, ServerGatewayApis, ServerGatewayOptions};
pub use task_token::TaskToken;
pub use telemetry::telemetry_init;
pub use worker::{Worker, WorkerConfig, WorkerConfigBuilder};
