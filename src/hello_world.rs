//! The workflow and activity this process serves: `Workflow(name)` runs `Activity(name)` which
//! greets `name`.

use crate::{
    protos::{AsJsonPayloadExt, FromJsonPayloadExt},
    worker::{
        ActContext, ActivityError, ActivityOptions, ActivityResolution, WfContext, Worker,
        WorkflowResult,
    },
};
use anyhow::bail;
use std::time::Duration;

pub const WORKFLOW_TYPE: &str = "Workflow";
pub const ACTIVITY_TYPE: &str = "Activity";
pub const ACTIVITY_START_TO_CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn hello_workflow(ctx: WfContext) -> WorkflowResult<String> {
    let name: String = ctx.input(0)?;
    info!(workflow_id = %ctx.workflow_id(), %name, "Workflow running");
    let res = ctx
        .activity(ActivityOptions {
            activity_type: ACTIVITY_TYPE.to_string(),
            input: name.as_json_payload()?,
            start_to_close_timeout: Some(ACTIVITY_START_TO_CLOSE_TIMEOUT),
            ..Default::default()
        })
        .await;
    match res {
        ActivityResolution::Completed(Some(greeting)) => Ok(String::from_json_payload(&greeting)?),
        ActivityResolution::Completed(None) => bail!("Activity completed without a result"),
        ActivityResolution::Failed(f) => bail!("Activity failed: {}", f.chain_message()),
    }
}

pub async fn hello_activity(_ctx: ActContext, name: String) -> Result<String, ActivityError> {
    Ok(format!("Hello {name}!"))
}

/// Registers [WORKFLOW_TYPE] and [ACTIVITY_TYPE] on `worker`
pub fn register(worker: &mut Worker) {
    worker.register_wf(WORKFLOW_TYPE, hello_workflow);
    worker.register_activity(ACTIVITY_TYPE, hello_activity);
}
