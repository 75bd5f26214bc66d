use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use temporal_trigger::{
    config::Cli, hello_world, telemetry_init, HttpFrontend, ServerGatewayApis, Worker,
    WorkflowClient, WorkflowClientTrait,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    telemetry_init()?;
    let cli = Cli::parse();

    let gateway_opts = cli.gateway_options()?;
    let gateway: Arc<dyn ServerGatewayApis> = Arc::new(
        gateway_opts
            .connect()
            .await
            .with_context(|| format!("Unable to connect to {}", gateway_opts.target_url))?,
    );
    info!(endpoint = %gateway_opts.target_url, namespace = %gateway_opts.namespace,
          "Connected to Temporal");

    let client: Arc<dyn WorkflowClientTrait> = Arc::new(WorkflowClient::new(
        gateway.clone(),
        gateway_opts.namespace.clone(),
    ));
    let frontend = HttpFrontend::bind(cli.frontend_options()?, client)
        .context("Unable to bind the HTTP listener")?;

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let frontend_shutdown = shutdown.clone();
    let frontend_task = tokio::spawn(async move {
        let res = frontend.run(frontend_shutdown.clone()).await;
        if let Err(e) = &res {
            error!(error = ?e, "HTTP front-end failed");
            frontend_shutdown.cancel();
        }
        res
    });

    let mut worker = Worker::new(gateway, cli.worker_config()?);
    hello_world::register(&mut worker);
    let worker_res = worker.run(shutdown.clone()).await;
    shutdown.cancel();

    frontend_task.await??;
    worker_res?;
    info!("Shut down cleanly");
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!(error = ?e, "Unable to listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Interrupted, shutting down");
    shutdown.cancel();
}
