use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Initialize console logging. Filtering follows the standard `RUST_LOG` [EnvFilter] pattern and
/// defaults to `info`. Calling this more than once is a no-op.
pub fn telemetry_init() -> Result<(), anyhow::Error> {
    TRACING_INIT
        .get_or_try_init(|| {
            let filter_layer =
                EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .try_init()?;
            Ok::<_, anyhow::Error>(())
        })
        .map(|_| ())
}
