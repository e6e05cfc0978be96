//! Factory functions for building a [`Provisioner`].

use crate::bootstrap::{CommandInitializer, Initializer};
use crate::config::EngineConfig;
use crate::engine::Provisioner;
use crate::error::ProvisionError;
use crate::http::{HttpFetcher, ReqwestFetcher};
use std::sync::Arc;

/// Creates a provisioner that talks to the network with `reqwest` and runs
/// the configured first-run command.
///
/// # Errors
///
/// Fails with [`ProvisionError::Upstream`] when the HTTP client cannot be
/// constructed.
///
/// # Example
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use hearth_engine::{create_provisioner, EngineConfig, ProvisionRequest};
///
/// let provisioner = create_provisioner(&EngineConfig::with_data_dir("data"))?;
/// let world = provisioner
///     .provision_world(ProvisionRequest::new("1.20.1", "MyServer").accept_eula(true))
///     .await?;
/// println!("{}", world.instance.path.display());
/// # Ok(())
/// # }
/// ```
pub fn create_provisioner(config: &EngineConfig) -> Result<Provisioner, ProvisionError> {
    let fetcher = ReqwestFetcher::new(config.connect_timeout(), config.request_timeout())
        .map_err(|error| ProvisionError::Upstream(error.to_string()))?;
    let initializer = CommandInitializer::new(
        config.initializer.program.clone(),
        config.initializer.args.clone(),
        config.initializer.timeout(),
    );

    Ok(create_provisioner_with(config, Arc::new(fetcher), Arc::new(initializer)))
}

/// Creates a provisioner with caller-supplied collaborators.
pub fn create_provisioner_with(
    config: &EngineConfig,
    fetcher: Arc<dyn HttpFetcher>,
    initializer: Arc<dyn Initializer>,
) -> Provisioner {
    Provisioner::new(config, fetcher, initializer)
}
