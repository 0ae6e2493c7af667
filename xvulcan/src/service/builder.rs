//! Service builder for constructing an [`AssessmentService`] from the user's
//! configuration file.
//!
//! Each component gets its own small function so the CLI can build only what
//! a command needs.

use super::config::ServiceConfig;
use super::error::ServiceError;
use super::facade::{AssessmentService, ServiceContext};
use crate::config::{ConfigFile, StorageSettings, StoreKind};
use crate::footprint::{FootprintFetcher, OverpassSource};
use crate::inference::CommandLauncher;
use crate::layout::JobLayout;
use crate::mosaic::TileFetcher;
use crate::provider::{
    AsyncReqwestClient, ImageryProviderType, ProviderConfig, ProviderFactory,
};
use crate::store::{FileJobStore, JobStore, MemoryJobStore};
use std::sync::Arc;
use tracing::info;

/// The service as wired for production use.
pub type DefaultAssessmentService = AssessmentService<
    ImageryProviderType<AsyncReqwestClient>,
    AsyncReqwestClient,
    OverpassSource<AsyncReqwestClient>,
>;

/// Create the HTTP client shared by every remote component.
pub fn create_http_client(config: &ConfigFile) -> Result<AsyncReqwestClient, ServiceError> {
    Ok(AsyncReqwestClient::with_timeout(config.imagery.timeout)?)
}

/// Create the job store selected in `[storage]`.
pub fn create_store(settings: &StorageSettings) -> Result<Arc<dyn JobStore>, ServiceError> {
    match settings.store {
        StoreKind::Memory => Ok(Arc::new(MemoryJobStore::new())),
        StoreKind::File => Ok(Arc::new(FileJobStore::open(settings.records_directory())?)),
    }
}

/// Resolve `[provider]` into a provider configuration.
pub fn provider_config(config: &ConfigFile) -> Result<ProviderConfig, ServiceError> {
    let provider = &config.provider;
    let key = provider.api_key().ok_or_else(|| {
        ServiceError::Config(format!(
            "provider '{}' requires {}_api_key in [provider]",
            provider.provider_type, provider.provider_type
        ))
    })?;
    Ok(ProviderConfig::from_name(&provider.provider_type, key)?)
}

/// Create the imagery provider configured in `[provider]`.
pub fn create_provider(
    config: &ConfigFile,
    http_client: AsyncReqwestClient,
) -> Result<ImageryProviderType<AsyncReqwestClient>, ServiceError> {
    let provider_config = provider_config(config)?;
    Ok(ProviderFactory::new(http_client).create(&provider_config)?)
}

/// Create the Overpass footprint source configured in `[footprints]`.
pub fn create_footprint_source(
    config: &ConfigFile,
    http_client: AsyncReqwestClient,
) -> OverpassSource<AsyncReqwestClient> {
    OverpassSource::with_endpoint(http_client, config.footprints.endpoint.clone())
}

/// Create the tile fetcher configured in `[imagery]`.
pub fn create_tile_fetcher(
    config: &ConfigFile,
    http_client: AsyncReqwestClient,
) -> TileFetcher<AsyncReqwestClient> {
    TileFetcher::new(http_client).with_workers(config.imagery.workers)
}

/// Wire the complete service from `config`.
pub fn build_service(config: &ConfigFile) -> Result<DefaultAssessmentService, ServiceError> {
    let http_client = create_http_client(config)?;
    let provider = create_provider(config, http_client.clone())?;

    let context = ServiceContext {
        store: create_store(&config.storage)?,
        layout: JobLayout::new(&config.storage.directory),
        provider: Arc::new(provider),
        fetcher: Arc::new(create_tile_fetcher(config, http_client.clone())),
        footprints: Arc::new(FootprintFetcher::new(create_footprint_source(
            config,
            http_client,
        ))),
        launcher: Arc::new(
            CommandLauncher::new(config.inference.program.clone())
                .with_args(config.inference.args.clone()),
        ),
    };

    info!(
        provider = %config.provider.provider_type,
        store = %config.storage.store,
        directory = %config.storage.directory.display(),
        "Assessment service ready"
    );

    Ok(AssessmentService::new(
        ServiceConfig::from_config_file(config),
        context,
    ))
}
