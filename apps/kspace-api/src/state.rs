use std::sync::Arc;

use kspace_service::{DiscoveryService, Vocabulary};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DiscoveryService>,
}
impl AppState {
	pub fn new(config: kspace_config::Config) -> color_eyre::Result<Self> {
		let vocabulary = Vocabulary::load(&config.vocabulary.path)?;

		tracing::info!(
			sources = vocabulary.sources.len(),
			path = %config.vocabulary.path.display(),
			"Filter vocabulary loaded."
		);

		let service = DiscoveryService::new(config, vocabulary);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn from_service(service: DiscoveryService) -> Self {
		Self { service: Arc::new(service) }
	}
}
