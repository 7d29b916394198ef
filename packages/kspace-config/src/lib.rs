mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalog, Config, Fusion, Fuzzy, LlmProviderConfig, Pipeline, Providers, Service, Session,
	Vector, Vocabulary,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "catalog.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.entity_search_url.trim().is_empty() {
		return Err(Error::Validation {
			message: "catalog.entity_search_url must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.per_page == 0 {
		return Err(Error::Validation {
			message: "catalog.per_page must be greater than zero.".to_string(),
		});
	}
	if cfg.vector.enabled && cfg.vector.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "vector.api_key must be non-empty when vector.enabled is true.".to_string(),
		});
	}

	for (label, timeout_ms) in [
		("catalog.timeout_ms", cfg.catalog.timeout_ms),
		("vector.timeout_ms", cfg.vector.timeout_ms),
		("providers.understanding.timeout_ms", cfg.providers.understanding.timeout_ms),
		("providers.synthesis.timeout_ms", cfg.providers.synthesis.timeout_ms),
		("pipeline.backend_timeout_ms", cfg.pipeline.backend_timeout_ms),
		("pipeline.pipeline_timeout_ms", cfg.pipeline.pipeline_timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}
	for (label, key) in [
		("understanding", &cfg.providers.understanding.api_key),
		("synthesis", &cfg.providers.synthesis.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, weight) in [
		("fusion.vector_weight", cfg.fusion.vector_weight),
		("fusion.lexical_weight", cfg.fusion.lexical_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if !cfg.fuzzy.threshold.is_finite() || !(0.0..=1.0).contains(&cfg.fuzzy.threshold) {
		return Err(Error::Validation {
			message: "fuzzy.threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.fuzzy.max_matches == 0 {
		return Err(Error::Validation {
			message: "fuzzy.max_matches must be greater than zero.".to_string(),
		});
	}
	if cfg.fuzzy.pool_cap == 0 {
		return Err(Error::Validation {
			message: "fuzzy.pool_cap must be greater than zero.".to_string(),
		});
	}
	if cfg.session.page_size == 0 {
		return Err(Error::Validation {
			message: "session.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.session.history_chars == 0 {
		return Err(Error::Validation {
			message: "session.history_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.session.history_window > cfg.session.chat_history_turns {
		return Err(Error::Validation {
			message: "session.history_window must not exceed session.chat_history_turns."
				.to_string(),
		});
	}
	if cfg.pipeline.retrieval_pool == 0 {
		return Err(Error::Validation {
			message: "pipeline.retrieval_pool must be greater than zero.".to_string(),
		});
	}
	if cfg.pipeline.backend_timeout_ms > cfg.pipeline.pipeline_timeout_ms {
		return Err(Error::Validation {
			message: "pipeline.backend_timeout_ms must not exceed pipeline.pipeline_timeout_ms."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for base in [
		&mut cfg.catalog.api_base,
		&mut cfg.vector.api_base,
		&mut cfg.providers.understanding.api_base,
		&mut cfg.providers.synthesis.api_base,
	] {
		let trimmed = base.trim().trim_end_matches('/').to_string();

		*base = trimmed;
	}

	cfg.service.log_level = cfg.service.log_level.trim().to_string();
}
