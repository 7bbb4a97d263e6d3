//! Seed bookable services and shipping bands from YAML.
//!
//! ```yaml
//! services:
//!   - name: Banho
//!     price: "60.00"
//!     duration_minutes: 60
//! shipping_rates:
//!   - cep_start: "01000000"
//!     cep_end: "09999999"
//!     fixed_fee: "15.00"
//!     per_kg_fee: "2.50"
//!     lead_time_days: 2
//!     description: Grande São Paulo
//! ```
//!
//! Services are upserted by name. A band whose CEP range already exists is
//! left alone, so the command can run repeatedly.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use petshop_storefront::db::services::ServiceInput;
use petshop_storefront::db::shipping::ShippingRateInput;
use petshop_storefront::db::{RepositoryError, ServiceRepository, ShippingRateRepository};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub services: Vec<ServiceInput>,
    #[serde(default)]
    pub shipping_rates: Vec<ShippingRateInput>,
}

impl SeedFile {
    /// Validate every entry and normalize band boundaries.
    ///
    /// Returns all problems at once, each prefixed with where it was found.
    fn validated(self) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();

        for (i, service) in self.services.iter().enumerate() {
            if let Err(e) = service.validate() {
                errors.push(format!("services[{i}] ({}): {e}", service.name));
            }
        }

        let mut shipping_rates = Vec::with_capacity(self.shipping_rates.len());
        for (i, rate) in self.shipping_rates.into_iter().enumerate() {
            match rate.normalized() {
                Ok(rate) => shipping_rates.push(rate),
                Err(e) => errors.push(format!("shipping_rates[{i}]: {e}")),
            }
        }

        if errors.is_empty() {
            Ok(Self {
                services: self.services,
                shipping_rates,
            })
        } else {
            Err(errors)
        }
    }
}

/// Load `file_path` and write its contents to the database.
pub async fn run(file_path: &str) -> Result<(), SeedError> {
    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_owned(),
            source,
        })?;

    // Validate before connecting to the database
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    let seed = seed.validated().map_err(|errors| {
        tracing::error!("Seed file validation failed:");
        for err in &errors {
            tracing::error!("  - {err}");
        }
        SeedError::Invalid(errors.len())
    })?;
    tracing::info!(
        services = seed.services.len(),
        shipping_rates = seed.shipping_rates.len(),
        "Seed file validated"
    );

    let pool = connect().await?;

    let services = ServiceRepository::new(&pool);
    for input in &seed.services {
        let service = services.upsert_by_name(input).await?;
        tracing::info!(id = %service.id, name = %service.name, "Service upserted");
    }

    let rates = ShippingRateRepository::new(&pool);
    let existing = rates.list().await?;
    let mut inserted = 0;
    for input in &seed.shipping_rates {
        let exists = existing
            .iter()
            .any(|r| r.cep_start == input.cep_start && r.cep_end == input.cep_end);
        if exists {
            tracing::info!(cep_start = %input.cep_start, cep_end = %input.cep_end, "Band exists, skipped");
            continue;
        }
        rates.create(input).await?;
        inserted += 1;
    }

    tracing::info!(inserted, skipped = seed.shipping_rates.len() - inserted, "Seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../seed/catalog.yaml");

    #[test]
    fn test_sample_file_is_valid() {
        let seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        let seed = seed.validated().unwrap();
        assert!(!seed.services.is_empty());
        assert!(seed.shipping_rates.iter().all(|r| r.cep_start.len() == 8));
    }

    #[test]
    fn test_all_errors_reported() {
        let yaml = r#"
services:
  - name: Tosa
    price: "-1"
    duration_minutes: 60
shipping_rates:
  - cep_start: "2"
    cep_end: "1"
    fixed_fee: "10"
    per_kg_fee: "1"
    lead_time_days: 3
    description: invertida
"#;
        let seed: SeedFile = serde_yaml::from_str(yaml).unwrap();
        let errors = seed.validated().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("services[0] (Tosa)"));
        assert!(errors[1].starts_with("shipping_rates[0]"));
    }

    #[test]
    fn test_unknown_sections_rejected() {
        assert!(serde_yaml::from_str::<SeedFile>("products: []").is_err());
    }
}
