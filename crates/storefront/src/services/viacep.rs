//! Postal-code lookup against the public `ViaCEP` service.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use petshop_core::Cep;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a CEP lookup.
#[derive(Debug, Error)]
pub enum CepLookupError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error: {0}")]
    Api(u16),

    /// The CEP is well formed but does not exist.
    #[error("CEP {0} not found")]
    NotFound(String),
}

/// Raw `ViaCEP` payload. Unknown CEPs come back as `{"erro": true}`.
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

impl ViaCepResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag == "true",
            _ => false,
        }
    }
}

/// Address fields for a CEP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CepAddress {
    pub cep: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// `ViaCEP` client.
#[derive(Clone)]
pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, CepLookupError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Look up the address of a CEP.
    ///
    /// # Errors
    ///
    /// Returns `CepLookupError::NotFound` when the service reports the CEP as
    /// unknown, otherwise HTTP or status errors.
    #[tracing::instrument(skip(self), fields(cep = %cep))]
    pub async fn lookup(&self, cep: &Cep) -> Result<CepAddress, CepLookupError> {
        let url = format!("{}/ws/{}/json/", self.base_url, cep.as_str());
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CepLookupError::Api(status.as_u16()));
        }
        let body: ViaCepResponse = response.json().await?;
        into_address(cep, body)
    }
}

fn into_address(cep: &Cep, body: ViaCepResponse) -> Result<CepAddress, CepLookupError> {
    if body.is_error() {
        return Err(CepLookupError::NotFound(cep.formatted()));
    }
    Ok(CepAddress {
        cep: cep.formatted(),
        street: body.logradouro,
        complement: body.complemento,
        neighborhood: body.bairro,
        city: body.localidade,
        state: body.uf,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_fields() {
        let cep = Cep::parse("01310-100").unwrap();
        let body: ViaCepResponse = serde_json::from_str(
            r#"{"cep":"01310-100","logradouro":"Avenida Paulista","complemento":"de 612 a 1510 - lado par",
                "bairro":"Bela Vista","localidade":"São Paulo","uf":"SP","ibge":"3550308"}"#,
        )
        .unwrap();
        let address = into_address(&cep, body).unwrap();
        assert_eq!(address.street, "Avenida Paulista");
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.state, "SP");
        assert_eq!(address.cep, "01310-100");
    }

    #[test]
    fn test_erro_flag_is_not_found() {
        let cep = Cep::parse("99999999").unwrap();
        let body: ViaCepResponse = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert!(matches!(into_address(&cep, body), Err(CepLookupError::NotFound(_))));

        let body: ViaCepResponse = serde_json::from_str(r#"{"erro": "true"}"#).unwrap();
        assert!(matches!(into_address(&cep, body), Err(CepLookupError::NotFound(_))));
    }
}
