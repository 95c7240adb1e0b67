//! Institution registry backed by the upstream institutions API.

use anyhow::anyhow;
use async_trait::async_trait;
use filing_core::{FilingError, Institution, InstitutionRegistry};

pub struct HttpInstitutionRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInstitutionRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl InstitutionRegistry for HttpInstitutionRegistry {
    async fn get_institution(&self, lei: &str) -> Result<Option<Institution>, FilingError> {
        let url = format!("{}/institutions/{}", self.base_url.trim_end_matches('/'), lei);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FilingError::Internal(anyhow!(e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let institution = response
            .error_for_status()
            .map_err(|e| FilingError::Internal(anyhow!(e)))?
            .json::<Institution>()
            .await
            .map_err(|e| FilingError::Internal(anyhow!(e)))?;
        Ok(Some(institution))
    }
}
