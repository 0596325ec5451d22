use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::fetcher::CachedClient;
use crate::traits::DataSource;
use crate::types::{CompanyIdentity, PartialPayload, Result, SourceId};

const COMPANY_SEARCH_URL: &str = "https://api.opencorporates.com/v0.4/companies/search";

/// Corporate-registry adapter: incorporation facts for the best-matching
/// registered entity. Works without a token; a token only lifts rate limits.
pub struct OpenCorporatesSource {
    client: Arc<CachedClient>,
    api_token: Option<String>,
}

impl OpenCorporatesSource {
    pub fn new(client: Arc<CachedClient>, api_token: Option<String>) -> Self {
        Self { client, api_token }
    }
}

#[async_trait]
impl DataSource for OpenCorporatesSource {
    fn source_id(&self) -> SourceId {
        SourceId::OpenCorporates
    }

    async fn fetch(&self, identity: &CompanyIdentity) -> Result<PartialPayload> {
        let mut params = vec![("q", identity.name.clone())];
        if let Some(token) = &self.api_token {
            params.push(("api_token", token.clone()));
        }
        let data = self
            .client
            .get_json(COMPANY_SEARCH_URL, &params, &[])
            .await?;

        let mut payload = PartialPayload::default();
        let Some(company) = data["results"]["companies"][0].get("company") else {
            debug!(company = %identity.name, "no registry filing found");
            return Ok(payload);
        };

        payload.company.legal_name = company["name"].as_str().map(str::to_string).into();
        payload.compliance.jurisdiction =
            company["jurisdiction_code"].as_str().map(str::to_string).into();
        payload.compliance.incorporation_date =
            company["incorporation_date"].as_str().map(str::to_string).into();
        payload.compliance.company_number =
            company["company_number"].as_str().map(str::to_string).into();

        debug!(company = %identity.name, "mapped registry filing");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    #[test]
    fn payload_defaults_stay_unknown_without_filing() {
        let payload = PartialPayload::default();
        assert_eq!(payload.compliance.jurisdiction, Field::Unknown);
        assert_eq!(payload.company.legal_name, Field::Unknown);
    }
}
