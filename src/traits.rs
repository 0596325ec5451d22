use async_trait::async_trait;

use crate::types::{CompanyIdentity, PartialPayload, Result, SourceId};

/// Trait for pulling structured signals about a company from one provider.
///
/// Implementations map their provider's response schema onto the shared
/// [`PartialPayload`] vocabulary. A field the provider cannot answer is left
/// `Unknown`, never defaulted to a guess. Network errors surface as `Err`
/// and are absorbed at the aggregator boundary.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Stable identifier for this provider.
    fn source_id(&self) -> SourceId;

    /// Fetch whatever this provider knows about the company.
    async fn fetch(&self, identity: &CompanyIdentity) -> Result<PartialPayload>;
}
