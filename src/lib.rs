pub mod aggregator;
pub mod config;
pub mod features;
pub mod fetcher;
pub mod sources;
pub mod traits;
pub mod types;
pub mod writer;

pub use aggregator::{collect_features, load_offline_profile, FeatureCollector};
pub use config::{ApiCredentials, FifsRange, RuntimeConfig, TieBreak};
pub use features::{
    ExternalBlock, ExternalKnowledge, FeatureArtifacts, FounderBlock, FounderFeatures,
    PredictionBlock, PredictionFeatures,
};
pub use fetcher::CachedClient;
pub use traits::DataSource;
pub use types::{
    CollectorError, CompanyIdentity, Field, FounderRecord, MergedProfile, OfflineProfile,
    PartialPayload, ProvenanceEntry, Result, SourceFailure, SourceId,
};
pub use writer::write_artifacts;
