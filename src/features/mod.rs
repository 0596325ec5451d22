pub mod external;
pub mod founder;
pub mod prediction;

pub use external::{ExternalBlock, ExternalKnowledge};
pub use founder::{FounderBlock, FounderFeatureRow, FounderFeatures};
pub use prediction::{PredictionBlock, PredictionFeatures, CATEGORICAL_UNKNOWN};

use serde::{Deserialize, Serialize};

/// The three derived records produced from one merged profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureArtifacts {
    pub prediction: PredictionFeatures,
    pub founder: FounderFeatures,
    pub external: ExternalKnowledge,
}
