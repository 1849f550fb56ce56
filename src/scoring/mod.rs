pub mod decay;
pub mod diversity;
pub mod engagement;
pub mod pipeline;
pub mod quality;
pub mod social;

pub use decay::{DecayCalculator, FreshnessConfig, GeoDecayConfig, VitalityConfig};
pub use diversity::{DiversityConfig, DiversityReranker};
pub use engagement::{EngagementScorer, EngagementWeights};
pub use pipeline::{RankingPipeline, ScoreBreakdown, ScoredCandidate};
pub use quality::{NegativeSignalConfig, PenalizedScore, QualityAndSignalAdjuster, QualityConfig};
pub use social::{SocialGraphConfig, SocialGraphScorer};
