//! Precedent matching and fault estimation for racing incidents.
//!
//! The corpus is loaded once and shared read-only; every query is a single
//! synchronous pass of scoring, ranking and blending.

pub mod corpus;
pub mod estimator;
pub mod kind;
pub mod matcher;
pub mod query;
pub mod scorer;

pub use corpus::{CorpusError, IncidentCorpus, IncidentRecord};
pub use estimator::{
    estimate_fault, BlendMode, ConfidenceTier, EstimationMethod, EstimatorConfig,
    FaultAssessment, FaultComponent, FaultEstimate, FaultEstimator, FaultSignal,
    PrecedentWeights, RuleBlendWeights, StewardRule,
};
pub use kind::{IncidentKind, UnknownIncidentKind};
pub use matcher::{MatchResult, PrecedentMatcher, DEFAULT_TOP_K};
pub use query::IncidentQuery;
pub use scorer::{query_terms, LexicalScorer};
