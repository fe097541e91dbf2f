//! Verdict generation on top of the fault engine.
//!
//! A request is validated into an [`IncidentContext`], scored by the
//! precedent engine, and rendered into a canned [`Verdict`]. A
//! [`NarrativeProvider`] may then rewrite the prose fields; the fault split
//! and confidence always come from the engine.

pub mod domain;
pub mod narrative;
pub mod router;
pub mod service;
pub mod tips;

#[cfg(test)]
mod tests;

pub use domain::{
    FaultEstimateResponse, FaultSplitView, IncidentContext, NarrativeSource, PrecedentView,
    SpotterAdvice, Verdict, VerdictRequest, VerdictRequestError, VerdictResponse,
};
pub use narrative::{
    request_narrative, retry_with_backoff, strip_code_blocks, NarrativeError, NarrativeProvider,
    NarrativeRequest, OfflineNarrator, VerdictPatch,
};
pub use router::verdict_router;
pub use service::VerdictService;
pub use tips::{TipBook, DEFAULT_TIP};
