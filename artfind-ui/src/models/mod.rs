//! Domain models for artfind-ui

pub mod feature;
pub mod results;
pub mod session;
pub mod weights;

pub use feature::Feature;
pub use results::{normalize_results, SearchResult};
pub use session::{SearchSession, SessionState, StateTransition, SubjectImage};
pub use weights::{ActiveFilters, FeatureWeights, NormalizedWeights, WeightUpdate};
