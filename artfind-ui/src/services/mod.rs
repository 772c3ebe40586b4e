//! Service layer: backend clients, match-reason parsing, and the session
//! coordinator

pub mod bulk_upload_client;
pub mod match_reason;
pub mod palette_client;
pub mod search_client;
pub mod search_coordinator;

pub use bulk_upload_client::{BulkUploadClient, UploadError, UploadOutcome};
pub use match_reason::{decompose, fallback_contributions, parse_match_reason, FeatureContribution};
pub use palette_client::{PaletteClient, PaletteError};
pub use search_client::{SearchClient, SearchError, SearchRequest};
pub use search_coordinator::SearchCoordinator;
