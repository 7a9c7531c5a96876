// leadkit-core: Session, resource cache, mutations and workflows between
// leadkit-api and consumers (CLI).

pub mod analytics;
pub mod cache;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod mutation;
pub mod session;
pub mod workflow;

// ── Primary re-exports ──────────────────────────────────────────────
pub use analytics::{AnalyticsSummary, DayBar, FormShare};
pub use cache::{CacheKey, Cached, KeyPredicate, ResourceCache, ResourceKind};
pub use config::{DEFAULT_API_URL, DashboardConfig};
pub use dashboard::Dashboard;
pub use error::{CoreError, WorkflowError};
pub use mutation::{Mutation, MutationCoordinator, MutationKind, MutationResult};
pub use session::{FileStorage, MemoryStorage, SessionStorage, SessionStore};
pub use workflow::{
    Candidate, CandidateId, DetectionState, DetectionWorkflow, WebsiteCreationWorkflow,
    WebsiteDraft, WebsiteFormState,
};

pub use model::{
    Credential, DailyLeads, EntityId, Field, Form, Lead, LeadFilter, LeadsPerForm, User, Website,
};

pub use leadkit_api::TlsMode;
