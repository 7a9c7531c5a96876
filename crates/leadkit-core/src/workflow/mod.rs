// ── Workflow state machines ──
//
// Multi-step interactions layered on the cache and the mutation
// coordinator. Each workflow owns its ephemeral state; nothing here is
// ever written into the resource cache. State lives behind a short-lived
// `std::sync::Mutex` that is never held across an await, and a generation
// counter lets a late response from a closed workflow be dropped.

mod detection;
mod website;

pub use detection::{Candidate, CandidateId, DetectionState, DetectionWorkflow};
pub use website::{WebsiteCreationWorkflow, WebsiteDraft, WebsiteFormState};
