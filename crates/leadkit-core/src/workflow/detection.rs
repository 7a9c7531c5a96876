// ── Form detection workflow ──
//
//   Idle ──scan──▶ Scanning ──ok──▶ Reviewing ──promote──▶ Promoting ──▶ Reviewing
//                     │ err                                    (ok: candidate removed,
//                     ▼                                         err: candidate kept)
//                   Idle                      any ──close──▶ Closed (≡ Idle)

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use leadkit_api::ApiClient;
use leadkit_api::types::DetectFormsBody;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CoreError, WorkflowError};
use crate::model::{EntityId, Field, Form};
use crate::mutation::{Mutation, MutationCoordinator, MutationResult, validate_site_url};

/// Stable handle for a candidate within one workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CandidateId(u64);

impl CandidateId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for CandidateId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An unsaved form found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: CandidateId,
    /// 1-based position in the scan that produced it.
    pub position: usize,
    pub url: String,
    pub fields: Vec<Field>,
}

impl Candidate {
    /// Name used when the candidate is saved without one.
    pub fn default_name(&self) -> String {
        format!("Form {}", self.position)
    }
}

/// Observable state of a [`DetectionWorkflow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionState {
    Idle,
    Scanning {
        url: String,
    },
    Reviewing {
        url: String,
        candidates: Vec<Candidate>,
    },
    Promoting {
        url: String,
        candidates: Vec<Candidate>,
        candidate: CandidateId,
    },
    Closed,
}

impl DetectionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning { .. } => "scanning",
            Self::Reviewing { .. } => "reviewing",
            Self::Promoting { .. } => "promoting",
            Self::Closed => "closed",
        }
    }

    /// Candidates still awaiting review.
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Reviewing { candidates, .. } | Self::Promoting { candidates, .. } => candidates,
            _ => &[],
        }
    }
}

struct State {
    current: DetectionState,
    generation: u64,
    next_candidate: u64,
    last_error: Option<CoreError>,
}

/// Detect → review → promote flow for one website.
///
/// Cheaply cloneable; clones drive the same state, so one task can
/// [`close`](Self::close) while another awaits a scan.
#[derive(Clone)]
pub struct DetectionWorkflow {
    inner: Arc<Inner>,
}

struct Inner {
    website_id: EntityId,
    api: ApiClient,
    mutations: MutationCoordinator,
    state: Mutex<State>,
}

impl fmt::Debug for DetectionWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionWorkflow")
            .field("website_id", &self.inner.website_id)
            .field("state", &self.state().name())
            .finish_non_exhaustive()
    }
}

impl DetectionWorkflow {
    pub fn new(website_id: EntityId, api: ApiClient, mutations: MutationCoordinator) -> Self {
        Self {
            inner: Arc::new(Inner {
                website_id,
                api,
                mutations,
                state: Mutex::new(State {
                    current: DetectionState::Idle,
                    generation: 0,
                    next_candidate: 1,
                    last_error: None,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn website_id(&self) -> &EntityId {
        &self.inner.website_id
    }

    pub fn state(&self) -> DetectionState {
        self.lock().current.clone()
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        self.lock().current.candidates().to_vec()
    }

    /// Error from the last failed scan or promotion, cleared by the next
    /// attempt.
    pub fn last_error(&self) -> Option<CoreError> {
        self.lock().last_error.clone()
    }

    /// `true` while a scan or a promotion is pending.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.lock().current,
            DetectionState::Scanning { .. } | DetectionState::Promoting { .. }
        )
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Scan `url` for forms and move to `Reviewing` with the result.
    ///
    /// Allowed from `Idle`, `Closed` and `Reviewing` (a rescan replaces
    /// the candidates). On failure the workflow returns to `Idle` with no
    /// candidates.
    pub async fn scan(&self, url: &str) -> Result<Vec<Candidate>, CoreError> {
        validate_site_url(url)?;
        let url = url.trim().to_owned();

        let generation = {
            let mut state = self.lock();
            match state.current {
                DetectionState::Idle
                | DetectionState::Closed
                | DetectionState::Reviewing { .. } => {}
                ref other => {
                    return Err(WorkflowError::InvalidState {
                        operation: "scan",
                        state: other.name(),
                    }
                    .into());
                }
            }
            state.generation += 1;
            state.current = DetectionState::Scanning { url: url.clone() };
            state.last_error = None;
            state.generation
        };

        debug!(website = %self.inner.website_id, %url, "scanning for forms");
        let body = DetectFormsBody {
            website_id: self.inner.website_id.to_string(),
            url: url.clone(),
        };
        let result = self.inner.api.detect_forms(&body).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(%url, "dropping scan result for a closed workflow");
            return Err(WorkflowError::Superseded.into());
        }

        match result {
            Ok(envelope) => {
                let mut candidates = Vec::with_capacity(envelope.forms.len());
                for (index, form) in envelope.forms.into_iter().enumerate() {
                    let id = CandidateId(state.next_candidate);
                    state.next_candidate += 1;
                    candidates.push(Candidate {
                        id,
                        position: index + 1,
                        url: form.url,
                        fields: form.fields.into_iter().map(Field::from).collect(),
                    });
                }

                info!(%url, found = candidates.len(), "form detection finished");
                state.current = DetectionState::Reviewing {
                    url,
                    candidates: candidates.clone(),
                };
                Ok(candidates)
            }
            Err(e) => {
                let err = CoreError::from(e);
                state.current = DetectionState::Idle;
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Save candidate `id` as a form named `name` (default `Form {n}`).
    ///
    /// On success the candidate leaves the review list, so it cannot be
    /// promoted twice. On failure it stays and the workflow is back in
    /// `Reviewing`.
    pub async fn promote(&self, id: CandidateId, name: Option<String>) -> Result<Form, CoreError> {
        let (generation, candidate) = {
            let mut state = self.lock();
            let (url, candidates) = match &state.current {
                DetectionState::Reviewing { url, candidates } => (url.clone(), candidates.clone()),
                DetectionState::Promoting { candidate, .. } => {
                    return Err(WorkflowError::PromotionInProgress {
                        id: candidate.get(),
                    }
                    .into());
                }
                other => {
                    return Err(WorkflowError::InvalidState {
                        operation: "promote",
                        state: other.name(),
                    }
                    .into());
                }
            };

            let candidate = candidates
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or(WorkflowError::UnknownCandidate { id: id.get() })?;

            state.current = DetectionState::Promoting {
                url,
                candidates,
                candidate: id,
            };
            state.last_error = None;
            (state.generation, candidate)
        };

        let name = name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| candidate.default_name());

        let result = self
            .inner
            .mutations
            .execute(Mutation::CreateForm {
                website_id: self.inner.website_id.clone(),
                name,
                url: candidate.url.clone(),
                fields: candidate.fields.clone(),
            })
            .await
            .and_then(|r| match r {
                MutationResult::Form(form) => Ok(form),
                other => Err(CoreError::Decode {
                    message: format!("form creation returned {other:?}"),
                }),
            });

        let mut state = self.lock();
        if state.generation != generation {
            // The form was persisted; only the closed review list is left
            // untouched.
            debug!(candidate = %id, "promotion finished after close");
            return result;
        }

        let DetectionState::Promoting {
            url,
            mut candidates,
            ..
        } = std::mem::replace(&mut state.current, DetectionState::Idle)
        else {
            return result;
        };

        match &result {
            Ok(form) => {
                candidates.retain(|c| c.id != id);
                info!(candidate = %id, form = %form.id, "candidate promoted");
            }
            Err(e) => state.last_error = Some(e.clone()),
        }
        state.current = DetectionState::Reviewing { url, candidates };
        result
    }

    /// Discard every candidate and end the workflow. Pending requests are
    /// not cancelled, but their responses will not be applied.
    pub fn close(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.current = DetectionState::Closed;
        state.last_error = None;
        debug!(website = %self.inner.website_id, "detection workflow closed");
    }
}
