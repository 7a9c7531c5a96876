// ── Website creation workflow ──
//
//   Closed ──open──▶ Editing ──submit──▶ Submitting ──ok──▶ Closed
//                       ▲                    │ err
//                       └────────────────────┘ (draft kept, error shown)

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{CoreError, WorkflowError};
use crate::model::Website;
use crate::mutation::{Mutation, MutationCoordinator, MutationResult, validate_site_url};

const SUBMIT_FALLBACK: &str = "Failed to add website";

/// Values typed into the add-website form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebsiteDraft {
    pub url: String,
    /// Empty means no name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebsiteFormState {
    Closed,
    Editing {
        draft: WebsiteDraft,
        error: Option<String>,
    },
    Submitting {
        draft: WebsiteDraft,
    },
}

impl WebsiteFormState {
    fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Editing { .. } => "editing",
            Self::Submitting { .. } => "submitting",
        }
    }
}

struct State {
    current: WebsiteFormState,
    generation: u64,
}

/// Add-website dialog: draft, validation, submit, error display.
#[derive(Clone)]
pub struct WebsiteCreationWorkflow {
    mutations: MutationCoordinator,
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for WebsiteCreationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebsiteCreationWorkflow")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl WebsiteCreationWorkflow {
    pub fn new(mutations: MutationCoordinator) -> Self {
        Self {
            mutations,
            state: Arc::new(Mutex::new(State {
                current: WebsiteFormState::Closed,
                generation: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> WebsiteFormState {
        self.lock().current.clone()
    }

    /// Start editing an empty draft. Re-opening an open form keeps its
    /// draft.
    pub fn open(&self) {
        let mut state = self.lock();
        if state.current == WebsiteFormState::Closed {
            state.current = WebsiteFormState::Editing {
                draft: WebsiteDraft::default(),
                error: None,
            };
        }
    }

    /// Replace the draft while editing.
    pub fn edit(&self, draft: WebsiteDraft) -> Result<(), CoreError> {
        let mut state = self.lock();
        match &mut state.current {
            WebsiteFormState::Editing { draft: current, .. } => {
                *current = draft;
                Ok(())
            }
            other => Err(WorkflowError::InvalidState {
                operation: "edit",
                state: other.name(),
            }
            .into()),
        }
    }

    /// Submit the draft. Success closes the form; failure returns to
    /// `Editing` with the draft intact and the error message recorded.
    pub async fn submit(&self) -> Result<Website, CoreError> {
        let (generation, draft) = {
            let mut state = self.lock();
            let draft = match &mut state.current {
                WebsiteFormState::Editing { draft, error } => {
                    if let Err(e) = validate_site_url(&draft.url) {
                        *error = Some(e.user_message());
                        return Err(e);
                    }
                    draft.clone()
                }
                other => {
                    return Err(WorkflowError::InvalidState {
                        operation: "submit",
                        state: other.name(),
                    }
                    .into());
                }
            };
            state.current = WebsiteFormState::Submitting {
                draft: draft.clone(),
            };
            (state.generation, draft)
        };

        let result = self
            .mutations
            .execute(Mutation::CreateWebsite {
                url: draft.url.clone(),
                name: Some(draft.name.clone()),
            })
            .await
            .and_then(|r| match r {
                MutationResult::Website(site) => Ok(site),
                other => Err(CoreError::Decode {
                    message: format!("website creation returned {other:?}"),
                }),
            });

        let mut state = self.lock();
        if state.generation != generation {
            debug!("website submitted after the form was cancelled");
            return result;
        }

        state.current = match &result {
            Ok(_) => WebsiteFormState::Closed,
            Err(e) => WebsiteFormState::Editing {
                draft,
                error: Some(submit_error_message(e)),
            },
        };
        result
    }

    /// Close the form and discard the draft.
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.current = WebsiteFormState::Closed;
    }
}

/// The server's message when it gave one, a generic one otherwise.
fn submit_error_message(err: &CoreError) -> String {
    match err {
        CoreError::Api { message, .. } | CoreError::Validation { message }
            if !message.trim().is_empty() =>
        {
            message.clone()
        }
        _ => SUBMIT_FALLBACK.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_preferred() {
        let err = CoreError::Api {
            status: 409,
            message: "Website already exists".into(),
        };
        assert_eq!(submit_error_message(&err), "Website already exists");
    }

    #[test]
    fn transport_failure_uses_fallback() {
        let err = CoreError::Transport {
            message: "connection refused".into(),
        };
        assert_eq!(submit_error_message(&err), SUBMIT_FALLBACK);

        let blank = CoreError::Api {
            status: 500,
            message: String::new(),
        };
        assert_eq!(submit_error_message(&blank), SUBMIT_FALLBACK);
    }
}
