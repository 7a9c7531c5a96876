// ── Mutation coordinator ──
//
// Every write goes through `MutationCoordinator`. Each `Mutation` variant
// declares the cache entries it makes stale; those are invalidated only
// after the backend confirms the write, and before the caller sees the
// result. A failed write leaves the cache untouched.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use leadkit_api::ApiClient;
use leadkit_api::types::{CreateFieldBody, CreateFormBody, CreateWebsiteBody, UpdateWebsiteBody};
use strum::{Display, EnumDiscriminants, EnumIter};
use tracing::{info, warn};
use url::Url;

use crate::cache::{CacheKey, KeyPredicate, ResourceCache, ResourceKind};
use crate::convert::form_from_response;
use crate::error::CoreError;
use crate::model::{EntityId, Field, Form, Website};

/// All write operations against the backend.
#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(MutationKind), derive(Hash, Display, EnumIter))]
#[strum_discriminants(strum(serialize_all = "kebab-case"))]
pub enum Mutation {
    // ── Websites ─────────────────────────────────────────────────────
    CreateWebsite {
        url: String,
        name: Option<String>,
    },
    UpdateWebsite {
        id: EntityId,
        url: Option<String>,
        name: Option<String>,
    },
    /// Cascades: the website's forms and their leads go with it.
    DeleteWebsite {
        id: EntityId,
    },

    // ── Forms ────────────────────────────────────────────────────────
    /// Persist a detected candidate as a form.
    CreateForm {
        website_id: EntityId,
        name: String,
        url: String,
        fields: Vec<Field>,
    },
    /// `website_id` narrows the forms-list invalidation when known.
    DeleteForm {
        id: EntityId,
        website_id: Option<EntityId>,
    },
}

/// Outcome of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResult {
    Ok,
    Website(Website),
    Form(Form),
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        MutationKind::from(self)
    }

    /// Cache entries made stale by this mutation once it succeeds.
    pub fn invalidates(&self) -> Vec<KeyPredicate> {
        use ResourceKind::{Forms, Leads, LeadsByForm, LeadsPerDay, LeadsPerForm, Snippet, Websites};

        match self {
            Self::CreateWebsite { .. } | Self::UpdateWebsite { .. } => {
                vec![KeyPredicate::Kind(Websites)]
            }
            Self::DeleteWebsite { id } => vec![
                KeyPredicate::Kind(Websites),
                KeyPredicate::param(Forms, "websiteId", id),
                KeyPredicate::Kind(Leads),
                KeyPredicate::Kind(LeadsByForm),
                KeyPredicate::Kind(Snippet),
                KeyPredicate::Kind(LeadsPerForm),
                KeyPredicate::Kind(LeadsPerDay),
            ],
            Self::CreateForm { website_id, .. } => vec![
                KeyPredicate::param(Forms, "websiteId", website_id),
                KeyPredicate::Kind(Websites),
                KeyPredicate::Kind(LeadsPerForm),
            ],
            Self::DeleteForm { id, website_id } => vec![
                website_id.as_ref().map_or(KeyPredicate::Kind(Forms), |w| {
                    KeyPredicate::param(Forms, "websiteId", w)
                }),
                KeyPredicate::Kind(Websites),
                KeyPredicate::Exact(CacheKey::snippet(id)),
                KeyPredicate::Exact(CacheKey::leads_by_form(id)),
                KeyPredicate::Kind(Leads),
                KeyPredicate::Kind(LeadsPerForm),
                KeyPredicate::Kind(LeadsPerDay),
            ],
        }
    }

    /// Reject input the backend would refuse, before any network call.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::CreateWebsite { url, .. } => validate_site_url(url),
            Self::UpdateWebsite { url, name, .. } => {
                if url.is_none() && name.is_none() {
                    return Err(CoreError::Validation {
                        message: "nothing to update: provide a url or a name".into(),
                    });
                }
                url.as_deref().map_or(Ok(()), validate_site_url)
            }
            Self::CreateForm { name, url, .. } => {
                if name.trim().is_empty() {
                    return Err(CoreError::Validation {
                        message: "form name is required".into(),
                    });
                }
                if url.trim().is_empty() {
                    return Err(CoreError::Validation {
                        message: "form url is required".into(),
                    });
                }
                Ok(())
            }
            Self::DeleteWebsite { id } | Self::DeleteForm { id, .. } => {
                if id.as_str().is_empty() {
                    return Err(CoreError::Validation {
                        message: "id is required".into(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// A website url must be an absolute http(s) url.
pub(crate) fn validate_site_url(raw: &str) -> Result<(), CoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoreError::Validation {
            message: "website url is required".into(),
        });
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        Ok(url) => Err(CoreError::Validation {
            message: format!("unsupported url scheme '{}': use http or https", url.scheme()),
        }),
        Err(e) => Err(CoreError::Validation {
            message: format!("invalid website url '{raw}': {e}"),
        }),
    }
}

// ── Coordinator ──────────────────────────────────────────────────────

/// Executes writes and applies their cache invalidation.
#[derive(Clone)]
pub struct MutationCoordinator {
    api: ApiClient,
    cache: ResourceCache,
    pending: Arc<DashMap<MutationKind, usize>>,
}

impl std::fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Decrements the pending count for its kind when dropped.
struct PendingGuard {
    pending: Arc<DashMap<MutationKind, usize>>,
    kind: MutationKind,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.remove_if_mut(&self.kind, |_, count| {
            *count -= 1;
            *count == 0
        });
    }
}

impl MutationCoordinator {
    pub fn new(api: ApiClient, cache: ResourceCache) -> Self {
        Self {
            api,
            cache,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// `true` while a mutation of `kind` is executing. Callers use this to
    /// suppress re-triggering an action that is already in flight.
    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.pending.contains_key(&kind)
    }

    pub fn any_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn begin(&self, kind: MutationKind) -> PendingGuard {
        *self.pending.entry(kind).or_insert(0) += 1;
        PendingGuard {
            pending: Arc::clone(&self.pending),
            kind,
        }
    }

    /// Run `write` and, only if it succeeds, invalidate `invalidates`.
    pub async fn mutate<T, Fut>(
        &self,
        kind: MutationKind,
        invalidates: &[KeyPredicate],
        write: Fut,
    ) -> Result<T, CoreError>
    where
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let _pending = self.begin(kind);

        match write.await {
            Ok(value) => {
                let touched = self.cache.invalidate_all(invalidates);
                info!(%kind, touched, "mutation succeeded");
                Ok(value)
            }
            Err(e) => {
                warn!(%kind, error = %e, "mutation failed; cache unchanged");
                Err(e)
            }
        }
    }

    /// Validate and execute `mutation` with its declared invalidations.
    pub async fn execute(&self, mutation: Mutation) -> Result<MutationResult, CoreError> {
        mutation.validate()?;
        let kind = mutation.kind();
        let invalidates = mutation.invalidates();

        self.mutate(kind, &invalidates, self.dispatch(mutation))
            .await
    }

    async fn dispatch(&self, mutation: Mutation) -> Result<MutationResult, CoreError> {
        match mutation {
            Mutation::CreateWebsite { url, name } => {
                let body = CreateWebsiteBody {
                    url: url.trim().to_owned(),
                    name: non_empty(name),
                };
                let site = self.api.create_website(&body).await?;
                Ok(MutationResult::Website(site.into()))
            }
            Mutation::UpdateWebsite { id, url, name } => {
                let body = UpdateWebsiteBody {
                    url: url.map(|u| u.trim().to_owned()),
                    name,
                };
                let site = self.api.update_website(id.as_str(), &body).await?;
                Ok(MutationResult::Website(site.into()))
            }
            Mutation::DeleteWebsite { id } => {
                self.api.delete_website(id.as_str()).await?;
                Ok(MutationResult::Ok)
            }
            Mutation::CreateForm {
                website_id,
                name,
                url,
                fields,
            } => {
                let body = CreateFormBody {
                    website_id: website_id.to_string(),
                    name,
                    url,
                    fields: fields.iter().map(CreateFieldBody::from).collect(),
                };
                let form = self.api.create_form(&body).await?;
                Ok(MutationResult::Form(form_from_response(form, &website_id)))
            }
            Mutation::DeleteForm { id, .. } => {
                self.api.delete_form(id.as_str()).await?;
                Ok(MutationResult::Ok)
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
