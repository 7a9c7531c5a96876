// ── Dashboard facade ──
//
// One entry point for views: session, cached reads, mutations and
// workflows all share the same `ApiClient` and `ResourceCache`.

use std::sync::Arc;

use leadkit_api::types::{AuthResponse, LoginRequest, SignupRequest};
use leadkit_api::ApiClient;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::info;

use crate::analytics::AnalyticsSummary;
use crate::cache::{CacheChanges, CacheKey, ResourceCache, ResourceKind};
use crate::config::DashboardConfig;
use crate::convert::form_from_response;
use crate::error::CoreError;
use crate::model::{
    Credential, DailyLeads, EntityId, Form, Lead, LeadFilter, LeadsPerForm, User, Website,
};
use crate::mutation::{Mutation, MutationCoordinator, MutationKind, MutationResult};
use crate::session::SessionStore;
use crate::workflow::{DetectionWorkflow, WebsiteCreationWorkflow};

/// Entry point for views.
///
/// Cheaply cloneable via `Arc<DashboardInner>`; clones share the session,
/// the cache and the pending-mutation flags.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    session: Arc<SessionStore>,
    api: ApiClient,
    cache: ResourceCache,
    mutations: MutationCoordinator,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.session)
            .field("cache", &self.inner.cache)
            .finish()
    }
}

impl Dashboard {
    /// Build the HTTP client with `session` as its token source.
    pub fn new(config: DashboardConfig, session: Arc<SessionStore>) -> Result<Self, CoreError> {
        let api = ApiClient::new(config.api_url.as_str(), &config.transport(), session.clone())?;
        Ok(Self::with_client(config, session, api))
    }

    /// Use an already-built client. It should read its token from
    /// `session`.
    pub fn with_client(config: DashboardConfig, session: Arc<SessionStore>, api: ApiClient) -> Self {
        let cache = ResourceCache::with_policy(config.read_retries, config.max_age);
        let mutations = MutationCoordinator::new(api.clone(), cache.clone());

        Self {
            inner: Arc::new(DashboardInner {
                config,
                session,
                api,
                cache,
                mutations,
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.inner.cache
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.inner.mutations
    }

    // ── Session ──────────────────────────────────────────────────────

    pub fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.session.user()
    }

    /// Fail with a session error unless logged in.
    pub fn require_session(&self) -> Result<User, CoreError> {
        self.current_user().ok_or_else(|| CoreError::Session {
            message: "not logged in".into(),
        })
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, CoreError> {
        let resp = self
            .inner
            .api
            .login(&LoginRequest {
                email: email.trim().to_owned(),
                password: password.expose_secret().to_owned(),
            })
            .await?;
        self.start_session(resp)
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        name: Option<String>,
    ) -> Result<User, CoreError> {
        let resp = self
            .inner
            .api
            .signup(&SignupRequest {
                email: email.trim().to_owned(),
                password: password.expose_secret().to_owned(),
                name: name.filter(|n| !n.trim().is_empty()),
            })
            .await?;
        self.start_session(resp)
    }

    fn start_session(&self, resp: AuthResponse) -> Result<User, CoreError> {
        let user = User::from(resp.user);
        self.inner.session.set_credential(Credential {
            token: SecretString::from(resp.token),
            user: user.clone(),
        })?;
        // A new identity must never see the previous one's cached data.
        self.inner.cache.clear();
        Ok(user)
    }

    /// Clear the session and every cached entry.
    pub fn logout(&self) -> Result<(), CoreError> {
        let result = self.inner.session.clear();
        self.inner.cache.clear();
        info!("logged out");
        result
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// All websites with their embedded forms.
    pub async fn websites(&self) -> Result<Arc<Vec<Website>>, CoreError> {
        let api = self.inner.api.clone();
        self.inner
            .cache
            .read(CacheKey::websites(), move || {
                let api = api.clone();
                async move {
                    let resp = api.list_websites().await?;
                    Ok::<_, CoreError>(resp.websites.into_iter().map(Website::from).collect::<Vec<_>>())
                }
            })
            .await
    }

    /// Look a website up in the cached websites list.
    pub async fn website(&self, id: &EntityId) -> Result<Option<Website>, CoreError> {
        let sites = self.websites().await?;
        Ok(sites.iter().find(|w| &w.id == id).cloned())
    }

    /// Every form of every website, for lead filtering.
    pub async fn all_forms(&self) -> Result<Vec<Form>, CoreError> {
        let sites = self.websites().await?;
        Ok(sites.iter().flat_map(|w| w.forms.iter().cloned()).collect())
    }

    pub async fn forms(&self, website_id: &EntityId) -> Result<Arc<Vec<Form>>, CoreError> {
        let api = self.inner.api.clone();
        let website_id = website_id.clone();
        self.inner
            .cache
            .read(CacheKey::forms(&website_id), move || {
                let api = api.clone();
                let website_id = website_id.clone();
                async move {
                    let resp = api.list_forms_by_website(website_id.as_str()).await?;
                    Ok::<_, CoreError>(
                        resp.forms
                            .into_iter()
                            .map(|f| form_from_response(f, &website_id))
                            .collect::<Vec<_>>(),
                    )
                }
            })
            .await
    }

    /// Leads matching `filter`. Each distinct filter is its own entry.
    pub async fn leads(&self, filter: &LeadFilter) -> Result<Arc<Vec<Lead>>, CoreError> {
        let api = self.inner.api.clone();
        let query = filter.to_query();
        let key = CacheKey::with_params(ResourceKind::Leads, filter.params());
        self.inner
            .cache
            .read(key, move || {
                let api = api.clone();
                let query = query.clone();
                async move {
                    let resp = api.list_leads(&query).await?;
                    resp.leads
                        .into_iter()
                        .map(Lead::try_from)
                        .collect::<Result<Vec<_>, CoreError>>()
                }
            })
            .await
    }

    pub async fn leads_by_form(&self, form_id: &EntityId) -> Result<Arc<Vec<Lead>>, CoreError> {
        let api = self.inner.api.clone();
        let form_id = form_id.clone();
        self.inner
            .cache
            .read(CacheKey::leads_by_form(&form_id), move || {
                let api = api.clone();
                let form_id = form_id.clone();
                async move {
                    let resp = api.list_leads_by_form(form_id.as_str()).await?;
                    resp.leads
                        .into_iter()
                        .map(Lead::try_from)
                        .collect::<Result<Vec<_>, CoreError>>()
                }
            })
            .await
    }

    /// Embeddable tracking snippet for a form.
    pub async fn snippet(&self, form_id: &EntityId) -> Result<Arc<String>, CoreError> {
        let api = self.inner.api.clone();
        let form_id = form_id.clone();
        self.inner
            .cache
            .read(CacheKey::snippet(&form_id), move || {
                let api = api.clone();
                let form_id = form_id.clone();
                async move {
                    let resp = api.get_snippet(form_id.as_str()).await?;
                    Ok::<_, CoreError>(resp.snippet)
                }
            })
            .await
    }

    pub async fn leads_per_form(&self) -> Result<Arc<Vec<LeadsPerForm>>, CoreError> {
        let api = self.inner.api.clone();
        self.inner
            .cache
            .read(CacheKey::leads_per_form(), move || {
                let api = api.clone();
                async move {
                    let resp = api.leads_per_form().await?;
                    Ok::<_, CoreError>(
                        resp.data
                            .into_iter()
                            .map(LeadsPerForm::from)
                            .collect::<Vec<_>>(),
                    )
                }
            })
            .await
    }

    pub async fn leads_per_day(&self, days: u32) -> Result<Arc<Vec<DailyLeads>>, CoreError> {
        let api = self.inner.api.clone();
        self.inner
            .cache
            .read(CacheKey::leads_per_day(days), move || {
                let api = api.clone();
                async move {
                    let resp = api.leads_per_day(days).await?;
                    resp.data
                        .into_iter()
                        .map(DailyLeads::try_from)
                        .collect::<Result<Vec<_>, CoreError>>()
                }
            })
            .await
    }

    /// Both analytics reads, aggregated client-side.
    pub async fn analytics(&self, days: u32) -> Result<AnalyticsSummary, CoreError> {
        let (per_form, per_day) =
            futures_util::try_join!(self.leads_per_form(), self.leads_per_day(days))?;
        Ok(AnalyticsSummary::compute(&per_form, &per_day))
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub async fn execute(&self, mutation: Mutation) -> Result<MutationResult, CoreError> {
        self.inner.mutations.execute(mutation).await
    }

    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.inner.mutations.is_pending(kind)
    }

    // ── Workflows ────────────────────────────────────────────────────

    /// A fresh detection workflow for `website_id`, starting in `Idle`.
    pub fn detection(&self, website_id: EntityId) -> DetectionWorkflow {
        DetectionWorkflow::new(
            website_id,
            self.inner.api.clone(),
            self.inner.mutations.clone(),
        )
    }

    pub fn website_form(&self) -> WebsiteCreationWorkflow {
        WebsiteCreationWorkflow::new(self.inner.mutations.clone())
    }

    // ── Change notification ──────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.cache.subscribe()
    }

    pub fn changes(&self) -> CacheChanges {
        self.inner.cache.changes()
    }
}
