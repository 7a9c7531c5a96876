// ── Cache keys and key predicates ──

use std::collections::BTreeMap;
use std::fmt;

use strum::{Display, EnumIter, IntoStaticStr};

/// The resource a cached query returns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceKind {
    /// `GET /websites` (with embedded forms).
    Websites,
    /// `GET /forms/website/{websiteId}`.
    Forms,
    /// `GET /leads?formId&startDate&endDate`.
    Leads,
    /// `GET /leads/form/{formId}`.
    LeadsByForm,
    /// `GET /forms/{formId}/snippet`.
    Snippet,
    /// `GET /analytics/leads-per-form`.
    LeadsPerForm,
    /// `GET /analytics/leads-per-day?days=N`.
    LeadsPerDay,
}

/// Resource kind plus the filter parameters of the query.
///
/// Parameters are kept sorted, so two keys built from the same values in
/// a different order are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    kind: ResourceKind,
    params: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn with_params(kind: ResourceKind, params: BTreeMap<String, String>) -> Self {
        Self { kind, params }
    }

    #[must_use]
    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.params.insert(name.to_owned(), value.to_string());
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    // ── Well-known keys ──────────────────────────────────────────────

    pub fn websites() -> Self {
        Self::new(ResourceKind::Websites)
    }

    pub fn forms(website_id: impl fmt::Display) -> Self {
        Self::new(ResourceKind::Forms).param("websiteId", website_id)
    }

    pub fn leads_by_form(form_id: impl fmt::Display) -> Self {
        Self::new(ResourceKind::LeadsByForm).param("formId", form_id)
    }

    pub fn snippet(form_id: impl fmt::Display) -> Self {
        Self::new(ResourceKind::Snippet).param("formId", form_id)
    }

    pub fn leads_per_form() -> Self {
        Self::new(ResourceKind::LeadsPerForm)
    }

    pub fn leads_per_day(days: u32) -> Self {
        Self::new(ResourceKind::LeadsPerDay).param("days", days)
    }
}

impl fmt::Display for CacheKey {
    /// `leads{endDate=2024-06-30,formId=f1}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.params.is_empty() {
            f.write_str("{")?;
            for (i, (k, v)) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{k}={v}")?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}

/// Selects cache entries for invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPredicate {
    /// Exactly this key.
    Exact(CacheKey),
    /// Every key of this kind, whatever its parameters.
    Kind(ResourceKind),
    /// Keys of `kind` whose parameter `name` equals `value`.
    KindWithParam {
        kind: ResourceKind,
        name: &'static str,
        value: String,
    },
    /// Everything.
    All,
}

impl KeyPredicate {
    pub fn param(kind: ResourceKind, name: &'static str, value: impl fmt::Display) -> Self {
        Self::KindWithParam {
            kind,
            name,
            value: value.to_string(),
        }
    }

    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            Self::Exact(k) => k == key,
            Self::Kind(kind) => key.kind == *kind,
            Self::KindWithParam { kind, name, value } => {
                key.kind == *kind && key.get(name) == Some(value.as_str())
            }
            Self::All => true,
        }
    }
}

impl fmt::Display for KeyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(key) => write!(f, "{key}"),
            Self::Kind(kind) => write!(f, "{kind}{{*}}"),
            Self::KindWithParam { kind, name, value } => write!(f, "{kind}{{{name}={value},*}}"),
            Self::All => f.write_str("*"),
        }
    }
}
