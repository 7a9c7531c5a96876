//! Lead command handlers.

use leadkit_core::{Dashboard, EntityId, Lead, LeadFilter};
use tabled::Tabled;

use crate::cli::{GlobalOpts, LeadsArgs, LeadsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LeadRow {
    #[tabled(rename = "Captured")]
    captured: String,
    #[tabled(rename = "Form")]
    form: String,
    #[tabled(rename = "Website")]
    website: String,
    #[tabled(rename = "Data")]
    data: String,
}

impl From<&Lead> for LeadRow {
    fn from(l: &Lead) -> Self {
        let data = l
            .data
            .keys()
            .map(|k| format!("{k}={}", l.value(k).unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            captured: l.created_at.format("%Y-%m-%d %H:%M").to_string(),
            form: l
                .form_name
                .clone()
                .unwrap_or_else(|| l.form_id.to_string()),
            website: l.website_name.clone().unwrap_or_default(),
            data: util::truncate(&data, 70),
        }
    }
}

fn build_filter(
    form: Option<String>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<LeadFilter, CliError> {
    let filter = LeadFilter {
        form_id: form.map(EntityId::from),
        start_date: start.map(|s| util::parse_date("start", s)).transpose()?,
        end_date: end.map(|s| util::parse_date("end", s)).transpose()?,
    };

    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(CliError::Validation {
                field: "start".into(),
                reason: format!("{start} is after the end date {end}"),
            });
        }
    }
    Ok(filter)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: LeadsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LeadsCommand::List { form, start, end } => {
            let filter = build_filter(form, start.as_deref(), end.as_deref())?;
            let leads = dashboard.leads(&filter).await?;

            let empty = if filter == LeadFilter::default() {
                "No leads captured yet. Embed a form snippet to start collecting."
            } else {
                "No leads match these filters."
            };
            let out = output::render_list(
                global.output,
                leads.as_slice(),
                |l| LeadRow::from(l),
                |l| l.id.to_string(),
                empty,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
