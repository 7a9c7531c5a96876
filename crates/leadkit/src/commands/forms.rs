//! Form command handlers, including the interactive detection review.

use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use leadkit_core::{Candidate, Dashboard, DetectionWorkflow, EntityId, Field, Form, Mutation};
use tabled::Tabled;

use crate::cli::{FormsArgs, FormsCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct FormRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Fields")]
    fields: String,
    #[tabled(rename = "Leads")]
    leads: u64,
}

impl From<&Form> for FormRow {
    fn from(f: &Form) -> Self {
        Self {
            id: f.id.to_string(),
            name: f.name.clone(),
            url: f.url.clone(),
            fields: field_summary(&f.fields),
            leads: f.lead_count,
        }
    }
}

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

impl From<&Candidate> for CandidateRow {
    fn from(c: &Candidate) -> Self {
        Self {
            position: c.position,
            url: c.url.clone(),
            fields: field_summary(&c.fields),
        }
    }
}

/// `email*, name, message` with `*` marking required inputs.
fn field_summary(fields: &[Field]) -> String {
    let names: Vec<String> = fields
        .iter()
        .map(|f| {
            if f.required {
                format!("{}*", f.display_label())
            } else {
                f.display_label().to_owned()
            }
        })
        .collect();
    util::truncate(&names.join(", "), 60)
}

fn candidate_label(c: &Candidate) -> String {
    format!(
        "{} - {} field(s): {}",
        c.default_name(),
        c.fields.len(),
        field_summary(&c.fields)
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: FormsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let paint = Painter::new(global);

    match args.command {
        FormsCommand::List { website } => {
            let forms = dashboard.forms(&EntityId::from(website.as_str())).await?;
            let out = output::render_list(
                global.output,
                forms.as_slice(),
                |f| FormRow::from(f),
                |f| f.id.to_string(),
                &format!("No forms yet. Detect some with: leadkit forms detect {website} <url>"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FormsCommand::Snippet { form } => {
            let snippet = dashboard.snippet(&EntityId::from(form)).await?;
            let out = output::render_single(
                global.output,
                snippet.as_str(),
                |s: &str| s.to_owned(),
                |s: &str| s.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FormsCommand::Delete { form, website } => {
            if !util::confirm(
                &format!("Delete form '{form}' and all leads it captured?"),
                global.yes,
            )? {
                return Ok(());
            }
            dashboard
                .execute(Mutation::DeleteForm {
                    id: EntityId::from(form),
                    website_id: website.map(EntityId::from),
                })
                .await?;
            output::status(global, &paint.success("✓ Form deleted"));
            Ok(())
        }

        FormsCommand::Detect {
            website,
            url,
            save_all,
        } => {
            // Unknown websites fail before the scan.
            let site = util::resolve_website(dashboard, &website).await?;
            let workflow = dashboard.detection(site.id.clone());

            let result = detect(&workflow, &url, save_all, global, paint).await;
            workflow.close();
            result
        }
    }
}

// ── Detection ───────────────────────────────────────────────────────

async fn detect(
    workflow: &DetectionWorkflow,
    url: &str,
    save_all: bool,
    global: &GlobalOpts,
    paint: Painter,
) -> Result<(), CliError> {
    let candidates = scan_with_spinner(workflow, url, global).await?;

    if candidates.is_empty() {
        output::status(global, &format!("No forms found on {url}"));
        return Ok(());
    }

    if save_all {
        return save_all_candidates(workflow, &candidates, global, paint).await;
    }

    if global.output != OutputFormat::Table || !std::io::stdin().is_terminal() {
        // Non-interactive: report what was found and leave it unsaved.
        let out = output::render_list(
            global.output,
            candidates.as_slice(),
            |c| CandidateRow::from(c),
            |c| c.position.to_string(),
            "",
        )?;
        output::print_output(&out, global.quiet);
        output::status(
            global,
            &paint.muted("Nothing saved. Re-run with --save-all to keep every candidate."),
        );
        return Ok(());
    }

    review(workflow, global, paint).await
}

async fn scan_with_spinner(
    workflow: &DetectionWorkflow,
    url: &str,
    global: &GlobalOpts,
) -> Result<Vec<Candidate>, CliError> {
    let spinner = if global.quiet || !std::io::stderr().is_terminal() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Scanning {url} for forms..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = workflow.scan(url).await;
    spinner.finish_and_clear();
    Ok(result?)
}

async fn save_all_candidates(
    workflow: &DetectionWorkflow,
    candidates: &[Candidate],
    global: &GlobalOpts,
    paint: Painter,
) -> Result<(), CliError> {
    let mut saved = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let form = workflow.promote(candidate.id, None).await?;
        output::status(
            global,
            &paint.success(&format!("✓ Saved {} ({})", form.name, form.id)),
        );
        saved.push(form);
    }

    if global.output != OutputFormat::Table {
        let out = output::render_list(
            global.output,
            saved.as_slice(),
            |f| FormRow::from(f),
            |f| f.id.to_string(),
            "",
        )?;
        output::print_output(&out, global.quiet);
    }
    Ok(())
}

/// Save candidates one at a time until the user is done or none are left.
async fn review(
    workflow: &DetectionWorkflow,
    global: &GlobalOpts,
    paint: Painter,
) -> Result<(), CliError> {
    loop {
        let candidates = workflow.candidates();
        if candidates.is_empty() {
            output::status(global, &paint.muted("All candidates saved."));
            return Ok(());
        }

        eprintln!("{}", paint.heading(&format!("{} candidate(s):", candidates.len())));
        let mut items: Vec<String> = candidates.iter().map(candidate_label).collect();
        items.push("Done".into());

        let choice = Select::new()
            .with_prompt("Save which form?")
            .items(&items)
            .default(0)
            .interact()
            .map_err(util::prompt_err)?;

        let Some(candidate) = candidates.get(choice) else {
            return Ok(());
        };

        let name: String = Input::new()
            .with_prompt("Form name")
            .default(candidate.default_name())
            .interact_text()
            .map_err(util::prompt_err)?;

        match workflow.promote(candidate.id, Some(name)).await {
            Ok(form) => eprintln!(
                "{} {}",
                paint.success("✓ Saved"),
                paint.accent(&format!("{} ({})", form.name, form.id))
            ),
            // The candidate stays in the list; let the user retry or stop.
            Err(e) => eprintln!("✗ {}", e.user_message()),
        }
    }
}
