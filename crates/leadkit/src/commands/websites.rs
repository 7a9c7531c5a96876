//! Website command handlers.

use leadkit_core::{Dashboard, EntityId, Mutation, MutationResult, Website, WebsiteDraft};
use tabled::Tabled;

use crate::cli::{GlobalOpts, WebsitesArgs, WebsitesCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct WebsiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Forms")]
    forms: usize,
    #[tabled(rename = "Leads")]
    leads: u64,
}

impl From<&Website> for WebsiteRow {
    fn from(w: &Website) -> Self {
        Self {
            id: w.id.to_string(),
            name: w.display_name().to_owned(),
            url: w.url.clone(),
            forms: w.forms.len(),
            leads: w.lead_count(),
        }
    }
}

fn detail(w: &Website) -> String {
    let mut lines = vec![
        format!("ID:     {}", w.id),
        format!("Name:   {}", w.name.as_deref().unwrap_or("-")),
        format!("URL:    {}", w.url),
        format!("Leads:  {}", w.lead_count()),
    ];
    if w.forms.is_empty() {
        lines.push("Forms:  none (run: leadkit forms detect <website> <url>)".into());
    } else {
        lines.push("Forms:".into());
        for f in &w.forms {
            lines.push(format!(
                "  {}  {}  ({} fields, {} leads)",
                f.id,
                f.name,
                f.fields.len(),
                f.lead_count
            ));
        }
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: WebsitesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let paint = Painter::new(global);

    match args.command {
        WebsitesCommand::List => {
            let sites = dashboard.websites().await?;
            let out = output::render_list(
                global.output,
                sites.as_slice(),
                |w| WebsiteRow::from(w),
                |w| w.id.to_string(),
                "No websites yet. Add one with: leadkit websites add <url>",
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WebsitesCommand::Get { website } => {
            let site = util::resolve_website(dashboard, &website).await?;
            let out = output::render_single(global.output, &site, detail, |w| w.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WebsitesCommand::Add { url, name } => {
            let form = dashboard.website_form();
            form.open();
            form.edit(WebsiteDraft {
                url,
                name: name.unwrap_or_default(),
            })?;

            let site = match form.submit().await {
                Ok(site) => site,
                Err(e) => {
                    form.cancel();
                    return Err(e.into());
                }
            };
            output::status(
                global,
                &paint.success(&format!("✓ Website {} added ({})", site.display_name(), site.id)),
            );
            if global.quiet {
                println!("{}", site.id);
            }
            Ok(())
        }

        WebsitesCommand::Update { website, url, name } => {
            let result = dashboard
                .execute(Mutation::UpdateWebsite {
                    id: EntityId::from(website),
                    url,
                    name,
                })
                .await?;
            if let MutationResult::Website(site) = result {
                output::status(
                    global,
                    &paint.success(&format!("✓ Website {} updated", site.display_name())),
                );
            }
            Ok(())
        }

        WebsitesCommand::Delete { website } => {
            if !util::confirm(
                &format!("Delete website '{website}' with all its forms and leads?"),
                global.yes,
            )? {
                return Ok(());
            }
            dashboard
                .execute(Mutation::DeleteWebsite {
                    id: EntityId::from(website),
                })
                .await?;
            output::status(global, &paint.success("✓ Website deleted"));
            Ok(())
        }
    }
}
