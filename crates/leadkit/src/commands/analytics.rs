//! Analytics command handler.

use std::fmt::Write;

use leadkit_core::{AnalyticsSummary, Dashboard, DayBar, FormShare};
use tabled::Tabled;

use crate::cli::{AnalyticsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};

/// Character columns of a 100% bar.
const BAR_COLUMNS: f64 = 40.0;

#[derive(Tabled)]
struct ShareRow {
    #[tabled(rename = "Form")]
    form: String,
    #[tabled(rename = "Leads")]
    leads: u64,
    #[tabled(rename = "Share")]
    share: String,
}

impl From<&FormShare> for ShareRow {
    fn from(s: &FormShare) -> Self {
        Self {
            form: s.form_name.clone(),
            leads: s.count,
            share: format!("{:.1}%", s.percentage),
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn bar(day: &DayBar) -> String {
    let columns = (day.width_percent / 100.0 * BAR_COLUMNS).round().max(1.0) as usize;
    "█".repeat(columns)
}

fn render_summary(summary: &AnalyticsSummary, paint: Painter) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", paint.heading("Overview"));
    let _ = writeln!(out, "  Total leads:   {}", paint.accent(&summary.total_leads.to_string()));
    let _ = writeln!(out, "  Active forms:  {}", summary.active_forms);
    let _ = writeln!(out, "  Daily average: {:.1}", summary.daily_average);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", paint.heading("Leads by form"));
    if summary.forms.is_empty() {
        let _ = writeln!(out, "  {}", paint.muted("No form data yet."));
    } else {
        let rows: Vec<ShareRow> = summary.forms.iter().map(ShareRow::from).collect();
        let _ = writeln!(out, "{}", output::render_table(&rows));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", paint.heading("Recent days"));
    if summary.recent_days.is_empty() {
        let _ = write!(out, "  {}", paint.muted("No daily data yet."));
    } else {
        let lines: Vec<String> = summary
            .recent_days
            .iter()
            .map(|d| format!("  {}  {} {}", d.date, paint.accent(&bar(d)), d.count))
            .collect();
        out.push_str(&lines.join("\n"));
    }

    out
}

pub async fn handle(
    dashboard: &Dashboard,
    args: &AnalyticsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let paint = Painter::new(global);
    let summary = dashboard.analytics(args.days).await?;

    let out = output::render_single(
        global.output,
        &summary,
        |s| render_summary(s, paint),
        |s| s.total_leads.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(width_percent: f64) -> DayBar {
        DayBar {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            count: 1,
            width_percent,
        }
    }

    #[test]
    fn bars_scale_to_columns() {
        assert_eq!(bar(&day(100.0)).chars().count(), 40);
        assert_eq!(bar(&day(10.0)).chars().count(), 4);
    }

    #[test]
    fn empty_summary_renders_empty_states() {
        let summary = AnalyticsSummary::compute(&[], &[]);
        let text = render_summary(&summary, Painter::plain());
        assert!(text.contains("Total leads:   0"));
        assert!(text.contains("No form data yet."));
        assert!(text.contains("No daily data yet."));
    }
}
