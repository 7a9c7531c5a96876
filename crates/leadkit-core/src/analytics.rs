// ── Client-side analytics aggregation ──
//
// Pure functions over cached analytics payloads. No I/O; the same input
// always yields the same numbers.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{DailyLeads, EntityId, LeadsPerForm};

/// Buckets shown in the recent-days chart.
pub const RECENT_DAYS: usize = 10;

/// Minimum bar width (percent) so empty days stay visible.
pub const MIN_BAR_PERCENT: f64 = 10.0;

/// One form's share of all leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormShare {
    pub form_id: EntityId,
    pub form_name: String,
    pub count: u64,
    /// 0–100; 0 for every form when there are no leads at all.
    pub percentage: f64,
}

/// One bar of the recent-days chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayBar {
    pub date: NaiveDate,
    pub count: u64,
    /// Bar width in percent, relative to the busiest day, floored at
    /// [`MIN_BAR_PERCENT`].
    pub width_percent: f64,
}

/// Headline numbers for the analytics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_leads: u64,
    pub active_forms: usize,
    pub daily_average: f64,
    pub forms: Vec<FormShare>,
    pub recent_days: Vec<DayBar>,
}

impl AnalyticsSummary {
    pub fn compute(per_form: &[LeadsPerForm], per_day: &[DailyLeads]) -> Self {
        Self {
            total_leads: total_leads(per_form),
            active_forms: per_form.len(),
            daily_average: daily_average(per_day),
            forms: form_shares(per_form),
            recent_days: recent_days(per_day, RECENT_DAYS),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn ratio(part: u64, whole: u64) -> f64 {
    part as f64 / whole as f64
}

pub fn total_leads(per_form: &[LeadsPerForm]) -> u64 {
    per_form.iter().map(|f| f.count).sum()
}

pub fn form_shares(per_form: &[LeadsPerForm]) -> Vec<FormShare> {
    let total = total_leads(per_form);
    per_form
        .iter()
        .map(|f| FormShare {
            form_id: f.form_id.clone(),
            form_name: f.form_name.clone(),
            count: f.count,
            percentage: if total == 0 {
                0.0
            } else {
                ratio(f.count, total) * 100.0
            },
        })
        .collect()
}

/// Mean leads per day over the returned buckets; 0 when there are none.
pub fn daily_average(per_day: &[DailyLeads]) -> f64 {
    if per_day.is_empty() {
        return 0.0;
    }
    let sum: u64 = per_day.iter().map(|d| d.count).sum();
    ratio(sum, per_day.len() as u64)
}

/// The last `limit` buckets, newest first. Widths are scaled against the
/// busiest day of the whole series (at least 1).
pub fn recent_days(per_day: &[DailyLeads], limit: usize) -> Vec<DayBar> {
    let max = per_day.iter().map(|d| d.count).max().unwrap_or(0).max(1);
    let start = per_day.len().saturating_sub(limit);

    per_day[start..]
        .iter()
        .rev()
        .map(|d| DayBar {
            date: d.date,
            count: d.count,
            width_percent: (ratio(d.count, max) * 100.0).max(MIN_BAR_PERCENT),
        })
        .collect()
}
