//! Groups weeks into fixed four-week month buckets for display.

use nutriplan_db::models::WeekPlan;

/// Weeks per month bucket.
pub const WEEKS_PER_MONTH: usize = 4;

/// Weeks `[(m-1)*4+1, m*4]` of month `m`, in week order.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBucket {
    pub month_number: u32,
    pub weeks: Vec<WeekPlan>,
}

impl MonthBucket {
    /// Month containing the given 1-based week.
    pub fn month_of(week_number: i32) -> u32 {
        let week = u32::try_from(week_number.max(1)).unwrap_or(1);
        week.div_ceil(WEEKS_PER_MONTH as u32)
    }
}

/// Bucket `weeks` by month.
///
/// Only months `1..=ceil(len / 4)` are considered, so a history whose
/// numbering runs past that range is truncated to it. Empty buckets are
/// omitted.
pub fn group_by_month(weeks: &[WeekPlan]) -> Vec<MonthBucket> {
    let total_months = weeks.len().div_ceil(WEEKS_PER_MONTH);

    (1..=total_months)
        .filter_map(|m| {
            let first = (m - 1) * WEEKS_PER_MONTH + 1;
            let last = m * WEEKS_PER_MONTH;
            let mut selected: Vec<WeekPlan> = weeks
                .iter()
                .filter(|w| {
                    usize::try_from(w.week_number).is_ok_and(|n| (first..=last).contains(&n))
                })
                .cloned()
                .collect();
            if selected.is_empty() {
                return None;
            }
            selected.sort_by_key(|w| w.week_number);
            Some(MonthBucket {
                month_number: m as u32,
                weeks: selected,
            })
        })
        .collect()
}
