//! Turns a month and a format into the fixed 50-column sheet schema.

use lgrid_domain::{
    ColumnSpec, FixedField, Layout, SharedLayoutConfig, SheetFormat, YearMonth, DAYS_PER_WEEK,
    FIXED_COLUMN_COUNT, GRID_COLUMNS,
};
use tracing::warn;

use crate::CoreError;

const WEEKLY_FIXED_LABELS: [&str; FIXED_COLUMN_COUNT] = [
    "Name",
    "Date",
    "Address",
    "Address 2",
    "A/C No.",
    "Adv",
    "Amount 1",
    "Amount",
    "Balance",
];

const DAILY_FIXED_LABELS: [&str; FIXED_COLUMN_COUNT] = [
    "Name",
    "Date",
    "Address",
    "Mobile",
    "A/C No.",
    "Adv",
    "Amount 1",
    "Daily Amt",
    "Balance",
];

/// Built-in fixed-column labels for a format, balance last.
pub fn default_fixed_labels(format: SheetFormat) -> [&'static str; FIXED_COLUMN_COUNT] {
    match format {
        SheetFormat::Weekly => WEEKLY_FIXED_LABELS,
        SheetFormat::Daily => DAILY_FIXED_LABELS,
    }
}

/// Builds the column layout for `period`.
///
/// `shared` replaces the default fixed labels only when it is tagged with the
/// same format and carries one label per fixed column. Weekly sheets get a
/// `Total wk N` subtotal after every seventh day; trailing days that do not
/// complete a week have no subtotal.
pub fn build_layout(
    format: SheetFormat,
    period: YearMonth,
    shared: Option<&SharedLayoutConfig>,
) -> Result<Layout, CoreError> {
    let labels = fixed_labels(format, shared);
    let mut columns: Vec<ColumnSpec> = FixedField::ALL
        .iter()
        .map(|field| ColumnSpec::fixed(*field, labels[field.index()].clone()))
        .collect();
    columns.push(ColumnSpec::balance(labels[FIXED_COLUMN_COUNT - 1].clone()));

    let mut week_start = columns.len();
    for day in 0..period.days_in_month() {
        let label = format!("{:02}/{:02}", day + 1, period.month());
        columns.push(ColumnSpec::period(day, label));
        let completes_week = (day as usize + 1) % DAYS_PER_WEEK == 0;
        if format.has_subtotals() && completes_week {
            let week = (day as usize + 1) / DAYS_PER_WEEK;
            let end = columns.len() - 1;
            columns.push(ColumnSpec::subtotal(
                format!("Total wk {}", week),
                week_start,
                end,
            ));
            week_start = columns.len();
        }
    }

    columns.truncate(GRID_COLUMNS);
    while columns.len() < GRID_COLUMNS {
        let label = format!("Col {}", columns.len() + 1);
        columns.push(ColumnSpec::filler(label));
    }

    Ok(Layout::new(format, period, columns)?)
}

fn fixed_labels(format: SheetFormat, shared: Option<&SharedLayoutConfig>) -> Vec<String> {
    let defaults = default_fixed_labels(format);
    let Some(config) = shared else {
        return defaults.iter().map(|label| label.to_string()).collect();
    };
    if config.format != format {
        warn!(
            expected = %format,
            found = %config.format,
            "ignoring shared column config tagged for another format"
        );
        return defaults.iter().map(|label| label.to_string()).collect();
    }
    if config.fixed_cols.len() != FIXED_COLUMN_COUNT {
        warn!(
            count = config.fixed_cols.len(),
            "ignoring shared column config with wrong fixed column count"
        );
        return defaults.iter().map(|label| label.to_string()).collect();
    }
    config
        .fixed_cols
        .iter()
        .zip(defaults.iter())
        .map(|(label, default)| {
            if label.trim().is_empty() {
                default.to_string()
            } else {
                label.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use lgrid_domain::ColumnKind;

    use super::*;

    fn month(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn daily_layout_has_no_subtotals() {
        let layout = build_layout(SheetFormat::Daily, month(2025, 4), None).unwrap();
        assert_eq!(layout.len(), GRID_COLUMNS);
        assert!(layout.subtotal_columns().is_empty());
        assert_eq!(layout.period_columns().count(), 30);
        assert_eq!(layout.column(9).unwrap().label, "01/04");
        assert_eq!(layout.column(38).unwrap().label, "30/04");
        assert_eq!(layout.kind(39), Some(ColumnKind::Filler));
        assert_eq!(layout.column(39).unwrap().label, "Col 40");
        assert_eq!(layout.column(7).unwrap().label, "Daily Amt");
    }

    #[test]
    fn weekly_layout_inserts_subtotal_after_every_seventh_day() {
        let layout = build_layout(SheetFormat::Weekly, month(2025, 1), None).unwrap();
        assert_eq!(layout.subtotal_columns(), &[16, 24, 32, 40]);
        assert_eq!(layout.column(16).unwrap().subtotal_range, Some((9, 15)));
        assert_eq!(layout.column(24).unwrap().subtotal_range, Some((17, 23)));
        assert_eq!(layout.column(40).unwrap().label, "Total wk 4");
        // 31 days: days 29-31 dangle without a subtotal.
        assert_eq!(layout.kind(43), Some(ColumnKind::Period));
        assert_eq!(layout.subtotal_covering(42), None);
        assert_eq!(layout.kind(44), Some(ColumnKind::Filler));
        assert_eq!(layout.balance_column(), 8);
    }

    #[test]
    fn february_splits_into_exactly_four_weeks() {
        let layout = build_layout(SheetFormat::Weekly, month(2025, 2), None).unwrap();
        assert_eq!(layout.subtotal_columns().len(), 4);
        assert_eq!(layout.period_columns().count(), 28);
        assert_eq!(layout.kind(41), Some(ColumnKind::Filler));
    }

    #[test]
    fn shared_config_overrides_labels_for_matching_format_only() {
        let mut labels: Vec<String> = default_fixed_labels(SheetFormat::Weekly)
            .iter()
            .map(|label| label.to_string())
            .collect();
        labels[0] = "Customer".into();
        labels[3] = "".into();
        let shared = SharedLayoutConfig {
            fixed_cols: labels,
            format: SheetFormat::Weekly,
            updated_at: Utc::now(),
            updated_by: "primary".into(),
        };

        let weekly = build_layout(SheetFormat::Weekly, month(2025, 3), Some(&shared)).unwrap();
        assert_eq!(weekly.column(0).unwrap().label, "Customer");
        assert_eq!(weekly.column(3).unwrap().label, "Address 2");

        let daily = build_layout(SheetFormat::Daily, month(2025, 3), Some(&shared)).unwrap();
        assert_eq!(daily.column(0).unwrap().label, "Name");
    }
}
