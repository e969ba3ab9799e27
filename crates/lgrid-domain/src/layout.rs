//! Column schema for a monthly ledger sheet.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of account rows in every sheet.
pub const GRID_ROWS: usize = 300;
/// Number of columns in every sheet; layouts are padded or truncated to this width.
pub const GRID_COLUMNS: usize = 50;
/// Fixed identity/amount columns at the start of every row, balance included.
pub const FIXED_COLUMN_COUNT: usize = 9;
/// Period columns grouped under one subtotal in the weekly format.
pub const DAYS_PER_WEEK: usize = 7;

/// Layout mode of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    Weekly,
    Daily,
}

impl SheetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetFormat::Weekly => "weekly",
            SheetFormat::Daily => "daily",
        }
    }

    /// Account-type prefix used in sheet identifiers.
    pub fn account_type(&self) -> &'static str {
        match self {
            SheetFormat::Weekly => "weekline",
            SheetFormat::Daily => "dailyline",
        }
    }

    pub fn has_subtotals(&self) -> bool {
        matches!(self, SheetFormat::Weekly)
    }
}

impl Default for SheetFormat {
    fn default() -> Self {
        SheetFormat::Weekly
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raised when a format name is neither `weekly` nor `daily`.
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sheet format `{}`", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for SheetFormat {
    type Err = UnknownFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" | "weekline" => Ok(SheetFormat::Weekly),
            "daily" | "dailyline" => Ok(SheetFormat::Daily),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Calendar month a sheet covers. `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Builds a month from a 0-based month index (January = 0).
    pub fn from_zero_based(year: i32, month0: u32) -> Option<Self> {
        Self::new(year, month0.checked_add(1)?)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn month0(&self) -> u32 {
        self.month - 1
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(&self) -> u32 {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .map_or(31, |last| last.day())
    }
}

/// Identity and amount fields at the start of every row, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixedField {
    Name,
    Date,
    Address,
    AddressLine2,
    AccountNumber,
    Advance,
    /// Principal amount the balance is computed from.
    Amount1,
    /// Secondary amount, the usual instalment.
    Amount,
}

impl FixedField {
    pub const ALL: [FixedField; 8] = [
        FixedField::Name,
        FixedField::Date,
        FixedField::Address,
        FixedField::AddressLine2,
        FixedField::AccountNumber,
        FixedField::Advance,
        FixedField::Amount1,
        FixedField::Amount,
    ];

    pub fn index(&self) -> usize {
        match self {
            FixedField::Name => 0,
            FixedField::Date => 1,
            FixedField::Address => 2,
            FixedField::AddressLine2 => 3,
            FixedField::AccountNumber => 4,
            FixedField::Advance => 5,
            FixedField::Amount1 => 6,
            FixedField::Amount => 7,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FixedField::Amount1 | FixedField::Amount)
    }
}

/// Role a column plays in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Fixed(FixedField),
    Period,
    Subtotal,
    Balance,
    Filler,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub label: String,
    /// 0-based day of month for period columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_index: Option<u32>,
    /// Inclusive `(start, end)` column range summed by a subtotal column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal_range: Option<(usize, usize)>,
}

impl ColumnSpec {
    pub fn fixed(field: FixedField, label: impl Into<String>) -> Self {
        Self::plain(ColumnKind::Fixed(field), label)
    }

    pub fn balance(label: impl Into<String>) -> Self {
        Self::plain(ColumnKind::Balance, label)
    }

    pub fn filler(label: impl Into<String>) -> Self {
        Self::plain(ColumnKind::Filler, label)
    }

    pub fn period(day_index: u32, label: impl Into<String>) -> Self {
        Self {
            period_index: Some(day_index),
            ..Self::plain(ColumnKind::Period, label)
        }
    }

    pub fn subtotal(label: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            subtotal_range: Some((start, end)),
            ..Self::plain(ColumnKind::Subtotal, label)
        }
    }

    fn plain(kind: ColumnKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            period_index: None,
            subtotal_range: None,
        }
    }

    /// Derived columns are written by the recompute engine, never by users.
    pub fn is_derived(&self) -> bool {
        matches!(self.kind, ColumnKind::Subtotal | ColumnKind::Balance)
    }

    /// Whether user input in this column is interpreted as an amount.
    pub fn is_numeric(&self) -> bool {
        match self.kind {
            ColumnKind::Fixed(field) => field.is_numeric(),
            ColumnKind::Period | ColumnKind::Subtotal | ColumnKind::Balance => true,
            ColumnKind::Filler => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Structural problems detected when assembling a [`Layout`].
pub enum LayoutError {
    BalanceCount(usize),
    SubtotalRange { column: usize },
    MissingFixedField(FixedField),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::BalanceCount(count) => {
                write!(f, "layout needs exactly one balance column, found {}", count)
            }
            LayoutError::SubtotalRange { column } => {
                write!(f, "subtotal column {} has an invalid period range", column)
            }
            LayoutError::MissingFixedField(field) => {
                write!(f, "layout is missing fixed field {:?}", field)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Ordered, immutable column schema of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    format: SheetFormat,
    period: YearMonth,
    columns: Vec<ColumnSpec>,
    balance: usize,
    subtotals: Vec<usize>,
}

impl Layout {
    pub fn new(
        format: SheetFormat,
        period: YearMonth,
        columns: Vec<ColumnSpec>,
    ) -> Result<Self, LayoutError> {
        let balances: Vec<usize> = positions(&columns, |kind| kind == ColumnKind::Balance);
        if balances.len() != 1 {
            return Err(LayoutError::BalanceCount(balances.len()));
        }
        for field in FixedField::ALL {
            let present = columns.get(field.index()).map(|spec| spec.kind)
                == Some(ColumnKind::Fixed(field));
            if !present {
                return Err(LayoutError::MissingFixedField(field));
            }
        }
        let subtotals = positions(&columns, |kind| kind == ColumnKind::Subtotal);
        for &column in &subtotals {
            let valid = match columns[column].subtotal_range {
                Some((start, end)) => {
                    start <= end
                        && end < columns.len()
                        && columns[start..=end]
                            .iter()
                            .all(|spec| spec.kind == ColumnKind::Period)
                }
                None => false,
            };
            if !valid {
                return Err(LayoutError::SubtotalRange { column });
            }
        }
        Ok(Self {
            format,
            period,
            balance: balances[0],
            columns,
            subtotals,
        })
    }

    pub fn format(&self) -> SheetFormat {
        self.format
    }

    pub fn period(&self) -> YearMonth {
        self.period
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&ColumnSpec> {
        self.columns.get(index)
    }

    pub fn kind(&self, index: usize) -> Option<ColumnKind> {
        self.columns.get(index).map(|spec| spec.kind)
    }

    pub fn balance_column(&self) -> usize {
        self.balance
    }

    pub fn fixed_column(&self, field: FixedField) -> usize {
        field.index()
    }

    /// Principal amount column the balance is derived from.
    pub fn amount1_column(&self) -> usize {
        FixedField::Amount1.index()
    }

    /// Secondary amount column used as the fallback suggestion.
    pub fn amount_column(&self) -> usize {
        FixedField::Amount.index()
    }

    pub fn is_period(&self, index: usize) -> bool {
        self.kind(index) == Some(ColumnKind::Period)
    }

    pub fn subtotal_columns(&self) -> &[usize] {
        &self.subtotals
    }

    /// Returns the subtotal column whose range covers `column`, if any.
    pub fn subtotal_covering(&self, column: usize) -> Option<(usize, (usize, usize))> {
        self.subtotals.iter().find_map(|&index| {
            let range = self.columns[index].subtotal_range?;
            (range.0 <= column && column <= range.1).then_some((index, range))
        })
    }

    pub fn period_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.kind == ColumnKind::Period)
            .map(|(index, _)| index)
    }

    pub fn first_period_column(&self) -> Option<usize> {
        self.period_columns().next()
    }

    /// Labels of the fixed columns, balance included, in column order.
    pub fn fixed_labels(&self) -> Vec<String> {
        self.columns
            .iter()
            .take(FIXED_COLUMN_COUNT)
            .map(|spec| spec.label.clone())
            .collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|spec| spec.label.as_str()).collect()
    }
}

fn positions(columns: &[ColumnSpec], predicate: impl Fn(ColumnKind) -> bool) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, spec)| predicate(spec.kind))
        .map(|(index, _)| index)
        .collect()
}

/// Spreadsheet-style column name: `A`, `B`, ..., `Z`, `AA`, `AB`, ...
pub fn column_name(index: usize) -> String {
    let mut name = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        name.push(b'A' + rem as u8);
        remaining = (remaining - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_in_month_handles_leap_years_and_december() {
        assert_eq!(YearMonth::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(YearMonth::new(2025, 2).unwrap().days_in_month(), 28);
        assert_eq!(YearMonth::new(2025, 12).unwrap().days_in_month(), 31);
        assert_eq!(YearMonth::new(2025, 4).unwrap().days_in_month(), 30);
        assert_eq!(YearMonth::new(2100, 2).unwrap().days_in_month(), 28);
        assert_eq!(YearMonth::from_zero_based(2025, 3).unwrap().month(), 4);
        assert!(YearMonth::new(2025, 13).is_none());
    }

    #[test]
    fn column_names_roll_over_after_z() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(49), "AX");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn format_parses_account_type_aliases() {
        assert_eq!("weekline".parse::<SheetFormat>(), Ok(SheetFormat::Weekly));
        assert_eq!(" Daily ".parse::<SheetFormat>(), Ok(SheetFormat::Daily));
        assert!("monthly".parse::<SheetFormat>().is_err());
    }

    #[test]
    fn layout_rejects_missing_balance() {
        let period = YearMonth::new(2025, 1).unwrap();
        let mut columns: Vec<ColumnSpec> = FixedField::ALL
            .iter()
            .map(|field| ColumnSpec::fixed(*field, format!("{:?}", field)))
            .collect();
        columns.push(ColumnSpec::filler("Col 9"));
        let err = Layout::new(SheetFormat::Daily, period, columns).unwrap_err();
        assert_eq!(err, LayoutError::BalanceCount(0));
    }
}
