use lgrid_core::build_layout;
use lgrid_domain::{column_name, ColumnKind, SheetFormat};

#[test]
fn weekly_february_layout_labels() {
    let period = ledger_grid::month(2025, 2).expect("valid month");
    let layout = build_layout(SheetFormat::Weekly, period, None).expect("layout");

    insta::assert_snapshot!(layout.labels().join("\n"), @r"
    Name
    Date
    Address
    Address 2
    A/C No.
    Adv
    Amount 1
    Amount
    Balance
    01/02
    02/02
    03/02
    04/02
    05/02
    06/02
    07/02
    Total wk 1
    08/02
    09/02
    10/02
    11/02
    12/02
    13/02
    14/02
    Total wk 2
    15/02
    16/02
    17/02
    18/02
    19/02
    20/02
    21/02
    Total wk 3
    22/02
    23/02
    24/02
    25/02
    26/02
    27/02
    28/02
    Total wk 4
    Col 42
    Col 43
    Col 44
    Col 45
    Col 46
    Col 47
    Col 48
    Col 49
    Col 50
    ");
}

#[test]
fn every_layout_has_fifty_columns_and_one_balance() {
    for format in [SheetFormat::Weekly, SheetFormat::Daily] {
        for month in 1..=12 {
            let period = ledger_grid::month(2024, month).expect("valid month");
            let layout = build_layout(format, period, None).expect("layout");
            assert_eq!(layout.len(), 50);
            let balances = layout
                .columns()
                .iter()
                .filter(|spec| spec.kind == ColumnKind::Balance)
                .count();
            assert_eq!(balances, 1);
            assert_eq!(
                layout.period_columns().count(),
                period.days_in_month() as usize
            );
            let expected_subtotals = match format {
                SheetFormat::Weekly => period.days_in_month() as usize / 7,
                SheetFormat::Daily => 0,
            };
            assert_eq!(layout.subtotal_columns().len(), expected_subtotals);
        }
    }
}

#[test]
fn column_letters_follow_spreadsheet_convention() {
    let names: Vec<String> = [0, 8, 25, 26, 49].into_iter().map(column_name).collect();
    assert_eq!(names, ["A", "I", "Z", "AA", "AX"]);
}
