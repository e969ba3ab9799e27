use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use lgrid_core::{
    build_layout, column_totals, DerivedColumnEngine, EditGate, MemoryDocumentStore,
    NumberLocale, PersistenceSync, SheetBackend,
};
use lgrid_domain::{Cell, GridModel, Layout, SheetFormat, SheetId, YearMonth, GRID_ROWS};

fn build_sample_sheet(format: SheetFormat) -> (Layout, GridModel) {
    let period = YearMonth::new(2025, 3).unwrap();
    let layout = build_layout(format, period, None).unwrap();
    let mut grid = GridModel::new(GRID_ROWS, layout.len());
    let periods: Vec<usize> = layout.period_columns().collect();

    for row in 0..GRID_ROWS {
        grid.set(row, 0, Cell::text(format!("Customer {row}"))).unwrap();
        grid.set(row, layout.amount1_column(), Cell::Number(5_000.0 + row as f64))
            .unwrap();
        for (idx, col) in periods.iter().enumerate() {
            let value = if (row + idx) % 9 == 0 {
                Cell::NoPayment
            } else {
                Cell::Number(50.0 + (idx % 7) as f64 * 10.0)
            };
            grid.set(row, *col, value).unwrap();
        }
    }
    (layout, grid)
}

fn bench_recompute(c: &mut Criterion) {
    let (layout, grid) = build_sample_sheet(SheetFormat::Weekly);
    let engine = DerivedColumnEngine::new(NumberLocale::default());

    c.bench_function("recompute_all_300_rows", |b| {
        b.iter_batched(
            || grid.clone(),
            |mut grid| {
                let gate = EditGate::new();
                let token = gate.try_enter().expect("idle gate");
                let rows = engine.recompute_all(&mut grid, &layout, &token).unwrap();
                black_box(rows);
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("column_totals_300_rows", |b| {
        b.iter(|| {
            let totals = column_totals(black_box(&grid), &layout, &NumberLocale::default());
            black_box(totals);
        })
    });
}

fn bench_flush(c: &mut Criterion) {
    let (layout, grid) = build_sample_sheet(SheetFormat::Daily);
    let sheet = SheetId::new(SheetFormat::Daily, YearMonth::new(2025, 3).unwrap());

    c.bench_function("flush_300_rows_to_memory", |b| {
        b.iter_batched(
            || {
                let backend = SheetBackend::Documents(Arc::new(MemoryDocumentStore::new()));
                PersistenceSync::new(backend, "bench", sheet, true)
            },
            |mut sync| {
                let report = sync.flush(&grid, &layout).expect("flush");
                black_box(report);
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_recompute, bench_flush);
criterion_main!(benches);
