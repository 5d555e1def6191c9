//! Validator hot-path benchmarks.
//!
//! Every inbound request pays one `validate` call before touching the
//! pool, so the cost per statement should stay in the microsecond range
//! even for long literal-heavy text.
//!
//! Run with: cargo bench --bench validate

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use sqlgate_guard::Validator;

const SHORT_SELECT: &str = "SELECT region, SUM(revenue) FROM sales_daily GROUP BY region";

const CTE_SELECT: &str = "WITH regional AS (
    SELECT region, SUM(revenue) AS revenue, SUM(orders) AS orders
    FROM sales_daily
    WHERE date >= '2024-01-01'
    GROUP BY region
), ranked AS (
    SELECT region, revenue, orders,
           RANK() OVER (ORDER BY revenue DESC) AS rnk
    FROM regional
)
SELECT region, revenue, orders FROM ranked WHERE rnk <= 5";

const REJECTED_WRITE: &str = "DELETE FROM sales_daily WHERE date < '2020-01-01'";

fn literal_heavy() -> String {
    let mut sql = String::from("SELECT category FROM sales_daily WHERE region IN (");
    for i in 0..200 {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&format!("'region with drop and delete words {i}'"));
    }
    sql.push(')');
    sql
}

fn bench_validate(c: &mut Criterion) {
    let validator = Validator::default();
    let long = literal_heavy();

    let mut group = c.benchmark_group("validate");

    group.throughput(Throughput::Bytes(SHORT_SELECT.len() as u64));
    group.bench_function("short_select", |b| {
        b.iter(|| validator.validate(black_box(SHORT_SELECT)));
    });

    group.throughput(Throughput::Bytes(CTE_SELECT.len() as u64));
    group.bench_function("cte_select", |b| {
        b.iter(|| validator.validate(black_box(CTE_SELECT)));
    });

    group.throughput(Throughput::Bytes(REJECTED_WRITE.len() as u64));
    group.bench_function("rejected_write", |b| {
        b.iter(|| validator.validate(black_box(REJECTED_WRITE)));
    });

    group.throughput(Throughput::Bytes(long.len() as u64));
    group.bench_function("literal_heavy", |b| {
        b.iter(|| validator.validate(black_box(&long)));
    });

    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
