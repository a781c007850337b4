use criterion::{criterion_group, criterion_main, Criterion};
use common::testutil::{gen_random_dir, write_csv};
use common::Relation;
use queryexe::{Executor, TranslateAndValidate};
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn parse(sql: &str) -> sqlparser::ast::Query {
    let dialect = GenericDialect {};
    let mut statements = Parser::parse_sql(&dialect, sql.to_string()).unwrap();
    match statements.remove(0) {
        Statement::Query(q) => *q,
        _ => panic!("expected a select query"),
    }
}

fn setup(rows: usize) -> PathBuf {
    let dir = gen_random_dir();
    let mut a = vec![String::from("id,v")];
    let mut b = vec![String::from("id,w")];
    for i in 0..rows {
        a.push(format!("{},a{}", i, i));
        b.push(format!("{},b{}", i % 100, i));
    }
    let a_lines: Vec<&str> = a.iter().map(|s| s.as_str()).collect();
    let b_lines: Vec<&str> = b.iter().map(|s| s.as_str()).collect();
    write_csv(&dir.join("benchA.csv"), &a_lines);
    write_csv(&dir.join("benchB.csv"), &b_lines);
    dir
}

fn run_query(sql: &str, dir: &Path, tables: &mut HashMap<String, Relation>) {
    let plan = TranslateAndValidate::from_sql(&parse(sql), dir, tables).unwrap();
    let physical = Executor::compile(&plan, tables).unwrap();
    let mut executor = Executor::new_ref();
    executor.configure_query(physical);
    executor.execute().unwrap();
}

fn bench_filter_scan(c: &mut Criterion) {
    let dir = setup(1000);
    let mut tables = HashMap::new();
    c.bench_function("filter_scan", |b| {
        b.iter(|| run_query("select v from benchA where id = 17", &dir, &mut tables))
    });
}

fn bench_sort_scan(c: &mut Criterion) {
    let dir = setup(1000);
    let mut tables = HashMap::new();
    c.bench_function("sort_scan", |b| {
        b.iter(|| run_query("select v from benchA order by v desc", &dir, &mut tables))
    });
}

fn bench_join_small(c: &mut Criterion) {
    let dir = setup(200);
    let mut tables = HashMap::new();
    c.bench_function("join_small", |b| {
        b.iter(|| {
            run_query(
                "select v, w from benchA inner join benchB on benchA.id = benchB.id",
                &dir,
                &mut tables,
            )
        })
    });
}

criterion_group!(
    benches,
    bench_filter_scan,
    bench_sort_scan,
    bench_join_small
);
criterion_main!(benches);
