use crate::Column;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a column list sharing one qualifier.
///
/// # Arguments
///
/// * `qualifier` - Qualifier for every column.
/// * `names` - Column names.
pub fn qualified_columns(qualifier: &str, names: &[&str]) -> Vec<Column> {
    names.iter().map(|n| Column::new(qualifier, n)).collect()
}

pub fn gen_rand_string(n: usize) -> String {
    thread_rng()
        .sample_iter(Alphanumeric)
        .take(n)
        .map(char::from)
        .collect()
}

/// A fresh path for a throwaway csv file under the system temp dir.
pub fn gen_random_csv_path() -> PathBuf {
    init();
    let mut dir = env::temp_dir();
    dir.push(String::from("csvql"));
    let _ = fs::create_dir_all(&dir);
    dir.push(format!("{}.csv", gen_rand_string(10)));
    dir
}

/// A fresh empty directory under the system temp dir.
pub fn gen_random_dir() -> PathBuf {
    init();
    let mut dir = env::temp_dir();
    dir.push(String::from("csvql"));
    dir.push(gen_rand_string(10));
    let _ = fs::create_dir_all(&dir);
    dir
}

/// Writes the given lines as a csv file, one record per line.
///
/// # Arguments
///
/// * `path` - Destination file.
/// * `lines` - Raw csv lines, header first.
pub fn write_csv(path: &Path, lines: &[&str]) {
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(path, body).expect("failed to write test csv");
}
