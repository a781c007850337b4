extern crate clap;
extern crate rustyline;
use clap::{App, Arg};
use env_logger::Env;
use log::{error, info};
use serde::Deserialize;

use common::{CsvqlError, Relation};
use optimizer::Optimizer;
use queryexe::query::explain::explain;
use queryexe::{Executor, TranslateAndValidate};
use rustyline::error::ReadlineError;
use rustyline::Editor;
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Deserialize, Debug)]
struct CliConfig {
    data_dir: String,
    explain: bool,
}

/// Per-session state: where tables load from and what has been loaded.
struct Session {
    data_dir: PathBuf,
    explain: bool,
    tables: HashMap<String, Relation>,
}

impl Session {
    fn new(config: &CliConfig) -> Self {
        Self {
            data_dir: PathBuf::from(&config.data_dir),
            explain: config.explain,
            tables: HashMap::new(),
        }
    }
}

/// Runs one line of input. Returns false when the session should end.
fn process_input(session: &mut Session, line: &str) -> bool {
    if line.starts_with('\\') {
        return process_command(session, line);
    }
    match run_sql(session, line) {
        Ok(output) => print!("{}", output),
        Err(e) => error!("{}", e),
    }
    true
}

/// Handles the backslash commands.
fn process_command(session: &mut Session, line: &str) -> bool {
    match line.trim() {
        "\\quit" => {
            info!("Received Quit Command");
            false
        }
        "\\explain on" => {
            session.explain = true;
            true
        }
        "\\explain off" => {
            session.explain = false;
            true
        }
        "\\dt" => {
            for name in session.tables.keys() {
                println!("{}", name);
            }
            true
        }
        other => {
            error!("No action specified for command {}", other);
            true
        }
    }
}

/// Parses, optimizes, compiles and runs the statements on one line.
fn run_sql(session: &mut Session, sql: &str) -> Result<String, CsvqlError> {
    let dialect = GenericDialect {};
    let statements = Parser::parse_sql(&dialect, sql.to_string())
        .map_err(|e| CsvqlError::ValidationError(format!("{:?}", e)))?;
    let mut out = String::new();
    for statement in statements {
        let query = match statement {
            Statement::Query(q) => q,
            _ => {
                return Err(CsvqlError::ValidationError(String::from(
                    "Only select queries are supported",
                )));
            }
        };
        let plan =
            TranslateAndValidate::from_sql(&query, &session.data_dir, &mut session.tables)?;
        let optimized = Optimizer::new().optimize(&plan);
        let physical = Executor::compile(&optimized, &session.tables)?;
        if session.explain {
            out.push('\n');
            out.push_str(&explain(physical.as_ref()));
            out.push('\n');
        }
        let mut executor = Executor::new_ref();
        executor.configure_query(physical);
        let result = executor.execute()?;
        out.push_str(result.result());
    }
    Ok(out)
}

#[allow(unused_must_use)]
fn process_cli_input(session: &mut Session) {
    let mut rl = Editor::<()>::new();
    if rl.load_history("history.txt").is_err() {
        info!("No previous history.");
    }
    let prompt: &str = "[csvql]>>";
    let mut cont = true;
    while cont {
        let readline = rl.readline(prompt);
        match readline {
            Ok(line) => {
                if line.as_str() == "" {
                    continue;
                }
                rl.add_history_entry(line.as_str());
                cont = process_input(session, line.as_str());
            }
            Err(ReadlineError::Interrupted) => {
                info!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                info!("CTRL-D");
                break;
            }
            Err(err) => {
                error!("Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history("history.txt");
}

fn process_script_input(session: &mut Session, script: String) {
    for line in script.split(';') {
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        let clean_command = &command.replace("\n", " ");
        info!("Script clean command: {}", clean_command);
        if !process_input(session, clean_command) {
            break;
        }
    }
}

fn main() {
    // Configure log environment
    env_logger::from_env(Env::default().default_filter_or("warn")).init();

    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs SQL queries over csv files")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("data_dir")
                .short("d")
                .long("data-dir")
                .value_name("DIR")
                .default_value(".")
                .help("Directory the csv files live in, one <table>.csv per table")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("explain")
                .short("e")
                .long("explain")
                .help("Print the physical plan before each query's results")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("query")
                .short("q")
                .long("query")
                .value_name("SQL")
                .help("Runs a single query and exits")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("script")
                .short("s")
                .long("script")
                .value_name("SCRIPT")
                .help("Takes in a semicolon delimited file of SQL queries")
                .takes_value(true)
                .required(false),
        )
        .get_matches();

    let config = if let Some(c) = matches.value_of("config") {
        let contents = match fs::read_to_string(c) {
            Ok(contents) => contents,
            Err(e) => {
                error!("Failed to read config {}: {}", c, e);
                return;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to parse config {}: {}", c, e);
                return;
            }
        }
    } else {
        CliConfig {
            data_dir: matches.value_of("data_dir").unwrap_or(".").to_string(),
            explain: matches.is_present("explain"),
        }
    };

    info!("Starting csvql with config: {:?}", config);
    let mut session = Session::new(&config);

    if let Some(query) = matches.value_of("query") {
        process_input(&mut session, query);
        return;
    }

    if let Some(s) = matches.value_of("script") {
        match fs::read_to_string(s) {
            Ok(script) => process_script_input(&mut session, script),
            Err(e) => error!("Failed to read script {}: {}", s, e),
        }
        return;
    }

    process_cli_input(&mut session);
    info!("Terminated.");
}
