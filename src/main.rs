use std::fs::File;
use std::process::ExitCode;
use std::{env, io::BufReader};

use tracing::error;
use tracing_subscriber::EnvFilter;

use holdings::loader::load_csv_stream;
use holdings::query_engine::QueryEngine;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args();
    if args.len() != 2 {
        let program = args.next().unwrap_or_else(|| "holdings".to_string());
        eprintln!("Usage: {} dataset.csv", program);
        return ExitCode::FAILURE;
    }

    let Some(filename) = args.nth(1) else {
        return ExitCode::FAILURE;
    };
    let file = match File::open(&filename) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {}: {}", filename, e);
            return ExitCode::FAILURE;
        }
    };

    let engine = QueryEngine::new(load_csv_stream(BufReader::new(file)));

    println!("holdings: {}", engine.holding_names_joined());
    println!("companies: {}", engine.companies_count());
    println!("users: {}", engine.users_count());
    println!("accounts: {}", engine.accounts_count());
    match engine.most_popular_account_type() {
        Ok(account_type) => println!("most popular account type: {}", account_type),
        Err(e) => println!("most popular account type: {}", e),
    }
    println!("richest woman: {}", engine.age_status(engine.richest_woman()));
    for name in engine.sorted_user_names_descending() {
        println!("{}", name);
    }
    print!("{}", engine);

    ExitCode::SUCCESS
}
