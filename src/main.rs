// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod aggregator;
mod command;
mod coordinator;
mod error;
mod fetcher;
mod host;
mod model;
mod parser;
mod scheduler;
mod storage;
#[cfg(test)]
mod test_utils;

use std::{path::PathBuf, process};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use error::Result;
use log::error;

#[derive(Debug, Subcommand)]
enum Command {
    Scan(command::scan::Command),
    Query(command::query::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, storage: storage::File) -> Result<()> {
        match self {
            Self::Scan(cmd) => command::Command::execute(cmd, storage).await,
            Self::Query(cmd) => command::Command::execute(cmd, storage).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The key database to read and update.
    #[arg(long, short, env = "KEYDB_FILE", default_value = "keydb.json", value_hint = clap::ValueHint::FilePath)]
    file: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

async fn run(args: Args) -> Result<()> {
    let storage = storage::File::new(&args.file);
    command::Command::execute(args.command, storage).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("KEYDB_LOG", "warn")
        .write_style("KEYDB_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
