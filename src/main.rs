//! REST doc generator - Command-line tool documenting the REST endpoints of a project.
//!
//! Handler classes are found through their controller tag; every handler method
//! becomes one documented endpoint with its paths, verbs, parameters, access rights
//! and request/response payload shapes.
//!
//! # Usage
//!
//! ```bash
//! rest-doc-from-source [OPTIONS] [PROJECT_PATH]
//! ```
//!
//! # Examples
//!
//! Generate a Markdown page:
//! ```bash
//! rest-doc-from-source ./my-api-project -o doc/api.md
//! ```
//!
//! Generate JSON from a pre-built source model:
//! ```bash
//! rest-doc-from-source --model model.json -f json -o endpoints.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! rest-doc-from-source ./my-api-project -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use rest_doc_from_source::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag, then validate after the logger is up
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("REST doc generator starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;
    cli::run(args)?;

    info!("REST documentation generation completed successfully");

    Ok(())
}
