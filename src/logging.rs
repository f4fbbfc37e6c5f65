//! Tracing subscriber setup.
//!
//! Log output goes to stderr so command output on stdout stays clean.
//! `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose {
        "instruction_finder=debug,instr=debug"
    } else {
        "instruction_finder=info,instr=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}
