//! CLI commands and argument parsing.
//!
//! Built on [`clap`](https://docs.rs/clap). Commands support `table`,
//! `json` and `yaml` output via the `-f`/`--format` flag.
//!
//! - [`commands`] - Command definitions
//! - [`output`] - Output formatting and table rendering

pub mod commands;
pub mod output;
