//! Purpose: Hold top-level CLI command dispatch for `geoquery`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: stdout carries only the command result; notices and logs go to stderr.
//! Invariants: Decode configuration is flags merged over the optional config file.

use super::*;

use clap::CommandFactory;
use geoquery::api::{DecodedQuery, decode_query, encode_query};
use geoquery::notice::config_overlap_notice;

use super::render::render_table;

pub(super) fn dispatch_command(command: Command, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "geoquery", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Decode {
            query,
            latlng,
            bounds,
            config,
            format,
        } => {
            let mut decode_config = match config {
                Some(path) => load_config(&path)?,
                None => DecodeConfig::new(),
            };
            decode_config.merge(DecodeConfig {
                latlng: latlng.into_iter().collect(),
                latlng_bounds: bounds.into_iter().collect(),
            });

            let overlapping = decode_config.overlapping_keys();
            if !overlapping.is_empty() {
                let notice = config_overlap_notice("decode", notice_time_now(), &overlapping);
                emit_notice(&notice, color_mode);
            }

            let input = read_input(query, "query", "`echo 'a=1' | geoquery decode`")?;
            let raw = query_component(&input)?;
            let decoded = decode_query(&raw, &decode_config);
            let nulls = decoded.iter().filter(|(_, value)| value.is_null()).count();
            tracing::debug!(keys = decoded.len(), nulls, "decode finished");

            match format {
                OutputFormat::Table => {
                    let use_color = color_mode.use_color(io::stdout().is_terminal());
                    let table = render_table(&decoded, use_color);
                    if !table.is_empty() {
                        println!("{table}");
                    }
                }
                OutputFormat::Json | OutputFormat::Pretty => {
                    let value = serde_json::to_value(&decoded).map_err(|err| {
                        Error::new(ErrorKind::Internal)
                            .with_message("failed to encode decoded query")
                            .with_source(err)
                    })?;
                    emit_message(&value, format == OutputFormat::Pretty);
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Encode { json, prefix } => {
            let input = read_input(json, "json", "`echo '{\"page\":1}' | geoquery encode`")?;
            let value = parse_inline_json(&input)?;
            let query = DecodedQuery::from_json(&value)?;
            let encoded = encode_query(&query);
            if prefix && !encoded.is_empty() {
                println!("?{encoded}");
            } else {
                println!("{encoded}");
            }
            Ok(RunOutcome::ok())
        }
    }
}
