//! Purpose: `geoquery` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits results on stdout.
//! Invariants: `decode` emits a JSON object (or a table) on stdout; `encode` emits one line.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Logging goes to stderr only and defaults to `warn` (override with RUST_LOG).
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;
use url::Url;

mod command_dispatch;
mod render;

use geoquery::api::{DecodeConfig, Error, ErrorKind, to_exit_code};
use geoquery::notice::{Notice, notice_json};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command, color_mode).map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "geoquery",
    version,
    about = "Decode query strings into typed values, including map points and bounds",
    long_about = None,
    after_help = r#"EXAMPLES
  $ geoquery decode 'open=true&page=2&q=ramen'
  {"open":true,"page":2,"q":"ramen"}
  $ geoquery decode '?origin=37.77,-122.41' --latlng origin
  {"origin":{"lat":37.77,"lng":-122.41}}
  $ geoquery decode 'https://example.com/map?view=1,2,3,4' --bounds view --format table
  $ geoquery encode '{"page": 3, "origin": {"lat": 1.5, "lng": 2}}'
  origin=1.5%2C2&page=3

LOGGING
  Set RUST_LOG=debug to see which geographic values failed to decode."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        global = true,
        help = "Colorize terminal output"
    )]
    color: ColorMode,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
    Table,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Decode a query string (or URL) into typed JSON",
        after_help = r#"Coercion order per key:
  --latlng key   -> {"lat","lng"} or null
  --bounds key   -> {"northEast","southWest"} or null
  true / false   -> boolean
  canonical number (42, 3.14, 1e+21) -> number
  anything else  -> string"#
    )]
    Decode {
        #[arg(help = "Query string or URL (reads stdin when omitted)")]
        query: Option<String>,
        #[arg(long = "latlng", value_name = "KEY", help = "Decode KEY as \"lat,lng\"")]
        latlng: Vec<String>,
        #[arg(
            long = "bounds",
            value_name = "KEY",
            help = "Decode KEY as \"neLat,neLng,swLat,swLng\""
        )]
        bounds: Vec<String>,
        #[arg(
            long,
            value_name = "FILE",
            value_hint = ValueHint::FilePath,
            help = "JSON file with {\"latlng\": [...], \"latlngBounds\": [...]}"
        )]
        config: Option<PathBuf>,
        #[arg(long, default_value = "json", value_enum, help = "Output format")]
        format: OutputFormat,
    },
    #[command(about = "Encode a JSON object as a query string")]
    Encode {
        #[arg(help = "JSON object (reads stdin when omitted)")]
        json: Option<String>,
        #[arg(long, help = "Prefix the output with `?`")]
        prefix: bool,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn read_input(arg: Option<String>, what: &str, example: &str) -> Result<String, Error> {
    if let Some(arg) = arg {
        return Ok(arg);
    }
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("missing {what}"))
            .with_hint(format!("Pass it as an argument or pipe it on stdin: {example}")));
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read stdin")
            .with_source(err)
    })?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}

/// Full URLs contribute only their query component; hash-routed URLs fall back to
/// the `?...` part of their fragment. Anything else is decoded as a bare query.
fn query_component(input: &str) -> Result<String, Error> {
    if !starts_with_scheme(input) {
        return Ok(input.to_string());
    }
    let url = Url::parse(input).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid url")
            .with_hint("Pass a bare query string like `a=1&b=2`, or a full URL with a scheme.")
            .with_source(err)
    })?;
    if let Some(query) = url.query().filter(|query| !query.is_empty()) {
        return Ok(query.to_string());
    }
    let routed = url
        .fragment()
        .and_then(|fragment| fragment.split_once('?'))
        .map(|(_, query)| query);
    Ok(routed.unwrap_or_default().to_string())
}

// `scheme://` per RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ).
fn starts_with_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn load_config(path: &Path) -> Result<DecodeConfig, Error> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to read config {}", path.display()))
            .with_source(err)
    })?;
    serde_json::from_str(&text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid config {}", path.display()))
            .with_hint("Expected {\"latlng\": [\"origin\"], \"latlngBounds\": [\"viewport\"]}.")
            .with_source(err)
    })
}

fn parse_inline_json(data: &str) -> Result<Value, Error> {
    serde_json::from_str(data).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid json")
            .with_hint("Provide a single JSON object (e.g. '{\"page\":1}').")
            .with_source(err)
    })
}

fn emit_message(value: &Value, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    println!(
        "{}",
        json.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    );
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> String {
    use time::format_description::well_known::Rfc3339;
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return String::new();
    };
    time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_default()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {}", notice.message);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `geoquery --help`.".to_string();
    };

    let subcommand = usage
        .split_whitespace()
        .skip_while(|token| *token != "geoquery")
        .nth(1)
        .filter(|token| !token.starts_with(['-', '<', '[']));

    match subcommand {
        Some(subcommand) => format!("Try `geoquery {subcommand} --help`."),
        None => "Try `geoquery --help`.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, error_json, error_text, query_component};

    #[test]
    fn query_component_passes_bare_queries_through() {
        assert_eq!(query_component("?a=1&b=2").expect("bare"), "?a=1&b=2");
        assert_eq!(query_component("#a=1").expect("hash"), "#a=1");
    }

    #[test]
    fn query_component_extracts_url_query() {
        let query = query_component("https://example.com/map?view=1,2,3,4&z=12#pin")
            .expect("url");
        assert_eq!(query, "view=1,2,3,4&z=12");
        assert_eq!(
            query_component("https://example.com/map").expect("no query"),
            ""
        );
    }

    #[test]
    fn query_component_keeps_bare_queries_with_url_values() {
        let raw = "next=https://example.com/a&page=2";
        assert_eq!(query_component(raw).expect("bare"), raw);
        assert_eq!(
            query_component("?redirect=http://x.test/#top").expect("prefixed"),
            "?redirect=http://x.test/#top"
        );
    }

    #[test]
    fn query_component_reads_hash_routed_query() {
        assert_eq!(
            query_component("https://app.example/#/s?page=2&q=tacos").expect("routed"),
            "page=2&q=tacos"
        );
        assert_eq!(
            query_component("https://app.example/?z=3#/s?page=2").expect("query wins"),
            "z=3"
        );
        assert_eq!(
            query_component("https://app.example/#/s").expect("no query"),
            ""
        );
    }

    #[test]
    fn query_component_rejects_broken_urls() {
        let err = query_component("http://[::1/x?a=1").expect_err("invalid");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn error_json_carries_hint_and_causes() {
        let err = Error::new(ErrorKind::Io)
            .with_message("failed to read stdin")
            .with_hint("retry")
            .with_source(std::io::Error::other("closed"));
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "Io");
        assert_eq!(value["error"]["message"], "failed to read stdin");
        assert_eq!(value["error"]["hint"], "retry");
        assert_eq!(value["error"]["causes"][0], "closed");
    }

    #[test]
    fn error_text_without_color_is_plain() {
        let err = Error::new(ErrorKind::Usage).with_hint("Try `geoquery --help`.");
        assert_eq!(
            error_text(&err, false),
            "error: usage error\nhint: Try `geoquery --help`."
        );
    }
}
