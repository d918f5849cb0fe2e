// CLI integration tests for decode/encode flows.
use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_geoquery");
    let mut command = Command::new(exe);
    command.env_remove("RUST_LOG");
    command
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn parse_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    parse_json(line)
}

fn run_with_stdin(args: &[&str], stdin: &str) -> std::process::Output {
    let mut child = cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

#[test]
fn decode_scalars_to_json() {
    let output = cmd()
        .args(["decode", "foo=true&bar=false&baz=5&qux=hello"])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let json = parse_json_line(&output.stdout);
    assert_eq!(json["foo"], true);
    assert_eq!(json["bar"], false);
    assert_eq!(json["baz"], 5);
    assert_eq!(json["qux"], "hello");
}

#[test]
fn decode_geographic_flags() {
    let output = cmd()
        .args([
            "decode",
            "?origin=10.5,20.25&bounds=1,2,3,4&broken=x",
            "--latlng",
            "origin",
            "--bounds",
            "bounds",
            "--bounds",
            "broken",
        ])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let json = parse_json_line(&output.stdout);
    assert_eq!(json["origin"]["lat"], 10.5);
    assert_eq!(json["origin"]["lng"], 20.25);
    assert_eq!(json["bounds"]["northEast"]["lat"], 1.0);
    assert_eq!(json["bounds"]["southWest"]["lng"], 4.0);
    assert!(json["broken"].is_null());
}

#[test]
fn decode_reads_url_from_stdin() {
    let output = run_with_stdin(
        &["decode", "--latlng", "at"],
        "https://example.com/listings?at=51.5074,-0.1278&page=2\n",
    );
    assert!(output.status.success());
    let json = parse_json_line(&output.stdout);
    assert_eq!(json["at"]["lat"], 51.5074);
    assert_eq!(json["at"]["lng"], -0.1278);
    assert_eq!(json["page"], 2);
}

#[test]
fn decode_bare_query_with_url_value() {
    let output = cmd()
        .args(["decode", "next=https://example.com/a&page=2"])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let json = parse_json_line(&output.stdout);
    assert_eq!(json["next"], "https://example.com/a");
    assert_eq!(json["page"], 2);
}

#[test]
fn decode_hash_routed_url() {
    let output = cmd()
        .args(["decode", "https://app.example/#/s?page=2&q=tacos"])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let json = parse_json_line(&output.stdout);
    assert_eq!(json["page"], 2);
    assert_eq!(json["q"], "tacos");
}

#[test]
fn decode_uses_config_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config_path = temp.path().join("geo.json");
    std::fs::write(&config_path, r#"{"latlngBounds": ["viewport"]}"#).expect("write config");

    let output = cmd()
        .args([
            "decode",
            "viewport=1,2,3,4",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let json = parse_json_line(&output.stdout);
    assert_eq!(json["viewport"]["northEast"]["lng"], 2.0);
}

#[test]
fn decode_rejects_invalid_config_with_usage_exit() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config_path = temp.path().join("geo.json");
    std::fs::write(&config_path, r#"{"latlng": "origin"}"#).expect("write config");

    let output = cmd()
        .args([
            "decode",
            "origin=1,2",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .output()
        .expect("decode");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
    assert!(err["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("invalid config"));
}

#[test]
fn decode_missing_config_is_io_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("nope.json");
    let output = cmd()
        .args(["decode", "a=1", "--config", missing.to_str().unwrap()])
        .output()
        .expect("decode");
    assert_eq!(output.status.code(), Some(8));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Io");
}

#[test]
fn decode_overlap_emits_notice_and_prefers_latlng() {
    let output = cmd()
        .args(["decode", "area=1,2", "--latlng", "area", "--bounds", "area"])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let json = parse_json_line(&output.stdout);
    assert_eq!(json["area"]["lat"], 1.0);

    let stderr = String::from_utf8_lossy(&output.stderr);
    let notice = stderr
        .lines()
        .map(parse_json)
        .find(|value| value.get("notice").is_some())
        .expect("notice line");
    assert_eq!(notice["notice"]["kind"], "config_overlap");
    assert_eq!(notice["notice"]["cmd"], "decode");
    assert_eq!(notice["notice"]["details"]["keys"][0], "area");
}

#[test]
fn decode_table_format_without_color() {
    let output = cmd()
        .args([
            "--color",
            "never",
            "decode",
            "page=2&q=ramen",
            "--format",
            "table",
        ])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "page  number  2\nq     string  \"ramen\"\n");
}

#[test]
fn decode_pretty_format_spans_lines() {
    let output = cmd()
        .args(["decode", "a=1&b=two", "--format", "pretty"])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().count() > 1);
    assert_eq!(parse_json(&stdout)["b"], "two");
}

#[test]
fn encode_json_argument() {
    let output = cmd()
        .args([
            "encode",
            r#"{"page": 3, "origin": {"lat": 1.5, "lng": 2}, "q": "thai food"}"#,
        ])
        .output()
        .expect("encode");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end(), "origin=1.5%2C2&page=3&q=thai+food");
}

#[test]
fn encode_from_stdin_with_prefix() {
    let output = run_with_stdin(&["encode", "--prefix"], r#"{"open": true}"#);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim_end(), "?open=true");
}

#[test]
fn encode_rejects_arrays() {
    let output = cmd()
        .args(["encode", r#"{"tags": ["a", "b"]}"#])
        .output()
        .expect("encode");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
    assert!(err["error"]["hint"].as_str().is_some());
}

#[test]
fn encode_rejects_invalid_json() {
    let output = cmd()
        .args(["encode", "{not json"])
        .output()
        .expect("encode");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["message"], "invalid json");
    assert!(err["error"]["causes"].as_array().is_some());
}

#[test]
fn unknown_flag_is_usage_error_with_hint() {
    let output = cmd()
        .args(["decode", "a=1", "--nope"])
        .output()
        .expect("decode");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
    assert_eq!(err["error"]["hint"], "Try `geoquery decode --help`.");
}
