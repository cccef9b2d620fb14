use bench_adapter::MetadataProjection;
use clap::Parser;
use couch_bench::{parse_field_values, CouchOpts};
use std::io::Write;

#[test]
fn test_flags_override_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "hosts: \"10.0.0.1,10.0.0.2:5985\"").unwrap();
    writeln!(file, "database: fromfile").unwrap();
    writeln!(file, "username: admin").unwrap();
    writeln!(file, "request_timeout_secs: 7").unwrap();

    let path = file.path().to_str().unwrap();
    let opts = CouchOpts::parse_from([
        "couch-bench",
        "--config",
        path,
        "--hosts",
        "127.0.0.1:2222,127.0.0.1:3333",
        "--database",
        "testdatabase",
        "--include-metadata",
    ]);
    let config = opts.to_config().unwrap();

    assert_eq!(config.hosts, vec!["127.0.0.1:2222", "127.0.0.1:3333"]);
    assert_eq!(config.database, "testdatabase");
    assert_eq!(config.username.as_deref(), Some("admin"));
    assert_eq!(config.request_timeout_secs, 7);
    assert_eq!(config.projection(), MetadataProjection::Include);
}

#[test]
fn test_timeout_flag() {
    let opts = CouchOpts::parse_from(["couch-bench", "--hosts", "localhost", "--timeout", "3"]);
    let config = opts.to_config().unwrap();
    assert_eq!(config.request_timeout_secs, 3);
    assert_eq!(config.nodes().unwrap().len(), 1);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let opts = CouchOpts::parse_from([
        "couch-bench",
        "--config",
        "/nonexistent/couch-bench.yaml",
    ]);
    assert!(opts.to_config().is_err());
}

#[test]
fn test_parse_field_values() {
    let values = vec!["mapKey=mapValue".to_string(), "expr=a=b".to_string()];
    let record = parse_field_values(&values).unwrap();
    assert_eq!(record.get("mapKey").map(String::as_str), Some("mapValue"));
    assert_eq!(record.get("expr").map(String::as_str), Some("a=b"));

    assert!(parse_field_values(&["novalue".to_string()]).is_err());
    assert!(parse_field_values(&["=value".to_string()]).is_err());
}
