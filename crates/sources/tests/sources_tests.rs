//! Provider tests against local files and a throwaway HTTP server.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use sources::{DataSource, FileSource, HttpSource, ProviderConfig, ProviderRegistry};
use test_utils::fixtures::SAMPLE_CONFIG_YAML;
use test_utils::{grid_field, regular_axis, time_series_field};
use wx_common::{codec, save_field, WxError};

// ============================================================================
// Helper functions
// ============================================================================

fn run() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap()
}

/// Serve one canned HTTP response on a random local port; returns the base URL.
fn serve_once(status: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}", addr)
}

// ============================================================================
// File provider
// ============================================================================

#[test]
fn test_file_source_opens_forecast_hour() {
    let dir = tempfile::tempdir().unwrap();
    let template = format!("{}/gfs/{{date}}/{{cycle}}/{{variable}}_f{{fhour}}.json", dir.path().display());
    let config = ProviderConfig::new("file", template)
        .with_variable("t2m", "TMP_2m")
        .with_forecast_hours(vec![0, 6]);

    let field = time_series_field(
        vec![0.0, 6.0],
        regular_axis(40.0, 1.0, 2),
        regular_axis(0.0, 1.0, 3),
        "TMP_2m",
        (0..12).map(|v| v as f32).collect(),
    );
    save_field(&field, &dir.path().join("gfs/20240115/06/TMP_2m_f006.json")).unwrap();

    let source = FileSource::from_config("local_gfs", &config).unwrap();
    let out = source.open("t2m", 6, Some(run())).unwrap();

    assert_eq!(out.variable_names(), vec!["t2m"]);
    assert_eq!(out.variable("t2m").unwrap().values(), &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    assert!(!out.has_axis("time"));
    assert_eq!(out.attr("run_time"), Some(run().to_rfc3339().as_str()));
}

#[test]
fn test_file_source_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let template = format!("{}/{{variable}}_f{{fhour}}.json", dir.path().display());
    let config = ProviderConfig::new("file", template).with_variable("t2m", "TMP_2m");

    let source = FileSource::from_config("local_gfs", &config).unwrap();
    match source.open("t2m", 0, Some(run())) {
        Err(WxError::Provider { provider, context }) => {
            assert_eq!(provider, "local_gfs");
            assert!(context.contains("TMP_2m_f000.json"));
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[test]
fn test_file_source_rejects_unmapped_variable() {
    let config = ProviderConfig::new("file", "/nonexistent/{variable}.json").with_variable("t2m", "TMP_2m");
    let source = FileSource::from_config("local_gfs", &config).unwrap();
    assert!(matches!(
        source.open("msl", 0, Some(run())),
        Err(WxError::VariableNotFound { .. })
    ));
}

// ============================================================================
// HTTP provider
// ============================================================================

#[test]
fn test_http_source_decodes_field() {
    let field = grid_field(vec![10.0, 11.0], vec![20.0, 21.0], "UGRD_10m", vec![1.0, 2.0, 3.0, 4.0]);
    let base = serve_once("200 OK", codec::to_json(&field).unwrap());

    let config = ProviderConfig::new("http", format!("{}/{{date}}/{{variable}}", base)).with_variable("u10", "UGRD_10m");
    let source = HttpSource::from_config("remote", &config).unwrap();
    let out = source.open("u10", 0, Some(run())).unwrap();

    assert_eq!(out.variable("u10").unwrap().values(), &[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(out.attr("source"), Some("remote"));
}

#[test]
fn test_http_source_status_error() {
    let base = serve_once("404 Not Found", "{}".to_string());

    let config = ProviderConfig::new("http", format!("{}/{{variable}}", base)).with_variable("u10", "UGRD_10m");
    let source = HttpSource::from_config("remote", &config).unwrap();
    assert!(matches!(
        source.open("u10", 0, Some(run())),
        Err(WxError::Provider { .. })
    ));
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Deserialize)]
struct ProvidersSection {
    providers: BTreeMap<String, ProviderConfig>,
}

#[test]
fn test_registry_from_sample_config() {
    let section: ProvidersSection = serde_yaml::from_str(SAMPLE_CONFIG_YAML).unwrap();
    let registry = ProviderRegistry::new(section.providers);

    assert_eq!(registry.names(), vec!["archived", "local_gfs"]);
    assert_eq!(registry.get("local_gfs").unwrap().name(), "GFS (local)");
    assert!(matches!(registry.get("archived"), Err(WxError::ProviderUnavailable(_))));

    let config = registry.config("local_gfs").unwrap();
    assert_eq!(config.variables.get("u10").map(String::as_str), Some("UGRD_10m"));
    assert_eq!(config.forecast_hours, vec![0, 6, 12, 24]);
}
