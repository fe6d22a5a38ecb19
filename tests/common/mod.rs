//! Shared fixtures: a chart repository written to a temp directory.
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use chart_catalog::config::{parse_config, Config};

pub const KEEPME_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "service": {
      "type": "object",
      "properties": {
        "image": { "type": "string", "default": "inseefrlab/keepme:3" }
      }
    }
  }
}"#;

/// Gzip tar archive holding `files`.
pub fn build_bundle(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Repository with three `keepme` versions (the oldest pointing at a
/// bundle that does not exist) and two charts meant to be excluded.
/// Also writes `packages.json` for a universe catalog.
pub fn write_repository(dir: &Path) {
    let keepme3 = build_bundle(&[
        (
            "keepme/Chart.yaml",
            "name: keepme\nversion: 3.0.0\nmaintainers:\n  - name: test\n    email: test@example.com\n",
        ),
        ("keepme/values.schema.json", KEEPME_SCHEMA),
        ("keepme/charts/dep/Chart.yaml", "name: dep\n"),
    ]);
    let keepme2 = build_bundle(&[(
        "keepme/Chart.yaml",
        "name: keepme\nversion: 2.0.0\ndescription: from the bundle\n",
    )]);
    // Excluded charts are never fetched, so their bundles may be garbage.
    let excluded = b"not a tarball".to_vec();

    fs::write(dir.join("keepme-3.0.0.tgz"), &keepme3).unwrap();
    fs::write(dir.join("keepme-2.0.0.tgz"), &keepme2).unwrap();
    fs::write(dir.join("excludeme-1.0.0.tgz"), &excluded).unwrap();
    fs::write(dir.join("excludemetoo-1.0.0.tgz"), &excluded).unwrap();

    let index = format!(
        r#"apiVersion: v1
generated: "2024-03-01T10:00:00Z"
entries:
  keepme:
    - name: keepme
      version: 3.0.0
      appVersion: "3.0"
      urls: [keepme-3.0.0.tgz]
      digest: "{}"
    - name: keepme
      version: 2.0.0
      urls: [keepme-2.0.0.tgz]
    - name: keepme
      version: 1.0.0
      urls: [keepeme1.gz]
  excludeme:
    - name: excludeme
      version: 1.0.0
      urls: [excludeme-1.0.0.tgz]
  excludemetoo:
    - name: excludemetoo
      version: 1.0.0
      urls: [excludemetoo-1.0.0.tgz]
"#,
        sha256_hex(&keepme3)
    );
    fs::write(dir.join("index.yaml"), index).unwrap();

    fs::write(
        dir.join("packages.json"),
        r#"{"packages": [
            {"name": "spark", "description": "Spark cluster"},
            {"name": "excludeme", "description": "Never listed"}
        ]}"#,
    )
    .unwrap();
}

/// Temp repository plus a config pointing a `datascience` catalog at it.
pub fn setup_repository() -> (TempDir, Config) {
    let tmp = TempDir::new().unwrap();
    write_repository(tmp.path());
    let config = parse_config(&config_toml(&tmp.path().display().to_string())).unwrap();
    (tmp, config)
}

pub fn config_toml(location: &str) -> String {
    format!(
        r#"[[regions]]
id = "paris"
name = "Paris"
services = {{ type = "KUBERNETES" }}

[[regions]]
id = "legacy"
services = {{ type = "MARATHON" }}

[[catalogs]]
id = "datascience"
name = "Datascience"
description = "Services for datascientists"
maintainer = "innovation@insee.fr"
location = "{location}"
excluded_charts = ["excludeme", "excludemetoo"]

[[catalogs]]
id = "universe"
type = "universe"
location = "{location}/packages.json"
excluded_charts = ["excludeme"]
"#
    )
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that writes into the returned buffer.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
