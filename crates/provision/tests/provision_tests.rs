//! End-to-end provisioning tests against a mock release endpoint.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use secretsweep_core::{Arch, Os, Platform};
use secretsweep_provision::{Error, Provisioner, ToolDescriptor};
use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCRIPT: &[u8] = b"#!/bin/sh\nexit 0\n";

fn linux() -> Platform {
    Platform::new(Os::Linux, Arch::Amd64)
}

/// A tar.gz archive holding a single `gitleaks` binary at the root.
fn scanner_archive() -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let mut header = tar::Header::new_gnu();
    header.set_size(SCRIPT.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder.append_data(&mut header, "gitleaks", SCRIPT).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

fn sha256_of(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}

fn index_json(server_uri: &str, tag: &str, digest: &str) -> serde_json::Value {
    let version = tag.trim_start_matches('v');
    serde_json::json!([{
        "tag_name": tag,
        "assets": [{
            "name": format!("gitleaks_{version}_linux_x64.tar.gz"),
            "browser_download_url": format!("{server_uri}/assets/{version}"),
            "digest": digest,
        }]
    }])
}

async fn mount_release(server: &MockServer, tag: &str, archive: &[u8], digest: &str) {
    let version = tag.trim_start_matches('v').to_string();
    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(index_json(&server.uri(), tag, digest)),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/assets/{version}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.to_vec()))
        .mount(server)
        .await;
}

fn provisioner(server: &MockServer, cache_root: &std::path::Path) -> Provisioner {
    Provisioner::new(
        format!("{}/releases", server.uri()),
        cache_root.to_path_buf(),
    )
}

#[tokio::test]
async fn cache_miss_downloads_then_subsequent_call_hits() {
    let server = MockServer::start().await;
    let archive = scanner_archive();
    let digest = sha256_of(&archive);

    // Exactly one index fetch and one asset download across both calls.
    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(index_json(&server.uri(), "v8.18.4", &digest)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assets/8.18.4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let cache_root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(&server, cache_root.path());
    let descriptor = ToolDescriptor::new("gitleaks", "8.18.4", linux());

    let first = provisioner.provision(&descriptor).await.unwrap();
    assert!(first.is_file());
    assert!(first.ends_with("gitleaks/8.18.4/linux_x64/gitleaks"));

    let second = provisioner.provision(&descriptor).await.unwrap();
    assert_eq!(first, second);
    // expect(1) on both mocks verifies the second call stayed offline.
}

#[tokio::test]
async fn latest_resolves_newest_tag_via_index() {
    let server = MockServer::start().await;
    let archive = scanner_archive();
    let digest = sha256_of(&archive);

    let index = serde_json::json!([
        {
            "tag_name": "v8.2.0",
            "assets": [{
                "name": "gitleaks_8.2.0_linux_x64.tar.gz",
                "browser_download_url": format!("{}/assets/8.2.0", server.uri()),
            }]
        },
        {
            "tag_name": "v8.10.0",
            "assets": [{
                "name": "gitleaks_8.10.0_linux_x64.tar.gz",
                "browser_download_url": format!("{}/assets/8.10.0", server.uri()),
                "digest": digest,
            }]
        },
    ]);
    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assets/8.10.0"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.clone()))
        .mount(&server)
        .await;

    let cache_root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(&server, cache_root.path());
    let descriptor = ToolDescriptor::new("gitleaks", "latest", linux());

    let binary = provisioner.provision(&descriptor).await.unwrap();
    assert!(binary.ends_with("gitleaks/8.10.0/linux_x64/gitleaks"));
}

#[cfg(unix)]
#[tokio::test]
async fn provisioned_binary_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    let archive = scanner_archive();
    mount_release(&server, "v8.18.4", &archive, &sha256_of(&archive)).await;

    let cache_root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(&server, cache_root.path());
    let descriptor = ToolDescriptor::new("gitleaks", "8.18.4", linux());

    let binary = provisioner.provision(&descriptor).await.unwrap();
    let mode = std::fs::metadata(&binary).unwrap().permissions().mode();
    assert_ne!(mode & 0o111, 0);
}

#[tokio::test]
async fn checksum_mismatch_fails_and_caches_nothing() {
    let server = MockServer::start().await;
    let archive = scanner_archive();
    mount_release(&server, "v8.18.4", &archive, "sha256:deadbeef").await;

    let cache_root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(&server, cache_root.path());
    let descriptor = ToolDescriptor::new("gitleaks", "8.18.4", linux());

    let err = provisioner.provision(&descriptor).await.unwrap_err();
    assert!(matches!(err, Error::Integrity { .. }));

    // The key must not exist; an unverified binary never becomes visible.
    assert!(!cache_root.path().join("gitleaks/8.18.4/linux_x64").exists());
}

#[tokio::test]
async fn unknown_pinned_version_is_version_not_found() {
    let server = MockServer::start().await;
    let archive = scanner_archive();
    mount_release(&server, "v8.18.4", &archive, &sha256_of(&archive)).await;

    let cache_root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(&server, cache_root.path());
    let descriptor = ToolDescriptor::new("gitleaks", "9.99.9", linux());

    let err = provisioner.provision(&descriptor).await.unwrap_err();
    assert!(matches!(err, Error::VersionNotFound { .. }));
}

#[tokio::test]
async fn unreachable_index_is_download_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache_root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(&server, cache_root.path());
    let descriptor = ToolDescriptor::new("gitleaks", "latest", linux());

    let err = provisioner.provision(&descriptor).await.unwrap_err();
    assert!(matches!(err, Error::Download { .. }));
}

#[tokio::test]
async fn empty_asset_body_is_download_error() {
    let server = MockServer::start().await;
    mount_release(&server, "v8.18.4", b"", "sha256:unused").await;

    let cache_root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(&server, cache_root.path());
    let descriptor = ToolDescriptor::new("gitleaks", "8.18.4", linux());

    let err = provisioner.provision(&descriptor).await.unwrap_err();
    assert!(matches!(err, Error::Download { .. }));
}
