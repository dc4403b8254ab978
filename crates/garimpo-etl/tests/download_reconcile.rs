//! Download reconciliation against a stubbed remote: skip vs re-fetch
//! decisions, fail-open probes, and per-file failure isolation.

use garimpo_etl::download::download_many;
use garimpo_etl::remote::RemoteClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> RemoteClient {
    RemoteClient::new(5).unwrap()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn skips_when_remote_size_matches_local() {
    let server = MockServer::start().await;
    // HEAD advertises the same 5 bytes the local file has.
    Mock::given(method("HEAD"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 5]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"xxxxx".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.zip"), b"12345").unwrap();

    let stats = download_many(
        &client(),
        &format!("{}/files/", server.uri()),
        &names(&["a.zip"]),
        dir.path(),
        false,
    )
    .await
    .unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.fetched, 0);
    assert_eq!(
        std::fs::read(dir.path().join("a.zip")).unwrap(),
        b"12345",
        "local file must not be touched on skip"
    );
}

#[tokio::test]
async fn refetches_on_size_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 11]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.zip"), b"old").unwrap();

    let stats = download_many(
        &client(),
        &format!("{}/files/", server.uri()),
        &names(&["a.zip"]),
        dir.path(),
        false,
    )
    .await
    .unwrap();

    assert_eq!(stats.fetched, 1);
    assert_eq!(
        std::fs::read(dir.path().join("a.zip")).unwrap(),
        b"fresh-bytes"
    );
}

#[tokio::test]
async fn fails_open_when_probe_errors() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    // Probe failure must trigger a fetch even though sizes happen to match.
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"12345".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.zip"), b"12345").unwrap();

    let stats = download_many(
        &client(),
        &format!("{}/files/", server.uri()),
        &names(&["a.zip"]),
        dir.path(),
        false,
    )
    .await
    .unwrap();

    assert_eq!(stats.fetched, 1);
    assert_eq!(stats.skipped, 0);
}

#[tokio::test]
async fn overwrite_fetches_without_probing() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 5]))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.zip"), b"12345").unwrap();

    let stats = download_many(
        &client(),
        &format!("{}/files/", server.uri()),
        &names(&["a.zip"]),
        dir.path(),
        true,
    )
    .await
    .unwrap();

    assert_eq!(stats.fetched, 1);
    assert_eq!(std::fs::read(dir.path().join("a.zip")).unwrap(), b"fresh");
}

#[tokio::test]
async fn fetch_failure_does_not_abort_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/broken.zip"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/good.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let stats = download_many(
        &client(),
        &format!("{}/files/", server.uri()),
        &names(&["broken.zip", "good.zip"]),
        dir.path(),
        false,
    )
    .await
    .unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.fetched, 1);
    assert_eq!(std::fs::read(dir.path().join("good.zip")).unwrap(), b"ok");
}

#[tokio::test]
async fn lists_zip_files_from_directory_index() {
    let server = MockServer::start().await;
    let body = r#"<html><body>
        <a href="../">up</a>
        <a href="Empresas0.zip">Empresas0.zip</a>
        <a href="Empresas1.zip?download=1">Empresas1.zip</a>
        <a href="readme.txt">readme</a>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/dados/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let files = client()
        .list_files(&format!("{}/dados/", server.uri()), ".zip")
        .await
        .unwrap();
    assert_eq!(files, vec!["Empresas0.zip", "Empresas1.zip"]);
}
