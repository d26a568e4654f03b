use tmplgen_cli::config::ResolverConfig;
use tmplgen_cli::core::DataSourceError;
use tmplgen_cli::resolver::resolve;

use crate::common::TestServer;

#[test]
fn test_content_is_fetched_lazily_once() {
    let server = TestServer::start(200, "application/json; charset=utf-8", "{\"ok\":true}");
    let reference = format!("remote={}", server.url("data.json"));

    let collection = resolve(&[reference], &ResolverConfig::default()).unwrap();
    let remote = collection.get("remote").unwrap();
    assert_eq!(server.hits(), 0);
    assert_eq!(remote.length().unwrap(), None);

    assert_eq!(remote.text().unwrap(), "{\"ok\":true}");
    assert_eq!(remote.content_type(), "application/json");
    assert_eq!(remote.length().unwrap(), Some(11));
    assert_eq!(remote.metadata("filename").as_deref(), Some("data.json"));
    assert_eq!(server.hits(), 1);
}

#[test]
fn test_mime_type_parameter_avoids_fetch() {
    let server = TestServer::start(200, "application/json", "[]");
    let reference = format!("{}#mimeType=text/csv", server.url("report"));

    let collection = resolve(&[reference], &ResolverConfig::default()).unwrap();
    let remote = collection.iter().next().unwrap();

    assert_eq!(remote.name(), server.url("report"));
    assert_eq!(remote.content_type(), "text/csv");
    assert_eq!(server.hits(), 0);
}

#[test]
fn test_error_status_surfaces_on_read() {
    let server = TestServer::start(404, "text/plain", "gone");

    let collection = resolve(&[server.url("missing")], &ResolverConfig::default()).unwrap();
    let remote = collection.iter().next().unwrap();

    assert!(matches!(remote.text(), Err(DataSourceError::Http { .. })));
}
