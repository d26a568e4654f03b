use std::io::Read;
use tmplgen_cli::config::ResolverConfig;
use tmplgen_cli::core::DataSourceError;
use tmplgen_cli::resolver::{resolve, resolve_with_stdin};

use crate::common::project_tree;

#[test]
fn test_mixed_references_resolve_in_order() {
    let tree = project_tree().build().unwrap();
    let pom = tree.path("pom.xml");
    let data = tree.path("src/test/data");

    let references = vec![
        pom.display().to_string(),
        format!("readme:docs={}", tree.path("README.md").display()),
        format!("data={}", data.display()),
    ];
    let collection = resolve(&references, &ResolverConfig::default()).unwrap();

    assert_eq!(
        collection.names(),
        vec![
            pom.display().to_string().as_str(),
            "readme",
            "data/nested/config.json",
            "data/notes.txt",
            "data/users.csv",
        ]
    );
    assert_eq!(collection.groups(), vec!["default", "docs"]);

    let users = collection.get("data/users.csv").unwrap();
    assert_eq!(users.content_type(), "text/csv");
    assert_eq!(users.metadata("relativeFilePath").as_deref(), Some("users.csv"));
    assert_eq!(users.metadata("basename").as_deref(), Some("users"));
    assert_eq!(users.lines().unwrap(), vec!["name,age", "alice,30", "bob,25"]);
    assert!(users.uri().starts_with("file://"));

    collection.close().unwrap();
    assert!(matches!(users.text(), Err(DataSourceError::ClosedResource { .. })));
}

#[test]
fn test_include_and_exclude_filters() {
    let tree = project_tree().build().unwrap();
    let config = ResolverConfig {
        include: vec!["*.csv".to_string(), "*.xml".to_string()],
        exclude: vec!["users.*".to_string()],
        ..ResolverConfig::default()
    };

    let references = vec![
        tree.path("pom.xml").display().to_string(),
        tree.path("README.md").display().to_string(),
        format!("data={}", tree.path("src/test/data").display()),
    ];
    let collection = resolve(&references, &config).unwrap();

    assert_eq!(collection.len(), 1);
    assert!(collection.iter().all(|ds| ds.name().ends_with("pom.xml")));
}

#[test]
fn test_first_failure_aborts_resolution() {
    let tree = project_tree().build().unwrap();
    let references = vec![
        tree.path("pom.xml").display().to_string(),
        tree.path("missing.txt").display().to_string(),
    ];

    let error = resolve(&references, &ResolverConfig::default()).unwrap_err();
    assert!(matches!(error, DataSourceError::FileNotFound { .. }));
}

#[test]
fn test_stdin_source_comes_first() {
    let tree = project_tree().build().unwrap();
    let references = vec![tree.path("pom.xml").display().to_string()];

    let collection =
        resolve_with_stdin(&references, &ResolverConfig::default(), "piped input".as_bytes())
            .unwrap();

    assert_eq!(collection.len(), 2);
    let stdin = collection.iter().next().unwrap();
    assert_eq!(stdin.name(), "stdin");
    assert_eq!(stdin.uri(), "stdin:///");
    assert_eq!(stdin.text().unwrap(), "piped input");
}

#[test]
fn test_charset_parameter_decodes_content() {
    let tree = project_tree().with_file("latin1.txt", vec![0x63, 0x61, 0x66, 0xe9]).build().unwrap();
    let reference = format!("latin={}#charset=ISO-8859-1", tree.path("latin1.txt").display());

    let collection = resolve(&[reference], &ResolverConfig::default()).unwrap();
    let latin = collection.get("latin").unwrap();

    assert_eq!(latin.text().unwrap(), "café");
    assert_eq!(latin.metadata("charset").as_deref(), Some("windows-1252"));
}

#[test]
fn test_streams_are_released_on_close() {
    let tree = project_tree().build().unwrap();
    let collection =
        resolve(&[tree.path("pom.xml").display().to_string()], &ResolverConfig::default())
            .unwrap();
    let pom = collection.iter().next().unwrap().clone();

    let mut stream = pom.input_stream().unwrap();
    let mut first = [0u8; 1];
    stream.read_exact(&mut first).unwrap();
    assert_eq!(&first, b"<");

    collection.close().unwrap();
    assert!(stream.is_closed());
    assert!(stream.read(&mut first).is_err());
}
