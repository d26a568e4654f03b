use serial_test::serial;
use std::env;
use tmplgen_cli::config::ResolverConfig;
use tmplgen_cli::core::DataSourceError;
use tmplgen_cli::resolver::resolve;
use tmplgen_cli::test_utils::init_test_logging;

#[test]
#[serial]
fn test_single_variable_snapshot() {
    unsafe { env::set_var("TMPLGEN_IT_USER", "ci") };

    let collection = resolve(&["user=env:///TMPLGEN_IT_USER"], &ResolverConfig::default()).unwrap();
    unsafe { env::set_var("TMPLGEN_IT_USER", "changed") };

    let user = collection.get("user").unwrap();
    assert_eq!(user.text().unwrap(), "ci");
    assert_eq!(user.content_type(), "text/plain");

    unsafe { env::remove_var("TMPLGEN_IT_USER") };
}

#[test]
#[serial]
fn test_all_variables() {
    unsafe { env::set_var("TMPLGEN_IT_ALL", "present") };

    let collection = resolve(&["env=env:///"], &ResolverConfig::default()).unwrap();
    let text = collection.get("env").unwrap().text().unwrap();
    assert!(text.lines().any(|line| line == "TMPLGEN_IT_ALL=present"));

    unsafe { env::remove_var("TMPLGEN_IT_ALL") };
}

#[test]
#[serial]
fn test_text_is_utf8_under_other_charsets() {
    init_test_logging(None);
    unsafe { env::set_var("TMPLGEN_IT_CHARSET", "grü") };

    let config = ResolverConfig {
        default_charset: "UTF-16LE".to_string(),
        ..ResolverConfig::default()
    };
    let references = ["plain=env:///TMPLGEN_IT_CHARSET", "latin=env:///TMPLGEN_IT_CHARSET#charset=ISO-8859-1"];
    let collection = resolve(&references, &config).unwrap();

    assert_eq!(collection.get("plain").unwrap().text().unwrap(), "grü");
    assert_eq!(collection.get("latin").unwrap().text().unwrap(), "grü");

    unsafe { env::remove_var("TMPLGEN_IT_CHARSET") };
}

#[test]
#[serial]
fn test_missing_variable() {
    unsafe { env::remove_var("TMPLGEN_IT_MISSING") };

    let error = resolve(&["env:///TMPLGEN_IT_MISSING"], &ResolverConfig::default()).unwrap_err();
    assert!(matches!(error, DataSourceError::EnvironmentVariableNotFound { .. }));
}
