use predicates::prelude::*;

use crate::common::{project_tree, tmplgen};

#[test]
fn test_render_to_stdout() {
    let tree = project_tree()
        .with_file(
            "report.tera",
            "{{ title }}:{% for ds in data_sources %} {{ ds.name }}{% endfor %}\n",
        )
        .build()
        .unwrap();

    tmplgen(&tree)
        .args(["render", "-t", "report.tera", "-P", "title=Files", "pom=pom.xml", "data=src/test/data"])
        .assert()
        .success()
        .stdout("Files: pom data/nested/config.json data/notes.txt data/users.csv\n");
}

#[test]
fn test_render_to_file() {
    let tree = project_tree()
        .with_file("users.tera", "{{ data_sources[0].content }}")
        .build()
        .unwrap();

    tmplgen(&tree)
        .args(["render", "--template", "users.tera", "--output", "out.csv", "src/test/data/users.csv"])
        .assert()
        .success()
        .stdout("");

    let written = std::fs::read_to_string(tree.path("out.csv")).unwrap();
    assert_eq!(written, "name,age\nalice,30\nbob,25\n");
}

#[test]
fn test_list_json() {
    let tree = project_tree().build().unwrap();

    let output = tmplgen(&tree)
        .args(["list", "--format", "json", "--include", "*.csv", "data=src/test/data"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "data/users.csv");
    assert_eq!(items[0]["mimeType"], "text/csv");
}

#[test]
fn test_list_simple_with_config_file() {
    let tree = project_tree()
        .with_file("tmplgen.toml", "default-group = \"site\"\nexclude = [\"*.json\"]\n")
        .build()
        .unwrap();

    tmplgen(&tree)
        .env("TMPLGEN_CONFIG", tree.path("tmplgen.toml"))
        .args(["list", "-f", "simple", "--group", "site", "src/test/data"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.txt").and(predicate::str::contains("config.json").not()));
}

#[test]
fn test_missing_file_fails() {
    let tree = project_tree().build().unwrap();

    tmplgen(&tree)
        .args(["list", "missing.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing.txt"));
}

#[test]
fn test_unsupported_scheme_fails() {
    let tree = project_tree().build().unwrap();

    tmplgen(&tree)
        .args(["list", "ftp://example.com/data.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ftp://example.com/data.csv"));
}

#[test]
fn test_stdin_reference() {
    let tree = project_tree()
        .with_file("echo.tera", "{% for ds in data_sources %}{{ ds.name }}={{ ds.content }}{% endfor %}")
        .build()
        .unwrap();

    tmplgen(&tree)
        .args(["render", "-t", "echo.tera", "--stdin"])
        .write_stdin("hello")
        .assert()
        .success()
        .stdout("stdin=hello");
}
