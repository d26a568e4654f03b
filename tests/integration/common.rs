//! Shared helpers for the integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tmplgen_cli::test_utils::{TestTree, TestTreeBuilder, init_test_logging};

/// The project layout most tests resolve against.
pub fn project_tree() -> TestTreeBuilder {
    init_test_logging(None);
    TestTree::builder()
        .with_file("pom.xml", "<project/>\n")
        .with_file("README.md", "# Demo\n")
        .with_file("src/test/data/users.csv", "name,age\nalice,30\nbob,25\n")
        .with_file("src/test/data/nested/config.json", "{\"debug\": true}\n")
        .with_file("src/test/data/notes.txt", "remember\n")
}

/// A `tmplgen` command running inside `tree` with no user config and no logs.
pub fn tmplgen(tree: &TestTree) -> Command {
    let mut cmd = Command::cargo_bin("tmplgen").expect("tmplgen binary");
    cmd.current_dir(tree.root())
        .env("TMPLGEN_CONFIG", tree.path("no-such-config.toml"))
        .env_remove("RUST_LOG");
    cmd
}

/// A minimal HTTP server on 127.0.0.1 serving one fixed response.
///
/// Each connection receives the same body; `hits` counts the requests.
pub struct TestServer {
    port: u16,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn start(status: u16, content_type: &str, body: &str) -> Self {
        init_test_logging(None);
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let port = listener.local_addr().expect("local addr").port();
        let hits = Arc::new(AtomicUsize::new(0));

        let response = format!(
            "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            if status == 200 { "OK" } else { "Error" },
            body.len()
        );
        let counter = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                serve(stream, response.as_bytes());
            }
        });

        Self {
            port,
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}/{}", self.port, path.trim_start_matches('/'))
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn serve(mut stream: TcpStream, response: &[u8]) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut line = String::new();
    while reader.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
        if line == "\r\n" {
            break;
        }
        line.clear();
    }
    let _ = stream.write_all(response);
    let _ = stream.flush();
}
