//! Exercises the AI classification path against a loopback HTTP stub and
//! the per-file fallback to the offline classifier when the endpoint
//! misbehaves for some files.

use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use tempfile::TempDir;

use shelfsort::{Category, FileAnalysisService, Settings};

/// Minimal HTTP/1.1 stub: answers with a canned classification for requests
/// mentioning "script.py" and a 500 for everything else.
fn spawn_stub(expected_requests: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");

    thread::spawn(move || {
        for stream in listener.incoming().take(expected_requests) {
            let Ok(stream) = stream else { break };
            handle_connection(stream);
        }
    });

    format!("http://{}/classify", addr)
}

fn handle_connection(mut stream: TcpStream) {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    // Read headers, then the declared body length
    let header_end = loop {
        match stream.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            Err(_) => return,
        }
        if let Some(pos) = find_subslice(&raw, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let content_length: usize = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    while raw.len() < header_end + content_length {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            Err(_) => return,
        }
    }

    let body = String::from_utf8_lossy(&raw[header_end..]).to_string();
    let response_body = if body.contains("script.py") {
        // Deliberately not what the offline classifier would say, so the
        // test can tell which strategy produced the result
        r#"{"category":"Documents","confidence":0.93,"subcategory":null,"suggested_name":"python_notes.py"}"#
    } else {
        ""
    };

    let response = if response_body.is_empty() {
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string()
    } else {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response_body.len(),
            response_body
        )
    };
    let _ = stream.write_all(response.as_bytes());
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[test]
fn batch_mixes_ai_results_with_offline_fallback() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("script.py"), "print('hello')").unwrap();
    fs::write(dir.path().join("mystery.xyz"), "???").unwrap();

    let mut settings = Settings::default();
    settings.ai_endpoint = Some(spawn_stub(2));
    settings.ai_timeout_secs = 5;

    let service = FileAnalysisService::new(&settings).quiet();
    assert_eq!(service.strategy_name(), "ai");

    let plan = service.analyze(dir.path()).unwrap();

    // The whole batch completed despite one endpoint failure
    assert_eq!(plan.total_files, 2);
    assert!(plan.failures.is_empty());

    let classification_of = |name: &str| {
        plan.buckets
            .values()
            .flat_map(|b| b.files.iter())
            .find(|f| f.metadata.name == name)
            .map(|f| f.classification.clone())
            .expect("file missing from plan")
    };

    // script.py: AI answered, and the answer differs from the offline rule
    let ai_classified = classification_of("script.py");
    assert_eq!(ai_classified.category, Category::Documents);
    assert_eq!(ai_classified.suggested_name.as_deref(), Some("python_notes.py"));

    // mystery.xyz: endpoint failed for this file, offline fallback applied
    let fallback = classification_of("mystery.xyz");
    assert_eq!(fallback.category, Category::Uncategorized);
    assert_eq!(fallback.confidence, 0.0);
}

#[test]
fn unreachable_endpoint_falls_back_for_every_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("script.py"), "print('hello')").unwrap();
    fs::write(dir.path().join("photo.jpg"), [0u8; 4]).unwrap();

    let mut settings = Settings::default();
    // Nothing listens here; every request fails fast
    settings.ai_endpoint = Some("http://127.0.0.1:9/classify".to_string());
    settings.ai_timeout_secs = 2;

    let plan = FileAnalysisService::new(&settings)
        .quiet()
        .analyze(dir.path())
        .unwrap();

    assert_eq!(plan.total_files, 2);
    assert!(plan.buckets.contains_key("Code/Python"));
    assert!(plan.buckets.contains_key("Images"));
}
