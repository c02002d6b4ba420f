//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Build a `normflow` invocation isolated from the caller's config and env.
pub fn normflow(config_home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_normflow"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env("NORMFLOW_LOG", "off")
        .env_remove("NORMFLOW_ENGINE_URL");
    cmd
}

/// Run `normflow` with `args`, feeding `stdin` when given.
pub fn run(config_home: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let mut cmd = normflow(config_home);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().expect("spawn normflow");
    {
        let mut pipe = child.stdin.take().expect("stdin pipe");
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).expect("write stdin");
        }
    }
    child.wait_with_output().expect("wait for normflow")
}

/// Parse every stdout line as JSON.
pub fn json_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
        .collect()
}

/// Temp dir holding a small CSV dataset.
pub fn dataset_dir() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "id,name,city\n1,Ada,London\n2,Alan,Wilmslow\n").expect("write csv");
    (dir, path)
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: String,
}

/// How the stub answers `/run_etl`.
#[derive(Debug, Clone, Copy)]
pub enum ExecuteBehavior {
    Succeed,
    Reject(&'static str),
}

/// Minimal HTTP engine serving a fixed number of requests.
pub struct StubEngine {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl StubEngine {
    pub fn start(expected: usize, behavior: ExecuteBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub engine");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(10);
            let mut served = 0;
            while served < expected && Instant::now() < deadline {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let request = serve(stream, behavior);
                        recorded.lock().expect("requests").push(request);
                        served += 1;
                    }
                    Err(_) => thread::sleep(Duration::from_millis(5)),
                }
            }
        });
        Self {
            url,
            requests,
            handle: Some(handle),
        }
    }

    /// Wait for the server thread and return what it saw.
    pub fn finish(mut self) -> Vec<RecordedRequest> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("stub engine thread");
        }
        self.requests.lock().expect("requests").clone()
    }
}

fn serve(mut stream: TcpStream, behavior: ExecuteBehavior) -> RecordedRequest {
    stream.set_nonblocking(false).expect("blocking stream");
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        if line == "\r\n" || line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().expect("content length");
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).expect("request body");
    let body = String::from_utf8_lossy(&body).to_string();

    let (status, payload) = if path.ends_with("/upload_csv") {
        (
            200,
            json!({
                "csv_path": "uploads/people.csv",
                "html": "<h4>Uploaded: people.csv</h4><pre>Rows: 2, Columns: 3</pre>",
            }),
        )
    } else {
        execute_payload(&body, behavior)
    };
    let text = payload.to_string();
    let reason = if status == 200 { "OK" } else { "BAD REQUEST" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{text}",
        text.len()
    );
    stream
        .write_all(response.as_bytes())
        .expect("write response");
    RecordedRequest { path, body }
}

fn execute_payload(body: &str, behavior: ExecuteBehavior) -> (u16, Value) {
    if let ExecuteBehavior::Reject(message) = behavior {
        return (400, json!({ "error": message, "blocked_step": "fd" }));
    }
    let request: Value = serde_json::from_str(body).expect("execute body is JSON");
    let handle = request["csv_path"].as_str().unwrap_or_default();
    let steps = request["steps"].as_array().cloned().unwrap_or_default();
    let mut payload = serde_json::Map::new();
    for step in &steps {
        let id = step.as_str().unwrap_or_default();
        payload.insert(
            id.to_string(),
            json!({ "html": format!("<p>{id} done</p>"), "info": "ignored" }),
        );
    }
    payload.insert(
        "latest_csv".to_string(),
        Value::String(format!("{handle}+{}", steps.len())),
    );
    (200, Value::Object(payload))
}
