//! Common test utilities and helpers

#![allow(dead_code)]

use hearth_bridge::{BridgeConfig, McpServer};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

/// A running server wired to in-memory streams
pub struct TestSession {
    pub input: DuplexStream,
    pub output: BufReader<DuplexStream>,
    pub handle: JoinHandle<hearth_bridge::Result<()>>,
}

impl TestSession {
    pub fn start(config: &BridgeConfig) -> Self {
        let (input, server_in) = tokio::io::duplex(256 * 1024);
        let (server_out, output) = tokio::io::duplex(256 * 1024);

        let server = Arc::new(McpServer::from_config(config));
        let handle = tokio::spawn(server.serve(BufReader::new(server_in), server_out));

        Self {
            input,
            output: BufReader::new(output),
            handle,
        }
    }

    /// Write raw bytes to the server's inbound stream
    pub async fn send_raw(&mut self, bytes: &str) {
        self.input.write_all(bytes.as_bytes()).await.unwrap();
        self.input.flush().await.unwrap();
    }

    /// Send one bare JSON request line
    pub async fn send(&mut self, request: Value) {
        self.send_raw(&format!("{}\n", request)).await;
    }

    pub async fn call(&mut self, id: i64, method: &str, params: Value) -> Value {
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        self.recv().await
    }

    pub async fn call_tool(&mut self, id: i64, name: &str, arguments: Value) -> Value {
        self.call(id, "tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }

    /// Read one `Content-Length` framed response
    pub async fn recv(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(10), read_frame(&mut self.output))
            .await
            .expect("timed out waiting for a response frame")
    }

    /// Close the inbound stream and wait for the server to exit
    pub async fn shutdown(self) -> hearth_bridge::Result<()> {
        drop(self.input);
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

async fn read_frame(reader: &mut BufReader<DuplexStream>) -> Value {
    let mut header = String::new();
    reader.read_line(&mut header).await.unwrap();
    let length: usize = header
        .trim_end()
        .strip_prefix("Content-Length: ")
        .unwrap_or_else(|| panic!("bad header line: {:?}", header))
        .parse()
        .unwrap();

    let mut separator = String::new();
    reader.read_line(&mut separator).await.unwrap();
    assert_eq!(separator, "\r\n");

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Text content of a successful tool result
pub fn tool_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("no text content in {}", response))
}

pub fn test_config(dir: &TempDir) -> BridgeConfig {
    BridgeConfig::for_base_dir(dir.path())
}

/// A realistic raw snapshot as the app would hand it over
pub fn sample_raw_snapshot() -> Value {
    json!({
        "exportedAt": "2026-10-12T08:00:00Z",
        "members": [
            {"id": "m1", "name": "Alex", "role": "parent", "energyLevel": 6, "connectionScore": "8", "isActive": true},
            {"id": "m2", "name": "Sam", "role": "child", "energyLevel": 12, "connectionScore": null, "isActive": "yes"}
        ],
        "recentLogs": [
            {"memberId": "m1", "date": "2026-10-11", "energy": 5, "mood": 7, "connection": 8, "highlights": "Park walk", "shared": 1},
            {"memberId": "m2", "date": "2026-10-11", "energy": -2, "mood": "meh", "connection": 6, "notes": "Long day"}
        ],
        "drifts": [
            {"memberId": "m1", "driftType": "energy", "severity": "medium", "sentence": "Evenings feel rushed", "acknowledged": false},
            {"memberId": "m2", "driftType": "goals", "severity": "low", "sentence": "Reading goal slipped", "acknowledged": true}
        ],
        "weeklyStats": {"logsThisWeek": 9, "averageEnergy": 5.5, "averageConnection": 7, "activeMembers": 2}
    })
}

/// Write an executable `/bin/sh` script
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
