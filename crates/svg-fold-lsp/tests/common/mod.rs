//! Common test utilities for integration tests.
//!
//! `LspClient` drives the server binary over stdio with framed JSON-RPC.

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdout, Command, Stdio};

pub(crate) struct LspClient {
    process: Child,
    reader: BufReader<ChildStdout>,
    /// Server notifications seen while waiting for responses.
    pub(crate) notifications: Vec<Value>,
}

impl LspClient {
    /// Spawn the svg-fold-lsp binary.
    pub(crate) fn spawn() -> Self {
        let mut process = Command::new(env!("CARGO_BIN_EXE_svg-fold-lsp"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn svg-fold-lsp binary");

        let stdout = process.stdout.take().expect("Failed to capture stdout");
        Self {
            process,
            reader: BufReader::new(stdout),
            notifications: Vec::new(),
        }
    }

    pub(crate) fn send(&mut self, message: &Value) {
        let body = serde_json::to_string(message).unwrap();
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        let stdin = self.process.stdin.as_mut().expect("stdin not captured");
        stdin.write_all(header.as_bytes()).unwrap();
        stdin.write_all(body.as_bytes()).unwrap();
        stdin.flush().unwrap();
    }

    pub(crate) fn notify(&mut self, method: &str, params: Value) {
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        }));
    }

    /// Reads messages until the response with `id` arrives.
    pub(crate) fn read_response(&mut self, id: i64) -> Value {
        loop {
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                let bytes_read = self
                    .reader
                    .read_line(&mut line)
                    .expect("Failed to read header");
                assert!(bytes_read != 0, "Server closed connection unexpectedly");

                if line == "\r\n" || line == "\n" {
                    break;
                }
                if line.to_lowercase().starts_with("content-length:") {
                    content_length = line
                        .split(':')
                        .nth(1)
                        .unwrap()
                        .trim()
                        .parse()
                        .expect("Invalid content length");
                }
            }
            if content_length == 0 {
                continue;
            }

            let mut body = vec![0u8; content_length];
            self.reader.read_exact(&mut body).expect("Failed to read body");
            let message: Value = serde_json::from_slice(&body).unwrap();

            if message.get("id") == Some(&json!(id)) {
                return message;
            }
            if message.get("id").is_none() {
                self.notifications.push(message);
            }
        }
    }

    pub(crate) fn request(&mut self, id: i64, method: &str, params: Value) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        }));
        self.read_response(id)
    }

    /// Initialize the LSP session with `options` as initializationOptions.
    pub(crate) fn initialize(&mut self, options: Value) -> Value {
        let response = self.request(
            1,
            "initialize",
            json!({
                "processId": null,
                "capabilities": {
                    "textDocument": {
                        "foldingRange": { "lineFoldingOnly": true }
                    }
                },
                "rootUri": "file:///tmp",
                "initializationOptions": options
            }),
        );
        self.notify("initialized", json!({}));
        response
    }

    pub(crate) fn did_open(&mut self, uri: &str, language_id: &str, text: &str) {
        self.notify(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": language_id,
                    "version": 1,
                    "text": text
                }
            }),
        );
    }

    pub(crate) fn folding_ranges(&mut self, id: i64, uri: &str) -> Value {
        self.request(
            id,
            "textDocument/foldingRange",
            json!({ "textDocument": { "uri": uri } }),
        )
    }

    pub(crate) fn shutdown(&mut self) -> Value {
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": 999,
            "method": "shutdown"
        }));
        self.read_response(999)
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        let _ = self.process.kill();
    }
}
