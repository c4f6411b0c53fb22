/*!
Encrypted chat between two peers.

Run one side as the server and the other as the client:

```text
chat server <port>
chat client <ip> <port>
```

Lines typed on stdin are encrypted and sent; received messages are
printed. End the chat with end-of-input (Ctrl-D) or `/quit`. Set
`RUST_LOG=debug` to watch the handshake.
*/

use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use e2ee_protocol::{E2eeClient, E2eeServer, MessageSink, MessageSource, Result, run_duplex};

/// Reads operator input lines from stdin until EOF or `/quit`.
struct ConsoleSource;

impl MessageSource for ConsoleSource {
    fn next_message(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                let line = line.trim_end_matches(['\r', '\n']);
                if line == "/quit" {
                    None
                } else {
                    Some(line.to_string())
                }
            }
            Err(_) => None,
        }
    }
}

/// Prints received messages to stdout.
struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn deliver(&mut self, text: &str) {
        println!("peer: {text}");
        let _ = io::stdout().flush();
    }
}

fn run_server(port: u16) -> Result<()> {
    let server = E2eeServer::bind(port)?;
    println!("Listening on port {port}...");

    let (session, conn) = server.accept()?;
    println!("Secure session established. Type messages; /quit to exit.");
    run_duplex(&session, conn, ConsoleSource, ConsoleSink)
}

fn run_client(host: &str, port: u16) -> Result<()> {
    let mut client = E2eeClient::new();
    println!("Connecting to {host}:{port}...");

    let conn = client.connect(host, port)?;
    println!("Secure session established. Type messages; /quit to exit.");
    run_duplex(client.session(), conn, ConsoleSource, ConsoleSink)
}

fn usage() -> ExitCode {
    eprintln!("usage: chat server <port> | chat client <ip> <port>");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("server") => {
            let Some(port) = args.get(2).and_then(|p| p.parse().ok()) else {
                return usage();
            };
            run_server(port)
        }
        Some("client") => {
            let (Some(host), Some(port)) = (args.get(2), args.get(3).and_then(|p| p.parse().ok()))
            else {
                return usage();
            };
            run_client(host, port)
        }
        _ => return usage(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
