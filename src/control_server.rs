use crate::SharedTopology;
use crate::command::{self, COMMANDS, Command, Reply};
use log::{info, warn, error};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// One request line: `{"command": "link", "args": ["R0", "R1"]}`.
///
/// `args` may also be a single string or be left out.
#[derive(Debug, Serialize, Deserialize)]
pub struct ControlCommand {
    pub command: String,
    pub args: Option<serde_json::Value>,
}

impl ControlResponse {
    fn ok(message: String, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            data: None,
        }
    }
}

impl ControlCommand {
    /// Flattens the request into the word list understood by [`Command`].
    pub fn tokens(&self) -> Result<Vec<String>, String> {
        let mut tokens = vec![self.command.clone()];
        match &self.args {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::String(arg)) => tokens.push(arg.clone()),
            Some(serde_json::Value::Array(args)) => {
                for arg in args {
                    match arg {
                        serde_json::Value::String(s) => tokens.push(s.clone()),
                        serde_json::Value::Number(n) => tokens.push(n.to_string()),
                        other => return Err(format!("Invalid argument: {}", other)),
                    }
                }
            }
            Some(other) => return Err(format!("Invalid args: {}", other)),
        }
        Ok(tokens)
    }
}

impl From<Reply> for ControlResponse {
    fn from(reply: Reply) -> Self {
        let message = match &reply {
            Reply::Updated(message) => message.clone(),
            Reply::Router(report) => format!("Forwarding table for {}", report.name),
            Reply::Trace(trace) if trace.is_delivered() => {
                format!("Packet delivered in {} hops", trace.hops.len())
            }
            Reply::Trace(trace) => format!("Packet not delivered after {} hops", trace.hops.len()),
            Reply::Stats(stats) => format!("Usage of {} links", stats.len()),
            Reply::Status(_) => "Status retrieved".to_string(),
            Reply::Help => "Available commands".to_string(),
            Reply::Quit => "Closing connection".to_string(),
        };

        let data = match &reply {
            Reply::Updated(_) | Reply::Quit => Ok(None),
            Reply::Router(report) => serde_json::to_value(report).map(Some),
            Reply::Trace(trace) => serde_json::to_value(trace).map(Some),
            Reply::Stats(stats) => serde_json::to_value(stats).map(Some),
            Reply::Status(status) => serde_json::to_value(status).map(Some),
            Reply::Help => serde_json::to_value(COMMANDS).map(Some),
        };

        match data {
            Ok(data) => ControlResponse::ok(message, data),
            Err(e) => ControlResponse::failed(format!("Failed to encode reply: {}", e)),
        }
    }
}

pub struct ControlServer {
    port: u16,
    state: SharedTopology,
}

impl ControlServer {
    pub fn new(port: u16, state: SharedTopology) -> Self {
        Self { port, state }
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        let bind_addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Control server listening on {}", bind_addr);

        Self::serve(listener, self.state.clone()).await
    }

    /// Accepts control connections forever, one task per client.
    pub async fn serve(listener: TcpListener, state: SharedTopology) -> anyhow::Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("Control connection from {}", addr);
                    let state = state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_client(stream, state).await {
                            error!("Error handling control client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept control connection: {}", e);
                }
            }
        }
    }

    async fn handle_client(mut stream: TcpStream, state: SharedTopology) -> anyhow::Result<()> {
        let (reader, mut writer) = stream.split();
        let mut buf_reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            if buf_reader.read_line(&mut line).await? == 0 {
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let (response, quit) = match serde_json::from_str::<ControlCommand>(trimmed) {
                Ok(command) => Self::process_command(command, &state).await,
                Err(e) => (ControlResponse::failed(format!("Invalid JSON command: {}", e)), false),
            };

            let response_json = serde_json::to_string(&response)?;
            writer.write_all(format!("{}\n", response_json).as_bytes()).await?;
            writer.flush().await?;

            if quit {
                break;
            }
        }

        Ok(())
    }

    /// Runs one request. The flag tells the caller to close the connection.
    pub async fn process_command(command: ControlCommand, state: &SharedTopology) -> (ControlResponse, bool) {
        let tokens = match command.tokens() {
            Ok(tokens) => tokens,
            Err(message) => return (ControlResponse::failed(message), false),
        };

        let command = match Command::parse_tokens(&tokens) {
            Ok(command) => command,
            Err(e) => return (ControlResponse::failed(e.to_string()), false),
        };

        match command::execute(command, state).await {
            Ok(Reply::Quit) => (ControlResponse::from(Reply::Quit), true),
            Ok(reply) => (ControlResponse::from(reply), false),
            Err(e) => {
                warn!("Control command failed: {}", e);
                (ControlResponse::failed(e.to_string()), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::share;
    use serde_json::json;

    fn request(value: serde_json::Value) -> ControlCommand {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_tokens_from_args() {
        let command = request(json!({"command": "add", "args": ["R9", 1, -2.5]}));
        assert_eq!(command.tokens().unwrap(), vec!["add", "R9", "1", "-2.5"]);

        let command = request(json!({"command": "rem", "args": "R9"}));
        assert_eq!(command.tokens().unwrap(), vec!["rem", "R9"]);

        let command = request(json!({"command": "status"}));
        assert_eq!(command.tokens().unwrap(), vec!["status"]);

        let command = request(json!({"command": "link", "args": {"a": "R0"}}));
        assert!(command.tokens().is_err());
    }

    #[tokio::test]
    async fn test_process_simulation() {
        let state = share(ControllerConfig::demo().build().unwrap());
        let (response, quit) = ControlServer::process_command(
            request(json!({"command": "simulate", "args": ["R0", "R3"]})),
            &state,
        )
        .await;

        assert!(response.success);
        assert!(!quit);
        let data = response.data.unwrap();
        assert_eq!(data["outcome"]["status"], "delivered");
        assert_eq!(data["hops"][0]["router"], "R0");
        assert_eq!(data["hops"][0]["neighbor"], "R1");
    }

    #[tokio::test]
    async fn test_process_reports_errors() {
        let state = share(ControllerConfig::demo().build().unwrap());

        let (response, _) =
            ControlServer::process_command(request(json!({"command": "print", "args": ["R42"]})), &state).await;
        assert!(!response.success);
        assert_eq!(response.message, "router not found: R42");

        let (response, _) =
            ControlServer::process_command(request(json!({"command": "fly"})), &state).await;
        assert!(!response.success);
        assert_eq!(response.message, "unknown command: fly");

        let (_, quit) = ControlServer::process_command(request(json!({"command": "quit"})), &state).await;
        assert!(quit);
    }
}
