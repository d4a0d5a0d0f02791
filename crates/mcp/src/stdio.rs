//! Pipe transport: newline-delimited JSON-RPC over stdin/stdout.

use serde_json::Value;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::handler::ToolHandler;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::server::Server;

/// Maximum size of one framed message (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Serve the process's standard streams until stdin closes.
pub async fn serve_stdio<H: ToolHandler>(server: &Server<H>) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(server, stdin, stdout).await
}

/// Serve one connection, handling a single message at a time.
///
/// Returns `Ok(())` once `reader` reaches end of stream. Lines are read with
/// a cap of [`MAX_MESSAGE_SIZE`]; a longer line is discarded and answered
/// with an error.
pub async fn serve<H, R, W>(server: &Server<H>, mut reader: R, mut writer: W) -> Result<()>
where
    H: ToolHandler,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(server = server.name(), "Serving MCP over stdio");

    let mut line = Vec::new();
    loop {
        line.clear();
        let bytes_read = (&mut reader)
            .take(MAX_MESSAGE_SIZE as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;
        if bytes_read == 0 {
            info!("stdin closed, stopping");
            return Ok(());
        }

        let outcome = if line.len() > MAX_MESSAGE_SIZE && line.last() != Some(&b'\n') {
            let size = line.len() + skip_line(&mut reader).await?;
            Err((
                None,
                JsonRpcError::invalid_request(Error::MessageTooLarge {
                    size,
                    max: MAX_MESSAGE_SIZE,
                }),
            ))
        } else {
            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            decode(trimmed)
        };

        let response = match outcome {
            Ok(request) => server.handle(request).await,
            Err((id, error)) => {
                warn!(%error, "Rejecting malformed message");
                Some(JsonRpcResponse::failure(id, error))
            }
        };

        if let Some(response) = response {
            write_message(&mut writer, &response).await?;
        }
    }
}

/// Consume the rest of the current line, returning how many bytes were dropped.
async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<usize> {
    let mut skipped = 0;
    loop {
        let (consumed, done) = {
            let available = reader.fill_buf().await?;
            match available.iter().position(|b| *b == b'\n') {
                Some(end) => (end + 1, true),
                None => (available.len(), available.is_empty()),
            }
        };
        reader.consume(consumed);
        skipped += consumed;
        if done {
            return Ok(skipped);
        }
    }
}

/// Decode one framed message.
///
/// Bytes that are not JSON (including invalid UTF-8) are a parse error with
/// no id; JSON that is not a request is an invalid request, answered with
/// its id when one can be recovered.
fn decode(line: &[u8]) -> std::result::Result<JsonRpcRequest, (Option<RequestId>, JsonRpcError)> {
    let value: Value =
        serde_json::from_slice(line).map_err(|e| (None, JsonRpcError::parse_error(e)))?;

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    serde_json::from_value(value).map_err(|e| (id, JsonRpcError::invalid_request(e)))
}

async fn write_message<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)?;
    debug!(bytes = json.len(), "Writing response");
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerConfig;
    use crate::server::tests::EchoTools;

    const PING: &str = "{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n";

    async fn run(input: &str) -> Vec<Value> {
        run_bytes(input.as_bytes()).await
    }

    async fn run_bytes(input: &[u8]) -> Vec<Value> {
        let server = Server::new(ServerConfig::default(), EchoTools);
        let mut output = Vec::new();
        serve(&server, input, &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn handshake_then_call() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}"#,
            "\n",
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["content"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn malformed_line_gets_parse_error_and_loop_continues() {
        let input = "not json\n\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n";
        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(responses[1]["id"], 7);
        assert!(responses[1]["result"].is_object());
    }

    #[tokio::test]
    async fn eof_ends_cleanly() {
        assert!(run("").await.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_gets_parse_error_and_loop_continues() {
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"x\":\"\xff\"}\n".to_vec();
        input.extend_from_slice(PING.as_bytes());

        let responses = run_bytes(&input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(responses[1]["id"], 7);
    }

    #[tokio::test]
    async fn oversized_line_is_rejected_and_skipped() {
        let mut input = "x".repeat(MAX_MESSAGE_SIZE + 10);
        input.push('\n');
        input.push_str(PING);

        let responses = run(&input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], JsonRpcError::INVALID_REQUEST);
        assert_eq!(responses[1]["id"], 7);
    }

    #[tokio::test]
    async fn line_at_the_limit_is_accepted() {
        let padding = MAX_MESSAGE_SIZE - PING.len() + 1;
        let input = format!("{}{PING}", " ".repeat(padding));
        assert_eq!(input.len(), MAX_MESSAGE_SIZE + 1);

        let responses = run(&input).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 7);
    }

    #[tokio::test]
    async fn json_that_is_not_a_request_keeps_its_id() {
        let input = format!("{{\"jsonrpc\":\"2.0\",\"id\":3}}\n[1,2]\n{PING}");
        let responses = run(&input).await;
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 3);
        assert_eq!(responses[0]["error"]["code"], JsonRpcError::INVALID_REQUEST);
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], JsonRpcError::INVALID_REQUEST);
        assert_eq!(responses[2]["id"], 7);
    }

    #[tokio::test]
    async fn null_id_is_answered() {
        let responses = run("{\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"ping\"}\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], Value::Null);
        assert!(responses[0]["result"].is_object());
    }

    #[tokio::test]
    async fn final_line_without_newline_is_handled() {
        let responses = run(PING.trim_end()).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 7);
    }
}
