//! Line-oriented console transport.
//!
//! Reads one message per line and writes one reply per line. Lines are passed
//! on as raw bytes so that invalid UTF-8 reaches the normalizer unchanged.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::actors::traits::ChatResponder;
use crate::error::{AppError, Severity};

/// Serve messages from `input` until end of stream. Returns the number of
/// replies written.
pub async fn serve<R, I, O>(responder: &R, input: I, mut output: O) -> Result<usize, AppError>
where
    R: ChatResponder + ?Sized,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut lines = input.split(b'\n');
    let mut replies = 0;

    while let Some(mut line) = lines.next_segment().await? {
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        match responder.respond_bytes(line, None).await {
            Ok(reply) => {
                output.write_all(reply.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
                replies += 1;
            }
            Err(e) if e.severity() == Severity::Fatal => return Err(e),
            Err(e) => error!("Message dropped: {}", e),
        }
    }

    info!("Input closed after {} replies", replies);
    Ok(replies)
}
