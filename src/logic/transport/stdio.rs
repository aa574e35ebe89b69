//! Line-delimited JSON transport
//!
//! Each input line is one message on the input topic. Each outbound payload
//! is written as one line. `StdioTransport` wires this to stdin/stdout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{Envelope, Transport, TransportError};

pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    input_topic: String,
}

pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
    pub fn stdio(input_topic: impl Into<String>) -> Self {
        LineTransport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), input_topic)
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W, input_topic: impl Into<String>) -> Self {
        Self {
            reader,
            writer,
            input_topic: input_topic.into(),
        }
    }
}

impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str {
        "line"
    }

    fn spawn(
        self,
        inbound: mpsc::Sender<Envelope>,
        mut outbound: mpsc::Receiver<Envelope>,
    ) -> JoinHandle<Result<(), TransportError>> {
        let LineTransport {
            reader,
            mut writer,
            input_topic,
        } = self;

        tokio::spawn(async move {
            let read = async move {
                let mut lines = reader.lines();
                while let Some(line) = lines.next_line().await? {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if inbound.send(Envelope::new(input_topic.as_str(), line)).await.is_err() {
                        log::debug!("[Transport] inbound channel closed, stop reading");
                        break;
                    }
                }
                log::info!("[Transport] input exhausted");
                drop(inbound);
                Ok::<(), TransportError>(())
            };

            let write = async move {
                while let Some(envelope) = outbound.recv().await {
                    log::debug!(
                        "[Transport] -> {} ({} bytes)",
                        envelope.topic,
                        envelope.payload.len()
                    );
                    writer.write_all(&envelope.payload).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
                Ok::<(), TransportError>(())
            };

            let (read_result, write_result) = tokio::join!(read, write);
            read_result.and(write_result)
        })
    }
}
