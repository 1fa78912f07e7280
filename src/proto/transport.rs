use bytes::Bytes;
use futures::{FutureExt, SinkExt, StreamExt};
use std::{io, pin::Pin, time::Duration};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_serial::SerialPortBuilderExt;
use tokio_util::codec::Decoder;
use tracing::debug;

use super::{codec::ProtocolCodec, command::Command, response::Response, Error, Result};

trait AsyncReadWrite<S>: futures::Sink<S> + futures::Stream {}

impl<T, S> AsyncReadWrite<S> for T where T: futures::Sink<S> + futures::Stream {}

/// Serial SCPI command channel.
///
/// Every command is one round trip. Optional rate limiting enforces a minimum
/// gap between two commands, and [`Transport::send_settled`] blocks the caller
/// for a device specific settle time after a state changing command.
#[allow(clippy::type_complexity)]
pub struct Transport {
    stream: Pin<
        Box<
            dyn AsyncReadWrite<
                    Command,
                    Error = io::Error,
                    Item = std::result::Result<Response, io::Error>,
                > + Send,
        >,
    >,
    rate_limit: Option<Duration>,
    next_slot: Option<Instant>,
}

impl Transport {
    pub fn open(com: impl AsRef<str>, baudrate: u32) -> Result<Self> {
        #[allow(unused_mut)]
        let mut port = tokio_serial::new(com.as_ref(), baudrate).open_native_async()?;

        #[cfg(unix)]
        port.set_exclusive(false)?;

        Ok(Self::from_io(port))
    }

    /// Run the protocol over any byte stream.
    pub fn from_io<T>(io: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let stream = ProtocolCodec::default().framed(io);

        Self {
            stream: Box::pin(stream),
            rate_limit: None,
            next_slot: None,
        }
    }

    pub fn enable_rate_limiting(&mut self, interval: Duration) {
        self.rate_limit = Some(interval);
    }

    async fn write(&mut self, command: Command) -> Result<()> {
        if let Some(slot) = self.next_slot.take() {
            sleep_until(slot).await;
        }
        debug!("-> {}", command);
        self.stream.send(command).await?;
        if let Some(interval) = self.rate_limit {
            self.next_slot = Some(Instant::now() + interval);
        }
        Ok(())
    }

    async fn read(&mut self) -> Result<Response> {
        match self.stream.next().await {
            Some(Ok(response)) => Ok(response),
            Some(Err(ioerr)) => {
                // The framed stream reports the end of an error once. Consume
                // it so the next query reads its own reply.
                let _ = self.stream.next().now_or_never();
                Err(ioerr.into())
            }
            None => Err(Error::Abort),
        }
    }

    /// Send a command without a reply.
    pub async fn send(&mut self, command: Command) -> Result<()> {
        self.write(command).await
    }

    /// Send a command and wait for the device to apply it. The device drops
    /// commands silently if they arrive before it has settled.
    pub async fn send_settled(&mut self, command: Command, settle: Duration) -> Result<()> {
        self.write(command).await?;
        debug!("settling for {:?}", settle);
        sleep(settle).await;
        Ok(())
    }

    pub async fn query_line(&mut self, command: Command) -> Result<String> {
        self.write(command).await?;
        match self.read().await? {
            Response::Line(line) => {
                debug!("<- {}", line);
                Ok(line)
            }
            response => Err(response.into()),
        }
    }

    pub async fn query_block(&mut self, command: Command) -> Result<Bytes> {
        self.write(command).await?;
        match self.read().await? {
            Response::Block(data) => {
                debug!("<- block of {} bytes", data.len());
                Ok(data)
            }
            response => Err(response.into()),
        }
    }
}
