//! Relay Session Module
//!
//! A [`Session`] is one live connection to a chat relay. It identifies the
//! bot, keeps track of the server's channels, and turns incoming frames into
//! dispatches, welcomes and pongs. Everything the bot says goes out through a
//! [`RelayClient`], which queues frames for a dedicated writer task.
//!
//! ## Session Lifecycle
//!
//! ```text
//! 1. Session::connect (TCP handshake, writer task spawned)
//!        │
//!        ▼
//! 2. IDENTIFY <credential> queued
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read bytes from socket  │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Parse relay frame       │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ READY / CHANNEL / JOIN  │ │
//!    │  │ MESSAGE ──> dispatch    │─┼──> spawned task ──> RelayClient
//!    │  │ PING ──> PONG           │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Relay disconnects / error, writer task aborted
//! ```
//!
//! ## Buffer Management
//!
//! Incoming data accumulates in a BytesMut buffer. TCP is a stream protocol,
//! so a read may end in the middle of a frame or hold several frames.

use crate::chat::{Author, Channel, ChatClient, ClientError, Message, SentMessage};
use crate::config::BotConfig;
use crate::dispatch::Dispatcher;
use crate::protocol::parser::{MAX_HEADER_SIZE, MAX_PAYLOAD_SIZE};
use crate::protocol::types::is_field;
use crate::protocol::{Frame, FrameParser, ParseError};
use async_trait::async_trait;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Posted to every announce channel once the relay reports ready
pub const STARTUP_ANNOUNCEMENT: &str = "Pimoroni Bot started...";

/// Maximum size for the read buffer: one full frame plus slack
const MAX_BUFFER_SIZE: usize = MAX_HEADER_SIZE + MAX_PAYLOAD_SIZE + 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Frames waiting for the writer task
const OUTBOUND_QUEUE: usize = 256;

// ============================================================================
// Statistics
// ============================================================================

/// Statistics for a relay session
#[derive(Debug, Default)]
pub struct SessionStats {
    /// Frames parsed from the relay
    pub frames_received: AtomicU64,
    /// Chat messages handed to the dispatcher
    pub messages_dispatched: AtomicU64,
    /// Frames written to the relay
    pub frames_sent: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_dispatched(&self) {
        self.messages_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_sent(&self, bytes: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }
}

// ============================================================================
// Relay Client
// ============================================================================

/// The [`ChatClient`] of a relay session.
///
/// Cloning is cheap; all clones share the outbound queue and the message id
/// counter. Once the writer task has stopped every call fails with
/// [`ClientError::Closed`].
#[derive(Debug, Clone)]
pub struct RelayClient {
    outbound: mpsc::Sender<Frame>,
    next_id: Arc<AtomicU64>,
}

impl RelayClient {
    fn new(outbound: mpsc::Sender<Frame>) -> Self {
        Self {
            outbound,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queues a raw frame for the relay.
    pub async fn send_frame(&self, frame: Frame) -> Result<(), ClientError> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| ClientError::Closed)
    }

    fn check_channel(channel_id: &str) -> Result<(), ClientError> {
        if is_field(channel_id) {
            Ok(())
        } else {
            Err(ClientError::Rejected(format!(
                "invalid channel id {:?}",
                channel_id
            )))
        }
    }
}

#[async_trait]
impl ChatClient for RelayClient {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<SentMessage, ClientError> {
        Self::check_channel(channel_id)?;
        if text.len() > MAX_PAYLOAD_SIZE {
            return Err(ClientError::Rejected(format!(
                "message too long ({} bytes)",
                text.len()
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.send_frame(Frame::send(channel_id, id, text)).await?;
        Ok(SentMessage {
            channel_id: channel_id.to_string(),
            id,
        })
    }

    async fn delete_message(&self, message: &SentMessage) -> Result<(), ClientError> {
        Self::check_channel(&message.channel_id)?;
        self.send_frame(Frame::Delete {
            channel_id: message.channel_id.clone(),
            message_id: message.id,
        })
        .await
    }
}

/// Drains the outbound queue onto the socket until every sender is gone.
async fn write_frames(
    stream: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<Frame>,
    stats: Arc<SessionStats>,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(stream);
    let mut buf = Vec::with_capacity(INITIAL_BUFFER_SIZE);

    while let Some(frame) = outbound.recv().await {
        buf.clear();
        frame.serialize_into(&mut buf);
        writer.write_all(&buf).await?;
        writer.flush().await?;
        stats.frame_sent(buf.len());
        trace!(frame = %frame, bytes = buf.len(), "Sent frame");
    }

    writer.shutdown().await
}

// ============================================================================
// Session
// ============================================================================

/// One live connection to a chat relay.
pub struct Session {
    /// Read half of the relay connection
    reader: OwnedReadHalf,

    /// Relay address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Relay frame parser
    parser: FrameParser,

    /// Outbound side, shared with dispatch and welcome tasks
    client: RelayClient,

    /// Writer task draining the outbound queue
    writer: JoinHandle<std::io::Result<()>>,

    dispatcher: Dispatcher,
    config: Arc<BotConfig>,

    /// The bot's own identity, known once READY arrives
    identity: Option<Author>,

    /// Channels of the server, in the order the relay announced them
    channels: Vec<Channel>,

    /// Session statistics (shared)
    stats: Arc<SessionStats>,
}

impl Session {
    /// Connects to the relay at `addr` and queues the `IDENTIFY` frame.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        credential: &str,
        dispatcher: Dispatcher,
        config: Arc<BotConfig>,
        stats: Arc<SessionStats>,
    ) -> Result<Self, SessionError> {
        if !is_field(credential) {
            return Err(SessionError::InvalidCredential);
        }

        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();

        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        let writer = tokio::spawn(write_frames(writer, rx, Arc::clone(&stats)));
        let client = RelayClient::new(tx);

        client
            .send_frame(Frame::Identify {
                credential: credential.to_string(),
            })
            .await
            .map_err(|_| SessionError::Disconnected)?;
        info!(relay = %peer, "Connected to relay, identifying");

        Ok(Self {
            reader,
            addr: peer,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            parser: FrameParser::new(),
            client,
            writer,
            dispatcher,
            config,
            identity: None,
            channels: Vec::new(),
            stats,
        })
    }

    /// Runs the session until the relay goes away or an error occurs.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(relay = %self.addr, "Session ended"),
            Err(SessionError::Disconnected) => info!(relay = %self.addr, "Relay disconnected"),
            Err(SessionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                warn!(relay = %self.addr, "Connection reset by relay")
            }
            Err(e) => error!(relay = %self.addr, error = %e, "Session error"),
        }

        self.writer.abort();
        result
    }

    /// The main read-parse-handle loop.
    async fn main_loop(&mut self) -> Result<(), SessionError> {
        loop {
            while let Some(frame) = self.try_parse_frame()? {
                self.stats.frame_received();
                self.handle_frame(frame).await;
            }

            self.read_more_data().await?;
        }
    }

    /// Attempts to parse a frame from the buffer.
    fn try_parse_frame(&mut self) -> Result<Option<Frame>, SessionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer) {
            Ok(Some((frame, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    relay = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed frame"
                );
                Ok(Some(frame))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(relay = %self.addr, error = %e, "Parse error");
                Err(SessionError::ParseError(e))
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), SessionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                relay = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(SessionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.reader.read_buf(&mut self.buffer).await?;
        if n == 0 {
            if self.buffer.is_empty() {
                return Err(SessionError::Disconnected);
            } else {
                return Err(SessionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(relay = %self.addr, bytes = n, "Read data");
        Ok(())
    }

    async fn handle_frame(&mut self, frame: Frame) {
        match frame {
            Frame::Ready { user_id, user_name } => {
                info!(user = %user_name, id = %user_id, "Logged in");
                self.identity = Some(Author::new(user_id, user_name));
                self.announce().await;
            }
            Frame::Channel { id, name } => {
                debug!(channel = %name, id = %id, "Channel known");
                match self.channels.iter_mut().find(|c| c.id == id) {
                    Some(channel) => channel.name = name,
                    None => self.channels.push(Channel::new(id, name)),
                }
            }
            Frame::Join { user_id, user_name } => {
                info!(member = %user_name, "Member joined");
                self.welcome(Author::new(user_id, user_name));
            }
            Frame::Message {
                channel_id,
                author_id,
                author_name,
                roles,
                text,
            } => {
                if self.identity.as_ref().map(|me| me.id == author_id) == Some(true) {
                    trace!(channel = %channel_id, "Ignoring own message");
                    return;
                }
                let author = Author::new(author_id, author_name).with_roles(roles);
                self.dispatch(Message::new(author, self.channel(&channel_id), text));
            }
            Frame::Ping { token } => {
                if self.client.send_frame(Frame::Pong { token }).await.is_err() {
                    warn!(relay = %self.addr, "Could not answer ping, writer closed");
                }
            }
            Frame::Error { reason } => {
                warn!(relay = %self.addr, reason = %reason, "Relay reported an error");
            }
            other => {
                debug!(keyword = other.keyword(), "Ignoring unexpected frame from relay");
            }
        }
    }

    /// Looks a channel up in the roster by id.
    fn channel(&self, id: &str) -> Channel {
        self.channels
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap_or_else(|| Channel::new(id, id))
    }

    fn dispatch(&self, message: Message) {
        let message = message.with_channels(self.channels.clone());
        let dispatcher = self.dispatcher.clone();
        let client = self.client.clone();
        self.stats.message_dispatched();

        tokio::spawn(async move {
            let outcome = dispatcher.dispatch(&client, &message).await;
            trace!(channel = %message.channel.id, outcome = ?outcome, "Message handled");
        });
    }

    async fn announce(&self) {
        for channel_id in &self.config.announce_channels {
            if let Err(e) = self
                .client
                .send_message(channel_id, STARTUP_ANNOUNCEMENT)
                .await
            {
                warn!(channel = %channel_id, error = %e, "Startup announcement failed");
            }
        }
    }

    /// Posts the welcome message and removes it again after the delay.
    fn welcome(&self, member: Author) {
        let channel_id = match &self.config.welcome_channel {
            Some(id) => id.clone(),
            None => return,
        };
        let text = self.config.welcome_text(&member.mention());
        let delay = self.config.welcome_delay;
        let client = self.client.clone();

        tokio::spawn(async move {
            let sent = match client.send_message(&channel_id, &text).await {
                Ok(sent) => sent,
                Err(e) => {
                    warn!(channel = %channel_id, error = %e, "Welcome message failed");
                    return;
                }
            };
            tokio::time::sleep(delay).await;
            if let Err(e) = client.delete_message(&sent).await {
                warn!(channel = %channel_id, error = %e, "Could not remove welcome message");
            }
        });
    }
}

/// Errors that can end a relay session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The relay sent something unparseable
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// The relay closed the connection
    #[error("Relay disconnected")]
    Disconnected,

    /// Unexpected end of stream (partial frame)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,

    /// The credential cannot be sent as a single field
    #[error("Credential is empty or contains whitespace")]
    InvalidCredential,
}
