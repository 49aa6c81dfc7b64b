//! Chat Domain Types
//!
//! Plain value types describing who said what, and where. They are built by
//! the transport for every incoming message and handed to the dispatcher;
//! nothing here outlives the handling of a single message.

use std::fmt;

/// The user who sent a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Transport-level user id, used to build mentions
    pub id: String,
    /// Full display identity, e.g. `Ryanteck#1989`
    pub name: String,
    /// Role names as the server reports them
    pub roles: Vec<String>,
}

impl Author {
    /// Creates an author with no roles.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roles: Vec::new(),
        }
    }

    /// Adds roles to this author.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// The token that pings this user when embedded in a message.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A text channel on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An incoming chat message together with the server context it arrived in.
#[derive(Debug, Clone)]
pub struct Message {
    /// Who sent it
    pub author: Author,
    /// Where it was sent
    pub channel: Channel,
    /// All channels known on the server, in roster order
    pub channels: Vec<Channel>,
    /// The raw message text
    pub text: String,
}

impl Message {
    pub fn new(author: Author, channel: Channel, text: impl Into<String>) -> Self {
        Self {
            author,
            channel,
            channels: Vec::new(),
            text: text.into(),
        }
    }

    /// Attaches the server's channel roster.
    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = channels;
        self
    }

    /// Finds a server channel by its exact name.
    pub fn find_channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }
}
