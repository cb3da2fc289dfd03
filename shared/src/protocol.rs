//! Messages exchanged with the world-journey server.
//!
//! The transport itself (sockets, compression, reconnection) lives outside
//! this workspace; these are the decoded shapes it hands over.

use serde::{Deserialize, Serialize};

use crate::codec::as_dto;
use crate::command::Command;
use crate::world::WorldSnapshot;

/// Server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// Initial snapshot after joining; designates the local player.
    WorldEntered(WorldSnapshot),
    /// A command the server accepted, in the order every participant sees.
    CommandSucceeded {
        #[serde(with = "as_dto")]
        command: Command,
    },
    Errored {
        message: String,
    },
}

/// Client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    Ping,
    RequestCommand {
        #[serde(with = "as_dto")]
        command: Command,
    },
}
