//! Outbound side of the transport boundary.
//!
//! Locally issued commands are applied first and then handed to a sink for
//! broadcast. The transport task on the other end of the channel owns the
//! socket.

use log::error;
use shared::Command;
use tokio::sync::mpsc;

pub trait CommandSink {
    fn send_command(&mut self, command: &Command);
}

impl CommandSink for mpsc::UnboundedSender<Command> {
    fn send_command(&mut self, command: &Command) {
        if let Err(e) = self.send(command.clone()) {
            error!("Failed to queue command {} for sending: {}", command.id(), e);
        }
    }
}

/// Sink that drops everything, for spectators and offline replays.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl CommandSink for NullSink {
    fn send_command(&mut self, _command: &Command) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::CommandKind;

    #[test]
    fn test_channel_sink_forwards_commands() {
        let (mut tx, mut rx) = mpsc::unbounded_channel();
        let command = Command::new(CommandKind::AddPerspectiveDepth);

        tx.send_command(&command);
        assert_eq!(rx.try_recv().unwrap(), command);
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (mut tx, rx) = mpsc::unbounded_channel::<Command>();
        drop(rx);
        tx.send_command(&Command::new(CommandKind::AddPerspectiveDepth));
    }
}
