//! Wire codecs for commands and protocol events.
//!
//! Two encodings are supported:
//! - JSON, the format spoken by the world-journey server. Every command is a
//!   flat object carrying `id`, `timestamp`, a `name` discriminant and the
//!   camelCase payload fields of its variant.
//! - Compact binary frames (bincode) of the [`Command`] enum itself, for
//!   transports that do not need a human readable payload.
//!
//! The JSON mapping goes through [`CommandDto`]. Both directions match the
//! command kind exhaustively, so a new variant does not compile until it has
//! a wire shape.

use bincode::{deserialize, serialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::command::*;
use crate::error::CodecError;
use crate::ids::{ItemId, PlayerId, UnitId};
use crate::item::Item;
use crate::player::{Player, PlayerAction};
use crate::position::{Direction, Position};
use crate::protocol::{ClientEvent, ServerEvent};
use crate::unit::UnitLocator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDto {
    pub id: Uuid,
    pub timestamp: u64,
    #[serde(flatten)]
    pub body: CommandBodyDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandBodyDto {
    AddPlayer {
        player: Player,
    },
    #[serde(rename_all = "camelCase")]
    RemovePlayer {
        player_id: PlayerId,
    },
    #[serde(rename_all = "camelCase")]
    MovePlayer {
        player_id: PlayerId,
        position: Position,
        direction: Direction,
    },
    #[serde(rename_all = "camelCase")]
    ChangePlayerAction {
        player_id: PlayerId,
        action: PlayerAction,
    },
    #[serde(rename_all = "camelCase")]
    ChangePlayerHeldItem {
        player_id: PlayerId,
        item_id: ItemId,
    },
    #[serde(rename_all = "camelCase")]
    SendPlayerIntoPortal {
        player_id: PlayerId,
        position: Position,
    },
    #[serde(rename_all = "camelCase")]
    CreateStaticUnit {
        unit_id: UnitId,
        item_id: ItemId,
        position: Position,
        direction: Direction,
    },
    #[serde(rename_all = "camelCase")]
    CreateFenceUnit {
        unit_id: UnitId,
        item_id: ItemId,
        position: Position,
        direction: Direction,
    },
    #[serde(rename_all = "camelCase")]
    CreatePortalUnit {
        unit_id: UnitId,
        item_id: ItemId,
        position: Position,
        direction: Direction,
        target_position: Option<Position>,
    },
    #[serde(rename_all = "camelCase")]
    CreateLinkUnit {
        unit_id: UnitId,
        item_id: ItemId,
        position: Position,
        direction: Direction,
        url: String,
    },
    RemoveStaticUnit {
        target: UnitLocator,
    },
    RemoveFenceUnit {
        target: UnitLocator,
    },
    RemovePortalUnit {
        target: UnitLocator,
    },
    RemoveLinkUnit {
        target: UnitLocator,
    },
    RotateUnit {
        target: UnitLocator,
    },
    AddItem {
        item: Item,
    },
    AddPerspectiveDepth,
    SubtractPerspectiveDepth,
}

impl From<&Command> for CommandDto {
    fn from(command: &Command) -> Self {
        let body = match command.kind().clone() {
            CommandKind::AddPlayer(AddPlayer { player }) => CommandBodyDto::AddPlayer { player },
            CommandKind::RemovePlayer(RemovePlayer { player_id }) => {
                CommandBodyDto::RemovePlayer { player_id }
            }
            CommandKind::MovePlayer(MovePlayer {
                player_id,
                position,
                direction,
            }) => CommandBodyDto::MovePlayer {
                player_id,
                position,
                direction,
            },
            CommandKind::ChangePlayerAction(ChangePlayerAction { player_id, action }) => {
                CommandBodyDto::ChangePlayerAction { player_id, action }
            }
            CommandKind::ChangePlayerHeldItem(ChangePlayerHeldItem { player_id, item_id }) => {
                CommandBodyDto::ChangePlayerHeldItem { player_id, item_id }
            }
            CommandKind::SendPlayerIntoPortal(SendPlayerIntoPortal {
                player_id,
                position,
            }) => CommandBodyDto::SendPlayerIntoPortal {
                player_id,
                position,
            },
            CommandKind::CreateStaticUnit(CreateStaticUnit {
                unit_id,
                item_id,
                position,
                direction,
            }) => CommandBodyDto::CreateStaticUnit {
                unit_id,
                item_id,
                position,
                direction,
            },
            CommandKind::CreateFenceUnit(CreateFenceUnit {
                unit_id,
                item_id,
                position,
                direction,
            }) => CommandBodyDto::CreateFenceUnit {
                unit_id,
                item_id,
                position,
                direction,
            },
            CommandKind::CreatePortalUnit(CreatePortalUnit {
                unit_id,
                item_id,
                position,
                direction,
                target_position,
            }) => CommandBodyDto::CreatePortalUnit {
                unit_id,
                item_id,
                position,
                direction,
                target_position,
            },
            CommandKind::CreateLinkUnit(CreateLinkUnit {
                unit_id,
                item_id,
                position,
                direction,
                url,
            }) => CommandBodyDto::CreateLinkUnit {
                unit_id,
                item_id,
                position,
                direction,
                url,
            },
            CommandKind::RemoveStaticUnit(RemoveStaticUnit { target }) => {
                CommandBodyDto::RemoveStaticUnit { target }
            }
            CommandKind::RemoveFenceUnit(RemoveFenceUnit { target }) => {
                CommandBodyDto::RemoveFenceUnit { target }
            }
            CommandKind::RemovePortalUnit(RemovePortalUnit { target }) => {
                CommandBodyDto::RemovePortalUnit { target }
            }
            CommandKind::RemoveLinkUnit(RemoveLinkUnit { target }) => {
                CommandBodyDto::RemoveLinkUnit { target }
            }
            CommandKind::RotateUnit(RotateUnit { target }) => CommandBodyDto::RotateUnit { target },
            CommandKind::AddItem(AddItem { item }) => CommandBodyDto::AddItem { item },
            CommandKind::AddPerspectiveDepth => CommandBodyDto::AddPerspectiveDepth,
            CommandKind::SubtractPerspectiveDepth => CommandBodyDto::SubtractPerspectiveDepth,
        };

        CommandDto {
            id: command.id(),
            timestamp: command.timestamp(),
            body,
        }
    }
}

impl From<CommandDto> for Command {
    fn from(dto: CommandDto) -> Self {
        let kind = match dto.body {
            CommandBodyDto::AddPlayer { player } => CommandKind::AddPlayer(AddPlayer { player }),
            CommandBodyDto::RemovePlayer { player_id } => {
                CommandKind::RemovePlayer(RemovePlayer { player_id })
            }
            CommandBodyDto::MovePlayer {
                player_id,
                position,
                direction,
            } => CommandKind::MovePlayer(MovePlayer {
                player_id,
                position,
                direction,
            }),
            CommandBodyDto::ChangePlayerAction { player_id, action } => {
                CommandKind::ChangePlayerAction(ChangePlayerAction { player_id, action })
            }
            CommandBodyDto::ChangePlayerHeldItem { player_id, item_id } => {
                CommandKind::ChangePlayerHeldItem(ChangePlayerHeldItem { player_id, item_id })
            }
            CommandBodyDto::SendPlayerIntoPortal {
                player_id,
                position,
            } => CommandKind::SendPlayerIntoPortal(SendPlayerIntoPortal {
                player_id,
                position,
            }),
            CommandBodyDto::CreateStaticUnit {
                unit_id,
                item_id,
                position,
                direction,
            } => CommandKind::CreateStaticUnit(CreateStaticUnit {
                unit_id,
                item_id,
                position,
                direction,
            }),
            CommandBodyDto::CreateFenceUnit {
                unit_id,
                item_id,
                position,
                direction,
            } => CommandKind::CreateFenceUnit(CreateFenceUnit {
                unit_id,
                item_id,
                position,
                direction,
            }),
            CommandBodyDto::CreatePortalUnit {
                unit_id,
                item_id,
                position,
                direction,
                target_position,
            } => CommandKind::CreatePortalUnit(CreatePortalUnit {
                unit_id,
                item_id,
                position,
                direction,
                target_position,
            }),
            CommandBodyDto::CreateLinkUnit {
                unit_id,
                item_id,
                position,
                direction,
                url,
            } => CommandKind::CreateLinkUnit(CreateLinkUnit {
                unit_id,
                item_id,
                position,
                direction,
                url,
            }),
            CommandBodyDto::RemoveStaticUnit { target } => {
                CommandKind::RemoveStaticUnit(RemoveStaticUnit { target })
            }
            CommandBodyDto::RemoveFenceUnit { target } => {
                CommandKind::RemoveFenceUnit(RemoveFenceUnit { target })
            }
            CommandBodyDto::RemovePortalUnit { target } => {
                CommandKind::RemovePortalUnit(RemovePortalUnit { target })
            }
            CommandBodyDto::RemoveLinkUnit { target } => {
                CommandKind::RemoveLinkUnit(RemoveLinkUnit { target })
            }
            CommandBodyDto::RotateUnit { target } => CommandKind::RotateUnit(RotateUnit { target }),
            CommandBodyDto::AddItem { item } => CommandKind::AddItem(AddItem { item }),
            CommandBodyDto::AddPerspectiveDepth => CommandKind::AddPerspectiveDepth,
            CommandBodyDto::SubtractPerspectiveDepth => CommandKind::SubtractPerspectiveDepth,
        };

        Command::load(dto.id, dto.timestamp, kind)
    }
}

/// `#[serde(with = ...)]` adapter that puts a [`Command`] on the wire as its
/// [`CommandDto`].
pub mod as_dto {
    use super::*;

    pub fn serialize<S: Serializer>(command: &Command, serializer: S) -> Result<S::Ok, S::Error> {
        CommandDto::from(command).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Command, D::Error> {
        CommandDto::deserialize(deserializer).map(Command::from)
    }
}

pub fn command_to_json(command: &Command) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&CommandDto::from(command))?)
}

pub fn command_from_json(json: &str) -> Result<Command, CodecError> {
    let dto: CommandDto = serde_json::from_str(json)?;
    Ok(Command::from(dto))
}

pub fn command_to_bytes(command: &Command) -> Result<Vec<u8>, CodecError> {
    Ok(serialize(command)?)
}

pub fn command_from_bytes(bytes: &[u8]) -> Result<Command, CodecError> {
    Ok(deserialize(bytes)?)
}

pub fn encode_server_event(event: &ServerEvent) -> Result<String, CodecError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_server_event(json: &str) -> Result<ServerEvent, CodecError> {
    Ok(serde_json::from_str(json)?)
}

pub fn encode_client_event(event: &ClientEvent) -> Result<String, CodecError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_client_event(json: &str) -> Result<ClientEvent, CodecError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PrecisePosition;
    use crate::unit::UnitType;
    use serde_json::json;

    #[test]
    fn test_move_player_json_shape() {
        let command = Command::load(
            Uuid::nil(),
            1_700_000_000_000,
            MovePlayer {
                player_id: PlayerId::from("p1"),
                position: Position::new(3, 4),
                direction: Direction::Right,
            },
        );

        let value: serde_json::Value =
            serde_json::from_str(&command_to_json(&command).unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "timestamp": 1_700_000_000_000u64,
                "name": "MOVE_PLAYER",
                "playerId": "p1",
                "position": { "x": 3, "z": 4 },
                "direction": 1,
            })
        );
    }

    #[test]
    fn test_parse_server_issued_json() {
        let json = r#"{
            "id": "5b0e2c36-7c4b-4b0c-9a53-0d3f1a6f3a11",
            "timestamp": 99,
            "name": "CREATE_PORTAL_UNIT",
            "unitId": "u-7",
            "itemId": "gate",
            "position": { "x": 3, "z": 3 },
            "direction": 0,
            "targetPosition": { "x": 9, "z": 9 }
        }"#;

        let command = command_from_json(json).unwrap();
        assert_eq!(command.timestamp(), 99);
        match command.kind() {
            CommandKind::CreatePortalUnit(payload) => {
                assert_eq!(payload.unit_id, UnitId::from("u-7"));
                assert_eq!(payload.target_position, Some(Position::new(9, 9)));
                assert_eq!(payload.direction, Direction::Up);
            }
            other => panic!("Wrong command after decoding: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let json = r#"{"id":"5b0e2c36-7c4b-4b0c-9a53-0d3f1a6f3a11","timestamp":1,"name":"EXPLODE"}"#;
        assert!(matches!(command_from_json(json), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_bad_direction_is_rejected() {
        let json = r#"{"id":"5b0e2c36-7c4b-4b0c-9a53-0d3f1a6f3a11","timestamp":1,"name":"MOVE_PLAYER","playerId":"p1","position":{"x":0,"z":0},"direction":8}"#;
        assert!(command_from_json(json).is_err());
    }

    #[test]
    fn test_change_player_action_binary_frame() {
        let command = Command::new(ChangePlayerAction {
            player_id: PlayerId::from("p1"),
            action: PlayerAction::walk(PrecisePosition::new(1.5, 2.0), Direction::Left, 12),
        });

        let bytes = command_to_bytes(&command).unwrap();
        assert_eq!(command_from_bytes(&bytes).unwrap(), command);
    }

    #[test]
    fn test_add_item_json_round_trip() {
        let command = Command::new(AddItem {
            item: Item::new("torch", "Torch", UnitType::Static),
        });
        let decoded = command_from_json(&command_to_json(&command).unwrap()).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let command = Command::new(CommandKind::AddPerspectiveDepth);
        let bytes = command_to_bytes(&command).unwrap();
        assert!(matches!(
            command_from_bytes(&bytes[..bytes.len() / 2]),
            Err(CodecError::Binary(_))
        ));
    }
}
