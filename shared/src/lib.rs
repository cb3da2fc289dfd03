//! # World Journey Shared Library
//!
//! Types shared between the engine and anything that talks to it over the
//! wire: grid value types, world entities, the command sum type, the
//! server/client protocol events and their codecs.
//!
//! Everything in here is plain data. Mutation of a live world happens in the
//! `client` crate, which executes [`Command`]s against its managers.

pub mod codec;
pub mod command;
pub mod error;
pub mod ids;
pub mod item;
pub mod player;
pub mod position;
pub mod protocol;
pub mod unit;
pub mod world;

pub use command::{Command, CommandKind};
pub use error::{CodecError, WorldError};
pub use ids::{ItemId, PlayerId, UnitId, WorldId};
pub use item::Item;
pub use player::{Player, PlayerAction, PlayerActionKind};
pub use position::{Direction, Position, PrecisePosition};
pub use protocol::{ClientEvent, ServerEvent};
pub use unit::{dispatch_unit_type, Unit, UnitKind, UnitLocator, UnitType, UnitTypeHandlers};
pub use world::{World, WorldSnapshot};

/// Cells per second covered by a walking player.
pub const PLAYER_WALK_SPEED: f32 = 4.0;
/// Render perspective depth a freshly entered world starts with.
pub const DEFAULT_PERSPECTIVE_DEPTH: u32 = 6;
