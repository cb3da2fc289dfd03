//! # World Journey Client Library
//!
//! Client-side engine that keeps a local replica of a shared world in sync
//! with every other participant. The world is made of players walking on an
//! integer grid, units placed on grid cells and a catalog of items those
//! units are built from.
//!
//! ## Architecture Overview
//!
//! All state is command-sourced: a mutation only ever happens by applying a
//! [`shared::Command`]. The same commands flow in two directions:
//!
//! ### Local Actions
//! A user action is turned into a command, applied to the local replica at
//! once and then handed to the outbound sink. The local view never waits for
//! the server.
//!
//! ### Remote Commands
//! Commands the server accepted are delivered in one global order and
//! applied in that order. Since every participant applies the same sequence
//! to the same snapshot, every replica ends up in the same state.
//!
//! ### Change Notifications
//! Applying a command yields an event (player changed, unit created, ...)
//! that the renderer or any other observer can subscribe to.
//!
//! ## Module Organization
//!
//! ### Managers (`player_manager`, `unit_manager`, `item_manager`)
//! Keyed collections for one entity kind each. The unit manager also keeps
//! the position index that guarantees at most one unit per cell.
//!
//! ### Commands (`commands`)
//! Execution of each command payload against exactly the managers it is
//! allowed to touch.
//!
//! ### Service (`service`)
//! [`service::WorldJourneyService`], the orchestrator: dispatches commands,
//! publishes events, runs the portal hook and exposes the user actions.
//!
//! ### Session (`session`)
//! [`session::WorldJourney`] follows the connection lifecycle, builds the
//! service from the world snapshot and applies every accepted command in the
//! order the server delivered it.
//!
//! ### Sink (`sink`)
//! Where outbound commands go: a tokio channel, or nowhere.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::EngineConfig;
//! use client::session::WorldJourney;
//! use shared::{Direction, ServerEvent, WorldSnapshot};
//! use tokio::sync::mpsc;
//!
//! let (outbound, _to_server) = mpsc::unbounded_channel();
//! let mut journey = WorldJourney::new(EngineConfig::default(), outbound);
//!
//! journey.enter_world("lobby");
//! journey.handle_server_event(ServerEvent::WorldEntered(WorldSnapshot::empty("lobby", "me")));
//!
//! if let Some(service) = journey.service_mut() {
//!     // Applied locally, then queued on `_to_server`
//!     let _ = service.make_player_walk(Direction::Right, 0);
//! }
//! ```
//!
//! ## Design Notes
//!
//! ### Single Writer
//! The engine is single-threaded. Commands are applied one at a time and
//! callbacks run synchronously inside the apply step.
//!
//! ### Closed Sets
//! Commands and unit kinds are closed enums matched exhaustively, so adding
//! a variant is a compile error everywhere it is not yet handled.

pub mod commands;
pub mod config;
pub mod events;
pub mod item_manager;
pub mod player_manager;
pub mod service;
pub mod session;
pub mod sink;
pub mod unit_manager;
