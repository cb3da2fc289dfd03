//! Connection-level driver around [`WorldJourneyService`].
//!
//! The session follows the transport lifecycle, builds the service when
//! the server delivers the world snapshot, and feeds every accepted command
//! into it in delivery order, our own echoed commands included.

use log::{debug, info, warn};
use shared::{Command, ServerEvent, WorldId, WorldSnapshot};
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::service::WorldJourneyService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Waiting,
    Connecting,
    Open,
    Disconnecting,
    Disconnected,
}

pub struct WorldJourney {
    status: ConnectionStatus,
    world_id: Option<WorldId>,
    config: EngineConfig,
    outbound: mpsc::UnboundedSender<Command>,
    service: Option<WorldJourneyService>,
}

impl WorldJourney {
    /// `outbound` receives every command this client wants broadcast.
    pub fn new(config: EngineConfig, outbound: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            status: ConnectionStatus::Waiting,
            world_id: None,
            config,
            outbound,
            service: None,
        }
    }

    pub fn enter_world(&mut self, world_id: impl Into<WorldId>) {
        let world_id = world_id.into();
        info!("Entering world {}...", world_id);
        self.world_id = Some(world_id);
        self.status = ConnectionStatus::Connecting;
    }

    pub fn on_open(&mut self) {
        debug!("Connection open, waiting for world snapshot");
        self.status = ConnectionStatus::Open;
    }

    pub fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::WorldEntered(snapshot) => self.start_journey(snapshot),

            ServerEvent::CommandSucceeded { command } => {
                let Some(service) = self.service.as_mut() else {
                    warn!(
                        "Received command {} before entering a world",
                        command.name()
                    );
                    return;
                };

                // Failures are logged by the service; the stream keeps going.
                let _ = service.execute_command(&command);
            }

            ServerEvent::Errored { message } => {
                warn!("Server error: {}", message);
            }
        }
    }

    fn start_journey(&mut self, snapshot: WorldSnapshot) {
        if let Some(expected) = &self.world_id {
            if *expected != snapshot.world.id {
                warn!(
                    "Expected world {} but server sent {}",
                    expected, snapshot.world.id
                );
            }
        }
        if let Some(mut previous) = self.service.take() {
            previous.destroy();
        }

        self.world_id = Some(snapshot.world.id.clone());
        self.service = Some(WorldJourneyService::new(
            snapshot,
            self.config,
            Box::new(self.outbound.clone()),
        ));
        self.status = ConnectionStatus::Open;
    }

    pub fn leave_world(&mut self) {
        if let Some(service) = self.service.as_mut() {
            service.destroy();
        }
        self.service = None;
        self.status = ConnectionStatus::Disconnecting;
    }

    pub fn on_close(&mut self) {
        if let Some(mut service) = self.service.take() {
            service.destroy();
        }
        info!("Disconnected");
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn world_id(&self) -> Option<&WorldId> {
        self.world_id.as_ref()
    }

    pub fn service(&self) -> Option<&WorldJourneyService> {
        self.service.as_ref()
    }

    pub fn service_mut(&mut self) -> Option<&mut WorldJourneyService> {
        self.service.as_mut()
    }
}
