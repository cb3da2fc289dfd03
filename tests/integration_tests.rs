//! Integration tests for the world-journey engine
//!
//! These tests drive the client library through its public surface, the
//! same way a transport and a renderer would.

use client::config::EngineConfig;
use client::events::{WorldEvent, WorldEventKind};
use client::service::WorldJourneyService;
use client::session::WorldJourney;
use client::sink::NullSink;
use shared::command::{
    AddItem, AddPlayer, ChangePlayerAction, ChangePlayerHeldItem, CreateFenceUnit, CreateLinkUnit,
    CreatePortalUnit, CreateStaticUnit, MovePlayer, RemoveFenceUnit, RemoveLinkUnit, RemovePlayer,
    RemovePortalUnit, RemoveStaticUnit, RotateUnit, SendPlayerIntoPortal,
};
use shared::{
    Command, CommandKind, Direction, Item, ItemId, Player, PlayerAction, PlayerId, Position,
    PrecisePosition, ServerEvent, Unit, UnitKind, UnitLocator, UnitType, WorldError, WorldSnapshot,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tokio::sync::mpsc;

fn empty_service(my_player_id: &str) -> WorldJourneyService {
    WorldJourneyService::new(
        WorldSnapshot::empty("w1", my_player_id),
        EngineConfig::default(),
        Box::new(NullSink),
    )
}

fn player(id: &str, x: i32, z: i32, direction: Direction) -> Player {
    Player::new(id, id, Position::new(x, z), direction, 0)
}

fn sorted_state(service: &WorldJourneyService) -> (Vec<Player>, Vec<Unit>) {
    let mut players: Vec<Player> = service.get_players().into_iter().cloned().collect();
    players.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    let mut units: Vec<Unit> = service.get_units().into_iter().cloned().collect();
    units.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    (players, units)
}

/// SCENARIO TESTS
mod scenario_tests {
    use super::*;

    /// Tests that an added player designated as local is readable as my player
    #[test]
    fn add_player_then_read_my_player() {
        let mut service = empty_service("p1");

        service
            .execute_command(&Command::new(AddPlayer {
                player: player("p1", 0, 0, Direction::Down),
            }))
            .unwrap();

        let me = service.get_my_player().unwrap();
        assert_eq!(me.position, Position::new(0, 0));
        assert_eq!(me.direction, Direction::Down);
    }

    /// Tests that a second unit on an occupied cell is refused and the first one stays
    #[test]
    fn second_unit_on_same_cell_is_rejected() {
        let mut service = empty_service("p1");
        let stone = Command::new(CreateStaticUnit::new("stone", Position::new(2, 2), Direction::Up));
        let torch = Command::new(CreateStaticUnit::new("torch", Position::new(2, 2), Direction::Up));

        service.execute_command(&stone).unwrap();
        let err = service.execute_command(&torch).unwrap_err();

        assert!(matches!(
            err,
            WorldError::OccupiedPosition { position, .. } if position == Position::new(2, 2)
        ));
        let unit = service.get_unit(&Position::new(2, 2)).unwrap();
        assert_eq!(unit.item_id, ItemId::from("stone"));
        assert_eq!(service.get_units().len(), 1);
    }

    /// Tests that moving the local player onto a linked portal teleports and broadcasts the portal command
    #[test]
    fn moving_onto_linked_portal_teleports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut snapshot = WorldSnapshot::empty("w1", "p1");
        snapshot.players = vec![player("p1", 0, 0, Direction::Down)];
        snapshot.units = vec![Unit::new(
            "gate",
            "gate-item",
            Position::new(3, 3),
            Direction::Up,
            UnitKind::Portal {
                target_position: Some(Position::new(9, 9)),
            },
        )];
        let mut service = WorldJourneyService::new(snapshot, EngineConfig::default(), Box::new(tx));

        service
            .execute_command(&Command::new(MovePlayer {
                player_id: PlayerId::from("p1"),
                position: Position::new(3, 3),
                direction: Direction::Right,
            }))
            .unwrap();

        assert_eq!(service.get_my_player().unwrap().position, Position::new(9, 9));

        let synthesized = rx.try_recv().unwrap();
        assert_eq!(
            synthesized.kind(),
            &CommandKind::SendPlayerIntoPortal(SendPlayerIntoPortal {
                player_id: PlayerId::from("p1"),
                position: Position::new(3, 3),
            })
        );
        assert!(rx.try_recv().is_err());
    }

    /// Tests that removing a fence from an empty cell changes nothing and raises nothing
    #[test]
    fn removing_missing_fence_is_silent() {
        let mut service = empty_service("p1");
        service
            .execute_command(&Command::new(CreateStaticUnit::new(
                "stone",
                Position::new(1, 1),
                Direction::Up,
            )))
            .unwrap();
        let before = sorted_state(&service);

        let result = service.execute_command(&Command::new(RemoveFenceUnit {
            target: UnitLocator::Position(Position::new(5, 5)),
        }));

        assert!(result.is_ok());
        assert_eq!(sorted_state(&service), before);
    }
}

/// WORLD INVARIANT TESTS
mod invariant_tests {
    use super::*;

    fn assert_one_unit_per_cell(service: &WorldJourneyService) {
        let mut seen = HashSet::new();
        for unit in service.get_units() {
            assert!(
                seen.insert(unit.position),
                "two units share ({}, {})",
                unit.position.x,
                unit.position.z
            );
            assert_eq!(service.get_unit(&unit.position).unwrap().id, unit.id);
        }
    }

    /// Tests that no sequence of unit commands ever puts two units on one cell
    #[test]
    fn no_two_units_share_a_cell() {
        let mut service = empty_service("p1");
        let sequence: Vec<Command> = vec![
            Command::new(CreateStaticUnit::new("a", Position::new(0, 0), Direction::Up)),
            Command::new(CreateFenceUnit::new("b", Position::new(0, 0), Direction::Up)),
            Command::new(CreateFenceUnit::new("b", Position::new(1, 0), Direction::Up)),
            Command::new(CreatePortalUnit::new("c", Position::new(1, 0), Direction::Up, None)),
            Command::new(RemoveStaticUnit {
                target: UnitLocator::Position(Position::new(0, 0)),
            }),
            Command::new(CreatePortalUnit::new("c", Position::new(0, 0), Direction::Up, None)),
            Command::new(CreateLinkUnit::new("d", Position::new(0, 0), Direction::Up, "https://a")),
            Command::new(RotateUnit {
                target: UnitLocator::Position(Position::new(1, 0)),
            }),
            Command::new(CreateLinkUnit::new("d", Position::new(2, 0), Direction::Up, "https://a")),
        ];

        for command in &sequence {
            let _ = service.execute_command(command);
            assert_one_unit_per_cell(&service);
        }
        assert_eq!(service.get_units().len(), 3);
    }

    /// Tests that removing the same player twice equals removing it once
    #[test]
    fn remove_player_twice_is_idempotent() {
        let mut service = empty_service("p1");
        service
            .execute_command(&Command::new(AddPlayer {
                player: player("p2", 1, 1, Direction::Up),
            }))
            .unwrap();
        let remove = Command::new(RemovePlayer {
            player_id: PlayerId::from("p2"),
        });

        service.execute_command(&remove).unwrap();
        let once = sorted_state(&service);
        service.execute_command(&remove).unwrap();

        assert_eq!(sorted_state(&service), once);
        assert!(service.get_player(&PlayerId::from("p2")).is_none());
    }

    /// Tests that removing the same static unit twice equals removing it once
    #[test]
    fn remove_static_unit_twice_is_idempotent() {
        let mut service = empty_service("p1");
        service
            .execute_command(&Command::new(CreateStaticUnit::new(
                "stone",
                Position::new(4, 4),
                Direction::Up,
            )))
            .unwrap();
        let remove = Command::new(RemoveStaticUnit {
            target: UnitLocator::Position(Position::new(4, 4)),
        });

        service.execute_command(&remove).unwrap();
        let once = sorted_state(&service);
        service.execute_command(&remove).unwrap();

        assert_eq!(sorted_state(&service), once);
        assert!(service.get_units().is_empty());
    }

    /// Tests clockwise rotation with wraparound after four steps
    #[test]
    fn rotating_four_times_restores_direction() {
        let mut service = empty_service("p1");
        service
            .execute_command(&Command::new(CreateFenceUnit::new(
                "fence",
                Position::new(0, 0),
                Direction::Left,
            )))
            .unwrap();

        let rotate = RotateUnit {
            target: UnitLocator::Position(Position::new(0, 0)),
        };
        let mut seen = Vec::new();
        for _ in 0..4 {
            service.execute_command(&Command::new(rotate.clone())).unwrap();
            seen.push(service.get_unit(&Position::new(0, 0)).unwrap().direction);
        }

        assert_eq!(
            seen,
            vec![Direction::Up, Direction::Right, Direction::Down, Direction::Left]
        );
    }

    /// Tests that two replicas fed the same commands end in the same state
    #[test]
    fn replaying_the_same_sequence_gives_the_same_world() {
        let commands = vec![
            Command::new(AddPlayer {
                player: player("p1", 0, 0, Direction::Down),
            }),
            Command::new(AddPlayer {
                player: player("p2", 5, 5, Direction::Up),
            }),
            Command::new(CreateStaticUnit::new("stone", Position::new(1, 1), Direction::Up)),
            Command::new(CreatePortalUnit::new(
                "gate",
                Position::new(2, 2),
                Direction::Up,
                Some(Position::new(-4, 7)),
            )),
            Command::new(MovePlayer {
                player_id: PlayerId::from("p2"),
                position: Position::new(2, 2),
                direction: Direction::Right,
            }),
            Command::new(SendPlayerIntoPortal {
                player_id: PlayerId::from("p2"),
                position: Position::new(2, 2),
            }),
            Command::new(RotateUnit {
                target: UnitLocator::Position(Position::new(1, 1)),
            }),
            Command::new(ChangePlayerHeldItem {
                player_id: PlayerId::from("p1"),
                item_id: ItemId::from("stone"),
            }),
            Command::new(RemovePlayer {
                player_id: PlayerId::from("p1"),
            }),
        ];

        let mut first = empty_service("observer");
        let mut second = empty_service("observer");
        for command in &commands {
            let _ = first.execute_command(command);
        }
        for command in &commands {
            let _ = second.execute_command(command);
        }

        assert_eq!(sorted_state(&first), sorted_state(&second));
        assert_eq!(
            first.get_player(&PlayerId::from("p2")).unwrap().position,
            Position::new(-4, 7)
        );
    }
}

/// WIRE PROTOCOL TESTS
mod protocol_tests {
    use super::*;
    use shared::codec::{
        command_from_bytes, command_from_json, command_to_bytes, command_to_json,
        decode_server_event, encode_server_event,
    };

    fn every_command() -> Vec<Command> {
        vec![
            Command::new(AddPlayer {
                player: player("p1", 1, -2, Direction::Left),
            }),
            Command::new(RemovePlayer {
                player_id: PlayerId::from("p1"),
            }),
            Command::new(MovePlayer {
                player_id: PlayerId::from("p1"),
                position: Position::new(3, 4),
                direction: Direction::Up,
            }),
            Command::new(ChangePlayerAction {
                player_id: PlayerId::from("p1"),
                action: PlayerAction::walk(PrecisePosition::new(1.5, 2.0), Direction::Right, 42),
            }),
            Command::new(ChangePlayerHeldItem {
                player_id: PlayerId::from("p1"),
                item_id: ItemId::from("torch"),
            }),
            Command::new(SendPlayerIntoPortal {
                player_id: PlayerId::from("p1"),
                position: Position::new(3, 3),
            }),
            Command::new(CreateStaticUnit::new("stone", Position::new(0, 1), Direction::Down)),
            Command::new(CreateFenceUnit::new("fence", Position::new(0, 2), Direction::Left)),
            Command::new(CreatePortalUnit::new(
                "gate",
                Position::new(0, 3),
                Direction::Up,
                Some(Position::new(9, 9)),
            )),
            Command::new(CreateLinkUnit::new(
                "sign",
                Position::new(0, 4),
                Direction::Right,
                "https://example.com",
            )),
            Command::new(RemoveStaticUnit {
                target: UnitLocator::Position(Position::new(0, 1)),
            }),
            Command::new(RemoveFenceUnit {
                target: UnitLocator::Id("u-fence".into()),
            }),
            Command::new(RemovePortalUnit {
                target: UnitLocator::Position(Position::new(0, 3)),
            }),
            Command::new(RemoveLinkUnit {
                target: UnitLocator::Position(Position::new(0, 4)),
            }),
            Command::new(RotateUnit {
                target: UnitLocator::Position(Position::new(0, 2)),
            }),
            Command::new(AddItem {
                item: Item::new("torch", "Torch", UnitType::Static),
            }),
            Command::new(CommandKind::AddPerspectiveDepth),
            Command::new(CommandKind::SubtractPerspectiveDepth),
        ]
    }

    /// Tests JSON round-trip for every command variant
    #[test]
    fn every_command_survives_json() {
        for command in every_command() {
            let json = command_to_json(&command).unwrap();
            let decoded = command_from_json(&json).unwrap();
            assert_eq!(decoded, command, "{} changed over JSON", command.name());
        }
    }

    /// Tests bincode round-trip for every command variant
    #[test]
    fn every_command_survives_binary_frames() {
        for command in every_command() {
            let bytes = command_to_bytes(&command).unwrap();
            let decoded = command_from_bytes(&bytes).unwrap();
            assert_eq!(decoded, command, "{} changed over bincode", command.name());
        }
    }

    /// Tests that every command variant has its own wire name
    #[test]
    fn command_names_are_distinct() {
        let names: HashSet<&str> = every_command().iter().map(Command::name).collect();
        assert_eq!(names.len(), every_command().len());
    }

    /// Tests JSON round-trip for every server event
    #[test]
    fn server_events_round_trip() {
        let mut snapshot = WorldSnapshot::empty("w1", "p1");
        snapshot.players = vec![player("p1", 0, 0, Direction::Down)];

        let events = vec![
            ServerEvent::WorldEntered(snapshot),
            ServerEvent::CommandSucceeded {
                command: Command::new(CommandKind::AddPerspectiveDepth),
            },
            ServerEvent::Errored {
                message: "world is full".to_string(),
            },
        ];

        for event in events {
            let json = encode_server_event(&event).unwrap();
            assert_eq!(decode_server_event(&json).unwrap(), event);
        }
    }
}

/// SESSION TESTS
mod session_tests {
    use super::*;

    fn session_for(my_player_id: &str) -> (WorldJourney, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut journey = WorldJourney::new(EngineConfig::default(), tx);
        let mut snapshot = WorldSnapshot::empty("w1", my_player_id);
        snapshot.players = vec![
            player("p1", 0, 0, Direction::Down),
            player("p2", 8, 8, Direction::Up),
        ];
        snapshot.items = vec![Item::new("stone", "Stone", UnitType::Static)];

        journey.enter_world("w1");
        journey.on_open();
        journey.handle_server_event(ServerEvent::WorldEntered(snapshot));
        (journey, rx)
    }

    fn entered_session() -> (WorldJourney, mpsc::UnboundedReceiver<Command>) {
        session_for("p1")
    }

    fn deliver(journeys: [&mut WorldJourney; 2], stream: &[Command]) {
        for journey in journeys {
            for command in stream {
                journey.handle_server_event(ServerEvent::CommandSucceeded {
                    command: command.clone(),
                });
            }
        }
    }

    /// Tests that local actions are applied before they reach the outbound queue
    #[test]
    fn local_action_is_visible_before_it_is_sent() {
        let (mut journey, mut rx) = entered_session();
        let service = journey.service_mut().unwrap();

        service.change_player_held_item(ItemId::from("stone")).unwrap();
        service.create_unit("").unwrap();

        assert!(service.get_unit(&Position::new(0, 1)).is_some());
        assert_eq!(rx.try_recv().unwrap().name(), "CHANGE_PLAYER_HELD_ITEM");
        assert_eq!(rx.try_recv().unwrap().name(), "CREATE_STATIC_UNIT");
    }

    /// Tests that the issuing replica and an observer converge when a remote command lands between a local command and its echo
    #[test]
    fn issuer_and_observer_converge_on_server_order() {
        let (mut issuer, mut issuer_rx) = session_for("p1");
        let (mut observer, _observer_rx) = session_for("p2");

        let service = issuer.service_mut().unwrap();
        service.change_player_held_item(ItemId::from("stone")).unwrap();
        service.create_unit("").unwrap();
        let local: Vec<Command> = std::iter::from_fn(|| issuer_rx.try_recv().ok()).collect();
        assert_eq!(local.len(), 2);

        // Someone else's removal is ordered between our two commands.
        let stream = vec![
            local[0].clone(),
            Command::new(RemoveStaticUnit {
                target: UnitLocator::Position(Position::new(0, 1)),
            }),
            local[1].clone(),
        ];
        deliver([&mut issuer, &mut observer], &stream);

        let issuer_state = sorted_state(issuer.service().unwrap());
        let observer_state = sorted_state(observer.service().unwrap());
        assert_eq!(issuer_state, observer_state);
        assert_eq!(issuer_state.1.len(), 1);
    }

    /// Tests that a local rotation and a remote rotation of the same unit converge on every replica
    #[test]
    fn rotations_converge_when_interleaved() {
        let (mut issuer, mut issuer_rx) = session_for("p1");
        let (mut observer, _observer_rx) = session_for("p2");
        let place = Command::new(CreateStaticUnit::new("stone", Position::new(0, 1), Direction::Up));
        deliver([&mut issuer, &mut observer], &[place]);

        issuer.service_mut().unwrap().rotate_unit().unwrap();
        let local_rotation = issuer_rx.try_recv().unwrap();

        let stream = vec![
            Command::new(RotateUnit {
                target: UnitLocator::Position(Position::new(0, 1)),
            }),
            local_rotation,
        ];
        deliver([&mut issuer, &mut observer], &stream);

        for journey in [&issuer, &observer] {
            let unit = journey.service().unwrap().get_unit(&Position::new(0, 1)).cloned();
            assert_eq!(unit.map(|u| u.direction), Some(Direction::Down));
        }
        assert_eq!(
            sorted_state(issuer.service().unwrap()),
            sorted_state(observer.service().unwrap())
        );
    }

    /// Tests that re-applying the echo of our own commands leaves the world as it was
    #[test]
    fn own_echoes_leave_world_unchanged() {
        let (mut journey, mut rx) = entered_session();
        journey
            .service_mut()
            .unwrap()
            .change_player_held_item(ItemId::from("stone"))
            .unwrap();
        journey.service_mut().unwrap().create_unit("").unwrap();

        let echoes: Vec<Command> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        for command in echoes {
            journey.handle_server_event(ServerEvent::CommandSucceeded { command });
        }

        let service = journey.service().unwrap();
        assert_eq!(service.get_units().len(), 1);
    }

    /// Tests that commands from the server reach subscribers
    #[test]
    fn remote_commands_fire_subscriptions() {
        let (mut journey, _rx) = entered_session();
        let added = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&added);
        journey
            .service_mut()
            .unwrap()
            .subscribe(WorldEventKind::PlayerAdded, move |event| {
                if let WorldEvent::PlayerAdded(player) = event {
                    log.borrow_mut().push(player.id.clone());
                }
            });

        journey.handle_server_event(ServerEvent::CommandSucceeded {
            command: Command::new(AddPlayer {
                player: player("p2", 4, 4, Direction::Up),
            }),
        });

        assert_eq!(*added.borrow(), vec![PlayerId::from("p2")]);
        assert_eq!(journey.service().unwrap().get_other_players().len(), 1);
    }

    /// Tests placeholder discovery on unit creation and resolution when the item arrives
    #[test]
    fn placeholder_resolves_when_item_arrives() {
        let (mut journey, _rx) = entered_session();

        journey.handle_server_event(ServerEvent::CommandSucceeded {
            command: Command::new(CreateFenceUnit::new("unknown", Position::new(6, 6), Direction::Up)),
        });
        assert_eq!(
            journey.service().unwrap().get_placeholder_item_ids(),
            vec![ItemId::from("unknown")]
        );

        journey.handle_server_event(ServerEvent::CommandSucceeded {
            command: Command::new(AddItem {
                item: Item::new("unknown", "Fence", UnitType::Fence),
            }),
        });
        let service = journey.service().unwrap();
        assert!(service.get_placeholder_item_ids().is_empty());
        assert!(service.get_item(&ItemId::from("unknown")).is_some());
    }

    /// Tests interpolated position of a walking player
    #[test]
    fn walking_player_position_interpolates() {
        use assert_approx_eq::assert_approx_eq;

        let (mut journey, _rx) = entered_session();
        journey
            .service_mut()
            .unwrap()
            .make_player_walk(Direction::Right, 10_000)
            .unwrap();

        let service = journey.service().unwrap();
        let precise = service
            .get_player_precise_position(&PlayerId::from("p1"), 10_250)
            .unwrap();
        assert_approx_eq!(precise.x, 1.0);
        assert_approx_eq!(precise.z, 0.0);
    }
}
