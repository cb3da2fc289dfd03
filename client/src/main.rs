use clap::Parser;
use client::config::EngineConfig;
use client::session::WorldJourney;
use log::{info, warn};
use shared::codec::{decode_server_event, encode_client_event};
use shared::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recording of server events, one JSON object per line
    #[arg(short = 'l', long)]
    log: String,

    /// World to enter
    #[arg(short = 'w', long, default_value = "default")]
    world: String,

    /// Initial perspective depth
    #[arg(short = 'p', long, default_value_t = shared::DEFAULT_PERSPECTIVE_DEPTH)]
    perspective_depth: u32,

    /// Walking speed in cells per second
    #[arg(long, default_value_t = shared::PLAYER_WALK_SPEED)]
    walk_speed: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = EngineConfig {
        perspective_depth: args.perspective_depth,
        walk_speed: args.walk_speed,
    };

    info!("Replaying {}", args.log);
    let recording = tokio::fs::read_to_string(&args.log).await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outbound = tokio::spawn(async move {
        let mut sent = 0usize;
        while let Some(command) = rx.recv().await {
            match encode_client_event(&ClientEvent::RequestCommand { command }) {
                Ok(json) => info!("Outbound: {}", json),
                Err(e) => warn!("Failed to encode outbound command: {}", e),
            }
            sent += 1;
        }
        sent
    });

    let mut journey = WorldJourney::new(config, tx);
    journey.enter_world(args.world.as_str());
    journey.on_open();

    let mut replayed = 0usize;
    for (line_number, line) in recording.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match decode_server_event(line) {
            Ok(event) => {
                if let ServerEvent::Errored { .. } = &event {
                    warn!("Recorded server error on line {}", line_number + 1);
                }
                journey.handle_server_event(event);
                replayed += 1;
            }
            Err(e) => warn!("Skipping line {}: {}", line_number + 1, e),
        }
    }

    match journey.service() {
        Some(service) => {
            info!(
                "Replayed {} events into world {}: {} players, {} units, {} items, perspective depth {}",
                replayed,
                service.world().id,
                service.get_players().len(),
                service.get_units().len(),
                service.get_items().len(),
                service.get_perspective_depth()
            );
            let unresolved = service.get_placeholder_item_ids();
            if !unresolved.is_empty() {
                info!("{} item ids still unresolved", unresolved.len());
            }
        }
        None => warn!("Recording never entered a world"),
    }

    journey.leave_world();
    journey.on_close();
    drop(journey);

    let sent = outbound.await?;
    info!("{} commands queued for the server", sent);

    Ok(())
}
