//! # Room Inventory Seeder
//!
//! Creates the hotel's rooms in a fresh database.
//!
//! ## Usage
//! ```bash
//! # Seed the database from the config file / platform default
//! cargo run -p innkeeper-db --bin innkeeper-seed
//!
//! # Specify database path
//! cargo run -p innkeeper-db --bin innkeeper-seed -- --db ./data/innkeeper.db
//!
//! # Also set the GST rate
//! cargo run -p innkeeper-db --bin innkeeper-seed -- --gst 12
//! ```
//!
//! ## Generated Rooms
//! - Ground floor: 101-106, standard, 2 guests
//! - First floor: 201-206, deluxe, 3 guests
//! - Cottages: C1-C3, 4 guests
//! - Dormitory: D1, 12 beds

use innkeeper_core::{Floor, NewRoom, RoomType};
use innkeeper_db::telemetry::init_tracing;
use innkeeper_db::{Database, InnkeeperConfig};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// (prefix, count, floor, type, max occupancy)
const LAYOUT: &[(&str, u32, Floor, RoomType, i64)] = &[
    ("10", 6, Floor::Ground, RoomType::Standard, 2),
    ("20", 6, Floor::First, RoomType::Deluxe, 3),
    ("C", 3, Floor::Cottage, RoomType::Cottage, 4),
    ("D", 1, Floor::Ground, RoomType::Dormitory, 12),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<String> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut gst: Option<f64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--gst" | "-g" => {
                if i + 1 < args.len() {
                    gst = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Innkeeper Room Inventory Seeder");
                println!();
                println!("Usage: innkeeper-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: from config)");
                println!("  -c, --config <PATH>   Config file path");
                println!("  -g, --gst <PERCENT>   GST rate to store (0-100)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = InnkeeperConfig::load(config_path)?;
    init_tracing(Some(&config.logging.filter));
    if let Some(path) = db_path {
        config.database.path = PathBuf::from(path);
    }

    info!(path = %config.database.path.display(), "Opening database");
    let db = Database::new(config.to_db_config()).await?;

    if let Some(percent) = gst {
        db.settings().set_gst_rate(percent).await?;
        info!(percent, "GST rate stored");
    }

    let existing = db.rooms().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} rooms", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut created = 0;
    for (prefix, count, floor, room_type, max_occupancy) in LAYOUT {
        for n in 1..=*count {
            let room = NewRoom {
                room_number: format!("{}{}", prefix, n),
                floor: *floor,
                room_type: *room_type,
                max_occupancy: *max_occupancy,
            };
            match db.rooms().create(room).await {
                Ok(_) => created += 1,
                Err(e) => eprintln!("Failed to create room {}{}: {}", prefix, n, e),
            }
        }
    }

    println!("✓ Created {} rooms", created);
    db.close().await;
    Ok(())
}
