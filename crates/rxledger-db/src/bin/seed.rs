//! # Seed Data Generator
//!
//! Populates the database with a small pharmacy catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p rxledger-db --bin seed
//!
//! # Specify database path
//! cargo run -p rxledger-db --bin seed -- --db ./data/pharmacy.db
//! ```
//!
//! ## Generated Data
//! A realistic counter catalog: analgesics, antibiotics, antacids and
//! chronic-care items, each with one to three batches at staggered
//! manufacture months. One deliberately expired batch is included so the
//! write-off report has something to show.

use chrono::{Months, Utc};
use std::env;
use tracing_subscriber::EnvFilter;

use rxledger_core::dates::{default_expiry, first_of_month};
use rxledger_db::{Database, DbConfig};

/// (name, unit price in cents, shelf life in months, batch quantities)
const MEDICINES: &[(&str, i64, i64, &[i64])] = &[
    ("Paracetamol 500", 250, 24, &[120, 80]),
    ("Ibuprofen 400", 380, 36, &[60]),
    ("Aspirin 75", 550, 36, &[90, 40, 25]),
    ("Amoxicillin 250", 1200, 18, &[30, 30]),
    ("Azithromycin 500", 1850, 24, &[24]),
    ("Cetirizine 10", 420, 24, &[100]),
    ("Omeprazole 20", 760, 24, &[48, 36]),
    ("Metformin 500", 310, 36, &[150, 100]),
    ("Amlodipine 5", 490, 24, &[60]),
    ("ORS Sachet", 150, 18, &[200, 120]),
    ("Vitamin C 500", 600, 30, &[75]),
    ("Cough Syrup 100ml", 950, 12, &[40, 20]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./rxledger_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("RxLedger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./rxledger_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 RxLedger Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing catalog
    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Catalog already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let today = first_of_month(Utc::now().date_naive());
    let mut items = 0;
    let mut batches = 0;

    for (idx, (name, price_cents, shelf_months, quantities)) in MEDICINES.iter().enumerate() {
        let item = db.items().create(name, *price_cents, Some(*shelf_months)).await?;

        for (batch_idx, quantity) in quantities.iter().enumerate() {
            // Stagger manufacture months so expiries spread out; push one
            // batch of the first item fully past its shelf life.
            let months_ago = if idx == 0 && batch_idx == 0 {
                *shelf_months as u32 + 2
            } else {
                (idx as u32 * 3 + batch_idx as u32 * 5) % 12
            };
            let mfg = today
                .checked_sub_months(Months::new(months_ago))
                .unwrap_or(today);
            let exp = default_expiry(mfg, *shelf_months);
            let batch_no = format!("{}-{}", item.code.to_uppercase(), batch_idx + 1);

            db.batches()
                .upsert(&item.code, &batch_no, *quantity, *price_cents, mfg, exp)
                .await?;
            batches += 1;
        }

        items += 1;
    }

    println!("✓ Seeded {} items, {} batches", items, batches);

    // Show what the write-off report would flag
    let expired: Vec<_> = db
        .batches()
        .list(None, Some(today), true)
        .await?
        .into_iter()
        .filter(|b| b.expired)
        .collect();
    println!();
    println!("Expired stock (write-off candidates): {} batch(es)", expired.len());
    for batch in &expired {
        println!(
            "  {} / {} — {} units, expired {}",
            batch.item_name, batch.batch_no, batch.quantity, batch.exp_date
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
