//! # Seed Data Generator
//!
//! Populates a development database with a snack-bar catalog and, on
//! request, a few open orders to click through.
//!
//! ## Usage
//! ```bash
//! # Catalog only
//! cargo run -p comanda-db --bin seed
//!
//! # Catalog plus 5 open orders with items
//! cargo run -p comanda-db --bin seed -- --orders 5
//!
//! # Specify database path
//! cargo run -p comanda-db --bin seed -- --db ./data/comanda.db
//! ```

use comanda_db::{Database, DbConfig, NewLineItem};
use std::env;

/// Catalog entries: (name, price in centavos).
const CATALOG: &[(&str, i64)] = &[
    ("Água mineral", 300),
    ("Bolo de fubá", 700),
    ("Café coado", 400),
    ("Caldo de cana", 800),
    ("Cerveja lata", 700),
    ("Coxinha", 750),
    ("Empada de palmito", 850),
    ("Guaraná lata", 600),
    ("Misto quente", 1200),
    ("Pão de queijo", 500),
    ("Pastel de carne", 900),
    ("Pastel de queijo", 850),
    ("Pé de moleque", 350),
    ("Refrigerante 600ml", 800),
    ("Suco de laranja", 900),
    ("Tapioca", 1100),
];

const ORDER_NAMES: &[&str] = &[
    "Mesa 1", "Mesa 2", "Mesa 3", "Balcão", "João", "Maria", "Entrega", "Varanda",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut orders: usize = 0;
    let mut db_path = String::from("./comanda_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    orders = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Comanda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -o, --orders <N>   Open orders to create (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./comanda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Comanda Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog to avoid duplicates.");
    } else {
        let mut inserted = 0;
        for (name, price_cents) in CATALOG {
            if let Err(e) = db.products().insert(name, *price_cents).await {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
            inserted += 1;
        }
        println!("✓ Inserted {} products", inserted);
    }

    if orders > 0 {
        let catalog = db.products().list().await?;
        if catalog.is_empty() {
            println!("⚠ Catalog is empty; no orders created");
        } else {
            for n in 0..orders {
                let name = ORDER_NAMES[n % ORDER_NAMES.len()];
                let order = db.orders().create(name).await?;

                // Deterministic spread: order n gets n % 3 + 1 distinct products.
                for k in 0..=(n % 3) {
                    let product = &catalog[(n * 5 + k * 3) % catalog.len()];
                    let quantity = (k as i64 % 2) + 1;
                    db.orders()
                        .insert_item(
                            order.id,
                            &NewLineItem::product(product.id, quantity, product.price_cents),
                        )
                        .await?;
                }

                let total = db.orders().total_cents(order.id).await?;
                println!(
                    "  #{} {:<10} {}",
                    order.id,
                    order.name,
                    comanda_core::Money::from_cents(total)
                );
            }
            println!("✓ Created {} open orders", orders);
        }
    }

    db.close().await;
    println!();
    println!("Done.");
    Ok(())
}
