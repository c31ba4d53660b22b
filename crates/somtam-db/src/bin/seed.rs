//! # Seed Data Generator
//!
//! Populates the database with a demo Isan menu for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p somtam-db --bin seed
//!
//! # Specify database path
//! cargo run -p somtam-db --bin seed -- --db ./data/somtam.db
//! ```
//!
//! ## Generated Data
//! - 6 categories (som tam, larb, soups, grill, rice, drinks)
//! - 8 add-ons, offered on the som tam and larb dishes
//! - 23 menu items
//! - Default shop settings (7% VAT)

use chrono::Utc;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use somtam_core::{Addon, Category, MenuItem, ShopSettings};
use somtam_db::{Database, DbConfig};

/// `(id, name, icon)` in menu order.
const CATEGORIES: &[(&str, &str, &str)] = &[
    ("somtam", "Som Tam", "🥗"),
    ("larb", "Larb / Nam Tok", "🍖"),
    ("soup", "Soups & Curries", "🍲"),
    ("grill", "Grilled & Fried", "🍗"),
    ("rice", "Rice", "🍚"),
    ("drinks", "Drinks", "🥤"),
];

/// `(id, name, price in baht)`.
const ADDONS: &[(&str, &str, i64)] = &[
    ("salted-egg", "Salted Egg", 10),
    ("pla-ra", "Fermented Fish Sauce", 5),
    ("dried-shrimp", "Dried Shrimp", 15),
    ("crab-roe", "Crab Roe", 20),
    ("moo-yor", "Vietnamese Pork Sausage", 10),
    ("sticky-rice", "Sticky Rice", 10),
    ("fresh-veg", "Fresh Vegetables", 10),
    ("ice", "Ice", 5),
];

const SOMTAM_ADDONS: &[&str] = &["salted-egg", "pla-ra", "dried-shrimp", "crab-roe"];
const LARB_ADDONS: &[&str] = &["sticky-rice", "fresh-veg"];

struct Dish {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price: i64,
    category: &'static str,
    popular: bool,
    spice: u8,
}

const fn dish(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price: i64,
    category: &'static str,
    popular: bool,
    spice: u8,
) -> Dish {
    Dish {
        id,
        name,
        description,
        price,
        category,
        popular,
        spice,
    }
}

const DISHES: &[Dish] = &[
    dish("somtam-thai", "Som Tam Thai", "Classic papaya salad, sweet sour salty and hot", 45, "somtam", true, 2),
    dish("somtam-poo-pla-ra", "Som Tam Poo Pla Ra", "Papaya salad with crab and fermented fish", 55, "somtam", true, 3),
    dish("somtam-poo-ma", "Som Tam Poo Ma", "Papaya salad with fresh blue crab", 80, "somtam", false, 2),
    dish("tam-khao-pod", "Tam Khao Pod", "Sweet corn salad", 50, "somtam", false, 1),
    dish("tam-taeng", "Tam Taeng", "Crunchy cucumber salad", 45, "somtam", false, 2),
    dish("larb-moo", "Larb Moo", "Minced pork salad with toasted rice", 60, "larb", true, 2),
    dish("larb-ped", "Larb Ped", "Minced duck salad with herbs", 70, "larb", false, 2),
    dish("nam-tok-moo", "Nam Tok Moo", "Grilled pork salad", 65, "larb", true, 2),
    dish("nam-tok-neua", "Nam Tok Neua", "Grilled beef salad", 80, "larb", false, 2),
    dish("tom-saep", "Tom Saep Kraduk Moo", "Hot and sour pork bone soup", 70, "soup", true, 3),
    dish("tom-yum-goong", "Tom Yum Goong", "Clear spicy shrimp soup", 90, "soup", false, 3),
    dish("gaeng-om", "Gaeng Om Moo", "Isan herb curry with pork", 65, "soup", false, 2),
    dish("gai-yang", "Gai Yang", "Herb-marinated grilled chicken", 120, "grill", true, 0),
    dish("kor-moo-yang", "Kor Moo Yang", "Grilled pork neck", 80, "grill", true, 0),
    dish("pla-duk-yang", "Pla Duk Yang", "Salt-grilled catfish", 100, "grill", false, 0),
    dish("sai-krok-isan", "Sai Krok Isan", "Fermented pork and rice sausage", 50, "grill", false, 0),
    dish("khao-niao", "Khao Niao", "Steamed sticky rice", 10, "rice", false, 0),
    dish("khao-suay", "Khao Suay", "Jasmine rice", 10, "rice", false, 0),
    dish("nam-manao", "Nam Manao", "Fresh lime juice", 25, "drinks", false, 0),
    dish("nam-anchan", "Nam Anchan", "Butterfly pea lime drink", 30, "drinks", false, 0),
    dish("cha-yen", "Cha Yen", "Thai iced tea", 30, "drinks", false, 0),
    dish("water", "Water", "Drinking water", 10, "drinks", false, 0),
    dish("coke", "Coke", "Soft drink", 20, "drinks", false, 0),
];

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./somtam_dev.db");

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
                println!("Somtam POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./somtam_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let menu = db.menu();

    let existing = menu.list_items(None).await?;
    if !existing.is_empty() {
        warn!(
            items = existing.len(),
            "Database already has menu items, skipping seed (delete the file to regenerate)"
        );
        return Ok(());
    }

    for (idx, (id, name, icon)) in CATEGORIES.iter().enumerate() {
        menu.save_category(&Category {
            id: id.to_string(),
            name: name.to_string(),
            icon: Some(icon.to_string()),
            sort_order: idx as i64 + 1,
            is_active: true,
        })
        .await?;
    }
    info!(count = CATEGORIES.len(), "Categories created");

    for (id, name, baht) in ADDONS {
        menu.save_addon(&Addon {
            id: id.to_string(),
            name: name.to_string(),
            price_cents: baht * 100,
            is_active: true,
        })
        .await?;
    }
    info!(count = ADDONS.len(), "Add-ons created");

    let now = Utc::now();
    for d in DISHES {
        let addon_ids: &[&str] = match d.category {
            "somtam" => SOMTAM_ADDONS,
            "larb" => LARB_ADDONS,
            _ => &[],
        };
        menu.save_item(&MenuItem {
            id: d.id.to_string(),
            name: d.name.to_string(),
            description: Some(d.description.to_string()),
            image: Some(format!("/images/{}.jpg", d.id)),
            price_cents: d.price * 100,
            category_id: d.category.to_string(),
            is_available: true,
            is_popular: d.popular,
            spice_level: d.spice,
            addon_ids: addon_ids.iter().map(|a| a.to_string()).collect(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    }
    info!(count = DISHES.len(), "Menu items created");

    let pairs = ShopSettings {
        shop_name: "Somtam Saep Nua".to_string(),
        shop_address: Some("123 Aroi Road, Bangkok 10110".to_string()),
        shop_phone: Some("02-123-4567".to_string()),
        receipt_footer: "Thank you for your visit!".to_string(),
        ..ShopSettings::default()
    }
    .to_pairs();
    db.settings().upsert_many(&pairs, now).await?;
    info!(count = pairs.len(), "Settings created");

    info!("Seed complete");
    Ok(())
}
