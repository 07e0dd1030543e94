//! Example: three offline replicas of a stock counter converging.

use crdt_counter::prelude::*;

fn main() {
    println!("=== Warehouse stock (PN-Counter) ===\n");

    let mut dock = PNCounter::new("dock".to_string());
    let mut shop = PNCounter::new("shop".to_string());
    let mut web = PNCounter::new("web".to_string());

    // Each site works offline
    dock.increment_by(40);
    shop.decrement_by(3);
    web.decrement_by(5);
    web.increment();

    println!("Dock sees:  {}  ({dock})", dock.value());
    println!("Shop sees:  {}  ({shop})", shop.value());
    println!("Web sees:   {}  ({web})", web.value());

    // Shop and web sync over a flaky link; the same state arrives twice.
    let from_web = web.to_bytes().expect("encode");
    shop.merge_bytes(&from_web).expect("valid state");
    shop.merge_bytes(&from_web).expect("valid state");
    println!("\n--- shop <- web (delivered twice) ---");
    println!("Shop sees:  {}", shop.value());

    // Dock only ever talks to the shop.
    dock.merge(&shop);
    shop.merge(&dock);
    web.merge(&shop);

    println!("\n--- after gossip ---");
    println!("Dock: {}  Shop: {}  Web: {}", dock.value(), shop.value(), web.value());
    assert_eq!(dock.value(), 33);
    assert_eq!(dock.export(), web.export());

    println!("\n=== Rejecting corrupt state ===\n");

    let before = dock.value();
    let result = dock.merge_counts([("rogue".to_string(), 1i64)], [("rogue".to_string(), -50i64)]);
    match result {
        Ok(()) => println!("unexpectedly accepted"),
        Err(err) => println!("Rejected: {err}"),
    }
    println!("Dock still sees {} (was {before})", dock.value());
}
