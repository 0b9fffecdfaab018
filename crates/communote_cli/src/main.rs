//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `communote_core` linkage and
//!   that a fresh in-memory database migrates cleanly.

fn main() {
    println!("communote_core version={}", communote_core::core_version());
    match communote_core::db::open_db_in_memory() {
        Ok(_) => println!("communote_core db=ok"),
        Err(err) => {
            eprintln!("communote_core db=error detail={err}");
            std::process::exit(1);
        }
    }
}
