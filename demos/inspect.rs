//! Loader inspection example.
//!
//! Detects the platform, builds the matching loader and tries to resolve
//! the subscription entry points.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example inspect
//!
//! # With a loader config file
//! cargo run --example inspect -- --config loader.toml
//!
//! # Skip the symbol-isolation preload
//! cargo run --example inspect -- --no-preload
//! ```

use std::sync::Arc;

use rcl_interop_core::SubscriptionApi;
use rcl_interop_dl::{LibraryNaming, LoaderConfig, PlatformDetector, create_loader};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    let config = match args.iter().position(|a| a == "--config") {
        Some(index) => {
            let Some(path) = args.get(index + 1) else {
                eprintln!("--config needs a path");
                std::process::exit(2);
            };
            match LoaderConfig::load(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("invalid config {path}: {e}");
                    std::process::exit(2);
                }
            }
        }
        None if args.iter().any(|a| a == "--no-preload") => {
            LoaderConfig::builder().no_preload().build()
        }
        None => LoaderConfig::default(),
    };

    println!("=== rcl-interop inspect ===\n");

    let detector = PlatformDetector::new();
    let platform = detector.detect();
    println!("Platform: {platform}");

    if let Some(naming) = LibraryNaming::for_platform(platform) {
        println!("  middleware: {}", naming.support_library("rcl"));
        println!("  shim:       {}", naming.native_module("rcl_interop"));
    }

    println!(
        "Preload: {}",
        if config.preload.enabled {
            config.preload.library.as_str()
        } else {
            "disabled"
        }
    );

    let loader = match create_loader(&config) {
        Ok(loader) => loader,
        Err(e) => {
            println!("  Result: ERROR - {e}");
            std::process::exit(1);
        }
    };

    match SubscriptionApi::load(Arc::clone(&loader)) {
        Ok(api) => {
            println!("\nSubscription API: RESOLVED");
            println!("  {api:?}");
        }
        Err(e) => {
            println!("\nSubscription API: UNAVAILABLE");
            println!("  {e}");
            println!("  Hint: source a ROS 2 installation so the libraries are on the search path");
        }
    }
}

fn print_help() {
    println!(
        r#"rcl-interop inspect

USAGE:
    cargo run --example inspect [OPTIONS]

OPTIONS:
    --config <PATH>   Load the loader config from a TOML file
    --no-preload      Disable the symbol-isolation preload
    --help, -h        Print this help message
"#
    );
}
