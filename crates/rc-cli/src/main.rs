//! Reclaim CLI
//!
//! Developer tool for inspecting origin resolution, the forced stylesheet and
//! the message protocol bindings.

use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use ts_rs::TS;

use rc_core::payload::style::build_stylesheet;
use rc_core::{resolve_origin, ExtensionConfig, Request, Response};

#[cfg(feature = "e2e")]
mod e2e;

#[derive(Parser)]
#[command(name = "rc-cli")]
#[command(about = "Reclaim extension developer tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical origin of each URL
    Origin {
        /// URLs to resolve
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Print the stylesheet the payload forces into pages
    Stylesheet {
        /// Settings JSON (the stored "settings" value)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Print the default settings as JSON
    Defaults,

    /// Export TypeScript bindings for the message protocol
    Bindings {
        /// Output directory
        #[arg(short, long, default_value = "bindings")]
        out: String,
    },

    /// Smoke-test a packed extension build in Chrome
    #[cfg(feature = "e2e")]
    E2e {
        /// Unpacked extension directory
        #[arg(short, long)]
        extension: String,

        /// Chromedriver URL
        #[arg(long, default_value = "http://localhost:9515")]
        chromedriver: String,

        /// Run Chrome headless
        #[arg(long)]
        headless: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Origin { urls } => cmd_origin(&urls),
        Commands::Stylesheet { config } => cmd_stylesheet(config.as_deref()),
        Commands::Defaults => cmd_defaults(),
        Commands::Bindings { out } => cmd_bindings(&out),
        #[cfg(feature = "e2e")]
        Commands::E2e {
            extension,
            chromedriver,
            headless,
        } => e2e::run_e2e(e2e::E2eOptions {
            chromedriver_url: chromedriver,
            extension_path: extension,
            headless,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_origin(urls: &[String]) -> Result<(), String> {
    for url in urls {
        match resolve_origin(url) {
            Some(origin) => println!("{url} -> {origin}"),
            None => println!("{url} -> unsupported"),
        }
    }
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<ExtensionConfig, String> {
    let Some(path) = path else {
        return Ok(ExtensionConfig::default());
    };
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Invalid settings in '{}': {}", path, e))
}

fn cmd_stylesheet(config: Option<&str>) -> Result<(), String> {
    let config = load_config(config)?;
    print!("{}", build_stylesheet(&config.payload));
    Ok(())
}

fn cmd_defaults() -> Result<(), String> {
    let json = serde_json::to_string_pretty(&ExtensionConfig::default())
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    println!("{json}");
    Ok(())
}

fn cmd_bindings(out: &str) -> Result<(), String> {
    let dir = Path::new(out);
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create '{}': {}", out, e))?;

    Request::export_all_to(dir).map_err(|e| format!("Failed to export Request: {}", e))?;
    Response::export_all_to(dir).map_err(|e| format!("Failed to export Response: {}", e))?;
    ExtensionConfig::export_all_to(dir)
        .map_err(|e| format!("Failed to export ExtensionConfig: {}", e))?;

    println!("Exported protocol bindings to '{}'", out);
    Ok(())
}
