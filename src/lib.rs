//! Stockroom Server - small-shop inventory movement ledger
//!
//! # Architecture overview
//!
//! Every stock change is a ledger entry; the product's `stock` field is a
//! cached aggregate the [`inventory::MovementLedger`] keeps consistent with
//! that ledger at every commit boundary.
//!
//! - **Inventory** (`inventory`): products, movements, ledger engine, sales
//! - **Audit** (`audit`): SHA-256 hash-chained operation trail
//! - **HTTP API** (`api`): RESTful interface
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/       # config, state, server lifecycle
//! ├── inventory/  # storage, ledger engine, sales aggregation
//! ├── audit/      # tamper-evident audit trail
//! ├── api/        # HTTP routes and handlers
//! └── utils/      # error envelope, logging, time
//! ```

pub mod api;
pub mod audit;
pub mod core;
pub mod inventory;
pub mod utils;

// Re-export public types
pub use audit::{AuditAction, AuditService};
pub use core::{Config, Server, ServerState};
pub use inventory::{InventoryStorage, LedgerError, MovementLedger};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   _____ __             __
  / ___// /_____  _____/ /______  ____  ____  ____ ___
  \__ \/ __/ __ \/ ___/ //_/ __ \/ __ \/ __ \/ __ `__ \
 ___/ / /_/ /_/ / /__/ ,< / /_/ / /_/ / /_/ / / / / / /
/____/\__/\____/\___/_/|_|\____/\____/\____/_/ /_/ /_/

Inventory movement ledger - v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Load .env, prepare the working directory and initialize logging
pub fn setup_environment() -> std::io::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(config.log_dir())?;

    let log_dir = config.log_dir();
    init_logger_with_file(Some(&config.log_level), log_dir.to_str());

    Ok(config)
}
