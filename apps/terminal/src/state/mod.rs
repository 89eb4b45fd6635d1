//! # State Module
//!
//! Manages register session state.
//!
//! ## Why Multiple State Types?
//! Instead of a single `AppState` struct containing everything,
//! we use separate state types. This approach:
//!
//! 1. **Better Separation of Concerns**: Each state type has a single responsibility
//! 2. **Easier Testing**: Can mock/inject individual states
//! 3. **Clearer Command Signatures**: Commands declare exactly what state they need
//! 4. **Reduced Contention**: Independent states don't block each other
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                  │
//! │  │   DbState    │  │  CartState   │  │ CatalogState │                  │
//! │  │  Database    │  │  Arc<Mutex<  │  │  RwLock<Arc< │                  │
//! │  │  (SQLite     │  │  CartSession │  │  Catalog     │                  │
//! │  │   pool)      │  │  >>          │  │  Snapshot>>  │                  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                  │
//! │  │CustomerState │  │   TaxState   │  │ ConfigState  │                  │
//! │  │  Arc<Mutex<  │  │  RwLock<     │  │  store name  │                  │
//! │  │  Customer    │  │  TaxRate>    │  │  currency    │                  │
//! │  │  Resolver>>  │  │              │  │  scanner     │                  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘                  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • Cart/Customer: Mutex, never held across an .await                   │
//! │  • Catalog/Tax: RwLock, replaced wholesale                             │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod catalog;
mod config;
mod customer;
mod db;
mod settings;

pub use cart::{CartSession, CartState};
pub use catalog::CatalogState;
pub use config::{ConfigError, ConfigState, ScannerSettings, CONFIG_FILE_NAME};
pub use customer::CustomerState;
pub use db::DbState;
pub use settings::TaxState;
