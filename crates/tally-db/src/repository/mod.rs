//! # Repository Module
//!
//! Local store repositories.
//!
//! ## Repository Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Register command                                                      │
//! │       │                                                                 │
//! │       │  db.drafts().save(customer, lines, toggles, mode, &totals)      │
//! │       ▼                                                                 │
//! │  DraftRepository ──┐                                                   │
//! │  SettingsRepository┼──► kv helpers (read_value / write_value)          │
//! │  KvRepository ─────┘         │                                          │
//! │                              ▼                                          │
//! │                    kv_store(key, value, updated_at)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DraftRepository`](draft::DraftRepository) - Parked sales
//! - [`SettingsRepository`](settings::SettingsRepository) - Tax rate
//! - [`KvRepository`](kv::KvRepository) - Raw key access

pub mod draft;
pub mod kv;
pub mod settings;
