//! # Chart Catalog
//!
//! Loads Helm chart repositories and serves their packages over HTTP.
//!
//! Each configured catalog points at a repository `index.yaml`. Loading a
//! catalog fetches the index, then every chart bundle it references,
//! verifies digests, and reads `Chart.yaml` and `values.schema.json` out of
//! the bundle. The result is swapped in atomically; a failed load leaves
//! the previous contents in place.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Providers   │──▶│    Loader    │──▶│   Snapshots   │
//! │  file / HTTP │   │ index+bundle │   │ per catalog   │
//! └──────────────┘   └──────────────┘   └───────┬───────┘
//!                                               │
//!                      ┌────────────────────────┤
//!                      ▼                        ▼
//!                 ┌──────────┐            ┌──────────┐
//!                 │   CLI    │            │   HTTP   │
//!                 │(catalog) │            │  (axum)  │
//!                 └──────────┘            └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Charts, packages and schema properties |
//! | [`error`] | Fetch, parse, load and lookup errors |
//! | [`provider`] | Fetching resources by location |
//! | [`index`] | Repository index and chart bundle parsing |
//! | [`catalog`] | Catalog state and snapshots |
//! | [`loader`] | Building snapshots from a repository |
//! | [`service`] | Catalog registry and lookups |
//! | [`region`] | Region-based catalog visibility |
//! | [`schema`] | The injected `onyxia` configuration block |
//! | [`commands`] | One-shot CLI commands |
//! | [`server`] | HTTP API |

pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod loader;
pub mod models;
pub mod provider;
pub mod region;
pub mod schema;
pub mod server;
pub mod service;
