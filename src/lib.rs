//! # Instruction Finder
//!
//! A Telegram bot that lets authorized staff browse a document repository by
//! train series and find instruction documents by number or name.
//!
//! A user picks a category (a train series), the bot reads every page of
//! that category's repository folders into a per-user index, and free-text
//! messages are then answered with download links for every instruction
//! whose name contains the text.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌─────────────┐   ┌────────────┐
//! │ Telegram │──▶│  Controller  │──▶│   Fetcher   │──▶│ Repository │
//! │ polling  │   │ AccessGuard  │   │ start/limit │   │ HTTP JSON  │
//! └──────────┘   └──────┬───────┘   └──────┬──────┘   └────────────┘
//!                       │                  ▼
//!                       │          ┌──────────────┐
//!                       └─────────▶│ SessionStore │  one index per user
//!                                  └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! instr check-config                 # validate config/instr.toml
//! instr categories                   # list configured train series
//! instr fetch "ЭВС «Сапсан»"         # read a category's listing
//! instr search "ЭВС «Сапсан»" 102    # search it from the shell
//! INSTR_BOT_TOKEN=... instr run      # start the bot
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`access`] | Authorized-user gate |
//! | [`fetcher`] | Paginated repository listing |
//! | [`index`] | Per-category collection and search |
//! | [`render`] | Link formatting and message packing |
//! | [`session`] | Per-user session store |
//! | [`controller`] | Transport-independent command handling |
//! | [`telegram`] | Telegram dispatcher |
//! | [`commands`] | One-shot CLI commands |
//! | [`logging`] | Tracing setup |

pub mod access;
pub mod commands;
pub mod config;
pub mod controller;
pub mod fetcher;
pub mod index;
pub mod logging;
pub mod models;
pub mod render;
pub mod session;
pub mod telegram;
