//! # Daily Question
//!
//! A chat bot that posts one discussion question a day and never asks the
//! same thing twice.
//!
//! Each cycle asks a language model for a candidate, checks it against every
//! question already asked (case-insensitive exact match, then embedding
//! cosine similarity against a threshold), records it once it passes, and
//! posts it to the team channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  candidate  ┌────────────────────┐  accept  ┌──────────┐
//! │ Generator │────────────▶│ Uniqueness Engine  │─────────▶│  SQLite  │
//! │ (OpenAI)  │◀────────────│ exact + semantic   │          │ history  │
//! └───────────┘   reject    └─────────┬──────────┘          └────┬─────┘
//!                                     │ embeddings               │
//!                               ┌─────▼─────┐              ┌─────▼─────┐
//!                               │ Embedding │              │   Chat    │
//!                               │ provider  │              │  (Slack)  │
//!                               └───────────┘              └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dq init                      # create database
//! dq seed                      # add sample questions
//! dq post --dry-run            # generate + check without recording
//! dq post                      # one real cycle (run this from cron)
//! dq duplicates                # offline similar-pair report
//! dq serve                     # health + POST /ask trigger
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Question records and similar pairs |
//! | [`similarity`] | Cosine similarity |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`generation`] | Candidate question generation |
//! | [`store`] | History store trait, SQLite and in-memory backends |
//! | [`uniqueness`] | Exact + semantic duplicate gate |
//! | [`acquire`] | Bounded retry-until-unique loop |
//! | [`report`] | Offline similar-pair report |
//! | [`calibrate`] | Threshold calibration on labelled pairs |
//! | [`chat`] | Posting to a chat channel |
//! | [`cycle`] | One acquire-then-post cycle |
//! | [`server`] | Health and trigger HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod acquire;
pub mod calibrate;
pub mod chat;
pub mod check_cmd;
pub mod config;
pub mod cycle;
pub mod db;
pub mod embedding;
pub mod generation;
pub mod history;
pub mod migrate;
pub mod models;
pub mod report;
pub mod seed;
pub mod server;
pub mod similarity;
pub mod store;
pub mod uniqueness;
