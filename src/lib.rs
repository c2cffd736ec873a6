//! A minimal text-command bot: a command router with preconditions and typed
//! argument parsing, plus the handful of commands it serves.
//!
//! The transport is abstracted behind [`context::ChatApi`]: the binary wires
//! up a console transport, a live deployment supplies its own. The router
//! itself is immutable after [`handlers::build_router`] and safe to share
//! across concurrent dispatches.

pub mod bot;
pub mod commands;
pub mod context;
pub mod handlers;
pub mod picture;
pub mod preconditions;
pub mod router;
pub mod types;
