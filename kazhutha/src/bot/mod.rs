//! Card selection for seats without a human behind them.
//!
//! Bots see the same public snapshot as everyone else plus their own hand.
//! The table actor asks the configured [`BotStrategy`] for a card after the
//! think delay and submits it through the normal play path, so a bot can
//! never skip validation.

pub mod decision;

pub use decision::{BotDecisionMaker, BotStrategy};
