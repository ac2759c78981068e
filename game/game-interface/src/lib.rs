#![deny(clippy::all)]

pub mod events;
pub mod types;
