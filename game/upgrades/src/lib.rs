#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]

pub mod bot;
pub mod collision;
pub mod config;
pub mod damage;
pub mod entities;
pub mod events;
pub mod simulation_pipe;
pub mod snapshot;
pub mod state;
#[cfg(test)]
pub mod test_util;
pub mod world;
