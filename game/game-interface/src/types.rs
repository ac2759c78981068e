pub mod account;
pub mod emoticons;
pub mod id_gen;
pub mod id_types;
pub mod input;
pub mod pickup;
pub mod snapshot;
pub mod weapons;
