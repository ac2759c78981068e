pub mod character;
pub mod drop_life;
pub mod entity;
pub mod laser;
pub mod marker;
pub mod mine;
pub mod projectile;
