pub mod entity;
pub mod geometry;
pub mod home;
pub mod lane;
pub mod mover;
pub mod rules;
