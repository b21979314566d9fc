pub mod emotion;
pub mod grid;
pub mod obstacles;
pub mod sentiment;
