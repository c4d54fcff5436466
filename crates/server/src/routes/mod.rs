pub mod analysis;
pub mod games;
pub mod health;
pub mod variations;
