pub mod estimate;
pub mod geocode;
pub mod health;
