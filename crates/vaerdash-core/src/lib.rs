pub mod config;
pub mod controller;
pub mod error;
pub mod geocoding;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod suggest;
pub mod symbol;
