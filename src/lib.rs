pub mod config;
pub mod error;
pub mod gateway;
pub mod leaderboard;
pub mod quiz;
pub mod view;
