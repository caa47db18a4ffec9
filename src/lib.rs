pub mod api;
pub mod api_connection;
pub mod cli;
pub mod config;
pub mod cooking_time;
pub mod generator;
pub mod logging;
pub mod meal_planner;
pub mod nutrition;
pub mod recipe;
pub mod search;
pub mod server;
pub mod service;
pub mod store;
