#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod assets;
pub mod config;
pub mod db;
pub mod drawable;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod router;
pub use app::App;
