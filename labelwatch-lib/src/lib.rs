#![allow(clippy::new_without_default)]

pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parser;
pub mod retry;

#[macro_use]
extern crate diesel;
