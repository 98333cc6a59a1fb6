pub mod app;
pub mod config;
pub mod gateway;
pub mod rest;
pub mod shutdown;
