mod config;
mod target;
