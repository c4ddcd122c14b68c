//! Storefront services, wiring and the interactive shell.

pub mod config;
pub mod context;
pub mod domain;
pub mod observability;
pub mod render;
pub mod shell;

#[cfg(test)]
mod test;
