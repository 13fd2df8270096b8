pub mod types;
pub mod error;
pub mod config;
pub mod model;
pub mod events;
pub mod builder;
pub mod engine;
pub mod resolver;
pub mod radio;
pub mod sink;
pub mod notify;
pub mod presence;
pub mod store;
pub mod util;
pub mod bot;

#[cfg(test)]
mod testing;
