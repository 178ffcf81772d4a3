pub mod action_executor;
pub mod aliases;
pub mod app_cache;
pub mod config;
pub mod core_service;
pub mod discovery;
pub mod exe_filter;
pub mod index_store;
pub mod indexer;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod resolver;
pub mod runtime;
pub mod shortcut;
pub mod system_commands;
pub mod uninstall_registry;
pub mod validator;

#[cfg(test)]
mod test_support;
