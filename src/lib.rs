// This file exposes the modules as public modules in the crate

pub mod adf;
pub mod app_config;
pub mod auth;
pub mod errors;
pub mod jira_client;
pub mod jira_handlers;
pub mod llm_handler;
pub mod models;
pub mod prompts;
