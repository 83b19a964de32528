pub mod chat_service;
pub mod positioning_service;
pub mod profile_service;
pub mod tensorzero_config;
