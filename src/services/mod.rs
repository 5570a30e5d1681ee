pub mod ai_service;
pub mod discovery_service;
pub mod fetch_service;
pub mod firestore_opportunity_store;
pub mod link_validator;
pub mod opportunity_store;
pub mod pg_opportunity_store;
pub mod prompts;
pub mod scheduler;
pub mod scrape_tool;
pub mod search_tool;
