pub mod analytics;
pub mod event_service;
pub mod registration;
pub mod status;
