pub mod exchange_service;
pub mod provider;
pub mod vehicle_service;
