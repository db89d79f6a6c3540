pub mod config;
pub mod contract_expiry;
pub mod notification;
pub mod payment_schedule;
pub mod reports;
