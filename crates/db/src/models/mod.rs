pub mod app_settings;
pub mod client;
pub mod contract;
pub mod equipment;
pub mod monthly_payment;
pub mod product;
pub mod receipt;
