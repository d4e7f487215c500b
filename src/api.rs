pub mod client;
pub mod energy_charts;
pub mod home_assistant;
pub mod price_provider;
