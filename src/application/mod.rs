// Application layer - Normalization, view models and fetch orchestration
pub mod coerce;
pub mod metrics_gateway;
pub mod normalizer;
pub mod orchestrator;
pub mod session;
pub mod view_model;

#[cfg(test)]
pub mod test_support;
