// Domain layer - View-model entities and render-ready widgets
pub mod dashboard;
pub mod metrics;
pub mod token;
pub mod widgets;
