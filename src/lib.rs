pub mod config;
pub mod error;
pub mod features;
pub mod logistic;
pub mod match_store;
pub mod pipeline;
pub mod roles;
pub mod trainer;
pub mod weights_export;
