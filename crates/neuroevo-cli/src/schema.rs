pub mod dataset;
pub mod trained_model;
