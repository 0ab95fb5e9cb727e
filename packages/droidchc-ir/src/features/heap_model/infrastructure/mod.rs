pub mod stub_model;

pub use stub_model::stub_fields;
