pub mod layout_builder;

pub use layout_builder::LayoutBuilder;
