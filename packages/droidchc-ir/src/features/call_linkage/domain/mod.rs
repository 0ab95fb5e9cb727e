pub mod call_site;

pub use call_site::CallSite;
