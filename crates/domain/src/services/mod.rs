pub mod lifecycle;
pub mod policy;
