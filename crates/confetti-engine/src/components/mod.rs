pub mod entity;
pub mod fill;
