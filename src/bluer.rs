mod error;
pub mod rfcomm;
