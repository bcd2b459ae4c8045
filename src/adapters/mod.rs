pub mod session;
pub mod smartcar;
