pub mod campaign;
pub mod contacts;
pub mod smtp;
