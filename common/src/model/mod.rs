pub mod attachment;
pub mod campaign;
pub mod contact;
pub mod outcome;
