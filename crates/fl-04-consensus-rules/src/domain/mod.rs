pub mod election;
pub mod errors;
pub mod keyring;
