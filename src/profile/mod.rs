pub mod registration;
pub mod store;

pub use registration::prompt_registration;
pub use store::ProfileStore;
