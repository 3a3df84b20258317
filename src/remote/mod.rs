pub mod connection;
pub mod operations;
pub mod stream;

pub use connection::{RemoteError, RemoteStore};
pub use operations::store_device_registration;
pub use stream::spawn_subscription;
