pub mod firestore_auth;
pub mod firestore_value;
pub mod pool;
