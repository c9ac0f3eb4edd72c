pub mod api_server;
pub mod http_store;
pub mod local_store;
pub mod memory_store;

pub use api_server::{start_api_server, start_api_server_background};
pub use http_store::HttpBlobStore;
pub use local_store::LocalBlobStore;
pub use memory_store::{MemoryBlobStore, StoredObject};
