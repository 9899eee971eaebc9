pub mod document;
pub mod server;

pub use document::DocumentStore;
pub use server::Backend;
