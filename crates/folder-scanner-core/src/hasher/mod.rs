pub mod digest;

pub use digest::{content_hash, CHUNK_SIZE};
