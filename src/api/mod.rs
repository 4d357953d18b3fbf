pub mod classify;
pub mod client;
pub mod decoder;
pub mod multipart;
pub mod streaming;
pub mod transport;
pub mod types;

pub use classify::classify;
pub use client::ApiClient;
pub use decoder::{decode_body, ContentEncoding, GzipChunkDecoder};
pub use multipart::MultipartBody;
pub use streaming::{AbortHandle, LineReader, StreamExecutor};
pub use transport::{RawResponse, ResponseBody, Transport};
pub use types::{CompletionMode, ErrorEnvelope, UploadResponse};
