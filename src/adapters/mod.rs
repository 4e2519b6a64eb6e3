// Adapters layer: HTTP clients for the services the bot talks to.

pub mod huggingface;
pub mod openai;
pub mod xrpc;

pub use huggingface::HuggingFaceImageGenerator;
pub use openai::OpenAiDescriber;
pub use xrpc::XrpcClient;
