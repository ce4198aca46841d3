pub mod gateway;
pub mod gemini;

pub use gateway::{GatewayError, GatewayFailure, GeneratedImages, ImageGateway};
pub use gemini::GeminiClient;
