//! HTTP adapters for Quire's external services: the LaTeX build endpoint
//! and the Gemini generation API.

pub mod gemini_generation_service;
pub mod latex_online_compiler;
pub mod prompts;

pub use gemini_generation_service::GeminiGenerationService;
pub use latex_online_compiler::LatexOnlineCompiler;
