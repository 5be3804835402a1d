//! Local model runners: a text-generation pipeline and an ONNX graph runner.

pub mod generation;
pub mod llama;
pub mod onnx;

pub use generation::{Generation, TextGenerationPipeline, TextGenerator};
pub use llama::{LlamaGenerator, SamplingConfig};
pub use onnx::{infer, InferenceBackend, InputTensor, OrtBackend, OutputData, OutputTensor};
