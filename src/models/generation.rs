// src/models/generation.rs
use crate::error::ModelError;
use tracing::info;

/// A loaded causal language model.
pub trait TextGenerator {
    /// Continue `prompt`. `max_length` caps prompt plus continuation, in tokens.
    /// The returned text starts with the prompt.
    fn generate(&mut self, prompt: &str, max_length: usize) -> Result<String, ModelError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub prompt: String,
    pub generated_text: String,
}

pub struct TextGenerationPipeline<G> {
    generator: G,
    max_length: usize,
}

impl<G: TextGenerator> TextGenerationPipeline<G> {
    pub fn new(generator: G, max_length: usize) -> Self {
        Self {
            generator,
            max_length,
        }
    }

    /// Run every prompt in order; the first failure aborts the batch.
    pub fn run<S: AsRef<str>>(&mut self, prompts: &[S]) -> Result<Vec<Generation>, ModelError> {
        if self.max_length == 0 {
            return Err(ModelError::InvalidInput(
                "max_length must be at least 1".to_string(),
            ));
        }

        let mut generations = Vec::with_capacity(prompts.len());
        for (index, prompt) in prompts.iter().enumerate() {
            let prompt = prompt.as_ref();
            info!("Generating for prompt {}/{}", index + 1, prompts.len());
            let generated_text = self.generator.generate(prompt, self.max_length)?;
            generations.push(Generation {
                prompt: prompt.to_string(),
                generated_text,
            });
        }

        Ok(generations)
    }
}
