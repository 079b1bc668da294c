// Resume Analysis Pipeline
// Implements: prompt building, model invocation, reply parsing and the
// orchestrator that sequences them around the document store and extractor.
// All model calls go through llm_client; no direct Gemini calls here.

pub mod handlers;
pub mod invoker;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;

#[cfg(test)]
pub mod test_support;
