// handlers/mod.rs - HTTP surface over the resource pipeline
//
// Handlers only adapt axum extractors into pipeline calls; status codes,
// envelopes and error bodies are decided by the pipeline.
pub mod forecasts;
