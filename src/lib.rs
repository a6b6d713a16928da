//! SahaAI CFO API Library
//!
//! HTTP service that forwards user financial data (chat text, receipt
//! images, salary documents, audio) to a generative model and a speech
//! service, then normalizes and scores the results.
//!
//! # Modules
//!
//! - `circuit_breaker`: Circuit breaker shared by upstream clients.
//! - `config`: Configuration management.
//! - `docs`: OpenAPI document and Swagger UI.
//! - `errors`: Error handling types.
//! - `extractor`: JSON recovery from model replies and field coercion.
//! - `gemini_client`: Generator API client.
//! - `handlers`: HTTP request handlers.
//! - `media`: Upload MIME allow-lists.
//! - `models`: Request and response models.
//! - `prompts`: Prompt templates.
//! - `routes`: Router assembly.
//! - `scoring`: Deterministic financial metrics and goal planning.
//! - `speech`: Text-to-speech client.

pub mod circuit_breaker;
pub mod config;
pub mod docs;
pub mod errors;
pub mod extractor;
pub mod gemini_client;
pub mod handlers;
pub mod media;
pub mod models;
pub mod prompts;
pub mod routes;
pub mod scoring;
pub mod speech;
