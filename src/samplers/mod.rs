//! Sampling strategies for minimal sets.
//!
//! Samplers sit behind the [`Sampler`](crate::core::Sampler) trait so that
//! callers can plug in guided strategies without touching the MSAC loop.

pub mod uniform;

pub use uniform::UniformRandomSampler;
