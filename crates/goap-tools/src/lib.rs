//! Tooling primitives for GOAP agents.
//!
//! This crate is engine-agnostic and has no dependency on the planning crates. Higher-level
//! integrations (inspectors, timeline viewers) should consume [`TraceEvent`]s from a sink.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{NullTraceSink, TraceEvent, TraceLog, TraceSink, Tracer, VecTraceSink};
