#![doc = include_str!("../README.md")]

//! primcheck verification engine.
//!
//! This crate runs Prim's transition rule over every graph instance the
//! bounded enumerator produces and checks each run for termination in a
//! spanning tree of minimum weight.

pub mod counterexample;
pub mod pipeline;
pub mod properties;
pub mod result;
pub mod transition;
