#![doc = include_str!("../README.md")]

//! primcheck intermediate representation.
//!
//! Graphs, traces and the bounded instance space are pure data: nothing in
//! this crate knows about Prim's transition rule or the MST properties.

pub mod graph;
pub mod instance_space;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod sets;
pub mod trace;
