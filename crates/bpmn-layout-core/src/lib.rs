//! bpmn-layout core types
//!
//! This crate provides the foundational types shared by the layout engine and
//! its front ends:
//!
//! - **Geometry**: points, sizes and bounding boxes ([`geometry`] module)
//! - **Model**: elements, flows, pools and lanes of a process ([`model`] module)

pub mod geometry;
pub mod model;
