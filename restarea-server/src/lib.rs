//! Route-aware highway rest-area server.
//!
//! A web service that answers: "which rest areas along this route can I
//! actually pull into, on my side of the highway?"

pub mod config;
pub mod direction;
pub mod domain;
pub mod facilities;
pub mod finder;
pub mod geometry;
pub mod interchanges;
pub mod matcher;
pub mod pipeline;
pub mod rest_areas;
pub mod tables;
pub mod web;
