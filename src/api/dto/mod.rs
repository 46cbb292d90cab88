//! Data Transfer Objects for REST request/response serialization.

pub mod bid_dto;

pub use bid_dto::*;
