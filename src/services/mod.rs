// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod status_queue;
pub mod status_service;


pub use status_queue::{StatusQueue, StatusQueueConfig};
pub use status_service::StatusService;
