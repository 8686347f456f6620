//! Business logic: calendar gateway, event extraction, podcast resolution,
//! and the task-lifecycle workflow engine.

pub mod calendar;
pub mod event_extractor;
pub mod podcast_resolver;
pub mod title_parser;
pub mod workflow;
