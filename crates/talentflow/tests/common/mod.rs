//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod builders;

use std::sync::Arc;

use talentflow::activity::BroadcastSink;
use talentflow::db::Database;
use talentflow::pipeline::PipelineService;

/// An in-memory database with a service and a subscribable activity sink.
pub struct TestContext {
    pub db: Database,
    pub service: PipelineService,
    pub sink: Arc<BroadcastSink>,
}

impl TestContext {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create test database");
        let sink = Arc::new(BroadcastSink::default());
        let service = PipelineService::new(db.clone(), sink.clone());
        Self { db, service, sink }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
