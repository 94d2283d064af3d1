//! # Roadmap View Controller
//!
//! Holds the roadmap being viewed, with nodes derived from its milestones,
//! and runs the mutating actions against the backend.
//!
//! Every successful mutation is followed by a full re-fetch and re-derive;
//! nothing is updated locally. When an action (or its re-fetch) fails the
//! view keeps its prior roadmap and records an action-specific message.

use crate::client::{ApiClient, CompleteAllResponse};
use crate::error::{AppError, ClientError};
use pathyvo_core::{
    Milestone, MilestoneId, NodeTally, Roadmap, RoadmapId, RoadmapNode, check_completable,
    current_node, validate_rename,
};
use std::future::Future;

pub const LOAD_FAILED: &str = "Failed to load roadmap.";
pub const COMPLETE_MILESTONE_FAILED: &str = "Failed to complete milestone.";
pub const COMPLETE_ROADMAP_FAILED: &str = "Failed to complete roadmap.";
pub const RENAME_FAILED: &str = "Failed to rename roadmap.";
pub const DELETE_FAILED: &str = "Failed to delete roadmap.";

// =============================================================================
// BACKEND SEAM
// =============================================================================

/// The roadmap endpoints the view needs.
pub trait RoadmapApi {
    fn get_roadmap(
        &self,
        id: RoadmapId,
    ) -> impl Future<Output = Result<Roadmap, ClientError>> + Send;

    fn complete_milestone(
        &self,
        id: MilestoneId,
    ) -> impl Future<Output = Result<Milestone, ClientError>> + Send;

    fn complete_all(
        &self,
        id: RoadmapId,
    ) -> impl Future<Output = Result<CompleteAllResponse, ClientError>> + Send;

    fn rename_roadmap(
        &self,
        id: RoadmapId,
        title: &str,
    ) -> impl Future<Output = Result<Roadmap, ClientError>> + Send;

    fn delete_roadmap(&self, id: RoadmapId)
    -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl RoadmapApi for ApiClient {
    async fn get_roadmap(&self, id: RoadmapId) -> Result<Roadmap, ClientError> {
        ApiClient::get_roadmap(self, id).await
    }

    async fn complete_milestone(&self, id: MilestoneId) -> Result<Milestone, ClientError> {
        ApiClient::complete_milestone(self, id).await
    }

    async fn complete_all(&self, id: RoadmapId) -> Result<CompleteAllResponse, ClientError> {
        ApiClient::complete_all(self, id).await
    }

    async fn rename_roadmap(&self, id: RoadmapId, title: &str) -> Result<Roadmap, ClientError> {
        ApiClient::rename_roadmap(self, id, title).await
    }

    async fn delete_roadmap(&self, id: RoadmapId) -> Result<(), ClientError> {
        ApiClient::delete_roadmap(self, id).await
    }
}

// =============================================================================
// VIEW
// =============================================================================

pub struct RoadmapView<'a, A: RoadmapApi> {
    api: &'a A,
    id: RoadmapId,
    roadmap: Option<Roadmap>,
    error: Option<String>,
    deleted: bool,
}

impl<'a, A: RoadmapApi> RoadmapView<'a, A> {
    pub fn new(api: &'a A, id: RoadmapId) -> Self {
        Self {
            api,
            id,
            roadmap: None,
            error: None,
            deleted: false,
        }
    }

    pub fn roadmap(&self) -> Option<&Roadmap> {
        self.roadmap.as_ref()
    }

    pub fn nodes(&self) -> &[RoadmapNode] {
        self.roadmap
            .as_ref()
            .map(|r| r.roadmap_nodes.as_slice())
            .unwrap_or_default()
    }

    pub fn tally(&self) -> NodeTally {
        NodeTally::from_nodes(self.nodes())
    }

    pub fn current(&self) -> Option<&RoadmapNode> {
        current_node(self.nodes())
    }

    /// Message from the last failed action, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    async fn fetch(&self) -> Result<Roadmap, ClientError> {
        let roadmap = self.api.get_roadmap(self.id).await?;
        Ok(roadmap.with_derived_nodes())
    }

    async fn complete_and_refetch(&self, milestone: MilestoneId) -> Result<Roadmap, ClientError> {
        self.api.complete_milestone(milestone).await?;
        self.fetch().await
    }

    async fn complete_all_and_refetch(
        &self,
    ) -> Result<(CompleteAllResponse, Roadmap), ClientError> {
        let response = self.api.complete_all(self.id).await?;
        Ok((response, self.fetch().await?))
    }

    async fn rename_and_refetch(&self, title: &str) -> Result<Roadmap, ClientError> {
        self.api.rename_roadmap(self.id, title).await?;
        self.fetch().await
    }

    /// Fetch the roadmap. On failure the view has no roadmap.
    pub async fn load(&mut self) -> Result<(), AppError> {
        self.error = None;
        match self.fetch().await {
            Ok(roadmap) => {
                self.roadmap = Some(roadmap);
                Ok(())
            }
            Err(e) => {
                self.roadmap = None;
                Err(self.fail(LOAD_FAILED, e))
            }
        }
    }

    /// Complete one milestone. Only the current node may be completed.
    pub async fn complete_milestone(&mut self, milestone: MilestoneId) -> Result<(), AppError> {
        check_completable(self.nodes(), milestone)?;
        self.error = None;
        let result = self.complete_and_refetch(milestone).await;
        self.settle(result, COMPLETE_MILESTONE_FAILED)?;
        tracing::info!(roadmap = %self.id, milestone = %milestone, "Milestone completed");
        Ok(())
    }

    /// Mark every milestone complete.
    pub async fn complete_all(&mut self) -> Result<u32, AppError> {
        self.error = None;
        let response = match self.complete_all_and_refetch().await {
            Ok((response, roadmap)) => {
                self.roadmap = Some(roadmap);
                response
            }
            Err(e) => return Err(self.fail(COMPLETE_ROADMAP_FAILED, e)),
        };
        tracing::info!(roadmap = %self.id, completed = response.completed_count, "Roadmap completed");
        Ok(response.completed_count)
    }

    /// Rename the roadmap. The title is trimmed and must differ from the
    /// current one.
    pub async fn rename(&mut self, requested: &str) -> Result<(), AppError> {
        let current_title = self
            .roadmap
            .as_ref()
            .map(|r| r.title.as_str())
            .unwrap_or_default();
        let title = validate_rename(current_title, requested)?;
        self.error = None;
        let result = self.rename_and_refetch(&title).await;
        self.settle(result, RENAME_FAILED)?;
        tracing::info!(roadmap = %self.id, "Roadmap renamed");
        Ok(())
    }

    /// Delete the roadmap. There is nothing to re-fetch afterwards.
    pub async fn delete(&mut self) -> Result<(), AppError> {
        self.error = None;
        match self.api.delete_roadmap(self.id).await {
            Ok(()) => {
                self.roadmap = None;
                self.deleted = true;
                tracing::info!(roadmap = %self.id, "Roadmap deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(DELETE_FAILED, e)),
        }
    }

    fn settle(
        &mut self,
        result: Result<Roadmap, ClientError>,
        message: &'static str,
    ) -> Result<(), AppError> {
        match result {
            Ok(roadmap) => {
                self.roadmap = Some(roadmap);
                Ok(())
            }
            Err(e) => Err(self.fail(message, e)),
        }
    }

    /// Record `message` and build the error to return. A 401 is passed
    /// through so the caller can prompt for a new login.
    fn fail(&mut self, message: &'static str, cause: ClientError) -> AppError {
        tracing::warn!(roadmap = %self.id, error = %cause, "{}", message);
        self.error = Some(message.to_string());
        match cause {
            ClientError::Unauthorized => AppError::Client(cause),
            _ => AppError::View(message.to_string()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;
    use pathyvo_core::{NodeStatus, PathyvoError};
    use std::sync::Mutex;

    /// In-memory backend holding one roadmap.
    struct FakeBackend {
        roadmap: Mutex<Roadmap>,
        fail_mutations: bool,
        fail_fetch_after_mutation: Mutex<bool>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn new(done: &[bool]) -> Self {
            let mut roadmap = Roadmap::new(RoadmapId(5), "Rust");
            roadmap.milestones = done
                .iter()
                .enumerate()
                .map(|(i, &d)| {
                    Milestone::new(MilestoneId(i as u64 + 1), format!("Step {}", i + 1))
                        .with_completed(d)
                })
                .collect();
            Self {
                roadmap: Mutex::new(roadmap),
                fail_mutations: false,
                fail_fetch_after_mutation: Mutex::new(false),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self) -> Self {
            self.fail_mutations = true;
            self
        }

        fn log(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn mutation_result(&self) -> Result<(), ClientError> {
            if self.fail_mutations {
                Err(ClientError::ServerError(500, "boom".into()))
            } else {
                Ok(())
            }
        }
    }

    impl RoadmapApi for FakeBackend {
        async fn get_roadmap(&self, id: RoadmapId) -> Result<Roadmap, ClientError> {
            self.log("get");
            if std::mem::take(&mut *self.fail_fetch_after_mutation.lock().unwrap()) {
                return Err(ClientError::ConnectionFailed("fake".into()));
            }
            let roadmap = self.roadmap.lock().unwrap().clone();
            if roadmap.id == id {
                Ok(roadmap)
            } else {
                Err(ClientError::NotFound("Roadmap not found".into()))
            }
        }

        async fn complete_milestone(&self, id: MilestoneId) -> Result<Milestone, ClientError> {
            self.log("complete");
            self.mutation_result()?;
            let mut roadmap = self.roadmap.lock().unwrap();
            let milestone = roadmap
                .milestones
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| ClientError::NotFound("Milestone not found".into()))?;
            milestone.completed = true;
            Ok(milestone.clone())
        }

        async fn complete_all(&self, _id: RoadmapId) -> Result<CompleteAllResponse, ClientError> {
            self.log("complete_all");
            self.mutation_result()?;
            let mut roadmap = self.roadmap.lock().unwrap();
            for m in &mut roadmap.milestones {
                m.completed = true;
            }
            Ok(CompleteAllResponse {
                message: "All milestones completed successfully".into(),
                completed_count: roadmap.milestones.len() as u32,
            })
        }

        async fn rename_roadmap(&self, _id: RoadmapId, title: &str) -> Result<Roadmap, ClientError> {
            self.log("rename");
            self.mutation_result()?;
            let mut roadmap = self.roadmap.lock().unwrap();
            roadmap.title = title.to_string();
            Ok(roadmap.clone())
        }

        async fn delete_roadmap(&self, _id: RoadmapId) -> Result<(), ClientError> {
            self.log("delete");
            self.mutation_result()
        }
    }

    #[tokio::test]
    async fn load_derives_nodes() {
        let backend = FakeBackend::new(&[true, false, false]);
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();

        assert_eq!(view.nodes().len(), 3);
        assert_eq!(view.current().unwrap().id, MilestoneId(2));
        assert_eq!(view.tally().completed, 1);
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn load_failure_sets_message() {
        let backend = FakeBackend::new(&[false]);
        let mut view = RoadmapView::new(&backend, RoadmapId(99));
        let err = view.load().await.unwrap_err();

        assert_eq!(err.to_string(), LOAD_FAILED);
        assert_eq!(view.error(), Some(LOAD_FAILED));
        assert!(view.roadmap().is_none());
    }

    #[tokio::test]
    async fn completion_refetches_and_advances() {
        let backend = FakeBackend::new(&[true, false, false]);
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();

        view.complete_milestone(MilestoneId(2)).await.unwrap();
        assert_eq!(view.nodes()[1].status(), NodeStatus::Completed);
        assert_eq!(view.current().unwrap().id, MilestoneId(3));
        assert_eq!(backend.calls(), vec!["get", "complete", "get"]);
    }

    #[tokio::test]
    async fn locked_milestone_is_rejected_without_request() {
        let backend = FakeBackend::new(&[false, false]);
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();

        let err = view.complete_milestone(MilestoneId(2)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Core(PathyvoError::MilestoneLocked(MilestoneId(2)))
        ));
        assert_eq!(backend.calls(), vec!["get"]);
    }

    #[tokio::test]
    async fn failed_completion_keeps_prior_state() {
        let backend = FakeBackend::new(&[true, false]).failing();
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();
        let before = view.roadmap().cloned();

        let err = view.complete_milestone(MilestoneId(2)).await.unwrap_err();
        assert_eq!(err.to_string(), COMPLETE_MILESTONE_FAILED);
        assert_eq!(view.error(), Some(COMPLETE_MILESTONE_FAILED));
        assert_eq!(view.roadmap().cloned(), before);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_prior_state() {
        let backend = FakeBackend::new(&[false, false]);
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();

        *backend.fail_fetch_after_mutation.lock().unwrap() = true;
        let err = view.complete_milestone(MilestoneId(1)).await.unwrap_err();
        assert_eq!(err.to_string(), COMPLETE_MILESTONE_FAILED);
        assert_eq!(view.current().unwrap().id, MilestoneId(1));
    }

    #[tokio::test]
    async fn complete_all_marks_everything() {
        let backend = FakeBackend::new(&[false, false, false]);
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();

        assert_eq!(view.complete_all().await.unwrap(), 3);
        assert!(view.nodes().iter().all(|n| n.completed));
        assert!(view.current().is_none());
    }

    #[tokio::test]
    async fn complete_all_failure_message() {
        let backend = FakeBackend::new(&[false]).failing();
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();
        let err = view.complete_all().await.unwrap_err();
        assert_eq!(err.to_string(), COMPLETE_ROADMAP_FAILED);
    }

    #[tokio::test]
    async fn rename_validates_then_refetches() {
        let backend = FakeBackend::new(&[false]);
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();

        assert!(matches!(
            view.rename("  ").await,
            Err(AppError::Core(PathyvoError::EmptyTitle))
        ));
        assert!(matches!(
            view.rename("Rust").await,
            Err(AppError::Core(PathyvoError::UnchangedTitle))
        ));

        view.rename("  Rust in Practice ").await.unwrap();
        assert_eq!(view.roadmap().unwrap().title, "Rust in Practice");
        assert_eq!(backend.calls(), vec!["get", "rename", "get"]);
    }

    #[tokio::test]
    async fn rename_failure_message() {
        let backend = FakeBackend::new(&[false]).failing();
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();
        let err = view.rename("New").await.unwrap_err();
        assert_eq!(err.to_string(), RENAME_FAILED);
        assert_eq!(view.roadmap().unwrap().title, "Rust");
    }

    #[tokio::test]
    async fn delete_clears_view() {
        let backend = FakeBackend::new(&[false]);
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();

        view.delete().await.unwrap();
        assert!(view.is_deleted());
        assert!(view.roadmap().is_none());
        assert_eq!(backend.calls(), vec!["get", "delete"]);
    }

    #[tokio::test]
    async fn delete_failure_keeps_roadmap() {
        let backend = FakeBackend::new(&[false]).failing();
        let mut view = RoadmapView::new(&backend, RoadmapId(5));
        view.load().await.unwrap();

        let err = view.delete().await.unwrap_err();
        assert_eq!(err.to_string(), DELETE_FAILED);
        assert!(!view.is_deleted());
        assert!(view.roadmap().is_some());
    }
}
