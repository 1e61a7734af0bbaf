//! Activity log service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notify::{ActivityCompletedEvent, EventNotifier};

use super::models::{Activity, ActivityType, LogActivityRequest};
use super::repository::ActivityRepository;

/// How many delivery attempts the detached notifier task makes.
const NOTIFY_ATTEMPTS: u32 = 3;

/// Errors surfaced by activity operations.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("Invalid activity type: {0}")]
    InvalidType(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Service for logging and querying activities.
#[derive(Clone)]
pub struct ActivityService {
    repo: ActivityRepository,
    notifier: Arc<dyn EventNotifier>,
}

impl ActivityService {
    /// Create a new activity service.
    pub fn new(repo: ActivityRepository, notifier: Arc<dyn EventNotifier>) -> Self {
        Self { repo, notifier }
    }

    /// Persist a new activity record.
    ///
    /// The type is lowercased before validation and the timestamp is
    /// assigned here; anything the caller supplied is ignored. The
    /// completion event is dispatched on a detached task after the write
    /// commits, so notifier latency or failure never affects the response.
    pub async fn log_activity(
        &self,
        user_id: &str,
        request: LogActivityRequest,
    ) -> Result<Activity, ActivityError> {
        let activity_type = request
            .activity_type
            .to_lowercase()
            .parse::<ActivityType>()
            .map_err(ActivityError::InvalidType)?;

        let activity = Activity {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            activity_type,
            name: request.name,
            description: request.description,
            duration: request.duration,
            difficulty: request.difficulty,
            feedback: request.feedback,
            timestamp: Utc::now(),
        };

        self.repo.insert(&activity).await?;
        info!(user_id = %user_id, activity_type = %activity_type, "activity logged");

        self.dispatch_completion(&activity);

        Ok(activity)
    }

    /// Return the user's activities for the current server-local calendar
    /// day, newest first. Both day boundaries are inclusive.
    pub async fn today(&self, user_id: &str) -> Result<Vec<Activity>, ActivityError> {
        let today = Local::now().date_naive();
        let start = today
            .and_hms_opt(0, 0, 0)
            .and_then(|dt| Local.from_local_datetime(&dt).earliest())
            .context("resolving start of day")?;
        let end = today
            .and_hms_milli_opt(23, 59, 59, 999)
            .and_then(|dt| Local.from_local_datetime(&dt).latest())
            .context("resolving end of day")?;

        Ok(self
            .repo
            .list_between(
                user_id,
                start.with_timezone(&Utc).timestamp_millis(),
                end.with_timezone(&Utc).timestamp_millis(),
            )
            .await?)
    }

    /// Fire the completion event on a detached task with a bounded retry
    /// budget. Failures are logged and swallowed.
    fn dispatch_completion(&self, activity: &Activity) {
        let notifier = self.notifier.clone();
        let event = ActivityCompletedEvent {
            user_id: activity.user_id.clone(),
            activity_id: activity.id.clone(),
            activity_type: activity.activity_type.to_string(),
            name: activity.name.clone(),
            duration: activity.duration,
            timestamp: activity.timestamp,
        };

        tokio::spawn(async move {
            for attempt in 1..=NOTIFY_ATTEMPTS {
                match notifier.activity_completed(&event).await {
                    Ok(()) => {
                        debug!(activity_id = %event.activity_id, "completion event delivered");
                        return;
                    }
                    Err(e) if attempt < NOTIFY_ATTEMPTS => {
                        let backoff = Duration::from_millis(200 * u64::from(attempt));
                        debug!(
                            activity_id = %event.activity_id,
                            attempt,
                            error = %e,
                            "completion event failed, retrying in {:?}",
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    Err(e) => {
                        warn!(
                            activity_id = %event.activity_id,
                            error = %e,
                            "giving up on completion event after {} attempts",
                            NOTIFY_ATTEMPTS
                        );
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatDb;
    use crate::notify::{NotifyError, NotifyResult, NullNotifier};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Notifier that records every event it receives.
    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<ActivityCompletedEvent>>,
    }

    #[async_trait]
    impl EventNotifier for RecordingNotifier {
        async fn activity_completed(&self, event: &ActivityCompletedEvent) -> NotifyResult<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    /// Notifier that always fails.
    struct FailingNotifier;

    #[async_trait]
    impl EventNotifier for FailingNotifier {
        async fn activity_completed(&self, _event: &ActivityCompletedEvent) -> NotifyResult<()> {
            Err(NotifyError::Status(503))
        }
    }

    fn request(activity_type: &str) -> LogActivityRequest {
        LogActivityRequest {
            activity_type: activity_type.to_string(),
            name: "Morning run".to_string(),
            description: None,
            duration: 30,
            difficulty: Some("moderate".to_string()),
            feedback: None,
        }
    }

    async fn service_with(notifier: Arc<dyn EventNotifier>) -> ActivityService {
        let db = ChatDb::in_memory().await.unwrap();
        ActivityService::new(ActivityRepository::new(db), notifier)
    }

    #[tokio::test]
    async fn test_type_normalized_to_lowercase() {
        let service = service_with(Arc::new(NullNotifier)).await;
        let activity = service
            .log_activity("user-1", request("RUNNING"))
            .await
            .unwrap();
        assert_eq!(activity.activity_type, ActivityType::Running);
        assert_eq!(activity.activity_type.to_string(), "running");
    }

    #[tokio::test]
    async fn test_unknown_type_rejected() {
        let service = service_with(Arc::new(NullNotifier)).await;
        let err = service
            .log_activity("user-1", request("skydiving"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActivityError::InvalidType(_)));
    }

    #[tokio::test]
    async fn test_timestamp_assigned_server_side() {
        let service = service_with(Arc::new(NullNotifier)).await;
        let before = Utc::now();
        let activity = service
            .log_activity("user-1", request("walking"))
            .await
            .unwrap();
        let after = Utc::now();
        assert!(activity.timestamp >= before && activity.timestamp <= after);
    }

    #[tokio::test]
    async fn test_completion_event_dispatched() {
        let recorder = Arc::new(RecordingNotifier::default());
        let service = service_with(recorder.clone()).await;

        let activity = service
            .log_activity("user-1", request("meditation"))
            .await
            .unwrap();

        // The dispatch runs on a detached task; poll briefly.
        for _ in 0..50 {
            if !recorder.events.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].activity_id, activity.id);
        assert_eq!(events[0].activity_type, "meditation");
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_write() {
        let service = service_with(Arc::new(FailingNotifier)).await;
        let activity = service
            .log_activity("user-1", request("reading"))
            .await
            .unwrap();

        let todays = service.today("user-1").await.unwrap();
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].id, activity.id);
    }

    #[tokio::test]
    async fn test_today_scopes_to_user_and_day() {
        let db = ChatDb::in_memory().await.unwrap();
        let repo = ActivityRepository::new(db);
        let service = ActivityService::new(repo.clone(), Arc::new(NullNotifier));

        let today = Local::now().date_naive();
        let start_of_day = Local
            .from_local_datetime(&today.and_hms_opt(0, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        let end_of_day = Local
            .from_local_datetime(&today.and_hms_milli_opt(23, 59, 59, 999).unwrap())
            .latest()
            .unwrap()
            .with_timezone(&Utc);

        let mk = |id: &str, ts| Activity {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            activity_type: ActivityType::Walking,
            name: "walk".to_string(),
            description: None,
            duration: 10,
            difficulty: None,
            feedback: None,
            timestamp: ts,
        };

        // Last instant of today is in; first instant of tomorrow is out.
        repo.insert(&mk("edge-in", end_of_day)).await.unwrap();
        repo.insert(&mk("first-in", start_of_day)).await.unwrap();
        repo.insert(&mk("tomorrow", end_of_day + chrono::Duration::milliseconds(1)))
            .await
            .unwrap();
        repo.insert(&mk("yesterday", start_of_day - chrono::Duration::milliseconds(1)))
            .await
            .unwrap();

        let todays = service.today("user-1").await.unwrap();
        let ids: Vec<_> = todays.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["edge-in", "first-in"]);
    }
}
