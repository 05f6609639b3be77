use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a draft post.
///
/// Transitions only move forward; `Published` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Draft,
    Uploading,
    Published,
    Failed,
    Cancelled,
}

impl PostStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PostStatus::Published | PostStatus::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Encodes the post state machine:
    /// `Draft -> Uploading | Published | Cancelled`,
    /// `Uploading -> Published | Failed | Cancelled`,
    /// `Failed -> Uploading` (retry resubmission).
    pub fn can_transition_to(&self, next: PostStatus) -> bool {
        use PostStatus::*;
        matches!(
            (self, next),
            (Draft, Uploading)
                | (Draft, Published)
                | (Draft, Cancelled)
                | (Uploading, Published)
                | (Uploading, Failed)
                | (Uploading, Cancelled)
                | (Failed, Uploading)
        )
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PostStatus::Draft => write!(f, "draft"),
            PostStatus::Uploading => write!(f, "uploading"),
            PostStatus::Published => write!(f, "published"),
            PostStatus::Failed => write!(f, "failed"),
            PostStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "uploading" => Ok(PostStatus::Uploading),
            "published" => Ok(PostStatus::Published),
            "failed" => Ok(PostStatus::Failed),
            "cancelled" => Ok(PostStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid post status: {}", s)),
        }
    }
}

/// A post record created before its attachments finish processing.
///
/// Not visible to normal readers until published. The store holds only a
/// weak back-reference (`id`) to any upload job; job state is never mutated
/// from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub board_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
}

/// Request to create a draft post.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDraftPost {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 50000,
        message = "Content must be between 1 and 50000 characters"
    ))]
    pub content: String,
    pub board_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_status_display() {
        assert_eq!(PostStatus::Draft.to_string(), "draft");
        assert_eq!(PostStatus::Uploading.to_string(), "uploading");
        assert_eq!(PostStatus::Published.to_string(), "published");
        assert_eq!(PostStatus::Failed.to_string(), "failed");
        assert_eq!(PostStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_post_status_from_str() {
        assert_eq!("draft".parse::<PostStatus>().unwrap(), PostStatus::Draft);
        assert_eq!(
            "uploading".parse::<PostStatus>().unwrap(),
            PostStatus::Uploading
        );
        assert_eq!(
            "published".parse::<PostStatus>().unwrap(),
            PostStatus::Published
        );
        assert!("invalid_status".parse::<PostStatus>().is_err());
    }

    #[test]
    fn test_post_status_wire_format() {
        let json = serde_json::to_string(&PostStatus::Draft).unwrap();
        assert_eq!(json, "\"DRAFT\"");
        let status: PostStatus = serde_json::from_str("\"PUBLISHED\"").unwrap();
        assert_eq!(status, PostStatus::Published);
    }

    #[test]
    fn test_terminal_states() {
        assert!(PostStatus::Published.is_terminal());
        assert!(PostStatus::Cancelled.is_terminal());
        assert!(!PostStatus::Draft.is_terminal());
        assert!(!PostStatus::Uploading.is_terminal());
        assert!(!PostStatus::Failed.is_terminal());
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(PostStatus::Draft.can_transition_to(PostStatus::Uploading));
        assert!(PostStatus::Draft.can_transition_to(PostStatus::Published));
        assert!(PostStatus::Draft.can_transition_to(PostStatus::Cancelled));
        assert!(PostStatus::Uploading.can_transition_to(PostStatus::Published));
        assert!(PostStatus::Uploading.can_transition_to(PostStatus::Failed));
        assert!(PostStatus::Uploading.can_transition_to(PostStatus::Cancelled));
        assert!(PostStatus::Failed.can_transition_to(PostStatus::Uploading));
    }

    #[test]
    fn test_backward_and_terminal_transitions_rejected() {
        assert!(!PostStatus::Published.can_transition_to(PostStatus::Draft));
        assert!(!PostStatus::Published.can_transition_to(PostStatus::Uploading));
        assert!(!PostStatus::Cancelled.can_transition_to(PostStatus::Published));
        assert!(!PostStatus::Uploading.can_transition_to(PostStatus::Draft));
        assert!(!PostStatus::Failed.can_transition_to(PostStatus::Published));
    }

    #[test]
    fn test_new_draft_post_validation() {
        let valid = NewDraftPost {
            title: "Hello".to_string(),
            content: "Body".to_string(),
            board_id: Uuid::new_v4(),
            category_id: None,
        };
        assert!(valid.validate().is_ok());

        let empty_title = NewDraftPost {
            title: String::new(),
            ..valid.clone()
        };
        assert!(empty_title.validate().is_err());

        let oversized_title = NewDraftPost {
            title: "x".repeat(201),
            ..valid
        };
        assert!(oversized_title.validate().is_err());
    }
}
