//! Wire types for the remote API.

use serde::{Deserialize, Serialize};
use vchain_models::TaskStatus;

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: ProfileUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUser {
    pub id: u64,
    #[serde(default)]
    pub organizations: Vec<Organization>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub id: u64,
}

impl ProfileResponse {
    /// Team scope: first organization, else the user's own id.
    pub fn scope(&self) -> u64 {
        self.user
            .organizations
            .first()
            .map(|org| org.id)
            .unwrap_or(self.user.id)
    }
}

// =============================================================================
// Uploads
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadKind {
    Dataset,
    DatasetPreview,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub filename: String,
    pub number_of_parts: u32,
    #[serde(rename = "type")]
    pub kind: UploadKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub upload_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadPart {
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadCompleteRequest {
    pub parts: Vec<UploadPart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadCompleteResponse {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetType {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_directory: bool,
}

impl DatasetType {
    pub fn image() -> Self {
        Self {
            name: "image".to_string(),
            kind: "image".to_string(),
            is_directory: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatasetRequest {
    pub file_count: u32,
    pub name: String,
    pub upload_id: String,
    pub preview_upload_ids: Vec<String>,
    #[serde(rename = "type")]
    pub kind: DatasetType,
    pub as_team_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDatasetResponse {
    pub dataset: Dataset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub id: String,
}

/// An uploaded input, registered as a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    /// Asset id, used for deletion
    pub id: String,
    /// URL to reference in generation tasks
    pub url: String,
}

// =============================================================================
// Tasks
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub task_type: String,
    pub internal: bool,
    pub options: TaskOptions,
    pub as_team_id: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TaskOptions {
    Gen2(Gen2TaskOptions),
    Gen3(Gen3TaskOptions),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gen2TaskOptions {
    pub seconds: u32,
    pub gen2_options: Gen2Payload,
    pub name: String,
    pub asset_group_name: String,
    pub explore_mode: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Gen2Payload {
    pub mode: String,
    pub seed: u32,
    pub interpolate: bool,
    pub upscale: bool,
    pub watermark: bool,
    pub text_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_video: Option<String>,
    pub motion_score: u8,
    pub use_motion_score: bool,
    pub use_motion_vectors: bool,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Gen3TaskOptions {
    pub name: String,
    pub seconds: u32,
    pub text_prompt: String,
    pub seed: u32,
    #[serde(rename = "exploreMode")]
    pub explore_mode: bool,
    pub watermark: bool,
    pub enhance_prompt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_video: Option<String>,
    pub image_as_end_frame: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(rename = "assetGroupName")]
    pub asset_group_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress_ratio: Option<serde_json::Value>,
    #[serde(default)]
    pub progress_text: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub error: Option<TaskErrorInfo>,
}

impl Task {
    /// Progress ratio as text, whatever JSON type the service used.
    pub fn progress(&self) -> String {
        match &self.progress_ratio {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "0".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub preview_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskErrorInfo {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, alias = "moderationCategory")]
    pub moderation_category: Option<String>,
}

// =============================================================================
// Assets
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteAssetRequest {}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAssetResponse {
    #[serde(default)]
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_prefers_first_organization() {
        let profile: ProfileResponse = serde_json::from_str(
            r#"{"user":{"id":5,"organizations":[{"id":77},{"id":78}]}}"#,
        )
        .unwrap();
        assert_eq!(profile.scope(), 77);

        let profile: ProfileResponse =
            serde_json::from_str(r#"{"user":{"id":5,"organizations":[]}}"#).unwrap();
        assert_eq!(profile.scope(), 5);
    }

    #[test]
    fn test_upload_complete_uses_capitalised_part_keys() {
        let req = UploadCompleteRequest {
            parts: vec![UploadPart {
                part_number: 1,
                etag: "abc".into(),
            }],
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"parts":[{"PartNumber":1,"ETag":"abc"}]}"#
        );
    }

    #[test]
    fn test_task_failure_fields_parse() {
        let resp: TaskResponse = serde_json::from_str(
            r#"{"task":{"id":"t1","status":"FAILED","error":{"message":"blocked","reason":"SAFETY.INPUT.TEXT","moderation_category":"violence"}}}"#,
        )
        .unwrap();
        let error = resp.task.error.unwrap();
        assert_eq!(error.reason.as_deref(), Some("SAFETY.INPUT.TEXT"));
        assert_eq!(error.moderation_category.as_deref(), Some("violence"));
        assert_eq!(resp.task.status, TaskStatus::Failed);
    }

    #[test]
    fn test_progress_accepts_number_or_string() {
        let task: Task =
            serde_json::from_str(r#"{"id":"t","status":"RUNNING","progressRatio":"0.25"}"#).unwrap();
        assert_eq!(task.progress(), "0.25");
        let task: Task =
            serde_json::from_str(r#"{"id":"t","status":"RUNNING","progressRatio":0.5}"#).unwrap();
        assert_eq!(task.progress(), "0.5");
    }
}
