//! Review API request/response shapes.
//!
//! Field names follow the REST API (camelCase JSON). Annotations and layers are
//! flat lists tagged with the zero-based page number they belong to.

use serde::{Deserialize, Deserializer, Serialize};

pub mod load_state;

pub use load_state::LoadState;

/// Annotation position in logical canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationPosition {
    pub x: f64,
    pub y: f64,
}

/// One text annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAnnotation {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    pub position: AnnotationPosition,
    pub width: f64,
    pub height: f64,
    pub page_number: u32,
}

/// Raster layers of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLayer {
    pub ink_image_ref: String,
    pub background_image_ref: String,
    pub page_number: u32,
}

/// Create/update request body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub annotations: Vec<ReviewAnnotation>,
    pub layers: Vec<ReviewLayer>,
}

/// Who wrote the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewerType {
    #[default]
    Student,
    Teacher,
    Ai,
}

/// Review detail response (edit flow source).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetail {
    pub id: u64,
    pub answer_id: u64,
    #[serde(default)]
    pub reviewer_id: u64,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_type: ReviewerType,
    #[serde(default)]
    pub ai_review_content: Option<String>,
    /// ISO-8601 timestamp, kept verbatim.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub annotations: Vec<ReviewAnnotation>,
    #[serde(default)]
    pub layers: Vec<ReviewLayer>,
}

impl ReviewDetail {
    /// Request body carrying the same annotations and layers.
    pub fn to_submission(&self) -> ReviewSubmission {
        ReviewSubmission {
            annotations: self.annotations.clone(),
            layers: self.layers.clone(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
