//! Form handling for post and comment submissions.
//!
//! Post forms arrive as `multipart/form-data` because they may carry an image;
//! comments are plain urlencoded bodies. Field-level failures are collected in
//! [`FieldErrors`] so the page can be rendered again with messages next to
//! each field.

use crate::{errors::ApiError, store::Store};
use axum::{body::Bytes, extract::Multipart};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use validator::{Validate, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";
pub const EMPTY_COMMENT: &str = "This field cannot be empty.";
pub const INVALID_GROUP: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str = "Upload a valid image. \
The file you uploaded was either not an image or a corrupted image.";

/// Messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::default();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                fields.add(field.as_ref(), message);
            }
        }
        fields
    }
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedImage {
    /// Decodes the whole upload. The declared content type is not trusted.
    ///
    /// Decoding is CPU-bound; async callers go through [`UploadedImage::verify`].
    pub fn decodes(&self) -> bool {
        let format = match image::guess_format(&self.bytes) {
            Ok(format) => format,
            Err(e) => {
                debug!("Upload {} has no known image format: {}", self.file_name, e);
                return false;
            }
        };
        match image::load_from_memory_with_format(&self.bytes, format) {
            Ok(_) => true,
            Err(e) => {
                debug!("Upload {} failed to decode as {:?}: {}", self.file_name, format, e);
                false
            }
        }
    }

    /// [`UploadedImage::decodes`] on the blocking pool.
    pub async fn verify(&self) -> bool {
        if self.bytes.is_empty() {
            return false;
        }
        let upload = self.clone();
        tokio::task::spawn_blocking(move || upload.decodes())
            .await
            .unwrap_or(false)
    }
}

/// Raw post form as submitted.
#[derive(Debug, Default, Clone, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    pub group: Option<String>,
    pub image: Option<UploadedImage>,
    pub clear_image: bool,
}

/// A post form that passed validation.
#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedImage>,
    pub clear_image: bool,
}

impl PostForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = PostForm::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => form.text = field.text().await.map_err(malformed)?.trim().to_string(),
                "group" => {
                    let raw = field.text().await.map_err(malformed)?;
                    let raw = raw.trim();
                    form.group = (!raw.is_empty()).then(|| raw.to_string());
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(malformed)?;
                    // browsers send an empty part when no file was picked
                    if !file_name.is_empty() || !bytes.is_empty() {
                        form.image = Some(UploadedImage {
                            file_name,
                            content_type,
                            bytes,
                        });
                    }
                }
                "image-clear" => {
                    let raw = field.text().await.map_err(malformed)?;
                    form.clear_image = matches!(raw.trim(), "on" | "true" | "1");
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Runs field validation plus the checks that need the store.
    pub async fn clean(self, store: &Store) -> Result<CleanedPost, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::default(),
            Err(e) => FieldErrors::from(e),
        };

        let group_id = match self.group.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<i64>().ok().and_then(|id| store.group(id)) {
                Some(group) => Some(group.id),
                None => {
                    errors.add("group", INVALID_GROUP);
                    None
                }
            },
        };

        if let Some(image) = &self.image {
            if !image.verify().await {
                errors.add("image", INVALID_IMAGE);
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CleanedPost {
            text: self.text,
            group_id,
            image: self.image,
            clear_image: self.clear_image,
        })
    }
}

/// What the page shows back in the form inputs.
#[derive(Debug, Default, Serialize)]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl From<&PostForm> for PostFormValues {
    fn from(form: &PostForm) -> Self {
        Self {
            text: form.text.clone(),
            group: form.group.clone(),
            image: form.image.as_ref().map(|i| i.file_name.clone()),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field cannot be empty."))]
    pub text: String,
}

impl CommentForm {
    pub fn clean(mut self) -> Result<String, (CommentForm, FieldErrors)> {
        self.text = self.text.trim().to_string();
        match self.validate() {
            Ok(()) => Ok(self.text),
            Err(e) => Err((self, FieldErrors::from(e))),
        }
    }
}

fn malformed(err: axum::extract::multipart::MultipartError) -> ApiError {
    let mut fields = FieldErrors::default();
    fields.add("form", err.body_text());
    ApiError::ValidationError(fields)
}
