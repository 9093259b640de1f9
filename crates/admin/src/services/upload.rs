//! Reading the product form's multipart body.
//!
//! Text parts fill a [`ProductForm`]; every non-empty `images` part is
//! checked and kept in upload order. An empty file input (nothing chosen)
//! arrives as a nameless empty part and is skipped.

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use storehouse_core::validation::{ImageError, ProductForm, ValidationErrors, check_image};

use crate::api::ImageUpload;
use crate::error::AppError;

/// Form field that carries image files.
pub const IMAGE_FIELD: &str = "images";

/// A posted product form with its images.
#[derive(Debug, Default)]
pub struct ProductSubmission {
    pub form: ProductForm,
    pub images: Vec<ImageUpload>,
    /// One entry per rejected image.
    pub image_errors: Vec<ImageError>,
}

impl ProductSubmission {
    /// Add rejected images to the form's validation errors.
    pub fn report_images(&self, errors: &mut ValidationErrors) {
        if !self.image_errors.is_empty() {
            let messages: Vec<String> = self
                .image_errors
                .iter()
                .map(ToString::to_string)
                .collect();
            errors.add(IMAGE_FIELD, messages.join("; "));
        }
    }
}

/// Drain the multipart body.
///
/// # Errors
///
/// Returns [`AppError::BadRequest`] for a malformed body or a part that
/// exceeds the request limit.
pub async fn read_product_submission(
    mut multipart: Multipart,
) -> Result<ProductSubmission, AppError> {
    let mut submission = ProductSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == IMAGE_FIELD {
            read_image(field, &mut submission).await?;
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            submission.form.set(&name, value);
        }
    }

    Ok(submission)
}

async fn read_image(field: Field<'_>, submission: &mut ProductSubmission) -> Result<(), AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;

    if file_name.is_empty() && bytes.is_empty() {
        return Ok(());
    }

    match check_image(&file_name, content_type.as_deref(), bytes.len()) {
        Ok(()) => submission.images.push(ImageUpload {
            file_name,
            content_type: content_type.unwrap_or_default(),
            bytes: bytes.to_vec(),
        }),
        Err(e) => {
            tracing::info!(file_name = %file_name, "Rejected product image: {e}");
            submission.image_errors.push(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_images() {
        let mut errors = ValidationErrors::new();
        ProductSubmission::default().report_images(&mut errors);
        assert!(errors.is_empty());

        let submission = ProductSubmission {
            image_errors: vec![
                ImageError::UnsupportedType {
                    file_name: "a.bmp".to_string(),
                },
                ImageError::Empty {
                    file_name: "b.png".to_string(),
                },
            ],
            ..ProductSubmission::default()
        };
        submission.report_images(&mut errors);
        assert_eq!(
            errors.get(IMAGE_FIELD),
            Some("a.bmp: only JPEG, PNG, WebP and GIF images are allowed; b.png: file is empty")
        );
    }
}
