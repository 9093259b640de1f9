//! Promotion codes.

use storehouse_core::validation::PromotionDraft;
use storehouse_core::{Promotion, PromotionId};
use tracing::instrument;

use super::{AdminApi, ApiError, Credentials, Listing, Stamped, item_path};

const PROMOTIONS: &str = "/admin/promotion";

impl AdminApi {
    /// `GET /admin/promotion`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds))]
    pub async fn list_promotions(&self, creds: &Credentials) -> Result<Vec<Promotion>, ApiError> {
        let listing: Option<Listing<Promotion>> = self.get(PROMOTIONS, &[], creds).await?;
        Ok(Listing::page_or_empty(listing).items)
    }

    /// `POST /admin/promotion`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails, e.g. a duplicate code.
    #[instrument(skip(self, creds, draft), fields(code = %draft.code))]
    pub async fn create_promotion(
        &self,
        creds: &Credentials,
        draft: &PromotionDraft,
    ) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .send_json(
                reqwest::Method::POST,
                PROMOTIONS,
                &Stamped::created(draft, creds),
                Some(creds),
            )
            .await?;
        Ok(())
    }

    /// `PUT /admin/promotion/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds, draft), fields(promotion_id = %id))]
    pub async fn update_promotion(
        &self,
        creds: &Credentials,
        id: &PromotionId,
        draft: &PromotionDraft,
    ) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .send_json(
                reqwest::Method::PUT,
                &item_path(PROMOTIONS, id.as_str()),
                &Stamped::updated(draft, creds),
                Some(creds),
            )
            .await?;
        Ok(())
    }

    /// `DELETE /admin/promotion/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds), fields(promotion_id = %id))]
    pub async fn delete_promotion(
        &self,
        creds: &Credentials,
        id: &PromotionId,
    ) -> Result<(), ApiError> {
        self.delete(&item_path(PROMOTIONS, id.as_str()), creds).await
    }
}
