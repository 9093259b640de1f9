//! Roles and admin accounts.

use storehouse_core::validation::{AccountDraft, RoleDraft};
use storehouse_core::{AdminAccount, AdminAccountId, Role, RoleId};
use tracing::instrument;

use super::{AdminApi, ApiError, Credentials, Listing, Stamped, item_path};

const ROLES: &str = "/admin/role";
const ACCOUNTS: &str = "/admin/account";

impl AdminApi {
    /// `GET /admin/role`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds))]
    pub async fn list_roles(&self, creds: &Credentials) -> Result<Vec<Role>, ApiError> {
        let listing: Option<Listing<Role>> = self.get(ROLES, &[], creds).await?;
        Ok(Listing::page_or_empty(listing).items)
    }

    /// `POST /admin/role`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds, draft), fields(name = %draft.name))]
    pub async fn create_role(
        &self,
        creds: &Credentials,
        draft: &RoleDraft,
    ) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .send_json(
                reqwest::Method::POST,
                ROLES,
                &Stamped::created(draft, creds),
                Some(creds),
            )
            .await?;
        Ok(())
    }

    /// `PUT /admin/role/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds, draft), fields(role_id = %id))]
    pub async fn update_role(
        &self,
        creds: &Credentials,
        id: &RoleId,
        draft: &RoleDraft,
    ) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .send_json(
                reqwest::Method::PUT,
                &item_path(ROLES, id.as_str()),
                &Stamped::updated(draft, creds),
                Some(creds),
            )
            .await?;
        Ok(())
    }

    /// `DELETE /admin/role/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds), fields(role_id = %id))]
    pub async fn delete_role(&self, creds: &Credentials, id: &RoleId) -> Result<(), ApiError> {
        self.delete(&item_path(ROLES, id.as_str()), creds).await
    }

    /// `GET /admin/account`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds))]
    pub async fn list_accounts(&self, creds: &Credentials) -> Result<Vec<AdminAccount>, ApiError> {
        let listing: Option<Listing<AdminAccount>> = self.get(ACCOUNTS, &[], creds).await?;
        Ok(Listing::page_or_empty(listing).items)
    }

    /// `POST /admin/account`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds, draft), fields(username = %draft.username))]
    pub async fn create_account(
        &self,
        creds: &Credentials,
        draft: &AccountDraft,
    ) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .send_json(
                reqwest::Method::POST,
                ACCOUNTS,
                &Stamped::created(draft, creds),
                Some(creds),
            )
            .await?;
        Ok(())
    }

    /// `PUT /admin/account/{id}`. A draft without a password keeps the
    /// current one.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds, draft), fields(account_id = %id))]
    pub async fn update_account(
        &self,
        creds: &Credentials,
        id: &AdminAccountId,
        draft: &AccountDraft,
    ) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self
            .send_json(
                reqwest::Method::PUT,
                &item_path(ACCOUNTS, id.as_str()),
                &Stamped::updated(draft, creds),
                Some(creds),
            )
            .await?;
        Ok(())
    }

    /// `DELETE /admin/account/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    #[instrument(skip(self, creds), fields(account_id = %id))]
    pub async fn delete_account(
        &self,
        creds: &Credentials,
        id: &AdminAccountId,
    ) -> Result<(), ApiError> {
        self.delete(&item_path(ACCOUNTS, id.as_str()), creds).await
    }
}
