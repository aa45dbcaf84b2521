//! User lookups.

use tracing::instrument;

use crate::api::types::User;
use crate::error::Result;
use crate::jira::Jira;

impl Jira {
    /// The authenticated user. Fetched once per handle.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User> {
        self.cache()
            .current_user
            .get_or_try_init(|| self.get::<User>("myself"))
            .await
            .cloned()
    }

    /// A user by account ID, or by username when user privacy mode is off.
    #[instrument(skip(self))]
    pub async fn user(&self, id: &str) -> Result<User> {
        let param = if self.settings().user_privacy_mode {
            "accountId"
        } else {
            "username"
        };
        self.get(&format!("user?{}={}", param, urlencoding::encode(id)))
            .await
    }
}
