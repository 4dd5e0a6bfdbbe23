//! Snippet rows (lineage nodes).

use super::AssetStore;
use crate::error_handling::DatabaseError;
use crate::storage::models::{ExtractionMethod, Snippet};

impl AssetStore {
    /// Records a loader snippet for a successfully downloaded asset.
    ///
    /// The insert only selects from `assets` rows that are successful, so a
    /// snippet can never reference a missing or failed asset. Recording the
    /// same (asset, code) pair twice returns the existing id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::AssetNotReady` if the asset is missing or not
    /// successful.
    pub async fn record_snippet(
        &self,
        asset_alias: &str,
        parameter: &str,
        code: &str,
        method: ExtractionMethod,
    ) -> Result<i64, DatabaseError> {
        // WHERE is required before ON CONFLICT in INSERT ... SELECT
        sqlx::query(
            "INSERT INTO snippets (asset_alias, parameter, code, method)
             SELECT alias, ?, ?, ? FROM assets WHERE alias = ? AND success = 1
             ON CONFLICT(asset_alias, code) DO NOTHING",
        )
        .bind(parameter)
        .bind(code)
        .bind(method.as_str())
        .bind(asset_alias)
        .execute(self.pool())
        .await?;

        let id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM snippets WHERE asset_alias = ? AND code = ?")
                .bind(asset_alias)
                .bind(code)
                .fetch_optional(self.pool())
                .await?;

        id.ok_or_else(|| DatabaseError::AssetNotReady(asset_alias.to_string()))
    }

    /// Snippets recovered from one asset, in insertion order.
    pub async fn snippets_for(&self, asset_alias: &str) -> Result<Vec<Snippet>, DatabaseError> {
        let snippets = sqlx::query_as::<_, Snippet>(
            "SELECT id, asset_alias, parameter, code, method FROM snippets
             WHERE asset_alias = ? ORDER BY id",
        )
        .bind(asset_alias)
        .fetch_all(self.pool())
        .await?;
        Ok(snippets)
    }
}
