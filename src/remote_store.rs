use std::marker::PhantomData;

use reqwest::Method;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::repository::RemoteKind;
use crate::supabase::{AuthSession, SupabaseClient, read_json};

/// A remote table scoped to the signed-in account.
///
/// Every query carries the caller's access token and an explicit `user_id`
/// filter, so rows of other accounts are never read or written.
pub struct RemoteTable<K: RemoteKind> {
    client: SupabaseClient,
    _kind: PhantomData<K>,
}

impl<K: RemoteKind> Clone for RemoteTable<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _kind: PhantomData,
        }
    }
}

#[derive(Serialize)]
struct Owned<'a, T: Serialize> {
    user_id: &'a str,
    #[serde(flatten)]
    values: &'a T,
}

impl<K: RemoteKind> RemoteTable<K> {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    /// All of the caller's rows, newest first.
    pub async fn list(&self, auth: &AuthSession) -> StoreResult<Vec<K::Row>> {
        let request = self
            .client
            .table_request(Method::GET, K::TABLE, Some(&auth.access_token))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", auth.user.id)),
                ("order", format!("{}.desc", K::ORDER_COLUMN)),
            ]);
        read_json(request.send().await?).await
    }

    /// Re-reads the list after a write that has already been applied. A read
    /// failure is logged and yields `None`; it never undoes the write.
    pub async fn reload(&self, auth: &AuthSession) -> Option<Vec<K::Row>> {
        match self.list(auth).await {
            Ok(rows) => Some(rows),
            Err(err) => {
                tracing::error!(table = K::TABLE, error = %err, "failed to reload after write");
                None
            }
        }
    }

    pub async fn get(&self, auth: &AuthSession, id: i64) -> StoreResult<K::Row> {
        let request = self
            .client
            .table_request(Method::GET, K::TABLE, Some(&auth.access_token))
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{}", auth.user.id)),
            ]);
        let rows: Vec<K::Row> = read_json(request.send().await?).await?;
        rows.into_iter().next().ok_or(StoreError::NotFound(K::LABEL))
    }

    /// Inserts one row; identifier and creation time are assigned by the store.
    pub async fn insert(&self, auth: &AuthSession, values: &K::Insert) -> StoreResult<K::Row> {
        let body = [Owned {
            user_id: &auth.user.id,
            values,
        }];
        let request = self
            .client
            .table_request(Method::POST, K::TABLE, Some(&auth.access_token))
            .header("Prefer", "return=representation")
            .json(&body);
        let rows: Vec<K::Row> = read_json(request.send().await?).await?;
        rows.into_iter().next().ok_or_else(|| {
            StoreError::Schema(format!("insert into {} returned no row", K::TABLE))
        })
    }

    pub async fn update(&self, auth: &AuthSession, id: i64, patch: &K::Patch) -> StoreResult<K::Row> {
        let request = self
            .client
            .table_request(Method::PATCH, K::TABLE, Some(&auth.access_token))
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{}", auth.user.id)),
            ])
            .header("Prefer", "return=representation")
            .json(patch);
        let rows: Vec<K::Row> = read_json(request.send().await?).await?;
        rows.into_iter().next().ok_or(StoreError::NotFound(K::LABEL))
    }

    pub async fn delete(&self, auth: &AuthSession, id: i64) -> StoreResult<()> {
        let request = self
            .client
            .table_request(Method::DELETE, K::TABLE, Some(&auth.access_token))
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{}", auth.user.id)),
            ])
            .header("Prefer", "return=representation");
        let rows: Vec<K::Row> = read_json(request.send().await?).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(K::LABEL));
        }
        Ok(())
    }
}
