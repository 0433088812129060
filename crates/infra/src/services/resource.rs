//! Generic CRUD over one backend collection

use std::marker::PhantomData;
use std::sync::Arc;

use fleetdesk_domain::Page;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{ApiClient, ApiError};

/// Paging and search parameters for list calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    /// No paging, no search
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based page number
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Page size
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Free-text filter, sent URL-encoded
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// `?page=2&limit=20&search=...`, or empty when nothing is set
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(format!("page={}", page));
        }
        if let Some(limit) = self.limit {
            params.push(format!("limit={}", limit));
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            params.push(format!("search={}", urlencoding::encode(term)));
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

/// CRUD calls for the collection at `path`
pub struct ResourceService<T> {
    client: Arc<ApiClient>,
    path: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self { client: Arc::clone(&self.client), path: self.path.clone(), _item: PhantomData }
    }
}

impl<T: DeserializeOwned> ResourceService<T> {
    /// Service for the collection at `path`, e.g. `/companies`
    pub fn new(client: Arc<ApiClient>, path: impl Into<String>) -> Self {
        let path = path.into().trim_end_matches('/').to_string();
        Self { client, path, _item: PhantomData }
    }

    /// Collection path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Underlying API client
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// One page of the collection
    ///
    /// # Errors
    /// See [`ApiClient::get_list`].
    pub async fn list(&self, query: &ListQuery) -> Result<Page<T>, ApiError> {
        self.list_at(&self.path, query).await
    }

    /// Single entity by id
    ///
    /// # Errors
    /// `Backend` with status 404 when it does not exist.
    pub async fn get(&self, id: i64) -> Result<T, ApiError> {
        self.client.get(&self.item_path(id)).await
    }

    /// POST a new entity and return what the server stored
    ///
    /// # Errors
    /// See [`ApiClient::post`].
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T, ApiError> {
        self.client.post(&self.path, body).await
    }

    /// Partial update (`PATCH`)
    ///
    /// # Errors
    /// See [`ApiClient::patch`].
    pub async fn update<B: Serialize + ?Sized>(&self, id: i64, body: &B) -> Result<T, ApiError> {
        self.client.patch(&self.item_path(id), body).await
    }

    /// Remove an entity; any response body is ignored
    ///
    /// # Errors
    /// See [`ApiClient::delete`].
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete::<serde_json::Value>(&self.item_path(id)).await.map(|_| ())
    }

    /// List any collection path that yields `T`, e.g. a nested one
    pub(crate) async fn list_at(&self, path: &str, query: &ListQuery) -> Result<Page<T>, ApiError> {
        self.client.get_list(&format!("{}{}", path, query.to_query_string())).await
    }

    pub(crate) fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }
}
