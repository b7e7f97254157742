//! HTTP client for the storefront admin API.

use chat_sync::{ApiError, ChatApi, Conversation, Message};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{
    Category, CategoryPayload, Order, Product, ProductPayload, Review, ReviewPayload, Stats,
};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send, demand a success status, and parse the body as JSON.
    /// Empty bodies (some delete endpoints) come back as `Null`.
    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let resp = builder.send().await.map_err(classify)?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let text = resp.text().await.map_err(classify)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Other(e.into()))
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        envelope: &str,
    ) -> Result<Vec<T>, ApiError> {
        let value = self.execute(self.request(reqwest::Method::GET, path)).await?;
        unwrap_list(value, envelope)
    }

    // ── Auth ────────────────────────────────────────────────────────────

    /// Exchange credentials for a session token. Does not need `token`.
    pub async fn login(&self, login: &str, password: &str) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        struct LoginResponse {
            token: String,
        }
        let value = self
            .execute(
                self.request(reqwest::Method::POST, "/admin/login")
                    .json(&serde_json::json!({ "login": login, "password": password })),
            )
            .await?;
        let parsed: LoginResponse =
            serde_json::from_value(value).map_err(|e| ApiError::Other(e.into()))?;
        Ok(parsed.token)
    }

    // ── Dashboard ───────────────────────────────────────────────────────

    pub async fn stats(&self) -> Result<Stats, ApiError> {
        let value = self
            .execute(self.request(reqwest::Method::GET, "/admin/stats"))
            .await?;
        unwrap_one(value, "stats")
    }

    // ── Categories ──────────────────────────────────────────────────────

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_list("/admin/categories", "categories").await
    }

    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, ApiError> {
        let value = self
            .execute(
                self.request(reqwest::Method::POST, "/admin/categories")
                    .json(payload),
            )
            .await?;
        unwrap_one(value, "category")
    }

    pub async fn update_category(
        &self,
        id: &str,
        payload: &CategoryPayload,
    ) -> Result<Category, ApiError> {
        let value = self
            .execute(
                self.request(reqwest::Method::PUT, &format!("/admin/categories/{id}"))
                    .json(payload),
            )
            .await?;
        unwrap_one(value, "category")
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.execute(self.request(reqwest::Method::DELETE, &format!("/admin/categories/{id}")))
            .await?;
        Ok(())
    }

    // ── Products ────────────────────────────────────────────────────────

    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_list("/admin/products", "products").await
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
        let value = self
            .execute(
                self.request(reqwest::Method::POST, "/admin/products")
                    .json(payload),
            )
            .await?;
        unwrap_one(value, "product")
    }

    pub async fn update_product(
        &self,
        id: &str,
        payload: &ProductPayload,
    ) -> Result<Product, ApiError> {
        let value = self
            .execute(
                self.request(reqwest::Method::PUT, &format!("/admin/products/{id}"))
                    .json(payload),
            )
            .await?;
        unwrap_one(value, "product")
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ApiError> {
        self.execute(self.request(reqwest::Method::DELETE, &format!("/admin/products/{id}")))
            .await?;
        Ok(())
    }

    // ── Reviews ─────────────────────────────────────────────────────────

    pub async fn reviews(&self) -> Result<Vec<Review>, ApiError> {
        self.get_list("/admin/reviews", "reviews").await
    }

    pub async fn create_review(&self, payload: &ReviewPayload) -> Result<Review, ApiError> {
        let value = self
            .execute(
                self.request(reqwest::Method::POST, "/admin/reviews")
                    .json(payload),
            )
            .await?;
        unwrap_one(value, "review")
    }

    pub async fn delete_review(&self, id: &str) -> Result<(), ApiError> {
        self.execute(self.request(reqwest::Method::DELETE, &format!("/admin/reviews/{id}")))
            .await?;
        Ok(())
    }

    // ── Orders ──────────────────────────────────────────────────────────

    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get_list("/orders", "orders").await
    }

    pub async fn delete_order(&self, id: &str) -> Result<(), ApiError> {
        self.execute(self.request(reqwest::Method::DELETE, &format!("/orders/{id}")))
            .await?;
        Ok(())
    }
}

impl ChatApi for ApiClient {
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get_list("/admin/chats", "chats").await
    }

    async fn history(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.get_list(&format!("/admin/chats/{conversation_id}/messages"), "messages")
            .await
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        let value = self
            .execute(
                self.request(
                    reqwest::Method::POST,
                    &format!("/admin/chats/{conversation_id}/messages"),
                )
                .json(&serde_json::json!({ "content": content })),
            )
            .await?;
        unwrap_one(value, "message")
    }
}

/// Map transport-level failures to `Unavailable`, everything else to `Other`.
fn classify(err: reqwest::Error) -> ApiError {
    if err.is_connect() || err.is_timeout() {
        ApiError::Unavailable
    } else {
        ApiError::Other(err.into())
    }
}

/// Accept both `{"key": [...]}` envelopes and bare arrays.
fn unwrap_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>, ApiError> {
    let inner = match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| ApiError::Other(e.into()))
}

/// Accept both `{"key": {...}}` envelopes and bare objects.
fn unwrap_one<T: DeserializeOwned>(value: Value, key: &str) -> Result<T, ApiError> {
    let inner = match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| ApiError::Other(e.into()))
}
