//! Shared helpers for API tests: an in-memory app, tokens and a request driver.

#![allow(dead_code)]

use std::str::FromStr;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use kosh_api::{AppState, create_router};
use kosh_core::{EngineConfig, TaxEngine};
use kosh_shared::config::{SectionConfig, TransactionTypeConfig};
use kosh_shared::{JwtConfig, JwtService, Role, TaxConfig};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// A router plus a token factory bound to one company.
pub struct TestApp {
    pub router: Router,
    pub jwt: JwtService,
    pub company_id: Uuid,
}

fn tax_config() -> TaxConfig {
    let sections = [
        ("194C", "tds", "Payments to contractors"),
        ("194J", "tds", "Professional or technical fees"),
        ("206C(1H)", "tcs", "Sale of goods"),
    ]
    .map(|(code, kind, description)| SectionConfig {
        code: code.to_string(),
        kind: kind.to_string(),
        description: description.to_string(),
    });
    let types = [
        ("contractor_payment", "194C"),
        ("professional_fees", "194J"),
        ("sale_of_goods", "206C(1H)"),
    ]
    .map(|(name, section)| TransactionTypeConfig {
        name: name.to_string(),
        section: section.to_string(),
        nature: None,
    });
    TaxConfig {
        sections: sections.to_vec(),
        transaction_types: types.to_vec(),
        ..TaxConfig::default()
    }
}

pub fn jwt_service() -> JwtService {
    JwtService::new(&JwtConfig {
        secret: "kosh-api-test-secret-at-least-32-bytes".to_string(),
        access_token_expiry_secs: 3600,
    })
}

pub fn spawn_app() -> TestApp {
    let config = EngineConfig::from_config(&tax_config()).unwrap();
    let state = AppState::new(TaxEngine::in_memory(config), jwt_service());
    TestApp {
        router: create_router(state, Duration::from_secs(30)),
        jwt: jwt_service(),
        company_id: Uuid::new_v4(),
    }
}

impl TestApp {
    pub fn token(&self, role: Role) -> String {
        self.jwt
            .generate_access_token(Uuid::new_v4(), self.company_id, role)
            .unwrap()
    }

    pub fn token_for(&self, company_id: Uuid, role: Role) -> String {
        self.jwt
            .generate_access_token(Uuid::new_v4(), company_id, role)
            .unwrap()
    }

    /// Sends a request and returns the status and the JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }
}

/// Reads a decimal that was serialized either as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}
