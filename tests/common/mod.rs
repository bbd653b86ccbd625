#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use nevernote::configuration::JwtSettings;
use nevernote::startup::run;
use nevernote::store::InMemoryUserRepository;
use serde_json::{json, Value};

pub const COOKIE_NAME: &str = "test-jwt";
pub const PASSWORD: &str = "SecurePass123";

pub struct TestApp {
    pub address: String,
    pub users: Arc<InMemoryUserRepository>,
    pub jwt: JwtSettings,
}

pub fn test_jwt_settings() -> JwtSettings {
    JwtSettings {
        access_token_secret: "integration-access-secret-0123456789".to_string(),
        refresh_token_secret: "integration-refresh-secret-0123456789".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
        issuer: "nevernote-test".to_string(),
        cookie_name: COOKIE_NAME.to_string(),
        cookie_secure: false,
        bcrypt_cost: 4,
    }
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let users = Arc::new(InMemoryUserRepository::new());
    let jwt = test_jwt_settings();
    let server = run(listener, users.clone(), jwt.clone(), Vec::new())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        users,
        jwt,
    }
}

impl TestApp {
    pub async fn post_signup(&self, email: &str, password: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/auth/signup", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login(&self, email: &str, password: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/auth/login", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Sign up and log in; returns (access token, refresh cookie value).
    pub async fn logged_in_user(&self, email: &str) -> (String, String) {
        let response = self.post_signup(email, PASSWORD).await;
        assert_eq!(201, response.status().as_u16());

        let response = self.post_login(email, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());

        let refresh = response
            .cookies()
            .find(|c| c.name() == COOKIE_NAME)
            .map(|c| c.value().to_string())
            .expect("Login did not set the refresh cookie");
        let body: Value = response.json().await.expect("Failed to parse response");
        let access = body["access_token"]
            .as_str()
            .expect("No access token in response")
            .to_string();

        (access, refresh)
    }

    /// POST /refresh-token with the given cookie value, or none.
    pub async fn post_refresh(&self, refresh_cookie: Option<&str>) -> reqwest::Response {
        let mut request = reqwest::Client::new().post(&format!("{}/refresh-token", &self.address));
        if let Some(value) = refresh_cookie {
            request = request.header(
                reqwest::header::COOKIE,
                format!("{}={}", COOKIE_NAME, value),
            );
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn get_me(&self, access_token: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(&format!("{}/api/me", &self.address))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_revoke(&self, access_token: &str, user_id: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/auth/revoke", &self.address))
            .bearer_auth(access_token)
            .json(&json!({ "user_id": user_id }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
