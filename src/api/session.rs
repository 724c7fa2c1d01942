//! Sign-in, sign-out and the current profile.

use reqwest::Method;
use tracing::{info, warn};
use url::Url;

use super::{AdminApi, ApiError};
use crate::auth::{
    ACCESS_COOKIE_NAME, ApiRequest, DEFAULT_COOKIE_DAYS, REFRESH_COOKIE_NAME, TokenStore, join_path,
};
use crate::state::Profile;

const LOGIN_PATH: &str = "/oauth2/authorize/google";
const LOGOUT_PATH: &str = "/auth/logout";

/// Query parameters the OAuth provider hands back after sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCallback {
    pub token: String,
    pub refresh_token: String,
    pub email: Option<String>,
}

impl LoginCallback {
    /// Read `token`, `refreshToken` and `email` from the redirect URL.
    pub fn parse(url: &Url) -> Result<Self, ApiError> {
        let mut token = None;
        let mut refresh_token = None;
        let mut email = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "token" if !value.is_empty() => token = Some(value.into_owned()),
                "refreshToken" if !value.is_empty() => refresh_token = Some(value.into_owned()),
                "email" if !value.is_empty() => email = Some(value.into_owned()),
                _ => {}
            }
        }

        match (token, refresh_token) {
            (Some(token), Some(refresh_token)) => Ok(Self {
                token,
                refresh_token,
                email,
            }),
            _ => Err(ApiError::MissingCallbackTokens),
        }
    }
}

/// Result of a completed sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub profile: Profile,
    pub email: Option<String>,
}

/// Login entry point below the auth base URL.
pub fn login_url(auth_url: &Url) -> Result<Url, url::ParseError> {
    join_path(auth_url, LOGIN_PATH)
}

impl AdminApi {
    pub fn login_url(&self) -> Result<Url, ApiError> {
        Ok(login_url(&self.auth_url)?)
    }

    /// GET `/profiles`
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.get_json(self.endpoint("/profiles")?).await
    }

    /// Store the callback's tokens, load the profile and check the admin allow-list.
    ///
    /// Any failure leaves no tokens behind.
    pub async fn complete_login(&self, callback: &LoginCallback) -> Result<LoginOutcome, ApiError> {
        let tokens = self.client.tokens();
        tokens.set(ACCESS_COOKIE_NAME, &callback.token, DEFAULT_COOKIE_DAYS);
        tokens.set(REFRESH_COOKIE_NAME, &callback.refresh_token, DEFAULT_COOKIE_DAYS);

        match self.finish_login(callback).await {
            Ok(outcome) => {
                info!(email = ?outcome.email, "Signed in");
                Ok(outcome)
            }
            Err(e) => {
                tokens.clear(ACCESS_COOKIE_NAME);
                tokens.clear(REFRESH_COOKIE_NAME);
                self.auth_store.sign_out();
                Err(e)
            }
        }
    }

    async fn finish_login(&self, callback: &LoginCallback) -> Result<LoginOutcome, ApiError> {
        let profile = self.profile().await?;
        self.auth_store.set_user(profile.clone());
        if let Some(email) = &callback.email {
            self.auth_store.set_user_email(email);
        }

        self.check_admin(callback.email.as_deref())?;

        Ok(LoginOutcome {
            profile,
            email: callback.email.clone(),
        })
    }

    fn check_admin(&self, email: Option<&str>) -> Result<(), ApiError> {
        if self.admin_emails.is_empty() {
            warn!("No admin allow-list configured, accepting any account");
            return Ok(());
        }

        match email {
            Some(email) if self.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(email)) => Ok(()),
            Some(email) => Err(ApiError::NotAdmin(email.to_string())),
            None => Err(ApiError::NotAdmin("<unknown>".to_string())),
        }
    }

    /// POST `{auth_url}/auth/logout`, then drop tokens and local user state.
    ///
    /// The server call is best effort and is never refreshed, so stale tokens
    /// cannot trigger the session-expired redirect. Local state is cleared
    /// either way.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let url = join_path(&self.auth_url, LOGOUT_PATH)?;
        match self.client.request_once(ApiRequest::new(Method::POST, url)).await {
            Ok(response) if !response.status().is_success() => {
                warn!(status = response.status().as_u16(), "Logout endpoint refused");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Logout request failed"),
        }

        let tokens = self.client.tokens();
        tokens.clear(ACCESS_COOKIE_NAME);
        tokens.clear(REFRESH_COOKIE_NAME);
        self.auth_store.sign_out();
        info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_parse() {
        let url = Url::parse("http://localhost/auth?token=tokA&refreshToken=refA&email=a%40b.com").unwrap();
        let callback = LoginCallback::parse(&url).unwrap();
        assert_eq!(callback.token, "tokA");
        assert_eq!(callback.refresh_token, "refA");
        assert_eq!(callback.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_callback_without_email() {
        let url = Url::parse("http://localhost/auth?token=tokA&refreshToken=refA").unwrap();
        assert_eq!(LoginCallback::parse(&url).unwrap().email, None);
    }

    #[test]
    fn test_callback_missing_tokens() {
        for query in ["token=tokA", "refreshToken=refA", "token=&refreshToken=refA", ""] {
            let url = Url::parse(&format!("http://localhost/auth?{}", query)).unwrap();
            assert!(matches!(
                LoginCallback::parse(&url),
                Err(ApiError::MissingCallbackTokens)
            ));
        }
    }

    #[test]
    fn test_login_url() {
        let base = Url::parse("http://localhost/api").unwrap();
        assert_eq!(
            login_url(&base).unwrap().as_str(),
            "http://localhost/api/oauth2/authorize/google"
        );
    }
}
