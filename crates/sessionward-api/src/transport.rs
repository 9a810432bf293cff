//! Token transport between client and server.
//!
//! Tokens travel either as `sAccessToken` / `sRefreshToken` cookies or as
//! `Authorization: Bearer` on requests and `st-*` headers on responses.
//! Every issued access token is mirrored in a `front-token` header the
//! client can read without touching the token itself.

use axum::http::header::{AUTHORIZATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sessionward_auth::recipe::{
    ACCESS_TOKEN_HEADER, ANTI_CSRF_HEADER, AUTH_MODE_HEADER, FRONT_TOKEN_HEADER,
    REFRESH_TOKEN_HEADER, RID_HEADER,
};
use sessionward_auth::{AccessToken, IssuedSession};
use sessionward_core::config::{SameSitePolicy, SessionConfig, TokenTransferMethod};
use sessionward_core::error::AppError;
use sessionward_core::types::{Payload, UserId};

/// Cookie holding the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "sAccessToken";
/// Cookie holding the refresh token, scoped to the refresh path.
pub const REFRESH_TOKEN_COOKIE: &str = "sRefreshToken";
/// `front-token` value telling the client its tokens are gone.
pub const FRONT_TOKEN_REMOVE: &str = "remove";

/// Where the tokens of one request/response pair travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Cookies.
    Cookie,
    /// `Authorization` / `st-*` headers.
    Header,
}

/// Client-readable summary of the current access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontToken {
    /// User id.
    pub uid: String,
    /// Access-token expiry, epoch milliseconds.
    pub ate: i64,
    /// JWT payload.
    pub up: Payload,
}

impl FrontToken {
    /// Base64 of the JSON form.
    pub fn encode(&self) -> Result<String, AppError> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }

    /// Parses a `front-token` header value.
    pub fn decode(value: &str) -> Result<Self, AppError> {
        let raw = STANDARD
            .decode(value)
            .map_err(|e| AppError::bad_input(format!("front-token is not base64: {e}")))?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// Reads and writes session tokens for one request.
#[derive(Debug, Clone, Copy)]
pub struct TokenTransport<'a> {
    config: &'a SessionConfig,
    mode: TransportMode,
    now: DateTime<Utc>,
}

impl<'a> TokenTransport<'a> {
    /// Picks the transport for a request. With `any`, `st-auth-mode: header`
    /// selects headers and everything else selects cookies. Cookie lifetimes
    /// are measured from `now`.
    pub fn for_request(config: &'a SessionConfig, now: DateTime<Utc>, headers: &HeaderMap) -> Self {
        let mode = match config.token_transfer_method {
            TokenTransferMethod::Cookie => TransportMode::Cookie,
            TokenTransferMethod::Header => TransportMode::Header,
            TokenTransferMethod::Any => match header_str(headers, AUTH_MODE_HEADER) {
                Some(value) if value.eq_ignore_ascii_case("header") => TransportMode::Header,
                _ => TransportMode::Cookie,
            },
        };
        Self { config, mode, now }
    }

    /// The selected mode.
    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// The access token the client presented.
    pub fn access_token(&self, headers: &HeaderMap) -> Option<String> {
        self.read(headers, ACCESS_TOKEN_COOKIE)
    }

    /// The refresh token the client presented.
    pub fn refresh_token(&self, headers: &HeaderMap) -> Option<String> {
        self.read(headers, REFRESH_TOKEN_COOKIE)
    }

    fn read(&self, headers: &HeaderMap, cookie_name: &str) -> Option<String> {
        let from_cookie = || {
            CookieJar::from_headers(headers)
                .get(cookie_name)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty())
        };
        let from_header = || bearer_token(headers);

        match (self.config.token_transfer_method, self.mode) {
            (TokenTransferMethod::Cookie, _) => from_cookie(),
            (TokenTransferMethod::Header, _) => from_header(),
            (TokenTransferMethod::Any, TransportMode::Header) => from_header().or_else(from_cookie),
            (TokenTransferMethod::Any, TransportMode::Cookie) => from_cookie().or_else(from_header),
        }
    }

    /// Attaches an access token and its front-token.
    pub fn attach_access_token(
        &self,
        headers: &mut HeaderMap,
        token: &AccessToken,
        user_id: &UserId,
        expiry: DateTime<Utc>,
        payload: &Payload,
    ) -> Result<(), AppError> {
        match self.mode {
            TransportMode::Cookie => {
                let cookie = self.cookie(
                    ACCESS_TOKEN_COOKIE,
                    token.as_str().to_string(),
                    "/".to_string(),
                    self.seconds_until(expiry),
                );
                append_cookie(headers, cookie)?;
            }
            TransportMode::Header => set_header(headers, ACCESS_TOKEN_HEADER, token.as_str())?,
        }

        let front = FrontToken {
            uid: user_id.as_str().to_string(),
            ate: expiry.timestamp_millis(),
            up: payload.clone(),
        };
        set_header(headers, FRONT_TOKEN_HEADER, &front.encode()?)
    }

    /// Attaches a full token pair, plus the anti-CSRF value when there is one.
    pub fn attach_issued(&self, headers: &mut HeaderMap, issued: &IssuedSession) -> Result<(), AppError> {
        self.attach_access_token(
            headers,
            &issued.access_token,
            &issued.user_id,
            issued.access_token_expiry,
            &issued.user_data_in_jwt,
        )?;

        match self.mode {
            TransportMode::Cookie => {
                let cookie = self.cookie(
                    REFRESH_TOKEN_COOKIE,
                    issued.refresh_token.as_str().to_string(),
                    self.config.full_refresh_path(),
                    self.seconds_until(issued.refresh_token_expiry),
                );
                append_cookie(headers, cookie)?;
            }
            TransportMode::Header => {
                set_header(headers, REFRESH_TOKEN_HEADER, issued.refresh_token.as_str())?
            }
        }

        if let Some(token) = &issued.anti_csrf_token {
            set_header(headers, ANTI_CSRF_HEADER, token)?;
        }
        Ok(())
    }

    /// Tells the client to drop both tokens.
    pub fn clear(&self, headers: &mut HeaderMap) -> Result<(), AppError> {
        match self.mode {
            TransportMode::Cookie => {
                let access = self.cookie(ACCESS_TOKEN_COOKIE, String::new(), "/".to_string(), 0);
                let refresh = self.cookie(
                    REFRESH_TOKEN_COOKIE,
                    String::new(),
                    self.config.full_refresh_path(),
                    0,
                );
                append_cookie(headers, access)?;
                append_cookie(headers, refresh)?;
            }
            TransportMode::Header => {
                set_header(headers, ACCESS_TOKEN_HEADER, "")?;
                set_header(headers, REFRESH_TOKEN_HEADER, "")?;
            }
        }
        set_header(headers, FRONT_TOKEN_HEADER, FRONT_TOKEN_REMOVE)
    }

    fn seconds_until(&self, expiry: DateTime<Utc>) -> i64 {
        (expiry - self.now).num_seconds().max(0)
    }

    fn cookie(&self, name: &'static str, value: String, path: String, max_age: i64) -> Cookie<'static> {
        let mut builder = Cookie::build((name, value))
            .path(path)
            .http_only(true)
            .secure(self.config.cookie.secure)
            .same_site(same_site(self.config.cookie.same_site))
            .max_age(time::Duration::seconds(max_age));
        if let Some(domain) = &self.config.cookie.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }
}

/// The `anti-csrf` request header.
pub fn anti_csrf_token(headers: &HeaderMap) -> Option<String> {
    header_str(headers, ANTI_CSRF_HEADER).map(str::to_string)
}

/// Whether the `rid` request header is present.
pub fn has_rid(headers: &HeaderMap) -> bool {
    headers.contains_key(RID_HEADER)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| AppError::internal(format!("Invalid {name} header value: {e}")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'static>) -> Result<(), AppError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::internal(format!("Invalid cookie {}: {e}", cookie.name())))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}

fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    }
}
