//! Resolves the acting user for each request from the session cookie.
//!
//! There is no log in flow: the session cookie, when present, carries a
//! numeric user ID, and requests without a readable cookie act as the
//! default user. Handlers receive the resolved user through the
//! [UserContext] extractor instead of reading any shared state.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};

use crate::database_id::DatabaseId;

/// Alias for the integer type used for user IDs.
pub type UserId = DatabaseId;

/// The user every request acts as when no session cookie is present.
pub const DEFAULT_USER_ID: UserId = 1;

/// The name of the private cookie holding the session user ID.
pub const USER_COOKIE: &str = "walletfolio_user";

/// The per-request context identifying the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
    /// The ID of the user this request acts as.
    pub user_id: UserId,
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar<Key> = match PrivateCookieJar::from_request_parts(parts, state)
            .await
        {
            Ok(jar) => jar,
            Err(infallible) => match infallible {},
        };

        let user_id = jar
            .get(USER_COOKIE)
            .and_then(|cookie| cookie.value().parse().ok())
            .unwrap_or(DEFAULT_USER_ID);

        Ok(UserContext { user_id })
    }
}

#[cfg(test)]
mod user_context_tests {
    use axum::{
        extract::{FromRef, FromRequestParts},
        http::{Request, header::SET_COOKIE},
        response::IntoResponse,
    };
    use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar};

    use super::{DEFAULT_USER_ID, USER_COOKIE, UserContext};

    #[derive(Clone)]
    struct TestState {
        key: Key,
    }

    impl FromRef<TestState> for Key {
        fn from_ref(state: &TestState) -> Self {
            state.key.clone()
        }
    }

    fn test_state() -> TestState {
        TestState {
            key: Key::from(&[0u8; 64]),
        }
    }

    #[tokio::test]
    async fn defaults_to_test_user_without_cookie() {
        let state = test_state();
        let (mut parts, _) = Request::new(()).into_parts();

        let context = UserContext::from_request_parts(&mut parts, &state)
            .await
            .unwrap();

        assert_eq!(context.user_id, DEFAULT_USER_ID);
    }

    #[tokio::test]
    async fn reads_user_id_from_private_cookie() {
        let state = test_state();

        // Round-trip the cookie through the jar's response headers so the
        // request carries a properly encrypted value.
        let jar = PrivateCookieJar::new(state.key.clone()).add(Cookie::new(USER_COOKIE, "42"));
        let response = jar.into_response();
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .expect("expected a set-cookie header")
            .to_str()
            .unwrap();
        let cookie_pair = set_cookie.split(';').next().unwrap().to_owned();

        let request = Request::builder()
            .header("cookie", cookie_pair)
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let context = UserContext::from_request_parts(&mut parts, &state)
            .await
            .unwrap();

        assert_eq!(context.user_id, 42);
    }

    #[tokio::test]
    async fn falls_back_on_unreadable_cookie() {
        let state = test_state();

        // A plain (unsigned) cookie cannot be decrypted by the private jar.
        let request = Request::builder()
            .header("cookie", format!("{USER_COOKIE}=not-signed"))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let context = UserContext::from_request_parts(&mut parts, &state)
            .await
            .unwrap();

        assert_eq!(context.user_id, DEFAULT_USER_ID);
    }
}
