use std::sync::Arc;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::constants::SESSION_COOKIE;

use super::jwt::{verify_jwt_session, SessionData};

#[derive(Debug)]
pub struct Unauthorized;

impl reject::Reject for Unauthorized {}

fn bearer_token(header: Option<String>) -> Option<String> {
    header.and_then(|value| {
        value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
    })
}

/// Resolves the session from the `session` cookie,
/// falling back to an `Authorization: Bearer` header.
pub fn with_session(
    secret: Arc<String>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .and_then(move |cookie: Option<String>, header: Option<String>| {
            let secret = secret.clone();
            async move {
                let token = cookie.or_else(|| bearer_token(header));
                match token.map(|token| verify_jwt_session(&token, secret.as_bytes())) {
                    Some(Ok(data)) => Ok(data.into()),
                    Some(Err(e)) => {
                        log::debug!("Rejected session: {:?}", e.info);
                        Err(reject::custom(Unauthorized))
                    }
                    None => Err(reject::custom(Unauthorized)),
                }
            }
        })
}
