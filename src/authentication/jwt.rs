use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use potion::HtmlError;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::schema::{PlanTier, UserId};

use super::permissions::ActionType;

fn default_plan() -> PlanTier {
    PlanTier::Free
}

/// Claims carried by a session token issued by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub sub: UserId,
    #[serde(default = "default_plan")]
    pub plan: PlanTier,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(user_id: &str, plan: PlanTier) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            sub: user_id.to_string(),
            plan,
            iat,
            exp,
        }
    }
}

/// The authenticated context every workflow call receives explicitly.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: UserId,
    pub plan: PlanTier,
    pub is_pro: bool,
}

impl SessionData {
    pub fn new(user_id: &str, plan: PlanTier) -> Self {
        let mut session = Self {
            user_id: user_id.to_string(),
            plan,
            is_pro: false,
        };
        session.is_pro = ActionType::ViewProDetails.authenticate(&session);
        session
    }

    pub fn authenticate(&self, action: ActionType) -> Result<(), potion::Error> {
        if !action.authenticate(self) {
            return Err(
                HtmlError::Unauthorized.new("You don't have permission to perform this action")
            );
        }
        Ok(())
    }
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData::new(&self.sub, self.plan)
    }
}

fn signing_key(secret: &[u8]) -> Result<Hmac<Sha256>, potion::Error> {
    Hmac::new_from_slice(secret)
        .map_err(|_| HtmlError::InternalServerError.new("Invalid session signing key"))
}

pub fn generate_jwt_session(
    user_id: &str,
    plan: PlanTier,
    secret: &[u8],
) -> Result<String, potion::Error> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user_id, plan);

    claims
        .sign_with_key(&key)
        .map_err(|_| HtmlError::InternalServerError.new("Failed to sign session"))
}

pub fn verify_jwt_session(token: &str, secret: &[u8]) -> Result<JwtSessionData, potion::Error> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| HtmlError::InvalidSession.new("Invalid Session; Invalid token"))?;

    let now = Utc::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(HtmlError::InvalidSession.new("Invalid session; Token expired"));
    }

    Ok(session)
}
