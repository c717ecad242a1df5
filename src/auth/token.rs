//! The session token stored in the auth cookie.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::auth::UserID;

mod expiry_format {
    //! Serializes the token expiry with a fixed-width format.
    //!
    //! The default format prints midnight with a single digit hour, which the
    //! default parser then rejects.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// For example "2021-01-01 00:00:00.0 +00:00:00".
    const EXPIRY_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(expiry: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = expiry
            .format(EXPIRY_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&raw, EXPIRY_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Identifies a logged in user until `expires_at`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    #[serde(with = "expiry_format")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// A token for `user_id` that expires `duration` after `now`.
    pub fn new(user_id: UserID, now: OffsetDateTime, duration: Duration) -> Self {
        Self {
            user_id,
            expires_at: now + duration,
        }
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, UtcOffset, macros::datetime};

    use crate::auth::UserID;

    use super::Token;

    #[test]
    fn serializes_to_json() {
        let token = Token {
            user_id: UserID::new(1),
            expires_at: datetime!(2025-12-21 03:54:00).assume_offset(UtcOffset::UTC),
        };

        let json = serde_json::to_string(&token).unwrap();

        assert_eq!(
            json,
            r#"{"user_id":1,"expires_at":"2025-12-21 03:54:00.0 +00:00:00"}"#
        );
    }

    #[test]
    fn deserializes_midnight_expiry() {
        let json = r#"{"user_id":3,"expires_at":"2025-12-21 00:00:00.0 +13:00:00"}"#;

        let token: Token = serde_json::from_str(json).unwrap();

        assert_eq!(
            token,
            Token {
                user_id: UserID::new(3),
                expires_at: datetime!(2025-12-21 00:00:00 +13:00),
            }
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Token>("FOOBAR").is_err());
    }

    #[test]
    fn expires_after_duration() {
        let now = datetime!(2025-01-01 12:00:00 UTC);
        let token = Token::new(UserID::new(1), now, Duration::minutes(5));

        assert!(!token.is_expired(now));
        assert!(!token.is_expired(now + Duration::minutes(4)));
        assert!(token.is_expired(now + Duration::minutes(5)));
    }
}
