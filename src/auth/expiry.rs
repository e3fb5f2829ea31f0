use chrono::{DateTime, Duration, Utc};

/// Smallest safety margin applied before a token's expiry, in seconds
pub const MIN_EXPIRY_BUFFER_SECS: i64 = 5;
/// Largest safety margin applied before a token's expiry, in seconds
pub const MAX_EXPIRY_BUFFER_SECS: i64 = 30;

/// Margin subtracted from an expiry: 10% of the remaining lifetime, clamped to 5..=30s.
pub fn expiry_buffer(remaining: Duration) -> Duration {
    let tenth = Duration::milliseconds(remaining.num_milliseconds() / 10);
    tenth.clamp(
        Duration::seconds(MIN_EXPIRY_BUFFER_SECS),
        Duration::seconds(MAX_EXPIRY_BUFFER_SECS),
    )
}

/// Checks whether a token is no longer usable. A missing expiry counts as expired.
pub fn is_expired(expires_at: Option<DateTime<Utc>>) -> bool {
    is_expired_at(expires_at, Utc::now())
}

pub fn is_expired_at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    let Some(expires_at) = expires_at else {
        tracing::debug!("No expiry recorded, considering expired");
        return true;
    };

    let buffer = expiry_buffer(expires_at - now);
    let expired = now >= expires_at - buffer;
    tracing::debug!(
        "Token expiration check: now={}, expires_at={}, buffer={}s, expired={}",
        now,
        expires_at,
        buffer.num_seconds(),
        expired
    );
    expired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_floor() {
        assert_eq!(expiry_buffer(Duration::seconds(10)), Duration::seconds(5));
        assert_eq!(expiry_buffer(Duration::seconds(-100)), Duration::seconds(5));
    }

    #[test]
    fn test_buffer_cap() {
        assert_eq!(expiry_buffer(Duration::seconds(1000)), Duration::seconds(30));
    }

    #[test]
    fn test_buffer_proportional() {
        assert_eq!(expiry_buffer(Duration::seconds(100)), Duration::seconds(10));
        assert_eq!(expiry_buffer(Duration::seconds(200)), Duration::seconds(20));
    }

    #[test]
    fn test_absent_is_expired() {
        assert!(is_expired(None));
    }

    #[test]
    fn test_past_is_expired() {
        let now = Utc::now();
        for secs in [1, 60, 3600, 86400 * 30] {
            assert!(is_expired_at(Some(now - Duration::seconds(secs)), now));
        }
        assert!(is_expired_at(Some(now), now));
    }

    #[test]
    fn test_far_future_is_not_expired() {
        let now = Utc::now();
        for secs in [60, 3600, 86400] {
            assert!(!is_expired_at(Some(now + Duration::seconds(secs)), now));
        }
    }

    #[test]
    fn test_inside_buffer_is_expired() {
        let now = Utc::now();
        // 100s left -> 10s buffer
        let expires_at = now + Duration::seconds(100);
        assert!(!is_expired_at(Some(expires_at), now));
        assert!(is_expired_at(Some(expires_at), expires_at - Duration::seconds(5)));
        // 8s left -> 5s floor still leaves 3s of validity
        assert!(!is_expired_at(Some(now + Duration::seconds(8)), now));
        // 4s left is inside the floor
        assert!(is_expired_at(Some(now + Duration::seconds(4)), now));
    }
}
