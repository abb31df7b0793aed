//! Analytics DTOs for `GET /ads/analytics`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the analytics endpoint.
///
/// `ad_id` stays a raw string so an unparseable value can surface as a
/// 400 instead of a silent deserialization failure.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AnalyticsParams {
    /// Restrict the report to a single ad.
    #[serde(default)]
    pub ad_id: Option<String>,
    /// One of `1h`, `24h`, `7d`, `all`. Unknown values behave as `24h`.
    #[serde(default)]
    pub timeframe: Option<String>,
}

/// Aggregate click counts for one ad.
///
/// `click_count` covers the requested window; `last_hour` and `last_day`
/// are fixed rolling windows regardless of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdAnalytics {
    pub ad_id: i64,
    pub click_count: i64,
    pub last_hour: i64,
    pub last_day: i64,
}

/// Reporting window selected by the `timeframe` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    All,
}

impl Timeframe {
    /// Parses a timeframe string. Unknown values map to [`Timeframe::Day`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "1h" => Self::Hour,
            "7d" => Self::Week,
            "all" => Self::All,
            _ => Self::Day,
        }
    }

    /// Window length. `All` spans ten years.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::hours(24),
            Self::Week => Duration::days(7),
            Self::All => Duration::days(10 * 365),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn known_timeframes_parse() {
        assert_eq!(Timeframe::parse("1h"), Timeframe::Hour);
        assert_eq!(Timeframe::parse("24h"), Timeframe::Day);
        assert_eq!(Timeframe::parse("7d"), Timeframe::Week);
        assert_eq!(Timeframe::parse("all"), Timeframe::All);
    }

    #[test]
    fn unknown_timeframe_behaves_as_24h() {
        assert_eq!(Timeframe::parse("30m"), Timeframe::Day);
        assert_eq!(Timeframe::parse(""), Timeframe::Day);
        assert_eq!(Timeframe::parse("1H"), Timeframe::Day);
    }

    #[test]
    fn durations_match_windows() {
        assert_eq!(Timeframe::Hour.duration(), Duration::hours(1));
        assert_eq!(Timeframe::Day.duration(), Duration::hours(24));
        assert_eq!(Timeframe::Week.duration(), Duration::days(7));
        assert_eq!(Timeframe::All.duration(), Duration::days(3650));
    }

    #[test]
    fn analytics_response_shape() {
        let analytics = AdAnalytics {
            ad_id: 1,
            click_count: 10,
            last_hour: 2,
            last_day: 7,
        };
        let Ok(value) = serde_json::to_value(&analytics) else {
            panic!("serialization failed");
        };
        assert_eq!(
            value,
            serde_json::json!({"ad_id": 1, "click_count": 10, "last_hour": 2, "last_day": 7})
        );
    }
}
