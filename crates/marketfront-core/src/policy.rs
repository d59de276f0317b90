//! Per-domain cache and retry policies.
//!
//! The numbers here are documented defaults, not contracts; every value is
//! overridable at construction time by whoever wires the services.

use std::time::Duration;

use crate::RetryConfig;

/// Tuning knobs one domain service applies to its cache and upstream.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    /// How long a cached value counts as fresh.
    pub cache_ttl: Duration,
    /// How long an expired value stays available for stale fallback before
    /// a sweep may drop it.
    pub stale_retention: Duration,
    pub retry: RetryConfig,
    /// Per-request upstream timeout.
    pub request_timeout: Duration,
}

impl DomainPolicy {
    /// Market quotes go stale in seconds.
    pub fn market_default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(15),
            stale_retention: Duration::from_secs(30 * 60),
            retry: RetryConfig::exponential(3),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Company fundamentals barely move intraday.
    pub fn company_default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(6 * 60 * 60),
            stale_retention: Duration::from_secs(24 * 60 * 60),
            retry: RetryConfig::exponential(3),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// News sentiment sits in between.
    pub fn sentiment_default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(10 * 60),
            stale_retention: Duration::from_secs(6 * 60 * 60),
            retry: RetryConfig::exponential(3),
            request_timeout: Duration::from_secs(8),
        }
    }

    /// Analysis reports are cached briefly; the persisted store carries the
    /// long-term copy (see [`AnalysisPolicy`]).
    pub fn analysis_default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30 * 60),
            stale_retention: Duration::from_secs(24 * 60 * 60),
            retry: RetryConfig::exponential(2),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Extra policy for the analysis domain's durable store.
#[derive(Debug, Clone)]
pub struct AnalysisPolicy {
    pub domain: DomainPolicy,
    /// A persisted record younger than this is served instead of
    /// recomputing.
    pub store_freshness: Duration,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            domain: DomainPolicy::analysis_default(),
            store_freshness: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Provider-side quota defaults for the bundled adapters.
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    pub window: Duration,
    pub limit: u32,
}

impl QuotaPolicy {
    /// Alpha Vantage free tier: 5 requests/minute.
    pub const fn alphavantage_default() -> Self {
        Self {
            window: Duration::from_secs(60),
            limit: 5,
        }
    }

    /// Finnhub free tier: 60 requests/minute.
    pub const fn finnhub_default() -> Self {
        Self {
            window: Duration::from_secs(60),
            limit: 60,
        }
    }

    /// NewsAPI developer tier, expressed per minute for burst smoothing.
    pub const fn newsapi_default() -> Self {
        Self {
            window: Duration::from_secs(60),
            limit: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_ttls_are_ordered_by_volatility() {
        let market = DomainPolicy::market_default();
        let sentiment = DomainPolicy::sentiment_default();
        let company = DomainPolicy::company_default();

        assert!(market.cache_ttl < sentiment.cache_ttl);
        assert!(sentiment.cache_ttl < company.cache_ttl);
    }

    #[test]
    fn stale_retention_outlives_freshness() {
        for policy in [
            DomainPolicy::market_default(),
            DomainPolicy::company_default(),
            DomainPolicy::sentiment_default(),
            DomainPolicy::analysis_default(),
        ] {
            assert!(policy.stale_retention > policy.cache_ttl);
        }
    }
}
