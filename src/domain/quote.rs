use serde::{Deserialize, Serialize};

use super::ingest::DEFAULT_IMPLIED_VOL;

/// Option contract side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Call,
    Put,
}

/// One listed contract, immutable once ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub side: OptionSide,
    pub open_interest: u64,
    pub volume: u64,
    /// Decimal implied volatility (0.30 = 30%)
    pub implied_vol: f64,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
}

impl OptionQuote {
    pub fn new(strike: f64, side: OptionSide, open_interest: u64, implied_vol: f64) -> Self {
        Self {
            strike,
            side,
            open_interest,
            volume: 0,
            implied_vol,
            bid: 0.0,
            ask: 0.0,
            last: 0.0,
        }
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_prices(mut self, bid: f64, ask: f64, last: f64) -> Self {
        self.bid = bid;
        self.ask = ask;
        self.last = last;
        self
    }

    /// Implied vol, substituting the ingestion default when absent
    pub fn iv_or_default(&self) -> f64 {
        if self.implied_vol > 0.0 {
            self.implied_vol
        } else {
            DEFAULT_IMPLIED_VOL
        }
    }

    /// Bid/ask midpoint, falling back to last trade when either side is missing
    pub fn mid_price(&self) -> f64 {
        if self.bid > 0.0 && self.ask > 0.0 {
            (self.bid + self.ask) / 2.0
        } else {
            self.last
        }
    }
}

/// All contracts for one (ticker, expiration)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsChain {
    pub spot: f64,
    pub dte: u32,
    pub expiration: Option<String>,
    pub calls: Vec<OptionQuote>,
    pub puts: Vec<OptionQuote>,
}

impl OptionsChain {
    pub fn new(spot: f64, dte: u32, calls: Vec<OptionQuote>, puts: Vec<OptionQuote>) -> Self {
        Self {
            spot,
            dte,
            expiration: None,
            calls,
            puts,
        }
    }

    pub fn with_expiration(mut self, expiration: impl Into<String>) -> Self {
        self.expiration = Some(expiration.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }

    /// Calls followed by puts
    pub fn quotes(&self) -> impl Iterator<Item = &OptionQuote> {
        self.calls.iter().chain(self.puts.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_price_prefers_quotes() {
        let q = OptionQuote::new(100.0, OptionSide::Call, 10, 0.3).with_prices(1.0, 1.2, 5.0);
        assert!((q.mid_price() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_mid_price_falls_back_to_last() {
        let q = OptionQuote::new(100.0, OptionSide::Put, 10, 0.3).with_prices(0.0, 1.2, 0.9);
        assert_eq!(q.mid_price(), 0.9);
    }

    #[test]
    fn test_chain_quotes_iterates_both_legs() {
        let chain = OptionsChain::new(
            100.0,
            7,
            vec![OptionQuote::new(100.0, OptionSide::Call, 1, 0.3)],
            vec![
                OptionQuote::new(95.0, OptionSide::Put, 1, 0.3),
                OptionQuote::new(90.0, OptionSide::Put, 1, 0.3),
            ],
        );
        assert_eq!(chain.quotes().count(), 3);
        assert!(!chain.is_empty());
    }
}
