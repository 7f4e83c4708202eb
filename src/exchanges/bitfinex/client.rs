//! Typed entry point for every supported endpoint.
//!
//! Each method is a thin wrapper over [`BitfinexClient::call`]; the endpoint's
//! parameter struct owns validation, request shape and decoding.

use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::exchanges::bitfinex::conf::ConfigValues;
use crate::exchanges::bitfinex::endpoint::{execute, Endpoint};
use crate::exchanges::bitfinex::params::*;
use crate::exchanges::bitfinex::types::*;
use std::sync::Arc;
use tracing::instrument;

/// Bitfinex v2 REST client
#[derive(Debug)]
pub struct BitfinexClient<R: RestClient> {
    rest: Arc<R>,
    affiliate_code: Option<String>,
}

impl<R: RestClient> Clone for BitfinexClient<R> {
    fn clone(&self) -> Self {
        Self {
            rest: Arc::clone(&self.rest),
            affiliate_code: self.affiliate_code.clone(),
        }
    }
}

impl<R: RestClient> BitfinexClient<R> {
    pub fn new(rest: R) -> Self {
        Self {
            rest: Arc::new(rest),
            affiliate_code: None,
        }
    }

    /// Attach an affiliate code to every submitted order
    #[must_use]
    pub fn with_affiliate_code(mut self, code: impl Into<String>) -> Self {
        self.affiliate_code = Some(code.into());
        self
    }

    pub fn rest(&self) -> &R {
        &self.rest
    }

    pub fn affiliate_code(&self) -> Option<&str> {
        self.affiliate_code.as_deref()
    }

    /// Run any endpoint
    pub async fn call<E: Endpoint>(&self, endpoint: &E) -> Result<E::Output, ExchangeError> {
        execute(self.rest.as_ref(), endpoint).await
    }

    // Public market data

    #[instrument(skip(self))]
    pub async fn platform_status(&self) -> Result<PlatformStatus, ExchangeError> {
        self.call(&PlatformStatusRequest).await
    }

    /// `None` when upstream has no ticker for the symbol
    #[instrument(skip(self))]
    pub async fn ticker(&self, params: &TickerParams) -> Result<Option<Ticker>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn tickers(&self, params: &TickersParams) -> Result<Vec<Ticker>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn tickers_history(
        &self,
        params: &TickersHistoryParams,
    ) -> Result<Vec<TickerHistory>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn trades(&self, params: &TradesParams) -> Result<Vec<PublicTrade>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn book(&self, params: &BookParams) -> Result<Vec<BookEntry>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn candles(&self, params: &CandlesParams) -> Result<Vec<Candle>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, params: &StatsParams) -> Result<Vec<StatValue>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn derivative_status(
        &self,
        params: &DerivativeStatusParams,
    ) -> Result<Vec<DerivativeStatus>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn liquidations(
        &self,
        params: &LiquidationsParams,
    ) -> Result<Vec<Liquidation>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn leaderboard(
        &self,
        params: &LeaderboardParams,
    ) -> Result<Vec<LeaderboardEntry>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn funding_stats(
        &self,
        params: &FundingStatsParams,
    ) -> Result<Vec<FundingStat>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn average_price(
        &self,
        params: &AveragePriceParams,
    ) -> Result<AveragePrice, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn fx_rate(&self, params: &FxRateParams) -> Result<FxRate, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn config(&self, params: &ConfigParams) -> Result<ConfigValues, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn geo_ip(&self, params: &GeoIpParams) -> Result<GeoIp, ExchangeError> {
        self.call(params).await
    }

    // Account

    #[instrument(skip(self))]
    pub async fn wallets(&self) -> Result<Vec<Wallet>, ExchangeError> {
        self.call(&WalletsRequest).await
    }

    #[instrument(skip(self))]
    pub async fn user_info(&self) -> Result<UserInfo, ExchangeError> {
        self.call(&UserInfoRequest).await
    }

    #[instrument(skip(self))]
    pub async fn key_permissions(&self) -> Result<KeyPermissions, ExchangeError> {
        self.call(&KeyPermissionsRequest).await
    }

    #[instrument(skip(self))]
    pub async fn ledgers(&self, params: &LedgersParams) -> Result<Vec<LedgerEntry>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn movements(&self, params: &MovementsParams) -> Result<Vec<Movement>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn margin_info(&self, params: &MarginInfoParams) -> Result<MarginInfo, ExchangeError> {
        self.call(params).await
    }

    // Trading

    #[instrument(skip(self))]
    pub async fn orders(&self, params: &OrdersParams) -> Result<Vec<Order>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn positions(&self) -> Result<Vec<Position>, ExchangeError> {
        self.call(&PositionsRequest).await
    }

    #[instrument(skip(self))]
    pub async fn user_trades(
        &self,
        params: &UserTradesParams,
    ) -> Result<Vec<UserTrade>, ExchangeError> {
        self.call(params).await
    }

    /// Submit an order, tagging it with the configured affiliate code
    #[instrument(skip(self))]
    pub async fn submit_order(
        &self,
        params: &SubmitOrderParams,
    ) -> Result<Notification<Vec<Order>>, ExchangeError> {
        match &self.affiliate_code {
            Some(code) => self.call(&params.clone().with_affiliate_code(code)).await,
            None => self.call(params).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        params: &CancelOrderParams,
    ) -> Result<Notification<Order>, ExchangeError> {
        self.call(params).await
    }

    // Funding

    #[instrument(skip(self))]
    pub async fn funding_offers(
        &self,
        params: &FundingOffersParams,
    ) -> Result<Vec<FundingOffer>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn funding_loans(
        &self,
        params: &FundingLoansParams,
    ) -> Result<Vec<FundingLoan>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn funding_credits(
        &self,
        params: &FundingCreditsParams,
    ) -> Result<Vec<FundingCredit>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn funding_trades(
        &self,
        params: &FundingTradesParams,
    ) -> Result<Vec<AccountFundingTrade>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn funding_info(&self, params: &FundingInfoParams) -> Result<FundingInfo, ExchangeError> {
        self.call(params).await
    }

    /// `None` when auto-renew is off
    #[instrument(skip(self))]
    pub async fn auto_renew_status(
        &self,
        params: &AutoRenewStatusParams,
    ) -> Result<Option<AutoRenewStatus>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn set_auto_renew(
        &self,
        params: &SetAutoRenewParams,
    ) -> Result<Notification<AutoRenewStatus>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn submit_funding_offer(
        &self,
        params: &SubmitFundingOfferParams,
    ) -> Result<Notification<FundingOffer>, ExchangeError> {
        self.call(params).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_funding_offer(
        &self,
        params: &CancelFundingOfferParams,
    ) -> Result<Notification<FundingOffer>, ExchangeError> {
        self.call(params).await
    }
}
