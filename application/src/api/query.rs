//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `TradeInPrice` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PRICE_NOT_EXISTS` - the `TradeInPrice` with the specified ID does
    ///                        not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "tradeInPrice",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn trade_in_price(
        id: api::price::Id,
        ctx: &Context,
    ) -> Result<api::Price, Error> {
        ctx.service()
            .execute(query::price::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| PriceError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `TradeInPrice` of the specified device, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            device.model = %device_model,
            device.name = %device_name,
            gql.name = "tradeInPriceOfDevice",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn trade_in_price_of_device(
        device_name: api::device::Name,
        device_model: api::device::Model,
        ctx: &Context,
    ) -> Result<Option<api::Price>, Error> {
        ctx.service()
            .execute(query::price::ByDevice::by(api::device::of(
                device_name,
                device_model,
            )))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|p| p.map(Into::into))
    }

    /// Lists `TradeInPrice`s ordered by device name and model.
    ///
    /// `search` matches any of its words against device names and models
    /// case-insensitively.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "tradeInPrices",
            is_active = ?is_active,
            otel.name = Self::SPAN_NAME,
            search = ?search,
        ),
    )]
    pub async fn trade_in_prices(
        is_active: Option<bool>,
        search: Option<String>,
        ctx: &Context,
    ) -> Result<Vec<api::Price>, Error> {
        ctx.service()
            .execute(query::prices::List::by(read::price::list::Filter {
                is_active,
                search: search.and_then(read::Search::new),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ps| ps.into_iter().map(Into::into).collect())
    }

    /// Values an inspected device against its `TradeInPrice`.
    ///
    /// Nothing is stored: the returned `TradeInQuote` is a proposal to the
    /// customer.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MISSING_PRICE` - neither `basePriceOverride` nor an active
    ///                     `TradeInPrice` of the device is provided;
    /// - `INVALID_CONDITION` - `condition` is not a known rating;
    /// - `INVALID_DEDUCTION` - a deduction has a negative amount;
    /// - `CURRENCY_MISMATCH` - amounts are in different currencies;
    /// - `NEGATIVE_BASE_PRICE` - `basePriceOverride` is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            condition = %inspection.condition,
            device.model = %inspection.device_model,
            device.name = %inspection.device_name,
            gql.name = "quoteTradeIn",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn quote_trade_in(
        inspection: api::quote::InspectionInput,
        ctx: &Context,
    ) -> Result<api::Quote, Error> {
        ctx.service()
            .execute(query::QuoteTradeIn::from(inspection))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `TradeInTransaction` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRANSACTION_NOT_EXISTS` - the `TradeInTransaction` with the
    ///                              specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "tradeInTransaction",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn trade_in_transaction(
        id: api::transaction::Id,
        ctx: &Context,
    ) -> Result<api::Transaction, Error> {
        ctx.service()
            .execute(query::transaction::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| TransactionError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `TradeInTransaction` with the specified number.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRANSACTION_NOT_EXISTS` - the `TradeInTransaction` with the
    ///                              specified number does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "tradeInTransactionByNumber",
            number = %number,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn trade_in_transaction_by_number(
        number: api::transaction::Number,
        ctx: &Context,
    ) -> Result<api::Transaction, Error> {
        ctx.service()
            .execute(query::transaction::ByNumber::by(number.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| TransactionError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists `TradeInTransaction`s, the most recent first.
    #[tracing::instrument(
        skip_all,
        fields(
            condition = ?condition,
            customer_id = ?customer_id,
            gql.name = "tradeInTransactions",
            needs_repair = ?needs_repair,
            otel.name = Self::SPAN_NAME,
            ready_for_resale = ?ready_for_resale,
            search = ?search,
            status = ?status,
        ),
    )]
    pub async fn trade_in_transactions(
        status: Option<api::transaction::Status>,
        condition: Option<api::device::Condition>,
        customer_id: Option<api::transaction::CustomerId>,
        needs_repair: Option<bool>,
        ready_for_resale: Option<bool>,
        search: Option<String>,
        ctx: &Context,
    ) -> Result<Vec<api::Transaction>, Error> {
        ctx.service()
            .execute(query::transactions::List::by(transactions_filter(
                status,
                condition,
                customer_id,
                needs_repair,
                ready_for_resale,
                search,
            )))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ts| ts.into_iter().map(Into::into).collect())
    }

    /// Summarizes the `TradeInTransaction`s history.
    ///
    /// Cancelled `TradeInTransaction`s are counted, but not valued.
    #[tracing::instrument(
        skip_all,
        fields(
            condition = ?condition,
            customer_id = ?customer_id,
            gql.name = "tradeInSummary",
            needs_repair = ?needs_repair,
            otel.name = Self::SPAN_NAME,
            ready_for_resale = ?ready_for_resale,
            search = ?search,
            status = ?status,
        ),
    )]
    pub async fn trade_in_summary(
        status: Option<api::transaction::Status>,
        condition: Option<api::device::Condition>,
        customer_id: Option<api::transaction::CustomerId>,
        needs_repair: Option<bool>,
        ready_for_resale: Option<bool>,
        search: Option<String>,
        ctx: &Context,
    ) -> Result<api::transaction::Summary, Error> {
        ctx.service()
            .execute(query::transactions::Summary {
                filter: transactions_filter(
                    status,
                    condition,
                    customer_id,
                    needs_repair,
                    ready_for_resale,
                    search,
                ),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `TradeInTransaction` with the specified ID, if its
    /// `TradeInContract` is signed.
    ///
    /// Signed `TradeInTransaction`s are ready to be handed over to sale and
    /// inventory.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "signedTradeIn",
            otel.name = Self::SPAN_NAME,
            transaction.id = %transaction_id,
        ),
    )]
    pub async fn signed_trade_in(
        transaction_id: api::transaction::Id,
        ctx: &Context,
    ) -> Result<Option<api::Transaction>, Error> {
        ctx.service()
            .execute(query::transaction::Signed {
                transaction_id: transaction_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|signed| {
                signed.map(|s| {
                    api::Transaction::with_contract(s.transaction, s.contract)
                })
            })
    }
}

/// Builds a [`read::transaction::list::Filter`] out of GraphQL arguments.
fn transactions_filter(
    status: Option<api::transaction::Status>,
    condition: Option<api::device::Condition>,
    customer_id: Option<api::transaction::CustomerId>,
    needs_repair: Option<bool>,
    ready_for_resale: Option<bool>,
    search: Option<String>,
) -> read::transaction::list::Filter {
    read::transaction::list::Filter {
        status: status.map(Into::into),
        condition: condition.map(Into::into),
        customer_id: customer_id.map(Into::into),
        needs_repair,
        ready_for_resale,
        search: search.and_then(read::Search::new),
    }
}

impl AsError for query::quote::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Validation(e) => e.try_as_error(),
        }
    }
}

define_error! {
    enum PriceError {
        #[code = "PRICE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`TradeInPrice` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum TransactionError {
        #[code = "TRANSACTION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`TradeInTransaction` with the specified ID does not \
                     exist"]
        NotExists,
    }
}
