//! GraphQL [`Mutation`]s definitions.

use common::Money;
use juniper::{graphql_object, Nullable};
use service::{command, query, Command as _, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `TradeInPrice` of a device.
    ///
    /// Configured default `ConditionMultipliers` are used, if none provided.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEVICE_OCCUPIED` - the device already has a `TradeInPrice`;
    /// - `NEGATIVE_BASE_PRICE` - the provided `basePrice` is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            base_price = %base_price,
            device.model = %device_model,
            device.name = %device_name,
            gql.name = "createTradeInPrice",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_trade_in_price(
        device_name: api::device::Name,
        device_model: api::device::Model,
        base_price: Money,
        multipliers: Option<api::price::ConditionMultipliersInput>,
        notes: Option<api::price::Notes>,
        ctx: &Context,
    ) -> Result<api::Price, Error> {
        ctx.service()
            .execute(command::CreateTradeInPrice {
                device: api::device::of(device_name, device_model),
                base_price,
                multipliers: multipliers.map(Into::into),
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided fields of the `TradeInPrice`.
    ///
    /// Explicit `null` as `notes` removes them.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PRICE_NOT_EXISTS` - the `TradeInPrice` with the specified ID does
    ///                        not exist;
    /// - `INCOMPLETE_DEVICE` - only one of `deviceName` and `deviceModel` is
    ///                         provided;
    /// - `DEVICE_OCCUPIED` - the device already has another `TradeInPrice`;
    /// - `NEGATIVE_BASE_PRICE` - the provided `basePrice` is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            base_price = ?base_price.as_ref().map(ToString::to_string),
            device.model = ?device_model.as_ref().map(ToString::to_string),
            device.name = ?device_name.as_ref().map(ToString::to_string),
            gql.name = "updateTradeInPrice",
            id = %id,
            is_active = ?is_active,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn update_trade_in_price(
        id: api::price::Id,
        device_name: Option<api::device::Name>,
        device_model: Option<api::device::Model>,
        base_price: Option<Money>,
        multipliers: Option<api::price::ConditionMultipliersInput>,
        is_active: Option<bool>,
        notes: Nullable<api::price::Notes>,
        ctx: &Context,
    ) -> Result<api::Price, Error> {
        let device = match (device_name, device_model) {
            (Some(name), Some(model)) => Some(api::device::of(name, model)),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                let err = Error::from(PriceInputError::IncompleteDevice);
                return Err(ctx.error()(err));
            }
        };

        ctx.service()
            .execute(command::UpdateTradeInPrice {
                id: id.into(),
                device,
                base_price,
                multipliers: multipliers.map(Into::into),
                is_active,
                notes: notes.explicit().map(|n| n.map(Into::into)),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deactivates the `TradeInPrice`, so it's no longer used for valuation.
    ///
    /// Deactivating an inactive `TradeInPrice` does nothing.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PRICE_NOT_EXISTS` - the `TradeInPrice` with the specified ID does
    ///                        not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteTradeInPrice",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_trade_in_price(
        id: api::price::Id,
        ctx: &Context,
    ) -> Result<api::Price, Error> {
        ctx.service()
            .execute(command::DeleteTradeInPrice { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Values the inspected device and records the customer's acceptance of
    /// the resulting `TradeInQuote` as a new `TradeInTransaction`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `MISSING_PRICE` - neither `basePriceOverride` nor an active
    ///                     `TradeInPrice` of the device is provided;
    /// - `INVALID_CONDITION` - `condition` is not a known rating;
    /// - `INVALID_DEDUCTION` - a deduction has a negative amount;
    /// - `CURRENCY_MISMATCH` - amounts are in different currencies;
    /// - `NEGATIVE_BASE_PRICE` - `basePriceOverride` is negative;
    /// - `NEGATIVE_NEW_DEVICE_PRICE` - `newDevicePrice` is negative;
    /// - `NEGATIVE_RESALE_PRICE` - `resalePrice` is negative;
    /// - `AMOUNT_OVERFLOW` - amounts are out of the representable range;
    /// - `NUMBER_OCCUPIED` - generated `TradeInTransactionNumber` collided
    ///                       with an existing one, the request may be
    ///                       repeated.
    #[tracing::instrument(
        skip_all,
        fields(
            customer_id = %customer_id,
            device.model = %inspection.device_model,
            device.name = %inspection.device_name,
            gql.name = "createTradeInTransaction",
            needs_repair = ?needs_repair,
            new_device_price = %new_device_price,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_trade_in_transaction(
        customer_id: api::transaction::CustomerId,
        inspection: api::quote::InspectionInput,
        new_device_price: Money,
        serial_number: Option<api::device::SerialNumber>,
        needs_repair: Option<bool>,
        resale_price: Option<Money>,
        staff_notes: Option<api::transaction::StaffNotes>,
        ctx: &Context,
    ) -> Result<api::Transaction, Error> {
        let quote = ctx
            .service()
            .execute(query::QuoteTradeIn::from(inspection))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateTradeInTransaction {
                customer_id: customer_id.into(),
                quote,
                new_device_price,
                serial_number: serial_number.map(Into::into),
                needs_repair: needs_repair.unwrap_or_default(),
                resale_price,
                staff_notes: staff_notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Generates the `TradeInContract` of the `TradeInTransaction`.
    ///
    /// Returns the already generated `TradeInContract`, if any.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRANSACTION_NOT_EXISTS` - the `TradeInTransaction` with the
    ///                              specified ID does not exist;
    /// - `INVALID_TRANSITION` - the `TradeInTransaction` is cancelled;
    /// - `CONTRACT_EXISTS` - the `TradeInContract` is being generated
    ///                       concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "generateTradeInContract",
            otel.name = Self::SPAN_NAME,
            transaction.id = %transaction_id,
        ),
    )]
    pub async fn generate_trade_in_contract(
        transaction_id: api::transaction::Id,
        ctx: &Context,
    ) -> Result<api::Contract, Error> {
        ctx.service()
            .execute(command::GenerateTradeInContract {
                transaction_id: transaction_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Signs the generated `TradeInContract` of the `TradeInTransaction`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRANSACTION_NOT_EXISTS` - the `TradeInTransaction` with the
    ///                              specified ID does not exist;
    /// - `INVALID_TRANSITION` - the `TradeInContract` is not generated, or
    ///                          is already signed;
    /// - `TERMS_NOT_AGREED` - the customer didn't agree to the terms.
    #[tracing::instrument(
        skip_all,
        fields(
            customer_agreed_terms = %customer_agreed_terms,
            gql.name = "signTradeInContract",
            otel.name = Self::SPAN_NAME,
            signer = %signer,
            transaction.id = %transaction_id,
        ),
    )]
    pub async fn sign_trade_in_contract(
        transaction_id: api::transaction::Id,
        signer: api::contract::SignerName,
        customer_agreed_terms: bool,
        document: Option<api::contract::IdDocumentInput>,
        witness: Option<api::contract::SignerName>,
        ctx: &Context,
    ) -> Result<api::Transaction, Error> {
        ctx.service()
            .execute(command::SignTradeInContract {
                transaction_id: transaction_id.into(),
                signer: signer.into(),
                customer_agreed_terms,
                document: document.map(Into::into),
                witness: witness.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|s| api::Transaction::with_contract(s.transaction, s.contract))
    }

    /// Completes the `TradeInTransaction` with a signed `TradeInContract`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRANSACTION_NOT_EXISTS` - the `TradeInTransaction` with the
    ///                              specified ID does not exist;
    /// - `INVALID_TRANSITION` - the `TradeInContract` is not signed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "completeTradeInTransaction",
            otel.name = Self::SPAN_NAME,
            transaction.id = %transaction_id,
        ),
    )]
    pub async fn complete_trade_in_transaction(
        transaction_id: api::transaction::Id,
        ctx: &Context,
    ) -> Result<api::Transaction, Error> {
        ctx.service()
            .execute(command::CompleteTradeInTransaction {
                transaction_id: transaction_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Marks the traded-in device of the `TradeInTransaction` as ready for
    /// resale, clearing its `needsRepair` flag.
    ///
    /// Keeps the current `resalePrice`, if none provided.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRANSACTION_NOT_EXISTS` - the `TradeInTransaction` with the
    ///                              specified ID does not exist;
    /// - `DEVICE_NOT_RECEIVED` - the `TradeInContract` is not signed yet, or
    ///                           the `TradeInTransaction` is cancelled;
    /// - `NEGATIVE_RESALE_PRICE` - `resalePrice` is negative;
    /// - `CURRENCY_MISMATCH` - `resalePrice` is in another currency.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "markTradeInReadyForResale",
            otel.name = Self::SPAN_NAME,
            resale_price = ?resale_price,
            transaction.id = %transaction_id,
        ),
    )]
    pub async fn mark_trade_in_ready_for_resale(
        transaction_id: api::transaction::Id,
        resale_price: Option<Money>,
        ctx: &Context,
    ) -> Result<api::Transaction, Error> {
        ctx.service()
            .execute(command::MarkTradeInReadyForResale {
                transaction_id: transaction_id.into(),
                resale_price,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the not yet signed `TradeInTransaction`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TRANSACTION_NOT_EXISTS` - the `TradeInTransaction` with the
    ///                              specified ID does not exist;
    /// - `INVALID_TRANSITION` - the `TradeInContract` is already signed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelTradeInTransaction",
            otel.name = Self::SPAN_NAME,
            transaction.id = %transaction_id,
        ),
    )]
    pub async fn cancel_trade_in_transaction(
        transaction_id: api::transaction::Id,
        ctx: &Context,
    ) -> Result<api::Transaction, Error> {
        ctx.service()
            .execute(command::CancelTradeInTransaction {
                transaction_id: transaction_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum PriceInputError {
        #[code = "INCOMPLETE_DEVICE"]
        #[status = BAD_REQUEST]
        #[message = "Both `deviceName` and `deviceModel` must be provided"]
        IncompleteDevice,
    }
}

define_error! {
    enum PriceError {
        #[code = "DEVICE_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Device already has a `TradeInPrice`"]
        DeviceOccupied,

        #[code = "NEGATIVE_BASE_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "`basePrice` must not be negative"]
        NegativeBasePrice,
    }
}

define_error! {
    enum TransactionError {
        #[code = "CONTRACT_EXISTS"]
        #[status = CONFLICT]
        #[message = "`TradeInContract` is already generated"]
        ContractExists,

        #[code = "DEVICE_NOT_RECEIVED"]
        #[status = CONFLICT]
        #[message = "Traded-in device is not received yet"]
        DeviceNotReceived,

        #[code = "INVALID_TRANSITION"]
        #[status = CONFLICT]
        #[message = "`TradeInTransaction` cannot be moved to the requested \
                     status"]
        InvalidTransition,

        #[code = "NUMBER_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Generated `TradeInTransactionNumber` is occupied"]
        NumberOccupied,

        #[code = "TERMS_NOT_AGREED"]
        #[status = BAD_REQUEST]
        #[message = "Customer must agree to the `TradeInContract` terms"]
        TermsNotAgreed,
    }
}

impl AsError for command::create_trade_in_price::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DeviceOccupied(_) => Some(PriceError::DeviceOccupied.into()),
            Self::NegativeBasePrice(_) => {
                Some(PriceError::NegativeBasePrice.into())
            }
        }
    }
}

impl AsError for command::update_trade_in_price::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DeviceOccupied(_) => Some(PriceError::DeviceOccupied.into()),
            Self::NegativeBasePrice(_) => {
                Some(PriceError::NegativeBasePrice.into())
            }
            Self::PriceNotExists(_) => {
                Some(api::query::PriceError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_trade_in_price::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PriceNotExists(_) => {
                Some(api::query::PriceError::NotExists.into())
            }
        }
    }
}

impl AsError for command::create_trade_in_transaction::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NumberOccupied(_) => {
                Some(TransactionError::NumberOccupied.into())
            }
            Self::Validation(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::generate_trade_in_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractExists(_) => {
                Some(TransactionError::ContractExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::InvalidTransition(_) => {
                Some(TransactionError::InvalidTransition.into())
            }
            Self::TransactionNotExists(_) => {
                Some(api::query::TransactionError::NotExists.into())
            }
        }
    }
}

impl AsError for command::sign_trade_in_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidTransition(_) => {
                Some(TransactionError::InvalidTransition.into())
            }
            Self::NotConfirmed => Some(TransactionError::TermsNotAgreed.into()),
            Self::TransactionNotExists(_) => {
                Some(api::query::TransactionError::NotExists.into())
            }
        }
    }
}

impl AsError for command::complete_trade_in_transaction::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidTransition(_) => {
                Some(TransactionError::InvalidTransition.into())
            }
            Self::TransactionNotExists(_) => {
                Some(api::query::TransactionError::NotExists.into())
            }
        }
    }
}

impl AsError for command::cancel_trade_in_transaction::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidTransition(_) => {
                Some(TransactionError::InvalidTransition.into())
            }
            Self::TransactionNotExists(_) => {
                Some(api::query::TransactionError::NotExists.into())
            }
        }
    }
}

impl AsError for command::mark_trade_in_ready_for_resale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DeviceNotReceived(_) => {
                Some(TransactionError::DeviceNotReceived.into())
            }
            Self::TransactionNotExists(_) => {
                Some(api::query::TransactionError::NotExists.into())
            }
            Self::Validation(e) => e.try_as_error(),
        }
    }
}
