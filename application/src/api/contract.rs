//! [`Contract`]-related definitions.

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Legal agreement transferring a traded-in device to the store.
#[derive(Clone, Debug, From, Into)]
pub struct Contract(domain::Contract);

/// Legal agreement transferring a traded-in device to the store.
#[graphql_object(name = "TradeInContract", context = Context)]
impl Contract {
    /// Unique identifier of this `TradeInContract`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `TradeInTransaction` this `TradeInContract` is generated for.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "TradeInContract.transaction",
            otel.name = api::Query::SPAN_NAME,
            transaction.id = %self.0.transaction_id,
        ),
    )]
    pub async fn transaction(
        &self,
        ctx: &Context,
    ) -> Result<api::Transaction, Error> {
        ctx.service()
            .execute(query::transaction::ById::by(self.0.transaction_id))
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .await?
            .ok_or_else(|| api::query::TransactionError::NotExists.into())
            .map_err(ctx.error())
            .map(|t| api::Transaction::with_contract(t, self.0.clone()))
    }

    /// Value the device is traded in for.
    #[must_use]
    pub fn agreed_value(&self) -> Money {
        self.0.agreed_value
    }

    /// Terms of this `TradeInContract`.
    #[must_use]
    pub fn terms(&self) -> &str {
        self.0.terms.as_ref()
    }

    /// Customer's declaration of the device ownership.
    #[must_use]
    pub fn ownership_declaration(&self) -> &str {
        self.0.ownership_declaration.as_ref()
    }

    /// Indicator whether this `TradeInContract` is signed.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.0.is_signed()
    }

    /// Signature of this `TradeInContract`, if signed.
    #[must_use]
    pub fn signature(&self) -> Option<Signature> {
        self.0.signature.clone().map(Into::into)
    }

    /// `DateTime` when this `TradeInContract` was generated.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `TradeInContract`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::contract::Id)]
#[into(domain::contract::Id)]
#[graphql(name = "TradeInContractId", transparent)]
pub struct Id(Uuid);

/// Signature of a `TradeInContract`.
#[derive(Clone, Debug, From)]
pub struct Signature(domain::contract::Signature);

/// Signature of a `TradeInContract`.
#[graphql_object(name = "TradeInContractSignature", context = Context)]
impl Signature {
    /// Name of the person who signed the `TradeInContract`.
    #[must_use]
    pub fn signer(&self) -> SignerName {
        self.0.signer.clone().into()
    }

    /// Identity document presented by the signer.
    #[must_use]
    pub fn document(&self) -> Option<IdDocument> {
        self.0.document.clone().map(Into::into)
    }

    /// Name of the witness of the signing.
    #[must_use]
    pub fn witness(&self) -> Option<SignerName> {
        self.0.witness.clone().map(Into::into)
    }

    /// `DateTime` when the `TradeInContract` was signed.
    #[must_use]
    pub fn signed_at(&self) -> DateTime {
        self.0.signed_at.coerce()
    }
}

/// Full name of a person signing a `TradeInContract`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "SignerName",
    with = scalar::Via::<domain::contract::SignerName>,
)]
pub struct SignerName(domain::contract::SignerName);

/// Identity document of a customer.
#[derive(Clone, Debug, From)]
pub struct IdDocument(domain::customer::IdDocument);

/// Identity document of a customer.
#[graphql_object(name = "IdDocument", context = Context)]
impl IdDocument {
    /// Kind of this `IdDocument`.
    #[must_use]
    pub fn kind(&self) -> IdKind {
        self.0.kind.into()
    }

    /// Number of this `IdDocument`.
    #[must_use]
    pub fn number(&self) -> IdNumber {
        self.0.number.clone().into()
    }
}

/// Identity document of a customer.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "IdDocumentInput")]
pub struct IdDocumentInput {
    /// Kind of the `IdDocument`.
    pub kind: IdKind,

    /// Number of the `IdDocument`.
    pub number: IdNumber,
}

impl From<IdDocumentInput> for domain::customer::IdDocument {
    fn from(input: IdDocumentInput) -> Self {
        Self {
            kind: input.kind.into(),
            number: input.number.into(),
        }
    }
}

/// Number of an `IdDocument`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "IdDocumentNumber",
    with = scalar::Via::<domain::customer::IdNumber>,
)]
pub struct IdNumber(domain::customer::IdNumber);

/// Kind of an `IdDocument`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "IdDocumentKind")]
pub enum IdKind {
    /// National identity card.
    NationalId,

    /// Passport.
    Passport,

    /// Driver's license.
    DriversLicense,

    /// Voter's card.
    VoterId,
}

impl From<domain::customer::IdKind> for IdKind {
    fn from(kind: domain::customer::IdKind) -> Self {
        use domain::customer::IdKind as K;
        match kind {
            K::NationalId => Self::NationalId,
            K::Passport => Self::Passport,
            K::DriversLicense => Self::DriversLicense,
            K::VoterId => Self::VoterId,
        }
    }
}

impl From<IdKind> for domain::customer::IdKind {
    fn from(kind: IdKind) -> Self {
        match kind {
            IdKind::NationalId => Self::NationalId,
            IdKind::Passport => Self::Passport,
            IdKind::DriversLicense => Self::DriversLicense,
            IdKind::VoterId => Self::VoterId,
        }
    }
}
