//! [`Contract`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{contract, customer, transaction, Contract},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Contract>, transaction::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, transaction_id, \
                   agreed_value, agreed_value_currency, \
                   terms, ownership_declaration, \
                   signer_name, signer_document_kind, signer_document, \
                   witness_name, signed_at, created_at \
            FROM trade_in_contracts \
            WHERE transaction_id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&by.into_inner()])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| {
                let signer = row.get::<_, Option<contract::SignerName>>(
                    "signer_name",
                );
                let signed_at = row.get::<_, Option<_>>("signed_at");
                let signature =
                    signer.zip(signed_at).map(|(signer, signed_at)| {
                        contract::Signature {
                            signer,
                            document: row
                                .get::<_, Option<_>>("signer_document_kind")
                                .zip(row.get("signer_document"))
                                .map(|(kind, number)| customer::IdDocument {
                                    kind,
                                    number,
                                }),
                            witness: row.get("witness_name"),
                            signed_at,
                        }
                    });

                Contract {
                    id: row.get("id"),
                    transaction_id: row.get("transaction_id"),
                    agreed_value: Money {
                        amount: row.get("agreed_value"),
                        currency: row.get("agreed_value_currency"),
                    },
                    terms: row.get("terms"),
                    ownership_declaration: row.get("ownership_declaration"),
                    signature,
                    created_at: row.get("created_at"),
                }
            }))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO trade_in_contracts (\
                id, transaction_id, \
                agreed_value, agreed_value_currency, \
                terms, ownership_declaration, \
                signer_name, signer_document_kind, signer_document, \
                witness_name, signed_at, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::NUMERIC, $4::INT2, \
                $5::TEXT, $6::TEXT, \
                $7::VARCHAR, $8::INT2, $9::VARCHAR, \
                $10::VARCHAR, $11::TIMESTAMPTZ, $12::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET signer_name = EXCLUDED.signer_name, \
                signer_document_kind = EXCLUDED.signer_document_kind, \
                signer_document = EXCLUDED.signer_document, \
                witness_name = EXCLUDED.witness_name, \
                signed_at = EXCLUDED.signed_at";
        let Contract {
            id,
            transaction_id,
            agreed_value,
            terms,
            ownership_declaration,
            signature,
            created_at,
        } = contract;
        let (signer, document, witness, signed_at) = match signature {
            Some(contract::Signature {
                signer,
                document,
                witness,
                signed_at,
            }) => (Some(signer), document, witness, Some(signed_at)),
            None => (None, None, None, None),
        };
        let (document_kind, document_number) = document
            .map(|d| (d.kind, d.number))
            .unzip();
        self.exec(
            SQL,
            &[
                &id,
                &transaction_id,
                &agreed_value.amount,
                &agreed_value.currency,
                &terms,
                &ownership_declaration,
                &signer,
                &document_kind,
                &document_number,
                &witness,
                &signed_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
