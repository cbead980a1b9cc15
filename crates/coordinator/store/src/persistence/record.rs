pub mod insert;
pub mod select;

use core::str::FromStr;

use std::io::Write;

use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::Pg,
    serialize::{self, IsNull, Output, ToSql},
};
use tezos_multisig_coordinator_domain::{RequestStatus, SignatureType};

use crate::persistence::schema::sql_types::{
    RequestStatus as RequestStatusSql, SignatureKind as SignatureKindSql,
};

#[derive(Debug, Clone, Copy, AsExpression, FromSqlRow)]
#[diesel(sql_type = RequestStatusSql)]
pub struct Status(RequestStatus);

#[derive(Debug, Clone, Copy, AsExpression, FromSqlRow)]
#[diesel(sql_type = SignatureKindSql)]
pub struct SignatureKind(SignatureType);

impl Status {
    pub fn into_inner(self) -> RequestStatus {
        self.0
    }
}

impl SignatureKind {
    pub fn into_inner(self) -> SignatureType {
        self.0
    }
}

impl From<RequestStatus> for Status {
    fn from(status: RequestStatus) -> Self {
        Self(status)
    }
}

impl From<SignatureType> for SignatureKind {
    fn from(kind: SignatureType) -> Self {
        Self(kind)
    }
}

impl ToSql<RequestStatusSql, Pg> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(<&str>::from(&self.0).as_bytes())?;

        Ok(IsNull::No)
    }
}

impl FromSql<RequestStatusSql, Pg> for Status {
    fn from_sql(bz: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        str::from_utf8(bz.as_bytes())
            .map(FromStr::from_str)?
            .map(Self)
            .map_err(From::from)
    }
}

impl ToSql<SignatureKindSql, Pg> for SignatureKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(<&str>::from(&self.0).as_bytes())?;

        Ok(IsNull::No)
    }
}

impl FromSql<SignatureKindSql, Pg> for SignatureKind {
    fn from_sql(bz: <Pg as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        str::from_utf8(bz.as_bytes())
            .map(FromStr::from_str)?
            .map(Self)
            .map_err(From::from)
    }
}
