//! Coupon Fixtures

use serde::Deserialize;

use crate::{
    checkout::payments::{Coupon, CouponKind},
    fixtures::FixtureError,
    money::parse_price,
};

/// Wrapper for coupons in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Coupons
    pub coupons: Vec<CouponFixture>,
}

/// Coupon fixture from YAML
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Redemption code
    pub code: String,

    /// Origin
    pub kind: CouponKind,

    /// Face value price string
    pub value: String,
}

impl TryFrom<CouponFixture> for Coupon {
    type Error = FixtureError;

    fn try_from(fixture: CouponFixture) -> Result<Self, Self::Error> {
        Ok(Self {
            code: fixture.code.trim().to_uppercase(),
            kind: fixture.kind,
            value: parse_price(&fixture.value)?,
        })
    }
}
