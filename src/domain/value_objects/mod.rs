//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Prices are kept to the millime (three decimal places).
pub const PRICE_SCALE: u32 = 3;

/// Round a price to [`PRICE_SCALE`] decimals, half away from zero.
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Unit price times quantity, rounded.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_price(unit_price * Decimal::from(quantity))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a fieldless enum stored as lowercase text, both in Postgres and on the wire.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self { $( Self::$variant => $text ),+ }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::value_objects::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err($crate::domain::value_objects::UnknownVariant {
                        kind: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use text_enum;

text_enum! {
    /// Per-client setting: buy by the piece (retail) or by the lot (wholesale).
    pub enum PurchaseUnit: "purchase unit" {
        Piece => "piece",
        Quantity => "quantity",
    }
}

impl Default for PurchaseUnit {
    fn default() -> Self { Self::Piece }
}

impl PurchaseUnit {
    pub fn other(self) -> Self {
        match self { Self::Piece => Self::Quantity, Self::Quantity => Self::Piece }
    }

    pub fn mode(self) -> PurchaseMode {
        match self { Self::Piece => PurchaseMode::Retail, Self::Quantity => PurchaseMode::Wholesale }
    }
}

/// Which minimum-order column applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseMode {
    Retail,
    Wholesale,
}

text_enum! {
    /// Units a product is offered in.
    pub enum SaleType: "sale type" {
        Piece => "piece",
        Quantity => "quantity",
        Both => "both",
    }
}

impl Default for SaleType {
    fn default() -> Self { Self::Both }
}

impl SaleType {
    /// The unit actually sold to a buyer who prefers `wanted`.
    pub fn unit_for(self, wanted: PurchaseUnit) -> PurchaseUnit {
        match self {
            Self::Piece => PurchaseUnit::Piece,
            Self::Quantity => PurchaseUnit::Quantity,
            Self::Both => wanted,
        }
    }
}

text_enum! {
    pub enum FlashTarget: "flash target" {
        Product => "product",
        Combinations => "combinations",
    }
}

impl Default for FlashTarget {
    fn default() -> Self { Self::Product }
}

text_enum! {
    pub enum DiscountType: "discount type" {
        Percent => "percent",
        Fixed => "fixed",
    }
}

impl Default for DiscountType {
    fn default() -> Self { Self::Percent }
}
