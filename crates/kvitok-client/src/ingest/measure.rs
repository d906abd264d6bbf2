//! Unit inference for receipt line items.
//!
//! The upstream documents rarely say how an item was counted, so the unit is
//! guessed from the quantity and the item name. An explicit unit in the
//! document always wins over the guess.

const WEIGHT_TOKENS: [&str; 2] = ["кг", "kg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Piece,
    Kilogram,
    Gram,
    Ton,
    Liter,
    Milliliter,
}

impl Measure {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Piece => "шт",
            Self::Kilogram => "кг",
            Self::Gram => "г",
            Self::Ton => "т",
            Self::Liter => "л",
            Self::Milliliter => "мл",
        }
    }

    /// Maps the FFD 1.2 `itemsQuantityMeasure` code.
    pub fn from_ffd_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Piece),
            10 => Some(Self::Gram),
            11 => Some(Self::Kilogram),
            12 => Some(Self::Ton),
            41 => Some(Self::Liter),
            42 => Some(Self::Milliliter),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().trim_end_matches('.').to_lowercase();
        match normalized.as_str() {
            "шт" | "pcs" | "pc" => Some(Self::Piece),
            "кг" | "kg" => Some(Self::Kilogram),
            "г" | "гр" | "g" => Some(Self::Gram),
            "т" | "t" => Some(Self::Ton),
            "л" | "l" => Some(Self::Liter),
            "мл" | "ml" => Some(Self::Milliliter),
            _ => None,
        }
    }
}

/// Unit hints carried by the source document, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitUnit {
    pub label: Option<String>,
    pub ffd_code: Option<i64>,
}

pub fn infer_measure(name: &str, quantity: f64, explicit: &ExplicitUnit) -> Measure {
    if let Some(measure) = explicit.label.as_deref().and_then(Measure::from_label) {
        return measure;
    }
    if let Some(measure) = explicit.ffd_code.and_then(Measure::from_ffd_code) {
        return measure;
    }

    if quantity.fract() != 0.0 {
        return Measure::Kilogram;
    }

    let lowered = name.to_lowercase();
    if WEIGHT_TOKENS.iter().any(|token| lowered.contains(token)) {
        return Measure::Kilogram;
    }

    Measure::Piece
}
