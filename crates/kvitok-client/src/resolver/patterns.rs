use regex::{Regex, RegexBuilder};

const REGEX_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternType {
    Name,
    Address,
    Both,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::Both => "both",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "address" => Some(Self::Address),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub pattern_id: String,
    pub shop_id: String,
    pub pattern_type: PatternType,
    pub pattern_value: String,
    pub is_regex: bool,
    pub priority: i64,
}

pub fn compile_pattern(value: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(value)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

/// Returns the first rule matching the input, lowest priority value first.
/// Rules with equal priority keep their given order.
pub fn first_match<'a>(
    rules: &'a [PatternRule],
    trade_name: &str,
    address: Option<&str>,
) -> Option<&'a PatternRule> {
    let mut ordered: Vec<&PatternRule> = rules.iter().collect();
    ordered.sort_by_key(|rule| rule.priority);

    ordered
        .into_iter()
        .find(|rule| rule_matches(rule, trade_name, address))
}

pub fn rule_matches(rule: &PatternRule, trade_name: &str, address: Option<&str>) -> bool {
    let haystack = match rule.pattern_type {
        PatternType::Name => trade_name.to_string(),
        PatternType::Address => match address {
            Some(value) => value.to_string(),
            None => return false,
        },
        PatternType::Both => format!("{trade_name} {}", address.unwrap_or("")),
    };

    if !rule.is_regex {
        return haystack
            .to_lowercase()
            .contains(&rule.pattern_value.to_lowercase());
    }

    match compile_pattern(&rule.pattern_value) {
        Ok(regex) => regex.is_match(&haystack),
        Err(error) => {
            tracing::warn!(
                pattern_id = %rule.pattern_id,
                pattern = %rule.pattern_value,
                %error,
                "ignoring store pattern with invalid regex"
            );
            false
        }
    }
}
