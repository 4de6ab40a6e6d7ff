//! Property-based test generators using proptest.
//!
//! Provides strategies for generating open arguments, both valid and
//! invalid, and group names.

use h5file_core::{Mode, VersionTag};
use proptest::prelude::*;

/// Strategy for generating every accepted mode token.
pub fn mode_token_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["r", "r+", "w", "w-", "x", "a"])
}

/// Strategy for generating strings that are not mode tokens.
pub fn invalid_mode_token_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z+\\- ]{0,4}")
        .expect("Invalid regex")
        .prop_filter("Token must not resolve", |s| Mode::resolve(s).is_err())
}

/// Strategy for generating creating mode tokens.
pub fn creating_mode_token_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["w", "w-", "x", "a"])
}

/// Strategy for generating version tags.
pub fn version_tag_strategy() -> impl Strategy<Value = VersionTag> {
    prop::sample::select(VersionTag::ALL.to_vec())
}

/// Strategy for generating ordered `(low, high)` tag pairs.
pub fn ordered_bounds_strategy() -> impl Strategy<Value = (VersionTag, VersionTag)> {
    (version_tag_strategy(), version_tag_strategy())
        .prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

/// Strategy for generating valid group names.
pub fn group_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating sets of distinct group names.
pub fn group_names_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(group_name_strategy(), 0..max)
        .prop_map(|names| names.into_iter().collect())
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn mode_tokens_resolve(token in mode_token_strategy()) {
            prop_assert!(Mode::resolve(token).is_ok());
        }

        #[test]
        fn invalid_tokens_do_not_resolve(token in invalid_mode_token_strategy()) {
            prop_assert!(Mode::resolve(&token).is_err());
        }

        #[test]
        fn ordered_bounds_are_ordered((low, high) in ordered_bounds_strategy()) {
            prop_assert!(low <= high);
        }

        #[test]
        fn group_names_are_plain(name in group_name_strategy()) {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('/'));
        }
    }
}
