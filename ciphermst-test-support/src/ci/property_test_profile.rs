//! Environment overrides for property-test suites.
//!
//! Protocol properties run the whole encrypted round loop per case, so CI
//! needs to tune both the number of cases and the size of generated graphs
//! without editing the suites.

use std::env;

/// Environment variable controlling proptest case counts.
pub const PROGTEST_CASES_ENV_KEY: &str = "PROGTEST_CASES";
/// Environment variable controlling proptest process forking.
pub const CIPHERMST_PBT_FORK_ENV_KEY: &str = "CIPHERMST_PBT_FORK";
/// Environment variable capping the node count of generated graphs.
pub const CIPHERMST_PBT_MAX_NODES_ENV_KEY: &str = "CIPHERMST_PBT_MAX_NODES";

/// Node cap used when no override is set.
pub const DEFAULT_MAX_NODES: usize = 9;
/// Smallest accepted node cap; a graph needs two nodes to have an edge.
pub const MIN_MAX_NODES: usize = 2;

/// Runtime profile for property-test execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
    max_nodes: usize,
}

impl ProptestRunProfile {
    /// Loads a profile from the environment, falling back to the supplied
    /// case count and fork flag and to [`DEFAULT_MAX_NODES`].
    ///
    /// Invalid overrides are logged at `warn` and ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use ciphermst_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// assert!(profile.max_nodes() >= 2);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: override_or(PROGTEST_CASES_ENV_KEY, default_cases, parse_cases),
            fork: override_or(CIPHERMST_PBT_FORK_ENV_KEY, default_fork, parse_flag),
            max_nodes: override_or(
                CIPHERMST_PBT_MAX_NODES_ENV_KEY,
                DEFAULT_MAX_NODES,
                parse_max_nodes,
            ),
        }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub const fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether to run proptest cases in forked subprocesses.
    #[must_use]
    pub const fn fork(&self) -> bool {
        self.fork
    }

    /// Largest node count a generated graph may have.
    #[must_use]
    pub const fn max_nodes(&self) -> usize {
        self.max_nodes
    }
}

fn override_or<T: Copy>(key: &'static str, default: T, parse: fn(&str) -> Result<T, String>) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    parse(raw.trim()).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason = %reason,
            "ignoring invalid property-test override",
        );
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    match raw.parse::<u32>() {
        Ok(0) => Err("cases must be > 0".to_owned()),
        Ok(cases) => Ok(cases),
        Err(error) => Err(format!("parse error: {error}")),
    }
}

fn parse_max_nodes(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(nodes) if nodes < MIN_MAX_NODES => {
            Err(format!("max nodes must be at least {MIN_MAX_NODES}"))
        }
        Ok(nodes) => Ok(nodes),
        Err(error) => Err(format!("parse error: {error}")),
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected one of: true/false/1/0/yes/no/on/off".to_owned()),
    }
}
