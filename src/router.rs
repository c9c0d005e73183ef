//! Route table.
//!
//! One table per HTTP method. Lookup happens in two phases:
//!
//! 1. **Exact**: the request path is looked up verbatim among the registered
//!    pattern strings. O(1). Literal routes, the common case, end here, so a
//!    literal route is always reached for its own path no matter when it was
//!    registered.
//! 2. **Scan**: on a miss, parameterized patterns are tried in registration
//!    order and the first structural match wins. `/users/:id` registered
//!    before `/:kind/active` claims `/users/active`; swap the registrations
//!    and the other one does.

use std::collections::HashMap;

use tracing::debug;

use crate::handler::Chain;
use crate::method::Method;
use crate::pattern::{Params, Pattern};

struct Route {
    pattern: Pattern,
    chain: Chain,
}

#[derive(Default)]
struct MethodRoutes {
    /// Raw pattern string → index into `routes`.
    exact: HashMap<String, usize>,
    /// Registration order.
    routes: Vec<Route>,
}

#[derive(Default)]
pub(crate) struct RouteTable {
    methods: HashMap<Method, MethodRoutes>,
}

impl RouteTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores `chain` under (`method`, `pattern`).
    ///
    /// Registering a pattern equal to an existing one (same shape, parameter
    /// names aside) replaces that route's chain and pattern text but keeps its
    /// position in the scan order.
    pub(crate) fn register(&mut self, method: Method, pattern: &str, chain: Chain) {
        let table = self.methods.entry(method).or_default();
        let pattern = Pattern::parse(pattern);

        match table.routes.iter().position(|r| r.pattern == pattern) {
            Some(idx) => {
                let old = std::mem::replace(&mut table.routes[idx], Route { pattern, chain });
                debug!(
                    %method,
                    old = old.pattern.as_str(),
                    new = table.routes[idx].pattern.as_str(),
                    "route overwritten"
                );
                table.exact.remove(old.pattern.as_str());
                table.exact.insert(table.routes[idx].pattern.as_str().to_owned(), idx);
            }
            None => {
                table.exact.insert(pattern.as_str().to_owned(), table.routes.len());
                table.routes.push(Route { pattern, chain });
            }
        }
    }

    pub(crate) fn lookup(&self, method: Method, path: &str) -> Option<(&Chain, Params)> {
        let table = self.methods.get(&method)?;

        if let Some(&idx) = table.exact.get(path) {
            return Some((&table.routes[idx].chain, Params::new()));
        }

        // A literal pattern matches only its own text, which phase one
        // already ruled out.
        table
            .routes
            .iter()
            .filter(|r| r.pattern.has_params())
            .find_map(|r| r.pattern.matches(path).map(|params| (&r.chain, params)))
    }

    pub(crate) fn len(&self) -> usize {
        self.methods.values().map(|t| t.routes.len()).sum()
    }
}
