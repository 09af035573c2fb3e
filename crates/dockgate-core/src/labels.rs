//! The tenant label and the label map type it lives in.

use std::collections::BTreeMap;

/// String-keyed, string-valued label map.
///
/// A `BTreeMap` rather than a `HashMap`: stamped label sets get serialized
/// back out onto the wire, and deterministic key order makes that output
/// byte-stable, which both the engine's own idempotency checks and our own
/// tests (asserting on an exact outgoing body, e.g. scenario S1 in
/// assertions) benefit from.
pub type Labels = BTreeMap<String, String>;

/// The fixed reverse-DNS label key both the proxy and cooperating tooling
/// use to mark tenant ownership.
pub const TENANT_LABEL_KEY: &str = "dev.dockgate.tenant";

/// Set the tenant label on a label map, overwriting any client-supplied
/// value for that key ("client cannot override the tenant
/// label").
pub fn stamp(labels: &mut Labels, tenant_label_value: &str) {
    labels.insert(TENANT_LABEL_KEY.to_string(), tenant_label_value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_overwrites_client_supplied_value() {
        let mut labels = Labels::new();
        labels.insert(TENANT_LABEL_KEY.to_string(), "someone-else".to_string());
        stamp(&mut labels, "acme");
        assert_eq!(labels.get(TENANT_LABEL_KEY), Some(&"acme".to_string()));
    }
}
