use std::collections::BTreeSet;

/// Pairs present now that were never seen before, in name order.
pub fn diff(current: &BTreeSet<String>, seen: &BTreeSet<String>) -> Vec<String> {
    current.difference(seen).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reports_only_unseen_pairs() {
        let seen = set(&["XXBTZUSD", "XETHZUSD"]);
        let current = set(&["XETHZUSD", "SOLUSD", "XXBTZUSD", "ADAUSD"]);
        assert_eq!(diff(&current, &seen), vec!["ADAUSD", "SOLUSD"]);
    }

    #[test]
    fn delisted_pairs_are_not_reported() {
        let seen = set(&["XXBTZUSD", "LUNAUSD"]);
        let current = set(&["XXBTZUSD"]);
        assert!(diff(&current, &seen).is_empty());
    }
}
