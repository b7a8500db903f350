//! Placeholder resolution engine
//!
//! Resolves the pending layer of a [`PropertyStore`] to a fixed point.
//! Each round first substitutes every placeholder whose key has a live
//! value (resolved layer, falling back to boot). Only when a round finds no
//! live value at all is a single default applied, preferring placeholders
//! whose key is not itself pending, so that a default never masks a value
//! that a later round could still produce. A round with no progress ends
//! resolution; anything still pending is reported as unresolved.
//!
//! Keys are visited in pending-layer insertion order and placeholders in
//! order of appearance, so results do not depend on hash iteration order.

use crate::error::{Error, Result, UnresolvedKey};
use crate::interpolation::Placeholder;
use crate::store::{Layer, PropertyStore, Replace, Substitution};

/// Summary of one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Rounds executed (zero when nothing was pending)
    pub rounds: usize,
    /// Placeholders replaced with live values
    pub substitutions: usize,
    /// Placeholders replaced with their defaults
    pub defaults_applied: usize,
    /// Keys still pending at termination
    pub unresolved: Vec<UnresolvedKey>,
}

impl Resolution {
    /// Whether every pending key was resolved
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Names of the keys left pending
    pub fn unresolved_keys(&self) -> Vec<&str> {
        self.unresolved.iter().map(|u| u.key.as_str()).collect()
    }

    /// Turn an incomplete resolution into an unresolved reference error
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Error::unresolved(self.unresolved))
        }
    }
}

/// Which placeholders a default pass may consider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefaultPolicy {
    /// Skip placeholders whose key is still pending
    SettledRefsOnly,
    /// Consider every placeholder
    Any,
}

/// Resolve every pending key of `store` as far as possible
pub fn resolve(store: &mut PropertyStore) -> Resolution {
    let mut resolution = Resolution::default();

    while !store.is_empty(Layer::Pending) {
        resolution.rounds += 1;

        let substituted = substitute_live_values(store);
        if substituted > 0 {
            resolution.substitutions += substituted;
            log::debug!(
                "Round {}: {} live substitution(s), {} key(s) pending",
                resolution.rounds,
                substituted,
                store.len(Layer::Pending)
            );
            continue;
        }

        if apply_default(store, DefaultPolicy::SettledRefsOnly)
            || apply_default(store, DefaultPolicy::Any)
        {
            resolution.defaults_applied += 1;
            log::debug!(
                "Round {}: applied a default, {} key(s) pending",
                resolution.rounds,
                store.len(Layer::Pending)
            );
            continue;
        }

        break;
    }

    resolution.unresolved = store
        .pending_entries()
        .map(|(key, entry)| {
            let mut tokens: Vec<String> = Vec::new();
            for p in &entry.placeholders {
                if !tokens.contains(&p.token) {
                    tokens.push(p.token.clone());
                }
            }
            UnresolvedKey {
                key: key.to_string(),
                raw: entry.raw.clone(),
                tokens,
            }
        })
        .collect();

    if !resolution.is_complete() {
        log::warn!(
            "Resolution stopped after {} round(s) with unresolved keys: {}",
            resolution.rounds,
            resolution.unresolved_keys().join(", ")
        );
    }

    resolution
}

/// Replace every placeholder that has a live value; returns the count
fn substitute_live_values(store: &mut PropertyStore) -> usize {
    let mut count = 0;

    for key in pending_keys(store) {
        for placeholder in placeholder_snapshot(store, &key) {
            let value = store.get_resolved(&placeholder.key).to_string();
            if value.is_empty() {
                continue;
            }
            match store.substitute(&key, &placeholder, &value, Replace::All) {
                Substitution::Skipped => {}
                Substitution::Partial => {
                    log::trace!("{}: {} -> {}", key, placeholder.token, value);
                    count += 1;
                }
                Substitution::Promoted => {
                    log::trace!("{}: {} -> {} (resolved)", key, placeholder.token, value);
                    count += 1;
                    break;
                }
            }
        }
    }

    count
}

/// Apply the first eligible default, replacing one occurrence of its token
fn apply_default(store: &mut PropertyStore, policy: DefaultPolicy) -> bool {
    for key in pending_keys(store) {
        for placeholder in placeholder_snapshot(store, &key) {
            if policy == DefaultPolicy::SettledRefsOnly && store.is_pending(&placeholder.key) {
                continue;
            }
            let Some(default) = placeholder.default.as_deref() else {
                continue;
            };
            if store.substitute(&key, &placeholder, default, Replace::First)
                != Substitution::Skipped
            {
                log::trace!(
                    "{}: {} -> {} (default)",
                    key,
                    placeholder.token,
                    default
                );
                return true;
            }
        }
    }

    false
}

fn pending_keys(store: &PropertyStore) -> Vec<String> {
    store
        .keys(Layer::Pending)
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn placeholder_snapshot(store: &PropertyStore, key: &str) -> Vec<Placeholder> {
    store.placeholders(key).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn store_with(pairs: &[(&str, &str)]) -> PropertyStore {
        let mut store = PropertyStore::new();
        for (k, v) in pairs {
            store.put(k, v).unwrap();
        }
        store
    }

    fn resolved(store: &PropertyStore) -> Vec<(String, String)> {
        let mut out: Vec<_> = store
            .keys(Layer::Resolved)
            .into_iter()
            .map(|k| (k.to_string(), store.get_resolved(k).to_string()))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_nothing_pending_needs_no_rounds() {
        let mut store = store_with(&[("a", "1"), ("b", "2")]);
        let resolution = resolve(&mut store);

        assert!(resolution.is_complete());
        assert_eq!(resolution.rounds, 0);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut store = store_with(&[("a", "1"), ("b", "${a}"), ("c", "${b:z}")]);
        assert!(resolve(&mut store).is_complete());
        let first = resolved(&store);

        let again = resolve(&mut store);
        assert_eq!(again.rounds, 0);
        assert_eq!(resolved(&store), first);
    }

    #[test]
    fn test_chained_resolution() {
        let mut store = store_with(&[("c", "${b}"), ("b", "${a}"), ("a", "1")]);
        let resolution = resolve(&mut store);

        assert!(resolution.is_complete());
        assert_eq!(store.get_resolved("a"), "1");
        assert_eq!(store.get_resolved("b"), "1");
        assert_eq!(store.get_resolved("c"), "1");
        assert_eq!(resolution.defaults_applied, 0);
    }

    #[test]
    fn test_default_fallback() {
        let mut store = store_with(&[("x", "${missing:fallback}")]);
        let resolution = resolve(&mut store);

        assert!(resolution.is_complete());
        assert_eq!(store.get_resolved("x"), "fallback");
        assert_eq!(resolution.defaults_applied, 1);
    }

    #[test]
    fn test_live_value_beats_default() {
        let mut store = store_with(&[("y", "${z:fallback}"), ("z", "42")]);
        resolve(&mut store);
        assert_eq!(store.get_resolved("y"), "42");
    }

    #[test]
    fn test_live_value_produced_later_beats_default() {
        // z only becomes available once w resolves through its own default
        let mut store = store_with(&[
            ("y", "${z:fallback}"),
            ("z", "${w}"),
            ("w", "${unset:7}"),
        ]);
        let resolution = resolve(&mut store);

        assert!(resolution.is_complete());
        assert_eq!(store.get_resolved("w"), "7");
        assert_eq!(store.get_resolved("z"), "7");
        assert_eq!(store.get_resolved("y"), "7");
        assert_eq!(resolution.defaults_applied, 1);
    }

    #[test]
    fn test_pending_refs_get_defaults_last() {
        // b waits on a pending key; the settled missing key gets its default first
        let mut store = store_with(&[("b", "${a:from_b}"), ("a", "${missing:from_a}")]);
        resolve(&mut store);

        assert_eq!(store.get_resolved("a"), "from_a");
        assert_eq!(store.get_resolved("b"), "from_a");
    }

    #[test]
    fn test_cycle_with_default_is_broken() {
        let mut store = store_with(&[("a", "${b:1}"), ("b", "${a}")]);
        let resolution = resolve(&mut store);

        assert!(resolution.is_complete());
        assert_eq!(store.get_resolved("a"), "1");
        assert_eq!(store.get_resolved("b"), "1");
    }

    #[test]
    fn test_cycle_without_default_is_unresolved() {
        let mut store = store_with(&[("a", "${b}"), ("b", "${a}")]);
        let resolution = resolve(&mut store);

        assert!(!resolution.is_complete());
        assert_eq!(resolution.unresolved_keys(), vec!["a", "b"]);
    }

    #[test]
    fn test_unresolvable_detection() {
        let mut store = store_with(&[("p", "${q}")]);
        let resolution = resolve(&mut store);

        assert!(!resolution.is_complete());
        assert_eq!(resolution.unresolved_keys(), vec!["p"]);
        assert_eq!(
            resolution.unresolved,
            vec![UnresolvedKey {
                key: "p".into(),
                raw: "${q}".into(),
                tokens: vec!["${q}".into()],
            }]
        );
        assert!(store.is_pending("p"));
    }

    #[test]
    fn test_unresolved_into_result() {
        let mut store = store_with(&[("p", "${q} ${q} ${r}"), ("ok", "fine")]);
        let err = resolve(&mut store).into_result().unwrap_err();

        match err.kind {
            ErrorKind::Unresolved { keys } => {
                assert_eq!(keys.len(), 1);
                assert_eq!(keys[0].tokens, vec!["${q}".to_string(), "${r}".to_string()]);
            }
            other => panic!("Expected Unresolved, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_placeholder_composition() {
        let mut store = store_with(&[("level1", "a ${x} b ${y:default_y}"), ("x", "val1")]);
        resolve(&mut store);
        assert_eq!(store.get_resolved("level1"), "a val1 b default_y");
    }

    #[test]
    fn test_live_value_replaces_every_occurrence() {
        let mut store = store_with(&[("k", "${x}/${x}/${x}"), ("x", "v")]);
        let resolution = resolve(&mut store);

        assert_eq!(store.get_resolved("k"), "v/v/v");
        assert_eq!(resolution.substitutions, 1);
    }

    #[test]
    fn test_default_replaces_one_occurrence_per_round() {
        let mut store = store_with(&[("k", "${x:d}+${x:d}")]);
        let resolution = resolve(&mut store);

        assert_eq!(store.get_resolved("k"), "d+d");
        assert_eq!(resolution.defaults_applied, 2);
    }

    #[test]
    fn test_live_value_assembling_placeholder_is_resolved() {
        let mut store = store_with(&[("k", "${a}{b}"), ("a", "$"), ("b", "real")]);
        let resolution = resolve(&mut store);

        assert!(resolution.is_complete());
        assert_eq!(store.get_resolved("k"), "real");
        assert_eq!(resolution.substitutions, 2);
    }

    #[test]
    fn test_default_assembling_placeholder_is_resolved() {
        // the default "$" completes a new "${a}" token
        let mut store = store_with(&[("k", "${x:$}{a}"), ("a", "nope")]);
        let resolution = resolve(&mut store);

        assert!(resolution.is_complete());
        assert_eq!(store.get_resolved("k"), "nope");
        assert_eq!(resolution.defaults_applied, 1);
    }

    #[test]
    fn test_resolved_values_hold_no_placeholders() {
        let mut store = store_with(&[
            ("k", "${a}{b}"),
            ("a", "$"),
            ("b", "${c:x}"),
            ("m", "${n:$}{a}"),
        ]);
        resolve(&mut store);

        for key in store.keys(Layer::Resolved) {
            assert!(
                !crate::interpolation::contains_placeholder(store.get_resolved(key)),
                "{} still holds a placeholder",
                key
            );
        }
        assert_eq!(store.get_resolved("k"), "x");
        assert_eq!(store.get_resolved("m"), "$");
    }

    #[test]
    fn test_self_rebuilding_value_terminates() {
        let mut store = store_with(&[("k", "$${b}"), ("b", "{b}")]);
        let resolution = resolve(&mut store);

        assert!(!resolution.is_complete());
        assert_eq!(resolution.unresolved_keys(), vec!["k"]);
        assert_eq!(store.get_pending("k"), "${b}");
    }

    #[test]
    fn test_boot_value_satisfies_placeholder() {
        let mut boot = PropertyStore::new();
        boot.put("application.name", "simpleProperties.app").unwrap();
        let mut store = PropertyStore::new();
        store.install_boot(boot);
        store.put("banner", "Welcome to ${application.name:unknown}").unwrap();

        resolve(&mut store);
        assert_eq!(store.get_resolved("banner"), "Welcome to simpleProperties.app");
    }

    #[test]
    fn test_mixed_live_and_defaults() {
        let mut store = store_with(&[
            ("level1", "test value 1 and ${v2} and ${v3:default_v3} and ${v4:default_v4} and ${v5}"),
            ("v2", "quark"),
            ("v5", "${v6:xyzzy}"),
        ]);
        let resolution = resolve(&mut store);

        assert!(resolution.is_complete());
        assert_eq!(
            store.get_resolved("level1"),
            "test value 1 and quark and default_v3 and default_v4 and xyzzy"
        );
    }

    #[test]
    fn test_partial_progress_keeps_key_pending() {
        let mut store = store_with(&[("k", "${a} ${b}"), ("a", "1")]);
        let resolution = resolve(&mut store);

        assert!(!resolution.is_complete());
        assert_eq!(store.get_pending("k"), "1 ${b}");
        assert_eq!(resolution.unresolved[0].tokens, vec!["${b}".to_string()]);
    }

    #[test]
    fn test_insertion_order_is_independent_of_outcome() {
        let forward = [("a", "${b:x}"), ("b", "${c:y}"), ("c", "${d:z}")];
        let mut reversed = forward;
        reversed.reverse();

        let mut s1 = store_with(&forward);
        let mut s2 = store_with(&reversed);
        resolve(&mut s1);
        resolve(&mut s2);

        assert_eq!(resolved(&s1), resolved(&s2));
        assert_eq!(s1.get_resolved("a"), "z");
    }
}
