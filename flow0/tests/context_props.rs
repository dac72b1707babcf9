//! Property tests for the append-only context.

use flow0::{Context, ContextError, Fragment, Value};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn keys() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]{1,2}", 0..8)
}

proptest! {
    /// A merge either adds every fragment key or changes nothing.
    #[test]
    fn merge_is_all_or_nothing(seed in keys(), fragment in keys()) {
        let seed: BTreeMap<String, Value> = seed.into_iter().map(|k| (k, Value::Int(0))).collect();
        let mut ctx = Context::seeded(seed.clone());
        let fragment: Fragment = fragment.into_iter().map(|k| (k, Value::Int(1))).collect();
        let collides = fragment.keys().any(|k| seed.contains_key(k));

        match ctx.merge(fragment.clone()) {
            Ok(()) => {
                prop_assert!(!collides);
                prop_assert_eq!(ctx.len(), seed.len() + fragment.len());
                for (k, v) in fragment.iter() {
                    prop_assert_eq!(ctx.get(k).unwrap(), v);
                }
            }
            Err(ContextError::KeyCollision { key }) => {
                prop_assert!(collides);
                prop_assert!(seed.contains_key(&key));
                prop_assert_eq!(ctx.into_inner(), seed);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// Keys never disappear and values never change once written.
    #[test]
    fn writes_never_overwrite(writes in prop::collection::vec(("[a-c]", any::<i64>()), 0..16)) {
        let mut ctx = Context::new();
        let mut first: BTreeMap<String, i64> = BTreeMap::new();
        for (key, n) in writes {
            let result = ctx.set(key.clone(), Value::Int(n));
            if first.contains_key(&key) {
                prop_assert_eq!(result, Err(ContextError::KeyCollision { key: key.clone() }));
            } else {
                prop_assert!(result.is_ok());
                first.insert(key.clone(), n);
            }
            prop_assert_eq!(ctx.get(&key).unwrap(), &Value::Int(first[&key]));
        }
        prop_assert_eq!(ctx.len(), first.len());
    }
}
