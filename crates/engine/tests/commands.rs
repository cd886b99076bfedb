use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use kvgate_common::Datum;
use kvgate_engine::{CommandError, Store};

fn run(store: &Store, cmd: &str, args: &[Datum]) -> Datum {
    store
        .execute(cmd, args)
        .unwrap_or_else(|e| panic!("{cmd} failed: {e}"))
}

fn s(v: &str) -> Datum {
    Datum::from(v)
}

fn members_of(datum: Datum) -> HashSet<Datum> {
    match datum {
        Datum::List(items) => items.into_iter().collect(),
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn incr_preserves_string_representation() {
    let store = Store::new();
    run(&store, "set", &[s("foo"), s("7")]);
    run(&store, "incr", &[s("foo")]);
    run(&store, "incr", &[s("foo")]);
    assert_eq!(run(&store, "get", &[s("foo")]), s("9"));
}

#[test]
fn incrby_preserves_integer_representation() {
    let store = Store::new();
    run(&store, "set", &[s("foo"), Datum::Int(7)]);
    run(&store, "incrby", &[s("foo"), Datum::Int(3)]);
    assert_eq!(run(&store, "get", &[s("foo")]), Datum::Int(10));
}

#[test]
fn decr_family_subtracts() {
    let store = Store::new();
    run(&store, "set", &[s("n"), Datum::Int(10)]);
    assert_eq!(run(&store, "decr", &[s("n")]), Datum::Int(9));
    assert_eq!(run(&store, "decrby", &[s("n"), Datum::Int(4)]), Datum::Int(5));
    // Numeric arguments may arrive as strings off the wire.
    assert_eq!(run(&store, "incrby", &[s("n"), s("2")]), Datum::Int(7));
}

#[test]
fn lpush_orders_head_first() {
    let store = Store::new();
    for item in ["a", "b", "c"] {
        run(&store, "lpush", &[s("l"), s(item)]);
    }
    assert_eq!(
        run(&store, "lrange", &[s("l"), Datum::Int(0), Datum::Int(-1)]),
        Datum::List(vec![s("c"), s("b"), s("a")])
    );
}

#[test]
fn lrem_negative_count_scans_from_tail() {
    let store = Store::new();
    run(&store, "rpush", &[s("l"), s("a"), s("b"), s("c")]);
    assert_eq!(
        run(&store, "lrem", &[s("l"), Datum::Int(-1), s("b")]),
        Datum::Int(1)
    );
    assert_eq!(
        run(&store, "lrange", &[s("l"), Datum::Int(0), Datum::Int(-1)]),
        Datum::List(vec![s("a"), s("c")])
    );
}

#[test]
fn sinterstore_writes_destination() {
    let store = Store::new();
    run(&store, "sadd", &[s("s1"), s("a"), s("b"), s("c")]);
    run(&store, "sadd", &[s("s2"), s("b"), s("c"), s("d")]);
    assert_eq!(
        run(&store, "sinterstore", &[s("dst"), s("s1"), s("s2")]),
        Datum::Int(2)
    );
    let members = members_of(run(&store, "smembers", &[s("dst")]));
    assert_eq!(members, HashSet::from([s("b"), s("c")]));
}

#[test]
fn setex_expires_and_lookup_removes_the_corpse() {
    let store = Store::new();
    // 100ms expressed in nanoseconds.
    run(&store, "setex", &[s("k"), Datum::Int(100_000_000), s("v")]);
    assert_eq!(run(&store, "get", &[s("k")]), s("v"));
    thread::sleep(Duration::from_millis(200));
    assert_eq!(
        store.execute("get", &[s("k")]),
        Err(CommandError::KeyNotFound)
    );
    // The key is free again, with a fresh choice of variant.
    assert_eq!(run(&store, "sadd", &[s("k"), s("m")]), Datum::Int(1));
}

#[test]
fn variant_is_stable_until_del_or_store() {
    let store = Store::new();
    run(&store, "lpush", &[s("k"), s("x")]);
    assert_eq!(
        store.execute("set", &[s("k"), s("y")]),
        Err(CommandError::TypeMismatch)
    );
    assert_eq!(
        store.execute("sadd", &[s("k"), s("y")]),
        Err(CommandError::TypeMismatch)
    );
    assert_eq!(
        store.execute("hget", &[s("k"), s("f")]),
        Err(CommandError::TypeMismatch)
    );
    // The list survived the rejected writes.
    assert_eq!(run(&store, "llen", &[s("k")]), Datum::Int(1));

    // DEL frees the slot...
    assert_eq!(run(&store, "del", &[s("k")]), Datum::Int(1));
    run(&store, "set", &[s("k"), s("y")]);
    // ...and a *STORE reassigns it outright.
    run(&store, "sadd", &[s("src"), s("m")]);
    run(&store, "sunionstore", &[s("k"), s("src")]);
    let members = members_of(run(&store, "smembers", &[s("k")]));
    assert_eq!(members, HashSet::from([s("m")]));
}

#[test]
fn del_follows_the_canonical_contract() {
    let store = Store::new();
    assert_eq!(run(&store, "del", &[s("nope")]), Datum::Int(0));
    run(&store, "set", &[s("a"), s("1")]);
    run(&store, "set", &[s("b"), s("2")]);
    assert_eq!(
        run(&store, "del", &[s("a"), s("b"), s("nope")]),
        Datum::Int(2)
    );
    assert_eq!(
        store.execute("get", &[s("a")]),
        Err(CommandError::KeyNotFound)
    );
}

#[test]
fn getset_returns_prior_and_installs_new() {
    let store = Store::new();
    assert_eq!(run(&store, "getset", &[s("k"), s("one")]), Datum::Null);
    assert_eq!(run(&store, "getset", &[s("k"), s("two")]), s("one"));
    assert_eq!(run(&store, "get", &[s("k")]), s("two"));
}

#[test]
fn setnx_only_writes_absent_keys() {
    let store = Store::new();
    assert_eq!(run(&store, "setnx", &[s("k"), s("a")]), Datum::Int(1));
    assert_eq!(run(&store, "setnx", &[s("k"), s("b")]), Datum::Int(0));
    assert_eq!(run(&store, "get", &[s("k")]), s("a"));
}

#[test]
fn mset_and_mget_round_trip_with_null_holes() {
    let store = Store::new();
    run(&store, "mset", &[s("a"), Datum::Int(1), s("b"), Datum::Int(2)]);
    assert_eq!(
        run(&store, "mget", &[s("a"), s("missing"), s("b")]),
        Datum::List(vec![Datum::Int(1), Datum::Null, Datum::Int(2)])
    );
}

#[test]
fn strlen_on_non_string_scalar_is_zero() {
    let store = Store::new();
    run(&store, "set", &[s("n"), Datum::Int(12345)]);
    assert_eq!(run(&store, "strlen", &[s("n")]), Datum::Int(0));
    run(&store, "set", &[s("t"), s("hello")]);
    assert_eq!(run(&store, "strlen", &[s("t")]), Datum::Int(5));
    assert_eq!(run(&store, "strlen", &[s("missing")]), Datum::Int(0));
}

#[test]
fn append_creates_then_extends() {
    let store = Store::new();
    assert_eq!(run(&store, "append", &[s("k"), s("ab")]), Datum::Int(2));
    assert_eq!(run(&store, "append", &[s("k"), s("cd")]), Datum::Int(4));
    assert_eq!(run(&store, "get", &[s("k")]), s("abcd"));
}

#[test]
fn hash_family_round_trip() {
    let store = Store::new();
    assert_eq!(run(&store, "hset", &[s("h"), s("f"), s("1")]), Datum::Int(1));
    assert_eq!(run(&store, "hset", &[s("h"), s("f"), s("2")]), Datum::Int(0));
    assert_eq!(run(&store, "hget", &[s("h"), s("f")]), s("2"));
    assert_eq!(
        run(&store, "hsetnx", &[s("h"), s("f"), s("3")]),
        Datum::Int(0)
    );
    assert_eq!(
        run(&store, "hsetnx", &[s("h"), s("g"), s("3")]),
        Datum::Int(1)
    );
    assert_eq!(run(&store, "hlen", &[s("h")]), Datum::Int(2));
    assert_eq!(
        run(&store, "hexists", &[s("h"), s("g")]),
        Datum::Int(1)
    );
    assert_eq!(
        run(&store, "hmget", &[s("h"), s("f"), s("nope"), s("g")]),
        Datum::List(vec![s("2"), Datum::Null, s("3")])
    );
    assert_eq!(run(&store, "hdel", &[s("h"), s("f"), s("nope")]), Datum::Int(1));
    assert_eq!(run(&store, "hget", &[s("h"), s("f")]), Datum::Null);

    run(&store, "hmset", &[s("h2"), s("a"), Datum::Int(1), s("b"), Datum::Int(2)]);
    let flat = match run(&store, "hgetall", &[s("h2")]) {
        Datum::List(items) => items,
        other => panic!("expected list, got {other:?}"),
    };
    assert_eq!(flat.len(), 4);
    let keys = members_of(run(&store, "hkeys", &[s("h2")]));
    assert_eq!(keys, HashSet::from([s("a"), s("b")]));
    let vals = members_of(run(&store, "hvals", &[s("h2")]));
    assert_eq!(vals, HashSet::from([Datum::Int(1), Datum::Int(2)]));
}

#[test]
fn list_push_pop_symmetry() {
    let store = Store::new();
    run(&store, "lpush", &[s("l"), s("v")]);
    assert_eq!(run(&store, "lpop", &[s("l")]), s("v"));
    run(&store, "rpush", &[s("l"), s("w")]);
    assert_eq!(run(&store, "rpop", &[s("l")]), s("w"));
    assert_eq!(run(&store, "lpop", &[s("l")]), Datum::Null);
    assert_eq!(run(&store, "lpop", &[s("missing")]), Datum::Null);
}

#[test]
fn list_positional_operations() {
    let store = Store::new();
    run(&store, "rpush", &[s("l"), s("a"), s("c")]);
    assert_eq!(
        run(&store, "linsert", &[s("l"), s("BEFORE"), s("c"), s("b")]),
        Datum::Int(3)
    );
    assert_eq!(
        run(&store, "linsert", &[s("l"), s("after"), s("zz"), s("x")]),
        Datum::Int(-1)
    );
    assert_eq!(run(&store, "lindex", &[s("l"), Datum::Int(-1)]), s("c"));
    run(&store, "lset", &[s("l"), Datum::Int(1), s("B")]);
    assert_eq!(run(&store, "lindex", &[s("l"), Datum::Int(1)]), s("B"));
    // Out-of-range positional insert appends.
    assert_eq!(
        run(&store, "linsertat", &[s("l"), Datum::Int(99), s("z")]),
        Datum::Int(4)
    );
    assert_eq!(run(&store, "lindex", &[s("l"), Datum::Int(-1)]), s("z"));
    assert_eq!(run(&store, "lremat", &[s("l"), Datum::Int(-1)]), s("z"));
    assert_eq!(run(&store, "lremat", &[s("l"), Datum::Int(99)]), Datum::Null);
    run(&store, "ltrim", &[s("l"), Datum::Int(1), Datum::Int(-1)]);
    assert_eq!(
        run(&store, "lrange", &[s("l"), Datum::Int(0), Datum::Int(-1)]),
        Datum::List(vec![s("B"), s("c")])
    );
    assert_eq!(
        store.execute("lset", &[s("missing"), Datum::Int(0), s("v")]),
        Err(CommandError::KeyNotFound)
    );
}

#[test]
fn set_algebra_invariants() {
    let store = Store::new();
    run(&store, "sadd", &[s("a"), s("1"), s("2"), s("3")]);
    run(&store, "sadd", &[s("b"), s("2"), s("3"), s("4")]);

    let union = members_of(run(&store, "sunion", &[s("a"), s("b")]));
    let inter = members_of(run(&store, "sinter", &[s("a"), s("b")]));
    let diff = members_of(run(&store, "sdiff", &[s("a"), s("b")]));
    let a = members_of(run(&store, "smembers", &[s("a")]));
    let b = members_of(run(&store, "smembers", &[s("b")]));

    assert!(a.is_subset(&union) && b.is_subset(&union));
    assert!(inter.is_subset(&a) && inter.is_subset(&b));
    assert!(diff.intersection(&b).next().is_none());
    assert_eq!(inter, HashSet::from([s("2"), s("3")]));
    assert_eq!(diff, HashSet::from([s("1")]));

    // Absent operands read as empty sets.
    assert_eq!(
        members_of(run(&store, "sdiff", &[s("a"), s("a")])),
        HashSet::new()
    );
    assert_eq!(members_of(run(&store, "sinter", &[s("missing")])), HashSet::new());
}

#[test]
fn srem_counts_only_present_members() {
    let store = Store::new();
    run(&store, "sadd", &[s("s"), s("a"), s("b")]);
    assert_eq!(
        run(&store, "srem", &[s("s"), s("a"), s("nope")]),
        Datum::Int(1)
    );
    assert_eq!(run(&store, "scard", &[s("s")]), Datum::Int(1));
    assert_eq!(run(&store, "sismember", &[s("s"), s("a")]), Datum::Int(0));
    assert_eq!(run(&store, "sismember", &[s("s"), s("b")]), Datum::Int(1));
}

#[test]
fn spop_and_srandmember_shapes() {
    let store = Store::new();
    run(&store, "sadd", &[s("s"), s("a"), s("b"), s("c")]);

    // Peek: distinct draws capped by cardinality, repeating draws exact.
    match run(&store, "srandmember", &[s("s"), Datum::Int(10)]) {
        Datum::List(items) => assert_eq!(items.len(), 3),
        other => panic!("expected list, got {other:?}"),
    }
    match run(&store, "srandmember", &[s("s"), Datum::Int(-5)]) {
        Datum::List(items) => assert_eq!(items.len(), 5),
        other => panic!("expected list, got {other:?}"),
    }
    // A zero count is a single-member peek, not an empty list.
    assert_ne!(run(&store, "srandmember", &[s("s"), Datum::Int(0)]), Datum::Null);
    assert_eq!(run(&store, "scard", &[s("s")]), Datum::Int(3));

    match run(&store, "spop", &[s("s"), Datum::Int(2)]) {
        Datum::List(items) => assert_eq!(items.len(), 2),
        other => panic!("expected list, got {other:?}"),
    }
    assert_eq!(run(&store, "scard", &[s("s")]), Datum::Int(1));
    assert_ne!(run(&store, "spop", &[s("s")]), Datum::Null);
    assert_eq!(run(&store, "spop", &[s("s")]), Datum::Null);
}

#[test]
fn error_taxonomy() {
    let store = Store::new();
    assert_eq!(
        store.execute("zadd", &[s("k"), s("m")]),
        Err(CommandError::UnsupportedCommand("zadd".to_owned()))
    );
    assert_eq!(
        store.execute("get", &[]),
        Err(CommandError::Arity("get".to_owned()))
    );
    assert_eq!(
        store.execute("set", &[s("k")]),
        Err(CommandError::Arity("set".to_owned()))
    );
    assert_eq!(
        store.execute("mset", &[s("k"), s("v"), s("odd")]),
        Err(CommandError::Arity("mset".to_owned()))
    );
    assert_eq!(
        store.execute("incrby", &[s("k"), s("many")]),
        Err(CommandError::NotInteger)
    );
    assert_eq!(
        store.execute("linsert", &[s("k"), s("sideways"), s("p"), s("v")]),
        Err(CommandError::InvalidArgument("expected BEFORE or AFTER"))
    );
}

#[test]
fn per_key_mutation_is_linearizable() {
    let store = Store::new();
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    store
                        .execute("incr", &[Datum::from("ctr")])
                        .expect("incr should not fail");
                }
            })
        })
        .collect();
    for t in threads {
        t.join().expect("worker should not panic");
    }
    assert_eq!(
        store.execute("get", &[Datum::from("ctr")]),
        Ok(Datum::Int(4000))
    );
}
