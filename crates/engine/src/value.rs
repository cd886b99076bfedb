use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

use kvgate_common::{monotonic_ns, Datum};
use rand::seq::IteratorRandom;

/// Variant tag. Fixed at the moment a key is first created; the store
/// consults it before dispatching any capability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Scalar,
    Map,
    List,
    Set,
}

/// One key's payload. Capability methods invoked on the wrong variant return
/// their sentinel (`Null`, `false`, `-1` or an empty sequence) instead of
/// panicking; the store's tag check is the contract, the sentinel is the
/// safety net.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(Datum),
    Map(HashMap<String, Datum>),
    List(VecDeque<Datum>),
    Set(HashSet<Datum>),
}

impl Value {
    pub fn empty(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Scalar => Value::Scalar(Datum::Null),
            ValueKind::Map => Value::Map(HashMap::new()),
            ValueKind::List => Value::List(VecDeque::new()),
            ValueKind::Set => Value::Set(HashSet::new()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Map(_) => ValueKind::Map,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
        }
    }

    // ---- scalar ----

    pub fn get(&self) -> Datum {
        match self {
            Value::Scalar(d) => d.clone(),
            _ => Datum::Null,
        }
    }

    pub fn set(&mut self, d: Datum) {
        if let Value::Scalar(slot) = self {
            *slot = d;
        }
    }

    /// Read-then-replace in one step; returns the prior payload.
    pub fn replace(&mut self, d: Datum) -> Datum {
        match self {
            Value::Scalar(slot) => std::mem::replace(slot, d),
            _ => Datum::Null,
        }
    }

    /// Adds `delta` on two tracks: a string payload is parsed as base-10
    /// (unparseable counts as 0) and written back as a string, anything else
    /// is treated as an integer and stays one. Returns the written payload.
    pub fn incr(&mut self, delta: i64) -> Datum {
        let Value::Scalar(slot) = self else {
            return Datum::Null;
        };
        let next = match slot {
            Datum::Str(s) => {
                let cur: i64 = s.trim().parse().unwrap_or(0);
                Datum::Str((cur.wrapping_add(delta)).to_string())
            }
            Datum::Int(n) => Datum::Int(n.wrapping_add(delta)),
            _ => Datum::Int(delta),
        };
        *slot = next.clone();
        next
    }

    /// Appends to the string form of the payload; the payload is a string
    /// afterwards. Returns the new length.
    pub fn append(&mut self, tail: &str) -> i64 {
        let Value::Scalar(slot) = self else {
            return -1;
        };
        let mut s = slot.coerce_string();
        s.push_str(tail);
        let len = s.len() as i64;
        *slot = Datum::Str(s);
        len
    }

    /// Length of a string payload; any other scalar payload reports 0.
    pub fn str_len(&self) -> i64 {
        match self {
            Value::Scalar(Datum::Str(s)) => s.len() as i64,
            Value::Scalar(_) => 0,
            _ => -1,
        }
    }

    // ---- map ----

    /// Returns whether the field already existed.
    pub fn hset(&mut self, field: &str, val: Datum) -> bool {
        match self {
            Value::Map(m) => m.insert(field.to_owned(), val).is_some(),
            _ => false,
        }
    }

    /// Sets only when the field is absent; returns whether it was set.
    pub fn hset_nx(&mut self, field: &str, val: Datum) -> bool {
        match self {
            Value::Map(m) => {
                if m.contains_key(field) {
                    false
                } else {
                    m.insert(field.to_owned(), val);
                    true
                }
            }
            _ => false,
        }
    }

    pub fn hget(&self, field: &str) -> Datum {
        match self {
            Value::Map(m) => m.get(field).cloned().unwrap_or(Datum::Null),
            _ => Datum::Null,
        }
    }

    /// Returns whether something was removed.
    pub fn hdel(&mut self, field: &str) -> bool {
        match self {
            Value::Map(m) => m.remove(field).is_some(),
            _ => false,
        }
    }

    pub fn hexists(&self, field: &str) -> bool {
        match self {
            Value::Map(m) => m.contains_key(field),
            _ => false,
        }
    }

    pub fn hkeys(&self) -> Vec<Datum> {
        match self {
            Value::Map(m) => m.keys().cloned().map(Datum::Str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn hvals(&self) -> Vec<Datum> {
        match self {
            Value::Map(m) => m.values().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Interleaved key, value, key, value...
    pub fn hgetall(&self) -> Vec<Datum> {
        match self {
            Value::Map(m) => {
                let mut out = Vec::with_capacity(m.len() * 2);
                for (k, v) in m {
                    out.push(Datum::Str(k.clone()));
                    out.push(v.clone());
                }
                out
            }
            _ => Vec::new(),
        }
    }

    pub fn hlen(&self) -> i64 {
        match self {
            Value::Map(m) => m.len() as i64,
            _ => -1,
        }
    }

    // ---- list ----

    pub fn llen(&self) -> i64 {
        match self {
            Value::List(items) => items.len() as i64,
            _ => -1,
        }
    }

    pub fn lindex(&self, index: i64) -> Datum {
        match self {
            Value::List(items) => match abs_index(index, items.len()) {
                Some(i) => items[i].clone(),
                None => Datum::Null,
            },
            _ => Datum::Null,
        }
    }

    /// In-range (after signed resolution) overwrites; out of range appends.
    pub fn lset(&mut self, index: i64, val: Datum) {
        if let Value::List(items) = self {
            match abs_index(index, items.len()) {
                Some(i) => items[i] = val,
                None => items.push_back(val),
            }
        }
    }

    pub fn lpush(&mut self, val: Datum) -> i64 {
        match self {
            Value::List(items) => {
                items.push_front(val);
                items.len() as i64
            }
            _ => -1,
        }
    }

    pub fn rpush(&mut self, val: Datum) -> i64 {
        match self {
            Value::List(items) => {
                items.push_back(val);
                items.len() as i64
            }
            _ => -1,
        }
    }

    pub fn lpop(&mut self) -> Datum {
        match self {
            Value::List(items) => items.pop_front().unwrap_or(Datum::Null),
            _ => Datum::Null,
        }
    }

    pub fn rpop(&mut self) -> Datum {
        match self {
            Value::List(items) => items.pop_back().unwrap_or(Datum::Null),
            _ => Datum::Null,
        }
    }

    /// Inserts relative to the first occurrence of `pivot`. Returns the new
    /// length, or -1 when the pivot is not present.
    pub fn linsert(&mut self, before: bool, pivot: &Datum, val: Datum) -> i64 {
        match self {
            Value::List(items) => match items.iter().position(|v| v == pivot) {
                Some(at) => {
                    items.insert(if before { at } else { at + 1 }, val);
                    items.len() as i64
                }
                None => -1,
            },
            _ => -1,
        }
    }

    /// Positional insert; an out-of-range index appends at the tail.
    pub fn linsert_at(&mut self, index: i64, val: Datum) -> i64 {
        match self {
            Value::List(items) => {
                match abs_index(index, items.len()) {
                    Some(i) => items.insert(i, val),
                    None => items.push_back(val),
                }
                items.len() as i64
            }
            _ => -1,
        }
    }

    /// Removes up to `|count|` occurrences of `needle`; positive counts scan
    /// head to tail, negative counts tail to head, zero removes every match.
    pub fn lrem(&mut self, count: i64, needle: &Datum) -> i64 {
        let Value::List(items) = self else {
            return -1;
        };
        let mut removed: i64 = 0;
        if count >= 0 {
            let limit = if count == 0 { i64::MAX } else { count };
            items.retain(|v| {
                if removed < limit && v == needle {
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        } else {
            let limit = count.checked_neg().unwrap_or(i64::MAX);
            let mut kept = VecDeque::with_capacity(items.len());
            for v in items.drain(..).rev() {
                if removed < limit && &v == needle {
                    removed += 1;
                } else {
                    kept.push_front(v);
                }
            }
            *items = kept;
        }
        removed
    }

    /// Removes the element at a signed index, returning it; `Null` when the
    /// index is out of range.
    pub fn lrem_at(&mut self, index: i64) -> Datum {
        match self {
            Value::List(items) => match abs_index(index, items.len()) {
                Some(i) => items.remove(i).unwrap_or(Datum::Null),
                None => Datum::Null,
            },
            _ => Datum::Null,
        }
    }

    /// Inclusive signed range, clamped.
    pub fn lrange(&self, start: i64, stop: i64) -> Vec<Datum> {
        match self {
            Value::List(items) => {
                let (s, e) = clamp_range(start, stop, items.len());
                items.iter().skip(s).take(e - s).cloned().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Keeps only the inclusive signed range.
    pub fn ltrim(&mut self, start: i64, stop: i64) {
        if let Value::List(items) = self {
            let (s, e) = clamp_range(start, stop, items.len());
            items.truncate(e);
            items.drain(..s.min(items.len()));
        }
    }

    // ---- set ----

    /// Returns whether the member was newly added.
    pub fn sadd(&mut self, member: Datum) -> bool {
        match self {
            Value::Set(s) => s.insert(member),
            _ => false,
        }
    }

    /// Returns whether the member was present and removed.
    pub fn srem(&mut self, member: &Datum) -> bool {
        match self {
            Value::Set(s) => s.remove(member),
            _ => false,
        }
    }

    pub fn scard(&self) -> i64 {
        match self {
            Value::Set(s) => s.len() as i64,
            _ => -1,
        }
    }

    pub fn sismember(&self, member: &Datum) -> bool {
        match self {
            Value::Set(s) => s.contains(member),
            _ => false,
        }
    }

    pub fn smembers(&self) -> Vec<Datum> {
        match self {
            Value::Set(s) => s.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Removes and returns one arbitrary member.
    pub fn spop_one(&mut self) -> Datum {
        let Value::Set(s) = self else {
            return Datum::Null;
        };
        let picked = s.iter().choose(&mut rand::thread_rng()).cloned();
        match picked {
            Some(m) => {
                s.remove(&m);
                m
            }
            None => Datum::Null,
        }
    }

    /// Removes and returns up to `n` arbitrary members.
    pub fn spop_many(&mut self, n: usize) -> Vec<Datum> {
        let Value::Set(s) = self else {
            return Vec::new();
        };
        let picked: Vec<Datum> = s.iter().cloned().choose_multiple(&mut rand::thread_rng(), n);
        for m in &picked {
            s.remove(m);
        }
        picked
    }

    /// Peeks one arbitrary member without removing it.
    pub fn srand_one(&self) -> Datum {
        match self {
            Value::Set(s) => s
                .iter()
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or(Datum::Null),
            _ => Datum::Null,
        }
    }

    /// Peeks without removal: up to `n` distinct members, or, with
    /// `repeating`, exactly `n` possibly-repeating draws.
    pub fn srand_many(&self, n: usize, repeating: bool) -> Vec<Datum> {
        let Value::Set(s) = self else {
            return Vec::new();
        };
        let mut rng = rand::thread_rng();
        if repeating {
            if s.is_empty() {
                return Vec::new();
            }
            (0..n)
                .filter_map(|_| s.iter().choose(&mut rng).cloned())
                .collect()
        } else {
            s.iter().cloned().choose_multiple(&mut rng, n)
        }
    }

    /// Clone of the member set, used by the multi-set fold operations. Each
    /// operand is snapshotted under its own lock; the fold itself runs
    /// without any lock held.
    pub fn set_snapshot(&self) -> HashSet<Datum> {
        match self {
            Value::Set(s) => s.clone(),
            _ => HashSet::new(),
        }
    }
}

/// Resolves a signed index against `len`; negative counts from the tail.
/// `None` when the resolved index falls outside `[0, len)`.
fn abs_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 {
        len.saturating_add(index)
    } else {
        index
    };
    (0..len).contains(&i).then_some(i as usize)
}

/// Converts an inclusive signed `[start, stop]` pair into a half-open
/// `[s, e)` interval clamped to `[0, len]`. A crossed pair yields an empty
/// interval.
fn clamp_range(start: i64, stop: i64, len: usize) -> (usize, usize) {
    let len = len as i64;
    let s = if start < 0 {
        len.saturating_add(start)
    } else {
        start
    }
    .clamp(0, len);
    let e = if stop < 0 {
        len.saturating_add(stop)
    } else {
        stop
    }
    .saturating_add(1)
    .clamp(s, len);
    (s as usize, e as usize)
}

/// One key's slot: the payload plus its expiry stamp, guarded by a single
/// mutex so every operation on the value is linearizable with respect to
/// other operations on the same value.
#[derive(Debug)]
pub struct Entry {
    slot: Mutex<Slot>,
}

#[derive(Debug)]
struct Slot {
    value: Value,
    /// Absolute monotonic nanoseconds; 0 means never expires.
    expire: i64,
}

impl Entry {
    pub fn new(kind: ValueKind) -> Entry {
        Entry::from_value(Value::empty(kind))
    }

    pub fn from_value(value: Value) -> Entry {
        Entry {
            slot: Mutex::new(Slot { value, expire: 0 }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_alive(&self) -> bool {
        let slot = self.lock();
        slot.expire == 0 || slot.expire > monotonic_ns()
    }

    pub fn kind(&self) -> ValueKind {
        self.lock().value.kind()
    }

    /// Runs `f` with the payload under the entry's lock.
    pub fn with_value<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.lock().value)
    }

    /// Runs `f` with both the payload and the expiry stamp under one
    /// critical section (needed by setex-style operations).
    pub fn with_slot<R>(&self, f: impl FnOnce(&mut Value, &mut i64) -> R) -> R {
        let mut slot = self.lock();
        let Slot { value, expire } = &mut *slot;
        f(value, expire)
    }

    /// Stamps the expiry; 0 clears it.
    pub fn set_life_cycle(&self, expire: i64) {
        self.lock().expire = expire;
    }
}
