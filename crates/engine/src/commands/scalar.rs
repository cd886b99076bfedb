use kvgate_common::{monotonic_ns, Datum};

use super::{at_least, exact, int_of, key_of, ok, Command};
use crate::error::CommandError;
use crate::store::Store;
use crate::value::ValueKind;

pub(super) fn get(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::Get, args, 1)?;
    let cell = store
        .read_entry(key_of(args, 0)?, ValueKind::Scalar)?
        .ok_or(CommandError::KeyNotFound)?;
    Ok(cell.with_value(|v| v.get()))
}

pub(super) fn set(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::Set, args, 2)?;
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Scalar)?;
    cell.with_value(|v| v.set(args[1].clone()));
    Ok(ok())
}

pub(super) fn set_nx(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::SetNx, args, 2)?;
    let wrote = store.set_if_absent(key_of(args, 0)?, args[1].clone())?;
    Ok(Datum::Int(i64::from(wrote)))
}

/// Sets the value, then stamps `expire = now + ttl`; the ttl argument is in
/// nanoseconds.
pub(super) fn set_ex(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::SetEx, args, 3)?;
    let ttl_ns = int_of(args, 1)?;
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Scalar)?;
    cell.with_slot(|v, expire| {
        v.set(args[2].clone());
        *expire = monotonic_ns().saturating_add(ttl_ns);
    });
    Ok(ok())
}

/// Atomic read-then-replace under the entry's single critical section.
pub(super) fn get_set(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::GetSet, args, 2)?;
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Scalar)?;
    Ok(cell.with_value(|v| v.replace(args[1].clone())))
}

pub(super) fn str_len(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::StrLen, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Scalar)? {
        Some(cell) => Ok(Datum::Int(cell.with_value(|v| v.str_len()))),
        None => Ok(Datum::Int(0)),
    }
}

pub(super) fn incr_by(
    store: &Store,
    args: &[Datum],
    cmd: Command,
    sign: i64,
) -> Result<Datum, CommandError> {
    let delta = match cmd {
        Command::Incr | Command::Decr => {
            exact(cmd, args, 1)?;
            sign
        }
        _ => {
            exact(cmd, args, 2)?;
            sign.wrapping_mul(int_of(args, 1)?)
        }
    };
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Scalar)?;
    Ok(cell.with_value(|v| v.incr(delta)))
}

pub(super) fn append(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::Append, args, 2)?;
    let tail = args[1].coerce_string();
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Scalar)?;
    Ok(Datum::Int(cell.with_value(|v| v.append(&tail))))
}

/// Canonical contract: counts the keys that actually existed (live) and were
/// removed.
pub(super) fn del(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    at_least(Command::Del, args, 1)?;
    let mut removed = 0;
    for i in 0..args.len() {
        if store.remove(key_of(args, i)?) {
            removed += 1;
        }
    }
    Ok(Datum::Int(removed))
}

/// Multi-key read; absent, dead and non-scalar keys yield `Null` holes.
pub(super) fn mget(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    at_least(Command::MGet, args, 1)?;
    let mut out = Vec::with_capacity(args.len());
    for i in 0..args.len() {
        let datum = match store.live_entry(key_of(args, i)?) {
            Some(cell) if cell.kind() == ValueKind::Scalar => cell.with_value(|v| v.get()),
            _ => Datum::Null,
        };
        out.push(datum);
    }
    Ok(Datum::List(out))
}

pub(super) fn mset(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    at_least(Command::MSet, args, 2)?;
    if args.len() % 2 != 0 {
        return Err(CommandError::Arity(Command::MSet.to_string()));
    }
    for pair in args.chunks(2) {
        let key = pair[0]
            .as_str()
            .ok_or(CommandError::InvalidArgument("key must be a string"))?;
        let cell = store.ensure(key, ValueKind::Scalar)?;
        cell.with_value(|v| v.set(pair[1].clone()));
    }
    Ok(ok())
}
