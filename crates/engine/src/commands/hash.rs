use kvgate_common::Datum;

use super::{at_least, exact, field_of, key_of, ok, Command};
use crate::error::CommandError;
use crate::store::Store;
use crate::value::ValueKind;

pub(super) fn hget(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::HGet, args, 2)?;
    let field = field_of(args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Map)? {
        Some(cell) => Ok(cell.with_value(|v| v.hget(field))),
        None => Ok(Datum::Null),
    }
}

/// Canonical return: 1 when the field is new, 0 when an existing field was
/// overwritten.
pub(super) fn hset(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::HSet, args, 3)?;
    let field = field_of(args, 1)?;
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Map)?;
    let existed = cell.with_value(|v| v.hset(field, args[2].clone()));
    Ok(Datum::Int(i64::from(!existed)))
}

pub(super) fn hset_nx(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::HSetNx, args, 3)?;
    let field = field_of(args, 1)?;
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Map)?;
    let wrote = cell.with_value(|v| v.hset_nx(field, args[2].clone()));
    Ok(Datum::Int(i64::from(wrote)))
}

pub(super) fn hdel(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    at_least(Command::HDel, args, 2)?;
    let Some(cell) = store.read_entry(key_of(args, 0)?, ValueKind::Map)? else {
        return Ok(Datum::Int(0));
    };
    let mut removed = 0;
    for i in 1..args.len() {
        let field = field_of(args, i)?;
        if cell.with_value(|v| v.hdel(field)) {
            removed += 1;
        }
    }
    Ok(Datum::Int(removed))
}

pub(super) fn hmget(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    at_least(Command::HMGet, args, 2)?;
    let cell = store.read_entry(key_of(args, 0)?, ValueKind::Map)?;
    let mut out = Vec::with_capacity(args.len() - 1);
    for i in 1..args.len() {
        let field = field_of(args, i)?;
        out.push(match &cell {
            Some(cell) => cell.with_value(|v| v.hget(field)),
            None => Datum::Null,
        });
    }
    Ok(Datum::List(out))
}

pub(super) fn hmset(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    at_least(Command::HMSet, args, 3)?;
    if args.len() % 2 == 0 {
        return Err(CommandError::Arity(Command::HMSet.to_string()));
    }
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Map)?;
    for pair in args[1..].chunks(2) {
        let field = pair[0]
            .as_str()
            .ok_or(CommandError::InvalidArgument("field must be a string"))?;
        cell.with_value(|v| v.hset(field, pair[1].clone()));
    }
    Ok(ok())
}

pub(super) fn hgetall(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::HGetAll, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Map)? {
        Some(cell) => Ok(Datum::List(cell.with_value(|v| v.hgetall()))),
        None => Ok(Datum::List(Vec::new())),
    }
}

pub(super) fn hexists(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::HExists, args, 2)?;
    let field = field_of(args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Map)? {
        Some(cell) => {
            let present = cell.with_value(|v| v.hexists(field));
            Ok(Datum::Int(i64::from(present)))
        }
        None => Ok(Datum::Int(0)),
    }
}

pub(super) fn hkeys(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::HKeys, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Map)? {
        Some(cell) => Ok(Datum::List(cell.with_value(|v| v.hkeys()))),
        None => Ok(Datum::List(Vec::new())),
    }
}

pub(super) fn hvals(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::HVals, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Map)? {
        Some(cell) => Ok(Datum::List(cell.with_value(|v| v.hvals()))),
        None => Ok(Datum::List(Vec::new())),
    }
}

pub(super) fn hlen(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::HLen, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Map)? {
        Some(cell) => Ok(Datum::Int(cell.with_value(|v| v.hlen()))),
        None => Ok(Datum::Int(0)),
    }
}
