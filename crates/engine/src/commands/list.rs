use kvgate_common::Datum;

use super::{at_least, exact, int_of, key_of, ok, Command};
use crate::error::CommandError;
use crate::store::Store;
use crate::value::ValueKind;

pub(super) fn llen(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LLen, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        Some(cell) => Ok(Datum::Int(cell.with_value(|v| v.llen()))),
        None => Ok(Datum::Int(0)),
    }
}

pub(super) fn lpop(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LPop, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        Some(cell) => Ok(cell.with_value(|v| v.lpop())),
        None => Ok(Datum::Null),
    }
}

pub(super) fn rpop(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::RPop, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        Some(cell) => Ok(cell.with_value(|v| v.rpop())),
        None => Ok(Datum::Null),
    }
}

/// LPUSH / RPUSH: pushes every argument in order, returns the final length.
pub(super) fn push(
    store: &Store,
    args: &[Datum],
    cmd: Command,
    front: bool,
) -> Result<Datum, CommandError> {
    at_least(cmd, args, 2)?;
    let cell = store.ensure(key_of(args, 0)?, ValueKind::List)?;
    let len = cell.with_value(|v| {
        let mut len = 0;
        for item in &args[1..] {
            len = if front {
                v.lpush(item.clone())
            } else {
                v.rpush(item.clone())
            };
        }
        len
    });
    Ok(Datum::Int(len))
}

pub(super) fn lset(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LSet, args, 3)?;
    let index = int_of(args, 1)?;
    let cell = store
        .read_entry(key_of(args, 0)?, ValueKind::List)?
        .ok_or(CommandError::KeyNotFound)?;
    cell.with_value(|v| v.lset(index, args[2].clone()));
    Ok(ok())
}

pub(super) fn linsert(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LInsert, args, 4)?;
    let before = match args[1].as_str().map(str::to_ascii_lowercase).as_deref() {
        Some("before") => true,
        Some("after") => false,
        _ => return Err(CommandError::InvalidArgument("expected BEFORE or AFTER")),
    };
    match store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        Some(cell) => {
            let len = cell.with_value(|v| v.linsert(before, &args[2], args[3].clone()));
            Ok(Datum::Int(len))
        }
        None => Ok(Datum::Int(0)),
    }
}

pub(super) fn linsert_at(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LInsertAt, args, 3)?;
    let index = int_of(args, 1)?;
    let cell = store
        .read_entry(key_of(args, 0)?, ValueKind::List)?
        .ok_or(CommandError::KeyNotFound)?;
    let len = cell.with_value(|v| v.linsert_at(index, args[2].clone()));
    Ok(Datum::Int(len))
}

pub(super) fn lindex(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LIndex, args, 2)?;
    let index = int_of(args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        Some(cell) => Ok(cell.with_value(|v| v.lindex(index))),
        None => Ok(Datum::Null),
    }
}

pub(super) fn lrem(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LRem, args, 3)?;
    let count = int_of(args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        Some(cell) => Ok(Datum::Int(cell.with_value(|v| v.lrem(count, &args[2])))),
        None => Ok(Datum::Int(0)),
    }
}

pub(super) fn lrem_at(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LRemAt, args, 2)?;
    let index = int_of(args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        Some(cell) => Ok(cell.with_value(|v| v.lrem_at(index))),
        None => Ok(Datum::Null),
    }
}

pub(super) fn lrange(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LRange, args, 3)?;
    let (start, stop) = (int_of(args, 1)?, int_of(args, 2)?);
    match store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        Some(cell) => Ok(Datum::List(cell.with_value(|v| v.lrange(start, stop)))),
        None => Ok(Datum::List(Vec::new())),
    }
}

pub(super) fn ltrim(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::LTrim, args, 3)?;
    let (start, stop) = (int_of(args, 1)?, int_of(args, 2)?);
    if let Some(cell) = store.read_entry(key_of(args, 0)?, ValueKind::List)? {
        cell.with_value(|v| v.ltrim(start, stop));
    }
    Ok(ok())
}
