use std::collections::HashSet;

use kvgate_common::Datum;

use super::{at_least, exact, int_of, key_of, Command};
use crate::error::CommandError;
use crate::store::Store;
use crate::value::ValueKind;

pub(super) fn sadd(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    at_least(Command::SAdd, args, 2)?;
    let cell = store.ensure(key_of(args, 0)?, ValueKind::Set)?;
    let added = cell.with_value(|v| {
        args[1..]
            .iter()
            .filter(|m| v.sadd((*m).clone()))
            .count() as i64
    });
    Ok(Datum::Int(added))
}

pub(super) fn srem(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    at_least(Command::SRem, args, 2)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Set)? {
        Some(cell) => {
            let removed =
                cell.with_value(|v| args[1..].iter().filter(|m| v.srem(m)).count() as i64);
            Ok(Datum::Int(removed))
        }
        None => Ok(Datum::Int(0)),
    }
}

pub(super) fn scard(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::SCard, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Set)? {
        Some(cell) => Ok(Datum::Int(cell.with_value(|v| v.scard()))),
        None => Ok(Datum::Int(0)),
    }
}

pub(super) fn sismember(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::SIsMember, args, 2)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Set)? {
        Some(cell) => {
            let present = cell.with_value(|v| v.sismember(&args[1]));
            Ok(Datum::Int(i64::from(present)))
        }
        None => Ok(Datum::Int(0)),
    }
}

pub(super) fn smembers(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    exact(Command::SMembers, args, 1)?;
    match store.read_entry(key_of(args, 0)?, ValueKind::Set)? {
        Some(cell) => Ok(Datum::List(cell.with_value(|v| v.smembers()))),
        None => Ok(Datum::List(Vec::new())),
    }
}

/// `SPOP key` removes one member and returns it as a scalar; `SPOP key n`
/// removes up to n members and returns them as a list.
pub(super) fn spop(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    if args.len() != 1 && args.len() != 2 {
        return Err(CommandError::Arity(Command::SPop.to_string()));
    }
    let cell = store.read_entry(key_of(args, 0)?, ValueKind::Set)?;
    if args.len() == 1 {
        return Ok(match cell {
            Some(cell) => cell.with_value(|v| v.spop_one()),
            None => Datum::Null,
        });
    }
    let n = int_of(args, 1)?;
    let n = usize::try_from(n).map_err(|_| CommandError::NotInteger)?;
    Ok(Datum::List(match cell {
        Some(cell) => cell.with_value(|v| v.spop_many(n)),
        None => Vec::new(),
    }))
}

/// SRANDMEMBER peeks: a positive count draws up to n distinct members, a
/// negative count draws exactly |n| possibly-repeating members, and a count
/// of zero (or no count) yields one member as a scalar.
pub(super) fn srand_member(store: &Store, args: &[Datum]) -> Result<Datum, CommandError> {
    if args.len() != 1 && args.len() != 2 {
        return Err(CommandError::Arity(Command::SRandMember.to_string()));
    }
    let cell = store.read_entry(key_of(args, 0)?, ValueKind::Set)?;
    let n = if args.len() == 2 { int_of(args, 1)? } else { 0 };
    if n == 0 {
        return Ok(match cell {
            Some(cell) => cell.with_value(|v| v.srand_one()),
            None => Datum::Null,
        });
    }
    let (count, repeating) = if n > 0 {
        (n as usize, false)
    } else {
        (n.unsigned_abs() as usize, true)
    };
    Ok(Datum::List(match cell {
        Some(cell) => cell.with_value(|v| v.srand_many(count, repeating)),
        None => Vec::new(),
    }))
}

/// SDIFF / SINTER / SUNION: left-to-right fold over the operand snapshots,
/// returned as a list. Operands are snapshotted one at a time; a concurrent
/// mutation of a later operand may or may not be observed.
pub(super) fn fold(store: &Store, args: &[Datum], cmd: Command) -> Result<Datum, CommandError> {
    at_least(cmd, args, 1)?;
    let members = fold_operands(store, args, cmd)?;
    Ok(Datum::List(members.into_iter().collect()))
}

/// The *STORE variants replace (or create) the destination with the fold
/// result, reassigning its variant if needed, and return the cardinality.
pub(super) fn fold_store(
    store: &Store,
    args: &[Datum],
    cmd: Command,
) -> Result<Datum, CommandError> {
    at_least(cmd, args, 2)?;
    let dest = key_of(args, 0)?;
    let members = fold_operands(store, &args[1..], cmd)?;
    let card = members.len() as i64;
    store.replace_set(dest, members);
    Ok(Datum::Int(card))
}

fn fold_operands(
    store: &Store,
    operands: &[Datum],
    cmd: Command,
) -> Result<HashSet<Datum>, CommandError> {
    let mut acc = store.set_snapshot(key_of(operands, 0)?)?;
    for i in 1..operands.len() {
        let other = store.set_snapshot(key_of(operands, i)?)?;
        acc = match cmd {
            Command::SDiff | Command::SDiffStore => acc.difference(&other).cloned().collect(),
            Command::SInter | Command::SInterStore => acc.intersection(&other).cloned().collect(),
            _ => acc.union(&other).cloned().collect(),
        };
    }
    Ok(acc)
}
