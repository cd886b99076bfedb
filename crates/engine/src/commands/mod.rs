mod hash;
mod list;
mod scalar;
mod set;

use std::str::FromStr;

use kvgate_common::Datum;
use strum::{Display, EnumString};

use crate::error::CommandError;
use crate::store::Store;

/// The full command surface of the in-process engine. Parsing is ASCII
/// case-insensitive, which is where command names get case-folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Command {
    // scalar
    Get,
    Set,
    SetNx,
    SetEx,
    GetSet,
    StrLen,
    Incr,
    IncrBy,
    Decr,
    DecrBy,
    Append,
    Del,
    MGet,
    MSet,
    // map
    HGet,
    HSet,
    HSetNx,
    HDel,
    HMGet,
    HMSet,
    HGetAll,
    HExists,
    HKeys,
    HVals,
    HLen,
    // list
    LLen,
    LPop,
    RPop,
    LPush,
    RPush,
    LSet,
    LInsert,
    LInsertAt,
    LIndex,
    LRem,
    LRemAt,
    LRange,
    LTrim,
    // set
    SAdd,
    SCard,
    SDiff,
    SDiffStore,
    SInter,
    SInterStore,
    SIsMember,
    SMembers,
    SPop,
    SRandMember,
    SRem,
    SUnion,
    SUnionStore,
}

pub(crate) fn execute(store: &Store, raw: &str, args: &[Datum]) -> Result<Datum, CommandError> {
    let cmd = Command::from_str(raw.trim())
        .map_err(|_| CommandError::UnsupportedCommand(raw.to_owned()))?;
    match cmd {
        Command::Get => scalar::get(store, args),
        Command::Set => scalar::set(store, args),
        Command::SetNx => scalar::set_nx(store, args),
        Command::SetEx => scalar::set_ex(store, args),
        Command::GetSet => scalar::get_set(store, args),
        Command::StrLen => scalar::str_len(store, args),
        Command::Incr => scalar::incr_by(store, args, cmd, 1),
        Command::IncrBy => scalar::incr_by(store, args, cmd, 1),
        Command::Decr => scalar::incr_by(store, args, cmd, -1),
        Command::DecrBy => scalar::incr_by(store, args, cmd, -1),
        Command::Append => scalar::append(store, args),
        Command::Del => scalar::del(store, args),
        Command::MGet => scalar::mget(store, args),
        Command::MSet => scalar::mset(store, args),

        Command::HGet => hash::hget(store, args),
        Command::HSet => hash::hset(store, args),
        Command::HSetNx => hash::hset_nx(store, args),
        Command::HDel => hash::hdel(store, args),
        Command::HMGet => hash::hmget(store, args),
        Command::HMSet => hash::hmset(store, args),
        Command::HGetAll => hash::hgetall(store, args),
        Command::HExists => hash::hexists(store, args),
        Command::HKeys => hash::hkeys(store, args),
        Command::HVals => hash::hvals(store, args),
        Command::HLen => hash::hlen(store, args),

        Command::LLen => list::llen(store, args),
        Command::LPop => list::lpop(store, args),
        Command::RPop => list::rpop(store, args),
        Command::LPush => list::push(store, args, cmd, true),
        Command::RPush => list::push(store, args, cmd, false),
        Command::LSet => list::lset(store, args),
        Command::LInsert => list::linsert(store, args),
        Command::LInsertAt => list::linsert_at(store, args),
        Command::LIndex => list::lindex(store, args),
        Command::LRem => list::lrem(store, args),
        Command::LRemAt => list::lrem_at(store, args),
        Command::LRange => list::lrange(store, args),
        Command::LTrim => list::ltrim(store, args),

        Command::SAdd => set::sadd(store, args),
        Command::SCard => set::scard(store, args),
        Command::SDiff => set::fold(store, args, cmd),
        Command::SInter => set::fold(store, args, cmd),
        Command::SUnion => set::fold(store, args, cmd),
        Command::SDiffStore => set::fold_store(store, args, cmd),
        Command::SInterStore => set::fold_store(store, args, cmd),
        Command::SUnionStore => set::fold_store(store, args, cmd),
        Command::SIsMember => set::sismember(store, args),
        Command::SMembers => set::smembers(store, args),
        Command::SPop => set::spop(store, args),
        Command::SRandMember => set::srand_member(store, args),
        Command::SRem => set::srem(store, args),
    }
}

// ---- shared argument plumbing ----

pub(crate) fn exact(cmd: Command, args: &[Datum], n: usize) -> Result<(), CommandError> {
    if args.len() == n {
        Ok(())
    } else {
        Err(CommandError::Arity(cmd.to_string()))
    }
}

pub(crate) fn at_least(cmd: Command, args: &[Datum], n: usize) -> Result<(), CommandError> {
    if args.len() >= n {
        Ok(())
    } else {
        Err(CommandError::Arity(cmd.to_string()))
    }
}

pub(crate) fn key_of(args: &[Datum], i: usize) -> Result<&str, CommandError> {
    args.get(i)
        .and_then(Datum::as_str)
        .ok_or(CommandError::InvalidArgument("key must be a string"))
}

pub(crate) fn field_of(args: &[Datum], i: usize) -> Result<&str, CommandError> {
    args.get(i)
        .and_then(Datum::as_str)
        .ok_or(CommandError::InvalidArgument("field must be a string"))
}

pub(crate) fn int_of(args: &[Datum], i: usize) -> Result<i64, CommandError> {
    args.get(i)
        .and_then(Datum::as_int)
        .ok_or(CommandError::NotInteger)
}

pub(crate) const OK: &str = "OK";

pub(crate) fn ok() -> Datum {
    Datum::Str(OK.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(Command::from_str("GET"), Ok(Command::Get));
        assert_eq!(Command::from_str("sDiffStore"), Ok(Command::SDiffStore));
        assert_eq!(Command::from_str("linsertat"), Ok(Command::LInsertAt));
        assert!(Command::from_str("zadd").is_err());
    }

    #[test]
    fn display_is_the_lowercase_wire_name() {
        assert_eq!(Command::SRandMember.to_string(), "srandmember");
        assert_eq!(Command::HGetAll.to_string(), "hgetall");
    }
}
