// Licensed under the Apache-2.0 license

//! Parsers for the values a user types in: addresses, sizes, versions and
//! strategy names. They double as `clap` value parsers.

use crate::ParseError;
use ota_partition::{FirmwareVersion, RegionSize, UpdateStrategy};

const MAX_HEX_DIGITS: usize = 8;

/// Parses a `0x`-prefixed hexadecimal flash address.
///
/// Every character after the prefix must be a hex digit; leading zeros are
/// allowed as long as the value fits in 32 bits.
pub fn parse_hex_address(input: &str) -> Result<u32, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyAddress);
    }
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ParseError::MissingHexPrefix(input.to_string()))?;
    if digits.is_empty() {
        return Err(ParseError::MissingHexDigits(input.to_string()));
    }
    if let Some(ch) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidHexDigit {
            input: input.to_string(),
            ch,
        });
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > MAX_HEX_DIGITS {
        return Err(ParseError::AddressTooLarge(input.to_string()));
    }
    if significant.is_empty() {
        return Ok(0);
    }
    u32::from_str_radix(significant, 16).map_err(|_| ParseError::AddressTooLarge(input.to_string()))
}

/// Parses a region size: a plain byte count (`4096`) or kilobytes with a
/// `K`/`KB` suffix (`256K`, `256kb`).
pub fn parse_region_size(input: &str) -> Result<RegionSize, ParseError> {
    let invalid = || ParseError::InvalidSize(input.to_string());
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (number, kilobytes) = match upper
        .strip_suffix("KB")
        .or_else(|| upper.strip_suffix('K'))
    {
        Some(number) => (number.trim_end(), true),
        None => (upper.strip_suffix('B').unwrap_or(&upper).trim_end(), false),
    };
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let magnitude = number.parse::<u32>().map_err(|_| invalid())?;
    Ok(if kilobytes {
        RegionSize::kilobytes(magnitude)
    } else {
        RegionSize::bytes(magnitude)
    })
}

/// Parses `MAJOR.MINOR`.
pub fn parse_version(input: &str) -> Result<FirmwareVersion, ParseError> {
    let invalid = || ParseError::InvalidVersion(input.to_string());
    let (major, minor) = input.trim().split_once('.').ok_or_else(invalid)?;
    let component = |s: &str| {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse::<u8>().map_err(|_| invalid())
    };
    Ok(FirmwareVersion::new(component(major)?, component(minor)?))
}

pub fn parse_strategy(input: &str) -> Result<UpdateStrategy, ParseError> {
    match input.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "in-position" | "inposition" => Ok(UpdateStrategy::InPosition),
        "ping-pong" | "pingpong" => Ok(UpdateStrategy::PingPong),
        _ => Err(ParseError::UnknownStrategy(input.to_string())),
    }
}
