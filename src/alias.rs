//! Friendly names for OMRON sensors.
//!
//! A 2JCIE-BU01 is identified by the BLE address it advertises from. Aliases
//! given with `--alias ADDRESS=NAME` replace that address in the `name` tag of
//! every output line; devices without an alias are named by their address.

use std::collections::BTreeMap;

/// Device id to display name.
pub type AliasMap = BTreeMap<String, String>;

/// One `--alias` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Device id as reported by the source, e.g. `"C7:21:9A:04:3E:10"`
    pub address: String,
    /// Name written to output, e.g. `"Server room"`
    pub name: String,
}

/// Parse an `ADDRESS=NAME` pair. Whitespace around either side is dropped and
/// both sides must be non-empty. The name may itself contain `=`.
///
/// # Example
/// ```
/// use omron_sensor_listener::alias::parse_alias;
///
/// let alias = parse_alias("C7:21:9A:04:3E:10 = Server room").unwrap();
/// assert_eq!(alias.address, "C7:21:9A:04:3E:10");
/// assert_eq!(alias.name, "Server room");
/// ```
pub fn parse_alias(src: &str) -> Result<Alias, String> {
    let Some((address, name)) = src.split_once('=') else {
        return Err(format!("invalid alias '{src}': expected ADDRESS=NAME"));
    };

    let (address, name) = (address.trim(), name.trim());
    if address.is_empty() || name.is_empty() {
        return Err(format!("invalid alias '{src}': address and name must not be empty"));
    }

    Ok(Alias {
        address: address.to_string(),
        name: name.to_string(),
    })
}

/// Collect aliases into a lookup map. A later alias for the same device wins.
pub fn to_map(aliases: &[Alias]) -> AliasMap {
    aliases
        .iter()
        .map(|alias| (alias.address.clone(), alias.name.clone()))
        .collect()
}

/// Display name of a device: its alias, or the device id itself.
pub fn resolve_name<'a>(device_id: &'a str, aliases: &'a AliasMap) -> &'a str {
    aliases.get(device_id).map_or(device_id, String::as_str)
}
