//! The capability catalogue: vendor command sets, timeouts, error patterns
//! and version-output parsing rules. Purely data-driven; nothing in this
//! module touches the network.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A vendor/family identifier used as the key into the capability catalogue.
/// Unknown or unset device types resolve to [`DeviceType::Default`], which
/// carries the fallback profile every lookup function uses when a
/// vendor-specific entry is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    CiscoIos,
    CiscoXr,
    CiscoNxos,
    CiscoAsa,
    AristaEos,
    JuniperJunos,
    PaloAltoPanos,
    F5Tmsh,
    Default,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::CiscoIos => "cisco_ios",
            DeviceType::CiscoXr => "cisco_xr",
            DeviceType::CiscoNxos => "cisco_nxos",
            DeviceType::CiscoAsa => "cisco_asa",
            DeviceType::AristaEos => "arista_eos",
            DeviceType::JuniperJunos => "juniper_junos",
            DeviceType::PaloAltoPanos => "paloalto_panos",
            DeviceType::F5Tmsh => "f5_tmsh",
            DeviceType::Default => "default",
        }
    }

    pub fn all() -> &'static [DeviceType] {
        &[
            DeviceType::CiscoIos,
            DeviceType::CiscoXr,
            DeviceType::CiscoNxos,
            DeviceType::CiscoAsa,
            DeviceType::AristaEos,
            DeviceType::JuniperJunos,
            DeviceType::PaloAltoPanos,
            DeviceType::F5Tmsh,
        ]
    }
}

impl FromStr for DeviceType {
    type Err = std::convert::Infallible;

    /// Unrecognized strings fall back to [`DeviceType::Default`] rather than
    /// erroring: the catalogue is explicitly designed to degrade gracefully
    /// for an unset or unknown device type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "cisco_ios" => DeviceType::CiscoIos,
            "cisco_xr" => DeviceType::CiscoXr,
            "cisco_nxos" => DeviceType::CiscoNxos,
            "cisco_asa" => DeviceType::CiscoAsa,
            "arista_eos" => DeviceType::AristaEos,
            "juniper_junos" => DeviceType::JuniperJunos,
            "paloalto_panos" => DeviceType::PaloAltoPanos,
            "f5_tmsh" => DeviceType::F5Tmsh,
            _ => DeviceType::Default,
        })
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static capability flags for a device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilityFlags {
    pub requires_enable: bool,
    pub supports_paging_control: bool,
    pub supports_inventory: bool,
    pub supports_config_replace: bool,
    pub supports_file_transfer: bool,
    pub requires_cli_mode: bool,
}

/// Parsed identifying metadata extracted from version output.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ParsedCapabilities {
    pub model: Option<String>,
    pub version: Option<String>,
    pub serial: Option<String>,
    pub hardware: Option<String>,
    pub platform_subtype: Option<String>,
    #[serde(flatten)]
    pub flags: FlagsDto,
}

/// Serializable mirror of [`CapabilityFlags`] so it can be embedded in
/// [`ParsedCapabilities`] without fighting serde's flatten rules on a plain
/// bool-only struct deriving both Copy and Serialize in two places.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FlagsDto {
    pub requires_enable: bool,
    pub supports_paging_control: bool,
    pub supports_inventory: bool,
    pub supports_config_replace: bool,
    pub supports_file_transfer: bool,
    pub requires_cli_mode: bool,
}

impl From<CapabilityFlags> for FlagsDto {
    fn from(f: CapabilityFlags) -> Self {
        Self {
            requires_enable: f.requires_enable,
            supports_paging_control: f.supports_paging_control,
            supports_inventory: f.supports_inventory,
            supports_config_replace: f.supports_config_replace,
            supports_file_transfer: f.supports_file_transfer,
            requires_cli_mode: f.requires_cli_mode,
        }
    }
}

/// Logical command keys looked up in [`command`]/[`commands_for`].
pub const KEY_SHOW_RUNNING: &str = "show_running";
pub const KEY_SHOW_VERSION: &str = "show_version";
pub const KEY_SAVE_CONFIG: &str = "save_config";
pub const KEY_ENABLE_PAGING: &str = "enable_paging";
pub const KEY_SHOW_INVENTORY: &str = "show_inventory";
pub const KEY_ENTER_ENABLE: &str = "enter_enable";
pub const KEY_ENTER_CLI: &str = "enter_cli";

lazy_static! {
    static ref COMMAND_VARIATIONS: HashMap<DeviceType, HashMap<&'static str, &'static str>> = {
        let mut m = HashMap::new();

        let mut cisco_ios = HashMap::new();
        cisco_ios.insert(KEY_SHOW_RUNNING, "show running-config");
        cisco_ios.insert(KEY_SHOW_VERSION, "show version");
        cisco_ios.insert(KEY_SAVE_CONFIG, "write memory");
        cisco_ios.insert(KEY_ENABLE_PAGING, "terminal length 0");
        cisco_ios.insert(KEY_SHOW_INVENTORY, "show inventory");
        cisco_ios.insert(KEY_ENTER_ENABLE, "enable");
        m.insert(DeviceType::CiscoIos, cisco_ios);

        let mut cisco_xr = HashMap::new();
        cisco_xr.insert(KEY_SHOW_RUNNING, "show running-config");
        cisco_xr.insert(KEY_SHOW_VERSION, "show version");
        cisco_xr.insert(KEY_SAVE_CONFIG, "commit");
        cisco_xr.insert(KEY_ENABLE_PAGING, "terminal length 0");
        cisco_xr.insert(KEY_SHOW_INVENTORY, "show inventory");
        cisco_xr.insert(KEY_ENTER_ENABLE, "");
        m.insert(DeviceType::CiscoXr, cisco_xr);

        let mut cisco_nxos = HashMap::new();
        cisco_nxos.insert(KEY_SHOW_RUNNING, "show running-config");
        cisco_nxos.insert(KEY_SHOW_VERSION, "show version");
        cisco_nxos.insert(KEY_SAVE_CONFIG, "copy running-config startup-config");
        cisco_nxos.insert(KEY_ENABLE_PAGING, "terminal length 0");
        cisco_nxos.insert(KEY_SHOW_INVENTORY, "show inventory");
        cisco_nxos.insert(KEY_ENTER_ENABLE, "");
        m.insert(DeviceType::CiscoNxos, cisco_nxos);

        let mut cisco_asa = HashMap::new();
        cisco_asa.insert(KEY_SHOW_RUNNING, "show running-config");
        cisco_asa.insert(KEY_SHOW_VERSION, "show version");
        cisco_asa.insert(KEY_SAVE_CONFIG, "write memory");
        cisco_asa.insert(KEY_ENABLE_PAGING, "terminal pager 0");
        cisco_asa.insert(KEY_SHOW_INVENTORY, "show inventory");
        cisco_asa.insert(KEY_ENTER_ENABLE, "enable");
        m.insert(DeviceType::CiscoAsa, cisco_asa);

        let mut arista_eos = HashMap::new();
        arista_eos.insert(KEY_SHOW_RUNNING, "show running-config");
        arista_eos.insert(KEY_SHOW_VERSION, "show version");
        arista_eos.insert(KEY_SAVE_CONFIG, "write memory");
        arista_eos.insert(KEY_ENABLE_PAGING, "terminal length 0");
        arista_eos.insert(KEY_SHOW_INVENTORY, "show inventory");
        arista_eos.insert(KEY_ENTER_ENABLE, "");
        m.insert(DeviceType::AristaEos, arista_eos);

        let mut juniper_junos = HashMap::new();
        juniper_junos.insert(KEY_SHOW_RUNNING, "show configuration | display set");
        juniper_junos.insert(KEY_SHOW_VERSION, "show version");
        juniper_junos.insert(KEY_SAVE_CONFIG, "commit");
        juniper_junos.insert(KEY_ENABLE_PAGING, "set cli screen-length 0");
        juniper_junos.insert(KEY_SHOW_INVENTORY, "show chassis hardware");
        juniper_junos.insert(KEY_ENTER_CLI, "cli");
        m.insert(DeviceType::JuniperJunos, juniper_junos);

        let mut paloalto_panos = HashMap::new();
        paloalto_panos.insert(KEY_SHOW_RUNNING, "show config running");
        paloalto_panos.insert(KEY_SHOW_VERSION, "show system info");
        paloalto_panos.insert(KEY_SAVE_CONFIG, "commit");
        paloalto_panos.insert(KEY_ENABLE_PAGING, "set cli pager off");
        paloalto_panos.insert(KEY_SHOW_INVENTORY, "show system info");
        paloalto_panos.insert(KEY_ENTER_CLI, "set cli config-output-format set");
        m.insert(DeviceType::PaloAltoPanos, paloalto_panos);

        let mut f5_tmsh = HashMap::new();
        f5_tmsh.insert(KEY_SHOW_RUNNING, "list");
        f5_tmsh.insert(KEY_SHOW_VERSION, "show sys version");
        f5_tmsh.insert(KEY_SAVE_CONFIG, "save sys config");
        f5_tmsh.insert(KEY_ENABLE_PAGING, "");
        f5_tmsh.insert(KEY_SHOW_INVENTORY, "show sys hardware");
        f5_tmsh.insert(KEY_ENTER_CLI, "tmsh");
        m.insert(DeviceType::F5Tmsh, f5_tmsh);

        let mut default = HashMap::new();
        default.insert(KEY_SHOW_RUNNING, "show running-config");
        default.insert(KEY_SHOW_VERSION, "show version");
        default.insert(KEY_SAVE_CONFIG, "write memory");
        default.insert(KEY_ENABLE_PAGING, "terminal length 0");
        default.insert(KEY_SHOW_INVENTORY, "show inventory");
        default.insert(KEY_ENTER_ENABLE, "enable");
        m.insert(DeviceType::Default, default);

        m
    };

    static ref COMMAND_TIMING: HashMap<DeviceType, HashMap<&'static str, u64>> = {
        let mut m = HashMap::new();

        let mut cisco_ios = HashMap::new();
        cisco_ios.insert(KEY_SHOW_RUNNING, 60);
        cisco_ios.insert(KEY_SAVE_CONFIG, 60);
        m.insert(DeviceType::CiscoIos, cisco_ios);

        let mut cisco_nxos = HashMap::new();
        cisco_nxos.insert(KEY_SHOW_RUNNING, 60);
        cisco_nxos.insert(KEY_SAVE_CONFIG, 90);
        m.insert(DeviceType::CiscoNxos, cisco_nxos);

        let mut juniper_junos = HashMap::new();
        juniper_junos.insert(KEY_SHOW_RUNNING, 90);
        juniper_junos.insert(KEY_SAVE_CONFIG, 60);
        m.insert(DeviceType::JuniperJunos, juniper_junos);

        let mut f5_tmsh = HashMap::new();
        f5_tmsh.insert(KEY_SHOW_RUNNING, 120);
        f5_tmsh.insert(KEY_SAVE_CONFIG, 60);
        m.insert(DeviceType::F5Tmsh, f5_tmsh);

        m
    };

    static ref DEVICE_CAPABILITIES: HashMap<DeviceType, CapabilityFlags> = {
        let mut m = HashMap::new();
        m.insert(DeviceType::CiscoIos, CapabilityFlags {
            requires_enable: true, supports_paging_control: true, supports_inventory: true,
            supports_config_replace: false, supports_file_transfer: true, requires_cli_mode: false,
        });
        m.insert(DeviceType::CiscoXr, CapabilityFlags {
            requires_enable: false, supports_paging_control: true, supports_inventory: true,
            supports_config_replace: true, supports_file_transfer: true, requires_cli_mode: false,
        });
        m.insert(DeviceType::CiscoNxos, CapabilityFlags {
            requires_enable: false, supports_paging_control: true, supports_inventory: true,
            supports_config_replace: true, supports_file_transfer: true, requires_cli_mode: false,
        });
        m.insert(DeviceType::CiscoAsa, CapabilityFlags {
            requires_enable: true, supports_paging_control: true, supports_inventory: true,
            supports_config_replace: false, supports_file_transfer: true, requires_cli_mode: false,
        });
        m.insert(DeviceType::AristaEos, CapabilityFlags {
            requires_enable: false, supports_paging_control: true, supports_inventory: true,
            supports_config_replace: false, supports_file_transfer: true, requires_cli_mode: false,
        });
        m.insert(DeviceType::JuniperJunos, CapabilityFlags {
            requires_enable: false, supports_paging_control: true, supports_inventory: true,
            supports_config_replace: true, supports_file_transfer: true, requires_cli_mode: true,
        });
        m.insert(DeviceType::PaloAltoPanos, CapabilityFlags {
            requires_enable: false, supports_paging_control: true, supports_inventory: false,
            supports_config_replace: true, supports_file_transfer: false, requires_cli_mode: true,
        });
        m.insert(DeviceType::F5Tmsh, CapabilityFlags {
            requires_enable: false, supports_paging_control: false, supports_inventory: true,
            supports_config_replace: false, supports_file_transfer: true, requires_cli_mode: true,
        });
        m.insert(DeviceType::Default, CapabilityFlags {
            requires_enable: true, supports_paging_control: true, supports_inventory: false,
            supports_config_replace: false, supports_file_transfer: false, requires_cli_mode: false,
        });
        m
    };

    static ref CAPABILITY_PATTERNS: HashMap<DeviceType, HashMap<&'static str, Regex>> = {
        let mut m: HashMap<DeviceType, HashMap<&'static str, Regex>> = HashMap::new();

        let mut cisco_ios = HashMap::new();
        cisco_ios.insert("model", Regex::new(r"(?:^|\n)[Cc]isco\s+(\S+).+?(?:[Pp]rocessor|[Cc]hassis)").unwrap());
        cisco_ios.insert("version", Regex::new(r"(?:IOS|Software) .*?Version\s+([^\s,]+)").unwrap());
        cisco_ios.insert("serial", Regex::new(r"Processor board ID\s+(\S+)").unwrap());
        cisco_ios.insert("hardware", Regex::new(r"cisco\s+(\S+)\s+\(").unwrap());
        cisco_ios.insert("ios_type", Regex::new(r"(IOS-XE|IOS)").unwrap());
        m.insert(DeviceType::CiscoIos, cisco_ios);

        let mut juniper_junos = HashMap::new();
        juniper_junos.insert("model", Regex::new(r"Model:\s+(\S+)").unwrap());
        juniper_junos.insert("version", Regex::new(r"Junos:\s+(\S+)").unwrap());
        juniper_junos.insert("serial", Regex::new(r"Chassis\s+(\S+)").unwrap());
        m.insert(DeviceType::JuniperJunos, juniper_junos);

        let mut paloalto_panos = HashMap::new();
        paloalto_panos.insert("model", Regex::new(r"model:\s*(\S+)").unwrap());
        paloalto_panos.insert("version", Regex::new(r"sw-version:\s*(\S+)").unwrap());
        paloalto_panos.insert("serial", Regex::new(r"serial:\s*(\S+)").unwrap());
        m.insert(DeviceType::PaloAltoPanos, paloalto_panos);

        let mut default = HashMap::new();
        default.insert("version", Regex::new(r"[Vv]ersion\s+([^\s,]+)").unwrap());
        m.insert(DeviceType::Default, default);

        m
    };

    static ref ERROR_PATTERNS: HashMap<DeviceType, Vec<(Regex, &'static str)>> = {
        let mut m: HashMap<DeviceType, Vec<(Regex, &'static str)>> = HashMap::new();

        m.insert(DeviceType::CiscoIos, vec![
            (Regex::new(r"% Invalid input detected").unwrap(), "Invalid command syntax"),
            (Regex::new(r"% Incomplete command").unwrap(), "Incomplete command"),
            (Regex::new(r"% Ambiguous command").unwrap(), "Ambiguous command"),
            (Regex::new(r"% Unknown command").unwrap(), "Unknown command"),
        ]);

        m.insert(DeviceType::JuniperJunos, vec![
            (Regex::new(r"syntax error").unwrap(), "Invalid command syntax"),
            (Regex::new(r"unknown command").unwrap(), "Unknown command"),
        ]);

        m.insert(DeviceType::PaloAltoPanos, vec![
            (Regex::new(r"Invalid syntax").unwrap(), "Invalid command syntax"),
            (Regex::new(r"Unknown command").unwrap(), "Unknown command"),
        ]);

        m.insert(DeviceType::Default, vec![
            (Regex::new(r"(?i)% ?invalid input").unwrap(), "Invalid command syntax"),
            (Regex::new(r"(?i)error").unwrap(), "Device reported an error"),
        ]);

        m
    };
}

/// Device-specific map of logical command keys to wire strings, including
/// whatever the `default` profile contributes for keys the vendor profile
/// does not override (mirrors [`command`]'s fallback, one key at a time).
pub fn commands_for(device_type: DeviceType) -> HashMap<&'static str, &'static str> {
    let default = COMMAND_VARIATIONS
        .get(&DeviceType::Default)
        .cloned()
        .unwrap_or_default();
    let mut merged = default;
    if let Some(specific) = COMMAND_VARIATIONS.get(&device_type) {
        for (k, v) in specific {
            merged.insert(k, v);
        }
    }
    merged
}

/// Single command lookup, falling back to the `default` profile's value for
/// that key when the vendor profile doesn't define it.
pub fn command(device_type: DeviceType, key: &str) -> Option<&'static str> {
    COMMAND_VARIATIONS
        .get(&device_type)
        .and_then(|m| m.get(key))
        .or_else(|| COMMAND_VARIATIONS.get(&DeviceType::Default).and_then(|m| m.get(key)))
        .copied()
}

/// Per-command duration with fallback to 30s.
pub fn timeout_for(device_type: DeviceType, key: &str) -> u64 {
    COMMAND_TIMING
        .get(&device_type)
        .and_then(|m| m.get(key))
        .copied()
        .unwrap_or(30)
}

/// Static capability booleans for a device type, falling back to the default
/// profile when the device type is entirely unknown.
pub fn static_capabilities(device_type: DeviceType) -> CapabilityFlags {
    *DEVICE_CAPABILITIES
        .get(&device_type)
        .unwrap_or_else(|| DEVICE_CAPABILITIES.get(&DeviceType::Default).unwrap())
}

/// The canonical ordering for a full backup: `enter_cli` (if required),
/// `enter_enable` (if required), `enable_paging` (if supported),
/// `show_version`, `show_inventory` (if supported), `show_running`.
pub fn command_sequence(device_type: DeviceType) -> Vec<(&'static str, String)> {
    let flags = static_capabilities(device_type);
    let mut seq = Vec::new();

    if flags.requires_cli_mode {
        if let Some(cmd) = command(device_type, KEY_ENTER_CLI) {
            if !cmd.is_empty() {
                seq.push((KEY_ENTER_CLI, cmd.to_string()));
            }
        }
    }
    if flags.requires_enable {
        if let Some(cmd) = command(device_type, KEY_ENTER_ENABLE) {
            if !cmd.is_empty() {
                seq.push((KEY_ENTER_ENABLE, cmd.to_string()));
            }
        }
    }
    if flags.supports_paging_control {
        if let Some(cmd) = command(device_type, KEY_ENABLE_PAGING) {
            if !cmd.is_empty() {
                seq.push((KEY_ENABLE_PAGING, cmd.to_string()));
            }
        }
    }
    if let Some(cmd) = command(device_type, KEY_SHOW_VERSION) {
        seq.push((KEY_SHOW_VERSION, cmd.to_string()));
    }
    if flags.supports_inventory {
        if let Some(cmd) = command(device_type, KEY_SHOW_INVENTORY) {
            seq.push((KEY_SHOW_INVENTORY, cmd.to_string()));
        }
    }
    if let Some(cmd) = command(device_type, KEY_SHOW_RUNNING) {
        seq.push((KEY_SHOW_RUNNING, cmd.to_string()));
    }

    seq
}

/// Applies the vendor regex table to version/inventory output and derives a
/// synthesized `platform_subtype` (e.g. `ios` vs `ios_xe` on Cisco IOS).
pub fn parse_capabilities(device_type: DeviceType, version_output: &str) -> ParsedCapabilities {
    let patterns = CAPABILITY_PATTERNS.get(&device_type);

    let extract = |key: &str| -> Option<String> {
        patterns
            .and_then(|m| m.get(key))
            .and_then(|re| re.captures(version_output))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    let mut parsed = ParsedCapabilities {
        model: extract("model"),
        version: extract("version"),
        serial: extract("serial"),
        hardware: extract("hardware"),
        platform_subtype: None,
        flags: static_capabilities(device_type).into(),
    };

    if device_type == DeviceType::CiscoIos {
        if let Some(patterns) = CAPABILITY_PATTERNS.get(&DeviceType::CiscoIos) {
            if let Some(re) = patterns.get("ios_type") {
                if let Some(caps) = re.captures(version_output) {
                    let matched = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                    parsed.platform_subtype = Some(if matched.eq_ignore_ascii_case("IOS-XE") {
                        "ios_xe".to_string()
                    } else {
                        "ios".to_string()
                    });
                }
            }
        }
    }

    parsed
}

/// Scans output against the vendor error pattern table, returning the first
/// match's human label, or `None` for empty output or no match.
pub fn detect_error(device_type: DeviceType, output: &str) -> Option<String> {
    if output.is_empty() {
        return None;
    }
    let patterns = ERROR_PATTERNS
        .get(&device_type)
        .or_else(|| ERROR_PATTERNS.get(&DeviceType::Default))?;
    for (re, label) in patterns {
        if re.is_match(output) {
            return Some(label.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cisco_ios_error_detection_matches_known_syntax_error() {
        let msg = detect_error(DeviceType::CiscoIos, "% Invalid input detected");
        assert_eq!(msg.as_deref(), Some("Invalid command syntax"));
    }

    #[test]
    fn cisco_ios_normal_output_yields_no_error() {
        let msg = detect_error(DeviceType::CiscoIos, "Switch#show version");
        assert_eq!(msg, None);
    }

    #[test]
    fn detect_error_on_empty_or_missing_output_returns_none() {
        assert_eq!(detect_error(DeviceType::CiscoIos, ""), None);
    }

    #[test]
    fn parse_capabilities_extracts_cisco_ios_fields() {
        let output = "cisco WS-C3560-24PS (PowerPC405) processor\nIOS Software, Version 12.2(55)SE\nProcessor board ID CAT1033Z1VY\nIOS";
        let parsed = parse_capabilities(DeviceType::CiscoIos, output);
        assert_eq!(parsed.model.as_deref(), Some("WS-C3560-24PS"));
        assert_eq!(parsed.version.as_deref(), Some("12.2(55)SE"));
        assert_eq!(parsed.serial.as_deref(), Some("CAT1033Z1VY"));
        assert_eq!(parsed.platform_subtype.as_deref(), Some("ios"));
    }

    #[test]
    fn command_sequence_places_enter_enable_before_show_running_when_required() {
        let seq = command_sequence(DeviceType::CiscoIos);
        let enable_pos = seq.iter().position(|(k, _)| *k == KEY_ENTER_ENABLE);
        let running_pos = seq.iter().position(|(k, _)| *k == KEY_SHOW_RUNNING);
        assert!(enable_pos.is_some());
        assert!(running_pos.is_some());
        assert!(enable_pos.unwrap() < running_pos.unwrap());
    }

    #[test]
    fn command_sequence_for_juniper_opens_cli_mode_first() {
        let seq = command_sequence(DeviceType::JuniperJunos);
        assert_eq!(seq.first().map(|(k, _)| *k), Some(KEY_ENTER_CLI));
    }

    #[test]
    fn command_falls_back_to_default_profile_for_unknown_key_owner() {
        // arista_eos does not define enable_paging explicitly below but the
        // default profile does; unknown device types should still resolve.
        let cmd = command(DeviceType::Default, KEY_ENABLE_PAGING);
        assert_eq!(cmd, Some("terminal length 0"));
    }

    #[test]
    fn timeout_for_unconfigured_pair_falls_back_to_thirty_seconds() {
        assert_eq!(timeout_for(DeviceType::CiscoAsa, KEY_SHOW_RUNNING), 30);
        assert_eq!(timeout_for(DeviceType::CiscoIos, KEY_SHOW_RUNNING), 60);
    }

    #[test]
    fn unknown_device_type_string_resolves_to_default() {
        assert_eq!(DeviceType::from_str("totally_unknown").unwrap(), DeviceType::Default);
        assert_eq!(DeviceType::from_str("cisco_ios").unwrap(), DeviceType::CiscoIos);
    }
}
