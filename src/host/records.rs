//! Context records the host exposes to scripts.

use serde::{Deserialize, Serialize};

/// Wi-Fi descriptor of the current network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
}

/// IPv4 details of the primary interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ipv4Info {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_router: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_interface: Option<String>,
}

/// IPv6 details of the primary interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ipv6Info {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_interface: Option<String>,
}

/// Snapshot of the device's network state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    #[serde(default)]
    pub wifi: WifiInfo,
    #[serde(default)]
    pub v4: Ipv4Info,
    #[serde(default)]
    pub v6: Ipv6Info,
    /// DNS servers in use.
    #[serde(default)]
    pub dns: Vec<String>,
}

/// Category of a script, which decides the context it runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptType {
    HttpRequest,
    HttpResponse,
    Cron,
    Event,
    Dns,
    Rule,
    #[default]
    Generic,
}

impl ScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::HttpRequest => "http-request",
            ScriptType::HttpResponse => "http-response",
            ScriptType::Cron => "cron",
            ScriptType::Event => "event",
            ScriptType::Dns => "dns",
            ScriptType::Rule => "rule",
            ScriptType::Generic => "generic",
        }
    }
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScriptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http-request" => Ok(ScriptType::HttpRequest),
            "http-response" => Ok(ScriptType::HttpResponse),
            "cron" => Ok(ScriptType::Cron),
            "event" => Ok(ScriptType::Event),
            "dns" => Ok(ScriptType::Dns),
            "rule" => Ok(ScriptType::Rule),
            "generic" => Ok(ScriptType::Generic),
            other => Err(format!("unknown script type: {}", other)),
        }
    }
}

/// Metadata of the running script. Constant for the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInfo {
    /// Script name.
    pub name: String,
    /// Start time (Unix epoch milliseconds).
    pub start_time: u64,
    /// Script category.
    #[serde(rename = "type")]
    pub script_type: ScriptType,
}

/// Environment record in the host's own key convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnvironment {
    /// Operating system, `iOS` or `macOS`.
    pub system: String,
    /// UI language of the host.
    pub language: String,
    #[serde(rename = "surge-build")]
    pub build: String,
    #[serde(rename = "surge-version")]
    pub version: String,
    #[serde(rename = "device-model")]
    pub device_model: String,
}

/// Environment facts with plain field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub system: String,
    pub language: String,
    /// Host build number.
    pub host_build: String,
    /// Host short version.
    pub host_version: String,
    pub device_model: String,
}

impl From<HostEnvironment> for EnvironmentInfo {
    fn from(env: HostEnvironment) -> Self {
        Self {
            system: env.system,
            language: env.language,
            host_build: env.build,
            host_version: env.version,
            device_model: env.device_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_environment_uses_hyphenated_keys() {
        let env: HostEnvironment = serde_json::from_value(serde_json::json!({
            "system": "iOS",
            "language": "en",
            "surge-build": "2800",
            "surge-version": "5.9.0",
            "device-model": "iPhone15,2",
        }))
        .unwrap();

        let info = EnvironmentInfo::from(env);
        assert_eq!(info.host_build, "2800");
        assert_eq!(info.host_version, "5.9.0");
        assert_eq!(info.device_model, "iPhone15,2");
    }

    #[test]
    fn test_script_info_type_key() {
        let info: ScriptInfo = serde_json::from_value(serde_json::json!({
            "name": "rewrite",
            "startTime": 1700000000000u64,
            "type": "http-response",
        }))
        .unwrap();
        assert_eq!(info.script_type, ScriptType::HttpResponse);
        assert_eq!(info.start_time, 1_700_000_000_000);
    }

    #[test]
    fn test_network_info_camel_case() {
        let network: NetworkInfo = serde_json::from_value(serde_json::json!({
            "wifi": { "ssid": "home" },
            "v4": { "primaryAddress": "192.168.1.2", "primaryRouter": "192.168.1.1" },
            "dns": ["1.1.1.1"],
        }))
        .unwrap();
        assert_eq!(network.wifi.ssid.as_deref(), Some("home"));
        assert_eq!(network.v4.primary_router.as_deref(), Some("192.168.1.1"));
        assert_eq!(network.v6, Ipv6Info::default());
    }
}
