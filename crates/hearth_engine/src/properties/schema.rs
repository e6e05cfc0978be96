//! The fixed, typed settings schema.
//!
//! [`ServerProperties`], its defaults and the [`SCHEMA`] table are generated
//! from one declaration so the three can never disagree.

use super::store::PropertiesStore;
use crate::error::ProvisionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Value type of a schema key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
    Integer { min: i64, max: i64 },
    Text,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingKind::Bool => f.write_str("a boolean"),
            SettingKind::Integer { min, max } => write!(f, "an integer in {min}..={max}"),
            SettingKind::Text => f.write_str("a string"),
        }
    }
}

/// A coerced override, ready to be written to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(value) => write!(f, "{value}"),
            SettingValue::Integer(value) => write!(f, "{value}"),
            SettingValue::Text(value) => f.write_str(value),
        }
    }
}

/// One row of the schema table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingSpec {
    pub key: &'static str,
    pub kind: SettingKind,
}

impl SettingSpec {
    /// Looks up a key in [`SCHEMA`].
    pub fn find(key: &str) -> Option<&'static SettingSpec> {
        SCHEMA.iter().find(|spec| spec.key == key)
    }

    /// Converts an untyped override into this key's type.
    pub fn coerce(&self, value: &Value) -> Result<SettingValue, String> {
        match (self.kind, value) {
            (SettingKind::Bool, Value::Bool(flag)) => Ok(SettingValue::Bool(*flag)),
            (SettingKind::Bool, Value::String(text)) => parse_bool(text)
                .map(SettingValue::Bool)
                .ok_or_else(|| format!("expected a boolean, got {text:?}")),

            (SettingKind::Integer { min, max }, Value::Number(number)) => {
                let integer = number
                    .as_i64()
                    .ok_or_else(|| format!("expected an integer, got {number}"))?;
                check_range(integer, min, max).map(SettingValue::Integer)
            }
            (SettingKind::Integer { min, max }, Value::String(text)) => {
                let integer = text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("expected an integer, got {text:?}"))?;
                check_range(integer, min, max).map(SettingValue::Integer)
            }

            (SettingKind::Text, Value::String(text)) => {
                if text.contains(['\n', '\r']) {
                    return Err("line breaks are not allowed".to_string());
                }
                Ok(SettingValue::Text(text.clone()))
            }
            (SettingKind::Text, Value::Number(number)) => Ok(SettingValue::Text(number.to_string())),
            (SettingKind::Text, Value::Bool(flag)) => Ok(SettingValue::Text(flag.to_string())),

            (kind, other) => Err(format!("expected {kind}, got {}", json_type(other))),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn check_range(value: i64, min: i64, max: i64) -> Result<i64, String> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside {min}..={max}"))
    }
}

/// Rust types a schema field may have.
pub trait PropertyValue: Sized {
    const KIND: SettingKind;

    fn parse_property(raw: &str) -> Result<Self, String>;

    fn render_property(&self) -> String;
}

impl PropertyValue for bool {
    const KIND: SettingKind = SettingKind::Bool;

    fn parse_property(raw: &str) -> Result<Self, String> {
        parse_bool(raw).ok_or_else(|| "expected true or false".to_string())
    }

    fn render_property(&self) -> String {
        self.to_string()
    }
}

macro_rules! integer_property {
    ($($ty:ty),*) => {$(
        impl PropertyValue for $ty {
            const KIND: SettingKind = SettingKind::Integer {
                min: <$ty>::MIN as i64,
                max: <$ty>::MAX as i64,
            };

            fn parse_property(raw: &str) -> Result<Self, String> {
                raw.trim()
                    .parse::<$ty>()
                    .map_err(|error| format!("expected {}: {error}", Self::KIND))
            }

            fn render_property(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

integer_property!(u16, i32, i64);

impl PropertyValue for String {
    const KIND: SettingKind = SettingKind::Text;

    fn parse_property(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }

    fn render_property(&self) -> String {
        self.clone()
    }
}

macro_rules! server_properties {
    ($( $field:ident: $ty:ty = $key:literal, $default:expr; )*) => {
        /// Typed view of a world's `server.properties`.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct ServerProperties {
            $(
                #[serde(rename = $key)]
                pub $field: $ty,
            )*
        }

        impl Default for ServerProperties {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        /// Every known settings key, in canonical order.
        pub const SCHEMA: &[SettingSpec] = &[
            $( SettingSpec { key: $key, kind: <$ty as PropertyValue>::KIND }, )*
        ];

        impl ServerProperties {
            /// Decodes a store; absent keys keep their defaults and keys
            /// outside the schema are ignored.
            pub fn decode(store: &PropertiesStore) -> Result<Self, ProvisionError> {
                let mut settings = Self::default();
                $(
                    if let Some(raw) = store.get($key) {
                        settings.$field = <$ty as PropertyValue>::parse_property(raw).map_err(|reason| {
                            ProvisionError::Decode {
                                key: $key.to_string(),
                                value: raw.to_string(),
                                reason,
                            }
                        })?;
                    }
                )*
                Ok(settings)
            }

            /// Renders every field, in schema order.
            pub fn to_store(&self) -> PropertiesStore {
                let mut store = PropertiesStore::new();
                $( store.set($key, self.$field.render_property()); )*
                store
            }

            /// On-disk text of a single key.
            pub fn raw_value(&self, key: &str) -> Option<String> {
                match key {
                    $( $key => Some(self.$field.render_property()), )*
                    _ => None,
                }
            }
        }
    };
}

server_properties! {
    allow_flight: bool = "allow-flight", false;
    allow_nether: bool = "allow-nether", true;
    broadcast_console_to_ops: bool = "broadcast-console-to-ops", true;
    broadcast_rcon_to_ops: bool = "broadcast-rcon-to-ops", true;
    con_port: u16 = "con.port", 25575;
    difficulty: String = "difficulty", "easy".into();
    enable_command_block: bool = "enable-command-block", false;
    enable_jmx_monitoring: bool = "enable-jmx-monitoring", false;
    enable_query: bool = "enable-query", false;
    enable_rcon: bool = "enable-rcon", false;
    enable_status: bool = "enable-status", true;
    enforce_whitelist: bool = "enforce-whitelist", false;
    entity_broadcast_range_percentage: i32 = "entity-broadcast-range-percentage", 100;
    force_gamemode: bool = "force-gamemode", false;
    function_permission_level: i32 = "function-permission-level", 2;
    gamemode: String = "gamemode", "survival".into();
    generate_structures: bool = "generate-structures", true;
    generator_settings: String = "generator-settings", String::new();
    hardcore: bool = "hardcore", false;
    level_name: String = "level-name", "world".into();
    level_seed: String = "level-seed", String::new();
    level_type: String = "level-type", "default".into();
    max_build_height: i32 = "max-build-height", 256;
    max_players: i32 = "max-players", 20;
    max_tick_time: i32 = "max-tick-time", 60000;
    max_world_size: i64 = "max-world-size", 29_999_984;
    motd: String = "motd", "A Minecraft Server".into();
    network_compression_threshold: i32 = "network-compression-threshold", 256;
    online_mode: bool = "online-mode", true;
    op_permission_level: i32 = "op-permission-level", 4;
    pvp: bool = "pvp", true;
    player_idle_timeout: i32 = "player-idle-timeout", 0;
    prevent_proxy_connections: bool = "prevent-proxy-connections", false;
    query_port: u16 = "query.port", 25565;
    rate_limit: i32 = "rate-limit", 0;
    rcon_password: String = "rcon.password", String::new();
    resource_pack: String = "resource-pack", String::new();
    resource_pack_sha1: String = "resource-pack-sha1", String::new();
    server_ip: String = "server-ip", String::new();
    server_port: u16 = "server-port", 25565;
    snooper_enabled: bool = "snooper-enabled", true;
    spawn_animals: bool = "spawn-animals", true;
    spawn_monsters: bool = "spawn-monsters", true;
    spawn_npcs: bool = "spawn-npcs", true;
    spawn_protection: i32 = "spawn-protection", 16;
    sync_chunk_writes: bool = "sync-chunk-writes", true;
    use_native_transport: bool = "use-native-transport", true;
    view_distance: i32 = "view-distance", 10;
    white_list: bool = "white-list", false;
}
