//! Request payloads for the admin backend.
//!
//! # Design
//! These are data-only shapes shared with the backend. The client never
//! inspects them: any `Serialize` value can be passed as a body, and these
//! types exist so call sites get field names and optionality checked at
//! compile time. Fields are camelCase on the wire and optional fields are
//! omitted when `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityRequestDto {
    /// Cooldown in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<f64>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<u32>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequestDto {
    pub description: String,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageRequestDto {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRequestDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
    pub name: String,
}

/// World placement of an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcPosition {
    pub facing: f64,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcRequestDto {
    pub area_id: String,
    /// Playable class id.
    pub class_id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_pattern: Option<String>,
    pub name: String,
    pub position: NpcPosition,
    /// Playable race id.
    pub race_id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Placement of an NPC template inside an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaNpcRequestDto {
    pub area_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_pattern: Option<String>,
    pub npc_id: String,
    pub position_x: f64,
    pub position_y: f64,
}

/// Pagination for item queries. The backend takes both values as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryItemRequestDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTranslationRequestDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// `description` and `file_path` are nullable on the backend, so `None`
/// serializes as an explicit `null` rather than being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureRequestDto {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponDamageRequestDto {
    pub attack_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_class_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub max_value: f64,
    pub min_value: f64,
}

/// Whether `value` has the shape of a request body: an object or an array.
///
/// This only narrows out `null` and primitives; it does not check fields.
pub fn is_request_dto(value: &Value) -> bool {
    value.is_object() || value.is_array()
}
