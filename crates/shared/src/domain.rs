use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CampaignId);
id_newtype!(CharacterId);
id_newtype!(QuestId);
id_newtype!(LocationId);

pub const DEFAULT_LEVEL: i32 = 1;
pub const DEFAULT_ATTRIBUTE_SCORE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

/// Identity-provider account. Only the provider creates or destroys these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Strength,
        Attribute::Dexterity,
        Attribute::Constitution,
        Attribute::Intelligence,
        Attribute::Wisdom,
        Attribute::Charisma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Strength => "strength",
            Attribute::Dexterity => "dexterity",
            Attribute::Constitution => "constitution",
            Attribute::Intelligence => "intelligence",
            Attribute::Wisdom => "wisdom",
            Attribute::Charisma => "charisma",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Attribute::Strength => "Força",
            Attribute::Dexterity => "Destreza",
            Attribute::Constitution => "Constituição",
            Attribute::Intelligence => "Inteligência",
            Attribute::Wisdom => "Sabedoria",
            Attribute::Charisma => "Carisma",
        }
    }
}

impl FromStr for Attribute {
    type Err = String;

    /// Accepts the column key, its three-letter abbreviation or the shown
    /// label, with or without accents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s);
        Attribute::ALL
            .into_iter()
            .find(|attr| {
                attr.as_str() == wanted
                    || attr.as_str()[..3] == wanted
                    || fold(attr.label()) == wanted
            })
            .ok_or_else(|| s.trim().to_string())
    }
}

fn fold(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// The six ability scores, embedded in the character row as one document.
///
/// Updates go through [`Attributes::with`], which returns a new value and
/// leaves the receiver untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default = "default_score", deserialize_with = "score_or_default")]
    pub strength: i32,
    #[serde(default = "default_score", deserialize_with = "score_or_default")]
    pub dexterity: i32,
    #[serde(default = "default_score", deserialize_with = "score_or_default")]
    pub constitution: i32,
    #[serde(default = "default_score", deserialize_with = "score_or_default")]
    pub intelligence: i32,
    #[serde(default = "default_score", deserialize_with = "score_or_default")]
    pub wisdom: i32,
    #[serde(default = "default_score", deserialize_with = "score_or_default")]
    pub charisma: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: DEFAULT_ATTRIBUTE_SCORE,
            dexterity: DEFAULT_ATTRIBUTE_SCORE,
            constitution: DEFAULT_ATTRIBUTE_SCORE,
            intelligence: DEFAULT_ATTRIBUTE_SCORE,
            wisdom: DEFAULT_ATTRIBUTE_SCORE,
            charisma: DEFAULT_ATTRIBUTE_SCORE,
        }
    }
}

impl Attributes {
    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Charisma => self.charisma,
        }
    }

    pub fn with(self, attribute: Attribute, value: i32) -> Self {
        let mut next = self;
        match attribute {
            Attribute::Strength => next.strength = value,
            Attribute::Dexterity => next.dexterity = value,
            Attribute::Constitution => next.constitution = value,
            Attribute::Intelligence => next.intelligence = value,
            Attribute::Wisdom => next.wisdom = value,
            Attribute::Charisma => next.charisma = value,
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, i32)> + '_ {
        Attribute::ALL.into_iter().map(|attr| (attr, self.get(attr)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default, deserialize_with = "text_items")]
    pub items: Vec<String>,
}

impl Inventory {
    pub fn with_item(&self, item: impl Into<String>) -> Self {
        let mut items = self.items.clone();
        items.push(item.into());
        Self { items }
    }

    /// Returns `None` when `index` is out of range.
    pub fn without_item(&self, index: usize) -> Option<Self> {
        if index >= self.items.len() {
            return None;
        }
        let items = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, item)| item.clone())
            .collect();
        Some(Self { items })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub campaign_id: CampaignId,
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default = "default_level", deserialize_with = "level_or_default")]
    pub level: i32,
    #[serde(default, deserialize_with = "document_or_default")]
    pub attributes: Attributes,
    #[serde(default, deserialize_with = "document_or_default")]
    pub inventory: Inventory,
}

impl Character {
    /// One-line listing, e.g. `Lira (Rogue) - Nível 3`.
    pub fn summary(&self) -> String {
        match self.class.as_deref().map(str::trim) {
            Some(class) if !class.is_empty() => {
                format!("{} ({}) - Nível {}", self.name, class, self.level)
            }
            _ => format!("{} - Nível {}", self.name, self.level),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl QuestStatus {
    pub const ALL: [QuestStatus; 3] = [
        QuestStatus::Pending,
        QuestStatus::InProgress,
        QuestStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestStatus::Pending => "pending",
            QuestStatus::InProgress => "in_progress",
            QuestStatus::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestStatus::Pending => "Pendente",
            QuestStatus::InProgress => "Em andamento",
            QuestStatus::Completed => "Concluída",
        }
    }
}

impl FromStr for QuestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        QuestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| s.trim().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub campaign_id: CampaignId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "document_or_default")]
    pub status: QuestStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub campaign_id: CampaignId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Location {
    pub fn summary(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => {
                format!("{} - {}", self.name, description)
            }
            _ => self.name.clone(),
        }
    }
}

fn default_level() -> i32 {
    DEFAULT_LEVEL
}

fn default_score() -> i32 {
    DEFAULT_ATTRIBUTE_SCORE
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Embedded value that falls back to its default when null or unreadable.
fn document_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default())
}

/// Inventory entries are free text; numbers are kept as text and anything
/// else is dropped.
fn text_items<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .collect())
}

/// Stored numbers may be decimals or numeric text. Both are truncated toward
/// zero; anything else, or a result below 1, gives `default`.
fn positive_or(default: i32, value: Option<Value>) -> i32 {
    let whole = match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate)),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    };
    whole
        .filter(|n| *n >= 1)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(default)
}

fn truncate(number: f64) -> Option<i64> {
    number.is_finite().then(|| number.trunc() as i64)
}

fn level_or_default<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(positive_or(DEFAULT_LEVEL, Option::<Value>::deserialize(deserializer)?))
}

fn score_or_default<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(positive_or(
        DEFAULT_ATTRIBUTE_SCORE,
        Option::<Value>::deserialize(deserializer)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn character_row_with_nulls_loads_defaults() {
        let character: Character = serde_json::from_value(json!({
            "id": 7,
            "campaign_id": 2,
            "name": "Lira",
            "class": null,
            "level": null,
            "attributes": null,
            "inventory": null,
        }))
        .expect("character row");

        assert_eq!(character.level, 1);
        assert_eq!(character.attributes, Attributes::default());
        assert!(character.inventory.items.is_empty());
        assert_eq!(character.class, None);
    }

    #[test]
    fn partial_attribute_document_fills_missing_keys() {
        let attributes: Attributes =
            serde_json::from_value(json!({ "strength": 16, "wisdom": null })).expect("attributes");

        assert_eq!(attributes.strength, 16);
        assert_eq!(attributes.wisdom, 10);
        assert_eq!(attributes.charisma, 10);
    }

    #[test]
    fn level_below_one_loads_as_one() {
        let character: Character = serde_json::from_value(json!({
            "id": 1,
            "campaign_id": 1,
            "name": "Bram",
            "level": 0,
        }))
        .expect("character row");
        assert_eq!(character.level, 1);
    }

    #[test]
    fn embedded_documents_survive_serialization() {
        let character = Character {
            id: CharacterId(3),
            campaign_id: CampaignId(1),
            name: "Lira".into(),
            class: Some("Rogue".into()),
            level: 3,
            attributes: Attributes::default().with(Attribute::Dexterity, 17),
            inventory: Inventory::default().with_item("rope").with_item("lockpicks"),
        };

        let value = serde_json::to_value(&character).expect("serialize");
        assert_eq!(value["inventory"], json!({ "items": ["rope", "lockpicks"] }));
        let back: Character = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, character);
    }

    #[test]
    fn attribute_update_leaves_siblings_alone() {
        let before = Attributes::default().with(Attribute::Wisdom, 14);
        let after = before.with(Attribute::Strength, 18);

        assert_eq!(before.strength, 10);
        for (attr, value) in after.iter() {
            match attr {
                Attribute::Strength => assert_eq!(value, 18),
                other => assert_eq!(value, before.get(other)),
            }
        }
    }

    #[test]
    fn removing_items_keeps_relative_order() {
        let inventory = Inventory::default()
            .with_item("a")
            .with_item("b")
            .with_item("c");

        let trimmed = inventory.without_item(1).expect("in range");
        assert_eq!(trimmed.items, vec!["a", "c"]);
        assert!(inventory.without_item(3).is_none());
        assert_eq!(inventory.items.len(), 3);
    }

    #[test]
    fn quest_status_is_closed() {
        assert_eq!("in_progress".parse::<QuestStatus>(), Ok(QuestStatus::InProgress));
        assert_eq!("In Progress".parse::<QuestStatus>(), Ok(QuestStatus::InProgress));
        assert!("abandoned".parse::<QuestStatus>().is_err());
        assert!(serde_json::from_value::<QuestStatus>(json!("abandoned")).is_err());
    }

    #[test]
    fn character_summary_matches_listing_format() {
        let mut character: Character = serde_json::from_value(json!({
            "id": 1,
            "campaign_id": 1,
            "name": "Lira",
            "class": "Rogue",
            "level": 3,
        }))
        .expect("row");
        assert_eq!(character.summary(), "Lira (Rogue) - Nível 3");

        character.class = Some("  ".into());
        assert_eq!(character.summary(), "Lira - Nível 3");
    }

    #[test]
    fn decimal_and_textual_scores_truncate() {
        let character: Character = serde_json::from_value(json!({
            "id": 4,
            "campaign_id": 1,
            "name": "Bram",
            "level": 2.7,
            "attributes": { "strength": 12.5, "dexterity": "14", "wisdom": "sábio", "charisma": 0.4 },
        }))
        .expect("character row");

        assert_eq!(character.level, 2);
        assert_eq!(character.attributes.strength, 12);
        assert_eq!(character.attributes.dexterity, 14);
        assert_eq!(character.attributes.wisdom, 10);
        assert_eq!(character.attributes.charisma, 10);
    }

    #[test]
    fn unreadable_documents_fall_back_to_defaults() {
        let character: Character = serde_json::from_value(json!({
            "id": 5,
            "campaign_id": 1,
            "name": "Sela",
            "attributes": "forte",
            "inventory": { "items": ["corda", null, 3, { "nome": "tocha" }], "gold": 12 },
        }))
        .expect("character row");

        assert_eq!(character.attributes, Attributes::default());
        assert_eq!(character.inventory.items, vec!["corda", "3"]);
    }

    #[test]
    fn unknown_stored_status_loads_as_pending() {
        let quest: Quest = serde_json::from_value(json!({
            "id": 1,
            "campaign_id": 1,
            "title": "Find the heir",
            "status": "abandoned",
        }))
        .expect("quest row");
        assert_eq!(quest.status, QuestStatus::Pending);
    }

    #[test]
    fn attribute_names_parse_from_keys_abbreviations_and_labels() {
        assert_eq!("dex".parse::<Attribute>(), Ok(Attribute::Dexterity));
        assert_eq!(" CHA ".parse::<Attribute>(), Ok(Attribute::Charisma));
        assert_eq!("wisdom".parse::<Attribute>(), Ok(Attribute::Wisdom));
        assert_eq!("Força".parse::<Attribute>(), Ok(Attribute::Strength));
        assert_eq!("forca".parse::<Attribute>(), Ok(Attribute::Strength));
        assert_eq!("constituicao".parse::<Attribute>(), Ok(Attribute::Constitution));
        assert_eq!("Inteligência".parse::<Attribute>(), Ok(Attribute::Intelligence));

        assert_eq!("c".parse::<Attribute>(), Err("c".to_string()));
        assert_eq!("in".parse::<Attribute>(), Err("in".to_string()));
        assert!("luck".parse::<Attribute>().is_err());
        assert!("".parse::<Attribute>().is_err());
    }
}
