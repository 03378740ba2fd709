//! Line-oriented command grammar.
//!
//! Multi-field quick-add commands separate fields with `|`, e.g.
//! `add character Lira | Rogue | 3`. Blank required fields are passed through
//! so the form reports its own message.

use shared::domain::{CampaignId, CharacterId, QuestId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Login { email: String, password: String },
    Register { email: String, password: String },
    Logout,
    Back,
    Refresh,
    Open(CampaignId),
    CreateCampaign { name: String, description: Option<String> },
    OpenCharacter(CharacterId),
    OpenQuests,
    AddCharacter { name: String, class: Option<String>, level: Option<String> },
    AddLocation { name: String, description: Option<String> },
    AddQuest { title: String },
    Set { field: String, value: String },
    Attribute { name: String, value: String },
    AddItem(String),
    /// Zero-based; the command line counts from 1.
    RemoveItem(usize),
    Edit(QuestId),
    Delete(QuestId),
    Save,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("comando vazio")]
    Empty,
    #[error("comando desconhecido: {0} (digite 'help')")]
    Unknown(String),
    #[error("uso: {0}")]
    Usage(&'static str),
    #[error("número inválido: {0}")]
    InvalidNumber(String),
}

pub const HELP: &str = "\
Geral:     help | quit | logout | back | refresh
Acesso:    login <email> <senha> | register <email> <senha>
Início:    open <id> | create <nome> [| descrição]
Campanha:  character <id> | quests
           add character <nome> [| classe] [| nível]
           add location <nome> [| descrição]
           add quest <título>
Personagem: set <name|class|level> <valor> | attr <atributo> <valor>
           item add <texto> | item rm <n> | save
Missões:   set <title|description|status> <valor> | edit <id> | delete <id>
           save | cancel";

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (verb, rest) = split_word(line);
    match verb.to_ascii_lowercase().as_str() {
        "" => Err(CommandError::Empty),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "logout" => Ok(Command::Logout),
        "back" => Ok(Command::Back),
        "refresh" => Ok(Command::Refresh),
        "save" => Ok(Command::Save),
        "cancel" => Ok(Command::Cancel),
        "quests" => Ok(Command::OpenQuests),
        "login" => {
            let (email, password) = credentials(rest, "login <email> <senha>")?;
            Ok(Command::Login { email, password })
        }
        "register" => {
            let (email, password) = credentials(rest, "register <email> <senha>")?;
            Ok(Command::Register { email, password })
        }
        "open" => Ok(Command::Open(CampaignId(id(rest, "open <id>")?))),
        "character" => Ok(Command::OpenCharacter(CharacterId(id(
            rest,
            "character <id>",
        )?))),
        "edit" => Ok(Command::Edit(QuestId(id(rest, "edit <id>")?))),
        "delete" => Ok(Command::Delete(QuestId(id(rest, "delete <id>")?))),
        "create" => {
            let mut fields = pipe_fields(rest);
            Ok(Command::CreateCampaign {
                name: fields.next().flatten().unwrap_or_default(),
                description: fields.next().flatten(),
            })
        }
        "add" => parse_add(rest),
        "set" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                return Err(CommandError::Usage("set <campo> <valor>"));
            }
            Ok(Command::Set {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
        "attr" => {
            let (name, value) = split_word(rest);
            if name.is_empty() || value.is_empty() {
                return Err(CommandError::Usage("attr <atributo> <valor>"));
            }
            Ok(Command::Attribute {
                name: name.to_string(),
                value: value.to_string(),
            })
        }
        "item" => parse_item(rest),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_add(rest: &str) -> Result<Command, CommandError> {
    let (kind, fields) = split_word(rest);
    let mut fields = pipe_fields(fields);
    match kind.to_ascii_lowercase().as_str() {
        "character" => Ok(Command::AddCharacter {
            name: fields.next().flatten().unwrap_or_default(),
            class: fields.next().flatten(),
            level: fields.next().flatten(),
        }),
        "location" => Ok(Command::AddLocation {
            name: fields.next().flatten().unwrap_or_default(),
            description: fields.next().flatten(),
        }),
        "quest" => Ok(Command::AddQuest {
            title: fields.next().flatten().unwrap_or_default(),
        }),
        _ => Err(CommandError::Usage("add <character|location|quest> ...")),
    }
}

fn parse_item(rest: &str) -> Result<Command, CommandError> {
    let (action, value) = split_word(rest);
    match action.to_ascii_lowercase().as_str() {
        "add" => Ok(Command::AddItem(value.to_string())),
        "rm" | "remove" => {
            let position = value
                .parse::<usize>()
                .map_err(|_| CommandError::InvalidNumber(value.to_string()))?;
            position
                .checked_sub(1)
                .map(Command::RemoveItem)
                .ok_or_else(|| CommandError::InvalidNumber(value.to_string()))
        }
        _ => Err(CommandError::Usage("item add <texto> | item rm <n>")),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

/// Pipe-separated fields, blank ones as `None`.
fn pipe_fields(input: &str) -> impl Iterator<Item = Option<String>> + '_ {
    input
        .split('|')
        .map(str::trim)
        .map(|part| (!part.is_empty()).then(|| part.to_string()))
}

fn credentials(rest: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    let (email, password) = split_word(rest);
    if email.is_empty() || password.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok((email.to_string(), password.to_string()))
}

fn id(rest: &str, usage: &'static str) -> Result<i64, CommandError> {
    let (raw, _) = split_word(rest);
    if raw.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    raw.trim_start_matches('#')
        .parse()
        .map_err(|_| CommandError::InvalidNumber(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_add_splits_on_pipes() {
        assert_eq!(
            parse("add character Lira | Rogue | 3"),
            Ok(Command::AddCharacter {
                name: "Lira".into(),
                class: Some("Rogue".into()),
                level: Some("3".into()),
            })
        );
        assert_eq!(
            parse("add character Brom |  | 2"),
            Ok(Command::AddCharacter {
                name: "Brom".into(),
                class: None,
                level: Some("2".into()),
            })
        );
        assert_eq!(
            parse("create Curse of the Crimson Throne"),
            Ok(Command::CreateCampaign {
                name: "Curse of the Crimson Throne".into(),
                description: None,
            })
        );
    }

    #[test]
    fn blank_titles_reach_the_form() {
        assert_eq!(
            parse("add quest   "),
            Ok(Command::AddQuest {
                title: String::new()
            })
        );
    }

    #[test]
    fn ids_accept_a_hash_prefix() {
        assert_eq!(parse("open #4"), Ok(Command::Open(CampaignId(4))));
        assert_eq!(parse("delete 7"), Ok(Command::Delete(QuestId(7))));
        assert_eq!(
            parse("character x"),
            Err(CommandError::InvalidNumber("x".into()))
        );
        assert_eq!(parse("edit"), Err(CommandError::Usage("edit <id>")));
    }

    #[test]
    fn item_positions_are_one_based() {
        assert_eq!(parse("item rm 1"), Ok(Command::RemoveItem(0)));
        assert_eq!(
            parse("item rm 0"),
            Err(CommandError::InvalidNumber("0".into()))
        );
        assert_eq!(
            parse("item add corda de seda"),
            Ok(Command::AddItem("corda de seda".into()))
        );
    }

    #[test]
    fn set_keeps_multi_word_values() {
        assert_eq!(
            parse("set status in progress"),
            Ok(Command::Set {
                field: "status".into(),
                value: "in progress".into(),
            })
        );
    }

    #[test]
    fn unknown_and_empty_input() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert_eq!(parse("dance"), Err(CommandError::Unknown("dance".into())));
        assert!(matches!(
            parse("login only@email"),
            Err(CommandError::Usage(_))
        ));
    }
}
