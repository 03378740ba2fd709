//! Plain-text rendering of whatever the root currently shows.

use std::fmt::Write as _;

use client_core::{
    forms::{CharacterDraft, QuestDraft},
    screens::{
        AuthMode, AuthScreen, CampaignScreen, CharacterScreen, HomeScreen, Notice,
        QuestListScreen, Screen, NO_CAMPAIGNS, NO_CHARACTERS, NO_LOCATIONS, NO_QUESTS,
    },
    CampaignApp, RootView,
};
use shared::domain::Quest;

pub const LOADING: &str = "Carregando...";
const LOGOUT_HINT: &str = "(digite 'logout' para sair)";

pub fn root(app: &CampaignApp) -> String {
    match app.root_view() {
        RootView::Loading => LOADING.to_string(),
        RootView::Auth => auth(app.auth()),
        RootView::SignedIn(account) => {
            let mut out = format!("Bem-vindo(a), {}!\n{LOGOUT_HINT}\n\n", account.email);
            match app.navigator() {
                Some(navigator) => out.push_str(&screen(navigator.screen())),
                None => out.push_str(LOADING),
            }
            out
        }
    }
}

pub fn screen(screen: &Screen) -> String {
    match screen {
        Screen::Home(home) => render_home(home),
        Screen::Campaign(campaign) => render_campaign(campaign),
        Screen::Character(character) => render_character(character),
        Screen::Quests(quests) => render_quests(quests),
    }
}

pub fn auth(screen: &AuthScreen) -> String {
    let mut out = match screen.mode() {
        AuthMode::Login => "== Entrar ==\nlogin <email> <senha>  (ou 'register' para criar conta)\n",
        AuthMode::Register => "== Criar conta ==\nregister <email> <senha>  (ou 'login' para entrar)\n",
    }
    .to_string();
    push_notice(&mut out, screen.message());
    out
}

fn render_home(home: &HomeScreen) -> String {
    let mut out = String::from("== Campanhas ==\n");
    push_notice(&mut out, home.notice());
    if home.campaigns().is_empty() {
        let _ = writeln!(out, "{NO_CAMPAIGNS}");
    }
    for campaign in home.campaigns() {
        let _ = writeln!(out, "  #{} {}", campaign.id, campaign.name);
    }
    let _ = writeln!(out, "\n[{}] create <nome> [| descrição]", home.submit_label());
    out
}

fn render_campaign(screen: &CampaignScreen) -> String {
    let mut out = match screen.campaign() {
        Some(campaign) => {
            let mut header = format!("== {} ==\n", campaign.name);
            if let Some(description) = campaign.description.as_deref() {
                let _ = writeln!(header, "{description}");
            }
            header
        }
        None => format!("== Campanha #{} ==\n", screen.campaign_id()),
    };
    push_notice(&mut out, screen.notice());

    let _ = writeln!(out, "\nPersonagens:");
    if screen.characters().is_empty() {
        let _ = writeln!(out, "  {NO_CHARACTERS}");
    }
    for character in screen.characters() {
        let _ = writeln!(out, "  #{} {}", character.id, character.summary());
    }

    let _ = writeln!(out, "\nMissões:");
    if screen.quests().is_empty() {
        let _ = writeln!(out, "  {NO_QUESTS}");
    }
    for quest in screen.quests() {
        let _ = writeln!(out, "  {}", quest_line(quest));
    }

    let _ = writeln!(out, "\nLocais:");
    if screen.locations().is_empty() {
        let _ = writeln!(out, "  {NO_LOCATIONS}");
    }
    for location in screen.locations() {
        let _ = writeln!(out, "  {}", location.summary());
    }
    out
}

fn render_character(screen: &CharacterScreen) -> String {
    let mut out = match screen.character() {
        Some(character) => format!("== Personagem: {} ==\n", character.name),
        None => format!("== Personagem #{} ==\n", screen.character_id()),
    };
    push_notice(&mut out, screen.notice());
    if screen.character().is_some() {
        out.push_str(&character_draft(screen.form().draft()));
    }
    out
}

fn character_draft(draft: &CharacterDraft) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Nome:   {}", draft.name);
    let _ = writeln!(out, "Classe: {}", draft.class);
    let _ = writeln!(out, "Nível:  {}", draft.level);
    let _ = writeln!(out, "\nAtributos:");
    for (attribute, score) in draft.attributes.iter() {
        let _ = writeln!(out, "  {:<13} {score}", attribute.label());
    }
    let _ = writeln!(out, "\nInventário:");
    if draft.inventory.is_empty() {
        let _ = writeln!(out, "  (vazio)");
    }
    for (position, item) in draft.inventory.items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {item}", position + 1);
    }
    out
}

fn render_quests(screen: &QuestListScreen) -> String {
    let mut out = String::from("== Missões ==\n");
    push_notice(&mut out, screen.notice());
    if screen.quests().is_empty() {
        let _ = writeln!(out, "{NO_QUESTS}");
    }
    for quest in screen.quests() {
        let _ = writeln!(out, "  {}", quest_line(quest));
        if let Some(description) = quest.description.as_deref() {
            let _ = writeln!(out, "      {description}");
        }
    }

    let form = screen.form();
    match form.editing() {
        Some(id) => {
            let _ = writeln!(out, "\nEditando missão #{id}");
        }
        None => {
            let _ = writeln!(out, "\nNova missão");
        }
    }
    out.push_str(&quest_draft(form.draft()));
    out
}

fn quest_draft(draft: &QuestDraft) -> String {
    format!(
        "  Título:    {}\n  Descrição: {}\n  Status:    {}\n",
        draft.title,
        draft.description,
        draft.status.label()
    )
}

fn quest_line(quest: &Quest) -> String {
    format!("#{} {} [{}]", quest.id, quest.title, quest.status.label())
}

fn push_notice(out: &mut String, notice: Option<&Notice>) {
    if let Some(notice) = notice {
        let marker = if notice.is_error() { "!" } else { "*" };
        let _ = writeln!(out, "{marker} {notice}");
    }
}
