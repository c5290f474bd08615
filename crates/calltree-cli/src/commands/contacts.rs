use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_found};
use crate::util::{normalize_optional_value, now_utc, or_dash, parse_contact_id};
use anyhow::Result;
use calltree_core::domain::{format_phone_display, normalize_phone};
use calltree_store::repo::{ContactNew, ContactUpdate};
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum ContactCommand {
    Add(AddContactArgs),
    Edit(EditContactArgs),
    Rm(DeleteArgs),
    Ls(ListArgs),
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct AddContactArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub number: String,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
    #[arg(long)]
    pub level: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditContactArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
    /// Pass an empty value to clear the level
    #[arg(long)]
    pub level: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Case-insensitive match on name, number, department or location
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Debug, Serialize)]
struct ContactDetail<'a> {
    #[serde(flatten)]
    contact: &'a calltree_core::domain::Contact,
    normalized_number: String,
}

pub fn add_contact(ctx: &Context<'_>, args: AddContactArgs) -> Result<()> {
    let contact = ctx.store.contacts().create(
        now_utc(),
        ContactNew {
            name: args.name,
            number: args.number,
            department: args.department.unwrap_or_default(),
            location: args.location.unwrap_or_default(),
            position: args.position.unwrap_or_default(),
            level: args.level.and_then(normalize_optional_value),
        },
    )?;

    if ctx.json {
        print_json(&contact)?;
    } else {
        println!("created {} {}", contact.id, contact.name);
    }
    Ok(())
}

pub fn edit_contact(ctx: &Context<'_>, args: EditContactArgs) -> Result<()> {
    let id = parse_contact_id(&args.id)?;
    let update = ContactUpdate {
        name: args.name,
        number: args.number,
        department: args.department,
        location: args.location,
        position: args.position,
        level: args.level.map(normalize_optional_value),
    };

    if update_is_empty(&update) {
        return Err(invalid_input("no updates provided"));
    }

    let contact = ctx.store.contacts().update(now_utc(), id, update)?;
    if ctx.json {
        print_json(&contact)?;
    } else {
        println!("updated {} {}", contact.id, contact.name);
    }
    Ok(())
}

pub fn delete_contact(ctx: &Context<'_>, args: DeleteArgs) -> Result<()> {
    let id = parse_contact_id(&args.id)?;
    ctx.store.contacts().delete(id)?;
    if ctx.json {
        print_json(&serde_json::json!({ "id": id }))?;
    } else {
        println!("deleted {}", id);
    }
    Ok(())
}

pub fn list_contacts(ctx: &Context<'_>, args: ListArgs) -> Result<()> {
    let needle = args
        .search
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase);
    let contacts: Vec<_> = ctx
        .store
        .contacts()
        .list_all()?
        .into_iter()
        .filter(|contact| match needle.as_deref() {
            None => true,
            Some(needle) => [
                contact.name.as_str(),
                contact.number.as_str(),
                contact.department.as_str(),
                contact.location.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(needle)),
        })
        .collect();

    if ctx.json {
        print_json(&contacts)?;
        return Ok(());
    }

    if contacts.is_empty() {
        println!("no contacts");
        return Ok(());
    }

    for contact in contacts {
        println!(
            "{}  {}  {}  [{}]  {}",
            contact.id,
            contact.name,
            format_phone_display(&contact.number),
            or_dash(&contact.department),
            or_dash(contact.level_or_position()),
        );
    }
    Ok(())
}

pub fn show_contact(ctx: &Context<'_>, args: ShowArgs) -> Result<()> {
    let id = parse_contact_id(&args.id)?;
    let contact = ctx
        .store
        .contacts()
        .get(id)?
        .ok_or_else(|| not_found("contact not found"))?;
    let detail = ContactDetail {
        contact: &contact,
        normalized_number: normalize_phone(&contact.number),
    };

    if ctx.json {
        print_json(&detail)?;
        return Ok(());
    }

    println!("id: {}", contact.id);
    println!("name: {}", contact.name);
    println!("number: {}", format_phone_display(&contact.number));
    println!("match key: {}", or_dash(&detail.normalized_number));
    println!("department: {}", or_dash(&contact.department));
    println!("location: {}", or_dash(&contact.location));
    println!("position: {}", or_dash(&contact.position));
    if let Some(level) = contact.level.as_deref() {
        println!("level: {}", level);
    }
    Ok(())
}

fn update_is_empty(update: &ContactUpdate) -> bool {
    update.name.is_none()
        && update.number.is_none()
        && update.department.is_none()
        && update.location.is_none()
        && update.position.is_none()
        && update.level.is_none()
}
