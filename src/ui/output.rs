use crate::key::EntityKey;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::DATABASE, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn phase(name: &str) {
    println!();
    println!(
        "{} {}",
        Icons::GEAR.style(theme().info.clone()),
        name.style(theme().header.clone())
    );
}

pub fn timing(elapsed: &str) {
    println!("{} {}", Icons::CLOCK.style(theme().dim.clone()), elapsed);
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// One formatted search chunk, content indented under its entity key.
pub fn chunk(label: &str, entity: &str, content: &str) {
    println!();
    let key = EntityKey::parse(entity);
    println!(
        "{} {}",
        label.style(theme().muted.clone()),
        entity.style(theme().entity(&key))
    );
    for line in content.lines() {
        println!("    {}", line);
    }
}
