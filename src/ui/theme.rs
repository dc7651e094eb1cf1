use crate::key::EntityKey;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub muted: Style,
    database: Style,
    table: Style,
    column: Style,
}

impl Theme {
    /// Colors only on a terminal and when `NO_COLOR` is unset.
    pub fn detect() -> Self {
        let colored = std::env::var_os("NO_COLOR").is_none() && console::Term::stdout().is_term();
        Self::new(colored)
    }

    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: pick(Style::new().cyan().bold()),
            success: pick(Style::new().green().bold()),
            error: pick(Style::new().red().bold()),
            warn: pick(Style::new().yellow().bold()),
            info: pick(Style::new().magenta()),
            dim: pick(Style::new().white().dimmed()),
            muted: pick(Style::new().bright_black()),
            database: pick(Style::new().blue().bold()),
            table: pick(Style::new().cyan().bold()),
            column: pick(Style::new().green()),
        }
    }

    /// Style of an entity key in search output, by level.
    pub fn entity(&self, key: &EntityKey) -> Style {
        match key {
            EntityKey::Database { .. } => self.database.clone(),
            EntityKey::Table { .. } => self.table.clone(),
            EntityKey::Column { .. } => self.column.clone(),
            EntityKey::Named(_) => self.muted.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_entity_levels_render_differently() {
        let theme = Theme::new(true);
        let render = |key: &str| {
            let key = EntityKey::parse(key);
            key.to_key_string().style(theme.entity(&key)).to_string()
        };

        let database = render("Database:db");
        let table = render("Table:db.t");
        let column = render("Column:db.t.c");
        assert!(database.contains("\u{1b}["));
        assert_ne!(database.replace("Database:db", ""), table.replace("Table:db.t", ""));
        assert_ne!(table.replace("Table:db.t", ""), column.replace("Column:db.t.c", ""));
    }
}
