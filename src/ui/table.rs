use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            name: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_render() {
        let mut builder = TableBuilder::new();
        assert_eq!(builder.build(), "");

        builder.add_row("users", "3 columns");
        let rendered = builder.build();
        assert!(rendered.contains("users"));
        assert!(rendered.contains("3 columns"));
        assert!(rendered.contains("Name"));
    }
}
