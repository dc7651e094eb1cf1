//! MySQL-specific grammar: table options after the column list.

use super::lexer::Token;
use super::parser::Cursor;
use crate::schema::Table;

const STATEMENT_STARTS: [&str; 4] = ["CREATE", "ALTER", "DROP", "INSERT"];

/// Read `ENGINE=`, `[DEFAULT] CHARSET=`, `CHARACTER SET`, `COLLATE=` and
/// `COMMENT=` up to and including the closing `;`. Other options are
/// ignored. A missing `;` ends the options at the next statement keyword.
pub fn parse_table_options(cur: &mut Cursor<'_>, table: &mut Table) {
    while !cur.at_end()
        && *cur.current() != Token::Semicolon
        && !STATEMENT_STARTS.iter().any(|kw| cur.at_keyword(kw))
    {
        if cur.eat_keyword("ENGINE") || cur.eat_keyword("TYPE") {
            cur.eat(&Token::Eq);
            if let Some(engine) = cur.name() {
                table.engine = engine;
            }
        } else if cur.eat_keyword("CHARSET") || cur.eat_keywords(&["CHARACTER", "SET"]) {
            cur.eat(&Token::Eq);
            if let Some(charset) = cur.name() {
                table.charset = charset;
            }
        } else if cur.eat_keyword("COLLATE") {
            cur.eat(&Token::Eq);
            if let Some(collation) = cur.name() {
                table.collation = collation;
            }
        } else if cur.eat_keyword("COMMENT") {
            cur.eat(&Token::Eq);
            if let Token::Str(comment) = cur.current() {
                table.comment = Some(comment.clone());
                cur.advance();
            }
        } else if *cur.current() == Token::LParen {
            cur.skip_group();
        } else {
            cur.advance();
        }
    }
    cur.eat(&Token::Semicolon);
}

#[cfg(test)]
mod tests {
    use crate::ddl::{Dialect, parse_str};

    #[test]
    fn test_create_table_with_inline_keys() {
        let sql = "CREATE TABLE users (id INT PRIMARY KEY AUTO_INCREMENT, email VARCHAR(255) NOT NULL) ENGINE=InnoDB;";
        let tables = parse_str(sql, Dialect::MySql, "app");

        let users = tables.get("users").unwrap();
        assert_eq!(users.database, "app");
        assert_eq!(users.columns.len(), 2);

        let id = &users.columns[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.data_type, "INT");
        assert!(id.is_primary_key);
        assert!(id.auto_increment);

        let email = &users.columns[1];
        assert_eq!(email.name, "email");
        assert_eq!(email.data_type, "VARCHAR(255)");
        assert!(!email.nullable);
        assert!(!email.is_primary_key);

        assert_eq!(users.primary_keys, vec!["id"]);
        assert_eq!(users.engine, "InnoDB");
    }

    #[test]
    fn test_trailing_primary_key_clause() {
        let sql = r#"
CREATE TABLE IF NOT EXISTS `order_items` (
  `order_id` int NOT NULL,
  `product_id` int NOT NULL,
  `quantity` int NOT NULL DEFAULT '1',
  `note` text,
  PRIMARY KEY (`order_id`,`product_id`)
) ENGINE=InnoDB DEFAULT CHARSET=latin1 COLLATE=latin1_swedish_ci COMMENT='Line items';
"#;
        let tables = parse_str(sql, Dialect::MySql, "shop");
        let items = tables.get("order_items").unwrap();

        let names: Vec<&str> = items.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["order_id", "product_id", "quantity", "note"]);

        let primary: Vec<&str> = items
            .columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(primary, vec!["order_id", "product_id"]);
        assert_eq!(items.primary_keys, vec!["order_id", "product_id"]);

        assert_eq!(items.charset, "latin1");
        assert_eq!(items.collation, "latin1_swedish_ci");
        assert_eq!(items.comment.as_deref(), Some("Line items"));
        assert_eq!(items.columns[2].default.as_deref(), Some("1"));
    }

    #[test]
    fn test_defaults_without_options() {
        let tables = parse_str("CREATE TABLE t (a int);", Dialect::MySql, "db");
        let t = tables.get("t").unwrap();
        assert_eq!(t.engine, "InnoDB");
        assert_eq!(t.charset, "utf8mb4");
        assert_eq!(t.collation, "utf8mb4_unicode_ci");
    }

    #[test]
    fn test_dump_noise_and_table_level_keys() {
        let sql = r#"
-- MySQL dump 10.13
/*!40101 SET NAMES utf8mb4 */;
DROP TABLE IF EXISTS `orders`;
# generated
CREATE TABLE `orders` (
  `id` bigint unsigned NOT NULL AUTO_INCREMENT,
  `user_id` int NOT NULL COMMENT 'buyer',
  `created_at` datetime DEFAULT CURRENT_TIMESTAMP,
  UNIQUE KEY `uniq_ref` (`id`,`user_id`),
  KEY `idx_user` (`user_id`),
  CONSTRAINT `fk_orders_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=utf8mb4;
INSERT INTO `orders` VALUES (1,2,'2020-01-01; 00:00');
"#;
        let tables = parse_str(sql, Dialect::MySql, "shop");
        assert_eq!(tables.len(), 1);

        let orders = tables.get("orders").unwrap();
        assert_eq!(orders.columns.len(), 3);
        assert_eq!(orders.columns[0].data_type, "bigint unsigned");
        assert!(orders.columns[0].is_primary_key);
        assert!(orders.columns[1].is_foreign_key);
        assert_eq!(orders.columns[1].comment.as_deref(), Some("buyer"));

        let fk = &orders.foreign_keys[0];
        assert_eq!(fk.ref_table, "users");
        assert_eq!(fk.on_delete, "CASCADE");
        assert_eq!(fk.constraint_name.as_deref(), Some("fk_orders_user"));

        assert_eq!(orders.indexes.len(), 2);
        assert!(orders.indexes[0].is_unique);
        assert_eq!(orders.indexes[1].name, "idx_user");
    }

    #[test]
    fn test_missing_semicolon_keeps_next_table() {
        let sql = r#"
CREATE TABLE a (id INT) ENGINE=InnoDB
CREATE TABLE b (id INT, a_id INT) ENGINE=MyISAM;
"#;
        let tables = parse_str(sql, Dialect::MySql, "app");
        assert_eq!(tables.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(tables.get("a").unwrap().engine, "InnoDB");
        assert_eq!(tables.get("b").unwrap().engine, "MyISAM");
        assert_eq!(tables.get("b").unwrap().columns.len(), 2);
    }
}
