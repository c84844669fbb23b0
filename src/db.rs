use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::model::{ExtractionResult, Settings};

const DB_PATH: &str = "data/plan_scrape.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir).context("creating data directory")?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Single fixed row: the UI only ever shows the last extraction.
        CREATE TABLE IF NOT EXISTS last_extraction (
            id           INTEGER PRIMARY KEY CHECK(id = 1),
            client_name  TEXT NOT NULL,
            meal_count   INTEGER NOT NULL,
            food_count   INTEGER NOT NULL,
            data         TEXT NOT NULL,
            extracted_at TEXT NOT NULL,
            saved_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS settings (
            id            INTEGER PRIMARY KEY CHECK(id = 1),
            client_name   TEXT,
            water_goal    TEXT NOT NULL DEFAULT '1',
            include_notes BOOLEAN NOT NULL DEFAULT 1,
            include_swaps BOOLEAN NOT NULL DEFAULT 1
        );
        ",
    )?;
    Ok(())
}

pub fn save_last_extraction(conn: &Connection, result: &ExtractionResult) -> Result<()> {
    let data = serde_json::to_string(result).context("serializing extraction result")?;
    conn.execute(
        "INSERT OR REPLACE INTO last_extraction
         (id, client_name, meal_count, food_count, data, extracted_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5)",
        params![
            result.client_name,
            result.meals.len() as i64,
            result.food_count() as i64,
            data,
            result.extracted_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn load_last_extraction(conn: &Connection) -> Result<Option<ExtractionResult>> {
    let data: Option<String> = conn
        .query_row("SELECT data FROM last_extraction WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    match data {
        Some(json) => Ok(Some(
            serde_json::from_str(&json).context("deserializing stored extraction")?,
        )),
        None => Ok(None),
    }
}

pub fn save_settings(conn: &Connection, settings: &Settings) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings
         (id, client_name, water_goal, include_notes, include_swaps)
         VALUES (1, ?1, ?2, ?3, ?4)",
        params![
            settings.client_name,
            settings.water_goal,
            settings.include_notes,
            settings.include_swaps,
        ],
    )?;
    Ok(())
}

/// Stored settings, or the defaults when none were saved yet.
pub fn load_settings(conn: &Connection) -> Result<Settings> {
    let row = conn
        .query_row(
            "SELECT client_name, water_goal, include_notes, include_swaps
             FROM settings WHERE id = 1",
            [],
            |row| {
                Ok(Settings {
                    client_name: row.get(0)?,
                    water_goal: row.get(1)?,
                    include_notes: row.get(2)?,
                    include_swaps: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MacroSet, Meal};
    use chrono::Utc;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn sample_result() -> ExtractionResult {
        ExtractionResult {
            client_name: "Jane Doe".to_string(),
            target_macros: MacroSet::default(),
            day_total: MacroSet {
                protein: 180.0,
                carbs: 220.0,
                fat: 70.0,
                calories: 2200,
            },
            meals: vec![Meal {
                name: "Breakfast".to_string(),
                ..Meal::default()
            }],
            meal_notes: vec!["note".to_string()],
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn extraction_round_trips() {
        let conn = memory_db();
        assert!(load_last_extraction(&conn).unwrap().is_none());

        let result = sample_result();
        save_last_extraction(&conn, &result).unwrap();
        let loaded = load_last_extraction(&conn).unwrap().unwrap();
        assert_eq!(loaded.client_name, "Jane Doe");
        assert_eq!(loaded.day_total, result.day_total);
        assert_eq!(loaded.meals.len(), 1);
    }

    #[test]
    fn saving_twice_keeps_a_single_row() {
        let conn = memory_db();
        let mut result = sample_result();
        save_last_extraction(&conn, &result).unwrap();
        result.client_name = "Mark Johnson".to_string();
        save_last_extraction(&conn, &result).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM last_extraction", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let loaded = load_last_extraction(&conn).unwrap().unwrap();
        assert_eq!(loaded.client_name, "Mark Johnson");
    }

    #[test]
    fn settings_default_until_saved() {
        let conn = memory_db();
        let settings = load_settings(&conn).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.water_goal, "1");
        assert!(settings.include_notes);

        let custom = Settings {
            client_name: Some("Jane".to_string()),
            water_goal: "0.75".to_string(),
            include_notes: false,
            include_swaps: true,
        };
        save_settings(&conn, &custom).unwrap();
        assert_eq!(load_settings(&conn).unwrap(), custom);
    }
}
