use crate::admin::*;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use std::fs;

pub const DEFAULT_ROSTER_URL: &str =
    "https://www.oabgo.org.br/comissao/sistema-de-defesa-das-prerrogativas-sdp/";

/// Names of the tables (sheets) of the workbook.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub members: String,
    #[serde(rename = "memberArchive")]
    pub member_archive: String,
    pub processes: String,
    pub history: String,
    pub sessions: String,
    pub tickets: String,
    pub votes: String,
    pub attorneys: String,
}

impl Default for TableNames {
    fn default() -> Self {
        TableNames {
            members: "tabMembros".to_string(),
            member_archive: "tabMembrosArquivo".to_string(),
            processes: "tabProcessos".to_string(),
            history: "tabHistorico".to_string(),
            sessions: "tabSessoes".to_string(),
            tickets: "tabFichas".to_string(),
            votes: "tabVotos".to_string(),
            attorneys: "tabProcuradores".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    #[serde(rename = "workbookDirectory")]
    pub workbook_directory: String,
    #[serde(rename = "rosterUrl")]
    pub roster_url: String,
    #[serde(rename = "rosterAnchorId")]
    pub roster_anchor_id: String,
    #[serde(rename = "utcOffsetHours")]
    pub utc_offset_hours: i32,
    #[serde(rename = "listConjunction")]
    pub list_conjunction: String,
    #[serde(rename = "httpTimeoutSeconds")]
    pub http_timeout_seconds: u64,
    pub tables: TableNames,
}

impl Default for AdminConfig {
    fn default() -> Self {
        AdminConfig {
            workbook_directory: "workbook".to_string(),
            roster_url: DEFAULT_ROSTER_URL.to_string(),
            roster_anchor_id: "aba1".to_string(),
            utc_offset_hours: -3,
            list_conjunction: "e".to_string(),
            http_timeout_seconds: 30,
            tables: TableNames::default(),
        }
    }
}

impl AdminConfig {
    pub fn validate(&self) -> AdminResult<()> {
        self.utc_offset()?;
        if self.roster_anchor_id.trim().is_empty() {
            return InvalidConfigSnafu {
                message: "rosterAnchorId is empty",
            }
            .fail();
        }
        if self.http_timeout_seconds == 0 {
            return InvalidConfigSnafu {
                message: "httpTimeoutSeconds must be positive",
            }
            .fail();
        }
        Ok(())
    }

    /// The offset in which dates are displayed.
    pub fn utc_offset(&self) -> AdminResult<FixedOffset> {
        match FixedOffset::east_opt(self.utc_offset_hours * 3600) {
            Some(tz) => Ok(tz),
            None => InvalidConfigSnafu {
                message: format!("utcOffsetHours out of range: {}", self.utc_offset_hours),
            }
            .fail(),
        }
    }
}

pub fn read_config(path: &str) -> AdminResult<AdminConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: AdminConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config: AdminConfig = serde_json::from_str(
            r#"{"workbookDirectory": "/data/sdp", "tables": {"members": "Membros"}}"#,
        )
        .unwrap();
        assert_eq!(config.workbook_directory, "/data/sdp");
        assert_eq!(config.roster_anchor_id, "aba1");
        assert_eq!(config.utc_offset_hours, -3);
        assert_eq!(config.list_conjunction, "e");
        assert_eq!(config.tables.members, "Membros");
        assert_eq!(config.tables.member_archive, "tabMembrosArquivo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_offset() {
        let config = AdminConfig {
            utc_offset_hours: 30,
            ..AdminConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AdminError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.json");
        fs::write(&p, r#"{"listConjunction": "and", "httpTimeoutSeconds": 5}"#).unwrap();
        let config = read_config(p.to_str().unwrap()).unwrap();
        assert_eq!(config.list_conjunction, "and");
        assert_eq!(config.http_timeout_seconds, 5);

        let missing = read_config(dir.path().join("nope.json").to_str().unwrap());
        assert!(matches!(missing, Err(AdminError::OpeningJson { .. })));
    }
}
