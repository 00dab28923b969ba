// Extraction of member names and role headings from the roster page.

use log::{debug, warn};
use regex::Regex;

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::sync::OnceLock;

/// The role assigned to names that appear before any heading.
pub const DEFAULT_ROLE: &str = "Membro";

/// Fragments shorter than this (in characters) are never names.
pub const MIN_NAME_CHARS: usize = 4;

/// Words that only appear in role or organization headings. A fragment
/// containing one of them as a whole word is a mis-split heading.
pub const HEADING_KEYWORDS: &[&str] = &[
    "vice",
    "presidente",
    "secretário",
    "secretários",
    "secretária",
    "secretaria",
    "coordenador",
    "coordenadora",
    "procurador",
    "procuradora",
    "órgão",
    "membro",
    "membros",
    "diretor",
    "diretora",
    "conselheiro",
    "conselheira",
    "regional",
    "comissão",
    "representante",
    "deliberativo",
    "sistema",
    "defesa",
];

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ExtractError {
    /// The page does not contain the container element.
    AnchorNotFound { anchor: String },
    /// The anchor id could not be turned into a pattern.
    InvalidAnchor { anchor: String, message: String },
}

impl Error for ExtractError {}

impl Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::AnchorNotFound { anchor } => {
                write!(f, "roster content not found: no element with id '{}'", anchor)
            }
            ExtractError::InvalidAnchor { anchor, message } => {
                write!(f, "invalid anchor id '{}': {}", anchor, message)
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RosterEntry {
    pub name: String,
    /// Distinct roles, in order of first appearance.
    pub roles: Vec<String>,
}

/// Names and their roles, in order of first appearance on the page.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawRoster {
    entries: Vec<RosterEntry>,
    index: HashMap<String, usize>,
}

impl RawRoster {
    /// Records `role` for `name` unless it is already present.
    pub fn add(&mut self, name: &str, role: &str) {
        let idx = match self.index.get(name) {
            Some(i) => *i,
            None => {
                self.entries.push(RosterEntry {
                    name: name.to_string(),
                    roles: Vec::new(),
                });
                self.index.insert(name.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let roles = &mut self.entries[idx].roles;
        if !roles.iter().any(|r| r == role) {
            roles.push(role.to_string());
        }
    }

    pub fn roles(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|i| self.entries[*i].roles.as_slice())
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?is)<p(?:\s[^>]*)?>(.*?)</p\s*>")
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?is)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)\s*>")
}

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)<br\s*/?>|\n")
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"<[^>]*>")
}

fn keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternatives: Vec<String> = HEADING_KEYWORDS.iter().map(|k| regex::escape(k)).collect();
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).expect("static pattern")
    })
}

/// Removes the tags, decodes the two entities the page uses and trims.
pub fn clean_fragment(s: &str) -> String {
    tag_re()
        .replace_all(s, "")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// True when the fragment can be a person name.
pub fn is_name_candidate(fragment: &str) -> bool {
    fragment.chars().count() >= MIN_NAME_CHARS && !keyword_re().is_match(fragment)
}

/// The HTML inside the container element with the given id.
pub fn find_container<'a>(html: &'a str, anchor_id: &str) -> Result<&'a str, ExtractError> {
    let id = regex::escape(anchor_id);
    let pattern = format!(
        r#"(?is)<div\b[^>]*?\sid\s*=\s*(?:"{id}"|'{id}'|{id})(?:\s[^>]*)?>(.*?)</div\s*>"#,
        id = id
    );
    let re = Regex::new(&pattern).map_err(|e| ExtractError::InvalidAnchor {
        anchor: anchor_id.to_string(),
        message: e.to_string(),
    })?;
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ExtractError::AnchorNotFound {
            anchor: anchor_id.to_string(),
        })
}

/// Reads one paragraph. Returns the role in effect after it and the names it lists.
fn read_paragraph(current_role: String, content: &str) -> (String, Vec<String>) {
    let bold = bold_re();
    let (role, rest) = match bold.captures(content) {
        Some(cap) => {
            let heading = clean_fragment(&cap[1]);
            let rest = bold.replacen(content, 1, "").into_owned();
            if heading.is_empty() {
                (current_role, rest)
            } else {
                (heading, rest)
            }
        }
        None => (current_role, content.to_string()),
    };

    let names: Vec<String> = line_break_re()
        .split(&rest)
        .map(clean_fragment)
        .filter(|f| is_name_candidate(f))
        .filter_map(|f| {
            let name = f.split('-').next().unwrap_or("").trim().to_string();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        })
        .collect();
    (role, names)
}

/// Extracts the roster from the page.
///
/// Paragraphs are read in document order. A bold span at the start of a paragraph
/// sets the current role, which stays in effect until the next heading.
///
/// ```
/// use roster_sync::extract::extract_roster;
///
/// let html = r#"<div id="aba1"><p><strong>Presidente</strong>Maria Silva<br>João Costa</p></div>"#;
/// let roster = extract_roster(html, "aba1")?;
/// assert_eq!(roster.roles("Maria Silva"), Some(&["Presidente".to_string()][..]));
/// assert_eq!(roster.len(), 2);
/// # Ok::<(), roster_sync::extract::ExtractError>(())
/// ```
pub fn extract_roster(html: &str, anchor_id: &str) -> Result<RawRoster, ExtractError> {
    let container = find_container(html, anchor_id)?;
    debug!("extract_roster: container of {} bytes", container.len());

    let (_, roster) = paragraph_re().captures_iter(container).fold(
        (DEFAULT_ROLE.to_string(), RawRoster::default()),
        |(role, mut roster), cap| {
            let (role, names) = read_paragraph(role, &cap[1]);
            for name in names.iter() {
                roster.add(name, &role);
            }
            (role, roster)
        },
    );

    if roster.is_empty() {
        warn!("extract_roster: no names found under anchor {:?}", anchor_id);
    }
    debug!("extract_roster: {} names", roster.len());
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(r: &RawRoster, name: &str) -> Vec<String> {
        r.roles(name).map(|x| x.to_vec()).unwrap_or_default()
    }

    #[test]
    fn single_paragraph() {
        let html = r#"<div id="aba1"><p><strong>Presidente</strong>Maria Silva<br>João Costa</p></div>"#;
        let r = extract_roster(html, "aba1").unwrap();
        let names: Vec<&str> = r.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Maria Silva", "João Costa"]);
        assert_eq!(roles(&r, "Maria Silva"), vec!["Presidente"]);
        assert_eq!(roles(&r, "João Costa"), vec!["Presidente"]);
    }

    #[test]
    fn role_is_sticky_across_paragraphs() {
        let html = r#"
<div role="tabpanel" class="tab-pane" id="aba1">
  <p><strong>Coordenador</strong><br/>Paulo Souza</p>
  <p>Lia Fontes<br />Rui Matos</p>
  <p><b>Membros</b>
Lia Fontes
Teo Alves - OAB/GO 1234</p>
</div>
<div id="aba2"><p><strong>Outro</strong>Ninguém Aqui</p></div>"#;
        let r = extract_roster(html, "aba1").unwrap();
        assert_eq!(roles(&r, "Paulo Souza"), vec!["Coordenador"]);
        assert_eq!(roles(&r, "Rui Matos"), vec!["Coordenador"]);
        assert_eq!(roles(&r, "Lia Fontes"), vec!["Coordenador", "Membros"]);
        assert_eq!(roles(&r, "Teo Alves"), vec!["Membros"]);
        assert_eq!(r.roles("Ninguém Aqui"), None);
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn names_before_any_heading_are_members() {
        let html = r#"<div id="aba1"><p>Ana Paiva</p></div>"#;
        let r = extract_roster(html, "aba1").unwrap();
        assert_eq!(roles(&r, "Ana Paiva"), vec![DEFAULT_ROLE]);
    }

    #[test]
    fn repeated_role_is_recorded_once() {
        let html = r#"<div id="aba1"><p><strong>Membro</strong>Ana Paiva<br>Ana Paiva</p><p>Ana Paiva</p></div>"#;
        let r = extract_roster(html, "aba1").unwrap();
        assert_eq!(roles(&r, "Ana Paiva"), vec!["Membro"]);
    }

    #[test]
    fn drops_short_fragments_and_headings() {
        let html = "<div id=\"aba1\"><p><strong>Diretor</strong>Abc<br>&nbsp;<br>Diretoria Regional<br>Vice Presidente Adjunto<br><em>Carlos&nbsp;Dias</em></p></div>";
        let r = extract_roster(html, "aba1").unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(roles(&r, "Carlos Dias"), vec!["Diretor"]);
    }

    #[test]
    fn keyword_match_is_whole_word() {
        // "Vicente" contains "vice" but is a name
        assert!(is_name_candidate("Vicente Reis"));
        assert!(!is_name_candidate("VICE-PRESIDENTE"));
        assert!(!is_name_candidate("Órgão Especial"));
        assert!(is_name_candidate("Defensor Lima"));
    }

    #[test]
    fn heading_entities_are_cleaned() {
        let html = "<div id=\"aba1\"><p><strong>Secretário&nbsp;Executivo </strong>Beatriz Nunes</p></div>";
        let r = extract_roster(html, "aba1").unwrap();
        assert_eq!(roles(&r, "Beatriz Nunes"), vec!["Secretário Executivo"]);
    }

    #[test]
    fn missing_anchor_is_a_parse_error() {
        let res = extract_roster("<html><body><p>Ana Paiva</p></body></html>", "aba1");
        assert_eq!(
            res,
            Err(ExtractError::AnchorNotFound {
                anchor: "aba1".to_string()
            })
        );
    }

    #[test]
    fn anchor_id_must_match_exactly() {
        let html = r#"<div id="aba10"><p>Ana Paiva</p></div>"#;
        assert!(extract_roster(html, "aba1").is_err());
    }

    #[test]
    fn data_attributes_are_not_ids() {
        let html = r#"<div data-id="aba1"><p>Rui Matos</p></div>
<div class="tab-pane" id="aba1"><p>Ana Paiva</p></div>"#;
        let inner = find_container(html, "aba1").unwrap();
        assert!(inner.contains("Ana Paiva"));
        assert!(!inner.contains("Rui Matos"));

        let only_data = r#"<div data-id="aba1"><p>Rui Matos</p></div>"#;
        assert_eq!(
            find_container(only_data, "aba1"),
            Err(ExtractError::AnchorNotFound {
                anchor: "aba1".to_string()
            })
        );
    }
}
